use std::collections::BTreeSet;
use crate::graph::Graph;


///Elimination tree of a symmetric pattern under a given elimination order.
///Node `k` is the `k`-th eliminated vertex. Built from the pattern of A^T*A
///it is the column elimination tree, and the Cholesky column counts of that
///pattern bound the columns of L+U for any row pivoting.
pub struct EliminationTree{
     pub parents  : Vec<Option<usize>>,
     pub children : Vec<Vec<usize>>,
     pub levels : Vec<Vec<usize>>,
     //Nonzeros in each column of the Cholesky factor, diagonal included
     pub counts : Vec<usize>
}



impl EliminationTree{
    pub fn panic_if_invalid(&self) -> () {
        let n=self.parents.len();
        assert_eq!(self.children.len(),n);
        assert_eq!(self.counts.len(),n);
        for (j,pm) in self.parents.iter().cloned().enumerate(){
            if let Some(p) = pm{
                //Parents are always eliminated later
                assert!(p>j);
                assert!(self.children[p].contains(&j));
            }
        }
        for (j,cs) in self.children.iter().enumerate(){
            for c in cs.iter(){
                assert_eq!(self.parents[*c],Some(j));
            }
        }
        let nlevel = self.levels.iter().map(|l|l.len()).fold(0,|acc,x|acc+x);
        assert_eq!(nlevel,n);
        for c in self.counts.iter(){
            assert!(*c>0);
        }
    }

    ///`order[k]` is the graph vertex eliminated at step `k`.
    pub fn new(g : &Graph,order : &[usize]) -> Self{
        let n=g.nnodes();
        assert_eq!(order.len(),n);
        let mut pinv = vec![usize::MAX;n];
        for (k,&v) in order.iter().enumerate(){
            pinv[v]=k;
        }

        //Row patterns of the factor, freed once absorbed by the parent
        let mut patterns : Vec<Vec<usize>> = vec![Vec::new();n];
        let mut parents : Vec<Option<usize>> = vec![None;n];
        let mut children : Vec<Vec<usize>> = vec![Vec::new();n];
        let mut counts = vec![0;n];
        for k in 0..n{
            let mut s = BTreeSet::<usize>::new();
            s.insert(k);
            for nb in g.neighbours(order[k]).iter(){
                let p=pinv[*nb];
                if p>k{
                    s.insert(p);
                }
            }
            for c in children[k].clone().iter(){
                let cp = std::mem::take(&mut patterns[*c]);
                s.extend(cp.into_iter().filter(|&r|r>k));
            }
            let pattern : Vec<usize> = s.into_iter().collect();
            counts[k]=pattern.len();
            if pattern.len()>1{
                parents[k]=Some(pattern[1]);
                children[pattern[1]].push(k);
            }
            patterns[k]=pattern;
        }

        //Roots at level zero
        let levels = {
            let mut levels : Vec<Vec<usize>> = Vec::new();
            let mut stack : Vec<(usize,usize)> = (0..n).filter(|&k|parents[k].is_none()).map(|k|(k,0)).collect();
            while let Some((node,level)) = stack.pop(){
                if levels.len()<=level{
                    levels.resize(level+1,Vec::new());
                }
                levels[level].push(node);
                for c in children[node].iter(){
                    stack.push((*c,level+1));
                }
            }
            levels
        };

        let etree = EliminationTree { parents, children, levels, counts };
        etree.panic_if_invalid();
        etree
    }

    pub fn height(&self) -> usize{
        self.levels.len()
    }

    pub fn nnodes(&self) -> usize{
        self.parents.len()
    }

    ///Upper bound on the nonzeros of L+U, both diagonals counted once.
    pub fn lu_bound(&self) -> usize{
        self.counts.iter().map(|c|2*c-1).fold(0,|acc,x|acc+x)
    }

    ///Postorder of the tree: children before parents, subtrees contiguous.
    pub fn get_permutation(&self) -> Vec<usize>{
        let n=self.nnodes();
        let mut post = Vec::<usize>::with_capacity(n);
        let roots : Vec<usize> = (0..n).filter(|&k|self.parents[k].is_none()).collect();
        for r in roots.iter(){
            //(node, children already pushed)
            let mut stack = vec![(*r,false)];
            while let Some((node,expanded)) = stack.pop(){
                if expanded{
                    post.push(node);
                }
                else{
                    stack.push((node,true));
                    for c in self.children[node].iter().rev(){
                        stack.push((*c,false));
                    }
                }
            }
        }
        post
    }
}


#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use crate::etree::EliminationTree;
    use crate::gallery::{laplace1d,laplace2d};

    #[test]
    fn etree_of_tridiagonal_is_a_path(){
        let m=10;
        let a = laplace1d::<f64,i32>(m);
        let g = a.to_graph();
        let order : Vec<usize> = (0..m).collect();
        let etree = EliminationTree::new(&g,&order);
        for k in 0..m-1{
            assert_eq!(etree.parents[k],Some(k+1));
            assert_eq!(etree.counts[k],2);
        }
        assert_eq!(etree.parents[m-1],None);
        assert_eq!(etree.counts[m-1],1);
        assert_eq!(etree.height(),m);
        assert_eq!(etree.lu_bound(),3*m-2);
    }

    #[test]
    fn etree_counts_include_fill(){
        //Arrow matrix with the hub first fills in completely
        let n=5;
        let mut adj : Vec<BTreeSet<usize>> = vec![BTreeSet::new();n];
        for i in 1..n{
            adj[0].insert(i);
            adj[i].insert(0);
        }
        let g = crate::graph::Graph::from_adjacency(&adj);
        let hub_first : Vec<usize> = (0..n).collect();
        let etree = EliminationTree::new(&g,&hub_first);
        assert_eq!(etree.counts,vec![5,4,3,2,1]);
        let hub_last : Vec<usize> = (1..n).chain(0..1).collect();
        let etree = EliminationTree::new(&g,&hub_last);
        assert_eq!(etree.counts,vec![2,2,2,2,1]);
        assert_eq!(etree.height(),2);
    }

    //Postorder should produce a permutation with children first
    #[test]
    fn etree_postorder() {
        let mx=8;
        let my=8;
        let m=mx*my;
        let a = laplace2d::<f64,i32>(mx,my);
        let g = a.to_column_graph();
        let order = g.minimum_degree();
        let etree = EliminationTree::new(&g,&order);
        let post = etree.get_permutation();
        assert_eq!(post.len(),m);
        let s1 : BTreeSet<usize> = (0..m).collect();
        let s2 : BTreeSet<usize> = post.iter().cloned().collect();
        assert_eq!(s1,s2);
        let mut pos = vec![0;m];
        for (k,&v) in post.iter().enumerate(){
            pos[v]=k;
        }
        for k in 0..m{
            if let Some(p) = etree.parents[k]{
                assert!(pos[k]<pos[p]);
            }
        }
    }
}
