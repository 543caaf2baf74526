use std::collections::BTreeSet;


///Undirected adjacency graph in compressed form, used to compute
///fill reducing orderings.
#[derive(Debug,Clone,PartialEq)]
pub struct Graph{
    xadj : Vec<usize>,
    adjncy : Vec<usize>
}


impl Graph{
    pub fn nnodes(&self) -> usize { self.xadj.len()-1 }
    pub fn nedges(&self) -> usize { self.adjncy.len() }
    pub fn panic_if_invalid(&self) -> (){
        assert!(self.xadj.len()>0);
        assert_eq!(*self.xadj.last().unwrap(),self.adjncy.len());
        for edge in self.adjncy.iter(){
            assert!(*edge<self.xadj.len()-1);
        }
        for i in 1..self.xadj.len(){
            assert!(self.xadj[i-1]<=self.xadj[i]);
        }

        //No self-connections, they are implied by elimination
        for i in 1..self.xadj.len(){
            let beg=self.xadj[i-1];
            let end=self.xadj[i];
            for e in self.adjncy[beg..end].iter().cloned(){
                assert!( (i-1) != e);
            }
        }

        //Make sure graph is structurally symmetric
        for i in 1..self.xadj.len(){
            let beg=self.xadj[i-1];
            let end=self.xadj[i];
            for e in self.adjncy[beg..end].iter().cloned(){
                let beg2=self.xadj[e];
                let end2=self.xadj[e+1];
                assert!(self.adjncy[beg2..end2].contains(&(i-1)));
            }
        }
    }

    pub fn new(xadj : Vec<usize>, adjncy : Vec<usize>) -> Self{
        let out = Graph { xadj, adjncy };
        out.panic_if_invalid();
        out
    }

    pub fn from_adjacency(adj : &[BTreeSet<usize>]) -> Self{
        let mut xadj = Vec::<usize>::with_capacity(adj.len()+1);
        let mut adjncy = Vec::<usize>::new();
        xadj.push(0);
        for s in adj.iter(){
            adjncy.extend(s.iter().cloned());
            xadj.push(adjncy.len());
        }
        Graph::new(xadj,adjncy)
    }

    pub fn neighbours(&self,i : usize) -> &[usize]{
        &self.adjncy[self.xadj[i]..self.xadj[i+1]]
    }

    pub fn degree(&self,i : usize) -> usize{
        self.xadj[i+1]-self.xadj[i]
    }

    ///Minimum degree elimination order on the elimination graph.
    ///Returns `order` with `order[k]` the node eliminated at step `k`.
    ///Ties are broken by the smaller node index.
    pub fn minimum_degree(&self) -> Vec<usize>{
        let n=self.nnodes();
        let mut adj : Vec<BTreeSet<usize>> = (0..n).map(|i|self.neighbours(i).iter().cloned().collect()).collect();
        let mut queue : BTreeSet<(usize,usize)> = (0..n).map(|i|(adj[i].len(),i)).collect();
        let mut order = Vec::<usize>::with_capacity(n);

        while let Some((_,p)) = queue.pop_first(){
            order.push(p);
            let nbrs : Vec<usize> = std::mem::take(&mut adj[p]).into_iter().collect();
            //Eliminating `p` turns its neighbourhood into a clique
            for &u in nbrs.iter(){
                queue.remove(&(adj[u].len(),u));
                adj[u].remove(&p);
                for &v in nbrs.iter(){
                    if v != u{
                        adj[u].insert(v);
                    }
                }
                queue.insert((adj[u].len(),u));
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::Graph;
    use crate::gallery::laplace2d;
    use std::collections::BTreeSet;

    fn manual_graph() -> Graph{
        let xadj : Vec<usize> = vec![0,2,5,8,11,13,16,20,24,28,31,33,36,39,42,44];
        let adjncy : Vec<usize> = vec![1,5,0,2,6,1,3,7,2,4,8,3,9,0,6,10,1,5,7,11,2,6,8,12,3,7,9,13,4,8,14,5,11,6,10,12,7,11,13,8,12,14,9,13];
        Graph::new(xadj,adjncy)
    }

    #[test]
    fn graph_construction() {
        let g = manual_graph();
        assert_eq!(g.nnodes(),15);
        assert_eq!(g.nedges(),44);
        assert_eq!(g.neighbours(6),&[1,5,7,11]);
        assert_eq!(g.degree(0),2);
    }

    #[test]
    #[should_panic]
    fn graph_rejects_unsymmetric(){
        let _g = Graph::new(vec![0,1,1],vec![1]);
    }

    #[test]
    fn minimum_degree_is_permutation() {
        let mx=12;
        let my=12;
        let m=mx*my;
        let a = laplace2d::<f64,i32>(mx,my);
        let order = a.to_graph().minimum_degree();
        assert_eq!(order.len(),m);
        let s1 : BTreeSet<usize> = (0..m).collect();
        let s2 : BTreeSet<usize> = order.iter().cloned().collect();
        assert_eq!(s1,s2);
    }

    #[test]
    fn minimum_degree_star_eliminates_hub_late(){
        //Node 0 connected to every other node
        let n=6;
        let mut adj : Vec<BTreeSet<usize>> = vec![BTreeSet::new();n];
        for i in 1..n{
            adj[0].insert(i);
            adj[i].insert(0);
        }
        let g = Graph::from_adjacency(&adj);
        let order = g.minimum_degree();
        assert_eq!(order[0],1);
        let hub = order.iter().position(|&x|x==0).unwrap();
        assert!(hub>=n-2);
    }
}
