use crate::control::{Control,Strategy};
use crate::error::{Error,Result};
use crate::etree::EliminationTree;
use crate::sparse::CSCSparse;
use crate::utility::{Scalar,SparseIndex};
use std::fmt;
use std::time::Instant;


///Result of the symbolic phase: a column preordering, its elimination
///tree statistics and the point at which factorization switches to a
///dense trailing block. Depends only on the pattern of the matrix.
#[derive(Debug,Clone)]
pub struct Symbolic{
    n : usize,
    //Normalized pattern that was analysed
    offsets : Vec<usize>,
    rids : Vec<usize>,
    //col_perm[k] is the original column placed at position k
    col_perm : Vec<usize>,
    strategy : Strategy,
    //Estimated nonzeros per column of L, diagonal included
    counts : Vec<usize>,
    dense_start : usize,
    etree_height : usize,
    time : f64
}

///Fraction of off-diagonal entries whose transpose is also present.
pub fn pattern_symmetry<F : Scalar,I : SparseIndex>(a : &CSCSparse<F,I>) -> f64{
    let mut offdiag=0;
    let mut matched=0;
    for j in 0..a.get_ncols(){
        let (rs,_) = a.col(j);
        for r in rs.iter(){
            let i=r.ix();
            if i != j{
                offdiag+=1;
                let (rs2,_) = a.col(i);
                if rs2.binary_search_by_key(&j,|x|x.ix()).is_ok(){
                    matched+=1;
                }
            }
        }
    }
    if offdiag==0 { 1.0 } else { matched as f64/offdiag as f64 }
}

fn choose_strategy<F : Scalar,I : SparseIndex>(a : &CSCSparse<F,I>,control : &Control) -> Strategy{
    match control.strategy(){
        Strategy::Auto => {
            if a.has_full_diagonal() && pattern_symmetry(a)>=0.5{
                Strategy::Symmetric
            }
            else{
                Strategy::Unsymmetric
            }
        },
        s => s
    }
}

///First position whose trailing block is estimated dense enough to hand to
///LAPACK. Returns `n` when the dense switch is off or never reached.
fn find_dense_start(counts : &[usize],control : &Control) -> usize{
    let n=counts.len();
    let threshold=control.dense_switch();
    if !(0.0..=1.0).contains(&threshold){
        return n;
    }
    let mut trailing = 0usize;
    let mut start = n;
    for k in (0..n).rev(){
        trailing+=2*counts[k]-1;
        let m=n-k;
        if m>=control.dense_min() && (trailing as f64)>=threshold*((m*m) as f64){
            start=k;
        }
    }
    start
}


impl Symbolic{
    pub fn panic_if_invalid(&self){
        assert_eq!(self.col_perm.len(),self.n);
        let mut seen = vec![false;self.n];
        for &c in self.col_perm.iter(){
            assert!(c<self.n);
            assert!(!seen[c]);
            seen[c]=true;
        }
        assert_eq!(self.offsets.len(),self.n+1);
        assert!(self.dense_start<=self.n);
    }

    ///Analyse a square matrix given in compressed column form.
    pub fn new<F : Scalar,I : SparseIndex>(a : &CSCSparse<F,I>,control : &Control) -> Result<Self>{
        let start=Instant::now();
        if a.get_nrows() != a.get_ncols(){
            return Err(Error::NotSquare{ nrows : a.get_nrows(), ncols : a.get_ncols() });
        }
        let n=a.get_ncols();
        let strategy=choose_strategy(a,control);
        log::info!("symbolic: n = {}, nz = {}, strategy {:?}",n,a.nnz(),strategy);

        //Symmetric orders A+A^T expecting diagonal pivots, unsymmetric
        //orders the columns through A^T*A
        let g = match strategy{
            Strategy::Symmetric => a.to_graph(),
            _ => a.to_column_graph()
        };
        let order = g.minimum_degree();
        let etree = EliminationTree::new(&g,&order);
        let post = etree.get_permutation();
        let col_perm : Vec<usize> = post.iter().map(|&k|order[k]).collect();
        let counts : Vec<usize> = post.iter().map(|&k|etree.counts[k]).collect();
        let dense_start = find_dense_start(&counts,control);
        log::debug!("symbolic: etree height {}, L+U bound {}, dense from column {}",etree.height(),etree.lu_bound(),dense_start);

        let out = Symbolic {
            n,
            offsets : a.offsets().iter().map(|o|o.ix()).collect(),
            rids : a.rids().iter().map(|r|r.ix()).collect(),
            col_perm,
            strategy,
            counts,
            dense_start,
            etree_height : etree.height(),
            time : start.elapsed().as_secs_f64()
        };
        out.panic_if_invalid();
        Ok(out)
    }

    ///Whether `a` has exactly the analysed shape and pattern.
    pub fn matches<F : Scalar,I : SparseIndex>(&self,a : &CSCSparse<F,I>) -> bool{
        a.get_nrows()==self.n && a.get_ncols()==self.n
            && a.offsets().iter().map(|o|o.ix()).eq(self.offsets.iter().cloned())
            && a.rids().iter().map(|r|r.ix()).eq(self.rids.iter().cloned())
    }

    pub fn get_n(&self) -> usize{ self.n }
    pub fn nz(&self) -> usize{ self.rids.len() }
    pub fn col_perm(&self) -> &[usize]{ &self.col_perm }
    pub fn strategy(&self) -> Strategy{ self.strategy }
    pub fn dense_start(&self) -> usize{ self.dense_start }
    pub fn time(&self) -> f64{ self.time }
    pub fn etree_height(&self) -> usize{ self.etree_height }
    pub fn est_lnz(&self) -> usize{ self.counts.iter().sum() }
    pub fn est_unz(&self) -> usize{ self.est_lnz() }

    pub fn report(&self,print_level : i64){
        if print_level>=2{
            print!("{}",self);
        }
        if print_level>=4{
            println!("    column ordering: {:?}",self.col_perm);
        }
    }
}

impl fmt::Display for Symbolic{
    fn fmt(&self,f : &mut fmt::Formatter<'_>) -> fmt::Result{
        writeln!(f,"Symbolic object:")?;
        writeln!(f,"    n: {}, nz: {}",self.n,self.nz())?;
        writeln!(f,"    strategy: {:?}",self.strategy)?;
        writeln!(f,"    elimination tree height: {}",self.etree_height)?;
        writeln!(f,"    estimated nz in L: {}, in U: {}",self.est_lnz(),self.est_unz())?;
        writeln!(f,"    dense trailing columns: {}",self.n-self.dense_start)?;
        writeln!(f,"    time: {:.6}s",self.time)
    }
}


#[cfg(test)]
mod tests {
    use crate::control::{Control,ControlParam,Strategy};
    use crate::gallery::{laplace2d,arbstencil2d};
    use crate::sparse::CSCSparse;
    use crate::symbolic::{Symbolic,pattern_symmetry,find_dense_start};

    #[test]
    fn symbolic_picks_symmetric_for_stencil(){
        let a = laplace2d::<f64,i32>(6,6);
        let s = Symbolic::new(&a,&Control::default()).unwrap();
        assert_eq!(s.strategy(),Strategy::Symmetric);
        assert_eq!(s.get_n(),36);
        assert!(s.matches(&a));
        assert!(s.est_lnz()>=36);
    }

    #[test]
    fn symbolic_picks_unsymmetric_without_diagonal(){
        let a = CSCSparse::<f64,i32>::from_triplets(3,3,&[(1,0,1.0),(2,1,1.0),(0,2,1.0),(0,0,1.0)]).unwrap();
        let s = Symbolic::new(&a,&Control::default()).unwrap();
        assert_eq!(s.strategy(),Strategy::Unsymmetric);
        assert!(pattern_symmetry(&a)<0.5);
    }

    #[test]
    fn symbolic_rejects_rectangular(){
        let a = CSCSparse::<f64,i32>::from_triplets(2,3,&[(0,0,1.0)]).unwrap();
        assert!(Symbolic::new(&a,&Control::default()).is_err());
    }

    #[test]
    fn symbolic_forced_strategy(){
        let a = arbstencil2d::<f64,i32>(5,5,&[-5.0,1.1,-1.2,0.5,3.0]);
        let mut c = Control::default();
        c[ControlParam::Strategy]=1.0;
        let s = Symbolic::new(&a,&c).unwrap();
        assert_eq!(s.strategy(),Strategy::Unsymmetric);
        let mut perm = s.col_perm().to_vec();
        perm.sort();
        assert_eq!(perm,(0..25).collect::<Vec<usize>>());
    }

    #[test]
    fn symbolic_detects_other_pattern(){
        let a = laplace2d::<f64,i32>(4,4);
        let b = laplace2d::<f64,i32>(4,5);
        let s = Symbolic::new(&a,&Control::default()).unwrap();
        assert!(!s.matches(&b));
        assert!(s.matches(&a.scale(2.0)));
    }

    #[test]
    fn dense_start_thresholds(){
        let mut c = Control::default();
        c[ControlParam::DenseMin]=2.0;
        c[ControlParam::DenseSwitch]=0.9;
        //Last three columns form a dense triangle
        let counts = vec![2,2,2,3,2,1];
        assert_eq!(find_dense_start(&counts,&c),3);
        c[ControlParam::DenseSwitch]=2.0;
        assert_eq!(find_dense_start(&counts,&c),6);
        c[ControlParam::DenseSwitch]=0.0;
        assert_eq!(find_dense_start(&counts,&c),0);
    }
}
