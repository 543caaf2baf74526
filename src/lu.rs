use crate::context::{Context,stored_as_csc};
use crate::control::Control;
use crate::error::{Error,Result};
use crate::numeric::{LuFactors,Numeric,Sys};
use crate::sparse::{CSCSparse,CompressedMatrix,Storage};
use crate::symbolic::Symbolic;
use crate::utility::{Scalar,SparseIndex};


///Solve `A x = b` in one call with default controls.
pub fn spsolve<F : Scalar,I : SparseIndex,M : CompressedMatrix<F,I>+?Sized>(a : &M,b : &[F]) -> Result<Vec<F>>{
    let mut ctx = Context::<F,I>::new();
    ctx.linsolve(Sys::A,a,b,true)
}

///Factor `A` for repeated solves.
pub fn splu<F : Scalar,I : SparseIndex,M : CompressedMatrix<F,I>+?Sized>(a : &M) -> Result<LuFactorization<F,I>>{
    LuFactorization::new(a)
}

///Which operator `solve_trans` applies the inverse of.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Trans{
    N,
    T,
    H
}

impl Trans{
    fn sys(self) -> Sys{
        match self{
            Trans::N => Sys::A,
            Trans::T => Sys::Aat,
            Trans::H => Sys::At
        }
    }
}


///LU factorization of a square matrix, `P*(R\A)*Q = L*U`. Input in CSR
///form is converted to compressed columns first, so the factors always
///describe `A` itself.
pub struct LuFactorization<F,I>{
    a : CSCSparse<F,I>,
    numeric : Numeric<F>,
    factors : LuFactors<F,I>,
    irstep : usize
}

impl <F : Scalar,I : SparseIndex> LuFactorization<F,I>{
    pub fn new<M : CompressedMatrix<F,I>+?Sized>(a : &M) -> Result<Self>{
        let stored = stored_as_csc(a)?;
        let a = match a.storage(){
            Storage::Csc => stored,
            Storage::Csr => stored.transpose()
        };
        let control = Control::default();
        let symbolic = Symbolic::new(&a,&control)?;
        let numeric = Numeric::new(&a,&symbolic,&control)?;
        if numeric.is_singular(){
            return Err(Error::SingularMatrix);
        }
        let factors = numeric.factors()?;
        Ok(LuFactorization { a, numeric, factors, irstep : control.irstep() })
    }

    pub fn solve(&self,b : &[F]) -> Result<Vec<F>>{
        self.solve_trans(b,Trans::N)
    }

    pub fn solve_trans(&self,b : &[F],trans : Trans) -> Result<Vec<F>>{
        let (x,_) = self.numeric.solve(trans.sys(),&self.a,b,self.irstep)?;
        Ok(x)
    }

    ///Solve for every column of a sparse right hand side. Exact zeros of
    ///the solution are not stored.
    pub fn solve_sparse(&self,b : &CSCSparse<F,I>) -> Result<CSCSparse<F,I>>{
        let n=self.a.get_nrows();
        if b.get_nrows() != n{
            return Err(Error::DimensionMismatch{ expected : n, got : b.get_nrows() });
        }
        let mut rhs = vec![F::zero();n];
        let mut cols : Vec<Vec<(usize,F)>> = Vec::with_capacity(b.get_ncols());
        for j in 0..b.get_ncols(){
            for v in rhs.iter_mut(){
                *v=F::zero();
            }
            let (rs,vs) = b.col(j);
            for (r,v) in rs.iter().zip(vs.iter()){
                rhs[r.ix()]=*v;
            }
            let x = self.solve(&rhs)?;
            cols.push(x.into_iter().enumerate().filter(|(_,v)|*v != F::zero()).collect());
        }
        CSCSparse::from_columns(n,b.get_ncols(),cols)
    }

    pub fn shape(&self) -> (usize,usize){
        (self.a.get_nrows(),self.a.get_ncols())
    }

    ///Unit lower triangular factor, diagonal stored.
    pub fn l(&self) -> &CSCSparse<F,I>{ &self.factors.l }
    pub fn u(&self) -> &CSCSparse<F,I>{ &self.factors.u }
    ///Row scale factors, `A` is divided by them row by row.
    pub fn r(&self) -> &[f64]{ &self.factors.r }
    ///`perm_c[k]` is the column of `A` in position `k`.
    pub fn perm_c(&self) -> &[usize]{ &self.factors.q }
    ///`perm_r[k]` is the row of `A` in position `k`.
    pub fn perm_r(&self) -> &[usize]{ &self.factors.p }

    ///Stored entries of `L` and `U` together.
    pub fn nnz(&self) -> usize{
        self.factors.l.nnz()+self.factors.u.nnz()
    }
}


#[cfg(test)]
mod tests {
    use crate::gallery::{sprand,shifted_normal,random_vector,random_complex_vector};
    use crate::lu::{spsolve,splu,Trans};
    use crate::utility::{max_abs_diff,solution_tolerance};
    use num_complex::Complex;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use approx::assert_relative_eq;

    #[test]
    fn easy_interface_random_normal_matrix(){
        let n=50;
        let mut rng = ChaCha8Rng::seed_from_u64(2021);
        let a0 = sprand::<f64,i32,_>(n,n,0.0625,&mut rng).unwrap();
        let a = shifted_normal(&a0,0.001).unwrap();
        let x_exact = random_vector(n,&mut rng);
        let x2_exact = random_vector(n,&mut rng);
        let xs_exact = sprand::<f64,i32,_>(n,1,0.25,&mut rng).unwrap();
        let mut b = vec![0.0;n];
        a.eval(&x_exact,&mut b);
        let mut b2 = vec![0.0;n];
        a.eval(&x2_exact,&mut b2);
        let bs = a.matmul(&xs_exact).unwrap();
        let tol=solution_tolerance();

        let x = spsolve(&a,&b).unwrap();
        assert!(max_abs_diff(&x,&x_exact)<tol);

        let lu = splu(&a).unwrap();
        let x2 = lu.solve(&b2).unwrap();
        assert!(max_abs_diff(&x2,&x2_exact)<tol);
        let xs = lu.solve_sparse(&bs).unwrap();
        assert!(max_abs_diff(&xs.to_dense(),&xs_exact.to_dense())<tol);

        assert_eq!(lu.shape(),(n,n));
        assert_eq!(lu.perm_c().len(),n);
        assert_eq!(lu.perm_r().len(),n);
        assert_eq!(lu.r().len(),n);
        assert!(lu.nnz()>=lu.l().nnz());
        assert_eq!(lu.nnz(),lu.l().nnz()+lu.u().nnz());
        for k in 0..n{
            assert_relative_eq!(lu.l().get(k,k),1.0);
        }
    }

    #[test]
    fn easy_interface_csr_and_transposes(){
        type F=Complex<f64>;
        let n=30;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let a0 = sprand::<f64,i64,_>(n,n,0.1,&mut rng).unwrap();
        let a = shifted_normal(&a0,0.5).unwrap().map_values(|v|F::new(v,std::f64::consts::PI*v));
        let csr = a.to_csr();
        let x_exact = random_complex_vector(n,&mut rng);
        let mut b = vec![F::new(0.0,0.0);n];
        a.eval(&x_exact,&mut b);
        let x = spsolve(&csr,&b).unwrap();
        assert!(max_abs_diff(&x,&x_exact)<1e-11);

        let lu = splu(&csr).unwrap();
        a.eval_transpose(&x_exact,&mut b,true);
        let x = lu.solve_trans(&b,Trans::H).unwrap();
        assert!(max_abs_diff(&x,&x_exact)<1e-11);
        a.eval_transpose(&x_exact,&mut b,false);
        let x = lu.solve_trans(&b,Trans::T).unwrap();
        assert!(max_abs_diff(&x,&x_exact)<1e-11);
    }

    #[test]
    fn splu_rejects_singular(){
        let a = crate::sparse::CSCSparse::<f64,i32>::from_triplets(2,2,&[(0,0,1.0),(1,0,1.0)]).unwrap();
        assert!(splu(&a).is_err());
        assert!(spsolve(&a,&[1.0,1.0]).is_err());
    }
}
