use lapack::{dgetrf,zgetrf};
use blas::{daxpy,zaxpy};
use num_complex::Complex;
use num_traits::{Num,PrimInt};
use std::convert::TryFrom;
use std::fmt::{Debug,Display};
use std::ops::Neg;
use std::str::FromStr;

use crate::error::Error;

pub trait Lapack{
    type F;
    fn no_nans(xs : &[Self::F])->bool;
    fn xgetrf(m : i32,n : i32,a : &mut [Self::F],lda : i32,ipiv : &mut [i32],info : &mut i32);
    fn xaxpy(n : i32,alpha : Self::F,x : &[Self::F],incx : i32,y : &mut [Self::F],incy : i32);
}

impl Lapack for f64{
    type F=f64;
    fn no_nans(xs : &[Self::F])->bool{
        !xs.iter().any(|x|x.is_nan())
    }
    fn xgetrf(m : i32,n : i32,a : &mut [Self::F],lda : i32,ipiv : &mut [i32],info : &mut i32){
        unsafe{dgetrf(m,n,a,lda,ipiv,info);}
    }
    fn xaxpy(n : i32,alpha : Self::F,x : &[Self::F],incx : i32,y : &mut [Self::F],incy : i32){
        unsafe{daxpy(n,alpha,x,incx,y,incy);}
    }
}

impl Lapack for Complex<f64>{
    type F=Complex<f64>;
    fn no_nans(xs : &[Self::F])->bool{
        !xs.iter().any(|x|x.re.is_nan() || x.im.is_nan())
    }
    fn xgetrf(m : i32,n : i32,a : &mut [Self::F],lda : i32,ipiv : &mut [i32],info : &mut i32){
        unsafe{zgetrf(m,n,a,lda,ipiv,info);}
    }
    fn xaxpy(n : i32,alpha : Self::F,x : &[Self::F],incx : i32,y : &mut [Self::F],incy : i32){
        unsafe{zaxpy(n,alpha,x,incx,y,incy);}
    }
}


///Value types a factorization can be computed in.
///`CODE` is the first letter of the matrix family (`d` real, `z` complex).
pub trait Scalar : Lapack<F=Self>+Num+Copy+Neg<Output=Self>+Debug+Display+Send+Sync+'static{
    const CODE : char;
    fn modulus(self) -> f64;
    fn conj(self) -> Self;
    fn from_f64(x : f64) -> Self;
    fn scale(self,s : f64) -> Self;
}

impl Scalar for f64{
    const CODE : char = 'd';
    fn modulus(self) -> f64{ self.abs() }
    fn conj(self) -> Self{ self }
    fn from_f64(x : f64) -> Self{ x }
    fn scale(self,s : f64) -> Self{ self*s }
}

impl Scalar for Complex<f64>{
    const CODE : char = 'z';
    fn modulus(self) -> f64{ self.norm() }
    fn conj(self) -> Self{ Complex::conj(&self) }
    fn from_f64(x : f64) -> Self{ Complex::new(x,0.0) }
    fn scale(self,s : f64) -> Self{ Complex::new(self.re*s,self.im*s) }
}


///Integer types usable as sparse offsets and indices.
///`CODE` is the second letter of the matrix family (`i` 32-bit, `l` 64-bit).
pub trait SparseIndex : PrimInt+Debug+Display+Send+Sync+'static{
    const CODE : char;
    fn ix(self) -> usize;
    fn from_ix(i : usize) -> Option<Self>;
}

impl SparseIndex for i32{
    const CODE : char = 'i';
    fn ix(self) -> usize{ self as usize }
    fn from_ix(i : usize) -> Option<Self>{ i32::try_from(i).ok() }
}

impl SparseIndex for i64{
    const CODE : char = 'l';
    fn ix(self) -> usize{ self as usize }
    fn from_ix(i : usize) -> Option<Self>{ i64::try_from(i).ok() }
}

///Converts a `usize` into an index type, failing if it does not fit.
pub fn to_index<I : SparseIndex>(i : usize) -> Result<I,Error>{
    I::from_ix(i).ok_or(Error::IndexOverflow{ value : i, code : I::CODE })
}


///The four matrix families: value type (`d`/`z`) by index width (`i`/`l`).
#[derive(Debug,Clone,Copy,PartialEq,Eq,Hash)]
pub enum Family{
    Di,
    Dl,
    Zi,
    Zl
}

impl Family{
    pub fn of<F : Scalar,I : SparseIndex>() -> Family{
        match (F::CODE,I::CODE){
            ('d','i') => Family::Di,
            ('d','l') => Family::Dl,
            ('z','i') => Family::Zi,
            _ => Family::Zl
        }
    }
    pub fn code(&self) -> &'static str{
        match self{
            Family::Di => "di",
            Family::Dl => "dl",
            Family::Zi => "zi",
            Family::Zl => "zl"
        }
    }
    pub fn is_complex(&self) -> bool{
        matches!(self,Family::Zi | Family::Zl)
    }
}

impl FromStr for Family{
    type Err=Error;
    fn from_str(s : &str) -> Result<Self,Self::Err>{
        match s{
            "di" => Ok(Family::Di),
            "dl" => Ok(Family::Dl),
            "zi" => Ok(Family::Zi),
            "zl" => Ok(Family::Zl),
            _ => Err(Error::UnknownFamily(s.to_string()))
        }
    }
}

impl Display for Family{
    fn fmt(&self,f : &mut std::fmt::Formatter<'_>) -> std::fmt::Result{
        write!(f,"{}",self.code())
    }
}

///Largest modulus difference between two vectors.
pub fn max_abs_diff<F : Scalar>(x : &[F],y : &[F]) -> f64{
    assert_eq!(x.len(),y.len());
    x.iter().zip(y.iter()).map(|(&a,&b)|(a-b).modulus()).fold(0.0,f64::max)
}

///Tolerance used to accept a computed solution: `10 * eps^0.8`.
pub fn solution_tolerance() -> f64{
    10.0*f64::EPSILON.powf(0.8)
}


#[cfg(test)]
mod tests {
    use crate::utility::{Family,Lapack,Scalar,SparseIndex,to_index,solution_tolerance};
    use num_complex::Complex;

    #[test]
    fn family_codes(){
        assert_eq!(Family::of::<f64,i32>(),Family::Di);
        assert_eq!(Family::of::<f64,i64>(),Family::Dl);
        assert_eq!(Family::of::<Complex<f64>,i32>(),Family::Zi);
        assert_eq!(Family::of::<Complex<f64>,i64>(),Family::Zl);
        for code in ["di","dl","zi","zl"].iter(){
            let f : Family = code.parse().unwrap();
            assert_eq!(f.to_string(),*code);
        }
        assert!("dx".parse::<Family>().is_err());
        assert!(Family::Zl.is_complex());
        assert!(!Family::Dl.is_complex());
    }

    #[test]
    fn index_conversions(){
        assert_eq!(to_index::<i32>(7).unwrap(),7);
        assert!(to_index::<i32>(usize::MAX).is_err());
        assert_eq!(to_index::<i64>(1<<40).unwrap().ix(),1<<40);
    }

    #[test]
    fn dense_lu_kernel(){
        //[[4,3],[6,3]] column major
        let mut a = vec![4.0,6.0,3.0,3.0];
        let mut ipiv = vec![0;2];
        let mut info = 0;
        f64::xgetrf(2,2,&mut a,2,&mut ipiv,&mut info);
        assert_eq!(info,0);
        assert_eq!(ipiv[0],2);
        assert!((a[0]-6.0).abs()<1e-15);
        assert!((a[1]-4.0/6.0).abs()<1e-15);
    }

    #[test]
    fn axpy_complex(){
        type F=Complex<f64>;
        let x = vec![F::new(1.0,1.0),F::new(0.0,2.0)];
        let mut y = vec![F::new(1.0,0.0),F::new(1.0,0.0)];
        F::xaxpy(2,F::new(0.0,1.0),&x,1,&mut y,1);
        assert_eq!(y[0],F::new(0.0,1.0));
        assert_eq!(y[1],F::new(-1.0,0.0));
        assert!(F::no_nans(&y));
        assert_eq!(F::new(3.0,4.0).modulus(),5.0);
    }

    #[test]
    fn tolerance_is_tight(){
        let tol = solution_tolerance();
        assert!(tol>1e-13 && tol<1e-11);
    }
}
