use num_complex::Complex;
use rand::Rng;
use rand::seq::index::sample;

use crate::error::{Error,Result};
use crate::sparse::CSCSparse;
use crate::utility::{Scalar,SparseIndex};


//Structured matrices below are small by construction, an index overflow
//means the caller picked an index type too narrow for the extents.
fn assemble<F : Scalar,I : SparseIndex>(n : usize,cols : Vec<Vec<(usize,F)>>) -> CSCSparse<F,I>{
    match CSCSparse::from_columns(n,n,cols){
        Ok(a) => a,
        Err(e) => panic!("{}",e)
    }
}

pub fn eye<F : Scalar,I : SparseIndex>(m : usize) -> CSCSparse<F,I> {
    let cols = (0..m).map(|i|vec![(i,F::one())]).collect();
    assemble(m,cols)
}

pub fn laplace1d<F : Scalar,I : SparseIndex>(m : usize) -> CSCSparse<F,I> {
    let mut cols : Vec<Vec<(usize,F)>> = Vec::with_capacity(m);
    for i in 0..m{
        let mut col = Vec::with_capacity(3);
        if i>0{
            col.push((i-1,F::from_f64(-1.0)));
        }
        if i<m-1{
            col.push((i+1,F::from_f64(-1.0)));
        }
        col.push((i,F::from_f64(2.0)));
        cols.push(col);
    }
    assemble(m,cols)
}

///Five point stencil on an `mx` by `my` grid with coefficients
///`[centre, west, east, south, north]`.
pub fn arbstencil2d<F : Scalar,I : SparseIndex>(mx : usize,my : usize,cs : &[F;5]) -> CSCSparse<F,I> {
    let n=mx*my;
    let mut cols : Vec<Vec<(usize,F)>> = Vec::with_capacity(n);
    let id = |ix : usize,iy : usize|{iy + my*ix};
    for ix in 0..mx{
        for iy in 0..my{
            let mut col = Vec::with_capacity(5);
            col.push((id(ix,iy),cs[0]));
            if ix>0{
                col.push((id(ix-1,iy),cs[1]));
            }
            if ix<mx-1{
                col.push((id(ix+1,iy),cs[2]));
            }
            if iy>0{
                col.push((id(ix,iy-1),cs[3]));
            }
            if iy<my-1{
                col.push((id(ix,iy+1),cs[4]));
            }
            cols.push(col);
        }
    }
    assemble(n,cols)
}

pub fn laplace2d<F : Scalar,I : SparseIndex>(mx : usize,my : usize) -> CSCSparse<F,I> {
    let m1=F::from_f64(-1.0);
    arbstencil2d(mx,my,&[F::from_f64(4.0),m1,m1,m1,m1])
}


///Random `nrows` by `ncols` matrix with `round(density*nrows*ncols)`
///entries at distinct uniformly chosen positions, values uniform in [0,1).
pub fn sprand<F : Scalar,I : SparseIndex,R : Rng>(nrows : usize,ncols : usize,density : f64,rng : &mut R) -> Result<CSCSparse<F,I>>{
    if !(0.0..=1.0).contains(&density){
        return Err(Error::InvalidMatrix(format!("density {} outside [0,1]",density)));
    }
    let total=nrows*ncols;
    let k=((density*(total as f64)).round() as usize).min(total);
    let mut cols : Vec<Vec<(usize,F)>> = vec![Vec::new();ncols];
    for pos in sample(rng,total,k).into_iter(){
        let v : f64 = rng.gen();
        cols[pos/nrows].push((pos%nrows,F::from_f64(v)));
    }
    CSCSparse::from_columns(nrows,ncols,cols)
}

///`A^H*A + shift*I`, symmetric positive definite for full rank `A` or a
///positive shift.
pub fn shifted_normal<F : Scalar,I : SparseIndex>(a : &CSCSparse<F,I>,shift : f64) -> Result<CSCSparse<F,I>>{
    let n=a.get_ncols();
    let ata = a.conj_transpose().matmul(a)?;
    let cols = (0..n).map(|i|vec![(i,F::from_f64(shift))]).collect();
    ata.add(&CSCSparse::from_columns(n,n,cols)?)
}

///Dense vector with entries uniform in [0,1).
pub fn random_vector<R : Rng>(n : usize,rng : &mut R) -> Vec<f64>{
    (0..n).map(|_|rng.gen::<f64>()).collect()
}

///Dense complex vector with real and imaginary parts uniform in [-1,1).
pub fn random_complex_vector<R : Rng>(n : usize,rng : &mut R) -> Vec<Complex<f64>>{
    let re : Vec<f64> = (0..n).map(|_|rng.gen_range(-1.0..1.0)).collect();
    let im : Vec<f64> = (0..n).map(|_|rng.gen_range(-1.0..1.0)).collect();
    re.into_iter().zip(im.into_iter()).map(|(x,y)|Complex::new(x,y)).collect()
}


#[cfg(test)]
mod tests {
    use crate::gallery::{laplace2d,eye,sprand,shifted_normal,random_vector,random_complex_vector};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;


    #[test]
    fn gallery_id(){
        let mx=16;
        let my=16;
        let m=mx*my;
        let a = eye::<f64,i32>(m);
        let b = laplace2d::<f64,i32>(mx,my);

        let bvec = b.to_dense()[0..m*10].to_vec();
        let mut out = vec![0.0;m*10];

        a.eval(&bvec,&mut out);

        for (x,y) in bvec.iter().zip(out.iter()){
            assert_eq!(*x,*y);
        }
    }

    #[test]
    fn sprand_has_requested_density(){
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let a = sprand::<f64,i64,_>(50,50,0.0625,&mut rng).unwrap();
        assert_eq!(a.nnz(),156);
        assert!(a.vals().iter().all(|&v|(0.0..1.0).contains(&v)));
        let col = sprand::<f64,i32,_>(50,1,0.25,&mut rng).unwrap();
        assert_eq!(col.get_ncols(),1);
        assert_eq!(col.nnz(),13);
        assert!(sprand::<f64,i32,_>(2,2,1.5,&mut rng).is_err());
    }

    #[test]
    fn shifted_normal_is_symmetric(){
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let a = sprand::<f64,i32,_>(20,20,0.1,&mut rng).unwrap();
        let s = shifted_normal(&a,0.001).unwrap();
        assert!(s.has_full_diagonal());
        let t = s.transpose();
        for j in 0..20{
            for i in 0..20{
                assert!((s.get(i,j)-t.get(i,j)).abs()<1e-15);
            }
        }
        assert!(s.get(0,0)>=0.001);
    }

    #[test]
    fn random_vectors_in_range(){
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let x = random_vector(100,&mut rng);
        assert!(x.iter().all(|&v|(0.0..1.0).contains(&v)));
        let z = random_complex_vector(100,&mut rng);
        assert!(z.iter().all(|v|v.re.abs()<=1.0 && v.im.abs()<=1.0));
    }
}
