use num_complex::Complex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sparse_lu_rust::gallery::{sprand,shifted_normal,random_vector,random_complex_vector};
use sparse_lu_rust::utility::{Scalar,SparseIndex,max_abs_diff,solution_tolerance};
use sparse_lu_rust::{spsolve,splu,Context,ControlParam,CompressedMatrix,Result,Sys};


//Every phase of the low-level interface, checked against the exact solution
fn test_low_level<F : Scalar,I : SparseIndex,M : CompressedMatrix<F,I>>(family : &str,a : &M,b : &[F],x_exact : &[F],tol : f64) -> Result<()>{
    let mut umfpack = Context::<F,I>::with_family(family)?;
    umfpack.control[ControlParam::Prl]=4.0;
    umfpack.control[ControlParam::Prl]=3.0;
    umfpack.report_control();
    umfpack.symbolic(a)?;
    umfpack.report_symbolic();
    umfpack.numeric(a)?;
    umfpack.report_numeric();

    let x = umfpack.solve(Sys::A,a,b,true)?;
    let err = max_abs_diff(&x,x_exact);
    assert!(err<tol,"FAIL: umfpack.solve(...) gave wrong result. {:.16e}",err);
    let x = umfpack.linsolve(Sys::A,a,b,true)?;
    let err = max_abs_diff(&x,x_exact);
    assert!(err<tol,"FAIL: umfpack.linsolve(...) gave wrong result. {:.16e}",err);
    let x = umfpack.call(Sys::A,a,b,true)?;
    let err = max_abs_diff(&x,x_exact);
    assert!(err<tol,"FAIL: umfpack.call(...) gave wrong result. {:.16e}",err);
    umfpack.report_info();

    let lu = umfpack.lu(a)?;
    log::info!("{}: L has {} entries, U has {}, do_recip = {}",family,lu.l.nnz(),lu.u.nnz(),lu.do_recip);
    umfpack.free_numeric();
    umfpack.free_symbolic();
    umfpack.free();
    Ok(())
}

fn main() -> Result<()>{
    env_logger::init();
    let seed = std::env::args().nth(1).and_then(|s|s.parse::<u64>().ok()).unwrap_or(0);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    //Setup
    let n=50;
    let a0 = sprand::<f64,i32,_>(n,n,0.25*0.25,&mut rng)?;
    let a_csc = shifted_normal(&a0,0.001)?;
    let x_exact = random_vector(n,&mut rng);
    let x2_exact = random_vector(n,&mut rng);
    let xs_exact = sprand::<f64,i32,_>(n,1,0.25,&mut rng)?;
    let mut b = vec![0.0;n];
    a_csc.eval(&x_exact,&mut b);
    let mut b2 = vec![0.0;n];
    a_csc.eval(&x2_exact,&mut b2);
    let bs = a_csc.matmul(&xs_exact)?;
    let c_csc = a_csc.map_values(|v|Complex::new(v,std::f64::consts::PI*v));
    let tol=solution_tolerance();

    let xc_exact = random_complex_vector(n,&mut rng);
    let mut bc = vec![Complex::new(0.0,0.0);n];
    c_csc.eval(&xc_exact,&mut bc);

    let a = a_csc.to_csr();
    let c = c_csc.to_csr();
    let al = a.cast_indices::<i64>()?;
    let cl = c.cast_indices::<i64>()?;

    //Easy-to-use interface
    let x = spsolve(&a,&b)?;
    assert!(max_abs_diff(&x,&x_exact)<tol,"FAIL: spsolve(A, b) gave wrong result.");

    let _lu = splu(&a)?;

    let lu = splu(&a)?;
    let x2 = lu.solve(&b2)?;
    assert!(max_abs_diff(&x2,&x2_exact)<tol,"FAIL: lu.solve(b) gave wrong result.");
    let xs = lu.solve_sparse(&bs)?;
    assert!(max_abs_diff(&xs.to_dense(),&xs_exact.to_dense())<tol,"FAIL: lu.solve_sparse(b) gave wrong result.");

    println!("shape: {:?}",lu.shape());
    println!("L: {} entries, U: {} entries",lu.l().nnz(),lu.u().nnz());
    println!("R: {:?}",lu.r());
    println!("perm_c: {:?}",lu.perm_c());
    println!("perm_r: {:?}",lu.perm_r());
    println!("nnz: {}",lu.nnz());

    //Low-level interface, CSR storage
    test_low_level("di",&a,&b,&x_exact,tol)?;
    test_low_level("dl",&al,&b,&x_exact,tol)?;
    test_low_level("zi",&c,&bc,&xc_exact,tol)?;
    test_low_level("zl",&cl,&bc,&xc_exact,tol)?;

    //Same again with CSC storage, index width unchanged
    test_low_level("di",&a.to_csc(),&b,&x_exact,tol)?;
    test_low_level("dl",&al.to_csc(),&b,&x_exact,tol)?;
    test_low_level("zi",&c.to_csc(),&bc,&xc_exact,tol)?;
    test_low_level("zl",&cl.to_csc(),&bc,&xc_exact,tol)?;

    println!("\nMade it to the end of the test script.");
    Ok(())
}
