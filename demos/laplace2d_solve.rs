use sparse_lu_rust::gallery::laplace2d;
use sparse_lu_rust::{spsolve,Context,ControlParam,InfoParam,Sys};


fn main(){
    env_logger::init();
    use std::env;
    let args: Vec<String> = env::args().collect();
    if args.len()<2{
        panic!("usage: ./laplace2d_solve extent");
    }
    let n=args[1].parse::<usize>().unwrap();

    let mx = n;
    let my = n;
    let m = mx*my;
    type F=f64;
    //Assemble matrix
    let lap=laplace2d::<F,i32>(mx,my);

    //Make some data to solve with
    let soln : Vec<F> = (0..m).map(|x| (x as f64).sin()+2.0).collect();
    let mut b = soln.clone();
    lap.eval(&soln,&mut b);

    //One call solve
    let x = spsolve(&lap,&b).unwrap();

    //Result should be close to `soln`
    let mut errs : Vec<F> = soln.iter().zip(x.iter()).map(|(&x,&y)|(x-y).abs()/x.abs()).collect();
    errs.sort_by(|x,y|x.partial_cmp(y).unwrap());
    let maxerr = errs.last().unwrap();
    println!("Maximum relative error: {}",maxerr);

    //Phase by phase with reports
    let mut ctx = Context::<F,i32>::with_family("di").unwrap();
    ctx.control[ControlParam::Prl]=2.0;
    ctx.symbolic(&lap).unwrap();
    ctx.report_symbolic();
    ctx.numeric(&lap).unwrap();
    ctx.report_numeric();
    let _x = ctx.solve(Sys::A,&lap,&b,false).unwrap();
    ctx.report_info();
    println!("Factorization time: {:.6}s, solve time: {:.6}s",ctx.info[InfoParam::NumericTime],ctx.info[InfoParam::SolveTime]);
    ctx.free();
}
