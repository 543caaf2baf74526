use crate::control::{Control,Info,InfoParam};
use crate::error::{Error,Result,STATUS_OK,STATUS_WARNING_SINGULAR};
use crate::numeric::{LuFactors,Numeric,Sys};
use crate::sparse::{CSCSparse,CompressedMatrix,Storage};
use crate::symbolic::Symbolic;
use crate::utility::{Family,Scalar,SparseIndex};
use std::marker::PhantomData;


///The stored arrays of `a` read as a compressed column matrix: `A` itself
///for CSC input, `A^T` for CSR input.
pub fn stored_as_csc<F : Scalar,I : SparseIndex,M : CompressedMatrix<F,I>+?Sized>(a : &M) -> Result<CSCSparse<F,I>>{
    let (nrows,ncols) = match a.storage(){
        Storage::Csc => (a.get_nrows(),a.get_ncols()),
        Storage::Csr => (a.get_ncols(),a.get_nrows())
    };
    CSCSparse::new(nrows,ncols,a.offsets().to_vec(),a.indices().to_vec(),a.values().to_vec())
}

fn conj_all<F : Scalar>(xs : &[F]) -> Vec<F>{
    xs.iter().map(|x|x.conj()).collect()
}


///Low-level solver context for one matrix family. Holds the control and
///info arrays and, between phases, the symbolic and numeric objects.
///
///```ignore
///let mut ctx = Context::<f64,i32>::with_family("di")?;
///ctx.control[ControlParam::Prl] = 3.0;
///ctx.symbolic(&a)?;
///ctx.numeric(&a)?;
///let x = ctx.solve(Sys::A,&a,&b,true)?;
///ctx.free();
///```
pub struct Context<F,I>{
    pub control : Control,
    pub info : Info,
    symbolic : Option<Symbolic>,
    numeric : Option<Numeric<F>>,
    //Stored arrays the numeric object was computed from
    factored : Option<CSCSparse<F,I>>,
    _index : PhantomData<I>
}

impl <F : Scalar,I : SparseIndex> Default for Context<F,I>{
    fn default() -> Self{
        Self::new()
    }
}

impl <F : Scalar,I : SparseIndex> Context<F,I>{
    pub fn new() -> Self{
        Context { control : Control::default(), info : Info::default(), symbolic : None, numeric : None, factored : None, _index : PhantomData }
    }

    ///Context for a family given by its two letter code, which must agree
    ///with the value and index types of the context.
    pub fn with_family(code : &str) -> Result<Self>{
        let requested : Family = code.parse()?;
        let actual = Family::of::<F,I>();
        if requested != actual{
            return Err(Error::FamilyMismatch{ requested : requested.to_string(), actual : actual.to_string() });
        }
        Ok(Self::new())
    }

    pub fn family(&self) -> Family{
        Family::of::<F,I>()
    }

    pub fn has_symbolic(&self) -> bool{ self.symbolic.is_some() }
    pub fn has_numeric(&self) -> bool{ self.numeric.is_some() }

    fn record<T>(&mut self,r : Result<T>) -> Result<T>{
        if let Err(e) = &r{
            self.info[InfoParam::Status]=e.status();
            log::debug!("{} context: {}",self.family(),e);
        }
        r
    }

    ///Symbolic analysis of the stored pattern. Replaces any previous
    ///symbolic object and releases the numeric one.
    pub fn symbolic<M : CompressedMatrix<F,I>+?Sized>(&mut self,a : &M) -> Result<()>{
        let r = self.symbolic_impl(a);
        self.record(r)
    }

    fn symbolic_impl<M : CompressedMatrix<F,I>+?Sized>(&mut self,a : &M) -> Result<()>{
        self.free_numeric();
        self.symbolic=None;
        let m = stored_as_csc(a)?;
        let s = Symbolic::new(&m,&self.control)?;
        self.info[InfoParam::Status]=STATUS_OK;
        self.info[InfoParam::NRow]=m.get_nrows() as f64;
        self.info[InfoParam::NCol]=m.get_ncols() as f64;
        self.info[InfoParam::Nz]=m.nnz() as f64;
        self.info[InfoParam::StrategyUsed]=s.strategy().code();
        self.info[InfoParam::SymbolicTime]=s.time();
        self.symbolic=Some(s);
        Ok(())
    }

    ///Numeric factorization, running the symbolic analysis first if there
    ///is none. A singular matrix still yields a numeric object; the status
    ///is then the singular warning.
    pub fn numeric<M : CompressedMatrix<F,I>+?Sized>(&mut self,a : &M) -> Result<()>{
        let r = self.numeric_impl(a);
        self.record(r)
    }

    fn numeric_impl<M : CompressedMatrix<F,I>+?Sized>(&mut self,a : &M) -> Result<()>{
        if self.symbolic.is_none(){
            self.symbolic_impl(a)?;
        }
        self.free_numeric();
        let m = stored_as_csc(a)?;
        let num = match &self.symbolic{
            Some(s) => Numeric::new(&m,s,&self.control)?,
            None => return Err(Error::NoSymbolic)
        };
        self.info[InfoParam::Status] = if num.is_singular() { STATUS_WARNING_SINGULAR } else { STATUS_OK };
        self.info[InfoParam::LNz]=num.lnz() as f64;
        self.info[InfoParam::UNz]=num.unz() as f64;
        self.info[InfoParam::RCond]=num.rcond();
        self.info[InfoParam::DenseColumns]=num.dense_columns() as f64;
        self.info[InfoParam::NumericTime]=num.time();
        self.numeric=Some(num);
        self.factored=Some(m);
        Ok(())
    }

    ///Solve `sys` with the current numeric object. CSR input is factored
    ///as its transpose, so it needs `auto_transpose` to solve the system
    ///that was asked for.
    pub fn solve<M : CompressedMatrix<F,I>+?Sized>(&mut self,sys : Sys,a : &M,b : &[F],auto_transpose : bool) -> Result<Vec<F>>{
        let r = self.solve_impl(sys,a,b,auto_transpose);
        self.record(r)
    }

    fn solve_impl<M : CompressedMatrix<F,I>+?Sized>(&mut self,sys : Sys,a : &M,b : &[F],auto_transpose : bool) -> Result<Vec<F>>{
        let (sys,conj) = match a.storage(){
            Storage::Csc => (sys,false),
            Storage::Csr if auto_transpose => sys.transposed(),
            Storage::Csr => return Err(Error::TransposeRequired)
        };
        let m = stored_as_csc(a)?;
        let (num,factored) = match (&self.numeric,&self.factored){
            (Some(num),Some(f)) => (num,f),
            _ => return Err(Error::NoNumeric)
        };
        if m.offsets() != factored.offsets() || m.rids() != factored.rids(){
            return Err(Error::DifferentPattern);
        }
        let irstep=self.control.irstep();
        let (x,stats) = if conj {
            let (y,stats) = num.solve(sys,&m,&conj_all(b),irstep)?;
            (conj_all(&y),stats)
        } else {
            num.solve(sys,&m,b,irstep)?
        };
        self.info[InfoParam::Status]=STATUS_OK;
        self.info[InfoParam::SolveTime]=stats.time;
        self.info[InfoParam::IrTaken]=stats.ir_taken as f64;
        self.info[InfoParam::Omega]=stats.omega;
        log::debug!("{} solve {:?}: {} refinement steps, omega {:e}",self.family(),sys,stats.ir_taken,stats.omega);
        Ok(x)
    }

    //A numeric object for exactly these stored arrays, computed if needed
    fn ensure_numeric<M : CompressedMatrix<F,I>+?Sized>(&mut self,a : &M) -> Result<()>{
        let current = match &self.factored{
            Some(f) => {
                let m = stored_as_csc(a)?;
                self.numeric.is_some() && *f==m
            },
            None => false
        };
        if !current{
            self.numeric(a)?;
        }
        Ok(())
    }

    ///One-shot solve: factor if needed, solve, release the numeric object.
    pub fn linsolve<M : CompressedMatrix<F,I>+?Sized>(&mut self,sys : Sys,a : &M,b : &[F],auto_transpose : bool) -> Result<Vec<F>>{
        self.ensure_numeric(a)?;
        let x = self.solve(sys,a,b,auto_transpose);
        self.free_numeric();
        x
    }

    ///Call style alias of `linsolve`.
    pub fn call<M : CompressedMatrix<F,I>+?Sized>(&mut self,sys : Sys,a : &M,b : &[F],auto_transpose : bool) -> Result<Vec<F>>{
        self.linsolve(sys,a,b,auto_transpose)
    }

    ///Factors `(L,U,P,Q,R,do_recip)` of the stored arrays, factoring first
    ///if needed. For CSR input these describe `A^T`.
    pub fn lu<M : CompressedMatrix<F,I>+?Sized>(&mut self,a : &M) -> Result<LuFactors<F,I>>{
        self.ensure_numeric(a)?;
        let r = match &self.numeric{
            Some(num) => num.factors(),
            None => Err(Error::NoNumeric)
        };
        self.record(r)
    }

    pub fn free_numeric(&mut self){
        self.numeric=None;
        self.factored=None;
    }

    pub fn free_symbolic(&mut self){
        self.symbolic=None;
    }

    pub fn free(&mut self){
        self.free_numeric();
        self.free_symbolic();
    }

    pub fn report_control(&self){
        self.control.report();
    }

    pub fn report_symbolic(&self){
        let prl=self.control.print_level();
        match &self.symbolic{
            Some(s) => s.report(prl),
            None => if prl>=2 { println!("No symbolic object.") }
        }
    }

    pub fn report_numeric(&self){
        let prl=self.control.print_level();
        match &self.numeric{
            Some(n) => n.report(prl),
            None => if prl>=2 { println!("No numeric object.") }
        }
    }

    pub fn report_info(&self){
        self.info.report(self.control.print_level());
    }
}
