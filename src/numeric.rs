use crate::control::{Control,ScaleMode,Strategy};
use crate::error::{Error,Result};
use crate::sparse::CSCSparse;
use crate::symbolic::Symbolic;
use crate::utility::{Scalar,SparseIndex};
use std::fmt;
use std::time::Instant;

const NONE : usize = usize::MAX;

///Which system a solve targets.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Sys{
    ///A x = b
    A,
    ///A^H x = b, conjugate transpose
    At,
    ///A^T x = b, array transpose
    Aat
}

impl Sys{
    ///System to solve when the stored arrays hold A^T instead of A.
    ///`At` on the transpose needs conjugated data, flagged by the bool.
    pub fn transposed(self) -> (Sys,bool){
        match self{
            Sys::A => (Sys::Aat,false),
            Sys::Aat => (Sys::A,false),
            Sys::At => (Sys::A,true)
        }
    }
}

fn permute_out<F : Copy>(nrows : usize,b : &[F],p : &[usize]) -> Vec<F>{
    assert_eq!(b.len() % nrows,0);
    let ncols=b.len()/nrows;
    let out_nrows=p.len();
    let mut out = Vec::<F>::with_capacity(out_nrows*ncols);
    for ys in b.chunks_exact(nrows){
        out.extend(p.iter().map(|&pi|ys[pi]));
    }
    out
}

fn permute_in<F : Copy>(nrows : usize,b : &mut [F],p : &[usize],pb : &[F]) -> (){
    if p.len()>0{
        assert_eq!(b.len() % nrows,0);
        let ncols=b.len()/nrows;
        let out_nrows=p.len();
        assert_eq!(pb.len(),p.len()*ncols);
        for (xs,ys) in pb.chunks_exact(out_nrows).zip(b.chunks_exact_mut(nrows)){
            for (x,pi) in xs.iter().zip(p.iter()){
                ys[*pi]=*x;
            }
        }
    }
}


///Scratch space for the sparse triangular solve of one column.
struct Workspace<F>{
    x : Vec<F>,
    mark : Vec<usize>,
    stamp : usize,
    stack : Vec<(usize,usize)>,
    //Rows reached, in reverse topological order
    topo : Vec<usize>
}

impl <F : Scalar> Workspace<F>{
    fn new(n : usize) -> Self{
        Workspace { x : vec![F::zero();n], mark : vec![0;n], stamp : 0, stack : Vec::new(), topo : Vec::new() }
    }

    //Depth first search through the columns of L that pivoted rows point to.
    fn reach(&mut self,l_cols : &[Vec<(usize,F)>],pinv : &[usize],starts : &[usize]){
        self.topo.clear();
        self.stamp+=1;
        for &s in starts.iter(){
            if self.mark[s]==self.stamp{
                continue;
            }
            self.mark[s]=self.stamp;
            self.stack.push((s,0));
            while let Some(top) = self.stack.len().checked_sub(1){
                let (node,pos) = self.stack[top];
                let mut next = None;
                let j = pinv[node];
                if j != NONE{
                    let col = &l_cols[j];
                    let mut p = pos;
                    while p<col.len(){
                        let r = col[p].0;
                        p+=1;
                        if self.mark[r] != self.stamp{
                            next=Some(r);
                            break;
                        }
                    }
                    self.stack[top].1=p;
                }
                match next{
                    Some(r) => {
                        self.mark[r]=self.stamp;
                        self.stack.push((r,0));
                    },
                    None => {
                        self.stack.pop();
                        self.topo.push(node);
                    }
                }
            }
        }
    }

    ///x = L \ b over the rows pivoted so far. Afterwards `topo` lists every
    ///touched row and `x` holds their values.
    fn lsolve(&mut self,l_cols : &[Vec<(usize,F)>],pinv : &[usize],rows : &[usize],vals : &[F]){
        self.reach(l_cols,pinv,rows);
        for (&r,&v) in rows.iter().zip(vals.iter()){
            self.x[r]=v;
        }
        for t in (0..self.topo.len()).rev(){
            let i = self.topo[t];
            let j = pinv[i];
            if j != NONE{
                let xi = self.x[i];
                for &(r,l) in l_cols[j].iter(){
                    self.x[r]=self.x[r]-l*xi;
                }
            }
        }
    }

    fn clear(&mut self){
        for &i in self.topo.iter(){
            self.x[i]=F::zero();
        }
    }
}


///Row scale factors. Rows that are entirely zero keep a factor of one.
fn row_scale<F : Scalar,I : SparseIndex>(a : &CSCSparse<F,I>,mode : ScaleMode) -> Vec<f64>{
    let mut r = vec![0.0;a.get_nrows()];
    match mode{
        ScaleMode::None => {
            return vec![1.0;a.get_nrows()];
        },
        ScaleMode::Sum => {
            for (i,v) in a.rids().iter().zip(a.vals().iter()){
                r[i.ix()]+=v.modulus();
            }
        },
        ScaleMode::Max => {
            for (i,v) in a.rids().iter().zip(a.vals().iter()){
                r[i.ix()]=f64::max(r[i.ix()],v.modulus());
            }
        }
    }
    for x in r.iter_mut(){
        if *x==0.0 || !x.is_finite(){
            *x=1.0;
        }
    }
    r
}


///Factors `L`, `U`, `P`, `Q`, `R` such that `P*(R\A)*Q = L*U`.
///`do_recip` is false: rows of A are divided by `R`.
#[derive(Debug,Clone)]
pub struct LuFactors<F,I>{
    pub l : CSCSparse<F,I>,
    pub u : CSCSparse<F,I>,
    pub p : Vec<usize>,
    pub q : Vec<usize>,
    pub r : Vec<f64>,
    pub do_recip : bool
}

///Per solve statistics.
#[derive(Debug,Clone,Copy,Default)]
pub struct SolveStats{
    pub ir_taken : usize,
    pub omega : f64,
    pub time : f64
}


///Numeric LU factorization `P*(R\A)*Q = L*U` of a square sparse matrix.
///Columns before the dense switch are factored left-looking with a sparse
///triangular solve per column and threshold partial pivoting; the trailing
///Schur complement, if any, is factored by LAPACK.
pub struct Numeric<F>{
    n : usize,
    //Unit lower triangular, diagonal not stored, rows in pivot order
    l_cols : Vec<Vec<(usize,F)>>,
    //Upper triangular, rows in pivot order, diagonal last
    u_cols : Vec<Vec<(usize,F)>>,
    //row_perm[k] is the original row of pivot k
    row_perm : Vec<usize>,
    col_perm : Vec<usize>,
    scale : Vec<f64>,
    zero_pivots : usize,
    dense_columns : usize,
    rcond : f64,
    time : f64
}


impl <F : Scalar> Numeric<F>{
    fn panic_if_invalid(&self){
        assert_eq!(self.l_cols.len(),self.n);
        assert_eq!(self.u_cols.len(),self.n);
        assert_eq!(self.row_perm.len(),self.n);
        assert_eq!(self.col_perm.len(),self.n);
        for (k,col) in self.l_cols.iter().enumerate(){
            for &(r,_) in col.iter(){
                assert!(r>k && r<self.n);
            }
        }
        for (k,col) in self.u_cols.iter().enumerate(){
            assert_eq!(col.last().map(|e|e.0),Some(k));
            for &(r,_) in col.iter(){
                assert!(r<=k);
            }
        }
    }

    pub fn new<I : SparseIndex>(a : &CSCSparse<F,I>,symbolic : &Symbolic,control : &Control) -> Result<Self>{
        let start=Instant::now();
        if !symbolic.matches(a){
            return Err(Error::DifferentPattern);
        }
        if !F::no_nans(a.vals()){
            return Err(Error::InvalidMatrix("matrix contains NaN values".to_string()));
        }
        let n=symbolic.get_n();
        let q=symbolic.col_perm();
        let scale=row_scale(a,control.scale());
        let symmetric = symbolic.strategy()==Strategy::Symmetric;
        let tol=control.pivot_tolerance(symmetric);
        let mut row_counts = vec![0usize;n];
        for r in a.rids().iter(){
            row_counts[r.ix()]+=1;
        }

        let mut l_cols : Vec<Vec<(usize,F)>> = Vec::with_capacity(n);
        let mut u_cols : Vec<Vec<(usize,F)>> = Vec::with_capacity(n);
        let mut pinv = vec![NONE;n];
        let mut row_perm = vec![NONE;n];
        let mut zero_pivots = 0;
        let mut next_free = 0;
        let mut ws = Workspace::<F>::new(n);
        let mut rows = Vec::<usize>::new();
        let mut vals = Vec::<F>::new();

        let load = |col : usize,rows : &mut Vec<usize>,vals : &mut Vec<F>|{
            rows.clear();
            vals.clear();
            let (rs,vs) = a.col(col);
            for (r,v) in rs.iter().zip(vs.iter()){
                rows.push(r.ix());
                vals.push(v.scale(1.0/scale[r.ix()]));
            }
        };

        let dense_start=symbolic.dense_start();
        for k in 0..dense_start{
            let col=q[k];
            load(col,&mut rows,&mut vals);
            ws.lsolve(&l_cols,&pinv,&rows,&vals);

            let mut ucol = Vec::<(usize,F)>::new();
            let mut candidates = Vec::<usize>::new();
            let mut maxv : f64 = 0.0;
            for &i in ws.topo.iter(){
                if pinv[i] != NONE{
                    ucol.push((pinv[i],ws.x[i]));
                }
                else{
                    candidates.push(i);
                    maxv=maxv.max(ws.x[i].modulus());
                }
            }

            let pivot_row = if maxv>0.0{
                let diag_ok = symmetric && pinv[col]==NONE && ws.mark[col]==ws.stamp && ws.x[col].modulus()>=tol*maxv;
                if diag_ok{
                    col
                }
                else if symmetric{
                    candidates.iter().cloned().fold(candidates[0],|best,i| if ws.x[i].modulus()>ws.x[best].modulus() {i} else {best})
                }
                else{
                    //Sparsest acceptable row, larger magnitude on ties
                    let mut best = NONE;
                    for &i in candidates.iter(){
                        let v=ws.x[i].modulus();
                        if v<tol*maxv{
                            continue;
                        }
                        if best==NONE || row_counts[i]<row_counts[best]
                            || (row_counts[i]==row_counts[best] && v>ws.x[best].modulus()){
                            best=i;
                        }
                    }
                    best
                }
            }
            else{
                zero_pivots+=1;
                match candidates.first(){
                    Some(&i) => i,
                    None => {
                        while pinv[next_free] != NONE{
                            next_free+=1;
                        }
                        next_free
                    }
                }
            };

            let pivot = if ws.mark[pivot_row]==ws.stamp { ws.x[pivot_row] } else { F::zero() };
            let mut lcol = Vec::<(usize,F)>::new();
            if pivot != F::zero(){
                for &i in candidates.iter(){
                    if i != pivot_row && ws.x[i] != F::zero(){
                        lcol.push((i,ws.x[i]/pivot));
                    }
                }
            }
            ucol.push((k,pivot));
            pinv[pivot_row]=k;
            row_perm[k]=pivot_row;
            l_cols.push(lcol);
            u_cols.push(ucol);
            ws.clear();
        }

        let dense_columns=n-dense_start;
        if dense_columns>0{
            //Rows still unpivoted, numbered locally for the dense block
            let rest : Vec<usize> = (0..n).filter(|&i|pinv[i]==NONE).collect();
            assert_eq!(rest.len(),dense_columns);
            let mut local = vec![NONE;n];
            for (c,&i) in rest.iter().enumerate(){
                local[i]=c;
            }
            let m=dense_columns;
            let mut s = vec![F::zero();m*m];
            for c in 0..m{
                let col=q[dense_start+c];
                load(col,&mut rows,&mut vals);
                ws.lsolve(&l_cols,&pinv,&rows,&vals);
                let mut ucol = Vec::<(usize,F)>::new();
                for &i in ws.topo.iter(){
                    if pinv[i] != NONE{
                        ucol.push((pinv[i],ws.x[i]));
                    }
                    else{
                        s[local[i]+m*c]=ws.x[i];
                    }
                }
                u_cols.push(ucol);
                ws.clear();
            }

            let mut ipiv = vec![0i32;m];
            let mut info = 0i32;
            F::xgetrf(m as i32,m as i32,&mut s,m as i32,&mut ipiv,&mut info);
            if info<0{
                return Err(Error::Lapack{ routine : "getrf", info });
            }
            log::debug!("numeric: dense trailing block of order {} factored, info = {}",m,info);

            let mut order : Vec<usize> = (0..m).collect();
            for c in 0..m{
                order.swap(c,(ipiv[c]-1) as usize);
            }
            for c in 0..m{
                let k=dense_start+c;
                let row=rest[order[c]];
                pinv[row]=k;
                row_perm[k]=row;
                let ucol = &mut u_cols[k];
                for r in 0..c{
                    let v=s[r+m*c];
                    if v != F::zero(){
                        ucol.push((dense_start+r,v));
                    }
                }
                let diag=s[c+m*c];
                if diag==F::zero(){
                    zero_pivots+=1;
                }
                ucol.push((k,diag));
                let mut lcol = Vec::<(usize,F)>::new();
                for r in c+1..m{
                    let v=s[r+m*c];
                    if v != F::zero(){
                        lcol.push((rest[order[r]],v));
                    }
                }
                l_cols.push(lcol);
            }
        }

        //Row indices of L switch from original rows to pivot order
        for col in l_cols.iter_mut(){
            for e in col.iter_mut(){
                e.0=pinv[e.0];
            }
            col.sort_by_key(|e|e.0);
        }
        for col in u_cols.iter_mut(){
            col.sort_by_key(|e|e.0);
        }

        let (dmin,dmax) = u_cols.iter().filter_map(|c|c.last()).map(|e|e.1.modulus())
            .fold((f64::INFINITY,0.0f64),|(lo,hi),v|(lo.min(v),hi.max(v)));
        let rcond = if n==0 { 1.0 } else if dmax>0.0 { dmin/dmax } else { 0.0 };
        if zero_pivots>0{
            log::warn!("numeric: matrix is singular, {} zero pivots",zero_pivots);
        }

        let out = Numeric { n, l_cols, u_cols, row_perm, col_perm : q.to_vec(), scale, zero_pivots, dense_columns, rcond,
            time : start.elapsed().as_secs_f64() };
        out.panic_if_invalid();
        log::debug!("numeric: lnz {}, unz {}, rcond {:e}, {:.6}s",out.lnz(),out.unz(),out.rcond,out.time);
        Ok(out)
    }

    pub fn get_n(&self) -> usize{ self.n }
    pub fn is_singular(&self) -> bool{ self.zero_pivots>0 }
    pub fn rcond(&self) -> f64{ self.rcond }
    pub fn dense_columns(&self) -> usize{ self.dense_columns }
    pub fn time(&self) -> f64{ self.time }
    pub fn row_perm(&self) -> &[usize]{ &self.row_perm }
    pub fn col_perm(&self) -> &[usize]{ &self.col_perm }
    pub fn scale_factors(&self) -> &[f64]{ &self.scale }

    ///Nonzeros of L including the unit diagonal.
    pub fn lnz(&self) -> usize{
        self.l_cols.iter().map(|c|c.len()).fold(0,|acc,x|acc+x)+self.n
    }

    ///Nonzeros of U including the diagonal.
    pub fn unz(&self) -> usize{
        self.u_cols.iter().map(|c|c.len()).fold(0,|acc,x|acc+x)
    }

    //One pass through the factors, no refinement
    fn solve_once(&self,sys : Sys,b : &[F]) -> Vec<F>{
        let n=self.n;
        match sys{
            Sys::A => {
                let mut c = permute_out(n,b,&self.row_perm);
                for (k,ck) in c.iter_mut().enumerate(){
                    *ck=ck.scale(1.0/self.scale[self.row_perm[k]]);
                }
                for k in 0..n{
                    let ck=c[k];
                    for &(r,l) in self.l_cols[k].iter(){
                        c[r]=c[r]-l*ck;
                    }
                }
                for k in (0..n).rev(){
                    let col=&self.u_cols[k];
                    let (_,d) = col[col.len()-1];
                    c[k]=c[k]/d;
                    let ck=c[k];
                    for &(r,u) in col[..col.len()-1].iter(){
                        c[r]=c[r]-u*ck;
                    }
                }
                let mut x = vec![F::zero();n];
                permute_in(n,&mut x,&self.col_perm,&c);
                x
            },
            Sys::At | Sys::Aat => {
                let conj = sys==Sys::At;
                let op = |v : F| if conj { v.conj() } else { v };
                let mut w = permute_out(n,b,&self.col_perm);
                for k in 0..n{
                    let col=&self.u_cols[k];
                    let mut acc=w[k];
                    for &(r,u) in col[..col.len()-1].iter(){
                        acc=acc-op(u)*w[r];
                    }
                    w[k]=acc/op(col[col.len()-1].1);
                }
                for k in (0..n).rev(){
                    let mut acc=w[k];
                    for &(r,l) in self.l_cols[k].iter(){
                        acc=acc-op(l)*w[r];
                    }
                    w[k]=acc;
                }
                for (k,wk) in w.iter_mut().enumerate(){
                    *wk=wk.scale(1.0/self.scale[self.row_perm[k]]);
                }
                let mut x = vec![F::zero();n];
                permute_in(n,&mut x,&self.row_perm,&w);
                x
            }
        }
    }

    ///Solve `sys` with iterative refinement against the unscaled matrix `a`,
    ///which must be the matrix that was factored.
    pub fn solve<I : SparseIndex>(&self,sys : Sys,a : &CSCSparse<F,I>,b : &[F],irstep : usize) -> Result<(Vec<F>,SolveStats)>{
        let start=Instant::now();
        if b.len() != self.n{
            return Err(Error::DimensionMismatch{ expected : self.n, got : b.len() });
        }
        if self.is_singular(){
            return Err(Error::SingularMatrix);
        }
        let mut stats = SolveStats::default();
        if self.n==0{
            return Ok((Vec::new(),stats));
        }
        let mut x = self.solve_once(sys,b);
        let mut r = vec![F::zero();self.n];
        loop{
            stats.omega=residual(sys,a,&x,b,&mut r);
            if stats.ir_taken>=irstep || stats.omega<=f64::EPSILON{
                break;
            }
            let dx = self.solve_once(sys,&r);
            F::xaxpy(self.n as i32,F::one(),&dx,1,&mut x,1);
            stats.ir_taken+=1;
        }
        stats.time=start.elapsed().as_secs_f64();
        Ok((x,stats))
    }

    ///Copies of the factors with the unit diagonal of L stored explicitly.
    pub fn factors<I : SparseIndex>(&self) -> Result<LuFactors<F,I>>{
        let lcols : Vec<Vec<(usize,F)>> = self.l_cols.iter().enumerate()
            .map(|(k,c)| std::iter::once((k,F::one())).chain(c.iter().cloned()).collect()).collect();
        Ok(LuFactors {
            l : CSCSparse::from_columns(self.n,self.n,lcols)?,
            u : CSCSparse::from_columns(self.n,self.n,self.u_cols.clone())?,
            p : self.row_perm.clone(),
            q : self.col_perm.clone(),
            r : self.scale.clone(),
            do_recip : false
        })
    }

    pub fn report(&self,print_level : i64){
        if print_level>=2{
            print!("{}",self);
        }
    }
}

impl <F : Scalar> fmt::Display for Numeric<F>{
    fn fmt(&self,f : &mut fmt::Formatter<'_>) -> fmt::Result{
        writeln!(f,"Numeric object:")?;
        writeln!(f,"    n: {}",self.n)?;
        writeln!(f,"    nz in L: {}, in U: {}",self.lnz(),self.unz())?;
        writeln!(f,"    dense trailing columns: {}",self.dense_columns)?;
        writeln!(f,"    zero pivots: {}",self.zero_pivots)?;
        writeln!(f,"    rcond estimate: {:e}",self.rcond)?;
        writeln!(f,"    time: {:.6}s",self.time)
    }
}

///r = b - op(A)*x. Returns the componentwise backward error
///max |r_i| / (|op(A)||x| + |b|)_i.
fn residual<F : Scalar,I : SparseIndex>(sys : Sys,a : &CSCSparse<F,I>,x : &[F],b : &[F],r : &mut [F]) -> f64{
    let n=a.get_ncols();
    let mut denom : Vec<f64> = b.iter().map(|v|v.modulus()).collect();
    match sys{
        Sys::A => {
            a.eval(x,r);
            for j in 0..n{
                let (rs,vs) = a.col(j);
                let xj=x[j].modulus();
                for (i,v) in rs.iter().zip(vs.iter()){
                    denom[i.ix()]+=v.modulus()*xj;
                }
            }
        },
        Sys::At | Sys::Aat => {
            a.eval_transpose(x,r,sys==Sys::At);
            for j in 0..n{
                let (rs,vs) = a.col(j);
                for (i,v) in rs.iter().zip(vs.iter()){
                    denom[j]+=v.modulus()*x[i.ix()].modulus();
                }
            }
        }
    }
    let mut omega : f64 = 0.0;
    for i in 0..n{
        r[i]=b[i]-r[i];
        if denom[i]>0.0{
            omega=omega.max(r[i].modulus()/denom[i]);
        }
    }
    omega
}
