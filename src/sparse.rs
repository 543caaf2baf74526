use crate::error::{Error,Result};
use crate::graph::Graph;
use crate::utility::{Scalar,SparseIndex,to_index};
use std::collections::BTreeSet;

#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Storage{
    Csc,
    Csr
}

///Read-only view of compressed sparse storage handed to the solvers.
///For `Storage::Csc` the offsets run over columns and the indices are rows,
///for `Storage::Csr` it is the other way around.
pub trait CompressedMatrix<F,I>{
    fn storage(&self) -> Storage;
    fn get_nrows(&self) -> usize;
    fn get_ncols(&self) -> usize;
    fn offsets(&self) -> &[I];
    fn indices(&self) -> &[I];
    fn values(&self) -> &[F];
    fn nnz(&self) -> usize{ self.values().len() }
}

///Rows of an `n` column matrix holding more entries than this are dense
///for ordering purposes.
pub fn dense_row_limit(n : usize) -> usize{
    usize::max(16,(10.0*(n as f64).sqrt()) as usize)
}

///A simple compressed column sparse matrix
#[derive(Debug,Clone,PartialEq)]
pub struct CSCSparse<F,I>{
    nrows : usize,
    ncols : usize,
    //Offsets into column data
    offsets : Vec<I>,
    //Nonzero row entries
    rids : Vec<I>,
    //Nonzero values
    vals : Vec<F>
}

fn check_structure<I : SparseIndex>(nrows : usize,ncols : usize,offsets : &[I],rids : &[I],nvals : usize) -> Result<()>{
    if offsets.len() != ncols+1{
        return Err(Error::InvalidMatrix(format!("expected {} offsets, got {}",ncols+1,offsets.len())));
    }
    if offsets[0] != I::zero(){
        return Err(Error::InvalidMatrix("first offset must be zero".to_string()));
    }
    for w in offsets.windows(2){
        if w[1]<w[0]{
            return Err(Error::InvalidMatrix("offsets must be non-decreasing".to_string()));
        }
    }
    let last = offsets[ncols];
    if last<I::zero() || last.ix() != rids.len() || rids.len() != nvals{
        return Err(Error::InvalidMatrix(format!("offsets end at {} but there are {} indices and {} values",last,rids.len(),nvals)));
    }
    for r in rids.iter(){
        if *r<I::zero() || r.ix()>=nrows{
            return Err(Error::InvalidMatrix(format!("index {} out of range for dimension {}",r,nrows)));
        }
    }
    Ok(())
}


impl <F : Scalar,I : SparseIndex> CSCSparse<F,I>{

    pub fn panic_if_invalid(&self){
        if let Err(e) = check_structure(self.nrows,self.ncols,&self.offsets,&self.rids,self.vals.len()){
            panic!("{}",e);
        }
        for j in 0..self.ncols{
            let beg=self.offsets[j].ix();
            let end=self.offsets[j+1].ix();
            //Require rows to be sorted in the matrix
            for k in beg+1..end{
                assert!(self.rids[k-1]<self.rids[k]);
            }
        }
    }

    ///Validates the arrays, sorts each column by row and sums duplicate entries.
    pub fn new(nrows : usize, ncols : usize, offsets : Vec<I>,rids : Vec<I>,vals : Vec<F>) -> Result<Self>{
        check_structure(nrows,ncols,&offsets,&rids,vals.len())?;
        let mut cols : Vec<Vec<(usize,F)>> = vec![Vec::new();ncols];
        for (j,col) in cols.iter_mut().enumerate(){
            let beg=offsets[j].ix();
            let end=offsets[j+1].ix();
            col.extend(rids[beg..end].iter().zip(vals[beg..end].iter()).map(|(r,v)|(r.ix(),*v)));
        }
        Self::from_columns(nrows,ncols,cols)
    }

    ///Builds a matrix from `(row,col,value)` triplets, summing duplicates.
    pub fn from_triplets(nrows : usize,ncols : usize,triplets : &[(usize,usize,F)]) -> Result<Self>{
        let mut cols : Vec<Vec<(usize,F)>> = vec![Vec::new();ncols];
        for &(r,c,v) in triplets.iter(){
            if r>=nrows || c>=ncols{
                return Err(Error::InvalidMatrix(format!("entry ({},{}) outside a {}x{} matrix",r,c,nrows,ncols)));
            }
            cols[c].push((r,v));
        }
        Self::from_columns(nrows,ncols,cols)
    }

    pub(crate) fn from_columns(nrows : usize,ncols : usize,mut cols : Vec<Vec<(usize,F)>>) -> Result<Self>{
        assert_eq!(cols.len(),ncols);
        let mut offsets = Vec::<I>::with_capacity(ncols+1);
        let mut rids = Vec::<I>::new();
        let mut vals = Vec::<F>::new();
        offsets.push(I::zero());
        for col in cols.iter_mut(){
            col.sort_by_key(|&(r,_)|r);
            let mut last : Option<usize> = None;
            for &(r,v) in col.iter(){
                if last == Some(r){
                    if let Some(x) = vals.last_mut(){
                        *x = *x+v;
                    }
                }
                else{
                    rids.push(to_index(r)?);
                    vals.push(v);
                    last=Some(r);
                }
            }
            offsets.push(to_index(rids.len())?);
        }
        let out = CSCSparse { nrows, ncols, offsets, rids, vals };
        out.panic_if_invalid();
        Ok(out)
    }

    pub fn get_nrows(&self) -> usize{ self.nrows }
    pub fn get_ncols(&self) -> usize{ self.ncols }
    pub fn nnz(&self) -> usize{ self.vals.len() }
    pub fn offsets(&self) -> &[I]{ &self.offsets }
    pub fn rids(&self) -> &[I]{ &self.rids }
    pub fn vals(&self) -> &[F]{ &self.vals }

    ///Row indices and values of column `j`.
    pub fn col(&self,j : usize) -> (&[I],&[F]){
        let beg=self.offsets[j].ix();
        let end=self.offsets[j+1].ix();
        (&self.rids[beg..end],&self.vals[beg..end])
    }

    ///Value at `(i,j)`, zero when not stored.
    pub fn get(&self,i : usize,j : usize) -> F{
        let (rs,vs) = self.col(j);
        match rs.binary_search_by_key(&i,|r|r.ix()){
            Ok(k) => vs[k],
            Err(_) => F::zero()
        }
    }

    ///y = A*x for one or more right hand sides stored one after another.
    pub fn eval(&self,x : &[F], y : &mut [F]){
        assert!(x.len()>0);
        assert!(x.len() % self.ncols == 0);
        assert!(y.len() % self.nrows == 0);
        assert_eq!(x.len()/self.ncols,y.len()/self.nrows);
        for yv in y.iter_mut(){
            *yv=F::zero();
        }

        for (xc,yc) in x.chunks_exact(self.ncols).zip(y.chunks_exact_mut(self.nrows)){
            for j in 0..xc.len(){
                let (rs,vs) = self.col(j);
                for (r,nz) in rs.iter().zip(vs.iter()){
                    yc[r.ix()]=yc[r.ix()]+xc[j]*(*nz);
                }
            }
        }
    }

    ///y = A^T*x, or A^H*x when `conj` is set.
    pub fn eval_transpose(&self,x : &[F],y : &mut [F],conj : bool){
        assert!(x.len()>0);
        assert!(x.len() % self.nrows == 0);
        assert!(y.len() % self.ncols == 0);
        assert_eq!(x.len()/self.nrows,y.len()/self.ncols);
        for (xc,yc) in x.chunks_exact(self.nrows).zip(y.chunks_exact_mut(self.ncols)){
            for j in 0..self.ncols{
                let (rs,vs) = self.col(j);
                let mut acc = F::zero();
                for (r,nz) in rs.iter().zip(vs.iter()){
                    let a = if conj { nz.conj() } else { *nz };
                    acc = acc + a*xc[r.ix()];
                }
                yc[j]=acc;
            }
        }
    }

    pub fn transpose(&self) -> Self{
        let mut counts = vec![0usize;self.nrows+1];
        for r in self.rids.iter(){
            counts[r.ix()+1]+=1;
        }
        for i in 0..self.nrows{
            counts[i+1]+=counts[i];
        }
        let mut next = counts.clone();
        let mut rids = vec![I::zero();self.nnz()];
        let mut vals = vec![F::zero();self.nnz()];
        for j in 0..self.ncols{
            let (rs,vs) = self.col(j);
            for (r,v) in rs.iter().zip(vs.iter()){
                let k = next[r.ix()];
                //Column index of the source always fits, it is smaller than ncols
                rids[k] = I::from_ix(j).unwrap_or_else(I::zero);
                vals[k] = *v;
                next[r.ix()]+=1;
            }
        }
        let offsets = counts.iter().map(|&c|I::from_ix(c).unwrap_or_else(I::zero)).collect();
        let out = CSCSparse { nrows : self.ncols, ncols : self.nrows, offsets, rids, vals };
        out.panic_if_invalid();
        out
    }

    pub fn conj_transpose(&self) -> Self{
        self.transpose().map_values(|v|v.conj())
    }

    pub fn map_values<G : Scalar,M : Fn(F)->G>(&self,f : M) -> CSCSparse<G,I>{
        CSCSparse { nrows : self.nrows, ncols : self.ncols, offsets : self.offsets.clone(), rids : self.rids.clone(),
            vals : self.vals.iter().map(|&v|f(v)).collect() }
    }

    pub fn scale(&self,s : F) -> Self{
        self.map_values(|v|v*s)
    }

    ///Same matrix with a different index width, e.g. 32 to 64 bit indices.
    pub fn cast_indices<J : SparseIndex>(&self) -> Result<CSCSparse<F,J>>{
        let offsets = self.offsets.iter().map(|o|to_index::<J>(o.ix())).collect::<Result<Vec<J>>>()?;
        let rids = self.rids.iter().map(|r|to_index::<J>(r.ix())).collect::<Result<Vec<J>>>()?;
        Ok(CSCSparse { nrows : self.nrows, ncols : self.ncols, offsets, rids, vals : self.vals.clone() })
    }

    ///Sparse product `self * other`.
    pub fn matmul(&self,other : &Self) -> Result<Self>{
        if self.ncols != other.nrows{
            return Err(Error::DimensionMismatch{ expected : self.ncols, got : other.nrows });
        }
        let mut work = vec![F::zero();self.nrows];
        let mut mark = vec![usize::MAX;self.nrows];
        let mut cols : Vec<Vec<(usize,F)>> = Vec::with_capacity(other.ncols);
        for j in 0..other.ncols{
            let mut pattern = Vec::<usize>::new();
            let (brs,bvs) = other.col(j);
            for (k,b) in brs.iter().zip(bvs.iter()){
                let (ars,avs) = self.col(k.ix());
                for (i,a) in ars.iter().zip(avs.iter()){
                    let i = i.ix();
                    if mark[i] != j{
                        mark[i]=j;
                        work[i]=F::zero();
                        pattern.push(i);
                    }
                    work[i]=work[i]+(*a)*(*b);
                }
            }
            cols.push(pattern.iter().map(|&i|(i,work[i])).collect());
        }
        Self::from_columns(self.nrows,other.ncols,cols)
    }

    ///Sparse sum `self + other`.
    pub fn add(&self,other : &Self) -> Result<Self>{
        if self.nrows != other.nrows{
            return Err(Error::DimensionMismatch{ expected : self.nrows, got : other.nrows });
        }
        if self.ncols != other.ncols{
            return Err(Error::DimensionMismatch{ expected : self.ncols, got : other.ncols });
        }
        let cols = (0..self.ncols).map(|j|{
            let (ars,avs) = self.col(j);
            let (brs,bvs) = other.col(j);
            ars.iter().zip(avs.iter()).chain(brs.iter().zip(bvs.iter())).map(|(r,v)|(r.ix(),*v)).collect()
        }).collect();
        Self::from_columns(self.nrows,self.ncols,cols)
    }

    ///Column major dense copy.
    pub fn to_dense(&self) -> Vec<F>{
        let mut out = vec![F::zero();self.nrows*self.ncols];
        for j in 0..self.ncols{
            let (rs,vs) = self.col(j);
            for (r,v) in rs.iter().zip(vs.iter()){
                out[r.ix()+self.nrows*j]=*v;
            }
        }
        out
    }

    pub fn to_csr(&self) -> CSRSparse<F,I>{
        CSRSparse { t : self.transpose() }
    }

    ///Whether the pattern of A equals the pattern of A^T.
    pub fn is_pattern_symmetric(&self) -> bool{
        if self.nrows != self.ncols{
            return false;
        }
        let t = self.transpose();
        t.offsets == self.offsets && t.rids == self.rids
    }

    pub fn has_full_diagonal(&self) -> bool{
        self.nrows == self.ncols && (0..self.ncols).all(|j|{
            let (rs,_) = self.col(j);
            rs.binary_search_by_key(&j,|r|r.ix()).is_ok()
        })
    }

    ///Adjacency graph of the pattern of A + A^T without self connections.
    pub fn to_graph(&self) -> Graph{
        assert_eq!(self.nrows,self.ncols);
        let n=self.ncols;
        let mut adj : Vec<BTreeSet<usize>> = vec![BTreeSet::new();n];
        for j in 0..n{
            let (rs,_) = self.col(j);
            for r in rs.iter(){
                let i=r.ix();
                if i != j{
                    adj[i].insert(j);
                    adj[j].insert(i);
                }
            }
        }
        Graph::from_adjacency(&adj)
    }

    ///Adjacency graph of the pattern of A^T*A: two columns are connected
    ///when they share a nonzero row. Rows with more than
    ///`dense_row_limit(ncols)` entries are left out, they would turn the
    ///graph into a clique without changing a good ordering.
    pub fn to_column_graph(&self) -> Graph{
        let n=self.ncols;
        let limit=dense_row_limit(n);
        let t = self.transpose();
        let mut adj : Vec<BTreeSet<usize>> = vec![BTreeSet::new();n];
        let mut skipped=0;
        for i in 0..self.nrows{
            let (cs,_) = t.col(i);
            if cs.len()>limit{
                skipped+=1;
                continue;
            }
            for c1 in cs.iter(){
                for c2 in cs.iter(){
                    if c1 != c2{
                        adj[c1.ix()].insert(c2.ix());
                    }
                }
            }
        }
        if skipped>0{
            log::debug!("column graph: {} dense rows ignored",skipped);
        }
        Graph::from_adjacency(&adj)
    }
}

impl <F : Scalar,I : SparseIndex> CompressedMatrix<F,I> for CSCSparse<F,I>{
    fn storage(&self) -> Storage{ Storage::Csc }
    fn get_nrows(&self) -> usize{ self.nrows }
    fn get_ncols(&self) -> usize{ self.ncols }
    fn offsets(&self) -> &[I]{ &self.offsets }
    fn indices(&self) -> &[I]{ &self.rids }
    fn values(&self) -> &[F]{ &self.vals }
}


///A compressed row sparse matrix. The row arrays of A are exactly the
///column arrays of A^T, so it is stored as that transpose.
#[derive(Debug,Clone,PartialEq)]
pub struct CSRSparse<F,I>{
    t : CSCSparse<F,I>
}

impl <F : Scalar,I : SparseIndex> CSRSparse<F,I>{
    pub fn new(nrows : usize,ncols : usize,offsets : Vec<I>,cids : Vec<I>,vals : Vec<F>) -> Result<Self>{
        Ok(CSRSparse { t : CSCSparse::new(ncols,nrows,offsets,cids,vals)? })
    }
    pub fn from_triplets(nrows : usize,ncols : usize,triplets : &[(usize,usize,F)]) -> Result<Self>{
        let flipped : Vec<(usize,usize,F)> = triplets.iter().map(|&(r,c,v)|(c,r,v)).collect();
        Ok(CSRSparse { t : CSCSparse::from_triplets(ncols,nrows,&flipped)? })
    }
    pub fn get_nrows(&self) -> usize{ self.t.get_ncols() }
    pub fn get_ncols(&self) -> usize{ self.t.get_nrows() }
    pub fn nnz(&self) -> usize{ self.t.nnz() }
    pub fn get(&self,i : usize,j : usize) -> F{ self.t.get(j,i) }

    ///The stored arrays read as a compressed column matrix, i.e. A^T.
    pub fn as_transpose(&self) -> &CSCSparse<F,I>{ &self.t }

    pub fn eval(&self,x : &[F],y : &mut [F]){
        self.t.eval_transpose(x,y,false);
    }

    pub fn to_csc(&self) -> CSCSparse<F,I>{
        self.t.transpose()
    }

    pub fn map_values<G : Scalar,M : Fn(F)->G>(&self,f : M) -> CSRSparse<G,I>{
        CSRSparse { t : self.t.map_values(f) }
    }

    pub fn cast_indices<J : SparseIndex>(&self) -> Result<CSRSparse<F,J>>{
        Ok(CSRSparse { t : self.t.cast_indices()? })
    }
}

impl <F : Scalar,I : SparseIndex> CompressedMatrix<F,I> for CSRSparse<F,I>{
    fn storage(&self) -> Storage{ Storage::Csr }
    fn get_nrows(&self) -> usize{ self.t.get_ncols() }
    fn get_ncols(&self) -> usize{ self.t.get_nrows() }
    fn offsets(&self) -> &[I]{ self.t.offsets() }
    fn indices(&self) -> &[I]{ self.t.rids() }
    fn values(&self) -> &[F]{ self.t.vals() }
}


#[cfg(test)]
mod tests {
    use crate::sparse::{CSCSparse,CSRSparse,CompressedMatrix,Storage,dense_row_limit};
    use crate::gallery::{laplace1d,laplace2d,eye};
    use num_complex::Complex;

    #[test]
    fn sparse_rejects_bad_offsets(){
        let a = CSCSparse::<f64,i32>::new(2,2,vec![0,1],vec![0],vec![1.0]);
        assert!(a.is_err());
        let b = CSCSparse::<f64,i32>::new(2,2,vec![0,2,1],vec![0,1],vec![1.0,1.0]);
        assert!(b.is_err());
        let c = CSCSparse::<f64,i32>::new(2,2,vec![0,1,2],vec![0,2],vec![1.0,1.0]);
        assert!(c.is_err());
        let d = CSCSparse::<f64,i32>::new(2,2,vec![0,1,2],vec![0,-1],vec![1.0,1.0]);
        assert!(d.is_err());
    }

    #[test]
    fn sparse_check_rows_sorted(){
        //Unsorted rows with a duplicate entry in the last column
        let a = CSCSparse::<f64,i64>::new(3,2,vec![0,2,5],vec![2,0,1,2,1],vec![1.0,2.0,3.0,4.0,5.0]).unwrap();
        assert_eq!(a.rids(),&[0,2,1,2]);
        assert_eq!(a.vals(),&[2.0,1.0,8.0,4.0]);
        assert_eq!(a.nnz(),4);
        assert_eq!(a.get(1,1),8.0);
        assert_eq!(a.get(1,0),0.0);
    }

    #[test]
    fn sparse_eval_matches_dense(){
        let mx=4;
        let my=4;
        let m=mx*my;
        let a = laplace2d::<f64,i32>(mx,my);
        let d = a.to_dense();
        let x : Vec<f64> = (0..m).map(|i|(i as f64).sin()).collect();
        let mut y = vec![0.0;m];
        a.eval(&x,&mut y);
        for i in 0..m{
            let yi : f64 = (0..m).map(|j|d[i+m*j]*x[j]).sum();
            assert!((yi-y[i]).abs()<1e-14);
        }
    }

    #[test]
    fn sparse_eval_transpose(){
        let a = CSCSparse::<f64,i32>::from_triplets(2,3,&[(0,0,1.0),(0,2,2.0),(1,1,3.0)]).unwrap();
        let x = vec![1.0,-1.0];
        let mut y = vec![0.0;3];
        a.eval_transpose(&x,&mut y,false);
        assert_eq!(y,vec![1.0,-3.0,2.0]);
        let t = a.transpose();
        assert_eq!(t.get_nrows(),3);
        assert_eq!(t.get(2,0),2.0);
        assert_eq!(t.transpose(),a);
    }

    #[test]
    fn sparse_conj_transpose(){
        type F=Complex<f64>;
        let a = CSCSparse::<F,i32>::from_triplets(2,2,&[(0,1,F::new(1.0,2.0))]).unwrap();
        let h = a.conj_transpose();
        assert_eq!(h.get(1,0),F::new(1.0,-2.0));
    }

    #[test]
    fn sparse_identity_product(){
        let m=12;
        let a = laplace1d::<f64,i32>(m);
        let i = eye::<f64,i32>(m);
        assert_eq!(a.matmul(&i).unwrap(),a);
        assert_eq!(i.matmul(&a).unwrap(),a);
        let aa = a.matmul(&a).unwrap();
        //Pentadiagonal: [1,-4,6,-4,1] in the interior
        assert_eq!(aa.get(5,5),6.0);
        assert_eq!(aa.get(5,3),1.0);
        assert_eq!(aa.get(5,4),-4.0);
    }

    #[test]
    fn sparse_add_and_scale(){
        let m=5;
        let a = laplace1d::<f64,i32>(m);
        let b = a.add(&eye::<f64,i32>(m).scale(0.5)).unwrap();
        assert_eq!(b.get(2,2),2.5);
        assert_eq!(b.get(2,3),-1.0);
        assert_eq!(b.nnz(),a.nnz());
        assert!(a.add(&eye::<f64,i32>(m+1)).is_err());
    }

    #[test]
    fn sparse_cast_indices(){
        let a = laplace1d::<f64,i32>(8);
        let al = a.cast_indices::<i64>().unwrap();
        assert_eq!(al.offsets().len(),9);
        assert_eq!(al.to_dense(),a.to_dense());
    }

    #[test]
    fn csr_views_transpose_arrays(){
        //[[1,2],[0,3]]
        let a = CSRSparse::<f64,i32>::new(2,2,vec![0,2,3],vec![0,1,1],vec![1.0,2.0,3.0]).unwrap();
        assert_eq!(a.storage(),Storage::Csr);
        assert_eq!(a.get(0,1),2.0);
        assert_eq!(a.get(1,0),0.0);
        let c = a.to_csc();
        assert_eq!(c.offsets(),&[0,1,3]);
        assert_eq!(c.rids(),&[0,0,1]);
        let mut y = vec![0.0;2];
        a.eval(&[1.0,1.0],&mut y);
        assert_eq!(y,vec![3.0,3.0]);
        assert_eq!(c.to_csr(),a);
    }

    #[test]
    fn sparse_pattern_queries(){
        let a = laplace2d::<f64,i32>(3,3);
        assert!(a.is_pattern_symmetric());
        assert!(a.has_full_diagonal());
        let b = CSCSparse::<f64,i32>::from_triplets(2,2,&[(0,1,1.0),(1,0,1.0)]).unwrap();
        assert!(b.is_pattern_symmetric());
        assert!(!b.has_full_diagonal());
        let c = CSCSparse::<f64,i32>::from_triplets(2,2,&[(0,1,1.0),(1,1,1.0)]).unwrap();
        assert!(!c.is_pattern_symmetric());
    }

    #[test]
    fn sparse_make_graphs(){
        let a = laplace1d::<f64,i32>(6);
        let g = a.to_graph();
        assert_eq!(g.nnodes(),6);
        assert_eq!(g.neighbours(0),&[1]);
        let cg = a.to_column_graph();
        //A^T A of a tridiagonal matrix is pentadiagonal
        assert_eq!(cg.neighbours(2),&[0,1,3,4]);
    }

    #[test]
    fn column_graph_ignores_dense_row(){
        let n=200;
        assert!(dense_row_limit(n)<n);
        let mut entries : Vec<(usize,usize,f64)> = (0..n).map(|i|(i,i,4.0)).collect();
        entries.extend((1..n).map(|j|(0,j,1.0)));
        let a = CSCSparse::<f64,i32>::from_triplets(n,n,&entries).unwrap();
        let cg = a.to_column_graph();
        assert_eq!(cg.nnodes(),n);
        assert_eq!(cg.nedges(),0);

        //A row under the limit still joins its columns
        let b = CSCSparse::<f64,i32>::from_triplets(20,20,&[(0,0,1.0),(0,5,1.0),(0,9,1.0)]).unwrap();
        assert_eq!(b.to_column_graph().neighbours(5),&[0,9]);
    }
}
