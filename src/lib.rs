extern crate blas;
extern crate openblas_src;

pub mod error;
pub mod utility;
pub mod graph;
pub mod etree;
pub mod sparse;
pub mod control;
pub mod symbolic;
pub mod numeric;
pub mod context;
pub mod lu;
pub mod gallery;

pub use context::Context;
pub use control::{ControlParam,InfoParam};
pub use error::{Error,Result};
pub use lu::{spsolve,splu,LuFactorization,Trans};
pub use numeric::Sys;
pub use sparse::{CSCSparse,CSRSparse,CompressedMatrix};
pub use utility::Family;
