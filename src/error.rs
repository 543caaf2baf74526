use thiserror::Error;

pub type Result<T> = std::result::Result<T,Error>;

/// Status codes written to `Info` after each phase.
pub const STATUS_OK : f64 = 0.0;
pub const STATUS_WARNING_SINGULAR : f64 = 1.0;

#[derive(Error,Debug,Clone,PartialEq)]
pub enum Error{
    #[error("matrix must be square, got {nrows}x{ncols}")]
    NotSquare{ nrows : usize, ncols : usize },
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch{ expected : usize, got : usize },
    #[error("invalid sparse matrix: {0}")]
    InvalidMatrix(String),
    #[error("index {value} does not fit in the '{code}' index type")]
    IndexOverflow{ value : usize, code : char },
    #[error("matrix is singular")]
    SingularMatrix,
    #[error("no symbolic analysis available")]
    NoSymbolic,
    #[error("no numeric factorization available")]
    NoNumeric,
    #[error("matrix pattern differs from the one analysed")]
    DifferentPattern,
    #[error("unknown matrix family '{0}'")]
    UnknownFamily(String),
    #[error("family '{requested}' does not match the context type '{actual}'")]
    FamilyMismatch{ requested : String, actual : String },
    #[error("CSR input requires auto_transpose")]
    TransposeRequired,
    #[error("LAPACK {routine} failed with info = {info}")]
    Lapack{ routine : &'static str, info : i32 },
}

impl Error{
    /// UMFPACK-style status code for this error.
    pub fn status(&self) -> f64{
        match self{
            Error::SingularMatrix => STATUS_WARNING_SINGULAR,
            Error::NoNumeric => -3.0,
            Error::NoSymbolic => -4.0,
            Error::NotSquare{..} => -6.0,
            Error::DimensionMismatch{..} => -8.0,
            Error::InvalidMatrix(_) => -8.0,
            Error::IndexOverflow{..} => -8.0,
            Error::DifferentPattern => -11.0,
            Error::UnknownFamily(_) => -13.0,
            Error::FamilyMismatch{..} => -13.0,
            Error::TransposeRequired => -13.0,
            Error::Lapack{..} => -15.0,
        }
    }
}
