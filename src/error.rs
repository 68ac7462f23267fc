use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Vector/matrix dimensions disagree, or an input/desired output does not
    /// match the network's layer sizes.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A network or matrix could not be built from the given parts.
    #[error("invalid construction: {0}")]
    Construction(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
