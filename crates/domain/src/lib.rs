pub mod canonical;
pub mod config;
pub mod error;
pub mod records;

pub use canonical::Canonicalizer;
pub use error::{Error, ErrorKind, Result};
