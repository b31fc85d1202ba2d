//! Error types for database handling

use thiserror::Error;

/// Unified error type for database operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database engine type not recognized
    #[error("unknown database type: {value}")]
    UnknownType {
        /// The unrecognized type string
        value: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
