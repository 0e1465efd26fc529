//! Error types for data section encoding

use std::fmt;

use crate::control::MAX_DATA_SIZE;

/// Errors that can occur while encoding data section values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    /// A payload is larger than the control byte encoding can express
    SizeOverflow {
        /// The payload size that did not fit
        size: usize,
    },
    /// The byte sink rejected a write
    Io(String),
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::SizeOverflow { size } => {
                write!(f, "cannot store {} bytes; max size is {}", size, MAX_DATA_SIZE)
            }
            DataError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DataError {}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err.to_string())
    }
}
