//! Error types for the mmdbforge library
//!
//! mmdbforge uses a unified error type that wraps errors from the tree and
//! data-section components, keeping the component boundaries intact while
//! callers handle one type.

use thiserror::Error;

/// Main error type for writer operations
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Error from the search tree
    #[error(transparent)]
    Tree(#[from] mmdbforge_tree::TreeError),

    /// Error from data section encoding
    #[error(transparent)]
    Data(#[from] mmdbforge_data::DataError),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed network, or a network that does not fit the tree
    #[error("invalid network: {0}")]
    InvalidNetwork(String),
}

/// Result type alias for writer operations
pub type Result<T> = std::result::Result<T, ForgeError>;

// Re-export component error types for users who need them
pub use mmdbforge_data::DataError;
pub use mmdbforge_tree::TreeError;
