//! Error types for tree operations

use std::fmt;

/// Errors that can occur while mutating the search tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The inserted network falls inside a reserved subtree
    InsertIntoReserved(String),
    /// The inserted network falls inside an aliased subtree
    InsertIntoAlias(String),
    /// The walk hit a record kind insertion does not support.
    ///
    /// Defensive: the record kind set is closed in this implementation, so
    /// this is never constructed today; it exists so embedders matching on
    /// [`TreeError`] stay source-compatible if the kind space grows.
    UnsupportedRecord(String),
    /// The caller-supplied merge function reported failure; the message is
    /// propagated unchanged
    MergeFailed(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::InsertIntoReserved(network) => {
                write!(f, "attempt to insert {}, which is in a reserved network", network)
            }
            TreeError::InsertIntoAlias(network) => {
                write!(f, "attempt to insert {}, which is in an aliased network", network)
            }
            TreeError::UnsupportedRecord(kind) => {
                write!(f, "inserting into a {} record is not supported", kind)
            }
            TreeError::MergeFailed(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TreeError {}
