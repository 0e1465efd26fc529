//! Binary prefix tree for building MaxMind DB search trees
//!
//! The search tree of a MaxMind DB file maps IP networks to records by
//! walking address bits from the most significant end. This crate owns the
//! mutable, in-memory form of that tree: insertion with caller-controlled
//! value merging, longest-prefix lookup, and the finalize pass that prunes
//! redundant subtrees and assigns serialization numbers.
//!
//! Addresses are packed byte slices; the embedding layer decides how IPv4
//! networks map into a 128-bit tree and seeds reserved and aliased ranges
//! before user data arrives.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod node;
pub mod validation;

pub use error::TreeError;
pub use node::{bit_at, InsertKind, MergeFn, Node, NodeId, Nodes, PrefixTree, Record};
