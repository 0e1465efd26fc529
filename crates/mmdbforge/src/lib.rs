//! mmdbforge - Writer core for the MaxMind DB binary format
//!
//! mmdbforge builds the two structures at the heart of a MaxMind DB file:
//! the binary search tree mapping IP networks to records, and the
//! self-describing big-endian encoding of the per-network payloads. A
//! section writer drives both to produce the on-disk file; this library
//! owns everything up to that point.
//!
//! # Quick Start
//!
//! ```rust
//! use mmdbforge::{DataValue, IpVersion, Network, Record, Tree, TreeOptions};
//!
//! let mut tree = Tree::new(TreeOptions {
//!     ip_version: IpVersion::V4,
//!     ipv4_aliasing: false,
//!     reserved_networks: Vec::new(),
//! })?;
//!
//! let network: Network = "1.1.1.0/24".parse()?;
//! tree.insert(&network, DataValue::from("anycast"))?;
//!
//! let (depth, record) = tree.get("1.1.1.5".parse().unwrap())?;
//! assert_eq!(depth, 24);
//! assert_eq!(record, &Record::Data(DataValue::from("anycast")));
//!
//! let node_count = tree.finalize(0);
//! assert!(node_count > 0);
//! # Ok::<(), mmdbforge::ForgeError>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  mmdbforge (this crate)                 │
//! │  networks · seeding · merge strategies  │
//! ├────────────────────┬────────────────────┤
//! │  mmdbforge-tree    │  mmdbforge-data    │
//! │  prefix tree:      │  typed values:     │
//! │  insert / get /    │  control bytes +   │
//! │  finalize / iter   │  payload encoding  │
//! └────────────────────┴────────────────────┘
//! ```
//!
//! A 128-bit tree places IPv4 networks 96 bits deep at `::/96` and, with
//! [`TreeOptions::ipv4_aliasing`], aliases the IPv4-mapped, Teredo and 6to4
//! ranges to that one subtree, so every spelling of an IPv4 address finds
//! the same data. Reserved ranges are stamped at construction and reject
//! user inserts from then on.
//!
//! Values encode deterministically: map entries always leave the encoder
//! in ascending byte order of their keys, so identical content produces
//! identical bytes regardless of insertion order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod merge;

mod error;
mod network;
mod tree;

pub use error::{ForgeError, Result};
pub use network::Network;
pub use tree::{reserved_networks, IpVersion, Tree, TreeOptions};

// The component types embedders interact with directly.
pub use mmdbforge_data::{write_control, DataError, DataValue, TypeNum, MAX_DATA_SIZE};
pub use mmdbforge_tree::{
    bit_at, validation, InsertKind, Node, NodeId, Nodes, PrefixTree, Record, TreeError,
};
