//! Data section value model and encoder
//!
//! The data section of a MaxMind DB file is a sequence of self-describing,
//! big-endian, size-prefixed values. This crate owns the typed value model
//! ([`DataValue`]) and its wire encoding: a control byte packing the type
//! tag with a variable-width payload size, followed by the payload bytes.
//!
//! Values write themselves to any [`std::io::Write`] sink and report the
//! number of bytes written, so a section writer can accumulate offsets as
//! it goes. Map entries are always emitted in ascending byte order of their
//! keys, making the output reproducible regardless of insertion order.
//!
//! ```rust
//! use mmdbforge_data::DataValue;
//!
//! assert_eq!(DataValue::Uint32(0).to_bytes().unwrap(), vec![0xC0]);
//! assert_eq!(
//!     DataValue::Uint32(256).to_bytes().unwrap(),
//!     vec![0xC2, 0x01, 0x00]
//! );
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod control;
mod error;
mod value;

pub use control::{write_control, TypeNum, MAX_DATA_SIZE};
pub use error::DataError;
pub use value::DataValue;
