//! Foundation types for Cairn.
//!
//! Every other Cairn crate depends on `cairn-types`. The types here are
//! deliberately storage-agnostic: they describe *what* an object is and
//! *when* something happened, never how it is persisted.
//!
//! # Key Types
//!
//! - [`ObjectId`]: Scalar object identity (integer or string)
//! - [`ObjType`]: Model type tag (e.g. `"cms/page"`)
//! - [`Record`]: Untyped field map exchanged with storage backends
//! - [`Clock`]: Substitutable source of "now" ([`SystemClock`], [`FixedClock`])

pub mod error;
pub mod id;
pub mod obj_type;
pub mod record;
pub mod temporal;

pub use error::{TypeError, TypeResult};
pub use id::ObjectId;
pub use obj_type::ObjType;
pub use record::{Fields, Record};
pub use temporal::{
    format_timestamp, parse_stored_timestamp, parse_timestamp, Clock, FixedClock, SystemClock,
    Timestamp,
};
