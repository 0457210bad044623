//! Upstream data-transfer shapes
//!
//! All types serialize as camelCase and skip unset optionals. Decoding from
//! the upstream goes through [`crate::json::from_upstream_slice`], which
//! makes field names case-insensitive.

mod brands;
mod common;
mod customer;
mod orders;
mod parts;

pub use brands::*;
pub use common::*;
pub use customer::*;
pub use orders::*;
pub use parts::*;
