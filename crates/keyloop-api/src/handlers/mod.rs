//! HTTP handlers, one module per resource

pub mod customer;
pub mod parts;
