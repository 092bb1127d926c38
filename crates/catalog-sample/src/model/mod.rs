//! # Domain Models
//!
//! Typed readers over cached catalog entities.

pub mod movie;

pub use movie::*;
