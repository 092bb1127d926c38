//! # Catalog Sample App Library
//!
//! A movie search application built on `catalog_framework`. The modules are
//! exposed for integration testing.

pub mod catalog;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod views;
