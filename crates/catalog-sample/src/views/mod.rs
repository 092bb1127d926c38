//! # Views
//!
//! The results list is a plain [`ViewBinder<MovieRow>`](catalog_framework::ViewBinder)
//! built by the lifecycle; only the search form needs a type of its own.

pub mod search_form;

pub use search_form::{FormEvent, SearchForm};
