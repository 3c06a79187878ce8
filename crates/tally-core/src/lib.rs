//! Core types and trait definitions for the Tally outbreak engine.
//!
//! This crate holds the data model shared by every other crate: raw wide-format
//! tables, locations, observations, derived query views, and the error
//! taxonomy. It has no I/O, HTTP, or runtime dependencies.

pub mod error;
pub mod location;
pub mod observation;
pub mod source;
pub mod table;
pub mod view;

pub use error::{LoadError, QueryError};
