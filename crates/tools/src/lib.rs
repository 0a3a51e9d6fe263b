//! Support code for the `mapkit` command line tool.

pub mod document;

pub use document::*;
