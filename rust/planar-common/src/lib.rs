//! Core definitions (error type, result alias, verification macros), relied
//! upon by the planar-* crates.

pub mod error;
pub mod result;

pub use result::Result;
