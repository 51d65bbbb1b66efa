//! Supporting infrastructure.
//!
//! Error types and the validation logging macro.

pub mod errors;
