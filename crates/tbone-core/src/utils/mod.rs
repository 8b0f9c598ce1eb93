//! Utility functions for tbone-rs.
//!
//! - [`text`]: String helpers (snake casing, pluralization) used when deriving
//!   collection names from model names.

pub mod text;
