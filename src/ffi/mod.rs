//! FFI definitions shared with the native engine.
//!
//! This module contains the low-level C ABI. Users should prefer the
//! safe Rust wrappers in the parent modules.

pub mod error;
pub mod handles;
pub mod raw;

pub use error::{check_result, error_from_code};
pub use handles::*;
pub use raw::*;
