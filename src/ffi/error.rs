//! Error conversion utilities for FFI.

use super::raw::{
    JphResult, JPH_ERR_INVALID_ARGUMENT, JPH_ERR_INVALID_HANDLE, JPH_ERR_OUT_OF_MEMORY, JPH_OK,
};
use crate::error::Error;

/// Convert a non-OK native result code to a Rust Error.
pub fn error_from_code(code: JphResult) -> Error {
    match code {
        JPH_ERR_INVALID_HANDLE => Error::InvalidHandle,
        JPH_ERR_INVALID_ARGUMENT => Error::InvalidArgument("rejected by native engine".to_string()),
        JPH_ERR_OUT_OF_MEMORY => Error::OutOfMemory,
        _ => Error::Unknown(format!("native call failed with code {}", code)),
    }
}

/// Check a result code and convert to Result.
pub fn check_result(code: JphResult) -> crate::Result<()> {
    if code == JPH_OK {
        Ok(())
    } else {
        Err(error_from_code(code))
    }
}
