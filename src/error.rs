//! Error types for the jph crate.

use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for bridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A wrapper was used after it was disposed.
    #[error("cannot access a disposed object: {type_name}")]
    Disposed {
        /// Name of the wrapper type.
        type_name: &'static str,
    },

    /// Handle is NULL or was rejected by the engine.
    #[error("invalid handle")]
    InvalidHandle,

    /// Function argument is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The engine could not allocate the object.
    #[error("native engine out of memory")]
    OutOfMemory,

    /// [`init`](crate::init) has not been called.
    #[error("bridge not initialized")]
    NotInitialized,

    /// [`init`](crate::init) was already called.
    #[error("bridge already initialized")]
    AlreadyInitialized,

    /// The engine reports an ABI this crate was not built against.
    #[error("incompatible native ABI version {major}.{minor}")]
    IncompatibleAbi {
        /// Major version reported by the engine.
        major: u32,
        /// Minor version reported by the engine.
        minor: u32,
    },

    /// Unknown error.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// Check if this is a use-after-dispose error.
    pub fn is_disposed(&self) -> bool {
        matches!(self, Error::Disposed { .. })
    }

    /// Check if this is an invalid handle error.
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Error::InvalidHandle)
    }

    /// Check if this is a not-initialized error.
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Error::NotInitialized)
    }
}
