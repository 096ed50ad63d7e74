//! Handle types for opaque references to native engine objects.
//!
//! Each handle type is a pointer-sized newtype so that it matches the engine's
//! `JPH_*` pointer arguments on every target.

/// Untyped native handle as stored in the [`HandleRegistry`](crate::registry::HandleRegistry).
pub type RawHandle = usize;

/// The reserved invalid handle value.
pub const NULL_HANDLE: RawHandle = 0;

/// Macro to define a handle type.
macro_rules! define_handle {
    ($name:ident) => {
        /// Opaque handle to a native engine object.
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name {
            _h: RawHandle,
        }

        impl $name {
            /// Create an invalid (null) handle.
            #[inline]
            pub const fn invalid() -> Self {
                Self { _h: NULL_HANDLE }
            }

            /// Wrap a raw handle value.
            #[inline]
            pub const fn from_raw(raw: RawHandle) -> Self {
                Self { _h: raw }
            }

            /// The raw pointer-sized value.
            #[inline]
            pub const fn raw(&self) -> RawHandle {
                self._h
            }

            /// Check if this handle is valid (non-zero).
            #[inline]
            pub const fn is_valid(&self) -> bool {
                self._h != NULL_HANDLE
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

define_handle!(ShapeHandle);
define_handle!(BodyHandle);
define_handle!(ListenerHandle);
define_handle!(FilterHandle);
