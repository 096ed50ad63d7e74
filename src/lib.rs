//! Object identity and lifetime bridge for a native rigid-body physics engine.
//!
//! The engine owns every body, shape and listener; this crate owns the host-side
//! wrappers that stand in for them. Three pieces keep the two sides consistent:
//!
//! - [`HandleRegistry`] maps each native handle to the one live wrapper that
//!   represents it, without keeping that wrapper alive.
//! - [`TokenArena`] turns host callback targets into integer [`Token`]s that the
//!   engine carries as `user_data` and hands back to the `extern "C"`
//!   trampolines.
//! - [`NativeObject`] gives every wrapper one idempotent, thread-safe disposal
//!   path, used both by explicit [`dispose`](NativeObject::dispose) and by `Drop`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use jph::{Body, BridgeOptions, ContactHandler, ContactListener, NativeApi, NativeObject, Shape};
//!
//! fn run(api: NativeApi) -> jph::Result<()> {
//!     // Install the engine's entry points once per process
//!     jph::init(api, BridgeOptions::default())?;
//!
//!     // Owned shape: destroyed when the last Arc goes away
//!     let sphere = Shape::sphere(0.5)?;
//!     println!("volume: {}", sphere.volume()?);
//!
//!     // Listener: the engine calls back through a token, never a raw pointer
//!     struct Printer;
//!     impl ContactHandler for Printer {
//!         fn on_contact_added(&self, a: &Arc<Body>, b: &Arc<Body>) {
//!             println!("{:?} hit {:?}", a.id(), b.id());
//!         }
//!     }
//!     let listener = ContactListener::new(Printer)?;
//!
//!     // Explicit disposal; dropping would do the same
//!     listener.dispose();
//!     Ok(())
//! }
//! ```

pub mod body;
pub mod error;
pub mod ffi;
pub mod filter;
pub mod lifecycle;
pub mod listener;
pub mod registry;
mod runtime;
pub mod shape;
pub mod token;
mod trampoline;
pub mod types;

// Re-export main types at the crate root
pub use body::Body;
pub use error::{Error, Result};
pub use ffi::NativeApi;
pub use filter::{ObjectLayerPairFilter, ObjectLayerPairHandler};
pub use lifecycle::{Lifecycle, NativeObject};
pub use listener::{BodyActivationHandler, BodyActivationListener, ContactHandler, ContactListener};
pub use registry::HandleRegistry;
pub use shape::Shape;
pub use token::{Token, TokenArena};
pub use types::{
    BodyId, BridgeOptions, DisposeReason, ObjectLayer, Ownership, SubShapeIdPair, TokenMode,
    ValidateResult,
};

/// Native ABI version constants.
pub mod version {
    /// ABI major version this crate was built against.
    pub const MAJOR: u32 = 0;
    /// Lowest ABI minor version this crate requires.
    pub const MINOR: u32 = 1;

    /// Check if an engine reporting `major.minor` can be used by this crate.
    ///
    /// The major version must match exactly; the engine may be newer in minor
    /// version, never older.
    pub fn abi_version_compatible(major: u32, minor: u32) -> bool {
        major == MAJOR && minor >= MINOR
    }
}

/// Install the engine's entry points and create the process-wide registry and
/// token arena.
///
/// Must be called before any wrapper is created. Can only succeed once per
/// process; later calls return [`Error::AlreadyInitialized`].
pub fn init(api: NativeApi, options: BridgeOptions) -> Result<()> {
    runtime::install(api, options)
}

/// Check whether [`init`] has succeeded.
pub fn is_initialized() -> bool {
    runtime::is_installed()
}

/// The process-wide registry installed by [`init`].
pub fn registry() -> Result<&'static HandleRegistry> {
    let runtime = runtime::get()?;
    Ok(&*runtime.registry)
}

/// The process-wide token arena installed by [`init`].
pub fn tokens() -> Result<&'static TokenArena> {
    let runtime = runtime::get()?;
    Ok(&runtime.tokens)
}
