//! Disposal state machine shared by every wrapper.
//!
//! A wrapper moves from live to disposed exactly once. Whichever thread wins the
//! transition runs the teardown; every other caller observes the disposed state
//! and returns. `Drop` goes through the same path, so releasing a wrapper by
//! scope exit and calling [`NativeObject::dispose`] are interchangeable.

use std::any::Any;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::error::{Error, Result};
use crate::ffi::RawHandle;
use crate::registry::HandleRegistry;
use crate::types::{DisposeReason, Ownership};

const LIVE: u8 = 0;
const DISPOSING: u8 = 1;
const DISPOSED: u8 = 2;

/// Per-wrapper disposal state.
pub struct Lifecycle {
    handle: RawHandle,
    state: AtomicU8,
    ownership: Ownership,
    type_name: &'static str,
    registry: Arc<HandleRegistry>,
}

impl Lifecycle {
    /// Create the state for a live wrapper of `handle`.
    pub fn new(
        type_name: &'static str,
        handle: RawHandle,
        ownership: Ownership,
        registry: Arc<HandleRegistry>,
    ) -> Self {
        Self {
            handle,
            state: AtomicU8::new(LIVE),
            ownership,
            type_name,
            registry,
        }
    }

    /// The native handle this wrapper represents.
    #[inline]
    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    /// Whether the wrapper destroys its native object on disposal.
    #[inline]
    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// Name used in disposed errors and logs.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The registry the wrapper is registered with.
    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    /// True once disposal has started.
    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.state.load(Ordering::Acquire) != LIVE
    }

    /// Fail with [`Error::Disposed`] if disposal has started.
    #[inline]
    pub fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            return Err(Error::Disposed {
                type_name: self.type_name,
            });
        }
        Ok(())
    }

    /// Hot-path variant of [`ensure_live`](Self::ensure_live).
    ///
    /// Compiled out of release builds unless the `strict-guards` feature is
    /// enabled; the engine's own handle checks are the backstop there.
    #[inline(always)]
    pub fn debug_ensure_live(&self) -> Result<()> {
        #[cfg(any(debug_assertions, feature = "strict-guards"))]
        {
            self.ensure_live()
        }
        #[cfg(not(any(debug_assertions, feature = "strict-guards")))]
        {
            Ok(())
        }
    }

    fn begin_dispose(&self) -> bool {
        self.state
            .compare_exchange(LIVE, DISPOSING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn finish_dispose(&self) {
        self.state.store(DISPOSED, Ordering::Release);
    }
}

/// Conversion to `dyn Any` so registry entries can be downcast.
pub trait AsAnyArc {
    /// Upcast to a type-erased `Arc`.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Borrow as `dyn Any`.
    ///
    /// Call through `AsAnyArc::as_any(&*arc)`; on an `Arc` receiver method
    /// lookup picks the `Arc` itself.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync> AsAnyArc for T {
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A host-side object standing in for a native handle.
///
/// Implementors provide their [`Lifecycle`] and the native teardown. Every
/// implementor must call `self.dispose_with(DisposeReason::Dropped)` from its
/// `Drop` impl.
pub trait NativeObject: AsAnyArc + Send + Sync + 'static {
    /// Disposal state.
    fn lifecycle(&self) -> &Lifecycle;

    /// Destroy the native object.
    ///
    /// Only called for [`Ownership::Owned`] wrappers, never for a displaced
    /// wrapper, and never with a registry lock held.
    fn release_native(&self);

    /// Release callback tokens handed to the engine. Runs after
    /// [`release_native`](Self::release_native).
    fn release_callbacks(&self) {}

    /// The native handle.
    fn handle(&self) -> RawHandle {
        self.lifecycle().handle()
    }

    /// True once disposal has started.
    fn is_disposed(&self) -> bool {
        self.lifecycle().is_disposed()
    }

    /// Dispose explicitly. Returns `false` if the wrapper was already disposed.
    fn dispose(&self) -> bool {
        self.dispose_with(DisposeReason::Explicit)
    }

    /// Run teardown once for `reason`.
    ///
    /// When called from `Drop` this must not reach other host objects; the
    /// teardown below only talks to the engine, the token arena and the registry.
    fn dispose_with(&self, reason: DisposeReason) -> bool {
        let lifecycle = self.lifecycle();
        if !lifecycle.begin_dispose() {
            return false;
        }

        trace!(
            type_name = lifecycle.type_name(),
            handle = lifecycle.handle(),
            ?reason,
            "disposing"
        );

        if lifecycle.ownership() == Ownership::Owned && reason != DisposeReason::Displaced {
            self.release_native();
        }
        lifecycle
            .registry()
            .unregister_addr(lifecycle.handle(), self as *const Self as *const ());
        self.release_callbacks();
        lifecycle.finish_dispose();
        true
    }
}
