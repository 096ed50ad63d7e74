//! Rigid bodies.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::ffi::BodyHandle;
use crate::lifecycle::{Lifecycle, NativeObject};
use crate::runtime::{self, Runtime};
use crate::shape::Shape;
use crate::types::{BodyId, DisposeReason, Ownership};

/// View of a native body.
///
/// Bodies are owned by the engine's body manager, so a `Body` never destroys
/// its native object. The same `Arc<Body>` is handed out for a handle for as long
/// as anyone holds it, including to contact callbacks running on engine worker
/// threads.
pub struct Body {
    lifecycle: Lifecycle,
    handle: BodyHandle,
    runtime: &'static Runtime,
}

impl Body {
    const TYPE_NAME: &'static str = "Body";

    /// Get the wrapper for `handle`, creating a view if none is live.
    pub fn from_handle(handle: BodyHandle) -> Result<Arc<Self>> {
        if !handle.is_valid() {
            return Err(Error::InvalidHandle);
        }
        let runtime = runtime::get()?;
        Ok(runtime
            .registry
            .get_or_create(handle.raw(), |raw| Self::view(runtime, BodyHandle::from_raw(raw))))
    }

    fn view(runtime: &'static Runtime, handle: BodyHandle) -> Arc<Self> {
        let body = Arc::new(Self {
            lifecycle: Lifecycle::new(
                Self::TYPE_NAME,
                handle.raw(),
                Ownership::View,
                runtime.registry.clone(),
            ),
            handle,
            runtime,
        });
        runtime.registry.register_if_absent(handle.raw(), body)
    }

    /// Get the underlying handle.
    pub fn native_handle(&self) -> BodyHandle {
        self.handle
    }

    /// Engine-assigned body identifier.
    pub fn id(&self) -> Result<BodyId> {
        self.lifecycle.debug_ensure_live()?;
        Ok(BodyId(unsafe { (self.runtime.api.body_get_id)(self.handle) }))
    }

    /// Application value stored on the native body.
    pub fn user_data(&self) -> Result<u64> {
        self.lifecycle.ensure_live()?;
        Ok(unsafe { (self.runtime.api.body_get_user_data)(self.handle) })
    }

    /// Store an application value on the native body.
    pub fn set_user_data(&self, user_data: u64) -> Result<()> {
        self.lifecycle.ensure_live()?;
        unsafe { (self.runtime.api.body_set_user_data)(self.handle, user_data) };
        Ok(())
    }

    /// The body's collision shape.
    ///
    /// If the shape was created through this crate and is still alive, that same
    /// wrapper is returned.
    pub fn shape(&self) -> Result<Arc<Shape>> {
        self.lifecycle.ensure_live()?;
        let handle = unsafe { (self.runtime.api.body_get_shape)(self.handle) };
        Shape::from_handle(handle)
    }
}

impl NativeObject for Body {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    // Views never own the native body.
    fn release_native(&self) {}
}

impl Drop for Body {
    fn drop(&mut self) {
        self.dispose_with(DisposeReason::Dropped);
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("handle", &format_args!("{:#x}", self.handle.raw()))
            .field("disposed", &self.lifecycle.is_disposed())
            .finish()
    }
}
