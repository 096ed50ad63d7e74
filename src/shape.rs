//! Collision shapes.

use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, Result};
use crate::ffi::{check_result, ShapeHandle};
use crate::lifecycle::{Lifecycle, NativeObject};
use crate::runtime::{self, Runtime};
use crate::types::{DisposeReason, Ownership};

/// A native collision shape.
///
/// A shape created through this crate owns its native object and destroys it
/// when disposed. A shape obtained from the engine (for example from
/// [`Body::shape()`](crate::Body::shape)) is a view and leaves the native object
/// alone. Either way there is at most one live `Shape` per native handle.
///
/// # Example
///
/// ```no_run
/// use jph::Shape;
///
/// let sphere = Shape::sphere(0.5)?;
/// println!("volume: {}", sphere.volume()?);
///
/// // Native shape is destroyed here
/// drop(sphere);
/// # Ok::<(), jph::Error>(())
/// ```
pub struct Shape {
    lifecycle: Lifecycle,
    handle: ShapeHandle,
    runtime: &'static Runtime,
}

impl Shape {
    const TYPE_NAME: &'static str = "Shape";

    /// Create a sphere shape owned by the returned wrapper.
    pub fn sphere(radius: f32) -> Result<Arc<Self>> {
        if !(radius > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "sphere radius must be positive, got {}",
                radius
            )));
        }

        let runtime = runtime::get()?;
        let mut handle = ShapeHandle::invalid();
        let code = unsafe { (runtime.api.sphere_shape_create)(radius, &mut handle) };
        check_result(code)?;
        if !handle.is_valid() {
            warn!(radius, "sphere_shape_create returned a null shape");
            return Err(Error::InvalidHandle);
        }

        Ok(Self::wrap(runtime, handle, Ownership::Owned))
    }

    /// Get the wrapper for a shape whose lifetime is managed by the engine.
    ///
    /// Returns the existing wrapper if one is live, owned or not.
    pub fn from_handle(handle: ShapeHandle) -> Result<Arc<Self>> {
        if !handle.is_valid() {
            return Err(Error::InvalidHandle);
        }
        let runtime = runtime::get()?;
        Ok(runtime.registry.get_or_create(handle.raw(), |raw| {
            let view = Self::new_arc(runtime, ShapeHandle::from_raw(raw), Ownership::View);
            runtime.registry.register_if_absent(raw, view)
        }))
    }

    fn wrap(runtime: &'static Runtime, handle: ShapeHandle, ownership: Ownership) -> Arc<Self> {
        let shape = Self::new_arc(runtime, handle, ownership);
        runtime.registry.register(handle.raw(), &shape);
        shape
    }

    fn new_arc(runtime: &'static Runtime, handle: ShapeHandle, ownership: Ownership) -> Arc<Self> {
        Arc::new(Self {
            lifecycle: Lifecycle::new(
                Self::TYPE_NAME,
                handle.raw(),
                ownership,
                runtime.registry.clone(),
            ),
            handle,
            runtime,
        })
    }

    /// Get the underlying handle.
    pub fn native_handle(&self) -> ShapeHandle {
        self.handle
    }

    /// Whether this wrapper destroys the native shape.
    pub fn owns_handle(&self) -> bool {
        self.lifecycle.ownership() == Ownership::Owned
    }

    /// Volume of the shape.
    pub fn volume(&self) -> Result<f32> {
        self.lifecycle.debug_ensure_live()?;
        Ok(unsafe { (self.runtime.api.shape_get_volume)(self.handle) })
    }
}

impl NativeObject for Shape {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release_native(&self) {
        unsafe { (self.runtime.api.shape_destroy)(self.handle) }
    }
}

impl Drop for Shape {
    fn drop(&mut self) {
        self.dispose_with(DisposeReason::Dropped);
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("handle", &format_args!("{:#x}", self.handle.raw()))
            .field("ownership", &self.lifecycle.ownership())
            .field("disposed", &self.lifecycle.is_disposed())
            .finish()
    }
}
