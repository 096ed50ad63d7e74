//! Collision filters implemented on the host side.

use std::os::raw::c_void;
use std::sync::Arc;

use tracing::warn;

use crate::error::{Error, Result};
use crate::ffi::{FilterHandle, JphObjectLayer, JphObjectLayerPairFilterProcs};
use crate::lifecycle::{Lifecycle, NativeObject};
use crate::runtime::{self, Runtime};
use crate::token::Token;
use crate::trampoline;
use crate::types::{DisposeReason, ObjectLayer, Ownership, TokenMode};

/// Decides whether two object layers can collide. Runs on engine worker threads.
pub trait ObjectLayerPairHandler: Send + Sync + 'static {
    /// True if objects in `layer1` and `layer2` should collide.
    fn should_collide(&self, layer1: ObjectLayer, layer2: ObjectLayer) -> bool;
}

impl<F> ObjectLayerPairHandler for F
where
    F: Fn(ObjectLayer, ObjectLayer) -> bool + Send + Sync + 'static,
{
    fn should_collide(&self, layer1: ObjectLayer, layer2: ObjectLayer) -> bool {
        self(layer1, layer2)
    }
}

struct FilterDispatch {
    handler: Box<dyn ObjectLayerPairHandler>,
}

static FILTER_PROCS: JphObjectLayerPairFilterProcs = JphObjectLayerPairFilterProcs {
    should_collide: Some(should_collide),
};

// An unresolvable token lets the pair collide, matching the engine's default filter.
unsafe extern "C" fn should_collide(
    user_data: *mut c_void,
    layer1: JphObjectLayer,
    layer2: JphObjectLayer,
) -> bool {
    trampoline::dispatch(user_data, true, |dispatch: &FilterDispatch| {
        dispatch
            .handler
            .should_collide(ObjectLayer(layer1), ObjectLayer(layer2))
    })
}

/// A native object layer pair filter forwarding to an [`ObjectLayerPairHandler`].
///
/// Filters default to a strong token: the engine consults them for as long as
/// the physics system exists, and a dropped handler must not silently turn into
/// "collide everything".
///
/// # Example
///
/// ```no_run
/// use jph::{ObjectLayer, ObjectLayerPairFilter};
///
/// const STATIC: ObjectLayer = ObjectLayer(0);
///
/// let filter = ObjectLayerPairFilter::new(|a: ObjectLayer, b: ObjectLayer| {
///     !(a == STATIC && b == STATIC)
/// })?;
/// # Ok::<(), jph::Error>(())
/// ```
pub struct ObjectLayerPairFilter {
    lifecycle: Lifecycle,
    handle: FilterHandle,
    token: Token,
    dispatch: Arc<FilterDispatch>,
    runtime: &'static Runtime,
}

impl ObjectLayerPairFilter {
    const TYPE_NAME: &'static str = "ObjectLayerPairFilter";

    /// Create a filter with a strong callback token.
    pub fn new(handler: impl ObjectLayerPairHandler) -> Result<Arc<Self>> {
        Self::with_token_mode(handler, TokenMode::Strong)
    }

    /// Create a filter with the given token mode.
    pub fn with_token_mode(
        handler: impl ObjectLayerPairHandler,
        mode: TokenMode,
    ) -> Result<Arc<Self>> {
        let runtime = runtime::get()?;
        let dispatch = Arc::new(FilterDispatch {
            handler: Box::new(handler),
        });

        let token = runtime.tokens.create(Some(&dispatch), mode);
        if token.is_null() {
            return Err(Error::OutOfMemory);
        }
        let handle = unsafe {
            (runtime.api.object_layer_pair_filter_create)(&FILTER_PROCS, token.as_user_data())
        };
        if !handle.is_valid() {
            runtime.tokens.release(token);
            warn!("object_layer_pair_filter_create returned a null filter");
            return Err(Error::InvalidHandle);
        }

        let filter = Arc::new(Self {
            lifecycle: Lifecycle::new(
                Self::TYPE_NAME,
                handle.raw(),
                Ownership::Owned,
                runtime.registry.clone(),
            ),
            handle,
            token,
            dispatch,
            runtime,
        });
        runtime.registry.register(handle.raw(), &filter);
        Ok(filter)
    }

    /// Get the underlying handle.
    pub fn native_handle(&self) -> Result<FilterHandle> {
        self.lifecycle.ensure_live()?;
        Ok(self.handle)
    }

    /// The token the engine passes back to the trampoline.
    pub fn token(&self) -> Token {
        self.token
    }

    /// Ask the handler directly, without going through the engine.
    pub fn should_collide(&self, layer1: ObjectLayer, layer2: ObjectLayer) -> Result<bool> {
        self.lifecycle.debug_ensure_live()?;
        Ok(self.dispatch.handler.should_collide(layer1, layer2))
    }
}

impl NativeObject for ObjectLayerPairFilter {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release_native(&self) {
        unsafe { (self.runtime.api.object_layer_pair_filter_destroy)(self.handle) }
    }

    fn release_callbacks(&self) {
        self.runtime.tokens.release(self.token);
    }
}

impl Drop for ObjectLayerPairFilter {
    fn drop(&mut self) {
        self.dispose_with(DisposeReason::Dropped);
    }
}
