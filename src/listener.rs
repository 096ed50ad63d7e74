//! Contact and body activation listeners.
//!
//! A listener owns a native listener object and the callback token the engine
//! calls it back with. Disposal destroys the native listener first and releases
//! the token afterwards, so the engine never holds a token that has been
//! released while the listener still exists.
//!
//! Listeners default to [`TokenMode::Weak`]. Engines that tear listeners down
//! asynchronously may deliver a callback after disposal has started; with a weak
//! token that callback becomes a no-op once the handler is gone.

use std::os::raw::c_void;
use std::sync::Arc;

use tracing::warn;

use crate::body::Body;
use crate::error::{Error, Result};
use crate::ffi::{
    BodyHandle, JphBodyActivationListenerProcs, JphBodyId, JphContactListenerProcs, JphRVec3,
    JphSubShapeIdPair, JphValidateResult, ListenerHandle,
};
use crate::lifecycle::{Lifecycle, NativeObject};
use crate::runtime::{self, Runtime};
use crate::token::Token;
use crate::trampoline;
use crate::types::{BodyId, DisposeReason, Ownership, SubShapeIdPair, TokenMode, ValidateResult};

/// Receives contact events. Runs on engine worker threads.
pub trait ContactHandler: Send + Sync + 'static {
    /// Called before a contact is created. `base_offset` is the world-space
    /// origin that contact positions are relative to.
    fn on_contact_validate(
        &self,
        _body1: &Arc<Body>,
        _body2: &Arc<Body>,
        _base_offset: [f64; 3],
    ) -> ValidateResult {
        ValidateResult::AcceptAllContacts
    }

    /// A new contact between two bodies.
    fn on_contact_added(&self, _body1: &Arc<Body>, _body2: &Arc<Body>) {}

    /// A contact that existed last step still exists.
    fn on_contact_persisted(&self, _body1: &Arc<Body>, _body2: &Arc<Body>) {}

    /// A contact was removed. Bodies may already be gone, so only ids are given.
    fn on_contact_removed(&self, _pair: SubShapeIdPair) {}
}

struct ContactDispatch {
    handler: Box<dyn ContactHandler>,
}

static CONTACT_PROCS: JphContactListenerProcs = JphContactListenerProcs {
    on_contact_validate: Some(contact_validate),
    on_contact_added: Some(contact_added),
    on_contact_persisted: Some(contact_persisted),
    on_contact_removed: Some(contact_removed),
};

fn body_pair(body1: BodyHandle, body2: BodyHandle) -> Option<(Arc<Body>, Arc<Body>)> {
    Some((Body::from_handle(body1).ok()?, Body::from_handle(body2).ok()?))
}

unsafe extern "C" fn contact_validate(
    user_data: *mut c_void,
    body1: BodyHandle,
    body2: BodyHandle,
    base_offset: *const JphRVec3,
) -> JphValidateResult {
    let offset = base_offset.as_ref().copied().unwrap_or_default();
    let fallback = ValidateResult::AcceptAllContacts;
    trampoline::dispatch(user_data, fallback, |dispatch: &ContactDispatch| {
        match body_pair(body1, body2) {
            Some((b1, b2)) => {
                dispatch
                    .handler
                    .on_contact_validate(&b1, &b2, [offset.x, offset.y, offset.z])
            }
            None => fallback,
        }
    })
    .into()
}

unsafe extern "C" fn contact_added(user_data: *mut c_void, body1: BodyHandle, body2: BodyHandle) {
    trampoline::dispatch(user_data, (), |dispatch: &ContactDispatch| {
        if let Some((b1, b2)) = body_pair(body1, body2) {
            dispatch.handler.on_contact_added(&b1, &b2);
        }
    })
}

unsafe extern "C" fn contact_persisted(
    user_data: *mut c_void,
    body1: BodyHandle,
    body2: BodyHandle,
) {
    trampoline::dispatch(user_data, (), |dispatch: &ContactDispatch| {
        if let Some((b1, b2)) = body_pair(body1, body2) {
            dispatch.handler.on_contact_persisted(&b1, &b2);
        }
    })
}

unsafe extern "C" fn contact_removed(user_data: *mut c_void, pair: *const JphSubShapeIdPair) {
    let Some(pair) = pair.as_ref().copied() else {
        return;
    };
    trampoline::dispatch(user_data, (), |dispatch: &ContactDispatch| {
        dispatch.handler.on_contact_removed(pair.into());
    })
}

/// A native contact listener forwarding to a [`ContactHandler`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use jph::{Body, ContactHandler, ContactListener};
///
/// struct Logger;
///
/// impl ContactHandler for Logger {
///     fn on_contact_added(&self, body1: &Arc<Body>, body2: &Arc<Body>) {
///         println!("{:?} touched {:?}", body1.id(), body2.id());
///     }
/// }
///
/// let listener = ContactListener::new(Logger)?;
/// // Hand listener.native_handle() to the physics system...
/// # Ok::<(), jph::Error>(())
/// ```
pub struct ContactListener {
    lifecycle: Lifecycle,
    handle: ListenerHandle,
    token: Token,
    dispatch: Arc<ContactDispatch>,
    runtime: &'static Runtime,
}

impl ContactListener {
    const TYPE_NAME: &'static str = "ContactListener";

    /// Create a listener with a weak callback token.
    pub fn new(handler: impl ContactHandler) -> Result<Arc<Self>> {
        Self::with_token_mode(handler, TokenMode::Weak)
    }

    /// Create a listener with the given token mode.
    pub fn with_token_mode(handler: impl ContactHandler, mode: TokenMode) -> Result<Arc<Self>> {
        let runtime = runtime::get()?;
        let dispatch = Arc::new(ContactDispatch {
            handler: Box::new(handler),
        });

        let token = runtime.tokens.create(Some(&dispatch), mode);
        if token.is_null() {
            return Err(Error::OutOfMemory);
        }
        let handle = unsafe { (runtime.api.contact_listener_create)(&CONTACT_PROCS, token.as_user_data()) };
        if !handle.is_valid() {
            runtime.tokens.release(token);
            warn!("contact_listener_create returned a null listener");
            return Err(Error::InvalidHandle);
        }

        let listener = Arc::new(Self {
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
        runtime.registry.register(handle.raw(), &listener);
        Ok(listener)
    }

    /// Get the underlying handle.
    pub fn native_handle(&self) -> Result<ListenerHandle> {
        self.lifecycle.ensure_live()?;
        Ok(self.handle)
    }

    /// The token the engine passes back to the trampolines.
    pub fn token(&self) -> Token {
        self.token
    }

    /// The handler events are forwarded to.
    pub fn handler(&self) -> &dyn ContactHandler {
        &*self.dispatch.handler
    }
}

impl NativeObject for ContactListener {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release_native(&self) {
        unsafe { (self.runtime.api.contact_listener_destroy)(self.handle) }
    }

    fn release_callbacks(&self) {
        self.runtime.tokens.release(self.token);
    }
}

impl Drop for ContactListener {
    fn drop(&mut self) {
        self.dispose_with(DisposeReason::Dropped);
    }
}

/// Receives body activation events. Runs on engine worker threads.
pub trait BodyActivationHandler: Send + Sync + 'static {
    /// A body went from sleeping to active.
    fn on_body_activated(&self, _body_id: BodyId, _user_data: u64) {}

    /// A body went to sleep.
    fn on_body_deactivated(&self, _body_id: BodyId, _user_data: u64) {}
}

struct ActivationDispatch {
    handler: Box<dyn BodyActivationHandler>,
}

static ACTIVATION_PROCS: JphBodyActivationListenerProcs = JphBodyActivationListenerProcs {
    on_body_activated: Some(body_activated),
    on_body_deactivated: Some(body_deactivated),
};

unsafe extern "C" fn body_activated(user_data: *mut c_void, body_id: JphBodyId, body_user_data: u64) {
    trampoline::dispatch(user_data, (), |dispatch: &ActivationDispatch| {
        dispatch
            .handler
            .on_body_activated(BodyId(body_id), body_user_data);
    })
}

unsafe extern "C" fn body_deactivated(user_data: *mut c_void, body_id: JphBodyId, body_user_data: u64) {
    trampoline::dispatch(user_data, (), |dispatch: &ActivationDispatch| {
        dispatch
            .handler
            .on_body_deactivated(BodyId(body_id), body_user_data);
    })
}

/// A native body activation listener forwarding to a [`BodyActivationHandler`].
pub struct BodyActivationListener {
    lifecycle: Lifecycle,
    handle: ListenerHandle,
    token: Token,
    dispatch: Arc<ActivationDispatch>,
    runtime: &'static Runtime,
}

impl BodyActivationListener {
    const TYPE_NAME: &'static str = "BodyActivationListener";

    /// Create a listener with a weak callback token.
    pub fn new(handler: impl BodyActivationHandler) -> Result<Arc<Self>> {
        Self::with_token_mode(handler, TokenMode::Weak)
    }

    /// Create a listener with the given token mode.
    pub fn with_token_mode(
        handler: impl BodyActivationHandler,
        mode: TokenMode,
    ) -> Result<Arc<Self>> {
        let runtime = runtime::get()?;
        let dispatch = Arc::new(ActivationDispatch {
            handler: Box::new(handler),
        });

        let token = runtime.tokens.create(Some(&dispatch), mode);
        if token.is_null() {
            return Err(Error::OutOfMemory);
        }
        let handle = unsafe {
            (runtime.api.body_activation_listener_create)(&ACTIVATION_PROCS, token.as_user_data())
        };
        if !handle.is_valid() {
            runtime.tokens.release(token);
            warn!("body_activation_listener_create returned a null listener");
            return Err(Error::InvalidHandle);
        }

        let listener = Arc::new(Self {
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
        runtime.registry.register(handle.raw(), &listener);
        Ok(listener)
    }

    /// Get the underlying handle.
    pub fn native_handle(&self) -> Result<ListenerHandle> {
        self.lifecycle.ensure_live()?;
        Ok(self.handle)
    }

    /// The token the engine passes back to the trampolines.
    pub fn token(&self) -> Token {
        self.token
    }

    /// The handler events are forwarded to.
    pub fn handler(&self) -> &dyn BodyActivationHandler {
        &*self.dispatch.handler
    }
}

impl NativeObject for BodyActivationListener {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn release_native(&self) {
        unsafe { (self.runtime.api.body_activation_listener_destroy)(self.handle) }
    }

    fn release_callbacks(&self) {
        self.runtime.tokens.release(self.token);
    }
}

impl Drop for BodyActivationListener {
    fn drop(&mut self) {
        self.dispose_with(DisposeReason::Dropped);
    }
}
