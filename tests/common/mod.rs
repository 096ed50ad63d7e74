//! In-process stand-in for the native engine.
//!
//! Implements the `NativeApi` table with `extern "C"` functions over global
//! tables, records destroy calls, and lets tests invoke stored callback
//! procedures the way engine worker threads would.

#![allow(dead_code)]

use std::collections::HashMap;
use std::f32::consts::PI;
use std::os::raw::c_void;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Once;

use jph::ffi::{
    BodyHandle, FilterHandle, JphBodyActivationListenerProcs, JphBodyId, JphContactListenerProcs,
    JphObjectLayerPairFilterProcs, JphRVec3, JphResult, JphSubShapeIdPair, JphValidateResult,
    ListenerHandle, RawHandle, ShapeHandle, JPH_ERR_INVALID_ARGUMENT, JPH_OK,
    JPH_VALIDATE_ACCEPT_ALL_CONTACTS,
};
use jph::{BridgeOptions, NativeApi};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

/// ABI reported by the fake engine (0.1).
pub const FAKE_ABI: u32 = 1;

static NEXT_HANDLE: AtomicUsize = AtomicUsize::new(0x1000);
static NEXT_BODY_ID: AtomicU32 = AtomicU32::new(1);

struct FakeBody {
    id: JphBodyId,
    user_data: u64,
    shape: RawHandle,
}

/// Stored `(procs, user_data)` of a native listener or filter.
#[derive(Clone, Copy)]
struct Callbacks {
    procs: usize,
    user_data: usize,
}

static SHAPES: Lazy<Mutex<HashMap<RawHandle, f32>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static BODIES: Lazy<Mutex<HashMap<RawHandle, FakeBody>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static CONTACT_LISTENERS: Lazy<Mutex<HashMap<RawHandle, Callbacks>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static ACTIVATION_LISTENERS: Lazy<Mutex<HashMap<RawHandle, Callbacks>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static FILTERS: Lazy<Mutex<HashMap<RawHandle, Callbacks>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static DESTROYED: Lazy<Mutex<HashMap<RawHandle, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));
/// Radius bits -> handle the next sphere of that radius should reuse.
static REUSE: Lazy<Mutex<HashMap<u32, RawHandle>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn next_handle() -> RawHandle {
    NEXT_HANDLE.fetch_add(0x10, Ordering::SeqCst)
}

fn record_destroy(raw: RawHandle) {
    *DESTROYED.lock().entry(raw).or_insert(0) += 1;
}

unsafe extern "C" fn abi_version() -> u32 {
    FAKE_ABI
}

unsafe extern "C" fn sphere_shape_create(radius: f32, out_shape: *mut ShapeHandle) -> JphResult {
    if !(radius > 0.0) || out_shape.is_null() {
        return JPH_ERR_INVALID_ARGUMENT;
    }
    let raw = REUSE
        .lock()
        .remove(&radius.to_bits())
        .unwrap_or_else(next_handle);
    SHAPES.lock().insert(raw, radius);
    *out_shape = ShapeHandle::from_raw(raw);
    JPH_OK
}

unsafe extern "C" fn shape_destroy(shape: ShapeHandle) {
    SHAPES.lock().remove(&shape.raw());
    record_destroy(shape.raw());
}

unsafe extern "C" fn shape_get_volume(shape: ShapeHandle) -> f32 {
    SHAPES
        .lock()
        .get(&shape.raw())
        .map(|r| 4.0 / 3.0 * PI * r * r * r)
        .unwrap_or(0.0)
}

unsafe extern "C" fn body_get_id(body: BodyHandle) -> JphBodyId {
    BODIES.lock().get(&body.raw()).map(|b| b.id).unwrap_or(u32::MAX)
}

unsafe extern "C" fn body_get_user_data(body: BodyHandle) -> u64 {
    BODIES.lock().get(&body.raw()).map(|b| b.user_data).unwrap_or(0)
}

unsafe extern "C" fn body_set_user_data(body: BodyHandle, user_data: u64) {
    if let Some(b) = BODIES.lock().get_mut(&body.raw()) {
        b.user_data = user_data;
    }
}

unsafe extern "C" fn body_get_shape(body: BodyHandle) -> ShapeHandle {
    BODIES
        .lock()
        .get(&body.raw())
        .map(|b| ShapeHandle::from_raw(b.shape))
        .unwrap_or_default()
}

unsafe extern "C" fn contact_listener_create(
    procs: *const JphContactListenerProcs,
    user_data: *mut c_void,
) -> ListenerHandle {
    let raw = next_handle();
    CONTACT_LISTENERS.lock().insert(
        raw,
        Callbacks {
            procs: procs as usize,
            user_data: user_data as usize,
        },
    );
    ListenerHandle::from_raw(raw)
}

unsafe extern "C" fn contact_listener_destroy(listener: ListenerHandle) {
    CONTACT_LISTENERS.lock().remove(&listener.raw());
    record_destroy(listener.raw());
}

unsafe extern "C" fn body_activation_listener_create(
    procs: *const JphBodyActivationListenerProcs,
    user_data: *mut c_void,
) -> ListenerHandle {
    let raw = next_handle();
    ACTIVATION_LISTENERS.lock().insert(
        raw,
        Callbacks {
            procs: procs as usize,
            user_data: user_data as usize,
        },
    );
    ListenerHandle::from_raw(raw)
}

unsafe extern "C" fn body_activation_listener_destroy(listener: ListenerHandle) {
    ACTIVATION_LISTENERS.lock().remove(&listener.raw());
    record_destroy(listener.raw());
}

unsafe extern "C" fn object_layer_pair_filter_create(
    procs: *const JphObjectLayerPairFilterProcs,
    user_data: *mut c_void,
) -> FilterHandle {
    let raw = next_handle();
    FILTERS.lock().insert(
        raw,
        Callbacks {
            procs: procs as usize,
            user_data: user_data as usize,
        },
    );
    FilterHandle::from_raw(raw)
}

unsafe extern "C" fn object_layer_pair_filter_destroy(filter: FilterHandle) {
    FILTERS.lock().remove(&filter.raw());
    record_destroy(filter.raw());
}

/// The fake engine's function table.
pub fn api() -> NativeApi {
    NativeApi {
        abi_version,
        sphere_shape_create,
        shape_destroy,
        shape_get_volume,
        body_get_id,
        body_get_user_data,
        body_set_user_data,
        body_get_shape,
        contact_listener_create,
        contact_listener_destroy,
        body_activation_listener_create,
        body_activation_listener_destroy,
        object_layer_pair_filter_create,
        object_layer_pair_filter_destroy,
    }
}

/// Install the fake engine once for this test binary.
pub fn install() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        jph::init(api(), BridgeOptions::default()).expect("init should succeed");
    });
}

/// Create a shape the way the engine would for its own use.
pub fn spawn_native_shape(radius: f32) -> ShapeHandle {
    let raw = next_handle();
    SHAPES.lock().insert(raw, radius);
    ShapeHandle::from_raw(raw)
}

/// Add a body using `shape`, returning its handle.
pub fn spawn_body(shape: ShapeHandle) -> BodyHandle {
    let raw = next_handle();
    let id = NEXT_BODY_ID.fetch_add(1, Ordering::SeqCst);
    BODIES.lock().insert(
        raw,
        FakeBody {
            id,
            user_data: 0,
            shape: shape.raw(),
        },
    );
    BodyHandle::from_raw(raw)
}

/// Make the next sphere of exactly `radius` reuse `raw`, as an engine reusing
/// freed memory would.
pub fn reuse_handle_for_radius(radius: f32, raw: RawHandle) {
    REUSE.lock().insert(radius.to_bits(), raw);
}

/// How many times the engine destroyed `raw`.
pub fn destroy_count(raw: RawHandle) -> usize {
    DESTROYED.lock().get(&raw).copied().unwrap_or(0)
}

pub fn shape_alive(raw: RawHandle) -> bool {
    SHAPES.lock().contains_key(&raw)
}

pub fn contact_listener_alive(raw: RawHandle) -> bool {
    CONTACT_LISTENERS.lock().contains_key(&raw)
}

pub fn filter_alive(raw: RawHandle) -> bool {
    FILTERS.lock().contains_key(&raw)
}

/// Callback procedures captured from a native contact listener. Stays usable
/// after the listener is destroyed, to model late callbacks from an engine
/// that tears listeners down asynchronously.
#[derive(Clone, Copy)]
pub struct ContactProcs(Callbacks);

impl ContactProcs {
    fn procs(&self) -> &'static JphContactListenerProcs {
        unsafe { &*(self.0.procs as *const JphContactListenerProcs) }
    }

    fn user_data(&self) -> *mut c_void {
        self.0.user_data as *mut c_void
    }

    pub fn validate(&self, body1: BodyHandle, body2: BodyHandle) -> JphValidateResult {
        let offset = JphRVec3 {
            x: 1.0,
            y: 2.0,
            z: 3.0,
        };
        match self.procs().on_contact_validate {
            Some(f) => unsafe { f(self.user_data(), body1, body2, &offset) },
            None => JPH_VALIDATE_ACCEPT_ALL_CONTACTS,
        }
    }

    pub fn added(&self, body1: BodyHandle, body2: BodyHandle) {
        if let Some(f) = self.procs().on_contact_added {
            unsafe { f(self.user_data(), body1, body2) }
        }
    }

    pub fn persisted(&self, body1: BodyHandle, body2: BodyHandle) {
        if let Some(f) = self.procs().on_contact_persisted {
            unsafe { f(self.user_data(), body1, body2) }
        }
    }

    pub fn removed(&self, pair: JphSubShapeIdPair) {
        if let Some(f) = self.procs().on_contact_removed {
            unsafe { f(self.user_data(), &pair) }
        }
    }
}

pub fn contact_procs(listener: ListenerHandle) -> Option<ContactProcs> {
    CONTACT_LISTENERS
        .lock()
        .get(&listener.raw())
        .copied()
        .map(ContactProcs)
}

pub fn fire_body_activated(listener: ListenerHandle, body_id: JphBodyId, user_data: u64) -> bool {
    let Some(cb) = ACTIVATION_LISTENERS.lock().get(&listener.raw()).copied() else {
        return false;
    };
    let procs = unsafe { &*(cb.procs as *const JphBodyActivationListenerProcs) };
    if let Some(f) = procs.on_body_activated {
        unsafe { f(cb.user_data as *mut c_void, body_id, user_data) }
    }
    true
}

pub fn fire_body_deactivated(listener: ListenerHandle, body_id: JphBodyId, user_data: u64) -> bool {
    let Some(cb) = ACTIVATION_LISTENERS.lock().get(&listener.raw()).copied() else {
        return false;
    };
    let procs = unsafe { &*(cb.procs as *const JphBodyActivationListenerProcs) };
    if let Some(f) = procs.on_body_deactivated {
        unsafe { f(cb.user_data as *mut c_void, body_id, user_data) }
    }
    true
}

/// Captured filter procedures, usable after the filter is destroyed.
#[derive(Clone, Copy)]
pub struct FilterProcs(Callbacks);

impl FilterProcs {
    pub fn should_collide(&self, layer1: u32, layer2: u32) -> bool {
        let procs = unsafe { &*(self.0.procs as *const JphObjectLayerPairFilterProcs) };
        match procs.should_collide {
            Some(f) => unsafe { f(self.0.user_data as *mut c_void, layer1, layer2) },
            None => true,
        }
    }
}

pub fn filter_procs(filter: FilterHandle) -> Option<FilterProcs> {
    FILTERS.lock().get(&filter.raw()).copied().map(FilterProcs)
}
