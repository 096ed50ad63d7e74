//! Raw C ABI definitions shared with the native engine.
//!
//! The engine is not linked at build time. Its entry points are handed to
//! [`init`](crate::init) as a [`NativeApi`] function table, and the engine calls
//! back through the `#[repr(C)]` procedure tables declared here.
//! Users should prefer the safe Rust wrappers in the parent modules.

use std::os::raw::{c_int, c_void};

use super::handles::*;

/// Result code returned by native functions.
pub type JphResult = c_int;

// Result codes
pub const JPH_OK: JphResult = 0;
pub const JPH_ERR_INVALID_HANDLE: JphResult = 1;
pub const JPH_ERR_INVALID_ARGUMENT: JphResult = 2;
pub const JPH_ERR_OUT_OF_MEMORY: JphResult = 3;
pub const JPH_ERR_UNKNOWN: JphResult = 99;

/// Native body identifier (index + sequence number packed by the engine).
pub type JphBodyId = u32;

/// Native object layer.
pub type JphObjectLayer = u32;

/// Contact validation result.
pub type JphValidateResult = c_int;

pub const JPH_VALIDATE_ACCEPT_ALL_CONTACTS: JphValidateResult = 0;
pub const JPH_VALIDATE_ACCEPT_CONTACT: JphValidateResult = 1;
pub const JPH_VALIDATE_REJECT_CONTACT: JphValidateResult = 2;
pub const JPH_VALIDATE_REJECT_ALL_CONTACTS: JphValidateResult = 3;

/// Double precision world position.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JphRVec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Pair of body/sub-shape identifiers reported when a contact is removed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JphSubShapeIdPair {
    pub body1_id: JphBodyId,
    pub sub_shape_id1: u32,
    pub body2_id: JphBodyId,
    pub sub_shape_id2: u32,
}

/// Contact validation callback.
pub type JphContactValidateProc = Option<
    unsafe extern "C" fn(
        user_data: *mut c_void,
        body1: BodyHandle,
        body2: BodyHandle,
        base_offset: *const JphRVec3,
    ) -> JphValidateResult,
>;

/// Contact added / persisted callback.
pub type JphContactBodiesProc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, body1: BodyHandle, body2: BodyHandle)>;

/// Contact removed callback.
pub type JphContactRemovedProc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, pair: *const JphSubShapeIdPair)>;

/// Procedure table for a native contact listener.
#[repr(C)]
pub struct JphContactListenerProcs {
    pub on_contact_validate: JphContactValidateProc,
    pub on_contact_added: JphContactBodiesProc,
    pub on_contact_persisted: JphContactBodiesProc,
    pub on_contact_removed: JphContactRemovedProc,
}

/// Body activation callback.
pub type JphBodyActivationProc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, body_id: JphBodyId, body_user_data: u64)>;

/// Procedure table for a native body activation listener.
#[repr(C)]
pub struct JphBodyActivationListenerProcs {
    pub on_body_activated: JphBodyActivationProc,
    pub on_body_deactivated: JphBodyActivationProc,
}

/// Object layer pair collision test.
pub type JphShouldCollideProc = Option<
    unsafe extern "C" fn(
        user_data: *mut c_void,
        layer1: JphObjectLayer,
        layer2: JphObjectLayer,
    ) -> bool,
>;

/// Procedure table for a native object layer pair filter.
#[repr(C)]
pub struct JphObjectLayerPairFilterProcs {
    pub should_collide: JphShouldCollideProc,
}

/// Native engine entry points used by the bridge.
///
/// Procedure table pointers passed to the `*_create` functions point at
/// `'static` data and may be retained by the engine. The `user_data` argument is
/// a callback token and is passed back verbatim as the first argument of every
/// procedure.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct NativeApi {
    /// ABI version of the engine, packed as `major << 16 | minor`.
    pub abi_version: unsafe extern "C" fn() -> u32,

    pub sphere_shape_create: unsafe extern "C" fn(radius: f32, out_shape: *mut ShapeHandle) -> JphResult,
    pub shape_destroy: unsafe extern "C" fn(shape: ShapeHandle),
    pub shape_get_volume: unsafe extern "C" fn(shape: ShapeHandle) -> f32,

    pub body_get_id: unsafe extern "C" fn(body: BodyHandle) -> JphBodyId,
    pub body_get_user_data: unsafe extern "C" fn(body: BodyHandle) -> u64,
    pub body_set_user_data: unsafe extern "C" fn(body: BodyHandle, user_data: u64),
    pub body_get_shape: unsafe extern "C" fn(body: BodyHandle) -> ShapeHandle,

    pub contact_listener_create: unsafe extern "C" fn(
        procs: *const JphContactListenerProcs,
        user_data: *mut c_void,
    ) -> ListenerHandle,
    pub contact_listener_destroy: unsafe extern "C" fn(listener: ListenerHandle),

    pub body_activation_listener_create: unsafe extern "C" fn(
        procs: *const JphBodyActivationListenerProcs,
        user_data: *mut c_void,
    ) -> ListenerHandle,
    pub body_activation_listener_destroy: unsafe extern "C" fn(listener: ListenerHandle),

    pub object_layer_pair_filter_create: unsafe extern "C" fn(
        procs: *const JphObjectLayerPairFilterProcs,
        user_data: *mut c_void,
    ) -> FilterHandle,
    pub object_layer_pair_filter_destroy: unsafe extern "C" fn(filter: FilterHandle),
}
