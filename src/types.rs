//! Type definitions and enums.

use crate::ffi::{
    JphSubShapeIdPair, JphValidateResult, JPH_VALIDATE_ACCEPT_ALL_CONTACTS,
    JPH_VALIDATE_ACCEPT_CONTACT, JPH_VALIDATE_REJECT_ALL_CONTACTS, JPH_VALIDATE_REJECT_CONTACT,
};

/// How a callback token references its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenMode {
    /// The token keeps the target alive until it is released.
    #[default]
    Strong,
    /// The token does not keep the target alive; resolving it after the target
    /// is gone yields nothing.
    Weak,
}

/// Whether a wrapper is responsible for destroying its native object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The wrapper destroys the native object on disposal.
    Owned,
    /// The native object's lifetime is controlled elsewhere.
    View,
}

/// Why a wrapper is being disposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisposeReason {
    /// `dispose()` was called.
    Explicit,
    /// The last reference was dropped.
    Dropped,
    /// Another wrapper was registered for the same handle.
    Displaced,
}

/// Result of validating a contact before it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidateResult {
    /// Accept this and any further contact points for the body pair.
    #[default]
    AcceptAllContacts,
    /// Accept this contact only.
    AcceptContact,
    /// Reject this contact only.
    RejectContact,
    /// Reject this and any further contact points for the body pair.
    RejectAllContacts,
}

impl From<ValidateResult> for JphValidateResult {
    fn from(result: ValidateResult) -> JphValidateResult {
        match result {
            ValidateResult::AcceptAllContacts => JPH_VALIDATE_ACCEPT_ALL_CONTACTS,
            ValidateResult::AcceptContact => JPH_VALIDATE_ACCEPT_CONTACT,
            ValidateResult::RejectContact => JPH_VALIDATE_REJECT_CONTACT,
            ValidateResult::RejectAllContacts => JPH_VALIDATE_REJECT_ALL_CONTACTS,
        }
    }
}

/// Native body identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(pub u32);

/// Object layer used by collision filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectLayer(pub u32);

/// Body and sub-shape identifiers of a removed contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubShapeIdPair {
    /// First body.
    pub body1: BodyId,
    /// Sub-shape of the first body.
    pub sub_shape1: u32,
    /// Second body.
    pub body2: BodyId,
    /// Sub-shape of the second body.
    pub sub_shape2: u32,
}

impl From<JphSubShapeIdPair> for SubShapeIdPair {
    fn from(pair: JphSubShapeIdPair) -> Self {
        Self {
            body1: BodyId(pair.body1_id),
            sub_shape1: pair.sub_shape_id1,
            body2: BodyId(pair.body2_id),
            sub_shape2: pair.sub_shape_id2,
        }
    }
}

/// Options for installing the bridge runtime.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Initial capacity of the handle registry (default: 1024).
    pub registry_capacity: usize,
    /// Initial capacity of the callback token arena (default: 64).
    pub token_capacity: usize,
    /// Log displaced wrappers at debug level (default: true).
    pub log_displacements: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            registry_capacity: 1024,
            token_capacity: 64,
            log_displacements: true,
        }
    }
}
