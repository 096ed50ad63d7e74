//! Native handle to wrapper identity map.
//!
//! The registry maps each native handle to the wrapper currently representing
//! it. Entries are weak: a wrapper nobody holds is dropped and disposed as usual,
//! and its entry reads as absent until it is removed or replaced.
//!
//! No registry lock is ever held while a wrapper is disposed or dropped. Lookups
//! clone the weak reference under the lock and upgrade it afterwards, so the last
//! strong reference of a wrapper can never be released while the table is
//! locked.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::debug;

use crate::ffi::{RawHandle, NULL_HANDLE};
use crate::lifecycle::{AsAnyArc, NativeObject};
use crate::types::{BridgeOptions, DisposeReason};

/// Concurrent map from native handles to their live wrappers.
pub struct HandleRegistry {
    entries: RwLock<HashMap<RawHandle, Weak<dyn NativeObject>>>,
    log_displacements: bool,
}

impl HandleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_options(&BridgeOptions::default())
    }

    /// Create an empty registry sized and configured from `options`.
    pub fn with_options(options: &BridgeOptions) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(options.registry_capacity)),
            log_displacements: options.log_displacements,
        }
    }

    /// Look up the live wrapper for `handle`.
    ///
    /// Returns `None` for the null handle, an unknown handle, a wrapper that has
    /// been dropped, or one that is disposed.
    pub fn try_get(&self, handle: RawHandle) -> Option<Arc<dyn NativeObject>> {
        if handle == NULL_HANDLE {
            return None;
        }

        let weak = self.entries.read().get(&handle).cloned()?;
        let object = weak.upgrade()?;
        if object.is_disposed() {
            return None;
        }
        Some(object)
    }

    /// Typed [`try_get`](Self::try_get). A wrapper of another type reads as absent.
    pub fn try_get_as<T: NativeObject>(&self, handle: RawHandle) -> Option<Arc<T>> {
        self.try_get(handle)?.into_any_arc().downcast::<T>().ok()
    }

    /// Return the live wrapper for `handle`, or build one with `factory`.
    ///
    /// The factory result is not registered here; wrapper constructors register
    /// themselves. Concurrent callers may each run the factory. Factories that
    /// finish with [`register_if_absent`](Self::register_if_absent) converge on
    /// one wrapper; ones that use [`register`](Self::register) leave the last
    /// registration in place and displace the rest.
    pub fn get_or_create<T, F>(&self, handle: RawHandle, factory: F) -> Arc<T>
    where
        T: NativeObject,
        F: FnOnce(RawHandle) -> Arc<T>,
    {
        let existing = {
            let entries = self.entries.upgradable_read();
            let found = entries
                .get(&handle)
                .map(|weak| (weak.strong_count() > 0, weak.clone()));
            match found {
                Some((true, weak)) => Some(weak),
                Some((false, _)) => {
                    let mut entries = RwLockUpgradableReadGuard::upgrade(entries);
                    entries.remove(&handle);
                    None
                }
                None => None,
            }
        };

        if let Some(object) = existing.and_then(|weak| weak.upgrade()) {
            if !object.is_disposed() {
                if let Ok(typed) = object.into_any_arc().downcast::<T>() {
                    return typed;
                }
            }
        }

        factory(handle)
    }

    /// Make `wrapper` the live wrapper for `handle`.
    ///
    /// A different, undisposed wrapper previously registered for the handle is
    /// disposed as [`DisposeReason::Displaced`] once the lock is released. The
    /// null handle is ignored.
    pub fn register<T: NativeObject>(&self, handle: RawHandle, wrapper: &Arc<T>) {
        if handle == NULL_HANDLE {
            return;
        }

        let previous = self.entries.write().insert(handle, downgrade(wrapper));
        self.displace(handle, previous.and_then(|weak| weak.upgrade()), wrapper);
    }

    /// Register `candidate` unless a live wrapper of the same type already
    /// holds `handle`, and return whichever wrapper ends up registered.
    ///
    /// Used for views, where concurrent lookups of one handle must agree on a
    /// single wrapper instead of displacing each other. A losing candidate is
    /// dropped after the lock is released; its disposal leaves the winner's
    /// entry alone.
    pub fn register_if_absent<T: NativeObject>(&self, handle: RawHandle, candidate: Arc<T>) -> Arc<T> {
        if handle == NULL_HANDLE {
            return candidate;
        }

        let (existing, previous) = {
            let mut entries = self.entries.write();
            let current = entries.get(&handle).and_then(Weak::upgrade);
            let reusable = current.as_ref().is_some_and(|object| {
                !object.is_disposed() && AsAnyArc::as_any(&**object).is::<T>()
            });
            if reusable {
                (current, None)
            } else {
                entries.insert(handle, downgrade(&candidate));
                (None, current)
            }
        };

        if let Some(existing) = existing {
            if let Ok(typed) = existing.into_any_arc().downcast::<T>() {
                return typed;
            }
            // Type was checked under the lock.
            self.register(handle, &candidate);
            return candidate;
        }

        self.displace(handle, previous, &candidate);
        candidate
    }

    fn displace<T: NativeObject>(
        &self,
        handle: RawHandle,
        previous: Option<Arc<dyn NativeObject>>,
        replacement: &Arc<T>,
    ) {
        let Some(displaced) = previous else {
            return;
        };
        let same = std::ptr::addr_eq(Arc::as_ptr(&displaced), Arc::as_ptr(replacement));
        if same || displaced.is_disposed() {
            return;
        }

        if self.log_displacements {
            debug!(
                handle,
                displaced = displaced.lifecycle().type_name(),
                replacement = replacement.lifecycle().type_name(),
                "handle re-registered, disposing stale wrapper"
            );
        }
        displaced.dispose_with(DisposeReason::Displaced);
    }

    /// Remove the entry for `handle` if it still belongs to `wrapper`.
    ///
    /// An entry that has since been taken over by another live wrapper is left in
    /// place. Entries whose wrapper is gone are removed regardless.
    pub fn unregister<T: NativeObject + ?Sized>(&self, handle: RawHandle, wrapper: &T) -> bool {
        self.unregister_addr(handle, wrapper as *const T as *const ())
    }

    pub(crate) fn unregister_addr(&self, handle: RawHandle, addr: *const ()) -> bool {
        if handle == NULL_HANDLE {
            return false;
        }

        let mut entries = self.entries.write();
        let owned = entries.get(&handle).is_some_and(|weak| {
            weak.strong_count() == 0 || std::ptr::addr_eq(weak.as_ptr(), addr)
        });
        if owned {
            entries.remove(&handle);
        }
        owned
    }

    /// Drop entries whose wrapper no longer exists. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    /// Number of entries, including ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True if the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn downgrade<T: NativeObject>(wrapper: &Arc<T>) -> Weak<dyn NativeObject> {
    Arc::downgrade(wrapper) as Weak<dyn NativeObject>
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
