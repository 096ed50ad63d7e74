//! Callback tokens handed to native code as `user_data`.
//!
//! A token is a slot index plus the slot's generation, packed into one
//! pointer-sized integer. Native code never sees an address of a host object; it
//! sees an integer that is looked up, bounds-checked and generation-checked when
//! it comes back. Releasing a token bumps the slot's generation, so a token that
//! outlives its release resolves to nothing instead of to whatever reuses the
//! slot.
//!
//! Both halves are bounded by the half-word width. The arena refuses to grow
//! past the largest encodable index, and a slot whose generation would wrap is
//! retired for good instead of being reused, so a released token can never
//! resolve again.

use std::any::Any;
use std::os::raw::c_void;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::types::TokenMode;

const HALF_BITS: u32 = usize::BITS / 2;
const HALF_MASK: usize = (1 << HALF_BITS) - 1;
/// Index is stored plus one, so the last half-word value is unusable.
const MAX_SLOTS: usize = HALF_MASK;
const MAX_GENERATION: usize = HALF_MASK;

/// Opaque integer carried through native code as callback user data.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(usize);

impl Token {
    /// The zero token. Never resolves.
    pub const NULL: Token = Token(0);

    fn new(index: usize, generation: usize) -> Self {
        // Index is stored off by one so that no live token is zero.
        Token((generation << HALF_BITS) | ((index + 1) & HALF_MASK))
    }

    /// Rebuild a token from the `user_data` pointer native code passed back.
    #[inline]
    pub fn from_user_data(user_data: *mut c_void) -> Self {
        Token(user_data as usize)
    }

    /// The value to pass to native code as `user_data`.
    #[inline]
    pub fn as_user_data(self) -> *mut c_void {
        self.0 as *mut c_void
    }

    /// The raw integer value.
    #[inline]
    pub fn raw(self) -> usize {
        self.0
    }

    /// True for [`Token::NULL`].
    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    fn index(self) -> Option<usize> {
        (self.0 & HALF_MASK).checked_sub(1)
    }

    fn generation(self) -> usize {
        self.0 >> HALF_BITS
    }
}

impl Default for Token {
    fn default() -> Self {
        Token::NULL
    }
}

enum Target {
    Strong(Arc<dyn Any + Send + Sync>),
    Weak(Weak<dyn Any + Send + Sync>),
}

impl Target {
    fn get(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        match self {
            Target::Strong(target) => Some(target.clone()),
            Target::Weak(target) => target.upgrade(),
        }
    }
}

struct Slot {
    generation: usize,
    target: Option<Target>,
}

#[derive(Default)]
struct Slots {
    entries: Vec<Slot>,
    free: Vec<usize>,
    retired: usize,
}

/// Arena of callback targets addressed by [`Token`].
pub struct TokenArena {
    slots: RwLock<Slots>,
    max_slots: usize,
    max_generation: usize,
}

impl TokenArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create an empty arena with room for `capacity` tokens.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_limits(capacity, MAX_SLOTS, MAX_GENERATION)
    }

    fn with_limits(capacity: usize, max_slots: usize, max_generation: usize) -> Self {
        Self {
            slots: RwLock::new(Slots {
                entries: Vec::with_capacity(capacity.min(max_slots)),
                free: Vec::new(),
                retired: 0,
            }),
            max_slots,
            max_generation,
        }
    }

    /// Store `target` and return a token for it.
    ///
    /// `None` yields [`Token::NULL`]. With [`TokenMode::Weak`] the arena does not
    /// keep the target alive. When every encodable slot is in use or retired the
    /// arena is exhausted and also returns [`Token::NULL`].
    pub fn create<T: Any + Send + Sync>(&self, target: Option<&Arc<T>>, mode: TokenMode) -> Token {
        let Some(target) = target else {
            return Token::NULL;
        };

        let target: Arc<dyn Any + Send + Sync> = target.clone();
        let target = match mode {
            TokenMode::Strong => Target::Strong(target),
            TokenMode::Weak => Target::Weak(Arc::downgrade(&target)),
        };

        let mut slots = self.slots.write();
        let reusable = slots.free.pop();
        let index = match reusable {
            Some(index) => {
                slots.entries[index].target = Some(target);
                index
            }
            None if slots.entries.len() >= self.max_slots => {
                drop(slots);
                warn!(max_slots = self.max_slots, "callback token arena exhausted");
                return Token::NULL;
            }
            None => {
                slots.entries.push(Slot {
                    generation: 1,
                    target: Some(target),
                });
                slots.entries.len() - 1
            }
        };
        let token = Token::new(index, slots.entries[index].generation);
        trace!(token = token.raw(), ?mode, "token created");
        token
    }

    /// Recover the target of `token`.
    ///
    /// Returns `None` for the null token, a released or stale token, a weak
    /// target that is gone, or a target of another type. Never panics.
    pub fn resolve<T: Any + Send + Sync>(&self, token: Token) -> Option<Arc<T>> {
        let index = token.index()?;
        let target = {
            let slots = self.slots.read();
            let slot = slots.entries.get(index)?;
            if slot.generation != token.generation() {
                debug!(token = token.raw(), "stale token resolved");
                return None;
            }
            slot.target.as_ref()?.get()
        };
        target?.downcast::<T>().ok()
    }

    /// Invalidate `token` and free its slot.
    ///
    /// Must only be called once native code can no longer invoke callbacks with
    /// the token. Returns `false` if the token was null, stale or already
    /// released.
    pub fn release(&self, token: Token) -> bool {
        let Some(index) = token.index() else {
            return false;
        };

        let released = {
            let mut slots = self.slots.write();
            let Some(slot) = slots.entries.get_mut(index) else {
                return false;
            };
            if slot.generation != token.generation() || slot.target.is_none() {
                return false;
            }
            let target = slot.target.take();
            if slot.generation >= self.max_generation {
                // Next generation would collide with an earlier token.
                slots.retired += 1;
                debug!(index, "token slot retired after generation wrap");
            } else {
                slot.generation += 1;
                slots.free.push(index);
            }
            target
        };

        trace!(token = token.raw(), "token released");
        // A strong target may be the last reference to a listener; drop it
        // outside the lock.
        drop(released);
        true
    }

    /// Number of tokens currently issued.
    pub fn live_count(&self) -> usize {
        let slots = self.slots.read();
        slots.entries.len() - slots.free.len() - slots.retired
    }
}

impl Default for TokenArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_target_yields_null_token() {
        let arena = TokenArena::new();
        let token = arena.create::<u32>(None, TokenMode::Strong);
        assert!(token.is_null());
        assert!(arena.resolve::<u32>(token).is_none());
        assert!(!arena.release(token));
    }

    #[test]
    fn test_user_data_round_trip() {
        let arena = TokenArena::new();
        let value = Arc::new(7u32);
        let token = arena.create(Some(&value), TokenMode::Strong);
        let back = Token::from_user_data(token.as_user_data());
        assert_eq!(back, token);
        assert_eq!(*arena.resolve::<u32>(back).unwrap(), 7);
    }

    #[test]
    fn test_slot_reuse_bumps_generation() {
        let arena = TokenArena::new();
        let first = arena.create(Some(&Arc::new(1u32)), TokenMode::Strong);
        assert!(arena.release(first));
        let second = arena.create(Some(&Arc::new(2u32)), TokenMode::Strong);
        assert_ne!(first, second);
        assert_eq!(first.index(), second.index());
        assert!(arena.resolve::<u32>(first).is_none());
        assert_eq!(*arena.resolve::<u32>(second).unwrap(), 2);
        assert!(!arena.release(first));
        assert_eq!(arena.live_count(), 1);
    }

    #[test]
    fn test_wrong_type_resolves_to_none() {
        let arena = TokenArena::new();
        let token = arena.create(Some(&Arc::new(String::from("x"))), TokenMode::Strong);
        assert!(arena.resolve::<u32>(token).is_none());
        assert!(arena.resolve::<String>(token).is_some());
    }

    #[test]
    fn test_exhausted_arena_refuses_new_tokens() {
        let arena = TokenArena::with_limits(0, 2, MAX_GENERATION);
        let value = Arc::new(1u32);
        let a = arena.create(Some(&value), TokenMode::Strong);
        let b = arena.create(Some(&value), TokenMode::Strong);
        assert!(arena.create(Some(&value), TokenMode::Strong).is_null());
        assert_eq!(arena.live_count(), 2);

        // Existing tokens keep resolving, and a freed slot can be reused.
        assert_eq!(*arena.resolve::<u32>(b).unwrap(), 1);
        assert!(arena.release(a));
        let c = arena.create(Some(&value), TokenMode::Strong);
        assert!(!c.is_null());
        assert!(arena.resolve::<u32>(a).is_none());
    }

    #[test]
    fn test_generation_wrap_retires_slot() {
        let arena = TokenArena::with_limits(0, MAX_SLOTS, 3);
        let value = Arc::new(5u32);

        let mut issued = Vec::new();
        for _ in 0..3 {
            let token = arena.create(Some(&value), TokenMode::Strong);
            assert_eq!(token.index(), Some(0));
            assert!(arena.release(token));
            issued.push(token);
        }

        // Slot 0 reached its last generation and is never handed out again.
        let fresh = arena.create(Some(&value), TokenMode::Strong);
        assert_eq!(fresh.index(), Some(1));
        assert_eq!(arena.live_count(), 1);
        for token in issued {
            assert!(arena.resolve::<u32>(token).is_none());
            assert!(!arena.release(token));
        }
    }

    #[test]
    fn test_default_limits_fit_token_encoding() {
        let last = Token::new(MAX_SLOTS - 1, MAX_GENERATION);
        assert_eq!(last.index(), Some(MAX_SLOTS - 1));
        assert_eq!(last.generation(), MAX_GENERATION);
    }

    #[test]
    fn test_garbage_token_resolves_to_none() {
        let arena = TokenArena::new();
        let garbage = Token::from_user_data(0xdead_beef as *mut c_void);
        assert!(arena.resolve::<u32>(garbage).is_none());
        assert!(!arena.release(garbage));
    }
}
