//! Re-entry from native callbacks.
//!
//! Every `extern "C"` callback the engine invokes goes through [`dispatch`]. It
//! resolves the `user_data` token and runs the host logic with unwinding
//! stopped at this frame. A token that does not resolve, or a handler that
//! panics, produces the callback's fallback value. Nothing unwinds into native
//! frames.

use std::any::Any;
use std::os::raw::c_void;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, trace};

use crate::runtime;
use crate::token::{Token, TokenArena};

/// Resolve `user_data` against the installed runtime and run `f` on the target.
pub(crate) fn dispatch<T, R, F>(user_data: *mut c_void, fallback: R, f: F) -> R
where
    T: Any + Send + Sync,
    F: FnOnce(&T) -> R,
{
    match runtime::tokens() {
        Some(tokens) => dispatch_in(tokens, user_data, fallback, f),
        None => fallback,
    }
}

/// [`dispatch`] against an explicit arena.
pub(crate) fn dispatch_in<T, R, F>(tokens: &TokenArena, user_data: *mut c_void, fallback: R, f: F) -> R
where
    T: Any + Send + Sync,
    F: FnOnce(&T) -> R,
{
    let token = Token::from_user_data(user_data);
    let Some(target) = tokens.resolve::<T>(token) else {
        trace!(token = token.raw(), "callback for unresolved token ignored");
        return fallback;
    };

    match panic::catch_unwind(AssertUnwindSafe(|| f(&target))) {
        Ok(result) => result,
        Err(payload) => {
            error!(
                token = token.raw(),
                panic = panic_message(payload.as_ref()),
                "callback panicked, returning fallback to native caller"
            );
            fallback
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}
