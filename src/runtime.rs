//! Process-wide bridge state installed by [`init`](crate::init).

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::error::{Error, Result};
use crate::ffi::NativeApi;
use crate::registry::HandleRegistry;
use crate::token::TokenArena;
use crate::types::BridgeOptions;
use crate::version;

pub(crate) struct Runtime {
    pub(crate) api: NativeApi,
    pub(crate) registry: Arc<HandleRegistry>,
    pub(crate) tokens: TokenArena,
}

static RUNTIME: OnceCell<Runtime> = OnceCell::new();

pub(crate) fn install(api: NativeApi, options: BridgeOptions) -> Result<()> {
    let packed = unsafe { (api.abi_version)() };
    let (major, minor) = (packed >> 16, packed & 0xffff);
    if !version::abi_version_compatible(major, minor) {
        return Err(Error::IncompatibleAbi { major, minor });
    }

    let runtime = Runtime {
        api,
        registry: Arc::new(HandleRegistry::with_options(&options)),
        tokens: TokenArena::with_capacity(options.token_capacity),
    };
    RUNTIME.set(runtime).map_err(|_| Error::AlreadyInitialized)?;

    debug!(major, minor, ?options, "bridge runtime installed");
    Ok(())
}

pub(crate) fn get() -> Result<&'static Runtime> {
    RUNTIME.get().ok_or(Error::NotInitialized)
}

/// Token arena for trampolines. `None` before [`init`](crate::init).
pub(crate) fn tokens() -> Option<&'static TokenArena> {
    RUNTIME.get().map(|runtime| &runtime.tokens)
}

pub(crate) fn is_installed() -> bool {
    RUNTIME.get().is_some()
}
