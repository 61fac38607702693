//! QuickJS native installation routine
//!
//! The handle handed over by the shim is a `JSContext*`. The installer turns it
//! back into a context and registers the file bindings, the same way a JNI
//! adapter casts its `jlong` back into an engine pointer.

use rquickjs::{Ctx, qjs};
use std::collections::HashSet;
use std::ptr::NonNull;
use tracing::debug;

use crate::api::FileApi;
use crate::{InstallError, NativeInstaller, NativeLibrary, RawHost, RuntimeHandle, SyncFileModule};
use super::bindings::{self, BINDING_PREFIX, BINDINGS};
use super::runtime::format_js_error;

/// Statically linked library backing the QuickJS installer
static SYNC_FILE_LIBRARY: NativeLibrary = NativeLibrary::new("syncfile", load_binding_table);

/// Validate the binding table before the first install
fn load_binding_table() -> Result<(), String> {
    let mut seen = HashSet::new();
    for name in BINDINGS {
        if !name.starts_with(BINDING_PREFIX) {
            return Err(format!("binding '{}' is missing the '{}' prefix", name, BINDING_PREFIX));
        }
        if !seen.insert(name) {
            return Err(format!("binding '{}' is registered twice", name));
        }
    }
    debug!("SyncFile binding table: {}", BINDINGS.join(", "));
    Ok(())
}

/// Installs the SyncFile bindings into a QuickJS context
#[derive(Clone, Debug, Default)]
pub struct QuickJsInstaller {
    file_api: FileApi,
}

impl QuickJsInstaller {
    pub fn new(file_api: FileApi) -> Self {
        Self { file_api }
    }

    pub fn file_api(&self) -> &FileApi {
        &self.file_api
    }
}

impl NativeInstaller for QuickJsInstaller {
    fn library(&self) -> &'static NativeLibrary {
        &SYNC_FILE_LIBRARY
    }

    fn install(&self, runtime: RuntimeHandle<'_>) -> Result<(), InstallError> {
        let raw = NonNull::new(runtime.get() as *mut qjs::JSContext)
            .ok_or(InstallError::RuntimeUnavailable)?;

        // SAFETY: a RuntimeHandle is either built by a RuntimeHost, which
        // guarantees a live context for the handle's lifetime, or by a caller
        // of `RuntimeHandle::from_raw` under the same contract.
        let ctx = unsafe { Ctx::from_raw(raw) };

        bindings::install_file_bindings(&ctx, self.file_api.clone())
            .map_err(|e| InstallError::Native(format_js_error(&ctx, &e)))?;

        debug!("SyncFile bindings installed into {:?}", runtime);
        Ok(())
    }
}

/// C entry point: install the SyncFile bindings into a QuickJS context
///
/// Returns `false` when `runtime` is zero or installation failed.
///
/// # Safety
/// `runtime` must be zero or a `JSContext*` created through rquickjs that stays
/// alive, and is not used from another thread, for the duration of the call.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn sync_file_native_install(runtime: usize) -> bool {
    let module = SyncFileModule::new(QuickJsInstaller::default());
    // SAFETY: forwarded from this function's contract.
    let host = unsafe { RawHost::new(runtime) };
    module.install(&host)
}
