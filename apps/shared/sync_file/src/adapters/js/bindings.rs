//! JavaScript bindings for the SyncFile APIs
//!
//! This module provides the bridge between the Rust APIs and a QuickJS context:
//!
//! - **File bindings**: `__SyncFile_readTextFile`, `__SyncFile_readBinaryFile` and
//!   `__SyncFile_existsSync`, installed on demand by the native installer.
//! - **Native module**: `NativeModules.SyncFile.install()`, the script-visible entry
//!   point of the installer shim.
//! - **Console**: `__console_native`, wrapped into `console` by the glue code.
//!
//! # JavaScript Glue Code
//!
//! The console wrappers and the `SyncFile` facade live in `glue/sync_file.js`,
//! embedded at compile time.

use rquickjs::{ArrayBuffer, Ctx, Exception, Function, Object, Value, function::Opt};

use crate::api::{ConsoleApi, FileApi};
use crate::{InstallError, RuntimeHost, SyncFileModule};
use super::QuickJsInstaller;

/// JavaScript glue code - embedded at compile time from src/adapters/js/glue/sync_file.js
const JS_GLUE_CODE: &str = include_str!("glue/sync_file.js");

/// Prefix shared by every installed global
pub const BINDING_PREFIX: &str = "__SyncFile_";

pub const READ_TEXT_FILE: &str = "__SyncFile_readTextFile";
pub const READ_BINARY_FILE: &str = "__SyncFile_readBinaryFile";
pub const EXISTS_SYNC: &str = "__SyncFile_existsSync";

/// Every global the native installer registers
pub const BINDINGS: [&str; 3] = [READ_TEXT_FILE, READ_BINARY_FILE, EXISTS_SYNC];

/// Host view of a QuickJS context
///
/// Reports the context's `JSContext*` as the runtime handle. The borrow keeps
/// the context alive for as long as the handle can be used.
pub struct ContextHost<'a, 'js> {
    ctx: &'a Ctx<'js>,
}

impl<'a, 'js> ContextHost<'a, 'js> {
    pub fn new(ctx: &'a Ctx<'js>) -> Self {
        Self { ctx }
    }
}

// SAFETY: the pointer belongs to a context that outlives the `&'a Ctx` borrow.
unsafe impl RuntimeHost for ContextHost<'_, '_> {
    fn raw_runtime_handle(&self) -> Result<usize, InstallError> {
        Ok(self.ctx.as_raw().as_ptr() as usize)
    }
}

/// Thrown by the read functions for strings with lone UTF-16 surrogates
const UNENCODABLE_PATH: &str = "Cannot open file: path is not valid UTF-8";

/// Extract the path argument, throwing `Error("<fn_name>: expected string path")`
/// when it is missing or not a string
///
/// Returns `None` for strings that have no UTF-8 form. No file can have such
/// a name, so callers treat them as missing.
fn expect_path<'js>(
    ctx: &Ctx<'js>,
    fn_name: &str,
    arg: Opt<Value<'js>>,
) -> rquickjs::Result<Option<String>> {
    match arg.0.as_ref().and_then(|v| v.as_string()) {
        Some(path) => Ok(path.to_string().ok()),
        None => Err(Exception::throw_message(
            ctx,
            &format!("{}: expected string path", fn_name),
        )),
    }
}

/// Install the file functions into the global object
///
/// Overwrites previous installations, so calling it again is harmless.
pub fn install_file_bindings<'js>(ctx: &Ctx<'js>, file_api: FileApi) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    // readTextFile(path: string): string
    let api = file_api.clone();
    let read_text_fn = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, path: Opt<Value<'js>>| -> rquickjs::Result<String> {
            let Some(path) = expect_path(&ctx, "readTextFile", path)? else {
                return Err(Exception::throw_message(&ctx, UNENCODABLE_PATH));
            };
            api.read_text(&path)
                .map_err(|e| Exception::throw_message(&ctx, &e.to_string()))
        },
    )?
    .with_name(READ_TEXT_FILE)?;
    globals.set(READ_TEXT_FILE, read_text_fn)?;

    // readBinaryFile(path: string): ArrayBuffer
    let api = file_api.clone();
    let read_binary_fn = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, path: Opt<Value<'js>>| -> rquickjs::Result<ArrayBuffer<'js>> {
            let Some(path) = expect_path(&ctx, "readBinaryFile", path)? else {
                return Err(Exception::throw_message(&ctx, UNENCODABLE_PATH));
            };
            let data = api
                .read_bytes(&path)
                .map_err(|e| Exception::throw_message(&ctx, &e.to_string()))?;
            ArrayBuffer::new(ctx.clone(), data)
        },
    )?
    .with_name(READ_BINARY_FILE)?;
    globals.set(READ_BINARY_FILE, read_binary_fn)?;

    // existsSync(path: string): boolean
    let api = file_api;
    let exists_fn = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, path: Opt<Value<'js>>| -> rquickjs::Result<bool> {
            let path = expect_path(&ctx, "existsSync", path)?;
            Ok(path.is_some_and(|path| api.exists(&path)))
        },
    )?
    .with_name(EXISTS_SYNC)?;
    globals.set(EXISTS_SYNC, exists_fn)?;

    Ok(())
}

/// Register `NativeModules.SyncFile` in the JavaScript context
///
/// `install()` takes no arguments and returns a boolean. It reads the handle of
/// the calling context, so the same module works in every context it is
/// registered in. An existing `NativeModules` object is extended, not replaced.
pub fn setup_native_modules<'js>(
    ctx: &Ctx<'js>,
    module: SyncFileModule<QuickJsInstaller>,
) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    let native_modules = match globals.get::<_, Option<Object>>("NativeModules")? {
        Some(existing) => existing,
        None => {
            let created = Object::new(ctx.clone())?;
            globals.set("NativeModules", created.clone())?;
            created
        }
    };

    let sync_file = Object::new(ctx.clone())?;
    let install_fn = Function::new(ctx.clone(), move |ctx: Ctx<'js>| -> bool {
        module.install(&ContextHost::new(&ctx))
    })?
    .with_name("install")?;
    sync_file.set("install", install_fn)?;

    native_modules.set(SyncFileModule::<QuickJsInstaller>::NAME, sync_file)?;

    Ok(())
}

/// Setup the native half of the console API
///
/// Reads the `__SCRIPT_ID__` global on every call, so scripts evaluated in the same
/// context share one tag.
pub fn setup_console_api(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    let console_native = Object::new(ctx.clone())?;

    fn script_id(ctx: &Ctx<'_>) -> String {
        ctx.globals()
            .get("__SCRIPT_ID__")
            .unwrap_or_else(|_| "unknown".to_string())
    }

    let log_fn = Function::new(ctx.clone(), |ctx: Ctx, message: String| {
        ConsoleApi::log("js", &script_id(&ctx), &message);
    })?;
    console_native.set("_log", log_fn)?;

    let error_fn = Function::new(ctx.clone(), |ctx: Ctx, message: String| {
        ConsoleApi::error("js", &script_id(&ctx), &message);
    })?;
    console_native.set("_error", error_fn)?;

    let warn_fn = Function::new(ctx.clone(), |ctx: Ctx, message: String| {
        ConsoleApi::warn("js", &script_id(&ctx), &message);
    })?;
    console_native.set("_warn", warn_fn)?;

    let debug_fn = Function::new(ctx.clone(), |ctx: Ctx, message: String| {
        ConsoleApi::debug("js", &script_id(&ctx), &message);
    })?;
    console_native.set("_debug", debug_fn)?;

    ctx.globals().set("__console_native", console_native)?;

    Ok(())
}

/// Evaluate the glue code: `console` wrappers and the `SyncFile` facade
///
/// Must run after [`setup_console_api`]. The facade looks up `NativeModules`
/// lazily, so the module may be registered before or after this call.
pub fn setup_glue(ctx: &Ctx<'_>) -> rquickjs::Result<()> {
    ctx.eval::<(), _>(JS_GLUE_CODE)
}
