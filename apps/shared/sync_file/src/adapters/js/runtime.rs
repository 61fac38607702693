use rquickjs::{Context, Ctx, FromJs, Runtime, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::SyncFileModule;
use crate::api::FileApi;
use super::bindings::{self, ContextHost};
use super::{JsRuntimeConfig, QuickJsInstaller};

/// JavaScript runtime adapter for QuickJS
///
/// Owns one runtime and one full context. The context gets `console`, the
/// `NativeModules.SyncFile` module and the `SyncFile` facade; the file bindings
/// themselves arrive on the first install.
///
/// Not `Send`: QuickJS contexts are single-threaded.
pub struct JsRuntimeAdapter {
    // Declared before `runtime` so the context is dropped first
    context: Context,
    #[allow(dead_code)]
    runtime: Runtime,
    config: JsRuntimeConfig,
    module: SyncFileModule<QuickJsInstaller>,
}

impl JsRuntimeAdapter {
    /// Create a new JavaScript runtime adapter
    ///
    /// Fails when `auto_install` is set and the bindings could not be installed.
    pub fn new(config: JsRuntimeConfig) -> Result<Self, Box<dyn std::error::Error>> {
        debug!("Initializing QuickJS runtime for '{}'", config.script_id());

        let runtime = Runtime::new()?;
        let context = Context::full(&runtime)?;

        let mut file_api = FileApi::new();
        if let Some(base_dir) = config.base_dir() {
            file_api = file_api.with_base_dir(base_dir.clone());
        }
        let module = SyncFileModule::new(QuickJsInstaller::new(file_api));

        let adapter = Self {
            context,
            runtime,
            config,
            module,
        };
        adapter.setup_global_apis()?;

        if adapter.config.auto_install() && !adapter.install() {
            return Err(format!(
                "Failed to install {} bindings for '{}'",
                SyncFileModule::<QuickJsInstaller>::NAME,
                adapter.config.script_id()
            )
            .into());
        }

        info!("JavaScript runtime initialized for '{}'", adapter.config.script_id());
        Ok(adapter)
    }

    pub fn config(&self) -> &JsRuntimeConfig {
        &self.config
    }

    /// Setup all global APIs in the context
    fn setup_global_apis(&self) -> Result<(), Box<dyn std::error::Error>> {
        let script_id = self.config.script_id().to_string();
        let module = self.module.clone();

        self.context.with(|ctx| {
            ctx.globals().set("__SCRIPT_ID__", script_id)?;
            bindings::setup_console_api(&ctx)?;
            bindings::setup_native_modules(&ctx, module)?;
            bindings::setup_glue(&ctx)?;
            Ok::<(), rquickjs::Error>(())
        })?;

        Ok(())
    }

    /// Install the file bindings into this runtime's context from the host side
    pub fn install(&self) -> bool {
        self.context.with(|ctx| self.module.install(&ContextHost::new(&ctx)))
    }

    /// Evaluate a script, logging and returning any JavaScript error
    pub fn eval_script(&self, name: &str, source: &str) -> Result<(), Box<dyn std::error::Error>> {
        debug!("Evaluating script '{}' ({} bytes)", name, source.len());

        let result: Result<(), String> = self.context.with(|ctx| {
            match ctx.eval::<Value, _>(source) {
                Ok(_) => Ok(()),
                Err(e) => {
                    let error_msg = format_js_error(&ctx, &e);
                    error!("\n{}", error_msg);
                    Err(format!("JavaScript error in '{}': {}", name, error_msg))
                }
            }
        });

        result.map_err(|e| -> Box<dyn std::error::Error> { e.into() })
    }

    /// Read a script file and evaluate it
    pub fn eval_file(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let source = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read script '{}': {}", path.display(), e))?;
        self.eval_script(&path.display().to_string(), &source)
    }

    /// Evaluate an expression and convert its value
    pub fn eval_as<T>(&self, source: &str) -> Result<T, Box<dyn std::error::Error>>
    where
        T: for<'js> FromJs<'js>,
    {
        let result: Result<T, String> = self
            .context
            .with(|ctx| ctx.eval::<T, _>(source).map_err(|e| format_js_error(&ctx, &e)));

        result.map_err(|e| -> Box<dyn std::error::Error> { e.into() })
    }
}

/// Format a JavaScript error with stack trace in Node.js style
///
/// Pending exceptions are taken from the context; other errors use their
/// Rust description.
pub(crate) fn format_js_error(ctx: &Ctx<'_>, error: &rquickjs::Error) -> String {
    if !error.is_exception() {
        return error.to_string();
    }

    let exception = ctx.catch();

    if let Some(obj) = exception.as_object() {
        let read = |key: &str| -> Option<String> {
            obj.get::<_, Option<String>>(key).ok().flatten().filter(|s| !s.is_empty())
        };

        let error_name = read("name").unwrap_or_else(|| "Error".to_string());
        let mut output = match read("message") {
            Some(message) => format!("{}: {}", error_name, message),
            None => error_name.clone(),
        };

        if let Some(stack) = read("stack") {
            if stack.starts_with(&error_name) {
                output = stack;
            } else {
                output.push('\n');
                output.push_str(stack.trim_end());
            }
        }

        return output;
    }

    if let Some(s) = exception.as_string() {
        if let Ok(msg) = s.to_string() {
            return format!("Error: {}", msg);
        }
    }

    warn!("JavaScript exception could not be described: {:?}", exception);
    "Error: Unknown JavaScript error".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::js::{BINDINGS, sync_file_native_install};
    use std::io::Write;
    use tempfile::tempdir;

    fn adapter() -> JsRuntimeAdapter {
        JsRuntimeAdapter::new(JsRuntimeConfig::new("test")).unwrap()
    }

    fn js_string(path: &Path) -> String {
        format!("{:?}", path.to_str().unwrap())
    }

    #[test]
    fn test_bindings_absent_until_install() {
        let rt = adapter();
        let kind: String = rt.eval_as("typeof __SyncFile_readTextFile").unwrap();
        assert_eq!(kind, "undefined");

        assert!(rt.install());
        for name in BINDINGS {
            let kind: String = rt.eval_as(&format!("typeof {}", name)).unwrap();
            assert_eq!(kind, "function", "{} should be installed", name);
        }
    }

    #[test]
    fn test_native_module_install_is_repeatable() {
        let rt = adapter();
        let first: bool = rt.eval_as("NativeModules.SyncFile.install()").unwrap();
        let second: bool = rt.eval_as("NativeModules.SyncFile.install()").unwrap();
        assert!(first);
        assert!(second);
    }

    #[test]
    fn test_facade_reads_text_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("hello.txt");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(&[b'c', b'a', b'f', 0xE9]).unwrap();

        let rt = adapter();
        let text: String = rt
            .eval_as(&format!("SyncFile.readTextFileSync({})", js_string(&path)))
            .unwrap();
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn test_facade_reads_binary_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("blob.bin");
        fs::write(&path, [0u8, 1, 2, 254, 255]).unwrap();

        let rt = adapter();
        let summary: String = rt
            .eval_as(&format!(
                "(() => {{ const buf = SyncFile.readBinaryFileSync({}); \
                 return buf.constructor.name + ':' + Array.from(new Uint8Array(buf)).join(','); }})()",
                js_string(&path)
            ))
            .unwrap();
        assert_eq!(summary, "ArrayBuffer:0,1,2,254,255");
    }

    #[test]
    fn test_facade_exists() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("present.txt");
        fs::write(&path, "x").unwrap();

        let rt = adapter();
        let present: bool = rt
            .eval_as(&format!("SyncFile.existsSync({})", js_string(&path)))
            .unwrap();
        let absent: bool = rt
            .eval_as(&format!("SyncFile.existsSync({})", js_string(&temp.path().join("nope"))))
            .unwrap();
        assert!(present);
        assert!(!absent);
    }

    #[test]
    fn test_missing_file_throws_js_error() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("missing.txt");

        let rt = adapter();
        let message: String = rt
            .eval_as(&format!(
                "(() => {{ try {{ SyncFile.readTextFileSync({}); return 'no error'; }} \
                 catch (e) {{ return (e instanceof Error) + ' ' + e.message; }} }})()",
                js_string(&path)
            ))
            .unwrap();
        assert!(message.starts_with("true Cannot open file: "), "got: {}", message);
        assert!(message.contains("missing.txt"));
    }

    #[test]
    fn test_non_string_path_throws() {
        let rt = adapter();
        assert!(rt.install());

        let message: String = rt
            .eval_as("(() => { try { __SyncFile_readBinaryFile(42); return 'no error'; } catch (e) { return e.message; } })()")
            .unwrap();
        assert_eq!(message, "readBinaryFile: expected string path");

        let message: String = rt
            .eval_as("(() => { try { __SyncFile_existsSync(); return 'no error'; } catch (e) { return e.message; } })()")
            .unwrap();
        assert_eq!(message, "existsSync: expected string path");
    }

    #[test]
    fn test_unencodable_path_is_a_missing_file() {
        let rt = adapter();
        assert!(rt.install());

        let message: String = rt
            .eval_as("(() => { try { __SyncFile_readTextFile('\\uD800.txt'); return 'no error'; } catch (e) { return e.message; } })()")
            .unwrap();
        assert!(message.starts_with("Cannot open file: "), "got: {}", message);

        let message: String = rt
            .eval_as("(() => { try { __SyncFile_readBinaryFile('a\\uDC00'); return 'no error'; } catch (e) { return e.message; } })()")
            .unwrap();
        assert!(message.starts_with("Cannot open file: "), "got: {}", message);

        let exists: bool = rt.eval_as("__SyncFile_existsSync('\\uD800')").unwrap();
        assert!(!exists);
    }

    #[test]
    fn test_install_into_frozen_global_returns_false() {
        let rt = adapter();
        let outcome: String = rt
            .eval_as(
                "(() => { Object.freeze(globalThis); \
                 try { return String(NativeModules.SyncFile.install()); } \
                 catch (e) { return 'threw ' + e.message; } })()",
            )
            .unwrap();
        assert_eq!(outcome, "false");

        for name in BINDINGS {
            let kind: String = rt.eval_as(&format!("typeof {}", name)).unwrap();
            assert_eq!(kind, "undefined", "{} should not be installed", name);
        }
    }

    #[test]
    fn test_facade_without_native_module_throws() {
        let rt = adapter();
        let message: String = rt
            .eval_as("(() => { delete globalThis.NativeModules; try { SyncFile.existsSync('/'); return 'no error'; } catch (e) { return e.message; } })()")
            .unwrap();
        assert!(message.starts_with("sync-file: failed to install native bindings."));
    }

    #[test]
    fn test_auto_install_and_base_dir() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("relative.txt"), "from base").unwrap();

        let config = JsRuntimeConfig::new("auto")
            .with_base_dir(temp.path())
            .with_auto_install(true);
        let rt = JsRuntimeAdapter::new(config).unwrap();

        let text: String = rt.eval_as("__SyncFile_readTextFile('relative.txt')").unwrap();
        assert_eq!(text, "from base");
    }

    #[test]
    fn test_eval_script_reports_error() {
        let rt = adapter();
        let err = rt.eval_script("broken.js", "throw new TypeError('bad input')").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken.js"));
        assert!(msg.contains("TypeError: bad input"));
    }

    #[test]
    fn test_c_entry_point() {
        assert!(!unsafe { sync_file_native_install(0) });

        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        let kind: String = context.with(|ctx| {
            let raw = ctx.as_raw().as_ptr() as usize;
            assert!(unsafe { sync_file_native_install(raw) });
            ctx.eval::<String, _>("typeof __SyncFile_existsSync").unwrap()
        });
        assert_eq!(kind, "function");
    }
}
