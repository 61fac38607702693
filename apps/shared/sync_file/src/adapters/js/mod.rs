//! JavaScript Runtime Adapter (QuickJS)
//!
//! Installs the SyncFile bindings into QuickJS contexts via rquickjs.

mod config;
mod native;
mod runtime;
pub mod bindings;

pub use bindings::{BINDINGS, ContextHost};
pub use config::JsRuntimeConfig;
pub use native::{QuickJsInstaller, sync_file_native_install};
pub use runtime::JsRuntimeAdapter;
