//! Runtime Adapters
//!
//! This module contains adapters for different scripting runtimes.
//! Each adapter provides a `NativeInstaller` and the language-specific bindings.

#[cfg(feature = "js")]
pub mod js;

#[cfg(feature = "js")]
pub use js::{JsRuntimeAdapter, JsRuntimeConfig, QuickJsInstaller};
