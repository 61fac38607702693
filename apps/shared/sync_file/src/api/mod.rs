//! API system for script runtimes
//!
//! APIs are runtime-agnostic: they define the logic, while runtime-specific bindings
//! (in adapters) expose them to the scripting languages.

pub mod console;
pub mod file;

pub use console::ConsoleApi;
pub use file::{FileApi, latin1_to_string};
