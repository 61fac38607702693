//! SyncFile
//!
//! Synchronous file access for scripts running in an embedded JavaScript engine.
//!
//! # Architecture
//!
//! - **SyncFileModule**: the installer shim. Reads a runtime handle from its host and
//!   forwards it to a native installer, reporting a single boolean.
//! - **RuntimeHost / NativeInstaller**: the two sides of the boundary.
//! - **NativeLibrary**: one-time, process-wide library load guard.
//! - **FileApi**: runtime-agnostic file reads used by the bindings.
//! - **adapters::js** (feature `js`): QuickJS bindings, installer and runtime adapter.

pub mod api;
mod error;
mod handle;
mod installer;
mod library;

// Conditional module imports based on features
#[cfg(feature = "js")]
pub mod adapters;

pub use api::FileApi;
pub use error::{FileError, InstallError};
pub use handle::RuntimeHandle;
pub use installer::{NativeInstaller, RawHost, RuntimeHost, SyncFileModule};
pub use library::{LibraryLoader, NativeLibrary};
