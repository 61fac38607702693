//! Process-wide native library loading
//!
//! A `NativeLibrary` is declared as a `static` next to the installer that
//! needs it. The first call to `ensure_loaded` runs the loader; every later
//! call, from any thread, observes the same outcome without running it again.
//! A failed load stays failed for the lifetime of the process.

use std::sync::OnceLock;
use tracing::{debug, error};

use crate::InstallError;

/// Loader routine for a native library
pub type LibraryLoader = fn() -> Result<(), String>;

pub struct NativeLibrary {
    name: &'static str,
    loader: LibraryLoader,
    outcome: OnceLock<Result<(), String>>,
}

impl NativeLibrary {
    pub const fn new(name: &'static str, loader: LibraryLoader) -> Self {
        Self {
            name,
            loader,
            outcome: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Load the library if this is the first request in the process
    pub fn ensure_loaded(&self) -> Result<(), InstallError> {
        let outcome = self.outcome.get_or_init(|| {
            debug!("Loading native library '{}'", self.name);
            let result = (self.loader)();
            match &result {
                Ok(()) => debug!("Native library '{}' loaded", self.name),
                Err(reason) => error!("Failed to load native library '{}': {}", self.name, reason),
            }
            result
        });

        outcome.clone().map_err(|reason| InstallError::LibraryUnavailable {
            name: self.name,
            reason,
        })
    }

    /// Whether a load has been attempted and succeeded
    pub fn is_loaded(&self) -> bool {
        matches!(self.outcome.get(), Some(Ok(())))
    }
}
