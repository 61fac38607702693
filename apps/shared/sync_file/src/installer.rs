//! Runtime installer shim
//!
//! Bridges one capability-installation call from the scripting layer to a
//! native installation routine. The host hands over a raw runtime handle; the
//! shim checks it, forwards it, and reports a single boolean.
//!
//! Every failure collapses to `false` at the public boundary. Rust callers that
//! want the reason use [`SyncFileModule::try_install`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

use crate::{InstallError, NativeLibrary, RuntimeHandle};

/// Host side of the boundary: the environment that owns the engine instance
///
/// # Safety
/// `raw_runtime_handle` must return zero or the address of an engine instance
/// that stays alive while `self` is borrowed. Installers dereference it.
pub unsafe trait RuntimeHost {
    /// Raw handle of the attached engine, zero when none is attached
    fn raw_runtime_handle(&self) -> Result<usize, InstallError>;
}

/// Native side of the boundary: registers capabilities into the engine
pub trait NativeInstaller {
    /// Library that must be loaded before `install` may run
    fn library(&self) -> &'static NativeLibrary;

    /// Register capabilities into the engine behind `runtime`
    ///
    /// Called again for every install request; implementations must tolerate
    /// repeated registration.
    fn install(&self, runtime: RuntimeHandle<'_>) -> Result<(), InstallError>;
}

/// The `SyncFile` native module
///
/// Construction loads the installer's native library once per process. The
/// outcome is remembered by the library guard, so a module created after a
/// failed load refuses every install.
#[derive(Clone)]
pub struct SyncFileModule<N> {
    installer: N,
}

impl<N: NativeInstaller> SyncFileModule<N> {
    /// Name under which the module is exposed to scripts
    pub const NAME: &'static str = "SyncFile";

    pub fn new(installer: N) -> Self {
        // Outcome is cached in the guard and re-checked on install
        if let Err(e) = installer.library().ensure_loaded() {
            warn!("{} module created without its native library: {}", Self::NAME, e);
        }
        Self { installer }
    }

    pub fn installer(&self) -> &N {
        &self.installer
    }

    /// Install native bindings into the host's runtime
    ///
    /// Returns `true` when installation was attempted and no error surfaced,
    /// `false` when no runtime is attached or anything failed.
    pub fn install(&self, host: &dyn RuntimeHost) -> bool {
        match self.try_install(host) {
            Ok(()) => true,
            Err(InstallError::RuntimeUnavailable) => {
                debug!("{}.install(): no runtime attached", Self::NAME);
                false
            }
            Err(e) => {
                warn!("{}.install() failed: {}", Self::NAME, e);
                false
            }
        }
    }

    /// Same as [`install`](Self::install) but keeps the failure reason
    pub fn try_install(&self, host: &dyn RuntimeHost) -> Result<(), InstallError> {
        let library = self.installer.library();
        library.ensure_loaded()?;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let raw = host.raw_runtime_handle()?;

            // SAFETY: `RuntimeHost` implementors guarantee the value is zero or
            // a live engine instance for the duration of this borrow.
            let handle = unsafe { RuntimeHandle::from_raw(raw) }
                .ok_or(InstallError::RuntimeUnavailable)?;

            debug!("Installing {} bindings into {:?}", Self::NAME, handle);
            self.installer.install(handle)
        }));

        outcome.unwrap_or_else(|payload| Err(InstallError::Panicked(panic_message(payload))))
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Host that reports a fixed raw handle
///
/// Used where the handle arrives as a plain integer, such as the C entry point.
pub struct RawHost(usize);

impl RawHost {
    /// # Safety
    /// `raw` must be zero or a live engine instance for as long as the host is used.
    pub unsafe fn new(raw: usize) -> Self {
        Self(raw)
    }
}

// SAFETY: the constructor carries the same contract.
unsafe impl RuntimeHost for RawHost {
    fn raw_runtime_handle(&self) -> Result<usize, InstallError> {
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn ok_loader() -> Result<(), String> {
        Ok(())
    }

    fn missing_loader() -> Result<(), String> {
        Err("dlopen failed: library \"libsyncfile.so\" not found".to_string())
    }

    static TEST_LIBRARY: NativeLibrary = NativeLibrary::new("syncfile-test", ok_loader);
    static MISSING_LIBRARY: NativeLibrary = NativeLibrary::new("syncfile-missing", missing_loader);

    enum Behavior {
        Succeed,
        Fail,
        Panic,
    }

    struct RecordingInstaller {
        library: &'static NativeLibrary,
        behavior: Behavior,
        seen: RefCell<Vec<usize>>,
    }

    impl RecordingInstaller {
        fn new(behavior: Behavior) -> Self {
            Self {
                library: &TEST_LIBRARY,
                behavior,
                seen: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.seen.borrow().len()
        }
    }

    impl NativeInstaller for RecordingInstaller {
        fn library(&self) -> &'static NativeLibrary {
            self.library
        }

        fn install(&self, runtime: RuntimeHandle<'_>) -> Result<(), InstallError> {
            self.seen.borrow_mut().push(runtime.get());
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(InstallError::Native("JSError: global object is frozen".into())),
                Behavior::Panic => panic!("native routine blew up"),
            }
        }
    }

    struct FailingHost {
        reads: Cell<usize>,
    }

    // SAFETY: never hands out a handle.
    unsafe impl RuntimeHost for FailingHost {
        fn raw_runtime_handle(&self) -> Result<usize, InstallError> {
            self.reads.set(self.reads.get() + 1);
            Err(InstallError::HostContext("context holder was released".into()))
        }
    }

    fn host(raw: usize) -> RawHost {
        // Handles here are never dereferenced by RecordingInstaller
        unsafe { RawHost::new(raw) }
    }

    #[test]
    fn test_zero_handle_returns_false_without_installing() {
        let module = SyncFileModule::new(RecordingInstaller::new(Behavior::Succeed));

        assert!(!module.install(&host(0)));
        assert_eq!(module.installer().calls(), 0);
        assert_eq!(module.try_install(&host(0)), Err(InstallError::RuntimeUnavailable));
    }

    #[test]
    fn test_valid_handle_installs() {
        let module = SyncFileModule::new(RecordingInstaller::new(Behavior::Succeed));

        assert!(module.install(&host(0x7F3A_1000)));
        assert_eq!(*module.installer().seen.borrow(), vec![0x7F3A_1000]);
    }

    #[test]
    fn test_native_error_returns_false() {
        let module = SyncFileModule::new(RecordingInstaller::new(Behavior::Fail));

        assert!(!module.install(&host(0x7F3A_1000)));
        assert_eq!(module.installer().calls(), 1);
        assert!(matches!(
            module.try_install(&host(0x7F3A_1000)),
            Err(InstallError::Native(_))
        ));
    }

    #[test]
    fn test_native_panic_returns_false() {
        let module = SyncFileModule::new(RecordingInstaller::new(Behavior::Panic));

        assert!(!module.install(&host(0x7F3A_1000)));
        match module.try_install(&host(0x7F3A_1000)) {
            Err(InstallError::Panicked(msg)) => assert_eq!(msg, "native routine blew up"),
            other => panic!("Expected Panicked, got {:?}", other),
        }
    }

    #[test]
    fn test_repeated_install_succeeds_each_time() {
        let module = SyncFileModule::new(RecordingInstaller::new(Behavior::Succeed));

        assert!(module.install(&host(0x7F3A_1000)));
        assert!(module.install(&host(0x7F3A_1000)));
        assert_eq!(module.installer().calls(), 2);
    }

    #[test]
    fn test_host_error_returns_false() {
        let module = SyncFileModule::new(RecordingInstaller::new(Behavior::Succeed));
        let failing = FailingHost { reads: Cell::new(0) };

        assert!(!module.install(&failing));
        assert_eq!(failing.reads.get(), 1);
        assert_eq!(module.installer().calls(), 0);
    }

    #[test]
    fn test_missing_library_returns_false_without_touching_host() {
        let mut installer = RecordingInstaller::new(Behavior::Succeed);
        installer.library = &MISSING_LIBRARY;
        let module = SyncFileModule::new(installer);
        let failing = FailingHost { reads: Cell::new(0) };

        assert!(!module.install(&host(0x7F3A_1000)));
        assert!(!module.install(&failing));
        assert_eq!(failing.reads.get(), 0);
        assert_eq!(module.installer().calls(), 0);
        assert!(matches!(
            module.try_install(&host(0x7F3A_1000)),
            Err(InstallError::LibraryUnavailable { name: "syncfile-missing", .. })
        ));
    }
}
