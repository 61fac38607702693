use std::path::PathBuf;
use thiserror::Error;

/// Why an installation attempt did not go through
///
/// Only ever seen by Rust callers of `try_install` and by the logs; the
/// public `install` collapses every variant to `false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstallError {
    #[error("no JavaScript runtime is attached to the host context")]
    RuntimeUnavailable,

    #[error("failed to read the runtime handle from the host context: {0}")]
    HostContext(String),

    #[error("native library '{name}' is not available: {reason}")]
    LibraryUnavailable { name: &'static str, reason: String },

    #[error("native installation failed: {0}")]
    Native(String),

    #[error("installation panicked: {0}")]
    Panicked(String),
}

/// File access failure, rendered into the message a script sees
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Cannot open file: {} ({source})", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot stat file: {}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read file: {} ({source})", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
