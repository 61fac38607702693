/// Console API abstraction
///
/// Provides logging functionality that bridges script console output to Rust's tracing system.
/// Events carry `runtime_type` and `script_id` fields so the log formatter can print
/// them as `js::script-id: message`.

use tracing::{debug, error, info, warn};

#[derive(Clone, Default)]
pub struct ConsoleApi;

impl ConsoleApi {
    pub fn new() -> Self {
        Self
    }

    /// Log an info message
    pub fn log(runtime_type: &str, script_id: &str, message: &str) {
        info!(runtime_type = runtime_type, script_id = script_id, "{}", message);
    }

    pub fn error(runtime_type: &str, script_id: &str, message: &str) {
        error!(runtime_type = runtime_type, script_id = script_id, "{}", message);
    }

    pub fn warn(runtime_type: &str, script_id: &str, message: &str) {
        warn!(runtime_type = runtime_type, script_id = script_id, "{}", message);
    }

    pub fn debug(runtime_type: &str, script_id: &str, message: &str) {
        debug!(runtime_type = runtime_type, script_id = script_id, "{}", message);
    }
}
