use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for JavaScript runtime
///
/// Can be built in code or deserialized from the host's config file, where
/// every field is optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct JsRuntimeConfig {
    /// Identifier printed with console output (`js::<script_id>`)
    script_id: String,
    /// Directory relative file paths resolve against (process cwd when unset)
    base_dir: Option<PathBuf>,
    /// Install the file bindings when the runtime is created instead of on first use
    auto_install: bool,
}

impl JsRuntimeConfig {
    pub fn new(script_id: impl Into<String>) -> Self {
        Self {
            script_id: script_id.into(),
            base_dir: None,
            auto_install: false,
        }
    }

    pub fn with_script_id(mut self, script_id: impl Into<String>) -> Self {
        self.script_id = script_id.into();
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn with_auto_install(mut self, auto_install: bool) -> Self {
        self.auto_install = auto_install;
        self
    }

    pub fn script_id(&self) -> &str {
        &self.script_id
    }

    pub fn base_dir(&self) -> Option<&PathBuf> {
        self.base_dir.as_ref()
    }

    pub fn auto_install(&self) -> bool {
        self.auto_install
    }
}

impl Default for JsRuntimeConfig {
    fn default() -> Self {
        Self::new("main")
    }
}
