//! Startup configuration.
//!
//! Backend selection is a value resolved once at process start and stored in
//! the [`Context`](crate::Context) that uses it; there is no process-wide
//! backend singleton.

use std::env;
use std::path::PathBuf;

use tracing::warn;

use crate::types::Api;

/// Environment variable selecting the backend API (`openxr` / `openvr`).
pub const API_ENV_VAR: &str = "GXR_API";

/// Environment variable overriding the directory the backend runtime module
/// is loaded from.
pub const BACKEND_DIR_ENV_VAR: &str = "GXR_BACKEND_DIR";

/// Compiled-in default when `GXR_API` is unset or unrecognized.
pub const DEFAULT_API: Api = Api::OpenXr;

/// Configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend runtime API to use.
    pub api: Api,
    /// Directory the backend loads its runtime module from, if overridden.
    pub backend_dir: Option<PathBuf>,
    /// Application name, used for the cache directory and runtime session
    /// registration.
    pub app_name: String,
}

impl Config {
    /// Config with the compiled-in default API and no overrides.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            api: DEFAULT_API,
            backend_dir: None,
            app_name: app_name.into(),
        }
    }

    /// Resolve the config from `GXR_API` and `GXR_BACKEND_DIR`.
    pub fn from_env(app_name: impl Into<String>) -> Self {
        let api = match env::var(API_ENV_VAR) {
            Ok(value) => parse_api(&value),
            Err(_) => DEFAULT_API,
        };
        let backend_dir = env::var_os(BACKEND_DIR_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self {
            api,
            backend_dir,
            app_name: app_name.into(),
        }
    }

    pub fn with_api(mut self, api: Api) -> Self {
        self.api = api;
        self
    }
}

/// Parse an API name; unrecognized values fall back to the default with a
/// warning.
pub fn parse_api(value: &str) -> Api {
    match value.to_ascii_lowercase().as_str() {
        "openxr" => Api::OpenXr,
        "openvr" => Api::OpenVr,
        other => {
            warn!(value = other, "unrecognized {API_ENV_VAR}, using default");
            DEFAULT_API
        }
    }
}
