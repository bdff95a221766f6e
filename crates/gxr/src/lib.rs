//! One XR input and session API over pluggable runtime backends.
//!
//! Applications use this crate alone: build a [`Config`] (usually from the
//! environment), create a [`Context`] with [`new_context`], then drive the
//! event/poll/frame loop. The backend is chosen once at startup from
//! `GXR_API` and cannot change for the lifetime of the context.
//!
//! ```no_run
//! use gxr::{new_context, AppType, Config};
//!
//! let config = Config::from_env("my-app");
//! let mut context = new_context(config)?;
//! context.init_runtime(AppType::Scene)?;
//! # Ok::<(), gxr::Error>(())
//! ```

use tracing::info;

pub use gxr_core::action::{Action, ActionCallback, ActionType, PoseUsage};
pub use gxr_core::action_set::ActionSet;
pub use gxr_core::backend::Runtime;
pub use gxr_core::config::{Config, API_ENV_VAR, BACKEND_DIR_ENV_VAR, DEFAULT_API};
pub use gxr_core::context::{Context, ContextState};
pub use gxr_core::device::{ControllerState, Device, DeviceManager};
pub use gxr_core::error::{Error, Result};
pub use gxr_core::graphics::{GraphicsContext, GraphicsHandles, TextureHandle};
pub use gxr_core::manifest::{Binding, BindingComponent, BindingMode, BindingType, Manifest};
pub use gxr_core::types::*;
pub use gxr_core::{init_tracing, init_tracing_with_default, io};

pub use gxr_openxr::OpenXrRuntime;

/// Create a context with the backend the config selects.
///
/// Backends not compiled into this build fail here with
/// [`Error::BackendUnavailable`], before any runtime is touched.
pub fn new_context(config: Config) -> Result<Context> {
    info!(api = ?config.api, app = %config.app_name, "creating context");
    match config.api {
        Api::OpenXr => {
            let backend = OpenXrRuntime::new(&config);
            Ok(Context::with_backend(config, Box::new(backend)))
        }
        Api::OpenVr => Err(Error::BackendUnavailable(
            "OpenVR support is not compiled into this build".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openxr_context_is_constructed_uninitialized() {
        let context = new_context(Config::new("gxr-test")).unwrap();
        assert_eq!(context.api(), Api::OpenXr);
        assert_eq!(context.state(), ContextState::Uninitialized);
    }

    #[test]
    fn openvr_reports_backend_unavailable() {
        let config = Config::new("gxr-test").with_api(Api::OpenVr);
        assert!(matches!(
            new_context(config),
            Err(Error::BackendUnavailable(_))
        ));
    }
}
