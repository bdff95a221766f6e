//! Runtime-agnostic XR input and session handling.
//!
//! This crate provides the object model shared by all backends: a
//! [`Context`] owning one [`backend::Runtime`], [`ActionSet`]s of typed
//! [`Action`]s polled once per frame, manifest parsing and a tracked-device
//! table. Concrete runtime backends live in their own crates and plug in
//! through the [`backend::Runtime`] trait.

pub mod action;
pub mod action_set;
pub mod backend;
pub mod config;
pub mod context;
pub mod device;
pub mod error;
pub mod graphics;
pub mod io;
pub mod manifest;
pub mod types;

pub use action::{Action, ActionCallback, ActionType, PoseUsage};
pub use action_set::ActionSet;
pub use config::Config;
pub use context::{Context, ContextState};
pub use device::{Device, DeviceManager};
pub use error::{Error, Result};
pub use graphics::{GraphicsContext, GraphicsHandles, TextureHandle};
pub use manifest::Manifest;
pub use types::*;

/// Initialize tracing with sensible defaults.
///
/// Log level is controlled by the `RUST_LOG` environment variable.
/// Defaults to `info` if not set.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Initialize tracing with a specific default level.
pub fn init_tracing_with_default(default_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
