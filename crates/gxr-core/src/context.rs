//! The context: owns the backend, the session lifecycle and the device table.

use glam::Mat4;
use tracing::{debug, info, warn};

use crate::backend::{Runtime, RuntimeEvent, SessionState};
use crate::config::Config;
use crate::device::DeviceManager;
use crate::error::{Error, Result};
use crate::graphics::GraphicsContext;
use crate::manifest::Manifest;
use crate::types::{Api, AppType, ContextEvent, Eye, FrustumAngles, Hand, QuitReason};

/// Lifecycle state of a [`Context`]. States advance monotonically; there is
/// no way back short of dropping the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    RuntimeInitialized,
    SessionInitialized,
    Running,
    ShuttingDown,
}

/// Owns one backend runtime and everything scoped to its session.
///
/// The expected call order is [`Context::init_runtime`],
/// [`Context::init_graphics`], [`Context::init_session`], then the per-frame
/// loop of [`Context::poll_events`], action polling, [`Context::begin_frame`]
/// and [`Context::end_frame`]. The context is single-threaded; nothing in it
/// is `Sync`.
pub struct Context {
    config: Config,
    backend: Box<dyn Runtime>,
    state: ContextState,
    graphics_bound: bool,
    devices: DeviceManager,
    manifests: Vec<Manifest>,
    head_pose: Mat4,
}

impl Context {
    /// Wrap an already-constructed backend. The backend is fixed for the
    /// context's lifetime.
    pub fn with_backend(config: Config, backend: Box<dyn Runtime>) -> Context {
        Context {
            config,
            backend,
            state: ContextState::Uninitialized,
            graphics_bound: false,
            devices: DeviceManager::new(),
            manifests: Vec::new(),
            head_pose: Mat4::IDENTITY,
        }
    }

    pub fn api(&self) -> Api {
        self.backend.api()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn devices(&self) -> &DeviceManager {
        &self.devices
    }

    pub(crate) fn backend_mut(&mut self) -> &mut dyn Runtime {
        self.backend.as_mut()
    }

    pub(crate) fn backend_and_devices(&mut self) -> (&mut dyn Runtime, &mut DeviceManager) {
        (self.backend.as_mut(), &mut self.devices)
    }

    pub(crate) fn backend_and_manifests(&mut self) -> (&mut dyn Runtime, &[Manifest]) {
        (self.backend.as_mut(), &self.manifests)
    }

    /// Parse a manifest from its two JSON documents and register it. One
    /// manifest per interaction profile; all registered manifests take part
    /// in [`ActionSet::attach_bindings`](crate::ActionSet::attach_bindings).
    pub fn load_manifest(&mut self, actions_json: &str, bindings_json: &str) -> Result<()> {
        let manifest = Manifest::load(actions_json, bindings_json)?;
        self.add_manifest(manifest);
        Ok(())
    }

    /// Register an already-parsed manifest.
    pub fn add_manifest(&mut self, manifest: Manifest) {
        debug!(
            profile = manifest.interaction_profile().unwrap_or("<none>"),
            inputs = manifest.num_inputs(),
            "registered manifest"
        );
        self.manifests.push(manifest);
    }

    pub fn manifests(&self) -> &[Manifest] {
        &self.manifests
    }

    /// Initialize the runtime for the given application type. Must be the
    /// first call on a fresh context.
    pub fn init_runtime(&mut self, app_type: AppType) -> Result<()> {
        if self.state != ContextState::Uninitialized {
            return Err(Error::lifecycle("runtime is already initialized"));
        }
        self.backend.init_runtime(app_type)?;
        self.state = ContextState::RuntimeInitialized;
        info!(api = ?self.backend.api(), ?app_type, "runtime initialized");
        Ok(())
    }

    /// Bind the graphics device the session renders with.
    pub fn init_graphics(&mut self, gfx: &mut dyn GraphicsContext) -> Result<()> {
        if self.state != ContextState::RuntimeInitialized {
            return Err(Error::lifecycle(
                "graphics can only be bound after runtime init and before session init",
            ));
        }
        self.backend.bind_graphics(gfx)?;
        self.graphics_bound = true;
        Ok(())
    }

    /// Create the session on the bound graphics device.
    pub fn init_session(&mut self) -> Result<()> {
        if self.state != ContextState::RuntimeInitialized {
            return Err(Error::lifecycle("session requires an initialized runtime"));
        }
        if !self.graphics_bound {
            return Err(Error::lifecycle("session requires bound graphics"));
        }
        self.backend.init_session()?;
        self.state = ContextState::SessionInitialized;
        info!("session initialized");
        Ok(())
    }

    /// Drain all pending backend events, update internal state and the device
    /// table, and return the events the application should react to.
    pub fn poll_events(&mut self) -> Vec<ContextEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.backend.poll_event() {
            match event {
                RuntimeEvent::SessionStateChanged(state) => {
                    self.on_session_state(state, &mut events)
                }
                RuntimeEvent::KeyboardInput { text } => {
                    events.push(ContextEvent::KeyboardInput { text })
                }
                RuntimeEvent::KeyboardClosed => events.push(ContextEvent::KeyboardClose),
                RuntimeEvent::DeviceActivated { handle } => {
                    let is_controller = Hand::from_device_handle(handle).is_some();
                    self.devices.add(handle, is_controller);
                    events.push(ContextEvent::DeviceActivate { handle });
                }
                RuntimeEvent::DeviceDeactivated { handle } => {
                    self.devices.remove(handle);
                    events.push(ContextEvent::DeviceDeactivate { handle });
                }
                RuntimeEvent::DeviceUpdated { handle } => {
                    events.push(ContextEvent::DeviceUpdate { handle })
                }
                RuntimeEvent::BindingsUpdated => events.push(ContextEvent::BindingsUpdate),
                RuntimeEvent::ManifestReloaded => {
                    events.push(ContextEvent::ActionManifestReloaded)
                }
                RuntimeEvent::QuitRequested { reason } => {
                    self.state = ContextState::ShuttingDown;
                    events.push(ContextEvent::Quit { reason });
                }
                RuntimeEvent::InstanceLossPending => {
                    warn!("runtime instance loss pending");
                    self.state = ContextState::ShuttingDown;
                    events.push(ContextEvent::Quit {
                        reason: QuitReason::Shutdown,
                    });
                }
            }
        }
        events
    }

    fn on_session_state(&mut self, state: SessionState, events: &mut Vec<ContextEvent>) {
        debug!(?state, "session state changed");
        match state {
            SessionState::Ready
            | SessionState::Synchronized
            | SessionState::Visible
            | SessionState::Focused => {
                if self.state == ContextState::SessionInitialized {
                    self.state = ContextState::Running;
                }
            }
            SessionState::Exiting | SessionState::LossPending => {
                self.state = ContextState::ShuttingDown;
                events.push(ContextEvent::Quit {
                    reason: QuitReason::Shutdown,
                });
            }
            _ => {}
        }
    }

    /// Begin a frame. Returns whether this frame should be rendered.
    pub fn begin_frame(&mut self) -> Result<bool> {
        if !matches!(
            self.state,
            ContextState::SessionInitialized | ContextState::Running
        ) {
            return Err(Error::lifecycle("frames require an initialized session"));
        }
        self.backend.begin_frame()
    }

    /// Submit the frame, then refresh device poses and the cached head pose.
    /// A head pose that fails to read keeps its previous value.
    pub fn end_frame(&mut self) -> Result<()> {
        self.backend.end_frame()?;
        let poses = self.backend.device_poses();
        self.devices.update_poses(&poses);
        match self.backend.head_pose() {
            Ok(pose) => self.head_pose = pose,
            Err(e) => warn!("head pose unavailable: {e}"),
        }
        Ok(())
    }

    /// The most recently read head pose, identity before the first frame.
    pub fn head_pose(&self) -> Mat4 {
        self.head_pose
    }

    pub fn frustum_angles(&mut self, eye: Eye) -> FrustumAngles {
        self.backend.frustum_angles(eye)
    }

    pub fn is_focused(&self) -> bool {
        self.backend.is_focused()
    }

    /// Ask the runtime to end the session. The matching quit event arrives
    /// through [`Context::poll_events`].
    pub fn request_quit(&mut self) -> Result<()> {
        self.backend.request_quit()
    }

    /// Acknowledge a received quit event so the runtime can finish tearing
    /// the session down.
    pub fn acknowledge_quit(&mut self) {
        self.backend.acknowledge_quit();
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("api", &self.backend.api())
            .field("state", &self.state)
            .field("devices", &self.devices.len())
            .finish()
    }
}
