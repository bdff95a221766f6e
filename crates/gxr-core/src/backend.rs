//! The backend runtime trait: the seam between the runtime-agnostic object
//! model and a concrete XR runtime.
//!
//! A [`Runtime`] implementation is chosen once at startup and injected into
//! [`Context`](crate::Context); it cannot be switched without recreating the
//! context. The trait has a fixed method table; optional capabilities come
//! with documented defaults instead of panicking or returning null.

use glam::{Mat4, Vec2};
use tracing::warn;

use crate::action::ActionType;
use crate::error::Result;
use crate::graphics::GraphicsContext;
use crate::types::{AppType, DevicePose, Eye, FrustumAngles, Hand, Pose, QuitReason};

/// Opaque runtime handle for an action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionSetHandle(pub u64);

/// Opaque runtime handle for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle(pub u64);

/// Opaque runtime handle for an action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceHandle(pub u64);

/// Outcome of a successful sync call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncOutcome {
    /// Input state was synchronized.
    #[default]
    Synced,
    /// The runtime reported the session is not focused. This is a known race
    /// between the focus-state read and the sync call and is benign.
    NotFocused,
}

/// Raw boolean input state for one hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitalState {
    pub active: bool,
    pub state: bool,
    pub changed: bool,
}

/// Raw float input state for one hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatState {
    pub active: bool,
    pub state: f32,
    pub changed: bool,
}

/// Raw 2d input state for one hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vec2State {
    pub active: bool,
    pub state: Vec2,
    pub changed: bool,
}

/// Raw pose input state for one hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseInputState {
    pub active: bool,
}

/// A located action space relative to the tracked space.
#[derive(Debug, Clone, Copy)]
pub struct SpaceLocation {
    pub orientation_valid: bool,
    pub position_valid: bool,
    pub pose: Pose,
}

/// A single haptic vibration event. Duration is in the runtime's integer time
/// unit (nanoseconds); conversion from seconds happens in
/// [`Action::trigger_haptic`](crate::Action::trigger_haptic).
#[derive(Debug, Clone, Copy)]
pub struct HapticPulse {
    pub duration_ns: i64,
    pub frequency_hz: f32,
    pub amplitude: f32,
}

/// One suggested binding: an action handle plus a full component path.
#[derive(Debug, Clone)]
pub struct SuggestedBinding {
    pub action: ActionHandle,
    pub path: String,
}

/// Session state as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unknown,
    Idle,
    Ready,
    Synchronized,
    Visible,
    Focused,
    Stopping,
    LossPending,
    Exiting,
}

/// Event drained from the backend's event queue.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    SessionStateChanged(SessionState),
    KeyboardInput { text: String },
    KeyboardClosed,
    DeviceActivated { handle: u64 },
    DeviceDeactivated { handle: u64 },
    DeviceUpdated { handle: u64 },
    /// The active interaction profile changed.
    BindingsUpdated,
    /// The runtime reloaded the action manifest.
    ManifestReloaded,
    QuitRequested { reason: QuitReason },
    /// The runtime instance is about to be lost.
    InstanceLossPending,
}

/// A concrete XR runtime backend.
///
/// All calls are synchronous and expected to return quickly; the core invokes
/// them from a single thread only.
pub trait Runtime {
    /// Which API this backend talks to.
    fn api(&self) -> crate::types::Api;

    /// Initialize the underlying runtime for the given application type.
    /// Fails if the runtime is not installed.
    fn init_runtime(&mut self, app_type: AppType) -> Result<()>;

    /// Bind the graphics device the session will render with. Must be called
    /// before [`Runtime::init_session`].
    fn bind_graphics(&mut self, gfx: &mut dyn GraphicsContext) -> Result<()>;

    /// Create the render session on the bound graphics device.
    fn init_session(&mut self) -> Result<()>;

    /// Pop the next pending runtime event, or `None` when the queue is
    /// drained. Event types the backend does not understand are logged and
    /// skipped, never surfaced.
    fn poll_event(&mut self) -> Option<RuntimeEvent>;

    /// Whether the session is currently in the runtime's focused state.
    fn is_focused(&self) -> bool;

    /// The predicted display time of the current frame, in nanoseconds.
    fn predicted_display_time_ns(&self) -> i64;

    fn create_action_set(&mut self, name: &str) -> Result<ActionSetHandle>;

    fn create_action(
        &mut self,
        set: ActionSetHandle,
        name: &str,
        ty: ActionType,
    ) -> Result<ActionHandle>;

    /// Create the per-hand action space for a pose action.
    fn create_action_space(&mut self, action: ActionHandle, hand: Hand) -> Result<SpaceHandle>;

    /// Synchronize input state for all given sets in one runtime call.
    fn sync_action_sets(&mut self, sets: &[ActionSetHandle]) -> Result<SyncOutcome>;

    fn digital_state(&mut self, action: ActionHandle, hand: Hand) -> Result<DigitalState>;
    fn float_state(&mut self, action: ActionHandle, hand: Hand) -> Result<FloatState>;
    fn vec2_state(&mut self, action: ActionHandle, hand: Hand) -> Result<Vec2State>;
    fn pose_state(&mut self, action: ActionHandle, hand: Hand) -> Result<PoseInputState>;

    /// Locate an action space relative to the tracked space at the given time.
    fn locate_space(&mut self, space: SpaceHandle, time_ns: i64) -> Result<SpaceLocation>;

    fn apply_haptic(&mut self, action: ActionHandle, hand: Hand, pulse: &HapticPulse)
        -> Result<()>;

    /// Submit one batch of suggested bindings for an interaction profile.
    fn suggest_bindings(&mut self, profile: &str, bindings: &[SuggestedBinding]) -> Result<()>;

    /// Attach the given action sets to the session in one call. Can only
    /// happen once per session.
    fn attach_action_sets(&mut self, sets: &[ActionSetHandle]) -> Result<()>;

    /// Begin a frame. Returns whether the application should render it.
    fn begin_frame(&mut self) -> Result<bool>;

    /// Submit the frame.
    fn end_frame(&mut self) -> Result<()>;

    /// Batched device poses for this frame. Backends that deliver poses only
    /// through pose actions return an empty list, which is the default.
    fn device_poses(&mut self) -> Vec<DevicePose> {
        Vec::new()
    }

    /// Model matrix of the head (view space in the tracked space).
    fn head_pose(&mut self) -> Result<Mat4>;

    /// Frustum angles for one eye, in degrees. Backends without this
    /// capability return `1,1,1,1` with a warning.
    fn frustum_angles(&mut self, eye: Eye) -> FrustumAngles {
        let _ = eye;
        warn!("frustum angles not implemented by this backend");
        FrustumAngles {
            left: 1.0,
            right: 1.0,
            top: 1.0,
            bottom: 1.0,
        }
    }

    /// Ask the runtime to end the session; a quit event follows through
    /// [`Runtime::poll_event`].
    fn request_quit(&mut self) -> Result<()>;

    /// Acknowledge a received quit event. No-op on runtimes without an
    /// acknowledgement handshake.
    fn acknowledge_quit(&mut self) {}
}
