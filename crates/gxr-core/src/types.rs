//! Value types shared across the crate: hands, poses, normalized input events.

use glam::{Mat4, Quat, Vec3};

/// Number of subaction paths tracked per action. Exactly left and right hand;
/// actions with more than two input sources are not supported.
pub const NUM_HANDS: usize = 2;

/// Backend runtime API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    OpenVr,
    OpenXr,
}

/// Left or right hand subaction path of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; NUM_HANDS] = [Hand::Left, Hand::Right];

    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    /// Resolve a device handle to a hand. Handles 0 and 1 are the left and
    /// right hand controllers; anything else has no subaction path.
    pub fn from_device_handle(handle: u64) -> Option<Hand> {
        match handle {
            0 => Some(Hand::Left),
            1 => Some(Hand::Right),
            _ => None,
        }
    }
}

/// Type of application session requested from the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppType {
    /// Renders stereo viewports for the whole scene.
    Scene,
    /// Renders mono buffers to compositor overlays.
    Overlay,
    /// Does not render anything.
    Background,
}

/// Per-eye viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

/// Reason a quit event was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitReason {
    /// The runtime is shutting down.
    Shutdown,
    /// Another scene application is starting; shared runtime state should
    /// usually survive this.
    ApplicationTransition,
    /// This process's scene session is quitting.
    ProcessQuit,
}

/// An orientation + position pair as reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub orientation: Quat,
    pub position: Vec3,
}

impl Pose {
    pub const IDENTITY: Pose = Pose {
        orientation: Quat::IDENTITY,
        position: Vec3::ZERO,
    };

    /// Model matrix for this pose.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position)
    }
}

/// Frustum angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrustumAngles {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Normalized digital (button) event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigitalEvent {
    /// Device handle of the controller this state was read from.
    pub controller: u64,
    /// Whether the action is currently bound in the active action set.
    pub active: bool,
    /// Pressed or released.
    pub state: bool,
    /// Whether the state changed since the last sync.
    pub changed: bool,
    /// Seconds relative to now when the state last changed.
    pub time: f32,
}

/// Normalized analog (1d/2d axis) event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalogEvent {
    pub controller: u64,
    pub active: bool,
    /// Current axis state; unused components are zero.
    pub state: Vec3,
    /// Previous state minus current state.
    pub delta: Vec3,
    pub time: f32,
}

/// Normalized pose event, one per hand per poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseEvent {
    pub controller: u64,
    pub active: bool,
    /// Model matrix built from the located space.
    pub pose: Mat4,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Whether the located space reported a valid orientation.
    pub valid: bool,
    /// Mirrors `active`: whether the bound device is connected.
    pub device_connected: bool,
}

/// A batched device pose update, as fetched at end-of-frame.
#[derive(Debug, Clone, Copy)]
pub struct DevicePose {
    pub handle: u64,
    pub transformation: Mat4,
    pub is_valid: bool,
}

/// Event re-dispatched to the application by [`Context::poll_events`].
///
/// [`Context::poll_events`]: crate::Context::poll_events
#[derive(Debug, Clone, PartialEq)]
pub enum ContextEvent {
    /// Text typed on the runtime's system keyboard.
    KeyboardInput { text: String },
    /// The system keyboard was closed.
    KeyboardClose,
    /// A tracked device appeared.
    DeviceActivate { handle: u64 },
    /// A tracked device disappeared.
    DeviceDeactivate { handle: u64 },
    /// A tracked device changed (reconnected, role change).
    DeviceUpdate { handle: u64 },
    /// The active interaction profile / bindings changed.
    BindingsUpdate,
    /// The action manifest was reloaded by the runtime.
    ActionManifestReloaded,
    /// The application must quit. Acknowledge with
    /// [`Context::acknowledge_quit`](crate::Context::acknowledge_quit).
    Quit { reason: QuitReason },
}
