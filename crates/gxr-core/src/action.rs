//! Actions: typed input bindings polled once per frame.

use glam::Vec3;
use tracing::{debug, warn};

use crate::backend::{ActionHandle, ActionSetHandle, HapticPulse, Runtime, SpaceHandle};
use crate::device::DeviceManager;
use crate::error::{Error, Result};
use crate::types::{AnalogEvent, DigitalEvent, Hand, PoseEvent, NUM_HANDS};

/// Input type of an action. Determines which raw state is read per poll and
/// which event the action emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    /// Boolean input, emits [`DigitalEvent`]s.
    Digital,
    /// Float input thresholded into a boolean, emits [`DigitalEvent`]s and
    /// optionally a haptic pulse on each threshold crossing.
    DigitalFromFloat,
    /// 1d axis, emits [`AnalogEvent`]s.
    Float,
    /// 2d axis, emits [`AnalogEvent`]s.
    Vec2f,
    /// Tracked space, emits [`PoseEvent`]s or updates a controller pose.
    Pose,
    /// Output action. Never polled; triggered explicitly.
    Haptic,
}

/// Which controller pose slot a pose action feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseUsage {
    Pointer,
    HandGrip,
}

/// Where an action's per-poll results go.
pub enum ActionCallback {
    Digital(Box<dyn FnMut(&DigitalEvent)>),
    Analog(Box<dyn FnMut(&AnalogEvent)>),
    Pose(Box<dyn FnMut(&PoseEvent)>),
    /// Instead of invoking a callback, write the located pose into the
    /// controller's pose slot in the device table.
    ControllerPose(PoseUsage),
}

impl std::fmt::Debug for ActionCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionCallback::Digital(_) => f.write_str("Digital(..)"),
            ActionCallback::Analog(_) => f.write_str("Analog(..)"),
            ActionCallback::Pose(_) => f.write_str("Pose(..)"),
            ActionCallback::ControllerPose(usage) => write!(f, "ControllerPose({usage:?})"),
        }
    }
}

/// Derive the runtime-internal action name from an action URL: the segment
/// after the last `/`. Fails for URLs with an empty last segment.
pub fn url_to_name(url: &str) -> Result<String> {
    let name = url.rsplit('/').next().unwrap_or("");
    if name.is_empty() || name == "." {
        return Err(Error::InvalidUrl(format!(
            "no name could be derived from '{url}'"
        )));
    }
    Ok(name.to_string())
}

/// Pulse sent on every threshold crossing of a digital-from-float action.
const THRESHOLD_PULSE: HapticPulse = HapticPulse {
    // 0.03 s
    duration_ns: 30_000_000,
    frequency_hz: 50.0,
    amplitude: 0.4,
};

/// Whether a float input crossed the threshold in either direction between
/// two polls.
fn threshold_passed(threshold: f32, last: f32, current: f32) -> bool {
    (last < threshold && current >= threshold) || (last >= threshold && current <= threshold)
}

/// One typed action inside an action set.
pub struct Action {
    url: String,
    name: String,
    ty: ActionType,
    handle: ActionHandle,
    /// Per-hand action spaces; populated for pose actions only.
    hand_spaces: [Option<SpaceHandle>; NUM_HANDS],
    threshold: f32,
    last_float: [f32; NUM_HANDS],
    last_bool: [bool; NUM_HANDS],
    last_vec: [Vec3; NUM_HANDS],
    /// Companion haptic action pulsed on threshold crossings.
    haptic_handle: Option<ActionHandle>,
    callback: Option<ActionCallback>,
}

impl Action {
    /// Create an action of the given type in `set`, deriving the runtime
    /// name from the URL. Pose actions also get one action space per hand.
    pub(crate) fn create(
        backend: &mut dyn Runtime,
        set: ActionSetHandle,
        url: &str,
        ty: ActionType,
        callback: Option<ActionCallback>,
    ) -> Result<Action> {
        let name = url_to_name(url)?;
        let handle = backend.create_action(set, &name, ty)?;

        let mut hand_spaces = [None; NUM_HANDS];
        if ty == ActionType::Pose {
            for hand in Hand::ALL {
                hand_spaces[hand.index()] = Some(backend.create_action_space(handle, hand)?);
            }
        }

        debug!(url, %name, ?ty, "created action");
        Ok(Action {
            url: url.to_string(),
            name,
            ty,
            handle,
            hand_spaces,
            threshold: 0.0,
            last_float: [0.0; NUM_HANDS],
            last_bool: [false; NUM_HANDS],
            last_vec: [Vec3::ZERO; NUM_HANDS],
            haptic_handle: None,
            callback,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action_type(&self) -> ActionType {
        self.ty
    }

    pub(crate) fn handle(&self) -> ActionHandle {
        self.handle
    }

    pub(crate) fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    pub(crate) fn set_haptic_companion(&mut self, handle: ActionHandle) {
        self.haptic_handle = Some(handle);
    }

    /// Read this action's state for every registered controller and route the
    /// results. A hand that fails to read is skipped for this poll; the next
    /// poll retries it.
    pub(crate) fn poll(
        &mut self,
        backend: &mut dyn Runtime,
        devices: &mut DeviceManager,
    ) -> Result<()> {
        let controllers = devices.controller_handles();
        for controller in controllers {
            // Per-hand state slots exist for the two hand controllers only;
            // input on any other tracked device has nowhere to go.
            let Some(hand) = Hand::from_device_handle(controller) else {
                debug!(controller, action = %self.url, "input without a hand controller");
                continue;
            };
            match self.ty {
                ActionType::Digital => self.poll_digital(backend, controller, hand),
                ActionType::DigitalFromFloat => {
                    self.poll_digital_from_float(backend, controller, hand)
                }
                ActionType::Float => self.poll_float(backend, controller, hand),
                ActionType::Vec2f => self.poll_vec2(backend, controller, hand),
                ActionType::Pose => self.poll_pose(backend, devices, controller, hand),
                ActionType::Haptic => {}
            }
        }
        Ok(())
    }

    fn poll_digital(&mut self, backend: &mut dyn Runtime, controller: u64, hand: Hand) {
        let state = match backend.digital_state(self.handle, hand) {
            Ok(state) => state,
            Err(e) => {
                debug!(action = %self.url, ?hand, "digital state unavailable: {e}");
                return;
            }
        };
        let event = DigitalEvent {
            controller,
            active: state.active,
            state: state.state,
            changed: state.changed,
            time: 0.0,
        };
        if let Some(ActionCallback::Digital(cb)) = &mut self.callback {
            cb(&event);
        }
    }

    fn poll_digital_from_float(&mut self, backend: &mut dyn Runtime, controller: u64, hand: Hand) {
        let state = match backend.float_state(self.handle, hand) {
            Ok(state) => state,
            Err(e) => {
                debug!(action = %self.url, ?hand, "float state unavailable: {e}");
                return;
            }
        };
        let last = self.last_float[hand.index()];
        let crossed = threshold_passed(self.threshold, last, state.state);
        self.last_float[hand.index()] = state.state;

        // The pulse fires on any crossing, even one where the derived
        // boolean keeps its value (the threshold itself counts as pressed
        // from both sides).
        if crossed {
            if let Some(haptic) = self.haptic_handle {
                if let Err(e) = backend.apply_haptic(haptic, hand, &THRESHOLD_PULSE) {
                    warn!(action = %self.url, ?hand, "haptic pulse failed: {e}");
                }
            }
        }

        let pressed = state.state >= self.threshold;
        let was_pressed = self.last_bool[hand.index()];
        self.last_bool[hand.index()] = pressed;

        let event = DigitalEvent {
            controller,
            active: state.active,
            state: pressed,
            changed: state.changed && pressed != was_pressed,
            time: 0.0,
        };
        if let Some(ActionCallback::Digital(cb)) = &mut self.callback {
            cb(&event);
        }
    }

    fn poll_float(&mut self, backend: &mut dyn Runtime, controller: u64, hand: Hand) {
        let state = match backend.float_state(self.handle, hand) {
            Ok(state) => state,
            Err(e) => {
                debug!(action = %self.url, ?hand, "float state unavailable: {e}");
                return;
            }
        };
        let current = Vec3::new(state.state, 0.0, 0.0);
        let last = Vec3::new(self.last_float[hand.index()], 0.0, 0.0);
        self.last_float[hand.index()] = state.state;

        let event = AnalogEvent {
            controller,
            active: state.active,
            state: current,
            delta: last - current,
            time: 0.0,
        };
        if let Some(ActionCallback::Analog(cb)) = &mut self.callback {
            cb(&event);
        }
    }

    fn poll_vec2(&mut self, backend: &mut dyn Runtime, controller: u64, hand: Hand) {
        let state = match backend.vec2_state(self.handle, hand) {
            Ok(state) => state,
            Err(e) => {
                debug!(action = %self.url, ?hand, "vec2 state unavailable: {e}");
                return;
            }
        };
        let current = Vec3::new(state.state.x, state.state.y, 0.0);
        let last = self.last_vec[hand.index()];
        self.last_vec[hand.index()] = current;

        let event = AnalogEvent {
            controller,
            active: state.active,
            state: current,
            delta: last - current,
            time: 0.0,
        };
        if let Some(ActionCallback::Analog(cb)) = &mut self.callback {
            cb(&event);
        }
    }

    fn poll_pose(
        &mut self,
        backend: &mut dyn Runtime,
        devices: &mut DeviceManager,
        controller: u64,
        hand: Hand,
    ) {
        let Some(space) = self.hand_spaces[hand.index()] else {
            warn!(action = %self.url, ?hand, "pose action has no space for this hand");
            return;
        };
        let state = match backend.pose_state(self.handle, hand) {
            Ok(state) => state,
            Err(e) => {
                debug!(action = %self.url, ?hand, "pose state unavailable: {e}");
                return;
            }
        };
        let time = backend.predicted_display_time_ns();
        let location = match backend.locate_space(space, time) {
            Ok(location) => location,
            Err(e) => {
                debug!(action = %self.url, ?hand, "space location unavailable: {e}");
                return;
            }
        };
        // A pose counts as valid when its orientation is valid; position
        // validity alone does not gate it.
        let valid = location.orientation_valid;
        let pose = location.pose.to_mat4();

        match &mut self.callback {
            Some(ActionCallback::Pose(cb)) => {
                let event = PoseEvent {
                    controller,
                    active: state.active,
                    pose,
                    velocity: Vec3::ZERO,
                    angular_velocity: Vec3::ZERO,
                    valid,
                    device_connected: state.active,
                };
                cb(&event);
            }
            Some(ActionCallback::ControllerPose(usage)) => {
                let usage = *usage;
                if let Some(ctrl) = devices.get_mut(controller).and_then(|d| d.controller.as_mut())
                {
                    match usage {
                        PoseUsage::Pointer => {
                            ctrl.pointer_pose = pose;
                            ctrl.pointer_pose_valid = valid;
                        }
                        PoseUsage::HandGrip => {
                            ctrl.hand_grip_pose = pose;
                            ctrl.hand_grip_pose_valid = valid;
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// Fire a haptic pulse on this action for one hand. `secs_from_now` is
    /// accepted for interface parity but the pulse always starts immediately.
    pub fn trigger_haptic(
        &self,
        context: &mut crate::context::Context,
        secs_from_now: f32,
        duration_secs: f32,
        frequency_hz: f32,
        amplitude: f32,
        hand: Hand,
    ) -> Result<()> {
        let _ = secs_from_now;
        let target = if self.ty == ActionType::Haptic {
            self.handle
        } else {
            self.haptic_handle.ok_or_else(|| {
                Error::backend(format!("action '{}' has no haptic output", self.url))
            })?
        };
        let pulse = HapticPulse {
            duration_ns: (duration_secs * 1_000_000_000.0) as i64,
            frequency_hz,
            amplitude,
        };
        context.backend_mut().apply_haptic(target, hand, &pulse)
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("url", &self.url)
            .field("ty", &self.ty)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
