//! Scriptable in-memory backend used by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use glam::Mat4;

use gxr_core::action::ActionType;
use gxr_core::backend::{
    ActionHandle, ActionSetHandle, DigitalState, FloatState, HapticPulse, PoseInputState, Runtime,
    RuntimeEvent, SpaceHandle, SpaceLocation, SuggestedBinding, SyncOutcome, Vec2State,
};
use gxr_core::error::{Error, Result};
use gxr_core::graphics::GraphicsContext;
use gxr_core::types::{Api, AppType, DevicePose, Hand, Pose, QuitReason};

#[derive(Default)]
pub struct MockState {
    next_handle: u64,
    /// Created actions by handle: (set, name, type).
    pub actions: Vec<(ActionSetHandle, String, ActionType)>,
    pub action_sets: Vec<String>,
    /// space handle -> (action handle, hand index)
    pub spaces: HashMap<u64, (u64, usize)>,

    pub digital: HashMap<(u64, usize), DigitalState>,
    pub floats: HashMap<(u64, usize), FloatState>,
    pub vec2s: HashMap<(u64, usize), Vec2State>,
    /// keyed by (action handle, hand index)
    pub locations: HashMap<(u64, usize), SpaceLocation>,

    pub focused: bool,
    pub sync_outcome: SyncOutcome,
    pub sync_error: Option<String>,
    pub sync_calls: Vec<Vec<ActionSetHandle>>,
    pub suggest_calls: Vec<(String, Vec<SuggestedBinding>)>,
    pub attach_calls: Vec<Vec<ActionSetHandle>>,
    pub haptic_calls: Vec<(ActionHandle, Hand, HapticPulse)>,

    pub events: VecDeque<RuntimeEvent>,
    pub device_pose_batch: Vec<DevicePose>,
    pub head: Mat4,
    pub frames_begun: usize,
    pub frames_ended: usize,
    pub quit_requested: bool,
    pub quit_acknowledged: bool,
}

impl MockState {
    pub fn action_handle(&self, name: &str) -> ActionHandle {
        let idx = self
            .actions
            .iter()
            .position(|(_, n, _)| n == name)
            .unwrap_or_else(|| panic!("no action named '{name}'"));
        ActionHandle(idx as u64)
    }
}

/// Graphics collaborator that accepts everything.
#[derive(Default)]
pub struct MockGraphics {
    pub instance_extensions: Vec<String>,
    pub device_extensions: Vec<String>,
}

impl GraphicsContext for MockGraphics {
    fn handles(&self) -> gxr_core::GraphicsHandles {
        gxr_core::GraphicsHandles {
            instance: 1,
            physical_device: 2,
            device: 3,
            queue_family_index: 0,
            queue_index: 0,
        }
    }

    fn enable_instance_extensions(&mut self, names: &[String]) -> Result<()> {
        self.instance_extensions.extend_from_slice(names);
        Ok(())
    }

    fn enable_device_extensions(&mut self, names: &[String]) -> Result<()> {
        self.device_extensions.extend_from_slice(names);
        Ok(())
    }

    fn upload_texture(
        &mut self,
        _pixels: &[u8],
        _width: u32,
        _height: u32,
    ) -> Result<gxr_core::TextureHandle> {
        Ok(gxr_core::TextureHandle(1))
    }

    fn submit_texture(&mut self, _texture: gxr_core::TextureHandle) -> Result<()> {
        Ok(())
    }
}

/// Backend whose state is shared with the test through an `Rc`.
pub struct MockRuntime {
    state: Rc<RefCell<MockState>>,
}

impl MockRuntime {
    pub fn new() -> (MockRuntime, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState {
            focused: true,
            sync_outcome: SyncOutcome::Synced,
            head: Mat4::IDENTITY,
            ..MockState::default()
        }));
        (
            MockRuntime {
                state: Rc::clone(&state),
            },
            state,
        )
    }
}

impl Runtime for MockRuntime {
    fn api(&self) -> Api {
        Api::OpenXr
    }

    fn init_runtime(&mut self, _app_type: AppType) -> Result<()> {
        Ok(())
    }

    fn bind_graphics(&mut self, _gfx: &mut dyn GraphicsContext) -> Result<()> {
        Ok(())
    }

    fn init_session(&mut self) -> Result<()> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<RuntimeEvent> {
        self.state.borrow_mut().events.pop_front()
    }

    fn is_focused(&self) -> bool {
        self.state.borrow().focused
    }

    fn predicted_display_time_ns(&self) -> i64 {
        1_000_000
    }

    fn create_action_set(&mut self, name: &str) -> Result<ActionSetHandle> {
        let mut state = self.state.borrow_mut();
        state.action_sets.push(name.to_string());
        let handle = ActionSetHandle(state.next_handle);
        state.next_handle += 1;
        Ok(handle)
    }

    fn create_action(
        &mut self,
        set: ActionSetHandle,
        name: &str,
        ty: ActionType,
    ) -> Result<ActionHandle> {
        let mut state = self.state.borrow_mut();
        let handle = ActionHandle(state.actions.len() as u64);
        state.actions.push((set, name.to_string(), ty));
        Ok(handle)
    }

    fn create_action_space(&mut self, action: ActionHandle, hand: Hand) -> Result<SpaceHandle> {
        let mut state = self.state.borrow_mut();
        let handle = 1000 + state.spaces.len() as u64;
        state.spaces.insert(handle, (action.0, hand.index()));
        Ok(SpaceHandle(handle))
    }

    fn sync_action_sets(&mut self, sets: &[ActionSetHandle]) -> Result<SyncOutcome> {
        let mut state = self.state.borrow_mut();
        state.sync_calls.push(sets.to_vec());
        if let Some(msg) = &state.sync_error {
            return Err(Error::Sync(msg.clone()));
        }
        Ok(state.sync_outcome)
    }

    fn digital_state(&mut self, action: ActionHandle, hand: Hand) -> Result<DigitalState> {
        Ok(self
            .state
            .borrow()
            .digital
            .get(&(action.0, hand.index()))
            .copied()
            .unwrap_or_default())
    }

    fn float_state(&mut self, action: ActionHandle, hand: Hand) -> Result<FloatState> {
        Ok(self
            .state
            .borrow()
            .floats
            .get(&(action.0, hand.index()))
            .copied()
            .unwrap_or_default())
    }

    fn vec2_state(&mut self, action: ActionHandle, hand: Hand) -> Result<Vec2State> {
        Ok(self
            .state
            .borrow()
            .vec2s
            .get(&(action.0, hand.index()))
            .copied()
            .unwrap_or_default())
    }

    fn pose_state(&mut self, _action: ActionHandle, _hand: Hand) -> Result<PoseInputState> {
        Ok(PoseInputState { active: true })
    }

    fn locate_space(&mut self, space: SpaceHandle, _time_ns: i64) -> Result<SpaceLocation> {
        let state = self.state.borrow();
        let key = state
            .spaces
            .get(&space.0)
            .copied()
            .ok_or_else(|| Error::backend("unknown space"))?;
        Ok(state.locations.get(&key).copied().unwrap_or(SpaceLocation {
            orientation_valid: true,
            position_valid: true,
            pose: Pose::IDENTITY,
        }))
    }

    fn apply_haptic(
        &mut self,
        action: ActionHandle,
        hand: Hand,
        pulse: &HapticPulse,
    ) -> Result<()> {
        self.state
            .borrow_mut()
            .haptic_calls
            .push((action, hand, *pulse));
        Ok(())
    }

    fn suggest_bindings(&mut self, profile: &str, bindings: &[SuggestedBinding]) -> Result<()> {
        self.state
            .borrow_mut()
            .suggest_calls
            .push((profile.to_string(), bindings.to_vec()));
        Ok(())
    }

    fn attach_action_sets(&mut self, sets: &[ActionSetHandle]) -> Result<()> {
        self.state.borrow_mut().attach_calls.push(sets.to_vec());
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<bool> {
        self.state.borrow_mut().frames_begun += 1;
        Ok(true)
    }

    fn end_frame(&mut self) -> Result<()> {
        self.state.borrow_mut().frames_ended += 1;
        Ok(())
    }

    fn device_poses(&mut self) -> Vec<DevicePose> {
        self.state.borrow().device_pose_batch.clone()
    }

    fn head_pose(&mut self) -> Result<Mat4> {
        Ok(self.state.borrow().head)
    }

    fn request_quit(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.quit_requested = true;
        state.events.push_back(RuntimeEvent::QuitRequested {
            reason: QuitReason::ProcessQuit,
        });
        Ok(())
    }

    fn acknowledge_quit(&mut self) {
        self.state.borrow_mut().quit_acknowledged = true;
    }
}
