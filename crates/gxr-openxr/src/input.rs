//! Action storage and input state translation.
//!
//! Handles given out through the backend trait are indices into the tables
//! kept here; the typed `xr::Action` objects never cross the trait boundary.

use glam::Vec2;
use openxr as xr;
use tracing::debug;

use gxr_core::action::ActionType;
use gxr_core::backend::{
    ActionHandle, ActionSetHandle, DigitalState, FloatState, HapticPulse, PoseInputState,
    SpaceHandle, SpaceLocation, SuggestedBinding, SyncOutcome, Vec2State,
};
use gxr_core::error::{Error, Result};

use crate::to_pose;

enum XrAction {
    Bool(xr::Action<bool>),
    Float(xr::Action<f32>),
    Vec2(xr::Action<xr::Vector2f>),
    Pose(xr::Action<xr::Posef>),
    Haptic(xr::Action<xr::Haptic>),
}

#[derive(Default)]
pub(crate) struct InputTable {
    sets: Vec<xr::ActionSet>,
    actions: Vec<XrAction>,
    spaces: Vec<xr::Space>,
}

impl InputTable {
    fn set(&self, handle: ActionSetHandle) -> Result<&xr::ActionSet> {
        self.sets
            .get(handle.0 as usize)
            .ok_or_else(|| Error::backend("unknown action set handle"))
    }

    fn action(&self, handle: ActionHandle) -> Result<&XrAction> {
        self.actions
            .get(handle.0 as usize)
            .ok_or_else(|| Error::backend("unknown action handle"))
    }

    pub fn create_action_set(
        &mut self,
        instance: &xr::Instance,
        name: &str,
    ) -> Result<ActionSetHandle> {
        let set = instance
            .create_action_set(name, name, 0)
            .map_err(|e| Error::ActionCreation(format!("OpenXR action set '{name}': {e:?}")))?;
        self.sets.push(set);
        Ok(ActionSetHandle(self.sets.len() as u64 - 1))
    }

    pub fn create_action(
        &mut self,
        set: ActionSetHandle,
        name: &str,
        ty: ActionType,
        subaction_paths: &[xr::Path],
    ) -> Result<ActionHandle> {
        let set = self.set(set)?;
        let err = |e: xr::sys::Result| {
            Error::ActionCreation(format!("OpenXR action '{name}': {e:?}"))
        };
        let action = match ty {
            ActionType::Digital => {
                XrAction::Bool(set.create_action(name, name, subaction_paths).map_err(err)?)
            }
            ActionType::DigitalFromFloat | ActionType::Float => {
                XrAction::Float(set.create_action(name, name, subaction_paths).map_err(err)?)
            }
            ActionType::Vec2f => {
                XrAction::Vec2(set.create_action(name, name, subaction_paths).map_err(err)?)
            }
            ActionType::Pose => {
                XrAction::Pose(set.create_action(name, name, subaction_paths).map_err(err)?)
            }
            ActionType::Haptic => {
                XrAction::Haptic(set.create_action(name, name, subaction_paths).map_err(err)?)
            }
        };
        self.actions.push(action);
        Ok(ActionHandle(self.actions.len() as u64 - 1))
    }

    pub fn create_action_space(
        &mut self,
        session: &xr::Session<xr::Vulkan>,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> Result<SpaceHandle> {
        let XrAction::Pose(action) = self.action(action)? else {
            return Err(Error::ActionCreation(
                "action spaces require a pose action".into(),
            ));
        };
        let space = action
            .create_space(session, subaction_path, xr::Posef::IDENTITY)
            .map_err(|e| Error::ActionCreation(format!("OpenXR action space: {e:?}")))?;
        self.spaces.push(space);
        Ok(SpaceHandle(self.spaces.len() as u64 - 1))
    }

    pub fn sync(
        &self,
        session: &xr::Session<xr::Vulkan>,
        sets: &[ActionSetHandle],
    ) -> Result<SyncOutcome> {
        let mut active = Vec::with_capacity(sets.len());
        for handle in sets {
            active.push(xr::ActiveActionSet::new(self.set(*handle)?));
        }
        // The wrapper folds SESSION_NOT_FOCUSED into Ok; a mid-call focus
        // loss is therefore indistinguishable from a plain success here.
        session
            .sync_actions(&active)
            .map_err(|e| Error::Sync(format!("OpenXR sync_actions: {e:?}")))?;
        Ok(SyncOutcome::Synced)
    }

    pub fn digital_state(
        &self,
        session: &xr::Session<xr::Vulkan>,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> Result<DigitalState> {
        let XrAction::Bool(action) = self.action(action)? else {
            return Err(Error::backend("action is not digital"));
        };
        let state = action
            .state(session, subaction_path)
            .map_err(|e| Error::backend(format!("OpenXR action state: {e:?}")))?;
        Ok(DigitalState {
            active: state.is_active,
            state: state.current_state,
            changed: state.changed_since_last_sync,
        })
    }

    pub fn float_state(
        &self,
        session: &xr::Session<xr::Vulkan>,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> Result<FloatState> {
        let XrAction::Float(action) = self.action(action)? else {
            return Err(Error::backend("action is not float"));
        };
        let state = action
            .state(session, subaction_path)
            .map_err(|e| Error::backend(format!("OpenXR action state: {e:?}")))?;
        Ok(FloatState {
            active: state.is_active,
            state: state.current_state,
            changed: state.changed_since_last_sync,
        })
    }

    pub fn vec2_state(
        &self,
        session: &xr::Session<xr::Vulkan>,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> Result<Vec2State> {
        let XrAction::Vec2(action) = self.action(action)? else {
            return Err(Error::backend("action is not vec2"));
        };
        let state = action
            .state(session, subaction_path)
            .map_err(|e| Error::backend(format!("OpenXR action state: {e:?}")))?;
        Ok(Vec2State {
            active: state.is_active,
            state: Vec2::new(state.current_state.x, state.current_state.y),
            changed: state.changed_since_last_sync,
        })
    }

    pub fn pose_state(
        &self,
        session: &xr::Session<xr::Vulkan>,
        action: ActionHandle,
        subaction_path: xr::Path,
    ) -> Result<PoseInputState> {
        let XrAction::Pose(action) = self.action(action)? else {
            return Err(Error::backend("action is not a pose"));
        };
        let active = action
            .is_active(session, subaction_path)
            .map_err(|e| Error::backend(format!("OpenXR is_active: {e:?}")))?;
        Ok(PoseInputState { active })
    }

    pub fn locate_space(
        &self,
        base: &xr::Space,
        space: SpaceHandle,
        time: xr::Time,
    ) -> Result<SpaceLocation> {
        let space = self
            .spaces
            .get(space.0 as usize)
            .ok_or_else(|| Error::backend("unknown space handle"))?;
        let location = space
            .locate(base, time)
            .map_err(|e| Error::backend(format!("OpenXR locate: {e:?}")))?;
        Ok(SpaceLocation {
            orientation_valid: location
                .location_flags
                .contains(xr::SpaceLocationFlags::ORIENTATION_VALID),
            position_valid: location
                .location_flags
                .contains(xr::SpaceLocationFlags::POSITION_VALID),
            pose: to_pose(location.pose),
        })
    }

    pub fn apply_haptic(
        &self,
        session: &xr::Session<xr::Vulkan>,
        action: ActionHandle,
        subaction_path: xr::Path,
        pulse: &HapticPulse,
    ) -> Result<()> {
        let XrAction::Haptic(action) = self.action(action)? else {
            return Err(Error::backend("action is not haptic"));
        };
        action
            .apply_feedback(
                session,
                subaction_path,
                &xr::HapticVibration::new()
                    .amplitude(pulse.amplitude.clamp(0.0, 1.0))
                    .frequency(pulse.frequency_hz)
                    .duration(xr::Duration::from_nanos(pulse.duration_ns)),
            )
            .map_err(|e| Error::backend(format!("OpenXR apply_feedback: {e:?}")))
    }

    pub fn suggest_bindings(
        &self,
        instance: &xr::Instance,
        profile: &str,
        suggestions: &[SuggestedBinding],
    ) -> Result<()> {
        let profile_path = instance
            .string_to_path(profile)
            .map_err(|e| Error::backend(format!("OpenXR profile path: {e:?}")))?;

        let mut bindings = Vec::with_capacity(suggestions.len());
        for suggestion in suggestions {
            let path = match instance.string_to_path(&suggestion.path) {
                Ok(path) => path,
                Err(e) => {
                    debug!(path = %suggestion.path, "skipping unparsable binding path: {e:?}");
                    continue;
                }
            };
            bindings.push(match self.action(suggestion.action)? {
                XrAction::Bool(a) => xr::Binding::new(a, path),
                XrAction::Float(a) => xr::Binding::new(a, path),
                XrAction::Vec2(a) => xr::Binding::new(a, path),
                XrAction::Pose(a) => xr::Binding::new(a, path),
                XrAction::Haptic(a) => xr::Binding::new(a, path),
            });
        }

        instance
            .suggest_interaction_profile_bindings(profile_path, &bindings)
            .map_err(|e| Error::backend(format!("OpenXR binding suggestion: {e:?}")))
    }

    pub fn attach(
        &self,
        session: &xr::Session<xr::Vulkan>,
        sets: &[ActionSetHandle],
    ) -> Result<()> {
        let mut refs = Vec::with_capacity(sets.len());
        for handle in sets {
            refs.push(self.set(*handle)?);
        }
        session
            .attach_action_sets(&refs)
            .map_err(|e| Error::backend(format!("OpenXR attach actions: {e:?}")))
    }
}
