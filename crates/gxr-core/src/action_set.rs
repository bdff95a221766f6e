//! Action sets: groups of actions synchronized and polled together.

use tracing::{debug, warn};

use crate::action::{url_to_name, Action, ActionCallback, ActionType, PoseUsage};
use crate::backend::{ActionSetHandle, SuggestedBinding, SyncOutcome};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::types::Hand;

/// A named group of actions. Sets are created after the session is
/// initialized, populated with actions, bound via
/// [`ActionSet::attach_bindings`] and then polled once per frame.
pub struct ActionSet {
    url: String,
    name: String,
    handle: ActionSetHandle,
    actions: Vec<Action>,
}

impl ActionSet {
    /// Create an empty action set named after the last segment of `url`.
    pub fn new(context: &mut Context, url: &str) -> Result<ActionSet> {
        let name = url_to_name(url)?;
        let handle = context.backend_mut().create_action_set(&name)?;
        debug!(url, %name, "created action set");
        Ok(ActionSet {
            url: url.to_string(),
            name,
            handle,
            actions: Vec::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create an action in this set and route its per-poll results to
    /// `callback`. For digital-from-float actions use
    /// [`ActionSet::connect_digital_from_float`] instead.
    pub fn connect(
        &mut self,
        context: &mut Context,
        ty: ActionType,
        url: &str,
        callback: ActionCallback,
    ) -> Result<()> {
        let action = Action::create(context.backend_mut(), self.handle, url, ty, Some(callback))?;
        self.actions.push(action);
        Ok(())
    }

    /// Create an output action that is never polled; trigger it through
    /// [`Action::trigger_haptic`].
    pub fn connect_haptic(&mut self, context: &mut Context, url: &str) -> Result<()> {
        let action =
            Action::create(context.backend_mut(), self.handle, url, ActionType::Haptic, None)?;
        self.actions.push(action);
        Ok(())
    }

    /// Create a float-input action thresholded into a digital one. When
    /// `haptic_url` is given, a companion haptic action is created and pulsed
    /// on every threshold crossing.
    pub fn connect_digital_from_float(
        &mut self,
        context: &mut Context,
        url: &str,
        threshold: f32,
        haptic_url: Option<&str>,
        callback: ActionCallback,
    ) -> Result<()> {
        let mut action = Action::create(
            context.backend_mut(),
            self.handle,
            url,
            ActionType::DigitalFromFloat,
            Some(callback),
        )?;
        action.set_threshold(threshold);
        if let Some(haptic_url) = haptic_url {
            let haptic = Action::create(
                context.backend_mut(),
                self.handle,
                haptic_url,
                ActionType::Haptic,
                None,
            )?;
            action.set_haptic_companion(haptic.handle());
            self.actions.push(haptic);
        }
        self.actions.push(action);
        Ok(())
    }

    /// Create the two standard controller pose actions and wire them straight
    /// into the controller pose slots of the device table, bypassing
    /// callbacks.
    pub fn connect_pose_actions(
        &mut self,
        context: &mut Context,
        pointer_url: &str,
        hand_grip_url: &str,
    ) -> Result<()> {
        self.connect(
            context,
            ActionType::Pose,
            pointer_url,
            ActionCallback::ControllerPose(PoseUsage::Pointer),
        )?;
        self.connect(
            context,
            ActionType::Pose,
            hand_grip_url,
            ActionCallback::ControllerPose(PoseUsage::HandGrip),
        )
    }

    /// Find an action by URL.
    pub fn action(&self, url: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.url() == url)
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Synchronize input state for all given sets with one runtime call.
    ///
    /// When the session is not focused this succeeds without calling into the
    /// runtime at all; input simply stays stale. A runtime that reports
    /// not-focused from the sync call itself lost focus mid-call, which is
    /// benign and also succeeds.
    pub fn update(sets: &[&ActionSet], context: &mut Context) -> Result<()> {
        if sets.is_empty() {
            return Err(Error::Sync("no action sets to synchronize".into()));
        }
        if !context.backend_mut().is_focused() {
            return Ok(());
        }
        let handles: Vec<_> = sets.iter().map(|s| s.handle).collect();
        match context.backend_mut().sync_action_sets(&handles)? {
            SyncOutcome::Synced => Ok(()),
            SyncOutcome::NotFocused => {
                debug!("session lost focus during sync");
                Ok(())
            }
        }
    }

    /// Synchronize and then poll every pollable action in every set, emitting
    /// events through the connected callbacks. Output actions are skipped. A
    /// sync failure fails the whole batch and no action is polled.
    pub fn poll_all(sets: &mut [&mut ActionSet], context: &mut Context) -> Result<()> {
        {
            let shared: Vec<&ActionSet> = sets.iter().map(|s| &**s).collect();
            ActionSet::update(&shared, context)?;
        }
        let (backend, devices) = context.backend_and_devices();
        for set in sets {
            for action in &mut set.actions {
                if action.action_type() == ActionType::Haptic {
                    continue;
                }
                action.poll(backend, devices)?;
            }
        }
        Ok(())
    }

    /// Suggest bindings from every manifest registered on the context and
    /// attach all sets to the session in one call. Attaching can only happen
    /// once per session. Zero registered manifests fail before anything is
    /// suggested or attached. A manifest without an interaction profile, or a
    /// rejected suggestion batch, is skipped with a diagnostic; attach still
    /// proceeds for the remaining ones.
    pub fn attach_bindings(sets: &mut [&mut ActionSet], context: &mut Context) -> Result<()> {
        if context.manifests().is_empty() {
            return Err(Error::lifecycle(
                "attaching action sets requires at least one loaded manifest",
            ));
        }

        let (backend, manifests) = context.backend_and_manifests();
        for manifest in manifests {
            let Some(profile) = manifest.interaction_profile() else {
                warn!("manifest has no interaction profile, skipping");
                continue;
            };

            let mut suggestions = Vec::new();
            for set in sets.iter() {
                for action in &set.actions {
                    let Some(binding) = manifest.binding(action.url()) else {
                        debug!(action = action.url(), "action not bound in manifest");
                        continue;
                    };
                    for input_path in &binding.input_paths {
                        if let Some(path) = input_path.suggested_path() {
                            suggestions.push(SuggestedBinding {
                                action: action.handle(),
                                path,
                            });
                        }
                    }
                }
            }

            debug!(profile, count = suggestions.len(), "suggesting bindings");
            if let Err(e) = backend.suggest_bindings(profile, &suggestions) {
                warn!(profile, "binding suggestion rejected: {e}");
            }
        }

        let handles: Vec<_> = sets.iter().map(|s| s.handle).collect();
        backend.attach_action_sets(&handles)?;

        // Attaching is what makes the hand controllers usable; register both.
        let (_, devices) = context.backend_and_devices();
        for hand in Hand::ALL {
            devices.add(hand.index() as u64, true);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ActionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSet")
            .field("url", &self.url)
            .field("handle", &self.handle)
            .field("actions", &self.actions.len())
            .finish()
    }
}
