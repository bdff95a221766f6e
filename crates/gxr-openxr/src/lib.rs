//! OpenXR backend for gxr.
//!
//! Implements [`gxr_core::backend::Runtime`] on top of the OpenXR loader,
//! using a Vulkan session created against the application's graphics device.
//! The loader is resolved at runtime, so linking against this crate does not
//! require an OpenXR SDK at build time.

mod input;

use std::path::PathBuf;

use glam::{Mat4, Quat, Vec3};
use openxr as xr;
use tracing::{debug, error, info, warn};

use gxr_core::backend::{Runtime, RuntimeEvent, SessionState};
use gxr_core::error::{Error, Result};
use gxr_core::graphics::{GraphicsContext, GraphicsHandles};
use gxr_core::types::{Api, AppType, Eye, FrustumAngles, Hand, Pose, NUM_HANDS};
use gxr_core::Config;

use input::InputTable;

/// Everything that only exists while a session is alive.
struct SessionResources {
    session: xr::Session<xr::Vulkan>,
    frame_waiter: xr::FrameWaiter,
    frame_stream: xr::FrameStream<xr::Vulkan>,
    /// Tracked space all poses are reported in.
    play_space: xr::Space,
    /// Head-locked space, located against `play_space` for the head pose.
    view_space: xr::Space,
}

/// OpenXR implementation of the backend runtime trait.
pub struct OpenXrRuntime {
    app_name: String,
    loader_dir: Option<PathBuf>,
    instance: Option<xr::Instance>,
    system: Option<xr::SystemId>,
    graphics: Option<GraphicsHandles>,
    resources: Option<SessionResources>,
    input: InputTable,
    hand_paths: [xr::Path; NUM_HANDS],
    event_buffer: xr::EventDataBuffer,
    session_state: xr::SessionState,
    session_running: bool,
    frame_state: Option<xr::FrameState>,
}

impl OpenXrRuntime {
    /// Backend for the given config. Nothing is loaded until
    /// [`Runtime::init_runtime`].
    pub fn new(config: &Config) -> OpenXrRuntime {
        OpenXrRuntime {
            app_name: config.app_name.clone(),
            loader_dir: config.backend_dir.clone(),
            instance: None,
            system: None,
            graphics: None,
            resources: None,
            input: InputTable::default(),
            hand_paths: [xr::Path::NULL; NUM_HANDS],
            event_buffer: xr::EventDataBuffer::new(),
            session_state: xr::SessionState::UNKNOWN,
            session_running: false,
            frame_state: None,
        }
    }

    fn load_entry(&self) -> Result<xr::Entry> {
        if let Some(dir) = &self.loader_dir {
            let loader = dir.join(format!(
                "{}openxr_loader{}",
                std::env::consts::DLL_PREFIX,
                std::env::consts::DLL_SUFFIX
            ));
            info!(path = %loader.display(), "loading OpenXR loader from override dir");
            return unsafe { xr::Entry::load_from(&loader) }
                .map_err(|e| Error::backend(format!("OpenXR load from override: {e:?}")));
        }
        unsafe { xr::Entry::load() }
            .map_err(|e| Error::backend(format!("OpenXR load failed: {e:?}")))
    }

    fn instance(&self) -> Result<&xr::Instance> {
        self.instance
            .as_ref()
            .ok_or_else(|| Error::lifecycle("OpenXR runtime is not initialized"))
    }

    fn resources(&self) -> Result<&SessionResources> {
        self.resources
            .as_ref()
            .ok_or_else(|| Error::lifecycle("OpenXR session is not initialized"))
    }

    fn hand_path(&self, hand: Hand) -> xr::Path {
        self.hand_paths[hand.index()]
    }

    fn translate_session_state(state: xr::SessionState) -> SessionState {
        match state {
            xr::SessionState::IDLE => SessionState::Idle,
            xr::SessionState::READY => SessionState::Ready,
            xr::SessionState::SYNCHRONIZED => SessionState::Synchronized,
            xr::SessionState::VISIBLE => SessionState::Visible,
            xr::SessionState::FOCUSED => SessionState::Focused,
            xr::SessionState::STOPPING => SessionState::Stopping,
            xr::SessionState::LOSS_PENDING => SessionState::LossPending,
            xr::SessionState::EXITING => SessionState::Exiting,
            _ => SessionState::Unknown,
        }
    }

    fn on_session_state_changed(&mut self, state: xr::SessionState) {
        debug!(?state, "OpenXR session state changed");
        self.session_state = state;
        let Ok(resources) = self.resources() else {
            return;
        };
        match state {
            xr::SessionState::READY => {
                match resources
                    .session
                    .begin(xr::ViewConfigurationType::PRIMARY_STEREO)
                {
                    Ok(_) => self.session_running = true,
                    Err(e) => error!("OpenXR session begin: {e:?}"),
                }
            }
            xr::SessionState::STOPPING => {
                if let Err(e) = resources.session.end() {
                    error!("OpenXR session end: {e:?}");
                }
                self.session_running = false;
            }
            _ => {}
        }
    }
}

pub(crate) fn to_pose(pose: xr::Posef) -> Pose {
    Pose {
        orientation: Quat::from_xyzw(
            pose.orientation.x,
            pose.orientation.y,
            pose.orientation.z,
            pose.orientation.w,
        ),
        position: Vec3::new(pose.position.x, pose.position.y, pose.position.z),
    }
}

impl Runtime for OpenXrRuntime {
    fn api(&self) -> Api {
        Api::OpenXr
    }

    fn init_runtime(&mut self, app_type: AppType) -> Result<()> {
        if app_type != AppType::Scene {
            // Overlay and background sessions still render a full scene
            // session on OpenXR.
            warn!(?app_type, "OpenXR backend always creates a scene session");
        }

        let entry = self.load_entry()?;
        let available = entry
            .enumerate_extensions()
            .map_err(|e| Error::backend(format!("OpenXR ext enumerate: {e:?}")))?;
        if !available.khr_vulkan_enable {
            return Err(Error::backend("OpenXR KHR_vulkan_enable not available"));
        }
        let mut exts = xr::ExtensionSet::default();
        exts.khr_vulkan_enable = true;

        let app_info = xr::ApplicationInfo {
            application_name: &self.app_name,
            application_version: 1,
            engine_name: "gxr",
            engine_version: 1,
            api_version: xr::Version::new(1, 0, 0),
        };
        let instance = entry
            .create_instance(&app_info, &exts, &[])
            .map_err(|e| Error::backend(format!("OpenXR create_instance: {e:?}")))?;
        let system = instance
            .system(xr::FormFactor::HEAD_MOUNTED_DISPLAY)
            .map_err(|e| Error::backend(format!("OpenXR system: {e:?}")))?;

        self.hand_paths = [
            instance
                .string_to_path("/user/hand/left")
                .map_err(|e| Error::backend(format!("OpenXR path left: {e:?}")))?,
            instance
                .string_to_path("/user/hand/right")
                .map_err(|e| Error::backend(format!("OpenXR path right: {e:?}")))?,
        ];

        if let Ok(props) = instance.properties() {
            info!(
                runtime = %props.runtime_name,
                version = %props.runtime_version,
                "OpenXR runtime initialized"
            );
        }

        self.instance = Some(instance);
        self.system = Some(system);
        Ok(())
    }

    fn bind_graphics(&mut self, gfx: &mut dyn GraphicsContext) -> Result<()> {
        let instance = self
            .instance
            .as_ref()
            .ok_or_else(|| Error::lifecycle("OpenXR runtime is not initialized"))?;
        let system = self
            .system
            .ok_or_else(|| Error::lifecycle("OpenXR runtime is not initialized"))?;

        // The legacy Vulkan enable extension makes the application create the
        // device, but with extensions the runtime requires.
        let instance_exts = instance
            .vulkan_legacy_instance_extensions(system)
            .map_err(|e| Error::backend(format!("OpenXR vulkan instance exts: {e:?}")))?;
        gfx.enable_instance_extensions(
            &instance_exts
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        )?;
        let device_exts = instance
            .vulkan_legacy_device_extensions(system)
            .map_err(|e| Error::backend(format!("OpenXR vulkan device exts: {e:?}")))?;
        gfx.enable_device_extensions(
            &device_exts
                .split_whitespace()
                .map(str::to_string)
                .collect::<Vec<_>>(),
        )?;

        self.graphics = Some(gfx.handles());
        Ok(())
    }

    fn init_session(&mut self) -> Result<()> {
        let instance = self.instance()?.clone();
        let system = self
            .system
            .ok_or_else(|| Error::lifecycle("OpenXR runtime is not initialized"))?;
        let gfx = self
            .graphics
            .ok_or_else(|| Error::lifecycle("graphics are not bound"))?;

        let create_info = xr::vulkan::SessionCreateInfo {
            instance: gfx.instance as *const std::ffi::c_void,
            physical_device: gfx.physical_device as *const std::ffi::c_void,
            device: gfx.device as *const std::ffi::c_void,
            queue_family_index: gfx.queue_family_index,
            queue_index: gfx.queue_index,
        };

        let (session, frame_waiter, frame_stream) = unsafe {
            instance
                .create_session::<xr::Vulkan>(system, &create_info)
                .map_err(|e| Error::backend(format!("OpenXR create_session: {e:?}")))?
        };

        let play_space = session
            .create_reference_space(xr::ReferenceSpaceType::LOCAL, xr::Posef::IDENTITY)
            .map_err(|e| Error::backend(format!("OpenXR reference space: {e:?}")))?;
        let view_space = session
            .create_reference_space(xr::ReferenceSpaceType::VIEW, xr::Posef::IDENTITY)
            .map_err(|e| Error::backend(format!("OpenXR view space: {e:?}")))?;

        self.resources = Some(SessionResources {
            session,
            frame_waiter,
            frame_stream,
            play_space,
            view_space,
        });
        Ok(())
    }

    fn poll_event(&mut self) -> Option<RuntimeEvent> {
        loop {
            let instance = self.instance.as_ref()?;
            let event = match instance.poll_event(&mut self.event_buffer) {
                Ok(event) => event?,
                Err(e) => {
                    error!("OpenXR poll_event: {e:?}");
                    return None;
                }
            };
            match event {
                xr::Event::SessionStateChanged(e) => {
                    let state = e.state();
                    self.on_session_state_changed(state);
                    return Some(RuntimeEvent::SessionStateChanged(
                        Self::translate_session_state(state),
                    ));
                }
                xr::Event::InstanceLossPending(_) => {
                    return Some(RuntimeEvent::InstanceLossPending);
                }
                xr::Event::InteractionProfileChanged(_) => {
                    return Some(RuntimeEvent::BindingsUpdated);
                }
                xr::Event::EventsLost(e) => {
                    warn!(count = e.lost_event_count(), "OpenXR events lost");
                }
                xr::Event::ReferenceSpaceChangePending(_) => {
                    debug!("OpenXR reference space change pending");
                }
                _ => {
                    debug!("unhandled OpenXR event");
                }
            }
        }
    }

    fn is_focused(&self) -> bool {
        self.session_state == xr::SessionState::FOCUSED
    }

    fn predicted_display_time_ns(&self) -> i64 {
        self.frame_state
            .map(|fs| fs.predicted_display_time.as_nanos())
            .unwrap_or(0)
    }

    fn create_action_set(
        &mut self,
        name: &str,
    ) -> Result<gxr_core::backend::ActionSetHandle> {
        let instance = self.instance()?.clone();
        self.input.create_action_set(&instance, name)
    }

    fn create_action(
        &mut self,
        set: gxr_core::backend::ActionSetHandle,
        name: &str,
        ty: gxr_core::action::ActionType,
    ) -> Result<gxr_core::backend::ActionHandle> {
        let hand_paths = self.hand_paths;
        self.input.create_action(set, name, ty, &hand_paths)
    }

    fn create_action_space(
        &mut self,
        action: gxr_core::backend::ActionHandle,
        hand: Hand,
    ) -> Result<gxr_core::backend::SpaceHandle> {
        let path = self.hand_path(hand);
        let session = self.resources()?.session.clone();
        self.input.create_action_space(&session, action, path)
    }

    fn sync_action_sets(
        &mut self,
        sets: &[gxr_core::backend::ActionSetHandle],
    ) -> Result<gxr_core::backend::SyncOutcome> {
        let session = self.resources()?.session.clone();
        self.input.sync(&session, sets)
    }

    fn digital_state(
        &mut self,
        action: gxr_core::backend::ActionHandle,
        hand: Hand,
    ) -> Result<gxr_core::backend::DigitalState> {
        let path = self.hand_path(hand);
        let session = self.resources()?.session.clone();
        self.input.digital_state(&session, action, path)
    }

    fn float_state(
        &mut self,
        action: gxr_core::backend::ActionHandle,
        hand: Hand,
    ) -> Result<gxr_core::backend::FloatState> {
        let path = self.hand_path(hand);
        let session = self.resources()?.session.clone();
        self.input.float_state(&session, action, path)
    }

    fn vec2_state(
        &mut self,
        action: gxr_core::backend::ActionHandle,
        hand: Hand,
    ) -> Result<gxr_core::backend::Vec2State> {
        let path = self.hand_path(hand);
        let session = self.resources()?.session.clone();
        self.input.vec2_state(&session, action, path)
    }

    fn pose_state(
        &mut self,
        action: gxr_core::backend::ActionHandle,
        hand: Hand,
    ) -> Result<gxr_core::backend::PoseInputState> {
        let path = self.hand_path(hand);
        let session = self.resources()?.session.clone();
        self.input.pose_state(&session, action, path)
    }

    fn locate_space(
        &mut self,
        space: gxr_core::backend::SpaceHandle,
        time_ns: i64,
    ) -> Result<gxr_core::backend::SpaceLocation> {
        let resources = self.resources()?;
        self.input
            .locate_space(&resources.play_space, space, xr::Time::from_nanos(time_ns))
    }

    fn apply_haptic(
        &mut self,
        action: gxr_core::backend::ActionHandle,
        hand: Hand,
        pulse: &gxr_core::backend::HapticPulse,
    ) -> Result<()> {
        let path = self.hand_path(hand);
        let session = self.resources()?.session.clone();
        self.input.apply_haptic(&session, action, path, pulse)
    }

    fn suggest_bindings(
        &mut self,
        profile: &str,
        bindings: &[gxr_core::backend::SuggestedBinding],
    ) -> Result<()> {
        let instance = self.instance()?.clone();
        self.input.suggest_bindings(&instance, profile, bindings)
    }

    fn attach_action_sets(&mut self, sets: &[gxr_core::backend::ActionSetHandle]) -> Result<()> {
        let session = self.resources()?.session.clone();
        self.input.attach(&session, sets)
    }

    fn begin_frame(&mut self) -> Result<bool> {
        if !self.session_running {
            return Ok(false);
        }
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| Error::lifecycle("OpenXR session is not initialized"))?;
        let frame_state = resources
            .frame_waiter
            .wait()
            .map_err(|e| Error::backend(format!("OpenXR wait: {e:?}")))?;
        resources
            .frame_stream
            .begin()
            .map_err(|e| Error::backend(format!("OpenXR frame begin: {e:?}")))?;
        let should_render = frame_state.should_render;
        self.frame_state = Some(frame_state);
        Ok(should_render)
    }

    fn end_frame(&mut self) -> Result<()> {
        let Some(frame_state) = self.frame_state else {
            return Ok(());
        };
        let resources = self
            .resources
            .as_mut()
            .ok_or_else(|| Error::lifecycle("OpenXR session is not initialized"))?;
        // No layers: rendering is owned by the application; it composites
        // through its own swapchains before this call.
        resources
            .frame_stream
            .end(
                frame_state.predicted_display_time,
                xr::EnvironmentBlendMode::OPAQUE,
                &[],
            )
            .map_err(|e| Error::backend(format!("OpenXR frame end: {e:?}")))?;
        Ok(())
    }

    fn head_pose(&mut self) -> Result<Mat4> {
        let resources = self.resources()?;
        let time = self
            .frame_state
            .map(|fs| fs.predicted_display_time)
            .unwrap_or(xr::Time::from_nanos(0));
        let location = resources
            .view_space
            .locate(&resources.play_space, time)
            .map_err(|e| Error::backend(format!("OpenXR locate view space: {e:?}")))?;
        Ok(to_pose(location.pose).to_mat4())
    }

    fn frustum_angles(&mut self, eye: Eye) -> FrustumAngles {
        let fallback = FrustumAngles {
            left: 1.0,
            right: 1.0,
            top: 1.0,
            bottom: 1.0,
        };
        let Some(frame_state) = self.frame_state else {
            warn!("frustum angles requested before the first frame");
            return fallback;
        };
        let Ok(resources) = self.resources() else {
            return fallback;
        };
        let views = match resources.session.locate_views(
            xr::ViewConfigurationType::PRIMARY_STEREO,
            frame_state.predicted_display_time,
            &resources.play_space,
        ) {
            Ok((_, views)) => views,
            Err(e) => {
                warn!("OpenXR locate_views: {e:?}");
                return fallback;
            }
        };
        let index = match eye {
            Eye::Left => 0,
            Eye::Right => 1,
        };
        let Some(view) = views.get(index) else {
            return fallback;
        };
        FrustumAngles {
            left: view.fov.angle_left.to_degrees(),
            right: view.fov.angle_right.to_degrees(),
            top: view.fov.angle_up.to_degrees(),
            bottom: view.fov.angle_down.to_degrees(),
        }
    }

    fn request_quit(&mut self) -> Result<()> {
        let resources = self.resources()?;
        resources
            .session
            .request_exit()
            .map_err(|e| Error::backend(format!("OpenXR request_exit: {e:?}")))
    }
}
