//! Context lifecycle and event dispatch against a scripted backend.

mod common;

use glam::{Mat4, Vec3};

use common::{MockGraphics, MockRuntime};
use gxr_core::backend::{RuntimeEvent, SessionState};
use gxr_core::types::{AppType, ContextEvent, DevicePose, QuitReason};
use gxr_core::{Config, Context, ContextState, Error};

fn new_context() -> (Context, std::rc::Rc<std::cell::RefCell<common::MockState>>) {
    let (mock, state) = MockRuntime::new();
    let context = Context::with_backend(Config::new("gxr-tests"), Box::new(mock));
    (context, state)
}

fn initialized_context() -> (Context, std::rc::Rc<std::cell::RefCell<common::MockState>>) {
    let (mut context, state) = new_context();
    context.init_runtime(AppType::Scene).unwrap();
    context.init_graphics(&mut MockGraphics::default()).unwrap();
    context.init_session().unwrap();
    (context, state)
}

#[test]
fn lifecycle_advances_in_order() {
    let (mut context, _state) = new_context();
    assert_eq!(context.state(), ContextState::Uninitialized);

    // Skipping steps is rejected.
    assert!(matches!(context.init_session(), Err(Error::Lifecycle(_))));
    assert!(matches!(
        context.init_graphics(&mut MockGraphics::default()),
        Err(Error::Lifecycle(_))
    ));
    assert!(matches!(context.begin_frame(), Err(Error::Lifecycle(_))));

    context.init_runtime(AppType::Scene).unwrap();
    assert_eq!(context.state(), ContextState::RuntimeInitialized);

    // Session without bound graphics is rejected.
    assert!(matches!(context.init_session(), Err(Error::Lifecycle(_))));

    context.init_graphics(&mut MockGraphics::default()).unwrap();
    context.init_session().unwrap();
    assert_eq!(context.state(), ContextState::SessionInitialized);

    // Runtime init cannot happen twice.
    assert!(matches!(
        context.init_runtime(AppType::Scene),
        Err(Error::Lifecycle(_))
    ));
}

#[test]
fn session_ready_moves_to_running() {
    let (mut context, state) = initialized_context();
    state
        .borrow_mut()
        .events
        .push_back(RuntimeEvent::SessionStateChanged(SessionState::Ready));
    let events = context.poll_events();
    assert!(events.is_empty());
    assert_eq!(context.state(), ContextState::Running);
}

#[test]
fn device_events_update_the_device_table() {
    let (mut context, state) = initialized_context();
    {
        let mut state = state.borrow_mut();
        state.events.push_back(RuntimeEvent::DeviceActivated { handle: 0 });
        state.events.push_back(RuntimeEvent::DeviceActivated { handle: 5 });
        state.events.push_back(RuntimeEvent::DeviceUpdated { handle: 5 });
    }
    let events = context.poll_events();
    assert_eq!(
        events,
        vec![
            ContextEvent::DeviceActivate { handle: 0 },
            ContextEvent::DeviceActivate { handle: 5 },
            ContextEvent::DeviceUpdate { handle: 5 },
        ]
    );
    // Handle 0 is a hand controller, handle 5 a generic tracker.
    assert!(context.devices().get(0).unwrap().is_controller());
    assert!(!context.devices().get(5).unwrap().is_controller());

    state
        .borrow_mut()
        .events
        .push_back(RuntimeEvent::DeviceDeactivated { handle: 5 });
    let events = context.poll_events();
    assert_eq!(events, vec![ContextEvent::DeviceDeactivate { handle: 5 }]);
    assert!(context.devices().get(5).is_none());
    assert_eq!(context.devices().len(), 1);
}

#[test]
fn quit_reasons_pass_through_and_shut_down() {
    for reason in [
        QuitReason::Shutdown,
        QuitReason::ApplicationTransition,
        QuitReason::ProcessQuit,
    ] {
        let (mut context, state) = initialized_context();
        state
            .borrow_mut()
            .events
            .push_back(RuntimeEvent::QuitRequested { reason });
        let events = context.poll_events();
        assert_eq!(events, vec![ContextEvent::Quit { reason }]);
        assert_eq!(context.state(), ContextState::ShuttingDown);
    }
}

#[test]
fn session_exit_states_surface_as_shutdown() {
    for session_state in [SessionState::Exiting, SessionState::LossPending] {
        let (mut context, state) = initialized_context();
        state
            .borrow_mut()
            .events
            .push_back(RuntimeEvent::SessionStateChanged(session_state));
        let events = context.poll_events();
        assert_eq!(
            events,
            vec![ContextEvent::Quit {
                reason: QuitReason::Shutdown
            }]
        );
        assert_eq!(context.state(), ContextState::ShuttingDown);
    }
}

#[test]
fn instance_loss_surfaces_as_shutdown() {
    let (mut context, state) = initialized_context();
    state.borrow_mut().events.push_back(RuntimeEvent::InstanceLossPending);
    let events = context.poll_events();
    assert_eq!(
        events,
        vec![ContextEvent::Quit {
            reason: QuitReason::Shutdown
        }]
    );
}

#[test]
fn request_quit_round_trips_through_the_event_queue() {
    let (mut context, state) = initialized_context();
    context.request_quit().unwrap();
    assert!(state.borrow().quit_requested);

    let events = context.poll_events();
    assert_eq!(
        events,
        vec![ContextEvent::Quit {
            reason: QuitReason::ProcessQuit
        }]
    );

    context.acknowledge_quit();
    assert!(state.borrow().quit_acknowledged);
}

#[test]
fn keyboard_events_pass_through() {
    let (mut context, state) = initialized_context();
    {
        let mut state = state.borrow_mut();
        state.events.push_back(RuntimeEvent::KeyboardInput {
            text: "hi".into(),
        });
        state.events.push_back(RuntimeEvent::KeyboardClosed);
        state.events.push_back(RuntimeEvent::BindingsUpdated);
        state.events.push_back(RuntimeEvent::ManifestReloaded);
    }
    let events = context.poll_events();
    assert_eq!(
        events,
        vec![
            ContextEvent::KeyboardInput { text: "hi".into() },
            ContextEvent::KeyboardClose,
            ContextEvent::BindingsUpdate,
            ContextEvent::ActionManifestReloaded,
        ]
    );
}

#[test]
fn end_frame_refreshes_poses() {
    let (mut context, state) = initialized_context();
    state
        .borrow_mut()
        .events
        .push_back(RuntimeEvent::DeviceActivated { handle: 0 });
    context.poll_events();

    let head = Mat4::from_translation(Vec3::new(0.0, 1.6, 0.0));
    {
        let mut state = state.borrow_mut();
        state.head = head;
        state.device_pose_batch = vec![DevicePose {
            handle: 0,
            transformation: Mat4::from_translation(Vec3::X),
            is_valid: true,
        }];
    }

    assert_eq!(context.head_pose(), Mat4::IDENTITY);
    assert!(context.begin_frame().unwrap());
    context.end_frame().unwrap();

    assert_eq!(context.head_pose(), head);
    let device = context.devices().get(0).unwrap();
    assert!(device.pose_valid);
    assert_eq!(device.transformation, Mat4::from_translation(Vec3::X));

    let state = state.borrow();
    assert_eq!(state.frames_begun, 1);
    assert_eq!(state.frames_ended, 1);
}
