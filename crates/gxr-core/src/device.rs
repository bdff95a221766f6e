//! Tracked device bookkeeping.

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use tracing::debug;

use crate::types::DevicePose;

/// Interaction state carried only by controller devices.
#[derive(Debug, Clone)]
pub struct ControllerState {
    pub hovered_target: Option<u64>,
    pub grab_offset: Vec3,
    pub hover_distance: f32,
    pub pointer_pose: Mat4,
    pub pointer_pose_valid: bool,
    pub hand_grip_pose: Mat4,
    pub hand_grip_pose_valid: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            hovered_target: None,
            grab_offset: Vec3::ZERO,
            hover_distance: 0.0,
            pointer_pose: Mat4::IDENTITY,
            pointer_pose_valid: false,
            hand_grip_pose: Mat4::IDENTITY,
            hand_grip_pose_valid: false,
        }
    }
}

/// One tracked device. Controllers additionally carry interaction state.
#[derive(Debug, Clone)]
pub struct Device {
    pub handle: u64,
    pub pose_valid: bool,
    pub transformation: Mat4,
    pub controller: Option<ControllerState>,
}

impl Device {
    pub fn is_controller(&self) -> bool {
        self.controller.is_some()
    }
}

/// Registry of known devices, keyed by runtime handle.
#[derive(Debug, Default)]
pub struct DeviceManager {
    devices: BTreeMap<u64, Device>,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device. Adding a handle that already exists is a no-op and
    /// keeps the existing entry's state. Returns whether the device was new.
    pub fn add(&mut self, handle: u64, is_controller: bool) -> bool {
        if self.devices.contains_key(&handle) {
            return false;
        }
        debug!(handle, is_controller, "device activated");
        self.devices.insert(
            handle,
            Device {
                handle,
                pose_valid: false,
                transformation: Mat4::IDENTITY,
                controller: is_controller.then(ControllerState::default),
            },
        );
        true
    }

    /// Remove a device. Removing an unknown handle is a no-op.
    pub fn remove(&mut self, handle: u64) {
        if self.devices.remove(&handle).is_some() {
            debug!(handle, "device deactivated");
        }
    }

    pub fn get(&self, handle: u64) -> Option<&Device> {
        self.devices.get(&handle)
    }

    pub fn get_mut(&mut self, handle: u64) -> Option<&mut Device> {
        self.devices.get_mut(&handle)
    }

    /// Apply a batch of per-device poses. Devices absent from the batch keep
    /// their previous pose.
    pub fn update_poses(&mut self, poses: &[DevicePose]) {
        for pose in poses {
            if let Some(device) = self.devices.get_mut(&pose.handle) {
                device.transformation = pose.transformation;
                device.pose_valid = pose.is_valid;
            }
        }
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// Handles of all registered controllers, in stable handle order.
    pub fn controller_handles(&self) -> Vec<u64> {
        self.devices
            .values()
            .filter(|d| d.is_controller())
            .map(|d| d.handle)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_and_keeps_state() {
        let mut dm = DeviceManager::new();
        assert!(dm.add(3, true));
        dm.get_mut(3).unwrap().pose_valid = true;
        assert!(!dm.add(3, true));
        assert!(dm.get(3).unwrap().pose_valid);
        assert_eq!(dm.len(), 1);
    }

    #[test]
    fn remove_unknown_handle_is_a_noop() {
        let mut dm = DeviceManager::new();
        dm.add(1, false);
        dm.remove(99);
        assert_eq!(dm.len(), 1);
        dm.remove(1);
        assert!(dm.is_empty());
    }

    #[test]
    fn pose_updates_skip_absent_devices() {
        let mut dm = DeviceManager::new();
        dm.add(0, true);
        dm.update_poses(&[
            DevicePose {
                handle: 0,
                transformation: Mat4::from_translation(Vec3::X),
                is_valid: true,
            },
            DevicePose {
                handle: 7,
                transformation: Mat4::IDENTITY,
                is_valid: true,
            },
        ]);
        assert!(dm.get(0).unwrap().pose_valid);
        assert!(dm.get(7).is_none());
    }

    #[test]
    fn controller_handles_are_stable_and_filtered() {
        let mut dm = DeviceManager::new();
        dm.add(1, true);
        dm.add(0, true);
        dm.add(5, false);
        assert_eq!(dm.controller_handles(), vec![0, 1]);
    }
}
