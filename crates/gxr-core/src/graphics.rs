//! The graphics collaborator boundary.
//!
//! The core never touches pixels or GPU state itself; it consumes a narrow
//! capability set from whatever renders: raw device handles for the runtime's
//! session binding, extension-list plumbing, and texture upload/submit.

use crate::error::Result;

/// Raw graphics device identifiers the runtime session is created against.
/// The values are API-specific handles (for Vulkan: `VkInstance`,
/// `VkPhysicalDevice`, `VkDevice`) widened to `u64`.
#[derive(Debug, Clone, Copy)]
pub struct GraphicsHandles {
    pub instance: u64,
    pub physical_device: u64,
    pub device: u64,
    pub queue_family_index: u32,
    pub queue_index: u32,
}

/// Handle to a texture previously uploaded through the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Capabilities the core requires from its graphics collaborator.
pub trait GraphicsContext {
    /// Device handles the runtime binds its session to.
    fn handles(&self) -> GraphicsHandles;

    /// Extend the set of graphics instance extensions the runtime requires.
    fn enable_instance_extensions(&mut self, names: &[String]) -> Result<()>;

    /// Extend the set of graphics device extensions the runtime requires.
    fn enable_device_extensions(&mut self, names: &[String]) -> Result<()>;

    /// Upload a 2D texture from raw RGBA pixels.
    fn upload_texture(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<TextureHandle>;

    /// Submit a previously uploaded texture for display.
    fn submit_texture(&mut self, texture: TextureHandle) -> Result<()>;
}
