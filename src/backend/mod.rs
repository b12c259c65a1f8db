//! Render backends for the overlay
//!
//! The lifecycle talks to the GPU through [`RenderBackend`] only: it hands over
//! a finished [`PaintJob`] each frame and never touches device objects itself.
//!
//! - [`wgpu_backend`] - egui-wgpu renderer used by real hosts

pub mod wgpu_backend;

pub use wgpu_backend::{texture_format_from_code, WgpuBackend};

use crate::error::BackendError;
use egui::{ClippedPrimitive, TexturesDelta};

/// Creation parameters shared by every backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendConfig<F> {
    pub format: F,
    pub frames_in_flight: u32,
}

/// Size of the target surface for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenGeometry {
    pub size_in_pixels: [u32; 2],
    pub pixels_per_point: f32,
}

/// Everything a backend needs to draw one finished frame
#[derive(Debug)]
pub struct PaintJob {
    /// Tessellated draw data; empty when the overlay is hidden
    pub primitives: Vec<ClippedPrimitive>,
    /// Texture uploads and frees, applied even when nothing is drawn
    pub textures_delta: TexturesDelta,
    pub screen: ScreenGeometry,
}

/// GPU side of the overlay, bound to one device/queue/format triple
pub trait RenderBackend: Sized {
    type Device;
    type Queue;
    type Format: Copy + std::fmt::Debug;
    /// Render pass the host records into
    type Pass;

    /// Create the renderer
    fn create(
        device: &Self::Device,
        queue: &Self::Queue,
        config: BackendConfig<Self::Format>,
    ) -> Result<Self, BackendError>;

    /// Upload the job's textures and buffers, then record its draws into `pass`
    fn paint(&mut self, job: PaintJob, pass: &mut Self::Pass);

    /// Release GPU resources
    fn destroy(self);
}
