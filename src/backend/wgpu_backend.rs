//! egui-wgpu renderer bound to the host's device and queue
//!
//! Device and queue are shared with the host through `Arc`, so the overlay
//! can keep them for texture uploads after `create` returns. The host owns
//! the render pass; draws are recorded into it and submitted by the host.

use super::{BackendConfig, PaintJob, RenderBackend};
use crate::constants;
use crate::error::BackendError;
use egui_wgpu::wgpu;
use std::sync::Arc;

/// Map the exported surface-format code to a wgpu texture format
///
/// 0 = Rgba8Unorm, 1 = Rgba8UnormSrgb, 2 = Bgra8Unorm, 3 = Bgra8UnormSrgb.
/// Unknown codes fall back to Bgra8Unorm, the format most surfaces use.
pub fn texture_format_from_code(code: u32) -> wgpu::TextureFormat {
    match code {
        0 => wgpu::TextureFormat::Rgba8Unorm,
        1 => wgpu::TextureFormat::Rgba8UnormSrgb,
        2 => wgpu::TextureFormat::Bgra8Unorm,
        3 => wgpu::TextureFormat::Bgra8UnormSrgb,
        other => {
            log::warn!("Unknown surface format code {}, using Bgra8Unorm", other);
            wgpu::TextureFormat::Bgra8Unorm
        }
    }
}

/// egui-wgpu renderer and the GPU handles it draws with
pub struct WgpuBackend {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    renderer: egui_wgpu::Renderer,
}

impl RenderBackend for WgpuBackend {
    type Device = Arc<wgpu::Device>;
    type Queue = Arc<wgpu::Queue>;
    type Format = wgpu::TextureFormat;
    type Pass = wgpu::RenderPass<'static>;

    fn create(
        device: &Self::Device,
        queue: &Self::Queue,
        config: BackendConfig<Self::Format>,
    ) -> Result<Self, BackendError> {
        // egui-wgpu rewrites a single set of vertex/index buffers every frame
        if config.frames_in_flight != constants::frame::FRAMES_IN_FLIGHT {
            return Err(BackendError::UnsupportedFramesInFlight(config.frames_in_flight));
        }
        if config.format.is_depth_stencil_format() {
            return Err(BackendError::UnsupportedFormat(format!("{:?}", config.format)));
        }

        let renderer = egui_wgpu::Renderer::new(device, config.format, None, 1, false);
        log::debug!("Created egui-wgpu renderer for {:?}", config.format);

        Ok(Self {
            device: Arc::clone(device),
            queue: Arc::clone(queue),
            renderer,
        })
    }

    fn paint(&mut self, job: PaintJob, pass: &mut Self::Pass) {
        for (id, delta) in &job.textures_delta.set {
            self.renderer.update_texture(&self.device, &self.queue, *id, delta);
        }

        if !job.primitives.is_empty() {
            let screen = egui_wgpu::ScreenDescriptor {
                size_in_pixels: job.screen.size_in_pixels,
                pixels_per_point: job.screen.pixels_per_point,
            };

            // Buffer uploads must land before the host submits its pass
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("chain-overlay upload"),
                });
            let mut commands = self.renderer.update_buffers(
                &self.device,
                &self.queue,
                &mut encoder,
                &job.primitives,
                &screen,
            );
            commands.push(encoder.finish());
            self.queue.submit(commands);

            self.renderer.render(pass, &job.primitives, &screen);
        }

        for id in &job.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }

    fn destroy(self) {
        log::debug!("Destroying egui-wgpu renderer");
    }
}
