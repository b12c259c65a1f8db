//! Overlay lifecycle: creation, per-frame begin/render, visibility and teardown
//!
//! [`UiLifecycleManager`] owns the egui context and the render backend bound to
//! the host's device/queue/format triple. The state machine is
//!
//! ```text
//! Uninitialized --initialize--> Initialized --shutdown--> ShutDown --initialize--> ...
//!                     \--backend failure--> Failed --shutdown--> ShutDown
//! ```
//!
//! and within `Initialized` each host frame goes `Idle --begin_frame--> FrameOpen
//! --render--> Idle`. Out-of-order calls return an [`OverlayError`] and leave the
//! state untouched.

use crate::backend::{BackendConfig, PaintJob, RenderBackend, ScreenGeometry};
use crate::config::OverlayConfig;
use crate::constants;
use crate::error::OverlayError;
use crate::frame_input::{FrameInput, FrameInputAdapter};
use crate::settings::LayoutFile;
use crate::theme;
use log::{debug, error, info, warn};
use std::path::Path;

/// Where the overlay is in its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
    /// Renderer creation failed; cleared only by `shutdown`
    Failed,
    ShutDown,
}

/// Where the overlay is within the current host frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    FrameOpen,
}

/// Owner of the UI context and its render backend
pub struct UiLifecycleManager<B: RenderBackend> {
    config: OverlayConfig,
    state: LifecycleState,
    frame: FrameState,
    visible: bool,
    ctx: Option<egui::Context>,
    backend: Option<B>,
    format: Option<B::Format>,
    failure: Option<String>,
    adapter: FrameInputAdapter,
    layout_file: Option<LayoutFile>,
    size_in_pixels: [u32; 2],
    last_dt: f32,
    since_save: f32,
}

impl<B: RenderBackend> UiLifecycleManager<B> {
    /// Create an uninitialized overlay with the default configuration
    pub fn new() -> Self {
        Self::with_config(OverlayConfig::default())
    }

    /// Create an uninitialized overlay with an explicit configuration
    pub fn with_config(config: OverlayConfig) -> Self {
        let adapter = FrameInputAdapter::with_default_frame_time(config.default_frame_time);
        Self {
            config,
            state: LifecycleState::Uninitialized,
            frame: FrameState::Idle,
            visible: true,
            ctx: None,
            backend: None,
            format: None,
            failure: None,
            adapter,
            layout_file: None,
            size_in_pixels: [0, 0],
            last_dt: 0.0,
            since_save: 0.0,
        }
    }

    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn frame_state(&self) -> FrameState {
        self.frame
    }

    /// Whether the UI backend is initialized and usable
    pub fn is_available(&self) -> bool {
        self.state == LifecycleState::Initialized
    }

    /// Surface format the renderer was created for
    pub fn format(&self) -> Option<B::Format> {
        self.format
    }

    /// Path of the layout file, once a settings directory is configured
    pub fn settings_path(&self) -> Option<&Path> {
        self.layout_file.as_ref().map(LayoutFile::path)
    }

    fn ensure_initialized(&self) -> Result<(), OverlayError> {
        match self.state {
            LifecycleState::Initialized => Ok(()),
            LifecycleState::Uninitialized => Err(OverlayError::NotInitialized),
            LifecycleState::ShutDown => Err(OverlayError::AlreadyShutDown),
            LifecycleState::Failed => Err(OverlayError::InitializationFailed(
                self.failure.clone().unwrap_or_default(),
            )),
        }
    }

    /// The live UI context, for widget code between `begin_frame` and `render`
    pub fn context(&self) -> Result<&egui::Context, OverlayError> {
        self.ensure_initialized()?;
        self.ctx.as_ref().ok_or(OverlayError::NotInitialized)
    }

    /// Create the UI context and the renderer
    ///
    /// Does nothing when already initialized. A missing device or queue is
    /// rejected without touching any state.
    pub fn initialize(
        &mut self,
        device: Option<&B::Device>,
        queue: Option<&B::Queue>,
        format: B::Format,
    ) -> Result<(), OverlayError> {
        match self.state {
            LifecycleState::Initialized => {
                debug!("Overlay already initialized, ignoring initialize");
                return Ok(());
            }
            LifecycleState::Failed => {
                let reason = self.failure.clone().unwrap_or_default();
                warn!("Overlay initialization previously failed ({}), call shutdown first", reason);
                return Err(OverlayError::InitializationFailed(reason));
            }
            LifecycleState::Uninitialized | LifecycleState::ShutDown => {}
        }

        let Some(device) = device else {
            error!("Cannot initialize overlay: no graphics device");
            return Err(OverlayError::MissingDevice);
        };
        let Some(queue) = queue else {
            error!("Cannot initialize overlay: no graphics queue");
            return Err(OverlayError::MissingQueue);
        };

        let ctx = egui::Context::default();
        theme::apply_overlay_style(&ctx, &self.config.style);

        let backend_config = BackendConfig {
            format,
            frames_in_flight: constants::frame::FRAMES_IN_FLIGHT,
        };
        let backend = match B::create(device, queue, backend_config) {
            Ok(backend) => backend,
            Err(e) => {
                error!("Failed to initialize overlay renderer: {}", e);
                drop(ctx);
                self.state = LifecycleState::Failed;
                self.failure = Some(e.to_string());
                return Err(OverlayError::InitializationFailed(e.to_string()));
            }
        };

        self.ctx = Some(ctx);
        self.backend = Some(backend);
        self.format = Some(format);
        self.state = LifecycleState::Initialized;
        self.frame = FrameState::Idle;
        self.visible = true;
        info!("Overlay initialized for {:?}", format);
        Ok(())
    }

    /// Persist the layout to `<dir>/<layout file>` and restore any saved layout
    pub fn set_settings_directory(&mut self, dir: impl AsRef<Path>) -> Result<&Path, OverlayError> {
        self.ensure_initialized()?;
        if self.frame == FrameState::FrameOpen {
            return Err(OverlayError::FrameAlreadyOpen);
        }

        let file = LayoutFile::in_directory(dir, &self.config.layout_file_name);
        let ctx = self.context()?.clone();
        match file.load() {
            Ok(Some(memory)) => {
                // Saved options carry no style, keep the live one
                ctx.memory_mut(|m| {
                    let options = std::mem::take(&mut m.options);
                    *m = memory;
                    m.options = options;
                });
                debug!("Restored overlay layout from {}", file.path().display());
            }
            Ok(None) => debug!("No saved overlay layout at {}", file.path().display()),
            // The file is rewritten on the next save
            Err(e) => warn!("Ignoring unreadable overlay layout: {}", e),
        }

        self.since_save = 0.0;
        Ok(self.layout_file.insert(file).path())
    }

    /// Feed one frame of host input and open a new UI frame
    ///
    /// Must precede any widget calls for the frame.
    pub fn begin_frame(&mut self, input: &FrameInput) -> Result<(), OverlayError> {
        self.ensure_initialized()?;
        if self.frame == FrameState::FrameOpen {
            return Err(OverlayError::FrameAlreadyOpen);
        }

        let ctx = self.context()?.clone();
        let raw = self.adapter.adapt(input);
        self.size_in_pixels = input.size_in_pixels();
        self.last_dt = raw.predicted_dt;

        ctx.begin_pass(raw);
        self.frame = FrameState::FrameOpen;
        Ok(())
    }

    /// Finish the open frame and record its draws into `pass`
    ///
    /// While hidden the frame is still finished and texture updates are still
    /// uploaded, but nothing is drawn.
    pub fn render(&mut self, pass: &mut B::Pass) -> Result<(), OverlayError> {
        self.ensure_initialized()?;
        if self.frame != FrameState::FrameOpen {
            return Err(OverlayError::FrameNotOpen);
        }

        let ctx = self.context()?.clone();
        let output = ctx.end_pass();
        self.frame = FrameState::Idle;

        let primitives = if self.visible {
            ctx.tessellate(output.shapes, output.pixels_per_point)
        } else {
            Vec::new()
        };
        let job = PaintJob {
            primitives,
            textures_delta: output.textures_delta,
            screen: ScreenGeometry {
                size_in_pixels: self.size_in_pixels,
                pixels_per_point: output.pixels_per_point,
            },
        };
        if let Some(backend) = self.backend.as_mut() {
            backend.paint(job, pass);
        }

        self.autosave(&ctx);
        Ok(())
    }

    fn autosave(&mut self, ctx: &egui::Context) {
        let interval = self.config.autosave_interval;
        if interval <= 0.0 || self.layout_file.is_none() {
            return;
        }

        self.since_save += self.last_dt;
        if self.since_save >= interval {
            self.since_save = 0.0;
            self.save_layout(ctx);
        }
    }

    fn save_layout(&self, ctx: &egui::Context) {
        if let Some(file) = &self.layout_file {
            match ctx.memory(|m| file.save(m)) {
                Ok(()) => debug!("Saved overlay layout to {}", file.path().display()),
                Err(e) => warn!("Failed to save overlay layout: {}", e),
            }
        }
    }

    /// Whether the UI wants exclusive use of the pointer this frame
    pub fn wants_pointer_capture(&self) -> bool {
        self.is_visible() && self.ctx.as_ref().is_some_and(|ctx| ctx.wants_pointer_input())
    }

    /// Whether the UI wants exclusive use of the keyboard this frame
    pub fn wants_keyboard_capture(&self) -> bool {
        self.is_visible() && self.ctx.as_ref().is_some_and(|ctx| ctx.wants_keyboard_input())
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Visible and initialized
    pub fn is_visible(&self) -> bool {
        self.visible && self.is_available()
    }

    pub fn toggle_visible(&mut self) {
        self.visible = !self.visible;
    }

    /// Tear down the renderer, then the UI context, and reset every field
    ///
    /// Also clears a failed initialization so `initialize` can be retried.
    pub fn shutdown(&mut self) -> Result<(), OverlayError> {
        match self.state {
            LifecycleState::Uninitialized => return Err(OverlayError::NotInitialized),
            LifecycleState::ShutDown => return Err(OverlayError::AlreadyShutDown),
            LifecycleState::Failed => info!("Clearing failed overlay initialization"),
            LifecycleState::Initialized => {
                if self.frame == FrameState::FrameOpen {
                    warn!("Shutting down overlay with a frame still open");
                }
                if let Some(ctx) = &self.ctx {
                    self.save_layout(ctx);
                }
                if let Some(backend) = self.backend.take() {
                    backend.destroy();
                }
                self.ctx = None;
                info!("Overlay shut down");
            }
        }

        let config = std::mem::take(&mut self.config);
        *self = Self::with_config(config);
        self.state = LifecycleState::ShutDown;
        Ok(())
    }
}

impl<B: RenderBackend> Default for UiLifecycleManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::BackendError;
    use crate::frame_input::Vec2f;
    use std::cell::Cell;

    /// Device double counting renderer creations
    #[derive(Default)]
    pub(crate) struct FakeDevice {
        pub creations: Cell<u32>,
        pub reject: bool,
    }

    pub(crate) struct FakeQueue;

    /// Backend recording the primitive count of every painted frame
    pub(crate) struct RecordingBackend;

    impl RenderBackend for RecordingBackend {
        type Device = FakeDevice;
        type Queue = FakeQueue;
        type Format = u32;
        type Pass = Vec<usize>;

        fn create(
            device: &FakeDevice,
            _queue: &FakeQueue,
            config: BackendConfig<u32>,
        ) -> Result<Self, BackendError> {
            device.creations.set(device.creations.get() + 1);
            if device.reject {
                return Err(BackendError::UnsupportedFormat(config.format.to_string()));
            }
            assert_eq!(config.frames_in_flight, 1);
            Ok(Self)
        }

        fn paint(&mut self, job: PaintJob, pass: &mut Vec<usize>) {
            pass.push(job.primitives.len());
        }

        fn destroy(self) {}
    }

    const FORMAT_RGBA8: u32 = 0;

    fn frame() -> FrameInput {
        FrameInput {
            width: 800,
            height: 600,
            content_scale: 1.0,
            dt: 0.016,
            mouse_pos: Vec2f::new(10.0, 10.0),
            ..Default::default()
        }
    }

    fn initialized(device: &FakeDevice) -> UiLifecycleManager<RecordingBackend> {
        let mut overlay = UiLifecycleManager::new();
        overlay
            .initialize(Some(device), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();
        overlay
    }

    fn draw_probe_window(overlay: &UiLifecycleManager<RecordingBackend>) {
        let ctx = overlay.context().unwrap();
        egui::Window::new("Probe").show(ctx, |ui| {
            ui.label("chain overlay");
        });
    }

    /// One begin/draw/render cycle, returning the painted primitive count
    fn run_frame(overlay: &mut UiLifecycleManager<RecordingBackend>) -> usize {
        overlay.begin_frame(&frame()).unwrap();
        draw_probe_window(overlay);
        let mut pass = Vec::new();
        overlay.render(&mut pass).unwrap();
        assert_eq!(pass.len(), 1);
        pass[0]
    }

    #[test]
    fn test_full_frame_scenario() {
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        assert!(overlay.is_available());
        assert!(overlay.is_visible());
        assert_eq!(overlay.format(), Some(FORMAT_RGBA8));
        assert!(overlay.settings_path().is_none());

        overlay.begin_frame(&frame()).unwrap();
        let screen = overlay.context().unwrap().screen_rect();
        assert_eq!(screen.size(), egui::vec2(800.0, 600.0));
        draw_probe_window(&overlay);
        overlay.render(&mut Vec::new()).unwrap();

        // New windows are measured invisibly on their first frame
        assert!(run_frame(&mut overlay) > 0);

        overlay.shutdown().unwrap();
        assert!(!overlay.is_available());
        assert_eq!(overlay.state(), LifecycleState::ShutDown);
    }

    #[test]
    fn test_initialize_twice_creates_backend_once() {
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        overlay
            .initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();

        assert_eq!(device.creations.get(), 1);
        assert!(overlay.is_available());
    }

    #[test]
    fn test_missing_device_or_queue() {
        let device = FakeDevice::default();
        let mut overlay = UiLifecycleManager::<RecordingBackend>::new();

        assert!(matches!(
            overlay.initialize(None, Some(&FakeQueue), FORMAT_RGBA8),
            Err(OverlayError::MissingDevice)
        ));
        assert!(matches!(
            overlay.initialize(Some(&device), None, FORMAT_RGBA8),
            Err(OverlayError::MissingQueue)
        ));
        assert!(!overlay.is_available());
        assert_eq!(overlay.state(), LifecycleState::Uninitialized);
        assert_eq!(device.creations.get(), 0);
    }

    #[test]
    fn test_shutdown_clears_capture_and_visibility() {
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        overlay.shutdown().unwrap();

        assert!(!overlay.is_available());
        assert!(!overlay.is_visible());
        assert!(!overlay.wants_pointer_capture());
        assert!(!overlay.wants_keyboard_capture());
        assert!(matches!(overlay.shutdown(), Err(OverlayError::AlreadyShutDown)));
        assert!(matches!(
            overlay.begin_frame(&frame()),
            Err(OverlayError::AlreadyShutDown)
        ));
    }

    #[test]
    fn test_reinitialize_after_shutdown() {
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        overlay.set_visible(false);
        overlay.shutdown().unwrap();

        overlay
            .initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();
        assert_eq!(device.creations.get(), 2);
        assert!(overlay.is_visible());
        assert!(overlay.settings_path().is_none());
    }

    #[test]
    fn test_calls_before_initialize() {
        let mut overlay = UiLifecycleManager::<RecordingBackend>::new();

        assert!(matches!(overlay.begin_frame(&frame()), Err(OverlayError::NotInitialized)));
        assert!(matches!(overlay.render(&mut Vec::new()), Err(OverlayError::NotInitialized)));
        assert!(matches!(overlay.shutdown(), Err(OverlayError::NotInitialized)));
        assert!(matches!(
            overlay.set_settings_directory("/tmp"),
            Err(OverlayError::NotInitialized)
        ));
        assert!(!overlay.wants_pointer_capture());
    }

    #[test]
    fn test_frame_order_is_checked() {
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        let mut pass = Vec::new();

        assert!(matches!(overlay.render(&mut pass), Err(OverlayError::FrameNotOpen)));

        overlay.begin_frame(&frame()).unwrap();
        assert!(matches!(
            overlay.begin_frame(&frame()),
            Err(OverlayError::FrameAlreadyOpen)
        ));
        assert_eq!(overlay.frame_state(), FrameState::FrameOpen);

        overlay.render(&mut pass).unwrap();
        assert!(matches!(overlay.render(&mut pass), Err(OverlayError::FrameNotOpen)));
        assert_eq!(pass.len(), 1);
    }

    #[test]
    fn test_hidden_overlay_draws_nothing() {
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        run_frame(&mut overlay);
        assert!(run_frame(&mut overlay) > 0);

        overlay.toggle_visible();
        assert!(!overlay.is_visible());
        assert_eq!(run_frame(&mut overlay), 0);
        assert!(!overlay.wants_pointer_capture());

        overlay.toggle_visible();
        assert!(run_frame(&mut overlay) > 0);
    }

    #[test]
    fn test_visibility_is_independent_of_initialization() {
        let mut overlay = UiLifecycleManager::<RecordingBackend>::new();
        overlay.set_visible(true);
        assert!(!overlay.is_visible());

        let device = FakeDevice::default();
        overlay
            .initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();
        assert!(overlay.is_visible());
    }

    #[test]
    fn test_failed_backend_requires_shutdown() {
        let device = FakeDevice {
            reject: true,
            ..Default::default()
        };
        let mut overlay = UiLifecycleManager::<RecordingBackend>::new();

        assert!(matches!(
            overlay.initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8),
            Err(OverlayError::InitializationFailed(_))
        ));
        assert_eq!(overlay.state(), LifecycleState::Failed);
        assert!(!overlay.is_available());

        // No automatic retry
        assert!(overlay
            .initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8)
            .is_err());
        assert_eq!(device.creations.get(), 1);

        overlay.shutdown().unwrap();
        let good = FakeDevice::default();
        overlay
            .initialize(Some(&good), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();
        assert!(overlay.is_available());
    }

    #[test]
    fn test_layout_saved_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        let marker = egui::Id::new("layout-marker");

        let path = overlay.set_settings_directory(dir.path()).unwrap().to_path_buf();
        assert_eq!(path, dir.path().join(constants::settings::LAYOUT_FILE_NAME));

        run_frame(&mut overlay);
        run_frame(&mut overlay);
        overlay
            .context()
            .unwrap()
            .data_mut(|d| d.insert_persisted(marker, 11u32));
        assert!(!path.exists());

        overlay.shutdown().unwrap();
        let mut saved = LayoutFile::in_directory(dir.path(), constants::settings::LAYOUT_FILE_NAME)
            .load()
            .unwrap()
            .unwrap();
        assert_eq!(saved.data.get_persisted::<u32>(marker), Some(11));

        // Restored on the next run
        overlay
            .initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();
        overlay.set_settings_directory(dir.path()).unwrap();
        let restored = overlay
            .context()
            .unwrap()
            .data_mut(|d| d.get_persisted::<u32>(marker));
        assert_eq!(restored, Some(11));
    }

    #[test]
    fn test_restored_layout_keeps_overlay_style() {
        let dir = tempfile::tempdir().unwrap();
        let device = FakeDevice::default();
        let mut overlay = initialized(&device);
        overlay.set_settings_directory(dir.path()).unwrap();
        run_frame(&mut overlay);
        overlay.shutdown().unwrap();

        overlay
            .initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();
        overlay.set_settings_directory(dir.path()).unwrap();

        let style = overlay.context().unwrap().style();
        assert_eq!(style.visuals.window_corner_radius, egui::CornerRadius::same(5));
        assert_eq!(style.visuals.widgets.inactive.corner_radius, egui::CornerRadius::same(3));
        assert!(style.visuals.window_fill.a() < 255);
    }

    #[test]
    fn test_layout_autosaves_after_interval() {
        let dir = tempfile::tempdir().unwrap();
        let device = FakeDevice::default();
        let config = OverlayConfig {
            autosave_interval: 0.03,
            ..Default::default()
        };
        let mut overlay = UiLifecycleManager::<RecordingBackend>::with_config(config);
        overlay
            .initialize(Some(&device), Some(&FakeQueue), FORMAT_RGBA8)
            .unwrap();
        let path = overlay.set_settings_directory(dir.path()).unwrap().to_path_buf();

        run_frame(&mut overlay);
        assert!(!path.exists());
        run_frame(&mut overlay);
        assert!(path.exists());
        assert!(LayoutFile::in_directory(dir.path(), constants::settings::LAYOUT_FILE_NAME)
            .load()
            .unwrap()
            .is_some());
    }
}
