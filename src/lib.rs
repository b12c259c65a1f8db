//! Chain overlay library
//!
//! Immediate-mode debug overlay for a host render loop: host input is adapted
//! into egui frames, draws are recorded into the host's wgpu render pass, and
//! the operator chain can be shown as a node graph. The same lifecycle is
//! exported over a C ABI for hosts that load the library dynamically.

// Public modules
pub mod backend;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod ffi;
pub mod frame_input;
pub mod lifecycle;
pub mod settings;
pub mod theme;
pub mod visualizer;

// Re-export commonly used types
pub use backend::{RenderBackend, WgpuBackend};
pub use chain::{Chain, OperatorDescriptor, OperatorHandle, OutputKind, ParamValue};
pub use config::OverlayConfig;
pub use error::{BackendError, ChainError, OverlayError, SettingsError};
pub use frame_input::{FrameInput, FrameInputAdapter, Vec2f};
pub use lifecycle::{FrameState, LifecycleState, UiLifecycleManager};
pub use visualizer::{ChainVisualizer, NodeId, VisualizerStats};
