//! Overlay-wide constants and default values
//!
//! Centralized location for the fixed numbers the overlay relies on

/// Frame timing constants
pub mod frame {
    /// Frame time substituted when the host reports `dt <= 0`
    pub const DEFAULT_FRAME_TIME: f32 = 1.0 / 60.0;

    /// Scale substituted when the host reports a non-positive content scale
    pub const DEFAULT_CONTENT_SCALE: f32 = 1.0;

    /// Number of frames the GPU renderer may have in flight
    pub const FRAMES_IN_FLIGHT: u32 = 1;
}

/// Layout persistence constants
pub mod settings {
    /// File name of the persisted UI layout inside the settings directory
    pub const LAYOUT_FILE_NAME: &str = "egui_layout.ron";

    /// Seconds of frame time between automatic layout saves
    pub const AUTOSAVE_INTERVAL_SECS: f32 = 5.0;

    /// Directory name used under the platform config dir
    pub const APP_DIR_NAME: &str = "chain-overlay";
}

/// Node attribute encoding
pub mod attribute {
    /// Attribute ids reserved per node: one output plus the inputs
    pub const STRIDE: u32 = 100;

    /// Highest number of input ports a node can expose under this encoding
    pub const MAX_INPUTS: usize = (STRIDE - 1) as usize;
}

/// Automatic node placement
pub mod layout {
    /// Grid-space origin of the first column
    pub const START: [f32; 2] = [50.0, 50.0];

    /// Horizontal distance between depth columns
    pub const COLUMN_SPACING: f32 = 280.0;

    /// Vertical gap between stacked nodes
    pub const VERTICAL_PADDING: f32 = 20.0;
}
