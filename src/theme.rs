//! Centralized theme and styling constants for the overlay
//!
//! This module provides a single source of truth for the colors and
//! dimensions of the overlay windows and the node canvas.

use crate::chain::OutputKind;
use crate::config::StyleConfig;
use egui::{Color32, CornerRadius, Vec2};

/// Color palette for the node canvas
pub struct Colors {
    // Canvas background
    pub grid_background: Color32,
    pub grid_line: Color32,
    pub grid_line_primary: Color32,

    // Node body
    pub node_background: Color32,
    pub node_outline: Color32,
    pub node_outline_hovered: Color32,
    pub title_bar: Color32,
    pub title_bar_hovered: Color32,
    pub subtitle_text: Color32,
    pub separator: Color32,

    // Pins and links
    pub pin: Color32,
    pub pin_hovered: Color32,
    pub link: Color32,

    // Preview placeholder
    pub placeholder_fill: Color32,
    pub placeholder_text: Color32,

    // Empty chain hint
    pub warning_text: Color32,
}

impl Colors {
    /// Get the default color palette
    pub fn default() -> Self {
        Self {
            grid_background: Color32::from_rgb(20, 20, 20),
            grid_line: Color32::from_rgb(40, 40, 40),
            grid_line_primary: Color32::from_rgb(50, 50, 50),

            node_background: Color32::from_rgb(50, 50, 50),
            node_outline: Color32::from_rgb(100, 100, 100),
            node_outline_hovered: Color32::from_rgb(100, 150, 255),
            title_bar: Color32::from_rgb(41, 74, 122),
            title_bar_hovered: Color32::from_rgb(66, 150, 250),
            subtitle_text: Color32::from_rgb(153, 153, 178),
            separator: Color32::from_rgb(80, 80, 90),

            pin: Color32::from_rgb(53, 150, 250),
            pin_hovered: Color32::from_rgb(120, 190, 255),
            link: Color32::from_rgb(61, 133, 224),

            placeholder_fill: Color32::from_rgb(40, 40, 50),
            placeholder_text: Color32::from_rgb(100, 100, 120),

            warning_text: Color32::from_rgb(255, 178, 76),
        }
    }
}

/// Dimension constants for the node canvas
pub struct Dimensions {
    pub node_width: f32,
    pub node_padding: Vec2,
    pub node_corner_radius: f32,
    pub title_height: f32,
    pub line_height: f32,
    pub pin_row_height: f32,
    pub pin_radius: f32,
    pub link_thickness: f32,
    pub separator_spacing: f32,
    pub preview_size: Vec2,
    pub placeholder_height: f32,
    pub grid_spacing: f32,
}

impl Dimensions {
    /// Get the default dimensions
    pub fn default() -> Self {
        Self {
            node_width: 150.0,
            node_padding: Vec2::new(8.0, 8.0),
            node_corner_radius: 4.0,
            title_height: 24.0,
            line_height: 18.0,
            pin_row_height: 20.0,
            pin_radius: 4.0,
            link_thickness: 3.0,
            separator_spacing: 8.0,
            preview_size: Vec2::new(100.0, 56.0),
            placeholder_height: 40.0,
            grid_spacing: 24.0,
        }
    }
}

/// Title bar colors for one kind of node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleTint {
    pub base: Color32,
    pub hovered: Color32,
    pub selected: Color32,
}

/// Title bar tint for an operator's output kind, `None` keeps the default
pub fn title_tint(kind: OutputKind) -> Option<TitleTint> {
    let tint = |base: [u8; 3], hovered: [u8; 3], selected: [u8; 3]| TitleTint {
        base: Color32::from_rgb(base[0], base[1], base[2]),
        hovered: Color32::from_rgb(hovered[0], hovered[1], hovered[2]),
        selected: Color32::from_rgb(selected[0], selected[1], selected[2]),
    };

    match kind {
        OutputKind::Geometry => Some(tint([40, 80, 120], [50, 100, 150], [60, 120, 180])),
        OutputKind::Value | OutputKind::ValueArray => {
            Some(tint([120, 80, 40], [150, 100, 50], [180, 120, 60]))
        }
        OutputKind::Camera => Some(tint([40, 100, 80], [50, 125, 100], [60, 150, 120])),
        OutputKind::Light => Some(tint([120, 100, 40], [150, 125, 50], [180, 150, 60])),
        OutputKind::Texture | OutputKind::Other => None,
    }
}

/// Complete theme containing all styling constants
pub struct Theme {
    pub colors: Colors,
    pub dimensions: Dimensions,
}

impl Theme {
    /// Get the default theme
    pub fn default() -> Self {
        Self {
            colors: Colors::default(),
            dimensions: Dimensions::default(),
        }
    }
}

/// Global theme instance
static GLOBAL_THEME: std::sync::LazyLock<Theme> = std::sync::LazyLock::new(Theme::default);

/// Get the global theme
pub fn theme() -> &'static Theme {
    &GLOBAL_THEME
}

pub fn colors() -> &'static Colors {
    &theme().colors
}

pub fn dimensions() -> &'static Dimensions {
    &theme().dimensions
}

fn corner_radius(points: f32) -> CornerRadius {
    CornerRadius::same(points.clamp(0.0, u8::MAX as f32).round() as u8)
}

/// Apply the overlay's dark style with rounded, slightly transparent windows
pub fn apply_overlay_style(ctx: &egui::Context, config: &StyleConfig) {
    ctx.set_visuals(egui::Visuals::dark());
    ctx.style_mut(|style| {
        let visuals = &mut style.visuals;
        visuals.window_corner_radius = corner_radius(config.window_rounding);

        let frame = corner_radius(config.frame_rounding);
        for widget in [
            &mut visuals.widgets.noninteractive,
            &mut visuals.widgets.inactive,
            &mut visuals.widgets.hovered,
            &mut visuals.widgets.active,
            &mut visuals.widgets.open,
        ] {
            widget.corner_radius = frame;
        }

        visuals.window_fill = visuals
            .window_fill
            .gamma_multiply(config.window_bg_alpha.clamp(0.0, 1.0));
    });
}
