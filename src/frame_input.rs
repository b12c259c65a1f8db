//! Per-frame host input and its translation into egui's raw input
//!
//! The host hands over one [`FrameInput`] per rendered frame. The layout is
//! `#[repr(C)]` because the record also crosses the exported C surface.
//! [`FrameInputAdapter`] turns it into an [`egui::RawInput`]; everything the
//! frame should observe (button, wheel and modifier events) is queued in that
//! record, and egui only starts the new frame once it receives it.

use crate::constants;
use egui::{Event, Modifiers, MouseWheelUnit, PointerButton, Pos2, RawInput, Rect, Vec2, ViewportId};

/// Plain two-component vector used in the C layout
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Vec2f> for Vec2 {
    fn from(v: Vec2f) -> Self {
        Vec2::new(v.x, v.y)
    }
}

impl From<Vec2f> for Pos2 {
    fn from(v: Vec2f) -> Self {
        Pos2::new(v.x, v.y)
    }
}

/// One frame of host input
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Surface width in physical pixels
    pub width: i32,
    /// Surface height in physical pixels
    pub height: i32,
    /// Physical pixels per logical point
    pub content_scale: f32,
    /// Seconds since the previous frame
    pub dt: f32,
    /// Pointer position in logical points, top-left origin
    pub mouse_pos: Vec2f,
    /// Left, right, middle
    pub mouse_down: [bool; 3],
    pub scroll: Vec2f,
    pub key_ctrl: bool,
    pub key_shift: bool,
    pub key_alt: bool,
    pub key_super: bool,
}

impl FrameInput {
    /// Content scale with non-positive values replaced by 1.0
    pub fn effective_scale(&self) -> f32 {
        if self.content_scale > 0.0 {
            self.content_scale
        } else {
            constants::frame::DEFAULT_CONTENT_SCALE
        }
    }

    /// Frame time with non-positive values replaced by 1/60 s
    pub fn effective_dt(&self) -> f32 {
        self.dt_or(constants::frame::DEFAULT_FRAME_TIME)
    }

    pub(crate) fn dt_or(&self, fallback: f32) -> f32 {
        if self.dt > 0.0 {
            self.dt
        } else {
            fallback
        }
    }

    /// Display size in logical points
    pub fn logical_size(&self) -> Vec2 {
        let [w, h] = self.size_in_pixels();
        Vec2::new(w as f32, h as f32) / self.effective_scale()
    }

    /// Surface size in physical pixels, negative sizes clamped to zero
    pub fn size_in_pixels(&self) -> [u32; 2] {
        [self.width.max(0) as u32, self.height.max(0) as u32]
    }

    /// Modifier state in egui's terms
    pub fn modifiers(&self) -> Modifiers {
        let mac = cfg!(target_os = "macos");
        Modifiers {
            alt: self.key_alt,
            ctrl: self.key_ctrl,
            shift: self.key_shift,
            mac_cmd: mac && self.key_super,
            command: if mac { self.key_super } else { self.key_ctrl },
        }
    }
}

const BUTTONS: [PointerButton; 3] = [
    PointerButton::Primary,
    PointerButton::Secondary,
    PointerButton::Middle,
];

/// Translates host input into egui's raw input, one frame at a time
///
/// egui expects pointer buttons as press/release events, while the host
/// reports held state; the adapter keeps the previous frame's state to emit
/// only the transitions.
#[derive(Debug, Clone)]
pub struct FrameInputAdapter {
    default_frame_time: f32,
    time: f64,
    buttons: [bool; 3],
    pointer: Option<Pos2>,
}

impl FrameInputAdapter {
    pub fn new() -> Self {
        Self::with_default_frame_time(constants::frame::DEFAULT_FRAME_TIME)
    }

    /// Adapter substituting `default_frame_time` when the host reports `dt <= 0`
    pub fn with_default_frame_time(default_frame_time: f32) -> Self {
        let default_frame_time = if default_frame_time > 0.0 {
            default_frame_time
        } else {
            constants::frame::DEFAULT_FRAME_TIME
        };

        Self {
            default_frame_time,
            time: 0.0,
            buttons: [false; 3],
            pointer: None,
        }
    }

    /// Total frame time consumed so far, in seconds
    pub fn elapsed(&self) -> f64 {
        self.time
    }

    /// Build the raw input for the frame described by `input`
    pub fn adapt(&mut self, input: &FrameInput) -> RawInput {
        let scale = input.effective_scale();
        let dt = input.dt_or(self.default_frame_time);
        let modifiers = input.modifiers();
        let pos: Pos2 = input.mouse_pos.into();

        self.time += dt as f64;

        let mut raw = RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, input.logical_size())),
            time: Some(self.time),
            predicted_dt: dt,
            modifiers,
            focused: true,
            ..Default::default()
        };
        raw.viewports
            .entry(ViewportId::ROOT)
            .or_default()
            .native_pixels_per_point = Some(scale);

        if self.pointer != Some(pos) {
            raw.events.push(Event::PointerMoved(pos));
            self.pointer = Some(pos);
        }

        for (i, button) in BUTTONS.iter().enumerate() {
            let pressed = input.mouse_down[i];
            if pressed != self.buttons[i] {
                raw.events.push(Event::PointerButton {
                    pos,
                    button: *button,
                    pressed,
                    modifiers,
                });
                self.buttons[i] = pressed;
            }
        }

        let scroll: Vec2 = input.scroll.into();
        if scroll != Vec2::ZERO {
            raw.events.push(Event::MouseWheel {
                unit: MouseWheelUnit::Line,
                delta: scroll,
                modifiers,
            });
        }

        raw
    }

    /// Forget button and pointer history, as after a context teardown
    pub fn reset(&mut self) {
        *self = Self::with_default_frame_time(self.default_frame_time);
    }
}

impl Default for FrameInputAdapter {
    fn default() -> Self {
        Self::new()
    }
}
