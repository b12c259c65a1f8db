//! Side windows drawn next to the node canvas

use crate::frame_input::FrameInput;

/// Frame timing and chain size
pub fn performance_window(ctx: &egui::Context, input: &FrameInput, operator_count: usize) {
    let dt = input.effective_dt();
    let [width, height] = input.size_in_pixels();

    egui::Window::new("Performance")
        .default_pos(egui::pos2(10.0, 10.0))
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(format!("DT: {:.2} ms", dt * 1000.0));
            ui.label(format!("FPS: {:.1}", 1.0 / dt));
            ui.label(format!("Size: {}x{}", width, height));
            ui.label(format!("Operators: {}", operator_count));
        });
}

/// Host keyboard shortcuts and canvas controls
pub fn controls_window(ctx: &egui::Context) {
    egui::Window::new("Controls")
        .default_pos(egui::pos2(10.0, 130.0))
        .resizable(false)
        .show(ctx, |ui| {
            ui.label("Tab: Toggle UI");
            ui.label("F: Fullscreen");
            ui.label("Ctrl+Drag: Pan graph");
            ui.label("Middle drag: Pan graph");
        });
}
