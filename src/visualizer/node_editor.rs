//! Node canvas widget
//!
//! A small immediate-mode node editor: the caller describes nodes, their
//! attributes (pins) and the links between attributes every frame, and the
//! editor keeps only what must survive between frames, namely grid-space
//! node positions and the canvas pan. Nodes are moved by dragging them; the
//! canvas pans on middle-drag or Ctrl+left-drag.

use super::registry::{AttributeId, NodeId};
use crate::theme::{self, TitleTint};
use egui::epaint::{CubicBezierShape, StrokeKind};
use egui::{Align2, Color32, CornerRadius, FontId, Painter, PointerButton, Pos2, Rect, Sense, Stroke, Vec2};
use std::collections::HashMap;

/// One pin of a node
#[derive(Debug, Clone, PartialEq)]
pub struct PinSpec {
    pub attribute: AttributeId,
    pub label: String,
}

/// Everything drawn for one node this frame
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub title: String,
    /// Secondary line under the title bar
    pub subtitle: Option<String>,
    /// Text lines below a separator, such as parameter values
    pub lines: Vec<String>,
    pub inputs: Vec<PinSpec>,
    pub output: PinSpec,
    pub preview: Option<egui::TextureId>,
    pub tint: Option<TitleTint>,
}

impl NodeSpec {
    /// Height of the node body for this content
    pub fn height(&self) -> f32 {
        let dims = theme::dimensions();
        let mut height = dims.title_height;
        if self.subtitle.is_some() {
            height += dims.line_height;
        }
        if !self.lines.is_empty() {
            height += dims.separator_spacing + self.lines.len() as f32 * dims.line_height;
        }
        height += self.inputs.len() as f32 * dims.pin_row_height;
        height += self.preview_block_height();
        height += dims.pin_row_height;
        height + dims.node_padding.y * 2.0
    }

    fn preview_block_height(&self) -> f32 {
        let dims = theme::dimensions();
        match self.preview {
            Some(_) => dims.preview_size.y + 4.0,
            None => dims.placeholder_height + 14.0,
        }
    }
}

/// Link from an output attribute to an input attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkSpec {
    pub id: usize,
    pub start: AttributeId,
    pub end: AttributeId,
}

/// Interaction summary of one `show` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditorResponse {
    pub hovered_node: Option<NodeId>,
    pub dragged_node: Option<NodeId>,
    pub links_drawn: usize,
}

/// Persistent state of the node canvas
#[derive(Debug, Clone)]
pub struct NodeEditor {
    id: egui::Id,
    positions: HashMap<NodeId, Pos2>,
    pan: Vec2,
    node_rects: HashMap<NodeId, Rect>,
    pins: HashMap<AttributeId, Pos2>,
}

impl NodeEditor {
    pub fn new(id_salt: impl std::hash::Hash) -> Self {
        Self {
            id: egui::Id::new(id_salt),
            positions: HashMap::new(),
            pan: Vec2::ZERO,
            node_rects: HashMap::new(),
            pins: HashMap::new(),
        }
    }

    pub fn has_position(&self, node: NodeId) -> bool {
        self.positions.contains_key(&node)
    }

    /// Grid-space position of a node
    pub fn node_position(&self, node: NodeId) -> Option<Pos2> {
        self.positions.get(&node).copied()
    }

    pub fn set_node_position(&mut self, node: NodeId, pos: Pos2) {
        self.positions.insert(node, pos);
    }

    /// Forget everything stored for a node that left the graph
    pub fn remove_node(&mut self, node: NodeId) {
        self.positions.remove(&node);
        self.node_rects.remove(&node);
    }

    /// Number of nodes with a stored position
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Screen rectangle of a node as of the last `show`
    pub fn node_screen_rect(&self, node: NodeId) -> Option<Rect> {
        self.node_rects.get(&node).copied()
    }

    /// Screen position of a pin as of the last `show`
    pub fn attribute_screen_pos(&self, attribute: AttributeId) -> Option<Pos2> {
        self.pins.get(&attribute).copied()
    }

    /// Draw the canvas filling the remaining space of `ui`
    pub fn show(&mut self, ui: &mut egui::Ui, nodes: &[NodeSpec], links: &[LinkSpec]) -> EditorResponse {
        let (canvas, background) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let panning = background.dragged_by(PointerButton::Middle)
            || (background.dragged_by(PointerButton::Primary) && ui.input(|i| i.modifiers.ctrl));
        if panning {
            self.pan += background.drag_delta();
        }

        let painter = ui.painter_at(canvas);
        let origin = canvas.min + self.pan;
        self.paint_grid(&painter, canvas, origin);

        let mut response = EditorResponse::default();
        self.node_rects.clear();
        self.pins.clear();

        // Interaction first, so links and pins follow a node in the frame it moves
        let mut states = Vec::with_capacity(nodes.len());
        for node in nodes {
            let grid_pos = self.positions.get(&node.id).copied().unwrap_or(Pos2::ZERO);
            let size = Vec2::new(theme::dimensions().node_width, node.height());
            let rect = Rect::from_min_size(origin + grid_pos.to_vec2(), size);

            let node_response = ui.interact(rect, self.id.with(node.id.0), Sense::click_and_drag());
            let dragged = node_response.dragged_by(PointerButton::Primary) && !ui.input(|i| i.modifiers.ctrl);
            let rect = if dragged {
                let delta = node_response.drag_delta();
                self.positions.insert(node.id, grid_pos + delta);
                response.dragged_node = Some(node.id);
                rect.translate(delta)
            } else {
                rect
            };
            if node_response.hovered() {
                response.hovered_node = Some(node.id);
            }

            self.node_rects.insert(node.id, rect);
            self.place_pins(node, rect);
            states.push((node, rect, node_response.hovered(), dragged));
        }

        let dims = theme::dimensions();
        let link_stroke = Stroke::new(dims.link_thickness, theme::colors().link);
        for link in links {
            let (Some(start), Some(end)) = (self.pins.get(&link.start), self.pins.get(&link.end)) else {
                continue;
            };
            let bend = ((end.x - start.x).abs() * 0.5).max(40.0);
            let curve = CubicBezierShape::from_points_stroke(
                [*start, *start + Vec2::new(bend, 0.0), *end - Vec2::new(bend, 0.0), *end],
                false,
                Color32::TRANSPARENT,
                link_stroke,
            );
            painter.add(curve);
            response.links_drawn += 1;
        }

        let hover_pos = ui.input(|i| i.pointer.hover_pos());
        for (node, rect, hovered, dragged) in states {
            self.paint_node(&painter, node, rect, hovered, dragged, hover_pos);
        }

        response
    }

    fn place_pins(&mut self, node: &NodeSpec, rect: Rect) {
        let dims = theme::dimensions();
        let mut y = rect.top() + dims.title_height + dims.node_padding.y;
        if node.subtitle.is_some() {
            y += dims.line_height;
        }
        if !node.lines.is_empty() {
            y += dims.separator_spacing + node.lines.len() as f32 * dims.line_height;
        }

        for pin in &node.inputs {
            self.pins.insert(pin.attribute, Pos2::new(rect.left(), y + dims.pin_row_height * 0.5));
            y += dims.pin_row_height;
        }
        y += node.preview_block_height();
        self.pins.insert(node.output.attribute, Pos2::new(rect.right(), y + dims.pin_row_height * 0.5));
    }

    fn paint_grid(&self, painter: &Painter, canvas: Rect, origin: Pos2) {
        let colors = theme::colors();
        let spacing = theme::dimensions().grid_spacing;
        painter.rect_filled(canvas, CornerRadius::ZERO, colors.grid_background);

        let first_x = canvas.left() + (origin.x - canvas.left()).rem_euclid(spacing);
        let mut x = first_x;
        while x < canvas.right() {
            let primary = (x - origin.x).abs() < 0.5;
            let color = if primary { colors.grid_line_primary } else { colors.grid_line };
            painter.line_segment([Pos2::new(x, canvas.top()), Pos2::new(x, canvas.bottom())], Stroke::new(1.0, color));
            x += spacing;
        }

        let first_y = canvas.top() + (origin.y - canvas.top()).rem_euclid(spacing);
        let mut y = first_y;
        while y < canvas.bottom() {
            let primary = (y - origin.y).abs() < 0.5;
            let color = if primary { colors.grid_line_primary } else { colors.grid_line };
            painter.line_segment([Pos2::new(canvas.left(), y), Pos2::new(canvas.right(), y)], Stroke::new(1.0, color));
            y += spacing;
        }
    }

    fn paint_node(
        &self,
        painter: &Painter,
        node: &NodeSpec,
        rect: Rect,
        hovered: bool,
        dragged: bool,
        hover_pos: Option<Pos2>,
    ) {
        let colors = theme::colors();
        let dims = theme::dimensions();
        let radius = dims.node_corner_radius.round() as u8;
        let text_x = rect.left() + dims.node_padding.x;
        let font = FontId::proportional(13.0);

        painter.rect_filled(rect, CornerRadius::same(radius), colors.node_background);

        // Title bar
        let title_rect = Rect::from_min_size(rect.min, Vec2::new(rect.width(), dims.title_height));
        let title_color = match (node.tint, dragged, hovered) {
            (Some(tint), true, _) => tint.selected,
            (Some(tint), false, true) => tint.hovered,
            (Some(tint), false, false) => tint.base,
            (None, _, true) | (None, true, _) => colors.title_bar_hovered,
            (None, false, false) => colors.title_bar,
        };
        let title_radius = CornerRadius {
            nw: radius,
            ne: radius,
            sw: 0,
            se: 0,
        };
        painter.rect_filled(title_rect, title_radius, title_color);
        painter.text(
            Pos2::new(text_x, title_rect.center().y),
            Align2::LEFT_CENTER,
            &node.title,
            font.clone(),
            Color32::WHITE,
        );

        let mut y = title_rect.bottom() + dims.node_padding.y;
        let text_line = |text: &str, color: Color32, y: &mut f32, height: f32| {
            painter.text(Pos2::new(text_x, *y + height * 0.5), Align2::LEFT_CENTER, text, font.clone(), color);
            *y += height;
        };

        if let Some(subtitle) = &node.subtitle {
            text_line(subtitle, colors.subtitle_text, &mut y, dims.line_height);
        }

        if !node.lines.is_empty() {
            let line_y = y + dims.separator_spacing * 0.5;
            painter.line_segment(
                [Pos2::new(text_x, line_y), Pos2::new(text_x + dims.preview_size.x, line_y)],
                Stroke::new(1.0, colors.separator),
            );
            y += dims.separator_spacing;
            for line in &node.lines {
                text_line(line, Color32::LIGHT_GRAY, &mut y, dims.line_height);
            }
        }

        for pin in &node.inputs {
            text_line(&pin.label, Color32::LIGHT_GRAY, &mut y, dims.pin_row_height);
        }

        let preview_rect = Rect::from_min_size(Pos2::new(text_x, y + 2.0), dims.preview_size);
        match node.preview {
            Some(texture) => {
                let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));
                painter.image(texture, preview_rect, uv, Color32::WHITE);
            }
            None => {
                let placeholder = Rect::from_min_size(
                    Pos2::new(text_x, y + 7.0),
                    Vec2::new(dims.preview_size.x, dims.placeholder_height),
                );
                painter.rect_filled(placeholder, CornerRadius::same(radius), colors.placeholder_fill);
                painter.text(
                    placeholder.center(),
                    Align2::CENTER_CENTER,
                    "no preview",
                    FontId::proportional(11.0),
                    colors.placeholder_text,
                );
            }
        }
        y += node.preview_block_height();

        painter.text(
            Pos2::new(rect.right() - dims.node_padding.x, y + dims.pin_row_height * 0.5),
            Align2::RIGHT_CENTER,
            &node.output.label,
            font.clone(),
            Color32::LIGHT_GRAY,
        );

        let outline = if hovered || dragged { colors.node_outline_hovered } else { colors.node_outline };
        painter.rect_stroke(rect, CornerRadius::same(radius), Stroke::new(1.0, outline), StrokeKind::Outside);

        let pins = node.inputs.iter().chain(std::iter::once(&node.output));
        for pin in pins {
            if let Some(pos) = self.pins.get(&pin.attribute) {
                let near = hover_pos.is_some_and(|p| p.distance(*pos) <= dims.pin_radius * 2.0);
                let color = if near { colors.pin_hovered } else { colors.pin };
                painter.circle_filled(*pos, dims.pin_radius, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Event, RawInput};

    fn pin(attr: u32, label: &str) -> PinSpec {
        PinSpec {
            attribute: AttributeId(attr),
            label: label.to_string(),
        }
    }

    fn node(id: u32, inputs: usize) -> NodeSpec {
        NodeSpec {
            id: NodeId(id),
            title: format!("node {}", id),
            subtitle: None,
            lines: Vec::new(),
            inputs: (0..inputs).map(|i| pin(id * 100 + i as u32 + 1, "in")).collect(),
            output: pin(id * 100, "out"),
            preview: None,
            tint: None,
        }
    }

    fn raw(events: Vec<Event>) -> RawInput {
        RawInput {
            screen_rect: Some(Rect::from_min_size(Pos2::ZERO, Vec2::new(1024.0, 768.0))),
            events,
            ..Default::default()
        }
    }

    fn run(ctx: &egui::Context, editor: &mut NodeEditor, nodes: &[NodeSpec], links: &[LinkSpec], events: Vec<Event>) -> EditorResponse {
        let mut response = EditorResponse::default();
        let _ = ctx.run(raw(events), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                response = editor.show(ui, nodes, links);
            });
        });
        response
    }

    #[test]
    fn test_links_connect_pins() {
        let ctx = egui::Context::default();
        let mut editor = NodeEditor::new("test");
        editor.set_node_position(NodeId(0), Pos2::new(20.0, 20.0));
        editor.set_node_position(NodeId(1), Pos2::new(300.0, 20.0));

        let nodes = [node(0, 0), node(1, 2)];
        let links = [
            LinkSpec { id: 0, start: AttributeId(0), end: AttributeId(102) },
            LinkSpec { id: 1, start: AttributeId(0), end: AttributeId(999) },
        ];
        let response = run(&ctx, &mut editor, &nodes, &links, Vec::new());

        assert_eq!(response.links_drawn, 1);
        let out = editor.attribute_screen_pos(AttributeId(0)).unwrap();
        let input = editor.attribute_screen_pos(AttributeId(102)).unwrap();
        assert_eq!(out.x, editor.node_screen_rect(NodeId(0)).unwrap().right());
        assert_eq!(input.x, editor.node_screen_rect(NodeId(1)).unwrap().left());
        assert!(editor.attribute_screen_pos(AttributeId(101)).unwrap().y < input.y);
    }

    #[test]
    fn test_removed_node_forgets_position() {
        let mut editor = NodeEditor::new("test");
        editor.set_node_position(NodeId(0), Pos2::new(20.0, 20.0));
        editor.set_node_position(NodeId(1), Pos2::new(300.0, 20.0));

        editor.remove_node(NodeId(0));
        assert!(!editor.has_position(NodeId(0)));
        assert_eq!(editor.len(), 1);
    }

    #[test]
    fn test_unplaced_node_sits_at_origin() {
        let ctx = egui::Context::default();
        let mut editor = NodeEditor::new("test");
        run(&ctx, &mut editor, &[node(4, 1)], &[], Vec::new());

        assert!(!editor.has_position(NodeId(4)));
        let rect = editor.node_screen_rect(NodeId(4)).unwrap();
        assert_eq!(rect.height(), node(4, 1).height());
    }

    #[test]
    fn test_drag_moves_node() {
        let ctx = egui::Context::default();
        let mut editor = NodeEditor::new("test");
        let start = Pos2::new(100.0, 100.0);
        editor.set_node_position(NodeId(0), start);
        let nodes = [node(0, 1)];

        run(&ctx, &mut editor, &nodes, &[], Vec::new());
        let grab = editor.node_screen_rect(NodeId(0)).unwrap().center_top() + Vec2::new(0.0, 10.0);

        let press = |pressed| Event::PointerButton {
            pos: grab,
            button: PointerButton::Primary,
            pressed,
            modifiers: Default::default(),
        };
        run(&ctx, &mut editor, &nodes, &[], vec![Event::PointerMoved(grab)]);
        run(&ctx, &mut editor, &nodes, &[], vec![press(true)]);
        run(&ctx, &mut editor, &nodes, &[], vec![Event::PointerMoved(grab + Vec2::new(30.0, 0.0))]);
        run(&ctx, &mut editor, &nodes, &[], vec![Event::PointerMoved(grab + Vec2::new(60.0, 0.0))]);
        run(&ctx, &mut editor, &nodes, &[], vec![press(false)]);

        let moved = editor.node_position(NodeId(0)).unwrap();
        assert!(moved.x > start.x);
        assert_eq!(moved.y, start.y);
    }
}
