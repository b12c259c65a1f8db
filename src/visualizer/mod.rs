//! Node-graph view of the operator chain
//!
//! [`ChainVisualizer`] draws every operator of a chain snapshot as a node,
//! with one output pin, one pin per declared input and a link per connected
//! input. Operator identity maps to a [`NodeId`] that never changes while the
//! operator stays registered, so node positions survive snapshots arriving in
//! a different order. New nodes are auto-placed in depth columns the first
//! time they are drawn; after that only the user moves them.

pub mod layout;
pub mod node_editor;
pub mod panels;
pub mod registry;

pub use node_editor::{EditorResponse, LinkSpec, NodeEditor, NodeSpec, PinSpec};
pub use registry::{input_attribute, output_attribute, AttributeId, NodeId, NodeRegistry, SyncReport};

use crate::chain::{OperatorDescriptor, OperatorHandle};
use crate::constants;
use crate::frame_input::FrameInput;
use crate::theme;
use log::debug;
use std::collections::HashSet;

/// Summary of one visualizer frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisualizerStats {
    pub nodes: usize,
    pub links: usize,
    /// Operators seen for the first time this frame
    pub newly_registered: usize,
}

/// Node-graph window for a running chain
#[derive(Debug, Default)]
pub struct ChainVisualizer {
    registry: NodeRegistry,
    editor: Option<NodeEditor>,
    /// Nodes whose surplus inputs were already reported
    truncated: HashSet<NodeId>,
}

impl ChainVisualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the node canvas; does nothing when already allocated
    pub fn initialize(&mut self) {
        if self.editor.is_none() {
            self.editor = Some(NodeEditor::new("chain_visualizer"));
            debug!("Chain visualizer initialized");
        }
    }

    /// Release the node canvas and forget every node
    pub fn shutdown(&mut self) {
        if self.editor.take().is_some() {
            debug!("Chain visualizer shut down");
        }
        self.registry.clear();
        self.truncated.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.editor.is_some()
    }

    pub fn node_id(&self, handle: OperatorHandle) -> Option<NodeId> {
        self.registry.node_id(handle)
    }

    pub fn is_positioned(&self, node: NodeId) -> bool {
        self.registry.is_positioned(node)
    }

    /// Grid-space position of a node on the canvas
    pub fn node_position(&self, node: NodeId) -> Option<egui::Pos2> {
        self.editor.as_ref().and_then(|editor| editor.node_position(node))
    }

    /// Draw the chain and its side windows into the open frame of `ctx`
    pub fn render(
        &mut self,
        ctx: &egui::Context,
        input: &FrameInput,
        operators: &[OperatorDescriptor],
    ) -> VisualizerStats {
        self.initialize();
        let report = self.registry.sync(operators);
        for id in &report.retired {
            self.truncated.remove(id);
            if let Some(editor) = self.editor.as_mut() {
                editor.remove_node(*id);
            }
        }
        let newly_registered = report.assigned.len();
        self.place_new_nodes(operators);

        let (nodes, links) = self.build_graph(operators);
        let stats = VisualizerStats {
            nodes: nodes.len(),
            links: links.len(),
            newly_registered,
        };

        panels::performance_window(ctx, input, operators.len());
        panels::controls_window(ctx);

        if let Some(editor) = self.editor.as_mut() {
            egui::Window::new("Chain Visualizer")
                .default_pos(egui::pos2(240.0, 10.0))
                .default_size(egui::vec2(900.0, 600.0))
                .show(ctx, |ui| {
                    if operators.is_empty() {
                        ui.colored_label(theme::colors().warning_text, "No operators registered.");
                        ui.label("Add operators to the chain to see them here.");
                    }
                    editor.show(ui, &nodes, &links);
                });
        }
        stats
    }

    fn place_new_nodes(&mut self, operators: &[OperatorDescriptor]) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let registry = &mut self.registry;

        let placements = layout::column_positions(operators, |handle| {
            registry
                .node_id(handle)
                .is_some_and(|id| !registry.is_positioned(id) && !editor.has_position(id))
        });
        for (handle, pos) in placements {
            if let Some(id) = registry.node_id(handle) {
                editor.set_node_position(id, pos);
            }
        }

        for op in operators {
            if let Some(id) = registry.node_id(op.handle) {
                registry.mark_positioned(id);
            }
        }
    }

    fn build_graph(&mut self, operators: &[OperatorDescriptor]) -> (Vec<NodeSpec>, Vec<LinkSpec>) {
        let mut nodes = Vec::with_capacity(operators.len());
        let mut links = Vec::new();

        for op in operators {
            let Some(id) = self.registry.node_id(op.handle) else {
                continue;
            };
            let Some(output) = output_attribute(id) else {
                debug!("Node {} has no representable attribute id, skipping '{}'", id, op.name);
                continue;
            };

            if op.input_count > constants::attribute::MAX_INPUTS && self.truncated.insert(id) {
                debug!(
                    "Operator '{}' has {} inputs, only the first {} are shown",
                    op.name,
                    op.input_count,
                    constants::attribute::MAX_INPUTS
                );
            }

            let inputs = (0..op.input_count)
                .map_while(|port| {
                    input_attribute(id, port).map(|attribute| PinSpec {
                        attribute,
                        label: if op.input_count == 1 {
                            "in".to_string()
                        } else {
                            format!("in {}", port)
                        },
                    })
                })
                .collect();

            for (port, source) in op.sources() {
                let start = self.registry.node_id(source).and_then(output_attribute);
                let (Some(start), Some(end)) = (start, input_attribute(id, port)) else {
                    continue;
                };
                links.push(LinkSpec {
                    id: links.len(),
                    start,
                    end,
                });
            }

            nodes.push(NodeSpec {
                id,
                title: op.name.clone(),
                subtitle: (op.type_name != op.name).then(|| op.type_name.clone()),
                lines: op.params.iter().map(ToString::to_string).collect(),
                inputs,
                output: PinSpec {
                    attribute: output,
                    label: "out".to_string(),
                },
                preview: op.preview,
                tint: theme::title_tint(op.output_kind),
            });
        }
        (nodes, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{Chain, OutputKind, ParamValue};

    fn input() -> FrameInput {
        FrameInput {
            width: 1280,
            height: 720,
            content_scale: 1.0,
            dt: 0.016,
            ..Default::default()
        }
    }

    fn frame(ctx: &egui::Context, visualizer: &mut ChainVisualizer, ops: &[OperatorDescriptor]) -> VisualizerStats {
        let raw = egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(1280.0, 720.0))),
            ..Default::default()
        };
        let mut stats = VisualizerStats::default();
        let _ = ctx.run(raw, |ctx| {
            stats = visualizer.render(ctx, &input(), ops);
        });
        stats
    }

    fn abc() -> (Chain, [OperatorHandle; 3]) {
        let mut chain = Chain::new();
        let a = chain.add("noise", 0);
        let b = chain.add("blur", 1);
        let c = chain.add("output", 1);
        chain.connect(a, b, 0).unwrap();
        chain.connect(b, c, 0).unwrap();
        (chain, [a, b, c])
    }

    #[test]
    fn test_node_ids_stable_across_reordering() {
        let ctx = egui::Context::default();
        let mut visualizer = ChainVisualizer::new();
        let (chain, [a, b, c]) = abc();
        let ops = chain.describe();

        let stats = frame(&ctx, &mut visualizer, &ops);
        assert_eq!(stats.newly_registered, 3);
        let ids = [a, b, c].map(|h| visualizer.node_id(h).unwrap());
        assert_eq!(ids, [NodeId(0), NodeId(1), NodeId(2)]);
        let positions = ids.map(|id| visualizer.node_position(id).unwrap());

        let reordered = vec![ops[2].clone(), ops[0].clone(), ops[1].clone()];
        for _ in 0..3 {
            let stats = frame(&ctx, &mut visualizer, &reordered);
            assert_eq!(stats.newly_registered, 0);
        }
        assert_eq!([a, b, c].map(|h| visualizer.node_id(h).unwrap()), ids);
        assert_eq!(ids.map(|id| visualizer.node_position(id).unwrap()), positions);
    }

    #[test]
    fn test_stats_count_nodes_and_links() {
        let ctx = egui::Context::default();
        let mut visualizer = ChainVisualizer::new();
        let (chain, _) = abc();

        let stats = frame(&ctx, &mut visualizer, &chain.describe());
        assert_eq!(
            stats,
            VisualizerStats {
                nodes: 3,
                links: 2,
                newly_registered: 3
            }
        );
    }

    #[test]
    fn test_new_nodes_are_placed_once() {
        let ctx = egui::Context::default();
        let mut visualizer = ChainVisualizer::new();
        let (mut chain, [a, b, _]) = abc();
        frame(&ctx, &mut visualizer, &chain.describe());

        let first = visualizer.node_id(a).unwrap();
        assert!(visualizer.is_positioned(first));
        let [x0, y0] = constants::layout::START;
        assert_eq!(visualizer.node_position(first), Some(egui::pos2(x0, y0)));

        // A second source lands in the first column, below the existing one
        let extra = chain.add("gradient", 0);
        chain.set_output_kind(extra, OutputKind::Value).unwrap();
        let stats = frame(&ctx, &mut visualizer, &chain.describe());
        assert_eq!(stats.newly_registered, 1);

        let extra_pos = visualizer.node_position(visualizer.node_id(extra).unwrap()).unwrap();
        assert_eq!(extra_pos.x, x0);
        assert!(extra_pos.y > y0);
        assert_eq!(
            visualizer.node_position(visualizer.node_id(b).unwrap()).unwrap().x,
            x0 + constants::layout::COLUMN_SPACING
        );
    }

    #[test]
    fn test_removed_operator_is_retired() {
        let ctx = egui::Context::default();
        let mut visualizer = ChainVisualizer::new();
        let (mut chain, [a, b, c]) = abc();
        frame(&ctx, &mut visualizer, &chain.describe());

        chain.remove(b);
        let stats = frame(&ctx, &mut visualizer, &chain.describe());
        assert_eq!(stats.nodes, 2);
        assert_eq!(stats.links, 0);
        assert_eq!(visualizer.node_id(b), None);

        let d = chain.add("blur", 1);
        frame(&ctx, &mut visualizer, &chain.describe());
        assert_eq!(visualizer.node_id(d), Some(NodeId(3)));
        assert_eq!(visualizer.node_id(a), Some(NodeId(0)));
        assert_eq!(visualizer.node_id(c), Some(NodeId(2)));
    }

    #[test]
    fn test_churn_leaves_no_stale_node_state() {
        let ctx = egui::Context::default();
        let mut visualizer = ChainVisualizer::new();
        let mut chain = Chain::new();
        let mut retired = Vec::new();

        for _ in 0..50 {
            let handle = chain.add("noise", 0);
            frame(&ctx, &mut visualizer, &chain.describe());
            let id = visualizer.node_id(handle).unwrap();
            assert!(visualizer.is_positioned(id));
            retired.push(id);

            chain.remove(handle);
            frame(&ctx, &mut visualizer, &chain.describe());
        }

        for id in retired {
            assert!(!visualizer.is_positioned(id));
            assert!(visualizer.node_position(id).is_none());
        }
        assert!(visualizer.editor.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_inputs_past_attribute_range_are_skipped() {
        let ctx = egui::Context::default();
        let mut visualizer = ChainVisualizer::new();
        let mut chain = Chain::new();
        let src = chain.add("noise", 0);
        let mixer = chain.add("mixer", 120);
        chain.connect(src, mixer, 3).unwrap();
        chain.connect(src, mixer, 110).unwrap();

        let stats = frame(&ctx, &mut visualizer, &chain.describe());
        assert_eq!(stats.links, 1);

        let (nodes, _) = visualizer.build_graph(&chain.describe());
        let mixer_node = nodes.iter().find(|n| n.title == "mixer").unwrap();
        assert_eq!(mixer_node.inputs.len(), constants::attribute::MAX_INPUTS);
    }

    #[test]
    fn test_node_content() {
        let mut visualizer = ChainVisualizer::new();
        let handle = OperatorHandle::new(0, 0);
        let ops = vec![OperatorDescriptor::new(handle, "bg")
            .with_type_name("Gradient")
            .with_inputs(2)
            .with_output_kind(OutputKind::Geometry)
            .with_param("angle", ParamValue::Float(0.25))];
        visualizer.registry.sync(&ops);

        let (nodes, links) = visualizer.build_graph(&ops);
        let node = &nodes[0];
        assert!(links.is_empty());
        assert_eq!(node.subtitle.as_deref(), Some("Gradient"));
        assert_eq!(node.lines, vec!["angle: 0.25".to_string()]);
        assert_eq!(node.inputs[1].label, "in 1");
        assert_eq!(node.inputs[1].attribute, AttributeId(2));
        assert_eq!(node.output.attribute, AttributeId(0));
        assert_eq!(node.tint, theme::title_tint(OutputKind::Geometry));
    }

    #[test]
    fn test_lazy_initialize_and_shutdown() {
        let ctx = egui::Context::default();
        let mut visualizer = ChainVisualizer::new();
        assert!(!visualizer.is_initialized());

        let stats = frame(&ctx, &mut visualizer, &[]);
        assert_eq!(stats, VisualizerStats::default());
        assert!(visualizer.is_initialized());

        let (chain, [a, _, _]) = abc();
        frame(&ctx, &mut visualizer, &chain.describe());
        visualizer.shutdown();
        assert!(!visualizer.is_initialized());
        assert_eq!(visualizer.node_id(a), None);

        visualizer.initialize();
        visualizer.initialize();
        assert!(visualizer.is_initialized());
    }
}
