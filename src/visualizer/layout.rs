//! Automatic placement of newly registered nodes
//!
//! Nodes are arranged in columns by depth, the longest distance from a
//! source operator, and stacked top to bottom inside each column.

use crate::chain::{OperatorDescriptor, OperatorHandle};
use crate::constants;
use crate::theme;
use egui::Pos2;
use std::collections::{HashMap, HashSet};

/// Height a node will occupy, from its title, parameters, pins and preview
pub fn estimate_node_height(op: &OperatorDescriptor) -> f32 {
    let dims = theme::dimensions();
    let mut height = dims.title_height;

    if op.type_name != op.name {
        height += dims.line_height;
    }
    if !op.params.is_empty() {
        height += dims.separator_spacing + op.params.len() as f32 * dims.line_height;
    }
    height += op.input_count.min(constants::attribute::MAX_INPUTS) as f32 * dims.pin_row_height;
    height += match op.preview {
        Some(_) => dims.preview_size.y + 4.0,
        None => dims.placeholder_height + 14.0,
    };
    height += dims.pin_row_height;
    height + dims.node_padding.y * 2.0
}

/// Depth of every operator; sources outside the snapshot are ignored and
/// cycles are cut where they are first found
pub fn depths(operators: &[OperatorDescriptor]) -> HashMap<OperatorHandle, usize> {
    let by_handle: HashMap<OperatorHandle, &OperatorDescriptor> =
        operators.iter().map(|op| (op.handle, op)).collect();
    let mut memo = HashMap::new();
    let mut visiting = HashSet::new();

    for op in operators {
        depth_of(op.handle, &by_handle, &mut memo, &mut visiting);
    }
    memo
}

fn depth_of(
    handle: OperatorHandle,
    by_handle: &HashMap<OperatorHandle, &OperatorDescriptor>,
    memo: &mut HashMap<OperatorHandle, usize>,
    visiting: &mut HashSet<OperatorHandle>,
) -> usize {
    if let Some(depth) = memo.get(&handle) {
        return *depth;
    }
    if !visiting.insert(handle) {
        return 0;
    }

    let mut depth = 0;
    if let Some(op) = by_handle.get(&handle) {
        for (_, source) in op.sources() {
            if by_handle.contains_key(&source) {
                depth = depth.max(depth_of(source, by_handle, memo, visiting) + 1);
            }
        }
    }

    visiting.remove(&handle);
    memo.insert(handle, depth);
    depth
}

/// Grid-space positions for the operators `needs_position` selects
///
/// Already placed operators still take up room in their column, so new
/// nodes stack below them instead of on top.
pub fn column_positions(
    operators: &[OperatorDescriptor],
    needs_position: impl Fn(OperatorHandle) -> bool,
) -> Vec<(OperatorHandle, Pos2)> {
    let depths = depths(operators);
    let [start_x, start_y] = constants::layout::START;
    let mut column_y: HashMap<usize, f32> = HashMap::new();
    let mut positions = Vec::new();

    for op in operators {
        let depth = depths.get(&op.handle).copied().unwrap_or(0);
        let y = column_y.entry(depth).or_insert(start_y);

        if needs_position(op.handle) {
            let x = start_x + depth as f32 * constants::layout::COLUMN_SPACING;
            positions.push((op.handle, Pos2::new(x, *y)));
        }
        *y += estimate_node_height(op) + constants::layout::VERTICAL_PADDING;
    }
    positions
}
