//! Operator identity to visual node identity
//!
//! Node ids come from a monotonic counter, so an id is never handed out
//! twice even after its operator leaves the chain.

use crate::chain::{OperatorDescriptor, OperatorHandle};
use crate::constants;
use std::collections::{HashMap, HashSet};
use log::debug;
use std::fmt;

/// Stable visual identifier of one operator node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one node port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(pub u32);

/// Attribute of a node's single output port, `None` once the id no longer fits
pub fn output_attribute(node: NodeId) -> Option<AttributeId> {
    node.0.checked_mul(constants::attribute::STRIDE).map(AttributeId)
}

/// Attribute of input `port`, `None` past the encodable input range
pub fn input_attribute(node: NodeId, port: usize) -> Option<AttributeId> {
    if port >= constants::attribute::MAX_INPUTS {
        return None;
    }
    output_attribute(node)?
        .0
        .checked_add(port as u32 + 1)
        .map(AttributeId)
}

/// Node ids gained and lost by one [`NodeRegistry::sync`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Newly assigned, in snapshot order
    pub assigned: Vec<NodeId>,
    pub retired: Vec<NodeId>,
}

/// Identity map from operator handles to node ids
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    ids: HashMap<OperatorHandle, NodeId>,
    positioned: HashSet<NodeId>,
    next_id: u32,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register unseen operators and retire those missing from `operators`
    pub fn sync(&mut self, operators: &[OperatorDescriptor]) -> SyncReport {
        let live: HashSet<OperatorHandle> = operators.iter().map(|op| op.handle).collect();
        let mut report = SyncReport::default();

        self.ids.retain(|handle, id| {
            let keep = live.contains(handle);
            if !keep {
                report.retired.push(*id);
            }
            keep
        });
        for id in &report.retired {
            self.positioned.remove(id);
        }
        if !report.retired.is_empty() {
            debug!("Retired {} operator node(s)", report.retired.len());
        }

        for op in operators {
            if self.ids.contains_key(&op.handle) {
                continue;
            }
            let id = NodeId(self.next_id);
            self.next_id += 1;
            self.ids.insert(op.handle, id);
            report.assigned.push(id);
            debug!("Operator '{}' ({}) registered as node {}", op.name, op.handle, id);
        }
        report
    }

    pub fn node_id(&self, handle: OperatorHandle) -> Option<NodeId> {
        self.ids.get(&handle).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether the node has already received a position
    pub fn is_positioned(&self, node: NodeId) -> bool {
        self.positioned.contains(&node)
    }

    pub fn mark_positioned(&mut self, node: NodeId) {
        self.positioned.insert(node);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
