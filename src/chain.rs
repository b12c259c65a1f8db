//! Operator chain model
//!
//! The running pipeline is owned elsewhere; this module describes it in the
//! form the visualizer consumes. [`Chain`] hands out generational
//! [`OperatorHandle`]s: a slot index plus a generation bumped whenever the
//! slot is freed, so a handle to a removed operator never aliases the
//! operator that later reuses its slot.

use crate::error::ChainError;
use std::fmt;

/// Stable identity of one registered operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorHandle {
    index: u32,
    generation: u32,
}

impl OperatorHandle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for OperatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

/// What an operator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputKind {
    #[default]
    Texture,
    Value,
    ValueArray,
    Geometry,
    Camera,
    Light,
    Other,
}

/// Current value of one operator parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Color([f32; 3]),
    Text(String),
}

/// Named parameter shown inside a node
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    pub name: String,
    pub value: ParamValue,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl fmt::Display for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.name;
        match &self.value {
            ParamValue::Float(v) => write!(f, "{}: {:.2}", name, v),
            ParamValue::Int(v) => write!(f, "{}: {}", name, v),
            ParamValue::Bool(v) => write!(f, "{}: {}", name, v),
            ParamValue::Vec2([x, y]) => write!(f, "{}: ({:.2}, {:.2})", name, x, y),
            ParamValue::Vec3([x, y, z]) | ParamValue::Color([x, y, z]) => {
                write!(f, "{}: ({:.2}, {:.2}, {:.2})", name, x, y, z)
            }
            ParamValue::Vec4([x, y, z, w]) => {
                write!(f, "{}: ({:.2}, {:.2}, {:.2}, {:.2})", name, x, y, z, w)
            }
            ParamValue::Text(v) => write!(f, "{}: {}", name, v),
        }
    }
}

/// Snapshot of one pipeline stage as the visualizer sees it
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDescriptor {
    pub handle: OperatorHandle,
    /// Name the operator was registered under
    pub name: String,
    /// Operator type, shown when it differs from `name`
    pub type_name: String,
    /// Declared number of inputs
    pub input_count: usize,
    /// `inputs[i] = Some(src)` when the output of `src` feeds input `i`
    pub inputs: Vec<Option<OperatorHandle>>,
    pub output_kind: OutputKind,
    pub params: Vec<ParamDescriptor>,
    /// Output thumbnail, already registered with the renderer
    pub preview: Option<egui::TextureId>,
}

impl OperatorDescriptor {
    pub fn new(handle: OperatorHandle, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            handle,
            type_name: name.clone(),
            name,
            input_count: 0,
            inputs: Vec::new(),
            output_kind: OutputKind::default(),
            params: Vec::new(),
            preview: None,
        }
    }

    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Declare `count` inputs, all unconnected
    pub fn with_inputs(mut self, count: usize) -> Self {
        self.input_count = count;
        self.inputs = vec![None; count];
        self
    }

    /// Feed input `input` from `source`, growing the input list when needed
    pub fn with_source(mut self, input: usize, source: OperatorHandle) -> Self {
        if input >= self.inputs.len() {
            self.inputs.resize(input + 1, None);
            self.input_count = self.input_count.max(input + 1);
        }
        self.inputs[input] = Some(source);
        self
    }

    pub fn with_output_kind(mut self, kind: OutputKind) -> Self {
        self.output_kind = kind;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.params.push(ParamDescriptor::new(name, value));
        self
    }

    pub fn with_preview(mut self, texture: egui::TextureId) -> Self {
        self.preview = Some(texture);
        self
    }

    /// Connected inputs as `(input index, source)` pairs
    pub fn sources(&self) -> impl Iterator<Item = (usize, OperatorHandle)> + '_ {
        self.inputs
            .iter()
            .enumerate()
            .filter_map(|(i, src)| src.map(|src| (i, src)))
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    operator: Option<OperatorDescriptor>,
}

/// Registry of the operators making up a running chain
#[derive(Debug, Clone, Default)]
pub struct Chain {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Registration order, used for snapshots
    order: Vec<OperatorHandle>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an operator with `input_count` unconnected inputs
    pub fn add(&mut self, name: impl Into<String>, input_count: usize) -> OperatorHandle {
        let (index, generation) = match self.free.pop() {
            Some(index) => (index, self.slots[index as usize].generation),
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    operator: None,
                });
                ((self.slots.len() - 1) as u32, 0)
            }
        };

        let handle = OperatorHandle::new(index, generation);
        let operator = OperatorDescriptor::new(handle, name).with_inputs(input_count);
        self.slots[index as usize].operator = Some(operator);
        self.order.push(handle);
        handle
    }

    /// Unregister an operator and disconnect everything it fed
    pub fn remove(&mut self, handle: OperatorHandle) -> Option<OperatorDescriptor> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation || slot.operator.is_none() {
            return None;
        }

        let removed = slot.operator.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.order.retain(|h| *h != handle);

        for op in self.slots.iter_mut().filter_map(|s| s.operator.as_mut()) {
            for input in op.inputs.iter_mut() {
                if *input == Some(handle) {
                    *input = None;
                }
            }
        }
        removed
    }

    pub fn get(&self, handle: OperatorHandle) -> Option<&OperatorDescriptor> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.operator.as_ref())
    }

    fn get_mut(&mut self, handle: OperatorHandle) -> Result<&mut OperatorDescriptor, ChainError> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.operator.as_mut())
            .ok_or(ChainError::UnknownOperator(handle))
    }

    pub fn contains(&self, handle: OperatorHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Feed `input` of `target` from the output of `source`
    pub fn connect(
        &mut self,
        source: OperatorHandle,
        target: OperatorHandle,
        input: usize,
    ) -> Result<(), ChainError> {
        if source == target {
            return Err(ChainError::SelfConnection(source));
        }
        if !self.contains(source) {
            return Err(ChainError::UnknownOperator(source));
        }

        let op = self.get_mut(target)?;
        if input >= op.input_count {
            return Err(ChainError::InputOutOfRange {
                operator: target,
                input,
                count: op.input_count,
            });
        }
        op.inputs[input] = Some(source);
        Ok(())
    }

    /// Clear `input` of `target`, returning the previous source
    pub fn disconnect(
        &mut self,
        target: OperatorHandle,
        input: usize,
    ) -> Result<Option<OperatorHandle>, ChainError> {
        let op = self.get_mut(target)?;
        let count = op.input_count;
        op.inputs
            .get_mut(input)
            .map(Option::take)
            .ok_or(ChainError::InputOutOfRange {
                operator: target,
                input,
                count,
            })
    }

    pub fn set_type_name(&mut self, handle: OperatorHandle, type_name: impl Into<String>) -> Result<(), ChainError> {
        self.get_mut(handle)?.type_name = type_name.into();
        Ok(())
    }

    pub fn set_output_kind(&mut self, handle: OperatorHandle, kind: OutputKind) -> Result<(), ChainError> {
        self.get_mut(handle)?.output_kind = kind;
        Ok(())
    }

    /// Replace the displayed parameters of an operator
    pub fn set_params(&mut self, handle: OperatorHandle, params: Vec<ParamDescriptor>) -> Result<(), ChainError> {
        self.get_mut(handle)?.params = params;
        Ok(())
    }

    pub fn set_preview(
        &mut self,
        handle: OperatorHandle,
        preview: Option<egui::TextureId>,
    ) -> Result<(), ChainError> {
        self.get_mut(handle)?.preview = preview;
        Ok(())
    }

    /// Snapshot of every registered operator, in registration order
    pub fn describe(&self) -> Vec<OperatorDescriptor> {
        self.order
            .iter()
            .filter_map(|handle| self.get(*handle))
            .cloned()
            .collect()
    }
}
