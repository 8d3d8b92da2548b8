/// Binding layout description (root signature equivalent)
///
/// A binding layout is a list of numbered binding-table slots. Each slot
/// points into one resource-view heap and declares which descriptor ranges
/// of that heap the shaders of one stage read.

use std::hash::{Hash, Hasher};
use bitflags::bitflags;
use rustc_hash::FxHasher;
use crate::native::ResourceHeapType;

bitflags! {
    /// Shader stages that can see a binding-table slot
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShaderVisibility: u32 {
        const VERTEX = 0x01;
        const PIXEL = 0x02;
        const GEOMETRY = 0x04;
    }
}

/// Kind of a bound shader resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ConstantBuffer,
    Texture,
    Sampler,
}

impl ResourceKind {
    /// Heap type views of this kind live in
    pub fn heap_type(&self) -> ResourceHeapType {
        match self {
            ResourceKind::ConstantBuffer | ResourceKind::Texture => ResourceHeapType::ConstantTexture,
            ResourceKind::Sampler => ResourceHeapType::Sampler,
        }
    }
}

/// A run of views of one kind inside a heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    pub kind: ResourceKind,
    /// First shader register the range maps to
    pub base_register: u32,
    /// Number of views
    pub count: u32,
    /// Offset (in views) from the start of the heap bound at the slot
    pub offset_in_heap: u32,
}

/// One binding-table slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BindingTableDesc {
    pub heap_type: ResourceHeapType,
    pub visibility: ShaderVisibility,
    pub ranges: Vec<DescriptorRange>,
}

/// Full binding layout: slot `i` is `tables[i]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BindingLayoutDesc {
    pub tables: Vec<BindingTableDesc>,
    /// Whether the input assembler feeds vertex data (false for full-screen passes)
    pub allow_input_assembler: bool,
}

impl BindingLayoutDesc {
    /// Hash of the layout structure (slots, ranges, visibility), not of any bound content
    ///
    /// FxHash is deterministic, so the value is stable across runs.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Number of binding-table slots
    pub fn slot_count(&self) -> u32 {
        self.tables.len() as u32
    }
}
