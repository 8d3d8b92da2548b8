/// Resource-view heaps: contiguous blocks of GPU-visible views
///
/// A heap is bound to the command list as a whole, then binding-table slots
/// point at addresses inside it. Constant-buffer and texture views share one
/// heap type; samplers live in a heap type of their own.

use std::any::Any;
use crate::error::Result;
use crate::native::{NativeBuffer, NativeTexture};

/// Heap type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceHeapType {
    /// Constant-buffer and texture views
    ConstantTexture,
    /// Sampler views
    Sampler,
}

/// Descriptor for creating a resource-view heap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHeapDesc {
    pub heap_type: ResourceHeapType,
    /// Number of view slots
    pub capacity: u32,
    /// Whether shaders can read the heap (false for CPU staging heaps)
    pub shader_visible: bool,
}

/// GPU-visible address of a view inside a heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GpuDescriptorHandle(pub u64);

/// Texture filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Point,
    Linear,
    Anisotropic,
}

/// Texture coordinate addressing outside [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    Wrap,
    Mirror,
    Clamp,
    Border,
}

/// Sampler description (samplers are views, not resources)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerDesc {
    pub filter: FilterMode,
    pub address_mode: AddressMode,
    pub max_anisotropy: u32,
}

impl Default for SamplerDesc {
    fn default() -> Self {
        Self {
            filter: FilterMode::Linear,
            address_mode: AddressMode::Wrap,
            max_anisotropy: 1,
        }
    }
}

/// A view written into a heap slot
pub enum ResourceView<'a> {
    /// Constant-buffer view over the first `size` bytes of a buffer
    ConstantBuffer { buffer: &'a dyn NativeBuffer, size: u64 },
    /// Shader-resource view of a whole texture
    Texture(&'a dyn NativeTexture),
    /// Sampler
    Sampler(SamplerDesc),
}

/// Resource-view heap trait
///
/// Heaps are shared (`Arc`) between the material that filled them and the
/// resource tables that bind them, so writes go through `&self`.
pub trait NativeResourceHeap: Send + Sync {
    fn heap_type(&self) -> ResourceHeapType;

    /// Number of view slots
    fn capacity(&self) -> u32;

    /// GPU-visible address of slot 0
    fn gpu_start(&self) -> GpuDescriptorHandle;

    /// Distance in bytes between two consecutive slots
    fn increment_size(&self) -> u32;

    /// Write a view at `index`
    fn write_view(&self, index: u32, view: &ResourceView<'_>) -> Result<()>;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}
