/// Buffer trait, buffer descriptor and input-assembler views

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::native::NativeResource;

/// Buffer usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Constant buffer (read through a constant-buffer view)
    Constant,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Usage
    pub usage: BufferUsage,
    /// Name used in logs and debugger captures
    pub debug_name: String,
}

/// Buffer resource trait
///
/// Buffers live in CPU-writable memory; `update` copies bytes into them.
/// The buffer is destroyed when the last Arc is dropped.
pub trait NativeBuffer: Send + Sync {
    /// Size in bytes
    fn size(&self) -> u64;

    /// Usage the buffer was created for
    fn usage(&self) -> BufferUsage;

    /// Copy `data` into the buffer at `offset`
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// This buffer as a barrier subject
    fn as_resource(&self) -> &dyn NativeResource;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Index buffer element format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit indices (max 65535 vertices)
    #[default]
    U16,
    /// 32-bit indices
    U32,
}

impl IndexFormat {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// A vertex buffer bound to an input slot
#[derive(Clone)]
pub struct VertexBufferView {
    pub buffer: Arc<dyn NativeBuffer>,
    /// Byte offset of the first vertex
    pub offset: u64,
    /// Bytes between consecutive vertices
    pub stride: u32,
}

impl VertexBufferView {
    /// Number of whole vertices visible through this view
    pub fn vertex_count(&self) -> u32 {
        if self.stride == 0 {
            return 0;
        }
        (self.buffer.size().saturating_sub(self.offset) / self.stride as u64) as u32
    }
}

/// An index buffer binding
#[derive(Clone)]
pub struct IndexBufferView {
    pub buffer: Arc<dyn NativeBuffer>,
    /// Byte offset of the first index
    pub offset: u64,
    pub format: IndexFormat,
}

impl IndexBufferView {
    /// Number of whole indices visible through this view
    pub fn index_count(&self) -> u32 {
        (self.buffer.size().saturating_sub(self.offset) / self.format.size_bytes() as u64) as u32
    }
}
