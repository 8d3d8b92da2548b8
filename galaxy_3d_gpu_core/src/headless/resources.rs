/// Headless buffers, textures, heaps, pipelines and binding layouts

use std::any::Any;
use std::sync::Mutex;
use crate::engine_bail;
use crate::error::Result;
use crate::native::{
    NativeBuffer, NativeTexture, NativeResource, NativeResourceHeap, NativePipeline,
    NativeBindingLayout, BindingLayoutDesc, BufferUsage, TextureInfo, ResourceHeapType,
    ResourceView, GpuDescriptorHandle, SamplerDesc,
};
use crate::shader::ShaderCombinationKey;

/// Distance between two heap slots
pub const HEADLESS_VIEW_INCREMENT: u32 = 32;

// ============================================================================
// Buffer
// ============================================================================

pub struct HeadlessBuffer {
    address: u64,
    usage: BufferUsage,
    debug_name: String,
    data: Mutex<Vec<u8>>,
}

impl HeadlessBuffer {
    pub(crate) fn new(address: u64, size: u64, usage: BufferUsage, debug_name: String) -> Self {
        Self {
            address,
            usage,
            debug_name,
            data: Mutex::new(vec![0u8; size as usize]),
        }
    }

    /// Copy of the buffer bytes
    pub fn contents(&self) -> Vec<u8> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

impl NativeResource for HeadlessBuffer {
    fn gpu_address(&self) -> u64 {
        self.address
    }

    fn debug_name(&self) -> &str {
        &self.debug_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NativeBuffer for HeadlessBuffer {
    fn size(&self) -> u64 {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len() as u64
    }

    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let end = offset + data.len() as u64;
        if end > bytes.len() as u64 {
            engine_bail!("galaxy3d::HeadlessBuffer",
                "Write at offset {} with size {} exceeds buffer '{}' size {}",
                offset, data.len(), self.debug_name, bytes.len());
        }
        bytes[offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }

    fn as_resource(&self) -> &dyn NativeResource {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Texture
// ============================================================================

pub struct HeadlessTexture {
    address: u64,
    info: TextureInfo,
    debug_name: String,
}

impl HeadlessTexture {
    pub(crate) fn new(address: u64, info: TextureInfo, debug_name: String) -> Self {
        Self { address, info, debug_name }
    }
}

impl NativeResource for HeadlessTexture {
    fn gpu_address(&self) -> u64 {
        self.address
    }

    fn debug_name(&self) -> &str {
        &self.debug_name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl NativeTexture for HeadlessTexture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_resource(&self) -> &dyn NativeResource {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Resource-view heap
// ============================================================================

/// A view as written into a headless heap
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WrittenView {
    ConstantBuffer { address: u64, size: u64 },
    Texture { address: u64 },
    Sampler(SamplerDesc),
}

pub struct HeadlessResourceHeap {
    id: u64,
    heap_type: ResourceHeapType,
    gpu_start: GpuDescriptorHandle,
    views: Mutex<Vec<Option<WrittenView>>>,
}

impl HeadlessResourceHeap {
    pub(crate) fn new(id: u64, heap_type: ResourceHeapType, capacity: u32, gpu_start: GpuDescriptorHandle) -> Self {
        Self {
            id,
            heap_type,
            gpu_start,
            views: Mutex::new(vec![None; capacity as usize]),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// View written at `index`, if any
    pub fn view(&self, index: u32) -> Option<WrittenView> {
        self.views
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(index as usize)
            .copied()
            .flatten()
    }
}

impl NativeResourceHeap for HeadlessResourceHeap {
    fn heap_type(&self) -> ResourceHeapType {
        self.heap_type
    }

    fn capacity(&self) -> u32 {
        self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len() as u32
    }

    fn gpu_start(&self) -> GpuDescriptorHandle {
        self.gpu_start
    }

    fn increment_size(&self) -> u32 {
        HEADLESS_VIEW_INCREMENT
    }

    fn write_view(&self, index: u32, view: &ResourceView<'_>) -> Result<()> {
        let written = match view {
            ResourceView::ConstantBuffer { buffer, size } => {
                if self.heap_type != ResourceHeapType::ConstantTexture {
                    engine_bail!("galaxy3d::HeadlessResourceHeap", "Constant-buffer view written into a sampler heap");
                }
                WrittenView::ConstantBuffer { address: buffer.as_resource().gpu_address(), size: *size }
            }
            ResourceView::Texture(texture) => {
                if self.heap_type != ResourceHeapType::ConstantTexture {
                    engine_bail!("galaxy3d::HeadlessResourceHeap", "Texture view written into a sampler heap");
                }
                WrittenView::Texture { address: texture.as_resource().gpu_address() }
            }
            ResourceView::Sampler(desc) => {
                if self.heap_type != ResourceHeapType::Sampler {
                    engine_bail!("galaxy3d::HeadlessResourceHeap", "Sampler written into a constant/texture heap");
                }
                WrittenView::Sampler(*desc)
            }
        };

        let mut views = self.views.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let capacity = views.len();
        match views.get_mut(index as usize) {
            Some(slot) => {
                *slot = Some(written);
                Ok(())
            }
            None => engine_bail!("galaxy3d::HeadlessResourceHeap",
                "View index {} out of bounds (capacity: {})", index, capacity),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ============================================================================
// Pipeline and binding layout
// ============================================================================

#[derive(Debug)]
pub struct HeadlessPipeline {
    pub id: u64,
    pub state_hash: u64,
    pub layout_hash: u64,
    pub shaders: ShaderCombinationKey,
}

impl NativePipeline for HeadlessPipeline {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
pub struct HeadlessBindingLayout {
    pub id: u64,
    desc: BindingLayoutDesc,
}

impl HeadlessBindingLayout {
    pub(crate) fn new(id: u64, desc: BindingLayoutDesc) -> Self {
        Self { id, desc }
    }
}

impl NativeBindingLayout for HeadlessBindingLayout {
    fn desc(&self) -> &BindingLayoutDesc {
        &self.desc
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
