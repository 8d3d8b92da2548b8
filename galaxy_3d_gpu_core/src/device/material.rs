/// Material resource bindings
///
/// A material names the concrete resources behind the shader resources
/// reflection reports. `RenderDevice::create_material_binding` turns that
/// mapping into filled resource-view heaps matching the combination's
/// `GpuResourceTable`, ready to be set on the table before each draw.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::device::RenderDevice;
use crate::engine_error;
use crate::error::{Error, Result};
use crate::native::{
    NativeBuffer, NativeResourceHeap, NativeTexture, ResourceHeapDesc, ResourceKind,
    ResourceView, SamplerDesc,
};
use crate::pipeline::GpuResourceTable;
use crate::shader::{ShaderCombination, ShaderCombinationKey};

/// A concrete resource bound to a shader resource name
#[derive(Clone)]
pub enum BoundResource {
    ConstantBuffer(Arc<dyn NativeBuffer>),
    Texture(Arc<dyn NativeTexture>),
    Sampler(SamplerDesc),
}

impl BoundResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            BoundResource::ConstantBuffer(_) => ResourceKind::ConstantBuffer,
            BoundResource::Texture(_) => ResourceKind::Texture,
            BoundResource::Sampler(_) => ResourceKind::Sampler,
        }
    }
}

/// Name → resource mapping supplied by the material owner
#[derive(Clone, Default)]
pub struct ResourceBindings {
    resources: FxHashMap<String, BoundResource>,
}

impl ResourceBindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constant_buffer(mut self, name: impl Into<String>, buffer: Arc<dyn NativeBuffer>) -> Self {
        self.insert(name, BoundResource::ConstantBuffer(buffer));
        self
    }

    pub fn with_texture(mut self, name: impl Into<String>, texture: Arc<dyn NativeTexture>) -> Self {
        self.insert(name, BoundResource::Texture(texture));
        self
    }

    pub fn with_sampler(mut self, name: impl Into<String>, sampler: SamplerDesc) -> Self {
        self.insert(name, BoundResource::Sampler(sampler));
        self
    }

    /// Bind `resource` under `name`, replacing any previous binding
    pub fn insert(&mut self, name: impl Into<String>, resource: BoundResource) {
        self.resources.insert(name.into(), resource);
    }

    pub fn get(&self, name: &str) -> Option<&BoundResource> {
        self.resources.get(name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Filled heaps for one material on one shader combination
pub struct MaterialBinding {
    combination: ShaderCombinationKey,
    /// One heap per required heap of the table, same order
    heaps: Vec<Arc<dyn NativeResourceHeap>>,
    /// (binding-table slot, index into `heaps`)
    assignments: Vec<(u32, usize)>,
}

impl MaterialBinding {
    pub fn combination(&self) -> ShaderCombinationKey {
        self.combination
    }

    pub fn heaps(&self) -> &[Arc<dyn NativeResourceHeap>] {
        &self.heaps
    }

    /// Set this material's heaps on every slot of `table`
    ///
    /// # Panics
    ///
    /// Panics if `table` was derived from another shader combination.
    pub fn bind_to(&self, table: &mut GpuResourceTable) {
        assert_eq!(
            table.combination(), self.combination,
            "material binding applied to a resource table of another shader combination"
        );
        for &(slot, heap) in &self.assignments {
            table.set(slot, self.heaps[heap].clone());
        }
    }
}

fn invalid(message: String) -> Error {
    engine_error!("galaxy3d::RenderDevice", "{}", message);
    Error::InvalidResource(message)
}

impl RenderDevice {
    /// Build the heaps a material needs for `shaders`
    ///
    /// Every resource reflection reports must be bound by name in
    /// `bindings`, with a matching kind; otherwise `InvalidResource` is
    /// returned and no heap is created.
    pub fn create_material_binding(&mut self, shaders: &ShaderCombination, bindings: &ResourceBindings) -> Result<MaterialBinding> {
        let key = self.resource_table_for(shaders);
        let table = &self.resource_tables[key];

        // Resolve everything before creating native objects
        let mut resolved = Vec::with_capacity(table.num_required_heaps());
        for required in table.required_heaps() {
            let mut views = Vec::with_capacity(required.entries().len());
            for entry in required.entries() {
                let name = &entry.resource.name;
                let bound = bindings.get(name).ok_or_else(|| invalid(format!(
                    "No resource bound for '{}' ({:?} shader)", name, entry.stage
                )))?;
                if bound.kind() != entry.resource.kind {
                    return Err(invalid(format!(
                        "'{}' is a {:?} but a {:?} was bound", name, entry.resource.kind, bound.kind()
                    )));
                }
                if let (BoundResource::ConstantBuffer(buffer), Some(layout)) = (bound, &entry.resource.constant_buffer) {
                    if buffer.size() < layout.size as u64 {
                        return Err(invalid(format!(
                            "Buffer bound to '{}' is {} bytes, shader reads {}", name, buffer.size(), layout.size
                        )));
                    }
                }
                views.push((entry.offset, bound, entry.resource.constant_buffer.as_ref().map(|l| l.size as u64)));
            }
            resolved.push((required, views));
        }

        let mut heaps = Vec::with_capacity(resolved.len());
        let mut assignments = Vec::new();
        for (index, (required, views)) in resolved.into_iter().enumerate() {
            let heap = self.create_resource_heap(&ResourceHeapDesc {
                heap_type: required.heap_type(),
                capacity: required.capacity(),
                shader_visible: true,
            })?;

            for (offset, bound, cb_size) in views {
                let view = match bound {
                    BoundResource::ConstantBuffer(buffer) => ResourceView::ConstantBuffer {
                        buffer: buffer.as_ref(),
                        size: cb_size.unwrap_or_else(|| buffer.size()),
                    },
                    BoundResource::Texture(texture) => ResourceView::Texture(texture.as_ref()),
                    BoundResource::Sampler(desc) => ResourceView::Sampler(*desc),
                };
                heap.write_view(offset, &view)?;
            }

            assignments.extend(required.slots().iter().map(|slot| (*slot, index)));
            heaps.push(heap);
        }

        Ok(MaterialBinding {
            combination: shaders.key(),
            heaps,
            assignments,
        })
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
