/// GPU resource tables
///
/// A `GpuResourceTable` is derived once per shader combination. It walks
/// the bound stages in priority order (vertex, pixel, geometry) and packs
/// their reflected resources into at most two heaps:
///
/// - the constant/texture heap: each stage's constant buffers, then its textures
/// - the sampler heap: each stage's samplers
///
/// Every (stage, heap type) pair contributing at least one resource gets
/// its own binding-table slot, visible to that stage only. Resources are
/// numbered sequentially within their heap; a slot's ranges carry those
/// absolute offsets, so binding a heap's start address at each of its
/// slots is enough to expose every resource.

use std::sync::Arc;
use crate::command::PooledCommandList;
use crate::native::{
    BindingLayoutDesc, BindingTableDesc, DescriptorRange, NativeResourceHeap,
    ResourceHeapType, ResourceKind,
};
use crate::shader::{BoundResourceDescriptor, ShaderCombination, ShaderCombinationKey, ShaderStage};

/// One resource packed into a required heap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapEntry {
    /// Stage whose reflection declared the resource
    pub stage: ShaderStage,
    /// Index of the view inside the heap
    pub offset: u32,
    pub resource: BoundResourceDescriptor,
}

/// A heap the combination needs, and the binding-table slots that read it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredResourceHeap {
    heap_type: ResourceHeapType,
    entries: Vec<HeapEntry>,
    slots: Vec<u32>,
}

impl RequiredResourceHeap {
    pub fn heap_type(&self) -> ResourceHeapType {
        self.heap_type
    }

    /// Resources in heap order (entry `i` lives at view index `i`)
    pub fn entries(&self) -> &[HeapEntry] {
        &self.entries
    }

    /// Binding-table slots pointing into this heap
    pub fn slots(&self) -> &[u32] {
        &self.slots
    }

    /// Number of views the heap must hold
    pub fn capacity(&self) -> u32 {
        self.entries.len() as u32
    }
}

/// Resource heap layout and per-draw heap bindings for one shader combination
pub struct GpuResourceTable {
    combination: ShaderCombinationKey,
    heaps: Vec<RequiredResourceHeap>,
    layout: BindingLayoutDesc,
    layout_hash: u64,
    /// Heap currently satisfying each binding-table slot
    slot_heaps: Vec<Option<Arc<dyn NativeResourceHeap>>>,
    /// Distinct heaps among `slot_heaps`, in first-set order
    bound_heaps: Vec<Arc<dyn NativeResourceHeap>>,
}

impl GpuResourceTable {
    /// Derive the table for `shaders`
    pub fn new(shaders: &ShaderCombination) -> Self {
        let mut tables = Vec::new();
        let mut constant_texture = RequiredResourceHeap {
            heap_type: ResourceHeapType::ConstantTexture,
            entries: Vec::new(),
            slots: Vec::new(),
        };
        let mut samplers = RequiredResourceHeap {
            heap_type: ResourceHeapType::Sampler,
            entries: Vec::new(),
            slots: Vec::new(),
        };

        for shader in shaders.bound_stages() {
            let reflection = shader.reflection();
            let views = reflection.constant_buffers().chain(reflection.textures());
            pack_stage(shader.stage(), views, &mut constant_texture, &mut tables);
            pack_stage(shader.stage(), reflection.samplers(), &mut samplers, &mut tables);
        }

        let heaps: Vec<RequiredResourceHeap> = [constant_texture, samplers]
            .into_iter()
            .filter(|heap| !heap.entries.is_empty())
            .collect();

        let layout = BindingLayoutDesc {
            tables,
            allow_input_assembler: shaders.vertex().is_some(),
        };
        let layout_hash = layout.structural_hash();
        let slot_count = layout.tables.len();

        Self {
            combination: shaders.key(),
            heaps,
            layout,
            layout_hash,
            slot_heaps: vec![None; slot_count],
            bound_heaps: Vec::new(),
        }
    }

    /// Key of the combination this table was derived from
    pub fn combination(&self) -> ShaderCombinationKey {
        self.combination
    }

    pub fn num_required_heaps(&self) -> usize {
        self.heaps.len()
    }

    /// Required heap `index`
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_required_heaps()`.
    pub fn required_heap(&self, index: usize) -> &RequiredResourceHeap {
        assert!(
            index < self.heaps.len(),
            "required heap {} out of range ({} heaps)", index, self.heaps.len()
        );
        &self.heaps[index]
    }

    pub fn required_heaps(&self) -> &[RequiredResourceHeap] {
        &self.heaps
    }

    /// Required heap of `heap_type`, if the combination uses one
    pub fn required_heap_of_type(&self, heap_type: ResourceHeapType) -> Option<&RequiredResourceHeap> {
        self.heaps.iter().find(|h| h.heap_type == heap_type)
    }

    /// Synthesized binding layout
    pub fn binding_layout_desc(&self) -> &BindingLayoutDesc {
        &self.layout
    }

    /// Structural hash of the binding layout (not of bound content)
    pub fn binding_layout_hash(&self) -> u64 {
        self.layout_hash
    }

    /// Number of packed resources of `kind`, across all heaps
    pub fn resource_count(&self, kind: ResourceKind) -> usize {
        self.heaps
            .iter()
            .flat_map(|h| h.entries.iter())
            .filter(|e| e.resource.kind == kind)
            .count()
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_heaps.len() as u32
    }

    /// Record which heap satisfies binding-table slot `slot`
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range or the heap type does not match the slot.
    pub fn set(&mut self, slot: u32, heap: Arc<dyn NativeResourceHeap>) {
        let index = slot as usize;
        assert!(
            index < self.slot_heaps.len(),
            "binding-table slot {} out of range ({} slots)", slot, self.slot_heaps.len()
        );
        let expected = self.layout.tables[index].heap_type;
        assert_eq!(
            heap.heap_type(), expected,
            "slot {} expects a {:?} heap", slot, expected
        );

        self.slot_heaps[index] = Some(heap);
        self.rebuild_bound_heaps();
    }

    /// Forget every slot assignment
    pub fn clear(&mut self) {
        self.slot_heaps.iter_mut().for_each(|h| *h = None);
        self.bound_heaps.clear();
    }

    /// Heap currently set at `slot`
    pub fn heap_at(&self, slot: u32) -> Option<&Arc<dyn NativeResourceHeap>> {
        self.slot_heaps.get(slot as usize).and_then(|h| h.as_ref())
    }

    /// Distinct heaps currently set, each listed once
    pub fn bound_heaps(&self) -> &[Arc<dyn NativeResourceHeap>] {
        &self.bound_heaps
    }

    /// Bind the heaps and every set slot into `list`
    ///
    /// The list keeps each bound heap alive until it is recycled, so
    /// replacing a slot afterwards never frees a heap the GPU may still read.
    ///
    /// # Panics
    ///
    /// Panics if two different heaps of the same type are set: a command
    /// list binds at most one heap per type.
    pub fn apply_to_command_list(&self, list: &mut PooledCommandList) {
        if self.bound_heaps.is_empty() {
            return;
        }
        for (i, heap) in self.bound_heaps.iter().enumerate() {
            assert!(
                self.bound_heaps[..i].iter().all(|h| h.heap_type() != heap.heap_type()),
                "two different {:?} heaps set on one resource table", heap.heap_type()
            );
        }

        for heap in &self.bound_heaps {
            list.retain_heap(heap);
        }
        let heaps: Vec<&dyn NativeResourceHeap> = self.bound_heaps.iter().map(|h| h.as_ref()).collect();
        let commands = list.commands();
        commands.set_resource_heaps(&heaps);
        for (slot, heap) in self.slot_heaps.iter().enumerate() {
            if let Some(heap) = heap {
                commands.set_binding_table(slot as u32, heap.gpu_start());
            }
        }
    }

    fn rebuild_bound_heaps(&mut self) {
        self.bound_heaps.clear();
        for heap in self.slot_heaps.iter().flatten() {
            if !self.bound_heaps.iter().any(|h| Arc::ptr_eq(h, heap)) {
                self.bound_heaps.push(heap.clone());
            }
        }
    }
}

/// Append one stage's resources to `heap`, opening a slot if it has any
fn pack_stage<'a>(
    stage: ShaderStage,
    resources: impl Iterator<Item = &'a BoundResourceDescriptor>,
    heap: &mut RequiredResourceHeap,
    tables: &mut Vec<BindingTableDesc>,
) {
    let mut ranges = Vec::new();
    for resource in resources {
        debug_assert_eq!(resource.kind.heap_type(), heap.heap_type);
        let offset = heap.entries.len() as u32;
        ranges.push(DescriptorRange {
            kind: resource.kind,
            base_register: resource.register,
            count: 1,
            offset_in_heap: offset,
        });
        heap.entries.push(HeapEntry {
            stage,
            offset,
            resource: resource.clone(),
        });
    }
    if ranges.is_empty() {
        return;
    }

    heap.slots.push(tables.len() as u32);
    tables.push(BindingTableDesc {
        heap_type: heap.heap_type,
        visibility: stage.visibility(),
        ranges,
    });
}

#[cfg(test)]
#[path = "resource_table_tests.rs"]
mod tests;
