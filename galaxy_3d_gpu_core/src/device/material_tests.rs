use super::*;
use crate::headless::{HeadlessResourceHeap, WrittenView};
use crate::native::{BufferUsage, FilterMode, ResourceHeapType, ResourceState, TextureUsage};
use crate::test_support::{bare_combination, buffer, headless, lit_combination, render_device, texture};

// ============================================================================
// Helpers
// ============================================================================

fn lit_bindings(device: &RenderDevice) -> ResourceBindings {
    ResourceBindings::new()
        .with_constant_buffer("Transform", buffer(device, "Transform", 256, BufferUsage::Constant))
        .with_constant_buffer("Material", buffer(device, "Material", 256, BufferUsage::Constant))
        .with_texture("albedo", texture(device, "albedo", TextureUsage::Sampled, ResourceState::ShaderResource))
        .with_texture("normal", texture(device, "normal", TextureUsage::Sampled, ResourceState::ShaderResource))
        .with_sampler("linear", SamplerDesc::default())
}

fn headless_heap(heap: &Arc<dyn NativeResourceHeap>) -> &HeadlessResourceHeap {
    heap.as_any().downcast_ref::<HeadlessResourceHeap>().unwrap()
}

fn address_of(bound: Option<&BoundResource>) -> u64 {
    match bound {
        Some(BoundResource::ConstantBuffer(buffer)) => buffer.as_resource().gpu_address(),
        Some(BoundResource::Texture(texture)) => texture.as_resource().gpu_address(),
        _ => panic!("not a buffer or texture"),
    }
}

// ============================================================================
// ResourceBindings tests
// ============================================================================

#[test]
fn test_bindings_replace_by_name() {
    let mut bindings = ResourceBindings::new().with_sampler("linear", SamplerDesc::default());
    assert_eq!(bindings.len(), 1);

    let point = SamplerDesc { filter: FilterMode::Point, ..SamplerDesc::default() };
    bindings.insert("linear", BoundResource::Sampler(point));

    assert_eq!(bindings.len(), 1);
    assert!(matches!(bindings.get("linear"), Some(BoundResource::Sampler(s)) if *s == point));
    assert!(bindings.get("missing").is_none());
}

// ============================================================================
// Heap filling tests
// ============================================================================

#[test]
fn test_material_fills_every_required_heap() {
    let gpu = headless();
    let mut device = render_device(&gpu);
    let bindings = lit_bindings(&device);

    let material = device.create_material_binding(&lit_combination(), &bindings).unwrap();

    assert_eq!(material.heaps().len(), 2);
    assert_eq!(material.combination(), lit_combination().key());
    assert_eq!(gpu.stats().resource_heaps_created, 2);

    let constants = headless_heap(&material.heaps()[0]);
    assert_eq!(material.heaps()[0].heap_type(), ResourceHeapType::ConstantTexture);
    assert_eq!(material.heaps()[0].capacity(), 4);
    assert_eq!(
        constants.view(0),
        Some(WrittenView::ConstantBuffer { address: address_of(bindings.get("Transform")), size: 64 })
    );
    assert_eq!(
        constants.view(1),
        Some(WrittenView::ConstantBuffer { address: address_of(bindings.get("Material")), size: 32 })
    );
    assert_eq!(constants.view(2), Some(WrittenView::Texture { address: address_of(bindings.get("albedo")) }));
    assert_eq!(constants.view(3), Some(WrittenView::Texture { address: address_of(bindings.get("normal")) }));

    let samplers = headless_heap(&material.heaps()[1]);
    assert_eq!(samplers.view(0), Some(WrittenView::Sampler(SamplerDesc::default())));
}

#[test]
fn test_bind_to_sets_every_slot() {
    let gpu = headless();
    let mut device = render_device(&gpu);
    let bindings = lit_bindings(&device);
    let shaders = lit_combination();
    let material = device.create_material_binding(&shaders, &bindings).unwrap();

    let key = device.resource_table_for(&shaders);
    let table = device.resource_table_mut(key).unwrap();
    material.bind_to(table);

    for slot in 0..table.slot_count() {
        assert!(table.heap_at(slot).is_some(), "slot {} left empty", slot);
    }
    assert_eq!(table.bound_heaps().len(), 2);
    assert!(Arc::ptr_eq(table.heap_at(0).unwrap(), &material.heaps()[0]));
    assert!(Arc::ptr_eq(table.heap_at(2).unwrap(), &material.heaps()[1]));
}

#[test]
fn test_material_without_resources_creates_no_heap() {
    let gpu = headless();
    let mut device = render_device(&gpu);

    let material = device.create_material_binding(&bare_combination(), &ResourceBindings::new()).unwrap();

    assert!(material.heaps().is_empty());
    assert_eq!(gpu.stats().resource_heaps_created, 0);
}

#[test]
fn test_extra_bindings_are_ignored() {
    let gpu = headless();
    let mut device = render_device(&gpu);
    let bindings = lit_bindings(&device).with_sampler("unused", SamplerDesc::default());

    let material = device.create_material_binding(&lit_combination(), &bindings).unwrap();

    assert_eq!(material.heaps()[1].capacity(), 1);
}

// ============================================================================
// Error tests
// ============================================================================

#[test]
fn test_missing_binding_is_invalid_resource() {
    let gpu = headless();
    let mut device = render_device(&gpu);
    let bindings = ResourceBindings::new()
        .with_constant_buffer("Transform", buffer(&device, "Transform", 256, BufferUsage::Constant));

    let result = device.create_material_binding(&lit_combination(), &bindings);

    match result {
        Err(Error::InvalidResource(message)) => assert!(message.contains("Material"), "{}", message),
        other => panic!("expected InvalidResource, got {:?}", other.err()),
    }
    // Nothing is created when resolution fails
    assert_eq!(gpu.stats().resource_heaps_created, 0);
}

#[test]
fn test_kind_mismatch_is_invalid_resource() {
    let gpu = headless();
    let mut device = render_device(&gpu);
    let mut bindings = lit_bindings(&device);
    bindings.insert("albedo", BoundResource::Sampler(SamplerDesc::default()));

    let result = device.create_material_binding(&lit_combination(), &bindings);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
    assert_eq!(gpu.stats().resource_heaps_created, 0);
}

#[test]
fn test_undersized_constant_buffer_is_invalid_resource() {
    let gpu = headless();
    let mut device = render_device(&gpu);
    let mut bindings = lit_bindings(&device);
    bindings.insert("Transform", BoundResource::ConstantBuffer(buffer(&device, "tiny", 16, BufferUsage::Constant)));

    let result = device.create_material_binding(&lit_combination(), &bindings);

    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
fn test_heap_creation_failure_propagates() {
    use crate::headless::FailurePoint;

    let gpu = headless();
    let mut device = render_device(&gpu);
    let bindings = lit_bindings(&device);
    gpu.inject_failure(FailurePoint::CreateResourceHeap);

    let result = device.create_material_binding(&lit_combination(), &bindings);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(gpu.stats().resource_heaps_created, 0);
}

#[test]
#[should_panic(expected = "another shader combination")]
fn test_bind_to_other_combination_panics() {
    let gpu = headless();
    let mut device = render_device(&gpu);
    let material = device.create_material_binding(&bare_combination(), &ResourceBindings::new()).unwrap();

    let key = device.resource_table_for(&lit_combination());
    material.bind_to(device.resource_table_mut(key).unwrap());
}
