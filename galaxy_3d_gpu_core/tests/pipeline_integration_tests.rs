//! Integration tests for resource tables and the pipeline state cache
//!
//! Run with: cargo test --test pipeline_integration_tests

mod gpu_test_utils;

use galaxy_3d_gpu_core::galaxy3d::native::{
    FixedFunctionState, NativePipeline, NativeResourceHeap, ResourceHeapType, ResourceKind,
    TextureFormat,
};
use galaxy_3d_gpu_core::galaxy3d::pipeline::{GpuResourceTable, PipelineRequest, PipelineStateCache};
use galaxy_3d_gpu_core::galaxy3d::shader::{ShaderCombination, ShaderStage};
use gpu_test_utils::{device, immediate_gpu, shader, textured_bindings, textured_combination, transform_cb};
use std::sync::Arc;

// ============================================================================
// RESOURCE TABLE TESTS
// ============================================================================

#[test]
fn test_integration_vertex_only_transform_table() {
    let shaders = ShaderCombination::new()
        .with_shader(shader(ShaderStage::Vertex, "transform_vs", vec![transform_cb(0)]));

    let table = GpuResourceTable::new(&shaders);

    assert_eq!(table.num_required_heaps(), 1);
    let heap = table.required_heap(0);
    assert_eq!(heap.heap_type(), ResourceHeapType::ConstantTexture);
    assert_eq!(heap.entries().len(), 1);
    assert_eq!(heap.entries()[0].resource.name, "Transform");
    assert_eq!(heap.entries()[0].resource.kind, ResourceKind::ConstantBuffer);
    let layout = heap.entries()[0].resource.constant_buffer.as_ref().unwrap();
    assert_eq!(layout.size, 64);
    assert_eq!(layout.variable("worldMatrix").unwrap().offset, 0);
}

#[test]
fn test_integration_textured_table_splits_samplers() {
    let table = GpuResourceTable::new(&textured_combination("textured_ps"));

    assert_eq!(table.num_required_heaps(), 2);
    assert_eq!(table.resource_count(ResourceKind::ConstantBuffer), 1);
    assert_eq!(table.resource_count(ResourceKind::Texture), 1);
    assert_eq!(table.resource_count(ResourceKind::Sampler), 1);
    // VS constants, PS textures, PS samplers
    assert_eq!(table.slot_count(), 3);
}

// ============================================================================
// PIPELINE CACHE TESTS
// ============================================================================

#[test]
fn test_integration_identical_keys_build_once() {
    let gpu = immediate_gpu();
    let mut cache = PipelineStateCache::new();
    let state = FixedFunctionState::default();
    let shaders = textured_combination("textured_ps");
    let table = GpuResourceTable::new(&shaders);
    let request = PipelineRequest::new(&state, &shaders, &table);

    let first = cache.get_pipeline(gpu.as_ref(), &request).unwrap();
    let created = gpu.stats().pipelines_created;
    let second = cache.get_pipeline(gpu.as_ref(), &request).unwrap();

    assert_eq!(gpu.stats().pipelines_created, created);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_integration_cache_identity_over_many_keys() {
    let gpu = immediate_gpu();
    let mut device = device(&gpu);
    let shaders = textured_combination("textured_ps");
    let opaque = FixedFunctionState::default();
    let first = device.get_pipeline(&opaque, &shaders).unwrap();

    let formats = [TextureFormat::B8G8R8A8_UNORM, TextureFormat::B8G8R8A8_SRGB];
    let mut others: Vec<Arc<dyn NativePipeline>> = Vec::new();
    for (i, format) in formats.iter().enumerate() {
        let state = FixedFunctionState {
            render_target_formats: vec![*format],
            ..FixedFunctionState::default()
        };
        others.push(device.get_pipeline(&state, &shaders).unwrap());
        let variant = textured_combination(&format!("textured_ps_{}", i));
        others.push(device.get_pipeline(&opaque, &variant).unwrap());
    }

    assert!(Arc::ptr_eq(&first, &device.get_pipeline(&opaque, &shaders).unwrap()));
    assert!(others.iter().all(|p| !Arc::ptr_eq(p, &first)));
    assert_eq!(device.stats().pipelines_created, 5);
    // Every variant has the same resources
    assert_eq!(device.stats().binding_layouts_created, 1);
}

#[test]
fn test_integration_material_heaps_reach_the_table() {
    let gpu = immediate_gpu();
    let mut device = device(&gpu);
    let shaders = textured_combination("textured_ps");
    let bindings = textured_bindings(&device);

    let material = device.create_material_binding(&shaders, &bindings).unwrap();
    let key = device.resource_table_for(&shaders);
    let table = device.resource_table_mut(key).unwrap();
    material.bind_to(table);

    let heap_types: Vec<ResourceHeapType> = table.bound_heaps().iter().map(|h| h.heap_type()).collect();
    assert_eq!(heap_types, vec![ResourceHeapType::ConstantTexture, ResourceHeapType::Sampler]);
    assert_eq!(material.heaps()[0].capacity(), 2);
    assert_eq!(gpu.stats().resource_heaps_created, 2);
}
