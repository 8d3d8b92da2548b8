use super::*;
use crate::headless::{FailurePoint, HeadlessDevice, HeadlessPipeline};
use crate::native::{ColorBlendState, CullMode, PrimitiveTopology};
use crate::shader::{BoundResourceDescriptor, ShaderStage};
use crate::test_support::{bare_combination, lit_combination, material_cb, shader, transform_cb};

// ============================================================================
// Helpers
// ============================================================================

fn resolve(
    cache: &mut PipelineStateCache,
    gpu: &HeadlessDevice,
    state: &FixedFunctionState,
    shaders: &ShaderCombination,
) -> Result<Arc<dyn NativePipeline>> {
    let table = GpuResourceTable::new(shaders);
    cache.get_pipeline(gpu, &PipelineRequest::new(state, shaders, &table))
}

fn pipeline_id(pipeline: &Arc<dyn NativePipeline>) -> u64 {
    pipeline.as_any().downcast_ref::<HeadlessPipeline>().unwrap().id
}

/// Same resources as `lit_combination`, different pixel byte code
fn lit_variant() -> ShaderCombination {
    ShaderCombination::vertex_pixel(
        shader(ShaderStage::Vertex, "lit_vs", vec![transform_cb(0)]),
        shader(ShaderStage::Pixel, "lit_ps_variant", vec![
            material_cb(0),
            BoundResourceDescriptor::texture("albedo", 0),
            BoundResourceDescriptor::sampler("linear", 0),
            BoundResourceDescriptor::texture("normal", 1),
        ]),
    )
}

// ============================================================================
// Key tests
// ============================================================================

#[test]
fn test_key_components() {
    let state = FixedFunctionState::default();
    let shaders = lit_combination();
    let table = GpuResourceTable::new(&shaders);
    let key = PipelineRequest::new(&state, &shaders, &table).key();

    assert_eq!(key.state_hash, state.state_hash());
    assert_eq!(key.layout_hash, table.binding_layout_hash());
    assert_eq!(key.shaders(), shaders.key());
    assert_eq!(key.geometry, None);
}

#[test]
fn test_key_differs_by_each_component() {
    let shaders = lit_combination();
    let base = PipelineKey::new(1, 2, shaders.key());

    assert_ne!(base, PipelineKey::new(3, 2, shaders.key()));
    assert_ne!(base, PipelineKey::new(1, 3, shaders.key()));
    assert_ne!(base, PipelineKey::new(1, 2, lit_variant().key()));
}

// ============================================================================
// Cache tests
// ============================================================================

#[test]
fn test_second_request_is_a_hit() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let state = FixedFunctionState::default();
    let shaders = lit_combination();

    let first = resolve(&mut cache, &gpu, &state, &shaders).unwrap();
    let second = resolve(&mut cache, &gpu, &state, &shaders).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(gpu.stats().pipelines_created, 1);
    assert_eq!(cache.hits(), 1);
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_identity_survives_unrelated_insertions() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let state = FixedFunctionState::default();
    let shaders = lit_combination();

    let first = resolve(&mut cache, &gpu, &state, &shaders).unwrap();
    for topology in [PrimitiveTopology::LineList, PrimitiveTopology::PointList, PrimitiveTopology::TriangleStrip] {
        let other = FixedFunctionState { topology, ..FixedFunctionState::default() };
        resolve(&mut cache, &gpu, &other, &shaders).unwrap();
    }
    let again = resolve(&mut cache, &gpu, &state, &shaders).unwrap();

    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(cache.len(), 4);
}

#[test]
fn test_pixel_shader_change_misses() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let state = FixedFunctionState::default();

    let lit = resolve(&mut cache, &gpu, &state, &lit_combination()).unwrap();
    let variant = resolve(&mut cache, &gpu, &state, &lit_variant()).unwrap();

    assert_ne!(pipeline_id(&lit), pipeline_id(&variant));
    assert_eq!(cache.len(), 2);
    // Same resources, same binding layout
    assert_eq!(cache.binding_layout_count(), 1);
    assert_eq!(gpu.stats().binding_layouts_created, 1);

    // The original entry is untouched by the variant
    let lit_again = resolve(&mut cache, &gpu, &state, &lit_combination()).unwrap();
    assert!(Arc::ptr_eq(&lit, &lit_again));
    assert_eq!(pipeline_id(&lit_again), pipeline_id(&lit));
    assert_eq!(cache.hits(), 1);
    assert_eq!(gpu.stats().pipelines_created, 2);
}

#[test]
fn test_state_change_misses() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let shaders = lit_combination();
    let opaque = FixedFunctionState::default();
    let mut blended = FixedFunctionState::default();
    blended.color_blend = ColorBlendState::alpha_blend();
    blended.rasterization.cull_mode = CullMode::None;

    resolve(&mut cache, &gpu, &opaque, &shaders).unwrap();
    resolve(&mut cache, &gpu, &blended, &shaders).unwrap();

    assert_eq!(cache.misses(), 2);
    assert_eq!(gpu.stats().pipelines_created, 2);
}

#[test]
fn test_built_pipeline_matches_key() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let state = FixedFunctionState::default();
    let shaders = lit_combination();
    let table = GpuResourceTable::new(&shaders);

    let pipeline = cache.get_pipeline(&gpu, &PipelineRequest::new(&state, &shaders, &table)).unwrap();

    let headless = pipeline.as_any().downcast_ref::<HeadlessPipeline>().unwrap();
    assert_eq!(headless.state_hash, state.state_hash());
    assert_eq!(headless.layout_hash, table.binding_layout_hash());
    assert_eq!(headless.shaders, shaders.key());
}

#[test]
fn test_lookup_does_not_build() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let state = FixedFunctionState::default();
    let shaders = lit_combination();
    let table = GpuResourceTable::new(&shaders);
    let request = PipelineRequest::new(&state, &shaders, &table);

    assert!(cache.lookup(&request.key()).is_none());
    assert!(cache.lookup_binding_layout(table.binding_layout_hash()).is_none());

    let built = cache.get_pipeline(&gpu, &request).unwrap();
    assert!(Arc::ptr_eq(cache.lookup(&request.key()).unwrap(), &built));
    assert!(cache.lookup_binding_layout(table.binding_layout_hash()).is_some());
    assert_eq!(cache.hits(), 0);
}

#[test]
fn test_empty_binding_layout_is_cached_once() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let table = GpuResourceTable::new(&bare_combination());

    let a = cache.get_binding_layout(&gpu, &table).unwrap();
    let b = cache.get_binding_layout(&gpu, &table).unwrap();

    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.desc().slot_count(), 0);
    assert_eq!(gpu.stats().binding_layouts_created, 1);
}

// ============================================================================
// Failure tests
// ============================================================================

#[test]
fn test_pipeline_failure_is_not_cached() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let state = FixedFunctionState::default();
    let shaders = lit_combination();

    gpu.inject_failure(FailurePoint::CreatePipeline);
    let result = resolve(&mut cache, &gpu, &state, &shaders);
    assert!(matches!(result, Err(Error::BackendError(_))));
    assert!(cache.is_empty());

    // The binding layout was built before the pipeline failed
    assert_eq!(cache.binding_layout_count(), 1);

    resolve(&mut cache, &gpu, &state, &shaders).unwrap();
    assert_eq!(cache.len(), 1);
    assert_eq!(gpu.stats().binding_layouts_created, 1);
}

#[test]
fn test_binding_layout_failure_propagates() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();

    gpu.inject_failure(FailurePoint::CreateBindingLayout);
    let result = resolve(&mut cache, &gpu, &FixedFunctionState::default(), &lit_combination());

    assert!(result.is_err());
    assert!(cache.is_empty());
    assert_eq!(cache.binding_layout_count(), 0);
    assert_eq!(gpu.stats().pipelines_created, 0);
}

#[test]
fn test_pipeline_without_vertex_shader_fails() {
    let gpu = HeadlessDevice::default();
    let mut cache = PipelineStateCache::new();
    let pixel_only = ShaderCombination::new()
        .with_shader(shader(ShaderStage::Pixel, "ps", vec![material_cb(0)]));

    let result = resolve(&mut cache, &gpu, &FixedFunctionState::default(), &pixel_only);

    assert!(result.is_err());
    assert!(cache.is_empty());
}
