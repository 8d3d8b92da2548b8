#![allow(dead_code)]
//! Shared setup for integration tests
//!
//! Every test builds its own headless device: there is no window or
//! native API to share, so tests stay independent and can run in parallel.

use galaxy_3d_gpu_core::galaxy3d::{DeviceConfig, RenderDevice, ResourceBindings};
use galaxy_3d_gpu_core::galaxy3d::headless::{HeadlessConfig, HeadlessDevice};
use galaxy_3d_gpu_core::galaxy3d::native::{
    BufferDesc, BufferUsage, NativeBuffer, NativeTexture, ResourceState, SamplerDesc,
    TextureDesc, TextureFormat, TextureUsage,
};
use galaxy_3d_gpu_core::galaxy3d::shader::{
    BoundResourceDescriptor, CompiledShader, ConstantBufferLayout, ConstantBufferVariable,
    ShaderCombination, ShaderReflectionDescription, ShaderStage,
};
use std::sync::Arc;

/// Headless GPU with barrier validation on
pub fn immediate_gpu() -> Arc<HeadlessDevice> {
    Arc::new(HeadlessDevice::new(HeadlessConfig {
        validation: true,
        ..HeadlessConfig::default()
    }))
}

/// Headless GPU whose fences only advance when the test says so
pub fn manual_gpu() -> Arc<HeadlessDevice> {
    Arc::new(HeadlessDevice::new(HeadlessConfig {
        validation: true,
        ..HeadlessConfig::manual()
    }))
}

pub fn device(gpu: &Arc<HeadlessDevice>) -> RenderDevice {
    RenderDevice::new(gpu.clone(), DeviceConfig::default()).unwrap()
}

pub fn shader(stage: ShaderStage, code: &str, resources: Vec<BoundResourceDescriptor>) -> Arc<CompiledShader> {
    Arc::new(CompiledShader::new(
        stage,
        code.as_bytes().to_vec(),
        ShaderReflectionDescription::new(resources),
    ))
}

/// "Transform" constant buffer: a single 4x4 matrix
pub fn transform_cb(register: u32) -> BoundResourceDescriptor {
    BoundResourceDescriptor::constant_buffer(
        "Transform",
        register,
        ConstantBufferLayout::new(64, vec![ConstantBufferVariable::new("worldMatrix", 0, 64)]),
    )
}

/// Vertex shader reading "Transform", pixel shader sampling "albedo"
pub fn textured_combination(pixel_code: &str) -> ShaderCombination {
    ShaderCombination::vertex_pixel(
        shader(ShaderStage::Vertex, "textured_vs", vec![transform_cb(0)]),
        shader(ShaderStage::Pixel, pixel_code, vec![
            BoundResourceDescriptor::texture("albedo", 0),
            BoundResourceDescriptor::sampler("linear", 0),
        ]),
    )
}

pub fn buffer(device: &RenderDevice, name: &str, size: u64, usage: BufferUsage) -> Arc<dyn NativeBuffer> {
    device.create_buffer(&BufferDesc {
        size,
        usage,
        debug_name: name.to_string(),
    }).unwrap()
}

pub fn texture(
    device: &RenderDevice,
    name: &str,
    format: TextureFormat,
    usage: TextureUsage,
    initial_state: ResourceState,
) -> Arc<dyn NativeTexture> {
    device.create_texture(&TextureDesc {
        width: 320,
        height: 240,
        format,
        usage,
        initial_state,
        debug_name: name.to_string(),
    }).unwrap()
}

/// Bindings satisfying `textured_combination`
pub fn textured_bindings(device: &RenderDevice) -> ResourceBindings {
    ResourceBindings::new()
        .with_constant_buffer("Transform", buffer(device, "Transform", 256, BufferUsage::Constant))
        .with_texture("albedo", texture(
            device, "albedo", TextureFormat::R8G8B8A8_UNORM, TextureUsage::Sampled, ResourceState::ShaderResource,
        ))
        .with_sampler("linear", SamplerDesc::default())
}
