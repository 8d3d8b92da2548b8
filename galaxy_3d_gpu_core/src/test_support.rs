//! Shared builders for unit tests

use std::sync::Arc;
use crate::device::{DeviceConfig, RenderDevice};
use crate::headless::{HeadlessConfig, HeadlessDevice};
use crate::native::{BufferDesc, BufferUsage, NativeBuffer, NativeTexture, ResourceState, TextureDesc, TextureFormat, TextureUsage};
use crate::shader::{
    BoundResourceDescriptor, CompiledShader, ConstantBufferLayout, ConstantBufferVariable,
    ShaderCombination, ShaderReflectionDescription, ShaderStage,
};

pub fn shader(stage: ShaderStage, code: &str, resources: Vec<BoundResourceDescriptor>) -> Arc<CompiledShader> {
    Arc::new(CompiledShader::new(
        stage,
        code.as_bytes().to_vec(),
        ShaderReflectionDescription::new(resources),
    ))
}

/// "Transform": 64 bytes, one matrix at offset 0
pub fn transform_cb(register: u32) -> BoundResourceDescriptor {
    BoundResourceDescriptor::constant_buffer(
        "Transform",
        register,
        ConstantBufferLayout::new(64, vec![ConstantBufferVariable::new("worldMatrix", 0, 64)]),
    )
}

pub fn material_cb(register: u32) -> BoundResourceDescriptor {
    BoundResourceDescriptor::constant_buffer(
        "Material",
        register,
        ConstantBufferLayout::new(32, vec![
            ConstantBufferVariable::new("tint", 0, 16),
            ConstantBufferVariable::new("roughness", 16, 4),
        ]),
    )
}

/// VS: Transform. PS: Material, albedo, normal, linear sampler.
pub fn lit_combination() -> ShaderCombination {
    ShaderCombination::vertex_pixel(
        shader(ShaderStage::Vertex, "lit_vs", vec![transform_cb(0)]),
        shader(ShaderStage::Pixel, "lit_ps", vec![
            material_cb(0),
            BoundResourceDescriptor::texture("albedo", 0),
            BoundResourceDescriptor::sampler("linear", 0),
            BoundResourceDescriptor::texture("normal", 1),
        ]),
    )
}

/// VS with no resources, PS with no resources
pub fn bare_combination() -> ShaderCombination {
    ShaderCombination::vertex_pixel(
        shader(ShaderStage::Vertex, "bare_vs", vec![]),
        shader(ShaderStage::Pixel, "bare_ps", vec![]),
    )
}

pub fn headless() -> Arc<HeadlessDevice> {
    Arc::new(HeadlessDevice::new(HeadlessConfig {
        validation: true,
        ..HeadlessConfig::default()
    }))
}

pub fn render_device(gpu: &Arc<HeadlessDevice>) -> RenderDevice {
    RenderDevice::new(gpu.clone(), DeviceConfig::default()).unwrap()
}

pub fn buffer(device: &RenderDevice, name: &str, size: u64, usage: BufferUsage) -> Arc<dyn NativeBuffer> {
    device.create_buffer(&BufferDesc {
        size,
        usage,
        debug_name: name.to_string(),
    }).unwrap()
}

pub fn texture(device: &RenderDevice, name: &str, usage: TextureUsage, initial_state: ResourceState) -> Arc<dyn NativeTexture> {
    let format = if usage == TextureUsage::DepthStencil {
        TextureFormat::D32_FLOAT
    } else {
        TextureFormat::R8G8B8A8_UNORM
    };
    device.create_texture(&TextureDesc {
        width: 64,
        height: 32,
        format,
        usage,
        initial_state,
        debug_name: name.to_string(),
    }).unwrap()
}
