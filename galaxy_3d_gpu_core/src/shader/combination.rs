/// Shader combinations: the vertex/pixel/geometry shaders bound together for a draw

use std::sync::Arc;
use crate::shader::{CompiledShader, ShaderHash, ShaderStage};

/// Identity of a shader combination: the byte-code hash of each stage
///
/// An unbound stage is `None`, never a sentinel hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ShaderCombinationKey {
    pub vertex: Option<ShaderHash>,
    pub pixel: Option<ShaderHash>,
    pub geometry: Option<ShaderHash>,
}

/// Up to one compiled shader per stage
#[derive(Debug, Clone, Default)]
pub struct ShaderCombination {
    vertex: Option<Arc<CompiledShader>>,
    pixel: Option<Arc<CompiledShader>>,
    geometry: Option<Arc<CompiledShader>>,
}

impl ShaderCombination {
    /// Empty combination (no stage bound)
    pub fn new() -> Self {
        Self::default()
    }

    /// Vertex + pixel, the common case
    pub fn vertex_pixel(vertex: Arc<CompiledShader>, pixel: Arc<CompiledShader>) -> Self {
        Self::new().with_shader(vertex).with_shader(pixel)
    }

    /// Bind `shader` at its own stage, replacing whatever was bound there
    pub fn with_shader(mut self, shader: Arc<CompiledShader>) -> Self {
        match shader.stage() {
            ShaderStage::Vertex => self.vertex = Some(shader),
            ShaderStage::Pixel => self.pixel = Some(shader),
            ShaderStage::Geometry => self.geometry = Some(shader),
        }
        self
    }

    /// Shader bound at `stage`
    pub fn stage(&self, stage: ShaderStage) -> Option<&Arc<CompiledShader>> {
        match stage {
            ShaderStage::Vertex => self.vertex.as_ref(),
            ShaderStage::Pixel => self.pixel.as_ref(),
            ShaderStage::Geometry => self.geometry.as_ref(),
        }
    }

    pub fn vertex(&self) -> Option<&Arc<CompiledShader>> {
        self.vertex.as_ref()
    }

    pub fn pixel(&self) -> Option<&Arc<CompiledShader>> {
        self.pixel.as_ref()
    }

    pub fn geometry(&self) -> Option<&Arc<CompiledShader>> {
        self.geometry.as_ref()
    }

    /// Bound shaders in stage priority order (vertex, pixel, geometry)
    pub fn bound_stages(&self) -> impl Iterator<Item = &Arc<CompiledShader>> + '_ {
        ShaderStage::PRIORITY.iter().filter_map(move |stage| self.stage(*stage))
    }

    /// Byte-code hash of the shader at `stage`
    pub fn hash_of(&self, stage: ShaderStage) -> Option<ShaderHash> {
        self.stage(stage).map(|s| s.hash())
    }

    pub fn key(&self) -> ShaderCombinationKey {
        ShaderCombinationKey {
            vertex: self.hash_of(ShaderStage::Vertex),
            pixel: self.hash_of(ShaderStage::Pixel),
            geometry: self.hash_of(ShaderStage::Geometry),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.is_none() && self.pixel.is_none() && self.geometry.is_none()
    }
}

#[cfg(test)]
#[path = "combination_tests.rs"]
mod tests;
