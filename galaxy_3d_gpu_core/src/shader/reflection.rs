/// Shader reflection metadata
///
/// Read-only description of what a compiled shader binds: constant buffers
/// (with their named variables), textures and samplers, each at a register.
/// Produced by the shader compiler collaborator; this crate only reads it.

use crate::native::ResourceKind;

/// A named variable inside a constant buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBufferVariable {
    pub name: String,
    /// Byte offset from the start of the buffer
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
    /// Initial value declared in the shader source, if any (exactly `size` bytes)
    pub default_value: Option<Vec<u8>>,
}

impl ConstantBufferVariable {
    pub fn new(name: impl Into<String>, offset: u32, size: u32) -> Self {
        Self {
            name: name.into(),
            offset,
            size,
            default_value: None,
        }
    }

    /// Attach a default value
    pub fn with_default(mut self, bytes: &[u8]) -> Self {
        debug_assert_eq!(
            bytes.len() as u32, self.size,
            "default value for '{}' is {} bytes, variable is {}", self.name, bytes.len(), self.size
        );
        self.default_value = Some(bytes.to_vec());
        self
    }
}

/// Layout of a constant buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantBufferLayout {
    /// Total size in bytes
    pub size: u32,
    pub variables: Vec<ConstantBufferVariable>,
}

impl ConstantBufferLayout {
    pub fn new(size: u32, variables: Vec<ConstantBufferVariable>) -> Self {
        Self { size, variables }
    }

    /// Find a variable by name
    pub fn variable(&self, name: &str) -> Option<&ConstantBufferVariable> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// One resource a shader binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundResourceDescriptor {
    pub kind: ResourceKind,
    pub name: String,
    /// Shader register / slot
    pub register: u32,
    /// Present for constant buffers only
    pub constant_buffer: Option<ConstantBufferLayout>,
}

impl BoundResourceDescriptor {
    pub fn constant_buffer(name: impl Into<String>, register: u32, layout: ConstantBufferLayout) -> Self {
        Self {
            kind: ResourceKind::ConstantBuffer,
            name: name.into(),
            register,
            constant_buffer: Some(layout),
        }
    }

    pub fn texture(name: impl Into<String>, register: u32) -> Self {
        Self {
            kind: ResourceKind::Texture,
            name: name.into(),
            register,
            constant_buffer: None,
        }
    }

    pub fn sampler(name: impl Into<String>, register: u32) -> Self {
        Self {
            kind: ResourceKind::Sampler,
            name: name.into(),
            register,
            constant_buffer: None,
        }
    }
}

/// Everything reflection reports for one compiled shader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderReflectionDescription {
    pub bound_resources: Vec<BoundResourceDescriptor>,
}

impl ShaderReflectionDescription {
    pub fn new(bound_resources: Vec<BoundResourceDescriptor>) -> Self {
        Self { bound_resources }
    }

    /// Bound resources of one kind, in declaration order
    pub fn resources_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &BoundResourceDescriptor> + '_ {
        self.bound_resources.iter().filter(move |r| r.kind == kind)
    }

    pub fn constant_buffers(&self) -> impl Iterator<Item = &BoundResourceDescriptor> + '_ {
        self.resources_of_kind(ResourceKind::ConstantBuffer)
    }

    pub fn textures(&self) -> impl Iterator<Item = &BoundResourceDescriptor> + '_ {
        self.resources_of_kind(ResourceKind::Texture)
    }

    pub fn samplers(&self) -> impl Iterator<Item = &BoundResourceDescriptor> + '_ {
        self.resources_of_kind(ResourceKind::Sampler)
    }

    /// Find a bound resource by name
    pub fn find(&self, name: &str) -> Option<&BoundResourceDescriptor> {
        self.bound_resources.iter().find(|r| r.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.bound_resources.is_empty()
    }
}

#[cfg(test)]
#[path = "reflection_tests.rs"]
mod tests;
