/// Compiled shaders and their stable byte-code hashes

use std::hash::Hasher;
use rustc_hash::FxHasher;
use crate::native::ShaderVisibility;
use crate::shader::ShaderReflectionDescription;

/// Pipeline stage a shader runs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
}

impl ShaderStage {
    /// Order stages are walked in when building resource tables
    pub const PRIORITY: [ShaderStage; 3] = [ShaderStage::Vertex, ShaderStage::Pixel, ShaderStage::Geometry];

    /// Binding-table visibility for this stage
    pub fn visibility(&self) -> ShaderVisibility {
        match self {
            ShaderStage::Vertex => ShaderVisibility::VERTEX,
            ShaderStage::Pixel => ShaderVisibility::PIXEL,
            ShaderStage::Geometry => ShaderVisibility::GEOMETRY,
        }
    }
}

/// Stable hash of compiled shader byte code
///
/// FxHash is deterministic, so equal byte code hashes equal across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderHash(pub u64);

impl ShaderHash {
    pub fn of_bytecode(bytecode: &[u8]) -> Self {
        let mut hasher = FxHasher::default();
        hasher.write(bytecode);
        hasher.write_usize(bytecode.len());
        Self(hasher.finish())
    }
}

/// Compiled shader: byte code, its hash and reflection metadata
#[derive(Debug, Clone)]
pub struct CompiledShader {
    stage: ShaderStage,
    bytecode: Vec<u8>,
    hash: ShaderHash,
    reflection: ShaderReflectionDescription,
}

impl CompiledShader {
    pub fn new(stage: ShaderStage, bytecode: Vec<u8>, reflection: ShaderReflectionDescription) -> Self {
        let hash = ShaderHash::of_bytecode(&bytecode);
        Self {
            stage,
            bytecode,
            hash,
            reflection,
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn hash(&self) -> ShaderHash {
        self.hash
    }

    pub fn reflection(&self) -> &ShaderReflectionDescription {
        &self.reflection
    }
}
