/// Fixed-function pipeline state (blend, depth, raster, topology, targets)
///
/// This is the "top-level" part of a pipeline key. Its hash sits at the
/// outermost position of the cache key because it changes least often
/// between draws of one frame.

use std::hash::{Hash, Hasher};
use rustc_hash::FxHasher;
use crate::native::TextureFormat;

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Triangle list
    #[default]
    TriangleList,
    /// Triangle strip
    TriangleStrip,
    /// Line list
    LineList,
    /// Point list
    PointList,
}

// ===== VERTEX INPUT =====

/// Vertex attribute element format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum VertexFormat {
    R32_SFLOAT,
    R32G32_SFLOAT,
    R32G32B32_SFLOAT,
    R32G32B32A32_SFLOAT,
    R8G8B8A8_UNORM,
    R32_UINT,
}

impl VertexFormat {
    /// Size in bytes of one element
    pub fn size_bytes(&self) -> u32 {
        match self {
            VertexFormat::R32_SFLOAT => 4,
            VertexFormat::R32G32_SFLOAT => 8,
            VertexFormat::R32G32B32_SFLOAT => 12,
            VertexFormat::R32G32B32A32_SFLOAT => 16,
            VertexFormat::R8G8B8A8_UNORM => 4,
            VertexFormat::R32_UINT => 4,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Semantic name the vertex shader reads (e.g. "POSITION")
    pub semantic: String,
    /// Semantic index (e.g. TEXCOORD1 -> 1)
    pub semantic_index: u32,
    /// Element format
    pub format: VertexFormat,
    /// Input slot (vertex buffer index)
    pub slot: u32,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex input layout
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexLayout {
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Stride of input slot `slot` (end of its furthest attribute)
    pub fn stride(&self, slot: u32) -> u32 {
        self.attributes
            .iter()
            .filter(|a| a.slot == slot)
            .map(|a| a.offset + a.format.size_bytes())
            .max()
            .unwrap_or(0)
    }
}

// ===== RASTERIZATION =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Solid,
    Wireframe,
}

/// Depth bias parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBias {
    /// Constant depth offset
    pub constant_factor: i32,
    /// Slope-based depth offset
    pub slope_factor: f32,
    /// Maximum depth bias clamp
    pub clamp: f32,
}

impl Hash for DepthBias {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.constant_factor.hash(state);
        self.slope_factor.to_bits().hash(state);
        self.clamp.to_bits().hash(state);
    }
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy, PartialEq, Hash)]
pub struct RasterizationState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
    pub fill_mode: FillMode,
    /// Depth bias (None = disabled)
    pub depth_bias: Option<DepthBias>,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::Clockwise,
            fill_mode: FillMode::Solid,
            depth_bias: None,
        }
    }
}

// ===== DEPTH/STENCIL =====

/// Comparison operator for depth and stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Depth and stencil testing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    pub depth_test_enable: bool,
    pub depth_write_enable: bool,
    pub depth_compare_op: CompareOp,
    pub stencil_test_enable: bool,
    pub stencil_read_mask: u8,
    pub stencil_write_mask: u8,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        Self {
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: CompareOp::Less,
            stencil_test_enable: false,
            stencil_read_mask: 0xFF,
            stencil_write_mask: 0xFF,
        }
    }
}

// ===== COLOR BLEND =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

/// Color write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorWriteMask {
    pub r: bool,
    pub g: bool,
    pub b: bool,
    pub a: bool,
}

impl ColorWriteMask {
    /// All channels enabled
    pub const ALL: Self = Self { r: true, g: true, b: true, a: true };
    /// No channels enabled
    pub const NONE: Self = Self { r: false, g: false, b: false, a: false };
}

impl Default for ColorWriteMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Color blending state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorBlendState {
    pub blend_enable: bool,
    pub src_color_factor: BlendFactor,
    pub dst_color_factor: BlendFactor,
    pub color_blend_op: BlendOp,
    pub src_alpha_factor: BlendFactor,
    pub dst_alpha_factor: BlendFactor,
    pub alpha_blend_op: BlendOp,
    pub color_write_mask: ColorWriteMask,
}

impl ColorBlendState {
    /// Classic "src over dst" alpha blending
    pub fn alpha_blend() -> Self {
        Self {
            blend_enable: true,
            src_color_factor: BlendFactor::SrcAlpha,
            dst_color_factor: BlendFactor::OneMinusSrcAlpha,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::OneMinusSrcAlpha,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::ALL,
        }
    }
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self {
            blend_enable: false,
            src_color_factor: BlendFactor::One,
            dst_color_factor: BlendFactor::Zero,
            color_blend_op: BlendOp::Add,
            src_alpha_factor: BlendFactor::One,
            dst_alpha_factor: BlendFactor::Zero,
            alpha_blend_op: BlendOp::Add,
            color_write_mask: ColorWriteMask::ALL,
        }
    }
}

// ===== FULL STATE =====

/// Everything a native pipeline needs besides shaders and binding layout
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct FixedFunctionState {
    pub topology: PrimitiveTopology,
    pub vertex_layout: VertexLayout,
    pub rasterization: RasterizationState,
    pub depth_stencil: DepthStencilState,
    pub color_blend: ColorBlendState,
    /// Formats of the bound color targets, in slot order
    pub render_target_formats: Vec<TextureFormat>,
    /// Depth/stencil target format (None = no depth target)
    pub depth_format: Option<TextureFormat>,
    /// Samples per pixel
    pub sample_count: u32,
}

impl FixedFunctionState {
    /// Hash of every field; the outermost component of a pipeline key
    pub fn state_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for FixedFunctionState {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            vertex_layout: VertexLayout::default(),
            rasterization: RasterizationState::default(),
            depth_stencil: DepthStencilState::default(),
            color_blend: ColorBlendState::default(),
            render_target_formats: vec![TextureFormat::R8G8B8A8_UNORM],
            depth_format: Some(TextureFormat::D32_FLOAT),
            sample_count: 1,
        }
    }
}
