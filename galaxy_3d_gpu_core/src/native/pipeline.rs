/// Native pipeline and binding layout traits

use std::any::Any;
use std::sync::Arc;
use crate::native::{BindingLayoutDesc, FixedFunctionState};
use crate::shader::ShaderCombination;

/// Compiled shaders plus all fixed-function draw state
///
/// Built once per unique pipeline key and shared by the cache and every
/// list that binds it. Destroyed when the last Arc is dropped.
pub trait NativePipeline: Send + Sync {
    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Native binding layout (root signature equivalent)
pub trait NativeBindingLayout: Send + Sync {
    /// Description the layout was built from
    fn desc(&self) -> &BindingLayoutDesc;

    /// Downcast support for backends
    fn as_any(&self) -> &dyn Any;
}

/// Everything needed to build a native pipeline object
pub struct NativePipelineDesc<'a> {
    pub state: &'a FixedFunctionState,
    pub shaders: &'a ShaderCombination,
    pub binding_layout: &'a Arc<dyn NativeBindingLayout>,
}
