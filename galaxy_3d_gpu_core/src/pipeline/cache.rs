/// Pipeline state cache
///
/// Maps a `PipelineKey` to the native pipeline built for it, and a
/// binding-layout hash to the native binding layout. Entries are built on
/// first miss and live as long as the cache: equal keys always resolve to
/// the same native object.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::{Error, Result};
use crate::native::{FixedFunctionState, NativeBindingLayout, NativeDevice, NativePipeline, NativePipelineDesc};
use crate::pipeline::GpuResourceTable;
use crate::shader::{ShaderCombination, ShaderCombinationKey, ShaderHash};
use crate::{engine_debug, engine_error};

/// Identity of a native pipeline
///
/// Fields are ordered from least to most frequently changing across the
/// draws of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    /// Hash of the fixed-function state
    pub state_hash: u64,
    /// Structural hash of the binding layout
    pub layout_hash: u64,
    pub pixel: Option<ShaderHash>,
    pub vertex: Option<ShaderHash>,
    pub geometry: Option<ShaderHash>,
}

impl PipelineKey {
    pub fn new(state_hash: u64, layout_hash: u64, shaders: ShaderCombinationKey) -> Self {
        Self {
            state_hash,
            layout_hash,
            pixel: shaders.pixel,
            vertex: shaders.vertex,
            geometry: shaders.geometry,
        }
    }

    /// Shader part of the key
    pub fn shaders(&self) -> ShaderCombinationKey {
        ShaderCombinationKey {
            vertex: self.vertex,
            pixel: self.pixel,
            geometry: self.geometry,
        }
    }
}

/// Everything the cache needs to resolve or build one pipeline
#[derive(Clone, Copy)]
pub struct PipelineRequest<'a> {
    pub state: &'a FixedFunctionState,
    pub shaders: &'a ShaderCombination,
    /// Table derived from `shaders`
    pub resource_table: &'a GpuResourceTable,
}

impl<'a> PipelineRequest<'a> {
    pub fn new(state: &'a FixedFunctionState, shaders: &'a ShaderCombination, resource_table: &'a GpuResourceTable) -> Self {
        debug_assert_eq!(
            resource_table.combination(), shaders.key(),
            "resource table was derived from another shader combination"
        );
        Self { state, shaders, resource_table }
    }

    pub fn key(&self) -> PipelineKey {
        PipelineKey::new(
            self.state.state_hash(),
            self.resource_table.binding_layout_hash(),
            self.shaders.key(),
        )
    }
}

#[derive(Default)]
pub struct PipelineStateCache {
    pipelines: FxHashMap<PipelineKey, Arc<dyn NativePipeline>>,
    binding_layouts: FxHashMap<u64, Arc<dyn NativeBindingLayout>>,
    hits: u64,
    misses: u64,
}

impl PipelineStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the pipeline for `request`, building it (and its binding layout) on a miss
    ///
    /// # Arguments
    ///
    /// * `device` - Device that builds native objects on a miss
    /// * `request` - Fixed-function state, shaders and their resource table
    pub fn get_pipeline(&mut self, device: &dyn NativeDevice, request: &PipelineRequest<'_>) -> Result<Arc<dyn NativePipeline>> {
        let key = request.key();
        if let Some(pipeline) = self.pipelines.get(&key) {
            self.hits += 1;
            return Ok(pipeline.clone());
        }
        self.misses += 1;
        engine_debug!("galaxy3d::PipelineStateCache", "Cache miss for {:?}", key);

        let binding_layout = self.get_binding_layout(device, request.resource_table)?;
        let desc = NativePipelineDesc {
            state: request.state,
            shaders: request.shaders,
            binding_layout: &binding_layout,
        };
        let pipeline = device.create_pipeline(&desc).map_err(|e| log_failure("pipeline", e))?;

        self.pipelines.insert(key, pipeline.clone());
        engine_debug!("galaxy3d::PipelineStateCache", "Created pipeline ({} cached)", self.pipelines.len());
        Ok(pipeline)
    }

    /// Resolve the binding layout of `table`, building it on a miss
    pub fn get_binding_layout(&mut self, device: &dyn NativeDevice, table: &GpuResourceTable) -> Result<Arc<dyn NativeBindingLayout>> {
        let hash = table.binding_layout_hash();
        if let Some(layout) = self.binding_layouts.get(&hash) {
            debug_assert_eq!(layout.desc(), table.binding_layout_desc(), "binding layout hash collision");
            return Ok(layout.clone());
        }

        let layout = device
            .create_binding_layout(table.binding_layout_desc())
            .map_err(|e| log_failure("binding layout", e))?;
        engine_debug!("galaxy3d::PipelineStateCache",
            "Created binding layout with {} slot(s) (hash {:#018x})", table.slot_count(), hash);
        self.binding_layouts.insert(hash, layout.clone());
        Ok(layout)
    }

    /// Cached pipeline for `key`, without building
    pub fn lookup(&self, key: &PipelineKey) -> Option<&Arc<dyn NativePipeline>> {
        self.pipelines.get(key)
    }

    /// Cached binding layout for `layout_hash`, without building
    pub fn lookup_binding_layout(&self, layout_hash: u64) -> Option<&Arc<dyn NativeBindingLayout>> {
        self.binding_layouts.get(&layout_hash)
    }

    /// Number of cached pipelines
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }

    pub fn binding_layout_count(&self) -> usize {
        self.binding_layouts.len()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

fn log_failure(what: &str, error: Error) -> Error {
    engine_error!("galaxy3d::PipelineStateCache", "Failed to create {}: {}", what, error);
    error
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
