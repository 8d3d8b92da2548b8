/// Draw recording
///
/// A draw resolves its pipeline and binding layout through the cache,
/// sets the material's heaps on the combination's resource table, binds
/// everything into the list and issues the draw.

use crate::command::PooledCommandList;
use crate::device::{MaterialBinding, RenderDevice};
use crate::engine_error;
use crate::error::{Error, Result};
use crate::native::{FixedFunctionState, IndexBufferView, VertexBufferView};
use crate::pipeline::PipelineRequest;
use crate::shader::ShaderCombination;

/// One draw, as supplied by the mesh/scene side
pub struct DrawRequest<'a> {
    pub shaders: &'a ShaderCombination,
    pub state: &'a FixedFunctionState,
    pub material: &'a MaterialBinding,
    pub vertex_buffer: &'a VertexBufferView,
    pub index_buffer: Option<&'a IndexBufferView>,
    /// Vertices (indices when indexed) to draw; None draws the whole buffer
    pub count: Option<u32>,
}

impl DrawRequest<'_> {
    /// Element count the draw will issue
    pub fn element_count(&self) -> u32 {
        match (self.count, self.index_buffer) {
            (Some(count), _) => count,
            (None, Some(indices)) => indices.index_count(),
            (None, None) => self.vertex_buffer.vertex_count(),
        }
    }
}

impl RenderDevice {
    /// Record `request` into `list`
    ///
    /// Pipeline and binding-layout creation failures on a cache miss are
    /// fatal API errors and propagate unchanged. A vertex buffer whose
    /// stride is shorter than the vertex layout is `InvalidResource`.
    pub fn record_draw(&mut self, list: &mut PooledCommandList, request: &DrawRequest<'_>) -> Result<()> {
        let layout_stride = request.state.vertex_layout.stride(0);
        if request.vertex_buffer.stride < layout_stride {
            let message = format!(
                "Vertex buffer '{}' stride {} is shorter than the vertex layout ({} bytes)",
                request.vertex_buffer.buffer.as_resource().debug_name(), request.vertex_buffer.stride, layout_stride
            );
            engine_error!("galaxy3d::RenderDevice", "{}", message);
            return Err(Error::InvalidResource(message));
        }

        let key = self.resource_table_for(request.shaders);
        request.material.bind_to(&mut self.resource_tables[key]);

        let table = &self.resource_tables[key];
        let pipeline_request = PipelineRequest::new(request.state, request.shaders, table);
        let pipeline = self.pipeline_cache.get_pipeline(self.native.as_ref(), &pipeline_request)?;
        let layout = self.pipeline_cache.get_binding_layout(self.native.as_ref(), table)?;

        let commands = list.commands();
        commands.set_pipeline(pipeline.as_ref());
        commands.set_binding_layout(layout.as_ref());
        table.apply_to_command_list(list);

        let count = request.element_count();
        let commands = list.commands();
        commands.set_primitive_topology(request.state.topology);
        commands.set_vertex_buffer(0, request.vertex_buffer);
        match request.index_buffer {
            Some(indices) => {
                commands.set_index_buffer(indices);
                commands.draw_indexed(count, 0, 0);
            }
            None => commands.draw(count, 0),
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "draw_tests.rs"]
mod tests;
