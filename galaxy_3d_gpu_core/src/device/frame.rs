/// Per-frame render targets
///
/// The frame loop supplies the back buffer (in the present state between
/// frames), an optional depth buffer (kept in `DepthWrite`) and the
/// viewport/scissor once per frame.

use std::sync::Arc;
use glam::Vec4;
use crate::command::PooledCommandList;
use crate::native::{NativeTexture, Rect2D, ResourceState, Viewport};

#[derive(Clone)]
pub struct FrameTarget {
    pub back_buffer: Arc<dyn NativeTexture>,
    pub depth_buffer: Option<Arc<dyn NativeTexture>>,
    pub viewport: Viewport,
    pub scissor: Rect2D,
    pub clear_color: Vec4,
    pub clear_depth: f32,
}

impl FrameTarget {
    /// Full-target viewport and scissor, opaque black clear, depth cleared to 1.0
    ///
    /// # Panics
    ///
    /// Panics if the back buffer has a depth format or the depth buffer does not.
    pub fn new(back_buffer: Arc<dyn NativeTexture>, depth_buffer: Option<Arc<dyn NativeTexture>>) -> Self {
        let info = *back_buffer.info();
        assert!(
            !info.format.is_depth(),
            "back buffer '{}' has depth format {:?}", back_buffer.as_resource().debug_name(), info.format
        );
        if let Some(depth) = &depth_buffer {
            assert!(
                depth.info().format.is_depth(),
                "depth buffer '{}' has color format {:?}", depth.as_resource().debug_name(), depth.info().format
            );
        }
        Self {
            back_buffer,
            depth_buffer,
            viewport: Viewport::from_size(info.width, info.height),
            scissor: Rect2D::from_size(info.width, info.height),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            clear_depth: 1.0,
        }
    }

    pub fn with_clear_color(mut self, color: Vec4) -> Self {
        self.clear_color = color;
        self
    }

    /// Make the back buffer renderable, bind and clear the targets
    pub fn record_begin_frame(&self, list: &mut PooledCommandList) {
        list.transition_barrier(
            self.back_buffer.as_resource(),
            ResourceState::PRESENT,
            ResourceState::RenderTarget,
        );

        let commands = list.commands();
        commands.set_render_targets(self.back_buffer.as_ref(), self.depth_buffer.as_deref());
        commands.clear_render_target(self.back_buffer.as_ref(), self.clear_color.to_array());
        if let Some(depth) = &self.depth_buffer {
            commands.clear_depth_stencil(depth.as_ref(), self.clear_depth, 0);
        }
        commands.set_viewport(&self.viewport);
        commands.set_scissor(&self.scissor);
    }

    /// Bind targets, viewport and scissor without clearing
    ///
    /// For further lists of the same frame, after `record_begin_frame` ran.
    pub fn record_bind(&self, list: &mut PooledCommandList) {
        let commands = list.commands();
        commands.set_render_targets(self.back_buffer.as_ref(), self.depth_buffer.as_deref());
        commands.set_viewport(&self.viewport);
        commands.set_scissor(&self.scissor);
    }

    /// Return the back buffer to the present state
    pub fn record_end_frame(&self, list: &mut PooledCommandList) {
        list.transition_barrier(
            self.back_buffer.as_resource(),
            ResourceState::RenderTarget,
            ResourceState::PRESENT,
        );
    }
}
