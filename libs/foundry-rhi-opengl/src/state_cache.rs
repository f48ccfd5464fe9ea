// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Mirror of the native binding state.
//!
//! Every setter either issues the native call and updates the mirror in the
//! same step, or returns without touching the driver because the requested
//! object is already current (`Arc::ptr_eq`).

use std::sync::Arc;

use foundry_rhi::{ClipOrigin, Result, RhiError};

use crate::native::{GLboolean, GLint, GLuint};
use crate::resources::{
    Framebuffer, GlDevice, IndirectBuffer, ObjectKind, PipelineState, Program, ResourceGroup,
    VertexArray,
};

fn same<T>(current: &Option<Arc<T>>, requested: &Arc<T>) -> bool {
    current.as_ref().is_some_and(|c| Arc::ptr_eq(c, requested))
}

/// Bindings of the current context as last set through the dispatch layer.
#[derive(Debug, Default)]
pub struct StateCache {
    pipeline: Option<Arc<PipelineState>>,
    program: Option<Arc<Program>>,
    vertex_array: Option<Arc<VertexArray>>,
    /// `None` is the default framebuffer.
    render_target: Option<Arc<Framebuffer>>,
    resource_group: Option<Arc<ResourceGroup>>,
    indirect_buffer: Option<Arc<IndirectBuffer>>,
    patch_control_points: Option<u8>,
    clip_origin: ClipOrigin,
    /// Last start instance uploaded to the draw-ID uniform of `program`.
    start_instance: Option<u32>,
    scissor_enabled: bool,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline(&self) -> Option<&Arc<PipelineState>> {
        self.pipeline.as_ref()
    }

    pub fn program(&self) -> Option<&Arc<Program>> {
        self.program.as_ref()
    }

    pub fn vertex_array(&self) -> Option<&Arc<VertexArray>> {
        self.vertex_array.as_ref()
    }

    pub fn render_target(&self) -> Option<&Arc<Framebuffer>> {
        self.render_target.as_ref()
    }

    pub fn resource_group(&self) -> Option<&Arc<ResourceGroup>> {
        self.resource_group.as_ref()
    }

    pub fn clip_origin(&self) -> ClipOrigin {
        self.clip_origin
    }

    /// Apply program and fixed-function state. Returns whether anything was issued.
    pub fn set_pipeline(&mut self, device: &GlDevice, pipeline: &Arc<PipelineState>) -> bool {
        if same(&self.pipeline, pipeline) {
            return false;
        }
        let core = device.core();

        // SAFETY: the program is kept alive by the cached pipeline.
        unsafe {
            if !same(&self.program, pipeline.program()) {
                (core.use_program)(pipeline.program().object().name());
                self.program = Some(Arc::clone(pipeline.program()));
                self.start_instance = None;
            }

            match pipeline.blend() {
                Some(factors) => {
                    (core.enable)(gl::BLEND);
                    (core.blend_func_separate)(
                        factors.src_rgb,
                        factors.dst_rgb,
                        factors.src_alpha,
                        factors.dst_alpha,
                    );
                }
                None => (core.disable)(gl::BLEND),
            }

            let depth = pipeline.descriptor().depth_stencil;
            if depth.depth_enable {
                (core.enable)(gl::DEPTH_TEST);
                (core.depth_func)(pipeline.depth_func());
            } else {
                (core.disable)(gl::DEPTH_TEST);
            }
            (core.depth_mask)(depth.depth_write as GLboolean);

            if let (Some(points), Some(tessellation)) = (
                pipeline.patch_control_points(),
                device.capabilities().tessellation,
            ) {
                if self.patch_control_points != Some(points) {
                    (tessellation.patch_parameteri)(gl::PATCH_VERTICES, points as GLint);
                    self.patch_control_points = Some(points);
                }
            }
        }

        self.pipeline = Some(Arc::clone(pipeline));
        true
    }

    pub fn set_vertex_array(&mut self, device: &GlDevice, vertex_array: &Arc<VertexArray>) -> bool {
        if same(&self.vertex_array, vertex_array) {
            return false;
        }
        // SAFETY: the vertex array is kept alive by the cache.
        unsafe { (device.gl3().bind_vertex_array)(vertex_array.object().name()) };
        self.vertex_array = Some(Arc::clone(vertex_array));
        true
    }

    /// `None` selects the default framebuffer.
    pub fn set_render_target(
        &mut self,
        device: &GlDevice,
        target: Option<&Arc<Framebuffer>>,
    ) -> bool {
        let unchanged = match (target, &self.render_target) {
            (Some(requested), current) => same(current, requested),
            (None, current) => current.is_none(),
        };
        if unchanged {
            return false;
        }
        let name = target.map_or(0, |t| t.object().name());
        // SAFETY: the framebuffer is kept alive by the cache.
        unsafe { (device.gl3().bind_framebuffer)(gl::FRAMEBUFFER, name) };
        self.render_target = target.cloned();
        true
    }

    pub fn set_resource_group(&mut self, device: &GlDevice, group: &Arc<ResourceGroup>) -> bool {
        if same(&self.resource_group, group) {
            return false;
        }
        group.bind(device);
        self.resource_group = Some(Arc::clone(group));
        true
    }

    /// Bind the GPU storage of `buffer` to `GL_DRAW_INDIRECT_BUFFER`.
    pub fn set_indirect_buffer(&mut self, device: &GlDevice, buffer: &Arc<IndirectBuffer>) -> bool {
        if same(&self.indirect_buffer, buffer) {
            return false;
        }
        let Some(object) = buffer.native() else {
            return false;
        };
        // SAFETY: the buffer is kept alive by the cache.
        unsafe { (device.core().bind_buffer)(gl::DRAW_INDIRECT_BUFFER, object.name()) };
        self.indirect_buffer = Some(Arc::clone(buffer));
        true
    }

    /// Needs clip control for anything but the native lower-left origin.
    pub fn set_clip_origin(&mut self, device: &GlDevice, origin: ClipOrigin) -> Result<bool> {
        if self.clip_origin == origin {
            return Ok(false);
        }
        let Some(clip_control) = device.capabilities().clip_control else {
            return match origin {
                ClipOrigin::LowerLeft => {
                    self.clip_origin = origin;
                    Ok(false)
                }
                ClipOrigin::UpperLeft => Err(RhiError::NotSupported(
                    "upper-left clip origin without clip control".to_string(),
                )),
            };
        };

        let (native_origin, depth) = match origin {
            ClipOrigin::LowerLeft => (gl::LOWER_LEFT, gl::NEGATIVE_ONE_TO_ONE),
            ClipOrigin::UpperLeft => (gl::UPPER_LEFT, gl::ZERO_TO_ONE),
        };
        // SAFETY: plain enum arguments.
        unsafe { (clip_control.clip_control)(native_origin, depth) };
        self.clip_origin = origin;
        Ok(true)
    }

    /// Upload the draw-ID uniform of the current program when it changed.
    pub fn set_start_instance(&mut self, device: &GlDevice, start_instance: u32) -> bool {
        let Some(location) = self.program.as_ref().and_then(|p| p.draw_id_location()) else {
            return false;
        };
        if self.start_instance == Some(start_instance) {
            return false;
        }
        // SAFETY: the program owning `location` is current.
        unsafe { (device.gl3().uniform_1ui)(location, start_instance as GLuint) };
        self.start_instance = Some(start_instance);
        true
    }

    pub fn set_scissor_enabled(&mut self, device: &GlDevice, enabled: bool) -> bool {
        if self.scissor_enabled == enabled {
            return false;
        }
        let core = device.core();
        // SAFETY: plain capability toggle.
        unsafe {
            if enabled {
                (core.enable)(gl::SCISSOR_TEST);
            } else {
                (core.disable)(gl::SCISSOR_TEST);
            }
        }
        self.scissor_enabled = enabled;
        true
    }

    /// Re-establish the cached binding a bind-to-edit creation of `kind`
    /// replaced.
    pub fn restore_after_edit(&mut self, device: &GlDevice, kind: ObjectKind) {
        // SAFETY: cached objects are alive; 0 restores the default binding.
        unsafe {
            match kind {
                ObjectKind::VertexArray => {
                    let name = self.vertex_array.as_ref().map_or(0, |v| v.object().name());
                    (device.gl3().bind_vertex_array)(name);
                }
                ObjectKind::Framebuffer => {
                    let name = self.render_target.as_ref().map_or(0, |f| f.object().name());
                    (device.gl3().bind_framebuffer)(gl::FRAMEBUFFER, name);
                }
                // Unit 0 was rebound; the group must be bound again.
                ObjectKind::Texture => self.resource_group = None,
                ObjectKind::Buffer | ObjectKind::Program | ObjectKind::Sampler => {}
            }
        }
    }

    /// Forget everything; the native context starts from defaults.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};
    use foundry_rhi::{BufferUsage, PipelineStateDescriptor, VertexAttributes};

    fn program(device: &Arc<GlDevice>) -> Arc<Program> {
        Arc::new(Program::create(device, "void main() {}", "void main() {}", None).unwrap())
    }

    fn vertex_array(device: &Arc<GlDevice>) -> Arc<VertexArray> {
        Arc::new(VertexArray::create(device, &VertexAttributes::default(), &[], None).unwrap())
    }

    #[test]
    fn test_same_vertex_array_binds_once() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let vao = vertex_array(&device);
        let mut cache = StateCache::new();

        assert!(cache.set_vertex_array(&device, &vao));
        assert!(!cache.set_vertex_array(&device, &vao));
        assert_eq!(with_driver(|d| d.call_count("glBindVertexArray")), 1);
    }

    #[test]
    fn test_pipelines_sharing_a_program_use_it_once() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let program = program(&device);
        let first = Arc::new(PipelineState::create(
            &device,
            Arc::clone(&program),
            &PipelineStateDescriptor::default(),
        ));
        let second = Arc::new(PipelineState::create(
            &device,
            program,
            &PipelineStateDescriptor::default(),
        ));
        let mut cache = StateCache::new();

        assert!(cache.set_pipeline(&device, &first));
        assert!(cache.set_pipeline(&device, &second));
        assert!(!cache.set_pipeline(&device, &second));
        assert_eq!(with_driver(|d| d.call_count("glUseProgram")), 1);
    }

    #[test]
    fn test_upper_left_origin_needs_clip_control() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let mut cache = StateCache::new();
        assert!(!cache.set_clip_origin(&device, ClipOrigin::LowerLeft).unwrap());
        assert!(matches!(
            cache.set_clip_origin(&device, ClipOrigin::UpperLeft),
            Err(RhiError::NotSupported(_))
        ));
        assert_eq!(cache.clip_origin(), ClipOrigin::LowerLeft);

        let device = fake_device(FakeDriverState::desktop(4, 6));
        let mut cache = StateCache::new();
        assert!(cache.set_clip_origin(&device, ClipOrigin::UpperLeft).unwrap());
        assert_eq!(
            with_driver(|d| d.clip_control),
            Some((gl::UPPER_LEFT, gl::ZERO_TO_ONE))
        );
    }

    #[test]
    fn test_restore_after_bind_to_edit() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let mut cache = StateCache::new();
        let current = vertex_array(&device);
        cache.set_vertex_array(&device, &current);

        // Creating another vertex array leaves it bound.
        let _other = vertex_array(&device);
        assert_ne!(with_driver(|d| d.binding(gl::VERTEX_ARRAY_BINDING)), current.object().name());

        cache.restore_after_edit(&device, ObjectKind::VertexArray);
        assert_eq!(
            with_driver(|d| d.binding(gl::VERTEX_ARRAY_BINDING)),
            current.object().name()
        );
    }

    #[test]
    fn test_emulated_indirect_buffer_is_never_bound() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let buffer =
            Arc::new(IndirectBuffer::create(&device, &[0u8; 16], BufferUsage::StaticDraw).unwrap());
        let mut cache = StateCache::new();
        assert!(!cache.set_indirect_buffer(&device, &buffer));
        assert_eq!(with_driver(|d| d.binding(gl::DRAW_INDIRECT_BUFFER)), 0);
    }

    #[test]
    fn test_reset_forgets_bindings() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let vao = vertex_array(&device);
        let mut cache = StateCache::new();
        cache.set_vertex_array(&device, &vao);
        cache.reset();
        assert!(cache.vertex_array().is_none());
        assert!(cache.set_vertex_array(&device, &vao));
    }
}
