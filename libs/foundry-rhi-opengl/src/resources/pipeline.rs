// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use foundry_rhi::{PipelineStateDescriptor, PrimitiveTopology};

use super::{GlDevice, Program};
use crate::mapping;
use crate::native::GLenum;

/// Native blend factors in `glBlendFuncSeparate` argument order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlendFactors {
    pub src_rgb: GLenum,
    pub dst_rgb: GLenum,
    pub src_alpha: GLenum,
    pub dst_alpha: GLenum,
}

/// Program plus fixed-function state, translated once at creation.
#[derive(Debug)]
pub struct PipelineState {
    program: Arc<Program>,
    descriptor: PipelineStateDescriptor,
    topology: GLenum,
    patch_control_points: Option<u8>,
    blend: Option<BlendFactors>,
    depth_func: GLenum,
}

impl PipelineState {
    pub fn create(
        device: &Arc<GlDevice>,
        program: Arc<Program>,
        descriptor: &PipelineStateDescriptor,
    ) -> Self {
        let profile = device.profile();
        let requested = descriptor.primitive_topology;
        let topology = mapping::primitive_topology(requested, profile);

        if requested.is_adjacency() && !profile.adjacency {
            tracing::warn!(
                "{:?} needs geometry shaders, drawing {:?} instead",
                requested,
                requested.without_adjacency()
            );
        }
        let patch_control_points = match requested {
            PrimitiveTopology::PatchList(points) if profile.tessellation => Some(points),
            PrimitiveTopology::PatchList(_) => {
                tracing::warn!("{:?} needs tessellation, drawing triangles instead", requested);
                None
            }
            _ => None,
        };

        let blend = descriptor.blend.enabled.then(|| BlendFactors {
            src_rgb: mapping::blend_factor(descriptor.blend.src),
            dst_rgb: mapping::blend_factor(descriptor.blend.dest),
            src_alpha: mapping::blend_factor(descriptor.blend.src_alpha),
            dst_alpha: mapping::blend_factor(descriptor.blend.dest_alpha),
        });

        Self {
            program,
            descriptor: *descriptor,
            topology,
            patch_control_points,
            blend,
            depth_func: mapping::comparison_func(descriptor.depth_stencil.depth_func),
        }
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.program
    }

    pub fn descriptor(&self) -> &PipelineStateDescriptor {
        &self.descriptor
    }

    /// Native primitive mode used by every draw with this pipeline.
    pub fn topology(&self) -> GLenum {
        self.topology
    }

    /// Vertices per patch when drawing `GL_PATCHES`.
    pub fn patch_control_points(&self) -> Option<u8> {
        self.patch_control_points
    }

    /// `None` when blending is disabled.
    pub fn blend(&self) -> Option<BlendFactors> {
        self.blend
    }

    pub fn depth_func(&self) -> GLenum {
        self.depth_func
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, FakeDriverState};
    use foundry_rhi::BlendStateDescriptor;

    fn program(device: &Arc<GlDevice>) -> Arc<Program> {
        Arc::new(Program::create(device, "void main() {}", "void main() {}", None).unwrap())
    }

    #[test]
    fn test_patches_without_tessellation_draw_triangles() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let descriptor = PipelineStateDescriptor {
            primitive_topology: PrimitiveTopology::PatchList(3),
            ..PipelineStateDescriptor::default()
        };
        let pipeline = PipelineState::create(&device, program(&device), &descriptor);
        assert_eq!(pipeline.topology(), gl::TRIANGLES);
        assert_eq!(pipeline.patch_control_points(), None);
    }

    #[test]
    fn test_patches_with_tessellation() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let descriptor = PipelineStateDescriptor {
            primitive_topology: PrimitiveTopology::PatchList(4),
            ..PipelineStateDescriptor::default()
        };
        let pipeline = PipelineState::create(&device, program(&device), &descriptor);
        assert_eq!(pipeline.topology(), gl::PATCHES);
        assert_eq!(pipeline.patch_control_points(), Some(4));
    }

    #[test]
    fn test_blend_and_depth_translation() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let descriptor = PipelineStateDescriptor {
            blend: BlendStateDescriptor::alpha_blending(),
            ..PipelineStateDescriptor::default()
        };
        let pipeline = PipelineState::create(&device, program(&device), &descriptor);
        assert_eq!(
            pipeline.blend(),
            Some(BlendFactors {
                src_rgb: gl::SRC_ALPHA,
                dst_rgb: gl::ONE_MINUS_SRC_ALPHA,
                src_alpha: gl::ONE,
                dst_alpha: gl::ONE_MINUS_SRC_ALPHA,
            })
        );
        assert_eq!(pipeline.depth_func(), gl::GREATER);

        let opaque = PipelineState::create(&device, program(&device), &PipelineStateDescriptor::default());
        assert_eq!(opaque.blend(), None);
    }
}
