// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use foundry_rhi::{Result, RhiError, SamplerStateDescriptor};

use super::{ContainerObject, GlDevice, ObjectKind};
use crate::mapping;
use crate::native::{ext, GLint, GLuint};

/// Sampler object. Sampler state never needs binding to edit.
#[derive(Debug)]
pub struct SamplerState {
    object: ContainerObject,
    descriptor: SamplerStateDescriptor,
}

impl SamplerState {
    pub fn create(device: &Arc<GlDevice>, descriptor: &SamplerStateDescriptor) -> Result<Self> {
        let gl3 = device.gl3();
        let profile = device.profile();
        let mut name: GLuint = 0;

        // SAFETY: parameters are plain values on a sampler this call owns.
        unsafe {
            match device.capabilities().direct_state_access {
                Some(dsa) => (dsa.create_samplers)(1, &mut name),
                None => (gl3.gen_samplers)(1, &mut name),
            }
            if name == 0 {
                return Err(RhiError::ResourceCreation(
                    "driver returned no sampler name".to_string(),
                ));
            }

            let filter = descriptor.filter;
            let parameters = [
                (gl::TEXTURE_MIN_FILTER, mapping::min_filter(filter, true)),
                (gl::TEXTURE_MAG_FILTER, mapping::mag_filter(filter)),
                (gl::TEXTURE_WRAP_S, mapping::address_mode(descriptor.address_u, profile)),
                (gl::TEXTURE_WRAP_T, mapping::address_mode(descriptor.address_v, profile)),
                (gl::TEXTURE_WRAP_R, mapping::address_mode(descriptor.address_w, profile)),
                (gl::TEXTURE_COMPARE_MODE, mapping::compare_mode(filter, profile)),
                (
                    gl::TEXTURE_COMPARE_FUNC,
                    mapping::comparison_func(descriptor.comparison_func),
                ),
            ];
            for (parameter, value) in parameters {
                (gl3.sampler_parameteri)(name, parameter, value as GLint);
            }

            (gl3.sampler_parameterf)(name, gl::TEXTURE_MIN_LOD, descriptor.min_lod);
            (gl3.sampler_parameterf)(name, gl::TEXTURE_MAX_LOD, descriptor.max_lod);
            if profile.border_clamp {
                (gl3.sampler_parameterfv)(
                    name,
                    gl::TEXTURE_BORDER_COLOR,
                    descriptor.border_color.as_ptr(),
                );
            }
            if let Some(max) = device.capabilities().max_anisotropy {
                if filter.is_anisotropic() {
                    let anisotropy = (descriptor.max_anisotropy as f32).clamp(1.0, max.max(1.0));
                    (gl3.sampler_parameterf)(name, ext::TEXTURE_MAX_ANISOTROPY_EXT, anisotropy);
                }
            }
        }

        Ok(Self {
            object: ContainerObject::new(device, ObjectKind::Sampler, name),
            descriptor: *descriptor,
        })
    }

    pub fn object(&self) -> &ContainerObject {
        &self.object
    }

    pub fn descriptor(&self) -> &SamplerStateDescriptor {
        &self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};
    use foundry_rhi::{FilterMode, TextureAddressMode};

    #[test]
    fn test_border_sampler_on_es30_clamps_to_edge() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let descriptor = SamplerStateDescriptor {
            address_u: TextureAddressMode::Border,
            ..SamplerStateDescriptor::default()
        };
        let sampler = SamplerState::create(&device, &descriptor).unwrap();
        let name = sampler.object().name();
        with_driver(|d| {
            assert_eq!(
                d.sampler_parameter(name, gl::TEXTURE_WRAP_S),
                Some(gl::CLAMP_TO_EDGE as GLint)
            );
            assert_eq!(d.call_count("glSamplerParameterfv"), 0);
        });
    }

    #[test]
    fn test_comparison_sampler_on_es_falls_back() {
        let device = fake_device(FakeDriverState::es(3, 2));
        let descriptor = SamplerStateDescriptor {
            filter: FilterMode::ComparisonMinMagMipLinear,
            ..SamplerStateDescriptor::default()
        };
        let sampler = SamplerState::create(&device, &descriptor).unwrap();
        let name = sampler.object().name();
        with_driver(|d| {
            assert_eq!(
                d.sampler_parameter(name, gl::TEXTURE_COMPARE_MODE),
                Some(gl::NONE as GLint)
            );
            assert_eq!(
                d.sampler_parameter(name, gl::TEXTURE_MIN_FILTER),
                Some(gl::LINEAR_MIPMAP_LINEAR as GLint)
            );
        });
    }

    #[test]
    fn test_comparison_sampler() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let descriptor = SamplerStateDescriptor {
            filter: FilterMode::ComparisonMinMagMipLinear,
            ..SamplerStateDescriptor::default()
        };
        let sampler = SamplerState::create(&device, &descriptor).unwrap();
        let name = sampler.object().name();
        with_driver(|d| {
            assert_eq!(
                d.sampler_parameter(name, gl::TEXTURE_COMPARE_MODE),
                Some(gl::COMPARE_REF_TO_TEXTURE as GLint)
            );
            assert_eq!(
                d.sampler_parameter(name, gl::TEXTURE_MIN_FILTER),
                Some(gl::LINEAR_MIPMAP_LINEAR as GLint)
            );
            assert_eq!(d.call_count("glCreateSamplers"), 1);
        });
    }
}
