// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use super::{GlDevice, SamplerState, Texture2D};
use crate::native::GLuint;

/// One texture unit: a texture and the sampler that reads it.
#[derive(Debug, Clone)]
pub struct ResourceBinding {
    pub texture: Arc<Texture2D>,
    pub sampler: Option<Arc<SamplerState>>,
}

/// Textures and samplers bound together to consecutive units starting at 0.
#[derive(Debug)]
pub struct ResourceGroup {
    bindings: Vec<ResourceBinding>,
}

impl ResourceGroup {
    pub fn new(bindings: Vec<ResourceBinding>) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &[ResourceBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind every entry to its unit. Units without a sampler fall back to
    /// the texture's own parameters.
    pub(crate) fn bind(&self, device: &GlDevice) {
        let core = device.core();
        let gl3 = device.gl3();
        // SAFETY: every name is owned by an `Arc` this group holds.
        unsafe {
            for (unit, binding) in self.bindings.iter().enumerate() {
                let unit = unit as GLuint;
                let texture = binding.texture.object().name();
                match device.capabilities().direct_state_access {
                    Some(dsa) => (dsa.bind_texture_unit)(unit, texture),
                    None => {
                        (core.active_texture)(gl::TEXTURE0 + unit);
                        (core.bind_texture)(gl::TEXTURE_2D, texture);
                    }
                }
                let sampler = binding.sampler.as_ref().map_or(0, |s| s.object().name());
                (gl3.bind_sampler)(unit, sampler);
            }
        }
    }
}
