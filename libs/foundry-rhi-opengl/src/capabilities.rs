// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Effective optional features: the core bundle when the version has it,
//! the extension bundle otherwise.

use crate::entry_points::*;
use crate::extensions::ExtensionRegistry;
use crate::loader::VersionGatedFunctions;

#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub draw_base_vertex: Option<DrawBaseVertexFunctions>,
    pub tessellation: Option<TessellationFunctions>,
    pub draw_indirect: Option<DrawIndirectFunctions>,
    pub texture_storage: Option<TextureStorageFunctions>,
    pub base_instance: Option<BaseInstanceFunctions>,
    pub multi_draw_indirect: Option<MultiDrawIndirectFunctions>,
    pub debug: Option<DebugFunctions>,
    pub clip_control: Option<ClipControlFunctions>,
    pub direct_state_access: Option<DirectStateAccessFunctions>,
    pub swap_control: Option<SwapControlFunctions>,
    /// Largest sampler anisotropy, when anisotropic filtering is available.
    pub max_anisotropy: Option<f32>,
    /// Start instance is passed through a uniform instead of natively.
    pub emulate_draw_id: bool,
}

impl Capabilities {
    pub fn resolve(gated: &VersionGatedFunctions, extensions: &ExtensionRegistry) -> Self {
        Self {
            draw_base_vertex: gated
                .draw_base_vertex
                .or(extensions.draw_base_vertex().copied()),
            tessellation: gated.tessellation,
            draw_indirect: gated.draw_indirect.or(extensions.draw_indirect().copied()),
            texture_storage: gated
                .texture_storage
                .or(extensions.texture_storage().copied()),
            base_instance: gated.base_instance.or(extensions.base_instance().copied()),
            multi_draw_indirect: gated
                .multi_draw_indirect
                .or(extensions.multi_draw_indirect().copied()),
            debug: gated.debug.or(extensions.debug().copied()),
            clip_control: gated.clip_control.or(extensions.clip_control().copied()),
            direct_state_access: gated
                .direct_state_access
                .or(extensions.direct_state_access().copied()),
            swap_control: extensions.swap_control().copied(),
            max_anisotropy: None,
            emulate_draw_id: false,
        }
    }

    /// Indirect draws can read GPU buffers.
    pub fn native_indirect(&self) -> bool {
        self.draw_indirect.is_some() || self.multi_draw_indirect.is_some()
    }

    pub fn has_direct_state_access(&self) -> bool {
        self.direct_state_access.is_some()
    }
}
