// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Extension negotiation.
//!
//! The registry records which tracked extensions the driver advertises and
//! resolves the entry points of those that bring functions. An extension
//! whose functions do not resolve is treated as absent.

use std::collections::HashSet;

use foundry_rhi::services::tokenize;
use foundry_rhi::{Result, RhiError};

use crate::entry_points::*;
use crate::loader::RuntimeLinking;
use crate::native::{driver_string, GLenum, GLint, GLubyte, GLuint, GlVersion};

macro_rules! tracked_extensions {
    ($( $variant:ident => $name:literal, $getter:ident; )*) => {
        /// Extensions the backend knows how to use.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Extension {
            $( $variant, )*
        }

        impl Extension {
            pub const ALL: &'static [Self] = &[$(Self::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Self::$variant), )*
                    _ => None,
                }
            }
        }

        impl ExtensionRegistry {
            $(
                #[doc = concat!("`", $name, "`")]
                pub fn $getter(&self) -> bool {
                    self.flag(Extension::$variant)
                }
            )*
        }
    };
}

tracked_extensions! {
    WglArbCreateContext => "WGL_ARB_create_context", is_wgl_arb_create_context;
    WglExtSwapControl => "WGL_EXT_swap_control", is_wgl_ext_swap_control;
    GlxArbCreateContext => "GLX_ARB_create_context", is_glx_arb_create_context;
    EglKhrCreateContext => "EGL_KHR_create_context", is_egl_khr_create_context;
    ExtTextureCompressionS3tc => "GL_EXT_texture_compression_s3tc", is_gl_ext_texture_compression_s3tc;
    ExtTextureSrgb => "GL_EXT_texture_sRGB", is_gl_ext_texture_srgb;
    ExtTextureCompressionS3tcSrgb => "GL_EXT_texture_compression_s3tc_srgb", is_gl_ext_texture_compression_s3tc_srgb;
    OesCompressedEtc1Rgb8Texture => "GL_OES_compressed_ETC1_RGB8_texture", is_gl_oes_compressed_etc1_rgb8_texture;
    ExtTextureFilterAnisotropic => "GL_EXT_texture_filter_anisotropic", is_gl_ext_texture_filter_anisotropic;
    ExtTextureBorderClamp => "GL_EXT_texture_border_clamp", is_gl_ext_texture_border_clamp;
    ArbTextureMirrorClampToEdge => "GL_ARB_texture_mirror_clamp_to_edge", is_gl_arb_texture_mirror_clamp_to_edge;
    ExtTextureFormatBgra8888 => "GL_EXT_texture_format_BGRA8888", is_gl_ext_texture_format_bgra8888;
    ExtTextureNorm16 => "GL_EXT_texture_norm16", is_gl_ext_texture_norm16;
    ExtGeometryShader => "GL_EXT_geometry_shader", is_gl_ext_geometry_shader;
    ExtTessellationShader => "GL_EXT_tessellation_shader", is_gl_ext_tessellation_shader;
    ArbShaderDrawParameters => "GL_ARB_shader_draw_parameters", is_gl_arb_shader_draw_parameters;
    NvMeshShader => "GL_NV_mesh_shader", is_gl_nv_mesh_shader;
    ArbDirectStateAccess => "GL_ARB_direct_state_access", is_gl_arb_direct_state_access;
    ArbBaseInstance => "GL_ARB_base_instance", is_gl_arb_base_instance;
    ArbDrawIndirect => "GL_ARB_draw_indirect", is_gl_arb_draw_indirect;
    ArbMultiDrawIndirect => "GL_ARB_multi_draw_indirect", is_gl_arb_multi_draw_indirect;
    ArbClipControl => "GL_ARB_clip_control", is_gl_arb_clip_control;
    KhrDebug => "GL_KHR_debug", is_gl_khr_debug;
    ArbTextureStorage => "GL_ARB_texture_storage", is_gl_arb_texture_storage;
    ArbDrawElementsBaseVertex => "GL_ARB_draw_elements_base_vertex", is_gl_arb_draw_elements_base_vertex;
}

/// Driver access needed to enumerate extensions.
pub struct ExtensionProbe<'a> {
    linking: &'a RuntimeLinking,
    core: CoreFunctions,
    get_stringi: Option<unsafe extern "system" fn(GLenum, GLuint) -> *const GLubyte>,
    version: GlVersion,
}

impl<'a> ExtensionProbe<'a> {
    /// Requires the core table; uses the indexed query once the floor
    /// bundle has been resolved.
    pub fn new(linking: &'a RuntimeLinking, version: GlVersion) -> Result<Self> {
        let core = *linking.core().ok_or(RhiError::NotLoaded)?;
        let get_stringi = linking.version_gated().map(|gated| gated.gl3.get_stringi);
        Ok(Self {
            linking,
            core,
            get_stringi,
            version,
        })
    }

    pub fn version(&self) -> GlVersion {
        self.version
    }

    /// Every extension name the driver and the window system report.
    pub fn driver_extensions(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.get_stringi {
            Some(get_stringi) if self.version.at_least(3, 0) => {
                let mut count: GLint = 0;
                // SAFETY: the core table belongs to the current context.
                unsafe { (self.core.get_integerv)(gl::NUM_EXTENSIONS, &mut count) };
                (0..count.max(0) as GLuint)
                    // SAFETY: index is below GL_NUM_EXTENSIONS.
                    .filter_map(|i| unsafe { driver_string(get_stringi(gl::EXTENSIONS, i)) })
                    .collect()
            }
            _ => {
                // SAFETY: returns a driver-owned static string or null.
                let legacy = unsafe { driver_string((self.core.get_string)(gl::EXTENSIONS)) };
                legacy
                    .map(|text| tokenize(&text, " ").map(str::to_string).collect())
                    .unwrap_or_default()
            }
        };

        if let Some(platform) = self.linking.platform_extensions() {
            names.extend(tokenize(&platform, " ").map(str::to_string));
        }
        names
    }

    fn resolve<T: EntryPointBundle>(&self) -> Result<T> {
        self.linking.resolve()
    }
}

/// Extension state of the current context.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    advertised: HashSet<String>,
    swap_control: Option<SwapControlFunctions>,
    direct_state_access: Option<DirectStateAccessFunctions>,
    base_instance: Option<BaseInstanceFunctions>,
    draw_indirect: Option<DrawIndirectFunctions>,
    multi_draw_indirect: Option<MultiDrawIndirectFunctions>,
    clip_control: Option<ClipControlFunctions>,
    debug: Option<DebugFunctions>,
    texture_storage: Option<TextureStorageFunctions>,
    draw_base_vertex: Option<DrawBaseVertexFunctions>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query the driver and replace the whole extension set.
    ///
    /// With `use_extensions == false` every extension reads as absent.
    pub fn initialize(&mut self, probe: &ExtensionProbe<'_>, use_extensions: bool) {
        *self = Self::default();
        if !use_extensions {
            tracing::info!("Extensions disabled, running core profile only");
            return;
        }

        self.advertised = probe.driver_extensions().into_iter().collect();

        self.swap_control = self.resolve_advertised(probe, Extension::WglExtSwapControl);
        self.direct_state_access = self.resolve_advertised(probe, Extension::ArbDirectStateAccess);
        self.base_instance = self.resolve_advertised(probe, Extension::ArbBaseInstance);
        self.draw_indirect = self.resolve_advertised(probe, Extension::ArbDrawIndirect);
        self.multi_draw_indirect = self.resolve_advertised(probe, Extension::ArbMultiDrawIndirect);
        self.clip_control = self.resolve_advertised(probe, Extension::ArbClipControl);
        self.debug = self.resolve_advertised(probe, Extension::KhrDebug);
        self.texture_storage = self.resolve_advertised(probe, Extension::ArbTextureStorage);
        self.draw_base_vertex =
            self.resolve_advertised(probe, Extension::ArbDrawElementsBaseVertex);

        let tracked = Extension::ALL.iter().filter(|e| self.flag(**e)).count();
        tracing::info!(
            "{} extensions advertised, {} tracked extensions usable",
            self.advertised.len(),
            tracked
        );
    }

    fn resolve_advertised<T: EntryPointBundle>(
        &mut self,
        probe: &ExtensionProbe<'_>,
        extension: Extension,
    ) -> Option<T> {
        if !self.advertised.contains(extension.name()) {
            return None;
        }
        match probe.resolve::<T>() {
            Ok(functions) => Some(functions),
            Err(e) => {
                tracing::warn!(
                    "{} is advertised but unusable ({}), treating it as absent",
                    extension.name(),
                    e
                );
                self.advertised.remove(extension.name());
                None
            }
        }
    }

    fn flag(&self, extension: Extension) -> bool {
        match extension {
            Extension::WglExtSwapControl => self.swap_control.is_some(),
            Extension::ArbDirectStateAccess => self.direct_state_access.is_some(),
            Extension::ArbBaseInstance => self.base_instance.is_some(),
            Extension::ArbDrawIndirect => self.draw_indirect.is_some(),
            Extension::ArbMultiDrawIndirect => self.multi_draw_indirect.is_some(),
            Extension::ArbClipControl => self.clip_control.is_some(),
            Extension::KhrDebug => self.debug.is_some(),
            Extension::ArbTextureStorage => self.texture_storage.is_some(),
            Extension::ArbDrawElementsBaseVertex => self.draw_base_vertex.is_some(),
            other => self.advertised.contains(other.name()),
        }
    }

    /// Whether the last initialisation found `name`. Does not query the driver.
    pub fn is_supported(&self, name: &str) -> bool {
        match Extension::from_name(name) {
            Some(extension) => self.flag(extension),
            None => self.advertised.contains(name),
        }
    }

    /// Query the driver for `name` now.
    pub fn check_extension(&self, probe: &ExtensionProbe<'_>, name: &str) -> bool {
        probe.driver_extensions().iter().any(|e| e == name)
    }

    /// Usable tracked extensions, in declaration order.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        Extension::ALL
            .iter()
            .filter(|e| self.flag(**e))
            .map(|e| e.name())
            .collect()
    }

    pub fn swap_control(&self) -> Option<&SwapControlFunctions> {
        self.swap_control.as_ref()
    }

    pub fn direct_state_access(&self) -> Option<&DirectStateAccessFunctions> {
        self.direct_state_access.as_ref()
    }

    pub fn base_instance(&self) -> Option<&BaseInstanceFunctions> {
        self.base_instance.as_ref()
    }

    pub fn draw_indirect(&self) -> Option<&DrawIndirectFunctions> {
        self.draw_indirect.as_ref()
    }

    pub fn multi_draw_indirect(&self) -> Option<&MultiDrawIndirectFunctions> {
        self.multi_draw_indirect.as_ref()
    }

    pub fn clip_control(&self) -> Option<&ClipControlFunctions> {
        self.clip_control.as_ref()
    }

    pub fn debug(&self) -> Option<&DebugFunctions> {
        self.debug.as_ref()
    }

    pub fn texture_storage(&self) -> Option<&TextureStorageFunctions> {
        self.texture_storage.as_ref()
    }

    pub fn draw_base_vertex(&self) -> Option<&DrawBaseVertexFunctions> {
        self.draw_base_vertex.as_ref()
    }
}
