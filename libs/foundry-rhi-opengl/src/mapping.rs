// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Engine enum to native token translation.
//!
//! Every aspect has one dense table indexed by `ordinal - first ordinal`.
//! Capability-dependent entries are resolved against a [`MappingProfile`];
//! when a capability is missing the documented fallback is returned instead.

use foundry_rhi::{
    Blend, BufferUsage, ComparisonFunc, FilterMode, IndexBufferFormat, MapType,
    PrimitiveTopology, Result, RhiBackend, RhiError, TextureAddressMode, TextureFormat,
    VertexAttributeFormat,
};

use crate::entry_points::{TessellationFunctions, VersionGated};
use crate::extensions::ExtensionRegistry;
use crate::native::{ext, GLbitfield, GLboolean, GLenum, GLint, GLsizei, GlVersion, NONE};

/// Texture formats whose native tokens differ between OpenGL and OpenGL ES 3
/// under identical capabilities.
pub const GLES3_OVERRIDES: &[TextureFormat] = &[TextureFormat::B8G8R8A8, TextureFormat::Etc1];

/// Capabilities the tables consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingProfile {
    pub backend: RhiBackend,
    /// `GL_CLAMP_TO_BORDER`.
    pub border_clamp: bool,
    /// `GL_MIRROR_CLAMP_TO_EDGE`.
    pub mirror_clamp: bool,
    /// Depth comparison in samplers.
    pub comparison_sampling: bool,
    /// sRGB S3TC formats.
    pub srgb_s3tc: bool,
    /// BGRA texture uploads.
    pub bgra_textures: bool,
    /// 16-bit normalized formats.
    pub norm16: bool,
    /// Adjacency primitives (geometry shaders).
    pub adjacency: bool,
    /// Patch primitives (tessellation with `glPatchParameteri`).
    pub tessellation: bool,
}

impl MappingProfile {
    /// What the backend's minimum version guarantees.
    pub fn baseline(backend: RhiBackend) -> Self {
        match backend {
            RhiBackend::OpenGl => Self {
                backend,
                border_clamp: true,
                mirror_clamp: false,
                comparison_sampling: true,
                srgb_s3tc: false,
                bgra_textures: true,
                norm16: true,
                adjacency: true,
                tessellation: false,
            },
            // ES 3 profiles sample depth textures without hardware comparison.
            RhiBackend::OpenGlEs3 => Self {
                backend,
                border_clamp: false,
                mirror_clamp: false,
                comparison_sampling: false,
                srgb_s3tc: false,
                bgra_textures: false,
                norm16: false,
                adjacency: false,
                tessellation: false,
            },
        }
    }

    /// Baseline raised by the context version and usable extensions.
    pub fn from_capabilities(
        backend: RhiBackend,
        version: GlVersion,
        extensions: &ExtensionRegistry,
    ) -> Self {
        let mut profile = Self::baseline(backend);
        let es32 = version.es && version.at_least(3, 2);

        profile.border_clamp |= es32 || extensions.is_gl_ext_texture_border_clamp();
        profile.mirror_clamp |= (!version.es && version.at_least(4, 4))
            || extensions.is_gl_arb_texture_mirror_clamp_to_edge();
        profile.srgb_s3tc |= extensions.is_gl_ext_texture_compression_s3tc_srgb()
            || (extensions.is_gl_ext_texture_srgb()
                && extensions.is_gl_ext_texture_compression_s3tc());
        profile.bgra_textures |= extensions.is_gl_ext_texture_format_bgra8888();
        profile.norm16 |= extensions.is_gl_ext_texture_norm16();
        profile.adjacency |= es32 || extensions.is_gl_ext_geometry_shader();
        profile.tessellation |= TessellationFunctions::FLOOR.is_core_in(version);
        profile
    }

    /// Every capability present.
    pub fn full(backend: RhiBackend) -> Self {
        Self {
            backend,
            border_clamp: true,
            mirror_clamp: true,
            comparison_sampling: true,
            srgb_s3tc: true,
            bgra_textures: true,
            norm16: true,
            adjacency: true,
            tessellation: true,
        }
    }

    fn is_es(&self) -> bool {
        self.backend == RhiBackend::OpenGlEs3
    }
}

// ---------------------------------------------------------------------------
// Samplers
// ---------------------------------------------------------------------------

pub fn mag_filter(mode: FilterMode) -> GLenum {
    if mode.is_mag_linear() {
        gl::LINEAR
    } else {
        gl::NEAREST
    }
}

pub fn min_filter(mode: FilterMode, has_mipmaps: bool) -> GLenum {
    match (mode.is_min_linear(), has_mipmaps, mode.is_mip_linear()) {
        (false, false, _) => gl::NEAREST,
        (true, false, _) => gl::LINEAR,
        (false, true, false) => gl::NEAREST_MIPMAP_NEAREST,
        (false, true, true) => gl::NEAREST_MIPMAP_LINEAR,
        (true, true, false) => gl::LINEAR_MIPMAP_NEAREST,
        (true, true, true) => gl::LINEAR_MIPMAP_LINEAR,
    }
}

/// `GL_TEXTURE_COMPARE_MODE` for the filter.
pub fn compare_mode(mode: FilterMode, profile: &MappingProfile) -> GLenum {
    if mode.is_comparison() && profile.comparison_sampling {
        gl::COMPARE_REF_TO_TEXTURE
    } else {
        NONE
    }
}

const ADDRESS_MODES: [GLenum; 5] = [
    gl::REPEAT,
    gl::MIRRORED_REPEAT,
    gl::CLAMP_TO_EDGE,
    gl::CLAMP_TO_BORDER,
    gl::MIRROR_CLAMP_TO_EDGE,
];

pub fn address_mode(mode: TextureAddressMode, profile: &MappingProfile) -> GLenum {
    match mode {
        TextureAddressMode::Border if !profile.border_clamp => gl::CLAMP_TO_EDGE,
        TextureAddressMode::MirrorOnce if !profile.mirror_clamp => gl::MIRRORED_REPEAT,
        _ => ADDRESS_MODES[mode.ordinal() as usize - 1],
    }
}

const COMPARISON_FUNCS: [GLenum; 8] = [
    gl::NEVER,
    gl::LESS,
    gl::EQUAL,
    gl::LEQUAL,
    gl::GREATER,
    gl::NOTEQUAL,
    gl::GEQUAL,
    gl::ALWAYS,
];

pub fn comparison_func(func: ComparisonFunc) -> GLenum {
    COMPARISON_FUNCS[func.ordinal() as usize - 1]
}

// ---------------------------------------------------------------------------
// Vertex input
// ---------------------------------------------------------------------------

const VERTEX_ATTRIBUTE_SIZES: [GLint; 9] = [1, 2, 3, 4, 4, 4, 2, 4, 1];

const VERTEX_ATTRIBUTE_TYPES: [GLenum; 9] = [
    gl::FLOAT,
    gl::FLOAT,
    gl::FLOAT,
    gl::FLOAT,
    gl::UNSIGNED_BYTE,
    gl::UNSIGNED_BYTE,
    gl::SHORT,
    gl::SHORT,
    gl::UNSIGNED_INT,
];

const VERTEX_ATTRIBUTE_NORMALIZED: [bool; 9] =
    [false, false, false, false, true, false, false, false, false];

const VERTEX_ATTRIBUTE_INTEGER: [bool; 9] =
    [false, false, false, false, false, true, true, true, true];

/// Component count.
pub fn vertex_attribute_size(format: VertexAttributeFormat) -> GLint {
    VERTEX_ATTRIBUTE_SIZES[format.ordinal() as usize]
}

pub fn vertex_attribute_type(format: VertexAttributeFormat) -> GLenum {
    VERTEX_ATTRIBUTE_TYPES[format.ordinal() as usize]
}

pub fn is_vertex_attribute_normalized(format: VertexAttributeFormat) -> GLboolean {
    if VERTEX_ATTRIBUTE_NORMALIZED[format.ordinal() as usize] {
        gl::TRUE
    } else {
        gl::FALSE
    }
}

/// Integer formats go through `glVertexAttribIPointer` and reach the shader
/// unconverted.
pub fn is_vertex_attribute_integer(format: VertexAttributeFormat) -> bool {
    VERTEX_ATTRIBUTE_INTEGER[format.ordinal() as usize]
}

const INDEX_TYPES: [GLenum; 3] = [gl::UNSIGNED_BYTE, gl::UNSIGNED_SHORT, gl::UNSIGNED_INT];

pub fn index_type(format: IndexBufferFormat) -> GLenum {
    INDEX_TYPES[format.ordinal() as usize]
}

// ---------------------------------------------------------------------------
// Textures
// ---------------------------------------------------------------------------

/// (internal format, pixel format, pixel type) per [`TextureFormat`] ordinal.
const TEXTURE_FORMATS: [(GLenum, GLenum, GLenum); 24] = [
    (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
    (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
    (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
    (gl::SRGB8_ALPHA8, gl::RGBA, gl::UNSIGNED_BYTE),
    (gl::RGBA8, gl::BGRA, gl::UNSIGNED_BYTE),
    (gl::R11F_G11F_B10F, gl::RGB, gl::UNSIGNED_INT_10F_11F_11F_REV),
    (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
    (gl::RGBA32F, gl::RGBA, gl::FLOAT),
    (ext::COMPRESSED_RGBA_S3TC_DXT1_EXT, ext::COMPRESSED_RGBA_S3TC_DXT1_EXT, 0),
    (ext::COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT, ext::COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT, 0),
    (ext::COMPRESSED_RGBA_S3TC_DXT3_EXT, ext::COMPRESSED_RGBA_S3TC_DXT3_EXT, 0),
    (ext::COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT, ext::COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT, 0),
    (ext::COMPRESSED_RGBA_S3TC_DXT5_EXT, ext::COMPRESSED_RGBA_S3TC_DXT5_EXT, 0),
    (ext::COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT, ext::COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT, 0),
    (gl::COMPRESSED_RED_RGTC1, gl::COMPRESSED_RED_RGTC1, 0),
    (gl::COMPRESSED_RG_RGTC2, gl::COMPRESSED_RG_RGTC2, 0),
    (gl::COMPRESSED_RGB8_ETC2, gl::COMPRESSED_RGB8_ETC2, 0),
    (gl::R16, gl::RED, gl::UNSIGNED_SHORT),
    (gl::R32UI, gl::RED_INTEGER, gl::UNSIGNED_INT),
    (gl::R32F, gl::RED, gl::FLOAT),
    (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
    (gl::RG16_SNORM, gl::RG, gl::SHORT),
    (gl::RG16F, gl::RG, gl::HALF_FLOAT),
    (0, 0, 0),
];

fn texture_entry(format: TextureFormat, profile: &MappingProfile) -> (GLenum, GLenum, GLenum) {
    use TextureFormat::*;

    match format {
        Bc1Srgb | Bc2Srgb | Bc3Srgb if !profile.srgb_s3tc => {
            // Previous ordinal is the linear variant of the same block format.
            TEXTURE_FORMATS[format.ordinal() as usize - 1]
        }
        B8G8R8A8 if !profile.bgra_textures => TEXTURE_FORMATS[R8G8B8A8.ordinal() as usize],
        B8G8R8A8 if profile.is_es() => (ext::BGRA_EXT, ext::BGRA_EXT, gl::UNSIGNED_BYTE),
        Etc1 if profile.is_es() => (ext::ETC1_RGB8_OES, ext::ETC1_RGB8_OES, 0),
        R16Unorm | R16G16Snorm if !profile.norm16 => (0, 0, 0),
        _ => TEXTURE_FORMATS[format.ordinal() as usize],
    }
}

/// Internal format for texture storage. `0` means the format is unusable
/// with this profile.
pub fn texture_internal_format(format: TextureFormat, profile: &MappingProfile) -> GLenum {
    texture_entry(format, profile).0
}

/// Sized internal format for `glTexStorage2D` / `glTextureStorage2D`.
/// Differs from [`texture_internal_format`] only where that one is unsized.
pub fn texture_storage_format(format: TextureFormat, profile: &MappingProfile) -> GLenum {
    match texture_internal_format(format, profile) {
        ext::BGRA_EXT => ext::BGRA8_EXT,
        internal => internal,
    }
}

/// Pixel format of uploads. Compressed formats report their internal format.
pub fn texture_format(format: TextureFormat, profile: &MappingProfile) -> GLenum {
    texture_entry(format, profile).1
}

/// Pixel type of uploads; `0` for compressed formats.
pub fn texture_type(format: TextureFormat) -> GLenum {
    TEXTURE_FORMATS[format.ordinal() as usize].2
}

/// Bytes of one mip level, as passed to compressed uploads. Errors when the
/// level does not fit in a `GLsizei`.
pub fn texture_image_size(format: TextureFormat, width: u32, height: u32) -> Result<GLsizei> {
    let (columns, rows) = if format.is_compressed() {
        (width.div_ceil(4), height.div_ceil(4))
    } else {
        (width, height)
    };
    let bytes = u64::from(columns) * u64::from(rows) * u64::from(format.bytes_per_element());
    GLsizei::try_from(bytes).map_err(|_| {
        RhiError::ResourceCreation(format!(
            "{:?} level of {}x{} is {} bytes, more than a single upload can carry",
            format, width, height, bytes
        ))
    })
}

// ---------------------------------------------------------------------------
// Primitive assembly
// ---------------------------------------------------------------------------

const BASIC_TOPOLOGIES: [GLenum; 5] = [
    gl::POINTS,
    gl::LINES,
    gl::LINE_STRIP,
    gl::TRIANGLES,
    gl::TRIANGLE_STRIP,
];

const ADJACENCY_TOPOLOGIES: [GLenum; 4] = [
    gl::LINES_ADJACENCY,
    gl::LINE_STRIP_ADJACENCY,
    gl::TRIANGLES_ADJACENCY,
    gl::TRIANGLE_STRIP_ADJACENCY,
];

pub fn primitive_topology(topology: PrimitiveTopology, profile: &MappingProfile) -> GLenum {
    if let Some(points) = topology.patch_control_points() {
        assert!(
            (1..=PrimitiveTopology::MAX_PATCH_CONTROL_POINTS).contains(&points),
            "patch list with {} control points",
            points
        );
        return if profile.tessellation {
            gl::PATCHES
        } else {
            gl::TRIANGLES
        };
    }

    if topology.is_adjacency() {
        if !profile.adjacency {
            return primitive_topology(topology.without_adjacency(), profile);
        }
        let index = topology.ordinal() - PrimitiveTopology::FIRST_ADJACENCY_ORDINAL;
        return ADJACENCY_TOPOLOGIES[index as usize];
    }

    BASIC_TOPOLOGIES[(topology.ordinal() - PrimitiveTopology::FIRST_BASIC_ORDINAL) as usize]
}

// ---------------------------------------------------------------------------
// Buffers
// ---------------------------------------------------------------------------

/// Usage ordinals are the native tokens.
pub fn buffer_usage(usage: BufferUsage) -> GLenum {
    usage.ordinal() as GLenum
}

const MAP_ACCESS: [GLenum; 5] = [
    gl::READ_ONLY,
    gl::WRITE_ONLY,
    gl::READ_WRITE,
    gl::WRITE_ONLY,
    gl::WRITE_ONLY,
];

/// Access token for whole-buffer mapping.
pub fn map_access(map_type: MapType) -> GLenum {
    MAP_ACCESS[map_type.ordinal() as usize - 1]
}

const MAP_RANGE_BITS: [GLbitfield; 5] = [
    gl::MAP_READ_BIT,
    gl::MAP_WRITE_BIT,
    gl::MAP_READ_BIT | gl::MAP_WRITE_BIT,
    gl::MAP_WRITE_BIT | gl::MAP_INVALIDATE_BUFFER_BIT,
    gl::MAP_WRITE_BIT | gl::MAP_UNSYNCHRONIZED_BIT,
];

/// Access bits for `glMapBufferRange`.
pub fn map_range_bits(map_type: MapType) -> GLbitfield {
    MAP_RANGE_BITS[map_type.ordinal() as usize - 1]
}

// ---------------------------------------------------------------------------
// Blending
// ---------------------------------------------------------------------------

const BASIC_BLEND_FACTORS: [GLenum; 11] = [
    gl::ZERO,
    gl::ONE,
    gl::SRC_COLOR,
    gl::ONE_MINUS_SRC_COLOR,
    gl::SRC_ALPHA,
    gl::ONE_MINUS_SRC_ALPHA,
    gl::DST_ALPHA,
    gl::ONE_MINUS_DST_ALPHA,
    gl::DST_COLOR,
    gl::ONE_MINUS_DST_COLOR,
    gl::SRC_ALPHA_SATURATE,
];

const ADVANCED_BLEND_FACTORS: [GLenum; 6] = [
    gl::CONSTANT_COLOR,
    gl::ONE_MINUS_CONSTANT_COLOR,
    gl::SRC1_COLOR,
    gl::ONE_MINUS_SRC1_COLOR,
    gl::SRC1_ALPHA,
    gl::ONE_MINUS_SRC1_ALPHA,
];

pub fn blend_factor(blend: Blend) -> GLenum {
    let ordinal = blend.ordinal();
    if ordinal >= Blend::ADVANCED_THRESHOLD {
        ADVANCED_BLEND_FACTORS[(ordinal - Blend::ADVANCED_THRESHOLD) as usize]
    } else {
        BASIC_BLEND_FACTORS[ordinal as usize - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> MappingProfile {
        MappingProfile::baseline(RhiBackend::OpenGl)
    }

    #[test]
    fn test_index_types() {
        assert_eq!(index_type(IndexBufferFormat::UnsignedChar), gl::UNSIGNED_BYTE);
        assert_eq!(index_type(IndexBufferFormat::UnsignedShort), gl::UNSIGNED_SHORT);
        assert_eq!(index_type(IndexBufferFormat::UnsignedInt), gl::UNSIGNED_INT);
    }

    #[test]
    fn test_blend_tiers_meet_at_threshold() {
        assert_eq!(blend_factor(Blend::Zero), gl::ZERO);
        assert_eq!(blend_factor(Blend::SrcAlphaSat), gl::SRC_ALPHA_SATURATE);
        assert_eq!(blend_factor(Blend::BlendFactor), gl::CONSTANT_COLOR);
        assert_eq!(blend_factor(Blend::InvBlendFactor), gl::ONE_MINUS_CONSTANT_COLOR);
        assert_eq!(blend_factor(Blend::InvSrc1Alpha), gl::ONE_MINUS_SRC1_ALPHA);
    }

    #[test]
    fn test_border_falls_back_to_clamp_to_edge() {
        let es = MappingProfile::baseline(RhiBackend::OpenGlEs3);
        assert_eq!(address_mode(TextureAddressMode::Border, &es), gl::CLAMP_TO_EDGE);
        assert_eq!(
            address_mode(TextureAddressMode::Border, &desktop()),
            gl::CLAMP_TO_BORDER
        );
        assert_eq!(
            address_mode(TextureAddressMode::MirrorOnce, &desktop()),
            gl::MIRRORED_REPEAT
        );
    }

    #[test]
    fn test_min_filter_ignores_mip_bit_without_mipmaps() {
        assert_eq!(min_filter(FilterMode::MinMagMipLinear, false), gl::LINEAR);
        assert_eq!(min_filter(FilterMode::MinMagMipLinear, true), gl::LINEAR_MIPMAP_LINEAR);
        assert_eq!(
            min_filter(FilterMode::MinMagPointMipLinear, true),
            gl::NEAREST_MIPMAP_LINEAR
        );
        assert_eq!(min_filter(FilterMode::Anisotropic, true), gl::LINEAR_MIPMAP_LINEAR);
        assert_eq!(mag_filter(FilterMode::MinLinearMagMipPoint), gl::NEAREST);
    }

    #[test]
    fn test_comparison_without_support() {
        let mut profile = desktop();
        assert_eq!(
            compare_mode(FilterMode::ComparisonMinMagMipLinear, &profile),
            gl::COMPARE_REF_TO_TEXTURE
        );
        profile.comparison_sampling = false;
        assert_eq!(compare_mode(FilterMode::ComparisonMinMagMipLinear, &profile), NONE);
        assert_eq!(compare_mode(FilterMode::MinMagMipLinear, &desktop()), NONE);
    }

    #[test]
    fn test_es_profiles_drop_comparison_mode() {
        let registry = ExtensionRegistry::new();
        for minor in 0..=2 {
            let es = MappingProfile::from_capabilities(
                RhiBackend::OpenGlEs3,
                GlVersion::es(3, minor),
                &registry,
            );
            assert!(!es.comparison_sampling);
            assert_eq!(compare_mode(FilterMode::ComparisonMinMagMipLinear, &es), NONE);
            assert_eq!(compare_mode(FilterMode::ComparisonAnisotropic, &es), NONE);
            assert_eq!(
                min_filter(FilterMode::ComparisonMinMagMipLinear, true),
                min_filter(FilterMode::MinMagMipLinear, true)
            );
        }
    }

    #[test]
    fn test_storage_format_is_sized() {
        let full_es = MappingProfile::full(RhiBackend::OpenGlEs3);
        assert_eq!(texture_storage_format(TextureFormat::B8G8R8A8, &full_es), ext::BGRA8_EXT);
        assert_eq!(texture_format(TextureFormat::B8G8R8A8, &full_es), ext::BGRA_EXT);
        assert_eq!(
            texture_storage_format(TextureFormat::B8G8R8A8, &desktop()),
            gl::RGBA8
        );
        for format in TextureFormat::ALL {
            if format != TextureFormat::B8G8R8A8 {
                assert_eq!(
                    texture_storage_format(format, &full_es),
                    texture_internal_format(format, &full_es)
                );
            }
        }
    }

    #[test]
    fn test_texture_fallbacks() {
        let es = MappingProfile::baseline(RhiBackend::OpenGlEs3);
        assert_eq!(texture_internal_format(TextureFormat::B8G8R8A8, &es), gl::RGBA8);
        assert_eq!(texture_format(TextureFormat::B8G8R8A8, &es), gl::RGBA);
        assert_eq!(texture_internal_format(TextureFormat::R16Unorm, &es), 0);
        assert_eq!(texture_internal_format(TextureFormat::R16G16Snorm, &es), 0);
        assert_eq!(
            texture_internal_format(TextureFormat::Bc2Srgb, &es),
            ext::COMPRESSED_RGBA_S3TC_DXT3_EXT
        );
        assert_eq!(texture_internal_format(TextureFormat::Unknown, &desktop()), 0);

        let full = MappingProfile::full(RhiBackend::OpenGlEs3);
        assert_eq!(texture_internal_format(TextureFormat::B8G8R8A8, &full), ext::BGRA_EXT);
        assert_eq!(
            texture_internal_format(TextureFormat::Bc2Srgb, &full),
            ext::COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT
        );
    }

    #[test]
    fn test_image_size_rejects_oversized_levels() {
        assert_eq!(texture_image_size(TextureFormat::Bc1, 8, 8).unwrap(), 32);
        assert_eq!(texture_image_size(TextureFormat::Bc3, 5, 5).unwrap(), 64);
        assert!(matches!(
            texture_image_size(TextureFormat::R32G32B32A32F, 16384, 16384),
            Err(RhiError::ResourceCreation(_))
        ));
        assert!(texture_image_size(TextureFormat::Bc3, u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_topology_fallbacks() {
        let es = MappingProfile::baseline(RhiBackend::OpenGlEs3);
        assert_eq!(
            primitive_topology(PrimitiveTopology::TriangleStripAdj, &es),
            gl::TRIANGLE_STRIP
        );
        assert_eq!(
            primitive_topology(PrimitiveTopology::TriangleStripAdj, &desktop()),
            gl::TRIANGLE_STRIP_ADJACENCY
        );
        assert_eq!(primitive_topology(PrimitiveTopology::PatchList(3), &es), gl::TRIANGLES);
        let full = MappingProfile::full(RhiBackend::OpenGl);
        assert_eq!(primitive_topology(PrimitiveTopology::PatchList(32), &full), gl::PATCHES);
    }

    #[test]
    #[should_panic(expected = "control points")]
    fn test_patch_list_out_of_range_panics() {
        primitive_topology(PrimitiveTopology::PatchList(33), &desktop());
    }

    #[test]
    fn test_profile_raised_by_version() {
        let registry = ExtensionRegistry::new();
        let es32 = MappingProfile::from_capabilities(
            RhiBackend::OpenGlEs3,
            GlVersion::es(3, 2),
            &registry,
        );
        assert!(es32.border_clamp && es32.adjacency && es32.tessellation);
        assert!(!es32.norm16);

        let gl45 =
            MappingProfile::from_capabilities(RhiBackend::OpenGl, GlVersion::desktop(4, 5), &registry);
        assert!(gl45.mirror_clamp && gl45.tessellation);
        assert!(!gl45.srgb_s3tc);
    }
}
