// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Native OpenGL scalar types, extension tokens and version parsing.

use std::ffi::{c_void, CStr};

pub use gl::types::{
    GLbitfield, GLboolean, GLchar, GLenum, GLfloat, GLint, GLintptr, GLsizei, GLsizeiptr,
    GLubyte, GLuint,
};

/// `GLDEBUGPROC`, spelled out so the entry-point tables own their ABI.
pub type GlDebugProc = Option<
    extern "system" fn(
        source: GLenum,
        gltype: GLenum,
        id: GLuint,
        severity: GLenum,
        length: GLsizei,
        message: *const GLchar,
        user_param: *mut c_void,
    ),
>;

/// Tokens introduced by extensions; the `gl` crate only carries core enums.
pub mod ext {
    use super::GLenum;

    // GL_EXT_texture_compression_s3tc
    pub const COMPRESSED_RGBA_S3TC_DXT1_EXT: GLenum = 0x83F1;
    pub const COMPRESSED_RGBA_S3TC_DXT3_EXT: GLenum = 0x83F2;
    pub const COMPRESSED_RGBA_S3TC_DXT5_EXT: GLenum = 0x83F3;

    // GL_EXT_texture_sRGB / GL_EXT_texture_compression_s3tc_srgb
    pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT1_EXT: GLenum = 0x8C4D;
    pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT3_EXT: GLenum = 0x8C4E;
    pub const COMPRESSED_SRGB_ALPHA_S3TC_DXT5_EXT: GLenum = 0x8C4F;

    // GL_EXT_texture_format_BGRA8888: unsized for glTexImage2D and uploads,
    // sized for immutable storage.
    pub const BGRA_EXT: GLenum = 0x80E1;
    pub const BGRA8_EXT: GLenum = 0x93A1;

    // GL_OES_compressed_ETC1_RGB8_texture
    pub const ETC1_RGB8_OES: GLenum = 0x8D64;

    // GL_EXT_texture_filter_anisotropic
    pub const TEXTURE_MAX_ANISOTROPY_EXT: GLenum = 0x84FE;
    pub const MAX_TEXTURE_MAX_ANISOTROPY_EXT: GLenum = 0x84FF;
}

/// `GL_NONE`; the `gl` crate exposes it, aliased here for table readability.
pub const NONE: GLenum = gl::NONE;

/// Parsed `GL_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GlVersion {
    pub major: u32,
    pub minor: u32,
    /// OpenGL ES rather than desktop OpenGL.
    pub es: bool,
}

impl GlVersion {
    pub const fn desktop(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            es: false,
        }
    }

    pub const fn es(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            es: true,
        }
    }

    /// Parse a `GL_VERSION` string.
    ///
    /// Desktop drivers report `"<major>.<minor>[.<release>] <vendor info>"`,
    /// ES drivers `"OpenGL ES <major>.<minor> <vendor info>"`.
    pub fn parse(version: &str) -> Option<Self> {
        let trimmed = version.trim();
        let (es, rest) = match trimmed.strip_prefix("OpenGL ES") {
            Some(rest) => {
                // "OpenGL ES-CM 1.1" style profile suffixes
                let rest = rest.trim_start_matches(|c: char| c != ' ');
                (true, rest.trim_start())
            }
            None => (false, trimmed),
        };

        let number = rest.split_whitespace().next()?;
        let mut parts = number.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor_digits: String = parts
            .next()?
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let minor = minor_digits.parse().ok()?;
        Some(Self { major, minor, es })
    }

    /// Same dialect and at least `major.minor`.
    pub fn at_least(&self, major: u32, minor: u32) -> bool {
        (self.major, self.minor) >= (major, minor)
    }

    /// Whether a feature with the given per-dialect floors is core in this version.
    pub fn meets(&self, desktop: Option<(u32, u32)>, es: Option<(u32, u32)>) -> bool {
        let floor = if self.es { es } else { desktop };
        floor.is_some_and(|(major, minor)| self.at_least(major, minor))
    }
}

impl std::fmt::Display for GlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.es {
            write!(f, "OpenGL ES {}.{}", self.major, self.minor)
        } else {
            write!(f, "OpenGL {}.{}", self.major, self.minor)
        }
    }
}

/// Copy a driver-owned string. Null yields `None`.
///
/// # Safety
/// `ptr` must be null or point at a NUL-terminated string that stays valid
/// for the duration of the call.
pub unsafe fn driver_string(ptr: *const GLubyte) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    let text = unsafe { CStr::from_ptr(ptr.cast()) };
    Some(text.to_string_lossy().into_owned())
}
