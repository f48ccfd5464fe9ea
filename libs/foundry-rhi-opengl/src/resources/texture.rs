// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::c_void;
use std::sync::Arc;

use foundry_rhi::{Result, RhiError, TextureDescriptor, TextureFlags, TextureFormat};

use super::{ContainerObject, GlDevice, ObjectKind};
use crate::mapping;
use crate::native::{GLenum, GLint, GLsizei, GLuint};

/// Two-dimensional texture with immutable dimensions.
#[derive(Debug)]
pub struct Texture2D {
    object: ContainerObject,
    width: u32,
    height: u32,
    format: TextureFormat,
    flags: TextureFlags,
    mip_levels: u32,
}

struct Level<'a> {
    index: u32,
    width: u32,
    height: u32,
    /// Byte size passed to compressed uploads.
    image_size: GLsizei,
    data: Option<&'a [u8]>,
}

/// Split `data` into the levels it covers.
fn levels<'a>(desc: &TextureDescriptor<'_>, data: Option<&'a [u8]>) -> Result<Vec<Level<'a>>> {
    let supplied = if desc.flags.contains(TextureFlags::DATA_CONTAINS_MIPMAPS) {
        desc.mip_levels()
    } else {
        1
    };

    let mut offset = 0usize;
    let mut levels = Vec::with_capacity(desc.mip_levels() as usize);
    for index in 0..desc.mip_levels() {
        let width = (desc.width >> index).max(1);
        let height = (desc.height >> index).max(1);
        let image_size = mapping::texture_image_size(desc.format, width, height)?;
        let level_data = match data {
            Some(bytes) if index < supplied => {
                let size = image_size as usize;
                let slice = offset
                    .checked_add(size)
                    .and_then(|end| bytes.get(offset..end))
                    .ok_or_else(|| {
                        RhiError::ResourceCreation(format!(
                            "texture data of {} bytes is too short for mip level {} ({}x{})",
                            bytes.len(),
                            index,
                            width,
                            height
                        ))
                    })?;
                offset += size;
                Some(slice)
            }
            _ => None,
        };
        levels.push(Level {
            index,
            width,
            height,
            image_size,
            data: level_data,
        });
    }
    Ok(levels)
}

fn data_ptr(data: Option<&[u8]>) -> *const c_void {
    data.map_or(std::ptr::null(), |d| d.as_ptr().cast())
}

impl Texture2D {
    /// Create the texture and upload `data` when given.
    ///
    /// `data` holds level 0, or the whole chain with
    /// [`TextureFlags::DATA_CONTAINS_MIPMAPS`]. The caller restores the
    /// texture binding of unit 0 when the bind-to-edit path was taken.
    pub fn create(
        device: &Arc<GlDevice>,
        desc: &TextureDescriptor<'_>,
        data: Option<&[u8]>,
    ) -> Result<Self> {
        assert!(
            desc.width > 0 && desc.height > 0,
            "texture {:?} has zero size {}x{}",
            desc.label,
            desc.width,
            desc.height
        );

        let profile = device.profile();
        let internal_format = mapping::texture_internal_format(desc.format, profile);
        if internal_format == 0 {
            return Err(RhiError::NotSupported(format!(
                "texture format {:?} on this device",
                desc.format
            )));
        }
        let storage_format = mapping::texture_storage_format(desc.format, profile);
        let format = mapping::texture_format(desc.format, profile);
        let pixel_type = mapping::texture_type(desc.format);
        let compressed = desc.format.is_compressed();
        let levels = levels(desc, data)?;
        let mip_count = desc.mip_levels() as GLsizei;
        let generate_mipmaps =
            data.is_some() && desc.flags.contains(TextureFlags::GENERATE_MIPMAPS);

        let mut name: GLuint = 0;
        // SAFETY: every upload reads at most the level's slice of `data`.
        unsafe {
            if let Some(dsa) = device.capabilities().direct_state_access {
                (dsa.create_textures)(gl::TEXTURE_2D, 1, &mut name);
                if name == 0 {
                    return Err(no_name(desc));
                }
                (dsa.texture_storage_2d)(
                    name,
                    mip_count,
                    storage_format,
                    desc.width as GLsizei,
                    desc.height as GLsizei,
                );
                for level in levels.iter().filter(|l| l.data.is_some()) {
                    let (w, h) = (level.width as GLsizei, level.height as GLsizei);
                    if compressed {
                        (dsa.compressed_texture_sub_image_2d)(
                            name,
                            level.index as GLint,
                            0,
                            0,
                            w,
                            h,
                            internal_format,
                            level.image_size,
                            data_ptr(level.data),
                        );
                    } else {
                        (dsa.texture_sub_image_2d)(
                            name,
                            level.index as GLint,
                            0,
                            0,
                            w,
                            h,
                            format,
                            pixel_type,
                            data_ptr(level.data),
                        );
                    }
                }
                if generate_mipmaps {
                    (dsa.generate_texture_mipmap)(name);
                }
            } else {
                let core = device.core();
                (core.gen_textures)(1, &mut name);
                if name == 0 {
                    return Err(no_name(desc));
                }
                (core.active_texture)(gl::TEXTURE0);
                (core.bind_texture)(gl::TEXTURE_2D, name);
                (core.pixel_storei)(gl::UNPACK_ALIGNMENT, 1);
                (core.tex_parameteri)(gl::TEXTURE_2D, gl::TEXTURE_MAX_LEVEL, mip_count - 1);

                if let Some(storage) = device.capabilities().texture_storage {
                    (storage.tex_storage_2d)(
                        gl::TEXTURE_2D,
                        mip_count,
                        storage_format,
                        desc.width as GLsizei,
                        desc.height as GLsizei,
                    );
                    for level in levels.iter().filter(|l| l.data.is_some()) {
                        upload_sub_image(
                            device,
                            desc.format,
                            internal_format,
                            format,
                            pixel_type,
                            level,
                        );
                    }
                } else {
                    for level in &levels {
                        let (w, h) = (level.width as GLsizei, level.height as GLsizei);
                        if compressed {
                            (core.compressed_tex_image_2d)(
                                gl::TEXTURE_2D,
                                level.index as GLint,
                                internal_format,
                                w,
                                h,
                                0,
                                level.image_size,
                                data_ptr(level.data),
                            );
                        } else {
                            (core.tex_image_2d)(
                                gl::TEXTURE_2D,
                                level.index as GLint,
                                internal_format as GLint,
                                w,
                                h,
                                0,
                                format,
                                pixel_type,
                                data_ptr(level.data),
                            );
                        }
                    }
                }

                if generate_mipmaps {
                    (device.gl3().generate_mipmap)(gl::TEXTURE_2D);
                }
                (core.bind_texture)(gl::TEXTURE_2D, 0);
            }
        }

        if let Some(label) = desc.label {
            tracing::trace!("Created texture '{}' ({}) {}x{}", label, name, desc.width, desc.height);
        }

        Ok(Self {
            object: ContainerObject::new(device, ObjectKind::Texture, name),
            width: desc.width,
            height: desc.height,
            format: desc.format,
            flags: desc.flags,
            mip_levels: desc.mip_levels(),
        })
    }

    pub fn object(&self) -> &ContainerObject {
        &self.object
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn flags(&self) -> TextureFlags {
        self.flags
    }

    pub fn mip_levels(&self) -> u32 {
        self.mip_levels
    }
}

/// # Safety
/// A texture with immutable storage must be bound to `GL_TEXTURE_2D`.
unsafe fn upload_sub_image(
    device: &GlDevice,
    texture_format: TextureFormat,
    internal_format: GLenum,
    format: GLenum,
    pixel_type: GLenum,
    level: &Level<'_>,
) {
    let core = device.core();
    let (w, h) = (level.width as GLsizei, level.height as GLsizei);
    // SAFETY: the caller bound the texture; `level.data` spans the level's bytes.
    unsafe {
        if texture_format.is_compressed() {
            (core.compressed_tex_sub_image_2d)(
                gl::TEXTURE_2D,
                level.index as GLint,
                0,
                0,
                w,
                h,
                internal_format,
                level.image_size,
                data_ptr(level.data),
            );
        } else {
            (core.tex_sub_image_2d)(
                gl::TEXTURE_2D,
                level.index as GLint,
                0,
                0,
                w,
                h,
                format,
                pixel_type,
                data_ptr(level.data),
            );
        }
    }
}

fn no_name(desc: &TextureDescriptor<'_>) -> RhiError {
    RhiError::ResourceCreation(format!("driver returned no texture name for {:?}", desc.label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::ext;
    use crate::testing::{fake_device, with_driver, FakeDriverState};

    #[test]
    fn test_dsa_upload_with_mip_chain() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let desc = TextureDescriptor::new(4, 4, TextureFormat::R8G8B8A8)
            .with_flags(TextureFlags::SHADER_RESOURCE | TextureFlags::DATA_CONTAINS_MIPMAPS);
        // 4x4 + 2x2 + 1x1 RGBA
        let data = vec![0u8; (16 + 4 + 1) * 4];
        let texture = Texture2D::create(&device, &desc, Some(&data)).unwrap();

        assert_eq!(texture.mip_levels(), 3);
        with_driver(|d| {
            assert_eq!(d.call_count("glTextureStorage2D"), 1);
            assert_eq!(d.call_count("glTextureSubImage2D"), 3);
            assert_eq!(d.call_count("glBindTexture"), 0);
        });
    }

    #[test]
    fn test_short_data_is_rejected() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let desc = TextureDescriptor::new(8, 8, TextureFormat::R8G8B8A8);
        let result = Texture2D::create(&device, &desc, Some(&[0u8; 16]));
        assert!(matches!(result, Err(RhiError::ResourceCreation(_))));
        assert_eq!(with_driver(|d| d.live_count("texture")), 0);
    }

    #[test]
    fn test_bind_path_with_texture_storage() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let desc = TextureDescriptor::new(8, 8, TextureFormat::Bc1);
        let texture = Texture2D::create(&device, &desc, Some(&[0u8; 32])).unwrap();

        assert_eq!(texture.format(), TextureFormat::Bc1);
        with_driver(|d| {
            assert_eq!(d.call_count("glTexStorage2D"), 1);
            assert_eq!(d.call_count("glCompressedTexSubImage2D"), 1);
            assert_eq!(d.binding(gl::TEXTURE_2D), 0);
        });
    }

    #[test]
    fn test_generate_mipmaps_only_with_data() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let desc = TextureDescriptor::new(16, 16, TextureFormat::R8)
            .with_flags(TextureFlags::GENERATE_MIPMAPS);
        Texture2D::create(&device, &desc, None).unwrap();
        assert_eq!(with_driver(|d| d.call_count("glGenerateMipmap")), 0);
        Texture2D::create(&device, &desc, Some(&[0u8; 256])).unwrap();
        assert_eq!(with_driver(|d| d.call_count("glGenerateMipmap")), 1);
    }

    #[test]
    fn test_es_bgra_storage_is_sized() {
        let mut state = FakeDriverState::es(3, 0);
        state.extensions = vec!["GL_EXT_texture_format_BGRA8888".into()];
        let device = fake_device(state);
        let desc = TextureDescriptor::new(2, 2, TextureFormat::B8G8R8A8);
        Texture2D::create(&device, &desc, Some(&[0u8; 16])).unwrap();

        with_driver(|d| {
            assert_eq!(
                d.texture_formats,
                vec![
                    ("glTexStorage2D", ext::BGRA8_EXT),
                    ("glTexSubImage2D", ext::BGRA_EXT),
                ]
            );
        });
    }

    #[test]
    fn test_dsa_bgra_storage_on_desktop() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let desc = TextureDescriptor::new(2, 2, TextureFormat::B8G8R8A8);
        Texture2D::create(&device, &desc, Some(&[0u8; 16])).unwrap();

        with_driver(|d| {
            assert_eq!(
                d.texture_formats,
                vec![("glTextureStorage2D", gl::RGBA8), ("glTextureSubImage2D", gl::BGRA)]
            );
        });
    }

    #[test]
    fn test_oversized_level_is_rejected_before_creation() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let desc = TextureDescriptor::new(16384, 16384, TextureFormat::R32G32B32A32F);
        let result = Texture2D::create(&device, &desc, None);
        assert!(matches!(result, Err(RhiError::ResourceCreation(_))));
        with_driver(|d| {
            assert_eq!(d.call_count("glCreateTextures"), 0);
            assert_eq!(d.live_count("texture"), 0);
        });
    }

    #[test]
    fn test_unsupported_format() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let desc = TextureDescriptor::new(4, 4, TextureFormat::R16Unorm);
        assert!(matches!(
            Texture2D::create(&device, &desc, None),
            Err(RhiError::NotSupported(_))
        ));
    }
}
