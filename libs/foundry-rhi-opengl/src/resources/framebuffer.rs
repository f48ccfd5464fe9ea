// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::sync::Arc;

use foundry_rhi::{Result, RhiError, TextureFlags};

use super::{ContainerObject, GlDevice, ObjectKind, Texture2D};
use crate::native::{GLenum, GLsizei, GLuint};

/// Color attachments a render target may have.
pub const MAX_COLOR_ATTACHMENTS: usize = 8;

/// Render target made of 2D textures. Keeps its attachments alive.
#[derive(Debug)]
pub struct Framebuffer {
    object: ContainerObject,
    color: Vec<Arc<Texture2D>>,
    depth: Option<Arc<Texture2D>>,
    width: u32,
    height: u32,
}

fn check_attachment(texture: &Texture2D, index: usize) -> Result<()> {
    if !texture.flags().contains(TextureFlags::RENDER_TARGET) {
        return Err(RhiError::ResourceCreation(format!(
            "attachment {} ({:?}) was not created as a render target",
            index,
            texture.format()
        )));
    }
    Ok(())
}

impl Framebuffer {
    /// Without direct state access the framebuffer is left bound to
    /// `GL_FRAMEBUFFER`; the caller restores its own.
    pub fn create(
        device: &Arc<GlDevice>,
        color: &[Arc<Texture2D>],
        depth: Option<Arc<Texture2D>>,
    ) -> Result<Self> {
        if color.len() > MAX_COLOR_ATTACHMENTS {
            return Err(RhiError::ResourceCreation(format!(
                "{} color attachments exceed the limit of {}",
                color.len(),
                MAX_COLOR_ATTACHMENTS
            )));
        }
        for (index, texture) in color.iter().enumerate() {
            check_attachment(texture, index)?;
        }
        let depth_attachment = match &depth {
            Some(texture) => {
                check_attachment(texture, color.len())?;
                if !texture.format().is_depth() {
                    return Err(RhiError::ResourceCreation(format!(
                        "depth attachment has color format {:?}",
                        texture.format()
                    )));
                }
                Some(texture.object().name())
            }
            None => None,
        };

        let (width, height) = color
            .first()
            .or(depth.as_ref())
            .map(|t| (t.width(), t.height()))
            .ok_or_else(|| {
                RhiError::ResourceCreation("framebuffer without attachments".to_string())
            })?;

        let draw_buffers: Vec<GLenum> = (0..color.len())
            .map(|i| gl::COLOR_ATTACHMENT0 + i as GLenum)
            .collect();

        let mut name: GLuint = 0;
        // SAFETY: attachment names are live; `draw_buffers` outlives the calls.
        let status = unsafe {
            if let Some(dsa) = device.capabilities().direct_state_access {
                (dsa.create_framebuffers)(1, &mut name);
                if name == 0 {
                    return Err(no_name());
                }
                for (attachment, texture) in draw_buffers.iter().zip(color) {
                    (dsa.named_framebuffer_texture)(name, *attachment, texture.object().name(), 0);
                }
                if let Some(texture) = depth_attachment {
                    (dsa.named_framebuffer_texture)(name, gl::DEPTH_ATTACHMENT, texture, 0);
                }
                (dsa.named_framebuffer_draw_buffers)(
                    name,
                    draw_buffers.len() as GLsizei,
                    draw_buffers.as_ptr(),
                );
                (dsa.check_named_framebuffer_status)(name, gl::FRAMEBUFFER)
            } else {
                let gl3 = device.gl3();
                (gl3.gen_framebuffers)(1, &mut name);
                if name == 0 {
                    return Err(no_name());
                }
                (gl3.bind_framebuffer)(gl::FRAMEBUFFER, name);
                for (attachment, texture) in draw_buffers.iter().zip(color) {
                    (gl3.framebuffer_texture_2d)(
                        gl::FRAMEBUFFER,
                        *attachment,
                        gl::TEXTURE_2D,
                        texture.object().name(),
                        0,
                    );
                }
                if let Some(texture) = depth_attachment {
                    (gl3.framebuffer_texture_2d)(
                        gl::FRAMEBUFFER,
                        gl::DEPTH_ATTACHMENT,
                        gl::TEXTURE_2D,
                        texture,
                        0,
                    );
                }
                (gl3.draw_buffers)(draw_buffers.len() as GLsizei, draw_buffers.as_ptr());
                (gl3.check_framebuffer_status)(gl::FRAMEBUFFER)
            }
        };

        let object = ContainerObject::new(device, ObjectKind::Framebuffer, name);
        if status != gl::FRAMEBUFFER_COMPLETE {
            tracing::warn!("Framebuffer {} incomplete: 0x{:04X}", name, status);
            return Err(RhiError::IncompleteFramebuffer { status });
        }

        Ok(Self {
            object,
            color: color.to_vec(),
            depth,
            width,
            height,
        })
    }

    pub fn object(&self) -> &ContainerObject {
        &self.object
    }

    pub fn color_attachments(&self) -> &[Arc<Texture2D>] {
        &self.color
    }

    pub fn depth_attachment(&self) -> Option<&Arc<Texture2D>> {
        self.depth.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

fn no_name() -> RhiError {
    RhiError::ResourceCreation("driver returned no framebuffer name".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};
    use foundry_rhi::{TextureDescriptor, TextureFormat};

    fn target(device: &Arc<GlDevice>, format: TextureFormat) -> Arc<Texture2D> {
        let desc = TextureDescriptor::new(32, 16, format).with_flags(TextureFlags::RENDER_TARGET);
        Arc::new(Texture2D::create(device, &desc, None).unwrap())
    }

    #[test]
    fn test_dsa_framebuffer() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let color = vec![
            target(&device, TextureFormat::R8G8B8A8),
            target(&device, TextureFormat::R16G16B16A16F),
        ];
        let depth = target(&device, TextureFormat::D32Float);
        let framebuffer = Framebuffer::create(&device, &color, Some(depth)).unwrap();

        assert_eq!((framebuffer.width(), framebuffer.height()), (32, 16));
        assert!(framebuffer.depth_attachment().is_some());
        with_driver(|d| {
            assert_eq!(d.call_count("glNamedFramebufferTexture"), 3);
            assert_eq!(d.call_count("glBindFramebuffer"), 0);
        });
    }

    #[test]
    fn test_attachment_must_be_render_target() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let desc = TextureDescriptor::new(4, 4, TextureFormat::R8G8B8A8);
        let texture = Arc::new(Texture2D::create(&device, &desc, None).unwrap());
        let result = Framebuffer::create(&device, &[texture], None);
        assert!(matches!(result, Err(RhiError::ResourceCreation(_))));
        assert_eq!(with_driver(|d| d.call_count("glGenFramebuffers")), 0);
    }

    #[test]
    fn test_incomplete_status_is_reported_and_released() {
        let mut state = FakeDriverState::es(3, 0);
        state.framebuffer_status = gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
        let device = fake_device(state);
        let color = [target(&device, TextureFormat::R8G8B8A8)];

        let result = Framebuffer::create(&device, &color, None);
        assert!(matches!(
            result,
            Err(RhiError::IncompleteFramebuffer { status }) if status == gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        ));
        assert_eq!(with_driver(|d| d.live_count("framebuffer")), 0);
    }

    #[test]
    fn test_color_attachment_limit() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let color: Vec<_> = (0..9).map(|_| target(&device, TextureFormat::R8)).collect();
        assert!(Framebuffer::create(&device, &color, None).is_err());
    }
}
