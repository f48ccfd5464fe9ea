// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! RHI texture descriptors.

use crate::{BufferUsage, TextureFormat};

bitflags::bitflags! {
    /// Texture creation flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureFlags: u32 {
        /// Initial data contains the full mip chain.
        const DATA_CONTAINS_MIPMAPS = 1 << 0;
        /// Let the driver build the mip chain from level 0.
        const GENERATE_MIPMAPS = 1 << 1;
        /// Can be bound as a framebuffer attachment.
        const RENDER_TARGET = 1 << 2;
        /// Can be sampled by shaders.
        const SHADER_RESOURCE = 1 << 3;
    }
}

/// Descriptor for creating a 2D texture.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    pub label: Option<&'a str>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub flags: TextureFlags,
    pub usage: BufferUsage,
}

impl<'a> TextureDescriptor<'a> {
    /// Create a new texture descriptor.
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            label: None,
            width,
            height,
            format,
            flags: TextureFlags::SHADER_RESOURCE,
            usage: BufferUsage::StaticDraw,
        }
    }

    /// Set the label for debugging.
    pub fn with_label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the creation flags.
    pub fn with_flags(mut self, flags: TextureFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Number of mip levels for a full chain down to 1x1.
    pub fn full_mip_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Mip levels the native storage is allocated with.
    pub fn mip_levels(&self) -> u32 {
        if self
            .flags
            .intersects(TextureFlags::DATA_CONTAINS_MIPMAPS | TextureFlags::GENERATE_MIPMAPS)
        {
            self.full_mip_count()
        } else {
            1
        }
    }
}
