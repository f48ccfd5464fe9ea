// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Vertex, index and texture formats.

use serde::{Deserialize, Serialize};

/// Per-attribute vertex data layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum VertexAttributeFormat {
    /// One 32-bit float.
    Float1 = 0,
    Float2 = 1,
    Float3 = 2,
    Float4 = 3,
    /// Four 8-bit unsigned values normalized to [0, 1].
    R8G8B8A8Unorm = 4,
    /// Four 8-bit unsigned integers, not normalized.
    R8G8B8A8Uint = 5,
    /// Two 16-bit signed integers, not normalized.
    Short2 = 6,
    /// Four 16-bit signed integers, not normalized.
    Short4 = 7,
    /// One 32-bit unsigned integer.
    Uint1 = 8,
}

impl VertexAttributeFormat {
    pub const ALL: [Self; 9] = [
        Self::Float1,
        Self::Float2,
        Self::Float3,
        Self::Float4,
        Self::R8G8B8A8Unorm,
        Self::R8G8B8A8Uint,
        Self::Short2,
        Self::Short4,
        Self::Uint1,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Size of one attribute in bytes.
    pub fn byte_size(self) -> u32 {
        match self {
            Self::Float1 | Self::Uint1 => 4,
            Self::Float2 => 8,
            Self::Float3 => 12,
            Self::Float4 => 16,
            Self::R8G8B8A8Unorm | Self::R8G8B8A8Uint => 4,
            Self::Short2 => 4,
            Self::Short4 => 8,
        }
    }
}

/// Index element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum IndexBufferFormat {
    /// 8-bit unsigned. Not supported by Direct3D, fine on OpenGL.
    UnsignedChar = 0,
    UnsignedShort = 1,
    UnsignedInt = 2,
}

impl IndexBufferFormat {
    pub const ALL: [Self; 3] = [Self::UnsignedChar, Self::UnsignedShort, Self::UnsignedInt];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn bytes_per_element(self) -> u32 {
        match self {
            Self::UnsignedChar => 1,
            Self::UnsignedShort => 2,
            Self::UnsignedInt => 4,
        }
    }
}

/// Texture pixel formats supported by the RHI.
///
/// Platform backends map these to native format constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TextureFormat {
    /// 8-bit red, unsigned normalized.
    R8 = 0,
    /// 24-bit RGB, unsigned normalized.
    R8G8B8 = 1,
    /// 32-bit RGBA, unsigned normalized.
    R8G8B8A8 = 2,
    /// 32-bit RGBA, sRGB.
    R8G8B8A8Srgb = 3,
    /// 32-bit BGRA, unsigned normalized.
    B8G8R8A8 = 4,
    /// Packed 32-bit float RGB (11/11/10 bits).
    R11G11B10F = 5,
    /// 64-bit half float RGBA.
    R16G16B16A16F = 6,
    /// 128-bit float RGBA.
    R32G32B32A32F = 7,
    /// DXT1 compression (known as BC1 in DirectX 10, RGB compression: 8:1, 8 bytes per block).
    Bc1 = 8,
    Bc1Srgb = 9,
    /// DXT3 compression (known as BC2 in DirectX 10, RGBA compression: 4:1, 16 bytes per block).
    Bc2 = 10,
    Bc2Srgb = 11,
    /// DXT5 compression (known as BC3 in DirectX 10, RGBA compression: 4:1, 16 bytes per block).
    Bc3 = 12,
    Bc3Srgb = 13,
    /// 1 component texture compression (also known as 3DC+/ATI1N, 8 bytes per block).
    Bc4 = 14,
    /// 2 component texture compression (luminance & alpha compression 4:1, also known as 3DC/ATI2N, 16 bytes per block).
    Bc5 = 15,
    /// 3 component texture compression meant for mobile devices (8 bytes per block).
    Etc1 = 16,
    /// 16-bit red, unsigned normalized.
    R16Unorm = 17,
    /// 32-bit red, unsigned integer.
    R32Uint = 18,
    /// 32-bit red, float.
    R32Float = 19,
    /// 32-bit float depth.
    D32Float = 20,
    /// 32-bit RG, signed normalized.
    R16G16Snorm = 21,
    /// 32-bit RG, half float.
    R16G16Float = 22,
    /// Unknown or unsupported format.
    Unknown = 23,
}

impl TextureFormat {
    pub const ALL: [Self; 24] = [
        Self::R8,
        Self::R8G8B8,
        Self::R8G8B8A8,
        Self::R8G8B8A8Srgb,
        Self::B8G8R8A8,
        Self::R11G11B10F,
        Self::R16G16B16A16F,
        Self::R32G32B32A32F,
        Self::Bc1,
        Self::Bc1Srgb,
        Self::Bc2,
        Self::Bc2Srgb,
        Self::Bc3,
        Self::Bc3Srgb,
        Self::Bc4,
        Self::Bc5,
        Self::Etc1,
        Self::R16Unorm,
        Self::R32Uint,
        Self::R32Float,
        Self::D32Float,
        Self::R16G16Snorm,
        Self::R16G16Float,
        Self::Unknown,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn is_compressed(self) -> bool {
        matches!(
            self,
            Self::Bc1
                | Self::Bc1Srgb
                | Self::Bc2
                | Self::Bc2Srgb
                | Self::Bc3
                | Self::Bc3Srgb
                | Self::Bc4
                | Self::Bc5
                | Self::Etc1
        )
    }

    pub fn is_depth(self) -> bool {
        matches!(self, Self::D32Float)
    }

    pub fn is_srgb(self) -> bool {
        matches!(
            self,
            Self::R8G8B8A8Srgb | Self::Bc1Srgb | Self::Bc2Srgb | Self::Bc3Srgb
        )
    }

    /// Bytes per element: one pixel, or one 4x4 block for compressed formats.
    pub fn bytes_per_element(self) -> u32 {
        match self {
            Self::R8 => 1,
            Self::R8G8B8 => 3,
            Self::R8G8B8A8 | Self::R8G8B8A8Srgb | Self::B8G8R8A8 => 4,
            Self::R11G11B10F => 4,
            Self::R16G16B16A16F => 8,
            Self::R32G32B32A32F => 16,
            Self::Bc1 | Self::Bc1Srgb | Self::Bc4 | Self::Etc1 => 8,
            Self::Bc2 | Self::Bc2Srgb | Self::Bc3 | Self::Bc3Srgb | Self::Bc5 => 16,
            Self::R16Unorm => 2,
            Self::R32Uint | Self::R32Float | Self::D32Float => 4,
            Self::R16G16Snorm | Self::R16G16Float => 4,
            Self::Unknown => 0,
        }
    }

    /// Bytes per row. Compressed formats count rows of 4x4 blocks.
    pub fn bytes_per_row(self, width: u32) -> u32 {
        if self.is_compressed() {
            width.div_ceil(4) * self.bytes_per_element()
        } else {
            width * self.bytes_per_element()
        }
    }

    /// Bytes for one mip level of `width` x `height`.
    pub fn bytes_per_slice(self, width: u32, height: u32) -> u32 {
        let rows = if self.is_compressed() {
            height.div_ceil(4)
        } else {
            height
        };
        self.bytes_per_row(width) * rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_ordinal_order() {
        for (index, format) in TextureFormat::ALL.iter().enumerate() {
            assert_eq!(format.ordinal() as usize, index);
        }
        for (index, format) in VertexAttributeFormat::ALL.iter().enumerate() {
            assert_eq!(format.ordinal() as usize, index);
        }
        for (index, format) in IndexBufferFormat::ALL.iter().enumerate() {
            assert_eq!(format.ordinal() as usize, index);
        }
    }

    #[test]
    fn test_compressed_slice_size_rounds_to_blocks() {
        // 5x5 BC1 covers 2x2 blocks of 8 bytes
        assert_eq!(TextureFormat::Bc1.bytes_per_slice(5, 5), 32);
        assert_eq!(TextureFormat::Bc3.bytes_per_slice(4, 4), 16);
        assert_eq!(TextureFormat::Bc1.bytes_per_slice(1, 1), 8);
    }

    #[test]
    fn test_uncompressed_slice_size() {
        assert_eq!(TextureFormat::R8G8B8A8.bytes_per_slice(16, 8), 512);
        assert_eq!(TextureFormat::R8G8B8.bytes_per_row(3), 9);
        assert_eq!(TextureFormat::Unknown.bytes_per_slice(16, 16), 0);
    }

    #[test]
    fn test_index_sizes() {
        assert_eq!(IndexBufferFormat::UnsignedChar.bytes_per_element(), 1);
        assert_eq!(IndexBufferFormat::UnsignedShort.bytes_per_element(), 2);
        assert_eq!(IndexBufferFormat::UnsignedInt.bytes_per_element(), 4);
    }
}
