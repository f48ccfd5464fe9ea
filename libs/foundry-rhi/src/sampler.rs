// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Sampler state vocabulary.
//!
//! Ordinals follow the Direct3D numbering the engine's asset formats were
//! authored against; backends translate them into native tokens.

use serde::{Deserialize, Serialize};

/// Texture filtering, including depth-comparison variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FilterMode {
    MinMagMipPoint = 0,
    MinMagPointMipLinear = 0x1,
    MinPointMagLinearMipPoint = 0x4,
    MinPointMagMipLinear = 0x5,
    MinLinearMagMipPoint = 0x10,
    MinLinearMagPointMipLinear = 0x11,
    MinMagLinearMipPoint = 0x14,
    MinMagMipLinear = 0x15,
    Anisotropic = 0x55,
    ComparisonMinMagMipPoint = 0x80,
    ComparisonMinMagPointMipLinear = 0x81,
    ComparisonMinPointMagLinearMipPoint = 0x84,
    ComparisonMinPointMagMipLinear = 0x85,
    ComparisonMinLinearMagMipPoint = 0x90,
    ComparisonMinLinearMagPointMipLinear = 0x91,
    ComparisonMinMagLinearMipPoint = 0x94,
    ComparisonMinMagMipLinear = 0x95,
    ComparisonAnisotropic = 0xd5,
}

impl FilterMode {
    const COMPARISON_BIT: u8 = 0x80;
    const MIP_LINEAR_BIT: u8 = 0x01;
    const MAG_LINEAR_BIT: u8 = 0x04;
    const MIN_LINEAR_BIT: u8 = 0x10;

    pub const ALL: [Self; 18] = [
        Self::MinMagMipPoint,
        Self::MinMagPointMipLinear,
        Self::MinPointMagLinearMipPoint,
        Self::MinPointMagMipLinear,
        Self::MinLinearMagMipPoint,
        Self::MinLinearMagPointMipLinear,
        Self::MinMagLinearMipPoint,
        Self::MinMagMipLinear,
        Self::Anisotropic,
        Self::ComparisonMinMagMipPoint,
        Self::ComparisonMinMagPointMipLinear,
        Self::ComparisonMinPointMagLinearMipPoint,
        Self::ComparisonMinPointMagMipLinear,
        Self::ComparisonMinLinearMagMipPoint,
        Self::ComparisonMinLinearMagPointMipLinear,
        Self::ComparisonMinMagLinearMipPoint,
        Self::ComparisonMinMagMipLinear,
        Self::ComparisonAnisotropic,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn is_comparison(self) -> bool {
        self.ordinal() & Self::COMPARISON_BIT != 0
    }

    pub fn is_anisotropic(self) -> bool {
        matches!(self, Self::Anisotropic | Self::ComparisonAnisotropic)
    }

    /// Whether minification samples linearly (anisotropic counts as linear).
    pub fn is_min_linear(self) -> bool {
        self.is_anisotropic() || self.ordinal() & Self::MIN_LINEAR_BIT != 0
    }

    pub fn is_mag_linear(self) -> bool {
        self.is_anisotropic() || self.ordinal() & Self::MAG_LINEAR_BIT != 0
    }

    pub fn is_mip_linear(self) -> bool {
        self.is_anisotropic() || self.ordinal() & Self::MIP_LINEAR_BIT != 0
    }

    /// The same filter with the depth comparison stripped.
    pub fn without_comparison(self) -> Self {
        match self {
            Self::ComparisonMinMagMipPoint => Self::MinMagMipPoint,
            Self::ComparisonMinMagPointMipLinear => Self::MinMagPointMipLinear,
            Self::ComparisonMinPointMagLinearMipPoint => Self::MinPointMagLinearMipPoint,
            Self::ComparisonMinPointMagMipLinear => Self::MinPointMagMipLinear,
            Self::ComparisonMinLinearMagMipPoint => Self::MinLinearMagMipPoint,
            Self::ComparisonMinLinearMagPointMipLinear => Self::MinLinearMagPointMipLinear,
            Self::ComparisonMinMagLinearMipPoint => Self::MinMagLinearMipPoint,
            Self::ComparisonMinMagMipLinear => Self::MinMagMipLinear,
            Self::ComparisonAnisotropic => Self::Anisotropic,
            other => other,
        }
    }
}

/// Texture coordinate addressing outside [0, 1]. One-based ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TextureAddressMode {
    Wrap = 1,
    Mirror = 2,
    Clamp = 3,
    Border = 4,
    MirrorOnce = 5,
}

impl TextureAddressMode {
    pub const ALL: [Self; 5] = [
        Self::Wrap,
        Self::Mirror,
        Self::Clamp,
        Self::Border,
        Self::MirrorOnce,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Depth/stencil/sampler comparison. One-based ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ComparisonFunc {
    Never = 1,
    Less = 2,
    Equal = 3,
    LessEqual = 4,
    Greater = 5,
    NotEqual = 6,
    GreaterEqual = 7,
    Always = 8,
}

impl ComparisonFunc {
    pub const ALL: [Self; 8] = [
        Self::Never,
        Self::Less,
        Self::Equal,
        Self::LessEqual,
        Self::Greater,
        Self::NotEqual,
        Self::GreaterEqual,
        Self::Always,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Descriptor for creating a sampler state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerStateDescriptor {
    pub filter: FilterMode,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub max_anisotropy: u32,
    pub comparison_func: ComparisonFunc,
    pub border_color: [f32; 4],
    pub min_lod: f32,
    pub max_lod: f32,
}

impl Default for SamplerStateDescriptor {
    fn default() -> Self {
        Self {
            filter: FilterMode::MinMagMipLinear,
            address_u: TextureAddressMode::Clamp,
            address_v: TextureAddressMode::Clamp,
            address_w: TextureAddressMode::Clamp,
            max_anisotropy: 16,
            comparison_func: ComparisonFunc::Never,
            border_color: [0.0; 4],
            min_lod: f32::MIN,
            max_lod: f32::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_bits() {
        assert!(!FilterMode::MinMagMipPoint.is_min_linear());
        assert!(FilterMode::MinLinearMagMipPoint.is_min_linear());
        assert!(!FilterMode::MinLinearMagMipPoint.is_mag_linear());
        assert!(FilterMode::MinPointMagMipLinear.is_mag_linear());
        assert!(FilterMode::MinPointMagMipLinear.is_mip_linear());
        assert!(FilterMode::Anisotropic.is_mip_linear());
    }

    #[test]
    fn test_without_comparison_keeps_filtering() {
        for mode in FilterMode::ALL {
            let plain = mode.without_comparison();
            assert!(!plain.is_comparison());
            assert_eq!(plain.is_min_linear(), mode.is_min_linear(), "{mode:?}");
            assert_eq!(plain.is_mag_linear(), mode.is_mag_linear(), "{mode:?}");
            assert_eq!(plain.is_mip_linear(), mode.is_mip_linear(), "{mode:?}");
        }
    }

    #[test]
    fn test_comparison_variants() {
        let comparisons = FilterMode::ALL.iter().filter(|m| m.is_comparison()).count();
        assert_eq!(comparisons, 9);
    }

    #[test]
    fn test_one_based_ordinals() {
        assert_eq!(TextureAddressMode::ALL[0].ordinal(), 1);
        assert_eq!(ComparisonFunc::ALL[0].ordinal(), 1);
        assert_eq!(ComparisonFunc::Always.ordinal(), 8);
    }
}
