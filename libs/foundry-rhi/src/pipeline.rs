// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Pipeline state vocabulary: topology, blending, depth testing.

use serde::{Deserialize, Serialize};

use crate::ComparisonFunc;

/// Primitive assembly mode.
///
/// Ordinals: lists/strips are 1..=5, adjacency variants 10..=13 and patch
/// lists 33..=64 (`32 + control points`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    LineListAdj,
    LineStripAdj,
    TriangleListAdj,
    TriangleStripAdj,
    /// Patch list with the given number of control points (1..=32).
    PatchList(u8),
}

impl PrimitiveTopology {
    pub const FIRST_BASIC_ORDINAL: u8 = 1;
    pub const FIRST_ADJACENCY_ORDINAL: u8 = 10;
    pub const FIRST_PATCH_ORDINAL: u8 = 33;
    pub const MAX_PATCH_CONTROL_POINTS: u8 = 32;

    pub fn ordinal(self) -> u8 {
        match self {
            Self::PointList => 1,
            Self::LineList => 2,
            Self::LineStrip => 3,
            Self::TriangleList => 4,
            Self::TriangleStrip => 5,
            Self::LineListAdj => 10,
            Self::LineStripAdj => 11,
            Self::TriangleListAdj => 12,
            Self::TriangleStripAdj => 13,
            Self::PatchList(points) => {
                assert!(
                    (1..=Self::MAX_PATCH_CONTROL_POINTS).contains(&points),
                    "patch list with {} control points",
                    points
                );
                Self::FIRST_PATCH_ORDINAL - 1 + points
            }
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        Some(match ordinal {
            1 => Self::PointList,
            2 => Self::LineList,
            3 => Self::LineStrip,
            4 => Self::TriangleList,
            5 => Self::TriangleStrip,
            10 => Self::LineListAdj,
            11 => Self::LineStripAdj,
            12 => Self::TriangleListAdj,
            13 => Self::TriangleStripAdj,
            33..=64 => Self::PatchList(ordinal - (Self::FIRST_PATCH_ORDINAL - 1)),
            _ => return None,
        })
    }

    /// Every valid topology in ordinal order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..=u8::MAX).filter_map(Self::from_ordinal)
    }

    pub fn is_adjacency(self) -> bool {
        matches!(
            self,
            Self::LineListAdj | Self::LineStripAdj | Self::TriangleListAdj | Self::TriangleStripAdj
        )
    }

    /// Control point count for patch lists.
    pub fn patch_control_points(self) -> Option<u8> {
        match self {
            Self::PatchList(points) => Some(points),
            _ => None,
        }
    }

    /// The non-adjacency topology assembling the same primitives.
    pub fn without_adjacency(self) -> Self {
        match self {
            Self::LineListAdj => Self::LineList,
            Self::LineStripAdj => Self::LineStrip,
            Self::TriangleListAdj => Self::TriangleList,
            Self::TriangleStripAdj => Self::TriangleStrip,
            other => other,
        }
    }
}

/// Blend factor.
///
/// Ordinals 1..=11 are the basic factors; 14..=19 are the constant-color and
/// dual-source factors. 12 and 13 are unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Blend {
    Zero = 1,
    One = 2,
    SrcColor = 3,
    InvSrcColor = 4,
    SrcAlpha = 5,
    InvSrcAlpha = 6,
    DestAlpha = 7,
    InvDestAlpha = 8,
    DestColor = 9,
    InvDestColor = 10,
    SrcAlphaSat = 11,
    BlendFactor = 14,
    InvBlendFactor = 15,
    Src1Color = 16,
    InvSrc1Color = 17,
    Src1Alpha = 18,
    InvSrc1Alpha = 19,
}

impl Blend {
    /// First ordinal of the advanced (constant color and dual-source) tier.
    pub const ADVANCED_THRESHOLD: u8 = Self::BlendFactor as u8;

    pub const ALL: [Self; 17] = [
        Self::Zero,
        Self::One,
        Self::SrcColor,
        Self::InvSrcColor,
        Self::SrcAlpha,
        Self::InvSrcAlpha,
        Self::DestAlpha,
        Self::InvDestAlpha,
        Self::DestColor,
        Self::InvDestColor,
        Self::SrcAlphaSat,
        Self::BlendFactor,
        Self::InvBlendFactor,
        Self::Src1Color,
        Self::InvSrc1Color,
        Self::Src1Alpha,
        Self::InvSrc1Alpha,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn is_advanced(self) -> bool {
        self.ordinal() >= Self::ADVANCED_THRESHOLD
    }

    pub fn is_dual_source(self) -> bool {
        matches!(
            self,
            Self::Src1Color | Self::InvSrc1Color | Self::Src1Alpha | Self::InvSrc1Alpha
        )
    }
}

/// Render target blending. Disabled blending ignores the factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlendStateDescriptor {
    pub enabled: bool,
    pub src: Blend,
    pub dest: Blend,
    pub src_alpha: Blend,
    pub dest_alpha: Blend,
}

impl Default for BlendStateDescriptor {
    fn default() -> Self {
        Self {
            enabled: false,
            src: Blend::One,
            dest: Blend::Zero,
            src_alpha: Blend::One,
            dest_alpha: Blend::Zero,
        }
    }
}

impl BlendStateDescriptor {
    /// Classic non-premultiplied alpha blending.
    pub fn alpha_blending() -> Self {
        Self {
            enabled: true,
            src: Blend::SrcAlpha,
            dest: Blend::InvSrcAlpha,
            src_alpha: Blend::One,
            dest_alpha: Blend::InvSrcAlpha,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepthStencilDescriptor {
    pub depth_enable: bool,
    pub depth_write: bool,
    pub depth_func: ComparisonFunc,
}

impl Default for DepthStencilDescriptor {
    fn default() -> Self {
        Self {
            depth_enable: true,
            depth_write: true,
            depth_func: ComparisonFunc::Greater,
        }
    }
}

/// Clip space origin; `UpperLeft` matches Direct3D and Vulkan conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClipOrigin {
    #[default]
    LowerLeft,
    UpperLeft,
}

/// Fixed-function state paired with a program at pipeline creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PipelineStateDescriptor {
    pub primitive_topology: PrimitiveTopology,
    pub blend: BlendStateDescriptor,
    pub depth_stencil: DepthStencilDescriptor,
}

impl Default for PipelineStateDescriptor {
    fn default() -> Self {
        Self {
            primitive_topology: PrimitiveTopology::TriangleList,
            blend: BlendStateDescriptor::default(),
            depth_stencil: DepthStencilDescriptor::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_ordinals_round_trip() {
        let mut count = 0;
        for topology in PrimitiveTopology::all() {
            assert_eq!(
                PrimitiveTopology::from_ordinal(topology.ordinal()),
                Some(topology)
            );
            count += 1;
        }
        assert_eq!(count, 5 + 4 + 32);
    }

    #[test]
    fn test_patch_list_ordinals() {
        assert_eq!(PrimitiveTopology::PatchList(1).ordinal(), 33);
        assert_eq!(PrimitiveTopology::PatchList(32).ordinal(), 64);
        assert_eq!(PrimitiveTopology::from_ordinal(0), None);
        assert_eq!(PrimitiveTopology::from_ordinal(6), None);
        assert_eq!(PrimitiveTopology::from_ordinal(65), None);
    }

    #[test]
    #[should_panic(expected = "control points")]
    fn test_patch_list_ordinal_rejects_too_many_points() {
        PrimitiveTopology::PatchList(224).ordinal();
    }

    #[test]
    fn test_blend_tiers() {
        assert!(!Blend::Zero.is_advanced());
        assert!(!Blend::SrcAlphaSat.is_advanced());
        assert!(Blend::BlendFactor.is_advanced());
        assert!(Blend::InvSrc1Alpha.is_advanced());
        assert_eq!(Blend::ALL.iter().filter(|b| b.is_dual_source()).count(), 4);
    }
}
