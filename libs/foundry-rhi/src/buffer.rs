// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Buffer vocabulary: usage hints, mapping, vertex layouts and draw records.

use serde::{Deserialize, Serialize};

use crate::VertexAttributeFormat;

/// Buffer usage hint.
///
/// The ordinals intentionally equal the native OpenGL usage tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum BufferUsage {
    StreamDraw = 0x88E0,
    StreamRead = 0x88E1,
    StreamCopy = 0x88E2,
    StaticDraw = 0x88E4,
    StaticRead = 0x88E5,
    StaticCopy = 0x88E6,
    DynamicDraw = 0x88E8,
    DynamicRead = 0x88E9,
    DynamicCopy = 0x88EA,
}

impl BufferUsage {
    pub const ALL: [Self; 9] = [
        Self::StreamDraw,
        Self::StreamRead,
        Self::StreamCopy,
        Self::StaticDraw,
        Self::StaticRead,
        Self::StaticCopy,
        Self::DynamicDraw,
        Self::DynamicRead,
        Self::DynamicCopy,
    ];

    pub fn ordinal(self) -> u16 {
        self as u16
    }
}

/// CPU access requested when mapping a resource. One-based ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MapType {
    Read = 1,
    Write = 2,
    ReadWrite = 3,
    /// Write, previous contents are discarded.
    WriteDiscard = 4,
    /// Write to regions the GPU is not using; no synchronization.
    WriteNoOverwrite = 5,
}

impl MapType {
    pub const ALL: [Self; 5] = [
        Self::Read,
        Self::Write,
        Self::ReadWrite,
        Self::WriteDiscard,
        Self::WriteNoOverwrite,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn reads(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    pub fn writes(self) -> bool {
        !matches!(self, Self::Read)
    }
}

/// One vertex attribute of a vertex array layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttribute {
    pub format: VertexAttributeFormat,
    /// Shader input name; informational for the GL backend which binds by location.
    pub name: String,
    /// Index into the vertex buffers passed at vertex array creation.
    pub input_slot: u32,
    /// Byte offset of the attribute inside one vertex.
    pub aligned_byte_offset: u32,
    /// Vertex stride of the input slot in bytes.
    pub stride_in_bytes: u32,
    /// 0 = per-vertex, N = advance once every N instances.
    pub instances_per_element: u32,
}

impl VertexAttribute {
    pub fn per_vertex(
        name: impl Into<String>,
        format: VertexAttributeFormat,
        input_slot: u32,
        aligned_byte_offset: u32,
        stride_in_bytes: u32,
    ) -> Self {
        Self {
            format,
            name: name.into(),
            input_slot,
            aligned_byte_offset,
            stride_in_bytes,
            instances_per_element: 0,
        }
    }

    pub fn per_instance(mut self, instances_per_element: u32) -> Self {
        self.instances_per_element = instances_per_element;
        self
    }
}

/// Vertex layout; attribute `i` is bound to shader location `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttributes {
    pub attributes: Vec<VertexAttribute>,
}

impl VertexAttributes {
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        Self { attributes }
    }

    /// Number of vertex buffers the layout reads from.
    pub fn input_slot_count(&self) -> u32 {
        self.attributes
            .iter()
            .map(|a| a.input_slot + 1)
            .max()
            .unwrap_or(0)
    }
}

/// Non-indexed draw record; layout matches the native indirect command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct DrawArguments {
    pub vertex_count_per_instance: u32,
    pub instance_count: u32,
    pub start_vertex_location: u32,
    pub start_instance_location: u32,
}

impl DrawArguments {
    pub fn new(vertex_count: u32) -> Self {
        Self {
            vertex_count_per_instance: vertex_count,
            instance_count: 1,
            start_vertex_location: 0,
            start_instance_location: 0,
        }
    }
}

/// Indexed draw record; layout matches the native indirect command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(C)]
pub struct DrawIndexedArguments {
    pub index_count_per_instance: u32,
    pub instance_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
    pub start_instance_location: u32,
}

impl DrawIndexedArguments {
    pub fn new(index_count: u32) -> Self {
        Self {
            index_count_per_instance: index_count,
            instance_count: 1,
            start_index_location: 0,
            base_vertex_location: 0,
            start_instance_location: 0,
        }
    }
}

bitflags::bitflags! {
    /// Render target planes cleared by `clear`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
        const COLOR_DEPTH = Self::COLOR.bits() | Self::DEPTH.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_type_access() {
        assert!(MapType::Read.reads());
        assert!(!MapType::Read.writes());
        assert!(MapType::ReadWrite.reads() && MapType::ReadWrite.writes());
        assert!(!MapType::WriteDiscard.reads());
    }

    #[test]
    fn test_input_slot_count() {
        let layout = VertexAttributes::new(vec![
            VertexAttribute::per_vertex("position", VertexAttributeFormat::Float3, 0, 0, 12),
            VertexAttribute::per_vertex("transform", VertexAttributeFormat::Float4, 2, 0, 16)
                .per_instance(1),
        ]);
        assert_eq!(layout.input_slot_count(), 3);
        assert_eq!(VertexAttributes::default().input_slot_count(), 0);
    }

    #[test]
    fn test_indirect_record_sizes() {
        assert_eq!(std::mem::size_of::<DrawArguments>(), 16);
        assert_eq!(std::mem::size_of::<DrawIndexedArguments>(), 20);
    }
}
