// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::c_void;
use std::sync::Arc;

use foundry_rhi::{Result, RhiError, VertexAttributes};

use super::{ContainerObject, GlDevice, GpuBuffer, IndexBuffer, ObjectKind, VertexBuffer};
use crate::mapping;
use crate::native::{GLintptr, GLsizei, GLuint};

/// Vertex layout bound to concrete vertex buffers and an optional index
/// buffer. Keeps its buffers alive.
#[derive(Debug)]
pub struct VertexArray {
    object: ContainerObject,
    vertex_buffers: Vec<Arc<VertexBuffer>>,
    index_buffer: Option<Arc<IndexBuffer>>,
    attributes: VertexAttributes,
}

impl VertexArray {
    /// Attribute `i` is bound to shader location `i`. Without direct state
    /// access the vertex array is left bound; the caller restores its own.
    pub fn create(
        device: &Arc<GlDevice>,
        attributes: &VertexAttributes,
        vertex_buffers: &[Arc<VertexBuffer>],
        index_buffer: Option<Arc<IndexBuffer>>,
    ) -> Result<Self> {
        let required = attributes.input_slot_count() as usize;
        if vertex_buffers.len() < required {
            return Err(RhiError::ResourceCreation(format!(
                "vertex layout reads {} input slots but {} vertex buffers were given",
                required,
                vertex_buffers.len()
            )));
        }

        let mut name: GLuint = 0;
        // SAFETY: every buffer name is live for the duration of the calls.
        unsafe {
            if let Some(dsa) = device.capabilities().direct_state_access {
                (dsa.create_vertex_arrays)(1, &mut name);
                if name == 0 {
                    return Err(no_name());
                }
                for (index, attribute) in attributes.attributes.iter().enumerate() {
                    let index = index as GLuint;
                    let format = attribute.format;
                    let buffer = &vertex_buffers[attribute.input_slot as usize];

                    (dsa.enable_vertex_array_attrib)(name, index);
                    if mapping::is_vertex_attribute_integer(format) {
                        (dsa.vertex_array_attrib_iformat)(
                            name,
                            index,
                            mapping::vertex_attribute_size(format),
                            mapping::vertex_attribute_type(format),
                            0,
                        );
                    } else {
                        (dsa.vertex_array_attrib_format)(
                            name,
                            index,
                            mapping::vertex_attribute_size(format),
                            mapping::vertex_attribute_type(format),
                            mapping::is_vertex_attribute_normalized(format),
                            0,
                        );
                    }
                    // One binding per attribute so the byte offset can live in
                    // the binding.
                    (dsa.vertex_array_vertex_buffer)(
                        name,
                        index,
                        buffer.object().name(),
                        attribute.aligned_byte_offset as GLintptr,
                        attribute.stride_in_bytes as GLsizei,
                    );
                    (dsa.vertex_array_attrib_binding)(name, index, index);
                    (dsa.vertex_array_binding_divisor)(
                        name,
                        index,
                        attribute.instances_per_element,
                    );
                }
                if let Some(indices) = &index_buffer {
                    (dsa.vertex_array_element_buffer)(name, indices.object().name());
                }
            } else {
                let core = device.core();
                let gl3 = device.gl3();
                (gl3.gen_vertex_arrays)(1, &mut name);
                if name == 0 {
                    return Err(no_name());
                }
                (gl3.bind_vertex_array)(name);
                for (index, attribute) in attributes.attributes.iter().enumerate() {
                    let index = index as GLuint;
                    let format = attribute.format;
                    let buffer = &vertex_buffers[attribute.input_slot as usize];
                    let offset = attribute.aligned_byte_offset as usize as *const c_void;

                    (core.bind_buffer)(gl::ARRAY_BUFFER, buffer.object().name());
                    (core.enable_vertex_attrib_array)(index);
                    if mapping::is_vertex_attribute_integer(format) {
                        (gl3.vertex_attrib_ipointer)(
                            index,
                            mapping::vertex_attribute_size(format),
                            mapping::vertex_attribute_type(format),
                            attribute.stride_in_bytes as GLsizei,
                            offset,
                        );
                    } else {
                        (core.vertex_attrib_pointer)(
                            index,
                            mapping::vertex_attribute_size(format),
                            mapping::vertex_attribute_type(format),
                            mapping::is_vertex_attribute_normalized(format),
                            attribute.stride_in_bytes as GLsizei,
                            offset,
                        );
                    }
                    (gl3.vertex_attrib_divisor)(index, attribute.instances_per_element);
                }
                (core.bind_buffer)(gl::ARRAY_BUFFER, 0);
                if let Some(indices) = &index_buffer {
                    (core.bind_buffer)(gl::ELEMENT_ARRAY_BUFFER, indices.object().name());
                }
            }
        }

        Ok(Self {
            object: ContainerObject::new(device, ObjectKind::VertexArray, name),
            vertex_buffers: vertex_buffers.to_vec(),
            index_buffer,
            attributes: attributes.clone(),
        })
    }

    pub fn object(&self) -> &ContainerObject {
        &self.object
    }

    pub fn vertex_buffers(&self) -> &[Arc<VertexBuffer>] {
        &self.vertex_buffers
    }

    pub fn index_buffer(&self) -> Option<&Arc<IndexBuffer>> {
        self.index_buffer.as_ref()
    }

    pub fn attributes(&self) -> &VertexAttributes {
        &self.attributes
    }
}

fn no_name() -> RhiError {
    RhiError::ResourceCreation("driver returned no vertex array name".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};
    use foundry_rhi::{BufferUsage, IndexBufferFormat, VertexAttribute, VertexAttributeFormat};

    fn layout() -> VertexAttributes {
        VertexAttributes::new(vec![
            VertexAttribute::per_vertex("position", VertexAttributeFormat::Float3, 0, 0, 16),
            VertexAttribute::per_vertex("color", VertexAttributeFormat::R8G8B8A8Unorm, 0, 12, 16),
            VertexAttribute::per_vertex("id", VertexAttributeFormat::Uint1, 1, 0, 4).per_instance(1),
        ])
    }

    fn buffers(device: &Arc<GlDevice>, count: usize) -> Vec<Arc<VertexBuffer>> {
        (0..count)
            .map(|_| {
                Arc::new(VertexBuffer::create(device, &[0u8; 64], BufferUsage::StaticDraw).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_too_few_buffers() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let result = VertexArray::create(&device, &layout(), &buffers(&device, 1), None);
        assert!(matches!(result, Err(RhiError::ResourceCreation(_))));
        assert_eq!(with_driver(|d| d.live_count("vertex_array")), 0);
    }

    #[test]
    fn test_dsa_binds_nothing() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let vbs = buffers(&device, 2);
        let vao = VertexArray::create(&device, &layout(), &vbs, None).unwrap();

        assert_eq!(vao.vertex_buffers().len(), 2);
        with_driver(|d| {
            assert_eq!(d.call_count("glBindVertexArray"), 0);
            assert_eq!(d.call_count("glVertexArrayAttribFormat"), 2);
            assert_eq!(d.call_count("glVertexArrayAttribIFormat"), 1);
            assert_eq!(d.call_count("glVertexArrayVertexBuffer"), 3);
        });
    }

    #[test]
    fn test_bind_path_records_index_buffer_in_vao() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let vbs = buffers(&device, 2);
        let indices = Arc::new(
            IndexBuffer::create(
                &device,
                &[0u8; 6],
                IndexBufferFormat::UnsignedShort,
                BufferUsage::StaticDraw,
            )
            .unwrap(),
        );
        let vao = VertexArray::create(&device, &layout(), &vbs, Some(Arc::clone(&indices))).unwrap();

        with_driver(|d| {
            assert_eq!(d.binding(gl::VERTEX_ARRAY_BINDING), vao.object().name());
            assert_eq!(d.binding(gl::ELEMENT_ARRAY_BUFFER), indices.object().name());
            assert_eq!(d.binding(gl::ARRAY_BUFFER), 0);
            assert_eq!(d.call_count("glVertexAttribIPointer"), 1);
            assert_eq!(d.call_count("glVertexAttribDivisor"), 3);
        });
    }

    #[test]
    fn test_vao_keeps_buffers_alive() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let vbs = buffers(&device, 2);
        let vao = VertexArray::create(&device, &layout(), &vbs, None).unwrap();
        drop(vbs);
        assert_eq!(with_driver(|d| d.live_count("buffer")), 2);
        drop(vao);
        assert_eq!(with_driver(|d| d.live_count("buffer")), 0);
    }
}
