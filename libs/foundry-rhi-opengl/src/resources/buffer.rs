// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::Arc;

use foundry_rhi::{
    BufferUsage, DrawArguments, DrawIndexedArguments, IndexBufferFormat, MapType, Result,
    RhiError,
};

use super::{ContainerObject, GlDevice, ObjectKind};
use crate::mapping;
use crate::native::{GLsizeiptr, GLuint};

/// Create a buffer object holding `data`. Empty data yields a valid empty buffer.
///
/// Without direct state access the buffer is edited through
/// `GL_ARRAY_BUFFER`, which is not vertex array state, so index buffers can be
/// filled without disturbing the bound vertex array.
fn create_buffer_object(
    device: &Arc<GlDevice>,
    data: &[u8],
    usage: BufferUsage,
) -> Result<ContainerObject> {
    let size = data.len() as GLsizeiptr;
    let ptr: *const c_void = if data.is_empty() {
        std::ptr::null()
    } else {
        data.as_ptr().cast()
    };
    let usage = mapping::buffer_usage(usage);
    let mut name: GLuint = 0;

    // SAFETY: `data` outlives the upload; the driver copies it.
    unsafe {
        if let Some(dsa) = device.capabilities().direct_state_access {
            (dsa.create_buffers)(1, &mut name);
            if name != 0 {
                (dsa.named_buffer_data)(name, size, ptr, usage);
            }
        } else {
            let core = device.core();
            (core.gen_buffers)(1, &mut name);
            if name != 0 {
                (core.bind_buffer)(gl::ARRAY_BUFFER, name);
                (core.buffer_data)(gl::ARRAY_BUFFER, size, ptr, usage);
                (core.bind_buffer)(gl::ARRAY_BUFFER, 0);
            }
        }
    }

    if name == 0 {
        return Err(RhiError::ResourceCreation(
            "driver returned no buffer name".to_string(),
        ));
    }
    Ok(ContainerObject::new(device, ObjectKind::Buffer, name))
}

/// Buffers that can be mapped into CPU memory.
pub trait GpuBuffer {
    fn object(&self) -> &ContainerObject;

    /// Size in bytes.
    fn size(&self) -> usize;

    /// Map the whole buffer. The mapping ends when the guard is dropped.
    fn map(&self, map_type: MapType) -> Result<MappedBuffer<'_>> {
        MappedBuffer::new(self.object(), self.size(), map_type)
    }
}

macro_rules! gpu_buffer {
    ($ty:ty) => {
        impl GpuBuffer for $ty {
            fn object(&self) -> &ContainerObject {
                &self.object
            }

            fn size(&self) -> usize {
                self.size
            }
        }
    };
}

#[derive(Debug)]
pub struct VertexBuffer {
    object: ContainerObject,
    size: usize,
    usage: BufferUsage,
}

impl VertexBuffer {
    pub fn create(device: &Arc<GlDevice>, data: &[u8], usage: BufferUsage) -> Result<Self> {
        Ok(Self {
            object: create_buffer_object(device, data, usage)?,
            size: data.len(),
            usage,
        })
    }

    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

gpu_buffer!(VertexBuffer);

#[derive(Debug)]
pub struct IndexBuffer {
    object: ContainerObject,
    size: usize,
    format: IndexBufferFormat,
}

impl IndexBuffer {
    pub fn create(
        device: &Arc<GlDevice>,
        data: &[u8],
        format: IndexBufferFormat,
        usage: BufferUsage,
    ) -> Result<Self> {
        Ok(Self {
            object: create_buffer_object(device, data, usage)?,
            size: data.len(),
            format,
        })
    }

    pub fn format(&self) -> IndexBufferFormat {
        self.format
    }

    pub fn index_count(&self) -> usize {
        self.size / self.format.bytes_per_element() as usize
    }
}

gpu_buffer!(IndexBuffer);

#[derive(Debug)]
pub struct UniformBuffer {
    object: ContainerObject,
    size: usize,
}

impl UniformBuffer {
    pub fn create(device: &Arc<GlDevice>, data: &[u8], usage: BufferUsage) -> Result<Self> {
        Ok(Self {
            object: create_buffer_object(device, data, usage)?,
            size: data.len(),
        })
    }
}

gpu_buffer!(UniformBuffer);

/// Draw records for indirect draws.
///
/// Without native indirect draws the records stay in CPU memory and the
/// dispatch layer replays them one by one.
#[derive(Debug)]
pub struct IndirectBuffer {
    storage: IndirectStorage,
    size: usize,
}

#[derive(Debug)]
enum IndirectStorage {
    Native(ContainerObject),
    Emulated(Box<[u8]>),
}

impl IndirectBuffer {
    pub fn create(device: &Arc<GlDevice>, data: &[u8], usage: BufferUsage) -> Result<Self> {
        let storage = if device.capabilities().native_indirect() {
            IndirectStorage::Native(create_buffer_object(device, data, usage)?)
        } else {
            tracing::debug!(
                "No native indirect draws, keeping {} bytes of draw records on the CPU",
                data.len()
            );
            IndirectStorage::Emulated(data.into())
        };
        Ok(Self {
            storage,
            size: data.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_emulated(&self) -> bool {
        matches!(self.storage, IndirectStorage::Emulated(_))
    }

    pub(crate) fn native(&self) -> Option<&ContainerObject> {
        match &self.storage {
            IndirectStorage::Native(object) => Some(object),
            IndirectStorage::Emulated(_) => None,
        }
    }

    fn records(&self, offset: usize, count: usize, stride: usize) -> Vec<[u32; 5]> {
        let IndirectStorage::Emulated(bytes) = &self.storage else {
            return Vec::new();
        };
        let end = count
            .checked_mul(stride)
            .and_then(|length| length.checked_add(offset))
            .filter(|&end| end <= bytes.len());
        let Some(end) = end else {
            panic!(
                "indirect read of {} records of {} bytes at offset {} exceeds buffer of {} bytes",
                count,
                stride,
                offset,
                bytes.len()
            );
        };

        bytes[offset..end]
            .chunks_exact(stride)
            .map(|record| {
                let mut words = [0u32; 5];
                for (word, chunk) in words.iter_mut().zip(record.chunks_exact(4)) {
                    *word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                }
                words
            })
            .collect()
    }

    /// CPU copies of non-indexed records. Empty for GPU storage.
    pub(crate) fn draw_arguments(&self, offset: usize, count: usize) -> Vec<DrawArguments> {
        self.records(offset, count, std::mem::size_of::<DrawArguments>())
            .into_iter()
            .map(|w| DrawArguments {
                vertex_count_per_instance: w[0],
                instance_count: w[1],
                start_vertex_location: w[2],
                start_instance_location: w[3],
            })
            .collect()
    }

    /// CPU copies of indexed records. Empty for GPU storage.
    pub(crate) fn draw_indexed_arguments(
        &self,
        offset: usize,
        count: usize,
    ) -> Vec<DrawIndexedArguments> {
        self.records(offset, count, std::mem::size_of::<DrawIndexedArguments>())
            .into_iter()
            .map(|w| DrawIndexedArguments {
                index_count_per_instance: w[0],
                instance_count: w[1],
                start_index_location: w[2],
                base_vertex_location: w[3] as i32,
                start_instance_location: w[4],
            })
            .collect()
    }
}

/// CPU view of a mapped buffer; unmapped on drop.
pub struct MappedBuffer<'a> {
    object: &'a ContainerObject,
    data: NonNull<u8>,
    len: usize,
}

impl<'a> MappedBuffer<'a> {
    fn new(object: &'a ContainerObject, len: usize, map_type: MapType) -> Result<Self> {
        if len == 0 {
            return Err(RhiError::ResourceCreation(
                "cannot map an empty buffer".to_string(),
            ));
        }

        let device = object.device();
        let name = object.name();
        let access = mapping::map_range_bits(map_type);
        // SAFETY: the range covers exactly the buffer's storage.
        let ptr = unsafe {
            if let Some(dsa) = device.capabilities().direct_state_access {
                (dsa.map_named_buffer_range)(name, 0, len as GLsizeiptr, access)
            } else {
                let core = device.core();
                (core.bind_buffer)(gl::ARRAY_BUFFER, name);
                let ptr = (device.gl3().map_buffer_range)(
                    gl::ARRAY_BUFFER,
                    0,
                    len as GLsizeiptr,
                    access,
                );
                (core.bind_buffer)(gl::ARRAY_BUFFER, 0);
                ptr
            }
        };

        let data = NonNull::new(ptr.cast::<u8>()).ok_or_else(|| {
            RhiError::ResourceCreation(format!("mapping buffer {} failed", name))
        })?;
        Ok(Self { object, data, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *mut u8 {
        self.data.as_ptr()
    }

    /// # Safety
    /// The mapping must have been created with a readable [`MapType`] and the
    /// GPU must not be writing the buffer.
    pub unsafe fn as_slice(&self) -> &[u8] {
        // SAFETY: `data` covers `len` mapped bytes for the mapping's lifetime.
        unsafe { std::slice::from_raw_parts(self.data.as_ptr(), self.len) }
    }

    /// Copy `bytes` into the mapping at `offset`.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        assert!(
            offset
                .checked_add(bytes.len())
                .is_some_and(|end| end <= self.len),
            "write of {} bytes at {} exceeds mapping of {} bytes",
            bytes.len(),
            offset,
            self.len
        );
        // SAFETY: bounds checked above; the mapping is exclusively borrowed.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.data.as_ptr().add(offset), bytes.len());
        }
    }

    /// End the mapping now.
    pub fn unmap(self) {
        drop(self);
    }
}

impl Drop for MappedBuffer<'_> {
    fn drop(&mut self) {
        if !self.object.is_live() {
            return;
        }
        let device = self.object.device();
        let name = self.object.name();
        // SAFETY: the buffer is currently mapped by this guard.
        unsafe {
            if let Some(dsa) = device.capabilities().direct_state_access {
                (dsa.unmap_named_buffer)(name);
            } else {
                let core = device.core();
                (core.bind_buffer)(gl::ARRAY_BUFFER, name);
                (device.gl3().unmap_buffer)(gl::ARRAY_BUFFER);
                (core.bind_buffer)(gl::ARRAY_BUFFER, 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};

    #[test]
    fn test_empty_buffer_is_valid() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let buffer = VertexBuffer::create(&device, &[], BufferUsage::StaticDraw).unwrap();
        assert_eq!(buffer.size(), 0);
        assert_ne!(buffer.object().name(), 0);
        assert_eq!(with_driver(|d| d.buffer_sizes.get(&buffer.object().name()).copied()), Some(0));
    }

    #[test]
    fn test_dsa_path_never_binds() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        VertexBuffer::create(&device, &[0u8; 64], BufferUsage::DynamicDraw).unwrap();
        assert_eq!(with_driver(|d| d.call_count("glCreateBuffers")), 1);
        assert_eq!(with_driver(|d| d.call_count("glBindBuffer")), 0);
    }

    #[test]
    fn test_index_buffer_uses_array_buffer_target_without_dsa() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let indices = IndexBuffer::create(
            &device,
            &[0u8; 12],
            IndexBufferFormat::UnsignedShort,
            BufferUsage::StaticDraw,
        )
        .unwrap();
        assert_eq!(indices.index_count(), 6);
        with_driver(|d| {
            assert_eq!(d.call_count("glGenBuffers"), 1);
            assert!(d.buffer_targets.iter().all(|t| *t == gl::ARRAY_BUFFER));
            assert_eq!(d.binding(gl::ARRAY_BUFFER), 0);
            assert_eq!(d.binding(gl::ELEMENT_ARRAY_BUFFER), 0);
        });
    }

    #[test]
    fn test_indirect_buffer_emulated_without_native_support() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let records = [
            DrawArguments::new(3),
            DrawArguments {
                vertex_count_per_instance: 6,
                instance_count: 2,
                start_vertex_location: 3,
                start_instance_location: 1,
            },
        ];
        let bytes: Vec<u8> = records
            .iter()
            .flat_map(|r| {
                [
                    r.vertex_count_per_instance,
                    r.instance_count,
                    r.start_vertex_location,
                    r.start_instance_location,
                ]
            })
            .flat_map(u32::to_ne_bytes)
            .collect();

        let buffer = IndirectBuffer::create(&device, &bytes, BufferUsage::StaticDraw).unwrap();
        assert!(buffer.is_emulated());
        assert_eq!(with_driver(|d| d.call_count("glGenBuffers")), 0);
        assert_eq!(buffer.draw_arguments(0, 2), records.to_vec());
        assert_eq!(buffer.draw_arguments(16, 1), vec![records[1]]);
    }

    #[test]
    fn test_indirect_buffer_native_with_support() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let buffer = IndirectBuffer::create(&device, &[0u8; 16], BufferUsage::StaticDraw).unwrap();
        assert!(!buffer.is_emulated());
        assert!(buffer.native().is_some());
    }

    #[test]
    fn test_map_write_unmap() {
        let device = fake_device(FakeDriverState::es(3, 0));
        let buffer = UniformBuffer::create(&device, &[0u8; 8], BufferUsage::DynamicDraw).unwrap();
        {
            let mut mapped = buffer.map(MapType::WriteDiscard).unwrap();
            mapped.write(4, &[1, 2, 3, 4]);
        }
        with_driver(|d| {
            assert_eq!(d.call_count("glMapBufferRange"), 1);
            assert_eq!(d.call_count("glUnmapBuffer"), 1);
            assert_eq!(&d.mapped[4..8], &[1, 2, 3, 4]);
        });
    }

    #[test]
    #[should_panic(expected = "exceeds mapping")]
    fn test_map_write_with_wrapping_offset_panics() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let buffer = UniformBuffer::create(&device, &[0u8; 8], BufferUsage::DynamicDraw).unwrap();
        let mut mapped = buffer.map(MapType::Write).unwrap();
        mapped.write(usize::MAX - 1, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_map_empty_buffer_fails() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let buffer = VertexBuffer::create(&device, &[], BufferUsage::StaticDraw).unwrap();
        assert!(buffer.map(MapType::Read).is_err());
    }
}
