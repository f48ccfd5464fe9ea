// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! GPU resources and the lifetime rules of their native objects.
//!
//! Every native object name is owned by exactly one [`ContainerObject`].
//! Dropping it deletes the name once, unless the context that created the
//! name has been recreated, in which case the name died with it.

mod buffer;
mod framebuffer;
mod pipeline;
mod program;
mod resource_group;
mod sampler;
mod texture;
mod vertex_array;

pub use buffer::{GpuBuffer, IndexBuffer, IndirectBuffer, MappedBuffer, UniformBuffer, VertexBuffer};
pub use framebuffer::{Framebuffer, MAX_COLOR_ATTACHMENTS};
pub use pipeline::{BlendFactors, PipelineState};
pub use program::Program;
pub use resource_group::{ResourceBinding, ResourceGroup};
pub use sampler::SamplerState;
pub use texture::Texture2D;
pub use vertex_array::VertexArray;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::capabilities::Capabilities;
use crate::entry_points::{CoreFunctions, Gl3Functions};
use crate::loader::SymbolLibrary;
use crate::mapping::MappingProfile;
use crate::native::{GLuint, GlVersion};

/// Generation of the native context objects were created under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

/// Function tables and capabilities shared by every resource.
pub struct GlDevice {
    core: CoreFunctions,
    gl3: Gl3Functions,
    capabilities: Capabilities,
    profile: MappingProfile,
    version: GlVersion,
    context: AtomicU64,
    // Keeps the tables above callable for as long as any resource lives.
    _library: Arc<dyn SymbolLibrary>,
}

impl GlDevice {
    pub fn new(
        core: CoreFunctions,
        gl3: Gl3Functions,
        capabilities: Capabilities,
        profile: MappingProfile,
        version: GlVersion,
        library: Arc<dyn SymbolLibrary>,
    ) -> Self {
        Self {
            core,
            gl3,
            capabilities,
            profile,
            version,
            context: AtomicU64::new(0),
            _library: library,
        }
    }

    pub fn core(&self) -> &CoreFunctions {
        &self.core
    }

    pub fn gl3(&self) -> &Gl3Functions {
        &self.gl3
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn profile(&self) -> &MappingProfile {
        &self.profile
    }

    pub fn version(&self) -> GlVersion {
        self.version
    }

    pub fn context_id(&self) -> ContextId {
        ContextId(self.context.load(Ordering::Acquire))
    }

    /// Mark every existing object as belonging to a dead context.
    pub(crate) fn bump_context(&self) -> ContextId {
        ContextId(self.context.fetch_add(1, Ordering::AcqRel) + 1)
    }
}

impl std::fmt::Debug for GlDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlDevice")
            .field("version", &self.version)
            .field("context", &self.context_id())
            .field("profile", &self.profile)
            .finish()
    }
}

/// Native object namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Buffer,
    Texture,
    VertexArray,
    Framebuffer,
    Program,
    Sampler,
}

/// Sole owner of one native object name.
///
/// Move-only; [`ContainerObject::destroy`] consumes it, so an object cannot
/// be destroyed twice:
///
/// ```compile_fail,E0382
/// fn twice(object: foundry_rhi_opengl::resources::ContainerObject) {
///     object.destroy();
///     object.destroy();
/// }
/// ```
pub struct ContainerObject {
    device: Arc<GlDevice>,
    kind: ObjectKind,
    name: GLuint,
    context: ContextId,
}

impl ContainerObject {
    /// Take ownership of a freshly created, non-zero name.
    pub(crate) fn new(device: &Arc<GlDevice>, kind: ObjectKind, name: GLuint) -> Self {
        debug_assert_ne!(name, 0, "{:?} name 0 is reserved", kind);
        Self {
            device: Arc::clone(device),
            kind,
            name,
            context: device.context_id(),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn device(&self) -> &Arc<GlDevice> {
        &self.device
    }

    /// Native name for use in the current context.
    ///
    /// # Panics
    /// If the object's context has been recreated since it was created.
    pub fn name(&self) -> GLuint {
        let current = self.device.context_id();
        assert!(
            self.context == current,
            "{:?} {} belongs to context {:?}, current is {:?}",
            self.kind,
            self.name,
            self.context,
            current
        );
        self.name
    }

    /// Whether the creating context is still current.
    pub fn is_live(&self) -> bool {
        self.context == self.device.context_id()
    }

    /// Delete the native object now.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for ContainerObject {
    fn drop(&mut self) {
        if !self.is_live() {
            tracing::debug!(
                "{:?} {} outlived its context, skipping delete",
                self.kind,
                self.name
            );
            return;
        }

        let core = self.device.core();
        let gl3 = self.device.gl3();
        let names = &self.name;
        // SAFETY: the name was created by this device's context, which is
        // still current, and is deleted exactly once.
        unsafe {
            match self.kind {
                ObjectKind::Buffer => (core.delete_buffers)(1, names),
                ObjectKind::Texture => (core.delete_textures)(1, names),
                ObjectKind::VertexArray => (gl3.delete_vertex_arrays)(1, names),
                ObjectKind::Framebuffer => (gl3.delete_framebuffers)(1, names),
                ObjectKind::Program => (core.delete_program)(self.name),
                ObjectKind::Sampler => (gl3.delete_samplers)(1, names),
            }
        }
    }
}

impl std::fmt::Debug for ContainerObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerObject")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("context", &self.context)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};

    fn gen_buffer(device: &Arc<GlDevice>) -> ContainerObject {
        let mut name = 0;
        unsafe { (device.core().gen_buffers)(1, &mut name) };
        ContainerObject::new(device, ObjectKind::Buffer, name)
    }

    #[test]
    fn test_every_object_deleted_once() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let objects: Vec<_> = (0..8).map(|_| gen_buffer(&device)).collect();
        assert_eq!(with_driver(|d| d.live_count("buffer")), 8);

        drop(objects);
        assert_eq!(with_driver(|d| d.live_count("buffer")), 0);
        assert_eq!(with_driver(|d| d.call_count("glDeleteBuffers")), 8);
        assert!(with_driver(|d| d.double_deletes.is_empty()));
    }

    #[test]
    fn test_destroy_deletes_immediately() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let object = gen_buffer(&device);
        object.destroy();
        assert_eq!(with_driver(|d| d.call_count("glDeleteBuffers")), 1);
    }

    #[test]
    fn test_recreated_context_skips_delete() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let object = gen_buffer(&device);
        device.bump_context();
        assert!(!object.is_live());
        drop(object);
        assert_eq!(with_driver(|d| d.call_count("glDeleteBuffers")), 0);
    }

    #[test]
    #[should_panic(expected = "belongs to context")]
    fn test_use_after_context_recreation_panics() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let object = gen_buffer(&device);
        device.bump_context();
        let _ = object.name();
    }

    #[test]
    fn test_objects_keep_device_alive() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        let object = gen_buffer(&device);
        let weak = Arc::downgrade(&device);
        drop(device);
        assert!(weak.upgrade().is_some());
        drop(object);
        assert!(weak.upgrade().is_none());
    }
}
