// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! OpenGL / OpenGL ES 3 implementation of the RHI.
//!
//! Construction runs the whole bring-up against the context current on the
//! calling thread. Afterwards every call goes through the [`StateCache`], so
//! redundant binds never reach the driver.

use std::ffi::c_void;
use std::sync::Arc;

use foundry_rhi::{
    ClearFlags, ClipOrigin, DrawArguments, DrawIndexedArguments, IndexBufferFormat, MapType,
    PipelineStateDescriptor, Result, RhiBackend, RhiConfig, RhiError, SamplerStateDescriptor,
    TextureDescriptor, VertexAttributes,
};

use crate::capabilities::Capabilities;
use crate::debug;
use crate::entry_points::{CoreFunctions, Gl3Functions};
use crate::extensions::{ExtensionProbe, ExtensionRegistry};
use crate::loader::{default_platform_loader, PlatformLoader, RuntimeLinking};
use crate::mapping::{self, MappingProfile};
use crate::native::{driver_string, ext, GLenum, GLfloat, GLint, GLsizei, GlVersion};
use crate::resources::{
    Framebuffer, GlDevice, GpuBuffer, IndexBuffer, IndirectBuffer, MappedBuffer, ObjectKind,
    PipelineState, Program, ResourceBinding, ResourceGroup, SamplerState, Texture2D,
    UniformBuffer, VertexArray, VertexBuffer,
};
use crate::state_cache::StateCache;

const DESKTOP_FLOOR: (u32, u32) = (3, 3);
const ES_FLOOR: (u32, u32) = (3, 0);

/// Driver identification strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
}

/// Clear values for [`OpenGlRhi::clear`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValues {
    pub color: [f32; 4],
    pub depth: f32,
    pub stencil: i32,
}

impl Default for ClearValues {
    fn default() -> Self {
        Self {
            color: [0.0, 0.0, 0.0, 1.0],
            // Reversed-Z: the default depth test is GREATER.
            depth: 0.0,
            stencil: 0,
        }
    }
}

/// The OpenGL RHI.
pub struct OpenGlRhi {
    // Dropped first: cached bindings release their resources before the
    // device and the library go away.
    cache: StateCache,
    device: Arc<GlDevice>,
    extensions: ExtensionRegistry,
    config: RhiConfig,
    backend: RhiBackend,
    driver: DriverInfo,
    linking: RuntimeLinking,
}

impl OpenGlRhi {
    /// Bring up the RHI on the current context with the platform's native
    /// library loader.
    pub fn with_default_loader(config: RhiConfig) -> Result<Self> {
        let backend = config.resolved_backend();
        if !backend.is_available() {
            return Err(RhiError::BackendUnavailable(format!(
                "{} is not available on this platform",
                backend.as_str()
            )));
        }
        let loader = default_platform_loader(backend, &config);
        Self::new(config, loader)
    }

    /// Bring up the RHI through `loader`.
    ///
    /// Every fatal failure is reported as [`RhiError::BackendUnavailable`]
    /// naming the cause; no partially initialized instance is produced.
    pub fn new(config: RhiConfig, loader: Box<dyn PlatformLoader>) -> Result<Self> {
        Self::initialize(config, loader).map_err(|e| match e {
            RhiError::BackendUnavailable(_) => e,
            e if e.is_fatal_at_init() => {
                tracing::error!("OpenGL RHI initialization failed: {}", e);
                RhiError::BackendUnavailable(e.to_string())
            }
            e => e,
        })
    }

    fn initialize(config: RhiConfig, loader: Box<dyn PlatformLoader>) -> Result<Self> {
        let backend = config.resolved_backend();
        let mut linking = RuntimeLinking::new(loader);
        linking.load_shared_library()?;
        let core = *linking.resolve_core_entry_points()?;

        let driver = query_driver_info(&core);
        let version = GlVersion::parse(&driver.version).ok_or_else(|| {
            RhiError::UnsupportedVersion {
                required: floor_description(backend, None),
                found: format!("unparseable GL_VERSION {:?}", driver.version),
            }
        })?;
        check_version(backend, version, config.minimum_version)?;
        tracing::info!(
            "{} on {} ({}), driver {:?}",
            version,
            driver.renderer,
            driver.vendor,
            driver.version
        );

        let gated = *linking.resolve_version_gated_entry_points(version)?;

        let mut extensions = ExtensionRegistry::new();
        {
            let probe = ExtensionProbe::new(&linking, version)?;
            extensions.initialize(&probe, config.use_extensions);
        }

        let mut capabilities = Capabilities::resolve(&gated, &extensions);
        capabilities.max_anisotropy = query_max_anisotropy(&core, &extensions);
        capabilities.emulate_draw_id =
            capabilities.base_instance.is_none() && config.emulate_draw_id;
        log_downgrades(&capabilities, &config);

        let profile = MappingProfile::from_capabilities(backend, version, &extensions);
        tracing::debug!("Mapping profile: {:?}", profile);

        let library = linking.library().ok_or(RhiError::NotLoaded)?;
        let device = Arc::new(GlDevice::new(
            core,
            gated.gl3,
            capabilities,
            profile,
            version,
            library,
        ));

        if config.debug_output {
            debug::install(&device);
        }

        Ok(Self {
            cache: StateCache::new(),
            device,
            extensions,
            config,
            backend,
            driver,
            linking,
        })
    }

    // ---------------------------------------------------------------------
    // Introspection
    // ---------------------------------------------------------------------

    pub fn device(&self) -> &Arc<GlDevice> {
        &self.device
    }

    pub fn backend(&self) -> RhiBackend {
        self.backend
    }

    pub fn config(&self) -> &RhiConfig {
        &self.config
    }

    pub fn version(&self) -> GlVersion {
        self.device.version()
    }

    pub fn driver_info(&self) -> &DriverInfo {
        &self.driver
    }

    pub fn capabilities(&self) -> &Capabilities {
        self.device.capabilities()
    }

    pub fn mapping_profile(&self) -> &MappingProfile {
        self.device.profile()
    }

    pub fn extensions(&self) -> &ExtensionRegistry {
        &self.extensions
    }

    /// Ask the driver for `name` now instead of reading the registry.
    pub fn check_extension(&self, name: &str) -> Result<bool> {
        let probe = ExtensionProbe::new(&self.linking, self.version())?;
        Ok(self.extensions.check_extension(&probe, name))
    }

    pub fn state(&self) -> &StateCache {
        &self.cache
    }

    fn core(&self) -> &CoreFunctions {
        self.device.core()
    }

    fn gl3(&self) -> &Gl3Functions {
        self.device.gl3()
    }

    // ---------------------------------------------------------------------
    // Resource creation
    // ---------------------------------------------------------------------

    /// Run a creation that may have used bind-to-edit, then restore the
    /// binding it replaced.
    fn create_with<T>(
        &mut self,
        kind: ObjectKind,
        create: impl FnOnce(&Arc<GlDevice>) -> Result<T>,
    ) -> Result<Arc<T>> {
        let result = create(&self.device);
        if !self.device.capabilities().has_direct_state_access() {
            self.cache.restore_after_edit(&self.device, kind);
        }
        result.map(Arc::new)
    }

    pub fn create_vertex_buffer(
        &mut self,
        data: &[u8],
        usage: foundry_rhi::BufferUsage,
    ) -> Result<Arc<VertexBuffer>> {
        self.create_with(ObjectKind::Buffer, |d| VertexBuffer::create(d, data, usage))
    }

    pub fn create_index_buffer(
        &mut self,
        data: &[u8],
        format: IndexBufferFormat,
        usage: foundry_rhi::BufferUsage,
    ) -> Result<Arc<IndexBuffer>> {
        self.create_with(ObjectKind::Buffer, |d| {
            IndexBuffer::create(d, data, format, usage)
        })
    }

    pub fn create_uniform_buffer(
        &mut self,
        data: &[u8],
        usage: foundry_rhi::BufferUsage,
    ) -> Result<Arc<UniformBuffer>> {
        self.create_with(ObjectKind::Buffer, |d| UniformBuffer::create(d, data, usage))
    }

    pub fn create_indirect_buffer(
        &mut self,
        data: &[u8],
        usage: foundry_rhi::BufferUsage,
    ) -> Result<Arc<IndirectBuffer>> {
        self.create_with(ObjectKind::Buffer, |d| IndirectBuffer::create(d, data, usage))
    }

    pub fn create_texture_2d(
        &mut self,
        desc: &TextureDescriptor<'_>,
        data: Option<&[u8]>,
    ) -> Result<Arc<Texture2D>> {
        self.create_with(ObjectKind::Texture, |d| Texture2D::create(d, desc, data))
    }

    pub fn create_sampler_state(
        &mut self,
        descriptor: &SamplerStateDescriptor,
    ) -> Result<Arc<SamplerState>> {
        self.create_with(ObjectKind::Sampler, |d| SamplerState::create(d, descriptor))
    }

    /// Compile and link a program. On the draw-ID emulation path the
    /// configured uniform is looked up as well.
    pub fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Arc<Program>> {
        let uniform = self
            .device
            .capabilities()
            .emulate_draw_id
            .then_some(self.config.draw_id_uniform.as_str());
        Program::create(&self.device, vertex_source, fragment_source, uniform).map(Arc::new)
    }

    pub fn create_vertex_array(
        &mut self,
        attributes: &VertexAttributes,
        vertex_buffers: &[Arc<VertexBuffer>],
        index_buffer: Option<Arc<IndexBuffer>>,
    ) -> Result<Arc<VertexArray>> {
        self.create_with(ObjectKind::VertexArray, |d| {
            VertexArray::create(d, attributes, vertex_buffers, index_buffer)
        })
    }

    pub fn create_framebuffer(
        &mut self,
        color: &[Arc<Texture2D>],
        depth: Option<Arc<Texture2D>>,
    ) -> Result<Arc<Framebuffer>> {
        self.create_with(ObjectKind::Framebuffer, |d| Framebuffer::create(d, color, depth))
    }

    pub fn create_pipeline_state(
        &self,
        program: Arc<Program>,
        descriptor: &PipelineStateDescriptor,
    ) -> Arc<PipelineState> {
        Arc::new(PipelineState::create(&self.device, program, descriptor))
    }

    pub fn create_resource_group(&self, bindings: Vec<ResourceBinding>) -> Arc<ResourceGroup> {
        Arc::new(ResourceGroup::new(bindings))
    }

    /// Map a buffer for CPU access; see [`GpuBuffer::map`].
    pub fn map_buffer<'a>(
        &self,
        buffer: &'a dyn GpuBuffer,
        map_type: MapType,
    ) -> Result<MappedBuffer<'a>> {
        buffer.map(map_type)
    }

    pub fn unmap_buffer(&self, mapped: MappedBuffer<'_>) {
        mapped.unmap();
    }

    // ---------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------

    pub fn set_graphics_pipeline_state(&mut self, pipeline: &Arc<PipelineState>) {
        self.cache.set_pipeline(&self.device, pipeline);
    }

    pub fn set_vertex_array(&mut self, vertex_array: &Arc<VertexArray>) {
        self.cache.set_vertex_array(&self.device, vertex_array);
    }

    /// `None` renders to the default framebuffer.
    pub fn set_render_target(&mut self, target: Option<&Arc<Framebuffer>>) {
        self.cache.set_render_target(&self.device, target);
    }

    pub fn set_graphics_resource_group(&mut self, group: &Arc<ResourceGroup>) {
        self.cache.set_resource_group(&self.device, group);
    }

    pub fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        // SAFETY: plain integer arguments.
        unsafe { (self.core().viewport)(x, y, width as GLsizei, height as GLsizei) };
    }

    /// Restrict rendering to a rectangle. Enables the scissor test on first use.
    pub fn set_scissor_rectangle(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.cache.set_scissor_enabled(&self.device, true);
        // SAFETY: plain integer arguments.
        unsafe { (self.core().scissor)(x, y, width as GLsizei, height as GLsizei) };
    }

    pub fn disable_scissor(&mut self) {
        self.cache.set_scissor_enabled(&self.device, false);
    }

    pub fn set_clip_origin(&mut self, origin: ClipOrigin) -> Result<()> {
        self.cache.set_clip_origin(&self.device, origin).map(|_| ())
    }

    /// Set the swap interval of the current drawable (`WGL_EXT_swap_control`).
    pub fn set_swap_interval(&self, interval: i32) -> Result<()> {
        let swap_control = self.capabilities().swap_control.ok_or_else(|| {
            RhiError::NotSupported("swap interval without WGL_EXT_swap_control".to_string())
        })?;
        // SAFETY: plain integer argument.
        let ok = unsafe { (swap_control.swap_interval)(interval as GLint) };
        if ok == 0 {
            return Err(RhiError::NotSupported(format!(
                "driver rejected swap interval {}",
                interval
            )));
        }
        Ok(())
    }

    /// Clear the planes in `flags` of the current render target.
    pub fn clear(&mut self, flags: ClearFlags, values: &ClearValues) {
        let core = self.core();
        let gl3 = self.gl3();
        let depth_write_disabled = self
            .cache
            .pipeline()
            .is_some_and(|p| !p.descriptor().depth_stencil.depth_write);

        // SAFETY: the value pointers outlive the calls.
        unsafe {
            if flags.contains(ClearFlags::COLOR) {
                let [r, g, b, a] = values.color;
                (core.clear_color)(r, g, b, a);
                (core.clear)(gl::COLOR_BUFFER_BIT);
            }
            if flags.contains(ClearFlags::DEPTH) {
                // Depth writes gate depth clears.
                if depth_write_disabled {
                    (core.depth_mask)(gl::TRUE);
                }
                let depth: GLfloat = values.depth;
                (gl3.clear_bufferfv)(gl::DEPTH, 0, &depth);
                if depth_write_disabled {
                    (core.depth_mask)(gl::FALSE);
                }
            }
            if flags.contains(ClearFlags::STENCIL) {
                let stencil: GLint = values.stencil;
                (gl3.clear_bufferiv)(gl::STENCIL, 0, &stencil);
            }
        }
    }

    /// Recreate-context hook: every existing object belongs to the lost
    /// context and the state mirror starts over.
    pub fn context_recreated(&mut self) {
        let context = self.device.bump_context();
        self.cache.reset();
        tracing::info!(
            "Graphics context recreated ({:?}), existing objects are no longer usable",
            context
        );
    }

    // ---------------------------------------------------------------------
    // Draws
    // ---------------------------------------------------------------------

    fn topology(&self) -> GLenum {
        let pipeline = self.cache.pipeline();
        assert!(pipeline.is_some(), "draw issued without a graphics pipeline state");
        pipeline.map_or(gl::TRIANGLES, |p| p.topology())
    }

    fn index_type(&self) -> (GLenum, usize) {
        let format = self
            .cache
            .vertex_array()
            .and_then(|vao| vao.index_buffer())
            .map(|indices| indices.format());
        assert!(
            format.is_some(),
            "indexed draw issued without a vertex array holding an index buffer"
        );
        let format = format.unwrap_or(IndexBufferFormat::UnsignedInt);
        (mapping::index_type(format), format.bytes_per_element() as usize)
    }

    /// Route the start instance to the draw-ID uniform when it cannot be
    /// passed natively.
    fn emulate_start_instance(&mut self, start_instance: u32) {
        if self.device.capabilities().emulate_draw_id {
            self.cache.set_start_instance(&self.device, start_instance);
        } else if start_instance != 0 {
            tracing::trace!(
                "Start instance {} dropped without base instance support",
                start_instance
            );
        }
    }

    pub fn draw(&mut self, args: &DrawArguments) {
        let mode = self.topology();
        let base_instance = self.device.capabilities().base_instance;
        if base_instance.is_none() {
            self.emulate_start_instance(args.start_instance_location);
        }

        // SAFETY: counts are plain values; buffers are bound through the cache.
        unsafe {
            match base_instance {
                Some(functions) => (functions.draw_arrays_instanced_base_instance)(
                    mode,
                    args.start_vertex_location as GLint,
                    args.vertex_count_per_instance as GLsizei,
                    args.instance_count as GLsizei,
                    args.start_instance_location,
                ),
                None => (self.gl3().draw_arrays_instanced)(
                    mode,
                    args.start_vertex_location as GLint,
                    args.vertex_count_per_instance as GLsizei,
                    args.instance_count as GLsizei,
                ),
            }
        }
    }

    /// # Panics
    /// Without a vertex array holding an index buffer.
    pub fn draw_indexed(&mut self, args: &DrawIndexedArguments) -> Result<()> {
        let mode = self.topology();
        let (index_type, index_size) = self.index_type();
        let capabilities = *self.device.capabilities();
        let offset = (args.start_index_location as usize * index_size) as *const c_void;
        let count = args.index_count_per_instance as GLsizei;
        let instances = args.instance_count as GLsizei;
        let base_vertex = args.base_vertex_location as GLint;

        if base_vertex != 0
            && capabilities.base_instance.is_none()
            && capabilities.draw_base_vertex.is_none()
        {
            return Err(RhiError::NotSupported(format!(
                "base vertex {} without draw_elements_base_vertex",
                base_vertex
            )));
        }
        if capabilities.base_instance.is_none() {
            self.emulate_start_instance(args.start_instance_location);
        }

        // SAFETY: the index buffer is recorded in the bound vertex array and
        // `offset` is a byte offset into it.
        unsafe {
            if let Some(functions) = capabilities.base_instance {
                (functions.draw_elements_instanced_base_vertex_base_instance)(
                    mode,
                    count,
                    index_type,
                    offset,
                    instances,
                    base_vertex,
                    args.start_instance_location,
                );
            } else if let (Some(functions), true) =
                (capabilities.draw_base_vertex, base_vertex != 0)
            {
                (functions.draw_elements_instanced_base_vertex)(
                    mode,
                    count,
                    index_type,
                    offset,
                    instances,
                    base_vertex,
                );
            } else {
                (self.gl3().draw_elements_instanced)(mode, count, index_type, offset, instances);
            }
        }
        Ok(())
    }

    /// Draw `count` records of `buffer` starting at byte `offset`.
    pub fn draw_indirect(
        &mut self,
        buffer: &Arc<IndirectBuffer>,
        offset: usize,
        count: u32,
    ) -> Result<()> {
        let mode = self.topology();
        if buffer.is_emulated() {
            for args in buffer.draw_arguments(offset, count as usize) {
                self.draw(&args);
            }
            return Ok(());
        }

        let capabilities = *self.device.capabilities();
        if capabilities.base_instance.is_none() {
            // Records must carry a zero base instance without base instance support.
            self.emulate_start_instance(0);
        }
        self.cache.set_indirect_buffer(&self.device, buffer);
        let stride = std::mem::size_of::<DrawArguments>();
        // SAFETY: the records live in the bound GL_DRAW_INDIRECT_BUFFER.
        unsafe {
            if let Some(functions) = capabilities.multi_draw_indirect {
                (functions.multi_draw_arrays_indirect)(
                    mode,
                    offset as *const c_void,
                    count as GLsizei,
                    0,
                );
            } else if let Some(functions) = capabilities.draw_indirect {
                for record in 0..count as usize {
                    (functions.draw_arrays_indirect)(
                        mode,
                        (offset + record * stride) as *const c_void,
                    );
                }
            } else {
                return Err(RhiError::NotSupported("indirect draws".to_string()));
            }
        }
        Ok(())
    }

    /// Indexed variant of [`OpenGlRhi::draw_indirect`].
    pub fn draw_indexed_indirect(
        &mut self,
        buffer: &Arc<IndirectBuffer>,
        offset: usize,
        count: u32,
    ) -> Result<()> {
        let mode = self.topology();
        let (index_type, _) = self.index_type();
        if buffer.is_emulated() {
            for args in buffer.draw_indexed_arguments(offset, count as usize) {
                self.draw_indexed(&args)?;
            }
            return Ok(());
        }

        let capabilities = *self.device.capabilities();
        if capabilities.base_instance.is_none() {
            // Records must carry a zero base instance without base instance support.
            self.emulate_start_instance(0);
        }
        self.cache.set_indirect_buffer(&self.device, buffer);
        let stride = std::mem::size_of::<DrawIndexedArguments>();
        // SAFETY: the records live in the bound GL_DRAW_INDIRECT_BUFFER.
        unsafe {
            if let Some(functions) = capabilities.multi_draw_indirect {
                (functions.multi_draw_elements_indirect)(
                    mode,
                    index_type,
                    offset as *const c_void,
                    count as GLsizei,
                    0,
                );
            } else if let Some(functions) = capabilities.draw_indirect {
                for record in 0..count as usize {
                    (functions.draw_elements_indirect)(
                        mode,
                        index_type,
                        (offset + record * stride) as *const c_void,
                    );
                }
            } else {
                return Err(RhiError::NotSupported("indirect draws".to_string()));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for OpenGlRhi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenGlRhi")
            .field("backend", &self.backend)
            .field("version", &self.version())
            .field("renderer", &self.driver.renderer)
            .field("library", &self.linking.library_path())
            .finish()
    }
}

fn query_driver_info(core: &CoreFunctions) -> DriverInfo {
    // SAFETY: glGetString returns driver-owned static strings or null.
    let read = |name| unsafe { driver_string((core.get_string)(name)) }.unwrap_or_default();
    DriverInfo {
        vendor: read(gl::VENDOR),
        renderer: read(gl::RENDERER),
        version: read(gl::VERSION),
    }
}

fn floor_description(backend: RhiBackend, minimum: Option<(u32, u32)>) -> String {
    let (major, minor) = version_floor(backend, minimum);
    match backend {
        RhiBackend::OpenGl => format!("OpenGL {}.{}", major, minor),
        RhiBackend::OpenGlEs3 => format!("OpenGL ES {}.{}", major, minor),
    }
}

/// Backend floor, raised (never lowered) by the configured minimum.
fn version_floor(backend: RhiBackend, minimum: Option<(u32, u32)>) -> (u32, u32) {
    let floor = match backend {
        RhiBackend::OpenGl => DESKTOP_FLOOR,
        RhiBackend::OpenGlEs3 => ES_FLOOR,
    };
    minimum.map_or(floor, |minimum| floor.max(minimum))
}

fn check_version(
    backend: RhiBackend,
    version: GlVersion,
    minimum: Option<(u32, u32)>,
) -> Result<()> {
    let (major, minor) = version_floor(backend, minimum);
    if version.es != backend.is_embedded() || !version.at_least(major, minor) {
        return Err(RhiError::UnsupportedVersion {
            required: floor_description(backend, minimum),
            found: version.to_string(),
        });
    }
    Ok(())
}

fn query_max_anisotropy(core: &CoreFunctions, extensions: &ExtensionRegistry) -> Option<f32> {
    if !extensions.is_gl_ext_texture_filter_anisotropic() {
        return None;
    }
    let mut max: GLint = 0;
    // SAFETY: single-value query.
    unsafe { (core.get_integerv)(ext::MAX_TEXTURE_MAX_ANISOTROPY_EXT, &mut max) };
    (max >= 1).then_some(max as f32)
}

fn log_downgrades(capabilities: &Capabilities, config: &RhiConfig) {
    if capabilities.base_instance.is_none() {
        if capabilities.emulate_draw_id {
            tracing::info!(
                "No base instance support, emulating draw IDs through uniform '{}'",
                config.draw_id_uniform
            );
        } else {
            tracing::warn!("No base instance support and draw ID emulation is disabled");
        }
    }
    if !capabilities.native_indirect() {
        tracing::warn!("No native indirect draws, replaying draw records on the CPU");
    }
    if !capabilities.has_direct_state_access() {
        tracing::debug!("No direct state access, resources are edited through bindings");
    }
    if capabilities.clip_control.is_none() {
        tracing::debug!("No clip control, only the lower-left clip origin is available");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_rhi, install, with_driver, FakeDriverState, FakeLoader};
    use foundry_rhi::{BufferUsage, IndexBufferFormat, VertexAttribute, VertexAttributeFormat};

    const VS: &str = "#version 300 es\nvoid main() {}";
    const FS: &str = "#version 300 es\nvoid main() {}";

    fn config(backend: RhiBackend) -> RhiConfig {
        RhiConfig {
            backend: Some(backend),
            ..RhiConfig::default()
        }
    }

    fn make_pipeline(rhi: &mut OpenGlRhi) -> Arc<PipelineState> {
        let program = rhi.create_program(VS, FS).unwrap();
        rhi.create_pipeline_state(program, &PipelineStateDescriptor::default())
    }

    fn indexed_vao(rhi: &mut OpenGlRhi, format: IndexBufferFormat) -> Arc<VertexArray> {
        let vertices = rhi.create_vertex_buffer(&[0u8; 48], BufferUsage::StaticDraw).unwrap();
        let indices = rhi
            .create_index_buffer(&[0u8; 12], format, BufferUsage::StaticDraw)
            .unwrap();
        let layout = VertexAttributes::new(vec![VertexAttribute::per_vertex(
            "position",
            VertexAttributeFormat::Float3,
            0,
            0,
            12,
        )]);
        rhi.create_vertex_array(&layout, &[vertices], Some(indices)).unwrap()
    }

    fn indirect_bytes(records: &[DrawArguments]) -> Vec<u8> {
        records
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
            .collect()
    }

    #[test]
    fn test_missing_library_is_backend_unavailable() {
        install(FakeDriverState::desktop(4, 6));
        let loader = FakeLoader::with_names(&["/nonexistent/libGL.so.1"]);
        let err = OpenGlRhi::new(config(RhiBackend::OpenGl), Box::new(loader)).unwrap_err();
        match err {
            RhiError::BackendUnavailable(reason) => assert!(reason.contains("/nonexistent/libGL.so.1")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(with_driver(|d| d.symbol_lookups), 0);
    }

    #[test]
    fn test_version_below_floor_is_backend_unavailable() {
        install(FakeDriverState::desktop(3, 2));
        let result = OpenGlRhi::new(config(RhiBackend::OpenGl), Box::new(FakeLoader::default()));
        assert!(matches!(result, Err(RhiError::BackendUnavailable(ref r)) if r.contains("3.3")));
    }

    #[test]
    fn test_configured_minimum_raises_floor() {
        install(FakeDriverState::es(3, 0));
        let raised = RhiConfig {
            minimum_version: Some((3, 1)),
            ..config(RhiBackend::OpenGlEs3)
        };
        assert!(OpenGlRhi::new(raised, Box::new(FakeLoader::default())).is_err());

        install(FakeDriverState::es(3, 0));
        let lowered = RhiConfig {
            minimum_version: Some((2, 0)),
            ..config(RhiBackend::OpenGlEs3)
        };
        assert!(OpenGlRhi::new(lowered, Box::new(FakeLoader::default())).is_ok());
    }

    #[test]
    fn test_dialect_mismatch_is_rejected() {
        install(FakeDriverState::es(3, 2));
        let result = OpenGlRhi::new(config(RhiBackend::OpenGl), Box::new(FakeLoader::default()));
        assert!(matches!(result, Err(RhiError::BackendUnavailable(_))));
    }

    #[test]
    fn test_core_profile_only_mode() {
        let mut state = FakeDriverState::desktop(4, 1);
        state.extensions = vec![
            "GL_ARB_direct_state_access".into(),
            "GL_ARB_base_instance".into(),
            "GL_EXT_texture_filter_anisotropic".into(),
        ];
        let config = RhiConfig {
            use_extensions: false,
            ..config(RhiBackend::OpenGl)
        };
        let rhi = fake_rhi(config, state);

        assert!(rhi.extensions().supported_extensions().is_empty());
        assert!(!rhi.extensions().is_gl_arb_direct_state_access());
        assert!(!rhi.capabilities().has_direct_state_access());
        assert!(rhi.capabilities().base_instance.is_none());
        assert!(rhi.capabilities().max_anisotropy.is_none());
        assert!(rhi.capabilities().emulate_draw_id);
    }

    #[test]
    fn test_extensions_fill_capability_gaps() {
        let mut state = FakeDriverState::desktop(4, 1);
        state.extensions = vec![
            "GL_ARB_direct_state_access".into(),
            "GL_ARB_base_instance".into(),
            "GL_EXT_texture_filter_anisotropic".into(),
        ];
        let rhi = fake_rhi(config(RhiBackend::OpenGl), state);

        assert!(rhi.capabilities().has_direct_state_access());
        assert!(rhi.capabilities().base_instance.is_some());
        assert!(!rhi.capabilities().emulate_draw_id);
        assert_eq!(rhi.capabilities().max_anisotropy, Some(16.0));
        assert_eq!(rhi.driver_info().vendor, "Foundry Fake Driver");
    }

    #[test]
    fn test_initialization_is_repeatable() {
        let state = FakeDriverState::es(3, 2);
        let first = fake_rhi(config(RhiBackend::OpenGlEs3), state.clone());
        let second = fake_rhi(config(RhiBackend::OpenGlEs3), state);
        assert_eq!(
            first.extensions().supported_extensions(),
            second.extensions().supported_extensions()
        );
        assert_eq!(first.mapping_profile(), second.mapping_profile());
        assert_eq!(first.version(), GlVersion::es(3, 2));
    }

    #[test]
    fn test_debug_output_installed_on_request() {
        let config = RhiConfig {
            debug_output: true,
            ..config(RhiBackend::OpenGl)
        };
        let _rhi = fake_rhi(config, FakeDriverState::desktop(4, 6));
        assert!(with_driver(|d| d.debug_callback.is_some()));
    }

    #[test]
    fn test_same_vertex_array_binds_once() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        let vao = indexed_vao(&mut rhi, IndexBufferFormat::UnsignedShort);
        rhi.set_vertex_array(&vao);
        rhi.set_vertex_array(&vao);
        assert_eq!(with_driver(|d| d.call_count("glBindVertexArray")), 1);
    }

    #[test]
    fn test_bind_to_edit_creation_restores_vertex_array() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGlEs3), FakeDriverState::es(3, 0));
        let first = indexed_vao(&mut rhi, IndexBufferFormat::UnsignedShort);
        rhi.set_vertex_array(&first);
        let _second = indexed_vao(&mut rhi, IndexBufferFormat::UnsignedShort);
        assert_eq!(
            with_driver(|d| d.binding(gl::VERTEX_ARRAY_BINDING)),
            first.object().name()
        );
    }

    #[test]
    fn test_index_format_reaches_draw_call() {
        for (format, native) in [
            (IndexBufferFormat::UnsignedChar, gl::UNSIGNED_BYTE),
            (IndexBufferFormat::UnsignedShort, gl::UNSIGNED_SHORT),
        ] {
            let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
            let pipeline = make_pipeline(&mut rhi);
            let vao = indexed_vao(&mut rhi, format);
            rhi.set_graphics_pipeline_state(&pipeline);
            rhi.set_vertex_array(&vao);
            rhi.draw_indexed(&DrawIndexedArguments {
                start_index_location: 2,
                ..DrawIndexedArguments::new(6)
            })
            .unwrap();

            let draw = with_driver(|d| d.draws.last().cloned()).unwrap();
            assert_eq!(draw.index_type, Some(native));
            assert_eq!(draw.offset, 2 * format.bytes_per_element() as usize);
            assert_eq!(draw.count, 6);
        }
    }

    #[test]
    #[should_panic(expected = "index buffer")]
    fn test_indexed_draw_without_index_buffer_panics() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        let pipeline = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&pipeline);
        let _ = rhi.draw_indexed(&DrawIndexedArguments::new(3));
    }

    #[test]
    fn test_draw_id_uploaded_only_on_change() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGlEs3), {
            let mut state = FakeDriverState::es(3, 0);
            state.uniforms = vec!["drawIdUniform".into()];
            state
        });
        assert!(rhi.capabilities().emulate_draw_id);
        let pipeline = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&pipeline);

        for start in [0, 0, 4, 4, 4, 7] {
            rhi.draw(&DrawArguments {
                start_instance_location: start,
                ..DrawArguments::new(3)
            });
        }
        with_driver(|d| {
            let values: Vec<u32> = d.uniform_uploads.iter().map(|(_, v)| *v).collect();
            assert_eq!(values, vec![0, 4, 7]);
            assert_eq!(d.call_count("glDrawArraysInstanced"), 6);
        });

        // A program switch forgets the uploaded value.
        let other = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&other);
        rhi.draw(&DrawArguments {
            start_instance_location: 7,
            ..DrawArguments::new(3)
        });
        assert_eq!(with_driver(|d| d.uniform_uploads.len()), 4);
    }

    #[test]
    fn test_native_base_instance_skips_uniform() {
        let mut state = FakeDriverState::desktop(4, 6);
        state.uniforms = vec!["drawIdUniform".into()];
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), state);
        let pipeline = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&pipeline);
        rhi.draw(&DrawArguments {
            start_instance_location: 5,
            ..DrawArguments::new(3)
        });
        with_driver(|d| {
            assert!(d.uniform_uploads.is_empty());
            assert_eq!(d.draws.last().map(|draw| draw.base_instance), Some(5));
        });
    }

    #[test]
    fn test_base_vertex_needs_support() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGlEs3), FakeDriverState::es(3, 0));
        let pipeline = make_pipeline(&mut rhi);
        let vao = indexed_vao(&mut rhi, IndexBufferFormat::UnsignedShort);
        rhi.set_graphics_pipeline_state(&pipeline);
        rhi.set_vertex_array(&vao);
        let result = rhi.draw_indexed(&DrawIndexedArguments {
            base_vertex_location: 4,
            ..DrawIndexedArguments::new(3)
        });
        assert!(matches!(result, Err(RhiError::NotSupported(_))));
        assert!(rhi.draw_indexed(&DrawIndexedArguments::new(3)).is_ok());
    }

    #[test]
    fn test_indirect_uses_multi_draw_when_available() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        let pipeline = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&pipeline);
        let records = [DrawArguments::new(3), DrawArguments::new(6)];
        let buffer = rhi
            .create_indirect_buffer(&indirect_bytes(&records), BufferUsage::StaticDraw)
            .unwrap();

        rhi.draw_indirect(&buffer, 0, 2).unwrap();
        rhi.draw_indirect(&buffer, 0, 2).unwrap();
        with_driver(|d| {
            assert_eq!(d.call_count("glMultiDrawArraysIndirect"), 2);
            assert_eq!(d.call_count("glBindBuffer"), 1);
            assert_eq!(d.binding(gl::DRAW_INDIRECT_BUFFER), buffer.native().map_or(0, |o| o.name()));
        });
    }

    #[test]
    fn test_indirect_per_record_without_multi_draw() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGlEs3), FakeDriverState::es(3, 1));
        let pipeline = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&pipeline);
        let records = [DrawArguments::new(3), DrawArguments::new(6), DrawArguments::new(9)];
        let buffer = rhi
            .create_indirect_buffer(&indirect_bytes(&records), BufferUsage::StaticDraw)
            .unwrap();

        rhi.draw_indirect(&buffer, 16, 2).unwrap();
        with_driver(|d| {
            let offsets: Vec<usize> = d.draws.iter().map(|draw| draw.offset).collect();
            assert_eq!(offsets, vec![16, 32]);
            assert_eq!(d.call_count("glDrawArraysIndirect"), 2);
        });
    }

    #[test]
    fn test_native_indirect_resets_emulated_draw_id() {
        let mut state = FakeDriverState::es(3, 1);
        state.uniforms = vec!["drawIdUniform".into()];
        let mut rhi = fake_rhi(config(RhiBackend::OpenGlEs3), state);
        assert!(rhi.capabilities().emulate_draw_id);
        let pipeline = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&pipeline);
        let records = indirect_bytes(&[DrawArguments::new(3)]);
        let buffer = rhi
            .create_indirect_buffer(&records, BufferUsage::StaticDraw)
            .unwrap();
        assert!(!buffer.is_emulated());

        rhi.draw(&DrawArguments {
            start_instance_location: 5,
            ..DrawArguments::new(3)
        });
        rhi.draw_indirect(&buffer, 0, 1).unwrap();
        rhi.draw_indirect(&buffer, 0, 1).unwrap();
        with_driver(|d| {
            let values: Vec<u32> = d.uniform_uploads.iter().map(|(_, v)| *v).collect();
            assert_eq!(values, vec![5, 0]);
            assert_eq!(d.call_count("glDrawArraysIndirect"), 2);
        });
    }

    #[test]
    fn test_indirect_replayed_on_cpu_without_native_support() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGlEs3), FakeDriverState::es(3, 0));
        let pipeline = make_pipeline(&mut rhi);
        rhi.set_graphics_pipeline_state(&pipeline);
        let records = [
            DrawArguments::new(3),
            DrawArguments {
                vertex_count_per_instance: 6,
                instance_count: 2,
                start_vertex_location: 3,
                start_instance_location: 0,
            },
        ];
        let buffer = rhi
            .create_indirect_buffer(&indirect_bytes(&records), BufferUsage::StaticDraw)
            .unwrap();
        assert!(buffer.is_emulated());

        rhi.draw_indirect(&buffer, 0, 2).unwrap();
        with_driver(|d| {
            let counts: Vec<(i32, i32, i32)> = d
                .draws
                .iter()
                .map(|draw| (draw.first, draw.count, draw.instance_count))
                .collect();
            assert_eq!(counts, vec![(0, 3, 1), (3, 6, 2)]);
        });
    }

    #[test]
    fn test_clear_depth_with_writes_disabled() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        let program = rhi.create_program(VS, FS).unwrap();
        let mut descriptor = PipelineStateDescriptor::default();
        descriptor.depth_stencil.depth_write = false;
        let pipeline = rhi.create_pipeline_state(program, &descriptor);
        rhi.set_graphics_pipeline_state(&pipeline);

        rhi.clear(ClearFlags::COLOR_DEPTH, &ClearValues::default());
        with_driver(|d| {
            assert_eq!(d.call_count("glClear"), 1);
            assert_eq!(d.call_count("glClearBufferfv"), 1);
            assert_eq!(d.call_count("glClearBufferiv"), 0);
            assert_eq!(d.call_count("glDepthMask"), 3);
        });
    }

    #[test]
    fn test_scissor_enabled_once() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        rhi.set_scissor_rectangle(0, 0, 64, 64);
        rhi.set_scissor_rectangle(8, 8, 32, 32);
        with_driver(|d| {
            assert_eq!(d.call_count("glScissor"), 2);
            assert!(d.is_enabled(gl::SCISSOR_TEST));
            assert_eq!(d.call_count("glEnable"), 1);
        });
    }

    #[test]
    fn test_swap_interval_needs_extension() {
        let rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        assert!(matches!(rhi.set_swap_interval(1), Err(RhiError::NotSupported(_))));

        let mut state = FakeDriverState::desktop(4, 6);
        state.platform_extensions = Some("WGL_EXT_swap_control".into());
        let rhi = fake_rhi(config(RhiBackend::OpenGl), state);
        assert!(rhi.set_swap_interval(1).is_ok());
        assert_eq!(with_driver(|d| d.swap_interval), Some(1));
    }

    #[test]
    fn test_context_recreation_skips_native_deletes() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        let buffer = rhi.create_vertex_buffer(&[0u8; 16], BufferUsage::StaticDraw).unwrap();
        let vao = indexed_vao(&mut rhi, IndexBufferFormat::UnsignedInt);
        rhi.set_vertex_array(&vao);

        rhi.context_recreated();
        assert!(rhi.state().vertex_array().is_none());
        assert!(!buffer.object().is_live());
        drop(buffer);
        drop(vao);
        with_driver(|d| {
            assert_eq!(d.call_count("glDeleteBuffers"), 0);
            assert_eq!(d.call_count("glDeleteVertexArrays"), 0);
        });

        // New objects live in the new context.
        let buffer = rhi.create_vertex_buffer(&[0u8; 16], BufferUsage::StaticDraw).unwrap();
        assert!(buffer.object().is_live());
    }

    #[test]
    fn test_map_through_rhi() {
        let mut rhi = fake_rhi(config(RhiBackend::OpenGl), FakeDriverState::desktop(4, 6));
        let buffer = rhi.create_uniform_buffer(&[0u8; 16], BufferUsage::DynamicDraw).unwrap();
        let mut mapped = rhi.map_buffer(buffer.as_ref(), MapType::WriteDiscard).unwrap();
        mapped.write(0, &[9; 4]);
        rhi.unmap_buffer(mapped);
        with_driver(|d| {
            assert_eq!(d.call_count("glMapNamedBufferRange"), 1);
            assert_eq!(d.call_count("glUnmapNamedBuffer"), 1);
            assert_eq!(&d.mapped[..4], &[9; 4]);
        });
    }
}
