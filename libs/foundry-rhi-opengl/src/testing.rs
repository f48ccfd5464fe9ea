// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Recording fake of a native GL driver.
//!
//! Every entry point of every table resolves to a fake that counts its calls
//! and mirrors the bits of driver state tests look at: object names, bindings,
//! capabilities, uploaded uniforms and issued draws. State is per thread, so
//! tests running in parallel never see each other's driver.
//!
//! Fakes run behind `extern "system"` and must never unwind: every access to
//! the state is fallible and degrades to a default value.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::ffi::{c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use foundry_rhi::{Result, RhiBackend, RhiConfig, RhiError};

use crate::loader::{PlatformLoader, SymbolLibrary};
use crate::native::*;
use crate::resources::GlDevice;
use crate::rhi::OpenGlRhi;

thread_local! {
    static DRIVER: RefCell<FakeDriverState> = RefCell::new(FakeDriverState::default());
}

/// One recorded draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawCall {
    pub symbol: &'static str,
    pub mode: GLenum,
    pub first: GLint,
    pub count: GLsizei,
    pub instance_count: GLsizei,
    pub index_type: Option<GLenum>,
    /// Index byte offset, or indirect record offset.
    pub offset: usize,
    pub base_vertex: GLint,
    pub base_instance: GLuint,
    /// Records consumed by a multi-draw.
    pub draw_count: GLsizei,
}

/// Driver behaviour knobs plus everything the fake recorded.
#[derive(Clone)]
pub struct FakeDriverState {
    pub version: String,
    pub vendor: String,
    pub renderer: String,
    pub extensions: Vec<String>,
    /// Window-system extension string.
    pub platform_extensions: Option<String>,
    pub max_anisotropy: GLint,
    pub compile_ok: bool,
    pub link_ok: bool,
    pub info_log: String,
    /// Active uniforms; a uniform's location is its index.
    pub uniforms: Vec<String>,
    pub framebuffer_status: GLenum,

    pub symbol_lookups: usize,
    pub legacy_extension_queries: usize,
    pub double_deletes: Vec<(&'static str, GLuint)>,
    pub uniform_uploads: Vec<(GLint, GLuint)>,
    /// Targets passed to `glBindBuffer` (non-zero names) and `glBufferData`.
    pub buffer_targets: Vec<GLenum>,
    pub buffer_sizes: HashMap<GLuint, usize>,
    /// Backing store handed out by the map entry points.
    pub mapped: Vec<u8>,
    pub clip_control: Option<(GLenum, GLenum)>,
    pub debug_callback: GlDebugProc,
    pub swap_interval: Option<GLint>,
    pub draws: Vec<DrawCall>,
    /// Format argument of texture storage and upload calls: the internal
    /// format for storage and full images, the pixel format for sub-images.
    pub texture_formats: Vec<(&'static str, GLenum)>,

    hidden: HashSet<String>,
    proc_only: HashSet<String>,
    calls: HashMap<&'static str, usize>,
    live: HashMap<&'static str, HashSet<GLuint>>,
    bindings: HashMap<GLenum, GLuint>,
    enabled: HashSet<GLenum>,
    sampler_parameters: HashMap<(GLuint, GLenum), GLint>,
    strings: Vec<CString>,
    next_name: GLuint,
}

impl Default for FakeDriverState {
    fn default() -> Self {
        Self::desktop(4, 6)
    }
}

impl FakeDriverState {
    fn with_version(version: String) -> Self {
        Self {
            version,
            vendor: "Foundry Fake Driver".to_string(),
            renderer: "Fake Renderer".to_string(),
            extensions: Vec::new(),
            platform_extensions: None,
            max_anisotropy: 16,
            compile_ok: true,
            link_ok: true,
            info_log: String::new(),
            uniforms: Vec::new(),
            framebuffer_status: gl::FRAMEBUFFER_COMPLETE,
            symbol_lookups: 0,
            legacy_extension_queries: 0,
            double_deletes: Vec::new(),
            uniform_uploads: Vec::new(),
            buffer_targets: Vec::new(),
            buffer_sizes: HashMap::new(),
            mapped: Vec::new(),
            clip_control: None,
            debug_callback: None,
            swap_interval: None,
            draws: Vec::new(),
            texture_formats: Vec::new(),
            hidden: HashSet::new(),
            proc_only: HashSet::new(),
            calls: HashMap::new(),
            live: HashMap::new(),
            bindings: HashMap::new(),
            enabled: HashSet::new(),
            sampler_parameters: HashMap::new(),
            strings: Vec::new(),
            next_name: 0,
        }
    }

    /// Desktop driver reporting `"<major>.<minor>.0 Fake"`.
    pub fn desktop(major: u32, minor: u32) -> Self {
        Self::with_version(format!("{}.{}.0 Fake", major, minor))
    }

    /// ES driver reporting `"OpenGL ES <major>.<minor> Fake"`.
    pub fn es(major: u32, minor: u32) -> Self {
        Self::with_version(format!("OpenGL ES {}.{} Fake", major, minor))
    }

    /// Make `symbol` unresolvable through both lookup paths.
    pub fn hide_symbol(&mut self, symbol: &str) {
        self.hidden.insert(symbol.to_string());
    }

    /// Make `symbol` resolvable through the proc-address path only.
    pub fn proc_address_only(&mut self, symbol: &str) {
        self.proc_only.insert(symbol.to_string());
    }

    /// The version this driver reports.
    ///
    /// # Panics
    /// If `version` does not parse.
    pub fn parsed_version(&self) -> GlVersion {
        match GlVersion::parse(&self.version) {
            Some(version) => version,
            None => panic!("fake driver version {:?} does not parse", self.version),
        }
    }

    pub fn call_count(&self, symbol: &str) -> usize {
        self.calls.get(symbol).copied().unwrap_or(0)
    }

    /// Live objects of one kind: `buffer`, `texture`, `vertex_array`,
    /// `framebuffer`, `sampler`, `program` or `shader`.
    pub fn live_count(&self, kind: &str) -> usize {
        self.live.get(kind).map_or(0, HashSet::len)
    }

    /// Name bound to `target`. Also answers `GL_ACTIVE_TEXTURE`,
    /// `GL_VERTEX_ARRAY_BINDING`, `GL_FRAMEBUFFER` and `GL_CURRENT_PROGRAM`.
    pub fn binding(&self, target: GLenum) -> GLuint {
        self.bindings.get(&target).copied().unwrap_or(0)
    }

    pub fn is_enabled(&self, capability: GLenum) -> bool {
        self.enabled.contains(&capability)
    }

    pub fn sampler_parameter(&self, sampler: GLuint, pname: GLenum) -> Option<GLint> {
        self.sampler_parameters.get(&(sampler, pname)).copied()
    }

    fn allocate(&mut self, kind: &'static str) -> GLuint {
        self.next_name += 1;
        self.live.entry(kind).or_default().insert(self.next_name);
        self.next_name
    }

    fn release(&mut self, kind: &'static str, name: GLuint) {
        if name == 0 {
            return;
        }
        if !self.live.entry(kind).or_default().remove(&name) {
            self.double_deletes.push((kind, name));
        }
    }

    fn intern(&mut self, text: String) -> *const GLubyte {
        match CString::new(text) {
            Ok(text) => {
                let ptr = text.as_ptr().cast::<GLubyte>();
                self.strings.push(text);
                ptr
            }
            Err(_) => std::ptr::null(),
        }
    }

    fn info_log_length(&self) -> GLint {
        if self.info_log.is_empty() {
            0
        } else {
            self.info_log.len() as GLint + 1
        }
    }
}

/// Replace this thread's driver.
pub fn install(state: FakeDriverState) {
    DRIVER.with(|driver| *driver.borrow_mut() = state);
}

/// Inspect or adjust this thread's driver.
pub fn with_driver<R>(f: impl FnOnce(&mut FakeDriverState) -> R) -> R {
    DRIVER.with(|driver| f(&mut driver.borrow_mut()))
}

fn try_driver<R>(f: impl FnOnce(&mut FakeDriverState) -> R) -> Option<R> {
    DRIVER
        .try_with(|driver| driver.try_borrow_mut().ok().map(|mut state| f(&mut state)))
        .ok()
        .flatten()
}

fn driver<R: Default>(f: impl FnOnce(&mut FakeDriverState) -> R) -> R {
    try_driver(f).unwrap_or_default()
}

fn texture_format(symbol: &'static str, format: GLenum) {
    driver(|d| d.texture_formats.push((symbol, format)));
}

fn record(symbol: &'static str) {
    driver(|d| *d.calls.entry(symbol).or_default() += 1);
}

fn generate_names(kind: &'static str, n: GLsizei, names: *mut GLuint) {
    if names.is_null() {
        return;
    }
    for i in 0..n.max(0) as usize {
        let name = driver(|d| d.allocate(kind));
        // SAFETY: the caller passes room for `n` names.
        unsafe { *names.add(i) = name };
    }
}

fn delete(kind: &'static str, n: GLsizei, names: *const GLuint) {
    if names.is_null() {
        return;
    }
    for i in 0..n.max(0) as usize {
        // SAFETY: the caller passes `n` names.
        let name = unsafe { *names.add(i) };
        driver(|d| d.release(kind, name));
    }
}

fn bind(target: GLenum, name: GLuint) {
    driver(|d| {
        d.bindings.insert(target, name);
    });
}

fn write_int(params: *mut GLint, value: GLint) {
    if !params.is_null() {
        // SAFETY: single-value query.
        unsafe { *params = value };
    }
}

fn write_info_log(buf_size: GLsizei, length: *mut GLsizei, out: *mut GLchar) {
    let log = driver(|d| d.info_log.clone());
    if out.is_null() || buf_size <= 0 {
        return;
    }
    let count = log.len().min(buf_size as usize - 1);
    // SAFETY: `out` holds `buf_size` bytes; one is kept for the NUL.
    unsafe {
        std::ptr::copy_nonoverlapping(log.as_ptr(), out.cast::<u8>(), count);
        *out.add(count) = 0;
        if !length.is_null() {
            *length = count as GLsizei;
        }
    }
}

fn map_range(length: GLsizeiptr) -> *mut c_void {
    if length <= 0 {
        return std::ptr::null_mut();
    }
    try_driver(|d| {
        if d.mapped.len() < length as usize {
            d.mapped.resize(length as usize, 0);
        }
        d.mapped.as_mut_ptr().cast::<c_void>()
    })
    .unwrap_or(std::ptr::null_mut())
}

fn draw(call: DrawCall) {
    driver(|d| d.draws.push(call));
}

macro_rules! fakes {
    ($( $symbol:literal => fn $fake:ident($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)? $body:block )*) => {
        $(
            #[allow(unused_variables)]
            extern "system" fn $fake($($arg: $ty),*) $(-> $ret)? {
                record($symbol);
                $body
            }
        )*

        fn fake_symbol(name: &str) -> Option<NonNull<c_void>> {
            let ptr = match name {
                $( $symbol => $fake as *mut c_void, )*
                _ => return None,
            };
            NonNull::new(ptr)
        }
    };
}

fakes! {
    // Core
    "glGetString" => fn get_string(name: GLenum) -> *const GLubyte {
        try_driver(|d| {
            let text = match name {
                gl::VENDOR => d.vendor.clone(),
                gl::RENDERER => d.renderer.clone(),
                gl::VERSION => d.version.clone(),
                gl::EXTENSIONS => {
                    d.legacy_extension_queries += 1;
                    d.extensions.join(" ")
                }
                _ => return std::ptr::null(),
            };
            d.intern(text)
        })
        .unwrap_or(std::ptr::null())
    }
    "glGetIntegerv" => fn get_integerv(pname: GLenum, data: *mut GLint) {
        let value = driver(|d| match pname {
            gl::NUM_EXTENSIONS => d.extensions.len() as GLint,
            ext::MAX_TEXTURE_MAX_ANISOTROPY_EXT => d.max_anisotropy,
            gl::MAX_COLOR_ATTACHMENTS | gl::MAX_DRAW_BUFFERS => 8,
            other => d.binding(other) as GLint,
        });
        write_int(data, value);
    }
    "glGetError" => fn get_error() -> GLenum { gl::NO_ERROR }
    "glEnable" => fn enable(cap: GLenum) {
        driver(|d| {
            d.enabled.insert(cap);
        });
    }
    "glDisable" => fn disable(cap: GLenum) {
        driver(|d| {
            d.enabled.remove(&cap);
        });
    }
    "glViewport" => fn viewport(x: GLint, y: GLint, width: GLsizei, height: GLsizei) {}
    "glScissor" => fn scissor(x: GLint, y: GLint, width: GLsizei, height: GLsizei) {}
    "glClearColor" => fn clear_color(r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat) {}
    "glClear" => fn clear(mask: GLbitfield) {}
    "glBindTexture" => fn bind_texture(target: GLenum, texture: GLuint) { bind(target, texture) }
    "glGenTextures" => fn gen_textures(n: GLsizei, textures: *mut GLuint) {
        generate_names("texture", n, textures)
    }
    "glDeleteTextures" => fn delete_textures(n: GLsizei, textures: *const GLuint) {
        delete("texture", n, textures)
    }
    "glTexImage2D" => fn tex_image_2d(
        target: GLenum,
        level: GLint,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        format: GLenum,
        data_type: GLenum,
        pixels: *const c_void,
    ) {
        texture_format("glTexImage2D", internal_format as GLenum)
    }
    "glCompressedTexImage2D" => fn compressed_tex_image_2d(
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        border: GLint,
        image_size: GLsizei,
        data: *const c_void,
    ) {}
    "glTexSubImage2D" => fn tex_sub_image_2d(
        target: GLenum,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        data_type: GLenum,
        pixels: *const c_void,
    ) {
        texture_format("glTexSubImage2D", format)
    }
    "glCompressedTexSubImage2D" => fn compressed_tex_sub_image_2d(
        target: GLenum,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        image_size: GLsizei,
        data: *const c_void,
    ) {}
    "glTexParameteri" => fn tex_parameteri(target: GLenum, pname: GLenum, param: GLint) {}
    "glPixelStorei" => fn pixel_storei(pname: GLenum, param: GLint) {}
    "glActiveTexture" => fn active_texture(texture: GLenum) { bind(gl::ACTIVE_TEXTURE, texture) }
    "glDrawArrays" => fn draw_arrays(mode: GLenum, first: GLint, count: GLsizei) {
        draw(DrawCall {
            symbol: "glDrawArrays",
            mode,
            first,
            count,
            instance_count: 1,
            ..DrawCall::default()
        })
    }
    "glDrawElements" => fn draw_elements(
        mode: GLenum,
        count: GLsizei,
        data_type: GLenum,
        indices: *const c_void,
    ) {
        draw(DrawCall {
            symbol: "glDrawElements",
            mode,
            count,
            instance_count: 1,
            index_type: Some(data_type),
            offset: indices as usize,
            ..DrawCall::default()
        })
    }
    "glBlendFuncSeparate" => fn blend_func_separate(
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    ) {}
    "glDepthFunc" => fn depth_func(func: GLenum) {}
    "glDepthMask" => fn depth_mask(flag: GLboolean) {}
    "glGenBuffers" => fn gen_buffers(n: GLsizei, buffers: *mut GLuint) { generate_names("buffer", n, buffers) }
    "glDeleteBuffers" => fn delete_buffers(n: GLsizei, buffers: *const GLuint) {
        delete("buffer", n, buffers)
    }
    "glBindBuffer" => fn bind_buffer(target: GLenum, buffer: GLuint) {
        driver(|d| {
            if buffer != 0 {
                d.buffer_targets.push(target);
            }
            d.bindings.insert(target, buffer);
        });
    }
    "glBufferData" => fn buffer_data(
        target: GLenum,
        size: GLsizeiptr,
        data: *const c_void,
        usage: GLenum,
    ) {
        driver(|d| {
            d.buffer_targets.push(target);
            let name = d.binding(target);
            d.buffer_sizes.insert(name, size.max(0) as usize);
        });
    }
    "glBufferSubData" => fn buffer_sub_data(
        target: GLenum,
        offset: GLintptr,
        size: GLsizeiptr,
        data: *const c_void,
    ) {}
    "glCreateShader" => fn create_shader(shader_type: GLenum) -> GLuint {
        driver(|d| d.allocate("shader"))
    }
    "glShaderSource" => fn shader_source(
        shader: GLuint,
        count: GLsizei,
        string: *const *const GLchar,
        length: *const GLint,
    ) {}
    "glCompileShader" => fn compile_shader(shader: GLuint) {}
    "glGetShaderiv" => fn get_shaderiv(shader: GLuint, pname: GLenum, params: *mut GLint) {
        let value = driver(|d| match pname {
            gl::COMPILE_STATUS => d.compile_ok as GLint,
            gl::INFO_LOG_LENGTH => d.info_log_length(),
            _ => 0,
        });
        write_int(params, value);
    }
    "glGetShaderInfoLog" => fn get_shader_info_log(
        shader: GLuint,
        buf_size: GLsizei,
        length: *mut GLsizei,
        info_log: *mut GLchar,
    ) {
        write_info_log(buf_size, length, info_log)
    }
    "glDeleteShader" => fn delete_shader(shader: GLuint) { driver(|d| d.release("shader", shader)) }
    "glCreateProgram" => fn create_program() -> GLuint { driver(|d| d.allocate("program")) }
    "glAttachShader" => fn attach_shader(program: GLuint, shader: GLuint) {}
    "glLinkProgram" => fn link_program(program: GLuint) {}
    "glGetProgramiv" => fn get_programiv(program: GLuint, pname: GLenum, params: *mut GLint) {
        let value = driver(|d| match pname {
            gl::LINK_STATUS => d.link_ok as GLint,
            gl::INFO_LOG_LENGTH => d.info_log_length(),
            _ => 0,
        });
        write_int(params, value);
    }
    "glGetProgramInfoLog" => fn get_program_info_log(
        program: GLuint,
        buf_size: GLsizei,
        length: *mut GLsizei,
        info_log: *mut GLchar,
    ) {
        write_info_log(buf_size, length, info_log)
    }
    "glDeleteProgram" => fn delete_program(program: GLuint) {
        driver(|d| d.release("program", program))
    }
    "glUseProgram" => fn use_program(program: GLuint) { bind(gl::CURRENT_PROGRAM, program) }
    "glGetUniformLocation" => fn get_uniform_location(program: GLuint, name: *const GLchar) -> GLint {
        if name.is_null() {
            return -1;
        }
        // SAFETY: uniform names are NUL-terminated.
        let wanted = unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned();
        try_driver(|d| {
            d.uniforms
                .iter()
                .position(|uniform| *uniform == wanted)
                .map_or(-1, |index| index as GLint)
        })
        .unwrap_or(-1)
    }
    "glUniform1i" => fn uniform_1i(location: GLint, v0: GLint) {}
    "glEnableVertexAttribArray" => fn enable_vertex_attrib_array(index: GLuint) {}
    "glVertexAttribPointer" => fn vertex_attrib_pointer(
        index: GLuint,
        size: GLint,
        data_type: GLenum,
        normalized: GLboolean,
        stride: GLsizei,
        pointer: *const c_void,
    ) {}

    // OpenGL 3.3 / ES 3.0
    "glGetStringi" => fn get_stringi(name: GLenum, index: GLuint) -> *const GLubyte {
        try_driver(|d| match (name, d.extensions.get(index as usize).cloned()) {
            (gl::EXTENSIONS, Some(extension)) => d.intern(extension),
            _ => std::ptr::null(),
        })
        .unwrap_or(std::ptr::null())
    }
    "glGenVertexArrays" => fn gen_vertex_arrays(n: GLsizei, arrays: *mut GLuint) {
        generate_names("vertex_array", n, arrays)
    }
    "glDeleteVertexArrays" => fn delete_vertex_arrays(n: GLsizei, arrays: *const GLuint) {
        delete("vertex_array", n, arrays)
    }
    "glBindVertexArray" => fn bind_vertex_array(array: GLuint) {
        bind(gl::VERTEX_ARRAY_BINDING, array)
    }
    "glVertexAttribIPointer" => fn vertex_attrib_ipointer(
        index: GLuint,
        size: GLint,
        data_type: GLenum,
        stride: GLsizei,
        pointer: *const c_void,
    ) {}
    "glVertexAttribDivisor" => fn vertex_attrib_divisor(index: GLuint, divisor: GLuint) {}
    "glGenFramebuffers" => fn gen_framebuffers(n: GLsizei, framebuffers: *mut GLuint) {
        generate_names("framebuffer", n, framebuffers)
    }
    "glDeleteFramebuffers" => fn delete_framebuffers(n: GLsizei, framebuffers: *const GLuint) {
        delete("framebuffer", n, framebuffers)
    }
    "glBindFramebuffer" => fn bind_framebuffer(target: GLenum, framebuffer: GLuint) {
        bind(gl::FRAMEBUFFER, framebuffer)
    }
    "glFramebufferTexture2D" => fn framebuffer_texture_2d(
        target: GLenum,
        attachment: GLenum,
        tex_target: GLenum,
        texture: GLuint,
        level: GLint,
    ) {}
    "glCheckFramebufferStatus" => fn check_framebuffer_status(target: GLenum) -> GLenum {
        driver(|d| d.framebuffer_status)
    }
    "glDrawBuffers" => fn draw_buffers(n: GLsizei, bufs: *const GLenum) {}
    "glGenerateMipmap" => fn generate_mipmap(target: GLenum) {}
    "glClearBufferfv" => fn clear_bufferfv(buffer: GLenum, draw_buffer: GLint, value: *const GLfloat) {}
    "glClearBufferiv" => fn clear_bufferiv(buffer: GLenum, draw_buffer: GLint, value: *const GLint) {}
    "glMapBufferRange" => fn map_buffer_range(
        target: GLenum,
        offset: GLintptr,
        length: GLsizeiptr,
        access: GLbitfield,
    ) -> *mut c_void {
        map_range(length)
    }
    "glUnmapBuffer" => fn unmap_buffer(target: GLenum) -> GLboolean { gl::TRUE }
    "glUniform1ui" => fn uniform_1ui(location: GLint, v0: GLuint) {
        driver(|d| d.uniform_uploads.push((location, v0)))
    }
    "glDrawArraysInstanced" => fn draw_arrays_instanced(
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instance_count: GLsizei,
    ) {
        draw(DrawCall {
            symbol: "glDrawArraysInstanced",
            mode,
            first,
            count,
            instance_count,
            ..DrawCall::default()
        })
    }
    "glDrawElementsInstanced" => fn draw_elements_instanced(
        mode: GLenum,
        count: GLsizei,
        data_type: GLenum,
        indices: *const c_void,
        instance_count: GLsizei,
    ) {
        draw(DrawCall {
            symbol: "glDrawElementsInstanced",
            mode,
            count,
            instance_count,
            index_type: Some(data_type),
            offset: indices as usize,
            ..DrawCall::default()
        })
    }
    "glGenSamplers" => fn gen_samplers(count: GLsizei, samplers: *mut GLuint) {
        generate_names("sampler", count, samplers)
    }
    "glDeleteSamplers" => fn delete_samplers(count: GLsizei, samplers: *const GLuint) {
        delete("sampler", count, samplers)
    }
    "glBindSampler" => fn bind_sampler(unit: GLuint, sampler: GLuint) {}
    "glSamplerParameteri" => fn sampler_parameteri(sampler: GLuint, pname: GLenum, param: GLint) {
        driver(|d| {
            d.sampler_parameters.insert((sampler, pname), param);
        });
    }
    "glSamplerParameterf" => fn sampler_parameterf(sampler: GLuint, pname: GLenum, param: GLfloat) {
        driver(|d| {
            d.sampler_parameters.insert((sampler, pname), param as GLint);
        });
    }
    "glSamplerParameterfv" => fn sampler_parameterfv(
        sampler: GLuint,
        pname: GLenum,
        params: *const GLfloat,
    ) {}

    // Version-gated bundles
    "glDrawElementsInstancedBaseVertex" => fn draw_elements_instanced_base_vertex(
        mode: GLenum,
        count: GLsizei,
        data_type: GLenum,
        indices: *const c_void,
        instance_count: GLsizei,
        base_vertex: GLint,
    ) {
        draw(DrawCall {
            symbol: "glDrawElementsInstancedBaseVertex",
            mode,
            count,
            instance_count,
            index_type: Some(data_type),
            offset: indices as usize,
            base_vertex,
            ..DrawCall::default()
        })
    }
    "glPatchParameteri" => fn patch_parameteri(pname: GLenum, value: GLint) {}
    "glDrawArraysIndirect" => fn draw_arrays_indirect(mode: GLenum, indirect: *const c_void) {
        draw(DrawCall {
            symbol: "glDrawArraysIndirect",
            mode,
            offset: indirect as usize,
            draw_count: 1,
            ..DrawCall::default()
        })
    }
    "glDrawElementsIndirect" => fn draw_elements_indirect(
        mode: GLenum,
        data_type: GLenum,
        indirect: *const c_void,
    ) {
        draw(DrawCall {
            symbol: "glDrawElementsIndirect",
            mode,
            index_type: Some(data_type),
            offset: indirect as usize,
            draw_count: 1,
            ..DrawCall::default()
        })
    }
    "glTexStorage2D" => fn tex_storage_2d(
        target: GLenum,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        texture_format("glTexStorage2D", internal_format)
    }
    "glDrawArraysInstancedBaseInstance" => fn draw_arrays_instanced_base_instance(
        mode: GLenum,
        first: GLint,
        count: GLsizei,
        instance_count: GLsizei,
        base_instance: GLuint,
    ) {
        draw(DrawCall {
            symbol: "glDrawArraysInstancedBaseInstance",
            mode,
            first,
            count,
            instance_count,
            base_instance,
            ..DrawCall::default()
        })
    }
    "glDrawElementsInstancedBaseVertexBaseInstance" => fn draw_elements_instanced_base_vertex_base_instance(
        mode: GLenum,
        count: GLsizei,
        data_type: GLenum,
        indices: *const c_void,
        instance_count: GLsizei,
        base_vertex: GLint,
        base_instance: GLuint,
    ) {
        draw(DrawCall {
            symbol: "glDrawElementsInstancedBaseVertexBaseInstance",
            mode,
            count,
            instance_count,
            index_type: Some(data_type),
            offset: indices as usize,
            base_vertex,
            base_instance,
            ..DrawCall::default()
        })
    }
    "glMultiDrawArraysIndirect" => fn multi_draw_arrays_indirect(
        mode: GLenum,
        indirect: *const c_void,
        draw_count: GLsizei,
        stride: GLsizei,
    ) {
        draw(DrawCall {
            symbol: "glMultiDrawArraysIndirect",
            mode,
            offset: indirect as usize,
            draw_count,
            ..DrawCall::default()
        })
    }
    "glMultiDrawElementsIndirect" => fn multi_draw_elements_indirect(
        mode: GLenum,
        data_type: GLenum,
        indirect: *const c_void,
        draw_count: GLsizei,
        stride: GLsizei,
    ) {
        draw(DrawCall {
            symbol: "glMultiDrawElementsIndirect",
            mode,
            index_type: Some(data_type),
            offset: indirect as usize,
            draw_count,
            ..DrawCall::default()
        })
    }
    "glDebugMessageCallback" => fn debug_message_callback(
        callback: GlDebugProc,
        user_param: *const c_void,
    ) {
        driver(|d| d.debug_callback = callback)
    }
    "glClipControl" => fn clip_control(origin: GLenum, depth: GLenum) {
        driver(|d| d.clip_control = Some((origin, depth)))
    }

    // Direct state access
    "glCreateBuffers" => fn create_buffers(n: GLsizei, buffers: *mut GLuint) {
        generate_names("buffer", n, buffers)
    }
    "glNamedBufferData" => fn named_buffer_data(
        buffer: GLuint,
        size: GLsizeiptr,
        data: *const c_void,
        usage: GLenum,
    ) {
        driver(|d| {
            d.buffer_sizes.insert(buffer, size.max(0) as usize);
        });
    }
    "glNamedBufferSubData" => fn named_buffer_sub_data(
        buffer: GLuint,
        offset: GLintptr,
        size: GLsizeiptr,
        data: *const c_void,
    ) {}
    "glMapNamedBufferRange" => fn map_named_buffer_range(
        buffer: GLuint,
        offset: GLintptr,
        length: GLsizeiptr,
        access: GLbitfield,
    ) -> *mut c_void {
        map_range(length)
    }
    "glUnmapNamedBuffer" => fn unmap_named_buffer(buffer: GLuint) -> GLboolean { gl::TRUE }
    "glCreateTextures" => fn create_textures(target: GLenum, n: GLsizei, textures: *mut GLuint) {
        generate_names("texture", n, textures)
    }
    "glTextureStorage2D" => fn texture_storage_2d(
        texture: GLuint,
        levels: GLsizei,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
    ) {
        texture_format("glTextureStorage2D", internal_format)
    }
    "glTextureSubImage2D" => fn texture_sub_image_2d(
        texture: GLuint,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        data_type: GLenum,
        pixels: *const c_void,
    ) {
        texture_format("glTextureSubImage2D", format)
    }
    "glCompressedTextureSubImage2D" => fn compressed_texture_sub_image_2d(
        texture: GLuint,
        level: GLint,
        x_offset: GLint,
        y_offset: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        image_size: GLsizei,
        data: *const c_void,
    ) {}
    "glGenerateTextureMipmap" => fn generate_texture_mipmap(texture: GLuint) {}
    "glBindTextureUnit" => fn bind_texture_unit(unit: GLuint, texture: GLuint) {
        bind(gl::TEXTURE_2D, texture)
    }
    "glCreateVertexArrays" => fn create_vertex_arrays(n: GLsizei, arrays: *mut GLuint) {
        generate_names("vertex_array", n, arrays)
    }
    "glVertexArrayVertexBuffer" => fn vertex_array_vertex_buffer(
        vaobj: GLuint,
        binding_index: GLuint,
        buffer: GLuint,
        offset: GLintptr,
        stride: GLsizei,
    ) {}
    "glVertexArrayElementBuffer" => fn vertex_array_element_buffer(vaobj: GLuint, buffer: GLuint) {}
    "glEnableVertexArrayAttrib" => fn enable_vertex_array_attrib(vaobj: GLuint, index: GLuint) {}
    "glVertexArrayAttribFormat" => fn vertex_array_attrib_format(
        vaobj: GLuint,
        attrib_index: GLuint,
        size: GLint,
        data_type: GLenum,
        normalized: GLboolean,
        relative_offset: GLuint,
    ) {}
    "glVertexArrayAttribIFormat" => fn vertex_array_attrib_iformat(
        vaobj: GLuint,
        attrib_index: GLuint,
        size: GLint,
        data_type: GLenum,
        relative_offset: GLuint,
    ) {}
    "glVertexArrayAttribBinding" => fn vertex_array_attrib_binding(
        vaobj: GLuint,
        attrib_index: GLuint,
        binding_index: GLuint,
    ) {}
    "glVertexArrayBindingDivisor" => fn vertex_array_binding_divisor(
        vaobj: GLuint,
        binding_index: GLuint,
        divisor: GLuint,
    ) {}
    "glCreateFramebuffers" => fn create_framebuffers(n: GLsizei, framebuffers: *mut GLuint) {
        generate_names("framebuffer", n, framebuffers)
    }
    "glNamedFramebufferTexture" => fn named_framebuffer_texture(
        framebuffer: GLuint,
        attachment: GLenum,
        texture: GLuint,
        level: GLint,
    ) {}
    "glNamedFramebufferDrawBuffers" => fn named_framebuffer_draw_buffers(
        framebuffer: GLuint,
        n: GLsizei,
        bufs: *const GLenum,
    ) {}
    "glCheckNamedFramebufferStatus" => fn check_named_framebuffer_status(
        framebuffer: GLuint,
        target: GLenum,
    ) -> GLenum {
        driver(|d| d.framebuffer_status)
    }
    "glCreateSamplers" => fn create_samplers(n: GLsizei, samplers: *mut GLuint) {
        generate_names("sampler", n, samplers)
    }

    // WGL_EXT_swap_control
    "wglSwapIntervalEXT" => fn swap_interval(interval: GLint) -> GLint {
        driver(|d| d.swap_interval = Some(interval));
        1
    }
}

/// Library whose exports are the fakes of this thread's driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeLibrary;

impl SymbolLibrary for FakeLibrary {
    fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        let visible = driver(|d| {
            d.symbol_lookups += 1;
            !d.hidden.contains(name) && !d.proc_only.contains(name)
        });
        visible.then(|| fake_symbol(name)).flatten()
    }

    fn proc_address(&self, name: &str) -> Option<NonNull<c_void>> {
        let visible = driver(|d| {
            d.symbol_lookups += 1;
            !d.hidden.contains(name)
        });
        visible.then(|| fake_symbol(name)).flatten()
    }

    fn platform_extensions(&self) -> Option<String> {
        driver(|d| d.platform_extensions.clone())
    }
}

/// Loader that opens [`FakeLibrary`] under [`FakeLoader::LIBRARY`] and
/// fails for every other path.
#[derive(Debug, Clone)]
pub struct FakeLoader {
    names: Vec<PathBuf>,
}

impl FakeLoader {
    pub const LIBRARY: &'static str = "fake://libGL";

    pub fn with_names(names: &[&str]) -> Self {
        Self {
            names: names.iter().map(PathBuf::from).collect(),
        }
    }
}

impl Default for FakeLoader {
    fn default() -> Self {
        Self::with_names(&[Self::LIBRARY])
    }
}

impl PlatformLoader for FakeLoader {
    fn library_names(&self) -> Vec<PathBuf> {
        self.names.clone()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn SymbolLibrary>> {
        if path == Path::new(Self::LIBRARY) {
            Ok(Box::new(FakeLibrary))
        } else {
            Err(RhiError::LibraryNotFound {
                names: path.display().to_string(),
                reason: "no such file".to_string(),
            })
        }
    }
}

/// Bring up an [`OpenGlRhi`] against `state`.
///
/// # Panics
/// If bring-up fails.
pub fn fake_rhi(config: RhiConfig, state: FakeDriverState) -> OpenGlRhi {
    install(state);
    match OpenGlRhi::new(config, Box::new(FakeLoader::default())) {
        Ok(rhi) => rhi,
        Err(e) => panic!("fake driver bring-up failed: {}", e),
    }
}

/// Device of a default-configured RHI brought up against `state`, on the
/// backend matching the driver's dialect.
///
/// # Panics
/// If bring-up fails.
pub fn fake_device(state: FakeDriverState) -> Arc<GlDevice> {
    let backend = if state.parsed_version().es {
        RhiBackend::OpenGlEs3
    } else {
        RhiBackend::OpenGl
    };
    let config = RhiConfig {
        backend: Some(backend),
        ..RhiConfig::default()
    };
    Arc::clone(fake_rhi(config, state).device())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_points::*;

    fn resolves<T: EntryPointBundle>() {
        for symbol in T::SYMBOLS {
            assert!(fake_symbol(symbol).is_some(), "no fake for {symbol}");
        }
    }

    #[test]
    fn test_every_table_symbol_has_a_fake() {
        resolves::<CoreFunctions>();
        resolves::<Gl3Functions>();
        resolves::<DrawBaseVertexFunctions>();
        resolves::<TessellationFunctions>();
        resolves::<DrawIndirectFunctions>();
        resolves::<TextureStorageFunctions>();
        resolves::<BaseInstanceFunctions>();
        resolves::<MultiDrawIndirectFunctions>();
        resolves::<DebugFunctions>();
        resolves::<ClipControlFunctions>();
        resolves::<DirectStateAccessFunctions>();
        resolves::<SwapControlFunctions>();
    }

    #[test]
    fn test_version_strings_parse() {
        assert_eq!(FakeDriverState::desktop(3, 3).parsed_version(), GlVersion::desktop(3, 3));
        assert_eq!(FakeDriverState::es(3, 1).parsed_version(), GlVersion::es(3, 1));
    }

    #[test]
    fn test_double_delete_is_recorded() {
        install(FakeDriverState::default());
        let mut name = 0;
        gen_buffers(1, &mut name);
        delete_buffers(1, &name);
        delete_buffers(1, &name);
        with_driver(|d| {
            assert_eq!(d.live_count("buffer"), 0);
            assert_eq!(d.double_deletes, vec![("buffer", name)]);
            assert_eq!(d.call_count("glDeleteBuffers"), 2);
        });
    }

    #[test]
    fn test_fakes_survive_a_held_borrow() {
        install(FakeDriverState::default());
        with_driver(|_| {
            // The state is borrowed; the fake degrades instead of panicking.
            assert!(get_string(gl::VERSION).is_null());
        });
    }
}
