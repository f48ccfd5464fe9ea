// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Typed tables of native entry points.
//!
//! Every table is a plain `Copy` struct of function pointers resolved by
//! exact ASCII name. A table is produced whole or not at all: the first
//! symbol that fails to resolve aborts with [`RhiError::MissingSymbol`].

use std::ffi::c_void;
use std::ptr::NonNull;

use foundry_rhi::{Result, RhiError};

use crate::native::*;

/// Symbol lookup used while resolving a table.
pub type SymbolLookup<'a> = &'a dyn Fn(&str) -> Option<NonNull<c_void>>;

/// A table of entry points that resolves as a unit.
pub trait EntryPointBundle: Sized + Copy {
    /// Native symbol names in declaration order.
    const SYMBOLS: &'static [&'static str];

    fn resolve(lookup: SymbolLookup<'_>) -> Result<Self>;
}

/// Core API version at which a bundle stops being optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionFloor {
    pub desktop: Option<(u32, u32)>,
    pub es: Option<(u32, u32)>,
}

impl VersionFloor {
    pub fn is_core_in(&self, version: GlVersion) -> bool {
        version.meets(self.desktop, self.es)
    }
}

/// Bundles that become core at a fixed API version.
pub trait VersionGated: EntryPointBundle {
    const FLOOR: VersionFloor;
}

macro_rules! entry_points {
    (
        $(#[$meta:meta])*
        pub struct $table:ident {
            $( $field:ident: $symbol:literal => fn($($arg:ident: $ty:ty),* $(,)?) $(-> $ret:ty)?; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy)]
        pub struct $table {
            $( pub $field: unsafe extern "system" fn($($arg: $ty),*) $(-> $ret)?, )*
        }

        impl EntryPointBundle for $table {
            const SYMBOLS: &'static [&'static str] = &[$($symbol),*];

            fn resolve(lookup: SymbolLookup<'_>) -> Result<Self> {
                Ok(Self {
                    $(
                        $field: match lookup($symbol) {
                            // SAFETY: the symbol was resolved by its exact native
                            // name, whose ABI is the declared signature.
                            Some(ptr) => unsafe {
                                std::mem::transmute::<
                                    *mut c_void,
                                    unsafe extern "system" fn($($ty),*) $(-> $ret)?,
                                >(ptr.as_ptr())
                            },
                            None => {
                                return Err(RhiError::MissingSymbol {
                                    symbol: $symbol.to_string(),
                                })
                            }
                        },
                    )*
                })
            }
        }

        impl std::fmt::Debug for $table {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($table))
                    .field("symbols", &Self::SYMBOLS.len())
                    .finish()
            }
        }
    };
}

macro_rules! version_floor {
    ($table:ident, desktop: $desktop:expr, es: $es:expr) => {
        impl VersionGated for $table {
            const FLOOR: VersionFloor = VersionFloor {
                desktop: $desktop,
                es: $es,
            };
        }
    };
}

entry_points! {
    /// Entry points every supported context exposes. Missing any of these
    /// means the host cannot run the RHI.
    pub struct CoreFunctions {
        get_string: "glGetString" => fn(name: GLenum) -> *const GLubyte;
        get_integerv: "glGetIntegerv" => fn(pname: GLenum, data: *mut GLint);
        get_error: "glGetError" => fn() -> GLenum;
        enable: "glEnable" => fn(cap: GLenum);
        disable: "glDisable" => fn(cap: GLenum);
        viewport: "glViewport" => fn(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
        scissor: "glScissor" => fn(x: GLint, y: GLint, width: GLsizei, height: GLsizei);
        clear_color: "glClearColor" => fn(r: GLfloat, g: GLfloat, b: GLfloat, a: GLfloat);
        clear: "glClear" => fn(mask: GLbitfield);
        bind_texture: "glBindTexture" => fn(target: GLenum, texture: GLuint);
        gen_textures: "glGenTextures" => fn(n: GLsizei, textures: *mut GLuint);
        delete_textures: "glDeleteTextures" => fn(n: GLsizei, textures: *const GLuint);
        tex_image_2d: "glTexImage2D" => fn(
            target: GLenum,
            level: GLint,
            internal_format: GLint,
            width: GLsizei,
            height: GLsizei,
            border: GLint,
            format: GLenum,
            data_type: GLenum,
            pixels: *const c_void,
        );
        compressed_tex_image_2d: "glCompressedTexImage2D" => fn(
            target: GLenum,
            level: GLint,
            internal_format: GLenum,
            width: GLsizei,
            height: GLsizei,
            border: GLint,
            image_size: GLsizei,
            data: *const c_void,
        );
        tex_sub_image_2d: "glTexSubImage2D" => fn(
            target: GLenum,
            level: GLint,
            x_offset: GLint,
            y_offset: GLint,
            width: GLsizei,
            height: GLsizei,
            format: GLenum,
            data_type: GLenum,
            pixels: *const c_void,
        );
        compressed_tex_sub_image_2d: "glCompressedTexSubImage2D" => fn(
            target: GLenum,
            level: GLint,
            x_offset: GLint,
            y_offset: GLint,
            width: GLsizei,
            height: GLsizei,
            format: GLenum,
            image_size: GLsizei,
            data: *const c_void,
        );
        tex_parameteri: "glTexParameteri" => fn(target: GLenum, pname: GLenum, param: GLint);
        pixel_storei: "glPixelStorei" => fn(pname: GLenum, param: GLint);
        active_texture: "glActiveTexture" => fn(texture: GLenum);
        draw_arrays: "glDrawArrays" => fn(mode: GLenum, first: GLint, count: GLsizei);
        draw_elements: "glDrawElements" => fn(
            mode: GLenum,
            count: GLsizei,
            data_type: GLenum,
            indices: *const c_void,
        );
        blend_func_separate: "glBlendFuncSeparate" => fn(
            src_rgb: GLenum,
            dst_rgb: GLenum,
            src_alpha: GLenum,
            dst_alpha: GLenum,
        );
        depth_func: "glDepthFunc" => fn(func: GLenum);
        depth_mask: "glDepthMask" => fn(flag: GLboolean);
        gen_buffers: "glGenBuffers" => fn(n: GLsizei, buffers: *mut GLuint);
        delete_buffers: "glDeleteBuffers" => fn(n: GLsizei, buffers: *const GLuint);
        bind_buffer: "glBindBuffer" => fn(target: GLenum, buffer: GLuint);
        buffer_data: "glBufferData" => fn(
            target: GLenum,
            size: GLsizeiptr,
            data: *const c_void,
            usage: GLenum,
        );
        buffer_sub_data: "glBufferSubData" => fn(
            target: GLenum,
            offset: GLintptr,
            size: GLsizeiptr,
            data: *const c_void,
        );
        create_shader: "glCreateShader" => fn(shader_type: GLenum) -> GLuint;
        shader_source: "glShaderSource" => fn(
            shader: GLuint,
            count: GLsizei,
            string: *const *const GLchar,
            length: *const GLint,
        );
        compile_shader: "glCompileShader" => fn(shader: GLuint);
        get_shaderiv: "glGetShaderiv" => fn(shader: GLuint, pname: GLenum, params: *mut GLint);
        get_shader_info_log: "glGetShaderInfoLog" => fn(
            shader: GLuint,
            buf_size: GLsizei,
            length: *mut GLsizei,
            info_log: *mut GLchar,
        );
        delete_shader: "glDeleteShader" => fn(shader: GLuint);
        create_program: "glCreateProgram" => fn() -> GLuint;
        attach_shader: "glAttachShader" => fn(program: GLuint, shader: GLuint);
        link_program: "glLinkProgram" => fn(program: GLuint);
        get_programiv: "glGetProgramiv" => fn(program: GLuint, pname: GLenum, params: *mut GLint);
        get_program_info_log: "glGetProgramInfoLog" => fn(
            program: GLuint,
            buf_size: GLsizei,
            length: *mut GLsizei,
            info_log: *mut GLchar,
        );
        delete_program: "glDeleteProgram" => fn(program: GLuint);
        use_program: "glUseProgram" => fn(program: GLuint);
        get_uniform_location: "glGetUniformLocation" => fn(
            program: GLuint,
            name: *const GLchar,
        ) -> GLint;
        uniform_1i: "glUniform1i" => fn(location: GLint, v0: GLint);
        enable_vertex_attrib_array: "glEnableVertexAttribArray" => fn(index: GLuint);
        vertex_attrib_pointer: "glVertexAttribPointer" => fn(
            index: GLuint,
            size: GLint,
            data_type: GLenum,
            normalized: GLboolean,
            stride: GLsizei,
            pointer: *const c_void,
        );
    }
}

entry_points! {
    /// The version floor of the RHI: OpenGL 3.3 core / OpenGL ES 3.0.
    /// Vertex array objects, framebuffers, sampler objects, instancing.
    pub struct Gl3Functions {
        get_stringi: "glGetStringi" => fn(name: GLenum, index: GLuint) -> *const GLubyte;
        gen_vertex_arrays: "glGenVertexArrays" => fn(n: GLsizei, arrays: *mut GLuint);
        delete_vertex_arrays: "glDeleteVertexArrays" => fn(n: GLsizei, arrays: *const GLuint);
        bind_vertex_array: "glBindVertexArray" => fn(array: GLuint);
        vertex_attrib_ipointer: "glVertexAttribIPointer" => fn(
            index: GLuint,
            size: GLint,
            data_type: GLenum,
            stride: GLsizei,
            pointer: *const c_void,
        );
        vertex_attrib_divisor: "glVertexAttribDivisor" => fn(index: GLuint, divisor: GLuint);
        gen_framebuffers: "glGenFramebuffers" => fn(n: GLsizei, framebuffers: *mut GLuint);
        delete_framebuffers: "glDeleteFramebuffers" => fn(n: GLsizei, framebuffers: *const GLuint);
        bind_framebuffer: "glBindFramebuffer" => fn(target: GLenum, framebuffer: GLuint);
        framebuffer_texture_2d: "glFramebufferTexture2D" => fn(
            target: GLenum,
            attachment: GLenum,
            tex_target: GLenum,
            texture: GLuint,
            level: GLint,
        );
        check_framebuffer_status: "glCheckFramebufferStatus" => fn(target: GLenum) -> GLenum;
        draw_buffers: "glDrawBuffers" => fn(n: GLsizei, bufs: *const GLenum);
        generate_mipmap: "glGenerateMipmap" => fn(target: GLenum);
        clear_bufferfv: "glClearBufferfv" => fn(
            buffer: GLenum,
            draw_buffer: GLint,
            value: *const GLfloat,
        );
        clear_bufferiv: "glClearBufferiv" => fn(
            buffer: GLenum,
            draw_buffer: GLint,
            value: *const GLint,
        );
        map_buffer_range: "glMapBufferRange" => fn(
            target: GLenum,
            offset: GLintptr,
            length: GLsizeiptr,
            access: GLbitfield,
        ) -> *mut c_void;
        unmap_buffer: "glUnmapBuffer" => fn(target: GLenum) -> GLboolean;
        uniform_1ui: "glUniform1ui" => fn(location: GLint, v0: GLuint);
        draw_arrays_instanced: "glDrawArraysInstanced" => fn(
            mode: GLenum,
            first: GLint,
            count: GLsizei,
            instance_count: GLsizei,
        );
        draw_elements_instanced: "glDrawElementsInstanced" => fn(
            mode: GLenum,
            count: GLsizei,
            data_type: GLenum,
            indices: *const c_void,
            instance_count: GLsizei,
        );
        gen_samplers: "glGenSamplers" => fn(count: GLsizei, samplers: *mut GLuint);
        delete_samplers: "glDeleteSamplers" => fn(count: GLsizei, samplers: *const GLuint);
        bind_sampler: "glBindSampler" => fn(unit: GLuint, sampler: GLuint);
        sampler_parameteri: "glSamplerParameteri" => fn(sampler: GLuint, pname: GLenum, param: GLint);
        sampler_parameterf: "glSamplerParameterf" => fn(sampler: GLuint, pname: GLenum, param: GLfloat);
        sampler_parameterfv: "glSamplerParameterfv" => fn(
            sampler: GLuint,
            pname: GLenum,
            params: *const GLfloat,
        );
    }
}
version_floor!(Gl3Functions, desktop: Some((3, 3)), es: Some((3, 0)));

entry_points! {
    pub struct DrawBaseVertexFunctions {
        draw_elements_instanced_base_vertex: "glDrawElementsInstancedBaseVertex" => fn(
            mode: GLenum,
            count: GLsizei,
            data_type: GLenum,
            indices: *const c_void,
            instance_count: GLsizei,
            base_vertex: GLint,
        );
    }
}
version_floor!(DrawBaseVertexFunctions, desktop: Some((3, 2)), es: Some((3, 2)));

entry_points! {
    pub struct TessellationFunctions {
        patch_parameteri: "glPatchParameteri" => fn(pname: GLenum, value: GLint);
    }
}
version_floor!(TessellationFunctions, desktop: Some((4, 0)), es: Some((3, 2)));

entry_points! {
    pub struct DrawIndirectFunctions {
        draw_arrays_indirect: "glDrawArraysIndirect" => fn(mode: GLenum, indirect: *const c_void);
        draw_elements_indirect: "glDrawElementsIndirect" => fn(
            mode: GLenum,
            data_type: GLenum,
            indirect: *const c_void,
        );
    }
}
version_floor!(DrawIndirectFunctions, desktop: Some((4, 0)), es: Some((3, 1)));

entry_points! {
    pub struct TextureStorageFunctions {
        tex_storage_2d: "glTexStorage2D" => fn(
            target: GLenum,
            levels: GLsizei,
            internal_format: GLenum,
            width: GLsizei,
            height: GLsizei,
        );
    }
}
version_floor!(TextureStorageFunctions, desktop: Some((4, 2)), es: Some((3, 0)));

entry_points! {
    pub struct BaseInstanceFunctions {
        draw_arrays_instanced_base_instance: "glDrawArraysInstancedBaseInstance" => fn(
            mode: GLenum,
            first: GLint,
            count: GLsizei,
            instance_count: GLsizei,
            base_instance: GLuint,
        );
        draw_elements_instanced_base_vertex_base_instance:
            "glDrawElementsInstancedBaseVertexBaseInstance" => fn(
            mode: GLenum,
            count: GLsizei,
            data_type: GLenum,
            indices: *const c_void,
            instance_count: GLsizei,
            base_vertex: GLint,
            base_instance: GLuint,
        );
    }
}
version_floor!(BaseInstanceFunctions, desktop: Some((4, 2)), es: None);

entry_points! {
    pub struct MultiDrawIndirectFunctions {
        multi_draw_arrays_indirect: "glMultiDrawArraysIndirect" => fn(
            mode: GLenum,
            indirect: *const c_void,
            draw_count: GLsizei,
            stride: GLsizei,
        );
        multi_draw_elements_indirect: "glMultiDrawElementsIndirect" => fn(
            mode: GLenum,
            data_type: GLenum,
            indirect: *const c_void,
            draw_count: GLsizei,
            stride: GLsizei,
        );
    }
}
version_floor!(MultiDrawIndirectFunctions, desktop: Some((4, 3)), es: None);

entry_points! {
    pub struct DebugFunctions {
        debug_message_callback: "glDebugMessageCallback" => fn(
            callback: GlDebugProc,
            user_param: *const c_void,
        );
    }
}
version_floor!(DebugFunctions, desktop: Some((4, 3)), es: Some((3, 2)));

entry_points! {
    pub struct ClipControlFunctions {
        clip_control: "glClipControl" => fn(origin: GLenum, depth: GLenum);
    }
}
version_floor!(ClipControlFunctions, desktop: Some((4, 5)), es: None);

entry_points! {
    /// Direct state access: edit objects without binding them.
    pub struct DirectStateAccessFunctions {
        create_buffers: "glCreateBuffers" => fn(n: GLsizei, buffers: *mut GLuint);
        named_buffer_data: "glNamedBufferData" => fn(
            buffer: GLuint,
            size: GLsizeiptr,
            data: *const c_void,
            usage: GLenum,
        );
        named_buffer_sub_data: "glNamedBufferSubData" => fn(
            buffer: GLuint,
            offset: GLintptr,
            size: GLsizeiptr,
            data: *const c_void,
        );
        map_named_buffer_range: "glMapNamedBufferRange" => fn(
            buffer: GLuint,
            offset: GLintptr,
            length: GLsizeiptr,
            access: GLbitfield,
        ) -> *mut c_void;
        unmap_named_buffer: "glUnmapNamedBuffer" => fn(buffer: GLuint) -> GLboolean;
        create_textures: "glCreateTextures" => fn(target: GLenum, n: GLsizei, textures: *mut GLuint);
        texture_storage_2d: "glTextureStorage2D" => fn(
            texture: GLuint,
            levels: GLsizei,
            internal_format: GLenum,
            width: GLsizei,
            height: GLsizei,
        );
        texture_sub_image_2d: "glTextureSubImage2D" => fn(
            texture: GLuint,
            level: GLint,
            x_offset: GLint,
            y_offset: GLint,
            width: GLsizei,
            height: GLsizei,
            format: GLenum,
            data_type: GLenum,
            pixels: *const c_void,
        );
        compressed_texture_sub_image_2d: "glCompressedTextureSubImage2D" => fn(
            texture: GLuint,
            level: GLint,
            x_offset: GLint,
            y_offset: GLint,
            width: GLsizei,
            height: GLsizei,
            format: GLenum,
            image_size: GLsizei,
            data: *const c_void,
        );
        generate_texture_mipmap: "glGenerateTextureMipmap" => fn(texture: GLuint);
        bind_texture_unit: "glBindTextureUnit" => fn(unit: GLuint, texture: GLuint);
        create_vertex_arrays: "glCreateVertexArrays" => fn(n: GLsizei, arrays: *mut GLuint);
        vertex_array_vertex_buffer: "glVertexArrayVertexBuffer" => fn(
            vaobj: GLuint,
            binding_index: GLuint,
            buffer: GLuint,
            offset: GLintptr,
            stride: GLsizei,
        );
        vertex_array_element_buffer: "glVertexArrayElementBuffer" => fn(vaobj: GLuint, buffer: GLuint);
        enable_vertex_array_attrib: "glEnableVertexArrayAttrib" => fn(vaobj: GLuint, index: GLuint);
        vertex_array_attrib_format: "glVertexArrayAttribFormat" => fn(
            vaobj: GLuint,
            attrib_index: GLuint,
            size: GLint,
            data_type: GLenum,
            normalized: GLboolean,
            relative_offset: GLuint,
        );
        vertex_array_attrib_iformat: "glVertexArrayAttribIFormat" => fn(
            vaobj: GLuint,
            attrib_index: GLuint,
            size: GLint,
            data_type: GLenum,
            relative_offset: GLuint,
        );
        vertex_array_attrib_binding: "glVertexArrayAttribBinding" => fn(
            vaobj: GLuint,
            attrib_index: GLuint,
            binding_index: GLuint,
        );
        vertex_array_binding_divisor: "glVertexArrayBindingDivisor" => fn(
            vaobj: GLuint,
            binding_index: GLuint,
            divisor: GLuint,
        );
        create_framebuffers: "glCreateFramebuffers" => fn(n: GLsizei, framebuffers: *mut GLuint);
        named_framebuffer_texture: "glNamedFramebufferTexture" => fn(
            framebuffer: GLuint,
            attachment: GLenum,
            texture: GLuint,
            level: GLint,
        );
        named_framebuffer_draw_buffers: "glNamedFramebufferDrawBuffers" => fn(
            framebuffer: GLuint,
            n: GLsizei,
            bufs: *const GLenum,
        );
        check_named_framebuffer_status: "glCheckNamedFramebufferStatus" => fn(
            framebuffer: GLuint,
            target: GLenum,
        ) -> GLenum;
        create_samplers: "glCreateSamplers" => fn(n: GLsizei, samplers: *mut GLuint);
    }
}
version_floor!(DirectStateAccessFunctions, desktop: Some((4, 5)), es: None);

entry_points! {
    /// `WGL_EXT_swap_control`.
    pub struct SwapControlFunctions {
        swap_interval: "wglSwapIntervalEXT" => fn(interval: GLint) -> GLint;
    }
}
