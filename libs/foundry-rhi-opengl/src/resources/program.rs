// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use std::ffi::CString;
use std::sync::Arc;

use foundry_rhi::{Result, RhiError, ShaderStage};

use super::{ContainerObject, GlDevice, ObjectKind};
use crate::entry_points::CoreFunctions;
use crate::native::{GLchar, GLenum, GLint, GLsizei, GLuint};

/// Linked vertex + fragment program.
#[derive(Debug)]
pub struct Program {
    object: ContainerObject,
    draw_id_location: Option<GLint>,
}

/// Shader object alive only while its program links.
struct Shader<'a> {
    core: &'a CoreFunctions,
    name: GLuint,
}

impl Drop for Shader<'_> {
    fn drop(&mut self) {
        // SAFETY: the name was created by `compile` and is deleted once.
        unsafe { (self.core.delete_shader)(self.name) };
    }
}

fn info_log(
    name: GLuint,
    get_iv: unsafe extern "system" fn(GLuint, GLenum, *mut GLint),
    get_log: unsafe extern "system" fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
) -> String {
    let mut length: GLint = 0;
    // SAFETY: the buffer is sized from GL_INFO_LOG_LENGTH.
    unsafe {
        get_iv(name, gl::INFO_LOG_LENGTH, &mut length);
        if length <= 0 {
            return String::new();
        }
        let mut buffer = vec![0u8; length as usize];
        let mut written: GLsizei = 0;
        get_log(name, length, &mut written, buffer.as_mut_ptr().cast());
        buffer.truncate(written.clamp(0, length) as usize);
        String::from_utf8_lossy(&buffer).trim_end().to_string()
    }
}

fn compile<'a>(core: &'a CoreFunctions, stage: ShaderStage, source: &str) -> Result<Shader<'a>> {
    let kind = match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    };

    // SAFETY: source pointer and length describe `source` for the call.
    unsafe {
        let name = (core.create_shader)(kind);
        if name == 0 {
            return Err(RhiError::ResourceCreation(format!(
                "driver returned no {} shader name",
                stage
            )));
        }
        let shader = Shader { core, name };

        let ptr = source.as_ptr().cast::<GLchar>();
        let length = source.len() as GLint;
        (core.shader_source)(name, 1, &ptr, &length);
        (core.compile_shader)(name);

        let mut status: GLint = 0;
        (core.get_shaderiv)(name, gl::COMPILE_STATUS, &mut status);
        if status == 0 {
            let log = info_log(name, core.get_shaderiv, core.get_shader_info_log);
            return Err(RhiError::ShaderCompilation { stage, log });
        }
        Ok(shader)
    }
}

impl Program {
    /// Compile and link. `draw_id_uniform` names the uniform that receives
    /// the start instance when base-instance draws are emulated.
    pub fn create(
        device: &Arc<GlDevice>,
        vertex_source: &str,
        fragment_source: &str,
        draw_id_uniform: Option<&str>,
    ) -> Result<Self> {
        let core = device.core();
        let vertex = compile(core, ShaderStage::Vertex, vertex_source)?;
        let fragment = compile(core, ShaderStage::Fragment, fragment_source)?;

        // SAFETY: shaders and program are owned by this call until returned.
        unsafe {
            let name = (core.create_program)();
            if name == 0 {
                return Err(RhiError::ResourceCreation(
                    "driver returned no program name".to_string(),
                ));
            }
            let object = ContainerObject::new(device, ObjectKind::Program, name);

            (core.attach_shader)(name, vertex.name);
            (core.attach_shader)(name, fragment.name);
            (core.link_program)(name);

            let mut status: GLint = 0;
            (core.get_programiv)(name, gl::LINK_STATUS, &mut status);
            if status == 0 {
                let log = info_log(name, core.get_programiv, core.get_program_info_log);
                return Err(RhiError::ProgramLink { log });
            }

            let draw_id_location = match draw_id_uniform {
                Some(uniform) => {
                    let uniform = CString::new(uniform).map_err(|_| {
                        RhiError::Configuration(format!("uniform name {:?} contains NUL", uniform))
                    })?;
                    let location = (core.get_uniform_location)(name, uniform.as_ptr());
                    (location >= 0).then_some(location)
                }
                None => None,
            };

            Ok(Self {
                object,
                draw_id_location,
            })
        }
    }

    pub fn object(&self) -> &ContainerObject {
        &self.object
    }

    /// Location of the draw-ID uniform, when the program declares it.
    pub fn draw_id_location(&self) -> Option<GLint> {
        self.draw_id_location
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};

    const VS: &str = "#version 330 core\nvoid main() {}";
    const FS: &str = "#version 330 core\nvoid main() {}";

    #[test]
    fn test_compile_failure_carries_driver_log() {
        let mut state = FakeDriverState::desktop(4, 6);
        state.compile_ok = false;
        state.info_log = "0:2: 'foo' : undeclared identifier".into();
        let device = fake_device(state);

        let err = Program::create(&device, VS, FS, None).unwrap_err();
        match err {
            RhiError::ShaderCompilation { stage, log } => {
                assert_eq!(stage, ShaderStage::Vertex);
                assert_eq!(log, "0:2: 'foo' : undeclared identifier");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(with_driver(|d| d.live_count("shader")), 0);
    }

    #[test]
    fn test_link_failure_releases_everything() {
        let mut state = FakeDriverState::desktop(4, 6);
        state.link_ok = false;
        state.info_log = "varying mismatch".into();
        let device = fake_device(state);

        let err = Program::create(&device, VS, FS, None).unwrap_err();
        assert!(matches!(err, RhiError::ProgramLink { ref log } if log == "varying mismatch"));
        with_driver(|d| {
            assert_eq!(d.live_count("shader"), 0);
            assert_eq!(d.live_count("program"), 0);
        });
    }

    #[test]
    fn test_draw_id_location() {
        let mut state = FakeDriverState::desktop(4, 6);
        state.uniforms = vec!["drawIdUniform".into()];
        let device = fake_device(state);

        let program = Program::create(&device, VS, FS, Some("drawIdUniform")).unwrap();
        assert_eq!(program.draw_id_location(), Some(0));
        let program = Program::create(&device, VS, FS, Some("missing")).unwrap();
        assert_eq!(program.draw_id_location(), None);
        assert_eq!(with_driver(|d| d.live_count("shader")), 0);
    }
}
