// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Driver debug output forwarded into `tracing`.

use std::ffi::{c_void, CStr};

use crate::native::{GLchar, GLenum, GLsizei, GLuint};
use crate::resources::GlDevice;

/// Log level a driver message is forwarded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugLevel {
    Error,
    Warn,
    Info,
    Debug,
}

pub fn severity_level(severity: GLenum) -> DebugLevel {
    match severity {
        gl::DEBUG_SEVERITY_HIGH => DebugLevel::Error,
        gl::DEBUG_SEVERITY_MEDIUM => DebugLevel::Warn,
        gl::DEBUG_SEVERITY_LOW => DebugLevel::Info,
        _ => DebugLevel::Debug,
    }
}

fn source_name(source: GLenum) -> &'static str {
    match source {
        gl::DEBUG_SOURCE_API => "api",
        gl::DEBUG_SOURCE_WINDOW_SYSTEM => "window-system",
        gl::DEBUG_SOURCE_SHADER_COMPILER => "shader-compiler",
        gl::DEBUG_SOURCE_THIRD_PARTY => "third-party",
        gl::DEBUG_SOURCE_APPLICATION => "application",
        _ => "other",
    }
}

pub(crate) extern "system" fn debug_message(
    source: GLenum,
    _gltype: GLenum,
    id: GLuint,
    severity: GLenum,
    length: GLsizei,
    message: *const GLchar,
    _user_param: *mut c_void,
) {
    if message.is_null() {
        return;
    }
    // SAFETY: the driver passes `length` bytes, or a NUL-terminated string
    // when `length` is negative.
    let text = unsafe {
        if length >= 0 {
            let bytes = std::slice::from_raw_parts(message.cast::<u8>(), length as usize);
            String::from_utf8_lossy(bytes).into_owned()
        } else {
            CStr::from_ptr(message).to_string_lossy().into_owned()
        }
    };
    let source = source_name(source);

    match severity_level(severity) {
        DebugLevel::Error => tracing::error!("[GL {} {}] {}", source, id, text),
        DebugLevel::Warn => tracing::warn!("[GL {} {}] {}", source, id, text),
        DebugLevel::Info => tracing::info!("[GL {} {}] {}", source, id, text),
        DebugLevel::Debug => tracing::debug!("[GL {} {}] {}", source, id, text),
    }
}

/// Route driver messages into the log. Returns `false` without debug output support.
pub fn install(device: &GlDevice) -> bool {
    let Some(debug) = device.capabilities().debug else {
        tracing::warn!("Debug output requested but neither KHR_debug nor GL 4.3 / ES 3.2 is available");
        return false;
    };
    let core = device.core();
    // SAFETY: the callback is a plain function and ignores the user pointer.
    unsafe {
        (core.enable)(gl::DEBUG_OUTPUT);
        (core.enable)(gl::DEBUG_OUTPUT_SYNCHRONOUS);
        (debug.debug_message_callback)(Some(debug_message), std::ptr::null());
    }
    tracing::debug!("Driver debug output enabled");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_device, with_driver, FakeDriverState};

    #[test]
    fn test_severity_mapping() {
        assert_eq!(severity_level(gl::DEBUG_SEVERITY_HIGH), DebugLevel::Error);
        assert_eq!(severity_level(gl::DEBUG_SEVERITY_MEDIUM), DebugLevel::Warn);
        assert_eq!(severity_level(gl::DEBUG_SEVERITY_LOW), DebugLevel::Info);
        assert_eq!(severity_level(gl::DEBUG_SEVERITY_NOTIFICATION), DebugLevel::Debug);
    }

    #[test]
    fn test_install_registers_callback() {
        let device = fake_device(FakeDriverState::desktop(4, 6));
        assert!(install(&device));
        with_driver(|d| {
            assert!(d.debug_callback.is_some());
            assert!(d.is_enabled(gl::DEBUG_OUTPUT_SYNCHRONOUS));
        });
    }

    #[test]
    fn test_install_without_support() {
        let device = fake_device(FakeDriverState::es(3, 0));
        assert!(!install(&device));
        assert_eq!(with_driver(|d| d.call_count("glEnable")), 0);
    }

    #[test]
    fn test_callback_accepts_both_length_forms() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
        let message = b"buffer 3 will use VIDEO memory\0";
        debug_message(
            gl::DEBUG_SOURCE_API,
            gl::DEBUG_TYPE_OTHER,
            131185,
            gl::DEBUG_SEVERITY_NOTIFICATION,
            -1,
            message.as_ptr().cast(),
            std::ptr::null_mut(),
        );
        debug_message(
            gl::DEBUG_SOURCE_SHADER_COMPILER,
            gl::DEBUG_TYPE_ERROR,
            1,
            gl::DEBUG_SEVERITY_HIGH,
            6,
            message.as_ptr().cast(),
            std::ptr::null_mut(),
        );
        debug_message(0, 0, 0, 0, 0, std::ptr::null(), std::ptr::null_mut());
    }
}
