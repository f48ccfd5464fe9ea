// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Platform loaders backed by `libloading`.

use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use foundry_rhi::{Result, RhiBackend, RhiConfig, RhiError};
use khronos_egl as egl;
use libloading::Library;

use super::{PlatformLoader, SymbolLibrary};

type WglGetProcAddress = unsafe extern "system" fn(*const c_char) -> *mut c_void;
type WglGetCurrentDc = unsafe extern "system" fn() -> *mut c_void;
type WglGetExtensionsStringArb = unsafe extern "system" fn(*mut c_void) -> *const c_char;
type GlxGetProcAddress = unsafe extern "C" fn(*const u8) -> *mut c_void;
type GlxGetCurrentDisplay = unsafe extern "C" fn() -> *mut c_void;
type GlxGetClientString = unsafe extern "C" fn(*mut c_void, c_int) -> *const c_char;

const GLX_EXTENSIONS: c_int = 3;

/// Window-system binding the library is reached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlFlavor {
    /// `opengl32.dll` + `wglGetProcAddress`.
    Wgl,
    /// `libGL.so` + `glXGetProcAddressARB`.
    Glx,
    /// `libGLESv2.so` + `eglGetProcAddress`.
    Egl,
}

impl GlFlavor {
    pub fn library_names(self) -> &'static [&'static str] {
        match self {
            Self::Wgl => &["opengl32.dll"],
            Self::Glx => &["libGL.so.1", "libGL.so"],
            Self::Egl => &["libGLESv2.so.2", "libGLESv2.so"],
        }
    }
}

/// Opens the system graphics library for one [`GlFlavor`].
#[derive(Debug, Clone)]
pub struct NativeLoader {
    flavor: GlFlavor,
    library_path: Option<PathBuf>,
}

impl NativeLoader {
    pub fn new(flavor: GlFlavor) -> Self {
        Self {
            flavor,
            library_path: None,
        }
    }

    /// Load exactly this file instead of the flavor's probe list.
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn flavor(&self) -> GlFlavor {
        self.flavor
    }
}

impl PlatformLoader for NativeLoader {
    fn library_names(&self) -> Vec<PathBuf> {
        match &self.library_path {
            Some(path) => vec![path.clone()],
            None => self
                .flavor
                .library_names()
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }

    fn open(&self, path: &Path) -> Result<Box<dyn SymbolLibrary>> {
        // SAFETY: the system GL library has no initialisers with
        // preconditions beyond being loaded once per process.
        let library = unsafe { Library::new(path) }.map_err(|e| RhiError::LibraryNotFound {
            names: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let proc_address = match self.flavor {
            GlFlavor::Wgl => ProcAddress::Wgl {
                // SAFETY: signatures match the documented WGL exports.
                get_proc_address: unsafe { copy_symbol(&library, "wglGetProcAddress") },
                get_current_dc: unsafe { copy_symbol(&library, "wglGetCurrentDC") },
            },
            GlFlavor::Glx => ProcAddress::Glx {
                // SAFETY: signatures match the documented GLX exports.
                get_proc_address: unsafe { copy_symbol(&library, "glXGetProcAddressARB") },
                get_current_display: unsafe { copy_symbol(&library, "glXGetCurrentDisplay") },
                get_client_string: unsafe { copy_symbol(&library, "glXGetClientString") },
            },
            // SAFETY: libEGL is the system EGL implementation.
            GlFlavor::Egl => match unsafe { egl::DynamicInstance::<egl::EGL1_4>::load_required() } {
                Ok(instance) => ProcAddress::Egl(Some(instance)),
                Err(e) => {
                    tracing::warn!("libEGL unavailable, only direct exports resolve: {}", e);
                    ProcAddress::Egl(None)
                }
            },
        };

        Ok(Box::new(NativeLibrary {
            proc_address,
            library,
        }))
    }
}

/// Copy a function pointer out of `library`.
///
/// # Safety
/// `F` must be the exact signature of the export.
unsafe fn copy_symbol<F: Copy>(library: &Library, name: &str) -> Option<F> {
    // SAFETY: the caller names the export's exact signature.
    unsafe { library.get::<F>(name.as_bytes()) }.ok().map(|symbol| *symbol)
}

enum ProcAddress {
    Wgl {
        get_proc_address: Option<WglGetProcAddress>,
        get_current_dc: Option<WglGetCurrentDc>,
    },
    Glx {
        get_proc_address: Option<GlxGetProcAddress>,
        get_current_display: Option<GlxGetCurrentDisplay>,
        get_client_string: Option<GlxGetClientString>,
    },
    Egl(Option<egl::DynamicInstance<egl::EGL1_4>>),
}

struct NativeLibrary {
    proc_address: ProcAddress,
    // Declared last: dropped after every pointer copied out of it.
    library: Library,
}

// SAFETY: the library handle and the EGL instance are immutable after
// construction; the platform entry points are thread-safe lookups.
unsafe impl Send for NativeLibrary {}
unsafe impl Sync for NativeLibrary {}

impl SymbolLibrary for NativeLibrary {
    fn symbol(&self, name: &str) -> Option<NonNull<c_void>> {
        // SAFETY: the address is only reinterpreted by the typed tables.
        let symbol = unsafe { self.library.get::<*mut c_void>(name.as_bytes()) }.ok()?;
        NonNull::new(*symbol)
    }

    fn proc_address(&self, name: &str) -> Option<NonNull<c_void>> {
        match &self.proc_address {
            ProcAddress::Wgl {
                get_proc_address, ..
            } => {
                let name = CString::new(name).ok()?;
                // SAFETY: NUL-terminated name; requires a current context.
                let ptr = unsafe { (*get_proc_address)?(name.as_ptr()) };
                // wglGetProcAddress reports failure with these sentinels.
                match ptr as isize {
                    -1 | 0 | 1 | 2 | 3 => None,
                    _ => NonNull::new(ptr),
                }
            }
            ProcAddress::Glx {
                get_proc_address, ..
            } => {
                let name = CString::new(name).ok()?;
                // SAFETY: NUL-terminated name.
                NonNull::new(unsafe { (*get_proc_address)?(name.as_ptr().cast()) })
            }
            ProcAddress::Egl(instance) => {
                let function = instance.as_ref()?.get_proc_address(name)?;
                NonNull::new(function as *mut c_void)
            }
        }
    }

    fn platform_extensions(&self) -> Option<String> {
        match &self.proc_address {
            ProcAddress::Wgl { get_current_dc, .. } => {
                let get_extensions = self.proc_address("wglGetExtensionsStringARB")?;
                // SAFETY: wglGetExtensionsStringARB has this signature.
                let get_extensions = unsafe {
                    std::mem::transmute::<*mut c_void, WglGetExtensionsStringArb>(
                        get_extensions.as_ptr(),
                    )
                };
                // SAFETY: both calls only read the current context's state.
                unsafe {
                    let dc = (*get_current_dc)?();
                    owned_string(get_extensions(dc))
                }
            }
            ProcAddress::Glx {
                get_current_display,
                get_client_string,
                ..
            } => {
                // SAFETY: reads the display of the current context.
                unsafe {
                    let display = (*get_current_display)?();
                    if display.is_null() {
                        return None;
                    }
                    owned_string((*get_client_string)?(display, GLX_EXTENSIONS))
                }
            }
            ProcAddress::Egl(instance) => {
                let instance = instance.as_ref()?;
                let display = instance.get_current_display();
                let extensions = instance.query_string(display, egl::EXTENSIONS).ok()?;
                Some(extensions.to_string_lossy().into_owned())
            }
        }
    }
}

/// # Safety
/// `ptr` must be null or a NUL-terminated string.
unsafe fn owned_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null and NUL-terminated per the caller.
    let text = unsafe { CStr::from_ptr(ptr) };
    Some(text.to_string_lossy().into_owned())
}

/// Loader for `backend` on this platform, honouring `config.library_path`.
pub fn default_platform_loader(backend: RhiBackend, config: &RhiConfig) -> Box<dyn PlatformLoader> {
    let flavor = match backend {
        RhiBackend::OpenGlEs3 => GlFlavor::Egl,
        RhiBackend::OpenGl if cfg!(target_os = "windows") => GlFlavor::Wgl,
        RhiBackend::OpenGl => GlFlavor::Glx,
    };

    let mut loader = NativeLoader::new(flavor);
    if let Some(path) = &config.library_path {
        loader = loader.with_library_path(path);
    }
    tracing::debug!("Using {:?} loader for {}", flavor, backend);
    Box::new(loader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_probe_list() {
        let loader = NativeLoader::new(GlFlavor::Glx).with_library_path("/opt/mesa/libGL.so.1");
        assert_eq!(
            loader.library_names(),
            vec![PathBuf::from("/opt/mesa/libGL.so.1")]
        );
    }

    #[test]
    fn test_probe_lists() {
        let names = NativeLoader::new(GlFlavor::Egl).library_names();
        assert_eq!(
            names,
            vec![
                PathBuf::from("libGLESv2.so.2"),
                PathBuf::from("libGLESv2.so")
            ]
        );
        assert_eq!(GlFlavor::Wgl.library_names(), &["opengl32.dll"]);
    }

    #[test]
    fn test_open_nonexistent_path_fails() {
        let loader = NativeLoader::new(GlFlavor::Glx);
        let result = loader.open(Path::new("/nonexistent/foundry/libGL.so.1"));
        assert!(matches!(result, Err(RhiError::LibraryNotFound { .. })));
    }

    #[test]
    fn test_default_loader_follows_backend() {
        let config = RhiConfig {
            library_path: Some(PathBuf::from("/custom/libGLESv2.so")),
            ..RhiConfig::default()
        };
        let loader = default_platform_loader(RhiBackend::OpenGlEs3, &config);
        assert_eq!(
            loader.library_names(),
            vec![PathBuf::from("/custom/libGLESv2.so")]
        );
    }
}
