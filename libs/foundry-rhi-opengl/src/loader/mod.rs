// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Runtime linking of the platform graphics library.
//!
//! Nothing is linked at build time: the library is opened by name, the core
//! table is resolved first, and the version-gated bundles are resolved once
//! the context version is known.

mod dynamic;

pub use dynamic::{default_platform_loader, GlFlavor, NativeLoader};

use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use foundry_rhi::{Result, RhiError};

use crate::entry_points::*;
use crate::native::GlVersion;

/// One opened native library.
pub trait SymbolLibrary: Send + Sync {
    /// Direct export lookup.
    fn symbol(&self, name: &str) -> Option<NonNull<c_void>>;

    /// Lookup through the platform's context proc-address mechanism.
    fn proc_address(&self, name: &str) -> Option<NonNull<c_void>>;

    /// Window-system extension string (WGL/GLX/EGL), when obtainable.
    fn platform_extensions(&self) -> Option<String> {
        None
    }
}

/// Knows which libraries to probe on this platform and how to open them.
pub trait PlatformLoader: Send + Sync {
    /// Candidate library names, in probe order.
    fn library_names(&self) -> Vec<PathBuf>;

    fn open(&self, path: &Path) -> Result<Box<dyn SymbolLibrary>>;
}

/// Entry points resolved against the context version.
#[derive(Debug, Clone, Copy)]
pub struct VersionGatedFunctions {
    pub gl3: Gl3Functions,
    pub draw_base_vertex: Option<DrawBaseVertexFunctions>,
    pub tessellation: Option<TessellationFunctions>,
    pub draw_indirect: Option<DrawIndirectFunctions>,
    pub texture_storage: Option<TextureStorageFunctions>,
    pub base_instance: Option<BaseInstanceFunctions>,
    pub multi_draw_indirect: Option<MultiDrawIndirectFunctions>,
    pub debug: Option<DebugFunctions>,
    pub clip_control: Option<ClipControlFunctions>,
    pub direct_state_access: Option<DirectStateAccessFunctions>,
}

/// Owns the loaded library and the entry-point tables resolved from it.
pub struct RuntimeLinking {
    loader: Box<dyn PlatformLoader>,
    library: Option<Arc<dyn SymbolLibrary>>,
    library_path: Option<PathBuf>,
    core: Option<CoreFunctions>,
    version_gated: Option<VersionGatedFunctions>,
}

impl RuntimeLinking {
    pub fn new(loader: Box<dyn PlatformLoader>) -> Self {
        Self {
            loader,
            library: None,
            library_path: None,
            core: None,
            version_gated: None,
        }
    }

    /// Open the first library of the probe list that loads.
    pub fn load_shared_library(&mut self) -> Result<()> {
        if self.library.is_some() {
            return Ok(());
        }

        let names = self.loader.library_names();
        let mut last_error = String::from("no candidate library names");
        for path in &names {
            match self.loader.open(path) {
                Ok(library) => {
                    tracing::info!("Loaded graphics library {}", path.display());
                    self.library = Some(Arc::from(library));
                    self.library_path = Some(path.clone());
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!("Could not load {}: {}", path.display(), e);
                    last_error = e.to_string();
                }
            }
        }

        Err(RhiError::LibraryNotFound {
            names: names
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            reason: last_error,
        })
    }

    /// Resolve one symbol: direct export first, then the proc-address mechanism.
    pub fn lookup(&self, name: &str) -> Option<NonNull<c_void>> {
        let library = self.library.as_ref()?;
        library.symbol(name).or_else(|| library.proc_address(name))
    }

    /// Resolve any table against the loaded library.
    pub fn resolve<T: EntryPointBundle>(&self) -> Result<T> {
        if self.library.is_none() {
            return Err(RhiError::NotLoaded);
        }
        T::resolve(&|name| self.lookup(name))
    }

    pub fn resolve_core_entry_points(&mut self) -> Result<&CoreFunctions> {
        let core = self.resolve::<CoreFunctions>()?;
        tracing::debug!("Resolved {} core entry points", CoreFunctions::SYMBOLS.len());
        Ok(self.core.insert(core))
    }

    /// Resolve the floor bundle and every optional bundle that is core in
    /// `version`. Bundles above the version are left unresolved.
    pub fn resolve_version_gated_entry_points(
        &mut self,
        version: GlVersion,
    ) -> Result<&VersionGatedFunctions> {
        if self.library.is_none() {
            return Err(RhiError::NotLoaded);
        }
        if !Gl3Functions::FLOOR.is_core_in(version) {
            return Err(RhiError::UnsupportedVersion {
                required: "OpenGL 3.3 or OpenGL ES 3.0".to_string(),
                found: version.to_string(),
            });
        }

        let functions = VersionGatedFunctions {
            gl3: self.resolve()?,
            draw_base_vertex: self.resolve_gated(version)?,
            tessellation: self.resolve_gated(version)?,
            draw_indirect: self.resolve_gated(version)?,
            texture_storage: self.resolve_gated(version)?,
            base_instance: self.resolve_gated(version)?,
            multi_draw_indirect: self.resolve_gated(version)?,
            debug: self.resolve_gated(version)?,
            clip_control: self.resolve_gated(version)?,
            direct_state_access: self.resolve_gated(version)?,
        };
        Ok(self.version_gated.insert(functions))
    }

    fn resolve_gated<T: VersionGated>(&self, version: GlVersion) -> Result<Option<T>> {
        if !T::FLOOR.is_core_in(version) {
            tracing::trace!(
                "{} is not core in {}, skipping",
                std::any::type_name::<T>(),
                version
            );
            return Ok(None);
        }
        self.resolve().map(Some)
    }

    pub fn is_loaded(&self) -> bool {
        self.library.is_some()
    }

    pub fn library(&self) -> Option<Arc<dyn SymbolLibrary>> {
        self.library.clone()
    }

    pub fn library_path(&self) -> Option<&Path> {
        self.library_path.as_deref()
    }

    pub fn core(&self) -> Option<&CoreFunctions> {
        self.core.as_ref()
    }

    pub fn version_gated(&self) -> Option<&VersionGatedFunctions> {
        self.version_gated.as_ref()
    }

    pub fn platform_extensions(&self) -> Option<String> {
        self.library.as_ref()?.platform_extensions()
    }

    /// Drop every table, then the library. Safe to call repeatedly.
    pub fn unload(&mut self) {
        self.version_gated = None;
        self.core = None;
        if self.library.take().is_some() {
            if let Some(path) = self.library_path.take() {
                tracing::debug!("Released graphics library {}", path.display());
            }
        }
    }
}

impl Drop for RuntimeLinking {
    fn drop(&mut self) {
        self.unload();
    }
}

impl std::fmt::Debug for RuntimeLinking {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeLinking")
            .field("library_path", &self.library_path)
            .field("core", &self.core.is_some())
            .field("version_gated", &self.version_gated.is_some())
            .finish()
    }
}
