// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! RHI backend selection with runtime resolution.
//!
//! The backend can be selected at runtime via:
//! 1. Explicit parameter passed to `RhiBackend::resolve()`
//! 2. `FOUNDRY_RHI_BACKEND` environment variable
//! 3. Platform default (desktop OpenGL, OpenGL ES 3 on mobile)

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// RHI backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RhiBackend {
    /// Desktop OpenGL (core profile, 3.3 and newer).
    #[serde(rename = "opengl")]
    OpenGl,
    /// OpenGL ES 3.0 and newer.
    #[serde(rename = "opengles3")]
    OpenGlEs3,
}

impl RhiBackend {
    /// Environment variable name for backend override.
    pub const ENV_VAR: &'static str = "FOUNDRY_RHI_BACKEND";

    /// Resolve the backend to use.
    ///
    /// Resolution priority:
    /// 1. Explicit value (if provided)
    /// 2. `FOUNDRY_RHI_BACKEND` environment variable
    /// 3. Platform default
    pub fn resolve(explicit: Option<Self>) -> Self {
        if let Some(backend) = explicit {
            return backend;
        }

        if let Ok(env_value) = std::env::var(Self::ENV_VAR) {
            match env_value.parse() {
                Ok(backend) => return backend,
                Err(e) => tracing::warn!("Ignoring {}: {}", Self::ENV_VAR, e),
            }
        }

        Self::platform_default()
    }

    /// Get the platform default backend.
    #[cfg(any(target_os = "android", target_os = "ios"))]
    pub fn platform_default() -> Self {
        Self::OpenGlEs3
    }

    /// Get the platform default backend.
    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    pub fn platform_default() -> Self {
        Self::OpenGl
    }

    /// Check if this backend can be loaded on the current platform.
    pub fn is_available(&self) -> bool {
        match self {
            Self::OpenGl => cfg!(any(target_os = "windows", target_os = "linux")),
            Self::OpenGlEs3 => cfg!(any(
                target_os = "linux",
                target_os = "android",
                target_os = "windows"
            )),
        }
    }

    /// Whether this backend speaks the embedded (ES) dialect.
    pub fn is_embedded(&self) -> bool {
        matches!(self, Self::OpenGlEs3)
    }

    /// Get the backend name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenGl => "opengl",
            Self::OpenGlEs3 => "opengles3",
        }
    }
}

impl FromStr for RhiBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "opengl" | "gl" => Ok(Self::OpenGl),
            "opengles3" | "gles3" | "gles" => Ok(Self::OpenGlEs3),
            _ => Err(format!(
                "Unknown backend '{}'. Valid values: opengl, opengles3",
                s
            )),
        }
    }
}

impl std::fmt::Display for RhiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("opengl".parse::<RhiBackend>().unwrap(), RhiBackend::OpenGl);
        assert_eq!("GL".parse::<RhiBackend>().unwrap(), RhiBackend::OpenGl);
        assert_eq!(
            "opengles3".parse::<RhiBackend>().unwrap(),
            RhiBackend::OpenGlEs3
        );
        assert_eq!("gles".parse::<RhiBackend>().unwrap(), RhiBackend::OpenGlEs3);
        assert!("vulkan".parse::<RhiBackend>().is_err());
    }

    #[test]
    fn test_resolve_explicit() {
        assert_eq!(
            RhiBackend::resolve(Some(RhiBackend::OpenGlEs3)),
            RhiBackend::OpenGlEs3
        );
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for backend in [RhiBackend::OpenGl, RhiBackend::OpenGlEs3] {
            assert_eq!(backend.to_string().parse::<RhiBackend>().unwrap(), backend);
        }
    }
}
