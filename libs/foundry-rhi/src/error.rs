// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

/// Shader stage named in compilation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vertex => write!(f, "vertex"),
            Self::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Error, Debug)]
pub enum RhiError {
    #[error("Graphics library not found (tried {names}): {reason}")]
    LibraryNotFound { names: String, reason: String },

    #[error("Graphics library is not loaded")]
    NotLoaded,

    #[error("Missing entry point: {symbol}")]
    MissingSymbol { symbol: String },

    #[error("Unsupported API version: requires {required}, found {found}")]
    UnsupportedVersion { required: String, found: String },

    #[error("Graphics backend unavailable on this host: {0}")]
    BackendUnavailable(String),

    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompilation { stage: ShaderStage, log: String },

    #[error("Program link failed: {log}")]
    ProgramLink { log: String },

    #[error("Framebuffer incomplete (status 0x{status:04X})")]
    IncompleteFramebuffer { status: u32 },

    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    #[error("Operation not supported: {0}")]
    NotSupported(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RhiError {
    /// Whether this error aborts RHI initialization (no instance is produced).
    pub fn is_fatal_at_init(&self) -> bool {
        matches!(
            self,
            Self::LibraryNotFound { .. }
                | Self::NotLoaded
                | Self::MissingSymbol { .. }
                | Self::UnsupportedVersion { .. }
                | Self::BackendUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RhiError>;
