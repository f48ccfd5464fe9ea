// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Collaborator services the RHI consumes from the rest of the engine.
//!
//! Only the boundary contracts live here; the engine's own string, file and
//! logging layers implement them.

use std::io::Read;
use std::path::Path;

use crate::{Result, RhiError};

/// File access used for configuration and shader sources.
pub trait FileManager {
    fn does_file_exist(&self, path: &Path) -> bool;

    /// Open a file for reading. Dropping the reader closes it.
    fn open(&self, path: &Path) -> Result<Box<dyn Read>>;

    fn read_to_string(&self, path: &Path) -> Result<String> {
        let mut reader = self.open(path)?;
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        Ok(content)
    }
}

/// [`FileManager`] backed by the host file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFileManager;

impl FileManager for StdFileManager {
    fn does_file_exist(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn open(&self, path: &Path) -> Result<Box<dyn Read>> {
        let file = std::fs::File::open(path).map_err(|e| {
            RhiError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Ok(Box::new(file))
    }
}

/// Split `text` on any character of `delimiters`, skipping empty tokens.
pub fn tokenize<'a>(text: &'a str, delimiters: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    text.split(move |c: char| delimiters.contains(c))
        .filter(|token| !token.is_empty())
}
