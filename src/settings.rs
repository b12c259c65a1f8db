//! Layout persistence
//!
//! The UI library's persisted state (window positions, sizes, collapsed
//! headers) lives in one file inside a host-chosen directory. Its contents
//! are egui's own `Memory` serialization in RON, the encoding egui's native
//! shell uses for the same data, and are opaque to the overlay.

use crate::error::SettingsError;
use std::path::{Path, PathBuf};

/// Location of the persisted layout file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutFile {
    path: PathBuf,
}

impl LayoutFile {
    /// Layout file named `file_name` inside `dir`
    pub fn in_directory(dir: impl AsRef<Path>, file_name: &str) -> Self {
        Self {
            path: dir.as_ref().join(file_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a previously saved layout, `None` when nothing was saved yet
    pub fn load(&self) -> Result<Option<egui::Memory>, SettingsError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SettingsError::io(&self.path, e)),
        };

        ron::from_str(&text)
            .map(Some)
            .map_err(|source| SettingsError::LayoutDecode {
                path: self.path.clone(),
                source,
            })
    }

    /// Write the layout, creating the directory when needed
    pub fn save(&self, memory: &egui::Memory) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::io(parent, e))?;
        }

        let text = ron::ser::to_string_pretty(memory, ron::ser::PrettyConfig::default()).map_err(|source| {
            SettingsError::LayoutEncode {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, text).map_err(|e| SettingsError::io(&self.path, e))
    }
}
