//! Free-text analysis instructions supplied by the user.
//!
//! The text is embedded verbatim in AI prompts and never parsed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;

pub trait InstructionStore: Send + Sync {
    /// Current instructions, or `None` when unset or blank.
    fn load(&self) -> Result<Option<String>, ConfigError>;

    fn save(&self, text: &str) -> Result<(), ConfigError>;

    fn clear(&self) -> Result<(), ConfigError>;
}

/// UTF-8 text file store.
#[derive(Debug, Clone)]
pub struct FileInstructionStore {
    path: PathBuf,
}

impl FileInstructionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ConfigError {
        ConfigError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl InstructionStore for FileInstructionStore {
    fn load(&self) -> Result<Option<String>, ConfigError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(None),
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, text: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.path, text).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), ConfigError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
