//! Error types for preset operations.
//!
//! Only the preset/configuration layer surfaces errors. Engine note and
//! control operations degrade to no-ops by contract — a live performance
//! must not crash on a bad lookup.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur loading or saving presets.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Failed to read a preset file
    #[error("failed to read preset '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a preset file
    #[error("failed to write preset '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Factory preset name not recognized
    #[error("preset not found: {0}")]
    PresetNotFound(String),
}

impl PresetError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PresetError::WriteFile {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = PresetError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, PresetError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn io_wrapping_variants_expose_source() {
        assert!(
            PresetError::read_file("/x", mock_io_err()).source().is_some(),
            "ReadFile must expose I/O source"
        );
        assert!(
            PresetError::write_file("/x", mock_io_err()).source().is_some(),
            "WriteFile must expose I/O source"
        );
    }

    #[test]
    fn not_found_display() {
        let err = PresetError::PresetNotFound("warm_pad".to_string());
        assert_eq!(err.to_string(), "preset not found: warm_pad");
        assert!(err.source().is_none());
    }
}
