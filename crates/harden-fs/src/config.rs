//! Format-agnostic configuration loading

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::{Error, Result, io};

/// Format-agnostic configuration store.
///
/// Detects the format from the file extension and deserializes
/// transparently. Used for hardening profiles.
#[derive(Debug, Default)]
pub struct ConfigStore;

impl ConfigStore {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = io::read_text(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        Self::parse(path, &extension, &content)
    }

    /// Parse already-loaded content as the given format.
    ///
    /// `origin` is only used for error reporting.
    pub fn parse<T: DeserializeOwned>(origin: &Path, format: &str, content: &str) -> Result<T> {
        let parse_error = |format: &str, message: String| Error::ConfigParse {
            path: origin.to_path_buf(),
            format: format.into(),
            message,
        };

        match format {
            "toml" => toml::from_str(content).map_err(|e| parse_error("TOML", e.to_string())),
            "json" => {
                serde_json::from_str(content).map_err(|e| parse_error("JSON", e.to_string()))
            }
            "yaml" | "yml" => {
                serde_yaml::from_str(content).map_err(|e| parse_error("YAML", e.to_string()))
            }
            other => Err(Error::UnsupportedFormat {
                extension: other.to_string(),
            }),
        }
    }
}
