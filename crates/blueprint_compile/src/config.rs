//! Configuration sources for entities built from external data.
//!
//! A source is an inline mapping, a file, or both. A non-empty inline
//! mapping wins over the file. Files are JSON when their extension says so
//! and YAML otherwise.

use blueprint_core::{BlueprintError, BlueprintResult};
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where an entity's configuration comes from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigSource {
    inline: Option<Value>,
    file: Option<PathBuf>,
}

impl ConfigSource {
    /// Source with neither inline data nor a file
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Inline configuration
    #[must_use]
    pub fn inline(config: Value) -> Self {
        Self {
            inline: Some(config),
            file: None,
        }
    }

    /// Configuration file
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            inline: None,
            file: Some(path.into()),
        }
    }

    /// Add a file to fall back on when the inline mapping is empty
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Load the configuration mapping
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::MissingConfiguration`] if neither source is
    /// usable, [`BlueprintError::TypeMismatch`] if the result is not a
    /// mapping, or a file error.
    pub fn load(&self, entity: &str) -> BlueprintResult<Map<String, Value>> {
        let config = match (&self.inline, &self.file) {
            (Some(inline), _) if !is_empty(inline) => inline.clone(),
            (_, Some(path)) => read_spec(path)?,
            _ => {
                return Err(BlueprintError::MissingConfiguration {
                    entity: entity.to_string(),
                });
            }
        };

        debug!(entity, config = %config, "loaded configuration");
        match config {
            Value::Object(map) => Ok(map),
            other => Err(BlueprintError::TypeMismatch {
                entity: entity.to_string(),
                found: type_name(&other).to_string(),
            }),
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Read a YAML or JSON file into a value
///
/// # Errors
///
/// Returns [`BlueprintError::NotFound`] if the file does not exist and
/// [`BlueprintError::ParseError`] if it cannot be read or parsed.
pub fn read_spec(path: &Path) -> BlueprintResult<Value> {
    let display = path.display().to_string();
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => BlueprintError::NotFound {
            path: display.clone(),
        },
        _ => BlueprintError::ParseError {
            path: display.clone(),
            message: err.to_string(),
        },
    })?;

    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed: Result<Value, String> = if is_json {
        serde_json::from_str(&text).map_err(|err| err.to_string())
    } else {
        serde_yaml::from_str(&text).map_err(|err| err.to_string())
    };
    parsed.map_err(|message| BlueprintError::ParseError {
        path: display,
        message,
    })
}
