//! Text normalization of numeric configuration values.
//!
//! A few wire fields are text even though authors naturally write numbers
//! for them (`product.version = 2`, `timeout_secs = 30`). Before validation
//! the compiler runs [`TextNormalization`] over the collected attributes and
//! renders those scalars as text. Absent fields are left absent.

use blueprint_core::{BlueprintError, BlueprintResult, SchemaKind};
use serde_json::{Map, Value};
use tracing::trace;

/// Attribute paths of a package that are always text on the wire
pub const PACKAGE_TEXT_PATHS: &[&str] = &["product.version", "checksum.value"];

/// Attribute paths of a task that are always text on the wire
pub const TASK_TEXT_PATHS: &[&str] = &["timeout_secs", "retries"];

/// Named normalization step that renders scalar values as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNormalization {
    kind: SchemaKind,
    paths: &'static [&'static str],
}

impl TextNormalization {
    /// Normalization applied to attributes of the given kind
    #[must_use]
    pub fn for_kind(kind: SchemaKind) -> Self {
        let paths = match kind {
            SchemaKind::VmDiskPackage => PACKAGE_TEXT_PATHS,
            SchemaKind::Task(_) => TASK_TEXT_PATHS,
            _ => &[],
        };
        Self { kind, paths }
    }

    /// Dotted paths this step normalizes
    #[must_use]
    pub fn paths(&self) -> &'static [&'static str] {
        self.paths
    }

    /// Normalize the attributes in place, returning the coerced paths
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::SchemaViolation`] if a path holds a list or
    /// mapping.
    pub fn apply(&self, attributes: &mut Map<String, Value>) -> BlueprintResult<Vec<&'static str>> {
        let mut coerced = Vec::new();
        for path in self.paths {
            let Some(slot) = lookup_mut(attributes, path) else {
                continue;
            };
            let text = match slot {
                Value::String(_) | Value::Null => continue,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(BlueprintError::violation(
                        &self.kind.tag(),
                        path,
                        "expected text or number",
                    ));
                }
            };
            trace!(kind = %self.kind, path = *path, value = %text, "normalized to text");
            *slot = Value::String(text);
            coerced.push(*path);
        }
        Ok(coerced)
    }
}

fn lookup_mut<'a>(map: &'a mut Map<String, Value>, path: &str) -> Option<&'a mut Value> {
    let mut parts = path.split('.');
    let first = parts.next()?;
    parts.try_fold(map.get_mut(first)?, |value, part| value.get_mut(part))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::TaskKind;
    use serde_json::json;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_package_numbers_become_text() {
        let mut map = attrs(json!({
            "product": {"name": "CentOS", "version": 7},
            "checksum": {"algorithm": "SHA256", "value": 1234}
        }));
        let coerced = TextNormalization::for_kind(SchemaKind::VmDiskPackage)
            .apply(&mut map)
            .unwrap();
        assert_eq!(coerced, vec!["product.version", "checksum.value"]);
        assert_eq!(map["product"]["version"], json!("7"));
        assert_eq!(map["checksum"]["value"], json!("1234"));
    }

    #[test]
    fn test_floats_and_text_are_kept_readable() {
        let mut map = attrs(json!({"product": {"version": 1.5}, "checksum": {"value": "abc"}}));
        let coerced = TextNormalization::for_kind(SchemaKind::VmDiskPackage)
            .apply(&mut map)
            .unwrap();
        assert_eq!(coerced, vec!["product.version"]);
        assert_eq!(map["product"]["version"], json!("1.5"));
        assert_eq!(map["checksum"]["value"], json!("abc"));
    }

    #[test]
    fn test_absent_paths_are_skipped() {
        let mut map = attrs(json!({"product": {}}));
        let coerced = TextNormalization::for_kind(SchemaKind::VmDiskPackage)
            .apply(&mut map)
            .unwrap();
        assert!(coerced.is_empty());
        assert_eq!(map, attrs(json!({"product": {}})));
    }

    #[test]
    fn test_task_timeouts() {
        let mut map = attrs(json!({"timeout_secs": 30, "retries": "2"}));
        TextNormalization::for_kind(SchemaKind::Task(TaskKind::Exec))
            .apply(&mut map)
            .unwrap();
        assert_eq!(map["timeout_secs"], json!("30"));
        assert_eq!(map["retries"], json!("2"));
    }

    #[test]
    fn test_structured_value_is_rejected() {
        let mut map = attrs(json!({"product": {"version": [1, 0]}}));
        let err = TextNormalization::for_kind(SchemaKind::VmDiskPackage)
            .apply(&mut map)
            .unwrap_err();
        assert!(matches!(err, BlueprintError::SchemaViolation { path, .. } if path == "product.version"));
    }

    #[test]
    fn test_other_kinds_have_no_paths() {
        assert!(TextNormalization::for_kind(SchemaKind::Credential).paths().is_empty());
    }
}
