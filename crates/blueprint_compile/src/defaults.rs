//! Kind-specific default filling.
//!
//! Each schema kind has exactly one filler. A filler turns the collected
//! attributes of an entity into the wire structure of its kind. Field
//! defaults that do not depend on other fields are left to the schema.

use blueprint_core::kind::{DEFAULT_PRODUCT_VERSION, DISK_IMAGE, ISO_IMAGE, SUBSTRATE_IMAGE, X86_64};
use blueprint_core::{BlueprintError, BlueprintResult, HttpMethod, SchemaKind, TaskKind};
use serde_json::{Map, Value, json};

/// Task fields that live beside `attrs` rather than inside it
pub const TASK_TOP_LEVEL_FIELDS: &[&str] = &[
    "target_any_local_reference",
    "child_tasks_local_reference_list",
    "variable_list",
    "timeout_secs",
    "retries",
];

/// Attribute holding a credential's secret before it is wrapped
pub const SECRET_VALUE_ATTR: &str = "secret_value";

/// Build the wire structure of an entity from its collected attributes
///
/// # Errors
///
/// Returns [`BlueprintError::TypeMismatch`] if a package config section is
/// not a mapping.
pub fn fill_defaults(
    kind: SchemaKind,
    name: &str,
    description: &str,
    attrs: Map<String, Value>,
) -> BlueprintResult<Value> {
    match kind {
        SchemaKind::Ref | SchemaKind::HttpHeader => Ok(named(name, None, attrs)),
        SchemaKind::ResponseStatus | SchemaKind::ImageChecksum => Ok(Value::Object(attrs)),
        SchemaKind::Variable => Ok(named(name, Some(description), attrs)),
        SchemaKind::Credential => Ok(credential(name, description, attrs)),
        SchemaKind::Task(task) => Ok(task_payload(task, name, description, attrs)),
        SchemaKind::VmDiskPackage => package(name, description, &attrs),
    }
}

fn named(name: &str, description: Option<&str>, attrs: Map<String, Value>) -> Value {
    let mut out = Map::new();
    out.insert("name".to_string(), json!(name));
    if let Some(description) = description {
        out.insert("description".to_string(), json!(description));
    }
    out.extend(attrs);
    Value::Object(out)
}

fn credential(name: &str, description: &str, mut attrs: Map<String, Value>) -> Value {
    let secret = attrs.remove(SECRET_VALUE_ATTR).unwrap_or_else(|| json!(""));
    attrs.insert(
        "secret".to_string(),
        json!({ "value": secret, "attrs": { "is_secret_modified": true } }),
    );
    named(name, Some(description), attrs)
}

fn task_payload(kind: TaskKind, name: &str, description: &str, attrs: Map<String, Value>) -> Value {
    let (top, mut inner): (Map<String, Value>, Map<String, Value>) = attrs
        .into_iter()
        .partition(|(key, _)| TASK_TOP_LEVEL_FIELDS.contains(&key.as_str()));

    // DELETE requests always carry a body, empty when none was given
    let is_delete = inner.get("method").and_then(Value::as_str) == Some(HttpMethod::Delete.as_str());
    if kind == TaskKind::Http && is_delete && !inner.get("request_body").is_some_and(is_truthy) {
        inner.insert("request_body".to_string(), json!({}));
    }

    let mut out = Map::new();
    out.insert("name".to_string(), json!(name));
    out.insert("description".to_string(), json!(description));
    out.insert("type".to_string(), json!(kind.as_str()));
    out.insert("attrs".to_string(), Value::Object(inner));
    out.extend(top);
    Value::Object(out)
}

fn section<'a>(
    attrs: &'a Map<String, Value>,
    key: &str,
    entity: &str,
) -> BlueprintResult<Option<&'a Map<String, Value>>> {
    match attrs.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(BlueprintError::TypeMismatch {
            entity: format!("{} {}", entity, key),
            found: kind_of(other).to_string(),
        }),
    }
}

/// Value of a field when present and non-empty, else the fallback
fn or_fallback(section: Option<&Map<String, Value>>, key: &str, fallback: &str) -> Value {
    section
        .and_then(|map| map.get(key))
        .filter(|value| is_truthy(value))
        .cloned()
        .unwrap_or_else(|| json!(fallback))
}

/// Value of a field when present, else the fallback
fn or_absent(section: Option<&Map<String, Value>>, key: &str, fallback: &str) -> Value {
    section
        .and_then(|map| map.get(key))
        .cloned()
        .unwrap_or_else(|| json!(fallback))
}

fn package(name: &str, description: &str, attrs: &Map<String, Value>) -> BlueprintResult<Value> {
    let image = section(attrs, "image", name)?;
    let product = section(attrs, "product", name)?;
    let checksum = section(attrs, "checksum", name)?;

    let image_type = or_fallback(image, "type", DISK_IMAGE);
    let mut resources = Map::new();
    resources.insert("image_type".to_string(), image_type.clone());
    resources.insert("source_uri".to_string(), or_absent(image, "source_uri", ""));
    resources.insert(
        "version".to_string(),
        json!({
            "product_version": or_fallback(product, "version", DEFAULT_PRODUCT_VERSION),
            "product_name": or_fallback(product, "name", name),
        }),
    );
    resources.insert("architecture".to_string(), or_absent(image, "architecture", X86_64));
    if image_type == ISO_IMAGE {
        resources.insert(
            "checksum".to_string(),
            json!({
                "checksum_algorithm": or_absent(checksum, "algorithm", ""),
                "checksum_value": or_absent(checksum, "value", ""),
            }),
        );
    }

    Ok(json!({
        "name": name,
        "description": description,
        "type": SUBSTRATE_IMAGE,
        "options": {
            "name": or_fallback(image, "name", name),
            "description": "",
            "resources": resources,
        },
    }))
}

/// Truthiness of a JSON value: null, false, zero, and empty values are falsy
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_task_wraps_attrs() {
        let out = fill_defaults(
            SchemaKind::Task(TaskKind::Exec),
            "install",
            "",
            attrs(json!({
                "script_type": "sh",
                "script": "echo hi",
                "target_any_local_reference": {"kind": "app_service", "name": "Web"},
                "timeout_secs": "30"
            })),
        )
        .unwrap();
        assert_eq!(out["type"], json!("EXEC"));
        assert_eq!(out["attrs"], json!({"script_type": "sh", "script": "echo hi"}));
        assert_eq!(out["target_any_local_reference"]["name"], json!("Web"));
        assert_eq!(out["timeout_secs"], json!("30"));
    }

    #[test]
    fn test_delete_body_defaults_to_empty_mapping() {
        let fill = |method: &str, extra: Value| {
            let mut fields = attrs(json!({"method": method, "url": "https://example.com/items/1"}));
            fields.extend(attrs(extra));
            fill_defaults(SchemaKind::Task(TaskKind::Http), "drop", "", fields).unwrap()
        };

        assert_eq!(fill("DELETE", json!({}))["attrs"]["request_body"], json!({}));
        assert_eq!(fill("DELETE", json!({"request_body": null}))["attrs"]["request_body"], json!({}));
        assert_eq!(fill("DELETE", json!({"request_body": ""}))["attrs"]["request_body"], json!({}));
        assert_eq!(
            fill("DELETE", json!({"request_body": {"force": true}}))["attrs"]["request_body"],
            json!({"force": true})
        );
        assert!(fill("GET", json!({}))["attrs"].get("request_body").is_none());
        assert!(fill("PUT", json!({}))["attrs"].get("request_body").is_none());
    }

    #[test]
    fn test_package_defaults() {
        let out = fill_defaults(SchemaKind::VmDiskPackage, "Centos", "", Map::new()).unwrap();
        let resources = &out["options"]["resources"];
        assert_eq!(out["type"], json!("SUBSTRATE_IMAGE"));
        assert_eq!(out["options"]["name"], json!("Centos"));
        assert_eq!(resources["image_type"], json!("DISK_IMAGE"));
        assert_eq!(resources["architecture"], json!("X86_64"));
        assert_eq!(resources["version"]["product_version"], json!("1.0"));
        assert_eq!(resources["version"]["product_name"], json!("Centos"));
        assert!(resources.get("checksum").is_none());
    }

    #[test]
    fn test_iso_package_gets_empty_checksum() {
        let out = fill_defaults(
            SchemaKind::VmDiskPackage,
            "Ubuntu",
            "",
            attrs(json!({"image": {"type": "ISO_IMAGE"}, "checksum": {}})),
        )
        .unwrap();
        assert_eq!(
            out["options"]["resources"]["checksum"],
            json!({"checksum_algorithm": "", "checksum_value": ""})
        );
    }

    #[test]
    fn test_package_empty_values_fall_back() {
        let out = fill_defaults(
            SchemaKind::VmDiskPackage,
            "Centos",
            "",
            attrs(json!({"image": {"name": "", "architecture": ""}, "product": {"version": ""}})),
        )
        .unwrap();
        assert_eq!(out["options"]["name"], json!("Centos"));
        assert_eq!(out["options"]["resources"]["version"]["product_version"], json!("1.0"));
        // present architecture is kept even when empty
        assert_eq!(out["options"]["resources"]["architecture"], json!(""));
    }

    #[test]
    fn test_package_section_must_be_mapping() {
        let err = fill_defaults(
            SchemaKind::VmDiskPackage,
            "Centos",
            "",
            attrs(json!({"image": "centos.qcow2"})),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BlueprintError::TypeMismatch {
                entity: "Centos image".to_string(),
                found: "text".to_string()
            }
        );
    }

    #[test]
    fn test_credential_wraps_secret() {
        let out = fill_defaults(
            SchemaKind::Credential,
            "admin",
            "",
            attrs(json!({"username": "root", "secret_value": "pw"})),
        )
        .unwrap();
        assert_eq!(out["secret"]["value"], json!("pw"));
        assert!(out.get(SECRET_VALUE_ATTR).is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!({})));
        assert!(is_truthy(&json!(2)));
        assert!(is_truthy(&json!("x")));
    }
}
