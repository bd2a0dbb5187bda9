//! Standard schemas and the ordered registry bootstrap.
//!
//! Primitive kinds are registered first. Composite schemas receive the
//! primitive handles as arguments, so a composite cannot be built before
//! the primitives it embeds.

use crate::registry::ValidatorRegistry;
use crate::schema::{EntitySchema, FieldSchema, FieldType};
use blueprint_core::kind::{SUBSTRATE_IMAGE, X86_64};
use blueprint_core::{
    BlueprintResult, ExpectedStatus, HeaderType, HttpMethod, ImageType, ScalingType, SchemaKind,
    ScriptType, TaskKind,
};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Default HTTP content type
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
/// Default HTTP connection timeout in seconds
pub const DEFAULT_CONNECTION_TIMEOUT: u64 = 120;

/// Handles of the primitive schemas composites embed
#[derive(Debug, Clone)]
pub struct Primitives {
    /// Reference pointer
    pub reference: Arc<EntitySchema>,
    /// HTTP header entry
    pub http_header: Arc<EntitySchema>,
    /// Expected response entry
    pub response_status: Arc<EntitySchema>,
    /// Image checksum block
    pub image_checksum: Arc<EntitySchema>,
    /// Variable
    pub variable: Arc<EntitySchema>,
}

impl Primitives {
    /// Register every primitive schema
    ///
    /// # Errors
    ///
    /// Returns error if a conflicting schema is already registered.
    pub fn register(registry: &mut ValidatorRegistry) -> BlueprintResult<Self> {
        Ok(Self {
            reference: registry.register(ref_schema())?,
            http_header: registry.register(http_header_schema())?,
            response_status: registry.register(response_status_schema())?,
            image_checksum: registry.register(image_checksum_schema())?,
            variable: registry.register(variable_schema())?,
        })
    }
}

/// Build the registry holding every standard kind
///
/// # Errors
///
/// Returns error only if two standard schemas conflict, which is a defect.
pub fn standard_registry() -> BlueprintResult<ValidatorRegistry> {
    let mut registry = ValidatorRegistry::new();
    let primitives = Primitives::register(&mut registry)?;

    registry.register(credential_schema())?;
    for kind in TaskKind::ALL {
        registry.register(task_schema(*kind, &primitives))?;
    }
    registry.register(vm_disk_package_schema(&primitives))?;

    debug!(count = registry.count(), "standard registry ready");
    Ok(registry)
}

fn text(name: &str) -> FieldSchema {
    FieldSchema::optional(name, FieldType::Text).with_default(json!(""))
}

fn enum_of(values: Vec<&'static str>) -> FieldType {
    FieldType::Enum(values)
}

fn pointer(reference: &Arc<EntitySchema>) -> FieldType {
    FieldType::Entity(Arc::clone(reference))
}

fn pointer_list(name: &str, reference: &Arc<EntitySchema>) -> FieldSchema {
    FieldSchema::optional(name, FieldType::list_of(pointer(reference))).with_default(json!([]))
}

/// Schema of a reference pointer
#[must_use]
pub fn ref_schema() -> EntitySchema {
    EntitySchema::new(SchemaKind::Ref)
        .field(FieldSchema::required("kind", FieldType::Text))
        .field(FieldSchema::required("name", FieldType::Text))
        .field(FieldSchema::optional("uuid", FieldType::Text))
}

/// Schema of an HTTP header entry
#[must_use]
pub fn http_header_schema() -> EntitySchema {
    EntitySchema::new(SchemaKind::HttpHeader)
        .field(FieldSchema::required("name", FieldType::Text))
        .field(
            FieldSchema::optional("type", enum_of(HeaderType::wire_values()))
                .with_default(json!(HeaderType::Local.as_str())),
        )
        .field(text("value"))
}

/// Schema of an expected response entry
#[must_use]
pub fn response_status_schema() -> EntitySchema {
    EntitySchema::new(SchemaKind::ResponseStatus)
        .field(FieldSchema::required("code", FieldType::Integer))
        .field(FieldSchema::required("status", enum_of(ExpectedStatus::wire_values())))
}

/// Schema of an image checksum block
#[must_use]
pub fn image_checksum_schema() -> EntitySchema {
    EntitySchema::new(SchemaKind::ImageChecksum)
        .field(text("checksum_algorithm"))
        .field(text("checksum_value"))
}

/// Schema of a variable
#[must_use]
pub fn variable_schema() -> EntitySchema {
    EntitySchema::new(SchemaKind::Variable)
        .field(FieldSchema::required("name", FieldType::Text))
        .field(text("description"))
        .field(
            FieldSchema::optional("type", enum_of(HeaderType::wire_values()))
                .with_default(json!(HeaderType::Local.as_str())),
        )
        .field(text("value"))
        .field(text("label"))
        .field(FieldSchema::optional("is_hidden", FieldType::Bool).with_default(json!(false)))
        .field(FieldSchema::optional("is_mandatory", FieldType::Bool).with_default(json!(false)))
}

/// Schema of a credential
#[must_use]
pub fn credential_schema() -> EntitySchema {
    EntitySchema::new(SchemaKind::Credential)
        .field(FieldSchema::required("name", FieldType::Text))
        .field(text("description"))
        .field(
            FieldSchema::optional("type", enum_of(vec!["PASSWORD", "KEY"]))
                .with_default(json!("PASSWORD")),
        )
        .field(FieldSchema::required("username", FieldType::Text))
        .field(FieldSchema::required(
            "secret",
            FieldType::Record(vec![
                text("value"),
                FieldSchema::optional(
                    "attrs",
                    FieldType::Record(vec![
                        FieldSchema::optional("is_secret_modified", FieldType::Bool)
                            .with_default(json!(true)),
                    ]),
                )
                .with_default(json!({"is_secret_modified": true})),
            ]),
        ))
        .field(
            FieldSchema::optional("cred_class", enum_of(vec!["static", "dynamic"]))
                .with_default(json!("static")),
        )
        .field(FieldSchema::optional("editables", FieldType::Object).with_default(json!({})))
}

fn task_attrs(kind: TaskKind, primitives: &Primitives) -> Vec<FieldSchema> {
    let reference = &primitives.reference;
    let login = FieldSchema::optional("login_credential_local_reference", pointer(reference));
    match kind {
        TaskKind::Exec => vec![
            FieldSchema::required("script_type", enum_of(ScriptType::wire_values())),
            text("script"),
            login,
        ],
        TaskKind::SetVariable => vec![
            FieldSchema::required("script_type", enum_of(ScriptType::wire_values())),
            text("script"),
            FieldSchema::optional("eval_variables", FieldType::list_of(FieldType::Text))
                .with_default(json!([])),
            login,
        ],
        TaskKind::Delay => {
            vec![FieldSchema::optional("interval_secs", FieldType::Integer).with_default(json!(0))]
        }
        TaskKind::Scaling => vec![
            FieldSchema::required("scaling_type", enum_of(ScalingType::wire_values())),
            FieldSchema::optional("scaling_count", FieldType::Integer).with_default(json!(1)),
        ],
        TaskKind::Http => vec![
            FieldSchema::required("method", enum_of(HttpMethod::wire_values())),
            FieldSchema::required("url", FieldType::Text),
            FieldSchema::optional("request_body", FieldType::Any).nullable(),
            FieldSchema::optional("content_type", FieldType::Text)
                .with_default(json!(DEFAULT_CONTENT_TYPE)),
            FieldSchema::optional("connection_timeout", FieldType::Integer)
                .with_default(json!(DEFAULT_CONNECTION_TIMEOUT)),
            FieldSchema::optional("retry_count", FieldType::Integer).with_default(json!(1)),
            FieldSchema::optional("retry_interval", FieldType::Integer).with_default(json!(1)),
            FieldSchema::optional("tls_verify", FieldType::Bool).with_default(json!(false)),
            FieldSchema::optional(
                "headers",
                FieldType::list_of(FieldType::Entity(Arc::clone(&primitives.http_header))),
            )
            .with_default(json!([])),
            FieldSchema::optional(
                "expected_response_params",
                FieldType::list_of(FieldType::Entity(Arc::clone(&primitives.response_status))),
            )
            .with_default(json!([])),
            FieldSchema::optional("response_paths", FieldType::map_of(FieldType::Text))
                .with_default(json!({})),
        ],
        TaskKind::CallRunbook => {
            vec![FieldSchema::required("runbook_reference", pointer(reference))]
        }
    }
}

/// Schema of a task of the given kind
#[must_use]
pub fn task_schema(kind: TaskKind, primitives: &Primitives) -> EntitySchema {
    let reference = &primitives.reference;
    EntitySchema::new(SchemaKind::Task(kind))
        .field(FieldSchema::required("name", FieldType::Text))
        .field(text("description"))
        .field(FieldSchema::required("type", enum_of(vec![kind.as_str()])))
        .field(FieldSchema::required(
            "attrs",
            FieldType::Record(task_attrs(kind, primitives)),
        ))
        .field(FieldSchema::optional("target_any_local_reference", pointer(reference)))
        .field(pointer_list("child_tasks_local_reference_list", reference))
        .field(
            FieldSchema::optional(
                "variable_list",
                FieldType::list_of(FieldType::Entity(Arc::clone(&primitives.variable))),
            )
            .with_default(json!([])),
        )
        .field(FieldSchema::optional("timeout_secs", FieldType::Text).with_default(json!("0")))
        .field(FieldSchema::optional("retries", FieldType::Text).with_default(json!("0")))
}

/// Schema of a downloadable disk image package
#[must_use]
pub fn vm_disk_package_schema(primitives: &Primitives) -> EntitySchema {
    let resources = FieldType::Record(vec![
        FieldSchema::required("image_type", enum_of(ImageType::wire_values())),
        text("source_uri"),
        FieldSchema::required(
            "version",
            FieldType::Record(vec![
                FieldSchema::required("product_version", FieldType::Text),
                FieldSchema::required("product_name", FieldType::Text),
            ]),
        ),
        FieldSchema::optional("architecture", FieldType::Text).with_default(json!(X86_64)),
        FieldSchema::optional(
            "checksum",
            FieldType::Entity(Arc::clone(&primitives.image_checksum)),
        ),
    ]);

    EntitySchema::new(SchemaKind::VmDiskPackage)
        .field(FieldSchema::required("name", FieldType::Text))
        .field(text("description"))
        .field(FieldSchema::required("type", enum_of(vec![SUBSTRATE_IMAGE])))
        .field(FieldSchema::required(
            "options",
            FieldType::Record(vec![
                FieldSchema::required("name", FieldType::Text),
                text("description"),
                FieldSchema::required("resources", resources),
            ]),
        ))
        .field(pointer_list("service_local_reference_list", &primitives.reference))
        .field(
            FieldSchema::optional(
                "variable_list",
                FieldType::list_of(FieldType::Entity(Arc::clone(&primitives.variable))),
            )
            .with_default(json!([])),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::BlueprintError;
    use serde_json::json;

    #[test]
    fn test_standard_registry_covers_every_kind() {
        let registry = standard_registry().unwrap();
        assert_eq!(registry.count(), SchemaKind::ALL.len());
        for kind in SchemaKind::ALL {
            assert!(registry.contains(kind), "missing {kind}");
        }
    }

    #[test]
    fn test_primitives_register_before_composites() {
        let registry = standard_registry().unwrap();
        let kinds: Vec<_> = registry.kinds().collect();
        let position = |kind: SchemaKind| kinds.iter().position(|k| *k == kind).unwrap();
        assert!(position(SchemaKind::HttpHeader) < position(SchemaKind::Task(TaskKind::Http)));
        assert!(position(SchemaKind::ImageChecksum) < position(SchemaKind::VmDiskPackage));
        assert!(position(SchemaKind::Ref) < position(SchemaKind::Task(TaskKind::CallRunbook)));
    }

    #[test]
    fn test_bootstrap_is_idempotent() {
        let mut registry = standard_registry().unwrap();
        let primitives = Primitives::register(&mut registry).unwrap();
        registry
            .register(task_schema(TaskKind::Exec, &primitives))
            .unwrap();
        assert_eq!(registry.count(), SchemaKind::ALL.len());
    }

    #[test]
    fn test_task_defaults() {
        let registry = standard_registry().unwrap();
        let out = registry
            .validate(
                "app_task:HTTP",
                json!({"name": "ping", "type": "HTTP", "attrs": {"method": "GET", "url": "http://x"}}),
            )
            .unwrap();
        assert_eq!(out["attrs"]["content_type"], json!("application/json"));
        assert_eq!(out["attrs"]["connection_timeout"], json!(120));
        assert_eq!(out["attrs"]["retry_count"], json!(1));
        assert_eq!(out["attrs"]["tls_verify"], json!(false));
        assert_eq!(out["timeout_secs"], json!("0"));
        assert_eq!(out["child_tasks_local_reference_list"], json!([]));
        assert!(out["attrs"].get("request_body").is_none());
    }

    #[test]
    fn test_task_type_must_match_kind() {
        let registry = standard_registry().unwrap();
        let err = registry
            .validate(
                "app_task:DELAY",
                json!({"name": "wait", "type": "EXEC", "attrs": {}}),
            )
            .unwrap_err();
        assert!(matches!(err, BlueprintError::SchemaViolation { path, .. } if path == "type"));
    }

    #[test]
    fn test_http_header_violation_path() {
        let registry = standard_registry().unwrap();
        let err = registry
            .validate(
                "app_task:HTTP",
                json!({
                    "name": "ping",
                    "type": "HTTP",
                    "attrs": {"method": "GET", "url": "u", "headers": [{"name": "a", "type": "PUBLIC"}]}
                }),
            )
            .unwrap_err();
        assert!(
            matches!(err, BlueprintError::SchemaViolation { path, .. } if path == "attrs.headers[0].type")
        );
    }

    #[test]
    fn test_package_checksum_is_optional() {
        let registry = standard_registry().unwrap();
        let out = registry
            .validate(
                "app_vm_disk_package",
                json!({
                    "name": "Centos",
                    "type": "SUBSTRATE_IMAGE",
                    "options": {
                        "name": "Centos",
                        "resources": {
                            "image_type": "DISK_IMAGE",
                            "version": {"product_version": "1.0", "product_name": "Centos"}
                        }
                    }
                }),
            )
            .unwrap();
        let resources = &out["options"]["resources"];
        assert_eq!(resources["architecture"], json!("X86_64"));
        assert_eq!(resources["source_uri"], json!(""));
        assert!(resources.get("checksum").is_none());
    }

    #[test]
    fn test_credential_secret_defaults() {
        let registry = standard_registry().unwrap();
        let out = registry
            .validate(
                "app_credential",
                json!({"name": "admin", "username": "root", "secret": {"value": "pw"}}),
            )
            .unwrap();
        assert_eq!(out["type"], json!("PASSWORD"));
        assert_eq!(out["secret"]["attrs"]["is_secret_modified"], json!(true));
    }
}
