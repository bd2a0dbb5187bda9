//! Compiler from entity descriptors to wire payloads.

use crate::defaults::fill_defaults;
use crate::entity::{AttrValue, EntityDescriptor};
use crate::resolver::ReferenceResolver;
use blueprint_core::{BlueprintError, BlueprintResult, Payload};
use blueprint_schema::{TextNormalization, ValidatorRegistry, standard_registry};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, debug_span, trace};

/// Compiler for transforming entity descriptors into payloads
///
/// Compilation is all-or-nothing per entity and never mutates the
/// descriptor. The registry is shared read-only, so compilers for
/// independent entity sets may run on separate threads.
#[derive(Debug, Clone)]
pub struct Compiler {
    registry: Arc<ValidatorRegistry>,
    resolver: ReferenceResolver,
}

impl Compiler {
    /// Create a compiler over a registry and resolver
    #[must_use]
    pub fn new(registry: Arc<ValidatorRegistry>, resolver: ReferenceResolver) -> Self {
        Self { registry, resolver }
    }

    /// Create a compiler over the standard registry with empty namespaces
    ///
    /// # Errors
    ///
    /// Returns error if the standard registry fails to build
    pub fn standard() -> BlueprintResult<Self> {
        Ok(Self::new(
            Arc::new(standard_registry()?),
            ReferenceResolver::new(),
        ))
    }

    /// Replace the resolver
    #[must_use]
    pub fn with_resolver(mut self, resolver: ReferenceResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Registry used for validation
    #[must_use]
    pub fn registry(&self) -> &Arc<ValidatorRegistry> {
        &self.registry
    }

    /// Resolver used for references
    #[must_use]
    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Mutable resolver, for declaring targets before compiling dependents
    pub fn resolver_mut(&mut self) -> &mut ReferenceResolver {
        &mut self.resolver
    }

    /// Compile an entity to its payload
    ///
    /// # Errors
    ///
    /// Returns error if a reference dangles, a config section has the wrong
    /// shape, or the result violates the kind's schema.
    pub fn compile(&self, entity: &EntityDescriptor) -> BlueprintResult<Payload> {
        let span = debug_span!("compile", entity = entity.name(), kind = %entity.kind());
        let _guard = span.enter();
        self.compile_entity(entity)
            .map_err(|err| err.in_entity(entity.name()))
    }

    /// Compile several entities in order, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Returns the first compilation error
    pub fn compile_all(&self, entities: &[EntityDescriptor]) -> BlueprintResult<Vec<Payload>> {
        entities.iter().map(|entity| self.compile(entity)).collect()
    }

    fn compile_entity(&self, entity: &EntityDescriptor) -> BlueprintResult<Payload> {
        let kind = entity.kind();

        let mut attrs = Map::new();
        for (name, value) in entity.attributes() {
            attrs.insert(name.clone(), self.compile_attr(value)?);
        }

        let coerced = TextNormalization::for_kind(kind).apply(&mut attrs)?;
        if !coerced.is_empty() {
            trace!(paths = ?coerced, "normalized text fields");
        }

        let filled = fill_defaults(kind, entity.name(), entity.description(), attrs)?;
        let validated = self.registry.validate_kind(kind, filled)?;
        let payload = Payload::from_value(validated)
            .ok_or_else(|| BlueprintError::violation(&kind.tag(), "$", "expected mapping"))?;

        debug!(fingerprint = %payload.fingerprint(), "compiled entity");
        Ok(payload)
    }

    fn compile_attr(&self, value: &AttrValue) -> BlueprintResult<Value> {
        match value {
            AttrValue::Scalar(value) => Ok(value.clone()),
            AttrValue::Entity(nested) => Ok(self.compile(nested)?.into_value()),
            AttrValue::Reference(reference) => Ok(self.resolver.resolve(reference)?.to_value()),
            AttrValue::List(items) => items
                .iter()
                .map(|item| self.compile_attr(item))
                .collect::<BlueprintResult<Vec<_>>>()
                .map(Value::Array),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::{RefKind, Reference, SchemaKind, TaskKind};
    use serde_json::json;

    fn compiler() -> Compiler {
        Compiler::standard().unwrap().with_resolver(
            ReferenceResolver::new()
                .with_declared(RefKind::Credential, "admin")
                .with_declared(RefKind::Service, "Web"),
        )
    }

    fn exec_entity() -> EntityDescriptor {
        EntityDescriptor::new(SchemaKind::Task(TaskKind::Exec), "install")
            .with_attr("script_type", "sh")
            .with_attr("script", "echo hi")
            .with_attr("login_credential_local_reference", Reference::credential("admin"))
            .with_attr("target_any_local_reference", Reference::service("Web"))
    }

    #[test]
    fn test_compile_exec_task() {
        let payload = compiler().compile(&exec_entity()).unwrap();
        assert_eq!(
            payload.into_value(),
            json!({
                "name": "install",
                "description": "",
                "type": "EXEC",
                "attrs": {
                    "script_type": "sh",
                    "script": "echo hi",
                    "login_credential_local_reference": {"kind": "app_credential", "name": "admin"}
                },
                "target_any_local_reference": {"kind": "app_service", "name": "Web"},
                "child_tasks_local_reference_list": [],
                "variable_list": [],
                "timeout_secs": "0",
                "retries": "0"
            })
        );
    }

    #[test]
    fn test_dangling_credential() {
        let entity = exec_entity()
            .with_attr("login_credential_local_reference", Reference::credential("root"));
        let err = compiler().compile(&entity).unwrap_err();
        assert_eq!(
            err,
            BlueprintError::DanglingReference {
                kind: "app_credential".to_string(),
                name: "root".to_string(),
                entity: Some("install".to_string()),
            }
        );
    }

    #[test]
    fn test_nested_entities_compile_first() {
        let header = EntityDescriptor::new(SchemaKind::HttpHeader, "Accept")
            .with_attr("type", "LOCAL")
            .with_attr("value", "application/json");
        let status = EntityDescriptor::new(SchemaKind::ResponseStatus, "ok")
            .with_attr("code", json!(200))
            .with_attr("status", "SUCCESS");
        let entity = EntityDescriptor::new(SchemaKind::Task(TaskKind::Http), "ping")
            .with_attr("method", "GET")
            .with_attr("url", "https://example.com")
            .with_attr("headers", vec![AttrValue::from(header)])
            .with_attr("expected_response_params", vec![AttrValue::from(status)]);
        let payload = compiler().compile(&entity).unwrap();
        assert_eq!(
            payload.pointer("attrs.headers"),
            Some(&json!([{"name": "Accept", "type": "LOCAL", "value": "application/json"}]))
        );
        assert_eq!(
            payload.pointer("attrs.expected_response_params"),
            Some(&json!([{"code": 200, "status": "SUCCESS"}]))
        );
    }

    #[test]
    fn test_nested_violation_names_inner_entity() {
        let header = EntityDescriptor::new(SchemaKind::HttpHeader, "Accept").with_attr("type", "PUBLIC");
        let entity = EntityDescriptor::new(SchemaKind::Task(TaskKind::Http), "ping")
            .with_attr("method", "GET")
            .with_attr("url", "u")
            .with_attr("headers", vec![AttrValue::from(header)]);
        let err = compiler().compile(&entity).unwrap_err();
        assert!(matches!(
            err,
            BlueprintError::SchemaViolation { entity: Some(name), path, .. }
                if name == "Accept" && path == "type"
        ));
    }

    #[test]
    fn test_violation_carries_path_and_entity() {
        let entity = EntityDescriptor::new(SchemaKind::Task(TaskKind::Scaling), "grow")
            .with_attr("scaling_type", "SIDEWAYS");
        let err = compiler().compile(&entity).unwrap_err();
        assert!(matches!(
            err,
            BlueprintError::SchemaViolation { entity: Some(name), kind, path, .. }
                if name == "grow" && kind == "app_task:SCALING" && path == "attrs.scaling_type"
        ));
    }

    #[test]
    fn test_numeric_timeout_is_text() {
        let entity = exec_entity().with_attr("timeout_secs", json!(30));
        let payload = compiler().compile(&entity).unwrap();
        assert_eq!(payload.get("timeout_secs"), Some(&json!("30")));
    }

    #[test]
    fn test_descriptor_is_not_mutated() {
        let entity = exec_entity().with_attr("retries", json!(2));
        let before = entity.clone();
        compiler().compile(&entity).unwrap();
        assert_eq!(entity, before);
    }

    #[test]
    fn test_compile_all_stops_at_first_error() {
        let bad = EntityDescriptor::new(SchemaKind::Task(TaskKind::Delay), "wait")
            .with_attr("interval_secs", "soon");
        let err = compiler().compile_all(&[exec_entity(), bad]).unwrap_err();
        assert!(matches!(err, BlueprintError::SchemaViolation { entity: Some(name), .. } if name == "wait"));
    }

    #[test]
    fn test_compile_is_deterministic() {
        let compiler = compiler();
        let a = compiler.compile(&exec_entity()).unwrap();
        let b = compiler.compile(&exec_entity()).unwrap();
        assert_eq!(a.to_canonical_bytes(), b.to_canonical_bytes());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }
}
