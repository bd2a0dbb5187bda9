//! Validator registry keyed by schema kind.
//!
//! The registry is filled once during bootstrap and then shared read-only,
//! typically behind an `Arc`. Composite schemas are built from the primitive
//! schemas returned by [`ValidatorRegistry::register`], so the registration
//! order is explicit in the code that builds them.

use crate::schema::EntitySchema;
use crate::validate::validate_value;
use blueprint_core::{BlueprintError, BlueprintResult, SchemaKind};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Registry of entity schemas
#[derive(Debug, Clone, Default)]
pub struct ValidatorRegistry {
    /// Registered schemas in registration order
    schemas: IndexMap<SchemaKind, Arc<EntitySchema>>,
}

impl ValidatorRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its kind
    ///
    /// Registering an equal schema twice is a no-op that returns the
    /// existing handle.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::RegistrationConflict`] if a different schema
    /// is already registered for the kind.
    pub fn register(&mut self, schema: EntitySchema) -> BlueprintResult<Arc<EntitySchema>> {
        let kind = schema.kind;
        if let Some(existing) = self.schemas.get(&kind) {
            if **existing == schema {
                trace!(kind = %kind, "schema already registered");
                return Ok(Arc::clone(existing));
            }
            return Err(BlueprintError::RegistrationConflict { tag: kind.tag() });
        }

        debug!(kind = %kind, fields = schema.fields.len(), "registering schema");
        let schema = Arc::new(schema);
        self.schemas.insert(kind, Arc::clone(&schema));
        Ok(schema)
    }

    /// Look up a schema by tag
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::UnknownKind`] if the tag names no kind, or
    /// [`BlueprintError::NotYetRegistered`] if the kind exists but has not
    /// been registered.
    pub fn lookup(&self, tag: &str) -> BlueprintResult<Arc<EntitySchema>> {
        let kind = SchemaKind::from_tag(tag).ok_or_else(|| BlueprintError::UnknownKind {
            tag: tag.to_string(),
        })?;
        self.get(kind)
    }

    /// Get the schema of a kind
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::NotYetRegistered`] if the kind is not registered.
    pub fn get(&self, kind: SchemaKind) -> BlueprintResult<Arc<EntitySchema>> {
        self.schemas
            .get(&kind)
            .cloned()
            .ok_or_else(|| BlueprintError::NotYetRegistered { tag: kind.tag() })
    }

    /// Validate a value against the schema registered for a tag
    ///
    /// # Errors
    ///
    /// Returns a lookup error or the first schema violation.
    pub fn validate(&self, tag: &str, value: Value) -> BlueprintResult<Value> {
        let schema = self.lookup(tag)?;
        validate_value(&schema, value)
    }

    /// Validate a value against the schema registered for a kind
    ///
    /// # Errors
    ///
    /// Returns a lookup error or the first schema violation.
    pub fn validate_kind(&self, kind: SchemaKind, value: Value) -> BlueprintResult<Value> {
        let schema = self.get(kind)?;
        validate_value(&schema, value)
    }

    /// Whether a kind is registered
    #[must_use]
    pub fn contains(&self, kind: SchemaKind) -> bool {
        self.schemas.contains_key(&kind)
    }

    /// Registered kinds in registration order
    pub fn kinds(&self) -> impl Iterator<Item = SchemaKind> + '_ {
        self.schemas.keys().copied()
    }

    /// Number of registered schemas
    #[must_use]
    pub fn count(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
