//! Entity descriptors: the unit the compiler consumes.

use blueprint_core::{Reference, SchemaKind, is_source_identifier};
use indexmap::IndexMap;
use serde_json::Value;

/// Value of a declared attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Plain JSON value, copied as is
    Scalar(Value),
    /// Nested entity, compiled first
    Entity(Box<EntityDescriptor>),
    /// Reference, resolved to a pointer
    Reference(Reference),
    /// List of values
    List(Vec<AttrValue>),
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Value::String(value.to_string()))
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Scalar(Value::String(value))
    }
}

impl From<Reference> for AttrValue {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}

impl From<EntityDescriptor> for AttrValue {
    fn from(entity: EntityDescriptor) -> Self {
        Self::Entity(Box::new(entity))
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(items: Vec<AttrValue>) -> Self {
        Self::List(items)
    }
}

/// Declarative definition of one entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    name: String,
    kind: SchemaKind,
    description: String,
    attributes: IndexMap<String, AttrValue>,
}

impl EntityDescriptor {
    /// Create a descriptor with no attributes
    #[must_use]
    pub fn new(kind: SchemaKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            attributes: IndexMap::new(),
        }
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an attribute
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set an attribute, replacing any previous value in place
    pub fn set(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    /// Entity name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema kind
    #[must_use]
    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Description
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Get an attribute
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    /// Attributes in declaration order
    #[must_use]
    pub fn attributes(&self) -> &IndexMap<String, AttrValue> {
        &self.attributes
    }

    /// Whether the name can appear as an identifier in source
    #[must_use]
    pub fn has_source_name(&self) -> bool {
        is_source_identifier(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_core::TaskKind;
    use serde_json::json;

    #[test]
    fn test_attributes_keep_declaration_order() {
        let entity = EntityDescriptor::new(SchemaKind::Task(TaskKind::Delay), "wait")
            .with_attr("zeta", json!(1))
            .with_attr("alpha", json!(2));
        let names: Vec<_> = entity.attributes().keys().cloned().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut entity = EntityDescriptor::new(SchemaKind::Variable, "v")
            .with_attr("a", "x")
            .with_attr("b", "y");
        entity.set("a", "z");
        assert_eq!(entity.get("a"), Some(&AttrValue::from("z")));
        assert_eq!(entity.attributes().get_index(0).map(|(k, _)| k.as_str()), Some("a"));
    }

    #[test]
    fn test_source_name() {
        assert!(EntityDescriptor::new(SchemaKind::Credential, "admin").has_source_name());
        assert!(!EntityDescriptor::new(SchemaKind::Credential, "1admin").has_source_name());
    }

    #[test]
    fn test_attr_conversions() {
        assert_eq!(
            AttrValue::from(Reference::service("Web")),
            AttrValue::Reference(Reference::service("Web"))
        );
        assert!(matches!(AttrValue::from(vec![AttrValue::from("a")]), AttrValue::List(items) if items.len() == 1));
    }
}
