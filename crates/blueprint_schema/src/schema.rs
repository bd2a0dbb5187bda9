//! Entity schemas for payload validation.

use blueprint_core::SchemaKind;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;

/// Type of a schema field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// JSON string
    Text,
    /// JSON integer
    Integer,
    /// JSON boolean
    Bool,
    /// JSON string restricted to the listed constants
    Enum(Vec<&'static str>),
    /// Free-form JSON object
    Object,
    /// JSON object whose values all have the given type
    Map(Box<FieldType>),
    /// JSON array whose items all have the given type
    List(Box<FieldType>),
    /// Inline closed record
    Record(Vec<FieldSchema>),
    /// Value of another registered kind
    Entity(Arc<EntitySchema>),
    /// Anything
    Any,
}

impl FieldType {
    /// Enum over wire strings
    #[must_use]
    pub fn one_of(values: &[&'static str]) -> Self {
        Self::Enum(values.to_vec())
    }

    /// List of the given item type
    #[must_use]
    pub fn list_of(item: FieldType) -> Self {
        Self::List(Box::new(item))
    }

    /// Map of the given value type
    #[must_use]
    pub fn map_of(value: FieldType) -> Self {
        Self::Map(Box::new(value))
    }

    /// Short name used in violation messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Text => "text".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Enum(values) => format!("one of {}", values.join(", ")),
            Self::Object | Self::Record(_) => "mapping".to_string(),
            Self::Map(inner) => format!("mapping of {}", inner.describe()),
            Self::List(inner) => format!("list of {}", inner.describe()),
            Self::Entity(schema) => schema.kind.tag(),
            Self::Any => "any value".to_string(),
        }
    }
}

/// Schema of one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    /// Field name
    pub name: String,
    /// Field type
    pub ty: FieldType,
    /// Whether the field must be present (after defaults)
    pub required: bool,
    /// Value filled in when the field is absent
    pub default: Option<Value>,
    /// Whether an explicit null is kept
    pub nullable: bool,
}

impl FieldSchema {
    /// Required field
    #[must_use]
    pub fn required(name: &str, ty: FieldType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: true,
            default: None,
            nullable: false,
        }
    }

    /// Optional field
    #[must_use]
    pub fn optional(name: &str, ty: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty)
        }
    }

    /// Set the default value
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Keep explicit nulls
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Schema of a registered kind
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySchema {
    /// Kind this schema validates
    pub kind: SchemaKind,
    /// Declared fields in wire order
    pub fields: IndexMap<String, FieldSchema>,
    /// Reject fields that are not declared
    pub closed: bool,
}

impl EntitySchema {
    /// Create a closed schema with no fields
    #[must_use]
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            kind,
            fields: IndexMap::new(),
            closed: true,
        }
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Allow undeclared fields to pass through
    #[must_use]
    pub fn open(mut self) -> Self {
        self.closed = false;
        self
    }

    /// Registry tag of the kind
    #[must_use]
    pub fn tag(&self) -> String {
        self.kind.tag()
    }

    /// Get a declared field
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.get(name)
    }
}
