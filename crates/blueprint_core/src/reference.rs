//! Non-owning references between entities.
//!
//! A [`Reference`] names its target; it never holds the target's payload.
//! On the wire it becomes a [`Pointer`] of the form `{"kind", "name"}`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace a reference is resolved in
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefKind {
    /// Credential
    Credential,
    /// Runbook
    Runbook,
    /// Substrate (VM target)
    Substrate,
    /// Service target
    Service,
    /// Package
    Package,
    /// Any other entity, identified by its wire kind
    Other(String),
}

impl RefKind {
    /// Wire kind string used in pointers
    #[must_use]
    pub fn wire_kind(&self) -> &str {
        match self {
            Self::Credential => "app_credential",
            Self::Runbook => "app_runbook",
            Self::Substrate => "app_substrate",
            Self::Service => "app_service",
            Self::Package => "app_package",
            Self::Other(kind) => kind,
        }
    }

    /// Parse a wire kind string
    #[must_use]
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "app_credential" => Self::Credential,
            "app_runbook" => Self::Runbook,
            "app_substrate" => Self::Substrate,
            "app_service" => Self::Service,
            "app_package" => Self::Package,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_kind())
    }
}

/// Symbolic reference to another entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Pointer", into = "Pointer")]
pub struct Reference {
    /// Namespace of the target
    pub kind: RefKind,
    /// Name of the target, unique within its namespace
    pub name: String,
}

impl Reference {
    /// Create a reference
    #[must_use]
    pub fn new(kind: RefKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Reference a credential
    #[must_use]
    pub fn credential(name: impl Into<String>) -> Self {
        Self::new(RefKind::Credential, name)
    }

    /// Reference a runbook
    #[must_use]
    pub fn runbook(name: impl Into<String>) -> Self {
        Self::new(RefKind::Runbook, name)
    }

    /// Reference a substrate
    #[must_use]
    pub fn substrate(name: impl Into<String>) -> Self {
        Self::new(RefKind::Substrate, name)
    }

    /// Reference a service
    #[must_use]
    pub fn service(name: impl Into<String>) -> Self {
        Self::new(RefKind::Service, name)
    }

    /// Wire pointer for this reference
    #[must_use]
    pub fn to_pointer(&self) -> Pointer {
        Pointer {
            kind: self.kind.wire_kind().to_string(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

/// Minimal wire form of a reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    /// Wire kind
    pub kind: String,
    /// Target name
    pub name: String,
}

impl Pointer {
    /// Namespace this pointer refers into
    #[must_use]
    pub fn ref_kind(&self) -> RefKind {
        RefKind::from_wire(&self.kind)
    }

    /// Convert to a JSON value
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({ "kind": self.kind, "name": self.name })
    }

    /// Read a pointer out of a JSON value
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let kind = value.get("kind")?.as_str()?;
        let name = value.get("name")?.as_str()?;
        Some(Self {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }
}

impl From<Pointer> for Reference {
    fn from(pointer: Pointer) -> Self {
        Self {
            kind: pointer.ref_kind(),
            name: pointer.name,
        }
    }
}

impl From<Reference> for Pointer {
    fn from(reference: Reference) -> Self {
        reference.to_pointer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_pointer() {
        let reference = Reference::credential("admin");
        let pointer = reference.to_pointer();
        assert_eq!(pointer.kind, "app_credential");
        assert_eq!(pointer.name, "admin");
        assert_eq!(pointer.ref_kind(), RefKind::Credential);
    }

    #[test]
    fn test_other_kind_roundtrip() {
        let kind = RefKind::from_wire("app_blueprint");
        assert_eq!(kind, RefKind::Other("app_blueprint".to_string()));
        assert_eq!(kind.wire_kind(), "app_blueprint");
    }

    #[test]
    fn test_reference_serde_uses_wire_shape() {
        let json = serde_json::to_value(Reference::runbook("Cleanup")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "app_runbook", "name": "Cleanup"}));

        let back: Reference = serde_json::from_value(json).unwrap();
        assert_eq!(back, Reference::runbook("Cleanup"));
    }

    #[test]
    fn test_pointer_from_value() {
        let value = serde_json::json!({"kind": "app_service", "name": "Web", "uuid": "x"});
        let pointer = Pointer::from_value(&value).unwrap();
        assert_eq!(pointer.name, "Web");
        assert!(Pointer::from_value(&serde_json::json!({"name": "Web"})).is_none());
    }

    #[test]
    fn test_reference_display() {
        assert_eq!(Reference::service("Web").to_string(), "app_service:Web");
    }
}
