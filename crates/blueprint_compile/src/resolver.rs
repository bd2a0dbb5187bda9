//! Compile-time reference resolution.
//!
//! Namespaces are filled by declaring entities before their dependents are
//! compiled. Resolution is a pure lookup and never creates entities.

use crate::entity::EntityDescriptor;
use blueprint_core::{BlueprintError, BlueprintResult, Pointer, RefKind, Reference, SchemaKind};
use indexmap::{IndexMap, IndexSet};
use tracing::trace;

/// Namespaces of declared names, one per reference kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceResolver {
    namespaces: IndexMap<RefKind, IndexSet<String>>,
}

impl ReferenceResolver {
    /// Create a resolver with empty namespaces
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a name, returning false if it was already declared
    pub fn declare(&mut self, kind: RefKind, name: impl Into<String>) -> bool {
        let name = name.into();
        trace!(kind = %kind, name = %name, "declaring reference target");
        self.namespaces.entry(kind).or_default().insert(name)
    }

    /// Builder form of [`ReferenceResolver::declare`]
    #[must_use]
    pub fn with_declared(mut self, kind: RefKind, name: impl Into<String>) -> Self {
        self.declare(kind, name);
        self
    }

    /// Declare an entity in the namespace its kind is referenced through
    ///
    /// Returns the namespace used, or `None` for kinds that are never
    /// referenced by name.
    pub fn declare_entity(&mut self, entity: &EntityDescriptor) -> Option<RefKind> {
        let kind = match entity.kind() {
            SchemaKind::Credential => RefKind::Credential,
            SchemaKind::VmDiskPackage => RefKind::Package,
            _ => return None,
        };
        self.declare(kind.clone(), entity.name());
        Some(kind)
    }

    /// Whether the reference names a declared target
    #[must_use]
    pub fn contains(&self, reference: &Reference) -> bool {
        self.namespaces
            .get(&reference.kind)
            .is_some_and(|names| names.contains(&reference.name))
    }

    /// Resolve a reference to its wire pointer
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::DanglingReference`] if the target was never
    /// declared.
    pub fn resolve(&self, reference: &Reference) -> BlueprintResult<Pointer> {
        if self.contains(reference) {
            Ok(reference.to_pointer())
        } else {
            Err(BlueprintError::DanglingReference {
                kind: reference.kind.wire_kind().to_string(),
                name: reference.name.clone(),
                entity: None,
            })
        }
    }

    /// Declared names of a kind, in declaration order
    pub fn names(&self, kind: &RefKind) -> impl Iterator<Item = &str> {
        self.namespaces
            .get(kind)
            .into_iter()
            .flat_map(|names| names.iter().map(String::as_str))
    }
}
