//! Reverse resolution of payload pointers to source identifiers.

use blueprint_core::{
    BlueprintError, BlueprintResult, Payload, Pointer, RefKind, correct_identifier,
    credential_var_name,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Credential name to the variable it is declared under in source
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialTable {
    vars: IndexMap<String, String>,
}

impl CredentialTable {
    /// Empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table over credential names
    #[must_use]
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for name in names {
            table.insert(name.as_ref());
        }
        table
    }

    /// Table over compiled credential payloads
    #[must_use]
    pub fn from_payloads(payloads: &[Payload]) -> Self {
        Self::from_names(payloads.iter().filter_map(Payload::name))
    }

    /// Add a credential, returning its variable name
    pub fn insert(&mut self, name: &str) -> &str {
        self.vars
            .entry(name.to_string())
            .or_insert_with(|| credential_var_name(name))
    }

    /// Variable name of a credential
    #[must_use]
    pub fn var_for(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Number of credentials
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

/// Runbook name to the action that owns it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunbookActionMap(IndexMap<String, String>);

impl RunbookActionMap {
    /// Empty map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the action owning a runbook
    pub fn insert(&mut self, runbook: impl Into<String>, action: impl Into<String>) {
        self.0.insert(runbook.into(), action.into());
    }

    /// Action owning a runbook
    #[must_use]
    pub fn action_for(&self, runbook: &str) -> Option<&str> {
        self.0.get(runbook).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RunbookActionMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Wrap an identifier in a source reference expression
#[must_use]
pub fn ref_expr(identifier: &str) -> String {
    format!("ref({})", identifier)
}

/// Reverse resolver over the tables built before decompilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseResolver {
    credentials: CredentialTable,
}

impl ReverseResolver {
    /// Resolver over a credential table
    #[must_use]
    pub fn new(credentials: CredentialTable) -> Self {
        Self { credentials }
    }

    /// Credential table
    #[must_use]
    pub fn credentials(&self) -> &CredentialTable {
        &self.credentials
    }

    /// Source identifier of a pointer
    ///
    /// Credentials resolve through the credential table and runbooks through
    /// the action map. Anything else resolves to its name, corrected into a
    /// valid identifier.
    ///
    /// # Errors
    ///
    /// Returns [`BlueprintError::DanglingReference`] for an unknown credential
    /// and [`BlueprintError::UnresolvedRunbookAction`] for a runbook missing
    /// from the action map.
    pub fn reverse_resolve(
        &self,
        pointer: &Pointer,
        actions: &RunbookActionMap,
        task: &str,
    ) -> BlueprintResult<String> {
        match pointer.ref_kind() {
            RefKind::Credential => self
                .credentials
                .var_for(&pointer.name)
                .map(str::to_string)
                .ok_or_else(|| BlueprintError::DanglingReference {
                    kind: pointer.kind.clone(),
                    name: pointer.name.clone(),
                    entity: Some(task.to_string()),
                }),
            RefKind::Runbook => actions
                .action_for(&pointer.name)
                .map(str::to_string)
                .ok_or_else(|| BlueprintError::UnresolvedRunbookAction {
                    runbook: pointer.name.clone(),
                    task: task.to_string(),
                }),
            _ => Ok(correct_identifier(&pointer.name)),
        }
    }
}
