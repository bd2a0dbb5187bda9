//! Error taxonomy shared by every blueprint crate.

/// Result type used throughout the blueprint crates
pub type BlueprintResult<T> = Result<T, BlueprintError>;

/// Broad class of an error, used by tooling to decide how to report it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// The blueprint source or payload is malformed
    UserInput,
    /// Programming or configuration defect (registration order, templates)
    Defect,
    /// Filesystem failure outside the engine's control
    Io,
}

/// Blueprint error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlueprintError {
    /// Neither inline configuration nor a configuration source was supplied
    #[error("Configuration not found for {entity}: supply inline config or a config file")]
    MissingConfiguration { entity: String },

    /// Supplied configuration is not a structured mapping
    #[error("Configuration for {entity} must be a mapping, found {found}")]
    TypeMismatch { entity: String, found: String },

    /// A value was rejected by the schema registered for its kind
    #[error("Schema violation in {kind}{} at '{path}': {reason}", entity_suffix(.entity))]
    SchemaViolation {
        /// Entity being compiled, when known
        entity: Option<String>,
        /// Discriminator tag of the schema
        kind: String,
        /// Dotted path to the offending field
        path: String,
        /// What was wrong
        reason: String,
    },

    /// The tag does not name any known kind
    #[error("Unknown kind: {tag}")]
    UnknownKind { tag: String },

    /// The tag names a known kind whose validator is not registered yet
    #[error("Kind {tag} is not registered yet; register the kinds it embeds first")]
    NotYetRegistered { tag: String },

    /// A tag was registered twice with different validators
    #[error("Conflicting registration for {tag}")]
    RegistrationConflict { tag: String },

    /// A reference names nothing in its namespace
    #[error("Dangling {kind} reference '{name}'{}", entity_suffix(.entity))]
    DanglingReference {
        /// Wire kind of the namespace that was searched
        kind: String,
        /// Name that was not found
        name: String,
        /// Entity holding the reference, when known
        entity: Option<String>,
    },

    /// No template is bound for this kind or sub-kind
    #[error("Unsupported kind: {kind}")]
    UnsupportedKind { kind: String },

    /// A called runbook has no originating action in the action map
    #[error("Runbook '{runbook}' called by task '{task}' has no action in the action map")]
    UnresolvedRunbookAction { runbook: String, task: String },

    /// Writing an externalized script failed
    #[error("Failed to write script {path}: {reason}")]
    ScriptWriteFailure { path: String, reason: String },

    /// A configuration file does not exist
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    /// A configuration file could not be parsed
    #[error("Failed to parse {path}: {message}")]
    ParseError { path: String, message: String },

    /// A template failed to render
    #[error("Failed to render template {template}: {message}")]
    Render { template: String, message: String },
}

impl BlueprintError {
    /// Classify the error for reporting
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotYetRegistered { .. }
            | Self::RegistrationConflict { .. }
            | Self::Render { .. } => ErrorClass::Defect,
            Self::ScriptWriteFailure { .. } | Self::NotFound { .. } => ErrorClass::Io,
            _ => ErrorClass::UserInput,
        }
    }

    /// Whether this error signals a defect rather than bad input
    #[must_use]
    pub fn is_defect(&self) -> bool {
        self.class() == ErrorClass::Defect
    }

    /// Attach the entity name to errors that carry one
    #[must_use]
    pub fn in_entity(self, name: &str) -> Self {
        match self {
            Self::SchemaViolation {
                entity: None,
                kind,
                path,
                reason,
            } => Self::SchemaViolation {
                entity: Some(name.to_string()),
                kind,
                path,
                reason,
            },
            Self::DanglingReference {
                entity: None,
                kind,
                name: target,
            } => Self::DanglingReference {
                kind,
                name: target,
                entity: Some(name.to_string()),
            },
            other => other,
        }
    }

    /// Build a schema violation without entity context
    #[must_use]
    pub fn violation(kind: &str, path: &str, reason: impl Into<String>) -> Self {
        Self::SchemaViolation {
            entity: None,
            kind: kind.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

fn entity_suffix(entity: &Option<String>) -> String {
    match entity {
        Some(name) => format!(" (entity {})", name),
        None => String::new(),
    }
}
