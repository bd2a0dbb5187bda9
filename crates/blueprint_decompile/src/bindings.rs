//! Kind-to-template bindings.
//!
//! Every schema kind is either compile-only or decompiles through a fixed
//! set of templates. [`check_bindings`] runs once at startup and fails fast
//! if the registry or renderer is incomplete.

use crate::template::{SubKind, TemplateId, TemplateRenderer};
use blueprint_core::{BlueprintError, BlueprintResult, SchemaKind};
use blueprint_schema::ValidatorRegistry;
use tracing::debug;

/// How a schema kind takes part in decompilation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// Decompiled through these templates, one per sub-kind
    Templates(Vec<TemplateId>),
    /// Compiled only; never decompiled on its own
    CompileOnly,
}

/// Binding of a schema kind
#[must_use]
pub fn binding_for(kind: SchemaKind) -> Binding {
    match kind {
        SchemaKind::Task(task) => Binding::Templates(
            SubKind::variants_of(task)
                .into_iter()
                .filter_map(|sub| TemplateId::for_task(task, sub))
                .collect(),
        ),
        _ => Binding::CompileOnly,
    }
}

/// Check that every schema kind is registered and every task variant has a
/// template the renderer can render
///
/// # Errors
///
/// Returns [`BlueprintError::NotYetRegistered`] for a missing schema or
/// [`BlueprintError::UnsupportedKind`] for a task variant without a template.
pub fn check_bindings(registry: &ValidatorRegistry, renderer: &dyn TemplateRenderer) -> BlueprintResult<usize> {
    let mut templates = 0;
    for kind in SchemaKind::ALL {
        registry.get(kind)?;
        let SchemaKind::Task(task) = kind else {
            continue;
        };
        for sub in SubKind::variants_of(task) {
            let template = TemplateId::for_task(task, sub)
                .filter(|id| renderer.supports(*id))
                .ok_or_else(|| BlueprintError::UnsupportedKind {
                    kind: match sub {
                        Some(sub) => format!("{} {}", task, sub),
                        None => task.to_string(),
                    },
                })?;
            debug!(kind = %kind, template = %template, "binding checked");
            templates += 1;
        }
    }
    Ok(templates)
}
