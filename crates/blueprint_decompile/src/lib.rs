//! Blueprint Decompiler
//!
//! Turns compiled task payloads back into declarative source. Each payload
//! is dispatched on its kind and sub-kind to one template, its fields are
//! reshaped into that template's input, pointers are reverse-resolved into
//! source identifiers, and `EXEC` scripts are externalized into files.
//!
//! # Example
//!
//! ```no_run
//! use blueprint_decompile::{Decompiler, EmbeddedTemplates, RunbookActionMap, ScriptDir};
//! use blueprint_core::Payload;
//! use serde_json::json;
//!
//! let decompiler = Decompiler::new(EmbeddedTemplates::new()?, ScriptDir::new("specs"));
//! let payload = Payload::from_value(json!({"name": "wait", "type": "DELAY"})).expect("object payload");
//! let source = decompiler.decompile(&payload, &RunbookActionMap::new())?;
//! assert!(source.starts_with("task \"wait\" delay"));
//! # Ok::<(), blueprint_core::BlueprintError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bindings;
pub mod decompiler;
pub mod reverse;
pub mod script;
pub mod selector;
pub mod template;

pub use bindings::{Binding, binding_for, check_bindings};
pub use decompiler::Decompiler;
pub use reverse::{CredentialTable, ReverseResolver, RunbookActionMap, ref_expr};
pub use script::{SCRIPT_PATH_PREFIX, ScriptDir, ScriptSink, escape_script};
pub use selector::{Selection, TemplateSelector};
pub use template::{EmbeddedTemplates, SubKind, TemplateContext, TemplateId, TemplateRenderer};
