//! Blueprint Compiler
//!
//! Turns entity descriptors into validated wire payloads:
//! - Typed authoring for tasks, credentials, and disk image packages
//! - Reference resolution against declared namespaces
//! - Kind-specific default filling and text normalization
//! - Validation through the schema registry

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compiler;
pub mod config;
pub mod credential;
pub mod defaults;
pub mod entity;
pub mod package;
pub mod resolver;
pub mod task;

pub use compiler::Compiler;
pub use config::{ConfigSource, read_spec};
pub use credential::{CredentialType, basic_cred};
pub use entity::{AttrValue, EntityDescriptor};
pub use package::{ahv_vm_disk_package, vm_disk_package};
pub use resolver::ReferenceResolver;
pub use task::{HttpHeaderSpec, HttpSpec, ResponseCode, Task, TaskSpec};
