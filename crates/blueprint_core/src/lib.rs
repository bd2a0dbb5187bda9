//! Blueprint DSL Core Types
//!
//! Pure types shared by the compiler and the decompiler: the discriminator
//! tables, wire constants, references, payloads, and the error taxonomy.
//! Nothing in this crate performs I/O.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fingerprint;
pub mod ident;
pub mod kind;
pub mod payload;
pub mod reference;

// Re-exports
pub use error::{BlueprintError, BlueprintResult, ErrorClass};
pub use fingerprint::Fingerprint;
pub use ident::{correct_identifier, credential_var_name, is_source_identifier};
pub use kind::{
    ExpectedStatus, HeaderType, HttpMethod, ImageType, ScalingType, SchemaKind, ScriptType,
    TaskKind,
};
pub use payload::Payload;
pub use reference::{Pointer, RefKind, Reference};
