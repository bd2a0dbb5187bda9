//! Blueprint Schema Registry
//!
//! Entity schemas, the validator registry keyed by schema kind, structural
//! validation with default filling, and the ordered bootstrap that builds
//! the standard registry.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builtin;
pub mod normalize;
pub mod registry;
pub mod schema;
pub mod validate;

pub use builtin::{Primitives, standard_registry};
pub use normalize::TextNormalization;
pub use registry::ValidatorRegistry;
pub use schema::{EntitySchema, FieldSchema, FieldType};
pub use validate::validate_value;
