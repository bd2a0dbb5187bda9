//! Downloadable disk image packages.
//!
//! A package is described by a configuration mapping with `image`,
//! `product`, and `checksum` sections. The compiler fills the wire defaults
//! and emits a checksum block only for ISO images.

use crate::config::ConfigSource;
use crate::entity::EntityDescriptor;
use blueprint_core::kind::VM_DISK_PACKAGE_NAME;
use blueprint_core::{BlueprintResult, SchemaKind};
use serde_json::{Map, Value};
use tracing::debug;

/// Config sections carried into the descriptor, each defaulting to `{}`
pub const PACKAGE_SECTIONS: &[&str] = &["image", "product", "checksum"];

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn config_text<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    non_empty(config.get(key).and_then(Value::as_str))
}

/// Build a disk image package descriptor from a config source
///
/// The name falls back to the config's `name`, then to `VmDiskPackage`.
/// The description falls back to the config's `description`.
///
/// # Errors
///
/// Returns [`blueprint_core::BlueprintError::MissingConfiguration`] if the
/// source is empty, [`blueprint_core::BlueprintError::TypeMismatch`] if it
/// is not a mapping, or a file error.
pub fn vm_disk_package(
    name: Option<&str>,
    description: Option<&str>,
    source: &ConfigSource,
) -> BlueprintResult<EntityDescriptor> {
    let label = non_empty(name).unwrap_or(VM_DISK_PACKAGE_NAME);
    let config = source.load(label)?;

    let name = non_empty(name)
        .or_else(|| config_text(&config, "name"))
        .unwrap_or(VM_DISK_PACKAGE_NAME);
    let description = non_empty(description)
        .or_else(|| config_text(&config, "description"))
        .unwrap_or_default();

    let mut entity =
        EntityDescriptor::new(SchemaKind::VmDiskPackage, name).with_description(description);
    for section in PACKAGE_SECTIONS {
        let value = config
            .get(*section)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        entity.set(section, value);
    }

    debug!(entity = name, "built disk image package");
    Ok(entity)
}

/// Build an AHV disk image package from inline config data
///
/// # Errors
///
/// Same as [`vm_disk_package`].
pub fn ahv_vm_disk_package(
    name: Option<&str>,
    description: Option<&str>,
    config_data: Value,
) -> BlueprintResult<EntityDescriptor> {
    vm_disk_package(name, description, &ConfigSource::inline(config_data))
}
