//! Discriminator tables and wire constants.
//!
//! The remote API compares these strings byte for byte, so every enumerated
//! constant here is part of the wire protocol.

use crate::error::BlueprintError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Package type emitted for every downloadable image
pub const SUBSTRATE_IMAGE: &str = "SUBSTRATE_IMAGE";
/// Default image type
pub const DISK_IMAGE: &str = "DISK_IMAGE";
/// ISO image type, the only one that carries a checksum
pub const ISO_IMAGE: &str = "ISO_IMAGE";
/// Default image architecture
pub const X86_64: &str = "X86_64";
/// Default product version of a downloadable image
pub const DEFAULT_PRODUCT_VERSION: &str = "1.0";
/// Fallback entity name for a downloadable image
pub const VM_DISK_PACKAGE_NAME: &str = "VmDiskPackage";

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire string for this variant
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// Parse a wire string
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($wire => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Wire strings of every variant
            #[must_use]
            pub fn wire_values() -> Vec<&'static str> {
                Self::ALL.iter().map(Self::as_str).collect()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = BlueprintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s).ok_or_else(|| BlueprintError::UnsupportedKind {
                    kind: format!("{} {}", $label, s),
                })
            }
        }
    };
}

wire_enum! {
    /// Primary task discriminator
    TaskKind, "task type" {
        /// Run a script on the target
        Exec => "EXEC",
        /// Run a script and capture variables from its output
        SetVariable => "SET_VARIABLE",
        /// Sleep for a fixed interval
        Delay => "DELAY",
        /// Scale a deployment out or in
        Scaling => "SCALING",
        /// Issue an HTTP request
        Http => "HTTP",
        /// Invoke another runbook
        CallRunbook => "CALL_RUNBOOK",
    }
}

wire_enum! {
    /// Script language of `EXEC` and `SET_VARIABLE` tasks
    ScriptType, "script type" {
        /// Shell script executed over SSH
        Shell => "sh",
        /// Static escript executed by the management server
        Static => "static",
        /// PowerShell script
        PowerShell => "npsscript",
    }
}

wire_enum! {
    /// Direction of a `SCALING` task
    ScalingType, "scaling type" {
        /// Add replicas
        ScaleOut => "SCALEOUT",
        /// Remove replicas
        ScaleIn => "SCALEIN",
    }
}

wire_enum! {
    /// Method of an `HTTP` task
    HttpMethod, "http method" {
        /// GET
        Get => "GET",
        /// POST
        Post => "POST",
        /// PUT
        Put => "PUT",
        /// DELETE
        Delete => "DELETE",
    }
}

wire_enum! {
    /// Sensitivity of an HTTP header or variable
    HeaderType, "header type" {
        /// Plain value
        Local => "LOCAL",
        /// Secret value
        Secret => "SECRET",
    }
}

wire_enum! {
    /// Outcome an expected HTTP status code maps to
    ExpectedStatus, "response status" {
        /// Treat the code as success
        Success => "SUCCESS",
        /// Treat the code as failure
        Failure => "FAILURE",
    }
}

wire_enum! {
    /// Type of a downloadable image
    ImageType, "image type" {
        /// Disk image (default)
        Disk => "DISK_IMAGE",
        /// ISO image
        Iso => "ISO_IMAGE",
    }
}

impl ScriptType {
    /// File extension of an externalized script of this type
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Shell => "sh",
            Self::Static => "py",
            Self::PowerShell => "ps1",
        }
    }
}

/// Schema kind: the discriminator the validator registry is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaKind {
    /// Reference pointer
    Ref,
    /// HTTP header entry
    HttpHeader,
    /// Expected HTTP response entry
    ResponseStatus,
    /// Image checksum block
    ImageChecksum,
    /// Variable
    Variable,
    /// Credential
    Credential,
    /// Task of the given kind
    Task(TaskKind),
    /// Downloadable disk image package
    VmDiskPackage,
}

const TASK_TAG_PREFIX: &str = "app_task:";

impl SchemaKind {
    /// Every schema kind
    pub const ALL: [SchemaKind; 13] = [
        SchemaKind::Ref,
        SchemaKind::HttpHeader,
        SchemaKind::ResponseStatus,
        SchemaKind::ImageChecksum,
        SchemaKind::Variable,
        SchemaKind::Credential,
        SchemaKind::Task(TaskKind::Exec),
        SchemaKind::Task(TaskKind::SetVariable),
        SchemaKind::Task(TaskKind::Delay),
        SchemaKind::Task(TaskKind::Scaling),
        SchemaKind::Task(TaskKind::Http),
        SchemaKind::Task(TaskKind::CallRunbook),
        SchemaKind::VmDiskPackage,
    ];

    /// Registry tag of this kind
    #[must_use]
    pub fn tag(&self) -> String {
        match self {
            Self::Ref => "app_ref".to_string(),
            Self::HttpHeader => "app_http_header".to_string(),
            Self::ResponseStatus => "app_response_status".to_string(),
            Self::ImageChecksum => "app_image_checksum".to_string(),
            Self::Variable => "app_variable".to_string(),
            Self::Credential => "app_credential".to_string(),
            Self::Task(kind) => format!("{}{}", TASK_TAG_PREFIX, kind.as_str()),
            Self::VmDiskPackage => "app_vm_disk_package".to_string(),
        }
    }

    /// Parse a registry tag
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        if let Some(task) = tag.strip_prefix(TASK_TAG_PREFIX) {
            return TaskKind::parse(task).map(Self::Task);
        }
        Self::ALL
            .iter()
            .copied()
            .filter(|kind| !matches!(kind, Self::Task(_)))
            .find(|kind| kind.tag() == tag)
    }

    /// Task kind, if this is a task schema
    #[must_use]
    pub fn task_kind(&self) -> Option<TaskKind> {
        match self {
            Self::Task(kind) => Some(*kind),
            _ => None,
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag())
    }
}
