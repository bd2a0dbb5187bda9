//! Credential authoring.

use crate::defaults::SECRET_VALUE_ATTR;
use crate::entity::EntityDescriptor;
use blueprint_core::SchemaKind;
use serde::{Deserialize, Serialize};

/// Secret type of a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CredentialType {
    /// Password
    #[default]
    Password,
    /// SSH private key
    Key,
}

impl CredentialType {
    /// Wire string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "PASSWORD",
            Self::Key => "KEY",
        }
    }
}

/// Build a credential holding a username and a secret
#[must_use]
pub fn basic_cred(
    name: &str,
    username: &str,
    secret: &str,
    kind: CredentialType,
) -> EntityDescriptor {
    EntityDescriptor::new(SchemaKind::Credential, name)
        .with_attr("type", kind.as_str())
        .with_attr("username", username)
        .with_attr(SECRET_VALUE_ATTR, secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;
    use serde_json::json;

    #[test]
    fn test_basic_cred_payload() {
        let cred = basic_cred("admin", "root", "hunter2", CredentialType::Password);
        let payload = Compiler::standard().unwrap().compile(&cred).unwrap();
        assert_eq!(
            payload.into_value(),
            json!({
                "name": "admin",
                "description": "",
                "type": "PASSWORD",
                "username": "root",
                "secret": {"value": "hunter2", "attrs": {"is_secret_modified": true}},
                "cred_class": "static",
                "editables": {}
            })
        );
    }

    #[test]
    fn test_key_credential() {
        let cred = basic_cred("deploy", "centos", "-----BEGIN KEY-----", CredentialType::Key);
        let payload = Compiler::standard().unwrap().compile(&cred).unwrap();
        assert_eq!(payload.get("type"), Some(&json!("KEY")));
    }

    #[test]
    fn test_credential_type_serde() {
        assert_eq!(serde_json::to_value(CredentialType::Key).unwrap(), json!("KEY"));
        assert_eq!(CredentialType::default(), CredentialType::Password);
    }
}
