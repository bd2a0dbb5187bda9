//! Source identifiers.
//!
//! Decompiled source names entities by identifier. Names that are not valid
//! identifiers are corrected by prefixing `D`.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("word pattern"));

/// Prefix applied to names that are not valid identifiers
pub const IDENTIFIER_PREFIX: &str = "D";

/// Prefix of generated credential variable names
pub const CREDENTIAL_VAR_PREFIX: &str = "BP_CRED_";

/// Check whether a name is a valid source identifier
#[must_use]
pub fn is_source_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Return the name unchanged if it is an identifier, else prefixed with `D`
#[must_use]
pub fn correct_identifier(name: &str) -> String {
    if is_source_identifier(name) {
        name.to_string()
    } else {
        format!("{}{}", IDENTIFIER_PREFIX, name)
    }
}

/// Variable name under which a credential is declared in decompiled source
#[must_use]
pub fn credential_var_name(credential: &str) -> String {
    format!(
        "{}{}",
        CREDENTIAL_VAR_PREFIX,
        NON_WORD.replace_all(credential, "_")
    )
}
