use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid PDB ID '{0}'")]
pub struct IdentifierError(pub String);

/// A four-character Protein Data Bank entry code, e.g. `1CRN`.
///
/// The first character is a digit in `1..=9`; the remaining three are ASCII letters or
/// digits. Codes are stored in upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PdbId(String);

impl PdbId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PdbId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let valid = bytes.len() == 4
            && matches!(bytes[0], b'1'..=b'9')
            && bytes.iter().all(u8::is_ascii_alphanumeric);
        if !valid {
            return Err(IdentifierError(s.to_string()));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }
}

impl fmt::Display for PdbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `name` is usable as an engine object name or file stem.
///
/// Object names end up inside quoted command arguments and workspace file names, so they
/// must be non-empty and free of whitespace, quotes and path separators.
pub fn is_valid_object_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '\'' | '"' | '/' | '\\'))
}
