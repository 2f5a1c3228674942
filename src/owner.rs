//! The owner identifier that scopes every record.

use std::fmt::Display;

use rusqlite::{ToSql, types::ToSqlOutput};
use serde::{Deserialize, Serialize};

use crate::validation::{REQUIRED, ValidationErrors};

/// Identifies the user that owns a record.
///
/// The identifier is a UUID generated and persisted by the client. There is
/// no authentication: the server trusts whatever identifier the client sends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create an owner identifier.
    ///
    /// # Errors
    ///
    /// Returns a validation error on the path `userId` if `id` is empty or
    /// only whitespace.
    pub fn new(id: &str) -> Result<Self, ValidationErrors> {
        if id.trim().is_empty() {
            Err(ValidationErrors::single("userId", REQUIRED))
        } else {
            Ok(Self(id.to_owned()))
        }
    }

    /// Create an owner identifier without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(id: &str) -> Self {
        Self(id.to_owned())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for OwnerId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::OwnerId;

    #[test]
    fn rejects_blank_id() {
        let error = OwnerId::new("   ").unwrap_err();

        assert_eq!(error.message_for("userId"), Some("Required"));
    }

    #[test]
    fn keeps_id_verbatim() {
        let owner = OwnerId::new("3f1c9a52-5ad0-4c79-a0b3-2e7f0b1c8d44").unwrap();

        assert_eq!(owner.as_str(), "3f1c9a52-5ad0-4c79-a0b3-2e7f0b1c8d44");
    }
}
