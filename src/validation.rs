//! Field-level validation shared by the API handlers and the client forms.
//!
//! Each entity declares its schema as a [Validate] implementation that turns
//! a raw payload into a validated value, collecting every field error on the
//! way so that the same messages reach both the form and the API response.

use std::fmt::Display;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::money::Money;

/// The message used for a field that is missing from a payload.
pub const REQUIRED: &str = "Required";

/// The format for calendar dates in payloads, e.g. `2024-03-14`.
pub const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// The name of the offending field.
    pub path: String,
    /// A human readable description of the constraint that failed.
    pub message: String,
}

/// All the constraints a payload failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    issues: Vec<Issue>,
}

impl ValidationErrors {
    /// Create an error with a single issue.
    pub fn single(path: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.push(path, message);
        errors
    }

    /// Record a failed constraint for the field at `path`.
    pub fn push(&mut self, path: &str, message: &str) {
        self.issues.push(Issue {
            path: path.to_owned(),
            message: message.to_owned(),
        });
    }

    /// The failed constraints, in the order they were found.
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// The first message recorded for the field at `path`.
    pub fn message_for(&self, path: &str) -> Option<&str> {
        self.issues
            .iter()
            .find(|issue| issue.path == path)
            .map(|issue| issue.message.as_str())
    }

    /// Whether no constraints failed.
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Return `Ok(value)` if no constraints failed, otherwise `Err(self)`.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.path, issue.message))
            .collect();

        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A schema that validates a raw payload into `Self`.
pub trait Validate: Sized {
    /// The shape of the payload as it arrives over the wire.
    type Payload: DeserializeOwned;

    /// Check every constraint of the schema against `payload`.
    ///
    /// # Errors
    /// Returns every failed constraint if the payload is invalid.
    fn validate(payload: Self::Payload) -> Result<Self, ValidationErrors>;
}

/// Check that the field at `path` is present, recording [REQUIRED] if not.
pub fn required<'a>(
    value: Option<&'a str>,
    path: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    if value.is_none() {
        errors.push(path, REQUIRED);
    }

    value
}

/// Check that `value` has at least `min` characters.
pub fn min_length(
    value: Option<&str>,
    min: usize,
    path: &str,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = required(value, path, errors)?;

    if value.chars().count() < min {
        errors.push(path, message);
        return None;
    }

    Some(value.to_owned())
}

/// Check that `value` is a non-empty string.
pub fn non_empty(value: Option<&str>, path: &str, errors: &mut ValidationErrors) -> Option<String> {
    let value = required(value, path, errors)?;

    if value.trim().is_empty() {
        errors.push(path, REQUIRED);
        return None;
    }

    Some(value.to_owned())
}

/// Check that `value` is a monetary amount, see [Money::parse].
pub fn money(
    value: Option<&str>,
    path: &str,
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<Money> {
    let value = required(value, path, errors)?;
    let money = Money::parse(value);

    if money.is_none() {
        errors.push(path, message);
    }

    money
}

/// Check that `value` is a calendar date in [DATE_FORMAT].
pub fn date(value: Option<&str>, path: &str, errors: &mut ValidationErrors) -> Option<Date> {
    let value = required(value, path, errors)?;

    match Date::parse(value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(path, "Invalid date");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{REQUIRED, ValidationErrors, date, min_length, money, non_empty};
    use crate::money::Money;

    #[test]
    fn missing_fields_are_required() {
        let mut errors = ValidationErrors::default();

        assert_eq!(min_length(None, 3, "name", "too short", &mut errors), None);
        assert_eq!(money(None, "balance", "bad money", &mut errors), None);

        assert_eq!(errors.message_for("name"), Some(REQUIRED));
        assert_eq!(errors.message_for("balance"), Some(REQUIRED));
    }

    #[test]
    fn min_length_counts_characters() {
        let mut errors = ValidationErrors::default();

        assert_eq!(
            min_length(Some("€€€"), 3, "name", "too short", &mut errors),
            Some("€€€".to_owned())
        );
        assert_eq!(min_length(Some("ab"), 3, "name", "too short", &mut errors), None);
        assert_eq!(errors.issues().len(), 1);
        assert_eq!(errors.message_for("name"), Some("too short"));
    }

    #[test]
    fn non_empty_rejects_whitespace() {
        let mut errors = ValidationErrors::default();

        assert_eq!(non_empty(Some("  "), "userId", &mut errors), None);
        assert_eq!(errors.message_for("userId"), Some(REQUIRED));
    }

    #[test]
    fn money_uses_given_message() {
        let mut errors = ValidationErrors::default();

        assert_eq!(
            money(Some("12.5"), "amount", "bad", &mut errors),
            Some(Money::from_cents(1250))
        );
        assert_eq!(money(Some("12.555"), "amount", "bad", &mut errors), None);
        assert_eq!(errors.message_for("amount"), Some("bad"));
    }

    #[test]
    fn parses_iso_dates() {
        let mut errors = ValidationErrors::default();

        assert_eq!(
            date(Some("2024-02-29"), "date", &mut errors),
            Some(date!(2024 - 02 - 29))
        );
        assert_eq!(date(Some("2023-02-29"), "date", &mut errors), None);
        assert_eq!(date(Some("29/02/2024"), "date", &mut errors), None);
        assert_eq!(errors.issues().len(), 2);
    }

    #[test]
    fn display_joins_issues() {
        let mut errors = ValidationErrors::single("name", "too short");
        errors.push("balance", "bad money");

        assert_eq!(errors.to_string(), "name: too short; balance: bad money");
    }
}
