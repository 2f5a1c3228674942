//! Exact monetary amounts that travel as decimal strings.

use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Sub},
    str::FromStr,
    sync::LazyLock,
};

use regex::Regex;
use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// The accepted textual form of a monetary value in a payload: digits with an
/// optional fractional part of one or two digits.
pub const MONEY_PATTERN: &str = r"^\d+(\.\d{1,2})?$";

static MONEY_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MONEY_PATTERN).expect("money pattern is a valid regex"));

/// An amount of money stored as a whole number of cents.
///
/// Amounts are written to the database as cents and rendered as a decimal
/// string with exactly two fractional digits, e.g. `"100.00"`. Floating point
/// numbers are never involved, so sums and differences are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// The largest amount that fits a `numeric(12, 2)` column.
    pub const MAX: Money = Money(999_999_999_999);

    /// Zero dollars.
    pub const ZERO: Money = Money(0);

    /// Parse a payload string against [MONEY_PATTERN].
    ///
    /// Returns `None` if the string does not match the pattern or the amount
    /// is larger than [Money::MAX].
    pub fn parse(text: &str) -> Option<Self> {
        if !MONEY_REGEX.is_match(text) {
            return None;
        }

        let money = Self::from_decimal(Decimal::from_str(text).ok()?)?;

        (money <= Self::MAX).then_some(money)
    }

    /// Create an amount from a number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount as a whole number of cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// The amount as an exact decimal with a scale of two.
    pub fn as_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// The amount as a float, for display formatting only.
    pub fn to_f64(self) -> f64 {
        self.as_decimal().to_f64().unwrap_or_default()
    }

    fn from_decimal(decimal: Decimal) -> Option<Self> {
        if decimal.normalize().scale() > 2 {
            return None;
        }

        decimal
            .checked_mul(Decimal::ONE_HUNDRED)?
            .to_i64()
            .map(Self)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_decimal())
    }
}

/// Error returned when a string is not a decimal amount with at most two
/// fractional digits.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("\"{0}\" is not a valid monetary value")]
pub struct ParseMoneyError(String);

/// Parses any decimal amount with at most two fractional digits, including
/// negative amounts. Use [Money::parse] to validate user input.
impl FromStr for Money {
    type Err = ParseMoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .ok()
            .and_then(Self::from_decimal)
            .ok_or_else(|| ParseMoneyError(s.to_owned()))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;

        text.parse().map_err(de::Error::custom)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Money)
    }
}
