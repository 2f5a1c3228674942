//! Search, sort and display helpers for the account and expense tables.

use std::cmp::Ordering;

use time::{Date, OffsetDateTime};

use crate::{
    account::{Account, AccountPayload},
    database_id::DatabaseId,
    expense::{Expense, ExpensePayload},
    money::Money,
    owner::OwnerId,
    validation::DATE_FORMAT,
};

/// The ID given to the optimistic row shown while a create is in flight.
pub const PLACEHOLDER_ID: DatabaseId = 999_999;

/// Whether `id` belongs to the optimistic row.
pub fn is_placeholder(id: DatabaseId) -> bool {
    id == PLACEHOLDER_ID
}

/// The value of a cell, used to order rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    /// Compared case-insensitively, with ties broken by the exact text.
    Text(&'a str),
    /// An amount of money.
    Money(Money),
    /// A calendar day.
    Date(Date),
    /// A point in time.
    DateTime(OffsetDateTime),
}

impl SortKey<'_> {
    fn compare(&self, other: &SortKey<'_>) -> Ordering {
        match (self, other) {
            (SortKey::Text(a), SortKey::Text(b)) => a
                .to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b)),
            (SortKey::Money(a), SortKey::Money(b)) => a.cmp(b),
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::DateTime(a), SortKey::DateTime(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// The direction to sort a column in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// The column to sort by and in which direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortDescriptor<C> {
    /// The column to sort by.
    pub column: C,
    /// The order of the rows.
    pub direction: SortDirection,
}

/// A record that can be shown as a table row.
pub trait TableRow: Sized {
    /// The sortable columns of the table.
    type Column: Copy;
    /// The create payload that an optimistic row is built from.
    type Payload;

    /// The text the search box matches against.
    fn search_text(&self) -> &str;

    /// The value of `column` for this row.
    fn sort_key(&self, column: Self::Column) -> SortKey<'_>;

    /// Build the optimistic row for an in-flight create.
    fn from_placeholder(payload: &Self::Payload, created_at: OffsetDateTime) -> Self;
}

/// The sortable columns of the accounts table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccountColumn {
    /// The account name.
    #[default]
    Name,
    /// The account balance.
    Balance,
    /// When the account was created.
    CreatedAt,
}

impl TableRow for Account {
    type Column = AccountColumn;
    type Payload = AccountPayload;

    fn search_text(&self) -> &str {
        &self.name
    }

    fn sort_key(&self, column: AccountColumn) -> SortKey<'_> {
        match column {
            AccountColumn::Name => SortKey::Text(&self.name),
            AccountColumn::Balance => SortKey::Money(self.balance),
            AccountColumn::CreatedAt => SortKey::DateTime(self.created_at),
        }
    }

    fn from_placeholder(payload: &AccountPayload, created_at: OffsetDateTime) -> Self {
        Account {
            id: PLACEHOLDER_ID,
            user_id: OwnerId::new_unchecked(payload.user_id.as_deref().unwrap_or_default()),
            name: payload.name.clone().unwrap_or_default(),
            balance: parse_money_or_zero(payload.balance.as_deref()),
            created_at,
        }
    }
}

/// The sortable columns of the expenses table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpenseColumn {
    /// The expense title.
    #[default]
    Title,
    /// The amount spent.
    Amount,
    /// The day the money was spent.
    Date,
    /// When the expense was recorded.
    CreatedAt,
}

impl TableRow for Expense {
    type Column = ExpenseColumn;
    type Payload = ExpensePayload;

    fn search_text(&self) -> &str {
        &self.title
    }

    fn sort_key(&self, column: ExpenseColumn) -> SortKey<'_> {
        match column {
            ExpenseColumn::Title => SortKey::Text(&self.title),
            ExpenseColumn::Amount => SortKey::Money(self.amount),
            ExpenseColumn::Date => SortKey::Date(self.date),
            ExpenseColumn::CreatedAt => SortKey::DateTime(self.created_at),
        }
    }

    fn from_placeholder(payload: &ExpensePayload, created_at: OffsetDateTime) -> Self {
        let date = payload
            .date
            .as_deref()
            .and_then(|date| Date::parse(date, DATE_FORMAT).ok())
            .unwrap_or(created_at.date());

        Expense {
            id: PLACEHOLDER_ID,
            user_id: OwnerId::new_unchecked(payload.user_id.as_deref().unwrap_or_default()),
            title: payload.title.clone().unwrap_or_default(),
            amount: parse_money_or_zero(payload.amount.as_deref()),
            date,
            account_id: payload.account_id,
            created_at,
        }
    }
}

fn parse_money_or_zero(text: Option<&str>) -> Money {
    text.and_then(Money::parse).unwrap_or(Money::ZERO)
}

/// Put the optimistic row for `placeholder`, if any, in front of `rows`.
pub fn with_placeholder<R: TableRow>(mut rows: Vec<R>, placeholder: Option<&R::Payload>) -> Vec<R> {
    if let Some(payload) = placeholder {
        rows.insert(0, R::from_placeholder(payload, OffsetDateTime::now_utc()));
    }

    rows
}

/// Keep the rows whose search text contains `query`, ignoring case.
///
/// An empty query keeps every row.
pub fn search<R: TableRow>(rows: Vec<R>, query: &str) -> Vec<R> {
    let query = query.to_lowercase();

    if query.is_empty() {
        return rows;
    }

    rows.into_iter()
        .filter(|row| row.search_text().to_lowercase().contains(&query))
        .collect()
}

/// Sort `rows` in place. Rows that compare equal keep their order.
pub fn sort<R: TableRow>(rows: &mut [R], descriptor: SortDescriptor<R::Column>) {
    rows.sort_by(|a, b| {
        let ordering = a
            .sort_key(descriptor.column)
            .compare(&b.sort_key(descriptor.column));

        match descriptor.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
}

/// Format an amount as dollars with thousands separators, e.g. `$1,234.50`
/// or `-$12.00`.
pub fn format_currency(amount: Money) -> String {
    let sign = if amount.cents() < 0 { "-" } else { "" };
    let cents = amount.cents().unsigned_abs();
    let (dollars, cents) = (cents / 100, cents % 100);

    format!("{sign}${}.{cents:02}", group_thousands(dollars))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}
