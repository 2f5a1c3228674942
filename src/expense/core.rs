use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{AccountId, get_account},
    database_id::DatabaseId,
    money::Money,
    owner::OwnerId,
    validation::{self, DATE_FORMAT, Validate, ValidationErrors},
};

/// The database id of an expense.
pub type ExpenseId = DatabaseId;

/// The message for an expense title that is too short.
pub const TITLE_MESSAGE: &str = "Title must be at least 3 characters";
/// The message for an amount that is not a monetary value.
pub const AMOUNT_MESSAGE: &str = "The amount must be a valid monetary value";
/// The message for an account ID that does not name one of the owner's accounts.
pub const ACCOUNT_MESSAGE: &str = "Account does not exist";

const TITLE_MIN_LENGTH: usize = 3;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Money spent on a given day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The id for the expense.
    pub id: ExpenseId,
    /// The owner of the expense.
    pub user_id: OwnerId,
    /// What the money was spent on.
    pub title: String,
    /// How much was spent.
    pub amount: Money,
    /// The day the money was spent.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The account the money was paid from, if any.
    pub account_id: Option<AccountId>,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The JSON payload for creating or replacing an expense, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpensePayload {
    /// The owner identifier, sent as `userId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// What the money was spent on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The amount as a decimal string, e.g. `"4.50"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// The day in `YYYY-MM-DD` form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// The account paid from, sent as `accountId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
}

/// A validated expense payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    /// The owner of the expense.
    pub user_id: OwnerId,
    /// What the money was spent on, at least three characters long.
    pub title: String,
    /// How much was spent.
    pub amount: Money,
    /// The day the money was spent.
    pub date: Date,
    /// The account paid from. Must belong to the same owner.
    pub account_id: Option<AccountId>,
}

impl Validate for NewExpense {
    type Payload = ExpensePayload;

    fn validate(payload: ExpensePayload) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let user_id = validation::non_empty(payload.user_id.as_deref(), "userId", &mut errors);
        let (title, amount, date) = validate_fields(
            payload.title.as_deref(),
            payload.amount.as_deref(),
            payload.date.as_deref(),
            &mut errors,
        );

        match (user_id, title, amount, date) {
            (Some(user_id), Some(title), Some(amount), Some(date)) if errors.is_empty() => {
                Ok(Self {
                    user_id: OwnerId::new_unchecked(&user_id),
                    title,
                    amount,
                    date,
                    account_id: payload.account_id,
                })
            }
            _ => Err(errors),
        }
    }
}

/// The fields a user fills in to record an expense.
///
/// This is the expense schema without `userId`, which the client adds from
/// its persisted identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseFormInput {
    /// The title as typed.
    pub title: String,
    /// The amount as typed.
    pub amount: String,
    /// The date in `YYYY-MM-DD` form.
    pub date: String,
    /// The selected account, if any.
    pub account_id: Option<AccountId>,
}

impl ExpenseFormInput {
    /// An empty form with the date set to `today`.
    pub fn new(today: Date) -> Self {
        Self {
            date: today.format(DATE_FORMAT).unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Check the form against the expense schema.
    ///
    /// # Errors
    /// Returns every failed constraint.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        validate_fields(
            Some(&self.title),
            Some(&self.amount),
            Some(&self.date),
            &mut errors,
        );

        errors.finish(|| ())
    }

    /// Attach the owner to the form to produce an API payload.
    pub fn into_payload(self, owner: &OwnerId) -> ExpensePayload {
        ExpensePayload {
            user_id: Some(owner.to_string()),
            title: Some(self.title),
            amount: Some(self.amount),
            date: Some(self.date),
            account_id: self.account_id,
        }
    }
}

fn validate_fields(
    title: Option<&str>,
    amount: Option<&str>,
    date: Option<&str>,
    errors: &mut ValidationErrors,
) -> (Option<String>, Option<Money>, Option<Date>) {
    let title = validation::min_length(title, TITLE_MIN_LENGTH, "title", TITLE_MESSAGE, errors);
    let amount = validation::money(amount, "amount", AMOUNT_MESSAGE, errors);
    let date = validation::date(date, "date", errors);

    (title, amount, date)
}

/// Create the expense table and its owner index if they do not exist.
///
/// Expenses keep their row when the linked account is deleted.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            amount INTEGER NOT NULL,
            date TEXT NOT NULL,
            account_id INTEGER,
            created_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS expense_user_id_idx ON expense(user_id)",
        (),
    )?;

    Ok(())
}

/// The columns selected by [map_row_to_expense], in order.
pub const EXPENSE_COLUMNS: &str = "id, user_id, title, amount, date, account_id, created_at";

/// Map a row selected with [EXPENSE_COLUMNS] to an [Expense].
pub fn map_row_to_expense(row: &rusqlite::Row) -> Result<Expense, rusqlite::Error> {
    let user_id: String = row.get(1)?;

    Ok(Expense {
        id: row.get(0)?,
        user_id: OwnerId::new_unchecked(&user_id),
        title: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        account_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Check that `account_id`, if given, names an account of `owner`.
///
/// # Errors
/// Returns a validation error on the path `accountId` if the owner has no
/// such account.
pub fn check_account_owner(
    owner: &OwnerId,
    account_id: Option<AccountId>,
    connection: &Connection,
) -> Result<(), Error> {
    let Some(account_id) = account_id else {
        return Ok(());
    };

    match get_account(owner, account_id, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::Validation(ValidationErrors::single(
            "accountId",
            ACCOUNT_MESSAGE,
        ))),
        Err(error) => Err(error),
    }
}

/// Get the most recently created expenses of `owner`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_expenses(
    owner: &OwnerId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2"
        ))?
        .query_map(params![owner, limit], map_row_to_expense)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get the expense with `id` if it belongs to `owner`.
///
/// # Errors
/// Returns [Error::NotFound] if `owner` has no expense with `id`.
pub fn get_expense(owner: &OwnerId, id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!("SELECT {EXPENSE_COLUMNS} FROM expense WHERE user_id = ?1 AND id = ?2"),
            params![owner, id],
            map_row_to_expense,
        )
        .map_err(Error::from)
}

/// Get the total amount spent by `owner`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn get_total_spent(owner: &OwnerId, connection: &Connection) -> Result<Money, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0) FROM expense WHERE user_id = ?1",
            params![owner],
            |row| row.get(0),
        )
        .map_err(Error::from)
}
