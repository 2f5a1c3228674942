use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::DatabaseId,
    money::Money,
    owner::OwnerId,
    validation::{self, Validate, ValidationErrors},
};

/// The database id of an account.
pub type AccountId = DatabaseId;

/// The message for an account name that is too short.
pub const NAME_MESSAGE: &str = "Name must be at least 3 characters";
/// The message for a balance that is not a monetary value.
pub const BALANCE_MESSAGE: &str = "The balance must be a valid monetary value";

const NAME_MIN_LENGTH: usize = 3;

/// A bucket of money such as a wallet or bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The owner of the account.
    pub user_id: OwnerId,
    /// The display name of the account.
    pub name: String,
    /// The amount of money in the account.
    pub balance: Money,
    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The JSON payload for creating or replacing an account, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPayload {
    /// The owner identifier, sent as `userId`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// The account name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The balance as a decimal string, e.g. `"12.50"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

/// A validated account payload: the account without its server assigned
/// fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    /// The owner of the account.
    pub user_id: OwnerId,
    /// The display name, at least three characters long.
    pub name: String,
    /// The starting balance.
    pub balance: Money,
}

impl Validate for NewAccount {
    type Payload = AccountPayload;

    fn validate(payload: AccountPayload) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let user_id = validation::non_empty(payload.user_id.as_deref(), "userId", &mut errors);
        let (name, balance) = validate_fields(
            payload.name.as_deref(),
            payload.balance.as_deref(),
            &mut errors,
        );

        match (user_id, name, balance) {
            (Some(user_id), Some(name), Some(balance)) if errors.is_empty() => Ok(Self {
                user_id: OwnerId::new_unchecked(&user_id),
                name,
                balance,
            }),
            _ => Err(errors),
        }
    }
}

/// The fields a user fills in to create or edit an account.
///
/// This is the account schema without `userId`, which the client adds from
/// its persisted identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFormInput {
    /// The name as typed.
    pub name: String,
    /// The balance as typed.
    pub balance: String,
}

impl AccountFormInput {
    /// Check the form against the account schema.
    ///
    /// # Errors
    /// Returns every failed constraint.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        validate_fields(Some(&self.name), Some(&self.balance), &mut errors);

        errors.finish(|| ())
    }

    /// Attach the owner to the form to produce an API payload.
    pub fn into_payload(self, owner: &OwnerId) -> AccountPayload {
        AccountPayload {
            user_id: Some(owner.to_string()),
            name: Some(self.name),
            balance: Some(self.balance),
        }
    }
}

fn validate_fields(
    name: Option<&str>,
    balance: Option<&str>,
    errors: &mut ValidationErrors,
) -> (Option<String>, Option<Money>) {
    let name = validation::min_length(name, NAME_MIN_LENGTH, "name", NAME_MESSAGE, errors);
    let balance = validation::money(balance, "balance", BALANCE_MESSAGE, errors);

    (name, balance)
}

/// Create the account table and its owner index if they do not exist.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            balance INTEGER NOT NULL,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS account_user_id_idx ON account(user_id)",
        (),
    )?;

    Ok(())
}

/// The columns selected by [map_row_to_account], in order.
pub const ACCOUNT_COLUMNS: &str = "id, user_id, name, balance, created_at";

/// Map a row selected with [ACCOUNT_COLUMNS] to an [Account].
pub fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id: String = row.get(1)?;
    let name = row.get(2)?;
    let balance = row.get(3)?;
    let created_at = row.get(4)?;

    Ok(Account {
        id,
        user_id: OwnerId::new_unchecked(&user_id),
        name,
        balance,
        created_at,
    })
}

/// Get the most recently created accounts of `owner`, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn list_accounts(
    owner: &OwnerId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2"
        ))?
        .query_map(params![owner, limit], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Get the account with `id` if it belongs to `owner`.
///
/// # Errors
/// Returns [Error::NotFound] if `owner` has no account with `id`.
pub fn get_account(owner: &OwnerId, id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE user_id = ?1 AND id = ?2"),
            params![owner, id],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get the total balance across all accounts of `owner`.
///
/// # Errors
/// Returns [Error] if:
/// - SQL query preparation or execution fails
pub fn get_total_account_balance(owner: &OwnerId, connection: &Connection) -> Result<Money, Error> {
    let mut stmt =
        connection.prepare("SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = ?1")?;

    let total = stmt.query_row(params![owner], |row| row.get(0))?;

    Ok(total)
}
