//! Defines the endpoint for updating an account
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    account::core::{ACCOUNT_COLUMNS, Account, AccountId, NewAccount, map_row_to_account},
    extract::{RecordId, ValidJson},
};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that replaces the name and balance of an account and
/// responds with the updated account.
///
/// The account must belong to the owner named in the payload, otherwise the
/// response is 404.
pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    RecordId(account_id): RecordId,
    ValidJson(account): ValidJson<NewAccount>,
) -> Result<Json<Account>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    update_account(account_id, &account, &connection)
        .inspect_err(|error| {
            if *error != Error::NotFound {
                tracing::error!("Could not update account {account_id}: {error}");
            }
        })
        .map(Json)
}

/// Replace the fields of the account with `id` owned by `account.user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the owner has no account with `id`.
pub fn update_account(
    id: AccountId,
    account: &NewAccount,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE account
                SET name = ?1, balance = ?2
                WHERE id = ?3 AND user_id = ?4
                RETURNING {ACCOUNT_COLUMNS}"
            ),
            params![account.name, account.balance, id, account.user_id],
            map_row_to_account,
        )
        .map_err(Error::from)
}
