//! Defines the endpoint for deleting an account.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    account::core::{ACCOUNT_COLUMNS, Account, AccountId, map_row_to_account},
    extract::{Owner, RecordId},
    owner::OwnerId,
};

/// The state needed to delete an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountState {
    /// The database connection for managing account.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an account, responds with the deleted account.
pub async fn delete_account_endpoint(
    State(state): State<DeleteAccountState>,
    RecordId(account_id): RecordId,
    Owner(owner): Owner,
) -> Result<Json<Account>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_account(&owner, account_id, &connection).map(Json)
}

/// Delete the account with `id` owned by `owner`, returning the deleted row.
///
/// Expenses that referenced the account keep their row with the account
/// cleared.
///
/// # Errors
/// Returns [Error::NotFound] if the owner has no account with `id`.
pub fn delete_account(owner: &OwnerId, id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            &format!("DELETE FROM account WHERE user_id = ?1 AND id = ?2 RETURNING {ACCOUNT_COLUMNS}"),
            params![owner, id],
            map_row_to_account,
        )
        .map_err(Error::from)
}
