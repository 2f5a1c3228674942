//! Defines the endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use rusqlite::{Connection, params};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    account::core::{ACCOUNT_COLUMNS, Account, NewAccount, map_row_to_account},
    extract::ValidJson,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for creating a new account, responds with the created
/// account and the status code 201.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    ValidJson(new_account): ValidJson<NewAccount>,
) -> Result<(StatusCode, Json<Account>), Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let account = create_account(&new_account, &connection).inspect_err(|error| {
        tracing::error!("Could not create account with {new_account:?}: {error}")
    })?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Insert `new_account` and return the stored row, including its id and
/// creation time.
///
/// # Errors
/// Returns [Error::SqlError] if the insert fails.
pub fn create_account(new_account: &NewAccount, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            &format!(
                "INSERT INTO account (user_id, name, balance, created_at) VALUES (?1, ?2, ?3, ?4)
                RETURNING {ACCOUNT_COLUMNS}"
            ),
            params![
                new_account.user_id,
                new_account.name,
                new_account.balance,
                OffsetDateTime::now_utc()
            ],
            map_row_to_account,
        )
        .map_err(Error::from)
}
