//! Defines the endpoints for listing accounts, getting a single account and
//! getting the total balance.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    account::core::{Account, get_account, get_total_account_balance, list_accounts},
    extract::{Owner, RecordId},
    money::Money,
};

/// The state needed to read accounts.
#[derive(Debug, Clone)]
pub struct ReadAccountsState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The maximum number of accounts to list.
    pub list_limit: u32,
}

impl FromRef<AppState> for ReadAccountsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            list_limit: state.api_config.list_limit,
        }
    }
}

/// The response body for the total balance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalBalance {
    /// The sum of the owner's account balances.
    pub total_balance: Money,
}

/// A route handler that responds with the owner's most recent accounts.
pub async fn list_accounts_endpoint(
    State(state): State<ReadAccountsState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<Account>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    list_accounts(&owner, state.list_limit, &connection).map(Json)
}

/// A route handler that responds with a single account, or 404 if the owner
/// has no account with the ID.
pub async fn get_account_endpoint(
    State(state): State<ReadAccountsState>,
    RecordId(account_id): RecordId,
    Owner(owner): Owner,
) -> Result<Json<Account>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_account(&owner, account_id, &connection).map(Json)
}

/// A route handler that responds with the sum of the owner's balances.
pub async fn get_total_balance_endpoint(
    State(state): State<ReadAccountsState>,
    Owner(owner): Owner,
) -> Result<Json<TotalBalance>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let total_balance = get_total_account_balance(&owner, &connection)?;

    Ok(Json(TotalBalance { total_balance }))
}
