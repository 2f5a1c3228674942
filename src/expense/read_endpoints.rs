//! Defines the endpoints for listing expenses, getting a single expense and
//! getting the total amount spent.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    expense::core::{Expense, get_expense, get_total_spent, list_expenses},
    extract::{Owner, RecordId},
    money::Money,
};

/// The state needed to read expenses.
#[derive(Debug, Clone)]
pub struct ReadExpensesState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The maximum number of expenses to list.
    pub list_limit: u32,
}

impl FromRef<AppState> for ReadExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            list_limit: state.api_config.list_limit,
        }
    }
}

/// The response body for the total spent endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalSpent {
    /// The sum of the owner's expense amounts.
    pub total: Money,
}

/// A route handler that responds with the owner's most recent expenses.
pub async fn list_expenses_endpoint(
    State(state): State<ReadExpensesState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<Expense>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    list_expenses(&owner, state.list_limit, &connection).map(Json)
}

/// A route handler that responds with a single expense, or 404 if the owner
/// has no expense with the ID.
pub async fn get_expense_endpoint(
    State(state): State<ReadExpensesState>,
    RecordId(expense_id): RecordId,
    Owner(owner): Owner,
) -> Result<Json<Expense>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_expense(&owner, expense_id, &connection).map(Json)
}

/// A route handler that responds with the sum of the owner's expenses.
pub async fn get_total_spent_endpoint(
    State(state): State<ReadExpensesState>,
    Owner(owner): Owner,
) -> Result<Json<TotalSpent>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let total = get_total_spent(&owner, &connection)?;

    Ok(Json(TotalSpent { total }))
}
