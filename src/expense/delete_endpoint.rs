//! Defines the endpoint for deleting an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    expense::core::{EXPENSE_COLUMNS, Expense, ExpenseId, map_row_to_expense},
    extract::{Owner, RecordId},
    owner::OwnerId,
};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense, responds with the deleted expense
/// so that the client can adjust its cached total.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    RecordId(expense_id): RecordId,
    Owner(owner): Owner,
) -> Result<Json<Expense>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    delete_expense(&owner, expense_id, &connection).map(Json)
}

/// Delete the expense with `id` owned by `owner`, returning the deleted row.
///
/// # Errors
/// Returns [Error::NotFound] if the owner has no expense with `id`.
pub fn delete_expense(owner: &OwnerId, id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!("DELETE FROM expense WHERE user_id = ?1 AND id = ?2 RETURNING {EXPENSE_COLUMNS}"),
            params![owner, id],
            map_row_to_expense,
        )
        .map_err(Error::from)
}
