//! Defines the endpoint for updating an expense.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::{Connection, params};

use crate::{
    AppState, Error,
    expense::core::{
        EXPENSE_COLUMNS, Expense, ExpenseId, NewExpense, check_account_owner, get_expense,
        map_row_to_expense,
    },
    extract::{RecordId, ValidJson},
};

/// The state needed to edit an expense.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that replaces the fields of an expense and responds with
/// the updated expense, or 404 if the payload's owner has no such expense.
///
/// A missing expense takes precedence over an unknown `accountId`.
pub async fn edit_expense_endpoint(
    State(state): State<EditExpenseState>,
    RecordId(expense_id): RecordId,
    ValidJson(expense): ValidJson<NewExpense>,
) -> Result<Json<Expense>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    get_expense(&expense.user_id, expense_id, &connection)?;
    check_account_owner(&expense.user_id, expense.account_id, &connection)?;

    update_expense(expense_id, &expense, &connection).map(Json)
}

/// Replace the fields of the expense with `id` owned by `expense.user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if the owner has no expense with `id`.
pub fn update_expense(
    id: ExpenseId,
    expense: &NewExpense,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!(
                "UPDATE expense
                SET title = ?1, amount = ?2, date = ?3, account_id = ?4
                WHERE id = ?5 AND user_id = ?6
                RETURNING {EXPENSE_COLUMNS}"
            ),
            params![
                expense.title,
                expense.amount,
                expense.date,
                expense.account_id,
                id,
                expense.user_id
            ],
            map_row_to_expense,
        )
        .map_err(Error::from)
}
