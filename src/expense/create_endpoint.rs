//! Defines the endpoint for recording a new expense.
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
    expense::core::{EXPENSE_COLUMNS, Expense, NewExpense, check_account_owner, map_row_to_expense},
    extract::ValidJson,
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for recording an expense, responds with the created
/// expense and the status code 201.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    ValidJson(new_expense): ValidJson<NewExpense>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    check_account_owner(&new_expense.user_id, new_expense.account_id, &connection)?;

    let expense = create_expense(&new_expense, &connection)?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// Insert `new_expense` and return the stored row, including its id and
/// creation time.
///
/// The caller is responsible for checking that the account, if any, belongs
/// to the same owner, see [check_account_owner].
///
/// # Errors
/// Returns [Error::SqlError] if the insert fails.
pub fn create_expense(new_expense: &NewExpense, connection: &Connection) -> Result<Expense, Error> {
    connection
        .query_row(
            &format!(
                "INSERT INTO expense (user_id, title, amount, date, account_id, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                RETURNING {EXPENSE_COLUMNS}"
            ),
            params![
                new_expense.user_id,
                new_expense.title,
                new_expense.amount,
                new_expense.date,
                new_expense.account_id,
                OffsetDateTime::now_utc()
            ],
            map_row_to_expense,
        )
        .map_err(Error::from)
}
