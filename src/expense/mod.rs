//! Expenses and the route handlers that manage them.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod read_endpoints;

pub use core::{
    ACCOUNT_MESSAGE, AMOUNT_MESSAGE, Expense, ExpenseFormInput, ExpenseId, ExpensePayload,
    NewExpense, TITLE_MESSAGE, check_account_owner, create_expense_table, get_expense,
    get_total_spent, list_expenses, map_row_to_expense,
};
pub use create_endpoint::{create_expense, create_expense_endpoint};
pub use delete_endpoint::{delete_expense, delete_expense_endpoint};
pub use edit_endpoint::{edit_expense_endpoint, update_expense};
pub use read_endpoints::{
    TotalSpent, get_expense_endpoint, get_total_spent_endpoint, list_expenses_endpoint,
};
