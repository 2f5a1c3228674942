//! Creates the application's database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, account::create_account_table, expense::create_expense_table};

/// Create the tables and indices for all domain models.
///
/// Tables are created inside a single exclusive transaction so that a
/// database is either fully initialized or left untouched. Calling this
/// function on an initialized database is a no-op.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
