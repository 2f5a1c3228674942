//! Accounts and the route handlers that manage them.

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod read_endpoints;

pub use core::{
    Account, AccountFormInput, AccountId, AccountPayload, BALANCE_MESSAGE, NAME_MESSAGE,
    NewAccount, create_account_table, get_account, get_total_account_balance, list_accounts,
    map_row_to_account,
};
pub use create_endpoint::{create_account, create_account_endpoint};
pub use delete_endpoint::{delete_account, delete_account_endpoint};
pub use edit_endpoint::{edit_account_endpoint, update_account};
pub use read_endpoints::{
    TotalBalance, get_account_endpoint, get_total_balance_endpoint, list_accounts_endpoint,
};

#[cfg(test)]
pub(crate) use core::test_utils;
