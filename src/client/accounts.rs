//! Account queries and the account create, update and delete flows.

use serde::{Deserialize, Serialize};

use crate::{
    account::{Account, AccountFormInput, AccountId, AccountPayload, TotalBalance},
    client::{ClientError, LedgerClient, QueryKey, QueryOptions, StaleTime, Transport},
    money::Money,
    owner::OwnerId,
};

/// The cache key segment for an in-flight account create.
pub const LOADING_CREATE_ACCOUNT_KEY: &str = "loading-create-account";

/// The account being created, while the create request is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingCreateAccount {
    /// The payload sent to the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountPayload>,
}

/// The newest accounts of `owner`.
pub fn all_accounts_query(owner: &OwnerId) -> QueryOptions {
    QueryOptions::new(QueryKey::new(["accounts", owner.as_str()]))
}

/// The total balance across the accounts of `owner`.
pub fn total_balance_query(owner: &OwnerId) -> QueryOptions {
    QueryOptions::new(QueryKey::new(["total-balance", owner.as_str()]))
}

/// The placeholder for an in-flight account create.
pub fn loading_create_account_query() -> QueryOptions {
    QueryOptions::new(QueryKey::new([LOADING_CREATE_ACCOUNT_KEY])).stale_time(StaleTime::Infinity)
}

impl<T: Transport> LedgerClient<T> {
    /// The owner's accounts, newest first, from the cache when fresh.
    pub async fn accounts(&self) -> Result<Vec<Account>, ClientError> {
        self.queries
            .fetch_query(&all_accounts_query(&self.owner), || {
                self.api.list_accounts(&self.owner)
            })
            .await
    }

    /// The owner's total balance, from the cache when fresh.
    pub async fn total_balance(&self) -> Result<Money, ClientError> {
        let total: TotalBalance = self
            .queries
            .fetch_query(&total_balance_query(&self.owner), || {
                self.api.get_total_balance(&self.owner)
            })
            .await?;

        Ok(total.total_balance)
    }

    /// The account being created, if a create request is in flight.
    pub async fn loading_create_account(&self) -> Option<AccountPayload> {
        let loading: LoadingCreateAccount = self
            .queries
            .fetch_query(&loading_create_account_query(), || async {
                Ok(LoadingCreateAccount::default())
            })
            .await
            .ok()?;

        loading.account
    }

    /// Validate `form` and create the account.
    ///
    /// While the request is in flight the payload is cached as the loading
    /// placeholder. On success the new account is put at the front of the
    /// cached list. Whatever the outcome, the placeholder is cleared and the
    /// cached total balance is invalidated.
    ///
    /// # Errors
    /// Returns [ClientError::Invalid] without sending a request if the form
    /// fails validation, otherwise any error from the API.
    pub async fn create_account(&self, form: AccountFormInput) -> Result<Account, ClientError> {
        form.validate()?;

        let list_query = all_accounts_query(&self.owner);
        let existing_accounts = match self
            .queries
            .ensure_query_data(&list_query, || self.api.list_accounts(&self.owner))
            .await
        {
            Ok(accounts) => accounts,
            Err(error) => {
                self.notifier.error(&error.to_string());
                return Err(error);
            }
        };

        let payload = form.into_payload(&self.owner);
        let loading_key = loading_create_account_query().key;
        self.queries.set_query_data(
            &loading_key,
            &LoadingCreateAccount {
                account: Some(payload.clone()),
            },
        );

        let result = self.api.create_account(&payload).await;

        if let Ok(account) = &result {
            self.queries
                .update_query_data(&list_query.key, |accounts: Option<Vec<Account>>| {
                    let mut accounts = accounts.unwrap_or(existing_accounts);
                    accounts.insert(0, account.clone());
                    Some(accounts)
                });
        }
        self.notify(&result, "Account created!");

        self.queries
            .set_query_data(&loading_key, &LoadingCreateAccount::default());
        self.queries
            .invalidate_queries(&total_balance_query(&self.owner).key);

        result
    }

    /// Validate `form` and replace the name and balance of the account with
    /// `id`.
    ///
    /// On success the cached row is replaced and the total balance is
    /// invalidated. On failure the cache is left untouched.
    ///
    /// # Errors
    /// Returns [ClientError::Invalid] without sending a request if the form
    /// fails validation, otherwise any error from the API.
    pub async fn update_account(&self, id: AccountId, form: AccountFormInput) -> Result<Account, ClientError> {
        form.validate()?;

        let result = self
            .api
            .update_account(id, &form.into_payload(&self.owner))
            .await;

        if let Ok(updated) = &result {
            self.queries.update_query_data(
                &all_accounts_query(&self.owner).key,
                |accounts: Option<Vec<Account>>| {
                    let mut accounts = accounts?;
                    for account in accounts.iter_mut().filter(|account| account.id == id) {
                        *account = updated.clone();
                    }
                    Some(accounts)
                },
            );
            self.queries
                .invalidate_queries(&total_balance_query(&self.owner).key);
        }
        self.notify(&result, "Account updated!");

        result
    }

    /// Delete the account with `id`.
    ///
    /// On success the row is removed from the cached list and its balance is
    /// subtracted from the cached total. On failure the cache is left
    /// untouched.
    ///
    /// # Errors
    /// Returns any error from the API.
    pub async fn delete_account(&self, id: AccountId) -> Result<Account, ClientError> {
        let result = self.api.delete_account(&self.owner, id).await;

        if let Ok(deleted) = &result {
            self.queries.update_query_data(
                &all_accounts_query(&self.owner).key,
                |accounts: Option<Vec<Account>>| {
                    let mut accounts = accounts?;
                    accounts.retain(|account| account.id != id);
                    Some(accounts)
                },
            );
            self.queries.update_query_data(
                &total_balance_query(&self.owner).key,
                |total: Option<TotalBalance>| {
                    total.map(|total| TotalBalance {
                        total_balance: total.total_balance - deleted.balance,
                    })
                },
            );
        }
        self.notify(&result, "Account deleted!");

        result
    }
}
