//! The client data layer: a typed API client, a query cache and the
//! create, update and delete flows that keep the cache in step with the
//! server.

use std::sync::Arc;

mod accounts;
mod api;
mod cache;
mod error;
mod expenses;
mod identity;
mod notify;
mod transport;

pub use accounts::{
    LOADING_CREATE_ACCOUNT_KEY, LoadingCreateAccount, all_accounts_query,
    loading_create_account_query, total_balance_query,
};
pub use api::ApiClient;
pub use cache::{DEFAULT_STALE_TIME, QueryCache, QueryClient, QueryKey, QueryOptions, StaleTime};
pub use error::{ClientError, UNKNOWN_ERROR_MESSAGE};
pub use expenses::{
    LOADING_CREATE_EXPENSE_KEY, LoadingCreateExpense, all_expenses_query,
    loading_create_expense_query, total_spent_query,
};
pub use identity::ClientIdentity;
pub use notify::{LogNotifier, Notification, NotificationLog, Notifier};
pub use transport::Transport;

use crate::owner::OwnerId;

/// Ties the API client, the query cache and the notifier together for one
/// owner.
///
/// The account and expense flows are defined as methods on this type.
#[derive(Clone)]
pub struct LedgerClient<T> {
    api: ApiClient<T>,
    queries: QueryClient,
    notifier: Arc<dyn Notifier>,
    owner: OwnerId,
}

impl<T: Transport> LedgerClient<T> {
    /// Create a client that acts on behalf of `owner`.
    pub fn new(api: ApiClient<T>, queries: QueryClient, notifier: Arc<dyn Notifier>, owner: OwnerId) -> Self {
        Self {
            api,
            queries,
            notifier,
            owner,
        }
    }

    /// The typed API client.
    pub fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    /// The query cache shared by the flows.
    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    /// The owner the client acts for.
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    /// Report the outcome of a mutation to the notifier.
    fn notify<R>(&self, result: &Result<R, ClientError>, success_message: &str) {
        match result {
            Ok(_) => self.notifier.success(success_message),
            Err(error) => self.notifier.error(&error.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use std::sync::Arc;

    use rusqlite::Connection;

    use crate::{
        AppState, app_state::ApiConfig, build_router,
        client::{ApiClient, LedgerClient, NotificationLog, QueryClient},
        owner::OwnerId,
    };

    /// A client backed by an in-memory database, and the log its
    /// notifications go to.
    pub fn get_test_client(owner: &str) -> (LedgerClient<axum::Router>, Arc<NotificationLog>) {
        let state = AppState::new(
            Connection::open_in_memory().expect("Could not open database in memory."),
            ApiConfig::default(),
        )
        .expect("Could not create app state.");
        let notifications = Arc::new(NotificationLog::default());

        let client = LedgerClient::new(
            ApiClient::new(build_router(state)),
            QueryClient::new(),
            notifications.clone(),
            OwnerId::new_unchecked(owner),
        );

        (client, notifications)
    }
}
