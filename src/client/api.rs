//! A typed client for the accounts and expenses API.

use axum::http::Method;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    account::{Account, AccountId, AccountPayload, TotalBalance},
    client::{
        ClientError,
        transport::{Transport, build_request},
    },
    endpoints::{self, format_endpoint},
    expense::{Expense, ExpenseId, ExpensePayload, TotalSpent},
    owner::OwnerId,
    validation::Issue,
};

/// The error body the server sends with non-success responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(default)]
    details: Vec<Issue>,
}

/// Calls the API through a [Transport].
#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
}

impl<T: Transport> ApiClient<T> {
    /// Create a client that sends its requests through `transport`.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// The transport requests are sent through.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the newest accounts of `owner`.
    pub async fn list_accounts(&self, owner: &OwnerId) -> Result<Vec<Account>, ClientError> {
        self.get(&with_owner(endpoints::ACCOUNTS, owner)?, "Error fetching accounts")
            .await
    }

    /// Fetch a single account of `owner`.
    pub async fn get_account(&self, owner: &OwnerId, id: AccountId) -> Result<Account, ClientError> {
        let uri = with_owner(&format_endpoint(endpoints::ACCOUNT, id), owner)?;

        self.get(&uri, "Error fetching account").await
    }

    /// Fetch the total balance across the accounts of `owner`.
    pub async fn get_total_balance(&self, owner: &OwnerId) -> Result<TotalBalance, ClientError> {
        self.get(
            &with_owner(endpoints::ACCOUNTS_TOTAL, owner)?,
            "Error fetching total balance",
        )
        .await
    }

    /// Create an account.
    pub async fn create_account(&self, payload: &AccountPayload) -> Result<Account, ClientError> {
        self.send_json(Method::POST, endpoints::ACCOUNTS, payload, "Error creating account")
            .await
    }

    /// Replace the name and balance of the account with `id`.
    pub async fn update_account(
        &self,
        id: AccountId,
        payload: &AccountPayload,
    ) -> Result<Account, ClientError> {
        self.send_json(
            Method::PATCH,
            &format_endpoint(endpoints::ACCOUNT, id),
            payload,
            "Error updating account",
        )
        .await
    }

    /// Delete an account of `owner`, returning the deleted account.
    pub async fn delete_account(&self, owner: &OwnerId, id: AccountId) -> Result<Account, ClientError> {
        let uri = with_owner(&format_endpoint(endpoints::ACCOUNT, id), owner)?;

        self.send(Method::DELETE, &uri, None, "Error deleting account")
            .await
    }

    /// Fetch the newest expenses of `owner`.
    pub async fn list_expenses(&self, owner: &OwnerId) -> Result<Vec<Expense>, ClientError> {
        self.get(&with_owner(endpoints::EXPENSES, owner)?, "Error fetching expenses")
            .await
    }

    /// Fetch a single expense of `owner`.
    pub async fn get_expense(&self, owner: &OwnerId, id: ExpenseId) -> Result<Expense, ClientError> {
        let uri = with_owner(&format_endpoint(endpoints::EXPENSE, id), owner)?;

        self.get(&uri, "Error fetching expense").await
    }

    /// Fetch the total amount `owner` has spent.
    pub async fn get_total_spent(&self, owner: &OwnerId) -> Result<TotalSpent, ClientError> {
        self.get(
            &with_owner(endpoints::EXPENSES_TOTAL, owner)?,
            "Error fetching total spent",
        )
        .await
    }

    /// Record an expense.
    pub async fn create_expense(&self, payload: &ExpensePayload) -> Result<Expense, ClientError> {
        self.send_json(Method::POST, endpoints::EXPENSES, payload, "Error creating expense")
            .await
    }

    /// Replace the fields of the expense with `id`.
    pub async fn update_expense(
        &self,
        id: ExpenseId,
        payload: &ExpensePayload,
    ) -> Result<Expense, ClientError> {
        self.send_json(
            Method::PATCH,
            &format_endpoint(endpoints::EXPENSE, id),
            payload,
            "Error updating expense",
        )
        .await
    }

    /// Delete an expense of `owner`, returning the deleted expense.
    pub async fn delete_expense(&self, owner: &OwnerId, id: ExpenseId) -> Result<Expense, ClientError> {
        let uri = with_owner(&format_endpoint(endpoints::EXPENSE, id), owner)?;

        self.send(Method::DELETE, &uri, None, "Error deleting expense")
            .await
    }

    async fn get<R: DeserializeOwned>(&self, uri: &str, failure_message: &str) -> Result<R, ClientError> {
        self.send(Method::GET, uri, None, failure_message).await
    }

    async fn send_json<B: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        uri: &str,
        body: &B,
        failure_message: &str,
    ) -> Result<R, ClientError> {
        let bytes = serde_json::to_vec(body).map_err(|error| ClientError::Transport(error.to_string()))?;

        self.send(method, uri, Some(bytes), failure_message).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
        failure_message: &str,
    ) -> Result<R, ClientError> {
        let request = build_request(method, uri, body)?;
        let response = self.transport.send(request).await?;

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .map_err(|error| ClientError::Decode(error.to_string()))?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|error| {
                tracing::error!("could not decode response from {uri}: {error}");
                ClientError::Decode(error.to_string())
            });
        }

        let (server_error, details) = match serde_json::from_slice::<ErrorBody>(&bytes) {
            Ok(body) => (body.error, body.details),
            Err(_) => (None, Vec::new()),
        };
        tracing::debug!("request to {uri} failed with status {status}: {server_error:?}");

        Err(ClientError::Api {
            status: status.as_u16(),
            message: failure_message.to_owned(),
            server_error,
            details,
        })
    }
}

/// Append the `userId` query parameter to `path`.
fn with_owner(path: &str, owner: &OwnerId) -> Result<String, ClientError> {
    let query = serde_urlencoded::to_string([("userId", owner.as_str())])
        .map_err(|error| ClientError::Transport(error.to_string()))?;

    Ok(format!("{path}?{query}"))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{ApiClient, with_owner};
    use crate::{
        AppState,
        account::AccountPayload,
        app_state::ApiConfig,
        build_router,
        client::ClientError,
        expense::ExpensePayload,
        money::Money,
        owner::OwnerId,
    };

    fn get_test_client() -> ApiClient<axum::Router> {
        let state = AppState::new(
            Connection::open_in_memory().expect("Could not open database in memory."),
            ApiConfig::default(),
        )
        .expect("Could not create app state.");

        ApiClient::new(build_router(state))
    }

    fn account_payload(owner: &str, name: &str, balance: &str) -> AccountPayload {
        AccountPayload {
            user_id: Some(owner.to_owned()),
            name: Some(name.to_owned()),
            balance: Some(balance.to_owned()),
        }
    }

    #[test]
    fn owner_is_url_encoded() {
        let owner = OwnerId::new_unchecked("a b&c");

        assert_eq!(
            with_owner("/api/accounts", &owner).unwrap(),
            "/api/accounts?userId=a+b%26c"
        );
    }

    #[tokio::test]
    async fn account_lifecycle() {
        let client = get_test_client();
        let owner = OwnerId::new_unchecked("u1");

        let created = client
            .create_account(&account_payload("u1", "Cash", "100"))
            .await
            .unwrap();
        assert_eq!(created.balance, Money::from_cents(10_000));

        let fetched = client.get_account(&owner, created.id).await.unwrap();
        assert_eq!(fetched, created);

        let updated = client
            .update_account(created.id, &account_payload("u1", "Wallet", "12.34"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Wallet");

        let total = client.get_total_balance(&owner).await.unwrap();
        assert_eq!(total.total_balance, Money::from_cents(1234));

        let deleted = client.delete_account(&owner, created.id).await.unwrap();
        assert_eq!(deleted, updated);
        assert_eq!(client.list_accounts(&owner).await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn expense_lifecycle() {
        let client = get_test_client();
        let owner = OwnerId::new_unchecked("u1");
        let payload = ExpensePayload {
            user_id: Some("u1".to_owned()),
            title: Some("Coffee".to_owned()),
            amount: Some("3.5".to_owned()),
            date: Some("2024-06-01".to_owned()),
            account_id: None,
        };

        let created = client.create_expense(&payload).await.unwrap();
        assert_eq!(client.list_expenses(&owner).await.unwrap(), vec![created.clone()]);
        assert_eq!(
            client.get_expense(&owner, created.id).await.unwrap(),
            created
        );

        let updated = client
            .update_expense(
                created.id,
                &ExpensePayload {
                    amount: Some("4".to_owned()),
                    ..payload
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, Money::from_cents(400));
        assert_eq!(
            client.get_total_spent(&owner).await.unwrap().total,
            Money::from_cents(400)
        );

        client.delete_expense(&owner, created.id).await.unwrap();
        assert_eq!(
            client.get_total_spent(&owner).await.unwrap().total,
            Money::ZERO
        );
    }

    #[tokio::test]
    async fn failed_requests_carry_operation_message() {
        let client = get_test_client();

        let error = client
            .delete_expense(&OwnerId::new_unchecked("u1"), 5)
            .await
            .unwrap_err();

        assert_eq!(
            error,
            ClientError::Api {
                status: 404,
                message: "Error deleting expense".to_owned(),
                server_error: Some("Not found".to_owned()),
                details: Vec::new(),
            }
        );
    }

    #[tokio::test]
    async fn validation_failures_carry_details() {
        let client = get_test_client();

        let error = client
            .create_account(&account_payload("u1", "ab", "100"))
            .await
            .unwrap_err();

        let ClientError::Api {
            status,
            message,
            details,
            ..
        } = error
        else {
            panic!("expected an API error");
        };
        assert_eq!(status, 400);
        assert_eq!(message, "Error creating account");
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].path, "name");
    }
}
