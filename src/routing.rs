//! Application router configuration.

use axum::{
    Router,
    routing::get,
};

use crate::{
    AppState, Error,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_account_endpoint, get_total_balance_endpoint, list_accounts_endpoint,
    },
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, edit_expense_endpoint,
        get_expense_endpoint, get_total_spent_endpoint, list_expenses_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let account_routes = Router::new()
        .route(
            endpoints::ACCOUNTS,
            get(list_accounts_endpoint).post(create_account_endpoint),
        )
        .route(endpoints::ACCOUNTS_TOTAL, get(get_total_balance_endpoint))
        .route(
            endpoints::ACCOUNT,
            get(get_account_endpoint)
                .patch(edit_account_endpoint)
                .delete(delete_account_endpoint),
        );

    let expense_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::EXPENSES_TOTAL, get(get_total_spent_endpoint))
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .patch(edit_expense_endpoint)
                .delete(delete_expense_endpoint),
        );

    account_routes
        .merge(expense_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Error {
    Error::NotFound
}

#[cfg(test)]
mod account_route_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        account::{Account, NAME_MESSAGE, TotalBalance},
        app_state::ApiConfig,
        endpoints::{self, format_endpoint},
        money::Money,
        routing::build_router,
    };

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().expect("Could not open database in memory."),
            ApiConfig::default(),
        )
        .expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    async fn create_account(server: &TestServer, user_id: &str, name: &str, balance: &str) -> Account {
        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({ "name": name, "balance": balance, "userId": user_id }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn create_account_returns_created_row() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({ "name": "Cash", "balance": "100.00", "userId": "u1" }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["id"], 1);
        assert_eq!(body["name"], "Cash");
        assert_eq!(body["balance"], "100.00");
        assert_eq!(body["userId"], "u1");
        assert!(body["createdAt"].is_string());
    }

    #[tokio::test]
    async fn create_account_normalizes_balance() {
        let server = get_test_server();

        let account = create_account(&server, "u1", "Cash", "100").await;

        assert_eq!(account.balance, Money::from_cents(10_000));
        assert_eq!(account.balance.to_string(), "100.00");
    }

    #[tokio::test]
    async fn create_account_rejects_invalid_payload() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({ "name": "ab", "balance": "1.234", "userId": "u1" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0]["path"], "name");
        assert_eq!(body["details"][0]["message"], NAME_MESSAGE);
        assert_eq!(body["details"][1]["path"], "balance");
    }

    #[tokio::test]
    async fn create_account_rejects_malformed_json() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .text("{ not json")
            .content_type("application/json")
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0]["path"], "body");
    }

    #[tokio::test]
    async fn create_account_reports_wrong_type_on_field() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS)
            .json(&json!({ "name": "Cash", "balance": 100, "userId": "u1" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"][0]["path"], "balance");
    }

    #[tokio::test]
    async fn list_shows_newest_first() {
        let server = get_test_server();
        let first = create_account(&server, "u1", "First", "1").await;
        let second = create_account(&server, "u1", "Second", "2").await;
        create_account(&server, "u2", "Other", "3").await;

        let response = server
            .get(endpoints::ACCOUNTS)
            .add_query_param("userId", "u1")
            .await;

        response.assert_status_ok();
        response.assert_json(&vec![second, first]);
    }

    #[tokio::test]
    async fn get_account_by_id() {
        let server = get_test_server();
        let account = create_account(&server, "u1", "Cash", "5").await;

        let response = server
            .get(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_query_param("userId", "u1")
            .await;

        response.assert_status_ok();
        response.assert_json(&account);
    }

    #[tokio::test]
    async fn get_account_with_invalid_id() {
        let server = get_test_server();

        let response = server
            .get(&format_endpoint(endpoints::ACCOUNT, "abc"))
            .add_query_param("userId", "u1")
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "Invalid id" }));
    }

    #[tokio::test]
    async fn get_account_of_other_owner_is_not_found() {
        let server = get_test_server();
        let account = create_account(&server, "u1", "Cash", "5").await;

        let response = server
            .get(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_query_param("userId", "u2")
            .await;

        response.assert_status_not_found();
        response.assert_json(&json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn total_balance_sums_accounts() {
        let server = get_test_server();
        create_account(&server, "u1", "Cash", "100.25").await;
        create_account(&server, "u1", "Bank", "0.75").await;

        let response = server
            .get(endpoints::ACCOUNTS_TOTAL)
            .add_query_param("userId", "u1")
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({ "totalBalance": "101.00" }));
        assert_eq!(
            response.json::<TotalBalance>().total_balance,
            Money::from_cents(10_100)
        );
    }

    #[tokio::test]
    async fn total_requires_owner() {
        let server = get_test_server();

        let response = server.get(endpoints::ACCOUNTS_TOTAL).await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn patch_updates_account() {
        let server = get_test_server();
        let account = create_account(&server, "u1", "Cash", "5").await;

        let response = server
            .patch(&format_endpoint(endpoints::ACCOUNT, account.id))
            .json(&json!({ "name": "Wallet", "balance": "7.5", "userId": "u1" }))
            .await;

        response.assert_status_ok();
        let updated: Account = response.json();
        assert_eq!(updated.name, "Wallet");
        assert_eq!(updated.balance.to_string(), "7.50");
        assert_eq!(updated.created_at, account.created_at);
    }

    #[tokio::test]
    async fn patch_missing_account_is_not_found() {
        let server = get_test_server();

        let response = server
            .patch(&format_endpoint(endpoints::ACCOUNT, 42))
            .json(&json!({ "name": "Wallet", "balance": "7.5", "userId": "u1" }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn patch_with_invalid_id_skips_validation() {
        let server = get_test_server();

        let response = server
            .patch(&format_endpoint(endpoints::ACCOUNT, "1x"))
            .json(&json!({}))
            .await;

        response.assert_status_bad_request();
        response.assert_json(&json!({ "error": "Invalid id" }));
    }

    #[tokio::test]
    async fn delete_returns_deleted_account() {
        let server = get_test_server();
        let account = create_account(&server, "u1", "Cash", "5").await;

        let response = server
            .delete(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_query_param("userId", "u1")
            .await;

        response.assert_status_ok();
        response.assert_json(&account);

        server
            .get(&format_endpoint(endpoints::ACCOUNT, account.id))
            .add_query_param("userId", "u1")
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let server = get_test_server();

        let response = server.get("/api/budgets").await;

        response.assert_status_not_found();
        response.assert_json(&json!({ "error": "Not found" }));
    }
}

#[cfg(test)]
mod expense_route_tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState,
        app_state::ApiConfig,
        endpoints::{self, format_endpoint},
        expense::{ACCOUNT_MESSAGE, Expense},
        routing::build_router,
    };

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().expect("Could not open database in memory."),
            ApiConfig { list_limit: 100 },
        )
        .expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    async fn create_expense(server: &TestServer, title: &str, amount: &str) -> Expense {
        let response = server
            .post(endpoints::EXPENSES)
            .json(&json!({
                "title": title,
                "amount": amount,
                "date": "2024-06-01",
                "userId": "u1"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[tokio::test]
    async fn create_then_list_shows_new_expense_first() {
        let server = get_test_server();
        create_expense(&server, "Coffee", "3.50").await;
        let latest = create_expense(&server, "Lunch", "12").await;

        let expenses: Vec<Expense> = server
            .get(endpoints::EXPENSES)
            .add_query_param("userId", "u1")
            .await
            .json();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0], latest);
    }

    #[tokio::test]
    async fn total_spent_is_recomputed_after_delete() {
        let server = get_test_server();
        create_expense(&server, "Coffee", "3.50").await;
        let lunch = create_expense(&server, "Lunch", "12.25").await;

        let total = server
            .get(endpoints::EXPENSES_TOTAL)
            .add_query_param("userId", "u1")
            .await;
        total.assert_json(&json!({ "total": "15.75" }));

        server
            .delete(&format_endpoint(endpoints::EXPENSE, lunch.id))
            .add_query_param("userId", "u1")
            .await
            .assert_status_ok();

        let total = server
            .get(endpoints::EXPENSES_TOTAL)
            .add_query_param("userId", "u1")
            .await;
        total.assert_json(&json!({ "total": "3.50" }));
    }

    #[tokio::test]
    async fn delete_missing_expense_is_not_found() {
        let server = get_test_server();

        let response = server
            .delete(&format_endpoint(endpoints::EXPENSE, 5))
            .add_query_param("userId", "u1")
            .await;

        response.assert_status_not_found();
        response.assert_json(&json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn rejects_unknown_account() {
        let server = get_test_server();

        let response = server
            .post(endpoints::EXPENSES)
            .json(&json!({
                "title": "Coffee",
                "amount": "3.50",
                "date": "2024-06-01",
                "userId": "u1",
                "accountId": 99
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["details"][0]["path"], "accountId");
        assert_eq!(body["details"][0]["message"], ACCOUNT_MESSAGE);
    }

    #[tokio::test]
    async fn invalid_id_does_not_touch_database() {
        let server = get_test_server();
        let expense = create_expense(&server, "Coffee", "3.50").await;

        server
            .delete(&format_endpoint(endpoints::EXPENSE, "1abc"))
            .add_query_param("userId", "u1")
            .await
            .assert_status_bad_request();

        server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id))
            .add_query_param("userId", "u1")
            .await
            .assert_status_ok();
    }
}
