//! Expense queries and the expense create, update and delete flows.

use serde::{Deserialize, Serialize};

use crate::{
    client::{ClientError, LedgerClient, QueryKey, QueryOptions, StaleTime, Transport},
    expense::{Expense, ExpenseFormInput, ExpenseId, ExpensePayload, TotalSpent},
    money::Money,
    owner::OwnerId,
};

/// The cache key segment for an in-flight expense create.
pub const LOADING_CREATE_EXPENSE_KEY: &str = "loading-create-expense";

/// The expense being created, while the create request is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingCreateExpense {
    /// The payload sent to the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense: Option<ExpensePayload>,
}

/// The newest expenses of `owner`.
pub fn all_expenses_query(owner: &OwnerId) -> QueryOptions {
    QueryOptions::new(QueryKey::new(["expenses", owner.as_str()]))
}

/// The total amount `owner` has spent.
pub fn total_spent_query(owner: &OwnerId) -> QueryOptions {
    QueryOptions::new(QueryKey::new(["total-spent", owner.as_str()]))
}

/// The placeholder for an in-flight expense create.
pub fn loading_create_expense_query() -> QueryOptions {
    QueryOptions::new(QueryKey::new([LOADING_CREATE_EXPENSE_KEY])).stale_time(StaleTime::Infinity)
}

impl<T: Transport> LedgerClient<T> {
    /// The owner's expenses, newest first, from the cache when fresh.
    pub async fn expenses(&self) -> Result<Vec<Expense>, ClientError> {
        self.queries
            .fetch_query(&all_expenses_query(&self.owner), || {
                self.api.list_expenses(&self.owner)
            })
            .await
    }

    /// The total the owner has spent, from the cache when fresh.
    pub async fn total_spent(&self) -> Result<Money, ClientError> {
        let total: TotalSpent = self
            .queries
            .fetch_query(&total_spent_query(&self.owner), || {
                self.api.get_total_spent(&self.owner)
            })
            .await?;

        Ok(total.total)
    }

    /// The expense being created, if a create request is in flight.
    pub async fn loading_create_expense(&self) -> Option<ExpensePayload> {
        let loading: LoadingCreateExpense = self
            .queries
            .fetch_query(&loading_create_expense_query(), || async {
                Ok(LoadingCreateExpense::default())
            })
            .await
            .ok()?;

        loading.expense
    }

    /// Validate `form` and record the expense.
    ///
    /// Works like [LedgerClient::create_account]. Once the request settles the
    /// cached total is invalidated rather than patched.
    ///
    /// # Errors
    /// Returns [ClientError::Invalid] without sending a request if the form
    /// fails validation, otherwise any error from the API.
    pub async fn create_expense(&self, form: ExpenseFormInput) -> Result<Expense, ClientError> {
        form.validate()?;

        let list_query = all_expenses_query(&self.owner);
        let existing_expenses = match self
            .queries
            .ensure_query_data(&list_query, || self.api.list_expenses(&self.owner))
            .await
        {
            Ok(expenses) => expenses,
            Err(error) => {
                self.notifier.error(&error.to_string());
                return Err(error);
            }
        };

        let payload = form.into_payload(&self.owner);
        let loading_key = loading_create_expense_query().key;
        self.queries.set_query_data(
            &loading_key,
            &LoadingCreateExpense {
                expense: Some(payload.clone()),
            },
        );

        let result = self.api.create_expense(&payload).await;

        if let Ok(expense) = &result {
            self.queries
                .update_query_data(&list_query.key, |expenses: Option<Vec<Expense>>| {
                    let mut expenses = expenses.unwrap_or(existing_expenses);
                    expenses.insert(0, expense.clone());
                    Some(expenses)
                });
        }
        self.notify(&result, "Expense created!");

        self.queries
            .set_query_data(&loading_key, &LoadingCreateExpense::default());
        self.queries
            .invalidate_queries(&total_spent_query(&self.owner).key);

        result
    }

    /// Validate `form` and replace the fields of the expense with `id`.
    ///
    /// On success the cached row is replaced and the total is invalidated. On
    /// failure the cache is left untouched.
    ///
    /// # Errors
    /// Returns [ClientError::Invalid] without sending a request if the form
    /// fails validation, otherwise any error from the API.
    pub async fn update_expense(&self, id: ExpenseId, form: ExpenseFormInput) -> Result<Expense, ClientError> {
        form.validate()?;

        let result = self
            .api
            .update_expense(id, &form.into_payload(&self.owner))
            .await;

        if let Ok(updated) = &result {
            self.queries.update_query_data(
                &all_expenses_query(&self.owner).key,
                |expenses: Option<Vec<Expense>>| {
                    let mut expenses = expenses?;
                    for expense in expenses.iter_mut().filter(|expense| expense.id == id) {
                        *expense = updated.clone();
                    }
                    Some(expenses)
                },
            );
            self.queries
                .invalidate_queries(&total_spent_query(&self.owner).key);
        }
        self.notify(&result, "Expense updated!");

        result
    }

    /// Delete the expense with `id`.
    ///
    /// On success the row is removed from the cached list and its amount is
    /// subtracted from the cached total. On failure the cache is left
    /// untouched.
    ///
    /// # Errors
    /// Returns any error from the API.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<Expense, ClientError> {
        let result = self.api.delete_expense(&self.owner, id).await;

        if let Ok(deleted) = &result {
            self.queries.update_query_data(
                &all_expenses_query(&self.owner).key,
                |expenses: Option<Vec<Expense>>| {
                    let mut expenses = expenses?;
                    expenses.retain(|expense| expense.id != id);
                    Some(expenses)
                },
            );
            self.queries.update_query_data(
                &total_spent_query(&self.owner).key,
                |total: Option<TotalSpent>| {
                    total.map(|total| TotalSpent {
                        total: total.total - deleted.amount,
                    })
                },
            );
        }
        self.notify(&result, "Expense deleted!");

        result
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{
        account::AccountFormInput,
        client::{
            ClientError, Notification, all_expenses_query, test_utils::get_test_client,
            total_spent_query,
        },
        expense::{Expense, ExpenseFormInput, TITLE_MESSAGE, TotalSpent},
        money::Money,
    };

    fn form(title: &str, amount: &str) -> ExpenseFormInput {
        ExpenseFormInput {
            title: title.to_owned(),
            amount: amount.to_owned(),
            ..ExpenseFormInput::new(date!(2024 - 06 - 01))
        }
    }

    #[tokio::test]
    async fn create_then_list_shows_new_expense_first() {
        let (client, notifications) = get_test_client("u1");
        client.create_expense(form("Coffee", "3.50")).await.unwrap();

        let lunch = client.create_expense(form("Lunch", "12.25")).await.unwrap();

        assert_eq!(client.expenses().await.unwrap()[0], lunch);
        assert_eq!(client.loading_create_expense().await, None);
        assert_eq!(
            notifications.drain().last(),
            Some(&Notification::Success("Expense created!".to_owned()))
        );
    }

    #[tokio::test]
    async fn create_invalidates_total() {
        let (client, _) = get_test_client("u1");
        client.create_expense(form("Coffee", "3.50")).await.unwrap();
        assert_eq!(client.total_spent().await.unwrap(), Money::from_cents(350));

        client.create_expense(form("Lunch", "12.25")).await.unwrap();

        assert_eq!(client.total_spent().await.unwrap(), Money::from_cents(1575));
    }

    #[tokio::test]
    async fn create_rejects_unknown_account() {
        let (client, notifications) = get_test_client("u1");
        client
            .queries()
            .set_query_data(&all_expenses_query(client.owner()).key, &Vec::<Expense>::new());

        let result = client
            .create_expense(ExpenseFormInput {
                account_id: Some(42),
                ..form("Coffee", "3.50")
            })
            .await;

        let Err(ClientError::Api { status, details, .. }) = result else {
            panic!("expected an API error");
        };
        assert_eq!(status, 400);
        assert_eq!(details[0].path, "accountId");
        assert_eq!(
            notifications.drain(),
            vec![Notification::Error("Error creating expense".to_owned())]
        );
        assert_eq!(client.expenses().await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn create_links_owned_account() {
        let (client, _) = get_test_client("u1");
        let account = client
            .create_account(AccountFormInput {
                name: "Cash".to_owned(),
                balance: "100".to_owned(),
            })
            .await
            .unwrap();

        let expense = client
            .create_expense(ExpenseFormInput {
                account_id: Some(account.id),
                ..form("Coffee", "3.50")
            })
            .await
            .unwrap();

        assert_eq!(expense.account_id, Some(account.id));
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        let (client, notifications) = get_test_client("u1");

        let result = client.create_expense(form("ab", "3.50")).await;

        let Err(ClientError::Invalid(errors)) = result else {
            panic!("expected a validation error");
        };
        assert_eq!(errors.message_for("title"), Some(TITLE_MESSAGE));
        assert_eq!(notifications.drain(), vec![]);
    }

    #[tokio::test]
    async fn delete_decrements_cached_total_exactly() {
        let (client, notifications) = get_test_client("u1");
        let coffee = client.create_expense(form("Coffee", "0.10")).await.unwrap();
        let lunch = client.create_expense(form("Lunch", "0.20")).await.unwrap();
        assert_eq!(client.total_spent().await.unwrap(), Money::from_cents(30));

        let deleted = client.delete_expense(lunch.id).await.unwrap();

        assert_eq!(deleted, lunch);
        let total: TotalSpent = client
            .queries()
            .get_query_data(&total_spent_query(client.owner()).key)
            .unwrap();
        assert_eq!(total.total, Money::from_cents(10));
        assert_eq!(total.total.to_string(), "0.10");
        assert_eq!(client.expenses().await.unwrap(), vec![coffee]);
        assert_eq!(
            notifications.drain().last(),
            Some(&Notification::Success("Expense deleted!".to_owned()))
        );
    }

    #[tokio::test]
    async fn delete_after_create_refetches_invalidated_total() {
        let (client, _) = get_test_client("u1");
        let rent = client.create_expense(form("Rent", "10.00")).await.unwrap();
        assert_eq!(client.total_spent().await.unwrap(), Money::from_cents(1_000));

        client.create_expense(form("Food", "5.00")).await.unwrap();
        client.delete_expense(rent.id).await.unwrap();

        assert_eq!(client.total_spent().await.unwrap(), Money::from_cents(500));
    }

    #[tokio::test]
    async fn failed_delete_leaves_cache_untouched() {
        let (client, notifications) = get_test_client("u1");
        let coffee = client.create_expense(form("Coffee", "3.50")).await.unwrap();
        client.total_spent().await.unwrap();
        notifications.drain();

        let result = client.delete_expense(coffee.id + 1).await;

        assert!(result.is_err());
        assert_eq!(
            notifications.drain(),
            vec![Notification::Error("Error deleting expense".to_owned())]
        );
        assert_eq!(client.expenses().await.unwrap(), vec![coffee]);
        assert_eq!(client.total_spent().await.unwrap(), Money::from_cents(350));
    }

    #[tokio::test]
    async fn update_replaces_cached_row() {
        let (client, notifications) = get_test_client("u1");
        let coffee = client.create_expense(form("Coffee", "3.50")).await.unwrap();
        client.total_spent().await.unwrap();

        let updated = client
            .update_expense(coffee.id, form("Flat white", "4.20"))
            .await
            .unwrap();

        assert_eq!(updated.title, "Flat white");
        assert_eq!(client.expenses().await.unwrap(), vec![updated]);
        assert_eq!(client.total_spent().await.unwrap(), Money::from_cents(420));
        assert_eq!(
            notifications.drain().last(),
            Some(&Notification::Success("Expense updated!".to_owned()))
        );
    }

    #[tokio::test]
    async fn failed_update_leaves_cache_untouched() {
        let (client, notifications) = get_test_client("u1");
        let coffee = client.create_expense(form("Coffee", "3.50")).await.unwrap();
        notifications.drain();

        let result = client
            .update_expense(coffee.id + 1, form("Flat white", "4.20"))
            .await;

        assert_eq!(result.unwrap_err().to_string(), "Error updating expense");
        assert_eq!(
            notifications.drain(),
            vec![Notification::Error("Error updating expense".to_owned())]
        );
        assert_eq!(client.expenses().await.unwrap(), vec![coffee]);
    }
}
