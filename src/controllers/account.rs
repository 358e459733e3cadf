use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{authenticated, decode, merged_input, Controller, HttpRequest, HttpResponse};
use crate::app::get_account_use_case::GetAccountUseCase;
use crate::app::outcome::DomainFailure;
use crate::app::ports::Validator;
use crate::app::remove_account_use_case::RemoveAccountUseCase;
use crate::app::update_account_use_case::UpdateAccountUseCase;
use crate::domain::AccountChanges;
use crate::error::Result;

const ACCOUNT_NOT_FOUND: &str = "Account not found";

/// Validates the body merged with `:accountId` and checks the parameter names the
/// caller's own account.
fn target_account<T: DeserializeOwned>(
    validator: &dyn Validator,
    request: &HttpRequest,
) -> std::result::Result<(String, T), HttpResponse> {
    let caller = authenticated(request)?;
    let input = merged_input(&request.body, &[("accountId", request.param("accountId"))]);
    let decoded = decode(validator, input)?;

    match request.param("accountId") {
        Some(id) if id == caller => Ok((id.to_string(), decoded)),
        _ => Err(HttpResponse::forbidden()),
    }
}

pub struct GetAccountController {
    validator: Arc<dyn Validator>,
    get_account: GetAccountUseCase,
}

impl GetAccountController {
    pub fn new(validator: Arc<dyn Validator>, get_account: GetAccountUseCase) -> Self {
        Self {
            validator,
            get_account,
        }
    }
}

#[async_trait]
impl Controller for GetAccountController {
    fn name(&self) -> &'static str {
        "get_account"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let (account_id, _) = match target_account::<Value>(self.validator.as_ref(), request) {
            Ok(target) => target,
            Err(response) => return Ok(response),
        };

        Ok(match self.get_account.get(&account_id).await? {
            Some(account) => HttpResponse::ok(serde_json::to_value(account)?),
            None => HttpResponse::message(404, ACCOUNT_NOT_FOUND),
        })
    }
}

pub struct UpdateAccountController {
    validator: Arc<dyn Validator>,
    update_account: UpdateAccountUseCase,
}

impl UpdateAccountController {
    pub fn new(validator: Arc<dyn Validator>, update_account: UpdateAccountUseCase) -> Self {
        Self {
            validator,
            update_account,
        }
    }
}

#[async_trait]
impl Controller for UpdateAccountController {
    fn name(&self) -> &'static str {
        "update_account"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let (account_id, changes) =
            match target_account::<AccountChanges>(self.validator.as_ref(), request) {
                Ok(target) => target,
                Err(response) => return Ok(response),
            };

        Ok(match self.update_account.update(changes, &account_id).await? {
            Ok(_) => HttpResponse::message(200, "Account successfully updated"),
            Err(DomainFailure::AccountNotFound) => HttpResponse::message(404, ACCOUNT_NOT_FOUND),
            Err(failure) => HttpResponse::message(409, failure.message()),
        })
    }
}

pub struct RemoveAccountController {
    validator: Arc<dyn Validator>,
    remove_account: RemoveAccountUseCase,
}

impl RemoveAccountController {
    pub fn new(validator: Arc<dyn Validator>, remove_account: RemoveAccountUseCase) -> Self {
        Self {
            validator,
            remove_account,
        }
    }
}

#[async_trait]
impl Controller for RemoveAccountController {
    fn name(&self) -> &'static str {
        "remove_account"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let (account_id, _) = match target_account::<Value>(self.validator.as_ref(), request) {
            Ok(target) => target,
            Err(response) => return Ok(response),
        };

        Ok(if self.remove_account.remove(&account_id).await? {
            HttpResponse::message(200, "Account successfully removed")
        } else {
            HttpResponse::message(404, ACCOUNT_NOT_FOUND)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::{AccountRepository, TaskRepository};
    use crate::app::test_support::{seed_account, seed_task, FakeHasher};
    use crate::controllers::test_support::{as_account, request, validator, with_param};
    use crate::infra::Schema;
    use crate::storage::InMemoryStore;
    use serde_json::json;

    fn get(id: &str, caller: &str) -> HttpRequest {
        as_account(caller, with_param("accountId", id, request(Value::Null)))
    }

    fn put(id: &str, caller: &str, body: Value) -> HttpRequest {
        as_account(caller, with_param("accountId", id, request(body)))
    }

    fn update_controller(store: &InMemoryStore) -> UpdateAccountController {
        UpdateAccountController::new(
            validator(Schema::UpdateAccount),
            UpdateAccountUseCase::new(Arc::new(store.accounts()), Arc::new(FakeHasher)),
        )
    }

    #[tokio::test]
    async fn test_get_own_account() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_account(&store, "acc-2", "b@x").await;
        let controller = GetAccountController::new(
            validator(Schema::AccountId),
            GetAccountUseCase::new(Arc::new(store.accounts())),
        );

        let response = controller.handle(get("acc-1", "acc-1")).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body["name"], "Ada");
        assert_eq!(response.body["email"], "a@x");
        assert!(response.body.get("password").is_none());
        assert!(response.body.get("createdAt").is_some());

        let other = controller.handle(get("acc-2", "acc-1")).await;
        assert_eq!(other.status_code, 403);
    }

    #[tokio::test]
    async fn test_get_requires_authentication() {
        let store = InMemoryStore::new();
        let controller = GetAccountController::new(
            validator(Schema::AccountId),
            GetAccountUseCase::new(Arc::new(store.accounts())),
        );
        let response = controller
            .handle(with_param("accountId", "acc-1", request(Value::Null)))
            .await;
        assert_eq!(response.status_code, 403);
    }

    #[tokio::test]
    async fn test_update_account() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_account(&store, "acc-2", "b@x").await;
        let controller = update_controller(&store);

        let ok = controller
            .handle(put("acc-1", "acc-1", json!({"name": "Grace", "password": "s3cret!"})))
            .await;
        assert_eq!(ok.status_code, 200);
        assert_eq!(ok.body, json!({"message": "Account successfully updated"}));
        let stored = store.accounts().find_by_id("acc-1").await.unwrap().unwrap();
        assert_eq!(stored.name, "Grace");
        assert_eq!(stored.password, "hashed:s3cret!");

        let taken = controller
            .handle(put("acc-1", "acc-1", json!({"email": "b@x"})))
            .await;
        assert_eq!(taken.status_code, 409);

        let invalid = controller
            .handle(put("acc-1", "acc-1", json!({"password": "123"})))
            .await;
        assert_eq!(invalid.status_code, 400);
        assert_eq!(invalid.body[0]["paramName"], "password");
    }

    #[tokio::test]
    async fn test_remove_account_with_tasks() {
        let store = InMemoryStore::new();
        seed_account(&store, "acc-1", "a@x").await;
        seed_task(&store, "t1", "acc-1").await;
        seed_task(&store, "t2", "acc-1").await;
        let controller = RemoveAccountController::new(
            validator(Schema::AccountId),
            RemoveAccountUseCase::new(
                Arc::new(store.accounts()),
                Arc::new(store.tasks()),
                Arc::new(store.transactions()),
            ),
        );

        let response = controller.handle(get("acc-1", "acc-1")).await;
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, json!({"message": "Account successfully removed"}));
        assert!(store.accounts().find_by_id("acc-1").await.unwrap().is_none());
        assert!(store
            .tasks()
            .find_all_by_account("acc-1")
            .await
            .unwrap()
            .is_empty());

        let again = controller.handle(get("acc-1", "acc-1")).await;
        assert_eq!(again.status_code, 404);
    }
}
