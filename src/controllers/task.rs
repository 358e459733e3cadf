use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{authenticated, decode, merged_input, Controller, HttpRequest, HttpResponse};
use crate::app::create_task_use_case::CreateTaskUseCase;
use crate::app::get_tasks_from_account_use_case::GetTasksFromAccountUseCase;
use crate::app::outcome::DomainFailure;
use crate::app::ports::Validator;
use crate::app::remove_task_use_case::RemoveTaskUseCase;
use crate::app::update_task_use_case::UpdateTaskUseCase;
use crate::domain::{AddTaskData, TaskChanges};
use crate::error::Result;

pub struct CreateTaskController {
    validator: Arc<dyn Validator>,
    create_task: CreateTaskUseCase,
}

impl CreateTaskController {
    pub fn new(validator: Arc<dyn Validator>, create_task: CreateTaskUseCase) -> Self {
        Self {
            validator,
            create_task,
        }
    }
}

#[async_trait]
impl Controller for CreateTaskController {
    fn name(&self) -> &'static str {
        "create_task"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let account_id = match authenticated(request) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };
        // The owner is always the caller
        let input = merged_input(&request.body, &[("accountId", Some(account_id))]);
        let data: AddTaskData = match decode(self.validator.as_ref(), input) {
            Ok(data) => data,
            Err(response) => return Ok(response),
        };

        Ok(match self.create_task.create(data).await? {
            Ok(task) => HttpResponse::ok(json!({ "task": serde_json::to_value(task)? })),
            Err(failure @ DomainFailure::AccountNotFound) => {
                HttpResponse::message(404, failure.message())
            }
            Err(failure) => HttpResponse::message(400, failure.message()),
        })
    }
}

pub struct GetTasksController {
    get_tasks: GetTasksFromAccountUseCase,
}

impl GetTasksController {
    pub fn new(get_tasks: GetTasksFromAccountUseCase) -> Self {
        Self { get_tasks }
    }
}

#[async_trait]
impl Controller for GetTasksController {
    fn name(&self) -> &'static str {
        "get_tasks"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let account_id = match authenticated(request) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };

        Ok(match self.get_tasks.get(account_id).await? {
            Some(tasks) => HttpResponse::ok(serde_json::to_value(tasks)?),
            None => HttpResponse::message(404, "Account not found"),
        })
    }
}

pub struct UpdateTaskController {
    validator: Arc<dyn Validator>,
    update_task: UpdateTaskUseCase,
}

impl UpdateTaskController {
    pub fn new(validator: Arc<dyn Validator>, update_task: UpdateTaskUseCase) -> Self {
        Self {
            validator,
            update_task,
        }
    }
}

#[async_trait]
impl Controller for UpdateTaskController {
    fn name(&self) -> &'static str {
        "update_task"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let account_id = match authenticated(request) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };
        let input = merged_input(&request.body, &[("taskId", request.param("taskId"))]);
        let task_id = input["taskId"].as_str().unwrap_or_default().to_string();
        let changes: TaskChanges = match decode(self.validator.as_ref(), input) {
            Ok(changes) => changes,
            Err(response) => return Ok(response),
        };

        Ok(match self.update_task.update(changes, &task_id, account_id).await? {
            Ok(_) => HttpResponse::message(200, "Task successfully updated"),
            Err(failure @ DomainFailure::TaskNotFound) => {
                HttpResponse::message(404, failure.message())
            }
            Err(failure @ DomainFailure::InvalidAccount) => {
                HttpResponse::message(401, failure.message())
            }
            Err(failure) => HttpResponse::message(400, failure.message()),
        })
    }
}

pub struct RemoveTaskController {
    validator: Arc<dyn Validator>,
    remove_task: RemoveTaskUseCase,
}

impl RemoveTaskController {
    pub fn new(validator: Arc<dyn Validator>, remove_task: RemoveTaskUseCase) -> Self {
        Self {
            validator,
            remove_task,
        }
    }
}

#[async_trait]
impl Controller for RemoveTaskController {
    fn name(&self) -> &'static str {
        "remove_task"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let account_id = match authenticated(request) {
            Ok(id) => id,
            Err(response) => return Ok(response),
        };
        let input = merged_input(&Value::Null, &[("taskId", request.param("taskId"))]);
        if let Err(errors) = self.validator.validate(&input) {
            return Ok(HttpResponse::bad_request(errors));
        }
        let task_id = request.param("taskId").unwrap_or_default();

        Ok(match self.remove_task.remove(task_id, account_id).await? {
            Ok(message) => HttpResponse::message(200, message),
            Err(failure @ DomainFailure::TaskNotFound) => {
                HttpResponse::message(404, failure.message())
            }
            Err(failure) => HttpResponse::message(401, failure.message()),
        })
    }
}
