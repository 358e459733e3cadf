use jsonschema::error::ValidationErrorKind;
use jsonschema::JSONSchema;
use serde_json::Value;

use crate::app::ports::{ParamError, Validator};
use crate::error::{Result, TaskerError};

/// Request schemas shipped under `schemas/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    Signup,
    Login,
    RefreshToken,
    RecoverPassword,
    ResetPassword,
    AccountId,
    UpdateAccount,
    Task,
    UpdateTask,
    TaskId,
}

impl Schema {
    pub fn name(&self) -> &'static str {
        match self {
            Schema::Signup => "signup.v1",
            Schema::Login => "login.v1",
            Schema::RefreshToken => "refresh_token.v1",
            Schema::RecoverPassword => "recover_password.v1",
            Schema::ResetPassword => "reset_password.v1",
            Schema::AccountId => "account_id.v1",
            Schema::UpdateAccount => "update_account.v1",
            Schema::Task => "task.v1",
            Schema::UpdateTask => "update_task.v1",
            Schema::TaskId => "task_id.v1",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Schema::Signup => include_str!("../../schemas/signup.v1.json"),
            Schema::Login => include_str!("../../schemas/login.v1.json"),
            Schema::RefreshToken => include_str!("../../schemas/refresh_token.v1.json"),
            Schema::RecoverPassword => include_str!("../../schemas/recover_password.v1.json"),
            Schema::ResetPassword => include_str!("../../schemas/reset_password.v1.json"),
            Schema::AccountId => include_str!("../../schemas/account_id.v1.json"),
            Schema::UpdateAccount => include_str!("../../schemas/update_account.v1.json"),
            Schema::Task => include_str!("../../schemas/task.v1.json"),
            Schema::UpdateTask => include_str!("../../schemas/update_task.v1.json"),
            Schema::TaskId => include_str!("../../schemas/task_id.v1.json"),
        }
    }
}

const AT_LEAST_ONE_FIELD: &str = "It is necessary to pass at least one field to be updated";

/// Validator backed by a compiled JSON Schema.
pub struct SchemaValidatorAdapter {
    name: &'static str,
    compiled: JSONSchema,
}

impl SchemaValidatorAdapter {
    pub fn new(schema: Schema) -> Result<Self> {
        let value: Value = serde_json::from_str(schema.source())?;
        let compiled = JSONSchema::options().compile(&value).map_err(|e| {
            TaskerError::Config(format!("schema {} failed to compile: {}", schema.name(), e))
        })?;
        Ok(Self {
            name: schema.name(),
            compiled,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl std::fmt::Debug for SchemaValidatorAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidatorAdapter")
            .field("name", &self.name)
            .finish()
    }
}

impl Validator for SchemaValidatorAdapter {
    fn validate(&self, input: &Value) -> std::result::Result<(), Vec<ParamError>> {
        let errors = match self.compiled.validate(input) {
            Ok(()) => return Ok(()),
            Err(errors) => errors,
        };

        let mut params = Vec::new();
        for error in errors {
            let location = error.instance_path.to_string();
            let param_name = first_segment(&location);
            match &error.kind {
                ValidationErrorKind::Required { property } => {
                    let property = property
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| property.to_string());
                    let name = if location.is_empty() {
                        property.clone()
                    } else {
                        param_name.to_string()
                    };
                    params.push(ParamError::new(name, format!("{} is required", property)));
                }
                ValidationErrorKind::AdditionalProperties { unexpected } => {
                    for key in unexpected {
                        params.push(ParamError::new(key.clone(), format!("Unrecognized key: {}", key)));
                    }
                }
                ValidationErrorKind::MinProperties { .. } => {
                    params.push(ParamError::new("body", AT_LEAST_ONE_FIELD));
                }
                _ => {
                    let name = if param_name.is_empty() { "body" } else { param_name };
                    params.push(ParamError::new(name, error.to_string()));
                }
            }
        }
        Err(params)
    }
}

fn first_segment(pointer: &str) -> &str {
    pointer
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
}
