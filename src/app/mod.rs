pub mod outcome;
pub mod ports;

pub mod add_account_use_case;
pub mod authenticate_use_case;
pub mod create_task_use_case;
pub mod get_account_use_case;
pub mod get_tasks_from_account_use_case;
pub mod notify_task_use_case;
pub mod refresh_token_use_case;
pub mod remove_account_use_case;
pub mod remove_task_use_case;
pub mod reset_password_use_case;
pub mod send_recover_email_use_case;
pub mod update_account_use_case;
pub mod update_task_use_case;
pub mod validate_access_use_case;

#[cfg(test)]
pub(crate) mod test_support;
