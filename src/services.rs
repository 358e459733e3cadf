//! Composition root: picks the port implementations and wires use cases into controllers.

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use crate::app::add_account_use_case::AddAccountUseCase;
use crate::app::authenticate_use_case::AuthenticateUseCase;
use crate::app::create_task_use_case::CreateTaskUseCase;
use crate::app::get_account_use_case::GetAccountUseCase;
use crate::app::get_tasks_from_account_use_case::GetTasksFromAccountUseCase;
use crate::app::notify_task_use_case::NotifyTaskUseCase;
use crate::app::ports::{
    AccountRepository, HasherPort, MailerPort, TaskRepository, TokenPort, TokenProfiles,
    TransactionManager, Validator,
};
use crate::app::refresh_token_use_case::RefreshTokenUseCase;
use crate::app::remove_account_use_case::RemoveAccountUseCase;
use crate::app::remove_task_use_case::RemoveTaskUseCase;
use crate::app::reset_password_use_case::ResetPasswordUseCase;
use crate::app::send_recover_email_use_case::SendRecoverEmailUseCase;
use crate::app::update_account_use_case::UpdateAccountUseCase;
use crate::app::update_task_use_case::UpdateTaskUseCase;
use crate::app::validate_access_use_case::ValidateAccessUseCase;
use crate::config::AppConfig;
use crate::constants::NOTIFY_WINDOW_MINUTES;
use crate::controllers::{
    CreateTaskController, GetAccountController, GetTasksController, LoginController,
    RecoverPasswordController, RefreshTokenController, RemoveAccountController,
    RemoveTaskController, ResetPasswordController, SignUpController, UpdateAccountController,
    UpdateTaskController,
};
use crate::error::Result;
use crate::infra::{
    BcryptHasherAdapter, JwtTokenAdapter, LogMailerAdapter, Schema, SchemaValidatorAdapter,
    SmtpMailerAdapter,
};
use crate::server::{create_router, Controllers};
use crate::storage::InMemoryStore;

/// The collaborators every use case draws from.
#[derive(Clone)]
pub struct Ports {
    pub accounts: Arc<dyn AccountRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub transactions: Arc<dyn TransactionManager>,
    pub token: Arc<dyn TokenPort>,
    pub hasher: Arc<dyn HasherPort>,
    pub mailer: Arc<dyn MailerPort>,
}

impl Ports {
    pub fn in_memory(
        store: &InMemoryStore,
        hasher: Arc<dyn HasherPort>,
        mailer: Arc<dyn MailerPort>,
    ) -> Self {
        Self {
            accounts: Arc::new(store.accounts()),
            tasks: Arc::new(store.tasks()),
            transactions: Arc::new(store.transactions()),
            token: Arc::new(JwtTokenAdapter::new()),
            hasher,
            mailer,
        }
    }

    #[cfg(feature = "db")]
    pub fn libsql(
        manager: Arc<crate::storage::DatabaseManager>,
        hasher: Arc<dyn HasherPort>,
        mailer: Arc<dyn MailerPort>,
    ) -> Self {
        use crate::storage::{LibsqlAccountRepository, LibsqlTaskRepository, LibsqlTransactionManager};

        Self {
            accounts: Arc::new(LibsqlAccountRepository::new(manager.clone())),
            tasks: Arc::new(LibsqlTaskRepository::new(manager.clone())),
            transactions: Arc::new(LibsqlTransactionManager::new(manager)),
            token: Arc::new(JwtTokenAdapter::new()),
            hasher,
            mailer,
        }
    }

    /// Production wiring: bcrypt, SMTP (or the logging mailer without `MAIL_HOST`) and the
    /// configured database, migrated.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let hasher: Arc<dyn HasherPort> = Arc::new(BcryptHasherAdapter::new(config.bcrypt_cost));
        let mailer: Arc<dyn MailerPort> = match &config.mail {
            Some(mail) => {
                info!("Sending mail through {}:{}", mail.host, mail.port);
                Arc::new(SmtpMailerAdapter::new(mail)?)
            }
            None => {
                warn!("MAIL_HOST not set; outgoing mail will only be logged");
                Arc::new(LogMailerAdapter)
            }
        };

        #[cfg(feature = "db")]
        let ports = {
            let manager =
                Arc::new(crate::storage::DatabaseManager::connect(&config.database).await?);
            manager.run_migrations().await?;
            Self::libsql(manager, hasher, mailer)
        };

        #[cfg(not(feature = "db"))]
        let ports = {
            warn!("Built without the `db` feature; data lives in memory only");
            Self::in_memory(&InMemoryStore::new(), hasher, mailer)
        };

        Ok(ports)
    }
}

fn validator(schema: Schema) -> Result<Arc<dyn Validator>> {
    Ok(Arc::new(SchemaValidatorAdapter::new(schema)?))
}

/// Everything the binary runs: the HTTP controllers, the access guard and the sweep.
pub struct Services {
    pub controllers: Controllers,
    pub validate_access: Arc<ValidateAccessUseCase>,
    pub notify_task: Arc<NotifyTaskUseCase>,
}

impl Services {
    /// `port` is the public HTTP port, quoted in recover e-mails.
    pub fn new(ports: &Ports, profiles: &TokenProfiles, port: u16) -> Result<Self> {
        let Ports {
            accounts,
            tasks,
            transactions,
            token,
            hasher,
            mailer,
        } = ports.clone();

        let controllers = Controllers {
            sign_up: Arc::new(SignUpController::new(
                validator(Schema::Signup)?,
                AddAccountUseCase::new(
                    accounts.clone(),
                    hasher.clone(),
                    token.clone(),
                    profiles.clone(),
                ),
            )),
            login: Arc::new(LoginController::new(
                validator(Schema::Login)?,
                AuthenticateUseCase::new(
                    accounts.clone(),
                    hasher.clone(),
                    token.clone(),
                    profiles.clone(),
                ),
            )),
            refresh_token: Arc::new(RefreshTokenController::new(
                validator(Schema::RefreshToken)?,
                RefreshTokenUseCase::new(accounts.clone(), token.clone(), profiles.clone()),
            )),
            recover_password: Arc::new(RecoverPasswordController::new(
                validator(Schema::RecoverPassword)?,
                SendRecoverEmailUseCase::new(
                    accounts.clone(),
                    token.clone(),
                    mailer.clone(),
                    profiles.clone(),
                    port,
                ),
            )),
            reset_password: Arc::new(ResetPasswordController::new(
                validator(Schema::ResetPassword)?,
                token.clone(),
                profiles.recover.clone(),
                ResetPasswordUseCase::new(accounts.clone(), hasher.clone()),
            )),
            get_account: Arc::new(GetAccountController::new(
                validator(Schema::AccountId)?,
                GetAccountUseCase::new(accounts.clone()),
            )),
            update_account: Arc::new(UpdateAccountController::new(
                validator(Schema::UpdateAccount)?,
                UpdateAccountUseCase::new(accounts.clone(), hasher.clone()),
            )),
            remove_account: Arc::new(RemoveAccountController::new(
                validator(Schema::AccountId)?,
                RemoveAccountUseCase::new(accounts.clone(), tasks.clone(), transactions),
            )),
            create_task: Arc::new(CreateTaskController::new(
                validator(Schema::Task)?,
                CreateTaskUseCase::new(accounts.clone(), tasks.clone()),
            )),
            get_tasks: Arc::new(GetTasksController::new(GetTasksFromAccountUseCase::new(
                accounts.clone(),
                tasks.clone(),
            ))),
            update_task: Arc::new(UpdateTaskController::new(
                validator(Schema::UpdateTask)?,
                UpdateTaskUseCase::new(tasks.clone()),
            )),
            remove_task: Arc::new(RemoveTaskController::new(
                validator(Schema::TaskId)?,
                RemoveTaskUseCase::new(tasks.clone(), accounts.clone()),
            )),
        };

        Ok(Self {
            controllers,
            validate_access: Arc::new(ValidateAccessUseCase::new(
                accounts.clone(),
                token,
                profiles.clone(),
            )),
            notify_task: Arc::new(NotifyTaskUseCase::new(
                tasks,
                accounts,
                mailer,
                NOTIFY_WINDOW_MINUTES,
            )),
        })
    }

    pub fn router(&self) -> Router {
        create_router(self.controllers.clone(), self.validate_access.clone())
    }
}
