use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::{decode, Controller, HttpRequest, HttpResponse};
use crate::app::add_account_use_case::AddAccountUseCase;
use crate::app::authenticate_use_case::AuthenticateUseCase;
use crate::app::outcome::DomainFailure;
use crate::app::ports::{ParamError, TokenPort, TokenProfile, Validator};
use crate::app::refresh_token_use_case::RefreshTokenUseCase;
use crate::app::reset_password_use_case::{ResetPasswordData, ResetPasswordUseCase};
use crate::app::send_recover_email_use_case::SendRecoverEmailUseCase;
use crate::constants::RECOVER_TOKEN_HEADER;
use crate::domain::{Account, AddAccountData, Credentials};
use crate::error::Result;

fn token_pair(account: &Account) -> HttpResponse {
    HttpResponse::ok(json!({
        "accessToken": account.access_token,
        "refreshToken": account.refresh_token,
    }))
}

pub struct SignUpController {
    validator: Arc<dyn Validator>,
    add_account: AddAccountUseCase,
}

impl SignUpController {
    pub fn new(validator: Arc<dyn Validator>, add_account: AddAccountUseCase) -> Self {
        Self {
            validator,
            add_account,
        }
    }
}

#[async_trait]
impl Controller for SignUpController {
    fn name(&self) -> &'static str {
        "signup"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let data: AddAccountData = match decode(self.validator.as_ref(), request.body.clone()) {
            Ok(data) => data,
            Err(response) => return Ok(response),
        };

        Ok(match self.add_account.add(data).await? {
            Some(account) => token_pair(&account),
            None => HttpResponse::message(409, DomainFailure::EmailAlreadyExists.message()),
        })
    }
}

pub struct LoginController {
    validator: Arc<dyn Validator>,
    authenticate: AuthenticateUseCase,
}

impl LoginController {
    pub fn new(validator: Arc<dyn Validator>, authenticate: AuthenticateUseCase) -> Self {
        Self {
            validator,
            authenticate,
        }
    }
}

#[async_trait]
impl Controller for LoginController {
    fn name(&self) -> &'static str {
        "login"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let credentials: Credentials = match decode(self.validator.as_ref(), request.body.clone()) {
            Ok(credentials) => credentials,
            Err(response) => return Ok(response),
        };

        Ok(match self.authenticate.auth(&credentials).await? {
            Ok(account) => token_pair(&account),
            Err(failure @ DomainFailure::AccountNotFound) => {
                HttpResponse::message(404, failure.message())
            }
            Err(failure) => HttpResponse::message(401, failure.message()),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenInput {
    refresh_token: String,
}

pub struct RefreshTokenController {
    validator: Arc<dyn Validator>,
    refresh_token: RefreshTokenUseCase,
}

impl RefreshTokenController {
    pub fn new(validator: Arc<dyn Validator>, refresh_token: RefreshTokenUseCase) -> Self {
        Self {
            validator,
            refresh_token,
        }
    }
}

#[async_trait]
impl Controller for RefreshTokenController {
    fn name(&self) -> &'static str {
        "refresh_token"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let input: RefreshTokenInput = match decode(self.validator.as_ref(), request.body.clone()) {
            Ok(input) => input,
            Err(response) => return Ok(response),
        };

        Ok(match self.refresh_token.refresh(&input.refresh_token).await? {
            Some(access_token) => HttpResponse::ok(json!({ "accessToken": access_token })),
            None => HttpResponse::message(401, "invalid refresh token, required login"),
        })
    }
}

#[derive(Debug, Deserialize)]
struct RecoverPasswordInput {
    email: String,
}

pub struct RecoverPasswordController {
    validator: Arc<dyn Validator>,
    send_recover_email: SendRecoverEmailUseCase,
}

impl RecoverPasswordController {
    pub fn new(validator: Arc<dyn Validator>, send_recover_email: SendRecoverEmailUseCase) -> Self {
        Self {
            validator,
            send_recover_email,
        }
    }
}

#[async_trait]
impl Controller for RecoverPasswordController {
    fn name(&self) -> &'static str {
        "recover_password"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let input: RecoverPasswordInput =
            match decode(self.validator.as_ref(), request.body.clone()) {
                Ok(input) => input,
                Err(response) => return Ok(response),
            };

        Ok(if self.send_recover_email.send(&input.email).await? {
            HttpResponse::message(200, "Recovery e-mail sent successfully")
        } else {
            HttpResponse::message(404, "E-mail not found")
        })
    }
}

#[derive(Debug, Deserialize)]
struct ResetPasswordInput {
    password: String,
}

/// Verifies the recover token from the `x-recover-password-token` header and stores the
/// new password.
pub struct ResetPasswordController {
    validator: Arc<dyn Validator>,
    token: Arc<dyn TokenPort>,
    recover_profile: TokenProfile,
    reset_password: ResetPasswordUseCase,
}

impl ResetPasswordController {
    pub fn new(
        validator: Arc<dyn Validator>,
        token: Arc<dyn TokenPort>,
        recover_profile: TokenProfile,
        reset_password: ResetPasswordUseCase,
    ) -> Self {
        Self {
            validator,
            token,
            recover_profile,
            reset_password,
        }
    }
}

#[async_trait]
impl Controller for ResetPasswordController {
    fn name(&self) -> &'static str {
        "reset_password"
    }

    async fn perform(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let input: ResetPasswordInput = match decode(self.validator.as_ref(), request.body.clone()) {
            Ok(input) => input,
            Err(response) => return Ok(response),
        };
        let Some(token) = request.header(RECOVER_TOKEN_HEADER) else {
            return Ok(HttpResponse::bad_request(vec![ParamError::new(
                RECOVER_TOKEN_HEADER,
                format!("{RECOVER_TOKEN_HEADER} is required"),
            )]));
        };

        let parsed = match self.token.parse(token, &self.recover_profile).await {
            Ok(parsed) => parsed,
            Err(e) => {
                debug!("Recover token rejected: {} ({})", e.message, e.name);
                return Ok(HttpResponse::message(401, "Invalid or expired token"));
            }
        };

        let data = ResetPasswordData {
            password: input.password,
            account_id: parsed.payload.id,
            fingerprint: parsed.payload.fingerprint,
        };
        Ok(match self.reset_password.reset(data).await? {
            Ok(_) => HttpResponse::message(200, "Successful updated password"),
            Err(DomainFailure::AccountNotFound) => HttpResponse::message(404, "Account not found"),
            Err(failure) => HttpResponse::message(401, failure.message()),
        })
    }
}
