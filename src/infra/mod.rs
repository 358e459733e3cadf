//! Concrete adapters for the application ports.

pub mod bcrypt_hasher_adapter;
pub mod jwt_token_adapter;
pub mod schema_validator_adapter;
pub mod smtp_mailer_adapter;

pub use bcrypt_hasher_adapter::BcryptHasherAdapter;
pub use jwt_token_adapter::JwtTokenAdapter;
pub use schema_validator_adapter::{Schema, SchemaValidatorAdapter};
pub use smtp_mailer_adapter::{LogMailerAdapter, SmtpMailerAdapter};
