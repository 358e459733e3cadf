use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::app::ports::{MailerPort, SendEmailData};
use crate::config::MailConfig;
use crate::error::{Result, TaskerError};

fn mail_error(message: impl std::fmt::Display) -> TaskerError {
    TaskerError::Mail {
        message: message.to_string(),
    }
}

/// Sends HTML mail through an SMTP relay.
pub struct SmtpMailerAdapter {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailerAdapter {
    pub fn new(config: &MailConfig) -> Result<Self> {
        // 465 speaks TLS from the first byte; every other port upgrades with STARTTLS
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        }
        .map_err(mail_error)?
        .port(config.port);

        let builder = match (&config.user, &config.password) {
            (Some(user), Some(password)) => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| mail_error(format!("Invalid MAIL_FROM '{}': {e}", config.from)))?;

        info!("SMTP mailer configured for {}:{}", config.host, config.port);
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl MailerPort for SmtpMailerAdapter {
    async fn send(&self, mail: &SendEmailData) -> Result<()> {
        let to = mail
            .to
            .parse::<Mailbox>()
            .map_err(|e| mail_error(format!("Invalid recipient '{}': {e}", mail.to)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html.clone().unwrap_or_default())
            .map_err(mail_error)?;

        self.transport.send(message).await.map_err(mail_error)?;
        debug!("Mail '{}' sent to {}", mail.subject, mail.to);
        Ok(())
    }
}

/// Mailer used when no SMTP host is configured: logs each message instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogMailerAdapter;

#[async_trait]
impl MailerPort for LogMailerAdapter {
    async fn send(&self, mail: &SendEmailData) -> Result<()> {
        info!(
            to = %mail.to,
            subject = %mail.subject,
            "Mail delivery disabled; message logged only"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        let mailer = LogMailerAdapter;
        let mail = SendEmailData {
            to: "someone@example.com".into(),
            subject: "Hello".into(),
            html: None,
        };
        assert!(mailer.send(&mail).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_sender_is_rejected() {
        let config = MailConfig {
            host: "localhost".into(),
            port: 2525,
            user: None,
            password: None,
            from: "not an address".into(),
        };
        assert!(SmtpMailerAdapter::new(&config).is_err());
    }
}
