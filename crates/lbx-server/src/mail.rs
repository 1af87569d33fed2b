//! Outgoing mail: configuration and the delivery backends.

use std::sync::Arc;

use async_trait::async_trait;
use lbx_config::{string_enum, Config, ConfigError, Field};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use crate::error::{ServerError, ServerResult};

string_enum! {
    #[derive(Default)]
    pub enum EmailBackend {
        Smtp => "smtp",
        #[default]
        Console => "console",
    }
}

#[derive(Clone, PartialEq)]
pub struct SmtpConfig {
    pub host: Option<String>,
    /// Transport default (25, or 465 when `secure`) when unset.
    pub port: Option<u16>,
    /// Implicit TLS. Plain connections are used otherwise.
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            secure: false,
            user: None,
            password: None,
            from: "Lockbox <noreply@lockbox.local>".into(),
        }
    }
}

impl Config for SmtpConfig {
    const NAME: &'static str = "SmtpConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::optional("host", |c: &mut Self| &mut c.host),
            Field::optional("port", |c: &mut Self| &mut c.port),
            Field::scalar("secure", |c: &mut Self| &mut c.secure),
            Field::optional("user", |c: &mut Self| &mut c.user),
            Field::optional("password", |c: &mut Self| &mut c.password),
            Field::scalar("from", |c: &mut Self| &mut c.from),
        ]
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from", &self.from)
            .finish()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmailConfig {
    pub backend: EmailBackend,
    pub smtp: Option<SmtpConfig>,
}

impl Config for EmailConfig {
    const NAME: &'static str = "EmailConfig";

    fn fields() -> Vec<Field<Self>> {
        vec![
            Field::scalar("backend", |c: &mut Self| &mut c.backend),
            Field::optional_nested("smtp", |c: &mut Self| &mut c.smtp),
        ]
    }
}

/// A plain-text message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

impl Mail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn send(&self, mail: &Mail) -> ServerResult<()>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleMailer;

#[async_trait]
impl Mailer for ConsoleMailer {
    fn backend_name(&self) -> &'static str {
        "console"
    }

    async fn send(&self, mail: &Mail) -> ServerResult<()> {
        info!(to = %mail.to, subject = %mail.subject, body = %mail.text, "mail not delivered (console backend)");
        Ok(())
    }
}

/// Delivers messages through an SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> ServerResult<Self> {
        let host = config
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                key: "email.smtp.host".into(),
            })?;
        let from: Mailbox = config.from.parse().map_err(|e| ConfigError::Invalid {
            key: "email.smtp.from".into(),
            reason: format!("{e}"),
        })?;

        let mut builder = if config.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| ServerError::Mail(format!("SMTP relay error: {e}")))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        if let Some(port) = config.port {
            builder = builder.port(port);
        }
        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    pub fn from_address(&self) -> &Mailbox {
        &self.from
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn backend_name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, mail: &Mail) -> ServerResult<()> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| ServerError::Mail(format!("invalid recipient {:?}: {e}", mail.to)))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.text.clone())
            .map_err(|e| ServerError::Mail(format!("failed to build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| ServerError::Mail(format!("SMTP delivery failed: {e}")))?;
        debug!(to = %mail.to, "mail delivered");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer").field("from", &self.from).finish_non_exhaustive()
    }
}

/// Construct the mailer `config.backend` selects.
pub fn build_mailer(config: &EmailConfig) -> ServerResult<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match config.backend {
        EmailBackend::Console => Arc::new(ConsoleMailer),
        EmailBackend::Smtp => {
            let smtp = config.smtp.as_ref().ok_or_else(|| ConfigError::MissingSection {
                key: "email.smtp".into(),
                backend: EmailBackend::Smtp.to_string(),
            })?;
            Arc::new(SmtpMailer::new(smtp)?)
        }
    };
    info!(backend = mailer.backend_name(), "mailer ready");
    Ok(mailer)
}
