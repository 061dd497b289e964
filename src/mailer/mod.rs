//! Outgoing account email.
//!
//! Callers treat every send as fire-and-forget: a failure is logged by
//! [`deliver`] and never reaches the request that triggered it.

use async_trait::async_trait;

use crate::config::{EmailConfig, SmtpConfig};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Email build error: {0}")]
    Build(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), MailError>;

    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), MailError>;

    /// `temporary_password` is set for invited accounts.
    async fn send_welcome_email(&self, to: &str, temporary_password: Option<&str>) -> Result<(), MailError>;
}

/// Log the outcome of a send. Never fails.
pub async fn deliver<F>(kind: &str, to: &str, send: F)
where
    F: std::future::Future<Output = Result<(), MailError>>,
{
    match send.await {
        Ok(()) => tracing::debug!(kind, to, "email handed off"),
        Err(e) => tracing::error!(kind, to, "email delivery failed: {}", e),
    }
}

/// Subject and plain-text body for each message kind.
pub struct Templates {
    app_base_url: String,
}

impl Templates {
    pub fn new(app_base_url: impl Into<String>) -> Self {
        Self { app_base_url: app_base_url.into().trim_end_matches('/').to_string() }
    }

    pub fn verification(&self, token: &str) -> (String, String) {
        (
            "Verify your email address".to_string(),
            format!(
                "Welcome!\n\nConfirm your email address by opening:\n{}/verify-email?token={}\n",
                self.app_base_url, token
            ),
        )
    }

    pub fn password_reset(&self, token: &str) -> (String, String) {
        (
            "Reset your password".to_string(),
            format!(
                "A password reset was requested for your account.\n\nChoose a new password here:\n{}/reset-password?token={}\n\nIf you did not ask for this, ignore this email.\n",
                self.app_base_url, token
            ),
        )
    }

    pub fn welcome(&self, temporary_password: Option<&str>) -> (String, String) {
        let body = match temporary_password {
            Some(password) => format!(
                "An account has been created for you.\n\nSign in at {}/login with this temporary password:\n{}\n\nChange it after your first sign-in.\n",
                self.app_base_url, password
            ),
            None => format!("Your email address is confirmed. Sign in at {}/login\n", self.app_base_url),
        };
        ("Welcome".to_string(), body)
    }
}

/// Writes messages to the log instead of sending them.
pub struct LogMailer {
    templates: Templates,
}

impl LogMailer {
    pub fn new(app_base_url: impl Into<String>) -> Self {
        Self { templates: Templates::new(app_base_url) }
    }

    fn log(&self, to: &str, (subject, body): (String, String)) {
        tracing::info!(to, subject = %subject, "email (not sent)\n{}", body);
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        self.log(to, self.templates.verification(token));
        Ok(())
    }

    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        self.log(to, self.templates.password_reset(token));
        Ok(())
    }

    async fn send_welcome_email(&self, to: &str, temporary_password: Option<&str>) -> Result<(), MailError> {
        self.log(to, self.templates.welcome(temporary_password));
        Ok(())
    }
}

/// Plain-text mail over SMTP with STARTTLS.
pub struct SmtpMailer {
    smtp: SmtpConfig,
    templates: Templates,
}

impl SmtpMailer {
    pub fn new(smtp: SmtpConfig, app_base_url: impl Into<String>) -> Self {
        Self { smtp, templates: Templates::new(app_base_url) }
    }

    async fn send(&self, to: &str, (subject, body): (String, String)) -> Result<(), MailError> {
        use lettre::{
            message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
            AsyncTransport, Message, Tokio1Executor,
        };

        let email = Message::builder()
            .from(self.smtp.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailError::Build(e.to_string()))?;

        let mut transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.smtp.host)?.port(self.smtp.port);
        if let (Some(user), Some(pass)) = (&self.smtp.user, &self.smtp.password) {
            transport = transport.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        transport.build().send(email).await?;
        tracing::info!(to, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_verification_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        self.send(to, self.templates.verification(token)).await
    }

    async fn send_password_reset_email(&self, to: &str, token: &str) -> Result<(), MailError> {
        self.send(to, self.templates.password_reset(token)).await
    }

    async fn send_welcome_email(&self, to: &str, temporary_password: Option<&str>) -> Result<(), MailError> {
        self.send(to, self.templates.welcome(temporary_password)).await
    }
}

/// SMTP when configured, otherwise the log.
pub fn from_config(email: &EmailConfig) -> std::sync::Arc<dyn Mailer> {
    match &email.smtp {
        Some(smtp) => std::sync::Arc::new(SmtpMailer::new(smtp.clone(), email.app_base_url.clone())),
        None => std::sync::Arc::new(LogMailer::new(email.app_base_url.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_use_the_base_url() {
        let templates = Templates::new("https://erp.example.com/");
        let (_, body) = templates.verification("abc");
        assert!(body.contains("https://erp.example.com/verify-email?token=abc"));
        let (_, body) = templates.password_reset("xyz");
        assert!(body.contains("https://erp.example.com/reset-password?token=xyz"));
    }

    #[test]
    fn welcome_mentions_temporary_password_only_for_invites() {
        let templates = Templates::new("http://localhost");
        assert!(templates.welcome(Some("Tmp-123")).1.contains("Tmp-123"));
        assert!(!templates.welcome(None).1.contains("temporary"));
    }

    #[tokio::test]
    async fn log_mailer_never_fails() {
        let mailer = LogMailer::new("http://localhost");
        assert!(mailer.send_verification_email("a@b.co", "t").await.is_ok());
    }
}
