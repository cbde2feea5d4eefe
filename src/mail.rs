//!
//! # Outbound Mail
//!
//! SMTP delivery for the password-reset flow. The transport is built once at
//! startup from [`Config`] and injected via `web::Data` alongside the
//! database pool, so there is no ambient connection state. Send failures are
//! logged and surfaced to the caller; there are no retries.

use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::error;

use crate::config::Config;
use crate::error::AppError;

/// Builds the password-reset link handed to the front end. The token travels
/// as a query parameter.
pub fn reset_link(frontend_base_url: &str, token: &str) -> String {
    format!(
        "{}/resetPassword?token={}",
        frontend_base_url.trim_end_matches('/'),
        token
    )
}

/// Builds the HTML reset message without touching the network, so the
/// envelope and body can be tested offline.
pub fn reset_message(from: &Mailbox, to: &str, link: &str) -> Result<Message, AppError> {
    let to = to
        .parse::<Mailbox>()
        .map_err(|e| AppError::InternalServerError(format!("invalid recipient address: {}", e)))?;

    let body = format!(
        "<html><body>\
         <p>A password reset was requested for your account.</p>\
         <p><a href=\"{link}\">Reset your password</a></p>\
         <p>The link expires in 20 minutes. If you did not request this, you can ignore this email.</p>\
         </body></html>"
    );

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject("Password reset")
        .header(ContentType::TEXT_HTML)
        .body(body)
        .map_err(Into::into)
}

/// Long-lived SMTP client shared by the workers via `web::Data`.
#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| AppError::InternalServerError(format!("SMTP setup failed: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_user.clone(),
                config.smtp_password.clone(),
            ))
            .build();

        let from = config.smtp_user.parse::<Mailbox>().map_err(|e| {
            AppError::InternalServerError(format!("SMTP_USER is not a valid address: {}", e))
        })?;

        Ok(Self { transport, from })
    }

    /// Sends the password-reset email carrying `link` to `to`.
    pub async fn send_password_reset(&self, to: &str, link: &str) -> Result<(), AppError> {
        let message = reset_message(&self.from, to, link)?;

        if let Err(e) = self.transport.send(message).await {
            error!("failed to send password-reset email to {}: {}", to, e);
            return Err(e.into());
        }
        Ok(())
    }
}
