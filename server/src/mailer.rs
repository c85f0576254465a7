//! Mailer - Invio degli avvisi di invito via SMTP

use crate::core::config::SmtpConfig;
use crate::repositories::{Read, UserRepository};
use crate::workflow::{NotificationKind, NotificationSink, NotifyError};
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("invalid mailer configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to send email: {0}")]
    SendFailed(String),
}

pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailerError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| MailerError::InvalidConfig(format!("Invalid from address: {}", e)))?;

        let mut builder = if config.use_tls {
            let tls = TlsParameters::new(config.host.clone())
                .map_err(|e| MailerError::InvalidConfig(format!("TLS configuration error: {}", e)))?;

            // 465 usa TLS implicito, le altre porte STARTTLS
            if config.port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                    .map_err(|e| MailerError::InvalidConfig(e.to_string()))?
                    .port(config.port)
                    .tls(Tls::Wrapper(tls))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                    .map_err(|e| MailerError::InvalidConfig(e.to_string()))?
                    .port(config.port)
                    .tls(Tls::Required(tls))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host).port(config.port)
        };

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    #[instrument(skip(self))]
    pub async fn send_invite(
        &self,
        to: &str,
        group_name: &str,
        request_id: i64,
    ) -> Result<(), MailerError> {
        let (subject, body) = invite_content(group_name, request_id);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| MailerError::InvalidConfig(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| MailerError::SendFailed(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| MailerError::SendFailed(e.to_string()))?;

        info!("Invitation email sent");
        Ok(())
    }
}

fn invite_content(group_name: &str, request_id: i64) -> (String, String) {
    (
        format!("You have been invited to join {}", group_name),
        format!(
            "Hi!\n\nYou have been invited to join the group \"{}\".\n\
             Open the app to accept or decline the invitation (request #{}).\n",
            group_name, request_id
        ),
    )
}

/// Sink che inoltra via email solo gli inviti ai gruppi.
/// L'invio avviene in un task separato, l'handler non aspetta il server SMTP.
pub struct EmailSink {
    mailer: Arc<Mailer>,
    users: UserRepository,
}

impl EmailSink {
    pub fn new(mailer: Arc<Mailer>, users: UserRepository) -> Self {
        Self { mailer, users }
    }
}

#[async_trait]
impl NotificationSink for EmailSink {
    async fn notify(
        &self,
        user_id: i64,
        kind: NotificationKind,
        payload: Value,
    ) -> Result<(), NotifyError> {
        if kind != NotificationKind::GroupInvite {
            return Ok(());
        }

        let user = self
            .users
            .read(&user_id)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?
            .ok_or_else(|| NotifyError::Delivery(format!("user {} not found", user_id)))?;

        let group_name = payload["groupName"].as_str().unwrap_or("a group").to_string();
        let request_id = payload["requestId"].as_i64().unwrap_or_default();
        let mailer = self.mailer.clone();

        debug!("Queueing invitation email for user {}", user_id);
        tokio::spawn(async move {
            if let Err(e) = mailer.send_invite(&user.email, &group_name, request_id).await {
                error!("Invitation email to user {} failed: {}", user.id, e);
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(use_tls: bool) -> SmtpConfig {
        SmtpConfig {
            host: "localhost".into(),
            port: 1025,
            username: None,
            password: None,
            from: "Gatherly <no-reply@gatherly.local>".into(),
            use_tls,
        }
    }

    #[test]
    fn mailer_builds_from_plain_config() {
        assert!(Mailer::from_config(&config(false)).is_ok());
    }

    #[test]
    fn invalid_sender_is_rejected() {
        let mut bad = config(false);
        bad.from = "not an address".into();
        assert!(matches!(Mailer::from_config(&bad), Err(MailerError::InvalidConfig(_))));
    }

    #[test]
    fn invite_mentions_group_and_request() {
        let (subject, body) = invite_content("Hikers", 12);
        assert!(subject.contains("Hikers"));
        assert!(body.contains("#12"));
    }
}
