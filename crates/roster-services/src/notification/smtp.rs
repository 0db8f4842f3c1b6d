use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use async_trait::async_trait;
use roster_core::Config;

use super::{Notification, NotificationError, Notifier};

/// SMTP notifier.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl SmtpNotifier {
    /// Create from config. Returns `None` if email is disabled or SMTP is not configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        let email = config.email();
        if !email.enabled {
            tracing::debug!("Email notifications disabled (EMAIL_ENABLED=false)");
            return None;
        }
        let host = email.smtp_host.as_deref()?;
        let from: Mailbox = match email.smtp_from.as_deref()?.parse() {
            Ok(from) => from,
            Err(e) => {
                tracing::error!(error = %e, "Invalid SMTP_FROM, email notifications disabled");
                return None;
            }
        };
        let port = email.smtp_port;
        let credentials = match (&email.smtp_user, &email.smtp_password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let mailer = if email.smtp_tls {
            let b = match AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host) {
                Ok(b) => b.port(port),
                Err(e) => {
                    tracing::error!(error = %e, host = %host, "Failed to configure SMTP relay");
                    return None;
                }
            };
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(
                host = %host,
                port = port,
                "Email notifier initialized (SMTP with STARTTLS)"
            );
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = match credentials {
                Some(c) => b.credentials(c),
                None => b,
            };
            tracing::info!(host = %host, port = port, "Email notifier initialized (SMTP)");
            b.build()
        };

        Some(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }

    fn build_message(&self, notification: &Notification) -> Result<Message, NotificationError> {
        let to: Mailbox = notification
            .to
            .parse()
            .map_err(|_| NotificationError::InvalidAddress(notification.to.clone()))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject.clone());

        let message = match &notification.html {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                notification.text.clone(),
                html.clone(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(notification.text.clone()),
        };

        message.map_err(|e| NotificationError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let message = self.build_message(notification)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier() -> SmtpNotifier {
        SmtpNotifier {
            mailer: Arc::new(
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous("localhost").build(),
            ),
            from: "Roster <noreply@example.com>".parse().unwrap(),
        }
    }

    fn notification(to: &str, html: Option<&str>) -> Notification {
        Notification {
            to: to.to_string(),
            subject: "Welcome".to_string(),
            text: "Plain body".to_string(),
            html: html.map(str::to_string),
        }
    }

    #[test]
    fn test_invalid_recipient_is_rejected_before_sending() {
        let result = notifier().build_message(&notification("not an address", None));
        assert!(matches!(result, Err(NotificationError::InvalidAddress(_))));
    }

    #[test]
    fn test_html_messages_are_multipart_alternative() {
        let message = notifier()
            .build_message(&notification("ada@x.com", Some("<p>Hi</p>")))
            .unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Plain body"));
    }
}
