use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info};

use crate::config::MailConfig;

const SENDER_NAME: &str = "Lumina Calc";

/// A plain-text result email, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
}

/// Build the result email for one calculation.
/// An absent `mode` arrives as `""` and prints an empty `Mode:` line.
pub fn compose(expression: &str, result: &str, mode: &str, at: DateTime<Utc>) -> OutgoingMail {
    let subject = if mode == "AI" {
        "[Lumina Calc] AI Result"
    } else {
        "[Lumina Calc] Result"
    };

    OutgoingMail {
        subject: subject.to_string(),
        body: format!(
            "Expression: {}\nResult: {}\nMode: {}\nTime: {}\n",
            expression,
            result,
            mode,
            at.to_rfc3339_opts(SecondsFormat::Millis, true)
        ),
    }
}

/// Delivers result emails.
pub trait Mailer: Send + Sync + 'static {
    fn send(&self, mail: OutgoingMail) -> impl Future<Output = Result<(), String>> + Send;
}

/// SMTP sender authenticated with an app password over TLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, String> {
        let from = Mailbox::new(
            Some(SENDER_NAME.to_string()),
            config
                .user
                .parse()
                .map_err(|e| format!("Invalid sender address '{}': {}", config.user, e))?,
        );

        let to = config
            .to
            .split(',')
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .map_err(|e| format!("Invalid recipient address '{}': {}", addr, e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if to.is_empty() {
            return Err("No recipient address configured".to_string());
        }

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| format!("Failed to configure SMTP relay {}: {}", config.smtp_host, e))?
            .credentials(Credentials::new(
                config.user.clone(),
                config.app_password.clone(),
            ))
            .build();

        info!(
            "SMTP mailer ready (host: {}, recipients: {})",
            config.smtp_host,
            to.len()
        );
        Ok(Self { transport, from, to })
    }
}

impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), String> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(mail.subject)
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        let message = builder
            .body(mail.body)
            .map_err(|e| format!("Failed to build message: {}", e))?;

        self.transport.send(message).await.map_err(|e| {
            error!("SMTP send failed: {}", e);
            format!("SMTP send failed: {}", e)
        })?;

        info!("Result email sent");
        Ok(())
    }
}
