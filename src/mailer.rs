use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport as _};

use crate::config::{EmailCredentials, EmailSettings};

#[derive(thiserror::Error, Debug)]
pub enum MailerError {
    #[error("invalid email address {0}")]
    Address(String),
    #[error("could not build email: {0}")]
    Build(String),
    #[error("smtp error: {0}")]
    Smtp(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text_body: String,
    /// When present the message is sent as multipart plain + HTML.
    pub html_body: Option<String>,
}

pub trait Mailer {
    fn send(&self, credentials: &EmailCredentials, message: &EmailMessage) -> Result<(), MailerError>;
}

/// Authenticated SMTP delivery.
pub struct SmtpMailer {
    host: String,
    port: u16,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_settings(settings: &EmailSettings) -> Self {
        Self::new(&settings.smtp_host, settings.smtp_port)
    }

    fn transport(&self, credentials: &EmailCredentials) -> Result<SmtpTransport, MailerError> {
        let builder = if self.port == 465 {
            SmtpTransport::relay(&self.host)
        } else {
            SmtpTransport::starttls_relay(&self.host)
        }
        .map_err(|e| MailerError::Smtp(e.to_string()))?;

        Ok(builder
            .port(self.port)
            .timeout(Some(self.timeout))
            .credentials(Credentials::new(
                credentials.username.clone(),
                credentials.password.clone(),
            ))
            .build())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, MailerError> {
    address
        .parse()
        .map_err(|_| MailerError::Address(address.to_string()))
}

pub fn build_message(message: &EmailMessage) -> Result<Message, MailerError> {
    let builder = Message::builder()
        .from(mailbox(&message.from)?)
        .to(mailbox(&message.to)?)
        .subject(message.subject.clone());

    let built = match &message.html_body {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            message.text_body.clone(),
            html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(message.text_body.clone()),
    };

    built.map_err(|e| MailerError::Build(e.to_string()))
}

impl Mailer for SmtpMailer {
    fn send(&self, credentials: &EmailCredentials, message: &EmailMessage) -> Result<(), MailerError> {
        let email = build_message(message)?;
        let transport = self.transport(credentials)?;

        tracing::debug!("Sending report to {} via {}:{}", message.to, self.host, self.port);
        transport
            .send(&email)
            .map_err(|e| MailerError::Smtp(e.to_string()))?;

        Ok(())
    }
}
