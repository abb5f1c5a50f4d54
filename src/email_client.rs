use crate::configuration::{EmailSettings, SmtpSettings};
use crate::validation::ValidatedEmail;
use lettre::message::header::{self, ContentType};
use lettre::message::{Mailbox, Message};
use lettre::transport::smtp;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::future::Future;
use thiserror::Error;

pub const SUBJECT: &str = "Detailed IP Information";

/// Reply codes meaning the server refused our credentials.
const AUTH_REJECTED: [&str; 3] = ["530", "534", "535"];

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    InvalidAddress(String),

    #[error("no recipients given")]
    NoRecipients,

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("error setting up TLS: {0}")]
    Tls(#[source] smtp::Error),

    #[error("SMTP server rejected credentials: {0}")]
    Auth(#[source] smtp::Error),

    #[error("SMTP server unreachable: {0}")]
    Network(#[source] smtp::Error),

    #[error("SMTP server rejected the message: {0}")]
    Delivery(#[source] smtp::Error),
}

impl MailError {
    fn from_transport(err: smtp::Error) -> Self {
        match err.status() {
            Some(code) if AUTH_REJECTED.contains(&code.to_string().as_str()) => Self::Auth(err),
            Some(_) => Self::Delivery(err),
            None => Self::Network(err),
        }
    }
}

/// Delivers a rendered HTML body to a comma-separated recipient list.
pub trait Mailer: Send + Sync {
    fn send_mail(
        &self,
        body: &str,
        recipients: &str,
    ) -> impl Future<Output = Result<(), MailError>> + Send;
}

/// Splits on `,`, trimming whitespace around each address and dropping empty entries.
pub fn split_recipients(recipients: &str) -> Result<Vec<ValidatedEmail>, MailError> {
    let list = recipients
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(|addr| {
            ValidatedEmail::parse(addr).map_err(|e| MailError::InvalidAddress(format!("{addr}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if list.is_empty() {
        return Err(MailError::NoRecipients);
    }
    Ok(list)
}

fn mailbox(addr: &str) -> Result<Mailbox, MailError> {
    addr.parse::<Mailbox>()
        .map_err(|e| MailError::InvalidAddress(format!("{addr}: {e}")))
}

pub fn build_message(sender: &Mailbox, body: &str, recipients: &str) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(sender.clone())
        .subject(SUBJECT)
        .header(header::MIME_VERSION_1_0)
        .header(ContentType::TEXT_HTML);
    for recipient in split_recipients(recipients)? {
        builder = builder.to(mailbox(recipient.as_str())?);
    }
    Ok(builder.body(body.to_string())?)
}

/// Hosts PLAIN auth may reach without TLS.
fn is_local_host(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Logs in as `email.from` with PLAIN. STARTTLS is mandatory unless the host is
    /// loopback, so credentials never cross the network in clear text.
    pub fn new(smtp: &SmtpSettings, email: &EmailSettings) -> Result<Self, MailError> {
        let sender = mailbox(&email.from)?;
        let params = TlsParameters::new(smtp.host.clone()).map_err(MailError::Tls)?;
        let tls = if is_local_host(&smtp.host) {
            Tls::Opportunistic(params)
        } else {
            Tls::Required(params)
        };
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(smtp.host.as_str())
            .port(smtp.port)
            .tls(tls)
            .credentials(Credentials::new(email.from.clone(), email.password.clone()))
            .authentication(vec![Mechanism::Plain])
            .timeout(Some(smtp.timeout()))
            .build();
        Ok(Self { transport, sender })
    }
}

impl Mailer for SmtpMailer {
    #[tracing::instrument(name = "sending ip report", skip(self, body))]
    async fn send_mail(&self, body: &str, recipients: &str) -> Result<(), MailError> {
        let message = build_message(&self.sender, body, recipients)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(MailError::from_transport)?;
        tracing::debug!(code = %response.code(), "message accepted");
        Ok(())
    }
}
