//! Outgoing email: transports, the background delivery queue, and message rendering.
//!
//! Request handlers only ever enqueue. A single worker task drains the queue and
//! hands each message to the configured [`EmailTransport`]; delivery failures
//! are logged and counted, never retried and never reported back to the caller.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::EmailConfig;

#[derive(Debug, Error)]
pub enum EmailError {
    /// No usable transport; email is disabled or SMTP settings are incomplete.
    #[error("Email is not configured: {0}")]
    Configuration(String),

    #[error("Invalid message: {0}")]
    Build(String),

    #[error("Delivery failed: {0}")]
    Transport(String),
}

/// One rendered message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// SMTP delivery through `lettre` with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        if config.smtp_host.is_empty() {
            return Err(EmailError::Configuration("SMTP host is empty".to_string()));
        }

        let from: Mailbox = config.from_address.parse().map_err(|e| {
            EmailError::Configuration(format!("Invalid from address '{}': {e}", config.from_address))
        })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| EmailError::Configuration(e.to_string()))?
            .port(config.smtp_port);

        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| EmailError::Build(format!("Invalid recipient '{}': {e}", message.to)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text.clone(),
                message.html.clone(),
            ))
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        Ok(())
    }
}

/// Used when email is disabled; every send reports a configuration error.
pub struct DisabledMailer;

#[async_trait]
impl EmailTransport for DisabledMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<(), EmailError> {
        Err(EmailError::Configuration(
            "email delivery is disabled".to_string(),
        ))
    }
}

/// Keeps every message in memory instead of sending it.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl MemoryMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.to).collect()
    }
}

#[async_trait]
impl EmailTransport for MemoryMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.sent
            .lock()
            .map_err(|_| EmailError::Transport("mailbox lock poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}

/// Picks the transport for `config`, falling back to [`DisabledMailer`].
pub fn transport_from_config(config: &EmailConfig) -> Arc<dyn EmailTransport> {
    if !config.enabled {
        info!("Email delivery disabled");
        return Arc::new(DisabledMailer);
    }

    match SmtpMailer::from_config(config) {
        Ok(mailer) => {
            info!(host = %config.smtp_host, port = config.smtp_port, "SMTP transport configured");
            Arc::new(mailer)
        }
        Err(e) => {
            warn!(error = %e, "SMTP transport unusable, email delivery disabled");
            Arc::new(DisabledMailer)
        }
    }
}

struct EmailJob {
    id: Uuid,
    kind: &'static str,
    messages: Vec<EmailMessage>,
}

/// Fire-and-forget handle onto the email worker.
#[derive(Clone)]
pub struct EmailQueue {
    tx: mpsc::Sender<EmailJob>,
    transport: Arc<dyn EmailTransport>,
}

impl EmailQueue {
    /// Creates the queue and spawns its worker.
    #[must_use]
    pub fn start(transport: Arc<dyn EmailTransport>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let worker = tokio::spawn(run_worker(rx, Arc::clone(&transport)));
        (Self { tx, transport }, worker)
    }

    /// Queues `messages` as one job and returns its id without waiting for delivery.
    /// A full or closed queue drops the job with a warning.
    pub fn enqueue(&self, kind: &'static str, messages: Vec<EmailMessage>) -> Uuid {
        let id = Uuid::new_v4();
        if messages.is_empty() {
            debug!(job_id = %id, kind, "No recipients, email job skipped");
            return id;
        }

        let count = messages.len();
        match self.tx.try_send(EmailJob { id, kind, messages }) {
            Ok(()) => debug!(job_id = %id, kind, recipients = count, "Email job queued"),
            Err(e) => {
                metrics::counter!("emails_failed_total").increment(count as u64);
                warn!(
                    event = "email_dropped",
                    job_id = %id,
                    kind,
                    error = %e,
                    "Email queue unavailable, job dropped"
                );
            }
        }
        id
    }

    /// Sends immediately on the caller's task, bypassing the queue.
    pub async fn send_now(&self, message: &EmailMessage) -> Result<(), EmailError> {
        self.transport.send(message).await
    }
}

async fn run_worker(mut rx: mpsc::Receiver<EmailJob>, transport: Arc<dyn EmailTransport>) {
    while let Some(job) = rx.recv().await {
        let mut delivered = 0_u64;
        let mut failed = 0_u64;

        for message in &job.messages {
            match transport.send(message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        event = "email_failed",
                        job_id = %job.id,
                        kind = job.kind,
                        recipient = %message.to,
                        error = %e,
                        "Email delivery failed"
                    );
                }
            }
        }

        metrics::counter!("emails_sent_total").increment(delivered);
        metrics::counter!("emails_failed_total").increment(failed);
        info!(
            event = "email_job_finished",
            job_id = %job.id,
            kind = job.kind,
            delivered,
            failed,
            "Email job finished"
        );
    }
}
