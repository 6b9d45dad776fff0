// src/channels/email.rs

//! SMTP email.
//!
//! Sends the HTML document with a plain-text alternative. The SMTP host is
//! inferred from the sender's domain when the account does not name one.

use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::ChannelSender;
use crate::error::{AppError, Result};
use crate::models::{Account, Channel, ReportPayload};
use crate::pipeline::markup::Markup;
use crate::pipeline::split::Batch;

/// Implicit-TLS submission port; other ports use STARTTLS.
const SMTPS_PORT: u16 = 465;
const SUBMISSION_PORT: u16 = 587;

/// Well-known providers: domain, host, port.
const KNOWN_SMTP: &[(&str, &str, u16)] = &[
    ("gmail.com", "smtp.gmail.com", 587),
    ("qq.com", "smtp.qq.com", 465),
    ("foxmail.com", "smtp.qq.com", 465),
    ("163.com", "smtp.163.com", 465),
    ("126.com", "smtp.126.com", 465),
    ("sina.com", "smtp.sina.com", 465),
    ("outlook.com", "smtp-mail.outlook.com", 587),
    ("hotmail.com", "smtp-mail.outlook.com", 587),
    ("live.com", "smtp-mail.outlook.com", 587),
    ("yahoo.com", "smtp.mail.yahoo.com", 465),
    ("icloud.com", "smtp.mail.me.com", 587),
];

#[derive(Debug, Clone)]
pub struct EmailSender {
    timeout: Duration,
    max_bytes: Option<usize>,
}

impl EmailSender {
    pub fn new(timeout: Duration, max_bytes: Option<usize>) -> Self {
        Self { timeout, max_bytes }
    }
}

/// Resolve the SMTP host and port for a sender address.
pub fn smtp_endpoint(from: &str, server: Option<&str>, port: Option<u16>) -> Option<(String, u16)> {
    let domain = from.rsplit_once('@').map(|(_, d)| d.to_lowercase());
    let known = domain
        .as_deref()
        .and_then(|d| KNOWN_SMTP.iter().find(|(known, _, _)| *known == d));

    match (server, known) {
        (Some(host), _) => {
            let port = port
                .or_else(|| known.filter(|(_, h, _)| *h == host).map(|(_, _, p)| *p))
                .unwrap_or(SUBMISSION_PORT);
            Some((host.to_string(), port))
        }
        (None, Some((_, host, default_port))) => {
            Some((host.to_string(), port.unwrap_or(*default_port)))
        }
        (None, None) => domain.map(|d| (format!("smtp.{d}"), port.unwrap_or(SUBMISSION_PORT))),
    }
}

fn build_message(
    channel_err: impl Fn(String) -> AppError,
    from: &str,
    to: &[String],
    subject: String,
    text: String,
    html: Option<&str>,
) -> Result<Message> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| channel_err(format!("invalid sender address: {e}")))?;
    let mut builder = Message::builder().from(from).subject(subject);
    for recipient in to {
        let mailbox: Mailbox = recipient
            .parse()
            .map_err(|e| channel_err(format!("invalid recipient `{recipient}`: {e}")))?;
        builder = builder.to(mailbox);
    }

    let message = match html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(text, html.to_string())),
        None => builder.header(ContentType::TEXT_PLAIN).body(text),
    };
    message.map_err(|e| channel_err(format!("cannot build message: {e}")))
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    fn markup(&self) -> Markup {
        Markup::Plain
    }

    fn max_bytes(&self) -> Option<usize> {
        self.max_bytes
    }

    async fn deliver(&self, payload: &ReportPayload, batch: &Batch, account: &Account) -> Result<()> {
        let Account::Email {
            from,
            password,
            to,
            smtp_server,
            smtp_port,
        } = account
        else {
            return Err(AppError::channel(
                Channel::Email,
                account.label(),
                "account type does not match channel",
            ));
        };
        let fail = |message: String| AppError::channel(Channel::Email, account.label(), message);

        if from.is_empty() || password.is_empty() || to.is_empty() {
            return Err(fail("sender, password and recipients must all be set".into()));
        }
        let (host, port) = smtp_endpoint(from, smtp_server.as_deref(), *smtp_port)
            .ok_or_else(|| fail(format!("cannot infer SMTP server for `{from}`")))?;

        let mut subject = payload.headline();
        if let Some(header) = batch.header() {
            subject = format!("{subject} {header}");
        }
        // The HTML document covers the whole payload, so only an unsplit batch carries it.
        let html = payload.html.as_deref().filter(|_| batch.total == 1);
        let message = build_message(&fail, from, to, subject, batch.text.clone(), html)?;

        let relay = if port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
        }
        .map_err(|e| fail(format!("SMTP setup for {host}: {e}")))?;
        let mailer = relay
            .port(port)
            .credentials(Credentials::new(from.clone(), password.clone()))
            .timeout(Some(self.timeout))
            .build();

        log::debug!("Sending email via {}:{} to {} recipient(s)", host, port, to.len());
        mailer
            .send(message)
            .await
            .map_err(|e| fail(format!("SMTP {host}:{port}: {e}")))?;
        Ok(())
    }
}
