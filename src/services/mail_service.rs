//! Mail service for customer notifications.
//!
//! Renders the notification emails (deposits, withdrawals, loan requests,
//! transfers, password changes), posts them to the configured mail relay and
//! records every attempt in `email_notifications`.
//!
//! # Relay Protocol
//!
//! `POST <MAIL_RELAY_URL>` with a JSON `OutboundEmail` body. When a relay
//! secret is configured the request carries
//! `X-Mail-Signature: sha256=<hex hmac of the body>`.
//!
//! Without a relay URL emails are logged and recorded but not delivered.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    models::notification::{DeliveryResult, OutboundEmail, Recipient},
    services::transaction_service::format_cents,
};

type HmacSha256 = Hmac<Sha256>;

const RELAY_TIMEOUT: Duration = Duration::from_secs(5);

/// A notification the bank sends to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Deposit { amount_cents: i64 },
    Withdrawal { amount_cents: i64 },
    LoanRequest { amount_cents: i64 },
    TransferSent { amount_cents: i64, to_account_number: i64 },
    TransferReceived { amount_cents: i64, from_account_number: i64 },
    PasswordChanged,
}

impl Notification {
    pub fn subject(&self) -> &'static str {
        match self {
            Notification::Deposit { .. } => "Deposit Message",
            Notification::Withdrawal { .. } => "Withdrawal Message",
            Notification::LoanRequest { .. } => "Loan Request Message",
            Notification::TransferSent { .. } => "Money Transfer Message",
            Notification::TransferReceived { .. } => "Money Received Message",
            Notification::PasswordChanged => "Your Password Has Been Changed",
        }
    }

    /// HTML body addressed to `name`.
    pub fn render(&self, name: &str) -> String {
        let body = match self {
            Notification::Deposit { amount_cents } => format!(
                "Your deposit of {} $ has been added to your account.",
                format_cents(*amount_cents)
            ),
            Notification::Withdrawal { amount_cents } => format!(
                "{} $ has been withdrawn from your account.",
                format_cents(*amount_cents)
            ),
            Notification::LoanRequest { amount_cents } => format!(
                "Your loan request for {} $ has been received and is waiting for approval.",
                format_cents(*amount_cents)
            ),
            Notification::TransferSent {
                amount_cents,
                to_account_number,
            } => format!(
                "You have sent {} $ to account {}.",
                format_cents(*amount_cents),
                to_account_number
            ),
            Notification::TransferReceived {
                amount_cents,
                from_account_number,
            } => format!(
                "You have received {} $ from account {}.",
                format_cents(*amount_cents),
                from_account_number
            ),
            Notification::PasswordChanged => {
                "Your password was changed. If this wasn't you, contact the bank immediately."
                    .to_string()
            }
        };

        format!(
            "<html><body><p>Dear {},</p><p>{}</p><p>Thank you for banking with us.</p></body></html>",
            escape_html(name),
            body
        )
    }
}

/// Sends notification emails through the HTTP mail relay.
#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    from: String,
    relay_url: Option<String>,
    relay_secret: Option<String>,
}

impl Mailer {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(RELAY_TIMEOUT).build()?;

        Ok(Self {
            client,
            from: config.mail_from.clone(),
            relay_url: config.mail_relay_url.clone(),
            relay_secret: config.mail_relay_secret.clone(),
        })
    }

    /// Send in the background; the caller's request never waits on or fails
    /// because of mail delivery.
    pub fn notify(&self, pool: DbPool, recipient: Recipient, notification: Notification) {
        let mailer = self.clone();

        tokio::spawn(async move {
            if let Err(e) = mailer.send(&pool, &recipient, &notification).await {
                tracing::error!(
                    to = %recipient.email,
                    subject = notification.subject(),
                    "Failed to record email: {:?}",
                    e
                );
            }
        });
    }

    /// Render, deliver and record one notification.
    pub async fn send(
        &self,
        pool: &DbPool,
        recipient: &Recipient,
        notification: &Notification,
    ) -> Result<DeliveryResult, AppError> {
        let email = self.compose(recipient, notification);

        let result = match self.relay_url {
            Some(ref url) => self.deliver(url, &email).await,
            None => {
                tracing::info!(
                    to = %email.to,
                    subject = %email.subject,
                    "mail relay not configured, email logged only"
                );
                DeliveryResult::default()
            }
        };

        if let Some(ref error) = result.error {
            tracing::error!(to = %email.to, subject = %email.subject, "email delivery failed: {}", error);
        }

        sqlx::query(
            r#"
            INSERT INTO email_notifications (
                user_id,
                recipient,
                subject,
                body_html,
                response_status,
                error
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(recipient.user_id)
        .bind(&email.to)
        .bind(&email.subject)
        .bind(&email.html)
        .bind(result.response_status)
        .bind(&result.error)
        .execute(pool)
        .await?;

        Ok(result)
    }

    fn compose(&self, recipient: &Recipient, notification: &Notification) -> OutboundEmail {
        OutboundEmail {
            from: self.from.clone(),
            to: recipient.email.clone(),
            subject: notification.subject().to_string(),
            html: notification.render(&recipient.name),
        }
    }

    /// POST one email to the relay. Never fails; problems end up in the
    /// returned `DeliveryResult`.
    async fn deliver(&self, url: &str, email: &OutboundEmail) -> DeliveryResult {
        let payload = match serde_json::to_string(email) {
            Ok(payload) => payload,
            Err(e) => {
                return DeliveryResult {
                    response_status: None,
                    error: Some(format!("Failed to serialize email: {e}")),
                };
            }
        };

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json");

        if let Some(ref secret) = self.relay_secret {
            match generate_signature(secret, &payload) {
                Ok(signature) => request = request.header("X-Mail-Signature", signature),
                Err(e) => {
                    return DeliveryResult {
                        response_status: None,
                        error: Some(format!("Failed to sign email: {e}")),
                    };
                }
            }
        }

        match request.body(payload).send().await {
            Ok(response) => {
                let status = response.status();
                let error = if status.is_success() {
                    None
                } else {
                    Some(
                        response
                            .text()
                            .await
                            .unwrap_or_else(|_| status.to_string()),
                    )
                };

                DeliveryResult {
                    response_status: Some(i32::from(status.as_u16())),
                    error,
                }
            }
            Err(e) => DeliveryResult {
                response_status: None,
                error: Some(format!("Request failed: {e}")),
            },
        }
    }
}

/// HMAC-SHA256 of the payload in the form `sha256=<hex>`.
fn generate_signature(secret: &str, payload: &str) -> Result<String, hmac::digest::InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(payload.as_bytes());
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }

    escaped
}
