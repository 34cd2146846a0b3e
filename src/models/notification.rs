//! Outbound email models.
//!
//! Every notification is posted to the mail relay as an `OutboundEmail` and
//! the attempt is recorded in the `email_notifications` table.

use serde::Serialize;
use uuid::Uuid;

/// A rendered email, ready to hand to the relay.
///
/// This is also the JSON body sent to the relay:
///
/// ```json
/// {
///   "from": "no-reply@bank.local",
///   "to": "alice@example.com",
///   "subject": "Money Transfer Message",
///   "html": "<p>Dear Alice, ...</p>"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Who an email goes to.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Result of a delivery attempt, stored in `email_notifications`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryResult {
    /// HTTP status returned by the relay, `None` if it was never reached
    pub response_status: Option<i32>,

    /// Transport error or non-success body
    pub error: Option<String>,
}
