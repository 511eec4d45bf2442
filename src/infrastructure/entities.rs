//! Database entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::Display;
use uuid::Uuid;

/// One generated proposal page. Rows are written once and never updated.
#[derive(Debug, Clone, FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub name: String,
    pub photo_url: Option<String>,
    /// `None` means the link never expires.
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub chat_id: i64,
}

/// Lifecycle of a manually verified payment.
///
/// `Pending` is the only entry state. `Rejected` and `Used` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Rejected,
    Used,
}

impl PaymentStatus {
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Approved)
                | (PaymentStatus::Pending, PaymentStatus::Rejected)
                | (PaymentStatus::Approved, PaymentStatus::Used)
        )
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Approved => "approved",
            PaymentStatus::Rejected => "rejected",
            PaymentStatus::Used => "used",
        };
        write!(f, "{}", status)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn requester_label(&self) -> String {
        display_label(self.username.as_deref(), self.first_name.as_deref())
    }
}

/// `@handle` when the user has one, else their first name.
pub fn display_label(username: Option<&str>, first_name: Option<&str>) -> String {
    match (username, first_name) {
        (Some(username), _) => format!("@{username}"),
        (None, Some(first_name)) => first_name.to_owned(),
        (None, None) => "Unknown".to_owned(),
    }
}
