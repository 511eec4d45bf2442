//! Service and collaborator errors

use crate::infrastructure::StoreError;
use crate::infrastructure::entities::PaymentStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Not found")]
    NotFound,

    #[error("Illegal payment transition from {from} to {to}")]
    IllegalTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Payment is not approved")]
    PaymentNotApproved,

    #[error("Invalid link lifetime: {0} hours")]
    InvalidLifetime(f64),
}

/// Failures of the outbound collaborators (approver channel, chat transport,
/// photo storage).
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("No approver chat is linked")]
    ApproverUnavailable,

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out")]
    Timeout,
}
