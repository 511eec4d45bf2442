//! DI "Interfaces"

use crate::core::engine::Requester;
use crate::core::error::{GatewayError, ServiceError};
use crate::core::gateway::Decision;
use crate::infrastructure::entities;
use crate::infrastructure::entities::PaymentStatus;
use async_trait::async_trait;
use chrono::Duration;
use std::path::PathBuf;
use uuid::Uuid;

/// Result of a guarded payment status update.
#[derive(Debug)]
pub enum Transition {
    /// The row was in the expected status and now holds the new one.
    Applied(entities::Payment),
    /// The row had already left the expected status; nothing was written.
    AlreadyResolved(PaymentStatus),
}

#[async_trait]
pub trait ProposalService: Send + Sync {
    /// Persists a new proposal stamped with the current time.
    ///
    /// `lifetime` of `None` creates a link that never expires.
    async fn create_proposal(
        &self,
        chat_id: i64,
        name: String,
        photo_url: Option<String>,
        lifetime: Option<Duration>,
    ) -> Result<entities::Proposal, ServiceError>;

    async fn find_proposal(&self, id: Uuid) -> Result<Option<entities::Proposal>, ServiceError>;
}

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Records a new `pending` payment for the requester's chat.
    async fn open_request(&self, requester: &Requester) -> Result<entities::Payment, ServiceError>;

    async fn find_payment(&self, id: Uuid) -> Result<Option<entities::Payment>, ServiceError>;

    /// The approved, not yet used payment of a chat, if any.
    async fn approved_payment(
        &self,
        chat_id: i64,
    ) -> Result<Option<entities::Payment>, ServiceError>;

    /// The most recent payment of a chat still waiting for the approver.
    async fn pending_payment(&self, chat_id: i64)
    -> Result<Option<entities::Payment>, ServiceError>;

    /// Moves a payment from `expected` to `next` atomically.
    ///
    /// Returns `Err(ServiceError::NotFound)` for unknown ids and
    /// `Err(ServiceError::IllegalTransition)` when `expected -> next` is not a
    /// lifecycle edge.
    async fn transition(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Transition, ServiceError>;

    async fn approve(&self, id: Uuid) -> Result<Transition, ServiceError> {
        self.transition(id, PaymentStatus::Pending, PaymentStatus::Approved)
            .await
    }

    async fn reject(&self, id: Uuid) -> Result<Transition, ServiceError> {
        self.transition(id, PaymentStatus::Pending, PaymentStatus::Rejected)
            .await
    }

    /// Consumes an approved payment once a proposal has been issued from it.
    async fn mark_used(&self, id: Uuid) -> Result<Transition, ServiceError> {
        self.transition(id, PaymentStatus::Approved, PaymentStatus::Used)
            .await
    }
}

/// A photo written to blob storage.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPhoto {
    /// Public URL handed to the presentation page.
    pub url: String,
    pub path: PathBuf,
}

/// Blob storage for photos received over the chat transport.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Downloads the raw bytes of a received photo.
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, GatewayError>;

    /// Downloads a received photo and stores it under a public URL.
    async fn persist(&self, file_id: &str) -> Result<StoredPhoto, GatewayError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoAudit {
    pub recipient_name: String,
    pub requester: String,
}

/// Outbound channel to the human approver.
#[async_trait]
pub trait ApproverGateway: Send + Sync {
    /// Sends a payment screenshot with approve/reject controls.
    async fn request_approval(
        &self,
        payment: &entities::Payment,
        screenshot: Vec<u8>,
    ) -> Result<(), GatewayError>;

    /// Copies a proposal photo to the approver for auditing.
    async fn audit_photo(&self, photo: &StoredPhoto, audit: &PhotoAudit)
    -> Result<(), GatewayError>;
}

/// Channel back to the chat that owns a payment.
#[async_trait]
pub trait OwnerNotifier: Send + Sync {
    async fn notify_decision(&self, chat_id: i64, decision: Decision)
    -> Result<(), GatewayError>;
}
