//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::StoreError;
use crate::infrastructure::entities;
use crate::infrastructure::entities::PaymentStatus;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn create_proposal(
        &self,
        proposal: entities::Proposal,
    ) -> Result<entities::Proposal, StoreError>;

    async fn find_proposal(&self, id: Uuid) -> Result<Option<entities::Proposal>, StoreError>;
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn create_payment(&self, payment: entities::Payment)
    -> Result<entities::Payment, StoreError>;

    async fn find_payment(&self, id: Uuid) -> Result<Option<entities::Payment>, StoreError>;

    /// Most recent payment of the chat with the given status.
    async fn find_latest_with_status(
        &self,
        chat_id: i64,
        status: PaymentStatus,
    ) -> Result<Option<entities::Payment>, StoreError>;

    /// Writes `next` only if the row still has status `expected`.
    ///
    /// Returns `Ok(None)` when no row matched, either because the id is unknown
    /// or because the status already moved on.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Option<entities::Payment>, StoreError>;
}
