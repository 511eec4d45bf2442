//! DB Repository abstractions

use crate::infrastructure::StoreError;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{Payment, PaymentStatus, Proposal};
use crate::infrastructure::traits::{PaymentRepository, ProposalRepository};
use async_trait::async_trait;
use di::{Ref, injectable};
use uuid::Uuid;

#[injectable(ProposalRepository)]
pub struct DbProposalRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbProposalRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl ProposalRepository for DbProposalRepository {
    async fn create_proposal(&self, proposal: Proposal) -> Result<Proposal, StoreError> {
        sqlx::query_as(
            "INSERT INTO proposals (id, name, photo_url, expires_at, created_at, chat_id) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(proposal.id)
        .bind(proposal.name)
        .bind(proposal.photo_url)
        .bind(proposal.expires_at)
        .bind(proposal.created_at)
        .bind(proposal.chat_id)
        .fetch_one(&**self.connection)
        .await
        .map_err(StoreError::from_write)
    }

    async fn find_proposal(&self, id: Uuid) -> Result<Option<Proposal>, StoreError> {
        Ok(sqlx::query_as("SELECT * FROM proposals WHERE id = ?")
            .bind(id)
            .fetch_optional(&**self.connection)
            .await?)
    }
}

#[injectable(PaymentRepository)]
pub struct DbPaymentRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbPaymentRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl PaymentRepository for DbPaymentRepository {
    async fn create_payment(&self, payment: Payment) -> Result<Payment, StoreError> {
        sqlx::query_as(
            "INSERT INTO payments (id, chat_id, user_id, username, first_name, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(payment.id)
        .bind(payment.chat_id)
        .bind(payment.user_id)
        .bind(payment.username)
        .bind(payment.first_name)
        .bind(payment.status)
        .bind(payment.created_at)
        .fetch_one(&**self.connection)
        .await
        .map_err(StoreError::from_write)
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>, StoreError> {
        Ok(sqlx::query_as("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&**self.connection)
            .await?)
    }

    async fn find_latest_with_status(
        &self,
        chat_id: i64,
        status: PaymentStatus,
    ) -> Result<Option<Payment>, StoreError> {
        Ok(sqlx::query_as(
            "SELECT * FROM payments WHERE chat_id = ? AND status = ? ORDER BY datetime(created_at) DESC LIMIT 1",
        )
        .bind(chat_id)
        .bind(status)
        .fetch_optional(&**self.connection)
        .await?)
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Option<Payment>, StoreError> {
        sqlx::query_as("UPDATE payments SET status = ? WHERE id = ? AND status = ? RETURNING *")
            .bind(next)
            .bind(id)
            .bind(expected)
            .fetch_optional(&**self.connection)
            .await
            .map_err(StoreError::from_write)
    }
}
