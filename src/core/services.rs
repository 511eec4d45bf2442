//! Implementations for the service the app needs.
//!

use crate::core::engine::Requester;
use crate::core::error::ServiceError;
use crate::core::traits::{PaymentService, ProposalService, Transition};
use crate::infrastructure::entities::{Payment, PaymentStatus, Proposal};
use crate::infrastructure::traits::{PaymentRepository, ProposalRepository};
use async_trait::async_trait;
use chrono::{Duration, SubsecRound, Utc};
use di::{Ref, injectable};
use log::info;
use uuid::Uuid;

#[injectable(ProposalService)]
pub struct MyProposalService {
    repo: Ref<dyn ProposalRepository>,
}

impl MyProposalService {
    pub fn new(repo: Ref<dyn ProposalRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ProposalService for MyProposalService {
    async fn create_proposal(
        &self,
        chat_id: i64,
        name: String,
        photo_url: Option<String>,
        lifetime: Option<Duration>,
    ) -> Result<Proposal, ServiceError> {
        // millisecond precision, matching what the lookup API exposes
        let created_at = Utc::now().trunc_subsecs(3);
        let expires_at = match lifetime {
            Some(lifetime) => Some(
                created_at
                    .checked_add_signed(lifetime)
                    .ok_or(ServiceError::InvalidLifetime(lifetime.num_hours() as f64))?,
            ),
            None => None,
        };

        let proposal = self
            .repo
            .create_proposal(Proposal {
                id: Uuid::new_v4(),
                name,
                photo_url,
                expires_at,
                created_at,
                chat_id,
            })
            .await?;

        info!("created proposal {} for chat {}", proposal.id, chat_id);
        Ok(proposal)
    }

    async fn find_proposal(&self, id: Uuid) -> Result<Option<Proposal>, ServiceError> {
        Ok(self.repo.find_proposal(id).await?)
    }
}

#[injectable(PaymentService)]
pub struct MyPaymentService {
    repo: Ref<dyn PaymentRepository>,
}

impl MyPaymentService {
    pub fn new(repo: Ref<dyn PaymentRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl PaymentService for MyPaymentService {
    async fn open_request(&self, requester: &Requester) -> Result<Payment, ServiceError> {
        let payment = self
            .repo
            .create_payment(Payment {
                id: Uuid::new_v4(),
                chat_id: requester.chat_id,
                user_id: requester.user_id,
                username: requester.username.clone(),
                first_name: requester.first_name.clone(),
                status: PaymentStatus::Pending,
                created_at: Utc::now(),
            })
            .await?;

        info!(
            "opened payment {} for chat {}",
            payment.id, requester.chat_id
        );
        Ok(payment)
    }

    async fn find_payment(&self, id: Uuid) -> Result<Option<Payment>, ServiceError> {
        Ok(self.repo.find_payment(id).await?)
    }

    async fn approved_payment(&self, chat_id: i64) -> Result<Option<Payment>, ServiceError> {
        Ok(self
            .repo
            .find_latest_with_status(chat_id, PaymentStatus::Approved)
            .await?)
    }

    async fn pending_payment(&self, chat_id: i64) -> Result<Option<Payment>, ServiceError> {
        Ok(self
            .repo
            .find_latest_with_status(chat_id, PaymentStatus::Pending)
            .await?)
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<Transition, ServiceError> {
        if !expected.can_transition_to(next) {
            return Err(ServiceError::IllegalTransition {
                from: expected,
                to: next,
            });
        }

        if let Some(payment) = self
            .repo
            .compare_and_set_status(id, expected, next)
            .await?
        {
            info!("payment {id}: {expected} -> {next}");
            return Ok(Transition::Applied(payment));
        }

        match self.repo.find_payment(id).await? {
            Some(current) => Ok(Transition::AlreadyResolved(current.status)),
            None => Err(ServiceError::NotFound),
        }
    }
}
