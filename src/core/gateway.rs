//! Relay between the conversation engine and the human approver.
//!
//! Screenshots and audit photos go out to the approver; approve/reject
//! decisions come back, are applied to the payment with a compare-and-set and
//! are reported to the chat that owns the payment.

use crate::core::error::{GatewayError, ServiceError};
use crate::core::traits::{
    ApproverGateway, OwnerNotifier, PaymentService, PhotoAudit, StoredPhoto, Transition,
};
use crate::infrastructure::StoreError;
use crate::infrastructure::entities::{Payment, PaymentStatus};
use di::Ref;
use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Upper bound for any single outbound call to a collaborator.
pub const NOTIFY_TIMEOUT: Duration = Duration::from_secs(20);

const APPROVE_PREFIX: &str = "approve_";
const REJECT_PREFIX: &str = "reject_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// An approver's button press, carried in inline-button callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalAction {
    pub decision: Decision,
    pub payment_id: Uuid,
}

impl ApprovalAction {
    pub fn parse(data: &str) -> Option<ApprovalAction> {
        let (decision, id) = if let Some(id) = data.strip_prefix(APPROVE_PREFIX) {
            (Decision::Approve, id)
        } else if let Some(id) = data.strip_prefix(REJECT_PREFIX) {
            (Decision::Reject, id)
        } else {
            return None;
        };

        Some(ApprovalAction {
            decision,
            payment_id: Uuid::parse_str(id).ok()?,
        })
    }

    pub fn callback_data(&self) -> String {
        match self.decision {
            Decision::Approve => format!("{APPROVE_PREFIX}{}", self.payment_id),
            Decision::Reject => format!("{REJECT_PREFIX}{}", self.payment_id),
        }
    }
}

#[derive(Debug)]
pub enum DecisionOutcome {
    Applied(Payment),
    AlreadyResolved(PaymentStatus),
    NotFound,
    /// The chat already holds an unused approved payment.
    Superseded,
}

/// Runs `future` under [`NOTIFY_TIMEOUT`].
pub async fn bounded<T, F>(future: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    tokio::time::timeout(NOTIFY_TIMEOUT, future)
        .await
        .map_err(|_| GatewayError::Timeout)?
}

pub struct NotificationGateway {
    payments: Ref<dyn PaymentService>,
    approver: Arc<dyn ApproverGateway>,
    owners: Arc<dyn OwnerNotifier>,
}

impl NotificationGateway {
    pub fn new(
        payments: Ref<dyn PaymentService>,
        approver: Arc<dyn ApproverGateway>,
        owners: Arc<dyn OwnerNotifier>,
    ) -> Self {
        Self {
            payments,
            approver,
            owners,
        }
    }

    pub async fn request_approval(
        &self,
        payment: &Payment,
        screenshot: Vec<u8>,
    ) -> Result<(), GatewayError> {
        bounded(self.approver.request_approval(payment, screenshot)).await
    }

    /// Fire-and-forget copy of a proposal photo to the approver.
    pub async fn audit_photo(&self, photo: &StoredPhoto, audit: &PhotoAudit) {
        if let Err(e) = bounded(self.approver.audit_photo(photo, audit)).await {
            warn!("photo audit for {} not delivered: {e}", audit.recipient_name);
        }
    }

    /// Applies an approver decision.
    ///
    /// Only a payment still `pending` is changed, and only then is the owner
    /// notified, so repeated presses are answered without side effects.
    pub async fn resolve(&self, action: ApprovalAction) -> Result<DecisionOutcome, ServiceError> {
        let transition = match action.decision {
            Decision::Approve => self.payments.approve(action.payment_id).await,
            Decision::Reject => self.payments.reject(action.payment_id).await,
        };

        let payment = match transition {
            Ok(Transition::Applied(payment)) => payment,
            Ok(Transition::AlreadyResolved(status)) => {
                info!("payment {} already {status}", action.payment_id);
                return Ok(DecisionOutcome::AlreadyResolved(status));
            }
            Err(ServiceError::NotFound) => return Ok(DecisionOutcome::NotFound),
            Err(ServiceError::Store(StoreError::Conflict(_))) => {
                warn!(
                    "payment {} not approved, chat already holds an approved payment",
                    action.payment_id
                );
                return Ok(DecisionOutcome::Superseded);
            }
            Err(e) => return Err(e),
        };

        // the decision stands even if the owner cannot be told
        if let Err(e) = bounded(
            self.owners
                .notify_decision(payment.chat_id, action.decision),
        )
        .await
        {
            error!("failed to notify chat {}: {e}", payment.chat_id);
        }

        Ok(DecisionOutcome::Applied(payment))
    }
}
