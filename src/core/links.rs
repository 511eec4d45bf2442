//! Turns a finished draft into a stored proposal and a shareable link.

use crate::core::error::ServiceError;
use crate::core::traits::{PaymentService, ProposalService, Transition};
use crate::infrastructure::entities::{PaymentStatus, Proposal};
use chrono::Duration;
use di::Ref;
use log::{error, warn};
use uuid::Uuid;

/// Everything collected by the conversation before issuance.
#[derive(Debug, Clone)]
pub struct Draft {
    pub chat_id: i64,
    pub name: String,
    pub photo_url: Option<String>,
    pub hours: f64,
    pub payment_id: Option<Uuid>,
}

#[derive(Debug)]
pub struct IssuedLink {
    pub proposal: Proposal,
    pub url: String,
}

/// Roughly a century.
const MAX_HOURS: f64 = 1_000_000.0;

/// Parses a user supplied link lifetime in hours.
pub fn parse_hours(text: &str) -> Option<f64> {
    let hours: f64 = text.trim().parse().ok()?;
    (hours.is_finite() && (0.0..=MAX_HOURS).contains(&hours)).then_some(hours)
}

/// Zero hours means the link never expires.
fn lifetime(hours: f64) -> Result<Option<Duration>, ServiceError> {
    if hours == 0.0 {
        return Ok(None);
    }
    if !(hours.is_finite() && (0.0..=MAX_HOURS).contains(&hours)) {
        return Err(ServiceError::InvalidLifetime(hours));
    }
    let millis = (hours * 3_600_000.0).round() as i64;
    Duration::try_milliseconds(millis)
        .map(Some)
        .ok_or(ServiceError::InvalidLifetime(hours))
}

pub struct LinkIssuer {
    proposals: Ref<dyn ProposalService>,
    payments: Ref<dyn PaymentService>,
    frontend_url: String,
}

impl LinkIssuer {
    pub fn new(
        proposals: Ref<dyn ProposalService>,
        payments: Ref<dyn PaymentService>,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            proposals,
            payments,
            frontend_url: frontend_url.into(),
        }
    }

    pub fn link_for(&self, id: Uuid) -> String {
        format!("{}/?id={}", self.frontend_url.trim_end_matches('/'), id)
    }

    /// Stores the proposal, then consumes the bound payment.
    ///
    /// The payment is marked used only after the proposal row exists, so a
    /// failure in between leaves it approved and the user can try again.
    pub async fn issue(&self, draft: Draft) -> Result<IssuedLink, ServiceError> {
        if let Some(payment_id) = draft.payment_id {
            let payment = self.payments.find_payment(payment_id).await?;
            if payment.map(|p| p.status) != Some(PaymentStatus::Approved) {
                return Err(ServiceError::PaymentNotApproved);
            }
        }

        let lifetime = lifetime(draft.hours)?;
        let proposal = self
            .proposals
            .create_proposal(draft.chat_id, draft.name, draft.photo_url, lifetime)
            .await?;

        if let Some(payment_id) = draft.payment_id {
            match self.payments.mark_used(payment_id).await {
                Ok(Transition::Applied(_)) => {}
                Ok(Transition::AlreadyResolved(status)) => {
                    warn!(
                        "payment {payment_id} was {status} when proposal {} was issued",
                        proposal.id
                    );
                }
                Err(e) => error!("failed to consume payment {payment_id}: {e}"),
            }
        }

        let url = self.link_for(proposal.id);
        Ok(IssuedLink { proposal, url })
    }
}
