//! Conversation engine.
//!
//! Maps an inbound chat event and the chat's current [`Session`] to a state
//! change, at most one store mutation and at most one reply. Whether a photo is
//! a payment screenshot or a proposal picture is decided by the session state
//! alone.

use crate::core::error::ServiceError;
use crate::core::gateway::{NotificationGateway, bounded};
use crate::core::links::{Draft, LinkIssuer, parse_hours};
use crate::core::session::{Session, SessionState, SessionTable};
use crate::core::traits::{PaymentService, PhotoAudit, PhotoStore};
use crate::infrastructure::entities::display_label;
use di::Ref;
use log::{debug, error, warn};
use std::sync::Arc;

/// Who sent an event.
#[derive(Debug, Clone, PartialEq)]
pub struct Requester {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl Requester {
    pub fn label(&self) -> String {
        display_label(self.username.as_deref(), self.first_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Pay,
    Create,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Command(Command),
    Text(String),
    /// File ids of one photo, ordered from lowest to highest resolution.
    Photo(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Welcome,
    Help,
    PaymentInstructions,
    AlreadyApproved,
    PaymentPending,
    PaymentRequired,
    SendScreenshot,
    ScreenshotReceived,
    ScreenshotFailed,
    AskName,
    NameRequired,
    AskPhoto { name: String },
    PhotoOrSkip,
    PhotoFailed,
    AskExpiry { photo_saved: bool },
    InvalidExpiry,
    ProposalReady {
        name: String,
        has_photo: bool,
        hours: f64,
        link: String,
    },
    TryAgainLater,
}

impl Reply {
    /// Step prompts ask the client to open a reply box.
    pub fn forces_reply(&self) -> bool {
        matches!(
            self,
            Reply::AskName | Reply::AskPhoto { .. } | Reply::AskExpiry { .. }
        )
    }
}

pub struct ConversationEngine {
    sessions: SessionTable,
    payments: Ref<dyn PaymentService>,
    issuer: LinkIssuer,
    gateway: Arc<NotificationGateway>,
    photos: Arc<dyn PhotoStore>,
}

impl ConversationEngine {
    pub fn new(
        payments: Ref<dyn PaymentService>,
        issuer: LinkIssuer,
        gateway: Arc<NotificationGateway>,
        photos: Arc<dyn PhotoStore>,
    ) -> Self {
        Self {
            sessions: SessionTable::new(),
            payments,
            issuer,
            gateway,
            photos,
        }
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Handles one event. Failures never escape: they become a corrective or
    /// retry-later reply and leave the session where it was.
    pub async fn handle(&self, from: &Requester, event: Inbound) -> Option<Reply> {
        let mut session = self.sessions.lock(from.chat_id).await;
        debug!("chat {} in {:?} got {:?}", from.chat_id, session.state, event);

        let reply = match event {
            Inbound::Command(command) => {
                Some(self.on_command(from, &mut session, command).await)
            }
            Inbound::Text(text) => self.on_text(from, &mut session, &text).await,
            Inbound::Photo(file_ids) => self.on_photo(from, &mut session, &file_ids).await,
        };

        drop(session);
        self.sessions.evict_idle(from.chat_id);
        reply
    }

    async fn on_command(
        &self,
        from: &Requester,
        session: &mut Session,
        command: Command,
    ) -> Reply {
        match command {
            Command::Start => Reply::Welcome,
            Command::Help => Reply::Help,
            Command::Pay => match self.payment_standing(from.chat_id).await {
                Ok(Standing::Approved(_)) => Reply::AlreadyApproved,
                Ok(Standing::Pending) => Reply::PaymentPending,
                Ok(Standing::Unpaid) => {
                    session.restart(SessionState::AwaitingPayment);
                    Reply::PaymentInstructions
                }
                Err(e) => {
                    error!("payment lookup for chat {} failed: {e}", from.chat_id);
                    Reply::TryAgainLater
                }
            },
            Command::Create => match self.payment_standing(from.chat_id).await {
                Ok(Standing::Approved(payment_id)) => {
                    session.restart(SessionState::AwaitingName);
                    session.bound_payment = Some(payment_id);
                    Reply::AskName
                }
                Ok(Standing::Pending) => Reply::PaymentPending,
                Ok(Standing::Unpaid) => Reply::PaymentRequired,
                Err(e) => {
                    error!("payment lookup for chat {} failed: {e}", from.chat_id);
                    Reply::TryAgainLater
                }
            },
        }
    }

    async fn on_text(&self, from: &Requester, session: &mut Session, text: &str) -> Option<Reply> {
        match session.state {
            SessionState::Idle => None,
            SessionState::AwaitingPayment => Some(Reply::SendScreenshot),
            SessionState::AwaitingName => {
                let name = text.trim();
                if name.is_empty() {
                    return Some(Reply::NameRequired);
                }
                session.draft_name = Some(name.to_owned());
                session.state = SessionState::AwaitingPhoto;
                Some(Reply::AskPhoto {
                    name: name.to_owned(),
                })
            }
            SessionState::AwaitingPhoto => {
                if text.trim().eq_ignore_ascii_case("skip") {
                    session.draft_photo_url = None;
                    session.state = SessionState::AwaitingExpiry;
                    Some(Reply::AskExpiry { photo_saved: false })
                } else {
                    Some(Reply::PhotoOrSkip)
                }
            }
            SessionState::AwaitingExpiry => match parse_hours(text) {
                Some(hours) => Some(self.issue(from, session, hours).await),
                None => Some(Reply::InvalidExpiry),
            },
        }
    }

    async fn on_photo(
        &self,
        from: &Requester,
        session: &mut Session,
        file_ids: &[String],
    ) -> Option<Reply> {
        let file_id = file_ids.last()?;

        match session.state {
            SessionState::Idle => None,
            SessionState::AwaitingPayment => {
                Some(self.submit_screenshot(from, session, file_id).await)
            }
            SessionState::AwaitingPhoto => {
                let photo = match bounded(self.photos.persist(file_id)).await {
                    Ok(photo) => photo,
                    Err(e) => {
                        error!("proposal photo from chat {} not stored: {e}", from.chat_id);
                        return Some(Reply::PhotoFailed);
                    }
                };

                let audit = PhotoAudit {
                    recipient_name: session.draft_name.clone().unwrap_or_default(),
                    requester: from.label(),
                };
                let gateway = self.gateway.clone();
                let audited = photo.clone();
                tokio::spawn(async move { gateway.audit_photo(&audited, &audit).await });

                session.draft_photo_url = Some(photo.url);
                session.state = SessionState::AwaitingExpiry;
                Some(Reply::AskExpiry { photo_saved: true })
            }
            SessionState::AwaitingName => Some(Reply::NameRequired),
            SessionState::AwaitingExpiry => Some(Reply::InvalidExpiry),
        }
    }

    async fn submit_screenshot(
        &self,
        from: &Requester,
        session: &mut Session,
        file_id: &str,
    ) -> Reply {
        let screenshot = match bounded(self.photos.fetch(file_id)).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(
                    "payment screenshot from chat {} not downloaded: {e}",
                    from.chat_id
                );
                return Reply::ScreenshotFailed;
            }
        };

        let payment = match self.payments.open_request(from).await {
            Ok(payment) => payment,
            Err(e) => {
                error!("payment for chat {} not recorded: {e}", from.chat_id);
                return Reply::TryAgainLater;
            }
        };

        // an unseen request must not hold the chat in pending; the session keeps
        // waiting for a screenshot
        if let Err(e) = self.gateway.request_approval(&payment, screenshot).await {
            error!("payment {} not forwarded to approver: {e}", payment.id);
            if let Err(e) = self.payments.reject(payment.id).await {
                error!("unforwarded payment {} left pending: {e}", payment.id);
            }
            return Reply::ScreenshotFailed;
        }

        session.reset();
        Reply::ScreenshotReceived
    }

    async fn issue(&self, from: &Requester, session: &mut Session, hours: f64) -> Reply {
        let Some(name) = session.draft_name.clone() else {
            warn!("chat {} reached expiry without a name", from.chat_id);
            session.state = SessionState::AwaitingName;
            return Reply::AskName;
        };

        let draft = Draft {
            chat_id: from.chat_id,
            name,
            photo_url: session.draft_photo_url.clone(),
            hours,
            payment_id: session.bound_payment,
        };

        match self.issuer.issue(draft).await {
            Ok(issued) => {
                session.reset();
                Reply::ProposalReady {
                    name: issued.proposal.name,
                    has_photo: issued.proposal.photo_url.is_some(),
                    hours,
                    link: issued.url,
                }
            }
            Err(ServiceError::PaymentNotApproved) => {
                warn!("chat {} lost its approved payment mid-flow", from.chat_id);
                session.reset();
                Reply::PaymentRequired
            }
            Err(e) => {
                error!("proposal for chat {} not issued: {e}", from.chat_id);
                Reply::TryAgainLater
            }
        }
    }

    async fn payment_standing(&self, chat_id: i64) -> Result<Standing, ServiceError> {
        if let Some(approved) = self.payments.approved_payment(chat_id).await? {
            return Ok(Standing::Approved(approved.id));
        }
        if self.payments.pending_payment(chat_id).await?.is_some() {
            return Ok(Standing::Pending);
        }
        Ok(Standing::Unpaid)
    }
}

enum Standing {
    Approved(uuid::Uuid),
    Pending,
    Unpaid,
}
