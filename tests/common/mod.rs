//! Shared fixtures: an in-memory database and recording fakes of the
//! Telegram-facing collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use di::Ref;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use valentine_proposal_bot::core::engine::{ConversationEngine, Requester};
use valentine_proposal_bot::core::error::GatewayError;
use valentine_proposal_bot::core::gateway::{Decision, NotificationGateway};
use valentine_proposal_bot::core::links::LinkIssuer;
use valentine_proposal_bot::core::services::{MyPaymentService, MyProposalService};
use valentine_proposal_bot::core::traits::{
    ApproverGateway, OwnerNotifier, PaymentService, PhotoAudit, PhotoStore, ProposalService,
    StoredPhoto,
};
use valentine_proposal_bot::infrastructure::database::DatabaseConnection;
use valentine_proposal_bot::infrastructure::entities::Payment;
use valentine_proposal_bot::infrastructure::repositories::{
    DbPaymentRepository, DbProposalRepository,
};

pub const FRONTEND_URL: &str = "https://valentine.example";

pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

#[derive(Default)]
pub struct FakePhotoStore {
    pub fail: AtomicBool,
    pub fetched: Mutex<Vec<String>>,
    pub persisted: Mutex<Vec<String>>,
}

#[async_trait]
impl PhotoStore for FakePhotoStore {
    async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Telegram("download failed".into()));
        }
        self.fetched.lock().unwrap().push(file_id.to_owned());
        Ok(file_id.as_bytes().to_vec())
    }

    async fn persist(&self, file_id: &str) -> Result<StoredPhoto, GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Telegram("download failed".into()));
        }
        self.persisted.lock().unwrap().push(file_id.to_owned());
        Ok(StoredPhoto {
            url: format!("http://localhost:3000/uploads/{file_id}.jpg"),
            path: PathBuf::from(format!("uploads/{file_id}.jpg")),
        })
    }
}

#[derive(Default)]
pub struct FakeApprover {
    pub unavailable: AtomicBool,
    /// Audits never complete while set.
    pub stall_audits: AtomicBool,
    pub approval_requests: Mutex<Vec<(Payment, Vec<u8>)>>,
    pub audits: Mutex<Vec<PhotoAudit>>,
}

#[async_trait]
impl ApproverGateway for FakeApprover {
    async fn request_approval(
        &self,
        payment: &Payment,
        screenshot: Vec<u8>,
    ) -> Result<(), GatewayError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::ApproverUnavailable);
        }
        self.approval_requests
            .lock()
            .unwrap()
            .push((payment.clone(), screenshot));
        Ok(())
    }

    async fn audit_photo(
        &self,
        _photo: &StoredPhoto,
        audit: &PhotoAudit,
    ) -> Result<(), GatewayError> {
        if self.stall_audits.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::ApproverUnavailable);
        }
        self.audits.lock().unwrap().push(audit.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub fail: AtomicBool,
    pub notices: Mutex<Vec<(i64, Decision)>>,
}

#[async_trait]
impl OwnerNotifier for FakeNotifier {
    async fn notify_decision(&self, chat_id: i64, decision: Decision) -> Result<(), GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::Telegram("blocked by user".into()));
        }
        self.notices.lock().unwrap().push((chat_id, decision));
        Ok(())
    }
}

/// The whole workflow wired over an in-memory database and fakes.
pub struct Harness {
    pub pool: SqlitePool,
    pub payments: Ref<dyn PaymentService>,
    pub proposals: Ref<dyn ProposalService>,
    pub photos: Arc<FakePhotoStore>,
    pub approver: Arc<FakeApprover>,
    pub notifier: Arc<FakeNotifier>,
    pub gateway: Arc<NotificationGateway>,
    pub engine: ConversationEngine,
}

impl Harness {
    pub async fn new() -> Harness {
        let pool = setup_test_db().await;
        let connection = Ref::new(DatabaseConnection::from_pool(pool.clone()));

        let payments: Ref<dyn PaymentService> = Ref::new(MyPaymentService::new(Ref::new(
            DbPaymentRepository::new(connection.clone()),
        )));
        let proposals: Ref<dyn ProposalService> = Ref::new(MyProposalService::new(Ref::new(
            DbProposalRepository::new(connection),
        )));

        let photos = Arc::new(FakePhotoStore::default());
        let approver = Arc::new(FakeApprover::default());
        let notifier = Arc::new(FakeNotifier::default());

        let gateway = Arc::new(NotificationGateway::new(
            payments.clone(),
            approver.clone(),
            notifier.clone(),
        ));
        let engine = engine(&payments, &proposals, &gateway, &photos);

        Harness {
            pool,
            payments,
            proposals,
            photos,
            approver,
            notifier,
            gateway,
            engine,
        }
    }

    /// A fresh engine over the same database, as after a process restart.
    pub fn restart(&mut self) {
        self.engine = engine(&self.payments, &self.proposals, &self.gateway, &self.photos);
    }

    /// Audits run in the background; waits until `count` were delivered.
    pub async fn wait_for_audits(&self, count: usize) -> Vec<PhotoAudit> {
        for _ in 0..100 {
            let audits = self.approver.audits.lock().unwrap().clone();
            if audits.len() >= count {
                return audits;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} photo audits");
    }

    pub fn approval_requests(&self) -> Vec<Payment> {
        self.approver
            .approval_requests
            .lock()
            .unwrap()
            .iter()
            .map(|(payment, _)| payment.clone())
            .collect()
    }
}

fn engine(
    payments: &Ref<dyn PaymentService>,
    proposals: &Ref<dyn ProposalService>,
    gateway: &Arc<NotificationGateway>,
    photos: &Arc<FakePhotoStore>,
) -> ConversationEngine {
    ConversationEngine::new(
        payments.clone(),
        LinkIssuer::new(proposals.clone(), payments.clone(), FRONTEND_URL),
        gateway.clone(),
        photos.clone(),
    )
}

pub fn requester(chat_id: i64) -> Requester {
    Requester {
        chat_id,
        user_id: chat_id * 10,
        username: Some(format!("user{chat_id}")),
        first_name: Some("Romeo".into()),
    }
}

/// Photo event with low and high resolution variants.
pub fn photo(name: &str) -> Vec<String> {
    vec![format!("{name}-small"), format!("{name}-large")]
}
