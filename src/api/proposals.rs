//! Proposal lookup endpoint

use crate::api::proposals::schemas::{NotFound, ProposalView};
use crate::core::traits::ProposalService;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;
use log::error;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new().route("/:id", get(get_proposal))
}

/// Returns the public fields of a proposal. Expired proposals are still
/// returned; the page decides what an elapsed expiry means.
async fn get_proposal(
    Inject(proposal_service): Inject<dyn ProposalService>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found();
    };

    match proposal_service.find_proposal(id).await {
        Ok(Some(proposal)) => (StatusCode::OK, Json(ProposalView::from(proposal))).into_response(),
        Ok(None) => not_found(),
        Err(e) => {
            error!("proposal lookup {id} failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(NotFound::default())).into_response()
}

pub mod schemas {
    use crate::infrastructure::entities;
    use serde::Serialize;

    /// What the presentation page may see. Owner and internal ids stay out.
    #[derive(Serialize, Debug)]
    pub struct ProposalView {
        pub name: String,
        pub photo: Option<String>,
        /// Milliseconds since the Unix epoch, `null` when the link never expires.
        pub expiry: Option<i64>,
    }

    impl From<entities::Proposal> for ProposalView {
        fn from(proposal: entities::Proposal) -> Self {
            ProposalView {
                name: proposal.name,
                photo: proposal.photo_url,
                expiry: proposal.expires_at.map(|at| at.timestamp_millis()),
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct NotFound {
        pub error: &'static str,
    }

    impl Default for NotFound {
        fn default() -> Self {
            NotFound { error: "Not found" }
        }
    }
}
