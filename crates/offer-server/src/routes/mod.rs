pub mod health;
pub mod offers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let web_dir = state.settings().web_dir.clone();

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/offer-preview/:candidate", get(offers::offer_preview))
        .route("/api/offer-pdf/:candidate", get(offers::offer_pdf))
        .route("/api/submit-signature", post(offers::submit_signature))
        .route("/api/signed-pdf/:candidate", get(offers::signed_pdf))
        .route("/api/generate", post(offers::generate))
        .route("/api/generate-docx", post(offers::generate_docx))
        // signature page and its assets
        .fallback_service(ServeDir::new(web_dir))
        .with_state(state)
}
