use offer_core::{OfferPipeline, OfferSettings};
use std::sync::Arc;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<OfferPipeline>,
}

impl AppState {
    pub fn new(pipeline: OfferPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn settings(&self) -> &OfferSettings {
        self.pipeline.settings()
    }

    /// Requested profile or the configured default
    pub fn profile_or_default(&self, requested: Option<&str>) -> String {
        match requested {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => self.settings().server.default_profile.clone(),
        }
    }
}
