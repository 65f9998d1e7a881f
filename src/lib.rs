pub mod config;
pub mod controllers;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

use axum::{routing::get, Router};
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use services::credentials::CredentialStore;
use services::ledger::PaymentLedger;
use services::lifecycle::BookingLifecycle;
use services::pricing::Pricing;
use store::Repository;

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Repository>,
    pub config: config::Config,
    pub credentials: Arc<dyn CredentialStore>,
    pub pricing: Pricing,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Repository>,
        config: config::Config,
        credentials: Arc<dyn CredentialStore>,
    ) -> Arc<Self> {
        let pricing = Pricing::new(config.pricing.hourly_rate);
        Arc::new(Self {
            store,
            config,
            credentials,
            pricing,
        })
    }

    /// The venue's timezone.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.config.pricing.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
    }

    pub fn lifecycle(&self) -> BookingLifecycle {
        BookingLifecycle::new(self.store.clone(), self.pricing, self.offset())
    }

    pub fn ledger(&self) -> PaymentLedger {
        PaymentLedger::new(self.store.clone(), self.pricing)
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Gedung Serbaguna API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes(state.clone()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
