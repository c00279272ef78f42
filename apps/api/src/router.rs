use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;
use ticket_cell::{router::ticket_routes, TicketQueueState};

pub fn create_router(config: Arc<AppConfig>, ticket_state: Arc<TicketQueueState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic visit-queue API is running!" }))
        .nest("/doctors", doctor_routes(config))
        .nest("/queues", ticket_routes(ticket_state))
}
