use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, TicketQueueState};

pub fn ticket_routes(state: Arc<TicketQueueState>) -> Router {
    let protected_routes = Router::new()
        .route("/", post(handlers::request_ticket))
        .route("/{ticket_id}", get(handlers::get_ticket))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ));

    Router::new().merge(protected_routes).with_state(state)
}
