pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
pub use handlers::TicketQueueState;
pub use router::ticket_routes;
