use std::net::SocketAddr;
use std::sync::Arc;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use doctor_cell::services::directory::DoctorDirectoryService;
use shared_config::AppConfig;
use shared_database::StoreClient;
use ticket_cell::{
    AllocatorConfig, DisabledGateway, DispatcherConfig, DoctorDirectory, HttpSequenceStore,
    HttpTicketStore, MessagingGateway, NotificationDispatcher, TicketAllocator, TicketQueueState,
    TicketService, TicketStore, WhatsAppGateway,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic visit-queue API server");

    // Load configuration
    let config = Arc::new(AppConfig::from_env());

    // Wire the queue core: store-backed sequence/ticket persistence, the
    // doctor directory, the messaging gateway, and the background dispatcher.
    let store = Arc::new(StoreClient::new(&config));
    let sequence = Arc::new(HttpSequenceStore::new(Arc::clone(&store)));
    let tickets: Arc<dyn TicketStore> = Arc::new(HttpTicketStore::new(store));
    let directory: Arc<dyn DoctorDirectory> = Arc::new(DoctorDirectoryService::new(&config));

    let gateway: Arc<dyn MessagingGateway> = match WhatsAppGateway::new(&config) {
        Ok(gateway) => Arc::new(gateway),
        Err(_) => {
            warn!("Messaging gateway not configured; confirmations will be recorded as failed");
            Arc::new(DisabledGateway)
        }
    };

    let dispatcher = Arc::new(NotificationDispatcher::start(
        gateway,
        Arc::clone(&tickets),
        DispatcherConfig::default(),
    ));

    let allocator = TicketAllocator::new(
        directory,
        sequence,
        Arc::clone(&tickets),
        config.clinic_utc_offset_minutes as i64,
        AllocatorConfig::default(),
    );
    let service = TicketService::new(allocator, tickets, dispatcher, &config);

    let ticket_state = Arc::new(TicketQueueState {
        service,
        config: Arc::clone(&config),
    });

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(config, ticket_state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
