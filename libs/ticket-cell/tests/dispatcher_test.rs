mod common;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Duration;
use uuid::Uuid;

use common::{fast_dispatcher_config, wait_for_ticket_status, ScriptedGateway};
use ticket_cell::*;

fn issued_ticket() -> Ticket {
    let now = Utc::now();
    Ticket {
        id: Uuid::new_v4(),
        doctor_id: Uuid::new_v4(),
        patient_id: Uuid::new_v4(),
        service_day: now.date_naive(),
        sequence_number: 1,
        estimated_call_time: now + chrono::Duration::minutes(15),
        created_at: now,
        status: TicketStatus::Issued,
    }
}

async fn dispatch_one(
    gateway: Arc<ScriptedGateway>,
) -> (Arc<MemoryStore>, Arc<NotificationDispatcher>, Ticket) {
    let store = Arc::new(MemoryStore::new());
    let ticket = issued_ticket();
    store
        .insert_ticket(&ticket)
        .await
        .expect("insert should succeed");

    let dispatcher = Arc::new(NotificationDispatcher::start(
        gateway,
        store.clone(),
        fast_dispatcher_config(),
    ));

    dispatcher.enqueue(NotificationJob::new(
        ticket.id,
        "+15550001111".to_string(),
        "Your queue number for Dr. Amara Okafor is 1. Estimated call time: 10:15".to_string(),
        3,
    ));

    (store, dispatcher, ticket)
}

#[tokio::test]
async fn test_successful_delivery_marks_notified() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let (store, _dispatcher, ticket) = dispatch_one(gateway.clone()).await;

    assert!(
        wait_for_ticket_status(&store, ticket.id, TicketStatus::Notified, 5).await,
        "ticket should end Notified"
    );
    assert_eq!(gateway.attempts().await, 1);

    let sent = gateway.sent().await;
    assert_eq!(sent[0].to, "+15550001111");
    assert_eq!(sent[0].idempotency_key, ticket.id);
}

#[tokio::test]
async fn test_transient_failures_retried_to_success() {
    let gateway = Arc::new(ScriptedGateway::with_script(vec![
        Err(DeliveryError::Transient("provider busy".to_string())),
        Err(DeliveryError::Transient("provider busy".to_string())),
        Ok(()),
    ]));
    let (store, _dispatcher, ticket) = dispatch_one(gateway.clone()).await;

    assert!(
        wait_for_ticket_status(&store, ticket.id, TicketStatus::Notified, 5).await,
        "third attempt succeeds within max_attempts=3"
    );
    assert_eq!(gateway.attempts().await, 3);
}

#[tokio::test]
async fn test_permanent_failure_marks_failed_without_retry() {
    let gateway = Arc::new(ScriptedGateway::always_permanent());
    let (store, _dispatcher, ticket) = dispatch_one(gateway.clone()).await;

    assert!(
        wait_for_ticket_status(&store, ticket.id, TicketStatus::NotificationFailed, 5).await,
        "ticket should end NotificationFailed"
    );
    assert_eq!(gateway.attempts().await, 1, "permanent failures are not retried");
}

#[tokio::test]
async fn test_transient_exhaustion_marks_failed() {
    let gateway = Arc::new(ScriptedGateway::always_transient());
    let (store, _dispatcher, ticket) = dispatch_one(gateway.clone()).await;

    assert!(
        wait_for_ticket_status(&store, ticket.id, TicketStatus::NotificationFailed, 5).await,
        "ticket should end NotificationFailed after retries exhaust"
    );
    assert_eq!(gateway.attempts().await, 3);
}

struct SlowGateway;

#[async_trait]
impl MessagingGateway for SlowGateway {
    async fn send(&self, _to: &str, _body: &str, _key: Uuid) -> Result<(), DeliveryError> {
        tokio::time::sleep(Duration::from_secs(2)).await;
        Ok(())
    }
}

#[tokio::test]
async fn test_enqueue_never_blocks_on_delivery() {
    let store = Arc::new(MemoryStore::new());
    let ticket = issued_ticket();
    store
        .insert_ticket(&ticket)
        .await
        .expect("insert should succeed");

    let dispatcher = NotificationDispatcher::start(
        Arc::new(SlowGateway),
        store.clone(),
        fast_dispatcher_config(),
    );

    let started = Instant::now();
    dispatcher.enqueue(NotificationJob::new(
        ticket.id,
        "+15550001111".to_string(),
        "queued".to_string(),
        3,
    ));
    assert!(
        started.elapsed() < Duration::from_millis(50),
        "enqueue must return without waiting on the gateway"
    );
}

#[tokio::test]
async fn test_shutdown_joins_workers() {
    let gateway = Arc::new(ScriptedGateway::always_ok());
    let (store, dispatcher, ticket) = dispatch_one(gateway).await;

    assert!(wait_for_ticket_status(&store, ticket.id, TicketStatus::Notified, 5).await);
    dispatcher.shutdown().await;
}
