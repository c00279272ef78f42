use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use shared_database::StoreClient;

use crate::error::TicketError;
use crate::models::{Ticket, TicketStatus};

/// The durable counter behind ticket numbering.
///
/// `next_number` is the single serialization point per (doctor, service day):
/// two concurrent calls for the same key return two different, consecutive
/// integers, and different keys never contend. `request_id` makes the call
/// idempotent — a network-level retry of the same logical request gets the
/// number already issued to it, not a second increment.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    async fn next_number(
        &self,
        doctor_id: Uuid,
        service_day: NaiveDate,
        request_id: Uuid,
    ) -> Result<u32, TicketError>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Idempotent on the ticket id: re-inserting the same committed ticket
    /// after a crash-retry is a no-op, not a duplicate row.
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), TicketError>;

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, TicketError>;

    async fn update_status(&self, ticket_id: Uuid, status: TicketStatus) -> Result<(), TicketError>;

    async fn update_estimated_call_time(
        &self,
        ticket_id: Uuid,
        estimated_call_time: DateTime<Utc>,
    ) -> Result<(), TicketError>;
}

/// Sequence store backed by the PostgREST store. The increment lives in the
/// `next_ticket_number` database function so the conditional update and the
/// request-id memo execute in one transaction — application code never does a
/// read-then-write pair on the counter.
pub struct HttpSequenceStore {
    store: Arc<StoreClient>,
}

impl HttpSequenceStore {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SequenceStore for HttpSequenceStore {
    async fn next_number(
        &self,
        doctor_id: Uuid,
        service_day: NaiveDate,
        request_id: Uuid,
    ) -> Result<u32, TicketError> {
        let number: u32 = self
            .store
            .rpc(
                "next_ticket_number",
                json!({
                    "p_doctor_id": doctor_id,
                    "p_service_day": service_day,
                    "p_request_id": request_id,
                }),
            )
            .await
            .map_err(|e| TicketError::StoreUnavailable(e.to_string()))?;

        debug!(
            "Reserved number {} for doctor {} on {}",
            number, doctor_id, service_day
        );
        Ok(number)
    }
}

pub struct HttpTicketStore {
    store: Arc<StoreClient>,
}

impl HttpTicketStore {
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }

    fn write_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("return=representation,resolution=merge-duplicates"),
        );
        headers
    }
}

#[async_trait]
impl TicketStore for HttpTicketStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), TicketError> {
        let body = serde_json::to_value(ticket)
            .map_err(|e| TicketError::StoreUnavailable(e.to_string()))?;

        let _: Vec<Value> = self
            .store
            .request_with_headers(
                Method::POST,
                "/rest/v1/tickets",
                Some(body),
                Some(Self::write_headers()),
            )
            .await
            .map_err(|e| TicketError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, TicketError> {
        let path = format!("/rest/v1/tickets?id=eq.{}", ticket_id);
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| TicketError::StoreUnavailable(e.to_string()))?;

        match rows.into_iter().next() {
            Some(row) => {
                let ticket = serde_json::from_value(row)
                    .map_err(|e| TicketError::StoreUnavailable(e.to_string()))?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    async fn update_status(&self, ticket_id: Uuid, status: TicketStatus) -> Result<(), TicketError> {
        let path = format!("/rest/v1/tickets?id=eq.{}", ticket_id);
        let body = json!({ "status": status });

        let rows: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::write_headers()),
            )
            .await
            .map_err(|e| TicketError::StoreUnavailable(e.to_string()))?;

        if rows.is_empty() {
            return Err(TicketError::TicketNotFound(ticket_id));
        }
        Ok(())
    }

    async fn update_estimated_call_time(
        &self,
        ticket_id: Uuid,
        estimated_call_time: DateTime<Utc>,
    ) -> Result<(), TicketError> {
        let path = format!("/rest/v1/tickets?id=eq.{}", ticket_id);
        let body = json!({ "estimated_call_time": estimated_call_time });

        let rows: Vec<Value> = self
            .store
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(body),
                Some(Self::write_headers()),
            )
            .await
            .map_err(|e| TicketError::StoreUnavailable(e.to_string()))?;

        if rows.is_empty() {
            return Err(TicketError::TicketNotFound(ticket_id));
        }
        Ok(())
    }
}

/// In-memory store for tests and local development. Implements both seams so
/// a single instance backs the allocator and the dispatcher the way the real
/// store does.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    counters: HashMap<(Uuid, NaiveDate), u32>,
    issued_requests: HashMap<Uuid, u32>,
    tickets: HashMap<Uuid, Ticket>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceStore for MemoryStore {
    async fn next_number(
        &self,
        doctor_id: Uuid,
        service_day: NaiveDate,
        request_id: Uuid,
    ) -> Result<u32, TicketError> {
        let mut inner = self.inner.lock().await;

        if let Some(&already_issued) = inner.issued_requests.get(&request_id) {
            return Ok(already_issued);
        }

        let counter = inner.counters.entry((doctor_id, service_day)).or_insert(1);
        let number = *counter;
        *counter += 1;
        inner.issued_requests.insert(request_id, number);

        Ok(number)
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), TicketError> {
        let mut inner = self.inner.lock().await;
        // Keyed insert: a crash-retry re-insert overwrites the identical row.
        inner.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn get_ticket(&self, ticket_id: Uuid) -> Result<Option<Ticket>, TicketError> {
        let inner = self.inner.lock().await;
        Ok(inner.tickets.get(&ticket_id).cloned())
    }

    async fn update_status(&self, ticket_id: Uuid, status: TicketStatus) -> Result<(), TicketError> {
        let mut inner = self.inner.lock().await;
        let ticket = inner
            .tickets
            .get_mut(&ticket_id)
            .ok_or(TicketError::TicketNotFound(ticket_id))?;

        if !ticket.status.can_transition_to(&status) {
            return Err(TicketError::InvalidStatusTransition {
                from: format!("{:?}", ticket.status),
                to: format!("{:?}", status),
            });
        }

        ticket.status = status;
        Ok(())
    }

    async fn update_estimated_call_time(
        &self,
        ticket_id: Uuid,
        estimated_call_time: DateTime<Utc>,
    ) -> Result<(), TicketError> {
        let mut inner = self.inner.lock().await;
        let ticket = inner
            .tickets
            .get_mut(&ticket_id)
            .ok_or(TicketError::TicketNotFound(ticket_id))?;

        ticket.estimated_call_time = estimated_call_time;
        Ok(())
    }
}
