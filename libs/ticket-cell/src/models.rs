use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reserved, numbered queue slot. Immutable once committed, except for
/// `status` and the post-commit estimate refresh; never deleted, so the day's
/// issuance history stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    /// Calendar day (clinic time) this ticket's sequence scope belongs to.
    pub service_day: NaiveDate,
    /// 1-based position within {doctor_id, service_day}. Gapless and unique.
    pub sequence_number: u32,
    pub estimated_call_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TicketStatus {
    Issued,
    Notified,
    NotificationFailed,
    Cancelled,
}

impl TicketStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TicketStatus::Notified | TicketStatus::NotificationFailed | TicketStatus::Cancelled
        )
    }

    /// The only legal moves: a ticket starts `Issued` and the dispatcher
    /// resolves it one way; `Cancelled` stays reachable for front-desk flows.
    pub fn can_transition_to(&self, target: &TicketStatus) -> bool {
        use TicketStatus::*;
        match (self, target) {
            (Issued, Notified) => true,
            (Issued, NotificationFailed) => true,
            (Issued, Cancelled) | (Notified, Cancelled) | (NotificationFailed, Cancelled) => true,
            _ => false,
        }
    }
}

/// What the caller gets back from a successful ticket request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketView {
    pub ticket_id: Uuid,
    pub sequence_number: u32,
    pub estimated_call_time: DateTime<Utc>,
    pub recipient_contact: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueTicketRequest {
    pub doctor_id: Uuid,
}

/// One pending confirmation delivery. Ephemeral: lives in the dispatch queue
/// until delivered or exhausted; the outcome lands on the ticket row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationJob {
    pub ticket_id: Uuid,
    pub recipient_contact: String,
    pub message_body: String,
    pub attempt_count: u32,
    pub next_attempt_at: DateTime<Utc>,
    pub max_attempts: u32,
}

impl NotificationJob {
    pub fn new(
        ticket_id: Uuid,
        recipient_contact: String,
        message_body: String,
        max_attempts: u32,
    ) -> Self {
        Self {
            ticket_id,
            recipient_contact,
            message_body,
            attempt_count: 0,
            next_attempt_at: Utc::now(),
            max_attempts,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.attempt_count < self.max_attempts
    }
}

#[derive(Debug, Clone)]
pub struct AllocatorConfig {
    /// Attempts at the whole allocate step before giving up.
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub workers: usize,
    pub retry_base_delay_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            retry_base_delay_ms: 200,
        }
    }
}
