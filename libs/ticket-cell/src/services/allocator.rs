use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use tracing::{error, instrument, warn};
use uuid::Uuid;

use doctor_cell::models::{Doctor, DoctorDirectoryError};
use doctor_cell::services::directory::DoctorDirectoryService;

use crate::error::TicketError;
use crate::models::{AllocatorConfig, Ticket, TicketStatus};
use crate::services::store::{SequenceStore, TicketStore};

/// The directory seam the allocator validates doctors against.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn get_active_doctor(&self, doctor_id: Uuid) -> Result<Doctor, TicketError>;
}

#[async_trait]
impl DoctorDirectory for DoctorDirectoryService {
    async fn get_active_doctor(&self, doctor_id: Uuid) -> Result<Doctor, TicketError> {
        DoctorDirectoryService::get_active_doctor(self, doctor_id)
            .await
            .map_err(TicketError::from)
    }
}

impl From<DoctorDirectoryError> for TicketError {
    fn from(e: DoctorDirectoryError) -> Self {
        match e {
            DoctorDirectoryError::NotFound(id) => TicketError::DoctorNotFound(id),
            DoctorDirectoryError::Inactive(id) => TicketError::DoctorInactive(id),
            DoctorDirectoryError::Unavailable(msg) => TicketError::StoreUnavailable(msg),
        }
    }
}

/// Issues tickets. One `allocate` call reserves exactly one number; a
/// committed reservation is final and is never returned to the pool, which is
/// what keeps the day's numbering gapless.
pub struct TicketAllocator {
    directory: Arc<dyn DoctorDirectory>,
    sequence: Arc<dyn SequenceStore>,
    tickets: Arc<dyn TicketStore>,
    clinic_offset_minutes: i64,
    config: AllocatorConfig,
}

impl TicketAllocator {
    pub fn new(
        directory: Arc<dyn DoctorDirectory>,
        sequence: Arc<dyn SequenceStore>,
        tickets: Arc<dyn TicketStore>,
        clinic_offset_minutes: i64,
        config: AllocatorConfig,
    ) -> Self {
        Self {
            directory,
            sequence,
            tickets,
            clinic_offset_minutes,
            config,
        }
    }

    /// The calendar date sequence numbers reset on, in clinic time.
    pub fn service_day(&self, now: DateTime<Utc>) -> NaiveDate {
        (now + Duration::minutes(self.clinic_offset_minutes)).date_naive()
    }

    /// Reserve the next number for `doctor_id` today and durably commit the
    /// ticket. Transient store failures are retried with jittered exponential
    /// backoff; the ticket id and request id stay fixed across retries, so the
    /// increment and the insert are both idempotent and a retried attempt can
    /// never reserve a second number. Caller-input errors (unknown or
    /// inactive doctor) surface immediately without retry.
    #[instrument(skip(self))]
    pub async fn allocate(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
    ) -> Result<(Ticket, Doctor), TicketError> {
        // Fixed up front: retries that straddle midnight must stay in the
        // day the request arrived on, consistent with the memoized number.
        let service_day = self.service_day(Utc::now());
        let request_id = Uuid::new_v4();
        let ticket_id = Uuid::new_v4();

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .try_allocate(doctor_id, patient_id, service_day, request_id, ticket_id)
                .await
            {
                Ok(allocated) => return Ok(allocated),
                Err(TicketError::StoreUnavailable(msg)) if attempt < self.config.max_attempts => {
                    let delay = self.retry_delay(attempt);
                    warn!(
                        "Store unavailable on allocation attempt {}/{} for doctor {}, retrying in {:?}: {}",
                        attempt, self.config.max_attempts, doctor_id, delay, msg
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(TicketError::StoreUnavailable(msg)) => {
                    error!(
                        "Allocation for doctor {} failed after {} attempts: {}",
                        doctor_id, attempt, msg
                    );
                    return Err(TicketError::AllocationFailed { attempts: attempt });
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_allocate(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        service_day: NaiveDate,
        request_id: Uuid,
        ticket_id: Uuid,
    ) -> Result<(Ticket, Doctor), TicketError> {
        let doctor = self.directory.get_active_doctor(doctor_id).await?;

        let sequence_number = self
            .sequence
            .next_number(doctor_id, service_day, request_id)
            .await?;

        let now = Utc::now();
        let ticket = Ticket {
            id: ticket_id,
            doctor_id,
            patient_id,
            service_day,
            sequence_number,
            // Placeholder until the queue service computes the real estimate.
            estimated_call_time: now,
            created_at: now,
            status: TicketStatus::Issued,
        };

        self.tickets.insert_ticket(&ticket).await?;

        Ok((ticket, doctor))
    }

    fn retry_delay(&self, attempt: u32) -> std::time::Duration {
        let base = self.config.backoff_base_ms.max(1);
        let exp = base.saturating_mul(1u64 << attempt.saturating_sub(1).min(6));
        let jitter = rand::thread_rng().gen_range(0..base);
        std::time::Duration::from_millis(exp + jitter)
    }
}
