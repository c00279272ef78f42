use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TicketError {
    #[error("Doctor not found: {0}")]
    DoctorNotFound(Uuid),

    #[error("Doctor is not accepting patients: {0}")]
    DoctorInactive(Uuid),

    /// Transient infrastructure failure. Retried internally with bounded
    /// backoff; surfaced to callers only as `AllocationFailed` once retries
    /// are exhausted.
    #[error("Ticket store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Ticket allocation failed after {attempts} attempts")]
    AllocationFailed { attempts: u32 },

    #[error("Ticket not found: {0}")]
    TicketNotFound(Uuid),

    #[error("Invalid ticket status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },
}
