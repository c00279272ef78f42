use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{auth::Patient, error::AppError};

use crate::error::TicketError;
use crate::models::{QueueTicketRequest, TicketView};
use crate::services::ticket::TicketService;

/// Shared router state: the queue service is built once at startup because
/// the dispatcher owns long-lived background workers.
pub struct TicketQueueState {
    pub service: TicketService,
    pub config: Arc<AppConfig>,
}

/// Take a queue ticket for a doctor.
pub async fn request_ticket(
    State(state): State<Arc<TicketQueueState>>,
    Extension(patient): Extension<Patient>,
    Json(request): Json<QueueTicketRequest>,
) -> Result<Json<TicketView>, AppError> {
    info!(
        "Ticket request from patient {} for doctor {}",
        patient.id, request.doctor_id
    );

    let patient_id = Uuid::parse_str(&patient.id)
        .map_err(|_| AppError::BadRequest("Invalid patient ID format".to_string()))?;

    let contact = patient
        .phone
        .clone()
        .ok_or_else(|| AppError::BadRequest("Patient record has no contact number".to_string()))?;

    let view = state
        .service
        .request_ticket(request.doctor_id, patient_id, &contact)
        .await
        .map_err(map_ticket_error)?;

    Ok(Json(view))
}

/// Fetch a previously issued ticket. Tickets are never deleted, so this works
/// for the whole audit trail, including ones whose notification failed.
pub async fn get_ticket(
    State(state): State<Arc<TicketQueueState>>,
    Extension(patient): Extension<Patient>,
    Path(ticket_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let ticket = state
        .service
        .get_ticket(ticket_id)
        .await
        .map_err(map_ticket_error)?;

    if ticket.patient_id.to_string() != patient.id {
        return Err(AppError::Auth("Access denied".to_string()));
    }

    Ok(Json(json!({
        "ticket_id": ticket.id,
        "doctor_id": ticket.doctor_id,
        "service_day": ticket.service_day,
        "sequence_number": ticket.sequence_number,
        "estimated_call_time": ticket.estimated_call_time,
        "created_at": ticket.created_at,
        "status": ticket.status,
    })))
}

fn map_ticket_error(e: TicketError) -> AppError {
    match e {
        TicketError::DoctorNotFound(_) | TicketError::TicketNotFound(_) => {
            AppError::NotFound(e.to_string())
        }
        TicketError::DoctorInactive(_) => AppError::Conflict(e.to_string()),
        TicketError::AllocationFailed { .. } | TicketError::StoreUnavailable(_) => {
            AppError::ServiceUnavailable(
                "Ticket allocation is temporarily unavailable, please retry".to_string(),
            )
        }
        TicketError::InvalidStatusTransition { .. } => {
            AppError::Internal("Operation failed".to_string())
        }
    }
}
