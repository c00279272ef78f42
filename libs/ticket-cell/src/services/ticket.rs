use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::TicketError;
use crate::models::{NotificationJob, Ticket, TicketView};
use crate::services::dispatcher::NotificationDispatcher;
use crate::services::estimator;
use crate::services::store::TicketStore;
use crate::services::allocator::TicketAllocator;

/// Entry point for the queue flow: allocate, estimate, persist the estimate,
/// schedule the confirmation message, answer the caller.
pub struct TicketService {
    allocator: TicketAllocator,
    tickets: Arc<dyn TicketStore>,
    dispatcher: Arc<NotificationDispatcher>,
    default_service_duration: Duration,
    clinic_offset_minutes: i64,
    notification_max_attempts: u32,
}

impl TicketService {
    pub fn new(
        allocator: TicketAllocator,
        tickets: Arc<dyn TicketStore>,
        dispatcher: Arc<NotificationDispatcher>,
        config: &AppConfig,
    ) -> Self {
        Self {
            allocator,
            tickets,
            dispatcher,
            default_service_duration: Duration::minutes(config.default_service_minutes),
            clinic_offset_minutes: config.clinic_utc_offset_minutes as i64,
            notification_max_attempts: config.notification_max_attempts,
        }
    }

    #[instrument(skip(self, contact))]
    pub async fn request_ticket(
        &self,
        doctor_id: Uuid,
        patient_id: Uuid,
        contact: &str,
    ) -> Result<TicketView, TicketError> {
        let (ticket, doctor) = self.allocator.allocate(doctor_id, patient_id).await?;

        let avg_service_duration = doctor
            .avg_consultation_minutes
            .map(Duration::minutes)
            .unwrap_or(self.default_service_duration);

        let estimated_call_time =
            estimator::estimated_call_time(ticket.sequence_number, avg_service_duration, Utc::now());

        if let Err(e) = self
            .tickets
            .update_estimated_call_time(ticket.id, estimated_call_time)
            .await
        {
            // The reservation is already final; the caller still gets the
            // computed estimate even if the stored copy is stale.
            warn!("Failed to persist estimate for ticket {}: {}", ticket.id, e);
        }

        let message_body = self.confirmation_message(
            ticket.sequence_number,
            estimated_call_time,
            &doctor.full_name,
        );
        self.dispatcher.enqueue(NotificationJob::new(
            ticket.id,
            contact.to_string(),
            message_body,
            self.notification_max_attempts,
        ));

        info!(
            "Issued ticket {} (number {}) for doctor {}",
            ticket.id, ticket.sequence_number, doctor_id
        );

        Ok(TicketView {
            ticket_id: ticket.id,
            sequence_number: ticket.sequence_number,
            estimated_call_time,
            recipient_contact: contact.to_string(),
        })
    }

    pub async fn get_ticket(&self, ticket_id: Uuid) -> Result<Ticket, TicketError> {
        self.tickets
            .get_ticket(ticket_id)
            .await?
            .ok_or(TicketError::TicketNotFound(ticket_id))
    }

    fn confirmation_message(
        &self,
        sequence_number: u32,
        estimated_call_time: chrono::DateTime<Utc>,
        doctor_name: &str,
    ) -> String {
        let clinic_local =
            estimated_call_time + Duration::minutes(self.clinic_offset_minutes);
        format!(
            "Your queue number for {} is {}. Estimated call time: {}",
            doctor_name,
            sequence_number,
            clinic_local.format("%H:%M")
        )
    }
}
