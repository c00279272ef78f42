use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
    /// Inactive doctors keep their record (tickets reference them) but can no
    /// longer be booked.
    pub is_active: bool,
    /// Average consultation length used for wait estimates. `None` falls back
    /// to the clinic-wide default.
    pub avg_consultation_minutes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public listing shape for `GET /doctors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorListing {
    pub id: Uuid,
    pub full_name: String,
    pub specialty: String,
}

impl From<&Doctor> for DoctorListing {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id,
            full_name: doctor.full_name.clone(),
            specialty: doctor.specialty.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DoctorDirectoryError {
    #[error("Doctor not found: {0}")]
    NotFound(Uuid),

    #[error("Doctor is not accepting patients: {0}")]
    Inactive(Uuid),

    #[error("Doctor directory unavailable: {0}")]
    Unavailable(String),
}
