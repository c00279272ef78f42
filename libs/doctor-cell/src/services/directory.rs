use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::StoreClient;

use crate::models::{Doctor, DoctorDirectoryError};

pub struct DoctorDirectoryService {
    store: StoreClient,
}

impl DoctorDirectoryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: StoreClient::new(config),
        }
    }

    /// Look up a doctor that can currently be booked. Distinguishes a missing
    /// record from one that exists but is no longer accepting patients.
    pub async fn get_active_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorDirectoryError> {
        debug!("Fetching doctor record: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorDirectoryError::Unavailable(e.to_string()))?;

        let Some(row) = result.into_iter().next() else {
            return Err(DoctorDirectoryError::NotFound(doctor_id));
        };

        let doctor: Doctor = serde_json::from_value(row)
            .map_err(|e| DoctorDirectoryError::Unavailable(e.to_string()))?;

        if !doctor.is_active {
            return Err(DoctorDirectoryError::Inactive(doctor_id));
        }

        Ok(doctor)
    }

    /// All doctors patients can see in the public listing.
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorDirectoryError> {
        debug!("Listing doctors");

        let path = "/rest/v1/doctors?is_active=eq.true&order=full_name.asc";
        let result: Vec<Value> = self
            .store
            .request(Method::GET, path, None)
            .await
            .map_err(|e| DoctorDirectoryError::Unavailable(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| DoctorDirectoryError::Unavailable(e.to_string()))
            })
            .collect()
    }
}
