use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{DoctorDirectoryError, DoctorListing};
use crate::services::directory::DoctorDirectoryService;

/// Public doctor listing, as patients see it when picking who to queue for.
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let directory = DoctorDirectoryService::new(&config);

    let doctors = directory.list_doctors().await.map_err(|e| {
        error!("Failed to list doctors: {}", e);
        AppError::ServiceUnavailable("Doctor directory unavailable".to_string())
    })?;

    let listings: Vec<DoctorListing> = doctors.iter().map(DoctorListing::from).collect();

    Ok(Json(json!({ "doctors": listings })))
}

pub async fn get_doctor(
    State(config): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<DoctorListing>, AppError> {
    let directory = DoctorDirectoryService::new(&config);

    let doctor = directory.get_active_doctor(doctor_id).await.map_err(|e| match e {
        DoctorDirectoryError::NotFound(_) => {
            AppError::NotFound("Doctor not found".to_string())
        }
        DoctorDirectoryError::Inactive(_) => {
            AppError::NotFound("Doctor is not accepting patients".to_string())
        }
        DoctorDirectoryError::Unavailable(msg) => {
            error!("Doctor lookup failed: {}", msg);
            AppError::ServiceUnavailable("Doctor directory unavailable".to_string())
        }
    })?;

    Ok(Json(DoctorListing::from(&doctor)))
}
