use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::DoctorDirectoryError;
use doctor_cell::services::directory::DoctorDirectoryService;
use shared_utils::test_utils::TestConfig;

fn doctor_row(id: Uuid, is_active: bool) -> serde_json::Value {
    json!({
        "id": id,
        "full_name": "Dr. Amara Okafor",
        "specialty": "General Practice",
        "is_active": is_active,
        "avg_consultation_minutes": 20,
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
}

async fn directory_against(server: &MockServer) -> DoctorDirectoryService {
    let mut config = TestConfig::default().to_app_config();
    config.store_url = server.uri();
    DoctorDirectoryService::new(&config)
}

#[tokio::test]
async fn test_get_active_doctor_found() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([doctor_row(doctor_id, true)])))
        .mount(&server)
        .await;

    let directory = directory_against(&server).await;
    let doctor = directory
        .get_active_doctor(doctor_id)
        .await
        .expect("doctor should be found");

    assert_eq!(doctor.id, doctor_id);
    assert!(doctor.is_active);
    assert_eq!(doctor.avg_consultation_minutes, Some(20));
}

#[tokio::test]
async fn test_get_active_doctor_missing() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let directory = directory_against(&server).await;
    let result = directory.get_active_doctor(doctor_id).await;

    assert_matches!(result.unwrap_err(), DoctorDirectoryError::NotFound(id) if id == doctor_id);
}

#[tokio::test]
async fn test_get_active_doctor_inactive() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([doctor_row(doctor_id, false)])),
        )
        .mount(&server)
        .await;

    let directory = directory_against(&server).await;
    let result = directory.get_active_doctor(doctor_id).await;

    assert_matches!(result.unwrap_err(), DoctorDirectoryError::Inactive(id) if id == doctor_id);
}

#[tokio::test]
async fn test_get_active_doctor_store_down() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let directory = directory_against(&server).await;
    let result = directory.get_active_doctor(doctor_id).await;

    assert_matches!(result.unwrap_err(), DoctorDirectoryError::Unavailable(_));
}

#[tokio::test]
async fn test_list_doctors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            doctor_row(Uuid::new_v4(), true),
            doctor_row(Uuid::new_v4(), true),
        ])))
        .mount(&server)
        .await;

    let directory = directory_against(&server).await;
    let doctors = directory.list_doctors().await.expect("listing should succeed");

    assert_eq!(doctors.len(), 2);
}
