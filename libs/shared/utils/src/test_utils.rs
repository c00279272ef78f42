use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::Patient;

pub struct TestConfig {
    pub jwt_secret: String,
    pub store_url: String,
    pub store_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            store_url: "http://localhost:54321".to_string(),
            store_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_url: self.store_url.clone(),
            store_api_key: self.store_api_key.clone(),
            jwt_secret: self.jwt_secret.clone(),
            twilio_sid: "ACtest".to_string(),
            twilio_token: "test-token".to_string(),
            twilio_whatsapp_from: "+14155238886".to_string(),
            twilio_base_url: "http://localhost:4010".to_string(),
            clinic_utc_offset_minutes: 0,
            default_service_minutes: 15,
            notification_max_attempts: 3,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestPatient {
    pub id: String,
    pub phone: String,
}

impl Default for TestPatient {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phone: "+15550001111".to_string(),
        }
    }
}

impl TestPatient {
    pub fn with_phone(phone: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            phone: phone.to_string(),
        }
    }

    pub fn to_patient(&self) -> Patient {
        Patient {
            id: self.id.clone(),
            phone: Some(self.phone.clone()),
            authenticated_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(patient: &TestPatient, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": patient.id,
            "phone": patient.phone,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(patient: &TestPatient, secret: &str) -> String {
        Self::create_test_token(patient, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(patient: &TestPatient) -> String {
        Self::create_test_token(patient, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}
