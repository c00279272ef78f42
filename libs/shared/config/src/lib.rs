use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_url: String,
    pub store_api_key: String,
    pub jwt_secret: String,
    pub twilio_sid: String,
    pub twilio_token: String,
    pub twilio_whatsapp_from: String,
    pub twilio_base_url: String,
    /// Offset of the clinic's local time from UTC, in minutes. Service days
    /// roll over at midnight clinic time, not UTC midnight.
    pub clinic_utc_offset_minutes: i32,
    /// Fallback consultation length when a doctor record carries none.
    pub default_service_minutes: i64,
    pub notification_max_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_url: env::var("CLINIC_STORE_URL")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_STORE_URL not set, using empty value");
                    String::new()
                }),
            store_api_key: env::var("CLINIC_STORE_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_STORE_API_KEY not set, using empty value");
                    String::new()
                }),
            jwt_secret: env::var("CLINIC_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("CLINIC_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            twilio_sid: env::var("TWILIO_SID")
                .unwrap_or_else(|_| {
                    warn!("TWILIO_SID not set, using empty value");
                    String::new()
                }),
            twilio_token: env::var("TWILIO_TOKEN")
                .unwrap_or_else(|_| {
                    warn!("TWILIO_TOKEN not set, using empty value");
                    String::new()
                }),
            twilio_whatsapp_from: env::var("TWILIO_PHONE")
                .unwrap_or_else(|_| {
                    warn!("TWILIO_PHONE not set, using default");
                    "+14155238886".to_string()
                }),
            twilio_base_url: env::var("TWILIO_BASE_URL")
                .unwrap_or_else(|_| "https://api.twilio.com".to_string()),
            clinic_utc_offset_minutes: parse_env_or("CLINIC_UTC_OFFSET_MINUTES", 0),
            default_service_minutes: parse_env_or("DEFAULT_SERVICE_MINUTES", 15),
            notification_max_attempts: parse_env_or("NOTIFICATION_MAX_ATTEMPTS", 3),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.store_url.is_empty()
            && !self.store_api_key.is_empty()
            && !self.jwt_secret.is_empty()
    }

    pub fn is_messaging_configured(&self) -> bool {
        !self.twilio_sid.is_empty()
            && !self.twilio_token.is_empty()
            && !self.twilio_whatsapp_from.is_empty()
    }
}

fn parse_env_or<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid number, using default", key);
            default
        }),
        Err(_) => default,
    }
}
