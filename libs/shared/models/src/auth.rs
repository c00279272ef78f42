use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

/// Claims the clinic token carrier must present. Issuance lives in the
/// external auth service; only the fields the queue flow reads are modeled.
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub phone: Option<String>,
    pub iat: Option<u64>,
}

/// The authenticated patient, as extracted from a verified token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    /// Contact the confirmation message is delivered to.
    pub phone: Option<String>,
    pub authenticated_at: Option<DateTime<Utc>>,
}
