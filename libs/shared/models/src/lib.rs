pub mod auth;
pub mod error;

pub use auth::{JwtClaims, Patient};
pub use error::AppError;
