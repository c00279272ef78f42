use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Failure classes of the persistent store. `Unreachable` covers transport
/// errors and server-side overload; callers may retry those. `Api` is a
/// definitive response from the store and retrying it will not help.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("store error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("store returned malformed payload: {0}")]
    Decode(String),
}

/// Authenticated JSON client for the PostgREST-compatible persistent store.
///
/// Tables are reached under `/rest/v1/{table}?col=eq.{value}` and database
/// functions under `/rest/v1/rpc/{function}`. All requests carry the service
/// API key; row-level identity is not delegated to end-user tokens here.
pub struct StoreClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl StoreClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.store_url.clone(),
            api_key: config.store_api_key.clone(),
        }
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making store request to {}", url);

        let mut headers = self.get_headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Store error ({}): {}", status, error_text);

            if is_transient(status) {
                return Err(StoreError::Unreachable(format!(
                    "HTTP {}: {}",
                    status, error_text
                )));
            }
            return Err(StoreError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Call a database function. The store runs the function body in a single
    /// transaction, which is what makes the sequence increment atomic.
    pub async fn rpc<T>(&self, function: &str, params: Value) -> Result<T, StoreError>
    where
        T: DeserializeOwned,
    {
        let path = format!("/rest/v1/rpc/{}", function);
        self.request(Method::POST, &path, Some(params)).await
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}
