use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Typed failure from the storage API. Unique-constraint violations surface
/// as `Conflict` so callers can map the check-then-insert race to a 409
/// instead of a generic failure.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage conflict: {0}")]
    Conflict(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Storage authentication error: {0}")]
    Auth(String),

    #[error("Storage API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Storage transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct PostgrestClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.database_rest_url.clone(),
            api_key: config.database_api_key.clone(),
        }
    }

    fn headers(&self, auth_token: Option<&str>, returning: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if returning {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        if let Some(token) = auth_token {
            if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, bearer);
            }
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        self.execute(method, path, auth_token, body, false).await
    }

    /// Same as `request` but asks the API to return the affected rows
    /// (insert/update paths that need the persisted representation back).
    pub async fn request_returning<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        self.execute(method, path, auth_token, body, true).await
    }

    async fn execute<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        returning: bool,
    ) -> Result<T, StorageError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(auth_token, returning));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::CONFLICT => StorageError::Conflict(error_text),
                StatusCode::NOT_FOUND => StorageError::NotFound(error_text),
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    StorageError::Auth(error_text)
                }
                _ => StorageError::Api {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}
