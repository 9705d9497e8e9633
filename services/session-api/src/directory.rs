//! HTTP client for the external user directory

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

use warden_store::{DirectoryUser, StoreError, StoreResult, UserDirectory};
use warden_types::UserId;

/// Directory entry as the remote service serves it
#[derive(Debug, Deserialize)]
struct DirectoryUserDto {
    id: Uuid,
    email: String,
    password_hash: String,
    active: bool,
    role: String,
}

impl From<DirectoryUserDto> for DirectoryUser {
    fn from(dto: DirectoryUserDto) -> Self {
        Self {
            id: UserId(dto.id),
            email: dto.email,
            password_hash: dto.password_hash,
            active: dto.active,
            role: dto.role,
        }
    }
}

/// User directory over an internal HTTP API
#[derive(Clone)]
pub struct HttpUserDirectory {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserDirectory {
    /// Create a directory client with fail-fast timeouts
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch_user(&self, request: reqwest::RequestBuilder) -> StoreResult<Option<DirectoryUser>> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Backend(format!("directory request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Backend(format!(
                "directory returned status {}",
                response.status()
            )));
        }

        let dto = response
            .json::<DirectoryUserDto>()
            .await
            .map_err(|e| StoreError::Backend(format!("directory response malformed: {e}")))?;
        Ok(Some(dto.into()))
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<DirectoryUser>> {
        let request = self
            .client
            .get(format!("{}/internal/users", self.base_url))
            .query(&[("email", email)]);
        self.fetch_user(request).await
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<DirectoryUser>> {
        let request = self
            .client
            .get(format!("{}/internal/users/{}", self.base_url, id));
        self.fetch_user(request).await
    }
}

impl std::fmt::Debug for HttpUserDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpUserDirectory")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
