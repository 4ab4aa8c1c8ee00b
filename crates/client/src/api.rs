// crates/client/src/api.rs
//! Session-management HTTP collaborators.
//!
//! Plain request/response wrappers around the backend's REST surface. No
//! retry logic anywhere here: a failed suggestion simply comes back as an
//! `Err` and the caller resets its loading indicator.

use reqwest::StatusCode;
use tracing::debug;

use haggle_types::{
    CreateSessionRequest, SessionCreated, SessionDetail, SessionSummary, SuggestRequest,
    SuggestResponse,
};

use crate::error::ApiError;

/// Client for the session server's REST API.
pub struct GameApi {
    http: reqwest::Client,
    base_url: String,
}

impl GameApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `POST /api/games`: create and launch a session.
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<SessionCreated, ApiError> {
        let url = format!("{}/api/games", self.base_url);
        let created: SessionCreated = self.post_json(&url, request).await?;
        debug!(session_id = %created.session_id, "session created");
        Ok(created)
    }

    /// `GET /api/games`: list known sessions.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, ApiError> {
        let url = format!("{}/api/games", self.base_url);
        self.get_json(&url).await
    }

    /// `GET /api/games/{id}`: one session's full record.
    pub async fn get_session(&self, session_id: &str) -> Result<SessionDetail, ApiError> {
        let url = format!("{}/api/games/{session_id}", self.base_url);
        self.get_json(&url).await
    }

    /// `POST /api/games/{id}/ai-suggest`: ask for a split or message
    /// suggestion. One shot; a failure is final.
    pub async fn suggest(
        &self,
        session_id: &str,
        request: &SuggestRequest,
    ) -> Result<SuggestResponse, ApiError> {
        let url = format!("{}/api/games/{session_id}/ai-suggest", self.base_url);
        self.post_json(&url, request).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;
        Self::decode(url, response).await
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| ApiError::Request {
                url: url.to_string(),
                source,
            })?;
        Self::decode(url, response).await
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        response.json().await.map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}
