//! services/api/src/adapters/rest_client.rs
//!
//! Implements the `PersistenceBackend` port on top of the service's own REST
//! surface, for sessions that run on the client side of the network.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use scrollnet_core::domain::{FeedbackWrite, InteractionWrite, StoreIdentity, VideoDescriptor};
use scrollnet_core::ports::{PersistenceBackend, PortError, PortResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::web::protocol::{
    identity_fields, ApiResponse, FeedbackCreated, FeedbackRequest, FeedbackRequiredResponse,
    InteractionData, InteractionRequest, VideoDto,
};

/// A REST-backed persistence adapter.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl RestBackend {
    /// Creates a new `RestBackend` talking to `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: None,
        }
    }

    /// Forwards the auth provider's token on every request.
    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token.filter(|t| !t.is_empty());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<Option<T>> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        read_envelope(response).await
    }
}

/// Unwraps the `{ success, data, error }` envelope. A non-2xx status or a
/// `success: false` flag is a rejection.
async fn read_envelope<T: DeserializeOwned>(response: Response) -> PortResult<Option<T>> {
    let status = response.status();
    let envelope = response.json::<ApiResponse<T>>().await;

    match envelope {
        Ok(body) if status.is_success() && body.success => Ok(body.data),
        Ok(body) => Err(PortError::Rejected(format!(
            "{}: {}",
            status,
            body.error.unwrap_or_else(|| "request was not successful".to_string())
        ))),
        Err(e) if status.is_success() => Err(PortError::Unexpected(format!(
            "malformed response body: {}",
            e
        ))),
        Err(_) if status.is_server_error() => {
            Err(PortError::Unavailable(format!("server answered {}", status)))
        }
        Err(_) => Err(PortError::Rejected(format!("server answered {}", status))),
    }
}

//=========================================================================================
// `PersistenceBackend` Trait Implementation
//=========================================================================================

#[async_trait]
impl PersistenceBackend for RestBackend {
    async fn list_videos(&self, offset: usize, limit: usize) -> PortResult<Vec<VideoDescriptor>> {
        let request = self
            .client
            .get(self.url("/videos"))
            .query(&[("limit", limit), ("offset", offset)]);
        let videos: Option<Vec<VideoDto>> = self.send(request).await?;
        Ok(videos
            .unwrap_or_default()
            .into_iter()
            .map(VideoDescriptor::from)
            .collect())
    }

    async fn upsert_interaction(&self, write: InteractionWrite) -> PortResult<()> {
        let (identity_id, anonymous) = identity_fields(write.identity);
        let body = InteractionRequest {
            identity_id,
            anonymous,
            video_id: write.video_id,
            kind: write.kind.as_str().to_string(),
            data: InteractionData::from_payload(&write.payload),
        };
        let request = self.client.post(self.url("/interactions")).json(&body);
        self.send::<serde_json::Value>(request).await?;
        Ok(())
    }

    async fn insert_feedback(&self, write: FeedbackWrite) -> PortResult<()> {
        let (identity_id, anonymous) = identity_fields(write.identity);
        let body = FeedbackRequest {
            id: Some(write.id),
            identity_id,
            anonymous,
            video_id: write.video_id,
            answers: write.answers,
        };
        let request = self.client.post(self.url("/feedback")).json(&body);
        self.send::<FeedbackCreated>(request).await?;
        Ok(())
    }

    async fn feedback_required(&self, identity: StoreIdentity) -> PortResult<bool> {
        let (identity_id, anonymous) = identity_fields(identity);
        let mut request = self
            .client
            .get(self.url("/feedback/required"))
            .query(&[("anonymous", anonymous)]);
        if let Some(id) = identity_id {
            request = request.query(&[("identityId", id.to_string())]);
        }
        let response: Option<FeedbackRequiredResponse> = self.send(request).await?;
        Ok(response.map_or(false, |r| r.feedback_required))
    }
}
