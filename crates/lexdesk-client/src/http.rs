//! HTTP backend for the AI chat endpoints.

use async_trait::async_trait;
use lexdesk_core::CaseId;
use lexdesk_core::chat::{CaseSummaryReply, CaseSummaryRequest, ChatReply, MessageRequest};
use reqwest::Url;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::{ChatBackend, ClientConfig, ClientError};

/// reqwest-backed [`ChatBackend`].
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatBackend {
    /// Build a backend for `config.base_url`, applying `config.timeout` to
    /// every request.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_client(client, &config.base_url))
    }

    /// Use a preconfigured reqwest client.
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Join `segments` onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url =
            Url::parse(&self.base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check an id before it becomes a path segment. URL normalisation would
    /// drop `.` and `..`, and an empty id leaves `//`, each reaching a
    /// different route.
    fn id_segment<'a>(kind: &str, id: &'a str) -> Result<&'a str, ClientError> {
        match id {
            "" | "." | ".." => Err(ClientError::InvalidUrl(format!(
                "{kind} {id:?} is not a usable path segment"
            ))),
            _ => Ok(id),
        }
    }

    /// POST `body` as JSON and decode the JSON reply.
    ///
    /// Non-2xx statuses and undecodable bodies are errors.
    async fn post_json<B, R>(&self, url: Url, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        info!(url = %url, "posting to AI chat backend");
        let resp = self.client.post(url).json(body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await?;
        debug!(bytes = text.len(), "received reply");
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn start_session(
        &self,
        case_id: &CaseId,
        message: &str,
    ) -> Result<ChatReply, ClientError> {
        let case_id = Self::id_segment("case id", case_id.as_str())?;
        let url = self.endpoint(&["api", "ai-chat", "sessions", case_id, "start"])?;
        let body = MessageRequest {
            message: message.to_string(),
        };
        self.post_json(url, &body).await
    }

    async fn continue_session(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, ClientError> {
        let session_id = Self::id_segment("session id", session_id)?;
        let url = self.endpoint(&["api", "ai-chat", "sessions", session_id, "messages"])?;
        let body = MessageRequest {
            message: message.to_string(),
        };
        self.post_json(url, &body).await
    }

    async fn case_summary(&self, case_id: &CaseId) -> Result<CaseSummaryReply, ClientError> {
        let url = self.endpoint(&["api", "ai-chat", "case-summary"])?;
        let body = CaseSummaryRequest {
            case_id: case_id.clone(),
        };
        self.post_json(url, &body).await
    }
}
