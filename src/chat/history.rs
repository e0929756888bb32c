//! Chat HTTP API client
//!
//! History retrieval and read receipts.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::error::{ChatError, ChatResult};
use super::frames::{HistoryMessage, MarkReadRequest, UserId};

/// Server calls made by the Connection Manager
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Messages between `user_id` and `other_user_id`, oldest first
    async fn history(&self, user_id: UserId, other_user_id: UserId)
        -> ChatResult<Vec<HistoryMessage>>;

    /// Mark messages from `sender_id` to `user_id` as read
    async fn mark_read(&self, user_id: UserId, sender_id: UserId) -> ChatResult<()>;
}

/// reqwest-backed [`ChatApi`]
#[derive(Debug, Clone)]
pub struct HttpChatApi {
    client: Client,
    base_url: String,
}

impl HttpChatApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ChatResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn history_url(&self, user_id: UserId) -> String {
        format!("{}/api/users/{}/messages", self.base_url, user_id)
    }

    fn mark_read_url(&self) -> String {
        format!("{}/api/messages/mark-read", self.base_url)
    }
}

fn map_request_error(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout
    } else if e.is_connect() {
        ChatError::Transport(e.to_string())
    } else {
        ChatError::Request(e)
    }
}

async fn api_error(response: reqwest::Response) -> ChatError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    ChatError::Api {
        status: status.as_u16(),
        message: text,
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn history(
        &self,
        user_id: UserId,
        other_user_id: UserId,
    ) -> ChatResult<Vec<HistoryMessage>> {
        let response = self
            .client
            .get(self.history_url(user_id))
            .query(&[("other_user_id", other_user_id)])
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status().is_success() {
            Ok(response.json().await.map_err(ChatError::Request)?)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn mark_read(&self, user_id: UserId, sender_id: UserId) -> ChatResult<()> {
        let response = self
            .client
            .post(self.mark_read_url())
            .json(&MarkReadRequest { user_id, sender_id })
            .send()
            .await
            .map_err(map_request_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(api_error(response).await)
        }
    }
}
