use crate::api::{OnUpdate, ProxyClient, ScoutClient};
use crate::error::Result;
use crate::models::ChatMessage;
use async_trait::async_trait;

/// Something that answers a user query with one assistant message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(&self, query: &str) -> Result<ChatMessage>;

    /// Streaming variant. Backends without incremental output report the
    /// whole reply as a single update.
    async fn reply_streaming(
        &self,
        query: &str,
        on_update: &mut OnUpdate<'_>,
    ) -> Result<ChatMessage> {
        let message = self.reply(query).await?;
        on_update(&message.content);
        Ok(message)
    }
}

#[async_trait]
impl ChatBackend for ProxyClient {
    async fn reply(&self, query: &str) -> Result<ChatMessage> {
        self.send(query).await
    }

    async fn reply_streaming(
        &self,
        query: &str,
        on_update: &mut OnUpdate<'_>,
    ) -> Result<ChatMessage> {
        self.send_streaming(query, on_update).await
    }
}

/// Talks to the scouting backend in-process, without a running proxy.
pub struct DirectBackend {
    client: ScoutClient,
}

impl DirectBackend {
    pub fn new(client: ScoutClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatBackend for DirectBackend {
    async fn reply(&self, query: &str) -> Result<ChatMessage> {
        Ok(self.client.ask(query).await.into_message())
    }
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for Box<T> {
    async fn reply(&self, query: &str) -> Result<ChatMessage> {
        (**self).reply(query).await
    }

    async fn reply_streaming(
        &self,
        query: &str,
        on_update: &mut OnUpdate<'_>,
    ) -> Result<ChatMessage> {
        (**self).reply_streaming(query, on_update).await
    }
}
