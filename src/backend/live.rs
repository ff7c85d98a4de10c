//! Live data source over the backend REST API

use super::DataSource;
use crate::api::types::{
    ChatResponse, Chatbot, ChatbotStats, CrawlLimits, KnowledgeSource, SearchResult, WidgetConfig,
};
use crate::api::ApiClient;
use crate::error::Result;
use async_trait::async_trait;

/// Forwards every operation to [`ApiClient`]
pub struct LiveBackend {
    client: ApiClient,
}

impl LiveBackend {
    /// Wrap an API client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Underlying client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl DataSource for LiveBackend {
    async fn list_chatbots(&self) -> Result<Vec<Chatbot>> {
        self.client.list_chatbots().await
    }

    async fn get_chatbot(&self, id: &str) -> Result<Chatbot> {
        self.client.get_chatbot(id).await
    }

    async fn update_chatbot(&self, id: &str, chatbot: &Chatbot) -> Result<Chatbot> {
        self.client.update_chatbot(id, chatbot).await
    }

    async fn get_widget_config(&self, id: &str) -> Result<WidgetConfig> {
        self.client.get_widget_config(id).await
    }

    async fn update_widget_config(
        &self,
        id: &str,
        config: &WidgetConfig,
    ) -> Result<WidgetConfig> {
        self.client.update_widget_config(id, config).await
    }

    async fn get_system_prompt(&self, id: &str) -> Result<String> {
        self.client.get_system_prompt(id).await
    }

    async fn update_system_prompt(&self, id: &str, prompt: &str) -> Result<String> {
        self.client.update_system_prompt(id, prompt).await
    }

    async fn list_knowledge_sources(&self, chatbot_id: &str) -> Result<Vec<KnowledgeSource>> {
        self.client.list_knowledge_sources(chatbot_id).await
    }

    async fn get_knowledge_source(&self, id: &str) -> Result<KnowledgeSource> {
        self.client.get_knowledge_source(id).await
    }

    async fn create_document_source(
        &self,
        chatbot_id: &str,
        name: &str,
        content: &str,
    ) -> Result<KnowledgeSource> {
        self.client
            .create_document_source(chatbot_id, name, content)
            .await
    }

    async fn create_website_source(
        &self,
        chatbot_id: &str,
        url: &str,
        limits: CrawlLimits,
    ) -> Result<KnowledgeSource> {
        self.client
            .create_website_source(chatbot_id, url, limits)
            .await
    }

    async fn delete_knowledge_source(&self, id: &str) -> Result<()> {
        self.client.delete_knowledge_source(id).await
    }

    async fn search(
        &self,
        chatbot_id: &str,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<SearchResult>> {
        self.client.search(chatbot_id, query, top_k).await
    }

    async fn run_test_chat(&self, chatbot_id: &str, query: &str) -> Result<ChatResponse> {
        self.client.run_test_chat(chatbot_id, query).await
    }

    async fn get_stats(&self, chatbot_id: &str) -> Result<ChatbotStats> {
        self.client.get_stats(chatbot_id).await
    }
}
