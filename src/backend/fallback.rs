//! Live data source with demo fallback
//!
//! Every call goes to the live backend first. When a read fails the failure
//! is logged and the same read is answered by the demo backend, so the
//! console stays explorable while the backend is down. Mutations never fall
//! back: their error reaches the view unchanged. Only selected by explicit
//! configuration (`backend.mode: fallback`).

use super::{DataSource, DemoBackend, LiveBackend};
use crate::api::types::{
    ChatResponse, Chatbot, ChatbotStats, CrawlLimits, KnowledgeSource, SearchResult, WidgetConfig,
};
use crate::error::Result;
use async_trait::async_trait;
use std::future::Future;

/// Primary data source with an in-memory stand-in
pub struct FallbackBackend<P = LiveBackend, S = DemoBackend> {
    primary: P,
    standby: S,
}

impl<P: DataSource, S: DataSource> FallbackBackend<P, S> {
    /// Pair a primary source with its stand-in
    pub fn new(primary: P, standby: S) -> Self {
        Self { primary, standby }
    }

    async fn or_standby<T, F>(&self, operation: &str, primary: Result<T>, standby: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match primary {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!("{} failed, serving demo data: {}", operation, e);
                standby.await
            }
        }
    }
}

#[async_trait]
impl<P: DataSource, S: DataSource> DataSource for FallbackBackend<P, S> {
    async fn list_chatbots(&self) -> Result<Vec<Chatbot>> {
        let primary = self.primary.list_chatbots().await;
        self.or_standby("list_chatbots", primary, self.standby.list_chatbots())
            .await
    }

    async fn get_chatbot(&self, id: &str) -> Result<Chatbot> {
        let primary = self.primary.get_chatbot(id).await;
        self.or_standby("get_chatbot", primary, self.standby.get_chatbot(id))
            .await
    }

    async fn update_chatbot(&self, id: &str, chatbot: &Chatbot) -> Result<Chatbot> {
        self.primary.update_chatbot(id, chatbot).await
    }

    async fn get_widget_config(&self, id: &str) -> Result<WidgetConfig> {
        let primary = self.primary.get_widget_config(id).await;
        self.or_standby(
            "get_widget_config",
            primary,
            self.standby.get_widget_config(id),
        )
        .await
    }

    async fn update_widget_config(
        &self,
        id: &str,
        config: &WidgetConfig,
    ) -> Result<WidgetConfig> {
        self.primary.update_widget_config(id, config).await
    }

    async fn get_system_prompt(&self, id: &str) -> Result<String> {
        let primary = self.primary.get_system_prompt(id).await;
        self.or_standby(
            "get_system_prompt",
            primary,
            self.standby.get_system_prompt(id),
        )
        .await
    }

    async fn update_system_prompt(&self, id: &str, prompt: &str) -> Result<String> {
        self.primary.update_system_prompt(id, prompt).await
    }

    async fn list_knowledge_sources(&self, chatbot_id: &str) -> Result<Vec<KnowledgeSource>> {
        let primary = self.primary.list_knowledge_sources(chatbot_id).await;
        self.or_standby(
            "list_knowledge_sources",
            primary,
            self.standby.list_knowledge_sources(chatbot_id),
        )
        .await
    }

    async fn get_knowledge_source(&self, id: &str) -> Result<KnowledgeSource> {
        let primary = self.primary.get_knowledge_source(id).await;
        self.or_standby(
            "get_knowledge_source",
            primary,
            self.standby.get_knowledge_source(id),
        )
        .await
    }

    async fn create_document_source(
        &self,
        chatbot_id: &str,
        name: &str,
        content: &str,
    ) -> Result<KnowledgeSource> {
        self.primary.create_document_source(chatbot_id, name, content).await
    }

    async fn create_website_source(
        &self,
        chatbot_id: &str,
        url: &str,
        limits: CrawlLimits,
    ) -> Result<KnowledgeSource> {
        self.primary.create_website_source(chatbot_id, url, limits).await
    }

    async fn delete_knowledge_source(&self, id: &str) -> Result<()> {
        self.primary.delete_knowledge_source(id).await
    }

    async fn search(
        &self,
        chatbot_id: &str,
        query: &str,
        top_k: u32,
    ) -> Result<Vec<SearchResult>> {
        let primary = self.primary.search(chatbot_id, query, top_k).await;
        self.or_standby(
            "search",
            primary,
            self.standby.search(chatbot_id, query, top_k),
        )
        .await
    }

    async fn run_test_chat(&self, chatbot_id: &str, query: &str) -> Result<ChatResponse> {
        let primary = self.primary.run_test_chat(chatbot_id, query).await;
        self.or_standby(
            "run_test_chat",
            primary,
            self.standby.run_test_chat(chatbot_id, query),
        )
        .await
    }

    async fn get_stats(&self, chatbot_id: &str) -> Result<ChatbotStats> {
        let primary = self.primary.get_stats(chatbot_id).await;
        self.or_standby("get_stats", primary, self.standby.get_stats(chatbot_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockDataSource;
    use crate::error::ConsoleError;

    #[tokio::test]
    async fn test_primary_success_is_returned() {
        let mut primary = MockDataSource::new();
        primary
            .expect_get_system_prompt()
            .returning(|_| Ok("live prompt".to_string()));
        let mut standby = MockDataSource::new();
        standby.expect_get_system_prompt().never();

        let backend = FallbackBackend::new(primary, standby);
        assert_eq!(
            backend.get_system_prompt("bot-1").await.unwrap(),
            "live prompt"
        );
    }

    #[tokio::test]
    async fn test_primary_failure_serves_demo_data() {
        let mut primary = MockDataSource::new();
        primary
            .expect_get_stats()
            .returning(|_| Err(ConsoleError::Api("db down".to_string()).into()));

        let backend = FallbackBackend::new(primary, DemoBackend::new());
        let stats = backend.get_stats("bot-1").await.unwrap();
        assert_eq!(stats.total_messages, 8963);
        assert_eq!(stats.daily_usage.len(), 7);
    }

    #[tokio::test]
    async fn test_failed_create_is_not_answered_by_demo_data() {
        let mut primary = MockDataSource::new();
        primary
            .expect_create_document_source()
            .times(1)
            .returning(|_, _, _| Err(ConsoleError::Api("db down".to_string()).into()));
        let mut standby = MockDataSource::new();
        standby.expect_create_document_source().never();

        let backend = FallbackBackend::new(primary, standby);
        let err = backend
            .create_document_source("bot-1", "FAQ", "Q: A:")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "db down");
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_demo_sources() {
        let mut primary = MockDataSource::new();
        primary
            .expect_delete_knowledge_source()
            .returning(|_| Err(ConsoleError::Api("db down".to_string()).into()));
        primary
            .expect_list_knowledge_sources()
            .returning(|_| Err(ConsoleError::Api("db down".to_string()).into()));

        let backend = FallbackBackend::new(primary, DemoBackend::new());
        assert!(backend.delete_knowledge_source("mock-1").await.is_err());
        assert_eq!(backend.list_knowledge_sources("bot-1").await.unwrap().len(), 2);
    }
}
