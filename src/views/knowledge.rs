//! Knowledge sources view

use super::{run_action, Action, BannerSlot, Resource, ViewContext};
use crate::api::types::{CrawlLimits, KnowledgeSource, SearchResult};
use crate::backend::DataSource;
use crate::error::{ConsoleError, Result};
use futures::FutureExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DOCUMENT_ADDED: &str = "Document added successfully! Processing may take a few minutes.";
pub const WEBSITE_ADDED: &str = "Website crawling started! This process may take several minutes.";
pub const SOURCE_DELETED: &str = "Knowledge source deleted successfully";

const MISSING_FIELDS: &str = "Please fill in all required fields";
const MISSING_URL: &str = "Please enter a website URL";
const MISSING_SOURCE: &str = "Please choose a knowledge source to delete";

/// Lists, adds, deletes and searches knowledge sources of one chatbot
pub struct KnowledgeView {
    sources: Resource<Vec<KnowledgeSource>>,
    source: Arc<dyn DataSource>,
    banner: BannerSlot,
    pending: Option<Action>,
    cancel: CancellationToken,
}

impl KnowledgeView {
    pub async fn mount(ctx: &ViewContext) -> Self {
        let cancel = ctx.cancel.child_token();
        let source = ctx.source.clone();
        let mut sources = Resource::new(ctx.session.clone(), cancel.clone(), move |chatbot_id| {
            let source = source.clone();
            async move { source.list_knowledge_sources(&chatbot_id).await }.boxed()
        });
        sources.load().await;

        Self {
            sources,
            source: ctx.source.clone(),
            banner: BannerSlot::new(ctx.banner_ttl),
            pending: None,
            cancel,
        }
    }

    pub fn sources(&self) -> &Resource<Vec<KnowledgeSource>> {
        &self.sources
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn pending(&self) -> Option<&Action> {
        self.pending.as_ref()
    }

    pub async fn refetch(&mut self) {
        self.sources.refetch().await;
    }

    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    fn reject(&mut self, message: &str) -> anyhow::Error {
        self.banner.error(message);
        ConsoleError::Validation(message.to_string()).into()
    }

    /// Submit pasted text as a new document source
    ///
    /// # Errors
    ///
    /// Both fields are required; nothing is sent when either is blank.
    pub async fn add_document(&mut self, name: &str, content: &str) -> Result<KnowledgeSource> {
        let chatbot_id = self.sources.require_scope()?;
        if name.trim().is_empty() || content.trim().is_empty() {
            return Err(self.reject(MISSING_FIELDS));
        }

        let created = run_action(
            &mut self.pending,
            &mut self.banner,
            Action::AddDocument,
            self.source.create_document_source(&chatbot_id, name, content),
        )
        .await?;

        if let Some(list) = self.sources.data_mut() {
            list.push(created.clone());
        }
        self.banner.success(DOCUMENT_ADDED);
        Ok(created)
    }

    /// Start crawling a website
    ///
    /// # Errors
    ///
    /// The URL must be an absolute http(s) URL; nothing is sent otherwise.
    pub async fn add_website(&mut self, url: &str, limits: CrawlLimits) -> Result<KnowledgeSource> {
        let chatbot_id = self.sources.require_scope()?;
        let url = url.trim();
        let valid = url::Url::parse(url)
            .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            return Err(self.reject(MISSING_URL));
        }

        let created = run_action(
            &mut self.pending,
            &mut self.banner,
            Action::AddWebsite,
            self.source.create_website_source(&chatbot_id, url, limits),
        )
        .await?;

        if let Some(list) = self.sources.data_mut() {
            list.push(created.clone());
        }
        self.banner.success(WEBSITE_ADDED);
        Ok(created)
    }

    /// Delete a source; the local list changes only once the backend confirms
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.sources.require_scope()?;
        if id.trim().is_empty() {
            return Err(self.reject(MISSING_SOURCE));
        }

        run_action(
            &mut self.pending,
            &mut self.banner,
            Action::Delete(id.to_string()),
            self.source.delete_knowledge_source(id),
        )
        .await?;

        if let Some(list) = self.sources.data_mut() {
            list.retain(|source| source.id != id);
        }
        self.banner.success(SOURCE_DELETED);
        Ok(())
    }

    /// Full detail of one source
    pub async fn show(&self, id: &str) -> Result<KnowledgeSource> {
        self.sources.require_scope()?;
        self.source.get_knowledge_source(id).await
    }

    /// Search this chatbot's knowledge base
    pub async fn search(&self, query: &str, top_k: u32) -> Result<Vec<SearchResult>> {
        let chatbot_id = self.sources.require_scope()?;
        if query.trim().is_empty() {
            return Err(ConsoleError::Validation("Please enter a search query".to_string()).into());
        }
        self.source.search(&chatbot_id, query, top_k).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{ProcessingStatus, SourceType};
    use crate::backend::MockDataSource;
    use crate::test_utils::view_context;
    use crate::views::BannerKind;

    fn context(source: MockDataSource) -> ViewContext {
        view_context(Arc::new(source), Some("bot-1"))
    }

    fn source_named(id: &str, name: &str) -> KnowledgeSource {
        KnowledgeSource {
            id: id.to_string(),
            chatbot_id: "bot-1".to_string(),
            source_type: SourceType::Document,
            name: name.to_string(),
            content: None,
            processing_status: ProcessingStatus::Completed,
            processing_start_time: None,
            processing_end_time: None,
            processing_message: None,
        }
    }

    fn listing() -> MockDataSource {
        let mut source = MockDataSource::new();
        source
            .expect_list_knowledge_sources()
            .returning(|_| Ok(vec![source_named("1", "FAQ"), source_named("2", "Pricing")]));
        source
    }

    #[tokio::test]
    async fn test_blank_document_fields_are_rejected_locally() {
        let mut source = listing();
        source.expect_create_document_source().never();
        let mut view = KnowledgeView::mount(&context(source)).await;

        let err = view.add_document("FAQ", "  ").await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_FIELDS);
        assert_eq!(view.banner().current().unwrap().kind, BannerKind::Error);
    }

    #[tokio::test]
    async fn test_non_http_url_is_rejected_locally() {
        let mut source = listing();
        source.expect_create_website_source().never();
        let mut view = KnowledgeView::mount(&context(source)).await;

        for url in ["", "example.com", "ftp://example.com"] {
            let err = view.add_website(url, CrawlLimits::default()).await.unwrap_err();
            assert_eq!(err.to_string(), MISSING_URL);
        }
    }

    #[tokio::test]
    async fn test_website_sends_limits() {
        let mut source = listing();
        source
            .expect_create_website_source()
            .withf(|chatbot_id, url, limits| {
                chatbot_id == "bot-1"
                    && url == "https://example.com"
                    && *limits == CrawlLimits { max_pages: 5, max_depth: 1 }
            })
            .times(1)
            .returning(|_, url, _| {
                let mut created = source_named("3", url);
                created.source_type = SourceType::Website;
                created.processing_status = ProcessingStatus::Pending;
                Ok(created)
            });
        let mut view = KnowledgeView::mount(&context(source)).await;

        view.add_website(" https://example.com ", CrawlLimits { max_pages: 5, max_depth: 1 })
            .await
            .unwrap();
        assert_eq!(view.sources().data().unwrap().len(), 3);
        assert_eq!(view.banner().current().unwrap().message, WEBSITE_ADDED);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_entry() {
        let mut source = listing();
        source
            .expect_delete_knowledge_source()
            .returning(|_| Err(ConsoleError::Api("API request failed with status 500".to_string()).into()));
        let mut view = KnowledgeView::mount(&context(source)).await;

        assert!(view.delete("1").await.is_err());
        assert_eq!(view.sources().data().unwrap().len(), 2);
        assert_eq!(
            view.banner().current().unwrap().message,
            "API request failed with status 500"
        );
        assert!(view.pending().is_none());
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_only_that_entry() {
        let mut source = listing();
        source
            .expect_delete_knowledge_source()
            .withf(|id| id == "2")
            .returning(|_| Ok(()));
        let mut view = KnowledgeView::mount(&context(source)).await;

        view.delete("2").await.unwrap();
        let remaining: Vec<&str> = view
            .sources()
            .data()
            .unwrap()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(remaining, vec!["1"]);
    }

    #[tokio::test]
    async fn test_blank_delete_id_is_rejected_locally() {
        let mut source = listing();
        source.expect_delete_knowledge_source().never();
        let mut view = KnowledgeView::mount(&context(source)).await;

        let err = view.delete(" ").await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_SOURCE);
        assert_eq!(view.banner().current().unwrap().kind, BannerKind::Error);
        assert_eq!(view.sources().data().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn test_blank_search_is_rejected() {
        let mut source = listing();
        source.expect_search().never();
        let view = KnowledgeView::mount(&context(source)).await;
        assert!(view.search(" ", 5).await.is_err());
    }
}
