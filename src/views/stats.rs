//! Stats dashboard view

use super::{Resource, ViewContext};
use crate::api::types::ChatbotStats;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

/// One bar of the daily usage chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageBar {
    pub date: String,
    pub count: u64,
    /// Bar length scaled to the busiest day
    pub length: usize,
}

/// Usage totals, daily usage and top questions
pub struct StatsView {
    stats: Resource<ChatbotStats>,
    cancel: CancellationToken,
}

impl StatsView {
    /// Mount the view and load statistics
    pub async fn mount(ctx: &ViewContext) -> Self {
        let cancel = ctx.cancel.child_token();
        let source = ctx.source.clone();
        let mut stats = Resource::new(ctx.session.clone(), cancel.clone(), move |chatbot_id| {
            let source = source.clone();
            async move { source.get_stats(&chatbot_id).await }.boxed()
        });
        stats.load().await;

        Self { stats, cancel }
    }

    pub fn stats(&self) -> &Resource<ChatbotStats> {
        &self.stats
    }

    pub async fn refetch(&mut self) {
        self.stats.refetch().await;
    }

    /// Cancel any in-flight fetch
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    /// Daily usage scaled so the busiest day spans `width` cells
    pub fn usage_bars(&self, width: usize) -> Vec<UsageBar> {
        let Some(stats) = self.stats.data() else {
            return Vec::new();
        };
        let peak = stats
            .daily_usage
            .iter()
            .map(|day| day.count)
            .max()
            .unwrap_or(0);

        stats
            .daily_usage
            .iter()
            .map(|day| UsageBar {
                date: day.date.clone(),
                count: day.count,
                length: if peak == 0 {
                    0
                } else {
                    ((day.count as f64 / peak as f64) * width as f64).round() as usize
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DemoBackend, MockDataSource};
    use crate::error::ConsoleError;
    use crate::test_utils::view_context;
    use crate::views::{Status, ViewError};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_mount_loads_demo_stats() {
        let view = StatsView::mount(&view_context(Arc::new(DemoBackend::new()), Some("bot-1"))).await;
        assert_eq!(view.stats().status(), Status::Ready);
        let stats = view.stats().data().unwrap();
        assert_eq!(stats.total_conversations, 1248);
        assert_eq!(stats.top_questions[0].question, "How do I reset my password?");

        let bars = view.usage_bars(20);
        assert_eq!(bars.len(), 7);
        let thursday = bars.iter().find(|bar| bar.date == "Thu").unwrap();
        assert_eq!(thursday.length, 20);
    }

    #[tokio::test]
    async fn test_missing_chatbot_never_fetches() {
        let mut source = MockDataSource::new();
        source.expect_get_stats().never();
        let view = StatsView::mount(&view_context(Arc::new(source), None)).await;
        assert_eq!(view.stats().error(), Some(&ViewError::NoChatbotAssigned));
        assert!(view.usage_bars(10).is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_is_load_error() {
        let mut source = MockDataSource::new();
        source
            .expect_get_stats()
            .withf(|id| id == "bot-1")
            .times(1)
            .returning(|_| Err(ConsoleError::Api("db down".to_string()).into()));
        let view = StatsView::mount(&view_context(Arc::new(source), Some("bot-1"))).await;
        assert_eq!(view.stats().status(), Status::Error);
        assert_eq!(view.stats().error(), Some(&ViewError::Load("db down".to_string())));
    }
}
