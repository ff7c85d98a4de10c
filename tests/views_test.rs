//! Console view integration tests
//!
//! Runs the views end to end against the demo data source, sharing one
//! backend between mounts the way a running console does.

use std::sync::Arc;
use std::time::Duration;

use botdesk::api::types::{CrawlLimits, ProcessingStatus, WidgetConfig};
use botdesk::backend::{DataSource, DemoBackend};
use botdesk::session::{Identity, LocalSessionProvider, Session, CHATBOT_ID_FIELD};
use botdesk::views::test_console::Role;
use botdesk::views::{
    BannerKind, ChatbotConfigView, KnowledgeView, StatsView, Status, TestConsoleView,
    ViewContext, ViewError,
};

fn context(source: Arc<dyn DataSource>) -> ViewContext {
    let identity =
        Identity::new("u1", "owner@example.com").with_metadata(CHATBOT_ID_FIELD, "bot-1");
    let session = LocalSessionProvider::in_memory(Some(Session::new("tok").with_identity(identity)));
    ViewContext::new(Arc::new(session), source, Duration::from_secs(5))
}

#[tokio::test]
async fn test_widget_color_survives_remount() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let mut view = ChatbotConfigView::mount(&ctx).await;
    let config = WidgetConfig {
        primary_color: "#112233".to_string(),
        ..view.settings().data().unwrap().widget.clone()
    };
    view.save_widget_config(config).await.unwrap();
    assert_eq!(view.banner().current().unwrap().kind, BannerKind::Success);
    view.unmount();

    let view = ChatbotConfigView::mount(&ctx).await;
    assert_eq!(view.settings().data().unwrap().widget.primary_color, "#112233");
}

#[tokio::test]
async fn test_system_prompt_round_trip() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let mut view = ChatbotConfigView::mount(&ctx).await;
    view.save_system_prompt("Answer in one sentence.").await.unwrap();
    view.refetch().await;
    assert_eq!(
        view.settings().data().unwrap().system_prompt,
        "Answer in one sentence."
    );
}

#[tokio::test]
async fn test_delete_leaves_remaining_sources() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let mut view = KnowledgeView::mount(&ctx).await;
    assert_eq!(view.sources().data().unwrap().len(), 2);

    view.delete("mock-1").await.unwrap();
    let ids: Vec<&str> = view
        .sources()
        .data()
        .unwrap()
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(ids, vec!["mock-2"]);

    view.refetch().await;
    assert_eq!(view.sources().data().unwrap().len(), 1);
}

#[tokio::test]
async fn test_added_sources_start_pending() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let mut view = KnowledgeView::mount(&ctx).await;
    let document = view
        .add_document("Returns", "Returns are accepted within 30 days.")
        .await
        .unwrap();
    assert_eq!(document.processing_status, ProcessingStatus::Pending);

    let website = view
        .add_website("  https://example.com/docs ", CrawlLimits::default())
        .await
        .unwrap();
    assert_eq!(website.name, "https://example.com/docs");
    assert_eq!(view.sources().data().unwrap().len(), 4);
}

#[tokio::test]
async fn test_website_requires_http_url() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let mut view = KnowledgeView::mount(&ctx).await;
    assert!(view
        .add_website("not a url", CrawlLimits::default())
        .await
        .is_err());
    assert_eq!(view.sources().data().unwrap().len(), 2);
    assert_eq!(view.banner().current().unwrap().kind, BannerKind::Error);
}

#[tokio::test]
async fn test_search_finds_seeded_faq() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let view = KnowledgeView::mount(&ctx).await;
    let results = view.search("business hours", 3).await.unwrap();
    assert!(!results.is_empty());
    assert!(results[0].content.contains("Monday"));
}

#[tokio::test]
async fn test_console_answers_from_knowledge() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let mut view = TestConsoleView::mount(&ctx).await;
    assert_eq!(view.transcript().len(), 1);
    assert_eq!(view.transcript()[0].role, Role::Assistant);

    let reply = view
        .send("Do you offer refunds?")
        .await
        .unwrap()
        .expect("reply");
    assert!(reply.content.contains("30 days"));
    assert!(!reply.sources.is_empty());
    assert_eq!(view.transcript().len(), 3);
}

#[tokio::test]
async fn test_stats_refetch_is_stable() {
    let ctx = context(Arc::new(DemoBackend::new()));

    let mut view = StatsView::mount(&ctx).await;
    let first = view.stats().data().cloned().unwrap();
    view.refetch().await;
    view.refetch().await;
    assert_eq!(view.stats().data(), Some(&first));
    assert_eq!(view.stats().status(), Status::Ready);
}

#[tokio::test]
async fn test_signed_out_views_report_no_session() {
    let ctx = ViewContext::new(
        Arc::new(LocalSessionProvider::signed_out()),
        Arc::new(DemoBackend::new()),
        Duration::from_secs(5),
    );

    let view = KnowledgeView::mount(&ctx).await;
    assert_eq!(view.sources().status(), Status::Error);
    assert_eq!(view.sources().error(), Some(&ViewError::NoSession));
    assert!(view.sources().data().is_none());
}
