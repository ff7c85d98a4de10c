//! Knowledge source commands

use super::{open_console, print_banner, ready, text_or_file};
use crate::api::types::{CrawlLimits, KnowledgeSource, ProcessingStatus, SearchResult};
use crate::config::Config;
use crate::error::{ConsoleError, Result};
use crate::views::KnowledgeView;
use colored::{ColoredString, Colorize};
use prettytable::{row, Table};
use std::path::PathBuf;

fn colored_status(status: ProcessingStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        ProcessingStatus::Completed => text.green(),
        ProcessingStatus::Failed => text.red(),
        ProcessingStatus::Pending | ProcessingStatus::Processing => text.yellow(),
    }
}

/// Shorten long text to `max` characters for table cells
fn truncate(text: &str, max: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        flat
    } else {
        let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// List knowledge sources
pub async fn list_sources(config: &Config, json: bool) -> Result<()> {
    let ctx = open_console(config).await?;
    let view = KnowledgeView::mount(&ctx).await;
    let sources = ready(view.sources())?;

    if json {
        let json = serde_json::to_string_pretty(sources).map_err(ConsoleError::Serialization)?;
        println!("{}", json);
        return Ok(());
    }

    if sources.is_empty() {
        println!("No knowledge sources yet. Add one with `botdesk sources add-document` or `add-website`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["ID", "Type", "Name", "Status", "Started", "Finished"]);
    for source in sources {
        table.add_row(row![
            source.id,
            source.source_type,
            truncate(&source.name, 48),
            colored_status(source.processing_status),
            source.processing_start_time.as_deref().unwrap_or("-"),
            source.processing_end_time.as_deref().unwrap_or("-")
        ]);
    }

    println!("\nKnowledge sources ({}):\n", sources.len());
    table.printstd();
    println!();
    Ok(())
}

fn print_source(source: &KnowledgeSource) {
    println!("\n{}\n", source.name.bold());
    println!("ID:          {}", source.id);
    println!("Type:        {}", source.source_type);
    println!("Status:      {}", colored_status(source.processing_status));
    if let Some(started) = &source.processing_start_time {
        println!("Started:     {}", started);
    }
    if let Some(finished) = &source.processing_end_time {
        println!("Finished:    {}", finished);
    }
    if let Some(message) = &source.processing_message {
        println!("Message:     {}", message);
    }
    if let Some(content) = &source.content {
        println!("\n{}\n{}", "Content".bold(), content);
    }
    println!();
}

/// Show one knowledge source in full
pub async fn show_source(config: &Config, id: &str) -> Result<()> {
    let ctx = open_console(config).await?;
    let view = KnowledgeView::mount(&ctx).await;
    ready(view.sources())?;

    let source = view.show(id).await?;
    print_source(&source);
    Ok(())
}

/// Add a pasted document
pub async fn add_document(
    config: &Config,
    name: &str,
    content: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let content = text_or_file(content, file, "document content")?;
    let ctx = open_console(config).await?;
    let mut view = KnowledgeView::mount(&ctx).await;
    ready(view.sources())?;

    let created = view.add_document(name, &content).await?;
    print_banner(view.banner());
    println!("ID: {}", created.id);
    Ok(())
}

/// Start crawling a website
pub async fn add_website(config: &Config, url: &str, limits: CrawlLimits) -> Result<()> {
    let ctx = open_console(config).await?;
    let mut view = KnowledgeView::mount(&ctx).await;
    ready(view.sources())?;

    let created = view.add_website(url, limits).await?;
    print_banner(view.banner());
    println!("ID: {}", created.id);
    Ok(())
}

/// Delete a knowledge source
pub async fn delete_source(config: &Config, id: &str) -> Result<()> {
    let ctx = open_console(config).await?;
    let mut view = KnowledgeView::mount(&ctx).await;
    ready(view.sources())?;

    view.delete(id).await?;
    print_banner(view.banner());
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No matching chunks.");
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["Score", "Source", "Content"]);
    for result in results {
        let source = if result.metadata.title.is_empty() {
            &result.metadata.source
        } else {
            &result.metadata.title
        };
        table.add_row(row![
            format!("{:.3}", result.similarity),
            truncate(source, 32),
            truncate(&result.content, 80)
        ]);
    }
    table.printstd();
}

/// Search the knowledge base
pub async fn search(config: &Config, query: &str, top_k: u32) -> Result<()> {
    let ctx = open_console(config).await?;
    let view = KnowledgeView::mount(&ctx).await;
    ready(view.sources())?;

    let results = view.search(query, top_k).await?;
    print_results(&results);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_flattens_and_cuts() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("line one\nline two", 40), "line one line two");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
