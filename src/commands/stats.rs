//! Usage statistics command

use super::{open_console, ready};
use crate::api::types::ChatbotStats;
use crate::config::Config;
use crate::error::{ConsoleError, Result};
use crate::views::stats::UsageBar;
use crate::views::StatsView;
use colored::Colorize;
use prettytable::{row, Table};

const BAR_WIDTH: usize = 40;

/// Show usage statistics for the signed-in user's chatbot
pub async fn show_stats(config: &Config, json: bool) -> Result<()> {
    let ctx = open_console(config).await?;
    let view = StatsView::mount(&ctx).await;
    let stats = ready(view.stats())?;

    if json {
        let json = serde_json::to_string_pretty(stats).map_err(ConsoleError::Serialization)?;
        println!("{}", json);
        return Ok(());
    }

    print_totals(stats);
    print_usage(&view.usage_bars(BAR_WIDTH));
    print_top_questions(stats);
    Ok(())
}

fn print_totals(stats: &ChatbotStats) {
    println!("\n{}\n", "Chatbot Usage".bold());
    println!("Total conversations:  {}", stats.total_conversations);
    println!("Total messages:       {}", stats.total_messages);
    println!("Avg response time:    {:.1}s", stats.avg_response_time);
}

fn print_usage(bars: &[UsageBar]) {
    if bars.is_empty() {
        return;
    }
    println!("\n{}\n", "Daily usage".bold());
    for bar in bars {
        println!(
            "{:<6} {} {}",
            bar.date,
            "█".repeat(bar.length).cyan(),
            bar.count
        );
    }
}

fn print_top_questions(stats: &ChatbotStats) {
    if stats.top_questions.is_empty() {
        return;
    }

    let mut table = Table::new();
    table.add_row(row!["#", "Question", "Count"]);
    for (rank, question) in stats.top_questions.iter().enumerate() {
        table.add_row(row![rank + 1, question.question, question.count]);
    }

    println!("\n{}\n", "Top questions".bold());
    table.printstd();
    println!();
}
