//! Chatbot configuration commands

use super::{open_console, print_banner, ready, text_or_file};
use crate::api::types::{WidgetConfig, WidgetPosition};
use crate::cli::WidgetArgs;
use crate::config::Config;
use crate::embed::embed_snippet;
use crate::error::{ConsoleError, Result};
use crate::views::ChatbotConfigView;
use colored::Colorize;
use std::path::PathBuf;

/// Print the chatbot, its widget configuration and system prompt
pub async fn show_chatbot(config: &Config, json: bool) -> Result<()> {
    let ctx = open_console(config).await?;
    let view = ChatbotConfigView::mount(&ctx).await;
    let settings = ready(view.settings())?;

    if json {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "chatbot": settings.chatbot,
            "widget_config": settings.widget,
            "system_prompt": settings.system_prompt,
        }))
        .map_err(ConsoleError::Serialization)?;
        println!("{}", json);
        return Ok(());
    }

    let widget = &settings.widget;
    println!("\n{} ({})\n", settings.chatbot.name.bold(), settings.chatbot.id);
    println!("Status:           {}", settings.chatbot.status);
    println!("\n{}", "Widget".bold());
    println!("  Name:           {}", widget.name);
    println!("  Logo URL:       {}", widget.logo_url);
    println!("  Primary color:  {}", widget.primary_color);
    println!("  Bubble size:    {:?}", widget.bubble_size);
    println!("  Position:       {}", widget.position);
    println!("  Theme:          {:?}", widget.theme);
    println!("  Greeting:       {}", widget.greeting);
    println!("\n{}", "Model".bold());
    println!("  Model:          {}", widget.model);
    println!("  Temperature:    {:.2}", widget.temperature);
    println!("  Retrieved docs: {}", widget.top_k);
    println!(
        "  Query expansion: {}",
        if widget.use_query_expansion { "on" } else { "off" }
    );
    println!("\n{}", "System prompt".bold());
    if settings.system_prompt.is_empty() {
        println!("  {}", "(none)".dimmed());
    } else {
        for line in settings.system_prompt.lines() {
            println!("  {}", line);
        }
    }
    println!();
    Ok(())
}

/// Replace the system prompt
pub async fn set_prompt(config: &Config, text: Option<String>, file: Option<PathBuf>) -> Result<()> {
    let prompt = text_or_file(text, file, "prompt")?;
    let ctx = open_console(config).await?;
    let mut view = ChatbotConfigView::mount(&ctx).await;
    ready(view.settings())?;

    view.save_system_prompt(&prompt).await?;
    print_banner(view.banner());
    Ok(())
}

/// Overlay CLI overrides on the current widget configuration
pub fn apply_widget_args(config: &mut WidgetConfig, args: WidgetArgs) {
    if let Some(name) = args.name {
        config.name = name;
    }
    if let Some(logo_url) = args.logo_url {
        config.logo_url = logo_url;
    }
    if let Some(primary_color) = args.primary_color {
        config.primary_color = primary_color;
    }
    if let Some(bubble_size) = args.bubble_size {
        config.bubble_size = bubble_size;
    }
    if let Some(position) = args.position {
        config.position = position;
    }
    if let Some(greeting) = args.greeting {
        config.greeting = greeting;
    }
    if let Some(theme) = args.theme {
        config.theme = theme;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(top_k) = args.top_k {
        config.top_k = top_k;
    }
    if let Some(query_expansion) = args.query_expansion {
        config.use_query_expansion = query_expansion;
    }
}

/// Update widget fields and save the configuration wholesale
pub async fn set_widget(config: &Config, args: WidgetArgs) -> Result<()> {
    let ctx = open_console(config).await?;
    let mut view = ChatbotConfigView::mount(&ctx).await;
    let mut widget = ready(view.settings())?.widget.clone();

    apply_widget_args(&mut widget, args);
    view.save_widget_config(widget).await?;
    print_banner(view.banner());
    Ok(())
}

/// Print the embed snippet
pub async fn show_embed(config: &Config, position: Option<WidgetPosition>) -> Result<()> {
    let ctx = open_console(config).await?;
    let view = ChatbotConfigView::mount(&ctx).await;
    ready(view.settings())?;

    let snippet = match (position, view.settings().scope()) {
        (Some(position), Some(chatbot_id)) => embed_snippet(chatbot_id, position, &config.embed),
        _ => view
            .embed_snippet(&config.embed)
            .ok_or(ConsoleError::NoChatbotAssigned)?,
    };

    eprintln!(
        "{}",
        "Paste this snippet before the closing </body> tag of your site:".dimmed()
    );
    println!("{}", snippet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{BubbleSize, Theme};

    #[test]
    fn test_apply_widget_args_overrides_only_given_fields() {
        let mut widget = WidgetConfig {
            name: "Helper".to_string(),
            ..WidgetConfig::default()
        };
        apply_widget_args(
            &mut widget,
            WidgetArgs {
                primary_color: Some("#112233".to_string()),
                bubble_size: Some(BubbleSize::Large),
                theme: Some(Theme::Dark),
                query_expansion: Some(true),
                ..WidgetArgs::default()
            },
        );

        assert_eq!(widget.name, "Helper");
        assert_eq!(widget.primary_color, "#112233");
        assert_eq!(widget.bubble_size, BubbleSize::Large);
        assert_eq!(widget.theme, Theme::Dark);
        assert!(widget.use_query_expansion);
        assert_eq!(widget.top_k, 3);
    }
}
