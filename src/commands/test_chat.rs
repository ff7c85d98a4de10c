//! Test console command
//!
//! Sends a single message with `--message`, otherwise runs a readline loop
//! until `exit`, `quit` or end of input.

use super::{open_console, ready};
use crate::config::Config;
use crate::error::{ConsoleError, Result};
use crate::views::test_console::{ChatMessage, Role};
use crate::views::{BannerKind, TestConsoleView};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

fn print_message(message: &ChatMessage) {
    match message.role {
        Role::User => println!("{} {}", "you>".green().bold(), message.content),
        Role::Assistant => {
            println!("{} {}", "bot>".cyan().bold(), message.content);
            for source in &message.sources {
                let label = if source.title.is_empty() {
                    &source.source
                } else {
                    &source.title
                };
                println!("      {} {}", "source:".dimmed(), label.dimmed());
            }
        }
    }
}

/// Run the test console
pub async fn run_test(config: &Config, message: Option<String>) -> Result<()> {
    let ctx = open_console(config).await?;
    let mut view = TestConsoleView::mount(&ctx).await;
    let chatbot = ready(view.chatbot())?;
    tracing::info!("Test console for chatbot {}", chatbot.id);
    let name = chatbot.name.clone();

    if let Some(message) = message {
        let Some(reply) = view.send(&message).await? else {
            return Err(ConsoleError::Validation("Message is empty".to_string()).into());
        };
        print_message(&reply);
        if let Some(banner) = view.banner().current() {
            if banner.kind == BannerKind::Error {
                return Err(ConsoleError::Api(banner.message.clone()).into());
            }
        }
        return Ok(());
    }

    println!(
        "\n{} {}\n",
        name.bold(),
        "test console. Type 'exit' to quit.".dimmed()
    );
    for entry in view.transcript() {
        print_message(entry);
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let line = line.trim();
                if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                    break;
                }
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if let Some(reply) = view.send(line).await? {
                    print_message(&reply);
                }
                if let Some(banner) = view.banner().current() {
                    if banner.kind == BannerKind::Error {
                        eprintln!("{}", banner.message.red());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Use 'exit' or Ctrl-D to leave");
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(ConsoleError::Readline(e).into()),
        }
    }

    view.unmount();
    Ok(())
}
