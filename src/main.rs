//! botdesk - chatbot administration console
//!
#![doc = "botdesk - chatbot administration console"]
#![doc = "Main entry point for the botdesk CLI."]

use anyhow::Result;
use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use botdesk::api::types::CrawlLimits;
use botdesk::cli::{ChatbotCommand, Cli, Commands, PromptCommand, SourcesCommand, WidgetCommand};
use botdesk::commands;
use botdesk::config::Config;
use botdesk::error::{user_message, ConsoleError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose, cli.json_logs);

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), user_message(&err));
        if matches!(
            err.downcast_ref::<ConsoleError>(),
            Some(ConsoleError::NoSession)
        ) {
            eprintln!("Sign in with `botdesk login` first.");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;
    tracing::debug!("Using {} data source", config.backend.mode);

    match cli.command {
        Commands::Login {
            email,
            password,
            demo,
            chatbot_id,
        } => {
            tracing::info!("Starting login");
            commands::auth::login(&config, email, password, demo, chatbot_id).await
        }
        Commands::Logout => commands::auth::logout(&config).await,
        Commands::Whoami => commands::auth::whoami(&config).await,
        Commands::Stats { json } => commands::stats::show_stats(&config, json).await,
        Commands::Chatbot { command } => match command {
            ChatbotCommand::Show { json } => commands::chatbot::show_chatbot(&config, json).await,
            ChatbotCommand::Prompt {
                command: PromptCommand::Set { text, file },
            } => commands::chatbot::set_prompt(&config, text, file).await,
            ChatbotCommand::Widget {
                command: WidgetCommand::Set(args),
            } => commands::chatbot::set_widget(&config, args).await,
            ChatbotCommand::Embed { position } => {
                commands::chatbot::show_embed(&config, position).await
            }
        },
        Commands::Sources { command } => match command {
            SourcesCommand::List { json } => commands::knowledge::list_sources(&config, json).await,
            SourcesCommand::Show { id } => commands::knowledge::show_source(&config, &id).await,
            SourcesCommand::AddDocument {
                name,
                content,
                file,
            } => commands::knowledge::add_document(&config, &name, content, file).await,
            SourcesCommand::AddWebsite {
                url,
                max_pages,
                max_depth,
            } => {
                let limits = CrawlLimits {
                    max_pages,
                    max_depth,
                };
                commands::knowledge::add_website(&config, &url, limits).await
            }
            SourcesCommand::Delete { id } => commands::knowledge::delete_source(&config, &id).await,
        },
        Commands::Search { query, top_k } => {
            commands::knowledge::search(&config, &query, top_k).await
        }
        Commands::Test { message } => {
            tracing::info!("Starting test console");
            commands::test_chat::run_test(&config, message).await
        }
        Commands::Serve { bind } => {
            tracing::info!("Starting HTTP console");
            commands::serve::run_serve(config, bind).await
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing(verbose: bool, json_logs: bool) {
    let default = if verbose { "botdesk=debug" } else { "botdesk=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
