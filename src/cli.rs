//! Command-line interface definition for botdesk
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for session management, chatbot configuration,
//! knowledge sources, the test console, statistics, and the guarded
//! HTTP console.

use crate::api::types::{BubbleSize, Theme, WidgetPosition};
use crate::config::BackendMode;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// botdesk - chatbot administration console
///
/// Configure a hosted retrieval-augmented chatbot, manage its knowledge
/// sources, try it out, and read its usage statistics.
#[derive(Parser, Debug, Clone)]
#[command(name = "botdesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Override the data source (live, demo, fallback)
    #[arg(long, value_enum)]
    pub mode: Option<BackendMode>,

    /// Override the session file location
    #[arg(long)]
    pub session_file: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for botdesk
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sign in and store the session locally
    Login {
        /// Account email
        #[arg(short, long)]
        email: Option<String>,

        /// Account password
        #[arg(short, long, env = "BOTDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Store an offline demo session instead of contacting the provider
        #[arg(long)]
        demo: bool,

        /// Chatbot identifier for the demo session
        #[arg(long, requires = "demo")]
        chatbot_id: Option<String>,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// Show usage statistics for your chatbot
    Stats {
        /// Print JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// Configure your chatbot
    Chatbot {
        /// Chatbot subcommand
        #[command(subcommand)]
        command: ChatbotCommand,
    },

    /// Manage knowledge sources
    Sources {
        /// Knowledge source subcommand
        #[command(subcommand)]
        command: SourcesCommand,
    },

    /// Search the knowledge base
    Search {
        /// Search query
        query: String,

        /// Number of chunks to return
        #[arg(short = 'k', long, default_value_t = 5)]
        top_k: u32,
    },

    /// Chat with your chatbot in a test console
    Test {
        /// Send a single message and exit
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Run the guarded HTTP console
    Serve {
        /// Listen address (overrides server.bind)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

/// Chatbot configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ChatbotCommand {
    /// Show chatbot, widget configuration and system prompt
    Show {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Manage the system prompt
    Prompt {
        /// Prompt subcommand
        #[command(subcommand)]
        command: PromptCommand,
    },

    /// Manage the widget configuration
    Widget {
        /// Widget subcommand
        #[command(subcommand)]
        command: WidgetCommand,
    },

    /// Print the embed snippet for your website
    Embed {
        /// Widget position (defaults to the configured position)
        #[arg(short, long, value_enum)]
        position: Option<WidgetPosition>,
    },
}

/// System prompt subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PromptCommand {
    /// Replace the system prompt
    Set {
        /// New prompt text
        #[arg(short, long, conflicts_with = "file")]
        text: Option<String>,

        /// Read the prompt from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Widget configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum WidgetCommand {
    /// Update widget fields; unspecified fields keep their current value
    Set(WidgetArgs),
}

/// Widget field overrides
#[derive(clap::Args, Debug, Clone, Default)]
pub struct WidgetArgs {
    /// Display name
    #[arg(long)]
    pub name: Option<String>,

    /// Logo URL
    #[arg(long)]
    pub logo_url: Option<String>,

    /// Primary color (#rgb or #rrggbb)
    #[arg(long)]
    pub primary_color: Option<String>,

    /// Bubble size
    #[arg(long, value_enum)]
    pub bubble_size: Option<BubbleSize>,

    /// Widget position
    #[arg(long, value_enum)]
    pub position: Option<WidgetPosition>,

    /// Greeting text
    #[arg(long)]
    pub greeting: Option<String>,

    /// Color theme
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Retrieved document count
    #[arg(long)]
    pub top_k: Option<u32>,

    /// Enable or disable query expansion
    #[arg(long)]
    pub query_expansion: Option<bool>,
}

/// Knowledge source subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SourcesCommand {
    /// List knowledge sources
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one knowledge source
    Show {
        /// Knowledge source identifier
        id: String,
    },

    /// Add a pasted document
    AddDocument {
        /// Document name
        #[arg(short, long)]
        name: String,

        /// Document content
        #[arg(short, long, conflicts_with = "file")]
        content: Option<String>,

        /// Read the content from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Crawl a website
    AddWebsite {
        /// Start URL
        #[arg(short, long)]
        url: String,

        /// Maximum pages to crawl
        #[arg(long, default_value_t = 10)]
        max_pages: u32,

        /// Maximum link depth
        #[arg(long, default_value_t = 2)]
        max_depth: u32,
    },

    /// Delete a knowledge source
    Delete {
        /// Knowledge source identifier
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
