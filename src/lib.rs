//! botdesk - chatbot administration console library
//!
//! Core functionality for administering a hosted retrieval-augmented
//! chatbot: session handling, the backend API client, demo and fallback
//! data sources, the console views, and configuration.
//!
//! # Architecture
//!
//! - `session`: Authentication session provider and local session store
//! - `api`: Backend API client and wire types
//! - `backend`: Data source abstraction (live, demo, fallback)
//! - `views`: Session-scoped console views with load, save and banner state
//! - `guard`: Route guard for the HTTP console
//! - `embed`: Embed snippet rendering
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use botdesk::cli::Cli;
//! use botdesk::Config;
//!
//! fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse_args();
//!     let config = Config::load("config/config.yaml", &cli)?;
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod guard;
pub mod session;
pub mod views;

// Re-export commonly used types
pub use api::ApiClient;
pub use backend::{create_data_source, DataSource};
pub use config::Config;
pub use error::{ConsoleError, Result};
pub use session::{create_session_provider, SessionProvider};

#[cfg(test)]
pub mod test_utils;
