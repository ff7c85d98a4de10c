/*!
Command handlers for the CLI

Each protected command follows the same path: build the session provider,
require a stored session, build the configured data source, mount the view
the command needs and render it.

- `auth`: login, logout, whoami
- `stats`: usage dashboard
- `chatbot`: system prompt, widget configuration, embed snippet
- `knowledge`: knowledge sources and search
- `test_chat`: test console (one-shot or interactive)
- `serve`: guarded HTTP console
*/

use crate::backend::create_data_source;
use crate::config::Config;
use crate::error::{ConsoleError, Result};
use crate::guard::require_stored_session;
use crate::session::create_session_provider;
use crate::views::{BannerKind, BannerSlot, Resource, ViewContext, ViewError};
use colored::Colorize;
use std::time::Duration;

pub mod chatbot;
pub mod knowledge;
pub mod serve;
pub mod stats;
pub mod test_chat;

/// Wire the view context for a protected command
///
/// # Errors
///
/// Returns [`ConsoleError::NoSession`] when nobody is signed in.
pub async fn open_console(config: &Config) -> Result<ViewContext> {
    let session = create_session_provider(config)?;
    require_stored_session(session.as_ref()).await?;
    let source = create_data_source(config, session.clone())?;

    Ok(ViewContext::new(
        session,
        source,
        Duration::from_secs(config.console.banner_seconds),
    ))
}

/// Data of a mounted resource, or the reason it failed to load
pub(crate) fn ready<T: Send + 'static>(resource: &Resource<T>) -> Result<&T> {
    match resource.data() {
        Some(data) => Ok(data),
        None => {
            let reason = resource
                .error()
                .cloned()
                .unwrap_or_else(|| ViewError::Load("Request cancelled".to_string()));
            Err(ConsoleError::from(reason).into())
        }
    }
}

/// Print the banner a mutation left behind
pub(crate) fn print_banner(banner: &BannerSlot) {
    if let Some(banner) = banner.current() {
        match banner.kind {
            BannerKind::Success => println!("{}", banner.message.green()),
            BannerKind::Error => eprintln!("{}", banner.message.red()),
        }
    }
}

/// Read inline text or a file, whichever was given
pub(crate) fn text_or_file(
    text: Option<String>,
    file: Option<std::path::PathBuf>,
    what: &str,
) -> Result<String> {
    match (text, file) {
        (Some(text), _) => Ok(text),
        (None, Some(path)) => Ok(std::fs::read_to_string(&path)?),
        (None, None) => Err(ConsoleError::Validation(format!(
            "Provide the {} inline or with --file",
            what
        ))
        .into()),
    }
}

/// Session commands
pub mod auth {
    use super::*;
    use crate::backend::demo::DEMO_CHATBOT_ID;
    use crate::session::{
        GoTrueSessionProvider, Identity, Session, SessionStore, CHATBOT_ID_FIELD,
    };

    const DEMO_EMAIL: &str = "demo@botdesk.local";

    /// Sign in, or store an offline demo session
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration
    /// * `email` - Account email (optional for demo sessions)
    /// * `password` - Account password
    /// * `demo` - Store a demo session without contacting the provider
    /// * `chatbot_id` - Chatbot the demo session is scoped to
    pub async fn login(
        config: &Config,
        email: Option<String>,
        password: Option<String>,
        demo: bool,
        chatbot_id: Option<String>,
    ) -> Result<()> {
        let store = SessionStore::file(config.session_path());

        if demo {
            let chatbot_id = chatbot_id.unwrap_or_else(|| DEMO_CHATBOT_ID.to_string());
            let email = email.unwrap_or_else(|| DEMO_EMAIL.to_string());
            let identity = Identity::new(uuid::Uuid::new_v4().to_string(), &email)
                .with_metadata(CHATBOT_ID_FIELD, chatbot_id.as_str());
            let session = Session::new(format!("demo-{}", uuid::Uuid::new_v4()))
                .with_identity(identity);
            store.save(&session)?;

            tracing::info!("Stored demo session for chatbot {}", chatbot_id);
            println!(
                "{} demo session for chatbot {}",
                "Stored".green(),
                chatbot_id.cyan()
            );
            return Ok(());
        }

        let Some(auth_url) = config.auth.url.as_deref() else {
            return Err(ConsoleError::Config(
                "auth.url is not configured; use --demo for an offline session".to_string(),
            )
            .into());
        };
        let email = email
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| ConsoleError::Validation("Email is required".to_string()))?;
        let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
            ConsoleError::Validation(
                "Password is required (--password or BOTDESK_PASSWORD)".to_string(),
            )
        })?;

        let provider = GoTrueSessionProvider::new(
            auth_url,
            &config.auth.public_key,
            store,
            Duration::from_secs(config.backend.timeout_seconds),
        )?;
        let session = provider.login(&email, &password).await?;

        println!("{} as {}", "Signed in".green(), email.cyan());
        if session
            .identity
            .as_ref()
            .and_then(Identity::chatbot_id)
            .is_none()
        {
            println!(
                "{}",
                "No chatbot is assigned to this account yet.".yellow()
            );
        }
        Ok(())
    }

    /// Sign out and forget the stored session
    pub async fn logout(config: &Config) -> Result<()> {
        let provider = create_session_provider(config)?;
        provider.sign_out().await?;
        println!("Signed out");
        Ok(())
    }

    /// Print the signed-in identity
    ///
    /// The backend credential itself is never printed.
    pub async fn whoami(config: &Config) -> Result<()> {
        let provider = create_session_provider(config)?;
        let session = require_stored_session(provider.as_ref()).await?;
        let identity = provider.get_identity().await?.ok_or(ConsoleError::NoSession)?;

        println!("Email:       {}", identity.email);
        println!("User ID:     {}", identity.id);
        println!(
            "Chatbot:     {}",
            identity
                .chatbot_id()
                .unwrap_or_else(|| "(none assigned)".to_string())
        );
        println!(
            "API key:     {}",
            if identity.api_key().is_some() {
                "assigned"
            } else {
                "not assigned (using configured fallback)"
            }
        );
        if let Some(expires_at) = session.expires_at {
            println!("Expires:     {}", expires_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        println!("Backend:     {} ({})", config.backend.base_url, config.backend.mode);
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::session::{LocalSessionProvider, SessionProvider};
        use crate::test_utils::{temp_dir, test_config};

        #[tokio::test]
        async fn test_demo_login_stores_scoped_session() {
            let dir = temp_dir();
            let config = test_config(&dir);
            login(&config, None, None, true, Some("bot-7".to_string()))
                .await
                .unwrap();

            let provider = LocalSessionProvider::new(SessionStore::file(config.session_path()));
            let identity = provider.get_identity().await.unwrap().unwrap();
            assert_eq!(identity.chatbot_id().as_deref(), Some("bot-7"));
            assert_eq!(identity.email, DEMO_EMAIL);

            logout(&config).await.unwrap();
            assert!(provider.session().await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_password_login_requires_auth_url() {
            let dir = temp_dir();
            let config = test_config(&dir);
            let err = login(
                &config,
                Some("a@b.c".to_string()),
                Some("pw".to_string()),
                false,
                None,
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("auth.url"));
        }

        #[tokio::test]
        async fn test_whoami_without_session_fails() {
            let dir = temp_dir();
            let err = whoami(&test_config(&dir)).await.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<ConsoleError>(),
                Some(ConsoleError::NoSession)
            ));
        }
    }
}
