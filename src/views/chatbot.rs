//! Chatbot configuration view
//!
//! Shows the chatbot, its widget configuration and system prompt, saves
//! either of the latter two, and renders the embed snippet for the current
//! widget position.

use super::{run_action, Action, BannerSlot, Resource, ViewContext};
use crate::api::types::{Chatbot, WidgetConfig};
use crate::backend::DataSource;
use crate::config::EmbedConfig;
use crate::embed::embed_snippet;
use crate::error::{ConsoleError, Result};
use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Banner raised after a successful save
pub const SETTINGS_SAVED: &str = "Settings saved successfully!";

/// Everything the configuration view displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatbotSettings {
    pub chatbot: Chatbot,
    pub widget: WidgetConfig,
    pub system_prompt: String,
}

pub struct ChatbotConfigView {
    settings: Resource<ChatbotSettings>,
    source: Arc<dyn DataSource>,
    banner: BannerSlot,
    pending: Option<Action>,
    cancel: CancellationToken,
}

impl ChatbotConfigView {
    /// Mount the view and load chatbot, widget configuration and prompt
    pub async fn mount(ctx: &ViewContext) -> Self {
        let cancel = ctx.cancel.child_token();
        let source = ctx.source.clone();
        let mut settings = Resource::new(ctx.session.clone(), cancel.clone(), move |chatbot_id| {
            let source = source.clone();
            async move {
                let (chatbot, widget, system_prompt) = futures::try_join!(
                    source.get_chatbot(&chatbot_id),
                    source.get_widget_config(&chatbot_id),
                    source.get_system_prompt(&chatbot_id),
                )?;
                Ok::<_, anyhow::Error>(ChatbotSettings {
                    chatbot,
                    widget,
                    system_prompt,
                })
            }
            .boxed()
        });
        settings.load().await;

        Self {
            settings,
            source: ctx.source.clone(),
            banner: BannerSlot::new(ctx.banner_ttl),
            pending: None,
            cancel,
        }
    }

    pub fn settings(&self) -> &Resource<ChatbotSettings> {
        &self.settings
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn pending(&self) -> Option<&Action> {
        self.pending.as_ref()
    }

    pub async fn refetch(&mut self) {
        self.settings.refetch().await;
    }

    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    /// Replace the system prompt
    ///
    /// # Errors
    ///
    /// Blank prompts are rejected before any call; backend failures carry
    /// the normalized message.
    pub async fn save_system_prompt(&mut self, prompt: &str) -> Result<String> {
        let chatbot_id = self.settings.require_scope()?;
        if prompt.trim().is_empty() {
            let err = ConsoleError::Validation("System prompt cannot be empty".to_string());
            self.banner.error(err.to_string());
            return Err(err.into());
        }

        let saved = run_action(
            &mut self.pending,
            &mut self.banner,
            Action::SaveSystemPrompt,
            self.source.update_system_prompt(&chatbot_id, prompt),
        )
        .await?;

        if let Some(settings) = self.settings.data_mut() {
            settings.system_prompt = saved.clone();
            settings.chatbot.system_prompt = Some(saved.clone());
        }
        self.banner.success(SETTINGS_SAVED);
        Ok(saved)
    }

    /// Replace the widget configuration wholesale
    ///
    /// # Errors
    ///
    /// Out-of-range fields are rejected before any call.
    pub async fn save_widget_config(&mut self, config: WidgetConfig) -> Result<WidgetConfig> {
        let chatbot_id = self.settings.require_scope()?;
        if let Err(e) = config.validate() {
            self.banner.error(e.to_string());
            return Err(e);
        }

        let saved = run_action(
            &mut self.pending,
            &mut self.banner,
            Action::SaveWidgetConfig,
            self.source.update_widget_config(&chatbot_id, &config),
        )
        .await?;

        if let Some(settings) = self.settings.data_mut() {
            settings.widget = saved.clone();
            settings.chatbot.widget_config = saved.clone();
        }
        self.banner.success(SETTINGS_SAVED);
        Ok(saved)
    }

    /// Embed snippet for the loaded chatbot
    pub fn embed_snippet(&self, embed: &EmbedConfig) -> Option<String> {
        let chatbot_id = self.settings.scope()?;
        let position = self
            .settings
            .data()
            .map(|settings| settings.widget.position)
            .unwrap_or_default();
        Some(embed_snippet(chatbot_id, position, embed))
    }
}
