//! Test console view
//!
//! A memory-only conversation with the chatbot as it is currently
//! configured. The transcript starts with the chatbot's greeting.

use super::{run_action, Action, BannerSlot, Resource, Status, ViewContext};
use crate::api::types::{Chatbot, SourceCitation};
use crate::backend::DataSource;
use crate::error::Result;
use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Assistant reply appended when a chat call fails
pub const CHAT_APOLOGY: &str =
    "Sorry, I encountered an error while processing your request. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceCitation>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            sources: Vec::new(),
        }
    }

    fn assistant(content: impl Into<String>, sources: Vec<SourceCitation>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            sources,
        }
    }
}

pub struct TestConsoleView {
    chatbot: Resource<Chatbot>,
    transcript: Vec<ChatMessage>,
    source: Arc<dyn DataSource>,
    banner: BannerSlot,
    pending: Option<Action>,
    cancel: CancellationToken,
}

impl TestConsoleView {
    /// Mount the console and greet
    pub async fn mount(ctx: &ViewContext) -> Self {
        let cancel = ctx.cancel.child_token();
        let source = ctx.source.clone();
        let mut chatbot = Resource::new(ctx.session.clone(), cancel.clone(), move |chatbot_id| {
            let source = source.clone();
            async move { source.get_chatbot(&chatbot_id).await }.boxed()
        });
        chatbot.load().await;

        let transcript = match (chatbot.status(), chatbot.data()) {
            (Status::Ready, Some(bot)) => vec![ChatMessage::assistant(bot.greeting(), Vec::new())],
            _ => Vec::new(),
        };

        Self {
            chatbot,
            transcript,
            source: ctx.source.clone(),
            banner: BannerSlot::new(ctx.banner_ttl),
            pending: None,
            cancel,
        }
    }

    pub fn chatbot(&self) -> &Resource<Chatbot> {
        &self.chatbot
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn pending(&self) -> Option<&Action> {
        self.pending.as_ref()
    }

    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    /// Send one message and append the reply
    ///
    /// Blank input is ignored. A failed call appends an apology and raises an
    /// error banner instead of returning an error; only a missing session or
    /// chatbot is returned as `Err`.
    pub async fn send(&mut self, text: &str) -> Result<Option<ChatMessage>> {
        let chatbot_id = self.chatbot.require_scope()?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }

        self.transcript.push(ChatMessage::user(text));

        let reply = match run_action(
            &mut self.pending,
            &mut self.banner,
            Action::Send,
            self.source.run_test_chat(&chatbot_id, text),
        )
        .await
        {
            Ok(response) => ChatMessage::assistant(response.answer, response.sources),
            Err(_) => ChatMessage::assistant(CHAT_APOLOGY, Vec::new()),
        };

        self.transcript.push(reply.clone());
        Ok(Some(reply))
    }
}
