//! Widget embed snippet

use crate::api::types::WidgetPosition;
use crate::config::EmbedConfig;

/// HTML a customer pastes into their site to load the chat widget
///
/// # Examples
///
/// ```
/// use botdesk::api::types::WidgetPosition;
/// use botdesk::config::EmbedConfig;
/// use botdesk::embed::embed_snippet;
///
/// let snippet = embed_snippet("bot-1", WidgetPosition::Right, &EmbedConfig::default());
/// assert!(snippet.contains(r#"chatbotId: "bot-1""#));
/// assert!(snippet.contains(r#"<script src="https://cdn.vocata.ai/widget.js" async></script>"#));
/// ```
pub fn embed_snippet(chatbot_id: &str, position: WidgetPosition, config: &EmbedConfig) -> String {
    format!(
        "<script>\n  window.{global} = {{\n    chatbotId: \"{id}\",\n    position: \"{position}\", // or \"{other}\"\n  }};\n</script>\n<script src=\"{src}\" async></script>",
        global = config.global_name,
        id = escape_js(chatbot_id),
        position = position,
        other = match position {
            WidgetPosition::Left => WidgetPosition::Right,
            WidgetPosition::Right => WidgetPosition::Left,
        },
        src = config.script_url,
    )
}

/// Keep an identifier inside its string literal
fn escape_js(value: &str) -> String {
    value
        .chars()
        .flat_map(|c| match c {
            '"' => vec!['\\', '"'],
            '\\' => vec!['\\', '\\'],
            '<' => "\\u003c".chars().collect(),
            '\n' => vec!['\\', 'n'],
            other => vec![other],
        })
        .collect()
}
