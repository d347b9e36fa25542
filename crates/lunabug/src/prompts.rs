//! Request shapes and prompt construction per mode.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum prior turns forwarded in chat mode.
pub const MAX_HISTORY_MESSAGES: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// General assistant.
    Ai,
    /// Error and stack-trace analysis.
    Debug,
    /// Multi-turn conversation.
    Chat,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Ai => "ai",
            Mode::Debug => "debug",
            Mode::Chat => "chat",
        }
    }

    fn system_prompt(self) -> &'static str {
        match self {
            Mode::Ai => {
                "You are LunaBug, a concise assistant embedded in the ClassikLust \
                 game tooling. Answer developer questions directly and prefer short, \
                 actionable answers."
            }
            Mode::Debug => {
                "You are LunaBug, a debugging assistant for a TypeScript/React client \
                 and a Postgres-backed HTTP API. Given an error message and optional \
                 stack trace, identify the most likely root cause, then list concrete \
                 steps to confirm and fix it."
            }
            Mode::Chat => {
                "You are LunaBug, a friendly debugging companion. Keep replies short \
                 and stay on the topic of the conversation."
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }
}

/// Body accepted by every LunaBug endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunaBugRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub stack: Option<String>,
    /// Free-form client context (route, component, game state...).
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl LunaBugRequest {
    /// `true` if there is nothing to answer.
    pub fn is_empty(&self) -> bool {
        self.message.trim().is_empty()
            && !self.error.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

/// Build the provider message list for `mode`.
pub fn build_messages(mode: Mode, request: &LunaBugRequest) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(mode.system_prompt())];

    if mode == Mode::Chat {
        let skip = request.history.len().saturating_sub(MAX_HISTORY_MESSAGES);
        messages.extend(
            request
                .history
                .iter()
                .skip(skip)
                .filter(|m| m.role == "user" || m.role == "assistant")
                .cloned(),
        );
    }

    let mut prompt = String::new();
    if !request.message.trim().is_empty() {
        prompt.push_str(request.message.trim());
    }
    if let Some(error) = request.error.as_deref().filter(|e| !e.trim().is_empty()) {
        if !prompt.is_empty() {
            prompt.push_str("\n\n");
        }
        prompt.push_str("Error:\n");
        prompt.push_str(error.trim());
    }
    if let Some(stack) = request.stack.as_deref().filter(|s| !s.trim().is_empty()) {
        prompt.push_str("\n\nStack trace:\n");
        prompt.push_str(stack.trim());
    }
    if let Some(context) = &request.context {
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(&context.to_string());
    }
    messages.push(ChatMessage::user(prompt));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_prompt_includes_error_and_stack() {
        let request = LunaBugRequest {
            error: Some("TypeError: x is undefined".into()),
            stack: Some("at App.tsx:10".into()),
            ..Default::default()
        };
        let messages = build_messages(Mode::Debug, &request);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("Error:\nTypeError"));
        assert!(messages[1].content.contains("Stack trace:\nat App.tsx:10"));
    }

    #[test]
    fn chat_mode_keeps_recent_user_and_assistant_turns() {
        let mut history: Vec<ChatMessage> = (0..25)
            .map(|i| ChatMessage::user(format!("turn {i}")))
            .collect();
        history.push(ChatMessage::system("injected"));
        let request = LunaBugRequest {
            message: "next".into(),
            history,
            ..Default::default()
        };

        let messages = build_messages(Mode::Chat, &request);
        // system + 19 kept user turns (the injected system turn is in the window but dropped) + new message
        assert_eq!(messages.len(), 1 + 19 + 1);
        assert!(messages.iter().skip(1).all(|m| m.role != "system"));
        assert_eq!(messages.last().map(|m| m.content.as_str()), Some("next"));
    }

    #[test]
    fn ai_mode_ignores_history() {
        let request = LunaBugRequest {
            message: "hi".into(),
            history: vec![ChatMessage::user("old")],
            ..Default::default()
        };
        assert_eq!(build_messages(Mode::Ai, &request).len(), 2);
    }

    #[test]
    fn empty_request_detection() {
        assert!(LunaBugRequest::default().is_empty());
        assert!(!LunaBugRequest { error: Some("boom".into()), ..Default::default() }.is_empty());
    }
}
