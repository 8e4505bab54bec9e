//! Prompt assembly: from a request body to an ordered message list.

use serde::{Deserialize, Serialize};
use simplechat_core::error::{Error, Result};
use simplechat_core::message::{ConversationId, Message};
use simplechat_core::options::ChatOptions;

/// The messages and (optional) options of one request.
#[derive(Debug, Clone, Default)]
pub struct Prompt {
    pub messages: Vec<Message>,

    /// Per-request options; `None` means the client's defaults.
    pub options: Option<ChatOptions>,
}

impl Prompt {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            options: None,
        }
    }

    /// A prompt with a single user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(vec![Message::user(text)])
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// JSON body accepted by the `/simple/*` endpoints.
///
/// Required fields default to empty so a missing field and an empty one
/// are both reported as a validation error by [`PromptBody::assemble`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptBody {
    #[serde(default)]
    pub conversation_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default)]
    pub user_prompt: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_options: Option<ChatOptions>,
}

impl PromptBody {
    /// Validate the body and build the conversation key and prompt.
    ///
    /// A non-blank system prompt becomes a System message placed before the
    /// single User message.
    pub fn assemble(self) -> Result<(ConversationId, Prompt)> {
        let conversation_id = ConversationId::parse(self.conversation_id)?;
        if self.user_prompt.is_empty() {
            return Err(Error::validation("userPrompt must not be empty"));
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.filter(|s| !s.trim().is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(self.user_prompt));

        Ok((
            conversation_id,
            Prompt {
                messages,
                options: self.chat_options,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplechat_core::message::Role;

    fn body(system: Option<&str>, user: &str) -> PromptBody {
        PromptBody {
            conversation_id: "t1".into(),
            system_prompt: system.map(String::from),
            user_prompt: user.into(),
            chat_options: None,
        }
    }

    #[test]
    fn user_only_prompt() {
        let (id, prompt) = body(None, "hello").assemble().unwrap();
        assert_eq!(id.as_str(), "t1");
        assert_eq!(prompt.messages.len(), 1);
        assert_eq!(prompt.messages[0].role, Role::User);
        assert_eq!(prompt.messages[0].content, "hello");
        assert!(prompt.options.is_none());
    }

    #[test]
    fn system_prompt_comes_first() {
        let (_, prompt) = body(Some("You are terse."), "hi").assemble().unwrap();
        let roles: Vec<Role> = prompt.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User]);
        assert_eq!(prompt.messages[0].content, "You are terse.");
        assert_eq!(prompt.messages[1].content, "hi");
    }

    #[test]
    fn blank_system_prompt_is_dropped() {
        for blank in ["", "   ", "\n\t"] {
            let (_, prompt) = body(Some(blank), "hi").assemble().unwrap();
            assert!(prompt.messages.iter().all(|m| m.role != Role::System));
        }
    }

    #[test]
    fn empty_required_fields_rejected() {
        assert!(matches!(body(None, "").assemble(), Err(Error::Validation(_))));

        let mut no_id = body(None, "hi");
        no_id.conversation_id.clear();
        assert!(matches!(no_id.assemble(), Err(Error::Validation(_))));
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let parsed: PromptBody = serde_json::from_str(r#"{"userPrompt":"hi"}"#).unwrap();
        assert!(parsed.conversation_id.is_empty());
        assert!(parsed.assemble().is_err());
    }

    #[test]
    fn options_are_attached_untouched() {
        let json = r#"{"conversationId":"t1","userPrompt":"hi","chatOptions":{"model":"gpt-4o","temperature":0.1}}"#;
        let parsed: PromptBody = serde_json::from_str(json).unwrap();
        let (_, prompt) = parsed.assemble().unwrap();
        let opts = prompt.options.unwrap();
        assert_eq!(opts.model.as_deref(), Some("gpt-4o"));
        assert_eq!(opts.temperature, Some(0.1));
    }
}
