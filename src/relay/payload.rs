//! Inbound payload and upstream input types.
//!
//! The browser sends chat-style `{messages, system}`; the upstream expects an
//! `input` array of role-tagged content blocks. Ordering is preserved and the
//! optional system block is always first.

use serde::{Deserialize, Serialize};

use crate::config::UpstreamConfig;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Directional block type: model output for assistant turns, input otherwise.
    pub fn content_type(self) -> ContentType {
        match self {
            Role::Assistant => ContentType::OutputText,
            Role::User | Role::System => ContentType::InputText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

/// Body posted by the browser client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundPayload {
    #[serde(default)]
    messages: Option<Vec<Message>>,
    #[serde(default)]
    system: Option<String>,
}

impl InboundPayload {
    /// Parse a request body. Any failure maps to a single "invalid JSON" outcome.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn messages(&self) -> &[Message] {
        self.messages.as_deref().unwrap_or_default()
    }

    /// System prompt; an empty string counts as absent.
    pub fn system(&self) -> Option<&str> {
        self.system.as_deref().filter(|s| !s.is_empty())
    }

    /// Build the upstream `input` sequence.
    pub fn to_upstream_input(&self) -> Vec<InputItem> {
        let mut input = Vec::with_capacity(self.messages().len() + 1);

        if let Some(system) = self.system() {
            input.push(InputItem::new(Role::System, system));
        }

        input.extend(
            self.messages()
                .iter()
                .map(|m| InputItem::new(m.role, &m.content)),
        );
        input
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentType {
    #[serde(rename = "input_text")]
    InputText,
    #[serde(rename = "output_text")]
    OutputText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: ContentType,
    pub text: String,
}

/// One role-tagged entry of the upstream `input` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputItem {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl InputItem {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock {
                kind: role.content_type(),
                text: text.into(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reasoning<'a> {
    pub effort: &'a str,
}

/// Full body of the upstream streaming request.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest<'a> {
    pub model: &'a str,
    pub reasoning: Reasoning<'a>,
    pub stream: bool,
    pub input: Vec<InputItem>,
}

impl<'a> UpstreamRequest<'a> {
    pub fn new(config: &'a UpstreamConfig, input: Vec<InputItem>) -> Self {
        Self {
            model: &config.model,
            reasoning: Reasoning {
                effort: &config.reasoning_effort,
            },
            stream: true,
            input,
        }
    }
}
