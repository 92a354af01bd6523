//! Transcript turns and the provider wire types they serialize into.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a turn. The model provider only distinguishes these two;
/// tool results travel inside user turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    Assistant,
}

/// A typed fragment of a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    /// A model-issued request to invoke a tool. `id` is opaque and unique
    /// within the response that produced it.
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// Answers a prior `ToolUse` with the same id. `content` carries the
    /// serialized tool output, error payloads included.
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

/// Turn content is either plain text or an ordered block sequence, matching
/// the string-or-array shape the provider accepts on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// One exchange unit in a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Speaker,
    pub content: TurnContent,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::User,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Speaker::Assistant,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn user_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Speaker::User,
            content: TurnContent::Blocks(blocks),
        }
    }

    pub fn assistant_blocks(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Speaker::Assistant,
            content: TurnContent::Blocks(blocks),
        }
    }
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    ToolUse,
    EndTurn,
    #[serde(other)]
    Other,
}

/// Token counters reported by the provider. Accumulated monotonically over
/// one agent-loop invocation, never persisted across requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl Usage {
    pub fn accumulate(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }
}

/// One structured completion from the model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
    #[serde(default)]
    pub usage: Usage,
}

impl ModelResponse {
    /// The text of the first `Text` block, if any. Used as the final reply.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn has_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|block| matches!(block, ContentBlock::ToolUse { .. }))
    }
}
