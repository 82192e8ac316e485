use serde::{Deserialize, Serialize};

use super::message::{ToolInvocation, Turn};

/// Token usage reported by the endpoint
///
/// `total_tokens` is taken as reported, never recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens generated in the completion
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
}

impl Usage {
    /// Usage from explicit counts
    pub const fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }
}

/// Assistant output: text plus any tool invocations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Generated text, empty when absent
    pub content: String,
    /// Tool invocations, in the order received
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
}

impl AssistantMessage {
    /// Text-only message
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }
}

/// Complete outcome of a non-streaming call, or of a fully reduced stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Model identifier
    pub model: String,
    /// Conversation the request was built from
    pub prompt_turns: Vec<Turn>,
    /// Assistant reply
    pub message: AssistantMessage,
    /// Token usage (zeros when the endpoint reported none)
    pub usage: Usage,
    /// Opaque server configuration fingerprint, empty when absent
    pub system_fingerprint: String,
}

/// One increment of a streaming response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDelta {
    /// Model reported by the chunk, or the requested model
    pub model: String,
    /// Server fingerprint, empty when absent
    pub system_fingerprint: String,
    /// Choice slot; only 0 matters downstream
    pub index: u32,
    /// Text fragment and/or partial tool invocations
    pub message: AssistantMessage,
    /// Why generation stopped, when reported
    pub finish_reason: Option<String>,
    /// Only ever set on the terminal delta
    pub usage: Option<Usage>,
}

impl ResultDelta {
    /// Whether the endpoint signalled the end of generation on this delta
    pub const fn is_terminal(&self) -> bool {
        self.finish_reason.is_some()
    }
}
