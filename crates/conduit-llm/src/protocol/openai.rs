//! `OpenAI` chat and text completion wire format types
//!
//! Response-side types are deliberately lenient: every field the parsers
//! can default is optional, so a sparse chunk still deserializes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// -- Request types --

/// Chat message in a `/chat/completions` request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum WireMessage {
    /// System instruction
    System {
        /// Instruction text
        content: String,
    },
    /// User message
    User {
        /// String or array of content parts
        content: WireUserContent,
    },
    /// Assistant message; `content` is always present, possibly empty
    Assistant {
        /// Response text
        content: String,
        /// Tool calls made by the assistant
        #[serde(skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<WireToolCall>>,
    },
    /// Tool result
    Tool {
        /// Tool call this message answers
        tool_call_id: String,
        /// Tool output
        content: String,
    },
}

/// User content can be a string or an array of content parts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireUserContent {
    /// Plain text content
    Text(String),
    /// Array of content parts
    Parts(Vec<WireContentPart>),
}

/// Individual content part in a user message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireContentPart {
    /// Text content
    Text {
        /// The text string
        text: String,
    },
    /// Image content via URL
    ImageUrl {
        /// Image URL specification
        image_url: WireImageUrl,
    },
}

/// Image URL specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireImageUrl {
    /// Image URL or base64 data URI
    pub url: String,
}

/// Tool call within an assistant message or a whole response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireToolCall {
    /// Unique tool call identifier
    pub id: String,
    /// Tool type
    #[serde(rename = "type")]
    pub kind: String,
    /// Function call details
    pub function: WireFunctionCall,
}

/// Function call details within a tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// Tool definition in a chat request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireTool {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Function specification
    pub function: WireFunction,
}

/// Function specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireFunction {
    /// Function name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// JSON Schema for parameters
    pub parameters: serde_json::Value,
}

// -- Response types --

/// Whole response from either endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct WireResponse {
    /// Generated choices
    #[serde(default)]
    pub choices: Option<Vec<WireChoice>>,
    /// Token usage
    #[serde(default)]
    pub usage: Option<WireUsage>,
    /// Server configuration fingerprint
    #[serde(default)]
    pub system_fingerprint: Option<String>,
}

/// Choice within a whole response
#[derive(Debug, Clone, Deserialize)]
pub struct WireChoice {
    /// Chat endpoint message
    #[serde(default)]
    pub message: Option<WireChoiceMessage>,
    /// Text endpoint output
    #[serde(default)]
    pub text: Option<String>,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message within a chat response choice
#[derive(Debug, Clone, Deserialize)]
pub struct WireChoiceMessage {
    /// Text content
    #[serde(default)]
    pub content: Option<String>,
    /// Tool calls, fields taken exactly as received
    #[serde(default)]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

/// Token usage; missing or ill-typed counts read as zero
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct WireUsage {
    /// Prompt tokens
    #[serde(default, deserialize_with = "lenient")]
    pub prompt_tokens: Option<u32>,
    /// Completion tokens
    #[serde(default, deserialize_with = "lenient")]
    pub completion_tokens: Option<u32>,
    /// Total tokens
    #[serde(default, deserialize_with = "lenient")]
    pub total_tokens: Option<u32>,
}

// -- Streaming types --

/// One `data:` frame of a streaming response
///
/// A field present with an unexpected type reads as absent, here and in every
/// nested streaming type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireStreamChunk {
    /// Model that produced the chunk
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
    /// Server configuration fingerprint
    #[serde(default, deserialize_with = "lenient")]
    pub system_fingerprint: Option<String>,
    /// Delta choices; absent or empty on heartbeat frames
    #[serde(default, deserialize_with = "lenient")]
    pub choices: Option<Vec<WireStreamChoice>>,
    /// Usage, usually only on the final chunk
    #[serde(default, deserialize_with = "lenient")]
    pub usage: Option<WireUsage>,
}

/// Choice within a streaming chunk
#[derive(Debug, Clone, Deserialize)]
pub struct WireStreamChoice {
    /// Choice index
    #[serde(default, deserialize_with = "lenient")]
    pub index: Option<u32>,
    /// Chat endpoint delta
    #[serde(default, deserialize_with = "lenient")]
    pub delta: Option<WireStreamDelta>,
    /// Text endpoint fragment
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
    /// Finish reason (present on final chunk)
    #[serde(default, deserialize_with = "lenient")]
    pub finish_reason: Option<String>,
}

/// Delta content within a chat streaming choice
#[derive(Debug, Clone, Deserialize)]
pub struct WireStreamDelta {
    /// Incremental text content
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    /// Incremental tool calls
    #[serde(default, deserialize_with = "lenient")]
    pub tool_calls: Option<Vec<WireStreamToolCall>>,
}

/// Tool call fragment within a streaming delta; any field may be missing
#[derive(Debug, Clone, Deserialize)]
pub struct WireStreamToolCall {
    /// Tool call ID (first fragment only)
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    /// Tool type (first fragment only)
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
    /// Partial function call
    #[serde(default, deserialize_with = "lenient")]
    pub function: Option<WireStreamFunctionCall>,
}

/// Partial function call within a streaming tool call
#[derive(Debug, Clone, Deserialize)]
pub struct WireStreamFunctionCall {
    /// Function name (first fragment only)
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    /// Incremental arguments fragment
    #[serde(default, deserialize_with = "lenient")]
    pub arguments: Option<String>,
}

/// Deserialize a field as `T`, reading any value of another type as `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

// -- Error response --

/// Error body returned with a non-2xx status
#[derive(Debug, Clone, Deserialize)]
pub struct WireErrorResponse {
    /// Error details
    #[serde(default)]
    pub error: Option<WireErrorDetail>,
}

/// Error detail
#[derive(Debug, Clone, Deserialize)]
pub struct WireErrorDetail {
    /// Error message
    #[serde(default)]
    pub message: Option<String>,
}
