use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One turn of a conversation, tagged by speaker role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Turn {
    /// System instruction
    System {
        /// Instruction text
        content: String,
    },
    /// User message, plain or multimodal
    User {
        /// Message content
        content: UserContent,
    },
    /// Prior assistant response, possibly with tool calls
    Assistant {
        /// Response text
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        /// Tool calls the assistant made
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    /// Result of a tool call
    Tool {
        /// Identifier of the invocation this result answers
        tool_call_id: String,
        /// Tool output
        content: String,
    },
}

impl Turn {
    /// System turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Plain-text user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: UserContent::Text(content.into()),
        }
    }

    /// Multimodal user turn
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self::User {
            content: UserContent::Parts(parts),
        }
    }

    /// Text-only assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Assistant turn carrying tool calls
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self::Assistant { content, tool_calls }
    }

    /// Tool result turn
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// User message content, either plain text or ordered parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    /// Plain text
    Text(String),
    /// Text and image parts in order
    Parts(Vec<ContentPart>),
}

/// Individual part of a multimodal user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text fragment
    Text {
        /// The text
        data: String,
    },
    /// Image reference
    Image {
        /// URL, data URI, or a structured object carrying `url`
        data: ImageSource,
    },
}

impl ContentPart {
    /// Text part
    pub fn text(data: impl Into<String>) -> Self {
        Self::Text { data: data.into() }
    }

    /// Image part referenced by URL or data URI
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::Image {
            data: ImageSource::Url(url.into()),
        }
    }
}

/// Where an image part's bytes come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageSource {
    /// URL or base64 data URI
    Url(String),
    /// Structured reference, e.g. `{"url": "...", "detail": "high"}`
    Object(Map<String, Value>),
}

impl ImageSource {
    /// The image URL, or an empty string if a structured source has none
    pub fn url(&self) -> &str {
        match self {
            Self::Url(url) => url,
            Self::Object(object) => object.get("url").and_then(Value::as_str).unwrap_or_default(),
        }
    }
}

/// A tool call made by the assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlates the call with its result turn
    pub id: String,
    /// Call type, `function` in practice
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    /// Invoked function
    pub function: ToolFunction,
}

impl ToolInvocation {
    /// Function-type invocation
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_kind(),
            function: ToolFunction {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Function name and its JSON-encoded arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFunction {
    /// Function name
    pub name: String,
    /// Arguments as received, not parsed
    pub arguments: String,
}

pub(crate) fn function_kind() -> String {
    "function".to_owned()
}
