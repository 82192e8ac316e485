use serde_json::{Map, Value};

use super::message::Turn;
use super::tool::ToolDeclaration;

/// One call against an adapter
///
/// `model_parameters` is merged verbatim into the request body after the
/// builder's defaults, so any key set here (including `model` and `stream`)
/// wins.
#[derive(Debug, Clone, Default)]
pub struct InvokeRequest {
    /// Model identifier
    pub model: String,
    /// Ordered conversation
    pub turns: Vec<Turn>,
    /// Caller-supplied body fields (`temperature`, `max_tokens`, ...)
    pub model_parameters: Map<String, Value>,
    /// Tool declarations; ignored with a warning in completion mode
    pub tools: Vec<ToolDeclaration>,
    /// Stop sequences
    pub stop: Vec<String>,
    /// Stream the response as deltas
    pub stream: bool,
    /// End-user identifier forwarded as `user`
    pub user: Option<String>,
}

impl InvokeRequest {
    /// Non-streaming request with no extra parameters
    pub fn new(model: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            model: model.into(),
            turns,
            ..Self::default()
        }
    }

    /// Set one body parameter
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.model_parameters.insert(key.into(), value.into());
        self
    }

    /// Declare tools
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolDeclaration>) -> Self {
        self.tools = tools;
        self
    }

    /// Set stop sequences
    #[must_use]
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }

    /// Set the end-user identifier
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Choose streaming or whole-response mode
    #[must_use]
    pub const fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }
}
