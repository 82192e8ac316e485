//! Request body assembly for both endpoint shapes

use conduit_config::Credentials;
use serde_json::{Map, Value};

use crate::convert::{chat, completion};
use crate::error::InvokeError;
use crate::protocol::openai::WireTool;
use crate::token;
use crate::types::InvokeRequest;

/// Tokens held back from the context window for the endpoint's own overhead
const SAFETY_MARGIN: i64 = 100;

/// Smallest response budget ever requested
const MIN_RESPONSE_TOKENS: i64 = 100;

/// Endpoint shape an adapter talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMode {
    /// Structured messages at `/chat/completions`
    Chat,
    /// Flattened prompt at `/completions`
    Completion,
}

impl ApiMode {
    /// Value of the credentials' `mode` key for this shape
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Completion => "completion",
        }
    }

    const fn path(self) -> &'static str {
        match self {
            Self::Chat => "/chat/completions",
            Self::Completion => "/completions",
        }
    }

    /// Full endpoint URL under `base_url`
    pub fn endpoint(self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path())
    }
}

/// Response budget from the context window and the configured cap
///
/// `min(max_tokens, max(context_size - prompt_tokens - 100, 100))`
pub fn response_token_budget(context_size: u32, max_tokens: u32, prompt_tokens: u32) -> u32 {
    let headroom = i64::from(context_size) - i64::from(prompt_tokens) - SAFETY_MARGIN;
    let budget = i64::from(max_tokens).min(headroom.max(MIN_RESPONSE_TOKENS));
    u32::try_from(budget).unwrap_or(max_tokens)
}

/// Estimated prompt tokens for a request in the given mode
pub fn estimate_prompt_tokens(mode: ApiMode, request: &InvokeRequest) -> u32 {
    match mode {
        ApiMode::Chat => token::estimate_chat(&request.turns, &request.tools),
        ApiMode::Completion => token::estimate(&completion::to_prompt(&request.turns)),
    }
}

/// Assemble the JSON body for one call
///
/// Caller parameters are merged after `model`/`stream`, so they win. A
/// computed `max_tokens` is only added when the caller did not set one.
pub fn build_body(
    mode: ApiMode,
    request: &InvokeRequest,
    credentials: &Credentials,
) -> Result<Map<String, Value>, InvokeError> {
    let mut body = Map::new();
    body.insert("model".to_owned(), Value::String(request.model.clone()));

    match mode {
        ApiMode::Chat => {
            body.insert("messages".to_owned(), to_value(&chat::to_messages(&request.turns))?);
        }
        ApiMode::Completion => {
            body.insert("prompt".to_owned(), Value::String(completion::to_prompt(&request.turns)));
        }
    }

    body.insert("stream".to_owned(), Value::Bool(request.stream));

    for (key, value) in &request.model_parameters {
        body.insert(key.clone(), value.clone());
    }

    if mode == ApiMode::Chat && !request.tools.is_empty() {
        let tools: Vec<WireTool> = request.tools.iter().map(WireTool::from).collect();
        body.insert("tools".to_owned(), to_value(&tools)?);
    }

    if !request.stop.is_empty() {
        body.insert("stop".to_owned(), to_value(&request.stop)?);
    }

    if let Some(user) = &request.user {
        body.insert("user".to_owned(), Value::String(user.clone()));
    }

    if !body.contains_key("max_tokens") {
        let prompt_tokens = estimate_prompt_tokens(mode, request);
        let budget = response_token_budget(credentials.context_size, credentials.max_tokens, prompt_tokens);
        body.insert("max_tokens".to_owned(), Value::from(budget));
    }

    Ok(body)
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, InvokeError> {
    serde_json::to_value(value).map_err(|e| InvokeError::Invocation(format!("failed to encode request: {e}")))
}
