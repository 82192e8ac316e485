//! Whole-response parsing for both endpoint shapes

use crate::convert::{chat, completion};
use crate::error::InvokeError;
use crate::protocol::openai::WireResponse;
use crate::request::ApiMode;
use crate::types::{AggregateResult, Turn, Usage};

/// Parse a non-streaming response body into an [`AggregateResult`]
///
/// The result's model is the requested model; the prompt turns are carried
/// through unchanged.
pub fn parse_response(
    mode: ApiMode,
    body: &[u8],
    model: &str,
    turns: Vec<Turn>,
) -> Result<AggregateResult, InvokeError> {
    let response: WireResponse = serde_json::from_slice(body)
        .map_err(|e| InvokeError::Invocation(format!("Request failed: invalid response body: {e}")))?;

    let choice = response
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or_else(|| InvokeError::Invocation("Request failed: response contained no choices".to_owned()))?;

    let message = match mode {
        ApiMode::Chat => chat::message_from_choice(choice),
        ApiMode::Completion => completion::message_from_choice(choice),
    };

    Ok(AggregateResult {
        model: model.to_owned(),
        prompt_turns: turns,
        message,
        usage: response.usage.as_ref().map(Usage::from).unwrap_or_default(),
        system_fingerprint: response.system_fingerprint.unwrap_or_default(),
    })
}
