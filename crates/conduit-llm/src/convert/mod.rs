//! Translation between host types and the wire format
//!
//! `chat` covers the structured-messages endpoint, `completion` the flattened
//! prompt endpoint. Both reduce a streaming choice to at most one
//! [`Fragment`] using their own precedence rules.

pub mod chat;
pub mod completion;

use crate::protocol::openai::WireUsage;
use crate::types::{AssistantMessage, Usage};

impl From<&WireUsage> for Usage {
    fn from(usage: &WireUsage) -> Self {
        Self::new(
            usage.prompt_tokens.unwrap_or(0),
            usage.completion_tokens.unwrap_or(0),
            usage.total_tokens.unwrap_or(0),
        )
    }
}

/// The delta-worthy part of one streaming choice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Text and/or partial tool invocations
    pub message: AssistantMessage,
    /// Finish reason, passed through
    pub finish_reason: Option<String>,
    /// Usage; only set on the terminal branch
    pub usage: Option<Usage>,
}

impl Fragment {
    fn content(text: &str, finish_reason: Option<&str>) -> Self {
        Self {
            message: AssistantMessage::text(text),
            finish_reason: reported(finish_reason),
            usage: None,
        }
    }

    fn terminal(finish_reason: &str, usage: Option<&WireUsage>) -> Self {
        Self {
            message: AssistantMessage::default(),
            finish_reason: Some(finish_reason.to_owned()),
            usage: usage.map(Usage::from),
        }
    }
}

/// A finish reason, unless it is missing or empty
fn reported(finish_reason: Option<&str>) -> Option<String> {
    finish_reason.filter(|reason| !reason.is_empty()).map(str::to_owned)
}
