//! Completion endpoint translation: turns to one flattened prompt

use super::Fragment;
use crate::protocol::openai::{WireChoice, WireStreamChoice, WireUsage};
use crate::types::{AssistantMessage, ContentPart, Turn, UserContent};

/// Flatten a conversation into a newline-joined prompt
///
/// Image parts and tool turns have no representation in a text prompt and
/// are dropped.
pub fn to_prompt(turns: &[Turn]) -> String {
    let mut lines = Vec::with_capacity(turns.len());

    for turn in turns {
        match turn {
            Turn::System { content } => lines.push(format!("System: {content}")),
            Turn::User {
                content: UserContent::Text(text),
            } => lines.push(text.clone()),
            Turn::User {
                content: UserContent::Parts(parts),
            } => {
                let text: Vec<&str> = parts
                    .iter()
                    .filter_map(|part| match part {
                        ContentPart::Text { data } => Some(data.as_str()),
                        ContentPart::Image { .. } => None,
                    })
                    .collect();
                lines.push(text.join(" "));
            }
            Turn::Assistant {
                content: Some(text), ..
            } if !text.is_empty() => lines.push(text.clone()),
            Turn::Assistant { .. } | Turn::Tool { .. } => {}
        }
    }

    lines.join("\n")
}

/// Assistant message from the first choice of a whole completion response
pub fn message_from_choice(choice: WireChoice) -> AssistantMessage {
    AssistantMessage::text(choice.text.unwrap_or_default())
}

/// Reduce one streaming completion choice to a fragment
///
/// Non-empty text wins over a finish reason; there is no tool-call branch.
pub fn fragment_from_choice(choice: &WireStreamChoice, usage: Option<&WireUsage>) -> Option<Fragment> {
    if let Some(text) = choice.text.as_deref().filter(|t| !t.is_empty()) {
        return Some(Fragment::content(text, choice.finish_reason.as_deref()));
    }

    choice
        .finish_reason
        .as_deref()
        .filter(|reason| !reason.is_empty())
        .map(|reason| Fragment::terminal(reason, usage))
}
