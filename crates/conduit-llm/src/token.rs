//! Crude prompt token estimation
//!
//! One token per four characters, never less than one. Good enough to size a
//! response budget; not a tokenizer.

use crate::types::{ContentPart, ToolDeclaration, Turn, UserContent};

/// Estimate the token count of arbitrary text
pub fn estimate(text: &str) -> u32 {
    let tokens = text.chars().count() / 4;
    u32::try_from(tokens).unwrap_or(u32::MAX).max(1)
}

/// Estimate the prompt size of a chat request
///
/// Counts every turn's text (text parts only for multimodal turns) and each
/// tool's name, description and parameter schema.
pub fn estimate_chat(turns: &[Turn], tools: &[ToolDeclaration]) -> u32 {
    let mut text = String::new();

    for turn in turns {
        match turn {
            Turn::System { content } | Turn::Tool { content, .. } => text.push_str(content),
            Turn::User {
                content: UserContent::Text(content),
            } => text.push_str(content),
            Turn::User {
                content: UserContent::Parts(parts),
            } => {
                for part in parts {
                    if let ContentPart::Text { data } = part {
                        text.push_str(data);
                    }
                }
            }
            Turn::Assistant { content, .. } => text.push_str(content.as_deref().unwrap_or_default()),
        }
    }

    for tool in tools {
        text.push_str(&tool.name);
        text.push_str(&tool.description);
        text.push_str(&tool.parameters.to_string());
    }

    estimate(&text)
}
