//! Chat endpoint translation: turns to messages, responses to host types

use super::{Fragment, reported};
use crate::protocol::openai::{
    WireChoice, WireContentPart, WireFunction, WireFunctionCall, WireImageUrl, WireMessage, WireStreamChoice,
    WireStreamToolCall, WireTool, WireToolCall, WireUsage, WireUserContent,
};
use crate::types::message::function_kind;
use crate::types::{AssistantMessage, ContentPart, ToolDeclaration, ToolFunction, ToolInvocation, Turn, UserContent};

/// Translate a conversation into wire messages, one per turn, order preserved
pub fn to_messages(turns: &[Turn]) -> Vec<WireMessage> {
    turns.iter().map(WireMessage::from).collect()
}

impl From<&Turn> for WireMessage {
    fn from(turn: &Turn) -> Self {
        match turn {
            Turn::System { content } => Self::System {
                content: content.clone(),
            },
            Turn::User { content } => Self::User {
                content: content.into(),
            },
            Turn::Assistant { content, tool_calls } => Self::Assistant {
                content: content.clone().unwrap_or_default(),
                tool_calls: (!tool_calls.is_empty()).then(|| tool_calls.iter().map(WireToolCall::from).collect()),
            },
            Turn::Tool { tool_call_id, content } => Self::Tool {
                tool_call_id: tool_call_id.clone(),
                content: content.clone(),
            },
        }
    }
}

impl From<&UserContent> for WireUserContent {
    fn from(content: &UserContent) -> Self {
        match content {
            UserContent::Text(text) => Self::Text(text.clone()),
            UserContent::Parts(parts) => Self::Parts(parts.iter().map(WireContentPart::from).collect()),
        }
    }
}

impl From<&ContentPart> for WireContentPart {
    fn from(part: &ContentPart) -> Self {
        match part {
            ContentPart::Text { data } => Self::Text { text: data.clone() },
            ContentPart::Image { data } => Self::ImageUrl {
                image_url: WireImageUrl {
                    url: data.url().to_owned(),
                },
            },
        }
    }
}

impl From<&ToolInvocation> for WireToolCall {
    fn from(call: &ToolInvocation) -> Self {
        Self {
            id: call.id.clone(),
            kind: function_kind(),
            function: WireFunctionCall {
                name: call.function.name.clone(),
                arguments: call.function.arguments.clone(),
            },
        }
    }
}

impl From<&ToolDeclaration> for WireTool {
    fn from(tool: &ToolDeclaration) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            },
        }
    }
}

impl From<WireToolCall> for ToolInvocation {
    fn from(call: WireToolCall) -> Self {
        Self {
            id: call.id,
            kind: call.kind,
            function: ToolFunction {
                name: call.function.name,
                arguments: call.function.arguments,
            },
        }
    }
}

impl From<&WireStreamToolCall> for ToolInvocation {
    fn from(call: &WireStreamToolCall) -> Self {
        let function = call.function.as_ref();
        Self {
            id: call.id.clone().unwrap_or_default(),
            kind: call.kind.clone().unwrap_or_else(function_kind),
            function: ToolFunction {
                name: function.and_then(|f| f.name.clone()).unwrap_or_default(),
                arguments: function.and_then(|f| f.arguments.clone()).unwrap_or_default(),
            },
        }
    }
}

/// Assistant message from the first choice of a whole chat response
pub fn message_from_choice(choice: WireChoice) -> AssistantMessage {
    let Some(message) = choice.message else {
        return AssistantMessage::default();
    };

    AssistantMessage {
        content: message.content.unwrap_or_default(),
        tool_calls: message
            .tool_calls
            .map(|calls| calls.into_iter().map(ToolInvocation::from).collect())
            .unwrap_or_default(),
    }
}

/// Reduce one streaming chat choice to a fragment
///
/// Branches are checked in order: text content, tool calls, finish reason.
/// Only the first match fires; a choice matching none yields `None`.
pub fn fragment_from_choice(choice: &WireStreamChoice, usage: Option<&WireUsage>) -> Option<Fragment> {
    let delta = choice.delta.as_ref();

    if let Some(text) = delta.and_then(|d| d.content.as_deref()).filter(|t| !t.is_empty()) {
        return Some(Fragment::content(text, choice.finish_reason.as_deref()));
    }

    if let Some(calls) = delta.and_then(|d| d.tool_calls.as_ref()) {
        return Some(Fragment {
            message: AssistantMessage {
                content: String::new(),
                tool_calls: calls.iter().map(ToolInvocation::from).collect(),
            },
            finish_reason: reported(choice.finish_reason.as_deref()),
            usage: None,
        });
    }

    choice
        .finish_reason
        .as_deref()
        .filter(|reason| !reason.is_empty())
        .map(|reason| Fragment::terminal(reason, usage))
}
