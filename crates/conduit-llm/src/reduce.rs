//! Folding a delta stream into one aggregate result

use futures_util::{Stream, StreamExt};

use crate::error::InvokeError;
use crate::types::{AggregateResult, AssistantMessage, ResultDelta, ToolInvocation, Turn, Usage};

/// Incremental fold of [`ResultDelta`]s
///
/// Text is concatenated in arrival order. A tool fragment whose `id` is
/// non-empty and differs from the previous invocation's opens a new
/// invocation; any other fragment extends the most recent one.
#[derive(Debug, Clone)]
pub struct StreamAccumulator {
    model: String,
    system_fingerprint: String,
    message: AssistantMessage,
    usage: Option<Usage>,
}

impl StreamAccumulator {
    /// Start an empty fold; `model` stands in until a delta reports one
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_fingerprint: String::new(),
            message: AssistantMessage::default(),
            usage: None,
        }
    }

    /// Fold in one delta
    pub fn push(&mut self, delta: ResultDelta) {
        if !delta.model.is_empty() {
            self.model = delta.model;
        }
        if !delta.system_fingerprint.is_empty() {
            self.system_fingerprint = delta.system_fingerprint;
        }
        if delta.usage.is_some() {
            self.usage = delta.usage;
        }

        self.message.content.push_str(&delta.message.content);
        for fragment in delta.message.tool_calls {
            self.push_tool_fragment(fragment);
        }
    }

    fn push_tool_fragment(&mut self, fragment: ToolInvocation) {
        let opens_new = match self.message.tool_calls.last() {
            None => true,
            Some(last) => !fragment.id.is_empty() && fragment.id != last.id,
        };

        if opens_new {
            self.message.tool_calls.push(fragment);
            return;
        }

        if let Some(last) = self.message.tool_calls.last_mut() {
            last.function.name.push_str(&fragment.function.name);
            last.function.arguments.push_str(&fragment.function.arguments);
        }
    }

    /// Finish the fold
    pub fn finish(self, prompt_turns: Vec<Turn>) -> AggregateResult {
        AggregateResult {
            model: self.model,
            prompt_turns,
            message: self.message,
            usage: self.usage.unwrap_or_default(),
            system_fingerprint: self.system_fingerprint,
        }
    }
}

/// Drain a delta stream into the same shape a whole response parses to
///
/// Stops at the first error.
pub async fn collect_stream<S>(stream: S, model: &str, turns: Vec<Turn>) -> Result<AggregateResult, InvokeError>
where
    S: Stream<Item = Result<ResultDelta, InvokeError>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut accumulator = StreamAccumulator::new(model);

    while let Some(delta) = stream.next().await {
        accumulator.push(delta?);
    }

    Ok(accumulator.finish(turns))
}
