//! Adapters for OpenAI-compatible completion endpoints
//!
//! Translates a host conversation into chat (`/chat/completions`) or text
//! (`/completions`) requests and parses whole or streamed responses back into
//! host result types.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

pub mod adapter;
pub mod convert;
pub mod error;
pub mod protocol;
pub mod reduce;
pub mod request;
pub mod response;
pub mod stream;
pub mod token;
pub mod transport;
pub mod types;

pub use adapter::{ChatAdapter, CompletionAdapter, Invocation, LegacyRouter, ModelAdapter};
pub use error::{InvokeError, LlmError};
pub use reduce::{StreamAccumulator, collect_stream};
pub use request::ApiMode;
pub use stream::DeltaStream;
pub use transport::HttpTransport;
pub use types::{
    AggregateResult, AssistantMessage, ContentPart, ImageSource, InvokeRequest, ResultDelta, ToolDeclaration,
    ToolFunction, ToolInvocation, Turn, Usage, UserContent,
};
