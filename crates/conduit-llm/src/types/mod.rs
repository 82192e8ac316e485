//! Host-facing conversation and result types
//!
//! These are independent of the wire format; `convert` maps them to and
//! from the `OpenAI` protocol types.

pub mod message;
pub mod request;
pub mod result;
pub mod tool;

pub use message::{ContentPart, ImageSource, ToolFunction, ToolInvocation, Turn, UserContent};
pub use request::InvokeRequest;
pub use result::{AggregateResult, AssistantMessage, ResultDelta, Usage};
pub use tool::ToolDeclaration;
