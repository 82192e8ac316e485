//! Backward-compatible router that picks an adapter from the credentials

use async_trait::async_trait;
use conduit_config::{CredentialMap, CredentialsError};
use serde_json::Value;

use super::{ChatAdapter, CompletionAdapter, ModelAdapter};
use crate::error::{InvokeError, LlmError};
use crate::request::ApiMode;
use crate::stream::DeltaStream;
use crate::transport::HttpTransport;
use crate::types::{AggregateResult, InvokeRequest, ToolDeclaration, Turn};

/// Delegates to the chat adapter when `mode` is `chat` (the default) and to
/// the completion adapter otherwise
///
/// Deprecated: callers should pick an adapter directly.
#[derive(Debug, Clone)]
pub struct LegacyRouter {
    chat: ChatAdapter,
    completion: CompletionAdapter,
}

impl LegacyRouter {
    /// Router whose adapters share one HTTP client
    pub fn new() -> Result<Self, InvokeError> {
        Ok(Self::with_transport(HttpTransport::new()?))
    }

    /// Router whose adapters share `transport`
    pub fn with_transport(transport: HttpTransport) -> Self {
        Self {
            chat: ChatAdapter::with_transport(transport.clone()),
            completion: CompletionAdapter::with_transport(transport),
        }
    }

    fn route(&self, credentials: &CredentialMap) -> &dyn ModelAdapter {
        let mode = credentials.get("mode").and_then(Value::as_str).unwrap_or("chat");
        tracing::warn!(mode, "the legacy mode router is deprecated, use the chat or completion adapter");

        if mode == ApiMode::Chat.as_str() {
            &self.chat
        } else {
            &self.completion
        }
    }
}

#[async_trait]
impl ModelAdapter for LegacyRouter {
    fn mode(&self, credentials: &CredentialMap) -> ApiMode {
        self.route(credentials).mode(credentials)
    }

    fn num_tokens(&self, credentials: &CredentialMap, turns: &[Turn], tools: &[ToolDeclaration]) -> u32 {
        self.route(credentials).num_tokens(credentials, turns, tools)
    }

    async fn complete(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<AggregateResult, LlmError> {
        self.route(credentials).complete(credentials, request).await
    }

    async fn complete_stream(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<DeltaStream, LlmError> {
        self.route(credentials).complete_stream(credentials, request).await
    }

    async fn validate_credentials(&self, model: &str, credentials: &CredentialMap) -> Result<(), CredentialsError> {
        self.route(credentials).validate_credentials(model, credentials).await
    }
}
