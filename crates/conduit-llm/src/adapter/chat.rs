//! Adapter for `/chat/completions`

use async_trait::async_trait;
use conduit_config::{CredentialMap, CredentialsError};

use super::{ModelAdapter, self_test, send_complete, send_stream};
use crate::error::{InvokeError, LlmError};
use crate::request::ApiMode;
use crate::stream::DeltaStream;
use crate::token;
use crate::transport::HttpTransport;
use crate::types::{AggregateResult, InvokeRequest, ToolDeclaration, Turn};

/// Structured-messages adapter
#[derive(Debug, Clone)]
pub struct ChatAdapter {
    transport: HttpTransport,
}

impl ChatAdapter {
    /// Adapter with its own HTTP client
    pub fn new() -> Result<Self, InvokeError> {
        Ok(Self::with_transport(HttpTransport::new()?))
    }

    /// Adapter sharing an existing transport
    pub const fn with_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl ModelAdapter for ChatAdapter {
    fn mode(&self, _credentials: &CredentialMap) -> ApiMode {
        ApiMode::Chat
    }

    fn num_tokens(&self, _credentials: &CredentialMap, turns: &[Turn], tools: &[ToolDeclaration]) -> u32 {
        token::estimate_chat(turns, tools)
    }

    async fn complete(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<AggregateResult, LlmError> {
        send_complete(&self.transport, ApiMode::Chat, credentials, request).await
    }

    async fn complete_stream(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<DeltaStream, LlmError> {
        send_stream(&self.transport, ApiMode::Chat, credentials, request).await
    }

    async fn validate_credentials(&self, model: &str, credentials: &CredentialMap) -> Result<(), CredentialsError> {
        self_test(self, ApiMode::Chat, model, credentials).await
    }
}
