//! Adapter for `/completions`

use async_trait::async_trait;
use conduit_config::{CredentialMap, CredentialsError};

use super::{ModelAdapter, self_test, send_complete, send_stream};
use crate::convert::completion::to_prompt;
use crate::error::{InvokeError, LlmError};
use crate::request::ApiMode;
use crate::stream::DeltaStream;
use crate::token;
use crate::transport::HttpTransport;
use crate::types::{AggregateResult, InvokeRequest, ToolDeclaration, Turn};

/// Flattened-prompt adapter
///
/// Tool declarations have no place in a text prompt; they are dropped with a
/// warning rather than rejected.
#[derive(Debug, Clone)]
pub struct CompletionAdapter {
    transport: HttpTransport,
}

impl CompletionAdapter {
    /// Adapter with its own HTTP client
    pub fn new() -> Result<Self, InvokeError> {
        Ok(Self::with_transport(HttpTransport::new()?))
    }

    /// Adapter sharing an existing transport
    pub const fn with_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }
}

fn without_tools(mut request: InvokeRequest) -> InvokeRequest {
    if !request.tools.is_empty() {
        tracing::warn!(
            model = %request.model,
            count = request.tools.len(),
            "tools are not supported by completion endpoints, ignoring"
        );
        request.tools.clear();
    }
    request
}

#[async_trait]
impl ModelAdapter for CompletionAdapter {
    fn mode(&self, _credentials: &CredentialMap) -> ApiMode {
        ApiMode::Completion
    }

    fn num_tokens(&self, _credentials: &CredentialMap, turns: &[Turn], _tools: &[ToolDeclaration]) -> u32 {
        token::estimate(&to_prompt(turns))
    }

    async fn complete(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<AggregateResult, LlmError> {
        send_complete(&self.transport, ApiMode::Completion, credentials, without_tools(request)).await
    }

    async fn complete_stream(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<DeltaStream, LlmError> {
        send_stream(&self.transport, ApiMode::Completion, credentials, without_tools(request)).await
    }

    async fn validate_credentials(&self, model: &str, credentials: &CredentialMap) -> Result<(), CredentialsError> {
        self_test(self, ApiMode::Completion, model, credentials).await
    }
}
