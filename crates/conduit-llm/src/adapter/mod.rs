//! Adapters between host calls and upstream endpoints

pub mod chat;
pub mod completion;
pub mod legacy;

use async_trait::async_trait;
use conduit_config::{CredentialMap, Credentials, CredentialsError};

use crate::error::{InvokeError, LlmError};
use crate::request::{ApiMode, build_body};
use crate::response::parse_response;
use crate::stream::{DeltaStream, FrameParser, delta_stream};
use crate::transport::HttpTransport;
use crate::types::{AggregateResult, InvokeRequest, ToolDeclaration, Turn};

pub use chat::ChatAdapter;
pub use completion::CompletionAdapter;
pub use legacy::LegacyRouter;

/// Outcome of [`ModelAdapter::invoke`]
pub enum Invocation {
    /// Whole response
    Complete(AggregateResult),
    /// Lazy delta sequence
    Stream(DeltaStream),
}

/// One endpoint shape behind a uniform call contract
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Endpoint shape calls with these credentials are sent to
    fn mode(&self, credentials: &CredentialMap) -> ApiMode;

    /// Estimated prompt tokens for a conversation
    fn num_tokens(&self, credentials: &CredentialMap, turns: &[Turn], tools: &[ToolDeclaration]) -> u32;

    /// Send a non-streaming request
    async fn complete(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<AggregateResult, LlmError>;

    /// Send a streaming request
    async fn complete_stream(
        &self,
        credentials: &CredentialMap,
        request: InvokeRequest,
    ) -> Result<DeltaStream, LlmError>;

    /// Send a request, streaming or not according to `request.stream`
    async fn invoke(&self, credentials: &CredentialMap, request: InvokeRequest) -> Result<Invocation, LlmError> {
        if request.stream {
            self.complete_stream(credentials, request).await.map(Invocation::Stream)
        } else {
            self.complete(credentials, request).await.map(Invocation::Complete)
        }
    }

    /// Check the credentials statically, then with a minimal real request
    async fn validate_credentials(&self, model: &str, credentials: &CredentialMap) -> Result<(), CredentialsError>;
}

/// Validate a credential map for `mode`
pub(crate) fn checked_credentials(
    mode: ApiMode,
    credentials: &CredentialMap,
) -> Result<Credentials, CredentialsError> {
    let credentials = Credentials::from_map(credentials)?;
    credentials.ensure_mode(mode.as_str())?;
    Ok(credentials)
}

/// Send a whole-response request and parse the body
pub(crate) async fn send_complete(
    transport: &HttpTransport,
    mode: ApiMode,
    credentials: &CredentialMap,
    mut request: InvokeRequest,
) -> Result<AggregateResult, LlmError> {
    let credentials = checked_credentials(mode, credentials)?;
    request.stream = false;

    let body = build_body(mode, &request, &credentials)?;
    let url = mode.endpoint(&credentials.endpoint_url);
    tracing::debug!(endpoint = %url, model = %request.model, "sending completion request");

    let response = transport.post_json(&url, credentials.bearer_token(), &body).await?;
    let bytes = response.bytes().await.map_err(InvokeError::from)?;

    Ok(parse_response(mode, &bytes, &request.model, request.turns)?)
}

/// Send a streaming request and wrap the body in a [`DeltaStream`]
pub(crate) async fn send_stream(
    transport: &HttpTransport,
    mode: ApiMode,
    credentials: &CredentialMap,
    mut request: InvokeRequest,
) -> Result<DeltaStream, LlmError> {
    let credentials = checked_credentials(mode, credentials)?;
    request.stream = true;

    let body = build_body(mode, &request, &credentials)?;
    let url = mode.endpoint(&credentials.endpoint_url);
    tracing::debug!(endpoint = %url, model = %request.model, "sending streaming request");

    let response = transport.post_json(&url, credentials.bearer_token(), &body).await?;

    Ok(delta_stream(response.bytes_stream(), FrameParser::new(mode, request.model)))
}

/// The credentials self-test shared by every adapter
///
/// Static checks run first; any failure of the probe request itself is
/// reported as [`CredentialsError::Validation`].
pub(crate) async fn self_test<A>(
    adapter: &A,
    mode: ApiMode,
    model: &str,
    credentials: &CredentialMap,
) -> Result<(), CredentialsError>
where
    A: ModelAdapter + ?Sized,
{
    if model.trim().is_empty() {
        return Err(CredentialsError::EmptyModel);
    }
    checked_credentials(mode, credentials)?;

    let turns = match mode {
        ApiMode::Chat => vec![Turn::system("You are a helpful assistant."), Turn::user("Hello")],
        ApiMode::Completion => vec![Turn::user("Hello")],
    };
    let probe = InvokeRequest::new(model, turns).with_parameter("max_tokens", 5);

    adapter
        .complete(credentials, probe)
        .await
        .map(drop)
        .map_err(|e| CredentialsError::Validation(format!("Credential validation failed: {e}")))
}
