use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};

/// Host-supplied credential map (`api_key`, `endpoint_url`, `mode`, ...)
pub type CredentialMap = Map<String, Value>;

/// Default upstream base URL
pub const DEFAULT_ENDPOINT_URL: &str = "https://api.openai.com/v1";

/// Context window assumed when the credentials do not set one
pub const DEFAULT_CONTEXT_SIZE: u32 = 4096;

/// Response token cap assumed when the credentials do not set one
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Adapter-level precondition failures, raised before any network call
#[derive(Debug, thiserror::Error)]
pub enum CredentialsError {
    /// `api_key` is absent or empty
    #[error("API key is required")]
    MissingApiKey,

    /// Model name is empty or whitespace
    #[error("model name is required")]
    EmptyModel,

    /// The credentials target a different endpoint shape than the adapter
    #[error("this provider only supports {expected} mode, got `{actual}`")]
    ModeMismatch {
        /// Mode the adapter serves
        expected: String,
        /// Mode found in the credentials
        actual: String,
    },

    /// A numeric field could not be read as an integer
    #[error("{field} must be a valid integer")]
    InvalidInteger {
        /// Credential key
        field: &'static str,
    },

    /// A numeric field is zero or negative
    #[error("{field} must be a positive integer")]
    NonPositive {
        /// Credential key
        field: &'static str,
    },

    /// Credentials self-test failed; wraps the underlying message
    #[error("{0}")]
    Validation(String),
}

/// Validated, typed view of a [`CredentialMap`]
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Bearer token sent to the upstream endpoint
    pub api_key: SecretString,
    /// Base URL, without the `/chat/completions` or `/completions` suffix
    pub endpoint_url: String,
    /// Raw `mode` value; each adapter checks it against its own mode
    pub mode: Option<String>,
    /// Model context window in tokens
    pub context_size: u32,
    /// Upper bound on requested response tokens
    pub max_tokens: u32,
}

impl Credentials {
    /// Validate and type a host credential map
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or if `context_size` /
    /// `max_tokens` are present but not positive integers
    pub fn from_map(map: &CredentialMap) -> Result<Self, CredentialsError> {
        let api_key = map
            .get("api_key")
            .and_then(Value::as_str)
            .filter(|key| !key.trim().is_empty())
            .ok_or(CredentialsError::MissingApiKey)?;

        let endpoint_url = map
            .get("endpoint_url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT_URL)
            .to_owned();

        let mode = map.get("mode").and_then(Value::as_str).map(ToOwned::to_owned);

        Ok(Self {
            api_key: SecretString::from(api_key.to_owned()),
            endpoint_url,
            mode,
            context_size: read_positive(map, "context_size", DEFAULT_CONTEXT_SIZE)?,
            max_tokens: read_positive(map, "max_tokens", DEFAULT_MAX_TOKENS)?,
        })
    }

    /// Ensure the configured mode (if any) matches `expected`
    ///
    /// An absent `mode` is accepted: each adapter treats its own mode as the default.
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::ModeMismatch` on any other value
    pub fn ensure_mode(&self, expected: &str) -> Result<(), CredentialsError> {
        match self.mode.as_deref() {
            None => Ok(()),
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(CredentialsError::ModeMismatch {
                expected: expected.to_owned(),
                actual: actual.to_owned(),
            }),
        }
    }

    /// Expose the API key for building the `Authorization` header
    pub fn bearer_token(&self) -> &str {
        self.api_key.expose_secret()
    }
}

/// Read an optional positive integer, accepting JSON numbers or numeric strings
fn read_positive(map: &CredentialMap, field: &'static str, default: u32) -> Result<u32, CredentialsError> {
    let value = match map.get(field) {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(default),
        Some(Value::Number(n)) => n.as_i64().ok_or(CredentialsError::InvalidInteger { field })?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| CredentialsError::InvalidInteger { field })?,
        Some(_) => return Err(CredentialsError::InvalidInteger { field }),
    };

    if value <= 0 {
        return Err(CredentialsError::NonPositive { field });
    }

    u32::try_from(value).map_err(|_| CredentialsError::InvalidInteger { field })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> CredentialMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test fixture must be an object"),
        }
    }

    #[test]
    fn defaults_apply_when_optional_keys_absent() {
        let creds = Credentials::from_map(&map(json!({"api_key": "sk-test"}))).unwrap();

        assert_eq!(creds.endpoint_url, DEFAULT_ENDPOINT_URL);
        assert_eq!(creds.context_size, 4096);
        assert_eq!(creds.max_tokens, 2048);
        assert!(creds.mode.is_none());
        assert_eq!(creds.bearer_token(), "sk-test");
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = Credentials::from_map(&map(json!({"mode": "chat"}))).unwrap_err();
        assert!(matches!(err, CredentialsError::MissingApiKey));

        let err = Credentials::from_map(&map(json!({"api_key": "  "}))).unwrap_err();
        assert!(matches!(err, CredentialsError::MissingApiKey));
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let creds = Credentials::from_map(&map(json!({
            "api_key": "sk-test",
            "context_size": "8192",
            "max_tokens": 512
        })))
        .unwrap();

        assert_eq!(creds.context_size, 8192);
        assert_eq!(creds.max_tokens, 512);
    }

    #[test]
    fn invalid_integer_is_rejected() {
        let err = Credentials::from_map(&map(json!({"api_key": "sk-test", "context_size": "invalid"}))).unwrap_err();
        assert!(matches!(err, CredentialsError::InvalidInteger { field: "context_size" }));

        let err = Credentials::from_map(&map(json!({"api_key": "sk-test", "max_tokens": 1.5}))).unwrap_err();
        assert!(matches!(err, CredentialsError::InvalidInteger { field: "max_tokens" }));
    }

    #[test]
    fn non_positive_sizes_are_rejected() {
        let err = Credentials::from_map(&map(json!({"api_key": "sk-test", "max_tokens": 0}))).unwrap_err();
        assert!(matches!(err, CredentialsError::NonPositive { field: "max_tokens" }));

        let err = Credentials::from_map(&map(json!({"api_key": "sk-test", "context_size": "-1"}))).unwrap_err();
        assert!(matches!(err, CredentialsError::NonPositive { field: "context_size" }));
    }

    #[test]
    fn mode_mismatch_is_a_hard_failure() {
        let creds = Credentials::from_map(&map(json!({"api_key": "sk-test", "mode": "completion"}))).unwrap();

        assert!(creds.ensure_mode("completion").is_ok());
        let err = creds.ensure_mode("chat").unwrap_err();
        assert_eq!(err.to_string(), "this provider only supports chat mode, got `completion`");
    }

    #[test]
    fn absent_mode_matches_any_adapter() {
        let creds = Credentials::from_map(&map(json!({"api_key": "sk-test"}))).unwrap();
        assert!(creds.ensure_mode("chat").is_ok());
        assert!(creds.ensure_mode("completion").is_ok());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let creds = Credentials::from_map(&map(json!({"api_key": "sk-very-secret"}))).unwrap();
        assert!(!format!("{creds:?}").contains("sk-very-secret"));
    }
}
