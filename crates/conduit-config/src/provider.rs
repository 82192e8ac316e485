use std::fmt;

use serde::Deserialize;
use serde_json::Value;

use crate::credentials::CredentialMap;

/// A named upstream profile from the config file
///
/// `model` is pulled out; every other key is handed to the adapter as its
/// credential map.
#[derive(Deserialize)]
pub struct ProviderProfile {
    /// Model identifier sent in every request
    pub model: String,
    /// Remaining keys (`api_key`, `endpoint_url`, `mode`, `context_size`, `max_tokens`)
    #[serde(flatten)]
    pub credentials: CredentialMap,
}

impl ProviderProfile {
    /// Configured `mode`, defaulting to `chat`
    pub fn mode(&self) -> &str {
        self.credentials.get("mode").and_then(Value::as_str).unwrap_or("chat")
    }
}

impl fmt::Debug for ProviderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.credentials.keys().map(String::as_str).collect();
        f.debug_struct("ProviderProfile")
            .field("model", &self.model)
            .field("mode", &self.mode())
            .field("credential_keys", &keys)
            .finish()
    }
}
