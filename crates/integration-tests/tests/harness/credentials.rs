//! Credential maps for pointing adapters at a mock upstream

use conduit_config::CredentialMap;
use serde_json::Value;

/// API key every test sends
pub const API_KEY: &str = "sk-test-key";

/// Builder for host credential maps
pub struct CredentialsBuilder {
    map: CredentialMap,
}

impl CredentialsBuilder {
    /// Credentials with the test API key and `endpoint_url` set
    pub fn new(endpoint_url: &str) -> Self {
        let mut map = CredentialMap::new();
        map.insert("api_key".to_owned(), Value::from(API_KEY));
        map.insert("endpoint_url".to_owned(), Value::from(endpoint_url));
        Self { map }
    }

    /// Set `mode`
    pub fn mode(self, mode: &str) -> Self {
        self.with("mode", mode)
    }

    /// Set any key
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.map.insert(key.to_owned(), value.into());
        self
    }

    /// Remove a key
    pub fn without(mut self, key: &str) -> Self {
        self.map.remove(key);
        self
    }

    /// Finished map
    pub fn build(self) -> CredentialMap {
        self.map
    }
}
