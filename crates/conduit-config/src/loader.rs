use std::path::Path;

use crate::credentials::Credentials;
use crate::{Config, ProviderProfile};

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, placeholder expansion
    /// fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let config = Self::from_toml_str(&raw)?;

        tracing::debug!(
            path = %path.display(),
            providers = config.providers.len(),
            "loaded configuration"
        );

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if placeholder expansion, parsing, or validation fails
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that every provider profile is usable
    ///
    /// # Errors
    ///
    /// Returns an error if no profile is configured, a profile has no model,
    /// or a profile's credentials fail validation
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.providers.is_empty() {
            anyhow::bail!("at least one provider profile must be configured under [providers]");
        }

        for (name, profile) in &self.providers {
            if profile.model.trim().is_empty() {
                anyhow::bail!("provider '{name}' has an empty model name");
            }

            Credentials::from_map(&profile.credentials)
                .map_err(|e| anyhow::anyhow!("invalid credentials for provider '{name}': {e}"))?;

            if !matches!(profile.mode(), "chat" | "completion") {
                anyhow::bail!(
                    "provider '{name}' has unsupported mode '{}' (expected 'chat' or 'completion')",
                    profile.mode()
                );
            }
        }

        Ok(())
    }

    /// Look up a provider profile by name, or the first one when `name` is `None`
    ///
    /// # Errors
    ///
    /// Returns an error if the named profile does not exist
    pub fn provider(&self, name: Option<&str>) -> anyhow::Result<(&str, &ProviderProfile)> {
        match name {
            Some(name) => self
                .providers
                .get_key_value(name)
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| anyhow::anyhow!("provider '{name}' is not configured")),
            None => self
                .providers
                .first()
                .map(|(k, v)| (k.as_str(), v))
                .ok_or_else(|| anyhow::anyhow!("no provider profiles configured")),
        }
    }
}
