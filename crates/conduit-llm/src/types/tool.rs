use serde::{Deserialize, Serialize};

/// A function the model may call (chat mode only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    /// Function name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the parameters
    #[serde(default)]
    pub parameters: serde_json::Value,
}

impl ToolDeclaration {
    /// Declare a function tool
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}
