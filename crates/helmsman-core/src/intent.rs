//! Intent types for the Helmsman engine.
//!
//! An Intent is the structured description of a desired operation,
//! produced by an upstream text-understanding service. This core never
//! parses natural language itself.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HelmsmanError, Result};

/// A structured, pre-parsed description of a desired operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    /// The operation to perform (e.g., "provision_vm", "create_bucket").
    pub operation: String,

    /// Parameters describing the desired resource(s). Opaque to the
    /// orchestration core; interpreted by strategies and the cost
    /// estimator.
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Confidence reported by the upstream parser (0.0 to 1.0).
    pub confidence: f32,
}

impl Intent {
    /// Create a new IntentBuilder.
    pub fn builder() -> IntentBuilder {
        IntentBuilder::new()
    }

    /// Fetch a parameter by name.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Fetch a numeric parameter, if present and numeric.
    pub fn parameter_u64(&self, name: &str) -> Option<u64> {
        self.parameters.get(name).and_then(Value::as_u64)
    }

    /// Fetch a string parameter, if present and a string.
    pub fn parameter_str(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).and_then(Value::as_str)
    }

    /// Validate the intent.
    pub fn validate(&self) -> Result<()> {
        if self.operation.trim().is_empty() {
            return Err(HelmsmanError::IntentInvalid {
                message: "Intent operation cannot be empty".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(HelmsmanError::IntentInvalid {
                message: format!("Confidence must be in [0, 1], got {}", self.confidence),
            });
        }

        Ok(())
    }
}

/// Builder for creating Intents with a fluent API.
#[derive(Debug, Default)]
pub struct IntentBuilder {
    operation: Option<String>,
    parameters: Map<String, Value>,
    confidence: Option<f32>,
}

impl IntentBuilder {
    /// Create a new IntentBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the operation.
    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Add a parameter.
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Set the parser confidence.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Build the Intent.
    pub fn build(self) -> Result<Intent> {
        let operation = self.operation.ok_or_else(|| HelmsmanError::IntentInvalid {
            message: "Intent operation is required".to_string(),
        })?;

        let intent = Intent {
            operation,
            parameters: self.parameters,
            confidence: self.confidence.unwrap_or(1.0),
        };
        intent.validate()?;

        Ok(intent)
    }
}
