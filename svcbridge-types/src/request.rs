//! The request handed to every invocation strategy.

use serde::{Deserialize, Serialize};

/// Opaque argument and result value. Both transports speak JSON.
pub type CallValue = serde_json::Value;

/// A call of `function_name` on `service_name` with ordered arguments.
///
/// Built once per call and only borrowed by strategies, so it cannot change
/// between a failed native attempt and the network fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCallRequest {
    service_name: String,
    function_name: String,
    arguments: Vec<CallValue>,
}

impl ServiceCallRequest {
    pub fn new(
        service_name: impl Into<String>,
        function_name: impl Into<String>,
        arguments: Vec<CallValue>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            function_name: function_name.into(),
            arguments,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn arguments(&self) -> &[CallValue] {
        &self.arguments
    }

    /// Render the argument list as the JSON array sent over either transport.
    pub fn args_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.arguments)
    }

    /// Rough size of the arguments in bytes, used for routing and input limits.
    pub fn estimated_argument_bytes(&self) -> usize {
        self.arguments.iter().map(estimated_size).sum()
    }
}

/// Estimate the in-memory payload size of a value (rough approximation).
pub fn estimated_size(value: &CallValue) -> usize {
    match value {
        CallValue::Null => 0,
        CallValue::Bool(_) => 1,
        CallValue::Number(_) => 8,
        CallValue::String(s) => s.len(),
        CallValue::Array(items) => items.iter().map(estimated_size).sum(),
        CallValue::Object(map) => map.iter().map(|(k, v)| k.len() + estimated_size(v)).sum(),
    }
}
