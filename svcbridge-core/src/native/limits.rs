//! Input checks applied before arguments cross the native boundary.

use svcbridge_types::{CallValue, ExecutionError};

/// Resource limits for native calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    /// Upper bound on the serialized JSON argument list, in bytes.
    pub max_input_bytes: usize,
    /// Upper bound on elements in any single array or object.
    pub max_collection_len: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_input_bytes: 10_000_000,
            max_collection_len: 100_000,
        }
    }
}

impl InputLimits {
    /// Validate an argument list. Failures are execution errors, not unavailability.
    pub fn check(&self, args: &[CallValue]) -> Result<(), ExecutionError> {
        if args.len() > self.max_collection_len {
            return Err(ExecutionError::InvalidArguments(format!(
                "too many arguments: {} (max: {})",
                args.len(),
                self.max_collection_len
            )));
        }

        for value in args {
            self.check_value(value)?;
        }

        let size = serde_json::to_vec(args)
            .map_err(|e| ExecutionError::InvalidArguments(e.to_string()))?
            .len();
        if size > self.max_input_bytes {
            return Err(ExecutionError::InvalidArguments(format!(
                "input too large: {} bytes (max: {} bytes)",
                size, self.max_input_bytes
            )));
        }

        Ok(())
    }

    fn check_value(&self, value: &CallValue) -> Result<(), ExecutionError> {
        match value {
            CallValue::String(s) if s.contains('\0') => Err(ExecutionError::InvalidArguments(
                "string contains null bytes".to_string(),
            )),
            CallValue::Array(items) => {
                if items.len() > self.max_collection_len {
                    return Err(ExecutionError::InvalidArguments(format!(
                        "array too large: {} elements",
                        items.len()
                    )));
                }
                items.iter().try_for_each(|item| self.check_value(item))
            }
            CallValue::Object(map) => {
                if map.len() > self.max_collection_len {
                    return Err(ExecutionError::InvalidArguments(format!(
                        "object too large: {} entries",
                        map.len()
                    )));
                }
                for (key, item) in map {
                    if key.contains('\0') {
                        return Err(ExecutionError::InvalidArguments(
                            "object key contains null bytes".to_string(),
                        ));
                    }
                    self.check_value(item)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
