//! Error taxonomy for service calls.
//!
//! Only [`CallError::Unavailable`] is recoverable by switching strategy.
//! Everything else describes a call that reached its transport and failed,
//! and must reach the caller unchanged.

use std::fmt;

use crate::strategy::StrategyKind;
use crate::CallValue;

/// Result type for strategy invocations.
pub type CallResult<T = CallValue> = Result<T, CallError>;

/// A reachable transport failed to complete the call.
#[derive(Debug)]
pub enum ExecutionError {
    /// The request never got a response (connection refused, timeout, I/O).
    Transport(String),
    /// The endpoint answered with a non-success HTTP status.
    Status { code: u16, body: String },
    /// The response body did not parse as the expected JSON.
    MalformedResponse(String),
    /// The callee ran and reported a failure of its own.
    Remote(String),
    /// The arguments were rejected before crossing the boundary.
    InvalidArguments(String),
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Status { code, body } if body.is_empty() => write!(f, "HTTP status {}", code),
            Self::Status { code, body } => write!(f, "HTTP status {}: {}", code, body),
            Self::MalformedResponse(msg) => write!(f, "malformed response: {}", msg),
            Self::Remote(msg) => write!(f, "call failed: {}", msg),
            Self::InvalidArguments(msg) => write!(f, "invalid arguments: {}", msg),
        }
    }
}

impl std::error::Error for ExecutionError {}

/// Error from invoking a strategy or dispatching a call.
#[derive(Debug)]
pub enum CallError {
    /// The strategy cannot be used in this environment. Triggers fallback.
    Unavailable {
        strategy: StrategyKind,
        reason: String,
    },
    /// The strategy was usable but the call failed. Never triggers fallback.
    Execution {
        strategy: StrategyKind,
        cause: ExecutionError,
    },
    /// The native strategy was unavailable and the network fallback failed too.
    FallbackFailed {
        unavailable_reason: String,
        fallback: Box<CallError>,
    },
}

impl CallError {
    pub fn unavailable(strategy: StrategyKind, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            strategy,
            reason: reason.into(),
        }
    }

    pub fn execution(strategy: StrategyKind, cause: ExecutionError) -> Self {
        Self::Execution { strategy, cause }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution { .. })
    }

    /// True for a `MalformedResponse` execution error, including one reached through fallback.
    pub fn is_malformed_response(&self) -> bool {
        match self {
            Self::Execution {
                cause: ExecutionError::MalformedResponse(_),
                ..
            } => true,
            Self::FallbackFailed { fallback, .. } => fallback.is_malformed_response(),
            _ => false,
        }
    }

    /// The strategy that produced this error. For a failed fallback, the fallback's.
    pub fn strategy(&self) -> StrategyKind {
        match self {
            Self::Unavailable { strategy, .. } | Self::Execution { strategy, .. } => *strategy,
            Self::FallbackFailed { fallback, .. } => fallback.strategy(),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { strategy, reason } => {
                write!(f, "{} strategy unavailable: {}", strategy, reason)
            }
            Self::Execution { strategy, cause } => write!(f, "{} strategy: {}", strategy, cause),
            Self::FallbackFailed {
                unavailable_reason,
                fallback,
            } => write!(
                f,
                "native strategy unavailable ({}) and fallback failed: {}",
                unavailable_reason, fallback
            ),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Unavailable { .. } => None,
            Self::Execution { cause, .. } => Some(cause),
            Self::FallbackFailed { fallback, .. } => Some(fallback.as_ref()),
        }
    }
}
