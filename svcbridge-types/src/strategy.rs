//! Invocation strategy abstraction for native and network execution.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{CallError, CallResult, ExecutionError};
use crate::{CallValue, ServiceCallRequest};

/// Which transport a strategy uses.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Direct in-process call into a loaded extension.
    Native,
    /// HTTP request to a service endpoint.
    Network,
}

impl StrategyKind {
    /// Stable name used in logs and benchmark reports.
    pub fn name(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Network => "network",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait for calling a named function on a named service.
///
/// Implementations can be native (in-process extension) or network (HTTP).
/// They are interchangeable: callers only see the `CallResult`, and decide
/// what to do next from whether the error is an unavailability or an
/// execution failure.
pub trait InvocationStrategy {
    /// The transport this strategy uses.
    fn kind(&self) -> StrategyKind;

    /// Invoke the request and return the strategy-defined result.
    fn invoke(&self, request: &ServiceCallRequest) -> CallResult;
}

impl<S: InvocationStrategy + ?Sized> InvocationStrategy for Box<S> {
    fn kind(&self) -> StrategyKind {
        (**self).kind()
    }

    fn invoke(&self, request: &ServiceCallRequest) -> CallResult {
        (**self).invoke(request)
    }
}

impl<S: InvocationStrategy + ?Sized> InvocationStrategy for Rc<S> {
    fn kind(&self) -> StrategyKind {
        (**self).kind()
    }

    fn invoke(&self, request: &ServiceCallRequest) -> CallResult {
        (**self).invoke(request)
    }
}

/// Scripted behaviour for `TestStrategy`.
#[derive(Debug, Clone)]
pub enum TestOutcome {
    /// Return the argument list as a JSON array.
    Echo,
    /// Return this value.
    Value(CallValue),
    /// Fail as unavailable with this reason.
    Unavailable(String),
    /// Fail with a remote execution error carrying this message.
    Fail(String),
    /// Fail with a malformed-response execution error.
    Malformed(String),
}

/// A test strategy that records every request it receives.
///
/// Share it through `Rc<TestStrategy>` to hand one clone to a dispatcher and
/// keep another for assertions.
pub struct TestStrategy {
    kind: StrategyKind,
    outcome: TestOutcome,
    fail_at: Option<(usize, String)>,
    calls: RefCell<Vec<ServiceCallRequest>>,
}

impl TestStrategy {
    pub fn new(kind: StrategyKind, outcome: TestOutcome) -> Self {
        Self {
            kind,
            outcome,
            fail_at: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn echo(kind: StrategyKind) -> Self {
        Self::new(kind, TestOutcome::Echo)
    }

    /// Make the call with zero-based index `call_index` fail with `message`.
    pub fn failing_at(mut self, call_index: usize, message: impl Into<String>) -> Self {
        self.fail_at = Some((call_index, message.into()));
        self
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// All requests received so far.
    pub fn calls(&self) -> Vec<ServiceCallRequest> {
        self.calls.borrow().clone()
    }

    /// Forget recorded requests.
    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl InvocationStrategy for TestStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn invoke(&self, request: &ServiceCallRequest) -> CallResult {
        let index = self.call_count();
        self.calls.borrow_mut().push(request.clone());

        if let Some((fail_index, message)) = &self.fail_at {
            if *fail_index == index {
                return Err(CallError::execution(
                    self.kind,
                    ExecutionError::Remote(message.clone()),
                ));
            }
        }

        match &self.outcome {
            TestOutcome::Echo => Ok(CallValue::Array(request.arguments().to_vec())),
            TestOutcome::Value(value) => Ok(value.clone()),
            TestOutcome::Unavailable(reason) => Err(CallError::unavailable(self.kind, reason.clone())),
            TestOutcome::Fail(message) => Err(CallError::execution(
                self.kind,
                ExecutionError::Remote(message.clone()),
            )),
            TestOutcome::Malformed(message) => Err(CallError::execution(
                self.kind,
                ExecutionError::MalformedResponse(message.clone()),
            )),
        }
    }
}
