//! # svcbridge-types
//!
//! Shared type definitions for svcbridge.
//! This crate contains the call request, the error taxonomy and the strategy
//! contract used by svcbridge-core, svcbridge-net and the `svcbridge` binary.

mod availability;
pub mod error;
mod request;
pub mod strategy;

pub use availability::Availability;
pub use error::{CallError, CallResult, ExecutionError};
pub use request::{estimated_size, CallValue, ServiceCallRequest};
pub use strategy::{InvocationStrategy, StrategyKind, TestOutcome, TestStrategy};
