//! Auto routing for calls made without an explicit strategy preference.
//!
//! Compute-heavy, high-frequency calls go native; network-bound calls go
//! over HTTP. Function-name hints win over service profiles.

use std::collections::HashMap;

use svcbridge_types::{ServiceCallRequest, StrategyKind};

/// Argument payloads below this many bytes are cheap to call natively.
const SMALL_PAYLOAD_BYTES: usize = 1024;

const NETWORK_PATTERNS: &[&str] = &[
    "chain::",
    "database::",
    "network_",
    "remote_",
    "fetch",
    "request",
    "api_",
    "http_",
    "web_",
];

const COMPUTE_PATTERNS: &[&str] = &[
    "hash",
    "sign",
    "verify",
    "encrypt",
    "decrypt",
    "compute",
    "calculate",
    "process",
    "transform",
    "batch_",
    "parallel_",
    "fast_",
    "crypto::",
];

/// Expected call rate for a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallFrequency {
    /// < 10 calls/sec
    Low,
    /// 10-1000 calls/sec
    Medium,
    /// > 1000 calls/sec
    High,
}

/// What a service does, registered ahead of time to guide routing.
#[derive(Debug, Clone)]
pub struct ServiceProfile {
    pub name: String,
    pub has_network_operations: bool,
    pub has_compute_operations: bool,
    pub call_frequency: CallFrequency,
}

impl ServiceProfile {
    /// Service-level routing hint. `None` means mixed, decide per call.
    pub fn preferred_strategy(&self) -> Option<StrategyKind> {
        if self.call_frequency == CallFrequency::High {
            return Some(StrategyKind::Native);
        }
        match (self.has_network_operations, self.has_compute_operations) {
            (true, false) => Some(StrategyKind::Network),
            (false, true) => Some(StrategyKind::Native),
            _ => None,
        }
    }
}

/// Classify a function by name. `None` when it looks like both or neither.
pub fn function_hint(function_name: &str) -> Option<StrategyKind> {
    let network = NETWORK_PATTERNS.iter().any(|p| function_name.contains(p));
    let compute = COMPUTE_PATTERNS.iter().any(|p| function_name.contains(p));
    match (network, compute) {
        (true, false) => Some(StrategyKind::Network),
        (false, true) => Some(StrategyKind::Native),
        _ => None,
    }
}

/// Picks a strategy for calls that carry no explicit preference.
#[derive(Debug, Default)]
pub struct InterfaceSelector {
    profiles: HashMap<String, ServiceProfile>,
}

impl InterfaceSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service profile for better routing decisions.
    pub fn register_service(&mut self, profile: ServiceProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn has_service(&self, service_name: &str) -> bool {
        self.profiles.contains_key(service_name)
    }

    pub fn service_count(&self) -> usize {
        self.profiles.len()
    }

    /// Select the strategy for a call.
    pub fn select(&self, request: &ServiceCallRequest, native_available: bool) -> StrategyKind {
        if !native_available {
            return StrategyKind::Network;
        }

        if let Some(kind) = function_hint(request.function_name()) {
            return kind;
        }

        if let Some(kind) = self
            .profiles
            .get(request.service_name())
            .and_then(ServiceProfile::preferred_strategy)
        {
            return kind;
        }

        if request.estimated_argument_bytes() < SMALL_PAYLOAD_BYTES {
            return StrategyKind::Native;
        }

        if NETWORK_PATTERNS
            .iter()
            .any(|p| request.service_name().contains(p))
        {
            StrategyKind::Network
        } else {
            StrategyKind::Native
        }
    }

    pub fn prefers_native(&self, request: &ServiceCallRequest, native_available: bool) -> bool {
        self.select(request, native_available) == StrategyKind::Native
    }
}
