//! Call dispatch between the native and network strategies.
//!
//! Only unavailability fails over. A native strategy that is present but
//! fails a call surfaces that failure unchanged.

mod selector;

pub use selector::{function_hint, CallFrequency, InterfaceSelector, ServiceProfile};

use std::io;

use log::{debug, warn};

use svcbridge_net::NetworkStrategy;
use svcbridge_types::{
    Availability, CallError, CallResult, InvocationStrategy, ServiceCallRequest, StrategyKind,
};

use crate::config::Config;
use crate::native::NativeStrategy;

/// Which strategies the dispatcher may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterfaceMode {
    /// Native first when preferred, network on unavailability.
    #[default]
    Both,
    /// Network only. The native strategy is never touched.
    Network,
    /// Native only. Unavailability is returned, never masked.
    Native,
}

pub struct CallDispatcher {
    mode: InterfaceMode,
    prefer_native: bool,
    native: Availability<Box<dyn InvocationStrategy>>,
    network: Box<dyn InvocationStrategy>,
    selector: InterfaceSelector,
}

impl CallDispatcher {
    pub fn new(
        native: Availability<Box<dyn InvocationStrategy>>,
        network: Box<dyn InvocationStrategy>,
    ) -> Self {
        Self {
            mode: InterfaceMode::Both,
            prefer_native: true,
            native,
            network,
            selector: InterfaceSelector::new(),
        }
    }

    /// Build both strategies from config. Native detection runs once, here.
    pub fn from_config(config: &Config) -> io::Result<Self> {
        let routing = config.routing();
        let network = NetworkStrategy::new(&config.network())?;
        let native = NativeStrategy::for_config(config);

        Ok(Self::new(native, Box::new(network))
            .with_mode(routing.mode)
            .with_prefer_native(routing.prefer_native))
    }

    pub fn with_mode(mut self, mode: InterfaceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Preference used by [`CallDispatcher::call`].
    pub fn with_prefer_native(mut self, prefer_native: bool) -> Self {
        self.prefer_native = prefer_native;
        self
    }

    pub fn with_selector(mut self, selector: InterfaceSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn mode(&self) -> InterfaceMode {
        self.mode
    }

    pub fn native_available(&self) -> bool {
        self.native.is_available()
    }

    pub fn selector_mut(&mut self) -> &mut InterfaceSelector {
        &mut self.selector
    }

    /// Dispatch with the configured preference.
    pub fn call(&self, request: &ServiceCallRequest) -> CallResult {
        self.dispatch(request, self.prefer_native)
    }

    /// Dispatch with the preference chosen by the selector.
    pub fn dispatch_auto(&self, request: &ServiceCallRequest) -> CallResult {
        let native_available = self.mode != InterfaceMode::Network && self.native_available();
        let prefer_native = self.selector.prefers_native(request, native_available);
        debug!(
            "auto route {}::{} -> {}",
            request.service_name(),
            request.function_name(),
            if prefer_native { "native" } else { "network" }
        );
        self.dispatch(request, prefer_native)
    }

    /// Dispatch one call.
    ///
    /// In `Both` mode with `prefer_native`, native unavailability falls back to
    /// the network strategy. If that fails too, the result is
    /// [`CallError::FallbackFailed`] carrying both causes.
    pub fn dispatch(&self, request: &ServiceCallRequest, prefer_native: bool) -> CallResult {
        match self.mode {
            InterfaceMode::Network => self.network.invoke(request),
            InterfaceMode::Native => self.invoke_native(request),
            InterfaceMode::Both if !prefer_native => self.network.invoke(request),
            InterfaceMode::Both => match self.invoke_native(request) {
                Err(CallError::Unavailable { reason, .. }) => {
                    warn!(
                        "native unavailable for {}::{} ({}), falling back to network",
                        request.service_name(),
                        request.function_name(),
                        reason
                    );
                    self.network
                        .invoke(request)
                        .map_err(|fallback| CallError::FallbackFailed {
                            unavailable_reason: reason,
                            fallback: Box::new(fallback),
                        })
                }
                other => other,
            },
        }
    }

    fn invoke_native(&self, request: &ServiceCallRequest) -> CallResult {
        match &self.native {
            Availability::Available(strategy) => strategy.invoke(request),
            Availability::Unavailable { reason } => {
                Err(CallError::unavailable(StrategyKind::Native, reason.clone()))
            }
        }
    }
}
