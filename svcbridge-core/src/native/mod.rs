//! Native strategy: direct in-process calls into a loaded extension.

mod dylib;
mod limits;

pub use dylib::DylibModule;
pub use limits::InputLimits;

use log::info;

use svcbridge_types::{
    Availability, CallError, CallResult, CallValue, ExecutionError, InvocationStrategy,
    ServiceCallRequest, StrategyKind,
};

use crate::config::{Config, NativeConfig};
use crate::dispatch::InterfaceMode;

/// The native extension boundary: a runtime that can call service functions.
pub trait NativeModule {
    /// Call `function_name` on `service_name` with `args`.
    fn call_function(
        &self,
        service_name: &str,
        function_name: &str,
        args: &[CallValue],
    ) -> Result<CallValue, ExecutionError>;
}

/// Strategy that calls a native extension without leaving the process.
pub struct NativeStrategy {
    module: Box<dyn NativeModule>,
    limits: InputLimits,
}

impl NativeStrategy {
    pub fn new(module: Box<dyn NativeModule>, limits: InputLimits) -> Self {
        Self { module, limits }
    }

    /// Probe once for the native extension described by `config`.
    pub fn detect(config: &NativeConfig) -> Availability<NativeStrategy> {
        if !config.enabled {
            return Availability::unavailable("native strategy disabled in config");
        }

        let Some(path) = config.library.as_deref() else {
            info!("No native library configured; native strategy unavailable");
            return Availability::unavailable("no native library configured");
        };

        match DylibModule::load(path, &config.symbol_prefix) {
            Ok(module) => {
                info!("Loaded native extension from {}", path.display());
                Availability::Available(Self::new(Box::new(module), config.limits()))
            }
            Err(reason) => {
                info!("Native strategy unavailable: {}", reason);
                Availability::unavailable(reason)
            }
        }
    }

    /// Detect for a full config. Network mode never probes the library.
    pub fn for_config(config: &Config) -> Availability<Box<dyn InvocationStrategy>> {
        if config.routing().mode == InterfaceMode::Network {
            return Availability::unavailable("interface mode is network");
        }
        Self::detect(&config.native()).map(|s| Box::new(s) as Box<dyn InvocationStrategy>)
    }

    pub fn limits(&self) -> InputLimits {
        self.limits
    }
}

impl InvocationStrategy for NativeStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Native
    }

    fn invoke(&self, request: &ServiceCallRequest) -> CallResult {
        self.limits
            .check(request.arguments())
            .and_then(|()| {
                self.module.call_function(
                    request.service_name(),
                    request.function_name(),
                    request.arguments(),
                )
            })
            .map_err(|cause| CallError::execution(StrategyKind::Native, cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    /// Returns `{"service", "function", "args"}` so tests can see what arrived.
    struct MirrorModule;

    impl NativeModule for MirrorModule {
        fn call_function(
            &self,
            service_name: &str,
            function_name: &str,
            args: &[CallValue],
        ) -> Result<CallValue, ExecutionError> {
            if function_name == "explode" {
                return Err(ExecutionError::Remote("explode always fails".into()));
            }
            Ok(json!({
                "service": service_name,
                "function": function_name,
                "args": args,
            }))
        }
    }

    fn strategy() -> NativeStrategy {
        NativeStrategy::new(Box::new(MirrorModule), InputLimits::default())
    }

    #[test]
    fn test_invoke_passes_request_through() {
        let req = ServiceCallRequest::new("CryptoService", "hash_data", vec![json!("abc")]);
        let result = strategy().invoke(&req).unwrap();
        assert_eq!(result["service"], "CryptoService");
        assert_eq!(result["function"], "hash_data");
        assert_eq!(result["args"], json!(["abc"]));
    }

    #[test]
    fn test_module_failure_is_execution_error() {
        let req = ServiceCallRequest::new("CryptoService", "explode", vec![]);
        let err = strategy().invoke(&req).unwrap_err();
        assert!(err.is_execution());
        assert_eq!(err.strategy(), StrategyKind::Native);
    }

    #[test]
    fn test_invalid_arguments_never_reach_module() {
        let req = ServiceCallRequest::new("CryptoService", "hash_data", vec![json!("a\u{0}b")]);
        let err = strategy().invoke(&req).unwrap_err();
        assert!(matches!(
            err,
            CallError::Execution {
                cause: ExecutionError::InvalidArguments(_),
                ..
            }
        ));
    }

    #[test]
    fn test_detect_disabled() {
        let config = NativeConfig {
            enabled: false,
            library: Some(PathBuf::from("/does/not/matter.so")),
            ..NativeConfig::default()
        };
        let found = NativeStrategy::detect(&config);
        assert_eq!(found.reason(), Some("native strategy disabled in config"));
    }

    #[test]
    fn test_detect_without_library() {
        let found = NativeStrategy::detect(&NativeConfig::default());
        assert!(!found.is_available());
        assert_eq!(found.reason(), Some("no native library configured"));
    }

    #[test]
    fn test_detect_missing_library() {
        let dir = tempfile::tempdir().unwrap();
        let config = NativeConfig {
            library: Some(dir.path().join("libsvcbridge_ext.so")),
            ..NativeConfig::default()
        };
        let found = NativeStrategy::detect(&config);
        assert!(!found.is_available());
        assert!(found.reason().unwrap().contains("not found"));
    }

    #[test]
    fn test_network_mode_skips_detection() {
        let config = Config::from_toml_str(
            "[routing]\nmode = \"network\"\n[native]\nlibrary = \"/opt/ext/libsvc.so\"\n",
        )
        .unwrap();
        let found = NativeStrategy::for_config(&config);
        assert_eq!(found.reason(), Some("interface mode is network"));

        let both = Config::from_toml_str("[native]\nlibrary = \"/opt/ext/libsvc.so\"\n").unwrap();
        assert!(NativeStrategy::for_config(&both).reason().unwrap().contains("not found"));
    }
}
