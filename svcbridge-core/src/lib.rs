//! # svcbridge-core
//!
//! Routes service calls between a native in-process extension and an HTTP
//! fallback, and benchmarks the two against each other.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use svcbridge_core::config::Config;
//! use svcbridge_core::dispatch::CallDispatcher;
//! use svcbridge_core::bench::BenchmarkHarness;
//! use svcbridge_types::ServiceCallRequest;
//!
//! // 1. Embedded defaults merged with ~/.config/svcbridge/config.toml
//! let config = Config::load();
//!
//! // 2. Native detection runs once; the network strategy is always there
//! let dispatcher = CallDispatcher::from_config(&config)?;
//! let request = ServiceCallRequest::new("CryptoService", "hash_data", vec!["abc".into()]);
//! let digest = dispatcher.dispatch(&request, true)?;
//!
//! // 3. Time both strategies over the configured payload
//! let bench = config.benchmark();
//! let report = BenchmarkHarness::from_config(&config)?.run(bench.iterations, &bench.payload())?;
//! println!("{:?}", report.speedup_ratio());
//! ```
//!
//! ## Module Overview
//!
//! - [`dispatch`]: `CallDispatcher` (unavailability-only fallback), `InterfaceMode`,
//!   `InterfaceSelector` auto routing
//! - [`native`]: `NativeStrategy`, the `NativeModule` boundary and the shared-library loader
//! - [`bench`]: `BenchmarkHarness`, samples, report and speedup ratio
//! - [`config`]: TOML configuration loading (embedded + user override)

pub mod bench;
pub mod config;
pub mod dispatch;
pub mod native;

pub use bench::{BenchmarkError, BenchmarkHarness, BenchmarkReport, BenchmarkSample};
pub use config::Config;
pub use dispatch::{CallDispatcher, InterfaceMode};
pub use native::{NativeModule, NativeStrategy};
