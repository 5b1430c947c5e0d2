use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use svcbridge_net::NetworkConfig;

use crate::dispatch::InterfaceMode;
use crate::native::InputLimits;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Payload unit repeated to build the benchmark input.
const PAYLOAD_UNIT: &[u8] = b"test_data";

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    network: NetworkSection,
    #[serde(default)]
    native: NativeSection,
    #[serde(default)]
    routing: RoutingSection,
    #[serde(default)]
    benchmark: BenchmarkSection,
}

#[derive(Deserialize, Default)]
struct NetworkSection {
    host: Option<String>,
    port: Option<u16>,
    timeout_ms: Option<u64>,
}

#[derive(Deserialize, Default)]
struct NativeSection {
    enabled: Option<bool>,
    library: Option<String>,
    symbol_prefix: Option<String>,
    max_input_bytes: Option<usize>,
}

#[derive(Deserialize, Default)]
struct RoutingSection {
    mode: Option<String>,
    prefer_native: Option<bool>,
}

#[derive(Deserialize, Default)]
struct BenchmarkSection {
    iterations: Option<u32>,
    service: Option<String>,
    function: Option<String>,
    payload_repeat: Option<usize>,
}

/// Settings for probing and calling the native extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeConfig {
    pub enabled: bool,
    /// Shared library implementing the extension. `None` means not installed.
    pub library: Option<PathBuf>,
    pub symbol_prefix: String,
    pub max_input_bytes: usize,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            library: None,
            symbol_prefix: "svcbridge_".to_string(),
            max_input_bytes: InputLimits::default().max_input_bytes,
        }
    }
}

impl NativeConfig {
    pub fn limits(&self) -> InputLimits {
        InputLimits {
            max_input_bytes: self.max_input_bytes,
            ..InputLimits::default()
        }
    }
}

/// How calls are routed between strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingConfig {
    pub mode: InterfaceMode,
    pub prefer_native: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            mode: InterfaceMode::Both,
            prefer_native: true,
        }
    }
}

/// What the benchmark calls and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkConfig {
    pub iterations: u32,
    pub service: String,
    pub function: String,
    pub payload_repeat: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            service: "CryptoService".to_string(),
            function: "hash_data".to_string(),
            payload_repeat: 1000,
        }
    }
}

impl BenchmarkConfig {
    /// The fixed input sent on every iteration.
    pub fn payload(&self) -> Vec<u8> {
        PAYLOAD_UNIT.repeat(self.payload_repeat)
    }
}

pub struct Config {
    network: NetworkSection,
    native: NativeSection,
    routing: RoutingSection,
    benchmark: BenchmarkSection,
}

impl Config {
    /// Embedded defaults merged with the user's config file, if there is one.
    pub fn load() -> Self {
        match user_config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Self::embedded(),
        }
    }

    /// Embedded defaults merged with the file at `path`.
    ///
    /// An unreadable or malformed file is logged and ignored.
    pub fn load_from(path: &Path) -> Self {
        let mut config = Self::embedded();
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                Ok(user) => config.merge(user),
                Err(e) => {
                    log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                }
            },
            Err(e) => {
                log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
            }
        }
        config
    }

    /// Embedded defaults merged with a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let user: ConfigFile = toml::from_str(contents)?;
        let mut config = Self::embedded();
        config.merge(user);
        Ok(config)
    }

    /// Only the embedded defaults.
    pub fn embedded() -> Self {
        let base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });
        Self {
            network: base.network,
            native: base.native,
            routing: base.routing,
            benchmark: base.benchmark,
        }
    }

    fn merge(&mut self, user: ConfigFile) {
        merge_network(&mut self.network, user.network);
        merge_native(&mut self.native, user.native);
        merge_routing(&mut self.routing, user.routing);
        merge_benchmark(&mut self.benchmark, user.benchmark);
    }

    pub fn network(&self) -> NetworkConfig {
        let fallback = NetworkConfig::default();
        NetworkConfig {
            host: self.network.host.clone().unwrap_or(fallback.host),
            port: self.network.port.unwrap_or(fallback.port),
            timeout: self
                .network
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(fallback.timeout),
        }
    }

    pub fn native(&self) -> NativeConfig {
        let fallback = NativeConfig::default();
        NativeConfig {
            enabled: self.native.enabled.unwrap_or(fallback.enabled),
            library: self
                .native
                .library
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            symbol_prefix: self
                .native
                .symbol_prefix
                .clone()
                .unwrap_or(fallback.symbol_prefix),
            max_input_bytes: self.native.max_input_bytes.unwrap_or(fallback.max_input_bytes),
        }
    }

    pub fn routing(&self) -> RoutingConfig {
        let fallback = RoutingConfig::default();
        RoutingConfig {
            mode: self
                .routing
                .mode
                .as_deref()
                .and_then(parse_mode)
                .unwrap_or(fallback.mode),
            prefer_native: self.routing.prefer_native.unwrap_or(fallback.prefer_native),
        }
    }

    /// Benchmark settings. Iterations are clamped to at least 1.
    pub fn benchmark(&self) -> BenchmarkConfig {
        let fallback = BenchmarkConfig::default();
        BenchmarkConfig {
            iterations: self.benchmark.iterations.unwrap_or(fallback.iterations).max(1),
            service: self.benchmark.service.clone().unwrap_or(fallback.service),
            function: self.benchmark.function.clone().unwrap_or(fallback.function),
            payload_repeat: self
                .benchmark
                .payload_repeat
                .unwrap_or(fallback.payload_repeat),
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("svcbridge").join("config.toml"))
}

fn merge_network(base: &mut NetworkSection, user: NetworkSection) {
    if user.host.is_some() {
        base.host = user.host;
    }
    if user.port.is_some() {
        base.port = user.port;
    }
    if user.timeout_ms.is_some() {
        base.timeout_ms = user.timeout_ms;
    }
}

fn merge_native(base: &mut NativeSection, user: NativeSection) {
    if user.enabled.is_some() {
        base.enabled = user.enabled;
    }
    if user.library.is_some() {
        base.library = user.library;
    }
    if user.symbol_prefix.is_some() {
        base.symbol_prefix = user.symbol_prefix;
    }
    if user.max_input_bytes.is_some() {
        base.max_input_bytes = user.max_input_bytes;
    }
}

fn merge_routing(base: &mut RoutingSection, user: RoutingSection) {
    if user.mode.is_some() {
        base.mode = user.mode;
    }
    if user.prefer_native.is_some() {
        base.prefer_native = user.prefer_native;
    }
}

fn merge_benchmark(base: &mut BenchmarkSection, user: BenchmarkSection) {
    if user.iterations.is_some() {
        base.iterations = user.iterations;
    }
    if user.service.is_some() {
        base.service = user.service;
    }
    if user.function.is_some() {
        base.function = user.function;
    }
    if user.payload_repeat.is_some() {
        base.payload_repeat = user.payload_repeat;
    }
}

fn parse_mode(s: &str) -> Option<InterfaceMode> {
    match s.to_lowercase().as_str() {
        "both" | "auto" => Some(InterfaceMode::Both),
        "network" | "http" => Some(InterfaceMode::Network),
        "native" | "ffi" => Some(InterfaceMode::Native),
        _ => None,
    }
}
