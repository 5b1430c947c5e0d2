//! Throughput benchmark over the available strategies.

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use log::{error, info};

use svcbridge_net::NetworkStrategy;
use svcbridge_types::{
    Availability, CallError, CallValue, InvocationStrategy, ServiceCallRequest, StrategyKind,
};

use crate::config::{BenchmarkConfig, Config};
use crate::native::NativeStrategy;

/// Timing for one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkSample {
    pub strategy_name: String,
    pub iteration_count: u32,
    pub elapsed_seconds: f64,
    pub throughput_ops_per_sec: f64,
}

impl BenchmarkSample {
    pub fn new(strategy_name: impl Into<String>, iteration_count: u32, elapsed: Duration) -> Self {
        let elapsed_seconds = elapsed.as_secs_f64();
        Self {
            strategy_name: strategy_name.into(),
            iteration_count,
            elapsed_seconds,
            throughput_ops_per_sec: throughput(iteration_count, elapsed_seconds),
        }
    }
}

/// Operations per second. A zero elapsed time yields `f64::INFINITY`.
pub fn throughput(iteration_count: u32, elapsed_seconds: f64) -> f64 {
    if elapsed_seconds > 0.0 {
        f64::from(iteration_count) / elapsed_seconds
    } else {
        f64::INFINITY
    }
}

/// Samples keyed by strategy name, plus the strategies that were skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkReport {
    samples: BTreeMap<String, BenchmarkSample>,
    skipped: BTreeMap<String, String>,
}

impl BenchmarkReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sample: BenchmarkSample) {
        self.samples.insert(sample.strategy_name.clone(), sample);
    }

    /// Record a strategy left out of the run because it was unavailable.
    pub fn skip(&mut self, kind: StrategyKind, reason: impl Into<String>) {
        self.skipped.insert(kind.name().to_string(), reason.into());
    }

    pub fn samples(&self) -> impl Iterator<Item = &BenchmarkSample> {
        self.samples.values()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn sample(&self, kind: StrategyKind) -> Option<&BenchmarkSample> {
        self.samples.get(kind.name())
    }

    pub fn skipped_reason(&self, kind: StrategyKind) -> Option<&str> {
        self.skipped.get(kind.name()).map(String::as_str)
    }

    /// Native throughput over network throughput.
    ///
    /// `None` unless both samples exist with finite, positive throughput.
    pub fn speedup_ratio(&self) -> Option<f64> {
        let native = self.sample(StrategyKind::Native)?.throughput_ops_per_sec;
        let network = self.sample(StrategyKind::Network)?.throughput_ops_per_sec;
        let usable = |t: f64| t.is_finite() && t > 0.0;
        (usable(native) && usable(network)).then(|| native / network)
    }
}

/// One strategy's measurement aborted by a failing call.
#[derive(Debug)]
pub struct StrategyFailure {
    pub strategy: StrategyKind,
    /// Zero-based index of the failing iteration.
    pub iteration: u32,
    pub error: CallError,
}

impl fmt::Display for StrategyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed at iteration {}: {}",
            self.strategy, self.iteration, self.error
        )
    }
}

#[derive(Debug)]
pub enum BenchmarkError {
    InvalidIterations,
    /// Every strategy was measured; these ones failed.
    StrategyFailed(Vec<StrategyFailure>),
}

impl fmt::Display for BenchmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIterations => write!(f, "iteration count must be greater than zero"),
            Self::StrategyFailed(failures) => {
                write!(f, "benchmark failed")?;
                for (i, failure) in failures.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{}{}", sep, failure)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BenchmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StrategyFailed(failures) => failures
                .first()
                .map(|f| &f.error as &(dyn std::error::Error + 'static)),
            Self::InvalidIterations => None,
        }
    }
}

/// Runs each available strategy over the same fixed request.
pub struct BenchmarkHarness {
    native: Availability<Box<dyn InvocationStrategy>>,
    network: Box<dyn InvocationStrategy>,
    service: String,
    function: String,
}

impl BenchmarkHarness {
    pub fn new(
        native: Availability<Box<dyn InvocationStrategy>>,
        network: Box<dyn InvocationStrategy>,
        config: &BenchmarkConfig,
    ) -> Self {
        Self {
            native,
            network,
            service: config.service.clone(),
            function: config.function.clone(),
        }
    }

    /// Detect the native strategy once and build the network strategy.
    ///
    /// Follows the routing mode like the dispatcher: in network mode native
    /// is skipped, not measured.
    pub fn from_config(config: &Config) -> io::Result<Self> {
        let network = NetworkStrategy::new(&config.network())?;
        let native = NativeStrategy::for_config(config);
        Ok(Self::new(native, Box::new(network), &config.benchmark()))
    }

    pub fn native_available(&self) -> bool {
        self.native.is_available()
    }

    /// Time `iterations` sequential calls per available strategy.
    ///
    /// The payload is sent as a single string argument. An unavailable native
    /// strategy is skipped, never replaced. A failing call stops that
    /// strategy's loop; the other strategy still runs, then the run fails.
    pub fn run(&self, iterations: u32, payload: &[u8]) -> Result<BenchmarkReport, BenchmarkError> {
        if iterations == 0 {
            return Err(BenchmarkError::InvalidIterations);
        }

        let request = ServiceCallRequest::new(
            self.service.as_str(),
            self.function.as_str(),
            vec![CallValue::String(String::from_utf8_lossy(payload).into_owned())],
        );

        let mut report = BenchmarkReport::new();
        let mut failures = Vec::new();

        match &self.native {
            Availability::Available(strategy) => {
                record(measure(strategy.as_ref(), &request, iterations), &mut report, &mut failures)
            }
            Availability::Unavailable { reason } => {
                info!("Skipping native benchmark: {}", reason);
                report.skip(StrategyKind::Native, reason.clone());
            }
        }
        record(
            measure(self.network.as_ref(), &request, iterations),
            &mut report,
            &mut failures,
        );

        if failures.is_empty() {
            Ok(report)
        } else {
            Err(BenchmarkError::StrategyFailed(failures))
        }
    }
}

fn record(
    outcome: Result<BenchmarkSample, StrategyFailure>,
    report: &mut BenchmarkReport,
    failures: &mut Vec<StrategyFailure>,
) {
    match outcome {
        Ok(sample) => report.insert(sample),
        Err(failure) => {
            error!("{}", failure);
            failures.push(failure);
        }
    }
}

fn measure(
    strategy: &dyn InvocationStrategy,
    request: &ServiceCallRequest,
    iterations: u32,
) -> Result<BenchmarkSample, StrategyFailure> {
    let kind = strategy.kind();
    let start = Instant::now();
    for iteration in 0..iterations {
        strategy.invoke(request).map_err(|error| StrategyFailure {
            strategy: kind,
            iteration,
            error,
        })?;
    }
    let sample = BenchmarkSample::new(kind.name(), iterations, start.elapsed());
    info!(
        "{}: {} calls in {:.4}s",
        kind, iterations, sample.elapsed_seconds
    );
    Ok(sample)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::rc::Rc;
    use svcbridge_types::{TestOutcome, TestStrategy};

    fn boxed(s: &Rc<TestStrategy>) -> Box<dyn InvocationStrategy> {
        Box::new(Rc::clone(s))
    }

    fn harness(
        native: Availability<Box<dyn InvocationStrategy>>,
        network: &Rc<TestStrategy>,
    ) -> BenchmarkHarness {
        BenchmarkHarness::new(native, boxed(network), &BenchmarkConfig::default())
    }

    #[test]
    fn test_throughput_sentinel() {
        assert_eq!(throughput(100, 0.0), f64::INFINITY);
        assert_eq!(throughput(100, 2.0), 50.0);
        let sample = BenchmarkSample::new("network", 10, Duration::ZERO);
        assert_eq!(sample.elapsed_seconds, 0.0);
        assert!(sample.throughput_ops_per_sec.is_infinite());
    }

    #[test]
    fn test_network_only_report() {
        let net = Rc::new(TestStrategy::echo(StrategyKind::Network));
        let report = harness(Availability::unavailable("no extension"), &net)
            .run(100, b"x")
            .unwrap();

        assert_eq!(report.len(), 1);
        let sample = report.sample(StrategyKind::Network).unwrap();
        assert_eq!(sample.strategy_name, "network");
        assert_eq!(sample.iteration_count, 100);
        assert!(sample.elapsed_seconds >= 0.0);
        assert_eq!(
            sample.throughput_ops_per_sec,
            throughput(100, sample.elapsed_seconds)
        );
        assert!(report.sample(StrategyKind::Native).is_none());
        assert_eq!(report.skipped_reason(StrategyKind::Native), Some("no extension"));
        assert_eq!(report.speedup_ratio(), None);
        assert_eq!(net.call_count(), 100);
    }

    #[test]
    fn test_payload_and_names_are_fixed() {
        let net = Rc::new(TestStrategy::echo(StrategyKind::Network));
        harness(Availability::unavailable("no extension"), &net)
            .run(3, b"test_data")
            .unwrap();

        for call in net.calls() {
            assert_eq!(call.service_name(), "CryptoService");
            assert_eq!(call.function_name(), "hash_data");
            assert_eq!(call.arguments(), &[json!("test_data")]);
        }
    }

    #[test]
    fn test_both_strategies_give_ratio() {
        let nat = Rc::new(TestStrategy::echo(StrategyKind::Native));
        let net = Rc::new(TestStrategy::echo(StrategyKind::Network));
        let report = harness(Availability::Available(boxed(&nat)), &net)
            .run(50, b"x")
            .unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(nat.call_count(), 50);
        assert_eq!(net.call_count(), 50);

        let native = report.sample(StrategyKind::Native).unwrap().throughput_ops_per_sec;
        let network = report.sample(StrategyKind::Network).unwrap().throughput_ops_per_sec;
        match report.speedup_ratio() {
            Some(ratio) => assert!((ratio - native / network).abs() <= f64::EPSILON * ratio.abs()),
            None => assert!(!native.is_finite() || !network.is_finite()),
        }
    }

    #[test]
    fn test_speedup_ratio_from_samples() {
        let mut report = BenchmarkReport::new();
        report.insert(BenchmarkSample::new("native", 100, Duration::from_millis(10)));
        report.insert(BenchmarkSample::new("network", 100, Duration::from_millis(100)));
        let ratio = report.speedup_ratio().unwrap();
        assert!((ratio - 10.0).abs() < 1e-9);

        report.insert(BenchmarkSample::new("network", 100, Duration::ZERO));
        assert_eq!(report.speedup_ratio(), None);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let net = Rc::new(TestStrategy::echo(StrategyKind::Network));
        let err = harness(Availability::unavailable("none"), &net)
            .run(0, b"x")
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::InvalidIterations));
        assert_eq!(net.call_count(), 0);
    }

    #[test]
    fn test_failing_iteration_aborts_only_that_strategy() {
        let nat = Rc::new(TestStrategy::echo(StrategyKind::Native).failing_at(4, "boom"));
        let net = Rc::new(TestStrategy::echo(StrategyKind::Network));
        let err = harness(Availability::Available(boxed(&nat)), &net)
            .run(20, b"x")
            .unwrap_err();

        match &err {
            BenchmarkError::StrategyFailed(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].strategy, StrategyKind::Native);
                assert_eq!(failures[0].iteration, 4);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(nat.call_count(), 5);
        assert_eq!(net.call_count(), 20);
        assert!(err.to_string().contains("native failed at iteration 4"));
    }

    #[test]
    fn test_unavailable_during_run_is_a_failure() {
        let nat = Rc::new(TestStrategy::new(
            StrategyKind::Native,
            TestOutcome::Unavailable("runtime crashed".into()),
        ));
        let net = Rc::new(TestStrategy::echo(StrategyKind::Network));
        let err = harness(Availability::Available(boxed(&nat)), &net)
            .run(5, b"x")
            .unwrap_err();
        assert!(matches!(err, BenchmarkError::StrategyFailed(ref f) if f[0].error.is_unavailable()));
        assert_eq!(net.call_count(), 5);
    }
}
