//! Plain-text rendering of a benchmark report.

use std::fmt::Write;

use svcbridge_core::bench::{BenchmarkReport, BenchmarkSample};
use svcbridge_types::StrategyKind;

/// One line per sample, then the speedup or the reason native was skipped.
pub fn render(report: &BenchmarkReport) -> String {
    let mut out = String::new();

    for sample in report.samples() {
        let _ = writeln!(out, "{}", sample_line(sample));
    }

    if let Some(reason) = report.skipped_reason(StrategyKind::Native) {
        let _ = writeln!(out, "native: not available ({})", reason);
    }

    if let Some(ratio) = report.speedup_ratio() {
        let _ = writeln!(out, "Speedup: {:.2}x faster with native", ratio);
    }

    out
}

fn sample_line(sample: &BenchmarkSample) -> String {
    format!(
        "{}: {:.4}s ({:.0} ops/sec)",
        sample.strategy_name, sample.elapsed_seconds, sample.throughput_ops_per_sec
    )
}
