//! Output normalization and benchmark aggregation
//!
//! `go test` indents the output of a test by four spaces per subtest level,
//! plus one more level for the test's own output. These helpers undo that
//! indentation before output is placed in a report document.

use crate::report::{Benchmark, TestResult};
use std::collections::HashMap;

const INDENT: &str = "    ";

/// Joins output lines with newlines after removing tool-added indentation.
pub fn format_output(output: &[String], level: usize) -> String {
    output
        .iter()
        .map(|line| trim_output_prefix(line, level))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Removes the indentation `go test` adds to output of a test at `level`.
///
/// Only lines whose leading spaces come in whole groups of four are treated
/// as indented by the tool; for those, up to `level + 1` groups are removed.
/// Other lines are assumed to be program output and keep their spaces. A
/// single leading tab is removed in both cases.
pub fn trim_output_prefix(line: &str, level: usize) -> &str {
    let mut line = line;
    if let Some(spaces) = line.find(|c: char| c != ' ') {
        if spaces % 4 == 0 {
            for _ in 0..=level {
                line = line.strip_prefix(INDENT).unwrap_or(line);
            }
        }
    }
    line.strip_prefix('\t').unwrap_or(line)
}

/// Merges benchmark samples that share a name.
///
/// The result has one entry per distinct name, in order of first appearance,
/// holding the mean of ns/op, MB/s, B/op and allocs/op. Integer metrics are
/// truncated. The merged result is a failure if any sample failed.
pub fn merge_benchmarks(benchmarks: &[Benchmark]) -> Vec<Benchmark> {
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&Benchmark>> = HashMap::new();
    for bm in benchmarks {
        let group = groups.entry(bm.name.as_str()).or_default();
        if group.is_empty() {
            order.push(bm.name.as_str());
        }
        group.push(bm);
    }

    order
        .into_iter()
        .map(|name| {
            let samples = &groups[name];
            let n = samples.len();
            let first = samples[0];

            let result = if samples.iter().any(|b| b.result == TestResult::Fail) {
                TestResult::Fail
            } else {
                first.result
            };

            Benchmark {
                name: name.to_string(),
                result,
                output: Vec::new(),
                iterations: first.iterations,
                ns_per_op: samples.iter().map(|b| b.ns_per_op).sum::<f64>() / n as f64,
                mb_per_sec: samples.iter().map(|b| b.mb_per_sec).sum::<f64>() / n as f64,
                bytes_per_op: mean(samples.iter().map(|b| b.bytes_per_op), n),
                allocs_per_op: mean(samples.iter().map(|b| b.allocs_per_op), n),
            }
        })
        .collect()
}

/// Truncated mean of `n` integer samples, summed wide enough not to overflow.
fn mean(values: impl Iterator<Item = u64>, n: usize) -> u64 {
    let sum: u128 = values.map(u128::from).sum();
    u64::try_from(sum / n.max(1) as u128).unwrap_or(u64::MAX)
}
