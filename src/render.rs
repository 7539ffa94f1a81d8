//! Converting a [`Report`] into a JUnit document

use crate::format::{format_output, merge_benchmarks};
use crate::junit::{
    format_benchmark_time, format_duration, Output, ResultRecord, Testcase, TestcaseStatus,
    Testsuite, Testsuites,
};
use crate::report::{Package, Report, TestResult};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::time::Duration;

/// Output lines of the form `key: value` with these keys become suite properties.
const PROPERTY_KEYS: &[&str] = &["goos", "goarch", "pkg"];

const COVERAGE_PROPERTY: &str = "coverage.statements.pct";

/// Converts a report into a JUnit document with one suite per package.
///
/// Every suite is stamped with `hostname` and `timestamp` as given.
pub fn junit(report: &Report, hostname: &str, timestamp: &DateTime<FixedOffset>) -> Testsuites {
    let timestamp = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);

    let mut suites = Testsuites::default();
    for pkg in &report.packages {
        let mut suite = package_suite(pkg);
        suite.hostname = Some(hostname.to_string());
        suite.timestamp = Some(timestamp.clone());
        suites.add_suite(suite);
    }
    suites
}

fn package_suite(pkg: &Package) -> Testsuite {
    let mut suite = Testsuite::new(pkg.name.as_str());

    if !pkg.output.is_empty() {
        suite.system_out = Some(Output::new(format_output(&pkg.output, 0)));
    }

    if pkg.coverage > 0.0 {
        suite.add_property(COVERAGE_PROPERTY, format!("{:.2}", pkg.coverage));
    }

    for line in &pkg.output {
        if let Some((key, value)) = parse_property(line) {
            suite.add_property(key, value);
        }
    }

    for test in &pkg.tests {
        let status = match test.result {
            TestResult::Pass => TestcaseStatus::Success,
            TestResult::Fail => TestcaseStatus::Failure(ResultRecord::new(
                "Failed",
                format_output(&test.output, test.level),
            )),
            TestResult::Skip => TestcaseStatus::Skipped(ResultRecord::new(
                format_output(&test.output, test.level),
                "",
            )),
            TestResult::Unknown => TestcaseStatus::Error(ResultRecord::new(
                "No test result found",
                format_output(&test.output, test.level),
            )),
        };
        suite.add_testcase(
            Testcase::new(pkg.name.as_str(), test.name.as_str(), format_duration(test.duration))
                .with_status(status),
        );
    }

    for bm in merge_benchmarks(&pkg.benchmarks) {
        let status = if bm.result == TestResult::Fail {
            TestcaseStatus::Failure(ResultRecord::new("Failed", ""))
        } else {
            TestcaseStatus::Success
        };
        let time = format_benchmark_time(Duration::from_nanos(bm.ns_per_op as u64));
        suite.add_testcase(Testcase::new(pkg.name.as_str(), bm.name, time).with_status(status));
    }

    // JUnit has no way of reporting a package that failed before any test
    // ran, so build and run errors become a single failing test case.
    if let Some(err) = &pkg.build_error {
        suite.add_testcase(
            Testcase::new(err.name.as_str(), err.cause.as_str(), format_duration(Duration::ZERO))
                .with_status(TestcaseStatus::Error(ResultRecord::new(
                    "Build error",
                    err.output.join("\n"),
                ))),
        );
    }

    if let Some(err) = &pkg.run_error {
        suite.add_testcase(
            Testcase::new(err.name.as_str(), "Failure", format_duration(Duration::ZERO))
                .with_status(TestcaseStatus::Error(ResultRecord::new(
                    "Run error",
                    err.output.join("\n"),
                ))),
        );
    }

    suite.time = if pkg.duration.is_zero() {
        format_duration(pkg.tests_duration())
    } else {
        format_duration(pkg.duration)
    };

    suite
}

/// Parses `goos: linux` style lines printed by the tool before benchmarks.
fn parse_property(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.split([':', ' ']).filter(|f| !f.is_empty());
    let key = fields.next()?;
    let value = fields.next()?;
    if fields.next().is_some() || !PROPERTY_KEYS.contains(&key) {
        return None;
    }
    Some((key, value))
}
