//! Integration tests for full conversions
//!
//! These tests feed recorded `go test` output from `tests/testdata/` through
//! the scanner, the report builder and the JUnit renderer, and check both the
//! intermediate report and the written XML.

use chrono::{DateTime, FixedOffset, TimeZone};
use go_junit_report::commands::{Command, ConvertCommand};
use go_junit_report::config::ReportConfig;
use go_junit_report::report::{Report, TestResult};
use go_junit_report::ui::UI;
use go_junit_report::{builder, gotest, render};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Simple test UI that captures output for assertions
struct TestUI {
    output: Vec<String>,
    errors: Vec<String>,
}

impl TestUI {
    fn new() -> Self {
        TestUI {
            output: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl UI for TestUI {
    fn output(&mut self, message: &str) -> go_junit_report::error::Result<()> {
        self.output.push(message.to_string());
        Ok(())
    }

    fn error(&mut self, message: &str) -> go_junit_report::error::Result<()> {
        self.errors.push(message.to_string());
        Ok(())
    }

    fn warning(&mut self, message: &str) -> go_junit_report::error::Result<()> {
        self.errors.push(format!("Warning: {}", message));
        Ok(())
    }
}

fn testdata(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join(name)
}

fn timestamp() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .unwrap()
}

fn build_report(name: &str) -> Report {
    let input = fs::read(testdata(name)).unwrap();
    let events = gotest::parse_stream(input.as_slice()).unwrap();
    builder::from_events(events, "")
}

/// Runs the conversion command on a testdata file and returns the exit code and XML.
fn convert(name: &str, config: ReportConfig) -> (i32, String) {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("report.xml");
    let mut ui = TestUI::new();

    let cmd = ConvertCommand::new(ReportConfig {
        hostname: Some("ci-host".to_string()),
        ..config
    })
    .with_input(testdata(name))
    .with_output(&out)
    .with_timestamp(timestamp());

    let code = cmd.execute(&mut ui).unwrap();
    assert!(ui.errors.is_empty(), "unexpected messages: {:?}", ui.errors);
    (code, fs::read_to_string(&out).unwrap())
}

#[test]
fn test_passing_packages() {
    let report = build_report("passing.txt");
    assert_eq!(report.packages.len(), 2);
    assert_eq!(report.packages[0].name, "example.com/calc");
    assert_eq!(report.packages[0].duration, Duration::from_millis(125));
    assert_eq!(report.packages[0].tests.len(), 2);
    assert_eq!(report.packages[1].name, "example.com/calc/cmd");
    assert!(report.packages[1].tests.is_empty());
    assert!(report.packages[1].run_error.is_none());
    assert!(report.is_successful());

    let (code, xml) = convert(
        "passing.txt",
        ReportConfig {
            set_exit_code: true,
            ..Default::default()
        },
    );
    assert_eq!(code, 0);
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites tests=\"2\">"));
    assert!(xml.contains(
        "<testsuite name=\"example.com/calc\" tests=\"2\" failures=\"0\" errors=\"0\" id=\"0\" \
         hostname=\"ci-host\" time=\"0.125\" timestamp=\"2024-05-01T12:00:00Z\">"
    ));
    assert!(xml.contains(
        "<testcase name=\"TestSub\" classname=\"example.com/calc\" time=\"0.120\"/>"
    ));
    assert!(xml.contains("<testsuite name=\"example.com/calc/cmd\" tests=\"0\""));
    assert!(xml.ends_with("</testsuites>\n"));
}

#[test]
fn test_failing_subtests() {
    let report = build_report("failing.txt");
    let pkg = &report.packages[0];
    let names: Vec<_> = pkg.tests.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["TestParse", "TestParse/empty", "TestParse/garbage", "TestSkipped"]
    );
    assert_eq!(pkg.tests[2].level, 1);
    assert_eq!(pkg.tests[2].output.len(), 2);
    assert!(pkg.tests[0].output.is_empty());
    assert!(!report.is_successful());
    assert_eq!(report.count_failures(), 2);

    let (code, xml) = convert(
        "failing.txt",
        ReportConfig {
            set_exit_code: true,
            ..Default::default()
        },
    );
    assert_eq!(code, 1);
    assert!(xml.contains(
        "<testsuite name=\"example.com/parser\" tests=\"4\" failures=\"2\" errors=\"0\" id=\"0\" \
         hostname=\"ci-host\" skipped=\"1\" time=\"0.020\""
    ));
    assert!(xml.contains(
        "<failure message=\"Failed\"><![CDATA[parse_test.go:21: unexpected token \"}\"\n\
         parse_test.go:30: got <nil>, want error]]></failure>"
    ));
    assert!(xml.contains("<failure message=\"Failed\"/>"));
    assert!(xml.contains("<skipped message=\"parse_test.go:40: requires network\"/>"));
}

#[test]
fn test_parallel_tests_keep_their_output() {
    let report = build_report("parallel.txt");
    let pkg = &report.packages[0];
    assert_eq!(pkg.name, "example.com/net");

    let server = &pkg.tests[0];
    assert_eq!(server.name, "TestServer");
    assert_eq!(server.result, TestResult::Pass);
    assert_eq!(
        server.output,
        vec![
            "    server_test.go:11: listening on :8080",
            "    server_test.go:15: accepted connection",
        ]
    );

    let client = &pkg.tests[1];
    assert_eq!(client.name, "TestClient");
    assert_eq!(client.duration, Duration::from_millis(50));
    assert_eq!(client.output, vec!["    client_test.go:7: dialing"]);
    assert!(pkg.output.is_empty());
}

#[test]
fn test_benchmarks() {
    let report = build_report("benchmarks.txt");
    let pkg = &report.packages[0];
    assert_eq!(pkg.benchmarks.len(), 3);
    assert_eq!(pkg.benchmarks[2].result, TestResult::Fail);
    assert_eq!(pkg.benchmarks[2].output, vec!["    codec_test.go:52: corrupt input"]);
    // Failed benchmarks do not make the report unsuccessful.
    assert!(report.is_successful());

    let (_, xml) = convert("benchmarks.txt", ReportConfig::default());
    assert!(xml.contains("<property name=\"goos\" value=\"linux\"/>"));
    assert!(xml.contains("<property name=\"goarch\" value=\"amd64\"/>"));
    assert!(xml.contains("<property name=\"pkg\" value=\"example.com/codec\"/>"));
    assert!(!xml.contains("<property name=\"cpu\""));
    assert!(xml.contains(
        "<testcase name=\"BenchmarkEncode\" classname=\"example.com/codec\" time=\"0.000001100\"/>"
    ));
    assert!(xml.contains(
        "<testcase name=\"BenchmarkDecode\" classname=\"example.com/codec\" time=\"0.000002500\">"
    ));
    assert!(xml.contains("<system-out><![CDATA[goos: linux\ngoarch: amd64\n"));
}

#[test]
fn test_build_failure() {
    let report = build_report("build_failure.txt");
    assert_eq!(report.packages.len(), 2);
    let broken = &report.packages[0];
    assert_eq!(broken.name, "example.com/broken");
    let err = broken.build_error.as_ref().unwrap();
    assert_eq!(err.cause, "[build failed]");
    assert_eq!(err.output.len(), 2);
    assert!(report.packages[1].is_successful());
    assert!(!report.is_successful());

    let (_, xml) = convert("build_failure.txt", ReportConfig::default());
    assert!(xml.contains("<testsuites tests=\"2\" errors=\"1\">"));
    assert!(xml.contains(
        "<testcase name=\"[build failed]\" classname=\"example.com/broken\" time=\"0.000\">"
    ));
    assert!(xml.contains(
        "<error message=\"Build error\"><![CDATA[./broken.go:5:2: undefined: foo\n\
         ./broken.go:9:1: missing return]]></error>"
    ));
}

#[test]
fn test_coverage_properties() {
    let report = build_report("coverage.txt");
    assert_eq!(report.packages[0].coverage, 83.3);
    assert_eq!(report.packages[1].name, "example.com/cached");
    assert_eq!(report.packages[1].coverage, 40.0);

    let (_, xml) = convert("coverage.txt", ReportConfig::default());
    assert!(xml.contains("<property name=\"coverage.statements.pct\" value=\"83.30\"/>"));
    assert!(xml.contains("<property name=\"coverage.statements.pct\" value=\"40.00\"/>"));
}

#[test]
fn test_package_without_statements() {
    let report = build_report("no_statements.txt");
    assert_eq!(report.packages.len(), 2);

    let a = &report.packages[0];
    assert_eq!(a.name, "example.com/a");
    assert_eq!(a.tests.len(), 1);
    assert_eq!(a.tests[0].name, "TestA");
    assert_eq!(a.coverage, 0.0);
    assert!(a.output.is_empty());

    let b = &report.packages[1];
    assert_eq!(b.name, "example.com/b");
    assert_eq!(b.tests.len(), 1);
    assert_eq!(b.tests[0].name, "TestB");

    let (_, xml) = convert("no_statements.txt", ReportConfig::default());
    assert!(!xml.contains("coverage.statements.pct"));
    assert!(xml.contains("<testsuite name=\"example.com/a\" tests=\"1\""));
}

#[test]
fn test_panic_becomes_run_error() {
    let report = build_report("panic.txt");
    let pkg = &report.packages[0];
    let err = pkg.run_error.as_ref().unwrap();
    assert_eq!(err.name, "example.com/crashy");
    assert_eq!(err.output.len(), 6);
    assert!(pkg.output.is_empty());

    let (code, xml) = convert(
        "panic.txt",
        ReportConfig {
            set_exit_code: true,
            ..Default::default()
        },
    );
    assert_eq!(code, 1);
    assert!(xml.contains(
        "<testcase name=\"Failure\" classname=\"example.com/crashy\" time=\"0.000\">"
    ));
    assert!(xml.contains("<error message=\"Run error\"><![CDATA[panic: runtime error"));
    assert!(xml.contains("\t/src/main.go:8 +0x1d\nexit status 2]]></error>"));
    assert!(!xml.contains("<system-out>"));
}

#[test]
fn test_render_matches_command_output() {
    let report = build_report("failing.txt");
    let suites = render::junit(&report, "ci-host", &timestamp());
    let expected = suites.to_xml_string().unwrap();

    let (_, xml) = convert("failing.txt", ReportConfig::default());
    assert_eq!(xml, expected);
}

#[test]
fn test_iocopy_and_properties() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("report.xml");
    let mut ui = TestUI::new();

    let cmd = ConvertCommand::new(ReportConfig {
        hostname: Some("ci-host".to_string()),
        iocopy: true,
        no_xml_header: true,
        properties: vec![("build.id".to_string(), "42".to_string())],
        ..Default::default()
    })
    .with_input(testdata("passing.txt"))
    .with_output(&out);

    assert_eq!(cmd.execute(&mut ui).unwrap(), 0);
    assert_eq!(ui.output.len(), 7);
    assert_eq!(ui.output[0], "=== RUN   TestAdd");

    let xml = fs::read_to_string(&out).unwrap();
    assert!(xml.starts_with("<testsuites"));
    assert_eq!(
        xml.matches("<property name=\"build.id\" value=\"42\"/>").count(),
        2
    );
}
