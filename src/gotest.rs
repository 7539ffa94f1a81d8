//! Scanning `go test` output into events
//!
//! Each line of `go test` output is classified independently, in a fixed
//! order, and turned into zero or more [`Event`]s. Lines that match none of
//! the known formats become [`Event::Output`], so nothing is lost.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::report::TestResult;
use log::debug;
use regex::Regex;
use std::io::BufRead;
use std::time::Duration;

const END_TEST_PATTERN: &str =
    r"((?:    )*)--- (PASS|FAIL|SKIP): ([^ ]+) \((\d+\.\d+)(?: seconds|s)\)";
const STATUS_PATTERN: &str = r"^(PASS|FAIL|SKIP)$";
const SUMMARY_PATTERN: &str = concat!(
    // result
    r"^(\?|ok|FAIL)",
    // package name
    r"\s+([^ \t]+)",
    // duration
    r"(?:\s+(\d+\.\d+)s)?",
    // cached indicator
    r"(?:\s+(\(cached\)))?",
    // [status message]
    r"(?:\s+(\[[^\]]+\]))?",
    // coverage percentage and covered packages, or no statements at all
    r"(?:\s+coverage:\s+(?:\[no statements\]|(\d+\.\d+)%\sof\sstatements(?:\sin\s(.+))?))?$",
);
const COVERAGE_PATTERN: &str = r"^coverage:\s+(\d+|\d+\.\d+)%\s+of\s+statements(?:\sin\s(.+))?$";
const BENCHMARK_PATTERN: &str = concat!(
    r"^(Benchmark[^ -]+)(?:-\d+\s+|\s+)(\d+)\s+(\d+|\d+\.\d+)\sns/op",
    r"(?:\s+(\d+|\d+\.\d+)\sMB/s)?",
    r"(?:\s+(\d+)\sB/op)?",
    r"(?:\s+(\d+)\sallocs/op)?",
);
const END_BENCHMARK_PATTERN: &str = r"^--- (BENCH|FAIL|SKIP): (Benchmark[^ -]+)(?:-\d+)?$";

/// Line classifier for `go test` output.
#[derive(Debug, Clone)]
pub struct GoTestParser {
    end_test: Regex,
    status: Regex,
    summary: Regex,
    coverage: Regex,
    benchmark: Regex,
    end_benchmark: Regex,
}

impl GoTestParser {
    /// Creates a parser.
    pub fn new() -> Result<Self> {
        Ok(GoTestParser {
            end_test: compile(END_TEST_PATTERN)?,
            status: compile(STATUS_PATTERN)?,
            summary: compile(SUMMARY_PATTERN)?,
            coverage: compile(COVERAGE_PATTERN)?,
            benchmark: compile(BENCHMARK_PATTERN)?,
            end_benchmark: compile(END_BENCHMARK_PATTERN)?,
        })
    }

    /// Converts a single line of output into events.
    pub fn parse_line(&self, line: &str) -> Vec<Event> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if let Some(marker) = line.strip_prefix("=== ") {
            if let Some(event) = parse_marker(marker, line) {
                return vec![event];
            }
        }

        if let Some(caps) = self.end_test.captures(line) {
            let mut events = Vec::with_capacity(2);
            let start = caps.get(0).map_or(0, |m| m.start());
            if start > 0 {
                events.push(Event::output(&line[..start]));
            }
            let indent = caps.get(1).map_or(0, |m| m.as_str().len() / 4);
            events.push(Event::EndTest {
                name: caps[3].to_string(),
                result: TestResult::from_word(&caps[2]).unwrap_or_default(),
                duration: parse_seconds(&caps[4]),
                indent,
            });
            return events;
        }

        if self.status.is_match(line) {
            return vec![Event::Status];
        }

        if let Some(caps) = self.summary.captures(line) {
            let mut events = Vec::with_capacity(2);
            if let Some(pct) = caps.get(6) {
                events.push(Event::Coverage {
                    percent: pct.as_str().parse().unwrap_or(0.0),
                    packages: parse_package_list(caps.get(7).map(|m| m.as_str())),
                });
            }

            let data: Vec<&str> = [caps.get(4), caps.get(5)]
                .into_iter()
                .flatten()
                .map(|m| m.as_str())
                .collect();
            events.push(Event::Summary {
                name: caps[2].to_string(),
                result: TestResult::from_word(&caps[1]).unwrap_or_default(),
                duration: caps
                    .get(3)
                    .map_or(Duration::ZERO, |m| parse_seconds(m.as_str())),
                data: if data.is_empty() {
                    None
                } else {
                    Some(data.join(" "))
                },
            });
            return events;
        }

        if let Some(caps) = self.coverage.captures(line) {
            return vec![Event::Coverage {
                percent: caps[1].parse().unwrap_or(0.0),
                packages: parse_package_list(caps.get(2).map(|m| m.as_str())),
            }];
        }

        if let Some(caps) = self.benchmark.captures(line) {
            let float = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0.0);
            let int = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
            return vec![Event::Benchmark {
                name: caps[1].to_string(),
                iterations: int(2),
                ns_per_op: float(3),
                mb_per_sec: float(4),
                bytes_per_op: int(5),
                allocs_per_op: int(6),
            }];
        }

        if let Some(caps) = self.end_benchmark.captures(line) {
            return vec![Event::EndBenchmark {
                name: caps[2].to_string(),
                result: TestResult::from_word(&caps[1]).unwrap_or_default(),
            }];
        }

        if let Some(rest) = line.strip_prefix("# ") {
            let fields: Vec<&str> = rest.split_whitespace().collect();
            if fields.len() == 1 || fields.len() == 2 {
                return vec![Event::build_output(fields[0])];
            }
        }

        vec![Event::output(line)]
    }
}

/// Handles `=== RUN`, `=== PAUSE`, `=== CONT` and `=== NAME` markers.
///
/// Returns `None` if `marker` does not look like a tool marker at all.
fn parse_marker(marker: &str, line: &str) -> Option<Event> {
    let (kind, name) = marker.split_once(' ').unwrap_or((marker, ""));
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }

    let name = name.trim();
    let event = match kind {
        "RUN" => Event::run_test(name),
        "PAUSE" => Event::pause_test(name),
        "CONT" | "NAME" => Event::cont_test(name),
        _ => {
            debug!("unrecognized marker in line {:?}", line);
            Event::Unknown {
                kind: format!("=== {}", kind),
                line: line.to_string(),
            }
        }
    };
    Some(event)
}

/// Parses a decimal number of seconds such as `0.012` without going through floats.
fn parse_seconds(s: &str) -> Duration {
    let (secs, frac) = s.split_once('.').unwrap_or((s, ""));
    let secs: u64 = match secs.parse() {
        Ok(secs) => secs,
        Err(_) => return Duration::ZERO,
    };
    let digits: String = frac.chars().take(9).collect();
    let nanos = if digits.is_empty() {
        0
    } else {
        match digits.parse::<u32>() {
            Ok(n) => n * 10u32.pow(9 - digits.len() as u32),
            Err(_) => return Duration::ZERO,
        }
    };
    Duration::new(secs, nanos)
}

fn parse_package_list(list: Option<&str>) -> Vec<String> {
    list.map(|l| {
        l.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Parse(format!("invalid pattern {}: {}", pattern, e)))
}

/// Parse `go test` output into a list of events
pub fn parse_stream<R: BufRead>(reader: R) -> Result<Vec<Event>> {
    parse_stream_with_callback(reader, |_| Ok(()))
}

/// Parse `go test` output into a list of events, passing every raw line to `line_callback`
///
/// Input that is not valid UTF-8 is decoded lossily.
pub fn parse_stream_with_callback<R, F>(mut reader: R, mut line_callback: F) -> Result<Vec<Event>>
where
    R: BufRead,
    F: FnMut(&str) -> Result<()>,
{
    let parser = GoTestParser::new()?;
    let mut events = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let raw = String::from_utf8_lossy(&buf);
        let line = raw.strip_suffix('\n').unwrap_or(&raw);
        line_callback(line)?;
        events.extend(parser.parse_line(line));
    }

    debug!("parsed {} event(s)", events.len());
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Vec<Event> {
        GoTestParser::new().unwrap().parse_line(line)
    }

    #[test]
    fn test_markers() {
        assert_eq!(parse("=== RUN   TestA"), vec![Event::run_test("TestA")]);
        assert_eq!(parse("=== RUN   TestA/sub_1"), vec![Event::run_test("TestA/sub_1")]);
        assert_eq!(parse("=== PAUSE TestA"), vec![Event::pause_test("TestA")]);
        assert_eq!(parse("=== CONT  TestA"), vec![Event::cont_test("TestA")]);
        assert_eq!(parse("=== NAME  TestA"), vec![Event::cont_test("TestA")]);
        assert_eq!(
            parse("=== FROB TestA"),
            vec![Event::Unknown {
                kind: "=== FROB".to_string(),
                line: "=== FROB TestA".to_string(),
            }]
        );
        assert_eq!(parse("=== not a marker"), vec![Event::output("=== not a marker")]);
    }

    #[test]
    fn test_end_test() {
        assert_eq!(
            parse("--- PASS: TestA (0.12s)"),
            vec![Event::end_test("TestA", TestResult::Pass, Duration::from_millis(120), 0)]
        );
        assert_eq!(
            parse("        --- SKIP: TestA/sub/deeper (0.00s)"),
            vec![Event::end_test("TestA/sub/deeper", TestResult::Skip, Duration::ZERO, 2)]
        );
        assert_eq!(
            parse("--- FAIL: TestOld (1.50 seconds)"),
            vec![Event::end_test("TestOld", TestResult::Fail, Duration::from_millis(1500), 0)]
        );
    }

    #[test]
    fn test_end_test_with_leading_output() {
        assert_eq!(
            parse("no newline--- PASS: TestA (0.00s)"),
            vec![
                Event::output("no newline"),
                Event::end_test("TestA", TestResult::Pass, Duration::ZERO, 0),
            ]
        );
    }

    #[test]
    fn test_status() {
        assert_eq!(parse("PASS"), vec![Event::Status]);
        assert_eq!(parse("FAIL"), vec![Event::Status]);
        assert_eq!(parse("PASS\r"), vec![Event::Status]);
    }

    #[test]
    fn test_summary() {
        assert_eq!(
            parse("ok  \texample.com/pkg\t0.010s"),
            vec![Event::summary(
                "example.com/pkg",
                TestResult::Pass,
                Duration::from_millis(10),
                None
            )]
        );
        assert_eq!(
            parse("ok  \texample.com/pkg\t(cached)"),
            vec![Event::summary(
                "example.com/pkg",
                TestResult::Pass,
                Duration::ZERO,
                Some("(cached)")
            )]
        );
        assert_eq!(
            parse("?   \texample.com/cmd\t[no test files]"),
            vec![Event::summary(
                "example.com/cmd",
                TestResult::Skip,
                Duration::ZERO,
                Some("[no test files]")
            )]
        );
        assert_eq!(
            parse("FAIL\texample.com/broken [build failed]"),
            vec![Event::summary(
                "example.com/broken",
                TestResult::Fail,
                Duration::ZERO,
                Some("[build failed]")
            )]
        );
    }

    #[test]
    fn test_summary_with_coverage() {
        assert_eq!(
            parse("ok  \texample.com/pkg\t0.500s\tcoverage: 75.0% of statements in ./..."),
            vec![
                Event::Coverage {
                    percent: 75.0,
                    packages: vec!["./...".to_string()],
                },
                Event::summary(
                    "example.com/pkg",
                    TestResult::Pass,
                    Duration::from_millis(500),
                    None
                ),
            ]
        );
    }

    #[test]
    fn test_summary_without_statements() {
        assert_eq!(
            parse("ok  \texample.com/a\t0.010s\tcoverage: [no statements]"),
            vec![Event::summary(
                "example.com/a",
                TestResult::Pass,
                Duration::from_millis(10),
                None
            )]
        );
    }

    #[test]
    fn test_coverage() {
        assert_eq!(
            parse("coverage: 13.37% of statements"),
            vec![Event::Coverage {
                percent: 13.37,
                packages: vec![],
            }]
        );
        assert_eq!(
            parse("coverage: 50% of statements in pkg/a, pkg/b"),
            vec![Event::Coverage {
                percent: 50.0,
                packages: vec!["pkg/a".to_string(), "pkg/b".to_string()],
            }]
        );
    }

    #[test]
    fn test_benchmark() {
        assert_eq!(
            parse("BenchmarkParse-8   \t 1000000\t      1055 ns/op\t  10.50 MB/s\t     256 B/op\t       4 allocs/op"),
            vec![Event::Benchmark {
                name: "BenchmarkParse".to_string(),
                iterations: 1_000_000,
                ns_per_op: 1055.0,
                mb_per_sec: 10.5,
                bytes_per_op: 256,
                allocs_per_op: 4,
            }]
        );
        assert_eq!(
            parse("BenchmarkSmall \t2000000000\t         0.31 ns/op"),
            vec![Event::Benchmark {
                name: "BenchmarkSmall".to_string(),
                iterations: 2_000_000_000,
                ns_per_op: 0.31,
                mb_per_sec: 0.0,
                bytes_per_op: 0,
                allocs_per_op: 0,
            }]
        );
    }

    #[test]
    fn test_end_benchmark() {
        assert_eq!(
            parse("--- FAIL: BenchmarkParse-8"),
            vec![Event::EndBenchmark {
                name: "BenchmarkParse".to_string(),
                result: TestResult::Fail,
            }]
        );
        assert_eq!(
            parse("--- BENCH: BenchmarkParse"),
            vec![Event::EndBenchmark {
                name: "BenchmarkParse".to_string(),
                result: TestResult::Pass,
            }]
        );
    }

    #[test]
    fn test_build_output() {
        assert_eq!(parse("# example.com/broken"), vec![Event::build_output("example.com/broken")]);
        assert_eq!(
            parse("# example.com/broken [example.com/broken.test]"),
            vec![Event::build_output("example.com/broken")]
        );
        assert_eq!(
            parse("# this is a comment line"),
            vec![Event::output("# this is a comment line")]
        );
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("0.12"), Duration::from_millis(120));
        assert_eq!(parse_seconds("12.345"), Duration::from_millis(12_345));
        assert_eq!(parse_seconds("3"), Duration::from_secs(3));
        assert_eq!(parse_seconds("x.1"), Duration::ZERO);
    }

    #[test]
    fn test_plain_output() {
        assert_eq!(parse("    x_test.go:12: hello"), vec![Event::output("    x_test.go:12: hello")]);
        assert_eq!(parse(""), vec![Event::output("")]);
    }

    #[test]
    fn test_parse_stream_with_callback() {
        let input = "=== RUN   TestA\n--- PASS: TestA (0.00s)\r\nPASS\nok  \tpkg\t0.001s\n";
        let mut seen = Vec::new();
        let events = parse_stream_with_callback(input.as_bytes(), |line| {
            seen.push(line.to_string());
            Ok(())
        })
        .unwrap();

        assert_eq!(seen.len(), 4);
        assert_eq!(seen[1], "--- PASS: TestA (0.00s)\r");
        assert_eq!(events.len(), 4);
        assert_eq!(events[2], Event::Status);
    }

    #[test]
    fn test_parse_stream_invalid_utf8() {
        let input: &[u8] = b"=== RUN   TestA\nbad \xff byte\n";
        let events = parse_stream(input).unwrap();
        assert_eq!(events[1], Event::output("bad \u{FFFD} byte"));
    }
}
