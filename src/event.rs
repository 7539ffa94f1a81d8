//! Events produced by scanning test tool output

use crate::report::TestResult;
use std::time::Duration;

/// A single structural occurrence in the output of `go test`.
///
/// Events are consumed in order by [`ReportBuilder`](crate::builder::ReportBuilder).
/// Each variant carries only the fields relevant to its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A test or subtest started running.
    RunTest { name: String },
    /// A running test was paused, e.g. because it called `t.Parallel()`.
    PauseTest { name: String },
    /// A previously paused test resumed.
    ContinueTest { name: String },
    /// A test finished with the given result.
    EndTest {
        name: String,
        result: TestResult,
        duration: Duration,
        /// Subtest depth, taken from the indentation of the result line.
        indent: usize,
    },
    /// A benchmark result line.
    Benchmark {
        name: String,
        iterations: u64,
        ns_per_op: f64,
        mb_per_sec: f64,
        bytes_per_op: u64,
        allocs_per_op: u64,
    },
    /// Terminal line of a benchmark that failed, was skipped or logged output.
    EndBenchmark { name: String, result: TestResult },
    /// End of an output block (`PASS`, `FAIL` on a line of their own).
    Status,
    /// Package summary line.
    Summary {
        name: String,
        result: TestResult,
        duration: Duration,
        /// Extra information such as `(cached)` or `[build failed]`.
        data: Option<String>,
    },
    /// Coverage summary.
    Coverage { percent: f64, packages: Vec<String> },
    /// Start of compiler output for a package that failed to build.
    BuildOutput { name: String },
    /// Any other line of output.
    Output { data: String },
    /// A tool marker that is not understood; ignored by the builder.
    Unknown { kind: String, line: String },
}

impl Event {
    pub fn run_test(name: impl Into<String>) -> Self {
        Event::RunTest { name: name.into() }
    }

    pub fn pause_test(name: impl Into<String>) -> Self {
        Event::PauseTest { name: name.into() }
    }

    pub fn cont_test(name: impl Into<String>) -> Self {
        Event::ContinueTest { name: name.into() }
    }

    pub fn end_test(
        name: impl Into<String>,
        result: TestResult,
        duration: Duration,
        indent: usize,
    ) -> Self {
        Event::EndTest {
            name: name.into(),
            result,
            duration,
            indent,
        }
    }

    pub fn summary(
        name: impl Into<String>,
        result: TestResult,
        duration: Duration,
        data: Option<&str>,
    ) -> Self {
        Event::Summary {
            name: name.into(),
            result,
            duration,
            data: data.map(str::to_string),
        }
    }

    pub fn build_output(name: impl Into<String>) -> Self {
        Event::BuildOutput { name: name.into() }
    }

    pub fn output(data: impl Into<String>) -> Self {
        Event::Output { data: data.into() }
    }

    /// Short name of the event kind, used in diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Event::RunTest { .. } => "run_test",
            Event::PauseTest { .. } => "pause_test",
            Event::ContinueTest { .. } => "cont_test",
            Event::EndTest { .. } => "end_test",
            Event::Benchmark { .. } => "benchmark",
            Event::EndBenchmark { .. } => "end_bench",
            Event::Status => "status",
            Event::Summary { .. } => "summary",
            Event::Coverage { .. } => "coverage",
            Event::BuildOutput { .. } => "build_output",
            Event::Output { .. } => "output",
            Event::Unknown { kind, .. } => kind,
        }
    }
}
