//! Test report data structures
//!
//! A [`Report`] is the normalized form of one `go test` invocation: an ordered
//! list of packages, each holding its tests, benchmarks and any build or run
//! error. Reports are produced by [`ReportBuilder`](crate::builder::ReportBuilder)
//! and only read afterwards.

use std::fmt;
use std::time::Duration;

/// Outcome of a test, benchmark or package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestResult {
    /// No terminal result was seen for this test.
    ///
    /// This usually means the tool output was truncated or the test binary
    /// crashed while the test was running.
    #[default]
    Unknown,
    /// Test passed.
    Pass,
    /// Test failed.
    Fail,
    /// Test was skipped.
    Skip,
}

impl TestResult {
    /// Returns true if this result does not make a report unsuccessful.
    pub fn is_success(&self) -> bool {
        matches!(self, TestResult::Pass | TestResult::Skip)
    }

    /// Parse a result word as printed by `go test`.
    ///
    /// Returns `None` for words that do not describe a result.
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "PASS" | "ok" | "BENCH" => Some(TestResult::Pass),
            "FAIL" => Some(TestResult::Fail),
            "SKIP" | "?" => Some(TestResult::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::Unknown => write!(f, "unknown"),
            TestResult::Pass => write!(f, "pass"),
            TestResult::Fail => write!(f, "fail"),
            TestResult::Skip => write!(f, "skip"),
        }
    }
}

/// A single test or subtest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Test {
    /// Full test name, including parent names for subtests (`TestA/sub`).
    pub name: String,
    /// Time taken by the test as reported by the tool.
    pub duration: Duration,
    /// Final result of the test.
    pub result: TestResult,
    /// Subtest nesting depth, 0 for top-level tests.
    pub level: usize,
    /// Output lines attributed to this test, as printed by the tool.
    pub output: Vec<String>,
}

impl Test {
    /// Creates a new test with an unknown result.
    pub fn new(name: impl Into<String>) -> Self {
        Test {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the result
    pub fn with_result(mut self, result: TestResult) -> Self {
        self.result = result;
        self
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the nesting level
    pub fn with_level(mut self, level: usize) -> Self {
        self.level = level;
        self
    }

    /// Add an output line
    pub fn with_output(mut self, line: impl Into<String>) -> Self {
        self.output.push(line.into());
        self
    }
}

/// One benchmark result line.
///
/// The same benchmark may appear several times in a package, for example
/// when run with `-count`. Samples are kept separately here and merged when
/// rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Benchmark {
    /// Benchmark name without the GOMAXPROCS suffix.
    pub name: String,
    pub result: TestResult,
    pub output: Vec<String>,
    pub iterations: u64,
    pub ns_per_op: f64,
    pub mb_per_sec: f64,
    pub bytes_per_op: u64,
    pub allocs_per_op: u64,
}

impl Benchmark {
    /// Creates a passing benchmark sample with the given name and ns/op.
    pub fn new(name: impl Into<String>, ns_per_op: f64) -> Self {
        Benchmark {
            name: name.into(),
            result: TestResult::Pass,
            ns_per_op,
            ..Default::default()
        }
    }
}

/// A failure that happened outside of any individual test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageError {
    /// Name of the package or binary that failed.
    pub name: String,
    pub duration: Duration,
    /// Short cause, e.g. `[build failed]`.
    pub cause: String,
    /// Raw output lines describing the failure.
    pub output: Vec<String>,
}

impl PackageError {
    /// Creates a new error for the named package.
    pub fn new(name: impl Into<String>) -> Self {
        PackageError {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Results for a single Go package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    /// Import path of the package.
    pub name: String,
    /// Total time as reported by the package summary.
    ///
    /// Zero means the duration was not reported; renderers then use the sum
    /// of the test durations.
    pub duration: Duration,
    /// Statement coverage percentage, 0 when not reported.
    pub coverage: f64,
    /// Output lines that did not belong to any test.
    pub output: Vec<String>,
    pub tests: Vec<Test>,
    pub benchmarks: Vec<Benchmark>,
    pub build_error: Option<PackageError>,
    pub run_error: Option<PackageError>,
}

impl Package {
    /// Creates an empty package with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Package {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns true if the package built and ran, and all of its tests passed or were skipped.
    pub fn is_successful(&self) -> bool {
        self.build_error.is_none()
            && self.run_error.is_none()
            && self.tests.iter().all(|t| t.result.is_success())
    }

    /// Sum of the durations of all tests in this package.
    pub fn tests_duration(&self) -> Duration {
        self.tests.iter().map(|t| t.duration).sum()
    }
}

/// A complete report of one test tool invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
    pub packages: Vec<Package>,
}

impl Report {
    /// Returns true if no package has a build or run error and every test
    /// passed or was skipped.
    pub fn is_successful(&self) -> bool {
        self.packages.iter().all(Package::is_successful)
    }

    /// Returns the total number of tests in all packages.
    pub fn total_tests(&self) -> usize {
        self.packages.iter().map(|p| p.tests.len()).sum()
    }

    /// Returns the number of tests whose result is neither pass nor skip.
    pub fn count_failures(&self) -> usize {
        self.packages
            .iter()
            .flat_map(|p| p.tests.iter())
            .filter(|t| !t.result.is_success())
            .count()
    }
}
