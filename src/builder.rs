//! Folding a stream of events into a [`Report`]
//!
//! [`ReportBuilder`] is a reducer: every [`Event`] is applied to the builder
//! state in arrival order with [`ReportBuilder::apply`], and
//! [`ReportBuilder::build`] turns the final state into a [`Report`].
//!
//! The main job of the builder is deciding where free-text output belongs.
//! At any point exactly one [`Sink`] receives output events: the package
//! itself, a running test, a benchmark or a build error. Structural events
//! move the sink around; output events never do.

use crate::event::Event;
use crate::report::{Benchmark, Package, PackageError, Report, Test, TestResult};
use log::{debug, warn};
use std::mem;
use std::time::Duration;

const BUILD_FAILED: &str = "[build failed]";
const SETUP_FAILED: &str = "[setup failed]";

/// Indentation the tool adds per subtest level.
const INDENT: &str = "    ";

/// The structure that currently receives output lines.
///
/// Indices refer to the tests, benchmarks and build errors the builder is
/// still holding for the current package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    Package,
    Test(usize),
    Benchmark(usize),
    BuildError(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestState {
    Running,
    Paused,
    Ended,
}

#[derive(Debug)]
struct InFlightTest {
    test: Test,
    state: TestState,
}

/// Owner of indented output printed right after a terminal result line.
#[derive(Debug, Clone, Copy)]
struct Trailing {
    sink: Sink,
    level: usize,
}

impl Trailing {
    /// Returns true if `line` is indented one level deeper than the owner.
    fn claims(&self, line: &str) -> bool {
        let prefix = INDENT.repeat(self.level);
        match line.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.starts_with(INDENT) || rest.starts_with('\t'),
            None => false,
        }
    }
}

/// Accumulates events into a [`Report`].
///
/// # Examples
///
/// ```
/// use go_junit_report::builder::ReportBuilder;
/// use go_junit_report::event::Event;
/// use go_junit_report::report::TestResult;
/// use std::time::Duration;
///
/// let report = ReportBuilder::new("")
///     .apply(Event::run_test("TestA"))
///     .apply(Event::end_test("TestA", TestResult::Pass, Duration::from_millis(1), 0))
///     .apply(Event::summary("pkg", TestResult::Pass, Duration::ZERO, None))
///     .build();
///
/// assert_eq!(report.packages[0].name, "pkg");
/// assert_eq!(report.packages[0].tests[0].result, TestResult::Pass);
/// ```
#[derive(Debug)]
pub struct ReportBuilder {
    /// Name used for packages whose summary line carries no name.
    package_name: String,
    packages: Vec<Package>,

    tests: Vec<InFlightTest>,
    benchmarks: Vec<Benchmark>,
    output: Vec<String>,
    coverage: f64,

    /// Build errors waiting for their package summary.
    build_errors: Vec<PackageError>,

    sink: Sink,
    trailing: Option<Trailing>,
}

impl ReportBuilder {
    /// Creates a builder that names unnamed packages `package_name`.
    pub fn new(package_name: impl Into<String>) -> Self {
        ReportBuilder {
            package_name: package_name.into(),
            packages: Vec::new(),
            tests: Vec::new(),
            benchmarks: Vec::new(),
            output: Vec::new(),
            coverage: 0.0,
            build_errors: Vec::new(),
            sink: Sink::Package,
            trailing: None,
        }
    }

    /// Returns the structure that would receive the next output line,
    /// ignoring trailing-output attribution.
    pub fn sink(&self) -> Sink {
        self.sink
    }

    /// Applies a single event and returns the updated builder.
    pub fn apply(mut self, event: Event) -> Self {
        self.process(event);
        self
    }

    /// Finalizes any pending package and returns the report.
    pub fn build(mut self) -> Report {
        if !self.tests.is_empty() || !self.benchmarks.is_empty() || !self.output.is_empty() {
            self.finalize_package(String::new(), TestResult::Unknown, Duration::ZERO, None);
        }

        for mut err in mem::take(&mut self.build_errors) {
            if err.cause.is_empty() {
                err.cause = BUILD_FAILED.to_string();
            }
            let mut pkg = Package::new(err.name.clone());
            pkg.build_error = Some(err);
            self.packages.push(pkg);
        }

        Report {
            packages: self.packages,
        }
    }

    fn process(&mut self, event: Event) {
        debug!("applying {} event", event.kind());

        if !matches!(event, Event::Output { .. }) {
            self.trailing = None;
        }

        match event {
            Event::RunTest { name } => self.run_test(name),
            Event::PauseTest { name } => self.pause_test(&name),
            Event::ContinueTest { name } => self.continue_test(&name),
            Event::EndTest {
                name,
                result,
                duration,
                indent,
            } => self.end_test(name, result, duration, indent),
            Event::Benchmark {
                name,
                iterations,
                ns_per_op,
                mb_per_sec,
                bytes_per_op,
                allocs_per_op,
            } => self.benchmarks.push(Benchmark {
                name,
                result: TestResult::Pass,
                output: Vec::new(),
                iterations,
                ns_per_op,
                mb_per_sec,
                bytes_per_op,
                allocs_per_op,
            }),
            Event::EndBenchmark { name, result } => self.end_benchmark(name, result),
            Event::Status => self.sink = Sink::Package,
            Event::Summary {
                name,
                result,
                duration,
                data,
            } => self.finalize_package(name, result, duration, data),
            Event::Coverage { percent, packages } => {
                debug!("coverage {:.1}% of {:?}", percent, packages);
                self.coverage = percent;
            }
            Event::BuildOutput { name } => self.build_output(name),
            Event::Output { data } => self.append_output(data),
            Event::Unknown { kind, line } => {
                warn!("ignoring unhandled event {}: {}", kind, line);
            }
        }
    }

    fn run_test(&mut self, name: String) {
        let level = name.matches('/').count();
        self.tests.push(InFlightTest {
            test: Test::new(name).with_level(level),
            state: TestState::Running,
        });
        self.sink = Sink::Test(self.tests.len() - 1);
    }

    fn pause_test(&mut self, name: &str) {
        match self.find_test(name) {
            Some(id) => self.tests[id].state = TestState::Paused,
            None => warn!("pause for unknown test {}", name),
        }
        self.sink = Sink::Package;
    }

    fn continue_test(&mut self, name: &str) {
        match self.find_test(name) {
            Some(id) => {
                self.tests[id].state = TestState::Running;
                self.sink = Sink::Test(id);
            }
            None => {
                warn!("continue for unknown test {}", name);
                self.sink = Sink::Package;
            }
        }
    }

    fn end_test(&mut self, name: String, result: TestResult, duration: Duration, indent: usize) {
        let id = match self.find_test(&name) {
            Some(id) => id,
            None => {
                self.tests.push(InFlightTest {
                    test: Test::new(name),
                    state: TestState::Running,
                });
                self.tests.len() - 1
            }
        };

        let entry = &mut self.tests[id];
        entry.state = TestState::Ended;
        entry.test.result = result;
        entry.test.duration = duration;
        entry.test.level = indent;

        self.sink = self.fallback_sink(id);
        self.trailing = Some(Trailing {
            sink: Sink::Test(id),
            level: indent,
        });
    }

    fn end_benchmark(&mut self, name: String, result: TestResult) {
        let id = match self.benchmarks.iter().rposition(|b| b.name == name) {
            Some(id) => id,
            None => {
                self.benchmarks.push(Benchmark {
                    name,
                    ..Default::default()
                });
                self.benchmarks.len() - 1
            }
        };
        self.benchmarks[id].result = result;
        self.trailing = Some(Trailing {
            sink: Sink::Benchmark(id),
            level: 0,
        });
    }

    fn build_output(&mut self, name: String) {
        if !self.tests.is_empty() || !self.benchmarks.is_empty() {
            self.finalize_package(String::new(), TestResult::Unknown, Duration::ZERO, None);
        }
        self.build_errors.push(PackageError::new(name));
        self.sink = Sink::BuildError(self.build_errors.len() - 1);
    }

    fn append_output(&mut self, line: String) {
        let sink = match self.trailing.filter(|t| t.claims(&line)) {
            Some(trailing) => trailing.sink,
            None => {
                self.trailing = None;
                self.sink
            }
        };

        match sink {
            Sink::Package => self.output.push(line),
            Sink::Test(id) => self.tests[id].test.output.push(line),
            Sink::Benchmark(id) => self.benchmarks[id].output.push(line),
            Sink::BuildError(id) => self.build_errors[id].output.push(line),
        }
    }

    fn finalize_package(
        &mut self,
        name: String,
        result: TestResult,
        duration: Duration,
        data: Option<String>,
    ) {
        let name = if name.is_empty() {
            self.package_name.clone()
        } else {
            name
        };

        let tests = self
            .tests
            .drain(..)
            .map(|entry| {
                if entry.state != TestState::Ended {
                    warn!("no result found for test {} in {}", entry.test.name, name);
                }
                entry.test
            })
            .collect();

        let mut pkg = Package {
            duration,
            coverage: mem::take(&mut self.coverage),
            output: mem::take(&mut self.output),
            tests,
            benchmarks: mem::take(&mut self.benchmarks),
            ..Package::new(name)
        };

        if matches!(data.as_deref(), Some(BUILD_FAILED) | Some(SETUP_FAILED)) {
            if let Some(pos) = self.build_errors.iter().position(|e| e.name == pkg.name) {
                let mut err = self.build_errors.remove(pos);
                err.cause = data.clone().unwrap_or_default();
                err.duration = duration;
                pkg.build_error = Some(err);
            }
        }

        if pkg.build_error.is_none()
            && pkg.tests.is_empty()
            && pkg.benchmarks.is_empty()
            && result == TestResult::Fail
        {
            pkg.run_error = Some(PackageError {
                name: pkg.name.clone(),
                duration,
                cause: data.unwrap_or_default(),
                output: mem::take(&mut pkg.output),
            });
        }

        debug!(
            "finished package {} with {} test(s)",
            pkg.name,
            pkg.tests.len()
        );
        self.packages.push(pkg);
        self.sink = Sink::Package;
        self.trailing = None;
    }

    /// Most recently started test with this name that has not ended yet.
    fn find_test(&self, name: &str) -> Option<usize> {
        self.tests
            .iter()
            .rposition(|t| t.test.name == name && t.state != TestState::Ended)
    }

    /// Sink to return to after test `id` ended: its closest running parent, or the package.
    fn fallback_sink(&self, id: usize) -> Sink {
        let name = &self.tests[id].test.name;
        self.tests
            .iter()
            .enumerate()
            .rev()
            .find(|(_, t)| {
                t.state == TestState::Running
                    && name.len() > t.test.name.len()
                    && name.starts_with(t.test.name.as_str())
                    && name[t.test.name.len()..].starts_with('/')
            })
            .map(|(parent, _)| Sink::Test(parent))
            .unwrap_or(Sink::Package)
    }
}

/// Builds a report from a complete sequence of events.
///
/// Packages without a name in their summary are named `package_name`.
pub fn from_events(events: impl IntoIterator<Item = Event>, package_name: &str) -> Report {
    events
        .into_iter()
        .fold(ReportBuilder::new(package_name), ReportBuilder::apply)
        .build()
}
