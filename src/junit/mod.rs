//! JUnit XML document model
//!
//! The types mirror the JUnit/xUnit XML schema understood by most CI systems:
//! a `<testsuites>` root holding one `<testsuite>` per package, each with
//! `<testcase>` elements that may carry a single `<failure>`, `<error>` or
//! `<skipped>` record. Attribute values are kept as preformatted strings so
//! the document can be written without further conversion.

mod serialize;

use crate::error::Result;
use std::io;
use std::time::Duration;

/// The root element of a JUnit document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Testsuites {
    pub name: Option<String>,
    pub time: Option<String>,
    pub tests: usize,
    pub errors: usize,
    pub failures: usize,
    pub skipped: usize,
    pub disabled: usize,
    pub suites: Vec<Testsuite>,
}

impl Testsuites {
    /// Adds a suite, assigns its id and updates the aggregate counters.
    pub fn add_suite(&mut self, mut suite: Testsuite) {
        suite.id = self.suites.len();
        self.tests += suite.tests;
        self.errors += suite.errors;
        self.failures += suite.failures;
        self.skipped += suite.skipped;
        self.disabled += suite.disabled;
        self.suites.push(suite);
    }

    /// Writes the document as XML.
    ///
    /// The `<?xml ...?>` declaration is written only if `header` is true.
    pub fn write_xml<W: io::Write>(&self, writer: W, header: bool) -> Result<()> {
        serialize::serialize_testsuites(self, writer, header)?;
        Ok(())
    }

    /// Serializes the document to a string, including the XML declaration.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_xml(&mut buf, true)?;
        String::from_utf8(buf).map_err(|e| e.to_string().into())
    }
}

/// A `<testsuite>` element, one per package.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Testsuite {
    pub name: String,
    pub tests: usize,
    pub failures: usize,
    pub errors: usize,
    /// Position of the suite in its document, set by [`Testsuites::add_suite`].
    pub id: usize,
    pub disabled: usize,
    pub hostname: Option<String>,
    pub skipped: usize,
    pub time: String,
    /// RFC 3339 timestamp.
    pub timestamp: Option<String>,
    pub properties: Vec<Property>,
    pub testcases: Vec<Testcase>,
    pub system_out: Option<Output>,
    pub system_err: Option<Output>,
}

impl Testsuite {
    /// Creates an empty suite with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Testsuite {
            name: name.into(),
            time: format_duration(Duration::ZERO),
            ..Default::default()
        }
    }

    /// Appends a property.
    pub fn add_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.push(Property {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Appends a test case and updates the suite counters.
    pub fn add_testcase(&mut self, testcase: Testcase) {
        self.tests += 1;
        match testcase.status {
            TestcaseStatus::Success => {}
            TestcaseStatus::Failure(_) => self.failures += 1,
            TestcaseStatus::Error(_) => self.errors += 1,
            TestcaseStatus::Skipped(_) => self.skipped += 1,
        }
        self.testcases.push(testcase);
    }
}

/// A `<testcase>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Testcase {
    pub name: String,
    pub classname: String,
    pub time: String,
    pub status: TestcaseStatus,
    pub system_out: Option<Output>,
    pub system_err: Option<Output>,
}

impl Testcase {
    /// Creates a successful test case.
    pub fn new(classname: impl Into<String>, name: impl Into<String>, time: String) -> Self {
        Testcase {
            name: name.into(),
            classname: classname.into(),
            time,
            ..Default::default()
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: TestcaseStatus) -> Self {
        self.status = status;
        self
    }
}

/// The outcome of a test case. At most one record is written per test case.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TestcaseStatus {
    #[default]
    Success,
    Failure(ResultRecord),
    Error(ResultRecord),
    Skipped(ResultRecord),
}

/// Contents of a `<failure>`, `<error>` or `<skipped>` element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRecord {
    pub message: String,
    pub ty: Option<String>,
    /// Character data, written only when non-empty.
    pub data: String,
}

impl ResultRecord {
    pub fn new(message: impl Into<String>, data: impl Into<String>) -> Self {
        ResultRecord {
            message: message.into(),
            ty: None,
            data: data.into(),
        }
    }
}

/// A `<property>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// Contents of a `<system-out>` or `<system-err>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub data: String,
}

impl Output {
    pub fn new(data: impl Into<String>) -> Self {
        Output { data: data.into() }
    }
}

/// Formats a duration as seconds with millisecond precision.
pub fn format_duration(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

/// Formats a benchmark duration as seconds with nanosecond precision.
pub fn format_benchmark_time(d: Duration) -> String {
    format!("{:.9}", d.as_secs_f64())
}
