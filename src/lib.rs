//! go-junit-report - Convert `go test` output into JUnit XML reports
//!
//! # Overview
//!
//! CI systems understand JUnit XML but `go test` prints plain text. This
//! crate turns the text into a report in three stages:
//!
//! 1. [`gotest`] classifies each line of `go test` output into an [`event::Event`].
//! 2. [`builder`] replays the events and groups tests, benchmarks, output and
//!    errors by package into a [`report::Report`].
//! 3. [`render`] converts the report into a [`junit::Testsuites`] document,
//!    which can be written as XML.
//!
//! # Architecture
//!
//! - [`event`]: the events produced by the scanner
//! - [`report`]: the tool-neutral report model
//! - [`builder`]: the event-to-report state machine
//! - [`format`]: output indentation cleanup and benchmark aggregation
//! - [`junit`]: the JUnit document model and its XML serialization
//! - [`render`]: report to JUnit conversion
//! - [`gotest`]: the `go test` output scanner
//! - [`config`]: configuration file parsing
//! - [`commands`]: the end-to-end conversion command
//! - [`ui`]: user interface abstraction for output
//! - [`error`]: error types and Result alias
//!
//! # Example
//!
//! ```
//! use go_junit_report::{builder, gotest, render};
//! use chrono::{FixedOffset, TimeZone};
//!
//! # fn main() -> go_junit_report::error::Result<()> {
//! let output = "=== RUN   TestA\n--- PASS: TestA (0.01s)\nPASS\nok  \texample.com/pkg\t0.015s\n";
//! let events = gotest::parse_stream(output.as_bytes())?;
//! let report = builder::from_events(events, "");
//! assert!(report.is_successful());
//!
//! let timestamp = FixedOffset::east_opt(0)
//!     .unwrap()
//!     .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
//!     .unwrap();
//! let xml = render::junit(&report, "localhost", &timestamp).to_xml_string()?;
//! assert!(xml.contains("<testcase name=\"TestA\""));
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod commands;
pub mod config;
pub mod error;
pub mod event;
pub mod format;
pub mod gotest;
pub mod junit;
pub mod render;
pub mod report;
pub mod ui;

pub use error::{Error, Result};
