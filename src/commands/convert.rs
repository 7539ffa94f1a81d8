//! Convert `go test` output into a JUnit XML report

use crate::builder;
use crate::commands::Command;
use crate::config::ReportConfig;
use crate::error::{Error, Result};
use crate::gotest;
use crate::junit::Testsuites;
use crate::render;
use crate::ui::UI;
use chrono::{DateTime, FixedOffset, Local};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

pub struct ConvertCommand {
    config: ReportConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    timestamp: Option<DateTime<FixedOffset>>,
}

impl ConvertCommand {
    /// Reads from stdin and writes the report to stdout.
    pub fn new(config: ReportConfig) -> Self {
        ConvertCommand {
            config,
            input: None,
            output: None,
            timestamp: None,
        }
    }

    /// Read `go test` output from a file instead of stdin
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(path.into());
        self
    }

    /// Write the report to a file instead of stdout
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Stamp suites with a fixed time instead of the current local time
    pub fn with_timestamp(mut self, timestamp: DateTime<FixedOffset>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    fn open_input(&self) -> Result<Box<dyn BufRead>> {
        match &self.input {
            Some(path) => {
                let file = File::open(path).map_err(|e| {
                    Error::Other(format!("cannot open input {}: {}", path.display(), e))
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(BufReader::new(io::stdin()))),
        }
    }

    fn hostname(&self, ui: &mut dyn UI) -> Result<String> {
        if let Some(name) = &self.config.hostname {
            return Ok(name.clone());
        }
        match hostname::get().map(|h| h.into_string()) {
            Ok(Ok(name)) => Ok(name),
            Ok(Err(raw)) => {
                ui.warning(&format!("hostname {:?} is not valid UTF-8", raw))?;
                Ok(String::new())
            }
            Err(e) => {
                ui.warning(&format!("could not determine hostname: {}", e))?;
                Ok(String::new())
            }
        }
    }

    fn write_report(&self, suites: &Testsuites) -> Result<()> {
        let header = !self.config.no_xml_header;
        match &self.output {
            Some(path) => {
                let file = File::create(path).map_err(|e| {
                    Error::Other(format!("cannot create output {}: {}", path.display(), e))
                })?;
                let mut writer = BufWriter::new(file);
                suites.write_xml(&mut writer, header)?;
                writer.flush()?;
                info!("wrote report to {}", path.display());
            }
            None => {
                let stdout = io::stdout();
                let mut writer = stdout.lock();
                suites.write_xml(&mut writer, header)?;
                writer.flush()?;
            }
        }
        Ok(())
    }
}

impl Command for ConvertCommand {
    fn execute(&self, ui: &mut dyn UI) -> Result<i32> {
        let input = self.open_input()?;
        let iocopy = self.config.iocopy;
        let events = gotest::parse_stream_with_callback(input, |line| {
            if iocopy {
                ui.output(line)?;
            }
            Ok(())
        })?;

        let package_name = self.config.package_name.as_deref().unwrap_or_default();
        let report = builder::from_events(events, package_name);
        info!(
            "built report with {} package(s), {} test(s), {} failure(s)",
            report.packages.len(),
            report.total_tests(),
            report.count_failures()
        );

        let hostname = self.hostname(ui)?;
        let timestamp = self.timestamp.unwrap_or_else(|| Local::now().into());

        let mut suites = render::junit(&report, &hostname, &timestamp);
        for suite in &mut suites.suites {
            for (key, value) in &self.config.properties {
                suite.add_property(key.as_str(), value.as_str());
            }
        }

        self.write_report(&suites)?;

        if self.config.set_exit_code && !report.is_successful() {
            debug!("report is not successful, exiting with status 1");
            Ok(1)
        } else {
            Ok(0)
        }
    }
}
