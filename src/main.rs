//! go-junit-report - Convert `go test` output into a JUnit XML report

use clap::{Parser, ValueEnum};
use go_junit_report::commands::{Command, ConvertCommand};
use go_junit_report::config::{parse_property, ReportConfig};
use go_junit_report::error::Result;
use go_junit_report::ui::{CliUI, UI};
use log::{debug, LevelFilter};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "go-junit-report")]
#[command(about = "Convert go test output into a JUnit XML report", long_about = None)]
#[command(version)]
struct Cli {
    /// Read go test output from FILE instead of stdin
    #[arg(long = "in", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the XML report to FILE instead of stdout
    #[arg(long = "out", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Copy the input to stdout while reading it
    #[arg(long)]
    iocopy: bool,

    /// Package name to use for output that has no package summary
    #[arg(long, value_name = "NAME")]
    package_name: Option<String>,

    /// Exit with status 1 if the report contains failures or errors
    #[arg(long)]
    set_exit_code: bool,

    /// Do not write the <?xml ...?> declaration
    #[arg(long)]
    no_xml_header: bool,

    /// Add a property to every test suite
    #[arg(short = 'p', long = "property", value_name = "KEY=VALUE")]
    properties: Vec<String>,

    /// Hostname to write to the report instead of the local hostname
    #[arg(long, value_name = "NAME")]
    hostname: Option<String>,

    /// Read settings from an INI configuration file
    #[arg(long, value_name = "FILE", env = "GO_JUNIT_REPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Set the log level explicitly, overriding -v
    #[arg(long, value_name = "LEVEL", value_enum, ignore_case = true)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if let Some(level) = self.log_level {
            return level.into();
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Merge the configuration file, if any, with command line flags
    fn report_config(&self) -> Result<ReportConfig> {
        let mut config = match &self.config {
            Some(path) => ReportConfig::load_from_file(path)?,
            None => ReportConfig::default(),
        };

        if self.package_name.is_some() {
            config.package_name = self.package_name.clone();
        }
        if self.hostname.is_some() {
            config.hostname = self.hostname.clone();
        }
        for prop in &self.properties {
            config.properties.push(parse_property(prop)?);
        }
        config.set_exit_code |= self.set_exit_code;
        config.no_xml_header |= self.no_xml_header;
        config.iocopy |= self.iocopy;

        Ok(config)
    }
}

fn init_logging(level: LevelFilter) -> std::result::Result<(), log::SetLoggerError> {
    // stdout may carry the report, so logs go to stderr.
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

fn run(cli: &Cli, ui: &mut dyn UI) -> Result<i32> {
    let config = cli.report_config()?;
    debug!("Using configuration {:?}", config);

    let mut cmd = ConvertCommand::new(config);
    if let Some(input) = &cli.input {
        cmd = cmd.with_input(input);
    }
    if let Some(output) = &cli.output {
        cmd = cmd.with_output(output);
    }
    cmd.execute(ui)
}

fn main() {
    let cli = Cli::parse();
    let mut ui = CliUI::new();

    if let Err(e) = init_logging(cli.log_level()) {
        let _ = ui.warning(&format!("cannot initialize logging: {}", e));
    }

    match run(&cli, &mut ui) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            let _ = ui.error(&e.to_string());
            std::process::exit(1);
        }
    }
}
