//! Configuration file parsing and handling
//!
//! The configuration file uses INI format with a [DEFAULT] section holding
//! the same settings that can be given on the command line. Command line
//! flags take precedence over values read from the file.

use crate::error::{Error, Result};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Report settings, loaded from a configuration file and/or the command line
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Package name used for output that has no package summary
    #[serde(deserialize_with = "non_empty")]
    pub package_name: Option<String>,

    /// Hostname written to every suite instead of the local hostname
    #[serde(deserialize_with = "non_empty")]
    pub hostname: Option<String>,

    /// Extra properties added to every suite, written as `k1=v1, k2=v2`
    #[serde(deserialize_with = "property_list")]
    pub properties: Vec<(String, String)>,

    /// Exit with a non-zero status if the report contains failures
    #[serde(deserialize_with = "flag")]
    pub set_exit_code: bool,

    /// Omit the `<?xml ...?>` declaration
    #[serde(deserialize_with = "flag")]
    pub no_xml_header: bool,

    /// Copy the input to standard output while reading it
    #[serde(deserialize_with = "flag")]
    pub iocopy: bool,
}

impl ReportConfig {
    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from a string
    pub fn parse(contents: &str) -> Result<Self> {
        let mut ini: HashMap<String, ReportConfig> = serde_ini::from_str(contents)
            .map_err(|e| Error::Config(format!("Failed to parse configuration: {}", e)))?;

        ini.remove("DEFAULT")
            .ok_or_else(|| Error::Config("No [DEFAULT] section in configuration".to_string()))
    }
}

/// Parse a `KEY=VALUE` property
pub fn parse_property(s: &str) -> Result<(String, String)> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| Error::Config(format!("invalid property {:?}, expected KEY=VALUE", s)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::Config(format!("property {:?} has an empty key", s)));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

fn non_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value = String::deserialize(deserializer)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn property_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<(String, String)>, D::Error> {
    String::deserialize(deserializer)?
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| parse_property(p).map_err(de::Error::custom))
        .collect()
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    let value = String::deserialize(deserializer)?;
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        _ => Err(de::Error::custom(format!(
            "expected a boolean (true/false/1/0/yes/no), got {:?}",
            value
        ))),
    }
}
