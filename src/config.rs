//! Command-line configuration.

use crate::model::VentilationMethod;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Parser, Debug)]
#[command(name = "ifc-space-viewer")]
#[command(about = "IFC Space Viewer - inspect, filter and check building spaces from IFC models")]
#[command(version)]
pub struct Args {
    /// IFC file to upload on start-up
    pub file: Option<PathBuf>,

    /// Base URL of the analysis backend
    #[arg(long, env = "IFC_API_URL", default_value = DEFAULT_API_URL, value_name = "URL")]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 120, value_name = "SECS")]
    pub timeout: u64,

    /// Default ventilation calculation method
    #[arg(long, default_value = "building_code", value_name = "METHOD")]
    pub method: VentilationMethod,

    /// Export spaces to CSV and exit (requires FILE)
    #[arg(long, value_name = "FILE", requires = "file")]
    pub csv: Option<PathBuf>,

    /// Export spaces to JSON and exit (requires FILE)
    #[arg(long, value_name = "FILE", requires = "file")]
    pub json: Option<PathBuf>,

    /// Export spaces to an Excel workbook and exit (requires FILE)
    #[arg(long, value_name = "FILE", requires = "file")]
    pub xlsx: Option<PathBuf>,

    /// Run without the 3D viewer
    #[arg(long)]
    pub no_viewer: bool,

    /// Write logs to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Resolved settings shared by the app and the API client.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub method: VentilationMethod,
    pub initial_file: Option<PathBuf>,
    pub viewer_enabled: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(120),
            method: VentilationMethod::default(),
            initial_file: None,
            viewer_enabled: true,
            log_file: None,
        }
    }
}

impl Args {
    #[must_use]
    pub fn is_headless(&self) -> bool {
        self.csv.is_some() || self.json.is_some() || self.xlsx.is_some()
    }

    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            api_url: self.api_url.clone(),
            timeout: Duration::from_secs(self.timeout.max(1)),
            method: self.method,
            initial_file: self.file.clone(),
            viewer_enabled: !self.no_viewer,
            log_file: self.log_file.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["ifc-space-viewer"]).unwrap();
        assert!(!args.is_headless());
        let config = args.config();
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.method, VentilationMethod::BuildingCode);
        assert!(config.viewer_enabled);
    }

    #[test]
    fn headless_export_needs_a_model() {
        assert!(Args::try_parse_from(["ifc-space-viewer", "--csv", "out.csv"]).is_err());

        let args =
            Args::try_parse_from(["ifc-space-viewer", "model.ifc", "--xlsx", "out.xlsx"]).unwrap();
        assert!(args.is_headless());
    }

    #[test]
    fn method_is_validated() {
        let args = Args::try_parse_from(["ifc-space-viewer", "--method", "area_based"]).unwrap();
        assert_eq!(args.method, VentilationMethod::AreaBased);
        assert!(Args::try_parse_from(["ifc-space-viewer", "--method", "guess"]).is_err());
    }
}
