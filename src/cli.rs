//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::widget::Theme;
use clap::Parser;
use std::path::PathBuf;

/// Bountystats - embeddable stats widget for a bounty board
///
/// Pulls bounty data from the board's API, derives aggregate metrics,
/// caches them, and serves them as JSON, an HTML widget and an embed script.
///
/// Examples:
///   bountystats --api-url https://bounties.example.com/api
///   bountystats --port 8080 --public-url https://stats.example.com
///   bountystats --once --format json
///   bountystats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base URL of the bounty API
    ///
    /// `/bounties` and `/stats` are requested relative to this URL.
    #[arg(long, value_name = "URL", env = "BOUNTY_API_URL")]
    pub api_url: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port for the HTTP server
    #[arg(short, long, value_name = "PORT", env = "BOUNTYSTATS_PORT")]
    pub port: Option<u16>,

    /// Public base URL used in generated embed snippets
    #[arg(long, value_name = "URL", env = "BOUNTYSTATS_PUBLIC_URL")]
    pub public_url: Option<String>,

    /// How long a stats snapshot is served before refreshing, in seconds
    #[arg(long, value_name = "SECS")]
    pub ttl: Option<u64>,

    /// Upstream request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Default widget theme
    #[arg(long, value_name = "THEME")]
    pub theme: Option<Theme>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .bountystats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Fetch stats once, print them and exit instead of serving
    #[arg(long)]
    pub once: bool,

    /// Output format for --once (json, html)
    #[arg(long, default_value = "json", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Generate a default .bountystats.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for one-shot mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON snapshot (default)
    #[default]
    Json,
    /// Rendered HTML widget
    Html,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.api_url {
            if !is_http_url(url) {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(ref url) = self.public_url {
            if !is_http_url(url) {
                return Err("Public URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.ttl == Some(0) {
            return Err("TTL must be at least 1 second".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.port == Some(0) {
            return Err("Port must be between 1 and 65535".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            api_url: Some("https://bounties.example.com/api".to_string()),
            host: None,
            port: None,
            public_url: None,
            ttl: None,
            timeout: None,
            theme: None,
            config: None,
            verbose: false,
            quiet: false,
            once: false,
            format: OutputFormat::Json,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "bountystats",
            "--api-url",
            "http://localhost:9000",
            "--ttl",
            "60",
            "--theme",
            "dark",
            "--once",
            "--format",
            "html",
        ])
        .unwrap();

        assert_eq!(args.api_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(args.ttl, Some(60));
        assert_eq!(args.theme, Some(Theme::Dark));
        assert!(args.once);
        assert_eq!(args.format, OutputFormat::Html);
    }

    #[test]
    fn test_validation_ok() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.api_url = Some("ftp://example.com".to_string());
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.public_url = Some("stats.example.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_durations() {
        let mut args = make_args();
        args.ttl = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
