use std::{fmt, io::IsTerminal, path::PathBuf, str::FromStr};

use clap::{Parser, ValueEnum};
use config::Config;
use logforth::filter::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "Cognito identity demo", version, long_about = concat!("Cognito identity demo v", env!("CARGO_PKG_VERSION")))]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short, env = "COGNITO_DEMO_CONFIG_PATH", default_value = "./cognito-demo.toml")]
    pub config: PathBuf,
    /// Identity pool id, overrides the configuration file.
    #[arg(long, env = "COGNITO_DEMO_POOL_ID")]
    pub pool_id: Option<String>,
    /// AWS region of the identity pool, overrides the configuration file.
    #[arg(long, env = "COGNITO_DEMO_REGION")]
    pub region: Option<String>,
    /// Set the logging level.
    #[arg(long = "log", env = "COGNITO_DEMO_LOG", default_value_t = LogLevel::default())]
    pub log_level: LogLevel,
    /// Set the style of log output
    #[arg(long, env = "COGNITO_DEMO_LOG_STYLE", default_value_t = LogStyle::default())]
    pub log_style: LogStyle,
}

impl Args {
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut config = if self.config.exists() {
            Config::load(&self.config)?
        } else {
            log::debug!("No configuration file at {}, using defaults", self.config.display());
            Config::default()
        };

        if let Some(pool_id) = &self.pool_id {
            config.identity.pool_id = pool_id.clone();
        }

        if let Some(region) = &self.region {
            config.identity.region = region.clone();
        }

        Ok(config)
    }
}

/// Crates logging at the selected level, everything else (the AWS SDK) stays at `warn`.
const WORKSPACE_CRATES: [&str; 3] = ["cognito_demo", "identity", "config"];

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogStyle {
    /// Colorized text, used as the default with TTY output
    Color,
    /// Standard text, used as the default with non-TTY output
    Text,
    /// JSON objects
    Json,
}

impl Default for LogStyle {
    fn default() -> Self {
        if std::io::stderr().is_terminal() {
            LogStyle::Color
        } else {
            LogStyle::Text
        }
    }
}

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogLevel {
    /// Disable logging
    Off,
    /// Only log errors
    Error,
    /// Log errors, and warnings
    Warn,
    /// Log errors, warnings, and info messages
    #[default]
    Info,
    /// Log errors, warnings, info, and debug messages
    Debug,
    /// Log errors, warnings, info, debug, and trace messages
    Trace,
}

impl LogLevel {
    fn directives(self) -> String {
        if self == LogLevel::Off {
            return "off".to_string();
        }

        let mut directives = vec!["warn".to_string()];
        directives.extend(WORKSPACE_CRATES.iter().map(|name| format!("{name}={self}")));

        directives.join(",")
    }

    pub fn env_filter(self) -> EnvFilter {
        EnvFilter::from_str(&self.directives()).expect("log directives are built from known crate names")
    }
}

fn write_value_name(value: &impl ValueEnum, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value.to_possible_value() {
        Some(possible) => f.write_str(possible.get_name()),
        None => Ok(()),
    }
}

impl fmt::Display for LogStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value_name(self, f)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value_name(self, f)
    }
}
