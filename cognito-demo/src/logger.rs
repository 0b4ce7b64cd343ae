use std::fmt::Write;

use jiff::{Zoned, tz::TimeZone};
use log::{Level, Record};
use logforth::{
    append::Stderr,
    diagnostic::Diagnostic,
    layout::{JsonLayout, Layout},
};

use crate::args::{Args, LogStyle};

/// One line per record: UTC time, level, emitting crate and message.
#[derive(Debug, Clone, Copy)]
struct LineLayout {
    colored: bool,
}

impl LineLayout {
    fn format_line(&self, now: &Zoned, record: &Record<'_>) -> anyhow::Result<String> {
        let mut line = String::new();
        let level = record.level();

        write!(line, "{} ", now.strftime("%H:%M:%S%.3f"))?;

        match level_color(level) {
            Some(color) if self.colored => write!(line, "\x1b[{color}m{level:<5}\x1b[0m")?,
            _ => write!(line, "{level:<5}")?,
        }

        // Module paths below the crate root add nothing to a terminal session.
        let target = record.target().split("::").next().unwrap_or_default();

        write!(line, " [{target}] {}", record.args())?;

        Ok(line)
    }
}

fn level_color(level: Level) -> Option<u8> {
    match level {
        Level::Error => Some(31),
        Level::Warn => Some(33),
        Level::Info => Some(32),
        Level::Debug => Some(34),
        Level::Trace => None,
    }
}

impl Layout for LineLayout {
    fn format(&self, record: &Record<'_>, _diagnostics: &[Box<dyn Diagnostic>]) -> anyhow::Result<Vec<u8>> {
        let now = Zoned::now().with_time_zone(TimeZone::UTC);

        Ok(self.format_line(&now, record)?.into_bytes())
    }
}

/// Logs go to stderr, stdout belongs to the command prompt.
pub(super) fn init(args: &Args) {
    logforth::builder()
        .dispatch(|d| {
            let stderr = match args.log_style {
                LogStyle::Color => Stderr::default().with_layout(LineLayout { colored: true }),
                LogStyle::Text => Stderr::default().with_layout(LineLayout { colored: false }),
                LogStyle::Json => Stderr::default().with_layout(JsonLayout::default()),
            };

            d.filter(args.log_level.env_filter()).append(stderr)
        })
        .apply();
}
