use std::fmt;

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    registry::LookupSpan,
};

const TIMESTAMP: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Escape sequences for one output; all empty when colour is off.
struct Palette {
    reset: &'static str,
    dim: &'static str,
    level: &'static str,
}

impl Palette {
    fn new(use_ansi: bool, level: &Level) -> Self {
        if !use_ansi {
            return Self {
                reset: "",
                dim: "",
                level: "",
            };
        }
        let level = match *level {
            Level::ERROR => "\x1b[1;31m",
            Level::WARN => "\x1b[1;33m",
            Level::INFO => "\x1b[1;32m",
            Level::DEBUG => "\x1b[1;34m",
            Level::TRACE => "\x1b[1;35m",
        };
        Self {
            reset: "\x1b[0m",
            dim: "\x1b[2m",
            level,
        }
    }
}

/// Drops the crate name from our own module paths.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(concat!(env!("CARGO_CRATE_NAME"), "::"))
        .unwrap_or(target)
}

/// `[timestamp] LEVEL target:line > message`, optionally coloured.
pub struct CustomFormatter {
    use_ansi: bool,
}

impl CustomFormatter {
    pub fn new(use_ansi: bool) -> Self {
        Self { use_ansi }
    }
}

impl<S, N> FormatEvent<S, N> for CustomFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let palette = Palette::new(self.use_ansi, metadata.level());

        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let timestamp = now
            .format(TIMESTAMP)
            .unwrap_or_else(|_| "unknown time".to_string());

        write!(
            writer,
            "{dim}[{timestamp}]{reset} {level}{:<5}{reset} {dim}{}:{}{reset} > ",
            metadata.level().as_str(),
            short_target(metadata.target()),
            metadata.line().unwrap_or_default(),
            dim = palette.dim,
            reset = palette.reset,
            level = palette.level,
        )?;

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer, "{}", palette.reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn own_targets_are_shortened() {
        assert_eq!(short_target("chimebot::scheduler::group"), "scheduler::group");
        assert_eq!(short_target("tower_http::trace"), "tower_http::trace");
    }

    #[test]
    fn plain_palette_is_empty() {
        let palette = Palette::new(false, &Level::ERROR);
        assert_eq!(palette.reset, "");
        assert_eq!(palette.level, "");
    }
}
