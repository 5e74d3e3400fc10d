//! Stderr logger for the CLI and examples.
//!
//! Lines look like `[  0.042s DEBUG shelfscan_segment] message`. Records from
//! crates outside the workspace are only shown at `warn` and above so that a
//! `debug` run is not flooded by dependencies.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

const OWN_PREFIX: &str = "shelfscan";

struct FrameLogger {
    level: LevelFilter,
    started: Instant,
}

impl FrameLogger {
    fn passes(&self, level: Level, target: &str) -> bool {
        if level > self.level {
            return false;
        }
        target.starts_with(OWN_PREFIX) || level <= Level::Warn
    }
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.passes(metadata.level(), metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let elapsed = self.started.elapsed().as_secs_f64();
        let target = record.target().split("::").next().unwrap_or_default();
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(
            stderr,
            "[{:7.3}s {:>5} {}] {}",
            elapsed,
            record.level(),
            target,
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<FrameLogger> = OnceLock::new();

/// Install the stderr logger with the provided level filter.
///
/// Calling this more than once is a no-op after the first successful
/// initialization.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_none() {
        let logger = LOGGER.get_or_init(|| FrameLogger {
            level,
            started: Instant::now(),
        });
        log::set_logger(logger)?;
        log::set_max_level(level);
    }
    Ok(())
}

/// Install a `tracing` subscriber honouring `RUST_LOG` (default `info`).
///
/// Span close events carry per-stage timings.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .json()
            .flatten_event(true)
            .finish()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_timer(fmt::time::Uptime::default())
            .finish()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foreign_targets_need_warn() {
        let logger = FrameLogger {
            level: LevelFilter::Debug,
            started: Instant::now(),
        };
        assert!(logger.passes(Level::Debug, "shelfscan_segment::edges"));
        assert!(!logger.passes(Level::Trace, "shelfscan_segment::edges"));
        assert!(!logger.passes(Level::Info, "image::codecs"));
        assert!(logger.passes(Level::Warn, "image::codecs"));
    }

    #[test]
    fn init_is_idempotent_and_boxes_its_error() -> Result<(), Box<dyn std::error::Error>> {
        init_with_level(LevelFilter::Warn)?;
        init_with_level(LevelFilter::Debug)?;
        assert_eq!(log::max_level(), LevelFilter::Warn);
        Ok(())
    }
}
