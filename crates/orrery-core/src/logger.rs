//! Stderr logger for the CLI and tests.
//!
//! Lines look like `   1.234s DEBUG orrery_scene::scene: checking marker id 141`.
//! Records from crates outside this workspace never go below `warn`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, fmt::format::FmtSpan, EnvFilter};

const OWN_PREFIX: &str = "orrery";

struct StderrLogger {
    level: LevelFilter,
    started: Instant,
}

impl StderrLogger {
    fn max_level_for(&self, target: &str) -> LevelFilter {
        if target.starts_with(OWN_PREFIX) {
            self.level
        } else {
            self.level.min(LevelFilter::Warn)
        }
    }
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut out = std::io::stderr().lock();
        let _ = writeln!(
            out,
            "{:>8.3}s {:<5} {}: {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Later calls keep the first level and succeed.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = LOGGER.get_or_init(|| StderrLogger {
        level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Map a `-v` count to a level: 0 → warn, 1 → info, 2 → debug, 3+ → trace.
pub fn level_from_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Install a `tracing` subscriber on stderr (filter from `RUST_LOG`,
/// `orrery=info,warn` otherwise). `log` records are forwarded to it.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("orrery=info,warn"));
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let installed = if json {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.with_timer(fmt::time::Uptime::default()).try_init()
    };
    if let Err(err) = installed {
        eprintln!("tracing subscriber not installed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_from_verbosity(0), LevelFilter::Warn);
        assert_eq!(level_from_verbosity(1), LevelFilter::Info);
        assert_eq!(level_from_verbosity(2), LevelFilter::Debug);
        assert_eq!(level_from_verbosity(7), LevelFilter::Trace);
    }

    #[test]
    fn foreign_targets_are_capped_at_warn() {
        let logger = StderrLogger {
            level: LevelFilter::Trace,
            started: Instant::now(),
        };
        assert_eq!(logger.max_level_for("orrery_scene::scene"), LevelFilter::Trace);
        assert_eq!(logger.max_level_for("image::codecs::png"), LevelFilter::Warn);

        let quiet = StderrLogger {
            level: LevelFilter::Error,
            started: Instant::now(),
        };
        assert_eq!(quiet.max_level_for("naga"), LevelFilter::Error);
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_with_level(LevelFilter::Warn).expect("first init");
        init_with_level(LevelFilter::Debug).expect("second init is a no-op");
    }
}
