use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{
    Layer,
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
};

/// Target prefix shared by the library and this binary.
const CRATE_TARGET: &str = "hnfeat";

/// Console level for hnfeat events: `-q` keeps errors only, each `-v` adds a level.
fn console_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// hnfeat events at `level`; other crates never go past WARN.
fn targets(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level.min(LevelFilter::WARN))
        .with_target(CRATE_TARGET, level)
}

/// The log file records per-model and per-residue detail down to DEBUG even
/// when the console is quieter.
fn file_targets(verbosity: u8) -> Targets {
    targets(console_level(verbosity, false).max(LevelFilter::DEBUG))
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_filter(targets(console_level(verbosity, quiet)));

    let file = match log_file {
        Some(path) => {
            let writer = File::create(&path)?;
            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_filter(file_targets(verbosity)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::Level;
    use tracing::{debug, info, trace, warn};

    #[test]
    fn console_level_follows_flags() {
        assert_eq!(console_level(0, false), LevelFilter::WARN);
        assert_eq!(console_level(1, false), LevelFilter::INFO);
        assert_eq!(console_level(2, false), LevelFilter::DEBUG);
        assert_eq!(console_level(7, false), LevelFilter::TRACE);
        assert_eq!(console_level(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn verbosity_only_raises_hnfeat_targets() {
        let verbose = targets(console_level(2, false));
        assert!(verbose.would_enable("hnfeat::engine::tasks::aggregation", &Level::DEBUG));
        assert!(!verbose.would_enable("kiddo", &Level::INFO));
        assert!(verbose.would_enable("kiddo", &Level::WARN));

        let quiet = targets(console_level(2, true));
        assert!(!quiet.would_enable("hnfeat::workflows::featurize", &Level::WARN));
        assert!(!quiet.would_enable("rayon", &Level::WARN));
        assert!(quiet.would_enable("hnfeat", &Level::ERROR));
    }

    #[test]
    fn file_targets_keep_debug_detail() {
        assert!(file_targets(0).would_enable("hnfeat::engine", &Level::DEBUG));
        assert!(!file_targets(0).would_enable("hnfeat::engine", &Level::TRACE));
        assert!(file_targets(3).would_enable("hnfeat::engine", &Level::TRACE));
        assert!(!file_targets(3).would_enable("indicatif", &Level::INFO));
    }

    #[test]
    fn file_layer_records_events_below_console_level() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("hnfeat.log");
        let file = File::create(&log_path).unwrap();
        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_filter(file_targets(0)),
        );

        tracing::subscriber::with_default(subscriber, || {
            debug!(model = 3, anchors = 12, "Model featurized.");
            trace!("Residue is not an anchor");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Model featurized."));
        assert!(content.contains("anchors=12"));
        assert!(!content.contains("Residue is not an anchor"));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let result = setup_logging(0, false, Some(PathBuf::from("/nonexistent/dir/hnfeat.log")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    #[serial]
    fn global_logger_installs_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = setup_logging(1, false, Some(temp_dir.path().join("run.log")));
        info!("Logger installed.");
        warn!(inputs = 2, "Second input shares a stem.");
        let second = setup_logging(1, false, None);

        assert!(first.is_ok());
        assert!(matches!(second, Err(CliError::Other(_))));
    }
}
