use hnfeat::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

const SPINNER_TICK_MS: u64 = 80;

/// Bar plus the running tallies shown next to it.
struct ProgressDisplay {
    bar: ProgressBar,
    failed_inputs: u64,
    anchors: usize,
}

impl ProgressDisplay {
    fn spin(&mut self, name: &str) {
        self.bar.reset();
        self.bar.set_style(spinner_style());
        self.bar.set_length(0);
        self.bar.set_message(name.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
    }

    fn count(&mut self, total: u64, unit: &str) {
        self.bar.disable_steady_tick();
        self.bar.reset();
        self.bar.set_style(counter_style(unit));
        self.bar.set_length(total);
        self.bar.set_message(String::new());
        self.failed_inputs = 0;
        self.anchors = 0;
    }

    fn done(&mut self, summary: String) {
        self.bar.disable_steady_tick();
        if let Some(total) = self.bar.length() {
            self.bar.set_position(total);
        }
        self.bar.finish_with_message(summary);
    }
}

/// Renders featurization progress on stderr.
///
/// Ensemble models and batch inputs drive a counting bar; whole-ensemble steps
/// such as aggregation show a spinner.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<ProgressDisplay>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr());
        bar.finish_and_clear();
        Self {
            display: Arc::new(Mutex::new(ProgressDisplay {
                bar,
                failed_inputs: 0,
                anchors: 0,
            })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();

        Box::new(move |event: Progress| {
            let Ok(mut display) = display.lock() else {
                warn!("Progress display mutex was poisoned; dropping event.");
                return;
            };

            match event {
                Progress::StageStart { name } => display.spin(name),
                Progress::StageFinish => {
                    let name = display.bar.message();
                    display.done(format!("✓ {}", name));
                }
                Progress::ModelsStart { models } => display.count(models, "models"),
                Progress::ModelFinished {
                    model_index,
                    anchors,
                    skipped,
                } => {
                    debug!(model = model_index, anchors, skipped, "Model featurized.");
                    display.anchors += anchors;
                    display.bar.inc(1);
                    let message = format!("model {}: {} anchor(s)", model_index, anchors);
                    display.bar.set_message(message);
                }
                Progress::ModelsFinish => {
                    let summary = format!("✓ {} anchor rows across models", display.anchors);
                    display.done(summary);
                }
                Progress::BatchStart { inputs } => display.count(inputs, "inputs"),
                Progress::InputFinished { source, succeeded } => {
                    if !succeeded {
                        display.failed_inputs += 1;
                    }
                    display.bar.inc(1);
                    let name = source
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    display.bar.set_message(name);
                }
                Progress::BatchFinish => {
                    let summary = match display.failed_inputs {
                        0 => "✓ all inputs featurized".to_string(),
                        n => format!("✗ {} input(s) failed", n),
                    };
                    display.done(summary);
                }
            }
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn counter_style(unit: &str) -> ProgressStyle {
    let template = format!("[{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} {{msg}}", unit);
    ProgressStyle::with_template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn handler_starts_finished_and_empty() {
        let handler = CliProgressHandler::new();
        let display = handler.display.lock().unwrap();
        assert_eq!(display.bar.length(), Some(0));
        assert!(display.bar.is_finished());
    }

    #[test]
    fn models_drive_the_counter() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::ModelsStart { models: 3 });
        for model_index in 0..2 {
            callback(Progress::ModelFinished {
                model_index,
                anchors: 8,
                skipped: 1,
            });
        }
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.bar.length(), Some(3));
            assert_eq!(display.bar.position(), 2);
            assert_eq!(display.bar.message(), "model 1: 8 anchor(s)");
        }

        callback(Progress::ModelsFinish);
        let display = handler.display.lock().unwrap();
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.position(), 3);
        assert_eq!(display.bar.message(), "✓ 16 anchor rows across models");
    }

    #[test]
    fn batch_summary_counts_failed_inputs() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        callback(Progress::BatchStart { inputs: 2 });
        callback(Progress::InputFinished {
            source: PathBuf::from("data/good.pdb"),
            succeeded: true,
        });
        callback(Progress::InputFinished {
            source: PathBuf::from("data/bad.pdb"),
            succeeded: false,
        });
        {
            let display = handler.display.lock().unwrap();
            assert_eq!(display.bar.position(), 2);
            assert_eq!(display.bar.message(), "bad.pdb");
        }

        callback(Progress::BatchFinish);
        let display = handler.display.lock().unwrap();
        assert_eq!(display.bar.message(), "✗ 1 input(s) failed");
    }

    #[test]
    fn stages_finish_with_their_name_from_another_thread() {
        let handler = CliProgressHandler::new();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::StageStart {
                name: "Aggregating ensemble",
            });
            callback(Progress::StageFinish);
        })
        .join()
        .unwrap();

        let display = handler.display.lock().unwrap();
        assert!(display.bar.is_finished());
        assert_eq!(display.bar.message(), "✓ Aggregating ensemble");
    }
}
