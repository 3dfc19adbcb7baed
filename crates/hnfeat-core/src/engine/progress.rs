use std::path::PathBuf;

/// Events emitted while featurizing. Consumers decide how to render them.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// A whole-ensemble step (chemistry map loading, aggregation, encoding).
    StageStart { name: &'static str },
    StageFinish,

    /// The per-model stages are about to run on `models` models.
    ModelsStart { models: u64 },
    ModelFinished {
        model_index: usize,
        anchors: usize,
        skipped: usize,
    },
    ModelsFinish,

    /// A batch of `inputs` structure files is about to be featurized.
    BatchStart { inputs: u64 },
    InputFinished { source: PathBuf, succeeded: bool },
    BatchFinish,
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback; silent by default.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `f` between a `StageStart` and a `StageFinish` event.
    pub fn stage<T>(&self, name: &'static str, f: impl FnOnce() -> T) -> T {
        self.report(Progress::StageStart { name });
        let result = f();
        self.report(Progress::StageFinish);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn silent_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::ModelsFinish);
        assert_eq!(reporter.stage("noop", || 3), 3);
    }

    #[test]
    fn stage_wraps_work_in_start_and_finish_events() {
        let events = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            events.lock().unwrap().push(event);
        }));

        let value = reporter.stage("Aggregating ensemble", || {
            reporter.report(Progress::ModelsStart { models: 0 });
            42
        });
        drop(reporter);

        assert_eq!(value, 42);
        assert_eq!(
            events.into_inner().unwrap(),
            vec![
                Progress::StageStart {
                    name: "Aggregating ensemble"
                },
                Progress::ModelsStart { models: 0 },
                Progress::StageFinish,
            ]
        );
    }
}
