use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use mdflow::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 100;

/// The terminal view of one workflow run: a single bar plus a running job tally.
struct ProgressView {
    bar: ProgressBar,
    phase: String,
    completed: usize,
    failed: usize,
}

impl ProgressView {
    fn new(bar: ProgressBar) -> Self {
        Self {
            bar,
            phase: String::new(),
            completed: 0,
            failed: 0,
        }
    }

    fn tally(&self) -> String {
        format!(
            "{} ({} done, {} failed)",
            self.phase, self.completed, self.failed
        )
    }

    fn apply(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => {
                self.phase = name.to_string();
                self.bar.reset();
                self.bar.set_length(0);
                self.bar.set_style(spinner_style());
                self.bar
                    .enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                self.bar.set_message(self.phase.clone());
            }
            Progress::PhaseFinish => {
                self.bar.disable_steady_tick();
                self.bar.finish_with_message(format!("✓ {}", self.phase));
            }
            Progress::TaskStart { total_steps } => {
                self.bar.disable_steady_tick();
                self.bar.reset();
                self.bar.set_length(total_steps);
                self.bar.set_style(bar_style());
                self.bar.set_message(self.phase.clone());
            }
            Progress::TaskIncrement => self.bar.inc(1),
            Progress::TaskFinish => {
                let total = self.bar.length().unwrap_or(0);
                self.bar.set_position(total.max(self.bar.position()));
                self.bar.finish();
            }
            Progress::JobClaimed { name } => {
                self.bar.set_message(format!("{} → {}", self.tally(), name));
            }
            Progress::JobCompleted { name } => {
                self.completed += 1;
                self.bar.println(format!("  ✓ {name}"));
                self.bar.set_message(self.tally());
            }
            Progress::JobFailed { name, reason } => {
                self.failed += 1;
                self.bar.println(format!("  ✗ {name}: {reason}"));
                self.bar.set_message(self.tally());
            }
            Progress::Message(msg) => self.bar.println(format!("  {msg}")),
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]")
        .expect("spinner template is valid")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .expect("bar template is valid")
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.0}s", state.eta().as_secs_f64());
        })
        .progress_chars("=> ")
}

/// Forwards engine progress events to an `indicatif` bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    view: Arc<Mutex<ProgressView>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        bar.finish_and_clear();
        Self {
            view: Arc::new(Mutex::new(ProgressView::new(bar))),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let view = Arc::clone(&self.view);
        Box::new(move |progress: Progress| match view.lock() {
            Ok(mut view) => view.apply(progress),
            Err(_) => warn!("Progress view mutex was poisoned; dropping update."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hidden() -> CliProgressHandler {
        CliProgressHandler::with_draw_target(ProgressDrawTarget::hidden())
    }

    #[test]
    fn batch_steps_fill_the_bar() {
        let handler = hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Post-processing",
        });
        callback(Progress::TaskStart { total_steps: 4 });
        callback(Progress::TaskIncrement);
        {
            let view = handler.view.lock().unwrap();
            assert_eq!(view.bar.length(), Some(4));
            assert_eq!(view.bar.position(), 1);
        }

        callback(Progress::TaskFinish);
        callback(Progress::PhaseFinish);
        let view = handler.view.lock().unwrap();
        assert_eq!(view.bar.position(), 4);
        assert!(view.bar.is_finished());
        assert_eq!(view.bar.message(), "✓ Post-processing");
    }

    #[test]
    fn job_events_are_tallied() {
        let handler = hidden();
        let callback = handler.get_callback();

        callback(Progress::PhaseStart {
            name: "Draining queue",
        });
        callback(Progress::JobClaimed {
            name: "Cu_nvt_300".into(),
        });
        assert_eq!(
            handler.view.lock().unwrap().bar.message(),
            "Draining queue (0 done, 0 failed) → Cu_nvt_300"
        );

        callback(Progress::JobCompleted {
            name: "Cu_nvt_300".into(),
        });
        callback(Progress::JobFailed {
            name: "Cu_nvt_400".into(),
            reason: "integrator exited with status 3".into(),
        });
        let view = handler.view.lock().unwrap();
        assert_eq!((view.completed, view.failed), (1, 1));
        assert_eq!(view.bar.message(), "Draining queue (1 done, 1 failed)");
    }

    #[test]
    fn callback_can_be_used_from_another_thread() {
        let handler = hidden();
        let callback = handler.get_callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Worker" });
            callback(Progress::JobCompleted { name: "a".into() });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        let view = handler.view.lock().unwrap();
        assert_eq!(view.completed, 1);
        assert_eq!(view.bar.message(), "✓ Worker");
    }
}
