use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use subagent_core::api::{preview, ProgressUpdate, SingleResult, TaskState};

const LABEL_CHARS: usize = 40;
const ACTIVITY_CHARS: usize = 60;

/// Live view of one call: an overall bar plus one spinner per task.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: Vec<ProgressBar>,
    enabled: bool,
}

impl ProgressMonitor {
    /// A disabled monitor ignores every update (used for `--quiet`, `--json`
    /// and non-terminal stderr).
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: Vec::new(),
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks {msg}")
        {
            overall.set_style(style.progress_chars("█▓▒░  "));
        }
        overall.set_message("Starting...");

        Self {
            multi,
            overall,
            task_bars: Vec::new(),
            enabled: true,
        }
    }

    pub fn update(&mut self, update: &ProgressUpdate) {
        if !self.enabled {
            return;
        }

        self.overall.set_length(update.total as u64);
        self.overall.set_position(update.done as u64);
        self.overall
            .set_message(format!("{} · {} running", update.mode, update.running));

        while self.task_bars.len() < update.results.len() {
            let bar = self.multi.add(ProgressBar::new_spinner());
            if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
                bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "·"]));
            }
            self.task_bars.push(bar);
        }

        for (bar, result) in self.task_bars.iter().zip(&update.results) {
            if bar.is_finished() {
                continue;
            }
            let label = task_label(result);
            match result.state() {
                TaskState::Pending => bar.set_message(format!("⏳ {label}")),
                TaskState::Running => {
                    bar.enable_steady_tick(Duration::from_millis(100));
                    let activity = preview(&result.output(), ACTIVITY_CHARS);
                    bar.set_message(format!("{label} {activity}"));
                }
                TaskState::Done => bar.finish_with_message(format!("✓ {label}")),
                TaskState::Failed if result.is_aborted() => {
                    bar.finish_with_message(format!("⊘ {label}"))
                }
                TaskState::Failed => bar.finish_with_message(format!("✗ {label}")),
            }
        }
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }
        let msg = if success {
            "✓ All tasks completed"
        } else {
            "✗ Execution failed"
        };
        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for bar in self.task_bars.drain(..) {
            if !bar.is_finished() {
                bar.finish_and_clear();
            }
        }
    }
}

fn task_label(result: &SingleResult) -> String {
    let raw = result.skill.as_deref().unwrap_or(&result.prompt);
    preview(raw, LABEL_CHARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use subagent_core::api::{Mode, TaskWorkItem};

    #[test]
    fn disabled_monitor_ignores_updates() {
        let mut monitor = ProgressMonitor::new(false);
        let results = vec![SingleResult::pending(0, &TaskWorkItem::new("p"))];
        monitor.update(&ProgressUpdate::new(Mode::Parallel, String::new(), &results));
        monitor.finish(true);
        assert!(monitor.task_bars.is_empty());
    }

    #[test]
    fn label_prefers_skill() {
        let mut item = TaskWorkItem::new("a very long prompt that keeps going and going past the limit");
        let r = SingleResult::pending(0, &item);
        assert!(task_label(&r).ends_with('…'));

        item.skill = Some("review".into());
        let r = SingleResult::pending(0, &item);
        assert_eq!(task_label(&r), "review");
    }
}
