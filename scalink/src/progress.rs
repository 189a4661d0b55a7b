//! Progress display on stderr, stdout carries the capture data.
//!
//! A terminal gets indicatif bars and spinners. Pipes and log files get one
//! line per message and per completed tenth of a bar.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use scalink_lib::progress::{
    ProgressCallback, ProgressCallbackArc, ProgressId, ProgressInfo, ProgressType,
    no_op_progress_callback,
};
use std::collections::HashMap;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Output {
    Terminal(MultiProgress),
    Lines,
}

struct Task {
    prefix: String,
    bar: Option<ProgressBar>,
    total: Option<u64>,
    done: u64,
    decile: u64,
}

pub struct StderrProgress {
    output: Output,
    tasks: Mutex<HashMap<u64, Task>>,
    next_id: AtomicU64,
}

impl StderrProgress {
    fn new(output: Output) -> Self {
        Self {
            output,
            tasks: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn terminal() -> Self {
        Self::new(Output::Terminal(MultiProgress::new()))
    }

    pub fn lines() -> Self {
        Self::new(Output::Lines)
    }

    fn line(prefix: &str, text: &str) {
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{}] {}", prefix, text);
        let _ = stderr.flush();
    }

    fn new_bar(multi: &MultiProgress, info: &ProgressInfo) -> ProgressBar {
        let (bar, template) = match info.progress_type {
            ProgressType::Spinner => {
                let spinner = ProgressBar::new_spinner();
                spinner.enable_steady_tick(Duration::from_millis(100));
                (spinner, format!("[{}] {{spinner}} {{msg}}", info.prefix))
            }
            ProgressType::Bar { total } => (
                ProgressBar::new(total),
                format!(
                    "[{}] {{msg}} {{wide_bar}} {{pos}}/{{len}} {{eta}}",
                    info.prefix
                ),
            ),
        };
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        let bar = multi.add(bar);
        bar.set_style(style);
        bar.set_message(info.message.clone());
        if let Some(current) = info.current {
            bar.set_position(current);
        }
        bar
    }
}

fn decile(done: u64, total: u64) -> u64 {
    if total == 0 {
        return 10;
    }
    (done.saturating_mul(10) / total).min(10)
}

impl ProgressCallback for StderrProgress {
    fn start(&self, info: ProgressInfo) -> ProgressId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let bar = match &self.output {
            Output::Terminal(multi) => Some(Self::new_bar(multi, &info)),
            Output::Lines => {
                Self::line(&info.prefix, &info.message);
                None
            }
        };
        let total = match info.progress_type {
            ProgressType::Spinner => None,
            ProgressType::Bar { total } => Some(total),
        };
        let done = info.current.unwrap_or(0);
        let task = Task {
            prefix: info.prefix,
            bar,
            total,
            done,
            decile: total.map_or(0, |t| decile(done, t)),
        };
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.insert(id, task);
        }
        ProgressId(id)
    }

    fn update_message(&self, id: ProgressId, message: String) {
        let Ok(tasks) = self.tasks.lock() else { return };
        let Some(task) = tasks.get(&id.0) else { return };
        match &task.bar {
            Some(bar) => bar.set_message(message),
            None => Self::line(&task.prefix, &message),
        }
    }

    fn increment(&self, id: ProgressId, delta: u64) {
        let Ok(mut tasks) = self.tasks.lock() else { return };
        let Some(task) = tasks.get_mut(&id.0) else { return };
        task.done = task.done.saturating_add(delta);
        if let Some(bar) = &task.bar {
            bar.inc(delta);
            return;
        }
        if let Some(total) = task.total {
            let now = decile(task.done, total);
            if now != task.decile {
                task.decile = now;
                Self::line(&task.prefix, &format!("{}/{}", task.done, total));
            }
        }
    }

    fn finish(&self, id: ProgressId, final_message: String) {
        let Ok(mut tasks) = self.tasks.lock() else { return };
        let Some(task) = tasks.remove(&id.0) else { return };
        match task.bar {
            Some(bar) => bar.finish_with_message(final_message),
            None => Self::line(&task.prefix, &final_message),
        }
    }
}

pub fn create_progress_callback(quiet: bool) -> ProgressCallbackArc {
    if quiet {
        no_op_progress_callback()
    } else if io::stderr().is_terminal() {
        Arc::new(StderrProgress::terminal())
    } else {
        Arc::new(StderrProgress::lines())
    }
}
