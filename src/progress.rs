use anyhow::Result;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::future::Future;
use std::time::Duration;

const TICKS_UNICODE: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏·";
const TICKS_ASCII: &str = "|/-\\·";

#[derive(Clone, Copy)]
pub enum Stage {
    Fetch,
    Derive,
}

impl Stage {
    fn message(self, label: &str) -> String {
        let (step, name) = match self {
            Self::Fetch => (1, "Fetching"),
            Self::Derive => (2, "Deriving"),
        };
        format!(
            "{} {}: {}",
            format!("[{step}/2]").bright_yellow().bold(),
            name.bright_cyan().bold(),
            label.bright_white().bold()
        )
    }
}

pub struct ProgressState {
    multi: MultiProgress,
}

impl ProgressState {
    pub(crate) fn new() -> Self {
        let multi = MultiProgress::new();
        multi.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        Self { multi }
    }

    fn spinner(&self, message: String) -> ProgressBar {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_message(message);
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }
}

fn spinner_style() -> ProgressStyle {
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    if plain_term() {
        style.tick_chars(TICKS_ASCII)
    } else {
        style.tick_chars(TICKS_UNICODE)
    }
}

fn plain_term() -> bool {
    std::env::var("TERM").is_ok_and(|term| term.eq_ignore_ascii_case("dumb"))
}

pub async fn run_with_spinner<T>(
    progress: &ProgressState,
    stage: Stage,
    label: &str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    let bar = progress.spinner(stage.message(label));
    let result = fut.await;
    let status = if result.is_ok() {
        "done".bright_green().bold()
    } else {
        "failed".bright_red().bold()
    };
    bar.finish_with_message(format!("{} {status}", stage.message(label)));
    result
}
