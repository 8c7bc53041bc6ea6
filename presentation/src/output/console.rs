//! Streamed console rendering of assistant replies
//!
//! While the cascade has produced nothing, the pending placeholder is shown
//! as a spinner on stderr. The first chunk clears it and every chunk is then
//! written to the output as it arrives.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tiered_application::ReplyProgress;
use tiered_domain::{AnswerSource, SessionMessage};

struct ConsoleState {
    out: Box<dyn Write + Send>,
    spinner: Option<ProgressBar>,
    streamed: bool,
}

impl ConsoleState {
    fn clear_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// [`ReplyProgress`] that prints to the terminal.
pub struct ConsoleReply {
    state: Mutex<ConsoleState>,
    quiet: bool,
    show_source: bool,
}

impl ConsoleReply {
    /// Print to stdout.
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            state: Mutex::new(ConsoleState {
                out,
                spinner: None,
                streamed: false,
            }),
            quiet: false,
            show_source: false,
        }
    }

    /// No spinner and no annotations, only answer text.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Annotate streamed answers with the tier that produced them.
    pub fn show_source(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Annotation printed after the answer, if any.
    pub fn footer(&self, source: AnswerSource) -> Option<String> {
        if self.quiet {
            return None;
        }
        match source {
            AnswerSource::Cache => Some("(cached)".to_string()),
            AnswerSource::Cancelled => Some("(cancelled)".to_string()),
            AnswerSource::Tier(tier) if self.show_source => Some(format!("({})", tier)),
            AnswerSource::Tier(_) | AnswerSource::Apology => None,
        }
    }
}

impl Default for ConsoleReply {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyProgress for ConsoleReply {
    fn on_pending(&self, message: &SessionMessage) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.streamed = false;
        if self.quiet {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_message(message.text().to_string());
        spinner.enable_steady_tick(Duration::from_millis(80));
        state.spinner = Some(spinner);
    }

    fn on_chunk(&self, chunk: &str, _message: &SessionMessage) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.clear_spinner();
        state.streamed = true;
        let _ = write!(state.out, "{}", chunk);
        let _ = state.out.flush();
    }

    fn on_complete(&self, message: &SessionMessage, source: AnswerSource) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.clear_spinner();

        match source {
            AnswerSource::Tier(_) | AnswerSource::Cancelled if state.streamed => {}
            AnswerSource::Cancelled => {}
            AnswerSource::Apology => {
                if state.streamed {
                    let _ = writeln!(state.out);
                }
                let _ = write!(state.out, "{}", message.text().red());
            }
            AnswerSource::Cache | AnswerSource::Tier(_) => {
                let _ = write!(state.out, "{}", message.text());
            }
        }

        if let Some(footer) = self.footer(source) {
            let _ = write!(state.out, " {}", footer.dimmed());
        }
        let _ = writeln!(state.out);
        let _ = state.out.flush();
        state.streamed = false;
    }
}
