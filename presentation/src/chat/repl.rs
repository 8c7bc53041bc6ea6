//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::ConsoleReply;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::sync::Arc;
use tiered_application::AskUseCase;
use tiered_domain::AnswerSource;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const HISTORY_CAPACITY: usize = 1000;

/// What a slash command asks the loop to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    Continue(String),
    Quit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    use_case: Arc<AskUseCase>,
    quiet: bool,
    show_source: bool,
}

impl ChatRepl {
    pub fn new(use_case: Arc<AskUseCase>) -> Self {
        Self {
            use_case,
            quiet: false,
            show_source: false,
        }
    }

    /// Hide the spinner and answer annotations
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Annotate each answer with the tier that produced it
    pub fn with_show_source(mut self, show: bool) -> Self {
        self.show_source = show;
        self
    }

    fn line_editor() -> Reedline {
        let editor = Reedline::create();

        let Some(path) = dirs::data_dir().map(|p| p.join("tiered-assistant").join("history.txt"))
        else {
            return editor;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(HISTORY_CAPACITY, path) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("Chat history disabled: {}", e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(&self) -> std::io::Result<()> {
        let mut editor = Self::line_editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(">>".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        match self.handle_command(line) {
                            CommandAction::Quit => {
                                println!("Bye!");
                                break;
                            }
                            CommandAction::Continue(output) => println!("{}", output),
                        }
                        continue;
                    }

                    self.process_question(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                #[allow(unreachable_patterns)]
                _ => continue,
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│         Tiered Assistant - Chat Mode        │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("{}", Self::help_text());
    }

    fn help_text() -> String {
        [
            "Commands:",
            "  /help, /h, /?     - Show this help",
            "  /cache            - Show how many answers are cached",
            "  /quit, /exit, /q  - Exit chat",
            "",
            "Press Ctrl-C while an answer streams to stop it.",
        ]
        .join("\n")
    }

    /// Handle slash commands.
    pub fn handle_command(&self, cmd: &str) -> CommandAction {
        match cmd {
            "/quit" | "/exit" | "/q" => CommandAction::Quit,
            "/help" | "/h" | "/?" => CommandAction::Continue(Self::help_text()),
            "/cache" => {
                let count = self.use_case.cache().len();
                CommandAction::Continue(format!(
                    "{} cached answer{}",
                    count,
                    if count == 1 { "" } else { "s" }
                ))
            }
            _ => CommandAction::Continue(format!(
                "Unknown command: {}\nType /help for available commands",
                cmd
            )),
        }
    }

    async fn process_question(&self, question: &str) {
        let console = ConsoleReply::new()
            .quiet(self.quiet)
            .show_source(self.show_source);

        let outcome = ask_interruptible(&self.use_case, question, &console).await;
        debug!("Answered from {:?}", outcome);
        println!();
    }
}

/// Ask one question, cancelling the run on Ctrl-C.
pub async fn ask_interruptible(
    use_case: &AskUseCase,
    question: &str,
    console: &ConsoleReply,
) -> AnswerSource {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = use_case
        .execute_with_cancellation(question, console, cancel)
        .await;
    watcher.abort();
    outcome.source
}
