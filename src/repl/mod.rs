//! REPL (Read-Eval-Print Loop) for interactive fault ratio lookup
//!
//! Each line is either a built-in `/command` or an accident description that
//! goes through the retrieval pipeline. Service errors are printed and the
//! session carries on.

pub mod commands;
pub mod display;
pub mod input;

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::cases::CaseStore;
use crate::errors::RagError;
use crate::rag::RagPipeline;
use crate::repl::commands::{is_command, Command, CommandHandler};
pub use crate::repl::display::DisplayManager;
use crate::repl::input::{InputHandler, InputLine};

/// REPL session coordinator
pub struct ReplSession {
    input_handler: InputHandler,
    command_handler: CommandHandler,
    display_manager: DisplayManager,
    pipeline: Arc<RagPipeline>,
    store_path: PathBuf,
    questions: usize,
}

impl ReplSession {
    /// Create new REPL session
    pub fn new(pipeline: Arc<RagPipeline>, store_path: PathBuf) -> Result<Self> {
        Self::with_parts(InputHandler::new()?, DisplayManager::new(), pipeline, store_path)
    }

    /// Create REPL session with persistent history
    pub fn with_history(
        history_path: PathBuf,
        pipeline: Arc<RagPipeline>,
        store_path: PathBuf,
    ) -> Result<Self> {
        Self::with_parts(
            InputHandler::with_history(history_path)?,
            DisplayManager::new(),
            pipeline,
            store_path,
        )
    }

    fn with_parts(
        input_handler: InputHandler,
        display_manager: DisplayManager,
        pipeline: Arc<RagPipeline>,
        store_path: PathBuf,
    ) -> Result<Self> {
        Ok(ReplSession {
            input_handler,
            command_handler: CommandHandler::new(),
            display_manager,
            pipeline,
            store_path,
            questions: 0,
        })
    }

    /// Disable spinners (quiet mode)
    pub fn disable_progress(&mut self) {
        self.display_manager = DisplayManager::without_progress();
    }

    /// Show welcome banner
    pub fn show_welcome(&self, version: &str) -> Result<()> {
        let cases = self.pipeline.store_snapshot()?.len();
        self.display_manager.show_banner(version, cases);
        Ok(())
    }

    /// Run until `/exit`, Ctrl-D or Ctrl-C
    pub async fn run(&mut self) -> Result<()> {
        loop {
            let line = match self.input_handler.read_line() {
                Ok(InputLine::End) => break,
                Ok(line) => line,
                Err(e) => {
                    tracing::debug!(error = %e, "Input loop ended");
                    break;
                }
            };

            if !self.handle_line(line).await? {
                break;
            }
        }

        self.save()?;
        println!("안전 운전하세요!");
        Ok(())
    }

    /// Handle one raw line of input
    ///
    /// Returns true if session should continue, false to exit
    pub async fn handle_input(&mut self, input: &str) -> Result<bool> {
        self.handle_line(InputLine::from_raw(input)).await
    }

    async fn handle_line(&mut self, line: InputLine) -> Result<bool> {
        let text = match line {
            InputLine::Text(text) => text,
            InputLine::Blank => {
                self.display_manager
                    .show_warning(&RagError::EmptyQuery.to_string());
                return Ok(true);
            }
            InputLine::End => return Ok(false),
        };

        if is_command(&text) {
            let command = self.command_handler.parse(&text);
            return self.execute(command).await;
        }

        self.answer(&text).await;
        Ok(true)
    }

    async fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Help => self.command_handler.show_help(),
            Command::Exit => return Ok(false),
            Command::Status => {
                let status = self.pipeline.status().await?;
                self.display_manager.show_status(
                    &status,
                    self.pipeline.top_k(),
                    self.command_handler.show_context(),
                );
            }
            Command::Reload => self.reload().await,
            Command::Context { enable } => {
                let on = self.command_handler.toggle_context(enable);
                self.display_manager.show_info(&format!(
                    "Retrieved cases will {}be shown",
                    if on { "" } else { "not " }
                ));
            }
            Command::Clear => self.display_manager.clear_screen()?,
            Command::Unknown { input } => {
                self.display_manager
                    .show_error(&format!("Unknown command: {}", input));
                self.display_manager.show_info("Type /help for available commands");
            }
        }
        Ok(true)
    }

    async fn answer(&mut self, question: &str) {
        let _spinner = self.display_manager.start_search();
        let result = self.pipeline.ask(question).await;
        self.display_manager.finish_current();

        match result {
            Ok(answer) => {
                self.questions += 1;
                if self.command_handler.show_context() {
                    self.display_manager.show_matches(&answer.matches);
                }
                self.display_manager.show_answer(&answer.text);
            }
            Err(RagError::EmptyQuery) => {
                self.display_manager
                    .show_warning(&RagError::EmptyQuery.to_string());
            }
            Err(e) => self.display_manager.show_error(&e.to_string()),
        }
    }

    async fn reload(&mut self) {
        let started = Instant::now();
        let _spinner = self.display_manager.start_spinner("Rebuilding search index");

        let outcome = match CaseStore::load(&self.store_path) {
            Ok(store) => match self.pipeline.replace_store(store).await {
                Ok(()) => self.pipeline.warm_up().await,
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                let cases = self
                    .pipeline
                    .store_snapshot()
                    .map(|s| s.len())
                    .unwrap_or(0);
                self.display_manager.finish_with_success(
                    &format!("Index rebuilt over {} cases", cases),
                    started.elapsed().as_millis() as u64,
                );
            }
            Err(e) => self
                .display_manager
                .finish_with_error(&format!("Reload failed: {}", e)),
        }
    }

    /// Number of questions answered this session
    pub fn question_count(&self) -> usize {
        self.questions
    }

    /// Save session state
    pub fn save(&mut self) -> Result<()> {
        self.input_handler.save_history()?;
        Ok(())
    }
}
