//! Line input for the REPL, backed by rustyline

use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = ">chabunhae: ";

/// One line read from the terminal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    /// Trimmed, non-empty text
    Text(String),
    /// Nothing but whitespace; the user still has to describe the accident
    Blank,
    /// Ctrl-D
    End,
}

impl InputLine {
    /// Classify a raw line
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "" => InputLine::Blank,
            text => InputLine::Text(text.to_string()),
        }
    }
}

pub struct InputHandler {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl InputHandler {
    pub fn new() -> Result<Self> {
        Ok(InputHandler {
            editor: DefaultEditor::new()?,
            history_path: None,
        })
    }

    /// Input handler that keeps past questions in `history_file`
    ///
    /// A missing or unreadable history file starts an empty history.
    pub fn with_history(history_file: PathBuf) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        if history_file.exists() {
            if let Err(e) = editor.load_history(&history_file) {
                tracing::debug!(path = %history_file.display(), error = %e, "History not loaded");
            }
        }

        Ok(InputHandler {
            editor,
            history_path: Some(history_file),
        })
    }

    /// `~/.chabunhae_history`
    pub fn default_history_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".chabunhae_history"))
    }

    /// Read the next line
    ///
    /// Only text lines are recorded in history. Ctrl-C is an error so the
    /// caller leaves the loop.
    pub fn read_line(&mut self) -> Result<InputLine> {
        let line = match self.editor.readline(DEFAULT_PROMPT) {
            Ok(raw) => InputLine::from_raw(&raw),
            Err(ReadlineError::Eof) => return Ok(InputLine::End),
            Err(ReadlineError::Interrupted) => anyhow::bail!("Interrupted"),
            Err(err) => anyhow::bail!("Readline error: {}", err),
        };

        if let InputLine::Text(ref text) = line {
            let _ = self.editor.add_history_entry(text.as_str());
        }
        Ok(line)
    }

    /// Write history to disk, if a history file was configured
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(ref path) = self.history_path {
            self.editor.save_history(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::History;
    use tempfile::TempDir;

    #[test]
    fn test_blank_lines_are_their_own_outcome() {
        assert_eq!(InputLine::from_raw(""), InputLine::Blank);
        assert_eq!(InputLine::from_raw("  \t "), InputLine::Blank);
    }

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(
            InputLine::from_raw("  교차로 충돌 \n"),
            InputLine::Text("교차로 충돌".to_string())
        );
    }

    #[test]
    fn test_history_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let history_path = temp_dir.path().join("history");

        {
            let mut handler = InputHandler::with_history(history_path.clone()).unwrap();
            let _ = handler.editor.add_history_entry("교차로 충돌");
            let _ = handler.editor.add_history_entry("/status");
            handler.save_history().unwrap();
        }

        let handler = InputHandler::with_history(history_path).unwrap();
        assert_eq!(handler.editor.history().len(), 2);
    }

    #[test]
    fn test_without_history_file_save_is_noop() {
        let mut handler = InputHandler::new().unwrap();
        assert!(handler.history_path.is_none());
        handler.save_history().unwrap();
    }
}
