//! Line input for the console.
//!
//! [`LineReader`] hides the line editor so the loop can be driven from a
//! script in tests. [`EditorReader`] is the rustyline implementation with
//! file history and completion of command names and flags.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io::stdout;
use std::path::PathBuf;

use clap::CommandFactory;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use tracing::{debug, warn};

use crate::commands::definitions::{command_names, CommandLine};
use crate::error::{ConsoleError, Result};

/// Result of one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A line was entered.
    Line(String),
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Ctrl-D or end of input.
    Eof,
}

/// Source of input lines and sink of history entries.
pub trait LineReader {
    /// Reads one line. Errors are reported and the loop continues.
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent>;

    /// Appends an accepted entry to the history.
    fn add_history(&mut self, entry: &str) -> Result<()>;

    /// Clears the terminal.
    fn clear_screen(&mut self) -> Result<()>;
}

/// Interactive reader backed by rustyline.
pub struct EditorReader {
    editor: Editor<ConsoleHelper, DefaultHistory>,
    history_file: PathBuf,
}

impl EditorReader {
    /// Creates the editor and loads `history_file` if it exists.
    pub fn new(history_file: PathBuf) -> Result<Self> {
        let config = Config::builder()
            .auto_add_history(false)
            .completion_type(CompletionType::List)
            .build();
        let mut editor = Editor::<ConsoleHelper, DefaultHistory>::with_config(config)
            .map_err(|e| ConsoleError::internal(format!("failed to initialize line editor: {e}")))?;
        editor.set_helper(Some(ConsoleHelper));

        if history_file.exists() {
            if let Err(e) = editor.load_history(&history_file) {
                warn!("Could not load history from {}: {}", history_file.display(), e);
            }
        }
        debug!("History file: {}", history_file.display());

        Ok(Self {
            editor,
            history_file,
        })
    }
}

impl LineReader for EditorReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadEvent::Eof),
            Err(e) => Err(ConsoleError::internal(format!("Read line error: {e}"))),
        }
    }

    fn add_history(&mut self, entry: &str) -> Result<()> {
        let save_error =
            |e: ReadlineError| ConsoleError::internal(format!("save history error: {e}"));

        self.editor.add_history_entry(entry).map_err(save_error)?;
        if let Some(parent) = self.history_file.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConsoleError::internal(format!("save history error: {e}")))?;
        }
        self.editor
            .append_history(&self.history_file)
            .map_err(save_error)
    }

    fn clear_screen(&mut self) -> Result<()> {
        execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0))
            .map_err(|e| ConsoleError::internal(format!("clear screen error: {e}")))
    }
}

/// Completion of command names, subcommands and flags.
struct ConsoleHelper;

impl Completer for ConsoleHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let word_start = line_to_cursor
            .rfind(char::is_whitespace)
            .map(|i| i + 1)
            .unwrap_or(0);
        let words: Vec<&str> = line_to_cursor[..word_start].split_whitespace().collect();

        let pairs = completions(&words, &line_to_cursor[word_start..])
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect();
        Ok((word_start, pairs))
    }
}

impl Hinter for ConsoleHelper {
    type Hint = String;
}

impl Highlighter for ConsoleHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for ConsoleHelper {}

impl Helper for ConsoleHelper {}

/// Candidates for the word being typed after `words`.
///
/// The first word completes to command names. Later words walk the clap
/// command tree: subcommand names while there are any, then flags.
fn completions(words: &[&str], partial: &str) -> Vec<String> {
    let mut candidates: Vec<String> = match words.split_first() {
        None => command_names().map(str::to_string).collect(),
        Some((first, rest)) => {
            let root = CommandLine::command();
            let Some(mut current) = root.find_subcommand(first).cloned() else {
                return Vec::new();
            };
            for word in rest {
                match current.find_subcommand(word) {
                    Some(sub) => current = sub.clone(),
                    None => break,
                }
            }

            if current.has_subcommands() {
                current
                    .get_subcommands()
                    .map(|sub| sub.get_name().to_string())
                    .filter(|name| name != "help")
                    .collect()
            } else {
                current
                    .get_arguments()
                    .filter_map(|arg| {
                        arg.get_long()
                            .map(|long| format!("--{long}"))
                            .or_else(|| arg.get_short().map(|short| format!("-{short}")))
                    })
                    .filter(|flag| flag != "--help")
                    .collect()
            }
        }
    };

    candidates.retain(|c| c.starts_with(partial));
    candidates.sort();
    candidates.dedup();
    candidates
}

/// Reader fed from a fixed list of lines, for tests and scripted input.
#[derive(Debug, Default)]
pub struct ScriptedReader {
    lines: VecDeque<String>,
    prompts: Vec<String>,
    history: Vec<String>,
    clears: usize,
    fail_history: bool,
}

impl ScriptedReader {
    /// Creates a reader that yields `lines` and then end of input.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Makes every history append fail.
    pub fn failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }

    /// History entries appended so far.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Prompts shown so far.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Number of screen clears requested.
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        self.prompts.push(prompt.to_string());
        Ok(self
            .lines
            .pop_front()
            .map(ReadEvent::Line)
            .unwrap_or(ReadEvent::Eof))
    }

    fn add_history(&mut self, entry: &str) -> Result<()> {
        if self.fail_history {
            return Err(ConsoleError::internal("save history error: disk full"));
        }
        self.history.push(entry.to_string());
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<()> {
        self.clears += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustyline::history::History;

    #[test]
    fn test_complete_command_names() {
        assert_eq!(completions(&[], "lo"), vec!["login", "logout"]);
        assert!(completions(&[], "").contains(&"kill".to_string()));
    }

    #[test]
    fn test_complete_subcommands() {
        assert_eq!(completions(&["kill"], ""), vec!["digest", "user"]);
        assert_eq!(completions(&["cluster"], "l"), vec!["list"]);
    }

    #[test]
    fn test_complete_flags() {
        let flags = completions(&["kill", "digest"], "--");
        assert!(flags.contains(&"--sql-digest".to_string()));
        assert!(flags.contains(&"--concurrency".to_string()));
        assert!(!flags.contains(&"--help".to_string()));

        assert_eq!(completions(&["login"], "--c"), vec!["--cluster"]);
    }

    #[test]
    fn test_no_completion_for_sql() {
        assert!(completions(&["select"], "").is_empty());
    }

    #[test]
    fn test_history_is_appended_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("history");

        let mut reader = EditorReader::new(path.clone()).unwrap();
        reader.add_history("select 1;").unwrap();
        reader.add_history("show processlist;").unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("select 1;"));
        assert!(saved.contains("show processlist;"));

        // A new reader picks the entries up again.
        let reader = EditorReader::new(path).unwrap();
        assert_eq!(reader.editor.history().len(), 2);
    }

    #[test]
    fn test_scripted_reader() {
        let mut reader = ScriptedReader::new(["select 1;"]);
        assert_eq!(
            reader.read_line("p> ").unwrap(),
            ReadEvent::Line("select 1;".to_string())
        );
        assert_eq!(reader.read_line("p> ").unwrap(), ReadEvent::Eof);
        assert_eq!(reader.prompts().len(), 2);

        reader.add_history("select 1;").unwrap();
        assert_eq!(reader.history(), ["select 1;".to_string()]);

        let mut failing = ScriptedReader::new(Vec::<String>::new()).failing_history();
        assert!(failing.add_history("x").is_err());
    }
}
