//! Interactive console.
//!
//! Reads lines, routes each one to the command tree or the statement buffer,
//! dispatches completed SQL and renders the outputs. Each line is fully
//! handled before the next read.

pub mod buffer;
pub mod dispatch;
pub mod history;
pub mod prompt;
pub mod reader;
pub mod render;
pub mod router;

pub use buffer::StatementBuffer;
pub use reader::{EditorReader, LineReader, ReadEvent, ScriptedReader};
pub use router::{classify, LineKind};

use std::io::{self, Write};

use clap::error::ErrorKind;
use clap::Parser;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::commands::definitions::{CommandLine, ConsoleCommand};
use crate::commands::handlers::{self, CommandContext};
use crate::commands::help::{help_text, welcome_text};
use crate::commands::output::{CommandOutput, ControlAction};
use crate::commands::tokenizer::split_words;
use crate::connection::ConnectionRegistry;
use crate::error::{ConsoleError, Result};
use crate::session::Session;

/// Printed when the console ends.
pub const FAREWELL: &str = "Bye!";

/// The interactive console.
pub struct Console<R: LineReader> {
    runtime: Runtime,
    session: Session,
    registry: ConnectionRegistry,
    reader: R,
    buffer: StatementBuffer,
    shutdown: CancellationToken,
    colored: bool,
}

impl<R: LineReader> Console<R> {
    /// Creates a logged-out console reading from `reader`.
    pub fn new(registry: ConnectionRegistry, reader: R) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| ConsoleError::internal(format!("failed to start runtime: {e}")))?;

        Ok(Self {
            runtime,
            session: Session::new(),
            registry,
            reader,
            buffer: StatementBuffer::new(),
            shutdown: CancellationToken::new(),
            colored: false,
        })
    }

    /// Enables colored prompts.
    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Logs in to `cluster` before the loop starts.
    pub fn login(&self, cluster: &str) -> Result<()> {
        let ctx = self.context();
        handlers::session::handle_login(&ctx, cluster).map(|_| ())
    }

    /// The session shared with command handlers.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The line reader.
    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Runs the loop until exit, end of input, interrupt or a history
    /// failure.
    pub fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        println!("{}", welcome_text());

        let result = self.run_with(&mut stdout);
        self.shutdown.cancel();
        result
    }

    fn run_with(&mut self, out: &mut impl Write) -> Result<()> {
        loop {
            let prompt = self.prompt();
            let line = match self.reader.read_line(&prompt) {
                Ok(ReadEvent::Line(line)) => line,
                Ok(ReadEvent::Interrupted | ReadEvent::Eof) => {
                    writeln!(out, "{FAREWELL}").map_err(write_error)?;
                    return Ok(());
                }
                Err(e) => {
                    writeln!(out, "\n❌ {e}").map_err(write_error)?;
                    continue;
                }
            };

            for output in self.handle_line(&line)? {
                match output {
                    CommandOutput::Control(ControlAction::Exit) => {
                        writeln!(out, "{FAREWELL}").map_err(write_error)?;
                        return Ok(());
                    }
                    CommandOutput::Control(ControlAction::ClearScreen) => {
                        if let Err(e) = self.reader.clear_screen() {
                            warn!("{}", e);
                        }
                    }
                    other => render::render(&other, out).map_err(write_error)?,
                }
            }
        }
    }

    /// Handles one input line and returns what to show.
    ///
    /// Fails only when the history cannot be written.
    pub fn handle_line(&mut self, line: &str) -> Result<Vec<CommandOutput>> {
        let line = line.trim();
        match classify(line, !self.buffer.is_empty()) {
            LineKind::Blank => Ok(Vec::new()),
            LineKind::Exit => Ok(vec![CommandOutput::exit()]),
            LineKind::Clear => {
                self.reader.add_history(line)?;
                Ok(vec![CommandOutput::clear_screen()])
            }
            LineKind::Help => self.handle_help(line),
            LineKind::Command => self.handle_command(line),
            LineKind::Sql => self.handle_sql(line),
        }
    }

    /// `help` alone prints the command list; `help <command>...` prints the
    /// usage of that command.
    fn handle_help(&mut self, line: &str) -> Result<Vec<CommandOutput>> {
        let mut words: Vec<String> = match split_words(line) {
            Ok(words) => words.into_iter().skip(1).collect(),
            Err(e) => return Ok(vec![parse_error(e)]),
        };
        if let Some(last) = words.last_mut() {
            if let Some(trimmed) = last.strip_suffix(';') {
                *last = trimmed.to_string();
            }
        }
        words.retain(|w| !w.is_empty());

        if words.is_empty() {
            self.reader.add_history(line)?;
            return Ok(vec![CommandOutput::info(help_text())]);
        }
        words.push("--help".to_string());
        self.run_words(line, &words)
    }

    fn handle_command(&mut self, line: &str) -> Result<Vec<CommandOutput>> {
        match split_words(line) {
            Ok(words) => self.run_words(line, &words),
            Err(e) => Ok(vec![parse_error(e)]),
        }
    }

    fn run_words(&mut self, line: &str, words: &[String]) -> Result<Vec<CommandOutput>> {
        let command = match CommandLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::DisplayHelp
                        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) =>
            {
                self.reader.add_history(line)?;
                return Ok(vec![CommandOutput::info(e.to_string().trim_end())]);
            }
            Err(e) => {
                debug!("Rejected command line: {}", line);
                return Ok(vec![CommandOutput::error(format!(
                    "❌ Execute command error: {}",
                    e.to_string().trim_end()
                ))]);
            }
        };

        let output = match self.execute(command) {
            Ok(output) => output,
            Err(e) => CommandOutput::error(format!("❌ Execute command error: {e}")),
        };
        self.reader.add_history(line)?;
        Ok(vec![output])
    }

    fn handle_sql(&mut self, line: &str) -> Result<Vec<CommandOutput>> {
        self.buffer.push(line);
        if !self.buffer.is_complete() {
            return Ok(Vec::new());
        }

        let flushed = self.buffer.flush();
        self.reader.add_history(&flushed.history_entry)?;

        let outputs = self.runtime.block_on(dispatch::dispatch_sql(
            &self.session,
            &self.registry,
            &flushed.text,
        ));
        Ok(outputs)
    }

    /// Runs one parsed command to completion.
    pub fn execute(&self, command: ConsoleCommand) -> Result<CommandOutput> {
        info!("Executing command: {:?}", command);
        let ctx = self.context();
        self.runtime.block_on(handlers::execute(&ctx, command))
    }

    fn context(&self) -> CommandContext<'_> {
        CommandContext {
            session: &self.session,
            registry: &self.registry,
            shutdown: &self.shutdown,
        }
    }

    fn prompt(&self) -> String {
        if !self.buffer.is_empty() {
            return prompt::CONTINUATION_PROMPT.to_string();
        }
        let state = self.session.snapshot();
        prompt::prompt(&state.cluster, &state.schema, self.colored)
    }
}

fn write_error(e: io::Error) -> ConsoleError {
    ConsoleError::internal(format!("write output error: {e}"))
}


fn parse_error(e: impl std::fmt::Display) -> CommandOutput {
    CommandOutput::error(format!("❌ Parse command error: {e}"))
}
