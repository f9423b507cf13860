/**
 * Helper functions for input and output.
 */
use colored::*;
use std::io::Write;
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use rustyline::error::ReadlineError;

use super::common::{QuizError, Result};

#[macro_export]
macro_rules! my_println {
    ($($arg:tt)*) => (
        writeln!(std::io::stdout(), $($arg)*).map_err(QuizError::Io)
    );
}

#[macro_export]
macro_rules! my_print {
    ($($arg:tt)*) => (
        write!(std::io::stdout(), $($arg)*).map_err(QuizError::Io)
    );
}

/// Display a prompt and read a line from standard input continually until the user
/// enters a line with at least one non-whitespace character. If the user presses Ctrl+D
/// then `Ok(None)` is returned. If the user pressed Ctrl+C then
/// `Err(QuizError::ReadlineInterrupted)` is returned. Otherwise, `Ok(Some(line))` is
/// returned where `line` is the last line of input the user entered without leading
/// and trailing whitespace.
pub fn prompt(message: &str) -> Result<Option<String>> {
    let mut rl = rustyline::Editor::<()>::new();
    loop {
        let result = rl.readline(message);
        match result {
            Ok(response) => {
                let response = response.trim();
                if response.len() > 0 {
                    return Ok(Some(response.to_string()));
                }
            }
            // Return immediately if the user hits Ctrl+D or Ctrl+C.
            Err(ReadlineError::Interrupted) => {
                return Err(QuizError::ReadlineInterrupted);
            }
            Err(ReadlineError::Eof) => {
                return Ok(None);
            }
            Err(ReadlineError::Io(e)) => {
                return Err(QuizError::Io(e));
            }
            _ => {}
        }
    }
}

/// The outcome of waiting for a line of input.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// The user pressed Ctrl+D or standard input was closed.
    End,
    /// The deadline passed before a line arrived. The line is still read, and answers
    /// the next call to `LineReader::read`.
    TimedOut,
}

/// Reads lines with `prompt` on a dedicated thread, so that waiting for the user can
/// stop at a deadline.
pub struct LineReader {
    requests: mpsc::Sender<String>,
    replies: mpsc::Receiver<Result<Option<String>>>,
    pending: bool,
}

impl LineReader {
    pub fn new() -> Self {
        LineReader::spawn(prompt)
    }

    fn spawn<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Result<Option<String>> + Send + 'static,
    {
        let (requests, request_rx) = mpsc::channel::<String>();
        let (reply_tx, replies) = mpsc::channel();
        thread::spawn(move || {
            while let Ok(message) = request_rx.recv() {
                if reply_tx.send(read(&message)).is_err() {
                    break;
                }
            }
        });
        LineReader { requests, replies, pending: false }
    }

    /// Display `message` and wait for a line, giving up at `deadline` if there is one.
    pub fn read(&mut self, message: &str, deadline: Option<Instant>) -> Result<Input> {
        if self.pending {
            // The thread is still waiting on an earlier prompt.
            my_print!("{}", message)?;
            std::io::stdout().flush().map_err(QuizError::Io)?;
        } else {
            if self.requests.send(message.to_string()).is_err() {
                return Ok(Input::End);
            }
            self.pending = true;
        }

        let reply = match deadline {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match self.replies.recv_timeout(timeout) {
                    Ok(reply) => reply,
                    Err(mpsc::RecvTimeoutError::Timeout) => return Ok(Input::TimedOut),
                    Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(Input::End),
                }
            },
            None => match self.replies.recv() {
                Ok(reply) => reply,
                Err(_) => return Ok(Input::End),
            },
        };
        self.pending = false;

        match reply? {
            Some(line) => Ok(Input::Line(line)),
            None => Ok(Input::End),
        }
    }

    /// Ask a yes-no question and return `true` if the user enters yes.
    pub fn confirm(&mut self, message: &str) -> bool {
        match self.read(message, None) {
            Ok(Input::Line(response)) => response.to_lowercase().starts_with('y'),
            _ => false,
        }
    }
}

/// Print `message` to standard output, breaking lines according to the current width
/// of the terminal. Prepend `prefix` to the first line and indent all subsequent lines
/// by its length.
pub fn prettyprint(message: &str, prefix: Option<&str>) -> Result<()> {
    prettyprint_colored(message, prefix, None, None)
}

pub fn prettyprint_colored(
    message: &str,
    prefix: Option<&str>,
    message_color: Option<Color>,
    prefix_color: Option<Color>,
) -> Result<()> {
    let prefix = prefix.unwrap_or("");
    let width = ::std::cmp::max(textwrap::termwidth().saturating_sub(prefix.len()), 20);
    let mut lines = textwrap::wrap_iter(message, width);

    if let Some(first_line) = lines.next() {
        let colored_prefix = color_optional(&prefix, prefix_color);
        let colored_line = color_optional(&first_line, message_color);
        my_println!("{}{}", colored_prefix, colored_line)?;
    }

    let indent = " ".repeat(prefix.len());
    for line in lines {
        let colored_line = color_optional(&line, message_color);
        my_println!("{}{}", indent, colored_line)?;
    }
    Ok(())
}

fn color_optional(text: &str, color: Option<Color>) -> ColoredString {
    if let Some(color) = color {
        text.color(color)
    } else {
        text.normal()
    }
}
