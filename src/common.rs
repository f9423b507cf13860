/**
 * Definitions of data structures used by several modules, such as `QuizError`, the
 * selection `Mode` and the various structs that hold command-line arguments.
 */
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use structopt::StructOpt;


pub type Result<T> = ::std::result::Result<T, QuizError>;


#[derive(Debug)]
pub enum QuizError {
    /// For when the question bank file does not exist.
    BankNotFound(PathBuf),
    /// For JSON errors.
    Json(serde_json::Error),
    Sql(rusqlite::Error),
    Io(io::Error),
    /// A record in the bank failed validation under the strict loading policy.
    InvalidRecord { index: usize, field: String, reason: String },
    /// Two records in the bank produced the same identifier under the strict loading
    /// policy.
    DuplicateId { index: usize, id: String },
    /// The bank has no record list, or an empty one, under the strict loading policy.
    NoRecords,
    EmptyQuiz,
    InvalidChoice(usize),
    UnknownMode(String),
    CannotMakeAppDir(PathBuf),
    ReadlineInterrupted,
}


impl fmt::Display for QuizError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            QuizError::BankNotFound(ref path) => {
                write!(f, "could not find question bank '{}'", path.to_string_lossy())
            },
            QuizError::Json(ref err) => {
                write!(f, "could not parse JSON ({})", err)
            },
            QuizError::Sql(ref err) => {
                write!(f, "progress store error ({})", err)
            },
            QuizError::Io(ref err) => {
                write!(f, "IO error ({})", err)
            },
            QuizError::InvalidRecord { index, ref field, ref reason } => {
                write!(f, "invalid field '{}' in record {} ({})", field, index, reason)
            },
            QuizError::DuplicateId { index, ref id } => {
                write!(f, "duplicate question id '{}' in record {}", id, index)
            },
            QuizError::NoRecords => {
                write!(f, "question bank contains no records")
            },
            QuizError::EmptyQuiz => {
                write!(f, "no questions available")
            },
            QuizError::InvalidChoice(choice) => {
                write!(f, "choice {} is out of range", choice)
            },
            QuizError::UnknownMode(ref mode) => {
                write!(f, "unknown mode '{}' (expected 'daily' or 'mixed')", mode)
            },
            QuizError::CannotMakeAppDir(ref path) => {
                write!(f, "unable to create directory '{}'", path.to_string_lossy())
            },
            QuizError::ReadlineInterrupted => {
                Ok(())
            },
        }
    }
}


impl error::Error for QuizError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            QuizError::Json(ref err) => Some(err),
            QuizError::Sql(ref err) => Some(err),
            QuizError::Io(ref err) => Some(err),
            _ => None,
        }
    }
}


pub fn is_broken_pipe(e: &QuizError) -> bool {
    if let QuizError::Io(e) = e {
        if let io::ErrorKind::BrokenPipe = e.kind() {
            return true;
        }
    }
    false
}


/// The selection policy used to build a quiz from the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Serve questions that have not been seen since the last reset, starting over
    /// once the whole bank has been served.
    Daily,
    /// Draw from the whole bank every time.
    Mixed,
}


impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Daily => "daily",
            Mode::Mixed => "mixed",
        }
    }

    pub fn toggled(self) -> Mode {
        match self {
            Mode::Daily => Mode::Mixed,
            Mode::Mixed => Mode::Daily,
        }
    }
}


impl Default for Mode {
    fn default() -> Self {
        Mode::Daily
    }
}


impl FromStr for Mode {
    type Err = QuizError;

    fn from_str(s: &str) -> Result<Mode> {
        match s.trim() {
            "daily" => Ok(Mode::Daily),
            "mixed" => Ok(Mode::Mixed),
            other => Err(QuizError::UnknownMode(other.to_string())),
        }
    }
}


impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}


/// Holds the command-line configuration for the application.
#[derive(StructOpt)]
#[structopt(name = "prepquiz", about = "Practise a certification syllabus from the command line.")]
pub struct Options {
    /// Path to the JSON question bank.
    #[structopt(short = "b", long = "bank", default_value = "questions.json")]
    pub bank: PathBuf,
    /// Keep progress in a particular directory.
    #[structopt(short = "d", long = "dir")]
    pub directory: Option<PathBuf>,
    /// Do not emit colorized output.
    #[structopt(long = "no-color")]
    pub no_color: bool,
    /// Fail on the first malformed record instead of skipping it.
    #[structopt(long = "strict")]
    pub strict: bool,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Take a daily practice quiz.
    #[structopt(name = "take")]
    Take(TakeOptions),
    /// Take a timed mock test drawn from the whole bank.
    #[structopt(name = "mock")]
    Mock(MockOptions),
    /// Show, set or toggle the saved selection mode.
    #[structopt(name = "mode")]
    Mode(ModeOptions),
    /// Forget which questions daily practice has already served.
    #[structopt(name = "reset")]
    Reset,
    /// Count the questions in the bank.
    #[structopt(name = "count")]
    Count,
}

#[derive(StructOpt)]
pub struct TakeOptions {
    /// Limit the total number of questions.
    #[structopt(short = "n", default_value = "20")]
    pub num_to_ask: usize,
    /// Selection mode for this quiz only. Defaults to the saved mode.
    #[structopt(short = "m", long = "mode")]
    pub mode: Option<Mode>,
    /// Give the quiz a time limit, in minutes.
    #[structopt(long = "minutes")]
    pub minutes: Option<f64>,
    /// Do not allow answers to be changed once given.
    #[structopt(long = "locked")]
    pub locked: bool,
    #[structopt(flatten)]
    pub run_opts: RunOptions,
}

#[derive(StructOpt)]
pub struct MockOptions {
    /// Limit the total number of questions.
    #[structopt(short = "n", default_value = "60")]
    pub num_to_ask: usize,
    /// Length of the test, in minutes.
    #[structopt(long = "minutes", default_value = "60")]
    pub minutes: f64,
    #[structopt(flatten)]
    pub run_opts: RunOptions,
}

/// These options are shared between the `take` and `mock` subcommands.
#[derive(StructOpt)]
pub struct RunOptions {
    /// Seed the random number generator, for reproducible quizzes.
    #[structopt(long = "seed")]
    pub seed: Option<u64>,
    /// Do not list every question after the quiz is finished.
    #[structopt(long = "no-review")]
    pub no_review: bool,
}

#[derive(StructOpt)]
pub struct ModeOptions {
    /// The mode to save, either 'daily' or 'mixed'.
    pub mode: Option<Mode>,
    /// Switch to the other mode.
    #[structopt(long = "toggle")]
    pub toggle: bool,
}


/// Convert a time limit in minutes to whole seconds. Every limit is at least one second.
pub fn minutes_to_seconds(minutes: f64) -> u64 {
    let seconds = (minutes * 60.0).round();
    if seconds >= 1.0 {
        seconds as u64
    } else {
        1
    }
}


/// The settings of a single quiz run, after presets have been applied.
#[derive(Debug, Clone)]
pub struct QuizSettings {
    pub mode: Mode,
    pub num_to_ask: usize,
    pub seconds: Option<u64>,
    pub locked: bool,
    pub seed: Option<u64>,
    pub review: bool,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_parse_and_print() {
        assert_eq!("daily".parse::<Mode>().unwrap(), Mode::Daily);
        assert_eq!(" mixed ".parse::<Mode>().unwrap(), Mode::Mixed);
        assert!("mock".parse::<Mode>().is_err());
        assert_eq!(Mode::Mixed.to_string(), "mixed");
        assert_eq!(Mode::Daily.toggled(), Mode::Mixed);
    }

    #[test]
    fn time_limits_round_to_whole_seconds() {
        assert_eq!(minutes_to_seconds(60.0), 3600);
        assert_eq!(minutes_to_seconds(0.02), 1);
        assert_eq!(minutes_to_seconds(1.5), 90);
        assert_eq!(minutes_to_seconds(0.0), 1);
        assert_eq!(minutes_to_seconds(-3.0), 1);
    }

    #[test]
    fn strict_errors_name_field_and_index() {
        let err = QuizError::InvalidRecord {
            index: 3, field: String::from("options.C"), reason: String::from("blank"),
        };
        assert_eq!(err.to_string(), "invalid field 'options.C' in record 3 (blank)");
    }
}
