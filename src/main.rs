/**
 * Practise for a certification exam from the command line.
 */
#[macro_use]
mod iohelper;
mod bank;
mod common;
mod persistence;
mod quiz;
mod repetition;
mod timer;
mod ui;
mod view;

use std::io::Write;

use colored::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bank::{Bank, LoadPolicy};
use common::{
    minutes_to_seconds, Command, Mode, MockOptions, ModeOptions, Options, QuizError,
    QuizSettings, Result, TakeOptions};
use iohelper::Input;
use persistence::Progress;
use quiz::{AnswerPolicy, FinishReason, QuizSummary, Session, Submission};
use timer::ClockDriver;
use ui::{Action, CmdUI};


fn main() {
    let options = Options::from_args();
    init_logging(options.no_color);

    if options.no_color {
        colored::control::set_override(false);
    }

    let result = match &options.cmd {
        Command::Take(take) => main_take(&options, take),
        Command::Mock(mock) => main_mock(&options, mock),
        Command::Mode(mode) => main_mode(&options, mode),
        Command::Reset => main_reset(&options),
        Command::Count => main_count(&options),
    };

    if let Err(e) = result {
        if !common::is_broken_pipe(&e) {
            eprintln!("{}: {}", "Error".red(), e);
            ::std::process::exit(2);
        }
    }
}


/// Send log events to standard error, filtered by the `PREPQUIZ_LOG` variable.
fn init_logging(no_color: bool) {
    let filter = EnvFilter::try_from_env("PREPQUIZ_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(::std::io::stderr)
        .with_ansi(!no_color)
        .init();
}


/// The main function for the `take` subcommand.
fn main_take(options: &Options, take: &TakeOptions) -> Result<()> {
    let progress = open_progress(options)?;
    let bank = load_bank(options)?;

    let mode = match take.mode {
        Some(mode) => mode,
        None => progress.load_mode()?,
    };
    let settings = QuizSettings {
        mode,
        num_to_ask: take.num_to_ask,
        seconds: take.minutes.map(minutes_to_seconds),
        locked: take.locked,
        seed: take.run_opts.seed,
        review: !take.run_opts.no_review,
    };
    run_quizzes("Daily practice", &bank, &progress, &settings)
}


/// The main function for the `mock` subcommand.
fn main_mock(options: &Options, mock: &MockOptions) -> Result<()> {
    let progress = open_progress(options)?;
    let bank = load_bank(options)?;

    let settings = QuizSettings {
        mode: Mode::Mixed,
        num_to_ask: mock.num_to_ask,
        seconds: Some(minutes_to_seconds(mock.minutes)),
        locked: false,
        seed: mock.run_opts.seed,
        review: !mock.run_opts.no_review,
    };
    run_quizzes("Mock test", &bank, &progress, &settings)
}


/// The main function for the `mode` subcommand.
fn main_mode(options: &Options, mode_opts: &ModeOptions) -> Result<()> {
    let progress = open_progress(options)?;

    let mode = if mode_opts.toggle {
        let mode = progress.load_mode()?.toggled();
        progress.save_mode(mode)?;
        mode
    } else if let Some(mode) = mode_opts.mode {
        progress.save_mode(mode)?;
        mode
    } else {
        progress.load_mode()?
    };
    my_println!("Mode: {}", mode)
}


/// The main function for the `reset` subcommand.
fn main_reset(options: &Options) -> Result<()> {
    let progress = open_progress(options)?;
    progress.reset_progress()?;
    my_println!("Daily progress reset. Daily practice will start from the full bank again.")
}


/// The main function for the `count` subcommand.
fn main_count(options: &Options) -> Result<()> {
    let progress = open_progress(options)?;
    let bank = load_bank(options)?;
    let seen = progress.load_seen()?;

    my_println!("Question bank loaded: {} questions", bank.len())?;
    if bank.dropped > 0 {
        my_println!("Skipped {} malformed records", bank.dropped)?;
    }
    my_println!(
        "Daily progress: {} of {} seen",
        repetition::count_seen(&bank.questions, &seen),
        bank.len(),
    )?;
    my_println!("Mode: {}", progress.load_mode()?)
}


fn open_progress(options: &Options) -> Result<Progress> {
    let app_dir = persistence::require_app_dir_path(options.directory.as_deref())?;
    Progress::open(&app_dir)
}


fn load_bank(options: &Options) -> Result<Bank> {
    let policy = if options.strict { LoadPolicy::Strict } else { LoadPolicy::Lenient };
    let bank = bank::load_bank(&options.bank, policy)?;
    info!(questions = bank.len(), dropped = bank.dropped, "loaded question bank");
    Ok(bank)
}


/// Take quizzes with the same settings until the user declines to restart.
fn run_quizzes(title: &str, bank: &Bank, progress: &Progress, settings: &QuizSettings) -> Result<()> {
    let mut ui = CmdUI::new();
    if bank.dropped > 0 {
        ui.warning(&format!("skipped {} malformed records in the question bank", bank.dropped))?;
    }

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    loop {
        let summary = take_quiz(title, bank, progress, settings, &mut ui, &mut rng)?;
        if summary.is_none() || !ui.confirm("\nRestart this mode? ") {
            return Ok(());
        }
    }
}


/// Build a quiz, ask its questions and print the summary. `None` is returned if there
/// were no questions or the user abandoned the quiz with Ctrl+C.
fn take_quiz(
    title: &str,
    bank: &Bank,
    progress: &Progress,
    settings: &QuizSettings,
    ui: &mut CmdUI,
    rng: &mut StdRng,
) -> Result<Option<QuizSummary>> {
    let built = repetition::build_quiz(
        &bank.questions, settings.mode, settings.num_to_ask, progress, rng);
    let questions = match built {
        Ok(questions) => questions,
        Err(QuizError::EmptyQuiz) => {
            ui.status("No questions available.")?;
            return Ok(None);
        },
        Err(e) => return Err(e),
    };

    let policy = if settings.locked { AnswerPolicy::Locked } else { AnswerPolicy::Revisable };
    let mut session = Session::new(questions, policy);
    let mut clock = settings.seconds.map(ClockDriver::start);

    let intro_clock = clock.as_ref().map(|c| c.display());
    ui.intro(title, settings.mode, session.len(), intro_clock.as_deref())?;

    let reason = loop {
        if clock.as_mut().map(|c| c.poll()).unwrap_or(false) {
            break FinishReason::TimeExpired;
        }

        let display = clock.as_ref().map(|c| c.display());
        let current = match view::question_view(&session, display) {
            Some(current) => current,
            None => break FinishReason::UserRequested,
        };
        ui.question(&current)?;

        let deadline = clock.as_ref().and_then(|c| c.deadline());
        let input = match ui.prompt(current.clock.as_deref(), deadline) {
            Ok(Input::Line(input)) => input,
            // The next poll finishes the quiz.
            Ok(Input::TimedOut) => continue,
            Ok(Input::End) => break FinishReason::UserRequested,
            Err(QuizError::ReadlineInterrupted) => {
                if let Some(clock) = clock.as_mut() {
                    clock.cancel();
                }
                ui.status("\nQuiz abandoned.")?;
                return Ok(None);
            },
            Err(e) => return Err(e),
        };

        // Time may have run out while the user was thinking.
        if clock.as_mut().map(|c| c.poll()).unwrap_or(false) {
            ui.status("Time is up. That answer was not recorded.")?;
            break FinishReason::TimeExpired;
        }

        match ui::parse_action(&input) {
            Some(Action::Answer(choice)) => {
                let question = match session.current() {
                    Some(question) => question,
                    None => break FinishReason::UserRequested,
                };
                match session.submit(choice)? {
                    Submission::Recorded { .. } => {
                        ui.feedback(&view::feedback_view(question, choice))?;
                        if !session.advance() {
                            let unanswered = session.unanswered();
                            if unanswered == 0 {
                                break FinishReason::UserRequested;
                            }
                            let hint = if session.can_retreat() {
                                "Enter p to go back or f to finish."
                            } else {
                                "Enter f to finish."
                            };
                            ui.status(&format!(
                                "That was the last question, with {} left unanswered. {}",
                                unanswered,
                                hint,
                            ))?;
                        }
                    },
                    Submission::Locked => {
                        ui.status("You have already answered this question.")?;
                    },
                    Submission::Closed => break FinishReason::UserRequested,
                }
            },
            Some(Action::Next) => {
                if !session.advance() {
                    ui.status("This is the last question. Enter f to finish.")?;
                }
            },
            Some(Action::Skip) => {
                if !session.skip() {
                    ui.status("This is the last question. Enter f to finish.")?;
                }
            },
            Some(Action::Previous) => {
                if !session.retreat() {
                    if session.policy() == AnswerPolicy::Locked {
                        ui.status("Answers are locked, so you cannot go back.")?;
                    } else {
                        ui.status("This is the first question.")?;
                    }
                }
            },
            Some(Action::Finish) => break FinishReason::UserRequested,
            None => {
                ui.status("Please enter a letter from a to d, or one of n, p, s or f.")?;
            },
        }
    };

    // Whatever ended the quiz, the countdown must not fire afterwards.
    if let Some(clock) = clock.as_mut() {
        clock.cancel();
    }

    match session.finish(reason) {
        Some(summary) => {
            ui.summary(&view::summary_view(&session, &summary, settings.review))?;
            Ok(Some(summary))
        },
        None => Ok(None),
    }
}
