/**
 * The command-line user interface for taking quizzes. Everything shown here comes from
 * the view models in `view`.
 */
use std::io::Write;
use std::time::Instant;

use colored::*;

use super::common::{Mode, QuizError, Result};
use super::iohelper::{prettyprint, prettyprint_colored, Input, LineReader};
use super::view::{FeedbackView, QuestionView, SummaryView};


/// A command typed at the quiz prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Answer(usize),
    Next,
    Previous,
    Skip,
    Finish,
}


/// Parse a line of input at the quiz prompt.
pub fn parse_action(input: &str) -> Option<Action> {
    match input.trim().to_lowercase().as_str() {
        "a" => Some(Action::Answer(0)),
        "b" => Some(Action::Answer(1)),
        "c" => Some(Action::Answer(2)),
        "d" => Some(Action::Answer(3)),
        "n" | "next" => Some(Action::Next),
        "p" | "prev" | "previous" => Some(Action::Previous),
        "s" | "skip" => Some(Action::Skip),
        "f" | "finish" => Some(Action::Finish),
        _ => None,
    }
}


/// List the commands that do something at this question.
fn commands_hint(view: &QuestionView) -> String {
    let mut commands = vec!["a-d answer"];
    if !view.is_last {
        commands.push("n next");
        commands.push("s skip");
    }
    if view.can_go_back {
        commands.push("p previous");
    }
    commands.push("f finish");
    format!("Commands: {}", commands.join(", "))
}


pub struct CmdUI {
    /// The number of the question currently on screen, so that it is only printed
    /// again when the user moves to another question.
    shown: Option<usize>,
    reader: LineReader,
}


impl CmdUI {
    pub fn new() -> Self {
        Self { shown: None, reader: LineReader::new() }
    }

    pub fn intro(&mut self, title: &str, mode: Mode, count: usize, clock: Option<&str>) -> Result<()> {
        self.shown = None;
        my_print!("\n")?;
        let mut text = format!(
            "{}: {} {} ({} mode)",
            title,
            count,
            if count == 1 { "question" } else { "questions" },
            mode,
        );
        if let Some(clock) = clock {
            text.push_str(&format!(", time limit {}", clock));
        }
        prettyprint_colored(&text, Some("  "), Some(Color::BrightBlue), None)?;
        prettyprint_colored(
            "Answer with a-d. Enter n for next, p for previous, s to skip, f to finish.",
            Some("  "),
            Some(Color::BrightBlue),
            None,
        )
    }

    pub fn question(&mut self, view: &QuestionView) -> Result<()> {
        if self.shown == Some(view.number) {
            return Ok(());
        }
        self.shown = Some(view.number);
        my_print!("\n")?;

        let prefix = format!("  ({}/{}) ", view.number, view.total);
        prettyprint_colored(&view.text, Some(&prefix), None, Some(Color::Cyan))?;
        let indent = " ".repeat(prefix.len());
        my_println!("{}{}", indent, format!("[{}]", view.topic).dimmed())?;

        for option in view.options.iter() {
            let prefix = format!("     ({}) ", option.letter.to_ascii_lowercase());
            if option.selected {
                prettyprint_colored(&option.text, Some(&prefix), Some(Color::Yellow), None)?;
            } else {
                prettyprint(&option.text, Some(&prefix))?;
            }
        }

        if view.options.iter().any(|o| o.selected) {
            my_println!("\n  Your current selection: {}", view.selection)?;
        }
        if let Some(clock) = &view.clock {
            my_println!("\n  Time remaining: {}", clock.cyan())?;
        }
        my_println!("\n  {}", commands_hint(view).dimmed())?;
        my_print!("\n")
    }

    /// Read a command, giving up at `deadline` if there is one.
    pub fn prompt(&mut self, clock: Option<&str>, deadline: Option<Instant>) -> Result<Input> {
        match clock {
            Some(clock) => self.reader.read(&format!("[{}] > ", clock), deadline),
            None => self.reader.read("> ", deadline),
        }
    }

    pub fn confirm(&mut self, message: &str) -> bool {
        self.reader.confirm(message)
    }

    pub fn feedback(&mut self, view: &FeedbackView) -> Result<()> {
        if view.correct {
            prettyprint(&"Correct!".green(), None)?;
        } else {
            let message = format!(
                "{} The correct answer was {}.",
                "Incorrect.".red(),
                view.correct_answer.green(),
            );
            prettyprint(&message, None)?;
        }

        if let Some(text) = &view.correct_answer_text {
            prettyprint(text, Some("Answer: "))?;
        }
        prettyprint(&view.rationale, Some("Rationale: "))?;
        match &view.option_notes {
            Some(notes) => {
                my_println!("Why each option is right or wrong:")?;
                for note in notes.iter() {
                    prettyprint(note, Some("  "))?;
                }
                Ok(())
            },
            None => my_println!("Per-option explanations: not provided."),
        }
    }

    pub fn status(&mut self, text: &str) -> Result<()> {
        my_println!("{}", text)
    }

    pub fn warning(&mut self, text: &str) -> Result<()> {
        my_print!("\n")?;
        prettyprint_colored(
            &format!("Warning: {}", text), Some("  "), Some(Color::Red), None)?;
        my_print!("\n")
    }

    pub fn summary(&mut self, view: &SummaryView) -> Result<()> {
        my_print!("\n\n")?;
        if view.time_up {
            my_println!("{}", "Quiz completed (time up)".bright_blue())?;
        } else {
            my_println!("{}", "Quiz completed".bright_blue())?;
        }

        my_print!("Score: ")?;
        my_print!("{}", format!("{}%", view.accuracy).cyan())?;
        my_print!(" out of ")?;
        my_print!("{}", format!("{}", view.total).cyan())?;
        if view.total == 1 {
            my_println!(" question")?;
        } else {
            my_println!(" questions")?;
        }
        my_println!("  {} attempted", view.attempted)?;
        my_println!("  {} correct", format!("{}", view.correct).green())?;
        my_println!("  {} incorrect", format!("{}", view.incorrect).red())?;
        my_println!("Pass mark: {}%", view.pass_mark)?;
        if view.passed {
            my_println!("{}", "Passed.".green())?;
        } else {
            my_println!("{}", "Failed.".red())?;
        }

        if !view.weak_topics.is_empty() {
            my_println!("\nWeak topics:")?;
            for (topic, misses) in view.weak_topics.iter() {
                my_println!("  {} ({} missed)", topic, misses)?;
            }
        }

        if !view.review.is_empty() {
            my_println!("\nReview:")?;
        }
        for entry in view.review.iter() {
            my_print!("\n")?;
            let prefix = format!("  ({}) ", entry.number);
            let verdict = if entry.correct { "Correct".green() } else { "Incorrect".red() };
            prettyprint_colored(
                &format!("[{}] {}", entry.topic, entry.text), Some(&prefix), None, Some(Color::Cyan))?;
            let indent = " ".repeat(prefix.len());
            my_println!("{}{}", indent, verdict)?;
            prettyprint(&entry.your_answer, Some(&format!("{}Your answer: ", indent)))?;
            prettyprint(&entry.correct_answer, Some(&format!("{}Correct answer: ", indent)))?;
            prettyprint(&entry.rationale, Some(&format!("{}Rationale: ", indent)))?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quiz_commands() {
        assert_eq!(parse_action("B"), Some(Action::Answer(1)));
        assert_eq!(parse_action(" d "), Some(Action::Answer(3)));
        assert_eq!(parse_action("next"), Some(Action::Next));
        assert_eq!(parse_action("p"), Some(Action::Previous));
        assert_eq!(parse_action("s"), Some(Action::Skip));
        assert_eq!(parse_action("F"), Some(Action::Finish));
        assert_eq!(parse_action("e"), None);
        assert_eq!(parse_action("Harry Truman"), None);
    }

    fn question_view(can_go_back: bool, is_last: bool) -> QuestionView {
        QuestionView {
            number: 2,
            total: 3,
            topic: String::from("Plans"),
            text: String::from("What is a plan?"),
            options: Vec::new(),
            selection: String::from("Not answered"),
            can_go_back,
            is_last,
            clock: None,
        }
    }

    #[test]
    fn hint_lists_only_available_commands() {
        assert_eq!(
            commands_hint(&question_view(true, false)),
            "Commands: a-d answer, n next, s skip, p previous, f finish",
        );
        assert_eq!(commands_hint(&question_view(false, true)), "Commands: a-d answer, f finish");
    }
}
