/**
 * Questions, quiz sessions and scoring.
 *
 * A `Session` walks over the questions chosen for one quiz, records the user's
 * answers, keeps running tallies and counts misses per topic. Finishing a session
 * produces a `QuizSummary`.
 */
use serde::Serialize;

use super::common::{QuizError, Result};


/// Percentage at or above which a quiz is passed.
pub const PASS_MARK: u32 = 60;
/// How many weak topics are shown after a quiz.
pub const WEAK_TOPIC_LIMIT: usize = 5;
/// Stand-in for a missing rationale.
pub const NO_RATIONALE: &str = "—";
pub const NOT_PROVIDED: &str = "not provided";

const LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];


/// Represents a multiple-choice question with exactly four options.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: String,
    pub topic: String,
    /// The text of the question.
    pub text: String,
    /// The options in the order they are shown, labelled A to D.
    pub options: [String; 4],
    /// Index into `options` of the correct option.
    pub correct: usize,
    pub rationale: String,
    /// Explanations aligned with `options`, when the bank provides them.
    pub option_rationales: Option<[String; 4]>,
    /// Free-text form of the correct answer, when the bank provides it.
    pub correct_answer_text: Option<String>,
}


impl Question {
    /// Return a new question with no rationale.
    #[cfg(test)]
    pub fn new(id: &str, topic: &str, text: &str, options: [&str; 4], correct: usize) -> Self {
        Question {
            id: String::from(id),
            topic: String::from(topic),
            text: String::from(text),
            options: [
                String::from(options[0]),
                String::from(options[1]),
                String::from(options[2]),
                String::from(options[3]),
            ],
            correct,
            rationale: String::from(NO_RATIONALE),
            option_rationales: None,
            correct_answer_text: None,
        }
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct
    }

    /// Return the option at `choice` prefixed by its letter, e.g. "B) Directing".
    pub fn choice_label(&self, choice: usize) -> String {
        format!("{}) {}", letter(choice), self.options[choice])
    }

    pub fn correct_label(&self) -> String {
        self.choice_label(self.correct)
    }

    pub fn option_rationale(&self, choice: usize) -> &str {
        match &self.option_rationales {
            Some(rationales) => &rationales[choice],
            None => NOT_PROVIDED,
        }
    }
}


/// Return the letter used to label the option at index `i`.
pub fn letter(i: usize) -> char {
    LETTERS[i]
}


/// Map an option letter to its index, ignoring case and surrounding whitespace.
pub fn letter_to_index(s: &str) -> Option<usize> {
    match s.trim().to_uppercase().as_str() {
        "A" => Some(0),
        "B" => Some(1),
        "C" => Some(2),
        "D" => Some(3),
        _ => None,
    }
}


/// Whether a question may be answered again after its first answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPolicy {
    /// The first answer to each question is final.
    Locked,
    /// Answers may be replaced, and the user may move back to earlier questions.
    Revisable,
}


#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    UserRequested,
    TimeExpired,
}


/// Running counts of answered questions.
#[derive(Serialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub attempted: usize,
    pub correct: usize,
    pub incorrect: usize,
}


impl Tally {
    /// Percentage of attempted questions answered correctly, rounded half up.
    pub fn accuracy(&self) -> u32 {
        if self.attempted == 0 {
            return 0;
        }
        ((200 * self.correct + self.attempted) / (2 * self.attempted)) as u32
    }

    pub fn passed(&self) -> bool {
        self.accuracy() >= PASS_MARK
    }

    fn add(&mut self, correct: bool) {
        self.attempted += 1;
        if correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
    }

    fn remove(&mut self, correct: bool) {
        self.attempted -= 1;
        if correct {
            self.correct -= 1;
        } else {
            self.incorrect -= 1;
        }
    }
}


/// Miss counts per topic, kept in the order topics were first missed.
#[derive(Debug, Default, Clone)]
pub struct TopicMisses {
    entries: Vec<(String, u32)>,
}


impl TopicMisses {
    pub fn record(&mut self, topic: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| t == topic) {
            entry.1 += 1;
        } else {
            self.entries.push((topic.to_string(), 1));
        }
    }

    fn unrecord(&mut self, topic: &str) {
        if let Some(entry) = self.entries.iter_mut().find(|(t, _)| t == topic) {
            entry.1 = entry.1.saturating_sub(1);
        }
    }

    #[cfg(test)]
    pub fn get(&self, topic: &str) -> u32 {
        self.entries.iter()
            .find(|(t, _)| t == topic)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }

    /// Topics with at least one miss, most missed first. Ties keep the order in which
    /// the topics were first missed.
    pub fn ranked(&self) -> Vec<(String, u32)> {
        let mut ranked: Vec<(String, u32)> = self.entries.iter()
            .filter(|(_, n)| *n > 0)
            .cloned()
            .collect();
        // `sort_by` is stable.
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}


/// What happened to an answer passed to `Session::submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Recorded { correct: bool },
    /// The question was already answered and the session does not allow changes.
    Locked,
    /// The session is finished or has no questions.
    Closed,
}


/// Represents the results of taking a quiz on a particular occasion.
#[derive(Serialize, Debug, Clone)]
pub struct QuizSummary {
    pub time_finished: chrono::DateTime<chrono::Utc>,
    pub reason: FinishReason,
    pub total: usize,
    pub tally: Tally,
    pub accuracy: u32,
    pub passed: bool,
    /// Every weak topic, most missed first.
    pub weak_topics: Vec<(String, u32)>,
}


impl QuizSummary {
    pub fn top_weak_topics(&self, limit: usize) -> &[(String, u32)] {
        let n = ::std::cmp::min(limit, self.weak_topics.len());
        &self.weak_topics[..n]
    }
}


/// The state of a single quiz run.
#[derive(Debug)]
pub struct Session<'a> {
    questions: Vec<&'a Question>,
    answers: Vec<Option<usize>>,
    cursor: usize,
    policy: AnswerPolicy,
    tally: Tally,
    misses: TopicMisses,
    finished: Option<FinishReason>,
}


impl<'a> Session<'a> {
    pub fn new(questions: Vec<&'a Question>, policy: AnswerPolicy) -> Self {
        let answers = vec![None; questions.len()];
        Session {
            questions,
            answers,
            cursor: 0,
            policy,
            tally: Tally::default(),
            misses: TopicMisses::default(),
            finished: None,
        }
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn policy(&self) -> AnswerPolicy {
        self.policy
    }

    pub fn questions(&self) -> &[&'a Question] {
        &self.questions
    }

    pub fn current(&self) -> Option<&'a Question> {
        self.questions.get(self.cursor).copied()
    }

    pub fn answer_at(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    #[cfg(test)]
    pub fn tally(&self) -> Tally {
        self.tally
    }

    #[cfg(test)]
    pub fn misses(&self) -> &TopicMisses {
        &self.misses
    }

    pub fn is_finished(&self) -> bool {
        self.finished.is_some()
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 >= self.questions.len()
    }

    pub fn can_retreat(&self) -> bool {
        self.policy == AnswerPolicy::Revisable && self.cursor > 0
    }

    pub fn unanswered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_none()).count()
    }

    /// Record `choice` as the answer to the current question.
    pub fn submit(&mut self, choice: usize) -> Result<Submission> {
        if choice >= LETTERS.len() {
            return Err(QuizError::InvalidChoice(choice));
        }

        let question = match self.current() {
            Some(q) if self.finished.is_none() => q,
            _ => return Ok(Submission::Closed),
        };

        if let Some(previous) = self.answers[self.cursor] {
            if self.policy == AnswerPolicy::Locked {
                return Ok(Submission::Locked);
            }

            let was_correct = question.is_correct(previous);
            self.tally.remove(was_correct);
            if !was_correct {
                self.misses.unrecord(&question.topic);
            }
        }

        let correct = question.is_correct(choice);
        self.answers[self.cursor] = Some(choice);
        self.tally.add(correct);
        if !correct {
            self.misses.record(&question.topic);
        }
        Ok(Submission::Recorded { correct })
    }

    /// Move to the next question. Return `false` if already at the last question.
    pub fn advance(&mut self) -> bool {
        if self.finished.is_none() && self.cursor + 1 < self.questions.len() {
            self.cursor += 1;
            true
        } else {
            false
        }
    }

    /// Move on without answering the current question.
    pub fn skip(&mut self) -> bool {
        self.advance()
    }

    /// Move back to the previous question, if the session allows it.
    pub fn retreat(&mut self) -> bool {
        if self.finished.is_none() && self.can_retreat() {
            self.cursor -= 1;
            true
        } else {
            false
        }
    }

    /// Finish the session. Only the first call produces a summary.
    pub fn finish(&mut self, reason: FinishReason) -> Option<QuizSummary> {
        if self.finished.is_some() {
            return None;
        }
        self.finished = Some(reason);

        Some(QuizSummary {
            time_finished: chrono::Utc::now(),
            reason,
            total: self.questions.len(),
            tally: self.tally,
            accuracy: self.tally.accuracy(),
            passed: self.tally.passed(),
            weak_topics: self.misses.ranked(),
        })
    }
}
