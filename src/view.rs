/**
 * Plain descriptions of what to show the user, built from a `Session`. The terminal
 * renderer in `ui` only ever sees these structs.
 */
use serde::Serialize;

use super::quiz::{
    letter, FinishReason, Question, QuizSummary, Session, PASS_MARK, WEAK_TOPIC_LIMIT};


const NOT_ANSWERED: &str = "Not answered";


#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OptionView {
    pub letter: char,
    pub text: String,
    pub selected: bool,
}


#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    /// 1-based position in the quiz.
    pub number: usize,
    pub total: usize,
    pub topic: String,
    pub text: String,
    pub options: Vec<OptionView>,
    pub selection: String,
    pub can_go_back: bool,
    pub is_last: bool,
    /// Remaining time, for timed quizzes.
    pub clock: Option<String>,
}


#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FeedbackView {
    pub correct: bool,
    pub correct_answer: String,
    pub correct_answer_text: Option<String>,
    pub rationale: String,
    /// Why each option is right or wrong, when the bank explains options separately.
    pub option_notes: Option<Vec<String>>,
}


#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReviewEntry {
    pub number: usize,
    pub topic: String,
    pub text: String,
    pub your_answer: String,
    pub correct_answer: String,
    pub correct: bool,
    pub rationale: String,
}


#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SummaryView {
    pub time_up: bool,
    pub total: usize,
    pub attempted: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub accuracy: u32,
    pub pass_mark: u32,
    pub passed: bool,
    pub weak_topics: Vec<(String, u32)>,
    pub review: Vec<ReviewEntry>,
}


/// Describe the current question, or `None` if the session is finished or has no
/// questions.
pub fn question_view(session: &Session, clock: Option<String>) -> Option<QuestionView> {
    if session.is_finished() {
        return None;
    }
    let question = session.current()?;
    let answer = session.answer_at(session.cursor());

    let options = question.options.iter()
        .enumerate()
        .map(|(i, text)| OptionView {
            letter: letter(i),
            text: text.clone(),
            selected: answer == Some(i),
        })
        .collect();

    Some(QuestionView {
        number: session.cursor() + 1,
        total: session.len(),
        topic: question.topic.clone(),
        text: question.text.clone(),
        options,
        selection: answer_label(question, answer),
        can_go_back: session.can_retreat(),
        is_last: session.is_last(),
        clock,
    })
}


pub fn feedback_view(question: &Question, choice: usize) -> FeedbackView {
    let option_notes = question.option_rationales.as_ref().map(|_| {
        (0..question.options.len())
            .map(|i| format!("{}) {}", letter(i), question.option_rationale(i)))
            .collect()
    });

    FeedbackView {
        correct: question.is_correct(choice),
        correct_answer: question.correct_label(),
        correct_answer_text: question.correct_answer_text.clone(),
        rationale: question.rationale.clone(),
        option_notes,
    }
}


/// Describe a finished quiz. The per-question review is only built if `review` is set.
pub fn summary_view(session: &Session, summary: &QuizSummary, review: bool) -> SummaryView {
    let review = if review {
        session.questions().iter()
            .enumerate()
            .map(|(i, question)| {
                let answer = session.answer_at(i);
                ReviewEntry {
                    number: i + 1,
                    topic: question.topic.clone(),
                    text: question.text.clone(),
                    your_answer: answer_label(question, answer),
                    correct_answer: question.correct_label(),
                    correct: answer.map(|a| question.is_correct(a)).unwrap_or(false),
                    rationale: question.rationale.clone(),
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    SummaryView {
        time_up: summary.reason == FinishReason::TimeExpired,
        total: summary.total,
        attempted: summary.tally.attempted,
        correct: summary.tally.correct,
        incorrect: summary.tally.incorrect,
        accuracy: summary.accuracy,
        pass_mark: PASS_MARK,
        passed: summary.passed,
        weak_topics: summary.top_weak_topics(WEAK_TOPIC_LIMIT).to_vec(),
        review,
    }
}


fn answer_label(question: &Question, answer: Option<usize>) -> String {
    match answer {
        Some(choice) => question.choice_label(choice),
        None => String::from(NOT_ANSWERED),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::super::quiz::AnswerPolicy;

    fn questions() -> Vec<Question> {
        vec![
            Question::new("SRC-1", "Plans", "What is a plan?", ["w", "x", "y", "z"], 1),
            Question::new("SRC-2", "Risk", "What is a risk?", ["w", "x", "y", "z"], 2),
        ]
    }

    #[test]
    fn question_view_shows_position_and_selection() {
        let questions = questions();
        let mut session = Session::new(questions.iter().collect(), AnswerPolicy::Revisable);

        let view = question_view(&session, None).unwrap();
        assert_eq!(view.number, 1);
        assert_eq!(view.total, 2);
        assert_eq!(view.selection, "Not answered");
        assert!(!view.can_go_back);
        assert!(!view.is_last);
        assert_eq!(view.options[3].letter, 'D');

        session.submit(0).unwrap();
        session.advance();
        session.retreat();
        let view = question_view(&session, Some(String::from("59:59"))).unwrap();
        assert_eq!(view.selection, "A) w");
        assert!(view.options[0].selected);
        assert_eq!(view.clock.as_deref(), Some("59:59"));

        session.advance();
        let view = question_view(&session, None).unwrap();
        assert!(view.can_go_back);
        assert!(view.is_last);
    }

    #[test]
    fn empty_session_has_no_question_view() {
        let session = Session::new(Vec::new(), AnswerPolicy::Locked);
        assert!(question_view(&session, None).is_none());
    }

    #[test]
    fn finished_session_has_no_question_view() {
        let questions = questions();
        let mut session = Session::new(questions.iter().collect(), AnswerPolicy::Revisable);
        session.finish(FinishReason::UserRequested);
        assert!(question_view(&session, None).is_none());
    }

    #[test]
    fn feedback_explains_options_when_possible() {
        let mut question = questions().remove(0);
        let view = feedback_view(&question, 0);
        assert!(!view.correct);
        assert_eq!(view.correct_answer, "B) x");
        assert_eq!(view.rationale, "—");
        assert!(view.option_notes.is_none());

        question.option_rationales = Some([
            String::from("too vague"),
            String::from("right"),
            String::from("a product"),
            String::from("a role"),
        ]);
        let view = feedback_view(&question, 1);
        assert!(view.correct);
        assert_eq!(view.option_notes.unwrap()[2], "C) a product");
    }

    #[test]
    fn summary_view_reviews_every_question() {
        let questions = questions();
        let mut session = Session::new(questions.iter().collect(), AnswerPolicy::Locked);
        session.submit(0).unwrap();
        let summary = session.finish(FinishReason::TimeExpired).unwrap();

        let view = summary_view(&session, &summary, true);
        assert!(view.time_up);
        assert_eq!(view.pass_mark, 60);
        assert_eq!(view.weak_topics, vec![(String::from("Plans"), 1)]);
        assert_eq!(view.review.len(), 2);
        assert_eq!(view.review[0].your_answer, "A) w");
        assert!(!view.review[0].correct);
        assert_eq!(view.review[1].your_answer, "Not answered");
        assert_eq!(view.review[1].correct_answer, "C) y");

        assert!(summary_view(&session, &summary, false).review.is_empty());
    }

    #[test]
    fn views_serialize() {
        let questions = questions();
        let session = Session::new(questions.iter().collect(), AnswerPolicy::Locked);
        let view = question_view(&session, None).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["topic"], "Plans");
        assert_eq!(json["options"][1]["letter"], "B");
    }
}
