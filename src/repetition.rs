/**
 * Choose the questions for a quiz.
 *
 * Mixed mode draws from the whole bank every time. Daily mode only draws from
 * questions that have not been served since the last reset, and starts a new cycle
 * over the whole bank once every question has been served.
 */
use std::cmp;
use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

use super::common::{Mode, QuizError, Result};
use super::persistence::Progress;
use super::quiz::Question;


/// IDs of the questions served in daily mode since the last reset.
pub type SeenSet = BTreeSet<String>;


/// Choose up to `requested` distinct questions from `bank`.
///
/// `requested` is clamped to between one and the size of the bank. In daily mode the
/// chosen questions are added to `seen`, and `seen` is cleared first if it already
/// covers the whole bank.
pub fn choose_questions<'a, R: Rng + ?Sized>(
    bank: &'a [Question],
    mode: Mode,
    requested: usize,
    seen: &mut SeenSet,
    rng: &mut R,
) -> Vec<&'a Question> {
    if bank.is_empty() {
        return Vec::new();
    }
    let requested = cmp::max(1, cmp::min(requested, bank.len()));

    let mut candidates: Vec<&Question> = match mode {
        Mode::Mixed => bank.iter().collect(),
        Mode::Daily => bank.iter().filter(|q| !seen.contains(&q.id)).collect(),
    };

    if candidates.is_empty() {
        info!(bank = bank.len(), "every question has been seen, starting a new cycle");
        seen.clear();
        candidates = bank.iter().collect();
    }

    candidates.shuffle(rng);
    candidates.truncate(cmp::min(requested, candidates.len()));

    if mode == Mode::Daily {
        for question in candidates.iter() {
            seen.insert(question.id.clone());
        }
    }
    candidates
}


/// Build a quiz, reading and updating the seen-set in `progress`. An empty bank gives
/// `QuizError::EmptyQuiz`.
///
/// In daily mode the new seen-set is written back with one write before the quiz is
/// returned, so a question counts as seen as soon as it is chosen.
pub fn build_quiz<'a, R: Rng + ?Sized>(
    bank: &'a [Question],
    mode: Mode,
    requested: usize,
    progress: &Progress,
    rng: &mut R,
) -> Result<Vec<&'a Question>> {
    if bank.is_empty() {
        return Err(QuizError::EmptyQuiz);
    }

    let mut seen = match mode {
        Mode::Daily => progress.load_seen()?,
        Mode::Mixed => SeenSet::new(),
    };

    let chosen = choose_questions(bank, mode, requested, &mut seen, rng);
    if mode == Mode::Daily {
        progress.save_seen(&seen)?;
    }
    Ok(chosen)
}


/// Return how many questions in `bank` are in `seen`.
pub fn count_seen(bank: &[Question], seen: &SeenSet) -> usize {
    bank.iter().filter(|q| seen.contains(&q.id)).count()
}
