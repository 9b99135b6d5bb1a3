//! Quiz screen state machine.

use crate::models::{StudySet, VocabEntry};
use rand::seq::{IndexedRandom, SliceRandom};
use std::time::{Duration, Instant};

/// Auto-advance delay after a correct answer.
pub const ADVANCE_CORRECT: Duration = Duration::from_millis(1000);
/// Auto-advance delay after a wrong answer, long enough to read the
/// highlighted correction.
pub const ADVANCE_WRONG: Duration = Duration::from_millis(2000);
/// Options presented per question.
pub const OPTION_COUNT: usize = 4;

/// One quiz run over a fixed word list. Answers lock on first
/// selection and the round advances on a timer, so a question can
/// never be answered twice.
#[derive(Debug, Clone)]
pub struct QuizRound {
    set: StudySet,
    index: usize,
    score: usize,
    options: Vec<String>,
    selected: Option<usize>,
    advance_at: Option<Instant>,
    finished: bool,
}

impl QuizRound {
    pub fn new(set: StudySet) -> Self {
        let options = build_options(&set.entries, 0);
        let finished = set.entries.is_empty();
        Self {
            set,
            index: 0,
            score: 0,
            options,
            selected: None,
            advance_at: None,
            finished,
        }
    }

    pub fn level(&self) -> u8 {
        self.set.level
    }

    pub fn len(&self) -> usize {
        self.set.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.entries.is_empty()
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Entry being asked, if the round is still running.
    pub fn current(&self) -> Option<&VocabEntry> {
        self.set.entries.get(self.index)
    }

    /// Meaning the current question counts as correct.
    pub fn correct_answer(&self) -> Option<&str> {
        self.current().map(|e| e.meaning.as_str())
    }

    /// One-based question number and total, for the header.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.len();
        ((self.index + 1).min(total), total)
    }

    /// Whether the option at `idx` is the correct answer, for result
    /// marking once a selection exists.
    pub fn option_is_correct(&self, idx: usize) -> bool {
        match (self.options.get(idx), self.correct_answer()) {
            (Some(option), Some(answer)) => option == answer,
            _ => false,
        }
    }

    /// Record the first selection for this question; later selections
    /// are ignored until the round advances.
    pub fn select(&mut self, option: usize, now: Instant) {
        if self.finished || self.selected.is_some() || option >= self.options.len() {
            return;
        }
        self.selected = Some(option);
        if self.option_is_correct(option) {
            self.score += 1;
            self.advance_at = Some(now + ADVANCE_CORRECT);
        } else {
            self.advance_at = Some(now + ADVANCE_WRONG);
        }
    }

    /// Move past an answered question once its delay has elapsed.
    pub fn tick(&mut self, now: Instant) {
        let Some(due) = self.advance_at else {
            return;
        };
        if now < due {
            return;
        }
        self.advance_at = None;
        self.selected = None;
        self.index += 1;
        if self.index >= self.len() {
            self.finished = true;
            self.options.clear();
        } else {
            self.options = build_options(&self.set.entries, self.index);
        }
    }

    /// Start over with the same word list.
    pub fn restart(&mut self) {
        self.index = 0;
        self.score = 0;
        self.selected = None;
        self.advance_at = None;
        self.finished = self.set.entries.is_empty();
        self.options = build_options(&self.set.entries, 0);
    }
}

/// Build the answer set for one question: the correct meaning plus up
/// to three distinct distractor meanings drawn from the other entries,
/// padded with placeholder options when the list is too small, then
/// shuffled. The correct meaning appears exactly once.
fn build_options(entries: &[VocabEntry], index: usize) -> Vec<String> {
    let Some(current) = entries.get(index) else {
        return Vec::new();
    };
    let correct = current.meaning.clone();

    let mut pool: Vec<String> = entries
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != index)
        .map(|(_, e)| e.meaning.clone())
        .collect();
    pool.sort_unstable();
    pool.dedup();
    pool.retain(|meaning| meaning != &correct);

    let mut rng = rand::rng();
    let mut options: Vec<String> = pool
        .choose_multiple(&mut rng, OPTION_COUNT - 1)
        .cloned()
        .collect();
    while options.len() < OPTION_COUNT - 1 {
        options.push(format!("fallback option {}", options.len() + 1));
    }
    options.push(correct);
    options.shuffle(&mut rng);
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryDraft;

    fn round(meanings: &[&str]) -> QuizRound {
        let entries = meanings
            .iter()
            .enumerate()
            .map(|(idx, meaning)| VocabEntry::new(&EntryDraft::new(&format!("字{idx}"), "", meaning, 1)))
            .collect();
        QuizRound::new(StudySet { level: 1, entries })
    }

    fn correct_idx(quiz: &QuizRound) -> usize {
        (0..quiz.options().len())
            .find(|&idx| quiz.option_is_correct(idx))
            .unwrap()
    }

    fn wrong_idx(quiz: &QuizRound) -> usize {
        (0..quiz.options().len())
            .find(|&idx| !quiz.option_is_correct(idx))
            .unwrap()
    }

    #[test]
    fn test_answer_set_shape() {
        for size in [1, 2, 3, 4, 10] {
            let meanings: Vec<String> = (0..size).map(|idx| format!("meaning {idx}")).collect();
            let refs: Vec<&str> = meanings.iter().map(String::as_str).collect();
            let quiz = round(&refs);

            assert_eq!(quiz.options().len(), OPTION_COUNT);
            let answer = quiz.correct_answer().unwrap();
            let hits = quiz.options().iter().filter(|o| o.as_str() == answer).count();
            assert_eq!(hits, 1, "size {size}");
        }
    }

    #[test]
    fn test_single_word_pads_options() {
        let quiz = round(&["alone"]);
        let mut options: Vec<&str> = quiz.options().iter().map(String::as_str).collect();
        options.sort_unstable();
        let mut expected = vec![
            "alone",
            "fallback option 1",
            "fallback option 2",
            "fallback option 3",
        ];
        expected.sort_unstable();
        assert_eq!(options, expected);
    }

    #[test]
    fn test_duplicate_meanings_yield_one_correct() {
        let quiz = round(&["cat", "cat", "dog"]);
        let hits = quiz
            .options()
            .iter()
            .filter(|o| o.as_str() == "cat")
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_correct_answer_scores_and_advances() {
        let mut quiz = round(&["one", "two"]);
        let now = Instant::now();

        quiz.select(correct_idx(&quiz), now);
        assert_eq!(quiz.score(), 1);

        // Further selections are ignored until the advance lands.
        quiz.select(wrong_idx(&quiz), now);
        assert_eq!(quiz.score(), 1);

        quiz.tick(now);
        assert_eq!(quiz.progress(), (1, 2));
        quiz.tick(now + ADVANCE_CORRECT);
        assert_eq!(quiz.progress(), (2, 2));
        assert!(quiz.selected().is_none());
    }

    #[test]
    fn test_wrong_answer_waits_longer() {
        let mut quiz = round(&["one", "two"]);
        let now = Instant::now();

        quiz.select(wrong_idx(&quiz), now);
        assert_eq!(quiz.score(), 0);

        quiz.tick(now + ADVANCE_CORRECT);
        assert_eq!(quiz.progress(), (1, 2));
        quiz.tick(now + ADVANCE_WRONG);
        assert_eq!(quiz.progress(), (2, 2));
    }

    #[test]
    fn test_two_word_quiz_scores_one_of_two() {
        let mut quiz = round(&["one", "two"]);
        let now = Instant::now();

        quiz.select(wrong_idx(&quiz), now);
        quiz.tick(now + ADVANCE_WRONG);

        quiz.select(correct_idx(&quiz), now);
        quiz.tick(now + ADVANCE_WRONG * 2);

        assert!(quiz.is_finished());
        assert_eq!(quiz.score(), 1);
        assert_eq!(quiz.len(), 2);
    }

    #[test]
    fn test_all_correct_run() {
        let mut quiz = round(&["one", "two", "three"]);
        let mut now = Instant::now();

        while !quiz.is_finished() {
            quiz.select(correct_idx(&quiz), now);
            now += ADVANCE_CORRECT;
            quiz.tick(now);
        }
        assert_eq!(quiz.score(), 3);
    }

    #[test]
    fn test_restart_resets_round() {
        let mut quiz = round(&["one", "two"]);
        let now = Instant::now();

        quiz.select(correct_idx(&quiz), now);
        quiz.tick(now + ADVANCE_CORRECT);
        quiz.select(correct_idx(&quiz), now);
        quiz.tick(now + ADVANCE_CORRECT * 3);
        assert!(quiz.is_finished());

        quiz.restart();
        assert!(!quiz.is_finished());
        assert_eq!(quiz.score(), 0);
        assert_eq!(quiz.progress(), (1, 2));
        assert_eq!(quiz.options().len(), OPTION_COUNT);
    }

    #[test]
    fn test_empty_quiz_finishes_immediately() {
        let quiz = round(&[]);
        assert!(quiz.is_empty());
        assert!(quiz.is_finished());
    }
}
