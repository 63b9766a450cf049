//! Per-student, per-path progress and the operations that mutate it
//!
//! Every mutation is a pure function of the current record, its arguments
//! and an injected `now`. Persisting the result is the caller's job.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::hearts::{HeartState, MAX_HEARTS};
use crate::model::Quiz;

/// Selected choice per question index
pub type QuizAnswers = BTreeMap<usize, usize>;

/// Why a tracker operation refused to change anything
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Answers are frozen once every question is right
    #[error("Quiz {quiz_id} is already perfect")]
    QuizPerfected { quiz_id: String },

    /// First answer sticks until the quiz is redone
    #[error("Question {} already answered", .question + 1)]
    AlreadyAnswered { question: usize },

    #[error("Question {} does not exist (quiz has {len})", .question + 1)]
    QuestionOutOfRange { question: usize, len: usize },

    #[error("Choice {} does not exist (question has {len})", .choice + 1)]
    ChoiceOutOfRange { choice: usize, len: usize },

    /// Nothing recorded yet, so there is nothing to redo
    #[error("Quiz {quiz_id} has not been attempted")]
    NotAttempted { quiz_id: String },

    /// Redo needs a heart and none are left
    #[error("Out of hearts")]
    OutOfHearts,
}

/// State of one quiz as seen by the student
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    /// Some questions still unanswered
    InProgress { answered: usize, total: usize },
    Perfect,
    /// Fully answered with at least one wrong choice
    Imperfect { correct: usize, total: usize },
}

/// Progress of one student on one learning path, stored at
/// `users/{user_id}/userPaths/{path_id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPathProgress {
    pub user_id: String,
    pub path_id: String,

    /// Lessons marked done (membership only)
    #[serde(default)]
    pub completed_lessons: BTreeSet<String>,

    /// Recorded answers per quiz id. A quiz that was never attempted (or was
    /// redone) has no key at all.
    #[serde(default, alias = "completedQuizzes")]
    pub answers: BTreeMap<String, QuizAnswers>,

    #[serde(default = "full_hearts")]
    pub hearts: u8,

    #[serde(default)]
    pub last_heart_loss: Option<DateTime<Utc>>,

    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn full_hearts() -> u8 {
    MAX_HEARTS
}

impl StudentPathProgress {
    /// Fresh progress with a full heart budget
    pub fn new(user_id: impl Into<String>, path_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            path_id: path_id.into(),
            completed_lessons: BTreeSet::new(),
            answers: BTreeMap::new(),
            hearts: MAX_HEARTS,
            last_heart_loss: None,
            applied_at: now,
            updated_at: now,
        }
    }

    /// Mark a lesson done. Returns true if it was not done before.
    pub fn mark_lesson_complete(&mut self, lesson_id: &str) -> bool {
        self.completed_lessons.insert(lesson_id.to_string())
    }

    /// Undo [`Self::mark_lesson_complete`]. Returns true if it was done.
    pub fn mark_lesson_unread(&mut self, lesson_id: &str) -> bool {
        self.completed_lessons.remove(lesson_id)
    }

    pub fn is_lesson_complete(&self, lesson_id: &str) -> bool {
        self.completed_lessons.contains(lesson_id)
    }

    /// Rounded percentage of the path's current lessons that are completed.
    /// Completions of lessons no longer on the path do not count.
    pub fn completion_percent<'a>(&self, lesson_ids: impl IntoIterator<Item = &'a str>) -> u8 {
        let (done, total) = lesson_ids.into_iter().fold((0usize, 0usize), |(done, total), id| {
            (done + usize::from(self.is_lesson_complete(id)), total + 1)
        });
        if total == 0 {
            return 0;
        }
        ((done as f64 / total as f64) * 100.0).round() as u8
    }

    /// Record the selected choice for one question
    pub fn record_answer(
        &mut self,
        quiz: &Quiz,
        question: usize,
        choice: usize,
    ) -> Result<(), Rejection> {
        if self.is_perfect(quiz) {
            return Err(Rejection::QuizPerfected { quiz_id: quiz.id.clone() });
        }

        let Some(q) = quiz.questions.get(question) else {
            return Err(Rejection::QuestionOutOfRange { question, len: quiz.len() });
        };
        if choice >= q.choices.len() {
            return Err(Rejection::ChoiceOutOfRange { choice, len: q.choices.len() });
        }

        let answers = self.answers.entry(quiz.id.clone()).or_default();
        if answers.contains_key(&question) {
            return Err(Rejection::AlreadyAnswered { question });
        }
        answers.insert(question, choice);
        Ok(())
    }

    /// Recorded answers for a quiz, if it has been attempted
    pub fn answers_for(&self, quiz_id: &str) -> Option<&QuizAnswers> {
        self.answers.get(quiz_id)
    }

    /// Whether the quiz has any recorded answer
    pub fn is_attempted(&self, quiz_id: &str) -> bool {
        self.answers.contains_key(quiz_id)
    }

    /// True iff every question has an answer and every answer is correct
    pub fn is_perfect(&self, quiz: &Quiz) -> bool {
        matches!(self.quiz_state(quiz), QuizState::Perfect)
    }

    /// Derive the quiz state from recorded answers
    pub fn quiz_state(&self, quiz: &Quiz) -> QuizState {
        let total = quiz.len();
        let Some(answers) = self.answers.get(&quiz.id) else {
            return QuizState::NotStarted;
        };

        let answered = (0..total).filter(|i| answers.contains_key(i)).count();
        if answered < total || total == 0 {
            return QuizState::InProgress { answered, total };
        }

        let correct = quiz
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| answers.get(i).is_some_and(|&c| q.is_correct(c)))
            .count();

        if correct == total {
            QuizState::Perfect
        } else {
            QuizState::Imperfect { correct, total }
        }
    }

    /// Spend a heart to wipe an imperfect quiz's answers.
    ///
    /// Either everything happens (answers removed, heart spent, window
    /// anchored if hearts were full) or nothing does.
    pub fn redo_quiz(&mut self, quiz: &Quiz, now: DateTime<Utc>) -> Result<(), Rejection> {
        if self.is_perfect(quiz) {
            return Err(Rejection::QuizPerfected { quiz_id: quiz.id.clone() });
        }
        if !self.is_attempted(&quiz.id) {
            return Err(Rejection::NotAttempted { quiz_id: quiz.id.clone() });
        }

        let spent = self.heart_state().spend(now).ok_or(Rejection::OutOfHearts)?;
        self.set_heart_state(spent);
        self.answers.remove(&quiz.id);
        Ok(())
    }

    /// Current heart budget
    pub fn heart_state(&self) -> HeartState {
        HeartState::from_parts(self.hearts, self.last_heart_loss)
    }

    fn set_heart_state(&mut self, state: HeartState) {
        let (hearts, last_loss) = state.into_parts();
        self.hearts = hearts;
        self.last_heart_loss = last_loss;
    }

    /// Apply regeneration due at `now`. Also repairs records whose columns
    /// disagree (e.g. depleted without a timestamp). Returns true if the
    /// persisted fields changed.
    pub fn reconcile_hearts(&mut self, now: DateTime<Utc>) -> bool {
        let before = (self.hearts, self.last_heart_loss);
        let state = self.heart_state().reconcile(now);
        self.set_heart_state(state);
        before != (self.hearts, self.last_heart_loss)
    }

    /// Countdown to the next refill, `None` when full
    pub fn countdown(&self, now: DateTime<Utc>) -> Option<String> {
        self.heart_state().countdown(now)
    }
}
