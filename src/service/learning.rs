//! A student working through a learning path
//!
//! Every operation reads the student's progress document, lazily applies
//! heart regeneration, runs one tracker operation and writes the whole
//! record back. There is no version check on that write: two sessions of the
//! same student racing on a redo can both spend from the same stale count and
//! the last write wins.

use chrono::{DateTime, Utc};

use crate::auth::Session;
use crate::clock::Clock;
use crate::error::Result;
use crate::model::{QuizParent, Role};
use crate::progress::{HeartState, QuizState, Rejection, StudentPathProgress};
use crate::store::{DocumentStore, docpath};

use super::catalog::Catalog;

/// Result of an operation that business rules may refuse
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The change was applied and saved
    Applied(T),
    /// Nothing was written
    Rejected(Rejection),
}

impl<T> Outcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// One quiz as listed in [`PathStatus`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStatus {
    pub id: String,
    pub title: String,
    pub lesson_id: Option<String>,
    pub state: QuizState,
}

/// Everything the path screen shows a student
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStatus {
    pub path_id: String,
    pub title: String,
    pub lessons_done: usize,
    pub lessons_total: usize,
    pub percent: u8,
    pub hearts: u8,
    /// `HH:MM:SS` until hearts refill, when not full
    pub countdown: Option<String>,
    pub next_refill: Option<DateTime<Utc>>,
    pub quizzes: Vec<QuizStatus>,
}

/// Student-side path operations
pub struct Learning<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: DocumentStore> Learning<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    fn catalog(&self) -> Catalog<'a, S> {
        Catalog::new(self.store, self.clock)
    }

    /// Enroll in a path. Enrolling twice keeps the existing progress.
    pub async fn apply(&self, session: &Session, path_id: &str) -> Result<StudentPathProgress> {
        session.require(Role::Student, "apply to learning paths")?;
        self.catalog().get_path(path_id).await?;

        let fresh = StudentPathProgress::new(&session.user_id, path_id, self.clock.now());
        let doc = docpath::user_path(&session.user_id, path_id);
        if self.store.create_as(&doc, &fresh).await? {
            tracing::info!(user = %session.user_id, path = %path_id, "Applied to learning path");
            Ok(fresh)
        } else {
            self.load(session, path_id).await
        }
    }

    /// Progress records for every path the student applied to
    pub async fn applied_paths(&self, session: &Session) -> Result<Vec<StudentPathProgress>> {
        session.require(Role::Student, "track learning paths")?;
        self.store.list_as(&docpath::user_paths(&session.user_id)).await
    }

    /// Read progress, creating it in memory if the student never touched the
    /// path, and apply any heart regeneration that is due
    pub async fn load(&self, session: &Session, path_id: &str) -> Result<StudentPathProgress> {
        session.require(Role::Student, "track learning paths")?;

        let now = self.clock.now();
        let doc = docpath::user_path(&session.user_id, path_id);
        let Some(mut progress) = self.store.get_as::<StudentPathProgress>(&doc).await? else {
            self.catalog().get_path(path_id).await?;
            return Ok(StudentPathProgress::new(&session.user_id, path_id, now));
        };

        if progress.reconcile_hearts(now) {
            tracing::info!(
                user = %session.user_id,
                path = %path_id,
                hearts = progress.hearts,
                "Hearts regenerated"
            );
            self.save(&mut progress).await?;
        }
        Ok(progress)
    }

    async fn save(&self, progress: &mut StudentPathProgress) -> Result<()> {
        progress.updated_at = self.clock.now();
        let doc = docpath::user_path(&progress.user_id, &progress.path_id);
        self.store.set_as(&doc, progress).await
    }

    /// Mark a lesson done. Returns false if it already was.
    pub async fn complete_lesson(
        &self,
        session: &Session,
        path_id: &str,
        lesson_id: &str,
    ) -> Result<bool> {
        self.catalog().get_lesson(path_id, lesson_id).await?;
        let mut progress = self.load(session, path_id).await?;

        if !progress.mark_lesson_complete(lesson_id) {
            return Ok(false);
        }
        self.save(&mut progress).await?;
        tracing::info!(user = %session.user_id, lesson = %lesson_id, "Lesson completed");
        Ok(true)
    }

    /// Undo a completed lesson. Returns false if it was not done.
    pub async fn unread_lesson(
        &self,
        session: &Session,
        path_id: &str,
        lesson_id: &str,
    ) -> Result<bool> {
        let mut progress = self.load(session, path_id).await?;

        if !progress.mark_lesson_unread(lesson_id) {
            return Ok(false);
        }
        self.save(&mut progress).await?;
        tracing::info!(user = %session.user_id, lesson = %lesson_id, "Lesson marked unread");
        Ok(true)
    }

    /// Record one answer and report the quiz's resulting state
    pub async fn answer(
        &self,
        session: &Session,
        path_id: &str,
        quiz_id: &str,
        question: usize,
        choice: usize,
    ) -> Result<Outcome<QuizState>> {
        let quiz = self.catalog().get_quiz(path_id, quiz_id).await?;
        let mut progress = self.load(session, path_id).await?;

        if let Err(rejection) = progress.record_answer(&quiz, question, choice) {
            tracing::warn!(user = %session.user_id, quiz = %quiz_id, "Answer rejected: {}", rejection);
            return Ok(Outcome::Rejected(rejection));
        }
        self.save(&mut progress).await?;

        let state = progress.quiz_state(&quiz);
        tracing::info!(user = %session.user_id, quiz = %quiz_id, ?state, "Answer recorded");
        Ok(Outcome::Applied(state))
    }

    /// Spend a heart to clear an imperfect quiz
    pub async fn redo_quiz(
        &self,
        session: &Session,
        path_id: &str,
        quiz_id: &str,
    ) -> Result<Outcome<HeartState>> {
        let quiz = self.catalog().get_quiz(path_id, quiz_id).await?;
        let mut progress = self.load(session, path_id).await?;

        if let Err(rejection) = progress.redo_quiz(&quiz, self.clock.now()) {
            tracing::warn!(user = %session.user_id, quiz = %quiz_id, "Redo rejected: {}", rejection);
            return Ok(Outcome::Rejected(rejection));
        }
        self.save(&mut progress).await?;

        tracing::info!(
            user = %session.user_id,
            quiz = %quiz_id,
            hearts = progress.hearts,
            "Quiz reset"
        );
        Ok(Outcome::Applied(progress.heart_state()))
    }

    /// Snapshot of the student's standing on a path
    pub async fn status(&self, session: &Session, path_id: &str) -> Result<PathStatus> {
        let contents = self.catalog().path_contents(path_id).await?;
        let progress = self.load(session, path_id).await?;
        let now = self.clock.now();

        let lessons_done =
            contents.lessons.iter().filter(|l| progress.is_lesson_complete(&l.id)).count();
        let quizzes = contents
            .quizzes
            .iter()
            .map(|q| QuizStatus {
                id: q.id.clone(),
                title: q.title.clone(),
                lesson_id: match &q.parent {
                    QuizParent::Path { lesson_id, .. } => Some(lesson_id.clone()),
                    QuizParent::Class { .. } => None,
                },
                state: progress.quiz_state(q),
            })
            .collect();
        let hearts = progress.heart_state();

        Ok(PathStatus {
            path_id: contents.path.id,
            title: contents.path.title,
            lessons_done,
            lessons_total: contents.lessons.len(),
            percent: progress.completion_percent(contents.lessons.iter().map(|l| l.id.as_str())),
            hearts: hearts.hearts(),
            countdown: hearts.countdown(now),
            next_refill: hearts.next_refill(),
            quizzes,
        })
    }
}
