//! Badges and totals derived from a student's progress. Nothing here is
//! stored; the overview is recomputed on every call.

use std::fmt;

use crate::auth::Session;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::Role;
use crate::progress::QuizState;
use crate::store::DocumentStore;

use super::classroom::Classroom;
use super::learning::{Learning, PathStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Badge {
    /// Finished any lesson
    FirstLesson,
    /// Finished every lesson of a path
    PathFinisher { path_id: String, title: String },
    /// Answered every question of a path quiz correctly
    QuizAce { quiz_id: String, title: String },
    /// Scored 100 on a class quiz
    PerfectScore { class_id: String, quiz_id: String, title: String },
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Badge::FirstLesson => write!(f, "First lesson"),
            Badge::PathFinisher { title, .. } => write!(f, "Path finisher: {}", title),
            Badge::QuizAce { title, .. } => write!(f, "Quiz ace: {}", title),
            Badge::PerfectScore { title, .. } => write!(f, "Perfect score: {}", title),
        }
    }
}

/// A student's standing across everything they applied to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    pub badges: Vec<Badge>,
    pub completed_paths: usize,
    pub lessons_completed: usize,
    pub lessons_total: usize,
    /// Lessons completed over lessons available, across applied paths
    pub overall_percent: u8,
    pub paths: Vec<PathStatus>,
}

pub struct Achievements<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: DocumentStore> Achievements<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    pub async fn overview(&self, session: &Session) -> Result<Overview> {
        session.require(Role::Student, "earn achievements")?;

        let learning = Learning::new(self.store, self.clock);
        let mut paths = Vec::new();
        for progress in learning.applied_paths(session).await? {
            match learning.status(session, &progress.path_id).await {
                Ok(status) => paths.push(status),
                // Path deleted after the student applied
                Err(Error::NotFound { .. }) => {
                    tracing::debug!(path = %progress.path_id, "Skipping orphaned progress");
                }
                Err(e) => return Err(e),
            }
        }

        let mut badges = Vec::new();
        let lessons_completed: usize = paths.iter().map(|p| p.lessons_done).sum();
        let lessons_total: usize = paths.iter().map(|p| p.lessons_total).sum();
        if lessons_completed > 0 {
            badges.push(Badge::FirstLesson);
        }

        let mut completed_paths = 0;
        for path in &paths {
            if path.lessons_total > 0 && path.lessons_done == path.lessons_total {
                completed_paths += 1;
                badges.push(Badge::PathFinisher {
                    path_id: path.path_id.clone(),
                    title: path.title.clone(),
                });
            }
            for quiz in path.quizzes.iter().filter(|q| q.state == QuizState::Perfect) {
                badges.push(Badge::QuizAce { quiz_id: quiz.id.clone(), title: quiz.title.clone() });
            }
        }

        let classroom = Classroom::new(self.store, self.clock);
        for attempt in classroom.my_attempts(session).await? {
            if attempt.score == 100 {
                badges.push(Badge::PerfectScore {
                    class_id: attempt.class_id,
                    quiz_id: attempt.quiz_id,
                    title: attempt.quiz_title,
                });
            }
        }

        let overall_percent = if lessons_total == 0 {
            0
        } else {
            ((lessons_completed as f64 / lessons_total as f64) * 100.0).round() as u8
        };

        Ok(Overview { badges, completed_paths, lessons_completed, lessons_total, overall_percent, paths })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::{Choice, Level, Question};
    use crate::service::{Accounts, Catalog, LessonDraft, QuizOutcome};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn question() -> Question {
        Question::new("2 + 2?", vec![Choice::wrong("3"), Choice::correct("4")])
    }

    #[tokio::test]
    async fn overview_collects_badges() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        let accounts = Accounts::new(&store, &clock);
        let catalog = Catalog::new(&store, &clock);
        let learning = Learning::new(&store, &clock);
        let classroom = Classroom::new(&store, &clock);

        let admin = Session::new("root", Role::Admin);
        let prof = accounts.sign_up("Dr. Ames", "ames@uni.edu", Role::Professor).await.unwrap();
        let prof = Session::new(prof.id, prof.role);
        let kid = accounts.sign_up("Lin", "lin@uni.edu", Role::Student).await.unwrap();
        let kid = Session::new(kid.id, kid.role);

        let path = catalog.create_path(&admin, "Math", "Numbers", Level::Beginner).await.unwrap();
        let l1 = catalog.add_lesson(&admin, &path.id, LessonDraft::new("Add", "1+1")).await.unwrap();
        catalog.add_lesson(&admin, &path.id, LessonDraft::new("Sub", "2-1")).await.unwrap();
        let quiz = catalog.add_quiz(&admin, &path.id, &l1.id, None, vec![question()]).await.unwrap();

        learning.apply(&kid, &path.id).await.unwrap();
        learning.complete_lesson(&kid, &path.id, &l1.id).await.unwrap();
        learning.answer(&kid, &path.id, &quiz.id, 0, 1).await.unwrap();

        let class = classroom.create_class(&prof, "Algebra").await.unwrap();
        classroom.join_class(&kid, &class.code).await.unwrap();
        let cq = classroom.add_quiz(&prof, &class.id, "Warmup", vec![question()]).await.unwrap();
        let outcome = classroom.take_quiz(&kid, &class.id, &cq.id, &[1]).await.unwrap();
        assert!(matches!(outcome, QuizOutcome::Scored(_)));

        let overview = Achievements::new(&store, &clock).overview(&kid).await.unwrap();
        assert_eq!(overview.lessons_completed, 1);
        assert_eq!(overview.lessons_total, 2);
        assert_eq!(overview.overall_percent, 50);
        assert_eq!(overview.completed_paths, 0);
        assert_eq!(
            overview.badges,
            vec![
                Badge::FirstLesson,
                Badge::QuizAce { quiz_id: quiz.id.clone(), title: quiz.title.clone() },
                Badge::PerfectScore {
                    class_id: class.id.clone(),
                    quiz_id: cq.id.clone(),
                    title: "Warmup".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn empty_student_has_nothing() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        let kid = Session::new("kid", Role::Student);

        let overview = Achievements::new(&store, &clock).overview(&kid).await.unwrap();
        assert!(overview.badges.is_empty());
        assert_eq!(overview.overall_percent, 0);
    }

    #[tokio::test]
    async fn professors_have_no_overview() {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap());
        let prof = Session::new("p", Role::Professor);
        assert!(Achievements::new(&store, &clock).overview(&prof).await.is_err());
    }
}
