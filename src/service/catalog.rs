//! The learning path catalog: paths, their lessons and quizzes
//!
//! Admins own the catalog. Deleting a path does not cascade; its lessons,
//! quizzes and student progress stay behind as orphans.

use crate::auth::Session;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::{
    LearningPath, Lesson, LessonParent, Level, Question, Quiz, QuizParent, Role, new_id,
    validate_questions,
};
use crate::store::{Direction, DocumentStore, Query, docpath};

use super::LessonDraft;

/// A path with everything a student needs to work through it
#[derive(Debug, Clone, PartialEq)]
pub struct PathContents {
    pub path: LearningPath,
    /// Oldest first
    pub lessons: Vec<Lesson>,
    pub quizzes: Vec<Quiz>,
}

impl PathContents {
    /// Quizzes attached to a lesson
    pub fn quizzes_for(&self, lesson_id: &str) -> impl Iterator<Item = &Quiz> {
        self.quizzes.iter().filter(move |q| {
            matches!(&q.parent, QuizParent::Path { lesson_id: l, .. } if l == lesson_id)
        })
    }

    pub fn lesson(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == lesson_id)
    }

    pub fn quiz(&self, quiz_id: &str) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.id == quiz_id)
    }
}

/// Catalog operations
pub struct Catalog<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: DocumentStore> Catalog<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// All paths, oldest first
    pub async fn list_paths(&self) -> Result<Vec<LearningPath>> {
        let query = Query::new(docpath::paths()).order_by("createdAt", Direction::Ascending);
        self.store.query_as(&query).await
    }

    pub async fn get_path(&self, path_id: &str) -> Result<LearningPath> {
        self.store
            .get_as(&docpath::path(path_id))
            .await?
            .ok_or_else(|| Error::not_found("learning path", path_id))
    }

    /// Path plus its lessons and quizzes
    pub async fn path_contents(&self, path_id: &str) -> Result<PathContents> {
        let path = self.get_path(path_id).await?;
        let lessons = self
            .store
            .query_as(
                &Query::new(docpath::lessons(path_id)).order_by("createdAt", Direction::Ascending),
            )
            .await?;
        let quizzes = self
            .store
            .query_as(
                &Query::new(docpath::quizzes(path_id)).order_by("createdAt", Direction::Ascending),
            )
            .await?;
        Ok(PathContents { path, lessons, quizzes })
    }

    pub async fn get_quiz(&self, path_id: &str, quiz_id: &str) -> Result<Quiz> {
        self.store
            .get_as(&docpath::quiz(path_id, quiz_id))
            .await?
            .ok_or_else(|| Error::not_found("quiz", quiz_id))
    }

    pub async fn get_lesson(&self, path_id: &str, lesson_id: &str) -> Result<Lesson> {
        self.store
            .get_as(&docpath::lesson(path_id, lesson_id))
            .await?
            .ok_or_else(|| Error::not_found("lesson", lesson_id))
    }

    /// Admin: publish a new path
    pub async fn create_path(
        &self,
        session: &Session,
        title: &str,
        description: &str,
        level: Level,
    ) -> Result<LearningPath> {
        session.require(Role::Admin, "create learning paths")?;

        let (title, description) = (title.trim(), description.trim());
        if title.is_empty() || description.is_empty() {
            return Err(Error::Validation("All fields are required".to_string()));
        }

        let path = LearningPath {
            id: new_id(),
            title: title.to_string(),
            description: description.to_string(),
            level,
            created_at: self.clock.now(),
        };
        self.store.set_as(&docpath::path(&path.id), &path).await?;

        tracing::info!(path = %path.id, "Created learning path \"{}\"", path.title);
        Ok(path)
    }

    /// Admin: remove a path. Lessons, quizzes and progress are not touched.
    pub async fn delete_path(&self, session: &Session, path_id: &str) -> Result<()> {
        session.require(Role::Admin, "delete learning paths")?;

        if !self.store.delete(&docpath::path(path_id)).await? {
            return Err(Error::not_found("learning path", path_id));
        }
        tracing::info!(path = %path_id, "Deleted learning path");
        Ok(())
    }

    /// Admin: append a lesson to a path
    pub async fn add_lesson(
        &self,
        session: &Session,
        path_id: &str,
        draft: LessonDraft,
    ) -> Result<Lesson> {
        session.require(Role::Admin, "add lessons to learning paths")?;
        self.get_path(path_id).await?;

        let lesson = draft.into_lesson(
            LessonParent::Path { path_id: path_id.to_string() },
            &session.user_id,
            self.clock.now(),
        );
        lesson.validate().map_err(Error::Validation)?;
        self.store.set_as(&docpath::lesson(path_id, &lesson.id), &lesson).await?;

        tracing::info!(path = %path_id, lesson = %lesson.id, "Added lesson");
        Ok(lesson)
    }

    /// Admin: replace a lesson's title, body and resources
    pub async fn update_lesson(
        &self,
        session: &Session,
        path_id: &str,
        lesson_id: &str,
        draft: LessonDraft,
    ) -> Result<Lesson> {
        session.require(Role::Admin, "edit lessons")?;

        let mut lesson = self.get_lesson(path_id, lesson_id).await?;
        draft.apply_to(&mut lesson);
        lesson.validate().map_err(Error::Validation)?;
        self.store.set_as(&docpath::lesson(path_id, lesson_id), &lesson).await?;

        tracing::info!(path = %path_id, lesson = %lesson_id, "Updated lesson");
        Ok(lesson)
    }

    /// Admin: remove a lesson. Its quizzes stay.
    pub async fn delete_lesson(&self, session: &Session, path_id: &str, lesson_id: &str) -> Result<()> {
        session.require(Role::Admin, "delete lessons")?;

        if !self.store.delete(&docpath::lesson(path_id, lesson_id)).await? {
            return Err(Error::not_found("lesson", lesson_id));
        }
        tracing::info!(path = %path_id, lesson = %lesson_id, "Deleted lesson");
        Ok(())
    }

    /// Admin: attach a quiz to a lesson of the path. Without a title the quiz
    /// is named after the lesson.
    pub async fn add_quiz(
        &self,
        session: &Session,
        path_id: &str,
        lesson_id: &str,
        title: Option<&str>,
        questions: Vec<Question>,
    ) -> Result<Quiz> {
        session.require(Role::Admin, "add quizzes to learning paths")?;
        let lesson = self.get_lesson(path_id, lesson_id).await?;

        let title = match title.map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => format!("Quiz for {}", lesson.title),
        };
        let quiz = Quiz {
            id: new_id(),
            parent: QuizParent::Path { path_id: path_id.to_string(), lesson_id: lesson.id },
            title,
            questions,
            created_by: session.user_id.clone(),
            created_at: self.clock.now(),
        };
        quiz.validate().map_err(Error::Validation)?;
        self.store.set_as(&docpath::quiz(path_id, &quiz.id), &quiz).await?;

        tracing::info!(path = %path_id, quiz = %quiz.id, "Added quiz with {} questions", quiz.len());
        Ok(quiz)
    }

    /// Admin: replace a quiz's title and questions. Recorded answers are kept
    /// and re-evaluated against the new questions on the next read.
    pub async fn update_quiz(
        &self,
        session: &Session,
        path_id: &str,
        quiz_id: &str,
        title: Option<&str>,
        questions: Vec<Question>,
    ) -> Result<Quiz> {
        session.require(Role::Admin, "edit quizzes")?;

        let mut quiz = self.get_quiz(path_id, quiz_id).await?;
        validate_questions(&questions).map_err(Error::Validation)?;
        if let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) {
            quiz.title = title.to_string();
        }
        quiz.questions = questions;
        self.store.set_as(&docpath::quiz(path_id, quiz_id), &quiz).await?;

        tracing::info!(path = %path_id, quiz = %quiz_id, "Updated quiz");
        Ok(quiz)
    }

    pub async fn delete_quiz(&self, session: &Session, path_id: &str, quiz_id: &str) -> Result<()> {
        session.require(Role::Admin, "delete quizzes")?;

        if !self.store.delete(&docpath::quiz(path_id, quiz_id)).await? {
            return Err(Error::not_found("quiz", quiz_id));
        }
        tracing::info!(path = %path_id, quiz = %quiz_id, "Deleted quiz");
        Ok(())
    }
}
