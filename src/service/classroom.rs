//! Classes: professor-run groups joined by code, with their own lessons and
//! graded quizzes
//!
//! A student gets one scored attempt per class quiz. Attempts are stored
//! under a key derived from the (student, quiz) pair, so the store refuses a
//! second one even if two submissions race past the pre-check.

use serde_json::json;

use crate::auth::Session;
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::class::CODE_LEN;
use crate::model::{
    Class, ClassContent, ClassQuizAttempt, Lesson, LessonParent, Question, Quiz, QuizParent, Role,
    User, generate_code, new_id, normalize_code, score_percent, validate_questions,
};
use crate::store::{Direction, DocumentStore, Query, docpath};

use super::LessonDraft;

/// Attempts at finding an unused join code before giving up
const CODE_RETRIES: usize = 8;

/// What happened when a student submitted a class quiz
#[derive(Debug, Clone, PartialEq)]
pub enum QuizOutcome {
    /// First submission, now stored
    Scored(ClassQuizAttempt),
    /// The student already has an attempt; it is returned unchanged
    AlreadyAttempted(ClassQuizAttempt),
}

impl QuizOutcome {
    pub fn attempt(&self) -> &ClassQuizAttempt {
        match self {
            Self::Scored(a) | Self::AlreadyAttempted(a) => a,
        }
    }
}

/// Class operations
pub struct Classroom<'a, S> {
    store: &'a S,
    clock: &'a dyn Clock,
}

impl<'a, S: DocumentStore> Classroom<'a, S> {
    pub fn new(store: &'a S, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    pub async fn get_class(&self, class_id: &str) -> Result<Class> {
        self.store
            .get_as(&docpath::class(class_id))
            .await?
            .ok_or_else(|| Error::not_found("class", class_id))
    }

    /// The class, if the session is its professor
    async fn owned_class(&self, session: &Session, class_id: &str) -> Result<Class> {
        session.require(Role::Professor, "manage classes")?;
        let class = self.get_class(class_id).await?;
        if class.professor_id != session.user_id {
            return Err(Error::Forbidden("this class belongs to another professor".to_string()));
        }
        Ok(class)
    }

    /// The class, if the session may see its content
    async fn visible_class(&self, session: &Session, class_id: &str) -> Result<Class> {
        let class = self.get_class(class_id).await?;
        let allowed = match session.role {
            Role::Admin => true,
            Role::Professor => class.professor_id == session.user_id,
            Role::Student => class.has_student(&session.user_id),
        };
        if !allowed {
            return Err(Error::Forbidden("you are not part of this class".to_string()));
        }
        Ok(class)
    }

    async fn display_name(&self, user_id: &str, fallback: &str) -> Result<String> {
        let user: Option<User> = self.store.get_as(&docpath::user(user_id)).await?;
        Ok(user.map(|u| u.fullname).filter(|n| !n.is_empty()).unwrap_or_else(|| fallback.into()))
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Class>> {
        let query = Query::new(docpath::classes()).where_eq("code", code);
        Ok(self.store.query_as::<Class>(&query).await?.into_iter().next())
    }

    /// Professor: open a class with a fresh join code
    pub async fn create_class(&self, session: &Session, name: &str) -> Result<Class> {
        session.require(Role::Professor, "create classes")?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Class name is required".to_string()));
        }

        let mut code = None;
        for _ in 0..CODE_RETRIES {
            let candidate = generate_code();
            if self.find_by_code(&candidate).await?.is_none() {
                code = Some(candidate);
                break;
            }
        }
        let code = code.ok_or_else(|| Error::Conflict("Could not allocate a class code".into()))?;

        let class = Class {
            id: new_id(),
            name: name.to_string(),
            code,
            professor_id: session.user_id.clone(),
            professor_name: self.display_name(&session.user_id, "Professor").await?,
            students: Vec::new(),
            created_at: self.clock.now(),
        };
        self.store.set_as(&docpath::class(&class.id), &class).await?;

        tracing::info!(class = %class.id, code = %class.code, "Created class \"{}\"", class.name);
        Ok(class)
    }

    /// Professor: delete a class. Its content and attempts are left behind.
    pub async fn delete_class(&self, session: &Session, class_id: &str) -> Result<()> {
        self.owned_class(session, class_id).await?;
        self.store.delete(&docpath::class(class_id)).await?;
        tracing::info!(class = %class_id, "Deleted class");
        Ok(())
    }

    /// Professor: drop a student from the class roster
    pub async fn remove_student(
        &self,
        session: &Session,
        class_id: &str,
        student_id: &str,
    ) -> Result<()> {
        let class = self.owned_class(session, class_id).await?;
        if !class.has_student(student_id) {
            return Err(Error::not_found("class member", student_id));
        }

        let students: Vec<_> = class.students.into_iter().filter(|s| s != student_id).collect();
        self.store.merge(&docpath::class(class_id), json!({ "students": students })).await?;
        tracing::info!(class = %class_id, student = %student_id, "Removed student");
        Ok(())
    }

    /// Student: join the class with this code. Joining twice is harmless.
    pub async fn join_class(&self, session: &Session, code: &str) -> Result<Class> {
        session.require(Role::Student, "join classes")?;

        let code = normalize_code(code);
        if code.len() != CODE_LEN {
            return Err(Error::Validation("Invalid class code".to_string()));
        }
        let Some(mut class) = self.find_by_code(&code).await? else {
            return Err(Error::Validation("Invalid class code".to_string()));
        };

        if !class.has_student(&session.user_id) {
            class.students.push(session.user_id.clone());
            self.store
                .merge(&docpath::class(&class.id), json!({ "students": class.students }))
                .await?;
            tracing::info!(class = %class.id, student = %session.user_id, "Joined class");
        }
        Ok(class)
    }

    /// Classes the session teaches (professor), attends (student), or all
    /// classes (admin), oldest first
    pub async fn list_classes(&self, session: &Session) -> Result<Vec<Class>> {
        let query = Query::new(docpath::classes()).order_by("createdAt", Direction::Ascending);
        let query = match session.role {
            Role::Professor => query.where_eq("professorId", session.user_id.as_str()),
            Role::Student => query.array_contains("students", session.user_id.as_str()),
            Role::Admin => query,
        };
        self.store.query_as(&query).await
    }

    /// Lessons and quizzes posted to a class, oldest first
    pub async fn class_content(&self, session: &Session, class_id: &str) -> Result<Vec<ClassContent>> {
        self.visible_class(session, class_id).await?;
        let mut items: Vec<ClassContent> =
            self.store.list_as(&docpath::class_content(class_id)).await?;
        items.sort_by_key(ClassContent::created_at);
        Ok(items)
    }

    async fn get_content(&self, class_id: &str, content_id: &str) -> Result<ClassContent> {
        self.store
            .get_as(&docpath::class_item(class_id, content_id))
            .await?
            .ok_or_else(|| Error::not_found("class content", content_id))
    }

    /// A class quiz
    pub async fn get_quiz(&self, class_id: &str, quiz_id: &str) -> Result<Quiz> {
        match self.get_content(class_id, quiz_id).await? {
            ClassContent::Quiz(quiz) => Ok(quiz),
            ClassContent::Lesson(_) => Err(Error::not_found("quiz", quiz_id)),
        }
    }

    /// Professor: post a lesson
    pub async fn add_lesson(
        &self,
        session: &Session,
        class_id: &str,
        draft: LessonDraft,
    ) -> Result<Lesson> {
        self.owned_class(session, class_id).await?;

        let lesson = draft.into_lesson(
            LessonParent::Class { class_id: class_id.to_string() },
            &session.user_id,
            self.clock.now(),
        );
        lesson.validate().map_err(Error::Validation)?;
        let item = ClassContent::Lesson(lesson.clone());
        self.store.set_as(&docpath::class_item(class_id, &lesson.id), &item).await?;

        tracing::info!(class = %class_id, lesson = %lesson.id, "Posted lesson");
        Ok(lesson)
    }

    /// Professor: post a quiz
    pub async fn add_quiz(
        &self,
        session: &Session,
        class_id: &str,
        title: &str,
        questions: Vec<Question>,
    ) -> Result<Quiz> {
        self.owned_class(session, class_id).await?;

        let quiz = Quiz {
            id: new_id(),
            parent: QuizParent::Class { class_id: class_id.to_string() },
            title: title.trim().to_string(),
            questions,
            created_by: session.user_id.clone(),
            created_at: self.clock.now(),
        };
        quiz.validate().map_err(Error::Validation)?;
        let item = ClassContent::Quiz(quiz.clone());
        self.store.set_as(&docpath::class_item(class_id, &quiz.id), &item).await?;

        tracing::info!(class = %class_id, quiz = %quiz.id, "Posted quiz with {} questions", quiz.len());
        Ok(quiz)
    }

    /// Professor: edit a posted lesson
    pub async fn update_lesson(
        &self,
        session: &Session,
        class_id: &str,
        lesson_id: &str,
        draft: LessonDraft,
    ) -> Result<Lesson> {
        self.owned_class(session, class_id).await?;

        let ClassContent::Lesson(mut lesson) = self.get_content(class_id, lesson_id).await? else {
            return Err(Error::not_found("lesson", lesson_id));
        };
        draft.apply_to(&mut lesson);
        lesson.validate().map_err(Error::Validation)?;
        let item = ClassContent::Lesson(lesson.clone());
        self.store.set_as(&docpath::class_item(class_id, lesson_id), &item).await?;

        tracing::info!(class = %class_id, lesson = %lesson_id, "Updated lesson");
        Ok(lesson)
    }

    /// Professor: replace a quiz's questions. Stored attempts keep their
    /// scores.
    pub async fn update_quiz_questions(
        &self,
        session: &Session,
        class_id: &str,
        quiz_id: &str,
        questions: Vec<Question>,
    ) -> Result<Quiz> {
        self.owned_class(session, class_id).await?;

        let mut quiz = self.get_quiz(class_id, quiz_id).await?;
        validate_questions(&questions).map_err(Error::Validation)?;
        quiz.questions = questions;
        let item = ClassContent::Quiz(quiz.clone());
        self.store.set_as(&docpath::class_item(class_id, quiz_id), &item).await?;

        tracing::info!(class = %class_id, quiz = %quiz_id, "Updated quiz");
        Ok(quiz)
    }

    /// Professor: remove a lesson or quiz
    pub async fn delete_content(
        &self,
        session: &Session,
        class_id: &str,
        content_id: &str,
    ) -> Result<()> {
        self.owned_class(session, class_id).await?;
        if !self.store.delete(&docpath::class_item(class_id, content_id)).await? {
            return Err(Error::not_found("class content", content_id));
        }
        tracing::info!(class = %class_id, content = %content_id, "Deleted class content");
        Ok(())
    }

    /// The student's stored attempt at a quiz, if any
    pub async fn previous_attempt(
        &self,
        session: &Session,
        class_id: &str,
        quiz_id: &str,
    ) -> Result<Option<ClassQuizAttempt>> {
        let query = Query::new(docpath::attempts(class_id))
            .where_eq("studentId", session.user_id.as_str())
            .where_eq("quizId", quiz_id)
            .order_by("completedAt", Direction::Ascending);
        Ok(self.store.query_as::<ClassQuizAttempt>(&query).await?.into_iter().next())
    }

    /// Student: submit one choice per question and get scored, unless an
    /// earlier attempt exists
    pub async fn take_quiz(
        &self,
        session: &Session,
        class_id: &str,
        quiz_id: &str,
        answers: &[usize],
    ) -> Result<QuizOutcome> {
        session.require(Role::Student, "take class quizzes")?;
        self.visible_class(session, class_id).await?;
        let quiz = self.get_quiz(class_id, quiz_id).await?;

        if let Some(previous) = self.previous_attempt(session, class_id, quiz_id).await? {
            tracing::warn!(student = %session.user_id, quiz = %quiz_id, "Quiz already attempted");
            return Ok(QuizOutcome::AlreadyAttempted(previous));
        }

        if answers.len() != quiz.len() {
            return Err(Error::Validation(format!(
                "Expected {} answers, got {}",
                quiz.len(),
                answers.len()
            )));
        }
        for (i, (question, &choice)) in quiz.questions.iter().zip(answers).enumerate() {
            if choice >= question.choices.len() {
                return Err(Error::Validation(format!(
                    "Question {} has no choice {}",
                    i + 1,
                    choice + 1
                )));
            }
        }

        let correct =
            quiz.questions.iter().zip(answers).filter(|(q, c)| q.correct_choice() == Some(**c)).count();
        let attempt = ClassQuizAttempt {
            id: ClassQuizAttempt::key(&session.user_id, quiz_id),
            class_id: class_id.to_string(),
            student_id: session.user_id.clone(),
            student_name: self.display_name(&session.user_id, "Student").await?,
            quiz_id: quiz_id.to_string(),
            quiz_title: quiz.title.clone(),
            score: score_percent(correct, quiz.len()),
            correct,
            total: quiz.len(),
            completed_at: self.clock.now(),
        };

        let doc = docpath::attempt(class_id, &attempt.id);
        if !self.store.create_as(&doc, &attempt).await? {
            let stored = self
                .store
                .get_as(&doc)
                .await?
                .ok_or_else(|| Error::Store(format!("attempt {} vanished", attempt.id)))?;
            return Ok(QuizOutcome::AlreadyAttempted(stored));
        }

        tracing::info!(
            student = %session.user_id,
            quiz = %quiz_id,
            score = attempt.score,
            "Quiz attempt recorded"
        );
        Ok(QuizOutcome::Scored(attempt))
    }

    /// Professor: every attempt in the class, oldest first
    pub async fn attempts(&self, session: &Session, class_id: &str) -> Result<Vec<ClassQuizAttempt>> {
        self.owned_class(session, class_id).await?;
        let query =
            Query::new(docpath::attempts(class_id)).order_by("completedAt", Direction::Ascending);
        self.store.query_as(&query).await
    }

    /// Student: own attempts in every existing class, including classes the
    /// student has since been removed from
    pub async fn my_attempts(&self, session: &Session) -> Result<Vec<ClassQuizAttempt>> {
        session.require(Role::Student, "view quiz results")?;

        let classes = Query::new(docpath::classes()).order_by("createdAt", Direction::Ascending);
        let mut all = Vec::new();
        for class in self.store.query_as::<Class>(&classes).await? {
            let query = Query::new(docpath::attempts(&class.id))
                .where_eq("studentId", session.user_id.as_str())
                .order_by("completedAt", Direction::Ascending);
            all.extend(self.store.query_as::<ClassQuizAttempt>(&query).await?);
        }
        Ok(all)
    }
}
