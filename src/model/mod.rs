//! Records persisted in the document store
//!
//! Every type here is a plain serde record. Field names are camelCase on the
//! wire so that store queries can filter on them by name.

pub mod class;
pub mod path;
pub mod quiz;
pub mod user;

pub use class::{Class, ClassContent, ClassQuizAttempt, generate_code, normalize_code, score_percent};
pub use path::{LearningPath, Lesson, LessonParent, Level, ResourceLink};
pub use quiz::{Choice, Question, Quiz, QuizParent, validate_questions};
pub use user::{Role, User};

/// Generate a fresh document identifier
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
