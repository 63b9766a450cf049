//! Operations over the document store, grouped by audience
//!
//! Each service borrows a [`DocumentStore`](crate::store::DocumentStore) and
//! a [`Clock`](crate::clock::Clock) and takes the acting
//! [`Session`](crate::auth::Session) explicitly.

pub mod accounts;
pub mod achievements;
pub mod catalog;
pub mod classroom;
pub mod learning;

use chrono::{DateTime, Utc};

use crate::model::{Lesson, LessonParent, ResourceLink, new_id};

pub use accounts::Accounts;
pub use achievements::{Achievements, Badge, Overview};
pub use catalog::{Catalog, PathContents};
pub use classroom::{Classroom, QuizOutcome};
pub use learning::{Learning, Outcome, PathStatus};

/// Author-supplied lesson fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonDraft {
    pub title: String,
    pub body: String,
    pub resources: Vec<ResourceLink>,
}

impl LessonDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into(), resources: Vec::new() }
    }

    pub fn with_resource(mut self, title: impl Into<String>, url: impl Into<String>) -> Self {
        self.resources.push(ResourceLink { title: title.into(), url: url.into() });
        self
    }

    fn into_lesson(self, parent: LessonParent, author: &str, now: DateTime<Utc>) -> Lesson {
        Lesson {
            id: new_id(),
            parent,
            title: self.title.trim().to_string(),
            body: self.body,
            resources: self.resources,
            created_by: author.to_string(),
            created_at: now,
        }
    }

    fn apply_to(self, lesson: &mut Lesson) {
        lesson.title = self.title.trim().to_string();
        lesson.body = self.body;
        lesson.resources = self.resources;
    }
}
