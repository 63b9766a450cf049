//! Learning paths and their lessons

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Difficulty of a learning path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        };
        f.write_str(name)
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => {
                Err(format!("Unknown level: {}. Options: beginner, intermediate, advanced", other))
            }
        }
    }
}

/// A self-paced curriculum unit stored at `content/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub level: Level,
    pub created_at: DateTime<Utc>,
}

/// An external reading attached to a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
}

/// Where a lesson lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LessonParent {
    /// `content/{path_id}/lessons/{id}`
    #[serde(rename_all = "camelCase")]
    Path { path_id: String },
    /// `classes/{class_id}/content/{id}`
    #[serde(rename_all = "camelCase")]
    Class { class_id: String },
}

/// A unit of reading content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub parent: LessonParent,
    pub title: String,
    /// Free-text lesson body
    #[serde(default)]
    pub body: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<ResourceLink>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Lesson {
    /// Path this lesson belongs to, if it is part of a learning path
    pub fn path_id(&self) -> Option<&str> {
        match &self.parent {
            LessonParent::Path { path_id } => Some(path_id),
            LessonParent::Class { .. } => None,
        }
    }

    /// Reject lessons that cannot be shown meaningfully
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Lesson title is required".to_string());
        }
        if let Some(link) = self.resources.iter().find(|r| r.url.trim().is_empty()) {
            return Err(format!("Resource \"{}\" has no URL", link.title));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(title: &str) -> Lesson {
        Lesson {
            id: "l1".into(),
            parent: LessonParent::Path { path_id: "p1".into() },
            title: title.into(),
            body: String::new(),
            resources: Vec::new(),
            created_by: "admin".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn level_round_trips_through_display() {
        for level in [Level::Beginner, Level::Intermediate, Level::Advanced] {
            assert_eq!(level.to_string().parse::<Level>(), Ok(level));
        }
    }

    #[test]
    fn lesson_parent_is_tagged() {
        let json = serde_json::to_value(lesson("Intro")).unwrap();
        assert_eq!(json["parent"]["kind"], "path");
        assert_eq!(json["parent"]["pathId"], "p1");
    }

    #[test]
    fn lesson_requires_title() {
        assert!(lesson("  ").validate().is_err());
        assert!(lesson("Intro").validate().is_ok());
    }

    #[test]
    fn lesson_rejects_resource_without_url() {
        let mut l = lesson("Intro");
        l.resources.push(ResourceLink { title: "MDN".into(), url: "".into() });
        assert_eq!(l.validate(), Err("Resource \"MDN\" has no URL".to_string()));
    }
}
