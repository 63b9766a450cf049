//! Classes, their content and quiz attempts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Lesson, Quiz};

/// Length of a class join code
pub const CODE_LEN: usize = 6;

const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Bytes at or above this are discarded so every character is equally likely
const UNBIASED_LIMIT: u8 = (256 / CODE_ALPHABET.len() * CODE_ALPHABET.len()) as u8;

/// A professor's class stored at `classes/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    #[serde(alias = "className")]
    pub name: String,
    /// Join code students present to enroll
    #[serde(alias = "classCode")]
    pub code: String,
    pub professor_id: String,
    pub professor_name: String,
    /// Enrolled student ids
    #[serde(default)]
    pub students: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Class {
    /// Whether the student is enrolled
    pub fn has_student(&self, student_id: &str) -> bool {
        self.students.iter().any(|s| s == student_id)
    }
}

/// Generate a random join code of [`CODE_LEN`] uppercase base-36 characters
pub fn generate_code() -> String {
    let mut code = String::with_capacity(CODE_LEN);
    while code.len() < CODE_LEN {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        // Bytes 6 and 8 carry the fixed version and variant bits of a v4 uuid
        let random = bytes.iter().enumerate().filter(|(i, _)| *i != 6 && *i != 8);
        for (_, &b) in random {
            if b >= UNBIASED_LIMIT {
                continue;
            }
            code.push(CODE_ALPHABET[b as usize % CODE_ALPHABET.len()] as char);
            if code.len() == CODE_LEN {
                break;
            }
        }
    }
    code
}

/// Normalize a code typed by a student
pub fn normalize_code(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Material a professor posts to a class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClassContent {
    Lesson(Lesson),
    Quiz(Quiz),
}

impl ClassContent {
    pub fn id(&self) -> &str {
        match self {
            Self::Lesson(l) => &l.id,
            Self::Quiz(q) => &q.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Lesson(l) => &l.title,
            Self::Quiz(q) => &q.title,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Lesson(l) => l.created_at,
            Self::Quiz(q) => q.created_at,
        }
    }
}

/// A scored classroom quiz submission at `classes/{class_id}/attempts/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassQuizAttempt {
    pub id: String,
    pub class_id: String,
    pub student_id: String,
    pub student_name: String,
    pub quiz_id: String,
    pub quiz_title: String,
    /// Integer percentage, 0-100
    pub score: u8,
    pub correct: usize,
    pub total: usize,
    pub completed_at: DateTime<Utc>,
}

impl ClassQuizAttempt {
    /// Document id for a student's attempt at a quiz. One per pair, so the
    /// store itself refuses a second attempt under the same key.
    pub fn key(student_id: &str, quiz_id: &str) -> String {
        format!("{}_{}", student_id, quiz_id)
    }
}

/// Score a submission as a rounded percentage of correct answers
pub fn score_percent(correct: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_uses_alphabet() {
        let code = generate_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn generated_codes_cover_whole_alphabet() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..500 {
            seen.extend(generate_code().bytes());
        }
        assert_eq!(seen.len(), CODE_ALPHABET.len());
        assert_eq!(UNBIASED_LIMIT, 252);
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize_code("  ab12cd "), "AB12CD");
    }

    #[test]
    fn score_rounds_to_nearest_percent() {
        assert_eq!(score_percent(2, 3), 67);
        assert_eq!(score_percent(1, 3), 33);
        assert_eq!(score_percent(4, 4), 100);
        assert_eq!(score_percent(0, 0), 0);
    }

    #[test]
    fn attempt_key_joins_student_and_quiz() {
        assert_eq!(ClassQuizAttempt::key("s1", "q9"), "s1_q9");
    }

    #[test]
    fn class_reads_legacy_field_names() {
        let json = r#"{
            "id": "c1",
            "className": "WD-101",
            "classCode": "AB12CD",
            "professorId": "p1",
            "professorName": "Prof",
            "createdAt": "2025-01-01T00:00:00Z"
        }"#;
        let class: Class = serde_json::from_str(json).unwrap();
        assert_eq!(class.name, "WD-101");
        assert_eq!(class.code, "AB12CD");
        assert!(class.students.is_empty());
    }
}
