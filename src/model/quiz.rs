//! Multiple-choice quizzes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One selectable answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Choice {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

impl Choice {
    /// A choice marked correct
    pub fn correct(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_correct: true }
    }

    /// A choice marked incorrect
    pub fn wrong(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_correct: false }
    }
}

/// A question with its ordered choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(alias = "questionText")]
    pub question: String,
    pub choices: Vec<Choice>,
}

impl Question {
    pub fn new(question: impl Into<String>, choices: Vec<Choice>) -> Self {
        Self { question: question.into(), choices }
    }

    /// Index of the first choice marked correct
    pub fn correct_choice(&self) -> Option<usize> {
        self.choices.iter().position(|c| c.is_correct)
    }

    /// Whether `choice` is in range and marked correct
    pub fn is_correct(&self, choice: usize) -> bool {
        self.choices.get(choice).is_some_and(|c| c.is_correct)
    }
}

/// Where a quiz is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuizParent {
    /// Path quiz following a lesson, at `content/{path_id}/quizzes/{id}`
    #[serde(rename_all = "camelCase")]
    Path { path_id: String, lesson_id: String },
    /// Classroom quiz at `classes/{class_id}/content/{id}`
    #[serde(rename_all = "camelCase")]
    Class { class_id: String },
}

/// An ordered list of questions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub parent: QuizParent,
    pub title: String,
    pub questions: Vec<Question>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    /// Number of questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the quiz has no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Check the authoring rules: a title, at least one question, and every
    /// question offering two or more choices with exactly one marked correct
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("Quiz title is required".to_string());
        }
        validate_questions(&self.questions)
    }
}

/// Authoring rules for a question list, shared by create and edit
pub fn validate_questions(questions: &[Question]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("A quiz needs at least one question".to_string());
    }

    for (i, q) in questions.iter().enumerate() {
        let number = i + 1;
        if q.question.trim().is_empty() {
            return Err(format!("Question {} has no text", number));
        }
        if q.choices.len() < 2 {
            return Err(format!("Question {} needs at least two choices", number));
        }
        if q.choices.iter().any(|c| c.text.trim().is_empty()) {
            return Err(format!("Question {} has an empty choice", number));
        }
        match q.choices.iter().filter(|c| c.is_correct).count() {
            1 => {}
            0 => return Err(format!("Question {} has no correct choice", number)),
            _ => return Err(format!("Question {} has more than one correct choice", number)),
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// A path quiz where question `i` has `correct[i]` as its right answer
    /// among three choices
    pub fn quiz_with_answers(id: &str, correct: &[usize]) -> Quiz {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, &right)| {
                let choices = (0..3)
                    .map(|c| Choice { text: format!("option {}", c), is_correct: c == right })
                    .collect();
                Question::new(format!("question {}", i), choices)
            })
            .collect();

        Quiz {
            id: id.to_string(),
            parent: QuizParent::Path { path_id: "p1".into(), lesson_id: "l2".into() },
            title: format!("Quiz {}", id),
            questions,
            created_by: "admin".into(),
            created_at: Utc::now(),
        }
    }
}
