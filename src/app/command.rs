//! Command tree for the `skillpath` binary
//!
//! Positions typed by the user (question numbers, choices) are 1-based and
//! converted before they reach the services.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::model::{Level, Role};

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// student or professor
        #[arg(long, default_value = "student")]
        role: Role,
    },
    /// Sign in by email
    Login { email: String },
    /// Forget the signed-in user
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Learning paths
    #[command(subcommand)]
    Path(PathCommand),
    /// Lessons of a learning path
    #[command(subcommand)]
    Lesson(LessonCommand),
    /// Quizzes of a learning path
    #[command(subcommand)]
    Quiz(QuizCommand),
    /// Progress on one path, or on every applied path
    Status { path: Option<String> },
    /// Classes
    #[command(subcommand)]
    Class(ClassCommand),
    /// Account administration
    #[command(subcommand)]
    Users(UsersCommand),
    /// Badges and overall progress
    Achievements,
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct LessonArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub body: String,
    /// Extra reading as TITLE=URL, repeatable
    #[arg(long = "resource", value_parser = parse_resource)]
    pub resources: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum PathCommand {
    List,
    /// Lessons and quizzes of a path
    Show { path: String },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "beginner")]
        level: Level,
    },
    Delete { path: String },
    /// Start tracking progress on a path
    Apply { path: String },
    LessonAdd {
        path: String,
        #[command(flatten)]
        lesson: LessonArgs,
    },
    QuizAdd {
        path: String,
        lesson: String,
        /// JSON file with the questions
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum LessonCommand {
    Done { path: String, lesson: String },
    Undo { path: String, lesson: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum QuizCommand {
    /// Answer one question: QUESTION and CHOICE count from 1
    Answer { path: String, quiz: String, question: usize, choice: usize },
    /// Spend a heart to retry an imperfect quiz
    Redo { path: String, quiz: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ClassCommand {
    List,
    Create { name: String },
    Join { code: String },
    Delete { class: String },
    /// Remove a student from a class
    Kick { class: String, student: String },
    AddLesson {
        class: String,
        #[command(flatten)]
        lesson: LessonArgs,
    },
    AddQuiz {
        class: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        file: PathBuf,
    },
    /// Class content
    Show { class: String },
    /// Submit a class quiz, one choice per question counting from 1
    Take {
        class: String,
        quiz: String,
        #[arg(required = true)]
        answers: Vec<usize>,
    },
    /// Every attempt in a class
    Grades { class: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum UsersCommand {
    List {
        #[arg(long)]
        role: Option<Role>,
    },
    Rename { user: String, name: String },
    Delete { user: String },
    Promote { user: String },
}

fn parse_resource(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((title, url)) if !title.trim().is_empty() && !url.trim().is_empty() => {
            Ok((title.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(format!("expected TITLE=URL, got {:?}", input)),
    }
}

/// Convert a 1-based position typed by the user
pub fn zero_based(position: usize, what: &str) -> anyhow::Result<usize> {
    position.checked_sub(1).ok_or_else(|| anyhow::anyhow!("{} numbers start at 1", what))
}
