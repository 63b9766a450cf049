//! SkillPath - a learning management system
//!
//! Self-paced learning paths with lesson tracking and heart-limited quiz
//! retries, professor-run classes with single-attempt graded quizzes, and
//! role-gated administration, all over a small document store.

pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod progress;
pub mod service;
pub mod store;

pub use app::App;
pub use auth::Session;
pub use config::Config;
pub use error::{Error, Result};
