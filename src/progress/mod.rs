//! Learning-path progress tracking
//!
//! [`StudentPathProgress`] holds what a student has done on one path:
//! completed lessons, recorded quiz answers and the heart budget that limits
//! quiz redos. See [`hearts`] for the regeneration rules.

pub mod hearts;
pub mod tracker;

pub use hearts::{HeartState, MAX_HEARTS, REGEN_INTERVAL};
pub use tracker::{QuizAnswers, QuizState, Rejection, StudentPathProgress};
