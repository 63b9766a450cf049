//! Plain-text rendering of service results for the terminal

use std::fmt::Write;

use crate::model::{Class, ClassContent, ClassQuizAttempt, LearningPath, Lesson, Quiz, User};
use crate::progress::{MAX_HEARTS, QuizState};
use crate::service::{Overview, PathContents, PathStatus};

pub fn user(user: &User) -> String {
    format!("{} <{}> [{}] id={}", user.fullname, user.email, user.role, user.id)
}

pub fn users(users: &[User]) -> String {
    if users.is_empty() {
        return "No users.".to_string();
    }
    users.iter().map(user).collect::<Vec<_>>().join("\n")
}

pub fn paths(paths: &[LearningPath]) -> String {
    if paths.is_empty() {
        return "No learning paths yet.".to_string();
    }
    paths
        .iter()
        .map(|p| format!("{}  {} ({})\n    {}", p.id, p.title, p.level, p.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn lesson(out: &mut String, lesson: &Lesson, width: usize) {
    let _ = writeln!(out, "## {}  [{}]", lesson.title, lesson.id);
    if !lesson.body.is_empty() {
        let _ = writeln!(out, "{}", textwrap::fill(&lesson.body, width));
    }
    for link in &lesson.resources {
        let _ = writeln!(out, "  - {}: {}", link.title, link.url);
    }
}

fn quiz(out: &mut String, quiz: &Quiz, width: usize) {
    let _ = writeln!(out, "### {}  [{}]", quiz.title, quiz.id);
    for (i, q) in quiz.questions.iter().enumerate() {
        let prompt = format!("{}. {}", i + 1, q.question);
        let _ = writeln!(out, "{}", textwrap::fill(&prompt, width));
        for (j, choice) in q.choices.iter().enumerate() {
            let _ = writeln!(out, "   {}) {}", j + 1, choice.text);
        }
    }
}

pub fn path_contents(contents: &PathContents, width: usize) -> String {
    let mut out = String::new();
    let path = &contents.path;
    let _ = writeln!(out, "# {} ({})", path.title, path.level);
    let _ = writeln!(out, "{}\n", textwrap::fill(&path.description, width));

    for l in &contents.lessons {
        lesson(&mut out, l, width);
        for q in contents.quizzes_for(&l.id) {
            quiz(&mut out, q, width);
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn hearts(count: u8) -> String {
    let full = count.min(MAX_HEARTS) as usize;
    format!("{}{}", "♥".repeat(full), "♡".repeat(MAX_HEARTS as usize - full))
}

pub fn quiz_state(state: &QuizState) -> String {
    match state {
        QuizState::NotStarted => "not started".to_string(),
        QuizState::InProgress { answered, total } => format!("{}/{} answered", answered, total),
        QuizState::Perfect => "perfect".to_string(),
        QuizState::Imperfect { correct, total } => {
            format!("{}/{} correct, redo available", correct, total)
        }
    }
}

pub fn status(status: &PathStatus) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{}: {}/{} lessons ({}%)",
        status.title, status.lessons_done, status.lessons_total, status.percent
    );
    let _ = write!(out, "Hearts: {}", hearts(status.hearts));
    if let Some(countdown) = &status.countdown {
        let _ = write!(out, "  refill in {}", countdown);
    }
    out.push('\n');
    for q in &status.quizzes {
        let _ = writeln!(out, "  {}  {}: {}", q.id, q.title, quiz_state(&q.state));
    }
    out.trim_end().to_string()
}

pub fn classes(classes: &[Class]) -> String {
    if classes.is_empty() {
        return "No classes.".to_string();
    }
    classes
        .iter()
        .map(|c| {
            format!(
                "{}  {} by {}  code {}  ({} students)",
                c.id,
                c.name,
                c.professor_name,
                c.code,
                c.students.len()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn class_content(class: &Class, items: &[ClassContent], width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} (code {})\n", class.name, class.code);
    if items.is_empty() {
        out.push_str("Nothing posted yet.");
        return out;
    }
    for item in items {
        match item {
            ClassContent::Lesson(l) => lesson(&mut out, l, width),
            ClassContent::Quiz(q) => quiz(&mut out, q, width),
        }
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub fn attempt(attempt: &ClassQuizAttempt) -> String {
    format!(
        "{}: {}% ({}/{}) on {}",
        attempt.quiz_title,
        attempt.score,
        attempt.correct,
        attempt.total,
        attempt.completed_at.format("%Y-%m-%d %H:%M")
    )
}

pub fn grades(attempts: &[ClassQuizAttempt]) -> String {
    if attempts.is_empty() {
        return "No attempts yet.".to_string();
    }
    attempts
        .iter()
        .map(|a| format!("{}  {}", a.student_name, attempt(a)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn overview(overview: &Overview) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} badges, {} paths completed, {}/{} lessons ({}%)",
        overview.badges.len(),
        overview.completed_paths,
        overview.lessons_completed,
        overview.lessons_total,
        overview.overall_percent
    );
    for badge in &overview.badges {
        let _ = writeln!(out, "  * {}", badge);
    }
    for path in &overview.paths {
        let _ = writeln!(out, "  {}: {}%", path.title, path.percent);
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hearts_show_spent_slots() {
        assert_eq!(hearts(5), "♥♥♥♥♥");
        assert_eq!(hearts(2), "♥♥♡♡♡");
        assert_eq!(hearts(0), "♡♡♡♡♡");
    }

    #[test]
    fn quiz_states_read_naturally() {
        assert_eq!(quiz_state(&QuizState::InProgress { answered: 1, total: 3 }), "1/3 answered");
        assert_eq!(
            quiz_state(&QuizState::Imperfect { correct: 2, total: 3 }),
            "2/3 correct, redo available"
        );
    }

    #[test]
    fn status_includes_countdown() {
        let web = PathStatus {
            path_id: "p1".into(),
            title: "Web Dev".into(),
            lessons_done: 1,
            lessons_total: 4,
            percent: 25,
            hearts: 4,
            countdown: Some("02:59:00".into()),
            next_refill: None,
            quizzes: Vec::new(),
        };
        assert_eq!(status(&web), "Web Dev: 1/4 lessons (25%)\nHearts: ♥♥♥♥♡  refill in 02:59:00");
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(paths(&[]), "No learning paths yet.");
        assert_eq!(grades(&[]), "No attempts yet.");
    }
}
