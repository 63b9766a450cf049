//! Slash-separated document and collection paths
//!
//! Paths alternate collection and document segments, so a path with an odd
//! number of segments names a collection (`classes/c1/attempts`) and one
//! with an even number names a document (`classes/c1/attempts/a1`).

use std::fmt;

/// A validated store path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    /// Build a path from segments. Segments are escaped so that no two
    /// distinct segments map to the same path.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| sanitize(s.as_ref()))
            .collect::<Vec<_>>()
            .join("/");
        Self(joined)
    }

    /// Append a segment
    pub fn join(&self, segment: &str) -> Self {
        Self(format!("{}/{}", self.0, sanitize(segment)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn is_document(&self) -> bool {
        self.segments().count() % 2 == 0
    }

    /// Last segment (the document id for document paths)
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Collection containing this document
    pub fn parent(&self) -> Option<DocPath> {
        self.0.rsplit_once('/').map(|(parent, _)| DocPath(parent.to_string()))
    }

    /// Whether `doc` is a direct child document of this collection
    pub fn contains_child(&self, doc: &DocPath) -> bool {
        doc.parent().is_some_and(|p| p == *self)
    }
}

/// Percent-escape `%` and `/`. An empty segment becomes a bare `%`, which
/// no escaped non-empty segment can produce.
fn sanitize(segment: &str) -> String {
    if segment.is_empty() {
        return "%".to_string();
    }
    let mut escaped = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `users`
pub fn users() -> DocPath {
    DocPath::new(["users"])
}

/// `users/{user_id}`
pub fn user(user_id: &str) -> DocPath {
    users().join(user_id)
}

/// `users/{user_id}/userPaths`
pub fn user_paths(user_id: &str) -> DocPath {
    user(user_id).join("userPaths")
}

/// `users/{user_id}/userPaths/{path_id}`
pub fn user_path(user_id: &str, path_id: &str) -> DocPath {
    user_paths(user_id).join(path_id)
}

/// `content`: the learning path catalog
pub fn paths() -> DocPath {
    DocPath::new(["content"])
}

/// `content/{path_id}`
pub fn path(path_id: &str) -> DocPath {
    paths().join(path_id)
}

/// `content/{path_id}/lessons`
pub fn lessons(path_id: &str) -> DocPath {
    path(path_id).join("lessons")
}

/// `content/{path_id}/lessons/{lesson_id}`
pub fn lesson(path_id: &str, lesson_id: &str) -> DocPath {
    lessons(path_id).join(lesson_id)
}

/// `content/{path_id}/quizzes`
pub fn quizzes(path_id: &str) -> DocPath {
    path(path_id).join("quizzes")
}

/// `content/{path_id}/quizzes/{quiz_id}`
pub fn quiz(path_id: &str, quiz_id: &str) -> DocPath {
    quizzes(path_id).join(quiz_id)
}

/// `classes`
pub fn classes() -> DocPath {
    DocPath::new(["classes"])
}

/// `classes/{class_id}`
pub fn class(class_id: &str) -> DocPath {
    classes().join(class_id)
}

/// `classes/{class_id}/content`
pub fn class_content(class_id: &str) -> DocPath {
    class(class_id).join("content")
}

/// `classes/{class_id}/content/{content_id}`
pub fn class_item(class_id: &str, content_id: &str) -> DocPath {
    class_content(class_id).join(content_id)
}

/// `classes/{class_id}/attempts`
pub fn attempts(class_id: &str) -> DocPath {
    class(class_id).join("attempts")
}

/// `classes/{class_id}/attempts/{attempt_id}`
pub fn attempt(class_id: &str, attempt_id: &str) -> DocPath {
    attempts(class_id).join(attempt_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_paths() {
        assert_eq!(user_path("u1", "p1").as_str(), "users/u1/userPaths/p1");
        assert_eq!(lesson("p1", "l1").as_str(), "content/p1/lessons/l1");
        assert_eq!(attempt("c1", "a1").as_str(), "classes/c1/attempts/a1");
    }

    #[test]
    fn document_and_collection_parity() {
        assert!(class("c1").is_document());
        assert!(!attempts("c1").is_document());
    }

    #[test]
    fn parent_and_id() {
        let doc = quiz("p1", "q1");
        assert_eq!(doc.id(), "q1");
        assert_eq!(doc.parent(), Some(quizzes("p1")));
        assert!(quizzes("p1").contains_child(&doc));
        assert!(!paths().contains_child(&doc));
    }

    #[test]
    fn slashes_in_ids_cannot_escape_segment() {
        assert_eq!(user("a/b").as_str(), "users/a%2Fb");
        assert_eq!(user("a/b").segments().count(), 2);
        assert_eq!(user("").as_str(), "users/%");
    }

    #[test]
    fn distinct_ids_never_share_a_path() {
        let ids = ["a/b", "a_b", "a%2Fb", "a%b", "", "%", "_"];
        for (i, x) in ids.iter().enumerate() {
            for y in &ids[i + 1..] {
                assert_ne!(user(x), user(y), "{:?} and {:?} collided", x, y);
            }
        }
    }
}
