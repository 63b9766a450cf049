//! Document store abstraction
//!
//! All durable state lives in a document store addressed by [`DocPath`].
//! The store offers point reads, whole-document and merge writes, deletes,
//! and equality / array-membership queries with optional ordering. Writes
//! are last-write-wins; there are no transactions.

pub mod docpath;
pub mod file;
pub mod memory;
mod tree;

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use docpath::DocPath;
pub use file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{Error, Result};

/// A document read back from a collection
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub data: Value,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }
}

/// Predicate on a document field. Field names may be dotted
/// (`parent.pathId`) to reach into nested objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value
    Eq(String, Value),
    /// Field is an array containing the value
    ArrayContains(String, Value),
}

impl Filter {
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq(field, expected) => lookup(doc, field) == Some(expected),
            Filter::ArrayContains(field, expected) => lookup(doc, field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(expected)),
        }
    }
}

/// Sort direction for [`Query::order_by`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// A filtered, optionally ordered read over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: DocPath,
    pub filters: Vec<Filter>,
    pub order: Option<(String, Direction)>,
}

impl Query {
    pub fn new(collection: DocPath) -> Self {
        Self { collection, filters: Vec::new(), order: None }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    pub fn array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::ArrayContains(field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order = Some((field.to_string(), direction));
        self
    }

    /// Whether a document in the queried collection passes every filter
    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(doc))
    }

    /// Apply the requested ordering. Documents missing the field sort first.
    pub fn sort(&self, docs: &mut [Document]) {
        let Some((field, direction)) = &self.order else {
            return;
        };
        docs.sort_by(|a, b| {
            let ord = compare_values(lookup(&a.data, field), lookup(&b.data, field));
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

/// Resolve a dotted field name inside a JSON document
fn lookup<'a>(doc: &'a Value, field: &str) -> Option<&'a Value> {
    field.split('.').try_fold(doc, |value, key| value.get(key))
}

/// Total order over the scalar values used for sorting. Timestamps are
/// compared as instants, not as strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// Storage backend for SkillPath documents
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Read a document
    async fn get(&self, path: &DocPath) -> Result<Option<Value>>;

    /// Create or replace a document
    async fn set(&self, path: &DocPath, data: Value) -> Result<()>;

    /// Create a document only if none exists. Returns false if it existed.
    async fn create(&self, path: &DocPath, data: Value) -> Result<bool>;

    /// Overwrite the given top-level fields, creating the document if absent
    async fn merge(&self, path: &DocPath, fields: Value) -> Result<()>;

    /// Delete a document. Sub-collections are left in place.
    async fn delete(&self, path: &DocPath) -> Result<bool>;

    /// All direct child documents of a collection
    async fn list(&self, collection: &DocPath) -> Result<Vec<Document>>;

    /// Documents of a collection passing the query's filters, in its order
    async fn query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Read and deserialize a document
    async fn get_as<T: DeserializeOwned>(&self, path: &DocPath) -> Result<Option<T>> {
        match self.get(path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serialize and write a whole document
    async fn set_as<T: Serialize>(&self, path: &DocPath, record: &T) -> Result<()> {
        self.set(path, serde_json::to_value(record)?).await
    }

    /// Serialize and create a document if absent
    async fn create_as<T: Serialize>(&self, path: &DocPath, record: &T) -> Result<bool> {
        self.create(path, serde_json::to_value(record)?).await
    }

    /// Deserialize every child of a collection
    async fn list_as<T: DeserializeOwned>(&self, collection: &DocPath) -> Result<Vec<T>> {
        let docs = self.list(collection).await?;
        docs.into_iter().map(|d| serde_json::from_value(d.data).map_err(Error::from)).collect()
    }

    /// Run a query and deserialize the results
    async fn query_as<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>> {
        let docs = self.query(query).await?;
        docs.into_iter().map(|d| serde_json::from_value(d.data).map_err(Error::from)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, data: Value) -> Document {
        Document { path: docpath::classes().join(id), data }
    }

    #[test]
    fn eq_filter_reaches_nested_fields() {
        let filter = Filter::Eq("parent.pathId".into(), json!("p1"));
        assert!(filter.matches(&json!({"parent": {"pathId": "p1"}})));
        assert!(!filter.matches(&json!({"parent": {"pathId": "p2"}})));
        assert!(!filter.matches(&json!({})));
    }

    #[test]
    fn array_contains_requires_array() {
        let filter = Filter::ArrayContains("students".into(), json!("s1"));
        assert!(filter.matches(&json!({"students": ["s0", "s1"]})));
        assert!(!filter.matches(&json!({"students": "s1"})));
    }

    #[test]
    fn sort_orders_timestamps_as_instants() {
        let query = Query::new(docpath::classes()).order_by("createdAt", Direction::Ascending);
        let mut docs = vec![
            doc("b", json!({"createdAt": "2025-01-01T00:00:01Z"})),
            doc("a", json!({"createdAt": "2025-01-01T00:00:00.500Z"})),
            doc("c", json!({})),
        ];
        query.sort(&mut docs);
        let ids: Vec<_> = docs.iter().map(Document::id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn sort_descending_numbers() {
        let query = Query::new(docpath::classes()).order_by("score", Direction::Descending);
        let mut docs = vec![doc("a", json!({"score": 50})), doc("b", json!({"score": 100}))];
        query.sort(&mut docs);
        assert_eq!(docs[0].id(), "b");
    }
}
