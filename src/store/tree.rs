//! Flat map of document path to document body, shared by the backends

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DocPath, Document, Query};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Tree {
    docs: BTreeMap<String, Value>,
}

impl Tree {
    pub fn get(&self, path: &DocPath) -> Option<Value> {
        self.docs.get(path.as_str()).cloned()
    }

    pub fn set(&mut self, path: &DocPath, data: Value) -> Result<()> {
        ensure_document(path)?;
        ensure_object(&data)?;
        self.docs.insert(path.to_string(), data);
        Ok(())
    }

    pub fn create(&mut self, path: &DocPath, data: Value) -> Result<bool> {
        if self.docs.contains_key(path.as_str()) {
            return Ok(false);
        }
        self.set(path, data)?;
        Ok(true)
    }

    pub fn merge(&mut self, path: &DocPath, fields: Value) -> Result<()> {
        ensure_document(path)?;
        let Value::Object(fields) = fields else {
            return Err(Error::Store(format!("merge into {} needs an object", path)));
        };

        match self.docs.get_mut(path.as_str()) {
            Some(Value::Object(existing)) => existing.extend(fields),
            _ => {
                self.docs.insert(path.to_string(), Value::Object(fields));
            }
        }
        Ok(())
    }

    pub fn delete(&mut self, path: &DocPath) -> bool {
        self.docs.remove(path.as_str()).is_some()
    }

    pub fn list(&self, collection: &DocPath) -> Vec<Document> {
        let prefix = format!("{}/", collection);
        self.docs
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(key, data)| Document { path: DocPath::new(key.split('/')), data: data.clone() })
            .filter(|doc| collection.contains_child(&doc.path))
            .collect()
    }

    pub fn query(&self, query: &Query) -> Vec<Document> {
        let mut docs: Vec<_> =
            self.list(&query.collection).into_iter().filter(|d| query.matches(&d.data)).collect();
        query.sort(&mut docs);
        docs
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }
}

fn ensure_document(path: &DocPath) -> Result<()> {
    if path.is_document() {
        Ok(())
    } else {
        Err(Error::Store(format!("{} is a collection, not a document", path)))
    }
}

fn ensure_object(data: &Value) -> Result<()> {
    if data.is_object() {
        Ok(())
    } else {
        Err(Error::Store("documents must be JSON objects".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Direction, docpath};
    use serde_json::json;

    #[test]
    fn list_returns_direct_children_only() {
        let mut tree = Tree::default();
        tree.set(&docpath::class("c1"), json!({"name": "A"})).unwrap();
        tree.set(&docpath::attempt("c1", "a1"), json!({"score": 10})).unwrap();
        tree.set(&docpath::class("c2"), json!({"name": "B"})).unwrap();

        let ids: Vec<_> =
            tree.list(&docpath::classes()).iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert_eq!(tree.list(&docpath::attempts("c1")).len(), 1);
    }

    #[test]
    fn merge_overwrites_top_level_fields_only() {
        let mut tree = Tree::default();
        let path = docpath::user("u1");
        tree.set(&path, json!({"fullname": "Ana", "role": "student"})).unwrap();
        tree.merge(&path, json!({"role": "admin"})).unwrap();
        assert_eq!(tree.get(&path), Some(json!({"fullname": "Ana", "role": "admin"})));
    }

    #[test]
    fn merge_creates_missing_document() {
        let mut tree = Tree::default();
        let path = docpath::user("u1");
        tree.merge(&path, json!({"fullname": "Ana"})).unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn create_refuses_existing_document() {
        let mut tree = Tree::default();
        let path = docpath::attempt("c1", "s1_q1");
        assert!(tree.create(&path, json!({"score": 100})).unwrap());
        assert!(!tree.create(&path, json!({"score": 0})).unwrap());
        assert_eq!(tree.get(&path), Some(json!({"score": 100})));
    }

    #[test]
    fn writing_to_collection_path_fails() {
        let mut tree = Tree::default();
        assert!(tree.set(&docpath::classes(), json!({})).is_err());
        assert!(tree.set(&docpath::class("c1"), json!([1, 2])).is_err());
    }

    #[test]
    fn query_filters_then_orders() {
        let mut tree = Tree::default();
        for (id, prof, at) in [
            ("c1", "p1", "2025-01-03T00:00:00Z"),
            ("c2", "p2", "2025-01-01T00:00:00Z"),
            ("c3", "p1", "2025-01-02T00:00:00Z"),
        ] {
            tree.set(&docpath::class(id), json!({"professorId": prof, "createdAt": at})).unwrap();
        }

        let query = Query::new(docpath::classes())
            .where_eq("professorId", "p1")
            .order_by("createdAt", Direction::Ascending);
        let ids: Vec<_> = tree.query(&query).iter().map(|d| d.id().to_string()).collect();
        assert_eq!(ids, vec!["c3", "c1"]);
    }
}
