//! Exported Tree Nodes
//!
//! The materialized result of walking a document tree. Field data is already
//! sanitized; the only store handle left is [`DocumentNode::reference`], kept
//! as a struct field so it can never collide with a field name.

use crate::models::document::DocumentReference;
use crate::sanitize::merge_right;
use serde_json::{Map, Value};

/// Key under which a node's path is rendered
pub const DOCUMENT_PATH_KEY: &str = "documentPath";

/// Key under which a node's id is rendered
pub const ID_KEY: &str = "id";

/// Export of one document and everything beneath it
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    /// Live handle back to the store document
    pub reference: DocumentReference,
    pub document_path: String,
    pub id: String,
    /// Sanitized document data; empty when the document does not exist
    pub fields: Map<String, Value>,
    /// Subcollections in store listing order
    pub collections: Vec<CollectionNode>,
}

impl DocumentNode {
    /// Render as one plain JSON object
    ///
    /// Layout is `documentPath`, `id`, the document's fields, then one key per
    /// subcollection holding the array of exported child documents.
    /// Subcollections are merged over the base object with
    /// [`merge_right`], so a subcollection named like a field (or like
    /// `id`/`documentPath`) replaces it.
    pub fn to_value(&self) -> Value {
        let mut base = Map::new();
        base.insert(
            DOCUMENT_PATH_KEY.to_string(),
            Value::String(self.document_path.clone()),
        );
        base.insert(ID_KEY.to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.fields {
            base.insert(key.clone(), value.clone());
        }

        if self.collections.is_empty() {
            return Value::Object(base);
        }

        let subcollections: Map<String, Value> = self
            .collections
            .iter()
            .map(|collection| (collection.name.clone(), collection.documents_value()))
            .collect();

        merge_right(Value::Object(base), Value::Object(subcollections))
    }

    /// Total number of documents in this subtree, this one included
    pub fn document_count(&self) -> usize {
        1 + self
            .collections
            .iter()
            .map(CollectionNode::document_count)
            .sum::<usize>()
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionNode> {
        self.collections.iter().find(|c| c.name == name)
    }
}

/// Export of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNode {
    /// Collection id (last path segment)
    pub name: String,
    /// Documents in store listing order
    pub documents: Vec<DocumentNode>,
}

impl CollectionNode {
    /// Array of rendered documents
    pub fn documents_value(&self) -> Value {
        Value::Array(self.documents.iter().map(DocumentNode::to_value).collect())
    }

    /// Render as `{name: [documents..]}`
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.name.clone(), self.documents_value());
        Value::Object(map)
    }

    pub fn document_count(&self) -> usize {
        self.documents.iter().map(DocumentNode::document_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(path: &str, fields: Value) -> DocumentNode {
        let reference = DocumentReference::parse(path).unwrap();
        DocumentNode {
            id: reference.id().to_string(),
            document_path: path.to_string(),
            reference,
            fields: fields.as_object().cloned().unwrap_or_default(),
            collections: Vec::new(),
        }
    }

    #[test]
    fn leaf_renders_path_id_and_fields() {
        let node = leaf("c1/d1", json!({"a": 1, "b": "x"}));
        assert_eq!(
            node.to_value(),
            json!({"documentPath": "c1/d1", "id": "d1", "a": 1, "b": "x"})
        );
        assert_eq!(node.document_count(), 1);
    }

    #[test]
    fn subcollection_overrides_same_named_field() {
        let mut node = leaf("c1/d1", json!({"posts": 5, "title": "t"}));
        node.collections.push(CollectionNode {
            name: "posts".to_string(),
            documents: vec![leaf("c1/d1/posts/p1", json!({}))],
        });

        assert_eq!(
            node.to_value(),
            json!({
                "documentPath": "c1/d1",
                "id": "d1",
                "posts": [{"documentPath": "c1/d1/posts/p1", "id": "p1"}],
                "title": "t",
            })
        );
        assert_eq!(node.document_count(), 2);
        assert!(node.collection("posts").is_some());
    }

    #[test]
    fn collection_renders_single_key() {
        let collection = CollectionNode {
            name: "c1".to_string(),
            documents: vec![leaf("c1/d1", json!({})), leaf("c1/d2", json!({}))],
        };

        assert_eq!(
            collection.to_value(),
            json!({"c1": [
                {"documentPath": "c1/d1", "id": "d1"},
                {"documentPath": "c1/d2", "id": "d2"},
            ]})
        );
    }
}
