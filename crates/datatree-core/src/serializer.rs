//! JSON form of a tree
//!
//! Every node serializes to an object with three members:
//!
//! ```json
//! {
//!   "type": "Settings",
//!   "properties": { "volume": { "type": "int", "value": 11 } },
//!   "children": [ { "type": "Channel", "properties": {}, "children": [] } ]
//! }
//! ```
//!
//! Property values keep their variant tag (see [`Value`]), and properties
//! keep their insertion order, so a round trip yields an equivalent tree.
//! Deserialized trees are built directly: no transactions run and no
//! listeners exist yet to be notified.

use std::time::Instant;

use serde_json::{Map, Value as Json};

use crate::errors::{DataTreeError, Result};
use crate::identifier::Identifier;
use crate::tree::DataTree;
use crate::value::Value;
use crate::{log_op_end, log_op_error, log_op_start};

const FIELD_TYPE: &str = "type";
const FIELD_PROPERTIES: &str = "properties";
const FIELD_CHILDREN: &str = "children";

impl DataTree {
    /// Serialize this subtree; the invalid sentinel serializes as `null`
    pub fn create_json(&self) -> Json {
        if !self.is_valid() {
            return Json::Null;
        }

        let mut properties = Map::new();
        for (key, value) in self.properties() {
            properties.insert(key.to_string(), value_to_json(&value));
        }
        let children: Vec<Json> = self.children().iter().map(DataTree::create_json).collect();

        let mut node = Map::new();
        node.insert(FIELD_TYPE.to_string(), Json::String(self.get_type().to_string()));
        node.insert(FIELD_PROPERTIES.to_string(), Json::Object(properties));
        node.insert(FIELD_CHILDREN.to_string(), Json::Array(children));
        Json::Object(node)
    }

    /// Rebuild a detached tree from [`DataTree::create_json`] output
    ///
    /// Missing `properties` or `children` members are treated as empty.
    ///
    /// # Errors
    /// * `InvalidJson` - If any node is not an object, lacks a valid
    ///   `type`, has a non-object `properties` or non-array `children`, or
    ///   holds a property that is not a tagged value
    pub fn from_json(json: &Json) -> Result<DataTree> {
        let op = "from_json";
        log_op_start!(op);
        let start = Instant::now();

        let tree = node_from_json(json, "$").map_err(|e| {
            log_op_error!(op, e.clone(), duration_ms = start.elapsed().as_millis() as u64);
            e
        })?;

        log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            node_type = %tree.get_type()
        );
        Ok(tree)
    }

    /// Serialize to a JSON string
    ///
    /// # Errors
    /// * `Serialization` - If serde_json fails to write the document
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.create_json())?)
    }

    /// As [`DataTree::to_json_string`], indented for humans
    ///
    /// # Errors
    /// * `Serialization` - If serde_json fails to write the document
    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.create_json())?)
    }

    /// Parse a JSON string and rebuild the tree it describes
    ///
    /// # Errors
    /// * `Serialization` - If `text` is not JSON
    /// * `InvalidJson` - As [`DataTree::from_json`]
    pub fn from_json_str(text: &str) -> Result<DataTree> {
        let json: Json = serde_json::from_str(text)?;
        DataTree::from_json(&json)
    }
}

fn value_to_json(value: &Value) -> Json {
    // Value's derived Serialize cannot fail: keys are static and bytes are
    // base64 strings.
    serde_json::to_value(value).unwrap_or(Json::Null)
}

fn invalid(path: &str, reason: impl std::fmt::Display) -> DataTreeError {
    DataTreeError::InvalidJson {
        reason: format!("{}: {}", path, reason),
    }
}

fn node_from_json(json: &Json, path: &str) -> Result<DataTree> {
    let node = json
        .as_object()
        .ok_or_else(|| invalid(path, "expected an object"))?;

    let node_type = node
        .get(FIELD_TYPE)
        .and_then(Json::as_str)
        .ok_or_else(|| invalid(path, "missing string 'type'"))?;
    let node_type = Identifier::new(node_type).map_err(|e| invalid(path, e))?;

    let tree = DataTree::new(node_type);
    let mut properties = crate::tree::PropertyMap::default();
    match node.get(FIELD_PROPERTIES) {
        None | Some(Json::Null) => {}
        Some(Json::Object(entries)) => {
            for (key, raw) in entries {
                let key_id = Identifier::new(key).map_err(|e| invalid(path, e))?;
                let value: Value = serde_json::from_value(raw.clone())
                    .map_err(|e| invalid(path, format!("property '{}': {}", key, e)))?;
                properties.set(key_id, value);
            }
        }
        Some(_) => return Err(invalid(path, "'properties' must be an object")),
    }

    let mut children = Vec::new();
    match node.get(FIELD_CHILDREN) {
        None | Some(Json::Null) => {}
        Some(Json::Array(items)) => {
            for (index, item) in items.iter().enumerate() {
                let child_path = format!("{}.children[{}]", path, index);
                children.push(node_from_json(item, &child_path)?);
            }
        }
        Some(_) => return Err(invalid(path, "'children' must be an array")),
    }

    tree.attach_initial(properties, children);
    Ok(tree)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_tree_serializes_as_null() {
        assert_eq!(DataTree::invalid().create_json(), Json::Null);
    }

    #[test]
    fn test_node_shape() {
        let tree = DataTree::new("Settings");
        tree.with_transaction(|tx| tx.set_property("volume", 11)).unwrap();

        assert_eq!(
            tree.create_json(),
            json!({
                "type": "Settings",
                "properties": { "volume": { "type": "int", "value": 11 } },
                "children": []
            })
        );
    }

    #[test]
    fn test_missing_members_default_to_empty() {
        let tree = DataTree::from_json(&json!({ "type": "Bare" })).unwrap();
        assert_eq!(tree.get_type(), "Bare");
        assert_eq!(tree.get_num_properties(), 0);
        assert_eq!(tree.get_num_children(), 0);
    }

    #[test]
    fn test_rejects_malformed_input() {
        let cases = [
            json!([]),
            json!({ "properties": {} }),
            json!({ "type": "" }),
            json!({ "type": "T", "properties": [] }),
            json!({ "type": "T", "children": {} }),
            json!({ "type": "T", "properties": { "k": 5 } }),
            json!({ "type": "T", "children": [ { "type": 3 } ] }),
        ];
        for case in cases {
            assert!(
                matches!(DataTree::from_json(&case), Err(DataTreeError::InvalidJson { .. })),
                "accepted {}",
                case
            );
        }
    }

    #[test]
    fn test_children_get_parent_links() {
        let tree = DataTree::from_json(&json!({
            "type": "Root",
            "children": [ { "type": "Child" } ]
        }))
        .unwrap();
        let child = tree.get_child(0).unwrap();
        assert_eq!(child.get_parent(), tree);
    }
}
