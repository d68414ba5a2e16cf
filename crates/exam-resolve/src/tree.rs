//! Reading and copy-on-write updates of JSON value trees by field path.

use std::mem;

use exam_model::{FieldPath, Segment};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ResolveError, Result};

/// Value at `segments` below `root`. An indexed segment looks up the key,
/// then indexes the list found there.
pub fn get_value<'v>(root: &'v Value, segments: &[Segment]) -> Option<&'v Value> {
    segments.iter().try_fold(root, |node, segment| {
        let child = node.as_object()?.get(&segment.name)?;
        match segment.index {
            Some(index) => child.as_array()?.get(index),
            None => Some(child),
        }
    })
}

/// One edited field: where, what it held, what it holds now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub path: String,
    pub old: Option<Value>,
    pub new: Value,
}

/// A new value tree together with the change that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldUpdate {
    pub tree: Value,
    pub change: FieldChange,
}

/// Returns a copy of `tree` with `value` stored at `path`; `tree` itself is
/// left untouched. Missing objects along the way are created. An index may
/// address an existing list entry or the slot just past the end, which
/// appends.
pub fn set_field_value(tree: &Value, path: &FieldPath, value: Value) -> Result<FieldUpdate> {
    let not_found = || ResolveError::NotFound {
        path: path.to_string(),
    };
    if path.segments.is_empty() {
        return Err(not_found());
    }

    let mut updated = tree.clone();
    let mut node = &mut updated;
    for segment in &path.segments {
        node = slot(node, segment).ok_or_else(not_found)?;
    }
    let old = mem::replace(node, value.clone());

    Ok(FieldUpdate {
        tree: updated,
        change: FieldChange {
            path: path.to_string(),
            old: (!old.is_null()).then_some(old),
            new: value,
        },
    })
}

fn slot<'v>(node: &'v mut Value, segment: &Segment) -> Option<&'v mut Value> {
    if node.is_null() {
        *node = Value::Object(Map::new());
    }
    let child = node
        .as_object_mut()?
        .entry(segment.name.clone())
        .or_insert(Value::Null);
    let Some(index) = segment.index else {
        return Some(child);
    };
    if child.is_null() {
        *child = Value::Array(Vec::new());
    }
    let items = child.as_array_mut()?;
    if index == items.len() {
        items.push(Value::Null);
    }
    items.get_mut(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(text: &str) -> FieldPath {
        FieldPath::parse(text).unwrap()
    }

    #[test]
    fn reads_indexed_segments() {
        let tree = json!({"Final Rx": [{"od": {"sph": -1}}, {"od": {"sph": 2}}]});
        assert_eq!(
            get_value(&tree, &path("Final Rx[1].od.sph").segments),
            Some(&json!(2))
        );
        assert_eq!(get_value(&tree, &path("Final Rx[2].od.sph").segments), None);
        assert_eq!(get_value(&tree, &path("Final Rx.od").segments), None);
    }

    #[test]
    fn update_leaves_original_untouched() {
        let tree = json!({"od": {"sph": 1}});
        let update = set_field_value(&tree, &path("od.sph"), json!(2)).unwrap();
        assert_eq!(tree, json!({"od": {"sph": 1}}));
        assert_eq!(update.tree, json!({"od": {"sph": 2}}));
        assert_eq!(update.change.old, Some(json!(1)));
        assert_eq!(update.change.new, json!(2));
    }

    #[test]
    fn update_creates_missing_nodes_and_appends() {
        let update = set_field_value(&json!({}), &path("Final Rx[0].od.sph"), json!(-2)).unwrap();
        assert_eq!(update.tree, json!({"Final Rx": [{"od": {"sph": -2}}]}));
        assert_eq!(update.change.old, None);

        let gap = set_field_value(&update.tree, &path("Final Rx[3].od.sph"), json!(1));
        assert!(matches!(gap, Err(ResolveError::NotFound { .. })));
    }

    #[test]
    fn update_refuses_to_descend_into_scalars() {
        let tree = json!({"od": "plano"});
        let result = set_field_value(&tree, &path("od.sph"), json!(1));
        assert!(matches!(result, Err(ResolveError::NotFound { .. })));
    }
}
