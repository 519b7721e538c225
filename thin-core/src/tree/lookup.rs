//! Dot-path lookup over nested value trees

use serde_json::Value;

/// Behavior when [`lookup`] is called without a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoKey {
    /// Return the whole tree.
    All,
    /// Return nothing. Used for the environment and server sources, where
    /// handing back the entire raw tree is undesirable.
    Nothing,
}

/// Resolve a dot-separated key against a nested tree.
///
/// Splits `key` on `.` and walks the tree one segment at a time.
/// Intermediate segments must resolve to objects; the final segment may hold
/// any value. Any miss short-circuits to `None`. The lookup is total: it
/// never fails, it only resolves or misses.
pub fn lookup<'a>(tree: &'a Value, key: Option<&str>, no_key: NoKey) -> Option<&'a Value> {
    let Some(key) = key else {
        return match no_key {
            NoKey::All => Some(tree),
            NoKey::Nothing => None,
        };
    };

    let mut node = tree;
    let mut segments = key.split('.').peekable();
    while let Some(segment) = segments.next() {
        let next = node.get(segment)?;
        // Only the last segment may hold a leaf value.
        if segments.peek().is_some() && !next.is_object() {
            return None;
        }
        node = next;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_walks_nested_keys() {
        let tree = json!({ "a": { "b": { "c": 5 } } });
        assert_eq!(lookup(&tree, Some("a.b.c"), NoKey::All), Some(&json!(5)));
        assert_eq!(
            lookup(&tree, Some("a.b"), NoKey::All),
            Some(&json!({ "c": 5 }))
        );
    }

    #[test]
    fn test_lookup_misses_resolve_to_none() {
        let tree = json!({ "a": { "b": { "c": 5 } } });
        assert_eq!(lookup(&tree, Some("a.x.c"), NoKey::All), None);
        assert_eq!(lookup(&tree, Some("z"), NoKey::All), None);
    }

    #[test]
    fn test_intermediate_segments_must_be_objects() {
        let tree = json!({ "a": { "b": 1 } });
        assert_eq!(lookup(&tree, Some("a.b.c"), NoKey::All), None);

        let tree = json!({ "a": [1, 2, 3] });
        assert_eq!(lookup(&tree, Some("a.0"), NoKey::All), None);
    }

    #[test]
    fn test_final_segment_may_hold_any_value() {
        let tree = json!({ "a": { "list": [1, 2] } });
        assert_eq!(
            lookup(&tree, Some("a.list"), NoKey::All),
            Some(&json!([1, 2]))
        );
    }

    #[test]
    fn test_no_key_returns_whole_tree_or_nothing() {
        let tree = json!({ "a": 1 });
        assert_eq!(lookup(&tree, None, NoKey::All), Some(&tree));
        assert_eq!(lookup(&tree, None, NoKey::Nothing), None);
    }
}
