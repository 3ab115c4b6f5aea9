//! Immutable hierarchical translation tree with dotted-path lookup
//!
//! A [`KeyStore`] maps string keys to either a leaf string or a nested
//! subtree. Trees are combined by deep merge (overlay wins on leaf
//! conflicts) or by applying a delta payload against a known snapshot.
//! All combining operations are pure and return a new tree; readers are
//! never exposed to in-place mutation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{L10nError, L10nResult};
use crate::protocol::DeltaPayload;

/// Reserved leaf name: a branch exposing this key resolves to its value
/// when the dotted path stops at the branch itself.
const VALUE_KEY: &str = "_value";

/// A single node in the translation tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// A translated string
    Leaf(String),
    /// A nested subtree
    Branch(BTreeMap<String, Node>),
}

/// Hierarchical key→string dictionary for one locale
///
/// Dotted paths address leaves: `lookup("common.ok")` walks `common`,
/// then `ok`. The `.` character is purely a path separator: key
/// components cannot contain a literal dot, and no escaping is
/// supported (known limitation inherited from the wire format).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyStore {
    root: BTreeMap<String, Node>,
}

impl KeyStore {
    /// Create an empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a tree from a JSON value (string leaves, object branches)
    pub fn from_value(value: serde_json::Value) -> L10nResult<Self> {
        if !value.is_object() {
            return Err(L10nError::parse("translation tree root must be an object"));
        }
        serde_json::from_value(value)
            .map_err(|e| L10nError::parse(format!("invalid translation tree: {e}")))
    }

    /// Whether the tree has no entries at all
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Number of leaf strings in the tree
    pub fn leaf_count(&self) -> usize {
        fn count(map: &BTreeMap<String, Node>) -> usize {
            map.values()
                .map(|node| match node {
                    Node::Leaf(_) => 1,
                    Node::Branch(sub) => count(sub),
                })
                .sum()
        }
        count(&self.root)
    }

    /// Resolve a dotted key to its leaf value
    ///
    /// Returns `None` when the path does not resolve to a string; absence
    /// is a normal outcome, not an error. A path ending at a branch that
    /// carries a `_value` leaf resolves to that leaf.
    pub fn lookup(&self, dotted_key: &str) -> Option<&str> {
        if dotted_key.is_empty() {
            return None;
        }
        let mut current = &self.root;
        let mut segments = dotted_key.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segment.is_empty() {
                // Ambiguous path (leading/trailing/double dot)
                return None;
            }
            match current.get(segment) {
                Some(Node::Leaf(value)) => {
                    return if segments.peek().is_none() {
                        Some(value)
                    } else {
                        None
                    };
                }
                Some(Node::Branch(sub)) => {
                    if segments.peek().is_none() {
                        return match sub.get(VALUE_KEY) {
                            Some(Node::Leaf(value)) => Some(value),
                            _ => None,
                        };
                    }
                    current = sub;
                }
                None => return None,
            }
        }
        None
    }

    /// Deep-merge `overlay` on top of this tree, returning a new tree
    ///
    /// When both sides hold a branch for the same key the branches are
    /// merged recursively; in every other case the overlay entry replaces
    /// the base entry entirely. Neither input is mutated.
    pub fn merge(&self, overlay: &KeyStore) -> KeyStore {
        KeyStore {
            root: merge_maps(&self.root, &overlay.root),
        }
    }

    /// Apply a delta payload against this tree, returning a new tree
    ///
    /// Added and updated entries set the dotted path, creating
    /// intermediate branches as needed (last assignment wins). Deleted
    /// paths remove the entry; deleting an already-absent path is a
    /// no-op. Branches emptied by a delete are pruned.
    pub fn apply_delta(&self, delta: &DeltaPayload) -> KeyStore {
        let mut root = self.root.clone();
        for (key, value) in &delta.added {
            set_path(&mut root, key, value.clone());
        }
        for (key, change) in &delta.updated {
            set_path(&mut root, key, change.new.clone());
        }
        for key in &delta.deleted {
            remove_path(&mut root, key);
        }
        KeyStore { root }
    }

    /// Flatten the tree into a dotted-key map
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        fn walk(prefix: &str, map: &BTreeMap<String, Node>, out: &mut BTreeMap<String, String>) {
            for (key, node) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match node {
                    Node::Leaf(value) => {
                        out.insert(path, value.clone());
                    }
                    Node::Branch(sub) => walk(&path, sub, out),
                }
            }
        }
        walk("", &self.root, &mut out);
        out
    }
}

fn merge_maps(base: &BTreeMap<String, Node>, overlay: &BTreeMap<String, Node>) -> BTreeMap<String, Node> {
    let mut merged = base.clone();
    for (key, overlay_node) in overlay {
        match (merged.get(key), overlay_node) {
            (Some(Node::Branch(base_sub)), Node::Branch(overlay_sub)) => {
                let combined = merge_maps(base_sub, overlay_sub);
                merged.insert(key.clone(), Node::Branch(combined));
            }
            _ => {
                merged.insert(key.clone(), overlay_node.clone());
            }
        }
    }
    merged
}

fn set_path(root: &mut BTreeMap<String, Node>, dotted_key: &str, value: String) {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        warn!(key = dotted_key, "skipping delta entry with ambiguous path");
        return;
    }
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        let entry = current
            .entry((*segment).to_string())
            .or_insert_with(|| Node::Branch(BTreeMap::new()));
        // A leaf in the middle of the path is replaced by a branch
        if !matches!(entry, Node::Branch(_)) {
            *entry = Node::Branch(BTreeMap::new());
        }
        match entry {
            Node::Branch(sub) => current = sub,
            Node::Leaf(_) => unreachable!("entry was just made a branch"),
        }
    }
    let last = segments[segments.len() - 1];
    current.insert(last.to_string(), Node::Leaf(value));
}

/// Removes the entry at the dotted path; returns true when `root` is
/// left empty so the caller can prune.
fn remove_path(root: &mut BTreeMap<String, Node>, dotted_key: &str) -> bool {
    let segments: Vec<&str> = dotted_key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        warn!(key = dotted_key, "skipping delta delete with ambiguous path");
        return false;
    }
    remove_segments(root, &segments);
    root.is_empty()
}

fn remove_segments(map: &mut BTreeMap<String, Node>, segments: &[&str]) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };
    if rest.is_empty() {
        map.remove(*head);
        return;
    }
    let emptied = match map.get_mut(*head) {
        Some(Node::Branch(sub)) => {
            remove_segments(sub, rest);
            sub.is_empty()
        }
        // Path belongs to a leaf or is absent: nothing to remove
        _ => false,
    };
    if emptied {
        map.remove(*head);
    }
}
