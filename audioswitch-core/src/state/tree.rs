//! Change-tracked state tree
//!
//! A small fixed-capacity arena of named nodes. Interior nodes map keys to
//! children, leaves hold a scalar [`Value`]. Each node carries a dirty flag;
//! a write that changes a leaf marks the leaf and every ancestor dirty.
//!
//! Parent links are arena indices used only to walk upward when marking
//! dirty. Nodes are never removed, so arena order is insertion order and
//! snapshots serialize keys in the order they were first written.
//!
//! Paths are dot-separated: `"volume.left"`. The empty path is the root.

use core::fmt;

use heapless::{String, Vec};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Maximum nodes in one tree, root included
pub const MAX_NODES: usize = 16;

/// Maximum key length in bytes
pub const MAX_KEY_LEN: usize = 16;

/// Maximum text value length in bytes
pub const MAX_TEXT_LEN: usize = 16;

/// Errors from tree access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// A path segment does not exist
    NotFound,
    /// A path walks through a leaf
    NotABranch,
    /// A leaf write targets an interior node
    NotALeaf,
    /// Arena capacity exhausted
    Full,
    /// Key longer than `MAX_KEY_LEN`
    KeyTooLong,
    /// Text longer than `MAX_TEXT_LEN`
    TextTooLong,
}

/// Leaf value
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Int(i32),
    Text(String<MAX_TEXT_LEN>),
}

impl Value {
    /// Build a text value, failing if it does not fit
    pub fn text(s: &str) -> Result<Self, StoreError> {
        let mut text = String::new();
        text.push_str(s).map_err(|_| StoreError::TextTooLong)?;
        Ok(Value::Text(text))
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            Value::Int(_) => None,
        }
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(u8);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        usize::from(self.0)
    }
}

#[derive(Debug, Clone)]
enum Kind {
    Leaf(Value),
    Branch,
}

#[derive(Debug, Clone)]
struct Node {
    key: String<MAX_KEY_LEN>,
    parent: Option<NodeId>,
    kind: Kind,
    dirty: bool,
}

/// Result of a path lookup
#[derive(Debug, Clone, Copy)]
pub enum Entry<'a> {
    Leaf(&'a Value),
    Branch(Subtree<'a>),
}

/// Change-tracked tree of named values
#[derive(Debug, Clone)]
pub struct StateTree {
    nodes: Vec<Node, MAX_NODES>,
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StateTree {
    /// Create an empty, clean tree
    pub fn new() -> Self {
        let mut nodes = Vec::new();
        // Capacity is non-zero, the root always fits
        let _ = nodes.push(Node {
            key: String::new(),
            parent: None,
            kind: Kind::Branch,
            dirty: false,
        });
        Self { nodes }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    fn child(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.parent == Some(parent) && n.key.as_str() == key)
            .map(|i| NodeId(i as u8))
    }

    fn children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.parent == Some(parent))
            .map(|(i, _)| NodeId(i as u8))
    }

    fn resolve_from(&self, base: NodeId, path: &str) -> Result<NodeId, StoreError> {
        if path.is_empty() {
            return Ok(base);
        }
        path.split('.').try_fold(base, |id, segment| {
            if !matches!(self.node(id).kind, Kind::Branch) {
                return Err(StoreError::NotABranch);
            }
            self.child(id, segment).ok_or(StoreError::NotFound)
        })
    }

    /// Resolve a dotted path to a node
    pub fn resolve(&self, path: &str) -> Result<NodeId, StoreError> {
        self.resolve_from(NodeId::ROOT, path)
    }

    fn is_within(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).parent;
        }
        false
    }

    fn mark_dirty_from(&mut self, id: NodeId) {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = &mut self.nodes[current.index()];
            node.dirty = true;
            cursor = node.parent;
        }
    }

    fn insert_node(&mut self, parent: NodeId, key: &str, kind: Kind) -> Result<NodeId, StoreError> {
        let mut k = String::new();
        k.push_str(key).map_err(|_| StoreError::KeyTooLong)?;
        let id = NodeId(self.nodes.len() as u8);
        self.nodes
            .push(Node {
                key: k,
                parent: Some(parent),
                kind,
                dirty: false,
            })
            .map_err(|_| StoreError::Full)?;
        self.mark_dirty_from(id);
        Ok(id)
    }

    fn set_from(&mut self, base: NodeId, path: &str, value: Value) -> Result<bool, StoreError> {
        let (parent_path, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (parent, key),
            None => ("", path),
        };
        if key.is_empty() {
            return Err(StoreError::NotALeaf);
        }
        let parent = self.resolve_from(base, parent_path)?;
        if !matches!(self.node(parent).kind, Kind::Branch) {
            return Err(StoreError::NotABranch);
        }

        let Some(id) = self.child(parent, key) else {
            self.insert_node(parent, key, Kind::Leaf(value))?;
            return Ok(true);
        };

        match &mut self.nodes[id.index()].kind {
            Kind::Branch => Err(StoreError::NotALeaf),
            Kind::Leaf(current) if *current == value => Ok(false),
            Kind::Leaf(current) => {
                *current = value;
                self.mark_dirty_from(id);
                Ok(true)
            }
        }
    }

    /// Write a leaf
    ///
    /// Returns whether the tree was dirtied: the key was new or the value
    /// differs from the stored one. An equal write leaves the flags alone.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<bool, StoreError> {
        self.set_from(NodeId::ROOT, path, value.into())
    }

    pub fn set_text(&mut self, path: &str, text: &str) -> Result<bool, StoreError> {
        self.set(path, Value::text(text)?)
    }

    /// Create an interior node, or return the existing one
    pub fn insert_branch(&mut self, path: &str) -> Result<NodeId, StoreError> {
        let (parent_path, key) = match path.rsplit_once('.') {
            Some((parent, key)) => (parent, key),
            None => ("", path),
        };
        let parent = self.resolve(parent_path)?;
        if !matches!(self.node(parent).kind, Kind::Branch) {
            return Err(StoreError::NotABranch);
        }
        match self.child(parent, key) {
            Some(id) if matches!(self.node(id).kind, Kind::Branch) => Ok(id),
            Some(_) => Err(StoreError::NotABranch),
            None => self.insert_node(parent, key, Kind::Branch),
        }
    }

    /// Look up a leaf value or sub-tree
    pub fn get(&self, path: &str) -> Result<Entry<'_>, StoreError> {
        self.subtree_at(NodeId::ROOT).get(path)
    }

    /// Integer leaf at `path`, if present and an integer
    pub fn int(&self, path: &str) -> Option<i32> {
        match self.get(path) {
            Ok(Entry::Leaf(value)) => value.as_int(),
            _ => None,
        }
    }

    /// Text leaf at `path`, if present and text
    pub fn text(&self, path: &str) -> Option<&str> {
        match self.get(path) {
            Ok(Entry::Leaf(value)) => value.as_str(),
            _ => None,
        }
    }

    /// Whether anything changed since the last `clean`
    pub fn is_dirty(&self) -> bool {
        self.node(NodeId::ROOT).dirty
    }

    pub fn is_dirty_at(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.node(self.resolve(path)?).dirty)
    }

    /// Mark the root dirty without writing anything
    pub fn mark_dirty(&mut self) {
        self.mark_dirty_from(NodeId::ROOT);
    }

    /// Clear every dirty flag in the tree
    pub fn clean(&mut self) {
        for node in self.nodes.iter_mut() {
            node.dirty = false;
        }
    }

    fn subtree_at(&self, id: NodeId) -> Subtree<'_> {
        Subtree { tree: self, id }
    }

    /// Read-only handle on an interior node
    pub fn subtree(&self, path: &str) -> Result<Subtree<'_>, StoreError> {
        match self.get(path)? {
            Entry::Branch(sub) => Ok(sub),
            Entry::Leaf(_) => Err(StoreError::NotABranch),
        }
    }

    /// Writable handle on an interior node
    pub fn subtree_mut(&mut self, path: &str) -> Result<SubtreeMut<'_>, StoreError> {
        let id = self.subtree(path)?.id;
        Ok(SubtreeMut { tree: self, id })
    }

    /// Serializable view of the whole tree, without tracking metadata
    pub fn snapshot(&self) -> Subtree<'_> {
        self.subtree_at(NodeId::ROOT)
    }

    /// Number of nodes in use, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

/// Read-only view of an interior node
#[derive(Debug, Clone, Copy)]
pub struct Subtree<'a> {
    tree: &'a StateTree,
    id: NodeId,
}

impl<'a> Subtree<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn get(&self, path: &str) -> Result<Entry<'a>, StoreError> {
        let id = self.tree.resolve_from(self.id, path)?;
        Ok(match &self.tree.node(id).kind {
            Kind::Leaf(value) => Entry::Leaf(value),
            Kind::Branch => Entry::Branch(self.tree.subtree_at(id)),
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.tree.node(self.id).dirty
    }

    /// Child keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &'a str> + 'a {
        let tree = self.tree;
        tree.children(self.id).map(move |id| tree.node(id).key.as_str())
    }
}

impl Serialize for Subtree<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.tree.children(self.id).count();
        let mut map = serializer.serialize_map(Some(len))?;
        for id in self.tree.children(self.id) {
            let node = self.tree.node(id);
            match &node.kind {
                Kind::Leaf(value) => map.serialize_entry(node.key.as_str(), value)?,
                Kind::Branch => map.serialize_entry(node.key.as_str(), &self.tree.subtree_at(id))?,
            }
        }
        map.end()
    }
}

/// Writable view of an interior node
///
/// Writes through the handle dirty the written leaf, this node and every
/// ancestor up to the root.
#[derive(Debug)]
pub struct SubtreeMut<'a> {
    tree: &'a mut StateTree,
    id: NodeId,
}

impl SubtreeMut<'_> {
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<bool, StoreError> {
        self.tree.set_from(self.id, path, value.into())
    }

    pub fn set_text(&mut self, path: &str, text: &str) -> Result<bool, StoreError> {
        self.set(path, Value::text(text)?)
    }

    pub fn get(&self, path: &str) -> Result<Entry<'_>, StoreError> {
        self.tree.subtree_at(self.id).get(path)
    }

    pub fn is_dirty(&self) -> bool {
        self.tree.node(self.id).dirty
    }

    /// Clear the dirty flags of this sub-tree only
    ///
    /// Ancestors keep their flags.
    pub fn clean(&mut self) {
        let id = self.id;
        for i in 0..self.tree.nodes.len() {
            let node_id = NodeId(i as u8);
            if self.tree.is_within(node_id, id) {
                self.tree.nodes[i].dirty = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StateTree {
        let mut tree = StateTree::new();
        tree.set_text("network", "OFF").unwrap();
        tree.insert_branch("volume").unwrap();
        tree.set("volume.left", 0).unwrap();
        tree.set("volume.right", 0).unwrap();
        tree.set_text("volume.muted", "OFF").unwrap();
        tree.set_text("channel", "LINE 1").unwrap();
        tree.clean();
        tree
    }

    #[test]
    fn test_new_tree_is_clean_and_empty() {
        let tree = StateTree::new();
        assert!(!tree.is_dirty());
        assert!(tree.is_empty());
        assert_eq!(serde_json::to_string(&tree.snapshot()).unwrap(), "{}");
    }

    #[test]
    fn test_new_key_dirties() {
        let mut tree = StateTree::new();
        assert_eq!(tree.set_text("foo", "bar"), Ok(true));
        assert!(tree.is_dirty());
        assert_eq!(tree.text("foo"), Some("bar"));
    }

    #[test]
    fn test_equal_write_does_not_dirty() {
        let mut tree = sample();
        assert_eq!(tree.set_text("channel", "LINE 1"), Ok(false));
        assert_eq!(tree.set("volume.left", 0), Ok(false));
        assert!(!tree.is_dirty());
    }

    #[test]
    fn test_type_change_dirties() {
        let mut tree = sample();
        assert_eq!(tree.set("network", 0), Ok(true));
        assert!(tree.is_dirty());
    }

    #[test]
    fn test_nested_write_dirties_ancestors_only() {
        let mut tree = sample();
        tree.set("volume.left", 42).unwrap();

        assert!(tree.is_dirty());
        assert_eq!(tree.is_dirty_at("volume"), Ok(true));
        assert_eq!(tree.is_dirty_at("volume.left"), Ok(true));
        assert_eq!(tree.is_dirty_at("volume.right"), Ok(false));
        assert_eq!(tree.is_dirty_at("channel"), Ok(false));
        assert_eq!(tree.int("volume.left"), Some(42));
    }

    #[test]
    fn test_writes_coalesce_until_clean() {
        let mut tree = sample();
        tree.set("volume.left", 1).unwrap();
        tree.set("volume.left", 2).unwrap();
        tree.set("volume.left", 0).unwrap();
        assert!(tree.is_dirty(), "returning to the old value does not undo dirty");

        tree.clean();
        assert!(!tree.is_dirty());
        assert_eq!(tree.is_dirty_at("volume"), Ok(false));
    }

    #[test]
    fn test_reads_do_not_clean() {
        let mut tree = sample();
        tree.set_text("channel", "PHONO").unwrap();
        let _ = tree.text("channel");
        let _ = tree.snapshot();
        assert!(tree.is_dirty());
    }

    #[test]
    fn test_subtree_handle_propagates() {
        let mut tree = sample();
        {
            let mut volume = tree.subtree_mut("volume").unwrap();
            assert_eq!(volume.set_text("muted", "ON"), Ok(true));
            assert!(volume.is_dirty());
        }
        assert!(tree.is_dirty());
        assert_eq!(tree.text("volume.muted"), Some("ON"));
    }

    #[test]
    fn test_subtree_clean_leaves_ancestors() {
        let mut tree = sample();
        tree.set("volume.right", 7).unwrap();
        tree.subtree_mut("volume").unwrap().clean();

        assert_eq!(tree.is_dirty_at("volume"), Ok(false));
        assert_eq!(tree.is_dirty_at("volume.right"), Ok(false));
        assert!(tree.is_dirty());
    }

    #[test]
    fn test_get_branch_and_leaf() {
        let tree = sample();
        match tree.get("volume").unwrap() {
            Entry::Branch(volume) => {
                let keys: std::vec::Vec<&str> = volume.keys().collect();
                assert_eq!(keys, ["left", "right", "muted"]);
                assert!(matches!(volume.get("left"), Ok(Entry::Leaf(Value::Int(0)))));
            }
            Entry::Leaf(_) => panic!("volume should be a branch"),
        }
        assert!(matches!(tree.get("channel"), Ok(Entry::Leaf(_))));
    }

    #[test]
    fn test_errors() {
        let mut tree = sample();
        assert_eq!(tree.set("missing.left", 1), Err(StoreError::NotFound));
        assert_eq!(tree.set("channel.sub", 1), Err(StoreError::NotABranch));
        assert_eq!(tree.set("volume", 1), Err(StoreError::NotALeaf));
        assert_eq!(tree.resolve("volume.up"), Err(StoreError::NotFound));
        assert_eq!(
            tree.set_text("channel", "A VERY LONG CHANNEL NAME"),
            Err(StoreError::TextTooLong)
        );
        assert_eq!(
            tree.set("an_excessively_long_key", 1),
            Err(StoreError::KeyTooLong)
        );
        assert!(matches!(tree.subtree("channel"), Err(StoreError::NotABranch)));
        assert!(!tree.is_dirty(), "failed writes never dirty");
    }

    #[test]
    fn test_arena_full() {
        let mut tree = StateTree::new();
        let keys = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o"];
        for key in keys {
            tree.set(key, 1).unwrap();
        }
        assert_eq!(tree.len(), MAX_NODES);
        assert_eq!(tree.set("p", 1), Err(StoreError::Full));
        assert_eq!(tree.set("a", 2), Ok(true), "existing keys stay writable");
    }

    #[test]
    fn test_insert_branch_is_idempotent() {
        let mut tree = sample();
        let first = tree.resolve("volume").unwrap();
        assert_eq!(tree.insert_branch("volume"), Ok(first));
        assert!(!tree.is_dirty());
        assert_eq!(tree.insert_branch("channel"), Err(StoreError::NotABranch));
    }

    #[test]
    fn test_snapshot_json_in_insertion_order() {
        let tree = sample();
        let json = serde_json::to_string(&tree.snapshot()).unwrap();
        assert_eq!(
            json,
            r#"{"network":"OFF","volume":{"left":0,"right":0,"muted":"OFF"},"channel":"LINE 1"}"#
        );
    }

    #[test]
    fn test_subtree_snapshot() {
        let tree = sample();
        let json = serde_json::to_string(&tree.subtree("volume").unwrap()).unwrap();
        assert_eq!(json, r#"{"left":0,"right":0,"muted":"OFF"}"#);
    }
}
