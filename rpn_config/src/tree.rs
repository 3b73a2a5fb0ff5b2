// Copyright 2026 the RPN Tape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical configuration store with a cursor.

use core::fmt;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use rpn_tape::convert::Number;
use rpn_tape::{Status, TypeDescriptor, Value};

/// Configuration store errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A path with an empty segment.
    BadPath {
        /// The path as given.
        path: Box<str>,
    },
    /// No node at this path.
    NotFound {
        /// The path as given.
        path: Box<str>,
    },
    /// The name refers to a leaf where a node was expected.
    NotANode {
        /// Offending name.
        name: Box<str>,
    },
    /// The name refers to a node where a leaf was expected.
    NotALeaf {
        /// Offending name.
        name: Box<str>,
    },
    /// No leaf with this name under the current node.
    MissingLeaf {
        /// Leaf name.
        name: Box<str>,
    },
    /// The leaf cannot be read as the requested type.
    Conversion {
        /// Leaf name.
        name: Box<str>,
        /// Requested type.
        ty: TypeDescriptor,
        /// Conversion flags.
        status: Status,
    },
    /// The cursor is already at the root.
    NoAncestor,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadPath { path } => write!(f, "malformed path: {path:?}"),
            Self::NotFound { path } => write!(f, "no such node: {path}"),
            Self::NotANode { name } => write!(f, "{name} is a leaf, not a node"),
            Self::NotALeaf { name } => write!(f, "{name} is a node, not a leaf"),
            Self::MissingLeaf { name } => write!(f, "missing leaf: {name}"),
            Self::Conversion { name, ty, status } => {
                write!(f, "cannot read {name} as {ty}: {status}")
            }
            Self::NoAncestor => write!(f, "no ancestor at that depth"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// A typed leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Leaf {
    /// Free text, e.g. program source.
    Text(Box<str>),
    /// A typed number.
    Number(Value),
    /// A flag.
    Bool(bool),
}

impl Leaf {
    /// Text content, if this is a text leaf.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Read as a value of type `td`: numbers are converted, text is parsed, flags give 0 or 1.
    pub fn to_value(&self, td: TypeDescriptor) -> Result<Value, Status> {
        match self {
            Self::Number(v) => {
                let (out, status) = v.convert_to(td);
                if status.is_ok() { Ok(out) } else { Err(status) }
            }
            Self::Text(t) => Value::parse(td, t),
            Self::Bool(b) => {
                let (out, status) = Value::U8(u8::from(*b)).convert_to(td);
                if status.is_ok() { Ok(out) } else { Err(status) }
            }
        }
    }
}

impl From<&str> for Leaf {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<bool> for Leaf {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Value> for Leaf {
    fn from(v: Value) -> Self {
        Self::Number(v)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Clone, Debug)]
enum Entry {
    Node(NodeId),
    Leaf(Leaf),
}

#[derive(Clone, Debug)]
struct Node {
    name: Box<str>,
    parent: Option<NodeId>,
    // Insertion order of `entries`.
    order: Vec<Box<str>>,
    entries: HashMap<Box<str>, Entry>,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.into(),
            parent,
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

fn segments(path: &str) -> Result<impl Iterator<Item = &str>, ConfigError> {
    if path.split('.').any(str::is_empty) {
        return Err(ConfigError::BadPath { path: path.into() });
    }
    Ok(path.split('.'))
}

/// A tree of named nodes holding typed leaves, navigated with a cursor.
///
/// Paths are dot-separated node names, e.g. `Evaluators.Gain.InputVariables`. Absolute paths
/// start at the root, relative paths at the cursor. Failed moves leave the cursor where it was.
#[derive(Clone, Debug)]
pub struct ConfigTree {
    nodes: Vec<Node>,
    cursor: NodeId,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTree {
    const ROOT: NodeId = NodeId(0);

    /// A tree holding only the root node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: alloc::vec![Node::new("", None)],
            cursor: Self::ROOT,
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn child(&self, from: NodeId, name: &str) -> Result<Option<NodeId>, ConfigError> {
        match self.node(from).entries.get(name) {
            Some(Entry::Node(id)) => Ok(Some(*id)),
            Some(Entry::Leaf(_)) => Err(ConfigError::NotANode { name: name.into() }),
            None => Ok(None),
        }
    }

    fn find(&self, from: NodeId, path: &str) -> Result<NodeId, ConfigError> {
        let mut at = from;
        for segment in segments(path)? {
            at = self
                .child(at, segment)?
                .ok_or_else(|| ConfigError::NotFound { path: path.into() })?;
        }
        Ok(at)
    }

    fn create(&mut self, from: NodeId, path: &str) -> Result<NodeId, ConfigError> {
        // Validate the whole path before inserting anything.
        let mut at = Some(from);
        for segment in segments(path)? {
            at = match at {
                Some(id) => self.child(id, segment)?,
                None => None,
            };
        }
        let mut at = from;
        for segment in segments(path)? {
            at = match self.child(at, segment)? {
                Some(id) => id,
                None => {
                    let id = NodeId(self.nodes.len());
                    self.nodes.push(Node::new(segment, Some(at)));
                    let parent = &mut self.nodes[at.0];
                    parent.order.push(segment.into());
                    parent.entries.insert(segment.into(), Entry::Node(id));
                    id
                }
            };
        }
        Ok(at)
    }

    /// Move the cursor to the root.
    pub fn move_to_root(&mut self) {
        self.cursor = Self::ROOT;
    }

    /// Move the cursor to an existing node, starting from the root.
    pub fn move_absolute(&mut self, path: &str) -> Result<(), ConfigError> {
        self.cursor = self.find(Self::ROOT, path)?;
        Ok(())
    }

    /// Move the cursor to an existing node, starting from the cursor.
    pub fn move_relative(&mut self, path: &str) -> Result<(), ConfigError> {
        self.cursor = self.find(self.cursor, path)?;
        Ok(())
    }

    /// Move the cursor `generations` levels up.
    pub fn move_to_ancestor(&mut self, generations: usize) -> Result<(), ConfigError> {
        let mut at = self.cursor;
        for _ in 0..generations {
            at = self.node(at).parent.ok_or(ConfigError::NoAncestor)?;
        }
        self.cursor = at;
        Ok(())
    }

    /// Create the nodes of `path` below the root that do not exist yet and move there.
    pub fn create_absolute(&mut self, path: &str) -> Result<(), ConfigError> {
        self.cursor = self.create(Self::ROOT, path)?;
        Ok(())
    }

    /// Create the nodes of `path` below the cursor that do not exist yet and move there.
    pub fn create_relative(&mut self, path: &str) -> Result<(), ConfigError> {
        self.cursor = self.create(self.cursor, path)?;
        Ok(())
    }

    /// Store `leaf` under `name` at the cursor, replacing an earlier leaf of the same name.
    pub fn write(&mut self, name: &str, leaf: impl Into<Leaf>) -> Result<(), ConfigError> {
        if name.is_empty() || name.contains('.') {
            return Err(ConfigError::BadPath { path: name.into() });
        }
        let node = &mut self.nodes[self.cursor.0];
        match node.entries.get_mut(name) {
            Some(Entry::Node(_)) => Err(ConfigError::NotALeaf { name: name.into() }),
            Some(Entry::Leaf(old)) => {
                *old = leaf.into();
                Ok(())
            }
            None => {
                node.order.push(name.into());
                node.entries.insert(name.into(), Entry::Leaf(leaf.into()));
                Ok(())
            }
        }
    }

    /// Remove the leaf or subtree called `name` at the cursor. Returns `false` if absent.
    ///
    /// Removed subtrees stay allocated but become unreachable.
    pub fn delete(&mut self, name: &str) -> bool {
        let node = &mut self.nodes[self.cursor.0];
        if node.entries.remove(name).is_none() {
            return false;
        }
        node.order.retain(|n| &**n != name);
        true
    }

    /// Read-only view of the cursor node.
    #[must_use]
    pub fn current(&self) -> NodeView<'_> {
        NodeView {
            tree: self,
            id: self.cursor,
        }
    }

    /// Read-only view of the node at absolute `path` (empty for the root); the cursor is not
    /// moved.
    pub fn view(&self, path: &str) -> Result<NodeView<'_>, ConfigError> {
        let id = if path.is_empty() {
            Self::ROOT
        } else {
            self.find(Self::ROOT, path)?
        };
        Ok(NodeView { tree: self, id })
    }

    /// Leaf `name` at the cursor.
    #[must_use]
    pub fn read(&self, name: &str) -> Option<&Leaf> {
        self.current().leaf(name)
    }

    /// Leaf `name` at the cursor, converted to `T`.
    pub fn read_as<T: Number>(&self, name: &str) -> Result<T, ConfigError> {
        self.current().read_as(name)
    }

    /// Names of the entries (nodes and leaves) at the cursor, in insertion order.
    pub fn children(&self) -> impl Iterator<Item = &str> {
        self.node(self.cursor).order.iter().map(|n| &**n)
    }

    /// Dot-separated path of the cursor; empty at the root.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.current().path()
    }
}

/// Read-only handle to one node of a [`ConfigTree`].
#[derive(Copy, Clone, Debug)]
pub struct NodeView<'a> {
    tree: &'a ConfigTree,
    id: NodeId,
}

impl<'a> NodeView<'a> {
    /// Node name; empty for the root.
    #[must_use]
    pub fn name(&self) -> &'a str {
        &self.tree.node(self.id).name
    }

    /// Dot-separated path from the root.
    #[must_use]
    pub fn path(&self) -> String {
        let mut names = Vec::new();
        let mut at = Some(self.id);
        while let Some(id) = at {
            let node = self.tree.node(id);
            if node.parent.is_some() {
                names.push(&*node.name);
            }
            at = node.parent;
        }
        names.reverse();
        names.join(".")
    }

    /// Child node at relative `path`.
    pub fn node(&self, path: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            tree: self.tree,
            id: self.tree.find(self.id, path)?,
        })
    }

    /// Child nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeView<'a>> + 'a {
        let tree = self.tree;
        let node = tree.node(self.id);
        node.order
            .iter()
            .filter_map(move |name| match node.entries.get(name) {
                Some(Entry::Node(id)) => Some(NodeView { tree, id: *id }),
                _ => None,
            })
    }

    /// Leaf `name`.
    #[must_use]
    pub fn leaf(&self, name: &str) -> Option<&'a Leaf> {
        match self.tree.node(self.id).entries.get(name) {
            Some(Entry::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// Text leaf `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&'a str> {
        self.leaf(name)?.as_text()
    }

    /// Leaf `name` converted to `T`.
    pub fn read_as<T: Number>(&self, name: &str) -> Result<T, ConfigError> {
        let leaf = self
            .leaf(name)
            .ok_or_else(|| ConfigError::MissingLeaf { name: name.into() })?;
        let conversion = |status| ConfigError::Conversion {
            name: name.into(),
            ty: T::TYPE,
            status,
        };
        let value = leaf.to_value(T::TYPE).map_err(conversion)?;
        value
            .get::<T>()
            .ok_or_else(|| conversion(Status::UNSUPPORTED_FEATURE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn create_move_and_path() {
        let mut tree = ConfigTree::new();
        tree.create_absolute("A.B.C").expect("create");
        assert_eq!(tree.current_path(), "A.B.C");
        tree.move_to_ancestor(2).expect("ancestor");
        assert_eq!(tree.current_path(), "A");
        tree.move_relative("B").expect("relative");
        assert_eq!(tree.current_path(), "A.B");
        assert_eq!(
            tree.move_absolute("A.X"),
            Err(ConfigError::NotFound {
                path: "A.X".into()
            })
        );
        assert_eq!(tree.current_path(), "A.B", "failed move keeps the cursor");
        tree.move_to_root();
        assert_eq!(tree.current_path(), "");
        assert_eq!(tree.move_to_ancestor(1), Err(ConfigError::NoAncestor));
        assert!(matches!(
            tree.move_absolute("A..B"),
            Err(ConfigError::BadPath { .. })
        ));
    }

    #[test]
    fn write_then_read_returns_typed_value() {
        let mut tree = ConfigTree::new();
        tree.create_absolute("Params").expect("create");
        tree.write("Gain", Value::F64(2.5)).expect("write");
        tree.write("Name", "pump").expect("write");
        tree.write("Enabled", true).expect("write");
        tree.write("Limit", "300").expect("write");

        assert_eq!(tree.read("Gain"), Some(&Leaf::Number(Value::F64(2.5))));
        assert_eq!(tree.read_as::<f64>("Gain"), Ok(2.5));
        assert_eq!(tree.read_as::<u8>("Enabled"), Ok(1));
        assert_eq!(tree.read_as::<u16>("Limit"), Ok(300));
        assert_eq!(
            tree.read_as::<u8>("Limit"),
            Err(ConfigError::Conversion {
                name: "Limit".into(),
                ty: TypeDescriptor::UInt8,
                status: Status::OVERFLOW,
            })
        );
        assert!(matches!(
            tree.read_as::<i32>("Missing"),
            Err(ConfigError::MissingLeaf { .. })
        ));
        let names: Vec<_> = tree.children().collect();
        assert_eq!(names, ["Gain", "Name", "Enabled", "Limit"]);
    }

    #[test]
    fn leaves_and_nodes_do_not_mix() {
        let mut tree = ConfigTree::new();
        tree.write("X", Value::F32(1.5)).expect("write");
        assert!(matches!(
            tree.create_absolute("X.Y"),
            Err(ConfigError::NotANode { .. })
        ));
        assert_eq!(tree.current_path(), "", "nothing created");
        tree.create_relative("N").expect("create");
        tree.move_to_root();
        assert!(matches!(
            tree.write("N", true),
            Err(ConfigError::NotALeaf { .. })
        ));
        assert!(tree.delete("N"), "delete node");
        assert!(!tree.delete("N"), "already gone");
        assert_eq!(tree.children().collect::<Vec<_>>(), ["X"]);
    }

    #[test]
    fn views_do_not_move_the_cursor() {
        let mut tree = ConfigTree::new();
        tree.create_absolute("Root.In.A").expect("create");
        tree.write("Type", "int32").expect("write");
        tree.create_absolute("Root.In.B").expect("create");
        tree.move_to_root();
        let view = tree.view("Root.In").expect("view");
        let names: Vec<_> = view.nodes().map(|n| n.name()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(view.node("A").expect("A").text("Type"), Some("int32"));
        assert_eq!(view.node("A").expect("A").path(), "Root.In.A");
        assert_eq!(tree.current_path(), "");
    }
}
