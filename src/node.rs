//! The document graph produced by the loader.
//!
//! Nodes live in an [`Arena`] and refer to each other by [`NodeId`]. An alias
//! is simply a second reference to the same id, so sharing is identity
//! preserving and cycles (a container referring to one of its ancestors) need
//! no self-referential ownership. Dropping the arena releases every node at
//! once, whichever way the parse ended.

use std::fmt;

/// Stable handle of a node inside its [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Typed leaf value.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    /// Integers outside the `i64` range are stored as [`Scalar::Float`].
    Integer(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Short name of the value kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(x) if x.is_nan() => f.write_str(".nan"),
            Scalar::Float(x) if x.is_infinite() => {
                f.write_str(if *x > 0.0 { ".inf" } else { "-.inf" })
            }
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// One node of the document graph.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Sequence(Vec<NodeId>),
    /// Key/value pairs in source order. Keys need not be scalars.
    Mapping(Vec<(NodeId, NodeId)>),
    /// Built only from a sequence carrying the ordered-map tag; the entry
    /// order is the order of the single-entry mappings in the source.
    OrderedMapping(Vec<(NodeId, NodeId)>),
    /// A node that carried a non-empty explicit tag.
    Tagged { tag: String, inner: NodeId },
}

impl Node {
    /// Short name of the node kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "scalar",
            Node::Sequence(_) => "sequence",
            Node::Mapping(_) => "mapping",
            Node::OrderedMapping(_) => "ordered mapping",
            Node::Tagged { .. } => "tagged",
        }
    }
}

/// Owning storage for the nodes of one document.
#[derive(Clone, Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its handle.
    pub fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// # Panics
    /// If `id` does not belong to this arena.
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// # Panics
    /// If `id` does not belong to this arena.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes with their handles, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Follow `Tagged` wrappers down to the first untagged node.
    ///
    /// Stops on a wrapper chain that loops back on itself, which only a
    /// misbehaving tag hook can produce.
    pub fn untag(&self, mut id: NodeId) -> NodeId {
        for _ in 0..self.nodes.len() {
            match self.get(id) {
                Node::Tagged { inner, .. } => id = *inner,
                _ => break,
            }
        }
        id
    }
}

/// A parsed document: the arena plus its root.
#[derive(Clone, Debug)]
pub struct Document {
    arena: Arena,
    root: NodeId,
}

impl Document {
    pub(crate) fn new(arena: Arena, root: NodeId) -> Self {
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Borrowed view of the root node.
    pub fn root_ref(&self) -> NodeRef<'_> {
        self.node_ref(self.root)
    }

    pub fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    pub fn get(&self, id: NodeId) -> &Node {
        self.arena.get(id)
    }

    /// Mutable access to one node. Every site referencing `id` observes the change.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        self.arena.get_mut(id)
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Number of nodes held, including ones no longer reachable from the
    /// root (values replaced under [`crate::DuplicateKeyPolicy::LastWins`]).
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn into_parts(self) -> (Arena, NodeId) {
        (self.arena, self.root)
    }
}

/// Borrowed navigation handle into a [`Document`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a Node {
        self.doc.get(self.id)
    }

    /// Tag of this node, if it is a `Tagged` wrapper.
    pub fn tag(&self) -> Option<&'a str> {
        match self.node() {
            Node::Tagged { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    /// The node underneath any `Tagged` wrappers.
    pub fn untagged(&self) -> NodeRef<'a> {
        self.doc.node_ref(self.doc.arena.untag(self.id))
    }

    /// Same node (identity, not structural equality).
    pub fn same_node(&self, other: &NodeRef<'_>) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }

    pub fn as_scalar(&self) -> Option<&'a Scalar> {
        match self.untagged().node() {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self.as_scalar()? {
            Scalar::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.as_scalar()? {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.as_scalar()? {
            Scalar::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.as_scalar()? {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.as_scalar(), Some(Scalar::Null))
    }

    /// Items of a sequence; empty for any other kind.
    pub fn items(&self) -> impl Iterator<Item = NodeRef<'a>> + use<'a> {
        let doc = self.doc;
        let ids: &'a [NodeId] = match self.untagged().node() {
            Node::Sequence(items) => items,
            _ => &[],
        };
        ids.iter().map(move |id| doc.node_ref(*id))
    }

    /// Entries of a mapping or ordered mapping; empty for any other kind.
    pub fn entries(&self) -> impl Iterator<Item = (NodeRef<'a>, NodeRef<'a>)> + use<'a> {
        let doc = self.doc;
        let pairs: &'a [(NodeId, NodeId)] = match self.untagged().node() {
            Node::Mapping(pairs) | Node::OrderedMapping(pairs) => pairs,
            _ => &[],
        };
        pairs
            .iter()
            .map(move |(k, v)| (doc.node_ref(*k), doc.node_ref(*v)))
    }

    /// Value stored under the string key `key`; the first match wins.
    pub fn get(&self, key: &str) -> Option<NodeRef<'a>> {
        self.entries()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Sequence item at `index`.
    pub fn index(&self, index: usize) -> Option<NodeRef<'a>> {
        self.items().nth(index)
    }

    /// Number of children of a container, 0 for scalars.
    pub fn len(&self) -> usize {
        match self.untagged().node() {
            Node::Sequence(items) => items.len(),
            Node::Mapping(pairs) | Node::OrderedMapping(pairs) => pairs.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("node", self.node())
            .finish()
    }
}
