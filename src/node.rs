//! Annotated phylogenetic tree built on an arena of nodes.
//!
//! Nodes are addressed by stable [`NodeId`] handles into a [`Tree`]; parent
//! and child links are handles, so structural rewrites (pruning, splicing)
//! never chase ownership cycles. All structural mutation goes through
//! `Tree` methods, which keep parent/child back-pointers consistent.

// Traits
use core::fmt;
use core::fmt::Write as _;

// Structs
use crate::errors::NewickError;

/// Stable handle to a node in a [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeId {
    #[inline]
    fn from(index: usize) -> Self {
        NodeId(index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One lineage segment of the tree.
///
/// `time` is absolute, measured from the root's seed time; it is set when
/// the node stops being a live leaf (birth, death, burst, or the end of
/// the simulation). The branch's character history starts at
/// `rootward_state` and advances through `state_changes`, whose entries
/// are `(from, to)` pairs timestamped by `state_change_times`.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    seed_time: Option<f64>,
    pub label: Option<String>,
    pub time: Option<f64>,
    pub rootward_state: usize,
    pub state_changes: Vec<(usize, usize)>,
    pub state_change_times: Vec<f64>,
    pub state_change_heights: Vec<f64>,
    pub is_extinct: bool,
    pub is_burst_node: bool,
}

impl Node {
    pub fn new(rootward_state: usize) -> Self {
        Node {
            parent: None,
            children: Vec::new(),
            seed_time: None,
            label: None,
            time: None,
            rootward_state,
            state_changes: Vec::new(),
            state_change_times: Vec::new(),
            state_change_heights: Vec::new(),
            is_extinct: false,
            is_burst_node: false,
        }
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn seed_time(&self) -> Option<f64> {
        self.seed_time
    }

    /// The state on the leafward end of this node's branch.
    #[inline]
    pub fn leafward_state(&self) -> usize {
        match self.state_changes.last() {
            Some(&(_, to)) => to,
            None => self.rootward_state,
        }
    }
}

enum NewickFlavor {
    Simple,
    Simmap,
}

/// A rooted tree of [`Node`]s stored in an arena.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Tree {
    /// Build a tree around a detached root node.
    pub fn new(root: Node) -> Self {
        assert!(root.parent.is_none(), "root node cannot have a parent");
        Tree {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    /// Seed time of the root's own branch.
    #[inline]
    pub fn seed_time(&self) -> Option<f64> {
        self.node(self.root).seed_time
    }

    /// Set the time at which the root's branch began.
    pub fn set_seed_time(&mut self, time: f64) {
        let root = self.root;
        self.node_mut(root).seed_time = Some(time);
    }

    /// Add a detached node to the arena.
    pub fn push_node(&mut self, node: Node) -> NodeId {
        assert!(node.parent.is_none(), "pushed node cannot have a parent");
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Add `node` to the arena as a new child of `parent`.
    pub fn spawn_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let child = self.push_node(node);
        self.add_child(parent, child);
        child
    }

    /// Register `child` under `parent`, detaching it from any previous
    /// parent first.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        assert_ne!(parent, child, "node cannot be its own child");
        assert_ne!(
            self.node(parent).parent,
            Some(child),
            "parent of node cannot also be its child"
        );
        self.set_parent(child, Some(parent));
    }

    /// Detach `child` from `parent`.
    ///
    /// Panics if `child` is not currently a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let pos = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == child)
            .expect("child node to remove is not a child");
        self.nodes[parent.0].children.remove(pos);
        self.nodes[child.0].parent = None;
    }

    /// Re-parent `child`, keeping both parents' child lists consistent.
    pub fn set_parent(&mut self, child: NodeId, new_parent: Option<NodeId>) {
        if let Some(old) = self.nodes[child.0].parent {
            self.nodes[old.0].children.retain(|&c| c != child);
        }
        self.nodes[child.0].parent = new_parent;
        if let Some(parent) = new_parent {
            if !self.nodes[parent.0].children.contains(&child) {
                self.nodes[parent.0].children.push(child);
            }
        }
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[inline]
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).parent.is_none()
    }

    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).children.is_empty()
    }

    /// Is `ancestor` on the rootward path from `id`?
    pub fn has_ancestor(&self, id: NodeId, ancestor: NodeId) -> bool {
        self.ancestor_iter(id).any(|a| a == ancestor)
    }

    // ------------------------------------------------------------------
    // Traversal

    /// Pre-order traversal of the subtree at `from`: every parent is
    /// visited before its children.
    pub fn leafward_iter(&self, from: NodeId) -> LeafwardIter {
        LeafwardIter {
            tree: self,
            stack: vec![from],
        }
    }

    /// Post-order traversal of the subtree at `from`: every parent is
    /// visited after its children.
    pub fn rootward_iter(&self, from: NodeId) -> RootwardIter {
        RootwardIter {
            tree: self,
            stack: vec![(from, false)],
        }
    }

    /// Pre-order traversal that skips leaves.
    pub fn internal_leafward_iter(&self, from: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let tree = self;
        self.leafward_iter(from).filter(move |&n| !tree.is_leaf(n))
    }

    /// Post-order traversal that skips leaves.
    pub fn internal_rootward_iter(&self, from: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let tree = self;
        self.rootward_iter(from).filter(move |&n| !tree.is_leaf(n))
    }

    /// The leaves of the subtree at `from`, in post-order.
    pub fn leaf_iter(&self, from: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let tree = self;
        self.rootward_iter(from).filter(move |&n| tree.is_leaf(n))
    }

    /// The ancestors of `id`, walking rootward; excludes `id` itself.
    pub fn ancestor_iter(&self, id: NodeId) -> AncestorIter {
        AncestorIter {
            tree: self,
            next_up: self.node(id).parent,
        }
    }

    // ------------------------------------------------------------------
    // Derived scalars

    #[inline]
    fn time_of(&self, id: NodeId) -> f64 {
        self.node(id).time.expect("node time is not set")
    }

    /// Length of the branch subtending `id`.
    ///
    /// The root's branch runs from its seed time; a root that was never
    /// seeded has a zero-length branch.
    pub fn branch_length(&self, id: NodeId) -> f64 {
        let node = self.node(id);
        match node.parent {
            Some(parent) => self.time_of(id) - self.time_of(parent),
            None => match node.seed_time {
                Some(seed_time) => self.time_of(id) - seed_time,
                None => 0.0,
            },
        }
    }

    /// Sum of the branch lengths of every descendant of `id` (the branch
    /// subtending `id` itself is excluded).
    pub fn tree_length(&self, id: NodeId) -> f64 {
        self.leafward_iter(id)
            .filter(|&n| n != id)
            .map(|n| self.branch_length(n))
            .sum()
    }

    /// The largest leaf time in the tree.
    pub fn max_time(&self) -> f64 {
        self.leaf_iter(self.root)
            .map(|l| self.time_of(l))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Distance from `id` up to the tallest leaf of the tree.
    pub fn height(&self, id: NodeId) -> f64 {
        self.max_time() - self.time_of(id)
    }

    pub fn number_of_leaves(&self, from: NodeId) -> usize {
        self.leaf_iter(from).count()
    }

    pub fn number_of_extant_leaves(&self, from: NodeId) -> usize {
        self.leaf_iter(from)
            .filter(|&l| !self.node(l).is_extinct)
            .count()
    }

    pub fn number_of_extinct_leaves(&self, from: NodeId) -> usize {
        self.leaf_iter(from)
            .filter(|&l| self.node(l).is_extinct)
            .count()
    }

    pub fn has_extant_leaves(&self, from: NodeId) -> bool {
        self.leaf_iter(from).any(|l| !self.node(l).is_extinct)
    }

    // ------------------------------------------------------------------
    // Character-state history

    /// The state on the leafward end of `id`'s branch.
    #[inline]
    pub fn leafward_state(&self, id: NodeId) -> usize {
        self.node(id).leafward_state()
    }

    /// Record a state change on `id`'s branch at absolute `time`.
    pub fn transition_state(&mut self, id: NodeId, new_state: usize, time: f64) {
        let from = self.leafward_state(id);
        let node = self.node_mut(id);
        node.state_changes.push((from, new_state));
        node.state_change_times.push(time);
    }

    /// The branch's character history as `(state, duration)` segments in
    /// leafward order. Durations sum to the branch length.
    pub fn state_history(&self, id: NodeId) -> Vec<(usize, f64)> {
        let node = self.node(id);
        if node.state_changes.is_empty() {
            return vec![(node.rootward_state, self.branch_length(id))];
        }
        let mut current_time = match node.parent {
            Some(parent) => self.time_of(parent),
            None => node
                .seed_time
                .expect("root with state changes has no seed time"),
        };
        let mut history = Vec::with_capacity(node.state_changes.len() + 1);
        for (i, &(from, _)) in node.state_changes.iter().enumerate() {
            let change_time = node.state_change_times[i];
            history.push((from, change_time - current_time));
            current_time = change_time;
        }
        history.push((node.leafward_state(), self.time_of(id) - current_time));
        history
    }

    // ------------------------------------------------------------------
    // Newick / SimMap serialization

    /// Newick string with plain branch-length annotations, `;` terminated.
    ///
    /// With `include_root_annotations` the whole tree is wrapped in an
    /// extra pair of parentheses so the root's own (seeded) branch carries
    /// an annotation too.
    pub fn as_newick_simple_string(&self, include_root_annotations: bool) -> String {
        let mut out = String::new();
        self.write_newick(
            self.root,
            include_root_annotations,
            &NewickFlavor::Simple,
            &mut out,
        );
        out.push(';');
        out
    }

    /// Newick string with SimMap `{state,duration:...}` annotations
    /// describing each branch's character history, `;` terminated.
    pub fn as_newick_simmap_string(&self, include_root_annotations: bool) -> String {
        let mut out = String::new();
        self.write_newick(
            self.root,
            include_root_annotations,
            &NewickFlavor::Simmap,
            &mut out,
        );
        out.push(';');
        out
    }

    fn write_newick(
        &self,
        id: NodeId,
        include_root_annotations: bool,
        flavor: &NewickFlavor,
        out: &mut String,
    ) {
        let is_root = self.is_root(id);
        let wrap = is_root && include_root_annotations;
        if wrap {
            out.push('(');
        }
        if self.is_leaf(id) {
            self.write_annotation(id, true, flavor, out);
        } else {
            out.push('(');
            for (i, &child) in self.node(id).children.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                self.write_newick(child, include_root_annotations, flavor, out);
            }
            out.push(')');
            if !is_root || include_root_annotations {
                self.write_annotation(id, false, flavor, out);
            }
        }
        if wrap {
            out.push(')');
        }
    }

    fn write_annotation(
        &self,
        id: NodeId,
        include_label: bool,
        flavor: &NewickFlavor,
        out: &mut String,
    ) {
        if include_label {
            if let Some(label) = &self.node(id).label {
                out.push_str(label);
            }
        }
        match flavor {
            NewickFlavor::Simple => {
                let _ = write!(out, ":{}", self.branch_length(id));
            }
            NewickFlavor::Simmap => {
                out.push_str(":{");
                for (i, (state, duration)) in self.state_history(id).iter().enumerate() {
                    if i > 0 {
                        out.push(':');
                    }
                    let _ = write!(out, "{},{}", state, duration);
                }
                out.push('}');
            }
        }
    }

    /// Parse a simple-form Newick string produced by
    /// [`Tree::as_newick_simple_string`].
    ///
    /// Branch lengths are laid back out as absolute times from a zero
    /// baseline; a wrapping pair of root parentheses is recognized and
    /// restored as the root's seeded branch. Character states are not part
    /// of the simple form, so every node gets state 0.
    pub fn from_newick_simple(s: &str) -> Result<Tree, NewickError> {
        let mut parser = NewickParser {
            bytes: s.as_bytes(),
            pos: 0,
        };
        let proto = parser.parse_subtree()?;
        parser.expect(b';')?;
        if parser.pos != parser.bytes.len() {
            return Err(parser.error("trailing characters after ';'"));
        }

        let (proto, wrapped) =
            if proto.label.is_none() && proto.length.is_none() && proto.children.len() == 1 {
                (proto.children.into_iter().next().unwrap(), true)
            } else {
                (proto, false)
            };

        let mut root = Node::new(0);
        root.label = proto.label.clone();
        if wrapped || proto.length.is_some() {
            root.seed_time = Some(0.0);
            root.time = Some(proto.length.unwrap_or(0.0));
        } else {
            root.time = Some(0.0);
        }
        let root_time = root.time.unwrap();
        let mut tree = Tree::new(root);
        let root_id = tree.root();
        for child in proto.children {
            Self::graft_proto(&mut tree, root_id, root_time, child);
        }
        Ok(tree)
    }

    fn graft_proto(tree: &mut Tree, parent: NodeId, parent_time: f64, proto: ProtoNode) {
        let mut node = Node::new(0);
        node.label = proto.label;
        let time = parent_time + proto.length.unwrap_or(0.0);
        node.time = Some(time);
        let id = tree.spawn_child(parent, node);
        for child in proto.children {
            Self::graft_proto(tree, id, time, child);
        }
    }

    // ------------------------------------------------------------------
    // Pruning

    /// A copy of the tree with every all-extinct clade removed and the
    /// resulting unifurcations collapsed.
    ///
    /// Returns `None` when no leaf of the tree is extant.
    pub fn prune_extinct_leaves(&self) -> Option<Tree> {
        if !self.has_extant_leaves(self.root) {
            return None;
        }
        let mut tree = self.clone();
        let doomed: Vec<NodeId> = tree
            .leafward_iter(tree.root)
            .filter(|&n| match tree.parent(n) {
                Some(parent) => {
                    !tree.has_extant_leaves(n) && tree.has_extant_leaves(parent)
                }
                None => false,
            })
            .collect();
        for n in doomed {
            let parent = tree.parent(n).expect("doomed clade has a parent");
            tree.remove_child(parent, n);
        }
        tree.remove_unifurcations_in_place();
        Some(tree)
    }

    /// A copy of the tree with every out-degree-one node spliced out.
    pub fn remove_unifurcations(&self) -> Tree {
        let mut tree = self.clone();
        tree.remove_unifurcations_in_place();
        tree
    }

    /// Splice out every node with exactly one child, in pre-order.
    ///
    /// The surviving child takes the removed node's place among its
    /// siblings, inherits its `rootward_state`, and has the removed node's
    /// state history prepended to its own. A removed root passes
    /// `seed_time` to the surviving child, which becomes the new root.
    fn remove_unifurcations_in_place(&mut self) {
        let unifurcations: Vec<NodeId> = self
            .leafward_iter(self.root)
            .filter(|&n| self.node(n).children.len() == 1)
            .collect();
        for node in unifurcations {
            let child = self.node(node).children[0];
            self.nodes[child.0].rootward_state = self.nodes[node.0].rootward_state;
            let mut changes = self.nodes[node.0].state_changes.clone();
            changes.extend(self.nodes[child.0].state_changes.iter().copied());
            self.nodes[child.0].state_changes = changes;
            let mut times = self.nodes[node.0].state_change_times.clone();
            times.extend(self.nodes[child.0].state_change_times.iter().copied());
            self.nodes[child.0].state_change_times = times;
            let mut heights = self.nodes[node.0].state_change_heights.clone();
            heights.extend(self.nodes[child.0].state_change_heights.iter().copied());
            self.nodes[child.0].state_change_heights = heights;
            match self.nodes[node.0].parent {
                Some(parent) => {
                    let pos = self.nodes[parent.0]
                        .children
                        .iter()
                        .position(|&c| c == node)
                        .expect("unifurcation is not registered with its parent");
                    self.nodes[parent.0].children[pos] = child;
                    self.nodes[child.0].parent = Some(parent);
                    self.nodes[node.0].parent = None;
                    self.nodes[node.0].children.clear();
                }
                None => {
                    debug_assert_eq!(node, self.root);
                    self.nodes[child.0].seed_time = self.nodes[node.0].seed_time;
                    self.nodes[child.0].parent = None;
                    self.nodes[node.0].children.clear();
                    self.root = child;
                }
            }
        }
    }
}

impl fmt::Display for Tree {
    /// The SimMap form with root annotations, as written to output files.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_newick_simmap_string(true))
    }
}

/// See [`Tree::leafward_iter`].
pub struct LeafwardIter<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for LeafwardIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(node).children.iter().rev());
        Some(node)
    }
}

/// See [`Tree::rootward_iter`].
pub struct RootwardIter<'a> {
    tree: &'a Tree,
    stack: Vec<(NodeId, bool)>,
}

impl<'a> Iterator for RootwardIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((node, expanded)) = self.stack.pop() {
            if expanded {
                return Some(node);
            }
            self.stack.push((node, true));
            self.stack
                .extend(self.tree.node(node).children.iter().rev().map(|&c| (c, false)));
        }
        None
    }
}

/// See [`Tree::ancestor_iter`].
pub struct AncestorIter<'a> {
    tree: &'a Tree,
    next_up: Option<NodeId>,
}

impl<'a> Iterator for AncestorIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next_up?;
        self.next_up = self.tree.node(current).parent;
        Some(current)
    }
}

struct ProtoNode {
    label: Option<String>,
    length: Option<f64>,
    children: Vec<ProtoNode>,
}

struct NewickParser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> NewickParser<'a> {
    fn error(&self, message: &str) -> NewickError {
        NewickError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), NewickError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    fn parse_subtree(&mut self) -> Result<ProtoNode, NewickError> {
        let mut children = Vec::new();
        if self.peek() == Some(b'(') {
            self.pos += 1;
            loop {
                children.push(self.parse_subtree()?);
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(self.error("expected ',' or ')'")),
                }
            }
        }
        let label = self.parse_label();
        let length = if self.peek() == Some(b':') {
            self.pos += 1;
            Some(self.parse_length()?)
        } else {
            None
        };
        Ok(ProtoNode {
            label,
            length,
            children,
        })
    }

    fn parse_label(&mut self) -> Option<String> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            match byte {
                b'(' | b')' | b',' | b':' | b';' => break,
                _ => self.pos += 1,
            }
        }
        if self.pos == start {
            None
        } else {
            Some(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
        }
    }

    fn parse_length(&mut self) -> Result<f64, NewickError> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            match byte {
                b'(' | b')' | b',' | b':' | b';' => break,
                _ => self.pos += 1,
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| self.error("branch length is not utf-8"))?;
        text.parse()
            .map_err(|_| self.error(&format!("cannot parse branch length '{}'", text)))
    }
}
