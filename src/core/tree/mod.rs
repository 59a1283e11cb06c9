//! The ternary tree: an unrooted binary tree over `n` labelled leaves.
//!
//! A tree with `n` leaves has `n - 2` internal nodes of degree 3, plus one
//! sentinel root of degree 2. The sentinel only exists so that every
//! logical node has a well-defined parent; contracting it recovers the
//! unrooted topology.
//!
//! Nodes live in an arena owned by the tree. The `L/R/P` relations are
//! optional indices into the arena, so every mutation is plain index
//! arithmetic and dropping the arena frees the whole tree. A free-list
//! recycles the slots released by subtree transfers. Nodes are never
//! shared between trees.

mod cost;
mod mutate;

use crate::core::matrix::DistanceMatrix;
use crate::sampling::Coin;

/// The index of a node in its tree's arena.
///
/// Only meaningful paired with the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a node stands for: one of the `n` items, or internal structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// A leaf carrying an item index, i.e. a row of the distance matrix.
    Item(usize),
    /// An internal (or sentinel root) node.
    Internal,
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    label: Label,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

/// Which child slot a node occupies within its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Left,
    Right,
}

impl Slot {
    fn other(self) -> Self {
        match self {
            Slot::Left => Slot::Right,
            Slot::Right => Slot::Left,
        }
    }
}

const ROOT: NodeId = NodeId(0);

/// A ternary tree over the items of a distance matrix.
///
/// Built once by random insertion, then reshaped in place by the three
/// mutation operators. The per-dataset cost extrema are computed at
/// creation and cached for scaling.
#[derive(Debug)]
pub struct Tree<'a> {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    num_leaves: usize,
    num_internal: usize,
    max_cost: f64,
    min_cost: f64,
    data: &'a DistanceMatrix,
}

impl<'a> Tree<'a> {
    /// Builds a random ternary tree over the `n` items of `data`.
    ///
    /// Items are inserted one at a time. Internal nodes all carry the same
    /// sentinel label, so a value-comparison descent would always branch
    /// the same way; instead the descent picks a child by a fair coin, and
    /// on reaching a leaf promotes it to an internal node holding the old
    /// and the new leaf in coin-chosen slots.
    ///
    /// # Panics
    ///
    /// * If an insertion leaves the tree non-ternary. This is a programmer
    ///   error, not an input error.
    pub fn new(data: &'a DistanceMatrix, coin: &mut Coin) -> Self {
        let n = data.n();

        let mut tree = Self {
            nodes: vec![Node {
                label: Label::Internal,
                left: None,
                right: None,
                parent: None,
            }],
            free: Vec::new(),
            num_leaves: 0,
            num_internal: 0,
            max_cost: 0.0,
            min_cost: 0.0,
            data,
        };

        for i in 0..n {
            tree.insert_item(i, coin);
            assert!(tree.is_ternary(), "malformed tree after inserting item {i}");
        }

        tree.num_leaves = tree.count_leaves(ROOT);
        tree.num_internal = tree.count_internal(ROOT);

        let (max_cost, min_cost) = cost::extrema(data);
        tree.max_cost = max_cost;
        tree.min_cost = min_cost;

        tree
    }

    /// The sentinel root.
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// The distance matrix this tree is scored against.
    pub fn data(&self) -> &'a DistanceMatrix {
        self.data
    }

    /// The number of items, i.e. leaves.
    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    /// The number of internal nodes, excluding the sentinel root.
    pub fn num_internal(&self) -> usize {
        self.num_internal
    }

    pub fn label(&self, id: NodeId) -> Label {
        self.node(id).label
    }

    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, label: Label) -> NodeId {
        let node = Node {
            label,
            left: None,
            right: None,
            parent: None,
        };

        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        self.free.push(id);
    }

    fn child(&self, id: NodeId, slot: Slot) -> Option<NodeId> {
        match slot {
            Slot::Left => self.node(id).left,
            Slot::Right => self.node(id).right,
        }
    }

    /// Writes `child` into `slot` of `parent` and fixes the back-pointer.
    fn set_child(&mut self, parent: NodeId, slot: Slot, child: Option<NodeId>) {
        match slot {
            Slot::Left => self.node_mut(parent).left = child,
            Slot::Right => self.node_mut(parent).right = child,
        }
        if let Some(child) = child {
            self.node_mut(child).parent = Some(parent);
        }
    }

    /// The slot `id` occupies within its parent.
    ///
    /// # Panics
    ///
    /// * If `id` is the sentinel root.
    fn slot_in_parent(&self, id: NodeId) -> Slot {
        let parent = self.node(id).parent.expect("the sentinel root has no slot");
        if self.node(parent).left == Some(id) {
            Slot::Left
        } else {
            debug_assert_eq!(self.node(parent).right, Some(id));
            Slot::Right
        }
    }

    fn insert_item(&mut self, value: usize, coin: &mut Coin) {
        let mut at = ROOT;

        loop {
            if self.is_leaf(at) {
                // Promote the leaf into an internal node holding the old
                // value and the new one.
                let old = self.node(at).label;
                let fresh = self.alloc(Label::Item(value));
                let kept = self.alloc(old);

                let (l, r) = if coin.fair() { (fresh, kept) } else { (kept, fresh) };

                self.node_mut(at).label = Label::Internal;
                self.set_child(at, Slot::Left, Some(l));
                self.set_child(at, Slot::Right, Some(r));
                return;
            }

            match (self.node(at).left, self.node(at).right) {
                (Some(l), Some(r)) => {
                    // Full node: sink down a coin-chosen branch.
                    at = if coin.fair() { l } else { r };
                }
                (None, None) => {
                    let slot = if coin.fair() { Slot::Left } else { Slot::Right };
                    let leaf = self.alloc(Label::Item(value));
                    self.set_child(at, slot, Some(leaf));
                    return;
                }
                (None, Some(_)) => {
                    let leaf = self.alloc(Label::Item(value));
                    self.set_child(at, Slot::Left, Some(leaf));
                    return;
                }
                (Some(_), None) => {
                    let leaf = self.alloc(Label::Item(value));
                    self.set_child(at, Slot::Right, Some(leaf));
                    return;
                }
            }
        }
    }

    /// Whether `id` is the sentinel root.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.node(id).parent.is_none()
    }

    /// Whether `id` is a leaf carrying an item index.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        let node = self.node(id);
        matches!(node.label, Label::Item(_)) && node.left.is_none() && node.right.is_none()
    }

    /// Whether `id` is internal: labelled as structure and not the root.
    pub fn is_internal(&self, id: NodeId) -> bool {
        self.node(id).label == Label::Internal && !self.is_root(id)
    }

    /// Whether `a` lies in the subtree rooted at `b`.
    ///
    /// By convention everything is a subtree of the sentinel root, and the
    /// sentinel root is a subtree of nothing.
    pub fn is_subtree_of(&self, a: NodeId, b: NodeId) -> bool {
        if self.is_root(a) {
            return false;
        }
        if self.is_root(b) {
            return true;
        }

        let mut cur = Some(a);
        while let Some(c) = cur {
            if c == b {
                return true;
            }
            cur = self.node(c).parent;
        }
        false
    }

    /// Whether neither of `a`, `b` contains the other.
    pub fn is_disjoint(&self, a: NodeId, b: NodeId) -> bool {
        !self.is_subtree_of(a, b) && !self.is_subtree_of(b, a)
    }

    /// Whether `a` and `b` share a (non-null) parent.
    pub fn is_sibling(&self, a: NodeId, b: NodeId) -> bool {
        match (self.node(a).parent, self.node(b).parent) {
            (Some(pa), Some(pb)) => pa == pb,
            _ => false,
        }
    }

    /// The other child of `id`'s parent, if any.
    pub fn sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        if self.node(parent).left == Some(id) {
            self.node(parent).right
        } else {
            self.node(parent).left
        }
    }

    /// Checks the ternary shape invariant from the root: `n` leaves imply
    /// `n - 2` internal nodes, or none at all while `n <= 2`.
    pub fn is_ternary(&self) -> bool {
        let lc = self.count_leaves(ROOT);
        let ic = self.count_internal(ROOT);

        (lc <= 2 && ic == 0) || ic + 2 == lc
    }

    /// The nodes under `from` in left-to-right (in-order) sequence.
    pub fn inorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = Vec::new();
        let mut cur = Some(from);

        while cur.is_some() || !stack.is_empty() {
            while let Some(c) = cur {
                stack.push(c);
                cur = self.node(c).left;
            }
            let c = stack.pop().expect("stack is non-empty here");
            out.push(c);
            cur = self.node(c).right;
        }

        out
    }

    /// The nodes under `from` in parent-before-child (pre-order) sequence.
    pub fn preorder(&self, from: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![from];

        while let Some(c) = stack.pop() {
            out.push(c);
            // Right pushed first so left pops first.
            if let Some(r) = self.node(c).right {
                stack.push(r);
            }
            if let Some(l) = self.node(c).left {
                stack.push(l);
            }
        }

        out
    }

    pub fn count_leaves(&self, from: NodeId) -> usize {
        self.inorder(from).into_iter().filter(|&n| self.is_leaf(n)).count()
    }

    pub fn count_internal(&self, from: NodeId) -> usize {
        self.inorder(from)
            .into_iter()
            .filter(|&n| self.is_internal(n))
            .count()
    }

    /// Counts the leaves under `from` that are not in the subtree of `x`.
    pub fn count_leaves_excluding(&self, from: NodeId, x: NodeId) -> usize {
        self.inorder(from)
            .into_iter()
            .filter(|&n| self.is_leaf(n) && !self.is_subtree_of(n, x))
            .count()
    }

    /// The item indices at the leaves under `from`, in in-order sequence.
    pub fn leaf_values(&self, from: NodeId) -> Vec<usize> {
        self.inorder(from)
            .into_iter()
            .filter_map(|n| match self.node(n).label {
                Label::Item(i) if self.is_leaf(n) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// Like `leaf_values`, excluding every leaf inside the subtree of `x`.
    pub fn leaf_values_excluding(&self, from: NodeId, x: NodeId) -> Vec<usize> {
        self.inorder(from)
            .into_iter()
            .filter(|&n| !self.is_subtree_of(n, x))
            .filter_map(|n| match self.node(n).label {
                Label::Item(i) if self.is_leaf(n) => Some(i),
                _ => None,
            })
            .collect()
    }

    /// The turns taken from the sentinel root down to `id`, as a string
    /// over `{L, R}`. The root's path is empty.
    pub fn path(&self, id: NodeId) -> String {
        let mut turns = Vec::new();
        let mut cur = id;

        while let Some(parent) = self.node(cur).parent {
            turns.push(match self.slot_in_parent(cur) {
                Slot::Left => 'L',
                Slot::Right => 'R',
            });
            cur = parent;
        }

        turns.into_iter().rev().collect()
    }

    /// Attaches the already-allocated `node` at the position named by
    /// `path`, walking from the sentinel root.
    ///
    /// Every intermediate position on the path must already exist; this
    /// holds when nodes are re-attached in pre-order, as `clone` does.
    fn insert_on_path(&mut self, node: NodeId, path: &str) {
        debug_assert!(!path.is_empty(), "cannot attach at the root position");

        let mut at = ROOT;
        for turn in path[..path.len() - 1].chars() {
            at = match turn {
                'L' => self.node(at).left,
                _ => self.node(at).right,
            }
            .expect("path runs through missing nodes");
        }

        let slot = if path.ends_with('L') { Slot::Left } else { Slot::Right };
        self.set_child(at, slot, Some(node));
    }

    /// A uniform random pick over the nodes reachable from `from`.
    ///
    /// Reservoir rule: the `i`th node examined (1-based) replaces the
    /// current pick with probability `1/i`.
    pub fn random_node(&self, from: NodeId, coin: &mut Coin) -> NodeId {
        let mut picked = from;
        for (i, id) in self.inorder(from).into_iter().enumerate() {
            if coin.flip(1.0 / (i + 1) as f64) {
                picked = id;
            }
        }
        picked
    }

    /// A uniform random pick over the internal nodes under `from`, if any.
    pub fn random_internal(&self, from: NodeId, coin: &mut Coin) -> Option<NodeId> {
        let mut picked = None;
        let mut examined = 0usize;

        for id in self.inorder(from) {
            if self.is_internal(id) {
                examined += 1;
                if coin.flip(1.0 / examined as f64) {
                    picked = Some(id);
                }
            }
        }

        picked
    }

    /// A random leaf under `from`, by fair-coin descent.
    ///
    /// Not uniform over leaves on unbalanced shapes: a leaf at depth `d`
    /// is reached with probability `2^-d`. The search heuristic accepts
    /// this bias.
    pub fn random_leaf(&self, from: NodeId, coin: &mut Coin) -> NodeId {
        let mut at = from;

        while !self.is_leaf(at) {
            at = match (self.node(at).left, self.node(at).right) {
                (Some(l), Some(r)) => {
                    if coin.fair() {
                        l
                    } else {
                        r
                    }
                }
                (Some(l), None) => l,
                (None, Some(r)) => r,
                (None, None) => unreachable!("descended into a childless non-leaf"),
            };
        }

        at
    }

    /// Renders the tree as an indented ASCII outline: item indices at the
    /// leaves, `.` at internal nodes and the root.
    pub fn render(&self) -> String {
        let mut out = String::new();

        for id in self.preorder(ROOT) {
            let depth = self.path(id).len();
            for _ in 0..depth {
                out.push_str("  ");
            }
            match self.node(id).label {
                Label::Item(i) => out.push_str(&i.to_string()),
                Label::Internal => out.push('.'),
            }
            out.push('\n');
        }

        out
    }
}

/// Deep copy: every reachable node is re-created in a fresh arena by
/// walking the source in pre-order and re-attaching along path strings.
/// Copies never alias their source.
impl Clone for Tree<'_> {
    fn clone(&self) -> Self {
        let mut copy = Self {
            nodes: vec![Node {
                label: Label::Internal,
                left: None,
                right: None,
                parent: None,
            }],
            free: Vec::new(),
            num_leaves: self.num_leaves,
            num_internal: self.num_internal,
            max_cost: self.max_cost,
            min_cost: self.min_cost,
            data: self.data,
        };

        for id in self.preorder(ROOT) {
            if self.is_root(id) {
                continue;
            }
            let node = copy.alloc(self.label(id));
            copy.insert_on_path(node, &self.path(id));
        }

        copy
    }
}

impl std::fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}
