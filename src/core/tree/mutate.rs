//! The three shape-preserving mutation operators and their composition.
//!
//! Every operator either rearranges the tree in place or declines: the
//! sentinel root never participates, identical operands do nothing, and
//! overlapping subtrees are refused. A declined call leaves the tree
//! untouched. Siblings are a special case: both interchange and transfer
//! reduce to reordering the pair under their common parent.
//!
//! Declined is ordinary; a tree that comes out of an operator non-ternary
//! is a programmer error and aborts.

use crate::sampling::Coin;

use super::{Label, NodeId, Slot, Tree};

impl Tree<'_> {
    /// Exchanges two leaves.
    ///
    /// Declines if `a == b` or either is the root or parentless.
    pub fn leaf_interchange(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }

        let (Some(pa), Some(pb)) = (self.parent(a), self.parent(b)) else {
            return;
        };

        debug_assert!(self.is_leaf(a) && self.is_leaf(b));

        let sa = self.slot_in_parent(a);
        let sb = self.slot_in_parent(b);

        self.set_child(pa, sa, Some(b));
        self.set_child(pb, sb, Some(a));
    }

    /// Swaps the subtrees rooted at `a` and `b`.
    ///
    /// Declines on identical, root, or overlapping operands. Siblings are
    /// reordered under their common parent instead.
    pub fn subtree_interchange(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.is_root(a) || self.is_root(b) {
            return;
        }

        if self.is_sibling(a, b) {
            self.swap_siblings(a);
            return;
        }

        if !self.is_disjoint(a, b) {
            return;
        }

        let pa = self.parent(a).expect("non-root node has a parent");
        let pb = self.parent(b).expect("non-root node has a parent");
        let sa = self.slot_in_parent(a);
        let sb = self.slot_in_parent(b);

        self.set_child(pa, sa, Some(b));
        self.set_child(pb, sb, Some(a));
    }

    /// Grafts the subtree rooted at `a` next to `b`.
    ///
    /// Declines on identical, root, or overlapping operands; siblings are
    /// reordered in place. Otherwise a new internal node is spliced in
    /// immediately above `b`, `a` is detached from its old parent and
    /// becomes the splice's other child, and the vacated parent link is
    /// contracted away. Leaf and internal counts are both preserved.
    pub fn subtree_transfer(&mut self, a: NodeId, b: NodeId) {
        if a == b || self.is_root(a) || self.is_root(b) {
            return;
        }

        if self.is_sibling(a, b) {
            self.swap_siblings(a);
            return;
        }

        if !self.is_disjoint(a, b) {
            return;
        }

        let par = self.parent(a).expect("non-root node has a parent");
        let sa = self.slot_in_parent(a);

        // Splice a new internal node above b, then hang a off its free slot.
        let splice = self.graft_above(b);
        let open = if self.left(splice).is_none() {
            Slot::Left
        } else {
            Slot::Right
        };
        self.set_child(splice, open, Some(a));

        // Detach a, leaving its former sibling alone under par.
        self.set_child(par, sa, None);
        let sib = self
            .child(par, sa.other())
            .expect("detaching a node must leave its sibling behind");

        if self.is_root(par) {
            // The sibling of a node under the sentinel root is internal
            // here: a leaf sibling would have made b a sibling of a.
            // Contract it into the root rather than leaving the root with
            // a single child.
            debug_assert!(self.is_internal(sib));
            let removed = self.contract(par);
            self.release(removed);
        } else {
            let removed = self.promote(sib);
            self.release(removed);
        }
    }

    /// Applies `k` elementary mutations, each an operator chosen by a fair
    /// three-sided die with operands drawn by the matching random picker.
    ///
    /// # Panics
    ///
    /// * If any elementary step leaves the tree non-ternary or changes the
    ///   leaf count. Either is a programmer error.
    pub fn k_mutation(&mut self, k: usize, coin: &mut Coin) {
        let root = self.root();

        for _ in 0..k {
            match coin.roll(3) {
                0 => {
                    let a = self.random_leaf(root, coin);
                    let b = self.random_leaf(root, coin);
                    self.leaf_interchange(a, b);
                }
                1 => {
                    let a = self.random_node(root, coin);
                    let b = self.random_node(root, coin);
                    self.subtree_interchange(a, b);
                }
                _ => {
                    let a = self.random_node(root, coin);
                    let b = self.random_node(root, coin);
                    self.subtree_transfer(a, b);
                }
            }

            assert!(self.is_ternary(), "malformed tree after mutation");
            assert_eq!(
                self.count_leaves(root),
                self.num_leaves(),
                "leaf count drifted after mutation"
            );
        }
    }

    /// Reorders two siblings under their common parent.
    fn swap_siblings(&mut self, a: NodeId) {
        let parent = self.parent(a).expect("siblings have a parent");
        let (l, r) = (self.left(parent), self.right(parent));
        self.set_child(parent, Slot::Left, r);
        self.set_child(parent, Slot::Right, l);
    }

    /// Splices a fresh internal node between `b` and its parent; `b` keeps
    /// the child slot it occupied. Returns the new node, which has one
    /// open slot.
    fn graft_above(&mut self, b: NodeId) -> NodeId {
        let parent = self.parent(b).expect("cannot graft above the sentinel root");
        let slot = self.slot_in_parent(b);
        let fresh = self.alloc(Label::Internal);

        self.set_child(parent, slot, Some(fresh));
        self.set_child(fresh, slot, Some(b));

        fresh
    }

    /// Contracts `n`'s single remaining child by promoting the grandchildren
    /// into `n`'s own slots. Returns the removed child for release.
    fn contract(&mut self, n: NodeId) -> NodeId {
        let only = match (self.left(n), self.right(n)) {
            (Some(c), None) | (None, Some(c)) => c,
            _ => unreachable!("contract requires exactly one child"),
        };

        let (gl, gr) = (self.left(only), self.right(only));
        self.set_child(n, Slot::Left, gl);
        self.set_child(n, Slot::Right, gr);

        only
    }

    /// Splices `child` into the place of its parent, whose other slot must
    /// be vacant. Returns the removed parent for release.
    fn promote(&mut self, child: NodeId) -> NodeId {
        let parent = self.parent(child).expect("cannot promote the root");
        let grand = self
            .parent(parent)
            .expect("cannot promote into the sentinel root");

        debug_assert!(self.child(parent, self.slot_in_parent(child).other()).is_none());

        let slot = self.slot_in_parent(parent);
        self.set_child(grand, slot, Some(child));

        parent
    }
}

#[cfg(test)]
mod tests {
    use crate::core::matrix::DistanceMatrix;
    use crate::sampling::Coin;

    use super::super::Tree;

    fn chain_matrix(n: usize) -> DistanceMatrix {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| (i as f64 - j as f64).abs()).collect())
            .collect();
        DistanceMatrix::from_rows(rows).unwrap()
    }

    fn leaf_bijection(tree: &Tree, n: usize) {
        let mut values = tree.leaf_values(tree.root());
        values.sort_unstable();
        assert_eq!(values, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn test_leaf_interchange() {
        let data = chain_matrix(8);
        let mut coin = Coin::seeded(1);
        let mut tree = Tree::new(&data, &mut coin);
        let root = tree.root();

        let a = tree.random_leaf(root, &mut coin);
        let b = tree.random_leaf(root, &mut coin);
        tree.leaf_interchange(a, b);

        assert!(tree.is_ternary());
        leaf_bijection(&tree, 8);
    }

    #[test]
    fn test_interchange_decline_is_identity() {
        let data = chain_matrix(8);
        let mut coin = Coin::seeded(2);
        let mut tree = Tree::new(&data, &mut coin);
        let root = tree.root();
        let leaf = tree.random_leaf(root, &mut coin);
        let before = tree.render();

        // Identical operands.
        tree.leaf_interchange(leaf, leaf);
        assert_eq!(tree.render(), before);

        // The root cannot participate.
        tree.subtree_interchange(root, leaf);
        assert_eq!(tree.render(), before);
        tree.subtree_transfer(leaf, root);
        assert_eq!(tree.render(), before);

        // Overlapping subtrees are refused.
        let ancestor = tree.parent(leaf).unwrap();
        if !tree.is_root(ancestor) {
            tree.subtree_interchange(ancestor, leaf);
            assert_eq!(tree.render(), before);
            tree.subtree_transfer(ancestor, leaf);
            assert_eq!(tree.render(), before);
        }
    }

    #[test]
    fn test_sibling_interchange_reorders_in_place() {
        let data = chain_matrix(8);
        let mut coin = Coin::seeded(3);
        let mut tree = Tree::new(&data, &mut coin);
        let root = tree.root();

        let l = tree.left(root).unwrap();
        let r = tree.right(root).unwrap();
        tree.subtree_interchange(l, r);

        assert_eq!(tree.left(root), Some(r));
        assert_eq!(tree.right(root), Some(l));
        assert!(tree.is_ternary());
        leaf_bijection(&tree, 8);
    }

    #[test]
    fn test_subtree_transfer_preserves_counts() {
        let data = chain_matrix(12);
        let mut coin = Coin::seeded(4);
        let mut tree = Tree::new(&data, &mut coin);
        let root = tree.root();

        for _ in 0..500 {
            let a = tree.random_node(root, &mut coin);
            let b = tree.random_node(root, &mut coin);
            tree.subtree_transfer(a, b);

            assert!(tree.is_ternary());
            assert_eq!(tree.count_internal(root), tree.num_internal());
            leaf_bijection(&tree, 12);
        }
    }

    #[test]
    fn test_mutation_storm_preserves_shape() {
        // 10k elementary mutations in random composition on n = 16.
        let data = chain_matrix(16);
        let mut coin = Coin::seeded(5);
        let mut tree = Tree::new(&data, &mut coin);

        // k_mutation asserts the shape invariant after every step.
        tree.k_mutation(10_000, &mut coin);
        leaf_bijection(&tree, 16);
    }

    #[test]
    fn test_mutation_storm_small_trees() {
        // Degenerate sizes must survive the operators too.
        for n in [2, 3, 4] {
            let data = chain_matrix(n);
            let mut coin = Coin::seeded(n as u64);
            let mut tree = Tree::new(&data, &mut coin);
            tree.k_mutation(2_000, &mut coin);
            leaf_bijection(&tree, n);
        }
    }
}
