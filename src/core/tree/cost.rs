//! The quartet cost of a tree and its per-dataset extrema.
//!
//! Each internal node splits the items three ways: the leaves under its
//! left child, under its right child, and everything else. Weighting the
//! cross-partition distance sums by the binomial coefficients of the
//! opposite part counts how often each pair appears in an inconsistent
//! quartet, so the sum over internal nodes is the total cost of all
//! `C(n, 4)` embedded quartet topologies.

use crate::core::matrix::DistanceMatrix;
use crate::utils::helpers::binomial;

use super::{NodeId, Tree};

impl Tree<'_> {
    /// The unscaled quartet cost `C(T)`: the sum of per-node costs over
    /// all internal nodes. Pure; recomputing returns bit-identical values.
    pub fn cost(&self) -> f64 {
        self.preorder(self.root())
            .into_iter()
            .filter(|&v| self.is_internal(v))
            .map(|v| self.node_cost(v))
            .sum()
    }

    /// The normalised cost `S(T) = (Cmax - C(T)) / (Cmax - Cmin)`, in
    /// `[0, 1]`; 1 is a perfect embedding of every quartet.
    ///
    /// When the extrema coincide (fewer than 4 items, or a degenerate
    /// matrix) every tree embeds every quartet equally well and `S(T)` is
    /// 1 by convention.
    pub fn cost_scaled(&self) -> f64 {
        let spread = self.max_cost - self.min_cost;
        if spread == 0.0 {
            1.0
        } else {
            (self.max_cost - self.cost()) / spread
        }
    }

    /// The cached `Cmax` for this dataset.
    pub fn max_cost(&self) -> f64 {
        self.max_cost
    }

    /// The cached `Cmin` for this dataset.
    pub fn min_cost(&self) -> f64 {
        self.min_cost
    }

    /// The cost contribution of one internal node `v`.
    fn node_cost(&self, v: NodeId) -> f64 {
        let left = self.left(v).expect("internal nodes are full");
        let right = self.right(v).expect("internal nodes are full");

        let values_l = self.leaf_values(left);
        let values_r = self.leaf_values(right);
        let values_p = self.leaf_values_excluding(self.root(), v);

        let combi_l = binomial(values_l.len() as u64, 2) as f64;
        let combi_r = binomial(values_r.len() as u64, 2) as f64;
        let combi_p = binomial(values_p.len() as u64, 2) as f64;

        let dist_lr = cross_sum(self.data, &values_l, &values_r);
        let dist_pl = cross_sum(self.data, &values_p, &values_l);
        let dist_pr = cross_sum(self.data, &values_p, &values_r);

        combi_p * dist_lr + combi_r * dist_pl + combi_l * dist_pr
    }
}

/// Sums `D[i][j]` over the cross product of two disjoint item sets.
///
/// # Panics
///
/// * If the sets share an item: the three-way partition at an internal
///   node can never repeat an item, so a duplicate means the tree is
///   corrupt.
fn cross_sum(data: &DistanceMatrix, xs: &[usize], ys: &[usize]) -> f64 {
    let mut total = 0.0;

    for &i in xs {
        for &j in ys {
            assert_ne!(i, j, "item {i} appears on both sides of a quartet split");
            total += data.get(i, j);
        }
    }

    total
}

/// The per-dataset cost extrema `(Cmax, Cmin)`.
///
/// Every 4-subset `i < j < k < l` admits three pairings; summing the
/// heaviest over all subsets bounds the cost of the worst tree, the
/// lightest the best. `Theta(n^4)`, computed once per tree creation.
/// With fewer than 4 items there are no quartets and both extrema are 0.
pub(crate) fn extrema(data: &DistanceMatrix) -> (f64, f64) {
    let n = data.n();
    let mut max = 0.0;
    let mut min = 0.0;
    let mut count = 0u64;

    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                for l in (k + 1)..n {
                    let ij_kl = data.get(i, j) + data.get(k, l);
                    let ik_jl = data.get(i, k) + data.get(j, l);
                    let il_jk = data.get(i, l) + data.get(j, k);

                    max += ij_kl.max(ik_jl).max(il_jk);
                    min += ij_kl.min(ik_jl).min(il_jk);
                    count += 1;
                }
            }
        }
    }

    debug_assert_eq!(count, binomial(n as u64, 4));

    (max, min)
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;

    use crate::core::matrix::DistanceMatrix;
    use crate::sampling::Coin;

    use super::super::Tree;
    use super::*;

    fn chain_matrix(n: usize) -> DistanceMatrix {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| (i as f64 - j as f64).abs()).collect())
            .collect();
        DistanceMatrix::from_rows(rows).unwrap()
    }

    /// Two tight pairs, unit distance across: only the `01|23` topology is
    /// consistent.
    fn block_matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![1.0, 1.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_extrema_block() {
        // The single quartet {0,1,2,3}: pairings sum to 0, 2 and 2.
        let (max, min) = extrema(&block_matrix());
        assert_approx_eq!(f64, max, 2.0);
        assert_approx_eq!(f64, min, 0.0);
    }

    #[test]
    fn test_extrema_small_n() {
        for n in [1, 2, 3] {
            let (max, min) = extrema(&chain_matrix(n));
            assert_eq!(max, 0.0);
            assert_eq!(min, 0.0);
        }
    }

    #[test]
    fn test_extrema_against_combinations() {
        let data = chain_matrix(7);
        let (max, min) = extrema(&data);

        let (mut expect_max, mut expect_min) = (0.0, 0.0);
        for quad in (0..7).combinations(4) {
            let (i, j, k, l) = (quad[0], quad[1], quad[2], quad[3]);
            let sums = [
                data.get(i, j) + data.get(k, l),
                data.get(i, k) + data.get(j, l),
                data.get(i, l) + data.get(j, k),
            ];
            expect_max += sums.iter().cloned().fold(f64::MIN, f64::max);
            expect_min += sums.iter().cloned().fold(f64::MAX, f64::min);
        }

        assert_approx_eq!(f64, max, expect_max);
        assert_approx_eq!(f64, min, expect_min);
        assert!(min < max);
    }

    #[test]
    fn test_perfect_tree_scores_one() {
        let data = block_matrix();
        let mut coin = Coin::seeded(11);

        // Some random tree on this matrix; its cost is either 0 (perfect
        // topology) or 2, so the scaled score is 1 or 0.
        let tree = Tree::new(&data, &mut coin);
        let scaled = tree.cost_scaled();
        assert!(scaled == 1.0 || scaled == 0.0, "scaled: {scaled}");

        // Steer to the perfect topology and pin the score at 1.
        let mut tree = tree;
        let mut coin = Coin::seeded(13);
        for _ in 0..200 {
            if tree.cost() == 0.0 {
                break;
            }
            let mut candidate = tree.clone();
            candidate.k_mutation(2, &mut coin);
            if candidate.cost() < tree.cost() {
                tree = candidate;
            }
        }
        assert_eq!(tree.cost(), 0.0);
        assert_eq!(tree.cost_scaled(), 1.0);
    }

    #[test]
    fn test_cost_is_deterministic() {
        let data = chain_matrix(8);
        let mut coin = Coin::seeded(8);
        let tree = Tree::new(&data, &mut coin);

        assert_eq!(tree.cost().to_bits(), tree.cost().to_bits());
        assert_eq!(tree.cost().to_bits(), tree.clone().cost().to_bits());
    }

    #[test]
    fn test_scaled_cost_in_bounds() {
        let data = chain_matrix(9);
        let mut coin = Coin::seeded(17);

        for _ in 0..20 {
            let mut tree = Tree::new(&data, &mut coin);
            tree.k_mutation(5, &mut coin);
            let scaled = tree.cost_scaled();
            assert!((0.0..=1.0).contains(&scaled), "scaled: {scaled}");

            let cost = tree.cost();
            assert!(tree.min_cost() <= cost && cost <= tree.max_cost());
        }
    }

    #[test]
    fn test_trivial_tree_scores_one() {
        // n = 2: no quartets, extrema coincide, score is 1 by convention.
        let data = chain_matrix(2);
        let mut coin = Coin::seeded(2);
        let tree = Tree::new(&data, &mut coin);

        assert_eq!(tree.max_cost(), 0.0);
        assert_eq!(tree.min_cost(), 0.0);
        assert_eq!(tree.cost_scaled(), 1.0);
    }
}
