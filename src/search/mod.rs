//! The generational stochastic search for a minimum-cost tree.
//!
//! A small population of random trees is reshaped by k-mutations, with
//! `k` drawn from a fat-tailed distribution through an alias table. Each
//! proposal is tested against its source tree on the raw cost ratio; the
//! best scaled cost ever seen is tracked along with a deep copy of the
//! tree that achieved it.

pub mod trace;

use log::{debug, info};

use crate::core::matrix::DistanceMatrix;
use crate::core::tree::Tree;
use crate::sampling::{mutation_pmf, sufficient_k, AliasTable, Coin};
use crate::utils::helpers::arg_max;

pub use trace::Trace;

/// The fixed search population size.
pub const N_TREES: usize = 3;

/// Scaled costs at least this close to 1 halt the search. Exact equality
/// is a float hazard.
const PERFECT: f64 = 1.0 - 1e-6;

/// What a finished search hands back.
#[derive(Debug)]
pub struct Outcome<'a> {
    /// A deep copy of the best tree seen at any point in the run.
    pub champion: Tree<'a>,
    /// The champion's scaled cost.
    pub best: f64,
    /// The scaled cost of each population member before any mutation.
    pub init: Vec<f64>,
}

/// A configured run over one distance matrix.
///
/// Chain `new`, optionally `with_seed` and `with_trace`, then `run`.
#[derive(Debug)]
pub struct Search<'a> {
    data: &'a DistanceMatrix,
    generations: usize,
    seed: Option<u64>,
    trace: Trace,
}

impl<'a> Search<'a> {
    /// A search over `data` lasting at most `generations` generations.
    pub fn new(data: &'a DistanceMatrix, generations: usize) -> Self {
        Self {
            data,
            generations,
            seed: None,
            trace: Trace::disabled(),
        }
    }

    /// Fixes the generator seed, making the run reproducible. Without it
    /// the generator is seeded from the wall clock.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attaches trace streams to the run.
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    /// Runs the search to completion.
    ///
    /// Every generation proposes one mutated candidate per population
    /// member, in population order, and replaces the member when the
    /// candidate is accepted. The champion is refreshed whenever some
    /// member beats the best scaled cost seen so far; the run halts early
    /// once that best is (within tolerance) perfect.
    pub fn run(mut self) -> Outcome<'a> {
        let mut coin = match self.seed {
            Some(seed) => Coin::seeded(seed),
            None => Coin::from_clock(),
        };

        let n = self.data.n();
        let mut trees = (0..N_TREES)
            .map(|_| Tree::new(self.data, &mut coin))
            .collect::<Vec<_>>();

        // The alias needs enough outcomes that some k-mutation can carry
        // any tree shape into any other.
        let pmf = mutation_pmf(sufficient_k(n));
        for &p in &pmf {
            self.trace.alias(p);
        }
        let alias = AliasTable::new(&pmf);

        let init = trees.iter().map(Tree::cost_scaled).collect::<Vec<_>>();
        let (seed_tree, mut best) = arg_max(&init);
        let mut champion = trees[seed_tree].clone();

        info!(
            "searching {n} items for {} generations, k < {}, initial best {best:.6}",
            self.generations,
            alias.len()
        );

        for g in 0..self.generations {
            let mut improved = None;

            for (j, tree) in trees.iter_mut().enumerate() {
                let k = propose(tree, &alias, &mut coin);
                self.trace.mutate(k);

                let scaled = tree.cost_scaled();
                self.trace.cost(scaled);

                if scaled > best {
                    debug!("generation {g}: tree {j} raises the best scaled cost to {scaled:.6}");
                    best = scaled;
                    improved = Some(j);
                }
                self.trace.fitness(best);
            }

            if let Some(j) = improved {
                champion = trees[j].clone();
            }

            if best >= PERFECT {
                info!("halting at generation {g}: perfect embedding");
                break;
            }
        }

        info!("search finished with best scaled cost {best:.6}");

        Outcome {
            champion,
            best,
            init,
        }
    }
}

/// Proposes one k-mutated candidate for `tree`, replacing it on
/// acceptance. Returns the sampled `k`.
///
/// The whole k-mutation is applied to an independent copy and tested once
/// against the source, on raw (unscaled) costs.
fn propose(tree: &mut Tree, alias: &AliasTable, coin: &mut Coin) -> usize {
    let k = alias.sample(coin) + 1;

    let mut candidate = tree.clone();
    candidate.k_mutation(k, coin);

    if accepts(coin, tree.cost(), candidate.cost()) {
        *tree = candidate;
    }

    k
}

/// The accept rule: take the candidate with probability
/// `max(0, 1 - candidate/current)`, so only strict improvements have any
/// chance and a zero-cost current tree accepts everything.
fn accepts(coin: &mut Coin, current: f64, candidate: f64) -> bool {
    if current == 0.0 {
        return true;
    }

    coin.uniform() < 1.0 - candidate / current
}

#[cfg(test)]
mod tests {
    use crate::core::matrix::DistanceMatrix;

    use super::*;

    fn chain_matrix(n: usize) -> DistanceMatrix {
        let rows = (0..n)
            .map(|i| (0..n).map(|j| (i as f64 - j as f64).abs()).collect())
            .collect();
        DistanceMatrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_accepts_equal_cost_never() {
        let mut coin = Coin::seeded(1);
        assert!((0..1_000).all(|_| !accepts(&mut coin, 4.0, 4.0)));
    }

    #[test]
    fn test_accepts_worse_cost_never() {
        let mut coin = Coin::seeded(2);
        assert!((0..1_000).all(|_| !accepts(&mut coin, 4.0, 5.0)));
    }

    #[test]
    fn test_accepts_halved_cost_half_the_time() {
        let mut coin = Coin::seeded(3);
        let taken = (0..10_000).filter(|_| accepts(&mut coin, 4.0, 2.0)).count();
        assert!((4_500..5_500).contains(&taken), "taken: {taken}");
    }

    #[test]
    fn test_accepts_zero_current_always() {
        let mut coin = Coin::seeded(4);
        assert!((0..100).all(|_| accepts(&mut coin, 0.0, 7.0)));
    }

    #[test]
    fn test_run_reports_population_costs() {
        let data = chain_matrix(5);
        let outcome = Search::new(&data, 50).with_seed(42).run();

        assert_eq!(outcome.init.len(), N_TREES);
        for &cost in &outcome.init {
            assert!((0.0..=1.0).contains(&cost));
        }

        let (_, init_best) = arg_max(&outcome.init);
        assert!(outcome.best >= init_best);
        assert_eq!(outcome.champion.num_leaves(), 5);
        assert!(outcome.champion.is_ternary());
    }

    #[test]
    fn test_run_is_reproducible() {
        let data = chain_matrix(6);
        let a = Search::new(&data, 30).with_seed(7).run();
        let b = Search::new(&data, 30).with_seed(7).run();

        assert_eq!(a.best.to_bits(), b.best.to_bits());
        assert_eq!(a.init, b.init);
        assert_eq!(a.champion.render(), b.champion.render());
    }

    #[test]
    fn test_champion_cost_matches_best() {
        let data = chain_matrix(7);
        let outcome = Search::new(&data, 100).with_seed(21).run();
        assert_eq!(outcome.champion.cost_scaled().to_bits(), outcome.best.to_bits());
    }
}
