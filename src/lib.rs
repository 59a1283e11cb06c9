//! MQTC: Minimum Quartet Tree Cost clustering.
//!
//! Reconstructs an unrooted hierarchical clustering of `n` labelled items
//! from an `n x n` pairwise distance matrix. The clustering is a ternary
//! tree (`n` leaves, `n - 2` internal nodes of degree 3) scored by how
//! well it embeds all `C(n, 4)` quartet topologies: the scaled cost
//! `S(T)` lies in `[0, 1]` and 1 is a perfect embedding.
//!
//! The search is a generational stochastic hill-climb: a small population
//! of random trees is reshaped by compositions of three elementary
//! mutations, with the composition length drawn from a fat-tailed
//! distribution through a Vose alias table, and candidates accepted on
//! the raw cost ratio.
//!
//! For most uses, chain calls on [`Search`]:
//!
//! ```
//! use mqtc::{DistanceMatrix, Search};
//!
//! let data = DistanceMatrix::from_rows(vec![
//!     vec![0.0, 0.0, 1.0, 1.0],
//!     vec![0.0, 0.0, 1.0, 1.0],
//!     vec![1.0, 1.0, 0.0, 0.0],
//!     vec![1.0, 1.0, 0.0, 0.0],
//! ])
//! .unwrap();
//!
//! let outcome = Search::new(&data, 200).with_seed(42).run();
//! assert!(outcome.best >= 0.0 && outcome.best <= 1.0);
//! println!("{}", outcome.champion);
//! ```

mod core;
mod sampling;
mod search;
mod utils;

pub use crate::core::matrix::DistanceMatrix;
pub use crate::core::tree::{Label, NodeId, Tree};
pub use crate::sampling::{mutation_pmf, sufficient_k, AliasTable, Coin};
pub use crate::search::{Outcome, Search, Trace, N_TREES};
pub use crate::utils::helpers;
