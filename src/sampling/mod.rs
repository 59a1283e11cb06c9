//! The randomness stack for the tree search.
//!
//! The generator is a value, `Coin`, threaded by `&mut` through tree
//! construction, mutation, and the search driver, so that a run is
//! reproducible from a single seed. There is no process-wide state.

mod alias;
mod coin;
mod pmf;

pub use alias::AliasTable;
pub use coin::Coin;
pub use pmf::{mutation_pmf, sufficient_k};
