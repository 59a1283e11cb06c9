//! Vose-Walker alias sampling of a discrete probability distribution.

use super::Coin;

/// An O(1)-per-sample table over a discrete distribution.
///
/// Built once from a probability vector, sampled many times. Each sample
/// costs one die roll and one biased flip.
#[derive(Debug, Clone)]
pub struct AliasTable {
    prob: Vec<f64>,
    alias: Vec<usize>,
}

impl AliasTable {
    /// Builds the probability and alias tables for `pmf`.
    ///
    /// # Panics
    ///
    /// * If `pmf` is empty or its entries do not sum to 1 within `1e-5`.
    pub fn new(pmf: &[f64]) -> Self {
        assert!(!pmf.is_empty(), "cannot build an alias over no outcomes");

        let total: f64 = pmf.iter().sum();
        assert!(
            (total - 1.0).abs() < 1e-5,
            "probabilities sum to {total}, not 1"
        );

        let m = pmf.len();
        let mut scaled = pmf.iter().map(|&p| p * m as f64).collect::<Vec<_>>();

        let mut prob = vec![0.0; m];
        let mut alias = (0..m).collect::<Vec<_>>();

        // Depending on the distribution, either worklist may empty first,
        // so the leftovers of both are drained with probability 1.
        let (mut small, mut large): (Vec<usize>, Vec<usize>) =
            (0..m).partition(|&i| scaled[i] < 1.0);

        while !small.is_empty() && !large.is_empty() {
            let s = small.pop().expect("small is non-empty");
            let l = large.pop().expect("large is non-empty");

            prob[s] = scaled[s];
            alias[s] = l;

            scaled[l] = (scaled[l] + scaled[s]) - 1.0;

            if scaled[l] < 1.0 {
                small.push(l);
            } else {
                large.push(l);
            }
        }

        for i in large.into_iter().chain(small) {
            prob[i] = 1.0;
        }

        Self { prob, alias }
    }

    /// The number of outcomes.
    pub fn len(&self) -> usize {
        self.prob.len()
    }

    /// Whether the table has no outcomes. Never true for a built table.
    pub fn is_empty(&self) -> bool {
        self.prob.is_empty()
    }

    /// Draws one outcome in `[0, len)`, distributed by the source pmf.
    pub fn sample(&self, coin: &mut Coin) -> usize {
        let i = coin.roll(self.len());

        if coin.flip(self.prob[i]) {
            i
        } else {
            self.alias[i]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frequencies(pmf: &[f64], draws: usize, seed: u64) -> Vec<f64> {
        let table = AliasTable::new(pmf);
        let mut coin = Coin::seeded(seed);
        let mut counts = vec![0usize; pmf.len()];
        for _ in 0..draws {
            counts[table.sample(&mut coin)] += 1;
        }
        counts.into_iter().map(|c| c as f64 / draws as f64).collect()
    }

    #[test]
    fn test_sample_matches_pmf() {
        let pmf = [0.2, 0.3, 0.5];
        for (i, f) in frequencies(&pmf, 100_000, 42).into_iter().enumerate() {
            assert!((f - pmf[i]).abs() < 0.01, "outcome {i}: {f} vs {}", pmf[i]);
        }
    }

    #[test]
    fn test_sample_skewed_pmf() {
        let pmf = [0.925, 0.025, 0.025, 0.025];
        for (i, f) in frequencies(&pmf, 100_000, 7).into_iter().enumerate() {
            assert!((f - pmf[i]).abs() < 0.01, "outcome {i}: {f} vs {}", pmf[i]);
        }
    }

    #[test]
    fn test_degenerate_pmf() {
        let freq = frequencies(&[0.0, 1.0, 0.0], 1_000, 3);
        assert_eq!(freq[1], 1.0);
    }

    #[test]
    #[should_panic(expected = "sum")]
    fn test_rejects_unnormalised_pmf() {
        AliasTable::new(&[0.5, 0.2]);
    }
}
