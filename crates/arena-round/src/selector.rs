//! Elimination target selection

use arena_core::PoolId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Chooses which pool the bull destroys.
///
/// Implementations only ever see the pool count, so stakes and
/// participants cannot bias the choice.
pub trait Selector: Send {
    /// Return a pool id in `1..=n`
    fn select(&mut self, n: u32) -> PoolId;
}

/// Uniform selection backed by an RNG
pub struct RandomSelector<R = StdRng> {
    rng: R,
}

impl RandomSelector<StdRng> {
    /// Selector seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible selector for simulations
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSelector<R> {
    pub fn with_rng(rng: R) -> Self {
        RandomSelector { rng }
    }
}

impl Default for RandomSelector<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng + Send> Selector for RandomSelector<R> {
    fn select(&mut self, n: u32) -> PoolId {
        PoolId::new(self.rng.gen_range(1..=n.max(1)))
    }
}

/// Always picks the same pool
#[derive(Clone, Copy, Debug)]
pub struct FixedSelector(pub PoolId);

impl Selector for FixedSelector {
    fn select(&mut self, _n: u32) -> PoolId {
        self.0
    }
}

/// Replays a scripted list of targets, cycling when exhausted
#[derive(Clone, Debug)]
pub struct ScriptedSelector {
    targets: Vec<PoolId>,
    next: usize,
}

impl ScriptedSelector {
    pub fn new(targets: Vec<PoolId>) -> Self {
        ScriptedSelector { targets, next: 0 }
    }
}

impl Selector for ScriptedSelector {
    fn select(&mut self, n: u32) -> PoolId {
        if self.targets.is_empty() {
            return PoolId::new(n);
        }
        let target = self.targets[self.next % self.targets.len()];
        self.next += 1;
        target
    }
}

/// Pearson chi-square statistic of observed counts against a uniform
/// expectation
pub fn chi_square_uniform(counts: &[u64]) -> f64 {
    let trials: u64 = counts.iter().sum();
    if counts.is_empty() || trials == 0 {
        return 0.0;
    }
    let expected = trials as f64 / counts.len() as f64;
    counts
        .iter()
        .map(|&c| {
            let d = c as f64 - expected;
            d * d / expected
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_selector_in_range() {
        let mut selector = RandomSelector::seeded(7);
        for n in 2..=16 {
            for _ in 0..200 {
                let id = selector.select(n);
                assert!(id.is_within(n), "{id:?} outside 1..={n}");
            }
        }
    }

    #[test]
    fn test_random_selector_uniform() {
        const N: u32 = 8;
        const TRIALS: usize = 80_000;

        let mut selector = RandomSelector::seeded(42);
        let mut counts = [0u64; N as usize];
        for _ in 0..TRIALS {
            counts[selector.select(N).index()] += 1;
        }

        // 7 degrees of freedom, p = 0.001
        let chi2 = chi_square_uniform(&counts);
        assert!(chi2 < 24.32, "chi-square {chi2:.2} rejects uniformity: {counts:?}");
        assert!(counts.iter().all(|&c| c > 0));
    }

    #[test]
    fn test_seeded_selectors_repeat() {
        let mut a = RandomSelector::seeded(99);
        let mut b = RandomSelector::seeded(99);
        let xs: Vec<PoolId> = (0..32).map(|_| a.select(8)).collect();
        let ys: Vec<PoolId> = (0..32).map(|_| b.select(8)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_with_rng_matches_seeded() {
        let mut a = RandomSelector::with_rng(StdRng::seed_from_u64(5));
        let mut b = RandomSelector::seeded(5);
        for _ in 0..16 {
            assert_eq!(a.select(6), b.select(6));
        }
    }

    #[test]
    fn test_fixed_and_scripted() {
        let mut fixed = FixedSelector(PoolId::new(3));
        assert_eq!(fixed.select(8), PoolId::new(3));

        let mut scripted = ScriptedSelector::new(vec![PoolId::new(2), PoolId::new(5)]);
        let picks: Vec<u32> = (0..4).map(|_| scripted.select(8).0).collect();
        assert_eq!(picks, vec![2, 5, 2, 5]);
    }

    #[test]
    fn test_chi_square_of_perfect_counts() {
        assert_eq!(chi_square_uniform(&[10, 10, 10, 10]), 0.0);
        assert!(chi_square_uniform(&[40, 0, 0, 0]) > 100.0);
    }
}
