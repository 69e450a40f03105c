//! Uniform sampling without replacement for segment rollouts.
//!
//! Selection runs a partial Fisher–Yates shuffle over the tail of the
//! population: for each of the last `count` positions `i` (walking from the
//! end), a uniformly random index `j` in `0..=i` is swapped into place. The
//! shuffled tail is the sample. Every `count`-subset is equally likely and
//! only `count` random draws are made.

use rand::Rng;
use rand::rngs::OsRng;

use crate::domain::UserId;

/// Errors raised by [`select_with`] and [`UserSampler::sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SampleError {
    /// `count` was zero or larger than the population.
    #[error("unexpected sample count {count} for population of {population}")]
    InvalidCount { count: usize, population: usize },
}

/// Select `count` distinct elements from `population` using `rng`.
///
/// The population is consumed; its original order is not preserved.
///
/// # Examples
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use segments::domain::select_with;
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let picked = select_with((1..=10).collect::<Vec<u32>>(), 3, &mut rng).expect("valid count");
/// assert_eq!(picked.len(), 3);
/// ```
pub fn select_with<T, R>(
    mut population: Vec<T>,
    count: usize,
    rng: &mut R,
) -> Result<Vec<T>, SampleError>
where
    R: Rng + ?Sized,
{
    let len = population.len();
    if count == 0 || count > len {
        return Err(SampleError::InvalidCount {
            count,
            population: len,
        });
    }

    let boundary = len - count;
    for i in (boundary..len).rev() {
        let j = rng.gen_range(0..=i);
        population.swap(i, j);
    }
    Ok(population.split_off(boundary))
}

/// Select `count` distinct elements using the operating system CSPRNG.
pub fn select<T>(population: Vec<T>, count: usize) -> Result<Vec<T>, SampleError> {
    select_with(population, count, &mut OsRng)
}

/// Sampling seam used by the rollout coordinator.
#[cfg_attr(test, mockall::automock)]
pub trait UserSampler: Send + Sync {
    /// Draw `count` distinct users from `population`.
    fn sample(&self, population: Vec<UserId>, count: usize) -> Result<Vec<UserId>, SampleError>;
}

/// Production sampler backed by [`OsRng`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureSampler;

impl UserSampler for SecureSampler {
    fn sample(&self, population: Vec<UserId>, count: usize) -> Result<Vec<UserId>, SampleError> {
        select(population, count)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashSet};

    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(10)]
    fn returns_requested_number_of_distinct_elements(#[case] count: usize) {
        let picked = select((1_u64..=10).collect(), count).expect("valid count");
        let unique: HashSet<_> = picked.iter().copied().collect();

        assert_eq!(picked.len(), count);
        assert_eq!(unique.len(), count);
        assert!(picked.iter().all(|value| (1..=10).contains(value)));
    }

    #[rstest]
    #[case(0)]
    #[case(11)]
    fn rejects_counts_outside_population(#[case] count: usize) {
        let result = select((1_u64..=10).collect(), count);
        assert_eq!(
            result,
            Err(SampleError::InvalidCount {
                count,
                population: 10
            })
        );
    }

    #[rstest]
    fn rejects_any_count_for_empty_population() {
        assert!(select(Vec::<u64>::new(), 1).is_err());
    }

    #[rstest]
    fn full_count_is_a_permutation() {
        let mut picked = select((1_u64..=6).collect(), 6).expect("valid count");
        picked.sort_unstable();
        assert_eq!(picked, vec![1, 2, 3, 4, 5, 6]);
    }

    #[rstest]
    fn secure_sampler_draws_user_ids() {
        let population = (1..=4).map(UserId::new).collect();
        let picked = SecureSampler.sample(population, 2).expect("valid count");
        assert_eq!(picked.len(), 2);
        assert_ne!(picked[0], picked[1]);
    }

    #[rstest]
    fn subsets_are_uniformly_distributed() {
        // 5 choose 2 = 10 subsets; chi-square critical value for 9 degrees
        // of freedom at p = 0.001 is 27.877.
        const TRIALS: usize = 20_000;
        const SUBSETS: usize = 10;
        const CRITICAL: f64 = 27.877;

        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut counts: BTreeMap<(u8, u8), usize> = BTreeMap::new();
        for _ in 0..TRIALS {
            let mut picked = select_with(vec![1_u8, 2, 3, 4, 5], 2, &mut rng).expect("valid count");
            picked.sort_unstable();
            *counts.entry((picked[0], picked[1])).or_default() += 1;
        }

        assert_eq!(counts.len(), SUBSETS);
        let expected = TRIALS as f64 / SUBSETS as f64;
        let chi_square: f64 = counts
            .values()
            .map(|&observed| {
                let delta = observed as f64 - expected;
                delta * delta / expected
            })
            .sum();
        assert!(
            chi_square < CRITICAL,
            "chi-square {chi_square} exceeds {CRITICAL}: {counts:?}"
        );
    }
}
