//! Random reviewer selection
//!
//! Uniform picks only, no weighting by past load. The RNG is always passed
//! in so tests can seed it.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::User;

/// Reviewers assigned when a pull request is opened
pub const MAX_REVIEWERS: usize = 2;

/// Pick up to `max` distinct candidates without replacement.
///
/// Returns fewer ids when the pool is smaller, and an empty list when it is
/// empty.
pub fn pick_reviewers<R>(candidates: &[&User], max: usize, rng: &mut R) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let mut ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
    let count = max.min(ids.len());
    let (picked, _) = ids.partial_shuffle(rng, count);
    picked.iter().map(|id| (*id).to_owned()).collect()
}

/// Pick one candidate uniformly at random.
pub fn pick_one<'a, R>(candidates: &[&'a User], rng: &mut R) -> Option<&'a User>
where
    R: Rng + ?Sized,
{
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn users(ids: &[&str]) -> Vec<User> {
        ids.iter()
            .map(|id| User::new(*id, *id, "backend", true))
            .collect()
    }

    #[test]
    fn empty_pool_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pick_reviewers(&[], MAX_REVIEWERS, &mut rng).is_empty());
        assert!(pick_one(&[], &mut rng).is_none());
    }

    #[test]
    fn small_pool_is_taken_whole() {
        let pool = users(&["u2"]);
        let refs: Vec<&User> = pool.iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_reviewers(&refs, MAX_REVIEWERS, &mut rng), vec!["u2"]);
    }

    #[test]
    fn picks_are_distinct_members_of_pool() {
        let pool = users(&["a", "b", "c", "d", "e"]);
        let refs: Vec<&User> = pool.iter().collect();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = pick_reviewers(&refs, MAX_REVIEWERS, &mut rng);
            assert_eq!(picked.len(), 2);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), 2);
            assert!(picked.iter().all(|id| pool.iter().any(|u| &u.id == id)));
        }
    }

    #[test]
    fn every_candidate_can_be_chosen() {
        let pool = users(&["a", "b", "c"]);
        let refs: Vec<&User> = pool.iter().collect();
        let mut seen = HashSet::new();

        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            if let Some(user) = pick_one(&refs, &mut rng) {
                seen.insert(user.id.clone());
            }
        }

        assert_eq!(seen.len(), 3);
    }
}
