use crate::registry::ApplicationRegistry;
use crate::types::Winner;
use crate::voting::VoteAggregator;
use crate::{GovernanceError, Result};
use cohort_types::{Identity, BASIS_POINTS};
use tracing::{debug, info};

/// An application paired with its aggregated raw score, pre-ranking.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub index: u64,
    pub applicant: Identity,
    pub raw_score: u64,
}

/// Walk the index space upward from the lowest occupied index and collect
/// every active application, ascending.
///
/// The walk visits at most `count + safety_margin` consecutive index slots;
/// a sparser index space violates the caller-chosen-index contract and fails
/// with `IndexSpaceTooSparse` rather than scanning unboundedly.
pub fn collect_candidates(
    registry: &ApplicationRegistry,
    votes: &VoteAggregator,
    safety_margin: u64,
) -> Result<Vec<Candidate>> {
    let count = registry.count() as u64;
    let Some(first) = registry.first_index() else {
        return Ok(Vec::new());
    };

    let limit = count + safety_margin;
    let mut candidates = Vec::with_capacity(count as usize);
    let mut visited: u64 = 0;
    let mut slot = first;

    while (candidates.len() as u64) < count {
        if visited >= limit {
            return Err(GovernanceError::IndexSpaceTooSparse { visited, limit });
        }
        visited += 1;

        if registry.contains(slot) {
            let application = registry.get(slot)?;
            candidates.push(Candidate {
                index: slot,
                applicant: application.applicant,
                raw_score: votes.score_of(slot),
            });
        }

        slot = match slot.checked_add(1) {
            Some(next) => next,
            // Index space ends at u64::MAX; anything uncollected is unreachable
            None => break,
        };
    }

    if (candidates.len() as u64) < count {
        return Err(GovernanceError::IndexSpaceTooSparse { visited, limit });
    }

    debug!(
        candidates = candidates.len(),
        visited, limit, "Candidate collection complete"
    );

    Ok(candidates)
}

/// Rank candidates into a fixed-size top-K slot list.
///
/// Candidates are inserted in collection order (ascending index). A candidate
/// displaces the first slot whose score it strictly exceeds, shifting lower
/// entries down; equal scores never displace, so the first-seen (lowest
/// index) entry wins ties. The result is the K highest scores in strictly
/// deterministic order: descending score, ties by ascending index.
pub fn select_top_k(candidates: &[Candidate], max_winners: usize) -> Vec<Candidate> {
    let k = max_winners.min(candidates.len());
    let mut slots: Vec<Candidate> = Vec::with_capacity(k);

    for candidate in candidates {
        match slots
            .iter()
            .position(|held| candidate.raw_score > held.raw_score)
        {
            Some(position) => {
                slots.insert(position, candidate.clone());
                slots.truncate(k);
            }
            None => {
                if slots.len() < k {
                    slots.push(candidate.clone());
                }
            }
        }
    }

    slots
}

/// Convert ranked raw scores into basis-point shares summing to exactly
/// [`BASIS_POINTS`].
///
/// Integer division floors each share; the truncation remainder goes entirely
/// to the top-ranked winner. With a zero score total (no votes, or only
/// zero-score winners) every winner gets an equal floored share and the
/// remainder again goes to rank 0.
pub fn normalize_shares(ranked: &[Candidate]) -> Vec<Winner> {
    if ranked.is_empty() {
        return Vec::new();
    }

    let k = ranked.len() as u64;
    let total: u128 = ranked.iter().map(|c| c.raw_score as u128).sum();

    let mut shares: Vec<u64> = if total == 0 {
        vec![BASIS_POINTS / k; ranked.len()]
    } else {
        ranked
            .iter()
            .map(|c| ((c.raw_score as u128 * BASIS_POINTS as u128) / total) as u64)
            .collect()
    };

    let floored: u64 = shares.iter().sum();
    shares[0] += BASIS_POINTS - floored;

    ranked
        .iter()
        .zip(shares)
        .enumerate()
        .map(|(rank, (candidate, share_bp))| Winner {
            rank,
            index: candidate.index,
            applicant: candidate.applicant,
            raw_score: candidate.raw_score,
            share_bp,
        })
        .collect()
}

/// Full selection pipeline: collect, rank, normalize.
pub fn select_winners(
    registry: &ApplicationRegistry,
    votes: &VoteAggregator,
    max_winners: usize,
    safety_margin: u64,
) -> Result<Vec<Winner>> {
    let candidates = collect_candidates(registry, votes, safety_margin)?;
    let ranked = select_top_k(&candidates, max_winners);
    let winners = normalize_shares(&ranked);

    info!(
        applications = candidates.len(),
        winners = winners.len(),
        total_bp = winners.iter().map(|w| w.share_bp).sum::<u64>(),
        "🏁 Winners selected"
    );

    Ok(winners)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(byte: u8) -> Identity {
        Identity::from_bytes([byte; 32])
    }

    fn candidate(index: u64, raw_score: u64) -> Candidate {
        Candidate {
            index,
            applicant: identity(index as u8),
            raw_score,
        }
    }

    fn setup(indices: &[u64]) -> (ApplicationRegistry, VoteAggregator) {
        let mut registry = ApplicationRegistry::new(None);
        for (i, &index) in indices.iter().enumerate() {
            registry
                .submit(identity(100 + i as u8), index, format!("uri-{index}"))
                .unwrap();
        }
        (registry, VoteAggregator::new())
    }

    #[test]
    fn test_collect_dense_indices() {
        let (registry, votes) = setup(&[1, 2, 3]);
        let candidates = collect_candidates(&registry, &votes, 0).unwrap();

        assert_eq!(candidates.len(), 3);
        assert_eq!(
            candidates.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_collect_offset_dense_indices() {
        // Dense but starting at 1000: must not trip the bound
        let (registry, votes) = setup(&[1000, 1001, 1002]);
        let candidates = collect_candidates(&registry, &votes, 0).unwrap();
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_collect_within_margin() {
        // Gaps of one slot each, margin covers them
        let (registry, votes) = setup(&[1, 3, 5]);
        let candidates = collect_candidates(&registry, &votes, 2).unwrap();
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_collect_too_sparse_fails() {
        let (registry, votes) = setup(&[1, 1000]);
        let err = collect_candidates(&registry, &votes, 8).unwrap_err();

        assert!(matches!(
            err,
            GovernanceError::IndexSpaceTooSparse {
                visited: 10,
                limit: 10,
            }
        ));
    }

    #[test]
    fn test_collect_empty_registry() {
        let (registry, votes) = setup(&[]);
        assert!(collect_candidates(&registry, &votes, 8).unwrap().is_empty());
    }

    #[test]
    fn test_top_k_orders_by_descending_score() {
        let candidates = vec![candidate(1, 100), candidate(2, 300), candidate(3, 200)];
        let ranked = select_top_k(&candidates, 3);

        assert_eq!(
            ranked.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![2, 3, 1]
        );
    }

    #[test]
    fn test_top_k_truncates_to_k() {
        let candidates = vec![
            candidate(1, 10),
            candidate(2, 40),
            candidate(3, 30),
            candidate(4, 20),
        ];
        let ranked = select_top_k(&candidates, 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].index, 2);
        assert_eq!(ranked[1].index, 3);
    }

    #[test]
    fn test_top_k_ties_resolve_to_lowest_index() {
        // Equal scores never displace: first-seen wins
        let candidates = vec![candidate(1, 50), candidate(2, 50), candidate(3, 50)];
        let ranked = select_top_k(&candidates, 2);

        assert_eq!(ranked[0].index, 1);
        assert_eq!(ranked[1].index, 2);
    }

    #[test]
    fn test_top_k_tie_below_higher_score() {
        let candidates = vec![
            candidate(1, 10),
            candidate(2, 99),
            candidate(3, 10),
            candidate(4, 10),
        ];
        let ranked = select_top_k(&candidates, 3);

        assert_eq!(
            ranked.iter().map(|c| c.index).collect::<Vec<_>>(),
            vec![2, 1, 3]
        );
    }

    #[test]
    fn test_normalize_proportional_with_remainder_to_top() {
        // 6000/3000 of 9000 total: floors to 6666 + 3333, remainder 1 → rank 0
        let ranked = vec![candidate(1, 6000), candidate(2, 3000)];
        let winners = normalize_shares(&ranked);

        assert_eq!(winners[0].share_bp, 6667);
        assert_eq!(winners[1].share_bp, 3333);
        assert_eq!(winners.iter().map(|w| w.share_bp).sum::<u64>(), BASIS_POINTS);
    }

    #[test]
    fn test_normalize_zero_total_splits_equally() {
        let ranked = vec![candidate(1, 0), candidate(2, 0)];
        let winners = normalize_shares(&ranked);

        assert_eq!(winners[0].share_bp, 5000);
        assert_eq!(winners[1].share_bp, 5000);
    }

    #[test]
    fn test_normalize_zero_total_odd_split_remainder_to_first() {
        // 10000 / 3 = 3333 each, remainder 1 to rank 0
        let ranked = vec![candidate(1, 0), candidate(2, 0), candidate(3, 0)];
        let winners = normalize_shares(&ranked);

        assert_eq!(winners[0].share_bp, 3334);
        assert_eq!(winners[1].share_bp, 3333);
        assert_eq!(winners[2].share_bp, 3333);
        assert_eq!(winners.iter().map(|w| w.share_bp).sum::<u64>(), BASIS_POINTS);
    }

    #[test]
    fn test_normalize_sum_invariant_across_awkward_totals() {
        // Score sets that exercise truncation in integer proportional division
        let score_sets: [&[u64]; 6] = [
            &[1, 1, 1],
            &[7, 11, 13],
            &[3, 3, 1],
            &[1_000_000_007, 998_244_353, 42],
            &[u64::MAX, 1, 1],
            &[9999, 1],
        ];

        for scores in score_sets {
            let ranked: Vec<Candidate> = scores
                .iter()
                .enumerate()
                .map(|(i, &s)| candidate(i as u64 + 1, s))
                .collect();
            let winners = normalize_shares(&ranked);

            assert_eq!(
                winners.iter().map(|w| w.share_bp).sum::<u64>(),
                BASIS_POINTS,
                "sum invariant violated for {scores:?}"
            );
        }
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize_shares(&[]).is_empty());
    }

    #[test]
    fn test_select_winners_end_to_end() {
        let (registry, mut votes) = setup(&[1, 2, 3]);
        votes
            .cast(
                identity(1),
                vec![1, 2, 3],
                vec![6000, 3000, 1000],
                &registry,
            )
            .unwrap();

        let winners = select_winners(&registry, &votes, 2, 8).unwrap();

        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].index, 1);
        assert_eq!(winners[0].rank, 0);
        assert_eq!(winners[0].share_bp, 6667);
        assert_eq!(winners[1].index, 2);
        assert_eq!(winners[1].share_bp, 3333);
    }

    #[test]
    fn test_select_winners_fewer_applications_than_max() {
        let (registry, votes) = setup(&[4, 5]);
        let winners = select_winners(&registry, &votes, 10, 8).unwrap();

        assert_eq!(winners.len(), 2);
        assert_eq!(winners.iter().map(|w| w.share_bp).sum::<u64>(), BASIS_POINTS);
    }

    #[test]
    fn test_select_winners_deterministic() {
        let (registry, mut votes) = setup(&[1, 2, 3, 4]);
        votes
            .cast(identity(1), vec![4, 2], vec![500, 500], &registry)
            .unwrap();
        votes
            .cast(identity(2), vec![3, 1], vec![500, 500], &registry)
            .unwrap();

        let first = select_winners(&registry, &votes, 3, 8).unwrap();
        for _ in 0..16 {
            assert_eq!(select_winners(&registry, &votes, 3, 8).unwrap(), first);
        }
        // All four tied at 500: lowest indices win
        assert_eq!(
            first.iter().map(|w| w.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }
}
