use crate::registry::ApplicationRegistry;
use crate::types::VoteSubmission;
use crate::{GovernanceError, Result};
use chrono::Utc;
use cohort_types::Identity;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Accumulates raw per-application scores from one-shot vote submissions.
///
/// A submission is validated in full before any score is touched: either the
/// whole vote applies, or nothing does.
#[derive(Debug, Clone, Default)]
pub struct VoteAggregator {
    scores: BTreeMap<u64, u64>,
    submissions: HashMap<Identity, VoteSubmission>,
}

impl VoteAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `voter`'s full vote. One call per identity, ever.
    ///
    /// Shares are unconstrained raw weights; they are not required to sum to
    /// anything. Normalization happens at finalize.
    pub fn cast(
        &mut self,
        voter: Identity,
        indices: Vec<u64>,
        shares: Vec<u64>,
        registry: &ApplicationRegistry,
    ) -> Result<VoteSubmission> {
        if indices.is_empty() {
            return Err(GovernanceError::EmptyVote);
        }
        if indices.len() != shares.len() {
            return Err(GovernanceError::LengthMismatch {
                indices: indices.len(),
                shares: shares.len(),
            });
        }
        if self.submissions.contains_key(&voter) {
            return Err(GovernanceError::AlreadyVoted(voter.to_hex()));
        }

        // Validate every referenced index and pre-compute the new totals
        // before mutating anything.
        let mut new_totals: BTreeMap<u64, u64> = BTreeMap::new();
        for (&index, &share) in indices.iter().zip(shares.iter()) {
            if !registry.contains(index) {
                return Err(GovernanceError::UnknownApplication(index));
            }
            let current = new_totals
                .get(&index)
                .copied()
                .unwrap_or_else(|| self.score_of(index));
            let total = current
                .checked_add(share)
                .ok_or(GovernanceError::ScoreOverflow(index))?;
            new_totals.insert(index, total);
        }

        for (index, total) in new_totals {
            self.scores.insert(index, total);
        }

        let submission = VoteSubmission {
            voter,
            indices,
            shares,
            cast_at: Utc::now(),
        };
        self.submissions.insert(voter, submission.clone());

        debug!(
            voter = %voter,
            targets = submission.indices.len(),
            "Vote recorded"
        );

        Ok(submission)
    }

    /// Accumulated raw score for an application index (0 if never voted for).
    pub fn score_of(&self, index: u64) -> u64 {
        self.scores.get(&index).copied().unwrap_or(0)
    }

    pub fn submission_of(&self, voter: &Identity) -> Option<&VoteSubmission> {
        self.submissions.get(voter)
    }

    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.submissions.contains_key(voter)
    }

    pub fn voter_count(&self) -> usize {
        self.submissions.len()
    }
}
