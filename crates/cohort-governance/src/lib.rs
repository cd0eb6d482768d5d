/*!
# Cohort Governance

Phased, stake-weighted governance for a funding round:
- Forward-only phase machine: Idle → Application → Voting → Finalized
- Application registry with caller-chosen indices, one application per identity
- One-shot vote submissions accumulating unconstrained raw scores
- Deterministic top-K winner selection with basis-point share normalization
- Outbound payout handoff after internal commit

## Core Principles

- **Deterministic aggregation**: the same applications and vote history
  produce the same winners and shares regardless of read ordering; ties
  resolve to the lowest application index.
- **Exact conservation**: winner shares always sum to exactly
  `BASIS_POINTS` (10000), including zero-vote and rounding-heavy cases —
  the truncation remainder goes to the top-ranked winner.
- **Serialized mutation**: every state-changing operation runs atomically
  behind one write lock; an operation either fully applies and emits its
  event, or applies nothing.
- **Commit before handoff**: finalize freezes winners, the finalized flag,
  and the phase before calling the payout collaborator, so a failing
  collaborator cannot disturb the committed result.

## Module Structure

- **types**: Core data structures (Phase, Application, VoteSubmission,
  Winner, RoundEvent)
- **phase**: Forward-only phase controller
- **registry**: Application registry
- **voting**: Vote aggregation
- **selection**: Top-K selection and share normalization
- **round**: The top-level governance round object
- **error**: Governance-specific errors

## Example Usage

```rust,no_run
use cohort_governance::{GovernanceRound, RoundConfig};
use cohort_types::Identity;

# async fn example() -> cohort_governance::Result<()> {
let admin = Identity::from_bytes([1; 32]);
let round = GovernanceRound::new(RoundConfig {
    admin,
    max_winners: 5,
    ..RoundConfig::default()
});

round.start_application_phase(admin).await?;
round
    .submit_application(Identity::from_bytes([2; 32]), 1, "ipfs://app".into())
    .await?;
# Ok(())
# }
```
*/

pub mod error;
pub mod metrics;
pub mod phase;
pub mod registry;
pub mod round;
pub mod selection;
pub mod types;
pub mod voting;

pub use error::{GovernanceError, Result};
pub use phase::PhaseController;
pub use registry::ApplicationRegistry;
pub use round::{GovernanceRound, RoundConfig};
pub use selection::{collect_candidates, normalize_shares, select_top_k, select_winners, Candidate};
pub use types::{Application, Phase, RoundEvent, RoundSummary, VoteSubmission, Winner};
pub use voting::VoteAggregator;
