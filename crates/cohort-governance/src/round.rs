use crate::metrics;
use crate::phase::PhaseController;
use crate::registry::ApplicationRegistry;
use crate::selection;
use crate::types::{Application, Phase, RoundEvent, RoundSummary, VoteSubmission, Winner};
use crate::voting::VoteAggregator;
use crate::{GovernanceError, Result};
use chrono::{DateTime, Duration, Utc};
use cohort_payout::PayoutNotifier;
use cohort_types::Identity;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

/// Configuration for a governance round
#[derive(Debug, Clone)]
pub struct RoundConfig {
    /// Holder of the administrator role
    pub admin: Identity,
    /// Latest instant at which the application phase may be opened
    pub apply_open_deadline: DateTime<Utc>,
    /// Applications close at this instant; voting may start afterwards
    pub application_end: DateTime<Utc>,
    /// Voting closes at this instant; finalize is legal afterwards
    pub voting_end: DateTime<Utc>,
    /// Upper bound on the number of winners (K = min of this and the
    /// application count)
    pub max_winners: usize,
    /// Optional cap on concurrently active applications
    pub max_applications: Option<usize>,
    /// Extra index slots the candidate scan may visit beyond the application
    /// count before declaring the index space too sparse
    pub scan_safety_margin: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            admin: Identity::from_bytes([0; 32]),
            apply_open_deadline: now + Duration::days(1),
            application_end: now + Duration::days(7),
            voting_end: now + Duration::days(14),
            max_winners: 10,
            max_applications: None,
            scan_safety_margin: 64,
        }
    }
}

/// All mutable round state behind one lock, so every operation is atomic
/// with respect to all others.
struct RoundState {
    phase: PhaseController,
    registry: ApplicationRegistry,
    votes: VoteAggregator,
    winners: Vec<Winner>,
    finalized: bool,
}

/// A single funding-round governance instance.
///
/// Created once at deployment time; all state mutation flows through the
/// identity-authenticated operations below, serialized by a single write
/// lock. Phase gates and the administrator capability check run before any
/// state is touched, so a failed operation applies nothing and emits no
/// event.
///
/// # Event Emission
/// When constructed via [`GovernanceRound::with_events`], successful
/// mutations emit [`RoundEvent`]s:
/// - `submit_application()` → `ApplicationSubmitted`
/// - `remove_application()` → `ApplicationRemoved`
/// - `cast_vote()` → `VoteCast`
/// - phase transitions → `PhaseChanged`
/// - `finalize()` → `PhaseChanged` + `ResultsFinalized`
pub struct GovernanceRound {
    config: RoundConfig,
    state: Arc<RwLock<RoundState>>,
    event_tx: Option<mpsc::UnboundedSender<RoundEvent>>,
    payout: Option<Arc<dyn PayoutNotifier>>,
}

impl GovernanceRound {
    /// Create a new round in `Idle` phase.
    pub fn new(config: RoundConfig) -> Self {
        let registry = ApplicationRegistry::new(config.max_applications);
        Self {
            config,
            state: Arc::new(RwLock::new(RoundState {
                phase: PhaseController::new(),
                registry,
                votes: VoteAggregator::new(),
                winners: Vec::new(),
                finalized: false,
            })),
            event_tx: None,
            payout: None,
        }
    }

    /// Create a new round with an event channel for off-system auditors.
    pub fn with_events(config: RoundConfig) -> (Self, mpsc::UnboundedReceiver<RoundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut round = Self::new(config);
        round.event_tx = Some(tx);
        (round, rx)
    }

    /// Set the payout collaborator invoked once at the end of finalize.
    pub fn with_payout_notifier(mut self, payout: Arc<dyn PayoutNotifier>) -> Self {
        self.payout = Some(payout);
        self
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Holder-of-role predicate for the administrator capability.
    pub fn is_admin(&self, identity: &Identity) -> bool {
        self.config.admin == *identity
    }

    fn require_admin(&self, caller: &Identity) -> Result<()> {
        if !self.is_admin(caller) {
            return Err(GovernanceError::Unauthorized(format!(
                "{} is not the round administrator",
                caller.to_hex()
            )));
        }
        Ok(())
    }

    fn emit(&self, event: RoundEvent) {
        if let Some(tx) = &self.event_tx {
            if tx.send(event).is_err() {
                warn!("Round event receiver dropped, notification lost");
            }
        }
    }

    fn record_transition(&self, from: Phase, to: Phase) {
        metrics::PHASE_TRANSITIONS
            .with_label_values(&[phase_label(from), phase_label(to)])
            .inc();
        self.emit(RoundEvent::PhaseChanged { from, to });
    }

    /// Idle → Application. Administrator-only, and only before the
    /// configured open deadline.
    pub async fn start_application_phase(&self, caller: Identity) -> Result<()> {
        self.require_admin(&caller)?;

        let mut state = self.state.write().await;
        state.phase.require(Phase::Idle)?;
        if Utc::now() >= self.config.apply_open_deadline {
            return Err(GovernanceError::ApplicationWindowClosed);
        }

        let (from, to) = state.phase.advance(Phase::Application)?;
        self.record_transition(from, to);

        info!(
            admin = %caller,
            application_end = %self.config.application_end,
            "📋 Application phase opened"
        );

        Ok(())
    }

    /// Application → Voting. Administrator-only, and only once the
    /// application-end time has passed.
    pub async fn start_voting_phase(&self, caller: Identity) -> Result<()> {
        self.require_admin(&caller)?;

        let mut state = self.state.write().await;
        state.phase.require(Phase::Application)?;
        if Utc::now() < self.config.application_end {
            return Err(GovernanceError::ApplicationPeriodNotEnded);
        }

        let (from, to) = state.phase.advance(Phase::Voting)?;
        self.record_transition(from, to);

        info!(
            admin = %caller,
            applications = state.registry.count(),
            voting_end = %self.config.voting_end,
            "🗳️ Voting phase opened"
        );

        Ok(())
    }

    /// Submit an application at a caller-chosen free index.
    pub async fn submit_application(
        &self,
        caller: Identity,
        index: u64,
        uri: String,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        state.phase.require(Phase::Application)?;

        let application = state.registry.submit(caller, index, uri)?;
        metrics::APPLICATIONS_SUBMITTED.inc();

        info!(
            applicant = %caller,
            index,
            uri = %application.uri,
            "📨 Application submitted"
        );

        self.emit(RoundEvent::ApplicationSubmitted {
            applicant: application.applicant,
            index: application.index,
            uri: application.uri,
        });

        Ok(())
    }

    /// Remove an application; allowed for its applicant or the administrator.
    /// Frees the index and the applicant's registration.
    pub async fn remove_application(&self, caller: Identity, index: u64) -> Result<()> {
        let mut state = self.state.write().await;
        state.phase.require(Phase::Application)?;

        let removed = state
            .registry
            .remove(caller, index, self.is_admin(&caller))?;
        metrics::APPLICATIONS_REMOVED.inc();

        info!(
            applicant = %removed.applicant,
            removed_by = %caller,
            index,
            "🗑️ Application removed"
        );

        self.emit(RoundEvent::ApplicationRemoved {
            applicant: removed.applicant,
            index,
            removed_by: caller,
        });

        Ok(())
    }

    /// Cast the caller's one and only vote: arbitrary raw weights over
    /// existing application indices.
    pub async fn cast_vote(
        &self,
        caller: Identity,
        indices: Vec<u64>,
        shares: Vec<u64>,
    ) -> Result<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if let Err(err) = state.phase.require(Phase::Voting) {
            metrics::VOTE_REJECTIONS
                .with_label_values(&[rejection_reason(&err)])
                .inc();
            return Err(err);
        }

        let submission = match state.votes.cast(caller, indices, shares, &state.registry) {
            Ok(submission) => submission,
            Err(err) => {
                metrics::VOTE_REJECTIONS
                    .with_label_values(&[rejection_reason(&err)])
                    .inc();
                return Err(err);
            }
        };
        metrics::VOTES_CAST.inc();

        info!(
            voter = %caller,
            targets = submission.indices.len(),
            total_weight = submission.shares.iter().sum::<u64>(),
            "🗳️ Vote cast"
        );

        self.emit(RoundEvent::VoteCast {
            voter: caller,
            indices: submission.indices,
            shares: submission.shares,
        });

        Ok(())
    }

    /// Compute winners, freeze results, transition to `Finalized`, and hand
    /// the (applicant, share) list to the payout collaborator.
    ///
    /// Any caller may finalize once the voting-end time has passed. All
    /// internal state is committed under the write lock before the outbound
    /// call is made: a re-entrant finalize observes `AlreadyFinalized`, and a
    /// failing collaborator leaves the committed result valid and queryable.
    pub async fn finalize(&self, caller: Identity) -> Result<Vec<Winner>> {
        let winners = {
            let mut guard = self.state.write().await;
            let state = &mut *guard;

            if state.finalized {
                return Err(GovernanceError::AlreadyFinalized);
            }
            state.phase.require(Phase::Voting)?;
            if Utc::now() < self.config.voting_end {
                return Err(GovernanceError::VotingNotEnded);
            }

            let started = Instant::now();
            let winners = selection::select_winners(
                &state.registry,
                &state.votes,
                self.config.max_winners,
                self.config.scan_safety_margin,
            )?;
            metrics::FINALIZE_DURATION.observe(started.elapsed().as_secs_f64());

            state.winners = winners.clone();
            state.finalized = true;
            let (from, to) = state.phase.advance(Phase::Finalized)?;
            self.record_transition(from, to);

            for winner in &winners {
                metrics::WINNER_SHARE_BP.observe(winner.share_bp as f64);
            }
            self.emit(RoundEvent::ResultsFinalized {
                winners: winners.clone(),
            });

            info!(
                caller = %caller,
                winners = winners.len(),
                voters = state.votes.voter_count(),
                "🏆 Results finalized"
            );

            winners
        };

        if let Some(payout) = &self.payout {
            if winners.is_empty() {
                warn!("No winners to distribute, skipping payout handoff");
            } else {
                let payees: Vec<Identity> = winners.iter().map(|w| w.applicant).collect();
                let shares_bp: Vec<u64> = winners.iter().map(|w| w.share_bp).collect();
                payout
                    .initialize(&payees, &shares_bp)
                    .await
                    .map_err(|e| GovernanceError::PayoutError(e.to_string()))?;

                info!(payees = payees.len(), "📤 Winner shares handed to payout");
            }
        }

        Ok(winners)
    }

    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase.current()
    }

    pub async fn is_finalized(&self) -> bool {
        self.state.read().await.finalized
    }

    pub async fn application(&self, index: u64) -> Result<Application> {
        let state = self.state.read().await;
        state.registry.get(index).cloned()
    }

    pub async fn application_indices(&self) -> Vec<u64> {
        self.state.read().await.registry.indices()
    }

    /// Accumulated raw score for an existing application (0 if unvoted).
    pub async fn aggregated_score(&self, index: u64) -> Result<u64> {
        let state = self.state.read().await;
        state.registry.get(index)?;
        Ok(state.votes.score_of(index))
    }

    /// A voter's own stored submission.
    pub async fn submission(&self, voter: &Identity) -> Result<VoteSubmission> {
        let state = self.state.read().await;
        state
            .votes
            .submission_of(voter)
            .cloned()
            .ok_or_else(|| GovernanceError::SubmissionNotFound(voter.to_hex()))
    }

    /// Number of finalized winners (0 before finalization).
    pub async fn winner_count(&self) -> usize {
        self.state.read().await.winners.len()
    }

    /// Winner by 0-based rank.
    pub async fn winner(&self, rank: usize) -> Result<Winner> {
        let state = self.state.read().await;
        state
            .winners
            .get(rank)
            .cloned()
            .ok_or(GovernanceError::WinnerNotFound {
                rank,
                count: state.winners.len(),
            })
    }

    pub async fn winners(&self) -> Vec<Winner> {
        self.state.read().await.winners.clone()
    }

    pub async fn summary(&self) -> RoundSummary {
        let state = self.state.read().await;
        RoundSummary {
            phase: state.phase.current(),
            application_count: state.registry.count(),
            vote_count: state.votes.voter_count(),
            winner_count: state.winners.len(),
        }
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Application => "application",
        Phase::Voting => "voting",
        Phase::Finalized => "finalized",
    }
}

fn rejection_reason(err: &GovernanceError) -> &'static str {
    match err {
        GovernanceError::WrongPhase { .. } => "wrong_phase",
        GovernanceError::EmptyVote => "empty_vote",
        GovernanceError::LengthMismatch { .. } => "length_mismatch",
        GovernanceError::AlreadyVoted(_) => "already_voted",
        GovernanceError::UnknownApplication(_) => "unknown_application",
        GovernanceError::ScoreOverflow(_) => "score_overflow",
        _ => "other",
    }
}
