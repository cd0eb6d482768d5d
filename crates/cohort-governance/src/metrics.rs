//! Prometheus metrics for the governance round
//!
//! Tracks application registry churn, voting activity, phase transitions, and
//! finalize behavior.

use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Applications accepted into the registry
pub static APPLICATIONS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "cohort_governance_applications_submitted_total",
        "Total applications accepted into the registry"
    )
    .unwrap()
});

/// Applications removed (by owner or administrator)
pub static APPLICATIONS_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "cohort_governance_applications_removed_total",
        "Total applications removed from the registry"
    )
    .unwrap()
});

/// Votes accepted
pub static VOTES_CAST: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "cohort_governance_votes_cast_total",
        "Total vote submissions accepted"
    )
    .unwrap()
});

/// Vote submissions rejected, by reason
pub static VOTE_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cohort_governance_vote_rejections_total",
        "Total vote submissions rejected",
        &["reason"]
    )
    .unwrap()
});

/// Phase transitions taken
pub static PHASE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "cohort_governance_phase_transitions_total",
        "Total phase transitions",
        &["from", "to"]
    )
    .unwrap()
});

/// Time spent in winner selection at finalize
pub static FINALIZE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "cohort_governance_finalize_seconds",
        "Time to select and normalize winners at finalize",
        vec![0.000001, 0.00001, 0.0001, 0.001, 0.01, 0.1]
    )
    .unwrap()
});

/// Normalized share distribution across finalized winners
pub static WINNER_SHARE_BP: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "cohort_governance_winner_share_bp",
        "Normalized winner shares in basis points",
        vec![100.0, 500.0, 1000.0, 2500.0, 5000.0, 7500.0, 10000.0]
    )
    .unwrap()
});
