use anyhow::{bail, Result};
use async_trait::async_trait;
use cohort_types::{Identity, BASIS_POINTS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// One payee's slice of the revenue stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    pub payee: Identity,
    pub share_bp: u64,
}

/// Downstream payment distributor, seen from the governance core.
///
/// `initialize` is called exactly once, at the end of finalize, with shares
/// summing to [`BASIS_POINTS`].
#[async_trait]
pub trait PayoutNotifier: Send + Sync {
    async fn initialize(&self, payees: &[Identity], shares_bp: &[u64]) -> Result<()>;
}

/// In-memory share table implementing the payout boundary.
///
/// Stands in for the real distributor in tests and single-process
/// deployments; enforces the same contract the real one would.
pub struct MemorySplitter {
    shares: Arc<RwLock<Option<HashMap<Identity, u64>>>>,
}

impl Default for MemorySplitter {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySplitter {
    pub fn new() -> Self {
        Self {
            shares: Arc::new(RwLock::new(None)),
        }
    }

    /// Whether `initialize` has been accepted.
    pub async fn is_initialized(&self) -> bool {
        self.shares.read().await.is_some()
    }

    /// A payee's share in basis points, if the table is initialized.
    pub async fn share_of(&self, payee: &Identity) -> Option<u64> {
        let shares = self.shares.read().await;
        shares.as_ref().and_then(|table| table.get(payee).copied())
    }

    /// Full share table, sorted by descending share then payee.
    pub async fn entries(&self) -> Vec<ShareEntry> {
        let shares = self.shares.read().await;
        let mut entries: Vec<ShareEntry> = shares
            .as_ref()
            .map(|table| {
                table
                    .iter()
                    .map(|(payee, share_bp)| ShareEntry {
                        payee: *payee,
                        share_bp: *share_bp,
                    })
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.share_bp.cmp(&a.share_bp).then(a.payee.cmp(&b.payee)));
        entries
    }
}

#[async_trait]
impl PayoutNotifier for MemorySplitter {
    async fn initialize(&self, payees: &[Identity], shares_bp: &[u64]) -> Result<()> {
        if payees.is_empty() {
            bail!("payout initialization requires at least one payee");
        }
        if payees.len() != shares_bp.len() {
            bail!(
                "payee/share length mismatch: {} payees, {} shares",
                payees.len(),
                shares_bp.len()
            );
        }
        let total: u64 = shares_bp.iter().sum();
        if total != BASIS_POINTS {
            bail!("shares sum to {} bp, expected {}", total, BASIS_POINTS);
        }

        let mut shares = self.shares.write().await;
        if shares.is_some() {
            bail!("payout already initialized");
        }

        let mut table = HashMap::with_capacity(payees.len());
        for (payee, share_bp) in payees.iter().zip(shares_bp.iter()) {
            if table.insert(*payee, *share_bp).is_some() {
                bail!("duplicate payee {}", payee);
            }
            debug!(
                payee = %payee,
                share_bp = share_bp,
                "Share recorded"
            );
        }
        *shares = Some(table);

        info!(
            payee_count = payees.len(),
            total_bp = total,
            "💸 Payout share table initialized"
        );

        Ok(())
    }
}
