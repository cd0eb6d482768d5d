use crate::types::Application;
use crate::{GovernanceError, Result};
use chrono::Utc;
use cohort_types::Identity;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// Owned store of candidate applications, keyed by caller-chosen index.
///
/// Enforces one active application per identity and per index. Indices are
/// kept in a `BTreeMap` so the winner selection walk sees them in ascending
/// order.
#[derive(Debug, Clone)]
pub struct ApplicationRegistry {
    applications: BTreeMap<u64, Application>,
    registered: HashSet<Identity>,
    max_applications: Option<usize>,
}

impl ApplicationRegistry {
    pub fn new(max_applications: Option<usize>) -> Self {
        Self {
            applications: BTreeMap::new(),
            registered: HashSet::new(),
            max_applications,
        }
    }

    /// Store a new application for `applicant` at `index`.
    pub fn submit(&mut self, applicant: Identity, index: u64, uri: String) -> Result<Application> {
        if self.registered.contains(&applicant) {
            return Err(GovernanceError::AlreadyRegistered(applicant.to_hex()));
        }
        if uri.is_empty() {
            return Err(GovernanceError::EmptyUri);
        }
        if let Some(cap) = self.max_applications {
            if self.applications.len() >= cap {
                return Err(GovernanceError::ApplicationCapReached(cap));
            }
        }
        if self.applications.contains_key(&index) {
            return Err(GovernanceError::IndexOccupied(index));
        }

        let application = Application {
            applicant,
            index,
            uri,
            submitted_at: Utc::now(),
        };
        self.applications.insert(index, application.clone());
        self.registered.insert(applicant);

        debug!(
            applicant = %applicant,
            index,
            count = self.applications.len(),
            "Application stored"
        );

        Ok(application)
    }

    /// Delete the application at `index`, freeing both the index and the
    /// applicant's registration. Only the applicant or an administrator may
    /// remove.
    pub fn remove(&mut self, caller: Identity, index: u64, is_admin: bool) -> Result<Application> {
        let application = self
            .applications
            .get(&index)
            .ok_or(GovernanceError::ApplicationNotFound(index))?;

        if application.applicant != caller && !is_admin {
            return Err(GovernanceError::Unauthorized(format!(
                "{} is neither applicant nor administrator for index {}",
                caller.to_hex(),
                index
            )));
        }

        let application = self.applications.remove(&index).expect("checked above");
        self.registered.remove(&application.applicant);

        debug!(
            applicant = %application.applicant,
            index,
            count = self.applications.len(),
            "Application removed"
        );

        Ok(application)
    }

    pub fn get(&self, index: u64) -> Result<&Application> {
        self.applications
            .get(&index)
            .ok_or(GovernanceError::ApplicationNotFound(index))
    }

    pub fn contains(&self, index: u64) -> bool {
        self.applications.contains_key(&index)
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.registered.contains(identity)
    }

    /// Active application indices, ascending.
    pub fn indices(&self) -> Vec<u64> {
        self.applications.keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.applications.len()
    }

    /// Lowest occupied index, if any. Origin of the candidate scan.
    pub fn first_index(&self) -> Option<u64> {
        self.applications.keys().next().copied()
    }
}
