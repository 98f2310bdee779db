//! Replica history views
//!
//! Selects the working set for one replica out of a sequence of Monte-Carlo
//! steps: either the accepted chain that ends in the replica's final active
//! trial, or every trial attempted for the replica (accepted or rejected).
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::trial::{ChainOverflow, ReplicaId, TrialHistory, TrialId, TrialRecord};

/// One Monte-Carlo step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Monte-Carlo cycle number
    pub mc_cycle: u64,

    /// Active (accepted) trial per replica after this step
    pub active: BTreeMap<ReplicaId, TrialId>,

    /// Trials attempted during this step, in generation order
    pub trials: Vec<TrialId>,
}

/// History of a single replica across a range of steps
#[derive(Debug, Clone)]
pub struct ReplicaHistory {
    replica: ReplicaId,
    steps: Vec<StepRecord>,
}

impl ReplicaHistory {
    pub fn new(replica: ReplicaId, steps: Vec<StepRecord>) -> Self {
        Self { replica, steps }
    }

    #[inline]
    pub fn replica(&self) -> ReplicaId {
        self.replica
    }

    #[inline]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Accepted chain ending in the replica's active trial of the last step
    pub fn accepted_samples(
        &self,
        history: &TrialHistory,
        limit: usize,
    ) -> Result<Vec<Arc<TrialRecord>>, ChainOverflow> {
        match self
            .steps
            .last()
            .and_then(|step| step.active.get(&self.replica))
        {
            Some(&last) => history.heritage(last, limit),
            None => Ok(Vec::new()),
        }
    }

    /// The replica's active trial in the first step, then the last trial
    /// attempted for the replica in every step
    pub fn trial_samples(&self, history: &TrialHistory) -> Vec<Arc<TrialRecord>> {
        let mut samples = Vec::new();

        if let Some(first) = self
            .steps
            .first()
            .and_then(|step| step.active.get(&self.replica))
            .and_then(|&id| history.get(id))
        {
            samples.push(Arc::clone(first));
        }

        for step in &self.steps {
            let last_trial = step
                .trials
                .iter()
                .filter_map(|&id| history.get(id))
                .filter(|record| record.replica() == self.replica)
                .last();
            if let Some(record) = last_trial {
                samples.push(Arc::clone(record));
            }
        }

        samples
    }

    /// Working set for this replica
    pub fn samples(
        &self,
        history: &TrialHistory,
        include_rejected: bool,
        limit: usize,
    ) -> Result<Vec<Arc<TrialRecord>>, ChainOverflow> {
        if include_rejected {
            Ok(self.trial_samples(history))
        } else {
            self.accepted_samples(history, limit)
        }
    }

    /// Monte-Carlo cycle in which `trial` was attempted
    pub fn cycle_of(&self, trial: TrialId) -> Option<u64> {
        self.steps
            .iter()
            .find(|step| step.trials.contains(&trial))
            .map(|step| step.mc_cycle)
    }
}
