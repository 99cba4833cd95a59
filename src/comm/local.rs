//! Single-worker communicator

use crate::comm::{Communicator, Contribution};
use crate::core::Result;
use std::sync::Arc;

/// Communicator for a job with exactly one worker; every reduction is the identity
#[derive(Debug, Default)]
pub struct LocalCommunicator {
    rounds: u64,
}

impl LocalCommunicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of reductions performed so far
    pub fn rounds(&self) -> u64 {
        self.rounds
    }
}

impl Communicator for LocalCommunicator {
    fn worker_id(&self) -> usize {
        0
    }

    fn num_workers(&self) -> usize {
        1
    }

    fn all_reduce(&mut self, contribution: Contribution) -> Result<Arc<Contribution>> {
        self.rounds += 1;
        Ok(Arc::new(contribution))
    }
}
