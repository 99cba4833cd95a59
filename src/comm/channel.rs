//! Coordinator-based communicator for in-process workers
//!
//! [`cluster`] wires one [`Coordinator`] to `W` [`ChannelCommunicator`]s.
//! The coordinator is meant to run on its own thread: it collects one
//! contribution per worker for the current round, merges them in worker-id
//! order (so the floating point result never depends on arrival order) and
//! sends the same `Arc` back to every worker.
//!
//! A worker that drops its communicator detaches from the job. If that
//! happens while the others still expect reductions, the coordinator gives up
//! and every blocked worker gets a `Communication` error.

use crate::comm::{Communicator, Contribution};
use crate::core::{Result, SVMError};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use log::debug;
use std::sync::Arc;

enum Message {
    Contribute {
        worker_id: usize,
        round: u64,
        contribution: Contribution,
    },
    Detach {
        worker_id: usize,
    },
}

/// Create the coordinator and the worker endpoints of a `num_workers` job
pub fn cluster(num_workers: usize) -> Result<(Coordinator, Vec<ChannelCommunicator>)> {
    if num_workers == 0 {
        return Err(SVMError::InvalidParameter(
            "a cluster needs at least one worker".to_string(),
        ));
    }

    let (to_coordinator, inbox) = unbounded();
    let mut outboxes = Vec::with_capacity(num_workers);
    let mut workers = Vec::with_capacity(num_workers);

    for worker_id in 0..num_workers {
        // one merged value in flight per worker and round
        let (tx, rx) = bounded(1);
        outboxes.push(tx);
        workers.push(ChannelCommunicator {
            worker_id,
            num_workers,
            round: 0,
            to_coordinator: to_coordinator.clone(),
            from_coordinator: rx,
        });
    }

    Ok((Coordinator { inbox, outboxes }, workers))
}

/// Worker endpoint of a coordinator
pub struct ChannelCommunicator {
    worker_id: usize,
    num_workers: usize,
    round: u64,
    to_coordinator: Sender<Message>,
    from_coordinator: Receiver<Arc<Contribution>>,
}

impl Communicator for ChannelCommunicator {
    fn worker_id(&self) -> usize {
        self.worker_id
    }

    fn num_workers(&self) -> usize {
        self.num_workers
    }

    fn all_reduce(&mut self, contribution: Contribution) -> Result<Arc<Contribution>> {
        self.to_coordinator
            .send(Message::Contribute {
                worker_id: self.worker_id,
                round: self.round,
                contribution,
            })
            .map_err(|_| {
                SVMError::Communication(format!(
                    "worker {}: coordinator stopped before round {}",
                    self.worker_id, self.round
                ))
            })?;

        let merged = self.from_coordinator.recv().map_err(|_| {
            SVMError::Communication(format!(
                "worker {}: round {} was aborted by the coordinator",
                self.worker_id, self.round
            ))
        })?;
        self.round += 1;
        Ok(merged)
    }
}

impl Drop for ChannelCommunicator {
    fn drop(&mut self) {
        // the coordinator may already be gone
        let _ = self.to_coordinator.send(Message::Detach {
            worker_id: self.worker_id,
        });
    }
}

/// Merges the contributions of every round and broadcasts the result
pub struct Coordinator {
    inbox: Receiver<Message>,
    outboxes: Vec<Sender<Arc<Contribution>>>,
}

impl Coordinator {
    /// Serve reductions until every worker has detached.
    ///
    /// Returns the number of completed rounds, or the reason the job had to
    /// be aborted.
    pub fn run(self) -> Result<u64> {
        let num_workers = self.outboxes.len();
        let mut slots: Vec<Option<Contribution>> = vec![None; num_workers];
        let mut attached = vec![true; num_workers];
        let mut pending = 0usize;
        let mut round = 0u64;

        loop {
            let message = match self.inbox.recv() {
                Ok(message) => message,
                Err(_) if pending == 0 => return Ok(round),
                Err(_) => {
                    return Err(SVMError::Communication(format!(
                        "all workers disconnected during round {round}"
                    )))
                }
            };

            match message {
                Message::Detach { worker_id } => {
                    attached[worker_id] = false;
                    if pending > 0 {
                        return Err(SVMError::Communication(format!(
                            "worker {worker_id} left while round {round} was in progress"
                        )));
                    }
                    if attached.iter().all(|a| !a) {
                        debug!("coordinator finished after {round} rounds");
                        return Ok(round);
                    }
                }
                Message::Contribute {
                    worker_id,
                    round: worker_round,
                    contribution,
                } => {
                    if worker_round != round {
                        return Err(SVMError::Communication(format!(
                            "worker {worker_id} sent round {worker_round}, expected {round}"
                        )));
                    }
                    if let Some(gone) = attached.iter().position(|a| !a) {
                        return Err(SVMError::Communication(format!(
                            "round {round} cannot complete: worker {gone} has left"
                        )));
                    }
                    if slots[worker_id].replace(contribution).is_some() {
                        return Err(SVMError::Communication(format!(
                            "worker {worker_id} contributed twice to round {round}"
                        )));
                    }
                    pending += 1;

                    if pending == num_workers {
                        let merged = Arc::new(Self::merge(&mut slots)?);
                        for (worker_id, outbox) in self.outboxes.iter().enumerate() {
                            outbox.send(Arc::clone(&merged)).map_err(|_| {
                                SVMError::Communication(format!(
                                    "worker {worker_id} stopped listening in round {round}"
                                ))
                            })?;
                        }
                        pending = 0;
                        round += 1;
                    }
                }
            }
        }
    }

    fn merge(slots: &mut [Option<Contribution>]) -> Result<Contribution> {
        let mut contributions = slots.iter_mut().filter_map(Option::take);
        let mut merged = contributions.next().ok_or_else(|| {
            SVMError::Communication("no contributions to merge".to_string())
        })?;
        for contribution in contributions {
            merged.merge(&contribution)?;
        }
        Ok(merged)
    }
}
