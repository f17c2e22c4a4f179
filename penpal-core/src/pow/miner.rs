// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Proof-of-Work Miner
//!
//! Grinds the nonce tag of a candidate event until its id has the required
//! number of leading zero bits. The loop stops at fixed checkpoints to consult
//! a cancellation probe and the job deadline, so cancellation latency is
//! bounded by `check_interval` hash attempts.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::{MiningConfig, MiningError, RequestId};
use crate::event::{leading_zero_bits, NostrEvent, UnsignedEvent};

/// Lifecycle of a mining job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    /// Returns true once the job can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Failed
        )
    }
}

/// Answer of the cancellation probe at a checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Continue,
    Cancel,
}

/// Terminal outcome of a mining job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MiningOutcome {
    /// Target reached; the event carries its final nonce and id.
    Mined { event: NostrEvent, attempts: u64 },
    Cancelled,
    Failed(MiningError),
}

/// A single proof-of-work job.
#[derive(Debug, Clone)]
pub struct MiningJob {
    request_id: RequestId,
    event: UnsignedEvent,
    difficulty: u32,
    deadline: Option<Instant>,
    state: JobState,
    attempts: u64,
}

impl MiningJob {
    pub fn new(request_id: RequestId, event: UnsignedEvent, difficulty: u32) -> Self {
        MiningJob {
            request_id,
            event,
            difficulty,
            deadline: None,
            state: JobState::Idle,
            attempts: 0,
        }
    }

    /// Sets a wall-clock bound tighter than the miner's safety timeout.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Hash attempts made so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// The candidate event in its current (possibly partially mined) form.
    pub fn event(&self) -> &UnsignedEvent {
        &self.event
    }

    fn finish(&mut self, state: JobState, outcome: MiningOutcome) -> MiningOutcome {
        self.state = state;
        outcome
    }
}

/// Runs mining jobs on the calling thread.
#[derive(Debug, Clone)]
pub struct PowMiner {
    check_interval: u64,
    timeout: Duration,
}

impl PowMiner {
    pub fn new(config: &MiningConfig) -> Self {
        PowMiner {
            check_interval: config.check_interval.max(1),
            timeout: config.timeout,
        }
    }

    pub fn check_interval(&self) -> u64 {
        self.check_interval
    }

    /// Mines `job` to a terminal state.
    ///
    /// `probe` is called every `check_interval` attempts, after the deadline
    /// check, so an expired deadline always takes precedence over a pending
    /// cancellation.
    pub fn run<F>(&self, job: &mut MiningJob, mut probe: F) -> MiningOutcome
    where
        F: FnMut() -> Checkpoint,
    {
        if job.state != JobState::Idle {
            return MiningOutcome::Failed(MiningError::Internal(format!(
                "job {} already {:?}",
                job.request_id, job.state
            )));
        }

        job.state = JobState::Running;
        let started = Instant::now();
        let safety_deadline = started + self.timeout;
        let deadline = job
            .deadline
            .map_or(safety_deadline, |d| d.min(safety_deadline));

        debug!(
            request_id = %job.request_id,
            difficulty = job.difficulty,
            "mining started"
        );

        let nonce_index = job.event.reset_nonce_tag(job.difficulty);
        let mut counter: u64 = 0;

        loop {
            job.event.tags[nonce_index][1] = counter.to_string();

            let id = match job.event.compute_id() {
                Ok(id) => id,
                Err(e) => {
                    return job.finish(
                        JobState::Failed,
                        MiningOutcome::Failed(MiningError::Internal(e.to_string())),
                    );
                }
            };
            job.attempts += 1;

            if leading_zero_bits(&id) >= job.difficulty {
                info!(
                    request_id = %job.request_id,
                    difficulty = job.difficulty,
                    attempts = job.attempts,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "proof of work found"
                );
                let event = job.event.clone().into_event(id);
                let attempts = job.attempts;
                return job.finish(JobState::Completed, MiningOutcome::Mined { event, attempts });
            }

            counter = match counter.checked_add(1) {
                Some(next) => next,
                None => {
                    return job.finish(
                        JobState::Failed,
                        MiningOutcome::Failed(MiningError::Internal(
                            "nonce space exhausted".into(),
                        )),
                    );
                }
            };

            if job.attempts % self.check_interval == 0 {
                if Instant::now() >= deadline {
                    debug!(request_id = %job.request_id, attempts = job.attempts, "mining timed out");
                    return job.finish(
                        JobState::Failed,
                        MiningOutcome::Failed(MiningError::Timeout),
                    );
                }
                if probe() == Checkpoint::Cancel {
                    debug!(request_id = %job.request_id, attempts = job.attempts, "mining cancelled");
                    return job.finish(JobState::Cancelled, MiningOutcome::Cancelled);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::kinds;

    const PUBKEY: &str = "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    fn candidate() -> UnsignedEvent {
        UnsignedEvent::new(PUBKEY, kinds::ENCRYPTED_LETTER, "sealed")
            .with_created_at(1_700_000_000)
            .with_tag(["p", PUBKEY])
    }

    fn miner() -> PowMiner {
        PowMiner::new(&MiningConfig::default().with_check_interval(16))
    }

    #[test]
    fn test_difficulty_zero_completes_on_first_attempt() {
        let mut job = MiningJob::new(RequestId::new(), candidate(), 0);
        let outcome = miner().run(&mut job, || Checkpoint::Continue);

        match outcome {
            MiningOutcome::Mined { attempts, event } => {
                assert_eq!(attempts, 1);
                assert!(event.verify_id().unwrap());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(job.state(), JobState::Completed);
    }

    #[test]
    fn test_mined_event_meets_difficulty() {
        let mut job = MiningJob::new(RequestId::new(), candidate(), 8);
        let outcome = miner().run(&mut job, || Checkpoint::Continue);

        let MiningOutcome::Mined { event, .. } = outcome else {
            panic!("expected mined outcome");
        };
        assert!(event.pow_difficulty().unwrap() >= 8);
        assert!(event.verify_pow(8).unwrap());
        assert_eq!(event.to_unsigned().nonce().map(|n| n.1), Some(Some(8)));
    }

    #[test]
    fn test_cancel_honored_at_first_checkpoint() {
        let mut job = MiningJob::new(RequestId::new(), candidate(), 200);
        let mut probes = 0;
        let outcome = miner().run(&mut job, || {
            probes += 1;
            Checkpoint::Cancel
        });

        assert_eq!(outcome, MiningOutcome::Cancelled);
        assert_eq!(probes, 1);
        assert_eq!(job.attempts(), 16);
        assert_eq!(job.state(), JobState::Cancelled);
    }

    #[test]
    fn test_expired_deadline_fails_with_timeout() {
        let mut job = MiningJob::new(RequestId::new(), candidate(), 200)
            .with_deadline(Instant::now());
        let outcome = miner().run(&mut job, || Checkpoint::Cancel);

        assert_eq!(outcome, MiningOutcome::Failed(MiningError::Timeout));
        assert_eq!(job.state(), JobState::Failed);
    }

    #[test]
    fn test_job_cannot_run_twice() {
        let mut job = MiningJob::new(RequestId::new(), candidate(), 0);
        let miner = miner();
        miner.run(&mut job, || Checkpoint::Continue);

        let again = miner.run(&mut job, || Checkpoint::Continue);
        assert!(matches!(again, MiningOutcome::Failed(MiningError::Internal(_))));
        assert_eq!(job.state(), JobState::Completed);
    }
}
