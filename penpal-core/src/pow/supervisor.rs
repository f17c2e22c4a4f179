// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mining Supervisor
//!
//! Owns a dedicated mining thread and talks to it only through channels.
//! Requests travel over a `std::sync::mpsc` channel that the miner drains at
//! its checkpoints; results come back over an unbounded tokio channel so they
//! can be awaited or received synchronously.
//!
//! At most one job is active per supervisor. Submitting while busy cancels
//! the previous job first; its late result is received and discarded.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use super::{
    Checkpoint, MiningConfig, MiningError, MiningJob, MiningOutcome, MiningRequest,
    MiningResponse, MiningResult, PowMiner, PowNoteRequest, RequestId,
};
use crate::event::UnsignedEvent;

const MINER_THREAD_NAME: &str = "penpal-miner";

/// Interactive-side handle to the mining context.
pub struct MiningSupervisor {
    config: MiningConfig,
    requests: Option<Sender<MiningRequest>>,
    responses: UnboundedReceiver<MiningResponse>,
    active: Option<RequestId>,
    worker: Option<JoinHandle<()>>,
}

impl MiningSupervisor {
    /// Starts the mining context.
    pub fn spawn(config: MiningConfig) -> Result<Self, MiningError> {
        let (request_tx, request_rx) = mpsc::channel();
        let (response_tx, response_rx) = unbounded_channel();
        let miner = PowMiner::new(&config);

        let worker = thread::Builder::new()
            .name(MINER_THREAD_NAME.into())
            .spawn(move || MiningContext::new(miner, request_rx, response_tx).run())
            .map_err(|e| MiningError::ContextUnavailable(e.to_string()))?;

        Ok(MiningSupervisor {
            config,
            requests: Some(request_tx),
            responses: response_rx,
            active: None,
            worker: Some(worker),
        })
    }

    pub fn config(&self) -> &MiningConfig {
        &self.config
    }

    /// The request whose result is currently awaited.
    pub fn active_request(&self) -> Option<RequestId> {
        self.active
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Mines `event` at `difficulty` (clamped to the configured range).
    ///
    /// Returns immediately; the result is delivered via [`next_result`].
    ///
    /// [`next_result`]: MiningSupervisor::next_result
    pub fn submit(
        &mut self,
        event: UnsignedEvent,
        difficulty: u32,
    ) -> Result<RequestId, MiningError> {
        self.submit_event(event, difficulty, None)
    }

    /// Like [`submit`], but fails the job with a timeout once `timeout`
    /// has elapsed, even if the configured timeout is longer.
    ///
    /// [`submit`]: MiningSupervisor::submit
    pub fn submit_with_timeout(
        &mut self,
        event: UnsignedEvent,
        difficulty: u32,
        timeout: Duration,
    ) -> Result<RequestId, MiningError> {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.submit_event(event, difficulty, Some(timeout_ms))
    }

    /// Assembles a letter note in the mining context and mines it.
    pub fn submit_note(&mut self, mut note: PowNoteRequest) -> Result<RequestId, MiningError> {
        note.candidate_event()
            .map_err(|e| MiningError::InvalidRequest(e.to_string()))?;
        note.difficulty = self.config.clamp_difficulty(note.difficulty);
        self.start(|request_id| MiningRequest::create_pow_note(note, request_id))
    }

    /// Requests cancellation. Only the active job is affected; the mining
    /// context ignores ids it is not running.
    pub fn cancel(&mut self, request_id: RequestId) -> Result<(), MiningError> {
        if self.active != Some(request_id) {
            debug!(%request_id, "cancel for inactive request");
        }
        self.send(MiningRequest::CancelPow { request_id })
    }

    /// Cancels whatever job is active.
    pub fn cancel_active(&mut self) -> Result<(), MiningError> {
        match self.active {
            Some(request_id) => self.cancel(request_id),
            None => Ok(()),
        }
    }

    /// Waits for the result of the active job.
    ///
    /// Returns `None` when no job is active.
    pub async fn next_result(&mut self) -> Option<MiningResult> {
        while self.active.is_some() {
            match self.responses.recv().await {
                Some(response) => {
                    if let Some(result) = self.accept(response) {
                        return Some(result);
                    }
                }
                None => return self.context_lost(),
            }
        }
        None
    }

    /// Blocking variant of [`next_result`] for non-async callers.
    ///
    /// Must not be called from within an async runtime.
    ///
    /// [`next_result`]: MiningSupervisor::next_result
    pub fn blocking_next_result(&mut self) -> Option<MiningResult> {
        while self.active.is_some() {
            match self.responses.blocking_recv() {
                Some(response) => {
                    if let Some(result) = self.accept(response) {
                        return Some(result);
                    }
                }
                None => return self.context_lost(),
            }
        }
        None
    }

    /// Returns the active job's result if it has already arrived.
    pub fn try_next_result(&mut self) -> Option<MiningResult> {
        while self.active.is_some() {
            match self.responses.try_recv() {
                Ok(response) => {
                    if let Some(result) = self.accept(response) {
                        return Some(result);
                    }
                }
                Err(tokio::sync::mpsc::error::TryRecvError::Empty) => return None,
                Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => {
                    return self.context_lost();
                }
            }
        }
        None
    }

    fn submit_event(
        &mut self,
        event: UnsignedEvent,
        difficulty: u32,
        timeout_ms: Option<u64>,
    ) -> Result<RequestId, MiningError> {
        let difficulty = self.config.clamp_difficulty(difficulty);
        self.start(|request_id| MiningRequest::MineEvent {
            event,
            difficulty,
            timeout_ms,
            request_id,
        })
    }

    fn start<F>(&mut self, build: F) -> Result<RequestId, MiningError>
    where
        F: FnOnce(RequestId) -> MiningRequest,
    {
        if let Some(previous) = self.active.take() {
            debug!(request_id = %previous, "superseding active mining job");
            self.send(MiningRequest::CancelPow {
                request_id: previous,
            })?;
        }

        let request_id = RequestId::new();
        self.send(build(request_id))?;
        self.active = Some(request_id);
        debug!(%request_id, "mining job submitted");
        Ok(request_id)
    }

    fn send(&self, request: MiningRequest) -> Result<(), MiningError> {
        let requests = self
            .requests
            .as_ref()
            .ok_or_else(|| MiningError::ContextUnavailable("supervisor shut down".into()))?;
        requests
            .send(request)
            .map_err(|_| MiningError::ContextUnavailable("mining thread has exited".into()))
    }

    fn accept(&mut self, response: MiningResponse) -> Option<MiningResult> {
        let result = MiningResult::from(response);
        if self.active == Some(result.request_id) {
            self.active = None;
            Some(result)
        } else {
            debug!(request_id = %result.request_id, "discarding stale mining result");
            None
        }
    }

    fn context_lost(&mut self) -> Option<MiningResult> {
        let request_id = self.active.take()?;
        warn!(%request_id, "mining context terminated with a job in flight");
        Some(MiningResult {
            request_id,
            outcome: MiningOutcome::Failed(MiningError::Internal(
                "mining context terminated".into(),
            )),
        })
    }
}

impl Drop for MiningSupervisor {
    fn drop(&mut self) {
        // Closing the request channel stops the miner at its next checkpoint.
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("mining thread panicked during shutdown");
            }
        }
    }
}

/// The mining side of the channel pair.
struct MiningContext {
    miner: PowMiner,
    requests: Receiver<MiningRequest>,
    responses: UnboundedSender<MiningResponse>,
    queued: VecDeque<MiningRequest>,
}

impl MiningContext {
    fn new(
        miner: PowMiner,
        requests: Receiver<MiningRequest>,
        responses: UnboundedSender<MiningResponse>,
    ) -> Self {
        MiningContext {
            miner,
            requests,
            responses,
            queued: VecDeque::new(),
        }
    }

    fn run(mut self) {
        debug!("mining context started");
        loop {
            let request = match self.queued.pop_front() {
                Some(request) => request,
                None => match self.requests.recv() {
                    Ok(request) => request,
                    Err(_) => break,
                },
            };

            match request {
                MiningRequest::CancelPow { request_id } => {
                    debug!(%request_id, "ignoring cancel for job that is not running");
                }
                MiningRequest::MineEvent {
                    event,
                    difficulty,
                    timeout_ms,
                    request_id,
                } => {
                    // An unrepresentable deadline leaves only the safety timeout
                    let deadline = timeout_ms.and_then(|ms| {
                        Instant::now().checked_add(Duration::from_millis(ms))
                    });
                    self.mine(request_id, event, difficulty, deadline)
                }
                MiningRequest::CreatePowNote {
                    sender_pubkey,
                    recipient_public_key,
                    message,
                    difficulty,
                    created_at,
                    request_id,
                } => {
                    let note = PowNoteRequest {
                        sender_pubkey,
                        recipient_public_key,
                        message,
                        difficulty,
                        created_at,
                    };
                    match note.candidate_event() {
                        Ok(event) => self.mine(request_id, event, difficulty, None),
                        Err(e) => self.respond(MiningResponse::Error {
                            error: MiningError::InvalidRequest(e.to_string()),
                            request_id,
                        }),
                    }
                }
            }
        }
        debug!("mining context stopped");
    }

    fn mine(
        &mut self,
        request_id: RequestId,
        event: UnsignedEvent,
        difficulty: u32,
        deadline: Option<Instant>,
    ) {
        let mut job = MiningJob::new(request_id, event, difficulty);
        if let Some(deadline) = deadline {
            job = job.with_deadline(deadline);
        }
        let MiningContext {
            miner,
            requests,
            queued,
            ..
        } = &mut *self;

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            miner.run(&mut job, || poll_requests(requests, queued, request_id))
        }))
        .unwrap_or_else(|panic| {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "miner panicked".to_string());
            MiningOutcome::Failed(MiningError::Internal(detail))
        });

        self.respond(MiningResponse::from_outcome(request_id, outcome));
    }

    fn respond(&self, response: MiningResponse) {
        if self.responses.send(response).is_err() {
            debug!("supervisor dropped before result delivery");
        }
    }
}

/// Drains pending requests at a checkpoint.
///
/// A cancel for the running job or any new job request stops the current
/// job; new job requests are kept for the main loop. A closed channel means
/// the supervisor is gone.
fn poll_requests(
    requests: &Receiver<MiningRequest>,
    queued: &mut VecDeque<MiningRequest>,
    running: RequestId,
) -> Checkpoint {
    loop {
        match requests.try_recv() {
            Ok(MiningRequest::CancelPow { request_id }) if request_id == running => {
                return Checkpoint::Cancel;
            }
            Ok(MiningRequest::CancelPow { request_id }) => {
                debug!(%request_id, running = %running, "ignoring stale cancel");
            }
            Ok(next) => {
                queued.push_back(next);
                return Checkpoint::Cancel;
            }
            Err(TryRecvError::Empty) => return Checkpoint::Continue,
            Err(TryRecvError::Disconnected) => return Checkpoint::Cancel,
        }
    }
}
