//! Proof-of-work for HashLedger
//!
//! The puzzle: find the smallest non-negative `proof` such that the SHA-256
//! digest of the decimal strings of `last_proof` and `proof` concatenated
//! (no separator) starts with [`DIFFICULTY_PREFIX`] in hex. Difficulty is
//! fixed; there is no retargeting.
//!
//! The search is exposed three ways:
//! - [`proof_of_work`]: the plain blocking loop.
//! - [`ProofSearch`]: a resumable unit of work that can be stepped in
//!   bounded slices or run against a [`CancelToken`].
//! - [`spawn_search`]: runs a search on a background thread and hands back a
//!   [`MiningHandle`] that can be polled, awaited or cancelled.
//!
//! All variants return the same proof for the same `last_proof`.

use crate::error::{LedgerError, Result};
use crate::hasher::sha256_hex;
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Required hex prefix of a valid puzzle digest.
pub const DIFFICULTY_PREFIX: &str = "0000";

/// Candidates checked between cancellation checks.
pub const DEFAULT_BATCH_SIZE: u64 = 4096;

/// Returns true if `proof` solves the puzzle seeded by `last_proof`.
pub fn valid_proof(last_proof: u64, proof: u64) -> bool {
    let guess = format!("{}{}", last_proof, proof);
    sha256_hex(guess.as_bytes()).starts_with(DIFFICULTY_PREFIX)
}

/// Find the first proof for `last_proof`, blocking until it is found.
pub fn proof_of_work(last_proof: u64) -> u64 {
    let mut proof = 0;
    while !valid_proof(last_proof, proof) {
        proof += 1;
    }
    proof
}

/// Shared cancellation flag for long-running searches.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Found(u64),
    /// Budget exhausted; `next` is the first candidate not yet checked.
    Pending { next: u64 },
}

/// A resumable proof-of-work search.
///
/// Candidates are checked in increasing order, so the first hit is always the
/// smallest valid proof. Once found, further calls to [`ProofSearch::step`]
/// keep returning the same proof.
#[derive(Debug, Clone)]
pub struct ProofSearch {
    last_proof: u64,
    next: u64,
    found: Option<u64>,
}

impl ProofSearch {
    pub fn new(last_proof: u64) -> Self {
        Self::resume(last_proof, 0)
    }

    /// Continue a search that already ruled out every candidate below `next`.
    pub fn resume(last_proof: u64, next: u64) -> Self {
        Self {
            last_proof,
            next,
            found: None,
        }
    }

    pub fn last_proof(&self) -> u64 {
        self.last_proof
    }

    pub fn next_candidate(&self) -> u64 {
        self.next
    }

    pub fn found(&self) -> Option<u64> {
        self.found
    }

    /// Check at most `budget` candidates.
    pub fn step(&mut self, budget: u64) -> SearchStatus {
        if let Some(proof) = self.found {
            return SearchStatus::Found(proof);
        }

        let end = self.next.saturating_add(budget);
        while self.next < end {
            if valid_proof(self.last_proof, self.next) {
                self.found = Some(self.next);
                return SearchStatus::Found(self.next);
            }
            self.next += 1;
        }
        SearchStatus::Pending { next: self.next }
    }

    /// Step until a proof is found or `cancel` fires.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<u64> {
        debug!(last_proof = self.last_proof, start = self.next, "starting proof search");
        loop {
            if cancel.is_cancelled() {
                warn!(
                    last_proof = self.last_proof,
                    next = self.next,
                    "proof search cancelled"
                );
                return Err(LedgerError::Cancelled);
            }
            if let SearchStatus::Found(proof) = self.step(DEFAULT_BATCH_SIZE) {
                debug!(last_proof = self.last_proof, proof, "proof found");
                return Ok(proof);
            }
        }
    }
}

/// Search with a rayon pool of `threads` workers.
///
/// Each round scans a contiguous range in parallel and keeps the lowest hit,
/// so the result always equals [`proof_of_work`].
pub fn proof_of_work_parallel(
    last_proof: u64,
    threads: usize,
    cancel: &CancelToken,
) -> Result<u64> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .map_err(|e| LedgerError::Config(format!("Failed to build mining pool: {}", e)))?;
    let span = DEFAULT_BATCH_SIZE * threads.max(1) as u64;

    pool.install(|| {
        let mut start = 0u64;
        loop {
            if cancel.is_cancelled() {
                warn!(last_proof, next = start, "parallel proof search cancelled");
                return Err(LedgerError::Cancelled);
            }
            let end = start.saturating_add(span);
            if let Some(proof) = (start..end)
                .into_par_iter()
                .find_first(|candidate| valid_proof(last_proof, *candidate))
            {
                return Ok(proof);
            }
            start = end;
        }
    })
}

/// Handle to a proof search running on a background thread.
pub struct MiningHandle {
    last_proof: u64,
    cancel: CancelToken,
    receiver: Receiver<Result<u64>>,
    thread: Option<JoinHandle<()>>,
    started: Instant,
}

/// Start searching for the proof that follows `last_proof`.
///
/// With `threads > 1` the search is spread over a rayon pool.
pub fn spawn_search(last_proof: u64, threads: usize) -> MiningHandle {
    spawn_search_with(last_proof, threads, CancelToken::new())
}

/// Like [`spawn_search`] but observes an existing cancellation token.
pub fn spawn_search_with(last_proof: u64, threads: usize, cancel: CancelToken) -> MiningHandle {
    let (sender, receiver) = bounded(1);
    let worker_cancel = cancel.clone();

    let thread = std::thread::spawn(move || {
        let result = if threads > 1 {
            proof_of_work_parallel(last_proof, threads, &worker_cancel)
        } else {
            ProofSearch::new(last_proof).run(&worker_cancel)
        };
        // The receiver may already be gone if the handle was dropped.
        let _ = sender.send(result);
    });

    info!(last_proof, threads, "spawned proof search");
    MiningHandle {
        last_proof,
        cancel,
        receiver,
        thread: Some(thread),
        started: Instant::now(),
    }
}

impl MiningHandle {
    pub fn last_proof(&self) -> u64 {
        self.last_proof
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Non-blocking poll. Returns `None` while the search is still running.
    ///
    /// The result is delivered once; polling again after it was taken reports
    /// an error.
    pub fn try_result(&self) -> Option<Result<u64>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LedgerError::Mining(
                "mining thread exited without a result".to_string(),
            ))),
        }
    }

    /// Block until the search finishes or is cancelled.
    pub fn wait(mut self) -> Result<u64> {
        let result = self.receiver.recv().unwrap_or_else(|_| {
            Err(LedgerError::Mining(
                "mining thread exited without a result".to_string(),
            ))
        });
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        result
    }
}

impl Drop for MiningHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.cancel.cancel();
            let _ = thread.join();
        }
    }
}
