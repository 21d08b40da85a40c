//! Thread-safe ledger handle
//!
//! [`LedgerNode`] is the surface an interactive front end drives: submit an
//! entry, seal a block, inspect the chain. All mutation happens under a single
//! write lock, so draining the pending buffer and appending the block are one
//! critical section and concurrent submissions are either sealed or remain
//! pending. The proof-of-work search runs without holding the lock; if the tip
//! moved in the meantime the search restarts from the new tip.

use crate::blockchain::{Block, Ledger};
use crate::config::LedgerConfig;
use crate::error::Result;
use crate::miner::{proof_of_work_parallel, spawn_search, CancelToken, MiningHandle, ProofSearch};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct LedgerNode {
    ledger: Arc<RwLock<Ledger>>,
    threads: usize,
}

impl LedgerNode {
    pub fn new(ledger: Ledger, threads: usize) -> Self {
        Self {
            ledger: Arc::new(RwLock::new(ledger)),
            threads: threads.max(1),
        }
    }

    /// Seed a fresh ledger with the configured genesis block.
    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        let ledger = Ledger::with_genesis(&config.genesis.previous_hash, config.genesis.proof)?;
        info!(
            previous_hash = %config.genesis.previous_hash,
            proof = config.genesis.proof,
            threads = config.miner.threads,
            "ledger seeded"
        );
        Ok(Self::new(ledger, config.miner.threads))
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Queue an entry; returns the index of the block expected to carry it.
    pub fn submit_entry(&self, entry: impl Into<String>) -> u64 {
        self.ledger.write().add_entry(entry)
    }

    /// Mine and seal the next block, blocking the calling thread.
    pub fn seal_block(&self, cancel: &CancelToken) -> Result<Block> {
        loop {
            let (tip_index, last_proof) = self.tip()?;
            let proof = if self.threads > 1 {
                proof_of_work_parallel(last_proof, self.threads, cancel)?
            } else {
                ProofSearch::new(last_proof).run(cancel)?
            };
            if let Some(block) = self.commit(tip_index, proof)? {
                return Ok(block);
            }
        }
    }

    /// Start mining on a background thread. Poll or wait on the returned job.
    pub fn start_seal(&self) -> Result<SealJob> {
        let (tip_index, last_proof) = self.tip()?;
        Ok(SealJob {
            node: self.clone(),
            tip_index,
            handle: spawn_search(last_proof, self.threads),
        })
    }

    /// Index and proof of the current last block.
    fn tip(&self) -> Result<(u64, u64)> {
        let ledger = self.ledger.read();
        let last = ledger.last_block()?;
        Ok((last.index, last.proof))
    }

    /// Seal with `proof` if the chain still ends at `tip_index`.
    fn commit(&self, tip_index: u64, proof: u64) -> Result<Option<Block>> {
        let mut ledger = self.ledger.write();
        let current = ledger.last_block()?.index;
        if current != tip_index {
            warn!(
                expected = tip_index,
                current, "chain tip moved during proof search; restarting"
            );
            return Ok(None);
        }
        ledger.seal_block(proof, None).cloned().map(Some)
    }

    /// Snapshot of every sealed block.
    pub fn chain(&self) -> Vec<Block> {
        self.ledger.read().blocks().to_vec()
    }

    pub fn last_block(&self) -> Result<Block> {
        self.ledger.read().last_block().cloned()
    }

    pub fn pending(&self) -> Vec<String> {
        self.ledger.read().pending().to_vec()
    }

    pub fn len(&self) -> usize {
        self.ledger.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.read().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        self.ledger.read().validate()
    }
}

/// A block being mined in the background.
pub struct SealJob {
    node: LedgerNode,
    tip_index: u64,
    handle: MiningHandle,
}

impl SealJob {
    pub fn cancel(&self) {
        self.handle.cancel();
    }

    /// Time spent on the current search.
    pub fn elapsed(&self) -> Duration {
        self.handle.elapsed()
    }

    /// Non-blocking: `None` while mining is still in progress.
    pub fn poll(&mut self) -> Option<Result<Block>> {
        let proof = match self.handle.try_result()? {
            Ok(proof) => proof,
            Err(e) => return Some(Err(e)),
        };
        match self.node.commit(self.tip_index, proof) {
            Ok(Some(block)) => Some(Ok(block)),
            Ok(None) => match self.restart() {
                Ok(()) => None,
                Err(e) => Some(Err(e)),
            },
            Err(e) => Some(Err(e)),
        }
    }

    /// Block until the job seals a block, fails or is cancelled.
    pub fn wait(mut self) -> Result<Block> {
        loop {
            let proof = self.handle.wait()?;
            if let Some(block) = self.node.commit(self.tip_index, proof)? {
                return Ok(block);
            }
            let (tip_index, last_proof) = self.node.tip()?;
            self.tip_index = tip_index;
            self.handle = spawn_search(last_proof, self.node.threads);
        }
    }

    fn restart(&mut self) -> Result<()> {
        let (tip_index, last_proof) = self.node.tip()?;
        debug!(tip_index, last_proof, "restarting background search");
        self.tip_index = tip_index;
        self.handle = spawn_search(last_proof, self.node.threads);
        Ok(())
    }
}
