use crate::error::{LedgerError, Result};
use crate::hasher;
use crate::miner::{proof_of_work, CancelToken, ProofSearch};
use tracing::{debug, info};

use super::state::PendingEntries;
use super::validation::validate_chain;

/// Previous-hash sentinel conventionally used for the genesis block.
pub const GENESIS_PREVIOUS_HASH: &str = "1";
/// Proof conventionally used for the genesis block.
pub const GENESIS_PROOF: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    /// 1-based position in the chain.
    pub index: u64,
    pub previous_hash: String,
    /// Milliseconds since the Unix epoch at sealing time.
    pub timestamp: u64,
    pub entries: Vec<String>,
    pub proof: u64,
    /// Digest of every other field, computed with this field empty.
    pub hash: String,
}

/// Borrowed view of a block's fields as they are fed to the hasher.
#[derive(serde::Serialize)]
struct BlockFields<'a> {
    index: u64,
    previous_hash: &'a str,
    timestamp: u64,
    entries: &'a [String],
    proof: u64,
    hash: &'a str,
}

impl BlockFields<'_> {
    fn digest(&self) -> Result<String> {
        hasher::digest(self)
    }
}

impl Block {
    fn fields(&self) -> BlockFields<'_> {
        BlockFields {
            index: self.index,
            previous_hash: &self.previous_hash,
            timestamp: self.timestamp,
            entries: &self.entries,
            proof: self.proof,
            hash: "",
        }
    }

    /// Recompute the digest from the block's fields, ignoring the stored hash.
    pub fn compute_hash(&self) -> Result<String> {
        self.fields().digest()
    }

    /// Returns true if the stored hash matches a fresh recomputation.
    pub fn verify_hash(&self) -> Result<bool> {
        Ok(self.compute_hash()? == self.hash)
    }
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// The live ledger: sealed blocks plus the buffer of entries awaiting a block.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    chain: Vec<Block>,
    pending: PendingEntries,
}

impl Ledger {
    /// Create an unseeded ledger. Most operations require [`Ledger::seed_genesis`] first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger and seal its genesis block.
    pub fn with_genesis(previous_hash: &str, proof: u64) -> Result<Self> {
        let mut ledger = Self::new();
        ledger.seed_genesis(previous_hash, proof)?;
        Ok(ledger)
    }

    /// Seal block 1 with no entries. Pending entries, if any, stay pending.
    pub fn seed_genesis(&mut self, previous_hash: &str, proof: u64) -> Result<&Block> {
        if !self.chain.is_empty() {
            return Err(LedgerError::Precondition(
                "Genesis block can only be sealed on an empty chain.".to_string(),
            ));
        }
        if previous_hash.is_empty() {
            return Err(LedgerError::Precondition(
                "Genesis block requires a non-empty previous-hash sentinel.".to_string(),
            ));
        }
        let timestamp = now_millis();
        let hash = self.draft_hash(previous_hash, timestamp, &[], proof)?;
        self.push_block(previous_hash.to_string(), timestamp, Vec::new(), proof, hash)
    }

    /// Queue an entry and return the index of the block that will carry it.
    ///
    /// Entries never land in genesis, so the result is at least 2.
    pub fn add_entry(&mut self, entry: impl Into<String>) -> u64 {
        let queued = self.pending.push(entry);
        let next_index = self.chain.len().max(1) as u64 + 1;
        debug!(queued, next_index, "entry queued");
        next_index
    }

    /// The most recently sealed block.
    pub fn last_block(&self) -> Result<&Block> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Seal every pending entry into a new block with an already-found `proof`.
    ///
    /// `previous_hash` overrides linkage when given and non-empty; otherwise it
    /// is recomputed from the last block. Nothing is mutated if this fails.
    pub fn seal_block(&mut self, proof: u64, previous_hash: Option<&str>) -> Result<&Block> {
        let previous_hash = match previous_hash.filter(|hash| !hash.is_empty()) {
            Some(hash) => hash.to_string(),
            None => self
                .chain
                .last()
                .ok_or_else(|| {
                    LedgerError::Precondition(
                        "Cannot seal a block on an empty chain without an explicit previous hash."
                            .to_string(),
                    )
                })?
                .compute_hash()?,
        };
        let timestamp = now_millis();
        let hash = self.draft_hash(&previous_hash, timestamp, self.pending.as_slice(), proof)?;
        let entries = self.pending.take();
        self.push_block(previous_hash, timestamp, entries, proof, hash)
    }

    /// Search for the next proof seeded by the last block's proof, then seal.
    pub fn mine_block(&mut self) -> Result<&Block> {
        let last_proof = self.last_block()?.proof;
        let proof = proof_of_work(last_proof);
        self.seal_block(proof, None)
    }

    /// Like [`Ledger::mine_block`] but gives up with [`LedgerError::Cancelled`]
    /// when `cancel` fires. The ledger is untouched on cancellation.
    pub fn mine_block_with(&mut self, cancel: &CancelToken) -> Result<&Block> {
        let last_proof = self.last_block()?.proof;
        let proof = ProofSearch::new(last_proof).run(cancel)?;
        self.seal_block(proof, None)
    }

    /// Digest of the next block built from these fields, without mutating anything.
    fn draft_hash(
        &self,
        previous_hash: &str,
        timestamp: u64,
        entries: &[String],
        proof: u64,
    ) -> Result<String> {
        BlockFields {
            index: self.chain.len() as u64 + 1,
            previous_hash,
            timestamp,
            entries,
            proof,
            hash: "",
        }
        .digest()
    }

    fn push_block(
        &mut self,
        previous_hash: String,
        timestamp: u64,
        entries: Vec<String>,
        proof: u64,
        hash: String,
    ) -> Result<&Block> {
        let index = self.chain.len() as u64 + 1;
        info!(index, proof, entries = entries.len(), %hash, "sealed block");
        self.chain.push(Block {
            index,
            previous_hash,
            timestamp,
            entries,
            proof,
            hash,
        });
        self.last_block()
    }

    /// Read-only view of the sealed blocks.
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[String] {
        self.pending.as_slice()
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Re-verify indices, digests, linkage and puzzle solutions.
    pub fn validate(&self) -> Result<()> {
        validate_chain(&self.chain)
    }
}
