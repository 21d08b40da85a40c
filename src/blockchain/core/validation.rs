use crate::error::{LedgerError, Result};
use crate::miner::valid_proof;

use super::chain::Block;

/// Check that `block` correctly follows `previous`.
pub fn validate_successor(previous: &Block, block: &Block) -> Result<()> {
    if block.index != previous.index + 1 {
        return Err(LedgerError::InvalidChain(format!(
            "Invalid block index. Expected {}, but got {}.",
            previous.index + 1,
            block.index
        )));
    }

    let expected_previous_hash = previous.compute_hash()?;
    if block.previous_hash != expected_previous_hash {
        return Err(LedgerError::InvalidChain(format!(
            "Block {} does not link to its predecessor. Expected {}, but got {}.",
            block.index, expected_previous_hash, block.previous_hash
        )));
    }

    if !valid_proof(previous.proof, block.proof) {
        return Err(LedgerError::InvalidChain(format!(
            "Block {} carries proof {} which does not solve the puzzle seeded by {}.",
            block.index, block.proof, previous.proof
        )));
    }
    Ok(())
}

/// Verify every sealed block: 1-based contiguous indices, reproducible
/// digests, linkage to the predecessor and a valid puzzle solution.
///
/// Genesis is exempt from linkage and puzzle checks.
pub fn validate_chain(blocks: &[Block]) -> Result<()> {
    if let Some(genesis) = blocks.first() {
        if genesis.index != 1 {
            return Err(LedgerError::InvalidChain(format!(
                "Genesis block must have index 1, but got {}.",
                genesis.index
            )));
        }
    }

    for block in blocks {
        let recomputed = block.compute_hash()?;
        if recomputed != block.hash {
            return Err(LedgerError::InvalidChain(format!(
                "Block {} hash mismatch. Expected {}, but got {}.",
                block.index, recomputed, block.hash
            )));
        }
    }

    for pair in blocks.windows(2) {
        validate_successor(&pair[0], &pair[1])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::core::chain::Ledger;

    fn three_block_chain() -> Vec<Block> {
        let mut ledger = Ledger::with_genesis("1", 100).unwrap();
        ledger.add_entry("a");
        ledger.mine_block().unwrap();
        ledger.add_entry("b");
        ledger.mine_block().unwrap();
        ledger.blocks().to_vec()
    }

    #[test]
    fn test_valid_chain_passes() {
        let blocks = three_block_chain();
        assert_eq!(blocks.len(), 3);
        assert!(validate_chain(&blocks).is_ok());
        assert!(validate_chain(&[]).is_ok());
    }

    #[test]
    fn test_tampered_entries_detected() {
        let mut blocks = three_block_chain();
        blocks[1].entries.push("forged".to_string());
        let err = validate_chain(&blocks).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidChain(msg) if msg.contains("hash mismatch")));
    }

    #[test]
    fn test_broken_linkage_detected() {
        let mut blocks = three_block_chain();
        blocks[2].previous_hash = "0".repeat(64);
        blocks[2].hash = blocks[2].compute_hash().unwrap();
        let err = validate_chain(&blocks).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidChain(msg) if msg.contains("does not link")));
    }

    #[test]
    fn test_index_gap_detected() {
        let blocks = three_block_chain();
        let gapped = vec![blocks[0].clone(), blocks[2].clone()];
        let err = validate_chain(&gapped).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidChain(msg) if msg.contains("index")));
    }

    #[test]
    fn test_invalid_proof_detected() {
        let mut ledger = Ledger::with_genesis("1", 100).unwrap();
        ledger.seal_block(1, None).unwrap();
        let err = ledger.validate().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidChain(msg) if msg.contains("puzzle")));
    }
}
