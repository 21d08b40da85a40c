//! Integration tests for the ledger core
//!
//! These cover the observable chain properties: deterministic puzzle
//! solutions, reproducible digests, linkage, contiguous indices and the
//! pending-buffer hand-off during sealing.

use hashledger::blockchain::{validate_chain, Ledger};
use hashledger::hasher::{is_hex_digest, sha256_hex};
use hashledger::miner::{proof_of_work, valid_proof, DIFFICULTY_PREFIX};
use hashledger::LedgerError;

fn mined_ledger(blocks: usize) -> Result<Ledger, Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_genesis("1", 100)?;
    for i in 0..blocks {
        ledger.add_entry(format!("entry-{}", i));
        ledger.mine_block()?;
    }
    Ok(ledger)
}

#[test]
fn test_genesis_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Ledger::with_genesis("1", 100)?;
    assert_eq!(ledger.len(), 1);
    let genesis = ledger.last_block()?;
    assert_eq!(genesis.index, 1);
    assert_eq!(genesis.previous_hash, "1");
    assert!(genesis.entries.is_empty());
    assert!(is_hex_digest(&genesis.hash));
    Ok(())
}

#[test]
fn test_submit_then_seal_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_genesis("1", 100)?;
    ledger.add_entry("a");
    let index = ledger.add_entry("b");
    assert_eq!(index, 2);
    assert_eq!(ledger.pending(), &["a".to_string(), "b".to_string()]);

    let before = ledger.pending().to_vec();
    let genesis_hash = ledger.last_block()?.compute_hash()?;
    let block = ledger.mine_block()?.clone();

    assert_eq!(block.previous_hash, genesis_hash);
    assert_eq!(block.entries, before);
    assert!(ledger.pending().is_empty());
    assert_eq!(ledger.len(), 2);
    Ok(())
}

#[test]
fn test_unseeded_ledger_has_no_last_block() {
    let ledger = Ledger::new();
    assert!(matches!(ledger.last_block(), Err(LedgerError::EmptyChain)));
}

#[test]
fn test_proof_of_work_determinism() {
    let first = proof_of_work(100);
    for _ in 0..3 {
        assert_eq!(proof_of_work(100), first);
    }
}

#[test]
fn test_chain_properties_hold() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = mined_ledger(3)?;
    let blocks = ledger.blocks();
    assert_eq!(blocks.len(), 4);

    for (position, block) in blocks.iter().enumerate() {
        assert_eq!(block.index, position as u64 + 1);
        assert_eq!(block.compute_hash()?, block.hash);
    }

    for pair in blocks.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].compute_hash()?);
        assert!(valid_proof(pair[0].proof, pair[1].proof));
        let digest = sha256_hex(format!("{}{}", pair[0].proof, pair[1].proof).as_bytes());
        assert!(digest.starts_with(DIFFICULTY_PREFIX));
    }

    validate_chain(blocks)?;
    Ok(())
}

#[test]
fn test_sealing_empty_buffer_yields_empty_block() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::with_genesis("1", 100)?;
    let block = ledger.mine_block()?;
    assert!(block.entries.is_empty());
    assert_eq!(block.index, 2);
    Ok(())
}

#[test]
fn test_block_serializes_with_canonical_field_names() -> Result<(), Box<dyn std::error::Error>> {
    let ledger = Ledger::with_genesis("1", 100)?;
    let json = serde_json::to_value(ledger.last_block()?)?;
    for key in ["index", "previous_hash", "timestamp", "entries", "proof", "hash"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    Ok(())
}

#[test]
fn test_zero_proof_seals_immediately() -> Result<(), Box<dyn std::error::Error>> {
    // A genesis proof for which candidate 0 already solves the puzzle
    let mut ledger = Ledger::with_genesis("1", 88914)?;
    assert!(valid_proof(88914, 0));
    assert_eq!(proof_of_work(88914), 0);

    let block = ledger.mine_block()?;
    assert_eq!(block.proof, 0);
    assert_eq!(block.index, 2);
    ledger.validate()?;
    Ok(())
}
