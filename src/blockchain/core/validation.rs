use crate::blockchain::core::chain::Block;
use crate::error::ChainError;
use std::collections::HashMap;

/// Header-level checks: coinbase placement, merkle root and proof of work.
pub fn verify_block_header(block: &Block) -> Result<(), ChainError> {
    let first = block
        .transactions
        .first()
        .ok_or_else(|| ChainError::InvalidBlock("Block has no transactions".to_string()))?;

    if !first.is_coinbase() {
        return Err(ChainError::InvalidBlock(
            "First transaction in a block must be a coinbase transaction.".to_string(),
        ));
    }
    if block.transactions.iter().skip(1).any(|tx| tx.is_coinbase()) {
        return Err(ChainError::InvalidBlock(
            "Block contains more than one coinbase transaction.".to_string(),
        ));
    }

    if Block::calculate_merkle_root(&block.transactions) != block.header.merkle_root {
        return Err(ChainError::InvalidMerkleRoot);
    }

    if !block.header.meets_target() {
        return Err(ChainError::InvalidProofOfWork);
    }

    Ok(())
}

/// Structural checks of every transaction plus in-block conflict detection.
pub fn verify_block_transactions(block: &Block) -> Result<(), ChainError> {
    for tx in &block.transactions {
        tx.check_structure()?;
    }
    validate_no_double_spend(block)
}

pub fn verify_block(block: &Block) -> Result<(), ChainError> {
    verify_block_header(block)?;
    verify_block_transactions(block)
}

/// Fails when two transactions of `block` spend the same outpoint.
pub fn validate_no_double_spend(block: &Block) -> Result<(), ChainError> {
    let mut seen_inputs = HashMap::new();
    for tx in block.transactions.iter().filter(|tx| !tx.is_coinbase()) {
        let tx_hash = tx.txid();
        for input in &tx.inputs {
            let outpoint = input.previous_output;
            if let Some(conflicting_tx_hash) = seen_inputs.get(&outpoint) {
                if *conflicting_tx_hash != tx_hash {
                    return Err(ChainError::DoubleSpendDetected(format!(
                        "Output {}:{} is spent by both {} and {}",
                        hex::encode(outpoint.txid),
                        outpoint.vout,
                        hex::encode(conflicting_tx_hash),
                        hex::encode(tx_hash)
                    )));
                }
            }
            seen_inputs.insert(outpoint, tx_hash);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::core::chain::BLOCK_VERSION_GENESIS;
    use crate::config::{Network, NetworkParams};
    use crate::crypto::KeyPair;
    use crate::transaction::{Transaction, TxOutput, COIN};

    fn next_block() -> Block {
        let genesis = Block::genesis(&NetworkParams::unit_tests()).unwrap();
        let to = KeyPair::generate().address(Network::UnitTest);
        genesis.header.create_next_block(&to, BLOCK_VERSION_GENESIS, 10, Some(1))
    }

    fn spend(prev: &Transaction) -> Transaction {
        let mut tx = Transaction::new();
        tx.add_output(TxOutput::pay_to_address(
            COIN,
            &KeyPair::generate().address(Network::UnitTest),
        ));
        tx.connect_output(prev, 0).unwrap();
        tx
    }

    fn funding() -> Transaction {
        let mut tx = Transaction::new();
        tx.add_output(TxOutput::pay_to_address(
            COIN,
            &KeyPair::generate().address(Network::UnitTest),
        ));
        tx
    }

    #[test]
    fn test_solved_block_verifies() {
        let mut block = next_block();
        block.add_transaction(spend(&funding()));
        block.solve().unwrap();
        assert!(verify_block(&block).is_ok());
    }

    #[test]
    fn test_unsolved_block_fails_pow() {
        let mut block = next_block();
        block.header.difficulty = 64;
        assert_eq!(verify_block_header(&block), Err(ChainError::InvalidProofOfWork));
    }

    #[test]
    fn test_tampered_merkle_root() {
        let mut block = next_block();
        block.solve().unwrap();
        block.transactions.push(spend(&funding()));
        assert_eq!(verify_block_header(&block), Err(ChainError::InvalidMerkleRoot));
    }

    #[test]
    fn test_coinbase_must_come_first() {
        let mut block = next_block();
        block.add_transaction(spend(&funding()));
        block.transactions.swap(0, 1);
        block.header.merkle_root = Block::calculate_merkle_root(&block.transactions);
        let err = verify_block_header(&block).unwrap_err();
        assert!(err.to_string().contains("coinbase"));
    }

    #[test]
    fn test_double_spend_in_block_detected() {
        let prev = funding();
        let mut block = next_block();
        block.add_transaction(spend(&prev));
        block.add_transaction(spend(&prev));
        block.solve().unwrap();

        assert!(verify_block_header(&block).is_ok());
        assert!(matches!(
            validate_no_double_spend(&block),
            Err(ChainError::DoubleSpendDetected(_))
        ));
    }
}
