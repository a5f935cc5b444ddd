use super::expect_fixture;
use crate::blockchain::Block;
use crate::error::ChainError;
use crate::transaction::Transaction;

/// Encodes and decodes `tx`, dropping connected outputs and confidence.
pub fn try_round_trip_transaction(tx: &Transaction) -> Result<Transaction, ChainError> {
    Transaction::from_bytes(&tx.to_bytes()?)
}

pub fn round_trip_transaction(tx: &Transaction) -> Transaction {
    expect_fixture(try_round_trip_transaction(tx), "round-tripping a transaction")
}

pub fn try_round_trip_block(block: &Block) -> Result<Block, ChainError> {
    Block::from_bytes(&block.to_bytes()?)
}

pub fn round_trip_block(block: &Block) -> Block {
    expect_fixture(try_round_trip_block(block), "round-tripping a block")
}
