//! Proof-of-work solver
//!
//! Solving is a blocking nonce search with no timeout. Fixture chains keep
//! the difficulty low enough for it to finish quickly.

use crate::blockchain::Block;
use crate::config::NetworkParams;
use crate::error::ChainError;
use tracing::{debug, trace, warn};

const PROGRESS_INTERVAL: u64 = 1 << 20;

/// Solves `block` and hands it back.
pub fn mine_block(mut block: Block) -> Result<Block, ChainError> {
    block.solve()?;
    Ok(block)
}

impl Block {
    /// Searches nonces from the current one until the header hash meets its
    /// target. If the nonce space runs out the timestamp is bumped and the
    /// search restarts at zero.
    pub fn solve(&mut self) -> Result<(), ChainError> {
        if self.header.difficulty > NetworkParams::MAX_DIFFICULTY {
            return Err(ChainError::InvalidBlock(format!(
                "Difficulty {} cannot be met (max {})",
                self.header.difficulty,
                NetworkParams::MAX_DIFFICULTY
            )));
        }

        let target = self.header.target();
        let mut attempts: u64 = 0;
        loop {
            if self.header.hash() <= target {
                debug!(
                    "Solved block {} at nonce {} after {} attempts",
                    self.header.hash_hex(),
                    self.header.nonce,
                    attempts + 1
                );
                return Ok(());
            }

            attempts = attempts.wrapping_add(1);
            if attempts % PROGRESS_INTERVAL == 0 {
                trace!(
                    "Still solving at difficulty {}: {} attempts",
                    self.header.difficulty,
                    attempts
                );
            }

            match self.header.nonce.checked_add(1) {
                Some(nonce) => self.header.nonce = nonce,
                None => {
                    warn!("Nonce space exhausted, rolling block timestamp");
                    self.header.timestamp += 1;
                    self.header.nonce = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::BLOCK_VERSION_GENESIS;

    #[test]
    fn test_solve_meets_target() {
        let mut block = Block::new(BLOCK_VERSION_GENESIS, [1u8; 32], 8, 1_000, vec![]);
        block.solve().unwrap();
        assert!(block.header.meets_target());
        assert_eq!(block.hash()[0], 0);
    }

    #[test]
    fn test_solve_keeps_already_solved_nonce() {
        let block = mine_block(Block::new(BLOCK_VERSION_GENESIS, [2u8; 32], 6, 1_000, vec![])).unwrap();
        let nonce = block.header.nonce;
        let again = mine_block(block).unwrap();
        assert_eq!(again.header.nonce, nonce);
    }

    #[test]
    fn test_zero_difficulty_is_immediate() {
        let block = mine_block(Block::new(BLOCK_VERSION_GENESIS, [3u8; 32], 0, 1_000, vec![])).unwrap();
        assert_eq!(block.header.nonce, 0);
    }

    #[test]
    fn test_solve_rolls_timestamp_when_nonce_exhausted() {
        let mut block = Block::new(BLOCK_VERSION_GENESIS, [4u8; 32], 8, 1_000, vec![]);
        block.header.nonce = u64::MAX - 1;
        block.solve().unwrap();
        assert!(block.header.meets_target());
        if block.header.nonce < u64::MAX - 1 {
            assert_eq!(block.header.timestamp, 1_001);
        }
    }

    #[test]
    fn test_unreachable_difficulty_rejected() {
        let mut block = Block::new(BLOCK_VERSION_GENESIS, [5u8; 32], 256, 1_000, vec![]);
        assert!(matches!(block.solve(), Err(ChainError::InvalidBlock(_))));
    }
}
