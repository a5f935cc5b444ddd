use crate::blockchain::core::chain::{Block, BlockHeader};
use crate::crypto::Sha256Hash;
use crate::error::ChainError;
use crate::persistence::BlockStore;

/// A block header as kept by a [`BlockStore`], with its position in the chain.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredBlock {
    pub header: BlockHeader,
    /// Total work of the chain up to and including this block.
    pub chain_work: u128,
    pub height: u32,
}

impl StoredBlock {
    pub fn new(header: BlockHeader, chain_work: u128, height: u32) -> Self {
        StoredBlock {
            header,
            chain_work,
            height,
        }
    }

    pub fn genesis(block: &Block) -> Self {
        StoredBlock::new(block.header.clone(), block.work(), 0)
    }

    pub fn hash(&self) -> Sha256Hash {
        self.header.hash()
    }

    /// The record for `block` as this block's child.
    pub fn build(&self, block: &Block) -> Result<StoredBlock, ChainError> {
        if block.header.previous_hash != self.hash() {
            return Err(ChainError::InvalidBlockLinkage(format!(
                "Block {} builds on {}, not on {}",
                block.header.hash_hex(),
                hex::encode(block.header.previous_hash),
                self.header.hash_hex()
            )));
        }

        let height = self.height.checked_add(1).ok_or_else(|| {
            ChainError::InvalidBlock(format!("Height overflow above {}", self.height))
        })?;

        Ok(StoredBlock {
            header: block.header.clone(),
            chain_work: self.chain_work.saturating_add(block.work()),
            height,
        })
    }

    pub fn more_work_than(&self, other: &StoredBlock) -> bool {
        self.chain_work > other.chain_work
    }

    /// Looks up the parent record, `None` for the genesis block or an unknown parent.
    pub fn prev<S: BlockStore + ?Sized>(&self, store: &S) -> Result<Option<StoredBlock>, ChainError> {
        store.get(&self.header.previous_hash)
    }
}
