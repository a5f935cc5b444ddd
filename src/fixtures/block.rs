//! Chain extension: build a block on a stored parent, solve it and commit it
//! as the store's new chain head.

use super::expect_fixture;
use super::keys::random_address;
use crate::blockchain::{
    verify_block_header, Block, StoredBlock, BLOCK_VERSION_BIP66, BLOCK_VERSION_GENESIS,
};
use crate::config::NetworkParams;
use crate::crypto::Address;
use crate::error::ChainError;
use crate::persistence::BlockStore;
use crate::transaction::{ConfidenceSource, Transaction};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Height committed in the coinbase when no height is given.
pub const BLOCK_HEIGHT_GENESIS: u32 = 0;

/// Gap between a parent and a test block made by the `make_solved_test_block` helpers.
pub const TEST_BLOCK_SPACING_SECS: u64 = 5;

/// A freshly committed block and the store record made for it.
#[derive(Debug, Clone)]
pub struct BlockPair {
    pub block: Block,
    pub stored_block: StoredBlock,
}

fn epoch_secs(time: DateTime<Utc>) -> u64 {
    time.timestamp().max(0) as u64
}

/// Builds on the store's head with version 1, the current time and height 0.
pub fn create_fake_block<S: BlockStore + ?Sized>(
    store: &mut S,
    transactions: Vec<Transaction>,
) -> BlockPair {
    create_fake_block_at_height(store, BLOCK_HEIGHT_GENESIS, transactions)
}

pub fn create_fake_block_at_height<S: BlockStore + ?Sized>(
    store: &mut S,
    height: u32,
    transactions: Vec<Transaction>,
) -> BlockPair {
    create_fake_block_with(store, BLOCK_VERSION_GENESIS, Utc::now(), height, transactions)
}

pub fn create_fake_block_with<S: BlockStore + ?Sized>(
    store: &mut S,
    version: u32,
    time: DateTime<Utc>,
    height: u32,
    transactions: Vec<Transaction>,
) -> BlockPair {
    create_fake_block_at_secs(store, version, epoch_secs(time), height, transactions)
}

/// Same as [`create_fake_block_with`] with the timestamp in seconds since the epoch.
pub fn create_fake_block_at_secs<S: BlockStore + ?Sized>(
    store: &mut S,
    version: u32,
    time_secs: u64,
    height: u32,
    transactions: Vec<Transaction>,
) -> BlockPair {
    let parent = expect_fixture(store.chain_head(), "reading the chain head");
    expect_fixture(
        extend_chain(store, &parent, version, time_secs, height, transactions),
        "extending the chain",
    )
}

/// Builds on `parent`, which need not be the current head. The new block
/// becomes the head either way.
pub fn create_fake_block_on<S: BlockStore + ?Sized>(
    store: &mut S,
    parent: &StoredBlock,
    version: u32,
    time: DateTime<Utc>,
    height: u32,
    transactions: Vec<Transaction>,
) -> BlockPair {
    expect_fixture(
        try_create_fake_block_on(store, parent, version, time, height, transactions),
        "extending the chain",
    )
}

/// Builds on `parent` with version 3 and the current time.
pub fn create_fake_block_on_at_height<S: BlockStore + ?Sized>(
    store: &mut S,
    parent: &StoredBlock,
    height: u32,
    transactions: Vec<Transaction>,
) -> BlockPair {
    create_fake_block_on(store, parent, BLOCK_VERSION_BIP66, Utc::now(), height, transactions)
}

pub fn try_create_fake_block_on<S: BlockStore + ?Sized>(
    store: &mut S,
    parent: &StoredBlock,
    version: u32,
    time: DateTime<Utc>,
    height: u32,
    transactions: Vec<Transaction>,
) -> Result<BlockPair, ChainError> {
    extend_chain(store, parent, version, epoch_secs(time), height, transactions)
}

fn extend_chain<S: BlockStore + ?Sized>(
    store: &mut S,
    parent: &StoredBlock,
    version: u32,
    time_secs: u64,
    height: u32,
    transactions: Vec<Transaction>,
) -> Result<BlockPair, ChainError> {
    let to = random_address(store.params());
    let mut block = parent
        .header
        .create_next_block(&to, version, time_secs, Some(height));

    for mut tx in transactions {
        tx.confidence.source = ConfidenceSource::Network;
        block.add_transaction(tx);
    }

    block.solve()?;
    verify_block_header(&block)?;

    // Nothing touches the store before this point.
    let stored_block = parent.build(&block)?;
    store.put(&stored_block)?;
    store.set_chain_head(&stored_block)?;

    debug!(
        "Committed fake block {} at height {} with {} transactions",
        block.header.hash_hex(),
        stored_block.height,
        block.transactions.len()
    );
    Ok(BlockPair {
        block,
        stored_block,
    })
}

/// A solved block on the store's head paying `coins_to`. The store is not changed.
pub fn make_solved_test_block<S: BlockStore + ?Sized>(
    store: &S,
    coins_to: &Address,
) -> Result<Block, ChainError> {
    let head = store.chain_head()?;
    let mut block = head.header.create_next_block(
        coins_to,
        BLOCK_VERSION_GENESIS,
        head.header.timestamp + TEST_BLOCK_SPACING_SECS,
        None,
    );
    block.solve()?;
    Ok(block)
}

/// A solved block after `prev` holding `transactions`, with the reward going
/// to a random address.
pub fn make_solved_test_block_on(
    params: &NetworkParams,
    prev: &Block,
    transactions: Vec<Transaction>,
) -> Result<Block, ChainError> {
    make_solved_test_block_on_to(prev, &random_address(params), transactions)
}

pub fn make_solved_test_block_on_to(
    prev: &Block,
    to: &Address,
    transactions: Vec<Transaction>,
) -> Result<Block, ChainError> {
    let mut block = prev.header.create_next_block(
        to,
        BLOCK_VERSION_GENESIS,
        prev.header.timestamp + TEST_BLOCK_SPACING_SECS,
        None,
    );
    for tx in transactions {
        block.add_transaction(tx);
    }
    block.solve()?;
    Ok(block)
}
