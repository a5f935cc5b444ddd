use crate::config::NetworkParams;
use crate::crypto::{finalize_double, sha256d, Address, Sha256Hash, ADDRESS_HASH_SIZE};
use crate::error::ChainError;
use crate::miner::mine_block;
use crate::transaction::types::wire_options;
use crate::transaction::{Transaction, TxOutput, FIFTY_COINS};
use bincode::Options;
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU32, Ordering};

pub const BLOCK_VERSION_GENESIS: u32 = 1;
pub const BLOCK_VERSION_BIP34: u32 = 2;
pub const BLOCK_VERSION_BIP66: u32 = 3;
pub const BLOCK_VERSION_BIP65: u32 = 4;

/// Maximum encoded block size in bytes
pub const MAX_BLOCK_SIZE: u64 = 1_000_000;
const MAX_HEADER_SIZE: u64 = 256;

/// Feeds coinbase scripts so two blocks built on the same parent for the same
/// recipient still get distinct coinbases.
static COINBASE_COUNTER: AtomicU32 = AtomicU32::new(0);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub previous_hash: Sha256Hash,
    pub merkle_root: Sha256Hash,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Required leading zero bits of the header hash.
    pub difficulty: u32,
    pub nonce: u64,
}

impl BlockHeader {
    pub fn hash(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update(self.previous_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.difficulty.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        finalize_double(hasher)
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash())
    }

    pub fn target(&self) -> Sha256Hash {
        hash_to_target(self.difficulty)
    }

    pub fn meets_target(&self) -> bool {
        self.hash() <= self.target()
    }

    /// Expected number of hashes needed to solve this header.
    pub fn work(&self) -> u128 {
        1u128 << self.difficulty.min(127)
    }

    /// Starts an unsolved block on top of this header, paying the coinbase
    /// reward to `to`. The height, when known, is committed in the coinbase script.
    pub fn create_next_block(
        &self,
        to: &Address,
        version: u32,
        timestamp: u64,
        height: Option<u32>,
    ) -> Block {
        let counter = COINBASE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut coinbase = Transaction::coinbase(height, counter.to_le_bytes().to_vec());
        coinbase.add_output(TxOutput::pay_to_address(FIFTY_COINS, to));

        Block::new(
            version,
            self.hash(),
            self.difficulty,
            timestamp,
            vec![coinbase],
        )
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
        wire_options(MAX_HEADER_SIZE)
            .serialize(self)
            .map_err(|e| ChainError::EncodeError(format!("Header encoding failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        wire_options(MAX_HEADER_SIZE)
            .deserialize(bytes)
            .map_err(|e| ChainError::DecodeError(format!("Header decoding failed: {}", e)))
    }
}

/// Largest hash that satisfies `difficulty` leading zero bits.
pub fn hash_to_target(difficulty: u32) -> Sha256Hash {
    let mut target = [0xFF; 32];
    let leading_zeros = difficulty / 8;
    let partial_bits = difficulty % 8;

    for item in target.iter_mut().take(leading_zeros as usize) {
        *item = 0;
    }

    if leading_zeros < 32 && partial_bits > 0 {
        target[leading_zeros as usize] = 0xFFu8 >> partial_bits;
    }
    target
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        version: u32,
        previous_hash: Sha256Hash,
        difficulty: u32,
        timestamp: u64,
        transactions: Vec<Transaction>,
    ) -> Self {
        let merkle_root = Block::calculate_merkle_root(&transactions);

        Block {
            header: BlockHeader {
                version,
                previous_hash,
                merkle_root,
                timestamp,
                difficulty,
                nonce: 0,
            },
            transactions,
        }
    }

    /// The solved genesis block of `params`. Deterministic: same params, same block.
    pub fn genesis(params: &NetworkParams) -> Result<Block, ChainError> {
        params.validate()?;

        let burn_address = Address::new(params.network, [0u8; ADDRESS_HASH_SIZE]);
        let mut coinbase = Transaction::coinbase(Some(0), b"genesis".to_vec());
        coinbase.add_output(TxOutput::pay_to_address(FIFTY_COINS, &burn_address));

        let genesis_block = Block::new(
            BLOCK_VERSION_GENESIS,
            [0u8; 32],
            params.genesis_difficulty,
            params.genesis_timestamp,
            vec![coinbase],
        );
        mine_block(genesis_block)
    }

    pub fn hash(&self) -> Sha256Hash {
        self.header.hash()
    }

    pub fn work(&self) -> u128 {
        self.header.work()
    }

    pub fn coinbase(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_coinbase())
    }

    /// Appends a transaction and refreshes the merkle root. Any previous solve is invalidated.
    pub fn add_transaction(&mut self, tx: Transaction) {
        self.transactions.push(tx);
        self.header.merkle_root = Block::calculate_merkle_root(&self.transactions);
    }

    /// Pairwise double SHA-256 tree over transaction ids; an odd node is paired with itself.
    pub fn calculate_merkle_root(transactions: &[Transaction]) -> Sha256Hash {
        if transactions.is_empty() {
            return [0u8; 32];
        }

        let mut level: Vec<Sha256Hash> = transactions.iter().map(Transaction::txid).collect();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| {
                    let left = pair[0];
                    let right = pair.get(1).copied().unwrap_or(left);
                    let mut concat = [0u8; 64];
                    concat[..32].copy_from_slice(&left);
                    concat[32..].copy_from_slice(&right);
                    sha256d(&concat)
                })
                .collect();
        }
        level[0]
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
        wire_options(MAX_BLOCK_SIZE)
            .serialize(self)
            .map_err(|e| ChainError::EncodeError(format!("Block encoding failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        wire_options(MAX_BLOCK_SIZE)
            .deserialize(bytes)
            .map_err(|e| ChainError::DecodeError(format!("Block decoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;
    use crate::crypto::KeyPair;
    use crate::transaction::COIN;

    fn payment(value: u64) -> Transaction {
        let mut prev = Transaction::new();
        prev.add_output(TxOutput::pay_to_address(
            value,
            &KeyPair::generate().address(Network::UnitTest),
        ));
        let mut tx = Transaction::new();
        tx.add_output(TxOutput::pay_to_address(
            value,
            &KeyPair::generate().address(Network::UnitTest),
        ));
        tx.connect_output(&prev, 0).unwrap();
        tx
    }

    #[test]
    fn test_hash_to_target() {
        assert_eq!(hash_to_target(0), [0xFF; 32]);
        let target = hash_to_target(12);
        assert_eq!(target[0], 0);
        assert_eq!(target[1], 0x0F);
        assert_eq!(target[2], 0xFF);
    }

    #[test]
    fn test_genesis_is_deterministic_and_solved() {
        let params = NetworkParams::unit_tests();
        let a = Block::genesis(&params).unwrap();
        let b = Block::genesis(&params).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert!(a.header.meets_target());
        assert_eq!(a.header.previous_hash, [0u8; 32]);
        assert!(a.coinbase().is_some());
    }

    #[test]
    fn test_genesis_differs_per_network() {
        let unit = Block::genesis(&NetworkParams::unit_tests()).unwrap();
        let mut params = NetworkParams::unit_tests();
        params.network = Network::Regtest;
        let regtest = Block::genesis(&params).unwrap();
        assert_ne!(unit.hash(), regtest.hash());
    }

    #[test]
    fn test_create_next_block_links_parent() {
        let genesis = Block::genesis(&NetworkParams::unit_tests()).unwrap();
        let to = KeyPair::generate().address(Network::UnitTest);
        let next = genesis
            .header
            .create_next_block(&to, BLOCK_VERSION_BIP66, 1_700_000_000, Some(5));

        assert_eq!(next.header.previous_hash, genesis.hash());
        assert_eq!(next.header.version, BLOCK_VERSION_BIP66);
        assert_eq!(next.header.timestamp, 1_700_000_000);
        assert_eq!(next.header.difficulty, genesis.header.difficulty);
        assert_eq!(next.transactions.len(), 1);

        let coinbase = next.coinbase().unwrap();
        assert_eq!(coinbase.outputs[0].value, FIFTY_COINS);
        assert_eq!(coinbase.outputs[0].script_pubkey.address(), Some(&to));
    }

    #[test]
    fn test_next_blocks_have_distinct_coinbases() {
        let genesis = Block::genesis(&NetworkParams::unit_tests()).unwrap();
        let to = KeyPair::generate().address(Network::UnitTest);
        let a = genesis.header.create_next_block(&to, BLOCK_VERSION_GENESIS, 0, None);
        let b = genesis.header.create_next_block(&to, BLOCK_VERSION_GENESIS, 0, None);
        assert_ne!(a.transactions[0].txid(), b.transactions[0].txid());
    }

    #[test]
    fn test_add_transaction_updates_merkle_root() {
        let genesis = Block::genesis(&NetworkParams::unit_tests()).unwrap();
        let to = KeyPair::generate().address(Network::UnitTest);
        let mut block = genesis.header.create_next_block(&to, BLOCK_VERSION_GENESIS, 0, None);
        let before = block.header.merkle_root;

        block.add_transaction(payment(COIN));
        assert_ne!(block.header.merkle_root, before);
        assert_eq!(
            block.header.merkle_root,
            Block::calculate_merkle_root(&block.transactions)
        );
    }

    #[test]
    fn test_merkle_root_odd_count_duplicates_last() {
        let txs = vec![payment(1), payment(2), payment(3)];
        let mut padded = txs.clone();
        padded.push(txs[2].clone());
        assert_eq!(
            Block::calculate_merkle_root(&txs),
            Block::calculate_merkle_root(&padded)
        );
        assert_eq!(Block::calculate_merkle_root(&[]), [0u8; 32]);
        assert_eq!(Block::calculate_merkle_root(&txs[..1]), txs[0].txid());
    }

    #[test]
    fn test_block_wire_round_trip() {
        let genesis = Block::genesis(&NetworkParams::unit_tests()).unwrap();
        let bytes = genesis.to_bytes().unwrap();
        let decoded = Block::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.hash(), genesis.hash());
        assert_eq!(decoded.to_bytes().unwrap(), bytes);

        let header_bytes = genesis.header.to_bytes().unwrap();
        assert_eq!(BlockHeader::from_bytes(&header_bytes).unwrap(), genesis.header);
    }

    #[test]
    fn test_work_doubles_per_bit() {
        let mut header = Block::genesis(&NetworkParams::unit_tests()).unwrap().header;
        header.difficulty = 4;
        let easy = header.work();
        header.difficulty = 5;
        assert_eq!(header.work(), easy * 2);
    }
}
