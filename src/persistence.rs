//! Chain store: stored block headers plus a single chain-head pointer
//!
//! Stores are single-writer. Mutating methods take `&mut self`, so sharing a
//! store between writers needs external synchronization; none is done here.

use crate::blockchain::{Block, BlockHeader, StoredBlock};
use crate::config::{Network, NetworkParams};
use crate::crypto::Sha256Hash;
use crate::error::ChainError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use tracing::{debug, info};

/// Abstraction for chain store backends.
pub trait BlockStore {
    fn params(&self) -> &NetworkParams;
    fn get(&self, hash: &Sha256Hash) -> Result<Option<StoredBlock>, ChainError>;
    fn put(&mut self, block: &StoredBlock) -> Result<(), ChainError>;
    fn chain_head(&self) -> Result<StoredBlock, ChainError>;
    fn set_chain_head(&mut self, block: &StoredBlock) -> Result<(), ChainError>;
}

/// In-memory store, seeded with the genesis block of its network.
#[derive(Debug, Clone)]
pub struct MemoryBlockStore {
    params: NetworkParams,
    blocks: HashMap<Sha256Hash, StoredBlock>,
    chain_head: Sha256Hash,
}

impl MemoryBlockStore {
    pub fn new(params: NetworkParams) -> Result<Self, ChainError> {
        let genesis = StoredBlock::genesis(&Block::genesis(&params)?);
        let chain_head = genesis.hash();

        let mut blocks = HashMap::new();
        blocks.insert(chain_head, genesis);
        Ok(MemoryBlockStore {
            params,
            blocks,
            chain_head,
        })
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockStore for MemoryBlockStore {
    fn params(&self) -> &NetworkParams {
        &self.params
    }

    fn get(&self, hash: &Sha256Hash) -> Result<Option<StoredBlock>, ChainError> {
        Ok(self.blocks.get(hash).cloned())
    }

    fn put(&mut self, block: &StoredBlock) -> Result<(), ChainError> {
        self.blocks.insert(block.hash(), block.clone());
        Ok(())
    }

    fn chain_head(&self) -> Result<StoredBlock, ChainError> {
        self.blocks
            .get(&self.chain_head)
            .cloned()
            .ok_or_else(|| ChainError::BlockNotFound(hex::encode(self.chain_head)))
    }

    fn set_chain_head(&mut self, block: &StoredBlock) -> Result<(), ChainError> {
        self.chain_head = block.hash();
        Ok(())
    }
}

/// SQLite-backed store. A fresh database is initialized with the genesis
/// block; reopening a database of another network fails.
pub struct SqliteBlockStore {
    params: NetworkParams,
    conn: Connection,
}

impl SqliteBlockStore {
    pub fn open(path: &str, params: NetworkParams) -> Result<Self, ChainError> {
        let conn = Connection::open(path)
            .map_err(|e| ChainError::DatabaseError(format!("Failed to open database: {}", e)))?;
        info!("Opened block store at {} ({})", path, params.network);
        Self::init(conn, params)
    }

    pub fn open_in_memory(params: NetworkParams) -> Result<Self, ChainError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to open database: {}", e)))?;
        Self::init(conn, params)
    }

    fn init(conn: Connection, params: NetworkParams) -> Result<Self, ChainError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                hash BLOB PRIMARY KEY,
                height INTEGER NOT NULL,
                chain_work BLOB NOT NULL,
                header BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to create blocks table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            ChainError::DatabaseError(format!("Failed to create metadata table: {}", e))
        })?;

        let mut store = SqliteBlockStore { params, conn };
        match store.metadata("network")? {
            Some(network) => {
                let network = network.parse::<Network>()?;
                if network != store.params.network {
                    return Err(ChainError::ConfigError(format!(
                        "Block store belongs to {}, not {}",
                        network, store.params.network
                    )));
                }
            }
            None => {
                let genesis = StoredBlock::genesis(&Block::genesis(&store.params)?);
                store.put(&genesis)?;
                store.set_chain_head(&genesis)?;
                let network = store.params.network.name();
                store.set_metadata("network", network)?;
                debug!("Initialized block store with genesis {}", genesis.header.hash_hex());
            }
        }
        Ok(store)
    }

    fn metadata(&self, key: &str) -> Result<Option<String>, ChainError> {
        self.conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to read {}: {}", key, e)))
    }

    fn set_metadata(&mut self, key: &str, value: &str) -> Result<(), ChainError> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .map_err(|e| ChainError::DatabaseError(format!("Failed to save {}: {}", key, e)))?;
        Ok(())
    }
}

fn stored_block_from_row(
    height: i64,
    chain_work: Vec<u8>,
    header: Vec<u8>,
) -> Result<StoredBlock, ChainError> {
    let chain_work: [u8; 16] = chain_work.try_into().map_err(|bytes: Vec<u8>| {
        ChainError::DatabaseError(format!("Chain work must be 16 bytes, got {}", bytes.len()))
    })?;
    let height = u32::try_from(height)
        .map_err(|_| ChainError::DatabaseError(format!("Invalid stored height {}", height)))?;

    Ok(StoredBlock::new(
        BlockHeader::from_bytes(&header)?,
        u128::from_le_bytes(chain_work),
        height,
    ))
}

impl BlockStore for SqliteBlockStore {
    fn params(&self) -> &NetworkParams {
        &self.params
    }

    fn get(&self, hash: &Sha256Hash) -> Result<Option<StoredBlock>, ChainError> {
        let row = self
            .conn
            .query_row(
                "SELECT height, chain_work, header FROM blocks WHERE hash = ?1",
                params![hash.to_vec()],
                |row| {
                    let height: i64 = row.get(0)?;
                    let chain_work: Vec<u8> = row.get(1)?;
                    let header: Vec<u8> = row.get(2)?;
                    Ok((height, chain_work, header))
                },
            )
            .optional()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to load block: {}", e)))?;

        row.map(|(height, chain_work, header)| stored_block_from_row(height, chain_work, header))
            .transpose()
    }

    fn put(&mut self, block: &StoredBlock) -> Result<(), ChainError> {
        let header = block.header.to_bytes()?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO blocks (hash, height, chain_work, header)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    block.hash().to_vec(),
                    block.height as i64,
                    block.chain_work.to_le_bytes().to_vec(),
                    header,
                ],
            )
            .map_err(|e| ChainError::DatabaseError(format!("Failed to save block: {}", e)))?;
        Ok(())
    }

    fn chain_head(&self) -> Result<StoredBlock, ChainError> {
        let head = self
            .metadata("chain_head")?
            .ok_or_else(|| ChainError::DatabaseError("Chain head is not set".to_string()))?;
        let hash: Sha256Hash = hex::decode(&head)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| ChainError::DatabaseError(format!("Corrupt chain head {}", head)))?;

        self.get(&hash)?
            .ok_or(ChainError::BlockNotFound(head))
    }

    fn set_chain_head(&mut self, block: &StoredBlock) -> Result<(), ChainError> {
        self.set_metadata("chain_head", &block.header.hash_hex())
    }
}
