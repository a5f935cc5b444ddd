//! Transaction types and their canonical wire encoding
use crate::crypto::{finalize_double, Address, KeyPair, Sha256Hash};
use crate::error::ChainError;
use crate::transaction::script::{LockScript, UnlockScript};
use bincode::Options;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Smallest units per coin.
pub const COIN: u64 = 100_000_000;
pub const CENT: u64 = COIN / 100;
pub const FIFTY_COINS: u64 = 50 * COIN;

/// Maximum transaction size in bytes (100KB)
pub const MAX_TRANSACTION_SIZE: u64 = 100_000;

pub const TX_VERSION: u32 = 1;
pub const SEQUENCE_FINAL: u32 = u32::MAX;

/// `coins` whole coins plus `cents` hundredths of a coin.
pub const fn value_of(coins: u64, cents: u64) -> u64 {
    coins * COIN + cents * CENT
}

/// Canonical wire options: fixed-width little-endian integers, bounded
/// input, no trailing bytes.
pub(crate) fn wire_options(limit: u64) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(limit)
}

/// Coordinates of an output: the id of its transaction and its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Sha256Hash,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Sha256Hash, vout: u32) -> Self {
        OutPoint { txid, vout }
    }

    /// The outpoint referenced by a coinbase input.
    pub const fn null() -> Self {
        OutPoint {
            txid: [0u8; 32],
            vout: u32::MAX,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        hasher.update(self.txid);
        hasher.update(self.vout.to_le_bytes());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: LockScript,
}

impl TxOutput {
    pub fn new(value: u64, script_pubkey: LockScript) -> Self {
        TxOutput {
            value,
            script_pubkey,
        }
    }

    pub fn pay_to_address(value: u64, address: &Address) -> Self {
        Self::new(value, LockScript::pay_to_address(address))
    }

    pub fn pay_to_pubkey(value: u64, key: &KeyPair) -> Self {
        Self::new(value, LockScript::pay_to_pubkey(key))
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        hasher.update(self.value.to_le_bytes());
        self.script_pubkey.hash_into(hasher);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub previous_output: OutPoint,
    pub script_sig: UnlockScript,
    pub sequence: u32,
    /// Live copy of the output being spent. Never encoded: a transaction read
    /// from bytes only knows `previous_output`.
    #[serde(skip)]
    pub connected_output: Option<TxOutput>,
}

impl TxInput {
    pub fn new(previous_output: OutPoint, script_sig: UnlockScript) -> Self {
        TxInput {
            previous_output,
            script_sig,
            sequence: SEQUENCE_FINAL,
            connected_output: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected_output.is_some()
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        self.previous_output.hash_into(hasher);
        self.script_sig.hash_into(hasher);
        hasher.update(self.sequence.to_le_bytes());
    }
}

/// Where a transaction was learned from. In-memory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfidenceSource {
    #[default]
    Unknown,
    Network,
    SelfOwned,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionConfidence {
    pub source: ConfidenceSource,
}

/// A transaction. Equality and identity are defined by [`Transaction::txid`],
/// so in-memory state never affects comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub lock_time: u32,
    #[serde(skip)]
    pub confidence: TransactionConfidence,
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.txid() == other.txid()
    }
}

impl Eq for Transaction {}

impl Transaction {
    pub fn new() -> Self {
        Transaction {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            lock_time: 0,
            confidence: TransactionConfidence::default(),
        }
    }

    /// A coinbase: a single input spending the null outpoint, no outputs yet.
    pub fn coinbase(height: Option<u32>, extra: Vec<u8>) -> Self {
        let mut tx = Self::new();
        tx.inputs.push(TxInput::new(
            OutPoint::null(),
            UnlockScript::Coinbase { height, extra },
        ));
        tx
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
    }

    pub fn add_output(&mut self, output: TxOutput) {
        self.outputs.push(output);
    }

    pub fn add_input(&mut self, input: TxInput) {
        self.inputs.push(input);
    }

    /// Adds an input spending output `vout` of `prev`, keeping a live link to it.
    pub fn connect_output(
        &mut self,
        prev: &Transaction,
        vout: u32,
    ) -> Result<&mut TxInput, ChainError> {
        let output = prev.outputs.get(vout as usize).ok_or_else(|| {
            ChainError::InvalidTransaction(format!(
                "Transaction {} has no output {}",
                prev.txid_hex(),
                vout
            ))
        })?;

        let mut input = TxInput::new(OutPoint::new(prev.txid(), vout), UnlockScript::Empty);
        input.connected_output = Some(output.clone());

        let index = self.inputs.len();
        self.inputs.push(input);
        Ok(&mut self.inputs[index])
    }

    pub fn outpoint(&self, vout: u32) -> OutPoint {
        OutPoint::new(self.txid(), vout)
    }

    /// Sum of output values, `None` on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, output| acc.checked_add(output.value))
    }

    /// Double SHA-256 over every encoded field, in wire order.
    pub fn txid(&self) -> Sha256Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.version.to_le_bytes());
        hasher.update((self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            input.hash_into(&mut hasher);
        }
        hasher.update((self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            output.hash_into(&mut hasher);
        }
        hasher.update(self.lock_time.to_le_bytes());
        finalize_double(hasher)
    }

    pub fn txid_hex(&self) -> String {
        hex::encode(self.txid())
    }

    /// Canonical wire bytes. In-memory state (connected outputs, confidence) is not included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ChainError> {
        wire_options(MAX_TRANSACTION_SIZE)
            .serialize(self)
            .map_err(|e| ChainError::EncodeError(format!("Transaction encoding failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        wire_options(MAX_TRANSACTION_SIZE)
            .deserialize(bytes)
            .map_err(|e| ChainError::DecodeError(format!("Transaction decoding failed: {}", e)))
    }
}
