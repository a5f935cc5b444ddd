//! Cryptographic primitives: hashing, keys, addresses and transaction signatures

use crate::config::Network;
use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    All, PublicKey, Secp256k1, SecretKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

pub type Sha256Hash = [u8; 32];

/// Length of the hash carried by an [`Address`].
pub const ADDRESS_HASH_SIZE: usize = 20;

/// Double SHA-256, used for transaction ids, block hashes and addresses.
pub fn sha256d(data: &[u8]) -> Sha256Hash {
    let first = Sha256::digest(data);
    Sha256::digest(first).into()
}

/// Finishes a running hasher with a second SHA-256 round.
pub fn finalize_double(hasher: Sha256) -> Sha256Hash {
    Sha256::digest(hasher.finalize()).into()
}

/// A spendable address: a truncated hash of a public key, bound to a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    network: Network,
    hash: [u8; ADDRESS_HASH_SIZE],
}

impl Address {
    pub fn new(network: Network, hash: [u8; ADDRESS_HASH_SIZE]) -> Self {
        Address { network, hash }
    }

    /// Derives the address of a public key on the given network.
    pub fn from_public_key(public_key: &PublicKey, network: Network) -> Self {
        let mut preimage = Vec::with_capacity(1 + PUBLIC_KEY_SIZE);
        preimage.push(network.address_prefix());
        preimage.extend_from_slice(&public_key.serialize());
        let digest = sha256d(&preimage);

        let mut hash = [0u8; ADDRESS_HASH_SIZE];
        hash.copy_from_slice(&digest[..ADDRESS_HASH_SIZE]);
        Address { network, hash }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn hash(&self) -> &[u8; ADDRESS_HASH_SIZE] {
        &self.hash
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.network, self.to_hex())
    }
}

impl FromStr for Address {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (network, hex_str) = s
            .split_once(':')
            .ok_or_else(|| ChainError::CryptoError(format!("Address is missing a network: {}", s)))?;
        let network = network.parse::<Network>()?;

        let bytes = hex::decode(hex_str)
            .map_err(|e| ChainError::CryptoError(format!("Invalid hex address: {}", e)))?;
        let hash: [u8; ADDRESS_HASH_SIZE] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            ChainError::CryptoError(format!(
                "Address must be {} bytes, got {}",
                ADDRESS_HASH_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Address { network, hash })
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Same as [`KeyPair::generate`] but drawing from `rng`, so seeded callers get repeatable keys.
    pub fn generate_with_rng<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_secret_key(SecretKey::new(rng))
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    pub fn address(&self, network: Network) -> Address {
        Address::from_public_key(&self.public_key, network)
    }

    /// Returns the KeyPair's public key as a compressed byte array.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }
}

/// Sighash flag appended to a transaction signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SigHashType {
    #[default]
    All,
    None,
    Single,
}

/// r || s of the largest low-S signature: half the secp256k1 group order.
const HALF_CURVE_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b,
    0x20, 0xa0,
];

/// A compact ECDSA signature plus its sighash flag, as carried in an input script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxSignature {
    #[serde(with = "serde_bytes")]
    pub signature: Vec<u8>,
    pub sighash: SigHashType,
}

impl TxSignature {
    /// A placeholder signature of realistic size. It does not verify against any key.
    pub fn dummy() -> Self {
        let mut signature = Vec::with_capacity(64);
        signature.extend_from_slice(&HALF_CURVE_ORDER);
        signature.extend_from_slice(&HALF_CURVE_ORDER);
        TxSignature {
            signature,
            sighash: SigHashType::All,
        }
    }
}
