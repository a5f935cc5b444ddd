//! Locking and unlocking scripts carried by transaction outputs and inputs

use crate::crypto::{Address, KeyPair, TxSignature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Spending condition attached to an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockScript {
    /// Spendable by whoever proves ownership of the key hashed into the address.
    PayToAddress(Address),
    /// Spendable by the holder of this compressed public key.
    PayToPubKey(#[serde(with = "serde_bytes")] Vec<u8>),
}

impl LockScript {
    pub fn pay_to_address(address: &Address) -> Self {
        LockScript::PayToAddress(*address)
    }

    pub fn pay_to_pubkey(key: &KeyPair) -> Self {
        LockScript::PayToPubKey(key.public_key_bytes().to_vec())
    }

    pub fn address(&self) -> Option<&Address> {
        match self {
            LockScript::PayToAddress(address) => Some(address),
            LockScript::PayToPubKey(_) => None,
        }
    }

    pub fn pubkey(&self) -> Option<&[u8]> {
        match self {
            LockScript::PayToPubKey(bytes) => Some(bytes),
            LockScript::PayToAddress(_) => None,
        }
    }

    pub(crate) fn hash_into(&self, hasher: &mut Sha256) {
        match self {
            LockScript::PayToAddress(address) => {
                hasher.update([0u8]);
                hasher.update([address.network().address_prefix()]);
                hasher.update(address.hash());
            }
            LockScript::PayToPubKey(bytes) => {
                hasher.update([1u8]);
                hasher.update((bytes.len() as u64).to_le_bytes());
                hasher.update(bytes);
            }
        }
    }
}

/// Data presented by an input to satisfy the output it spends.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnlockScript {
    #[default]
    Empty,
    Signature(TxSignature),
    /// Script of the single input of a coinbase. `height` is absent when the
    /// block height is unknown; `extra` keeps coinbases distinct.
    Coinbase {
        height: Option<u32>,
        #[serde(with = "serde_bytes")]
        extra: Vec<u8>,
    },
}

impl UnlockScript {
    pub fn dummy_signature() -> Self {
        UnlockScript::Signature(TxSignature::dummy())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, UnlockScript::Empty)
    }

    pub(crate) fn hash_into(&self, hasher: &mut Sha256) {
        match self {
            UnlockScript::Empty => hasher.update([0u8]),
            UnlockScript::Signature(sig) => {
                hasher.update([1u8]);
                hasher.update((sig.signature.len() as u64).to_le_bytes());
                hasher.update(&sig.signature);
                hasher.update([sig.sighash as u8]);
            }
            UnlockScript::Coinbase { height, extra } => {
                hasher.update([2u8]);
                match height {
                    Some(height) => {
                        hasher.update([1u8]);
                        hasher.update(height.to_le_bytes());
                    }
                    None => hasher.update([0u8]),
                }
                hasher.update((extra.len() as u64).to_le_bytes());
                hasher.update(extra);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Network;

    fn digest_of(f: impl FnOnce(&mut Sha256)) -> Vec<u8> {
        let mut hasher = Sha256::new();
        f(&mut hasher);
        hasher.finalize().to_vec()
    }

    #[test]
    fn test_lock_script_accessors() {
        let key = KeyPair::generate();
        let address = key.address(Network::UnitTest);

        let p2a = LockScript::pay_to_address(&address);
        assert_eq!(p2a.address(), Some(&address));
        assert!(p2a.pubkey().is_none());

        let p2pk = LockScript::pay_to_pubkey(&key);
        assert_eq!(p2pk.pubkey(), Some(&key.public_key_bytes()[..]));
        assert!(p2pk.address().is_none());
    }

    #[test]
    fn test_script_hashes_separate_variants() {
        let a = digest_of(|h| UnlockScript::Empty.hash_into(h));
        let b = digest_of(|h| UnlockScript::dummy_signature().hash_into(h));
        let c = digest_of(|h| {
            UnlockScript::Coinbase {
                height: None,
                extra: vec![],
            }
            .hash_into(h)
        });
        let d = digest_of(|h| {
            UnlockScript::Coinbase {
                height: Some(0),
                extra: vec![],
            }
            .hash_into(h)
        });
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(c, d);
    }
}
