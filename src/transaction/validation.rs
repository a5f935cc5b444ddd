//! Context-free structural checks, kept apart from the type definitions
use crate::error::ChainError;
use crate::transaction::script::UnlockScript;
use crate::transaction::types::{Transaction, COIN, MAX_TRANSACTION_SIZE};
use std::collections::HashSet;

/// No single output, and no transaction total, may exceed this.
pub const MAX_MONEY: u64 = 21_000_000 * COIN;

impl Transaction {
    /// Validate transaction size to prevent DoS attacks
    pub fn validate_size(&self) -> Result<(), ChainError> {
        let size = bincode::serialized_size(self)
            .map_err(|e| ChainError::EncodeError(format!("Serialization failed: {}", e)))?;

        if size > MAX_TRANSACTION_SIZE {
            return Err(ChainError::InvalidTransaction(format!(
                "Transaction too large: {} bytes (max: {})",
                size, MAX_TRANSACTION_SIZE
            )));
        }
        Ok(())
    }

    /// Checks that need no chain state: shape, value range, duplicate inputs
    /// and coinbase form. Signatures are not examined.
    pub fn check_structure(&self) -> Result<(), ChainError> {
        if self.inputs.is_empty() {
            return Err(ChainError::InvalidTransaction(format!(
                "Transaction {} has no inputs",
                self.txid_hex()
            )));
        }
        if self.outputs.is_empty() {
            return Err(ChainError::InvalidTransaction(format!(
                "Transaction {} has no outputs",
                self.txid_hex()
            )));
        }

        self.validate_size()?;

        let mut total: u64 = 0;
        for output in &self.outputs {
            if output.value > MAX_MONEY {
                return Err(ChainError::InvalidTransaction(format!(
                    "Output value {} exceeds maximum {}",
                    output.value, MAX_MONEY
                )));
            }
            total = total
                .checked_add(output.value)
                .filter(|total| *total <= MAX_MONEY)
                .ok_or_else(|| {
                    ChainError::InvalidTransaction("Total output value out of range".to_string())
                })?;
        }

        let mut seen = HashSet::with_capacity(self.inputs.len());
        for input in &self.inputs {
            if !seen.insert(input.previous_output) {
                return Err(ChainError::InvalidTransaction(format!(
                    "Transaction {} spends {}:{} twice",
                    self.txid_hex(),
                    hex::encode(input.previous_output.txid),
                    input.previous_output.vout
                )));
            }
        }

        if self.is_coinbase() {
            if !matches!(self.inputs[0].script_sig, UnlockScript::Coinbase { .. }) {
                return Err(ChainError::InvalidTransaction(
                    "Coinbase input must carry a coinbase script".to_string(),
                ));
            }
        } else if self.inputs.iter().any(|input| input.previous_output.is_null()) {
            return Err(ChainError::InvalidTransaction(
                "Non-coinbase transaction spends the null outpoint".to_string(),
            ));
        }

        Ok(())
    }
}
