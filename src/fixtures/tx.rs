//! Spend-graph builders
//!
//! Feeder transactions carry only outputs. They exist so the transaction a
//! test actually inspects has inputs pointing at real outpoints.

use super::expect_fixture;
use super::keys::{new_key, new_key_with_rng, random_address, random_address_with_rng};
use super::round_trip::try_round_trip_transaction;
use crate::config::NetworkParams;
use crate::crypto::{Address, KeyPair};
use crate::error::ChainError;
use crate::transaction::{
    value_of, Transaction, TxOutput, UnlockScript, COIN, FIFTY_COINS,
};
use rand::Rng;
use tracing::debug;

/// Value of the change output added by the change-paying builders.
pub const CHANGE_VALUE: u64 = value_of(1, 11);

/// Substituted for a zero random draw when splitting a value.
pub const SPLIT_FALLBACK: u64 = 15;

/// A feeder and two transactions spending the same output of it.
#[derive(Debug, Clone)]
pub struct DoubleSpends {
    pub prev_tx: Transaction,
    pub t1: Transaction,
    pub t2: Transaction,
}

/// Portion of `total` assigned to the first of two feeders, derived from a
/// random `draw`. The second feeder gets `total - split_value(total, draw)`.
pub fn split_value(total: u64, draw: i64) -> u64 {
    let mut split = draw.unsigned_abs();
    if split == 0 {
        split = SPLIT_FALLBACK;
    }
    while split > total {
        split /= 2;
    }
    split
}

fn feeder(output: TxOutput) -> Transaction {
    let mut tx = Transaction::new();
    tx.add_output(output);
    tx
}

fn spend(
    tx: &mut Transaction,
    prev: &Transaction,
    script_sig: UnlockScript,
) -> Result<(), ChainError> {
    tx.connect_output(prev, 0)?.script_sig = script_sig;
    Ok(())
}

/// A one-coin payment to a random address, funded by two feeders.
pub fn create_fake_tx(params: &NetworkParams) -> Transaction {
    create_fake_tx_with_rng(params, &mut rand::thread_rng())
}

pub fn create_fake_tx_with_rng<R: Rng + ?Sized>(params: &NetworkParams, rng: &mut R) -> Transaction {
    let to = random_address_with_rng(params, rng);
    create_fake_tx_without_change_address_with_rng(COIN, &to, rng)
}

/// Pays `output` from one freshly funded input. Not round-tripped: the input
/// keeps its connected output.
pub fn create_fake_tx_without_change(params: &NetworkParams, output: TxOutput) -> Transaction {
    let prev = create_fake_tx_to_address(params, COIN, &random_address(params));

    let mut tx = Transaction::new();
    tx.add_output(output);
    expect_fixture(spend(&mut tx, &prev, UnlockScript::Empty), "spending the feeder");
    tx
}

/// A coinbase paying [`FIFTY_COINS`] to a fresh public key. Not round-tripped.
pub fn create_fake_coinbase_tx() -> Transaction {
    let mut tx = Transaction::coinbase(None, Vec::new());
    tx.add_output(TxOutput::pay_to_pubkey(FIFTY_COINS, &new_key()));
    tx
}

/// Pays `value` to `to` plus [`CHANGE_VALUE`] to `change`, spending a single
/// feeder. The same arguments always give the same transaction.
pub fn create_fake_tx_with_change_address(value: u64, to: &Address, change: &Address) -> Transaction {
    expect_fixture(
        try_create_fake_tx_with_change_address(value, to, change),
        "building a payment with change",
    )
}

pub fn try_create_fake_tx_with_change_address(
    value: u64,
    to: &Address,
    change: &Address,
) -> Result<Transaction, ChainError> {
    let mut tx = Transaction::new();
    tx.add_output(TxOutput::pay_to_address(value, to));
    tx.add_output(TxOutput::pay_to_address(CHANGE_VALUE, change));

    let prev = feeder(TxOutput::pay_to_address(value, to));
    spend(&mut tx, &prev, UnlockScript::dummy_signature())?;

    let tx = try_round_trip_transaction(&tx)?;
    debug!("Built fake payment {} with change", tx.txid_hex());
    Ok(tx)
}

/// Pays `value` to `to` with no change, from two feeders splitting `value`
/// at random. The split makes every result unique.
pub fn create_fake_tx_without_change_address(value: u64, to: &Address) -> Transaction {
    create_fake_tx_without_change_address_with_rng(value, to, &mut rand::thread_rng())
}

pub fn create_fake_tx_without_change_address_with_rng<R: Rng + ?Sized>(
    value: u64,
    to: &Address,
    rng: &mut R,
) -> Transaction {
    expect_fixture(
        try_create_fake_tx_without_change_address(value, to, rng.gen()),
        "building a split payment",
    )
}

fn try_create_fake_tx_without_change_address(
    value: u64,
    to: &Address,
    draw: i64,
) -> Result<Transaction, ChainError> {
    let split = split_value(value, draw);
    let prev1 = feeder(TxOutput::pay_to_address(split, to));
    // An even split would otherwise make both feeders, and so both outpoints, identical.
    let mut prev2 = feeder(TxOutput::pay_to_address(value - split, to));
    prev2.lock_time = 1;

    let mut tx = Transaction::new();
    tx.add_output(TxOutput::pay_to_address(value, to));
    spend(&mut tx, &prev1, UnlockScript::dummy_signature())?;
    spend(&mut tx, &prev2, UnlockScript::dummy_signature())?;

    let tx = try_round_trip_transaction(&tx)?;
    debug!("Built fake payment {} split {}/{}", tx.txid_hex(), split, value - split);
    Ok(tx)
}

/// Like [`create_fake_tx_with_change_address`] with change to a random address.
pub fn create_fake_tx_to_address(params: &NetworkParams, value: u64, to: &Address) -> Transaction {
    create_fake_tx_with_change_address(value, to, &random_address(params))
}

pub fn create_fake_tx_to_address_with_rng<R: Rng + ?Sized>(
    params: &NetworkParams,
    value: u64,
    to: &Address,
    rng: &mut R,
) -> Transaction {
    create_fake_tx_with_change_address(value, to, &random_address_with_rng(params, rng))
}

/// Pays `value` to `to`'s public key, change to a fresh key. The input has an
/// empty unlocking script.
pub fn create_fake_tx_to_key(value: u64, to: &KeyPair) -> Transaction {
    create_fake_tx_to_key_with_rng(value, to, &mut rand::thread_rng())
}

pub fn create_fake_tx_to_key_with_rng<R: Rng + ?Sized>(
    value: u64,
    to: &KeyPair,
    rng: &mut R,
) -> Transaction {
    expect_fixture(
        try_create_fake_tx_to_key(value, to, &new_key_with_rng(rng)),
        "building a payment to a key",
    )
}

fn try_create_fake_tx_to_key(
    value: u64,
    to: &KeyPair,
    change: &KeyPair,
) -> Result<Transaction, ChainError> {
    let mut tx = Transaction::new();
    tx.add_output(TxOutput::pay_to_pubkey(value, to));
    tx.add_output(TxOutput::pay_to_pubkey(CHANGE_VALUE, change));

    let prev = feeder(TxOutput::pay_to_pubkey(value, to));
    spend(&mut tx, &prev, UnlockScript::Empty)?;
    try_round_trip_transaction(&tx)
}

/// A two-step chain `from -> to -> to`: index 0 pays `value` to `to` spending
/// a feeder that paid `from`, index 1 spends index 0 and pays `value` to `to`
/// plus change to a random address.
pub fn create_fake_tx_pair(
    params: &NetworkParams,
    value: u64,
    to: &Address,
    from: &Address,
) -> [Transaction; 2] {
    create_fake_tx_pair_with_rng(params, value, to, from, &mut rand::thread_rng())
}

pub fn create_fake_tx_pair_with_rng<R: Rng + ?Sized>(
    params: &NetworkParams,
    value: u64,
    to: &Address,
    from: &Address,
    rng: &mut R,
) -> [Transaction; 2] {
    let change = random_address_with_rng(params, rng);
    expect_fixture(
        try_create_fake_tx_pair(value, to, from, &change),
        "building a transaction pair",
    )
}

fn try_create_fake_tx_pair(
    value: u64,
    to: &Address,
    from: &Address,
    change: &Address,
) -> Result<[Transaction; 2], ChainError> {
    let mut tx = Transaction::new();
    tx.add_output(TxOutput::pay_to_address(value, to));
    tx.add_output(TxOutput::pay_to_address(CHANGE_VALUE, change));

    let feeder_tx = feeder(TxOutput::pay_to_address(value, from));
    let mut prev = feeder(TxOutput::pay_to_address(value, to));
    spend(&mut prev, &feeder_tx, UnlockScript::Empty)?;
    spend(&mut tx, &prev, UnlockScript::Empty)?;

    Ok([
        try_round_trip_transaction(&prev)?,
        try_round_trip_transaction(&tx)?,
    ])
}

/// Two round-tripped transactions spending output 0 of the same feeder: `t1`
/// pays `to`, `t2` pays the feeder's own random owner. `prev_tx` keeps its
/// in-memory state.
pub fn create_fake_double_spend_txns(params: &NetworkParams, to: &Address) -> DoubleSpends {
    create_fake_double_spend_txns_with_rng(params, to, &mut rand::thread_rng())
}

pub fn create_fake_double_spend_txns_with_rng<R: Rng + ?Sized>(
    params: &NetworkParams,
    to: &Address,
    rng: &mut R,
) -> DoubleSpends {
    let bad_guy = random_address_with_rng(params, rng);
    expect_fixture(
        try_create_fake_double_spend_txns(to, &bad_guy),
        "building double spends",
    )
}

fn try_create_fake_double_spend_txns(
    to: &Address,
    bad_guy: &Address,
) -> Result<DoubleSpends, ChainError> {
    let prev_tx = feeder(TxOutput::pay_to_address(COIN, bad_guy));

    let mut t1 = Transaction::new();
    t1.add_output(TxOutput::pay_to_address(COIN, to));
    spend(&mut t1, &prev_tx, UnlockScript::Empty)?;

    let mut t2 = Transaction::new();
    spend(&mut t2, &prev_tx, UnlockScript::Empty)?;
    t2.add_output(TxOutput::pay_to_address(COIN, bad_guy));

    let t1 = try_round_trip_transaction(&t1)?;
    let t2 = try_round_trip_transaction(&t2)?;
    debug!(
        "Built double spends {} and {} of {}",
        t1.txid_hex(),
        t2.txid_hex(),
        prev_tx.txid_hex()
    );
    Ok(DoubleSpends { prev_tx, t1, t2 })
}
