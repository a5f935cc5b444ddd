//! Integration tests for fixture chains on both store backends

use ledger_fixtures::blockchain::{validate_no_double_spend, verify_block, Block};
use ledger_fixtures::config::NetworkParams;
use ledger_fixtures::error::ChainError;
use ledger_fixtures::fixtures::{
    create_fake_block, create_fake_block_at_height, create_fake_double_spend_txns,
    create_fake_tx_pair, create_fake_tx_to_address, make_solved_test_block, random_address,
    round_trip_block, CHANGE_VALUE,
};
use ledger_fixtures::persistence::{BlockStore, MemoryBlockStore, SqliteBlockStore};
use ledger_fixtures::transaction::COIN;
use tempfile::TempDir;

/// Helper to get test directory
fn get_test_dir() -> Result<TempDir, Box<dyn std::error::Error>> {
    Ok(TempDir::new()?)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[test]
fn test_payment_example() {
    let params = NetworkParams::unit_tests();
    let to = random_address(&params);
    let tx = create_fake_tx_to_address(&params, 100_000_000, &to);

    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].value, 100_000_000);
    assert_eq!(tx.outputs[1].value, CHANGE_VALUE);
    assert!(tx.inputs[0].connected_output.is_none());
}

#[test]
fn test_sqlite_chain_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let temp_dir = get_test_dir()?;
    let db_path = temp_dir.path().join("chain.db");
    let db_path = db_path.to_str().ok_or("non-utf8 temp path")?;
    let params = NetworkParams::unit_tests();

    let tip = {
        let mut store = SqliteBlockStore::open(db_path, params.clone())?;
        let mut last = None;
        for height in 1..=3 {
            let to = random_address(store.params());
            let tx = create_fake_tx_to_address(store.params(), COIN, &to);
            let pair = create_fake_block_at_height(&mut store, height, vec![tx]);
            assert_eq!(pair.stored_block.height, height);
            last = Some(pair.stored_block);
        }
        last.ok_or("no blocks built")?
    };

    let store = SqliteBlockStore::open(db_path, params)?;
    let head = store.chain_head()?;
    assert_eq!(head, tip);

    let mut cursor = head;
    let mut walked = 0;
    while let Some(parent) = cursor.prev(&store)? {
        assert_eq!(parent.height + 1, cursor.height);
        cursor = parent;
        walked += 1;
    }
    assert_eq!(walked, 3);
    assert_eq!(cursor.height, 0);
    Ok(())
}

#[test]
fn test_tx_pair_in_consecutive_blocks() -> Result<(), ChainError> {
    let mut store = MemoryBlockStore::new(NetworkParams::unit_tests())?;
    let to = random_address(store.params());
    let from = random_address(store.params());
    let [prev, tx] = create_fake_tx_pair(store.params(), COIN, &to, &from);

    let first = create_fake_block(&mut store, vec![prev]);
    let second = create_fake_block(&mut store, vec![tx]);

    verify_block(&first.block)?;
    verify_block(&second.block)?;
    assert_eq!(second.block.header.previous_hash, first.block.hash());
    assert_eq!(store.chain_head()?.height, 2);
    Ok(())
}

#[test]
fn test_double_spends_are_caught_by_block_checks() -> Result<(), ChainError> {
    let mut store = MemoryBlockStore::new(NetworkParams::unit_tests())?;
    let to = random_address(store.params());
    let spends = create_fake_double_spend_txns(store.params(), &to);

    let pair = create_fake_block(&mut store, vec![spends.t1, spends.t2]);
    assert!(matches!(
        validate_no_double_spend(&pair.block),
        Err(ChainError::DoubleSpendDetected(_))
    ));
    Ok(())
}

#[test]
fn test_solved_test_block_round_trips() -> Result<(), ChainError> {
    let store = MemoryBlockStore::new(NetworkParams::unit_tests())?;
    let to = random_address(store.params());

    let block = make_solved_test_block(&store, &to)?;
    let copy: Block = round_trip_block(&block);
    assert_eq!(copy.hash(), block.hash());
    verify_block(&copy)?;
    Ok(())
}

#[test]
fn test_params_from_toml_drive_the_store() -> Result<(), ChainError> {
    let params = NetworkParams::from_toml_str("network = \"regtest\"\ngenesis_difficulty = 6\n")?;
    let mut store = MemoryBlockStore::new(params)?;

    let genesis = store.chain_head()?;
    assert_eq!(genesis.header.difficulty, 6);

    let pair = create_fake_block(&mut store, vec![]);
    assert_eq!(pair.block.header.difficulty, 6);
    assert!(pair.stored_block.more_work_than(&genesis));
    Ok(())
}
