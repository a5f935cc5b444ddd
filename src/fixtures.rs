//! Test fixtures: fake keys, spend graphs and blocks on top of a chain store
//!
//! Every builder returns objects that went through a real encode/decode pass
//! unless its docs say otherwise, so in-memory links such as
//! `TxInput::connected_output` are gone by the time a test sees them.
//!
//! Fixture builders treat collaborator failures (decoding, solving, store
//! writes) as programming errors and panic. The `try_` variants hand the
//! [`ChainError`] back instead.

pub mod block;
pub mod keys;
pub mod round_trip;
pub mod tx;

pub use block::*;
pub use keys::*;
pub use round_trip::*;
pub use tx::*;

use crate::error::ChainError;

/// Unwraps a fixture step, panicking with the step name on failure.
#[track_caller]
pub(crate) fn expect_fixture<T>(result: Result<T, ChainError>, step: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Fixture failed while {}: {}", step, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_fixture_passes_value_through() {
        assert_eq!(expect_fixture(Ok(3), "counting"), 3);
    }

    #[test]
    #[should_panic(expected = "Fixture failed while decoding: Decoding error: truncated")]
    fn test_expect_fixture_names_the_step() {
        expect_fixture::<()>(
            Err(ChainError::DecodeError("truncated".to_string())),
            "decoding",
        );
    }
}
