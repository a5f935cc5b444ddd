//! Throwaway keys and addresses for fixture recipients

use crate::config::{Network, NetworkParams};
use crate::crypto::{Address, KeyPair};
use rand::Rng;

/// A fresh random key pair.
pub fn new_key() -> KeyPair {
    KeyPair::generate()
}

pub fn new_key_with_rng<R: Rng + ?Sized>(rng: &mut R) -> KeyPair {
    KeyPair::generate_with_rng(rng)
}

pub fn address_for(key: &KeyPair, network: Network) -> Address {
    key.address(network)
}

/// An address on `params`' network whose key is thrown away.
pub fn random_address(params: &NetworkParams) -> Address {
    address_for(&new_key(), params.network)
}

pub fn random_address_with_rng<R: Rng + ?Sized>(params: &NetworkParams, rng: &mut R) -> Address {
    address_for(&new_key_with_rng(rng), params.network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_address_for_is_deterministic() {
        let key = new_key();
        assert_eq!(
            address_for(&key, Network::UnitTest),
            address_for(&key, Network::UnitTest)
        );
        assert_ne!(
            address_for(&key, Network::UnitTest),
            address_for(&key, Network::Mainnet)
        );
    }

    #[test]
    fn test_random_addresses_differ() {
        let params = NetworkParams::unit_tests();
        let a = random_address(&params);
        let b = random_address(&params);
        assert_ne!(a, b);
        assert_eq!(a.network(), Network::UnitTest);
    }

    #[test]
    fn test_seeded_random_address_repeats() {
        let params = NetworkParams::regtest();
        let a = random_address_with_rng(&params, &mut StdRng::seed_from_u64(42));
        let b = random_address_with_rng(&params, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
