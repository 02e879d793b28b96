//! canonical pool identifiers

use alloy_primitives::{keccak256, Address};
use lendguard_risk::PoolId;

/// order a token pair as (lower, higher)
pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// `keccak256(lower ++ higher)` over the packed 20-byte addresses, the
/// same id the pool contract assigns to the pair regardless of argument
/// order
pub fn pool_id(a: Address, b: Address) -> PoolId {
    let (lower, higher) = sort_tokens(a, b);
    let mut packed = [0u8; 40];
    packed[..20].copy_from_slice(lower.as_slice());
    packed[20..].copy_from_slice(higher.as_slice());
    keccak256(packed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_id_is_order_independent() {
        let a = Address::repeat_byte(0x01);
        let b = Address::repeat_byte(0x02);
        assert_eq!(pool_id(a, b), pool_id(b, a));
        assert_ne!(pool_id(a, b), pool_id(a, a));
    }

    #[test]
    fn test_pool_id_matches_packed_encoding() {
        let a = Address::repeat_byte(0x02);
        let b = Address::repeat_byte(0x01);
        let mut expected = Vec::new();
        expected.extend_from_slice(b.as_slice());
        expected.extend_from_slice(a.as_slice());
        assert_eq!(pool_id(a, b), keccak256(expected));
    }
}
