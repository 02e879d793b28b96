//! token metadata

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// erc-20 metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// scale of every amount of this token
    pub decimals: u8,
}

/// lookup of a token's decimals
///
/// returning `None` for a token marks every value derived from it as
/// unknown. never guess a default here.
pub trait TokenDecimals {
    fn decimals_of(&self, token: &Address) -> Option<u8>;
}

impl<T: TokenDecimals + ?Sized> TokenDecimals for &T {
    fn decimals_of(&self, token: &Address) -> Option<u8> {
        (**self).decimals_of(token)
    }
}

impl TokenDecimals for HashMap<Address, u8> {
    fn decimals_of(&self, token: &Address) -> Option<u8> {
        self.get(token).copied()
    }
}

impl TokenDecimals for HashMap<Address, TokenInfo> {
    fn decimals_of(&self, token: &Address) -> Option<u8> {
        self.get(token).map(|info| info.decimals)
    }
}

impl TokenDecimals for [TokenInfo] {
    fn decimals_of(&self, token: &Address) -> Option<u8> {
        self.iter()
            .find(|info| info.address == *token)
            .map(|info| info.decimals)
    }
}
