//! token price sources

use alloy_primitives::Address;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// value of one display unit of a token, in a common unit of account
pub trait PriceSource {
    /// `None` when the price is unknown; valuation then degrades to
    /// the conservative "unknown" result
    fn price_of(&self, token: &Address) -> Option<Decimal>;
}

impl<T: PriceSource + ?Sized> PriceSource for &T {
    fn price_of(&self, token: &Address) -> Option<Decimal> {
        (**self).price_of(token)
    }
}

/// every token is worth exactly one unit
///
/// known simplification: the pool exposes no price oracle, so collateral
/// and debt in different tokens are compared 1:1.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnitPrice;

impl PriceSource for UnitPrice {
    fn price_of(&self, _token: &Address) -> Option<Decimal> {
        Some(Decimal::ONE)
    }
}

/// static price table
#[derive(Clone, Debug, Default)]
pub struct FixedPrices {
    prices: HashMap<Address, Decimal>,
}

impl FixedPrices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, token: Address, price: Decimal) -> Self {
        self.insert(token, price);
        self
    }

    pub fn insert(&mut self, token: Address, price: Decimal) {
        self.prices.insert(token, price);
    }
}

impl From<HashMap<Address, Decimal>> for FixedPrices {
    fn from(prices: HashMap<Address, Decimal>) -> Self {
        Self { prices }
    }
}

impl PriceSource for FixedPrices {
    fn price_of(&self, token: &Address) -> Option<Decimal> {
        // negative prices are nonsense; treat as unknown
        self.prices
            .get(token)
            .copied()
            .filter(|p| !p.is_sign_negative())
    }
}
