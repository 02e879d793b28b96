//! known revert reasons mapped to readable explanations

const KNOWN_REVERTS: &[(&str, &str)] = &[
    ("insufficient collateral", "not enough collateral for this action"),
    ("insufficient liquidity", "the pool does not hold enough liquidity for this amount"),
    ("transfer amount exceeds balance", "wallet balance too low for this amount"),
    ("insufficient balance", "wallet balance too low for this amount"),
    ("transfer amount exceeds allowance", "token allowance too low, approve the pool first"),
    ("insufficient allowance", "token allowance too low, approve the pool first"),
    ("pool already exists", "a pool for this token pair already exists"),
    ("pool does not exist", "no pool exists for this id"),
    ("pool not found", "no pool exists for this id"),
    ("unhealthy", "this action would leave the position below a health factor of 1"),
    ("health factor", "this action would leave the position below a health factor of 1"),
    ("slippage", "price moved beyond the allowed slippage"),
    ("user rejected", "transaction rejected in wallet"),
    ("user denied", "transaction rejected in wallet"),
];

/// explanation for a raw error message, matched case-insensitively on
/// known revert substrings
pub fn explain(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    KNOWN_REVERTS
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, hint)| *hint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_reasons() {
        assert_eq!(
            explain("execution reverted: Insufficient collateral"),
            Some("not enough collateral for this action")
        );
        assert_eq!(
            explain("execution reverted: ERC20: transfer amount exceeds balance"),
            Some("wallet balance too low for this amount")
        );
        assert_eq!(
            explain("MetaMask Tx Signature: User denied transaction signature."),
            Some("transaction rejected in wallet")
        );
    }

    #[test]
    fn test_unknown_reason_passes_through() {
        assert_eq!(explain("nonce too low"), None);
    }
}
