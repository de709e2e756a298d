/// Viewer connection handle, issued by the subscription registry.
pub type ViewerId = u64;

/// Canonical symbol form used for cache keys, subscriptions and dispatch.
///
/// Upstream vendors are case-insensitive but inconsistent about what they
/// echo back; normalizing once at the boundary keeps one cache entry and one
/// broadcast loop per symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("aapl"), "AAPL");
        assert_eq!(normalize_symbol("  msft "), "MSFT");
        assert_eq!(normalize_symbol("BRK.B"), "BRK.B");
        assert_eq!(normalize_symbol("shop.to"), "SHOP.TO");
    }
}
