use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Key of a stock counter in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductKey(pub String);

impl ProductKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl Default for ProductKey {
    fn default() -> Self {
        Self::new("iphone_stock")
    }
}

impl Display for ProductKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalogue id written into every order. Distinct from the counter key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new("iphone_16")
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Units remaining for one product.
///
/// # Actor Framework
/// Managed by the stock actor, see
/// [`impl ActorEntity for StockCounter`](crate::stock_actor::entity). The `u64`
/// makes a negative level unrepresentable; the only decrement is
/// [`StockAction::ReserveOne`](crate::stock_actor::StockAction::ReserveOne),
/// which refuses to go below zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockCounter {
    pub key: ProductKey,
    pub units: u64,
}

impl StockCounter {
    pub fn new(key: ProductKey, units: u64) -> Self {
        Self { key, units }
    }

    /// An uninitialised counter. Zero units is a valid "no stock" state.
    pub fn empty(key: ProductKey) -> Self {
        Self { key, units: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_serialize_as_plain_strings() {
        assert_eq!(
            serde_json::to_string(&ProductKey::default()).unwrap(),
            r#""iphone_stock""#
        );
        assert_eq!(
            serde_json::from_str::<ProductKey>(r#""pixel_stock""#).unwrap(),
            ProductKey::new("pixel_stock")
        );
        assert_eq!(
            serde_json::to_string(&ProductId::default()).unwrap(),
            r#""iphone_16""#
        );
    }
}
