use super::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Identifier of the buyer behind a purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerId(pub String);

impl BuyerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Buyers that do not identify themselves are recorded under this id.
impl Default for BuyerId {
    fn default() -> Self {
        Self::new("User_Manual")
    }
}

impl Display for BuyerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The record handed to the dispatch queue after a unit has been reserved.
///
/// Serialised as the message body:
/// `{"userId":"...","productId":"...","timestamp":"2024-01-01T00:00:00Z"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIntent {
    pub user_id: BuyerId,
    pub product_id: ProductId,
    pub timestamp: DateTime<Utc>,
}

impl OrderIntent {
    pub fn new(user_id: BuyerId, product_id: ProductId) -> Self {
        Self {
            user_id,
            product_id,
            timestamp: Utc::now(),
        }
    }

    pub fn to_body(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_body(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}
