//! Custom actions for the stock actor.

/// Operations on a [`StockCounter`](crate::model::StockCounter) beyond the admin `Put`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAction {
    /// Decrement by one if the level is positive. Never fails for lack of stock;
    /// an empty counter is reported as not granted.
    ReserveOne,
    /// Give back one unit that was reserved but could not be handed off.
    ReleaseOne,
    /// Read the current level.
    Level,
}

/// Results from StockActions - variants match 1:1 with StockAction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockActionResult {
    /// Whether a unit was taken.
    ReserveOne(bool),
    /// The level after the release.
    ReleaseOne(u64),
    Level(u64),
}
