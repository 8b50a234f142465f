//! Shared primitive types used across the entire pipeline.

/// Row id of a seller in the ledger. SQLite rowids start at 1, so 0 is
/// safe as the "before the first seller" pagination cursor.
pub type SellerId = i64;

/// Row id of an order in the ledger.
pub type OrderId = i64;

/// Row id of a product in the catalog.
pub type ProductId = i64;

/// The canonical job run identifier (UUID v4, stored as text).
pub type RunId = String;
