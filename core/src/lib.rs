//! Daily seller settlement over an embedded SQLite ledger.
//!
//! One job settles one calendar day: it aggregates the order ledger
//! per seller, applies the grade commission table, upserts settlement
//! rows keyed on `(seller, date)`, and then proves the written totals
//! against the ledger before calling the day done.
//!
//! PIPELINE ORDER (fixed):
//!   1. reader    - keyset-paginated per-seller aggregates
//!   2. transform - commission split by seller grade
//!   3. writer    - chunked transactional upserts
//!   4. verify    - exact reconciliation against the ledger
//!
//! RULES:
//!   - Only `store` talks to SQLite. Everything else goes through it.
//!   - Money is exact decimal end to end; storage holds integer minor
//!     units so sums stay exact.
//!   - A verification mismatch fails the whole day. There is no
//!     partial pass.

pub mod commission;
pub mod config;
pub mod datagen;
pub mod error;
pub mod job;
pub mod ledger;
pub mod money;
pub mod reader;
pub mod registry;
pub mod settlement;
pub mod store;
pub mod transform;
pub mod trigger;
pub mod types;
pub mod verify;
pub mod writer;
