//! Domain core of the budget client.
//!
//! Everything here is synchronous and free of I/O except the key-value
//! [`store`] backends: money and transaction primitives, the keyword rule
//! engine, the analytics aggregator, import sessions, estimations and
//! savings movements.

pub use categories::Category;
pub use error::EngineError;
pub use money::MoneyCents;
pub use transactions::{
    CategoryRef, Transaction, TransactionDraft, TransactionType, UNCATEGORIZED, parse_date,
};

pub mod analytics;
pub mod categories;
mod error;
pub mod estimations;
pub mod import;
mod money;
pub mod rules;
pub mod savings;
pub mod store;
mod transactions;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
