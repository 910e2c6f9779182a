//! SQLite persistence for tips and betting companies

pub mod tip_store;

pub use tip_store::TipStore;
