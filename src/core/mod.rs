// src/core/mod.rs
//! Infrastructure around the ledger: configuration, event store and decryption plumbing.

pub mod config_manager;
pub mod database;
pub mod decryption;
pub mod relayer_client;

pub use config_manager::{ConfigManager, RelayerConfig, ServerConfig};
pub use database::{Database, EventRepository, Run, StoredEvent};
pub use decryption::decrypt_with_retry;
pub use relayer_client::RelayerClient;
