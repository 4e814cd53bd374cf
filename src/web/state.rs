// src/web/state.rs
//! Shared server state: the ledger, its coprocessor and the event store.

use alloy_primitives::Address;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

use crate::core::{Database, EventRepository, RelayerConfig};
use crate::fhe::{MockCoprocessor, UserDecryption};
use crate::ledger::{self, Ledger};
use crate::types::Tx;

pub struct AppState {
    ledger: Mutex<Ledger<MockCoprocessor>>,
    pub coprocessor: Arc<MockCoprocessor>,
    pub decryptor: Arc<dyn UserDecryption>,
    pub store: Database,
    pub run_id: String,
    pub relayer: RelayerConfig,
}

impl AppState {
    pub fn new(
        ledger: Ledger<MockCoprocessor>,
        decryptor: Arc<dyn UserDecryption>,
        store: Database,
        run_id: String,
        relayer: RelayerConfig,
    ) -> Self {
        let coprocessor = ledger.compute().clone();
        Self {
            ledger: Mutex::new(ledger),
            coprocessor,
            decryptor,
            store,
            run_id,
            relayer,
        }
    }

    pub async fn ledger(&self) -> MutexGuard<'_, Ledger<MockCoprocessor>> {
        self.ledger.lock().await
    }

    /// Run one ledger transaction for `caller` and mirror its events to the store.
    ///
    /// The store is written while the ledger lock is still held, so stored order is
    /// commit order.
    pub async fn commit<T, F>(&self, caller: Address, op: F) -> ledger::Result<T>
    where
        F: FnOnce(&mut Ledger<MockCoprocessor>, &Tx) -> ledger::Result<T>,
    {
        let mut ledger = self.ledger.lock().await;
        let tx = Tx::now(caller);
        let result = op(&mut *ledger, &tx)?;
        self.sync_store(&ledger).await;
        Ok(result)
    }

    /// Append every ledger event the store has not seen yet. A failed append is
    /// retried on the next commit.
    async fn sync_store(&self, ledger: &Ledger<MockCoprocessor>) {
        let repo = EventRepository::new(self.store.pool());
        let from = match repo.latest_seq(&self.run_id).await {
            Ok(latest) => latest.map_or(0, |seq| seq + 1),
            Err(e) => {
                error!("Failed to read event store position: {:#}", e);
                return;
            }
        };

        let pending = ledger.events_since(from);
        match repo.append(&self.run_id, pending).await {
            Ok(n) => debug!("Mirrored {} events to store", n),
            Err(e) => error!("Failed to mirror events from seq {}: {:#}", from, e),
        }
    }
}
