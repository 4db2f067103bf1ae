use std::sync::Arc;

use crate::transfer::{LedgerStore, TransferCoordinator};

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Transfer engine; also owns the ledger store used by read endpoints
    pub coordinator: Arc<TransferCoordinator>,
}

impl AppState {
    pub fn new(coordinator: Arc<TransferCoordinator>) -> Self {
        Self { coordinator }
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        self.coordinator.store()
    }
}
