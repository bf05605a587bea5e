//! Lobby - independent tables running side by side

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use arena_core::ArenaResult;
use arena_round::RoundCoordinator;
use parking_lot::RwLock;

use crate::{TableConfig, TableHandle, TableId, TickSource};

/// Registry of running tables. Each table owns its own coordinator,
/// so nothing about one round is visible to another.
#[derive(Default)]
pub struct Lobby {
    tables: RwLock<HashMap<TableId, TableHandle>>,
    next_id: AtomicU64,
}

impl Lobby {
    pub fn new() -> Self {
        Lobby::default()
    }

    /// Open a table ticking on the configured interval, with an
    /// entropy-seeded selector and an open ledger
    pub fn open(&self, config: &TableConfig) -> ArenaResult<TableHandle> {
        config.validate()?;
        let coordinator = RoundCoordinator::new(config.round.clone())?;
        Ok(self.open_with(
            coordinator,
            config,
            TickSource::Interval(config.tick_interval()),
        ))
    }

    /// Open a table around a prepared coordinator
    pub fn open_with(
        &self,
        coordinator: RoundCoordinator,
        config: &TableConfig,
        ticks: TickSource,
    ) -> TableHandle {
        let id = TableId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let handle = TableHandle::spawn(id, coordinator, config, ticks);
        self.tables.write().insert(id, handle.clone());
        tracing::info!(table = %id, "table opened");
        handle
    }

    pub fn get(&self, id: TableId) -> Option<TableHandle> {
        self.tables.read().get(&id).cloned()
    }

    pub fn ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.tables.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.read().is_empty()
    }

    /// Stop and forget a table. Returns false for unknown ids.
    pub async fn close(&self, id: TableId) -> bool {
        let handle = self.tables.write().remove(&id);
        match handle {
            Some(handle) => {
                handle.shutdown().await;
                true
            }
            None => false,
        }
    }

    /// Stop every table
    pub async fn close_all(&self) {
        let handles: Vec<TableHandle> = self.tables.write().drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }
}
