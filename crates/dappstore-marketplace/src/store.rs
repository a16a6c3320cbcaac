//! The in-memory store handle
//!
//! `DappStore` is a cheap-to-clone handle over one `RwLock`-guarded state.
//! Mutations hold the write half for their whole validate-then-commit
//! sequence; reads hold the read half and see only committed transitions.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use dappstore_types::{Principal, Result, StoreError, StoreEvent};

use crate::config::{StoreConfig, EVENT_CHANNEL_CAPACITY};
use crate::state::StoreState;

#[derive(Clone)]
pub struct DappStore {
    pub(crate) state: Arc<RwLock<StoreState>>,
    pub(crate) config: Arc<StoreConfig>,
    events_tx: broadcast::Sender<StoreEvent>,
}

impl DappStore {
    pub fn new(config: StoreConfig) -> Self {
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        info!(
            administrator = %config.administrator,
            treasury = %config.treasury(),
            "DappStore opened"
        );
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            config: Arc::new(config),
            events_tx,
        }
    }

    pub fn administrator(&self) -> &Principal {
        &self.config.administrator
    }

    pub fn treasury(&self) -> &Principal {
        self.config.treasury()
    }

    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }

    /// Subscribe to events committed after this call
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events_tx.subscribe()
    }

    /// Most recent events, newest first
    pub async fn recent_events(&self, limit: usize) -> Vec<StoreEvent> {
        let state = self.state.read().await;
        state.events.iter().rev().take(limit).cloned().collect()
    }

    /// Irreversibly shut the store down
    ///
    /// Only the administrator may do this, open or closed. Listings,
    /// ownership records and payout balances are dropped; the event log is
    /// kept.
    pub async fn teardown(&self, caller: &Principal) -> Result<()> {
        let mut state = self.state.write().await;

        if caller != &self.config.administrator {
            warn!(caller = %caller, "Teardown rejected: caller is not the administrator");
            return Err(StoreError::Unauthorized {
                principal: caller.to_string(),
                action: "tear down the store".to_string(),
            });
        }
        if state.closed {
            return Err(StoreError::StoreClosed);
        }

        let listings = state.listings.len();
        state.wipe();
        state.closed = true;
        self.emit(
            &mut state,
            StoreEvent::StoreTornDown {
                administrator: caller.clone(),
                timestamp: Utc::now(),
            },
        );

        info!(administrator = %caller, listings, "DappStore torn down");
        Ok(())
    }

    pub(crate) async fn read_open(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        let state = self.state.read().await;
        if state.closed {
            return Err(StoreError::StoreClosed);
        }
        Ok(state)
    }

    pub(crate) async fn write_open(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        let state = self.state.write().await;
        if state.closed {
            return Err(StoreError::StoreClosed);
        }
        Ok(state)
    }

    /// Record and broadcast an event; must be called with the write lock held
    pub(crate) fn emit(&self, state: &mut StoreState, event: StoreEvent) {
        state.record_event(event.clone(), self.config.event_log_capacity);
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }
}
