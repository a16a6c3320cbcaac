//! Store configuration

use dappstore_types::Principal;
use serde::{Deserialize, Serialize};

/// Default number of events kept in the in-memory log
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1024;

/// Capacity of the event broadcast channel
pub const EVENT_CHANNEL_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Principal allowed to tear the store down
    pub administrator: Principal,
    /// Recipient of the platform share of each sale (defaults to the administrator)
    #[serde(default)]
    pub treasury: Option<Principal>,
    /// Events retained for `recent_events`; oldest are dropped first
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

impl StoreConfig {
    pub fn new(administrator: impl Into<Principal>) -> Self {
        Self {
            administrator: administrator.into(),
            treasury: None,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }

    pub fn with_treasury(mut self, treasury: impl Into<Principal>) -> Self {
        self.treasury = Some(treasury.into());
        self
    }

    pub fn with_event_log_capacity(mut self, capacity: usize) -> Self {
        self.event_log_capacity = capacity;
        self
    }

    /// The principal credited with the platform share
    pub fn treasury(&self) -> &Principal {
        self.treasury.as_ref().unwrap_or(&self.administrator)
    }
}

fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}
