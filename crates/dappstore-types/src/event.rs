//! Store events
//!
//! Every committed mutation emits one event. Rejected operations and
//! duplicate submissions emit none.

use crate::{Amount, ContentHash, ListingId, Principal, PurchaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    /// A new listing was appended to the registry
    ListingCreated {
        listing_id: ListingId,
        developer: Principal,
        app_name: String,
        price: Amount,
        file_hash: ContentHash,
        timestamp: DateTime<Utc>,
    },

    /// A purchase was accepted and its revenue split recorded
    ApplicationPurchased {
        purchase_id: PurchaseId,
        listing_id: ListingId,
        buyer: Principal,
        price: Amount,
        developer_share: Amount,
        platform_share: Amount,
        timestamp: DateTime<Utc>,
    },

    /// Ownership moved from one principal to another
    OwnershipTransferred {
        listing_id: ListingId,
        from: Principal,
        to: Principal,
        timestamp: DateTime<Utc>,
    },

    /// A payee withdrew from its payout balance
    PayoutWithdrawn {
        account: Principal,
        amount: Amount,
        balance_after: Amount,
        timestamp: DateTime<Utc>,
    },

    /// The administrator shut the store down
    StoreTornDown {
        administrator: Principal,
        timestamp: DateTime<Utc>,
    },
}

impl StoreEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::ListingCreated { timestamp, .. }
            | Self::ApplicationPurchased { timestamp, .. }
            | Self::OwnershipTransferred { timestamp, .. }
            | Self::PayoutWithdrawn { timestamp, .. }
            | Self::StoreTornDown { timestamp, .. } => *timestamp,
        }
    }

    /// Short machine-readable name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ListingCreated { .. } => "listing_created",
            Self::ApplicationPurchased { .. } => "application_purchased",
            Self::OwnershipTransferred { .. } => "ownership_transferred",
            Self::PayoutWithdrawn { .. } => "payout_withdrawn",
            Self::StoreTornDown { .. } => "store_torn_down",
        }
    }
}
