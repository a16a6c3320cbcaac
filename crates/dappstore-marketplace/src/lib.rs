//! DappStore Marketplace - The application marketplace ledger
//!
//! One shared state store, three responsibilities:
//! - Registry: developers list applications keyed by content hash
//! - Purchases: exact-price sales with a developer/treasury revenue split
//! - Access: owners retrieve file pointers and transfer ownership
//!
//! Every mutation runs as a single validate-then-commit transition under the
//! store's write lock. A rejected call leaves no trace.

pub use dappstore_types::{
    Amount, ContentHash, CreateOutcome, Listing, ListingId, ListingView, NewListing, Principal,
    PurchaseId, PurchaseReceipt, Result, StoreError, StoreEvent,
};
pub use dappstore_ledger::{EntryReason, EntryType, LedgerEntry};

pub mod config;
mod state;
pub mod store;
pub mod registry;
pub mod purchase;
pub mod access;

pub use config::*;
pub use store::*;
pub use registry::*;
pub use purchase::*;
pub use access::*;
