//! DappStore Types - Canonical domain types for the application marketplace
//!
//! This crate contains all foundational types for DappStore with zero
//! dependencies on other dappstore crates:
//!
//! - Identity types (Principal, ListingId, PurchaseId)
//! - Amount type for prices, cuts and payout balances
//! - Content hashes used as the listing uniqueness key
//! - Listing, receipt and event types
//! - The store error taxonomy
//!
//! # Marketplace Invariants
//!
//! 1. No two listings share a content hash
//! 2. A developer cut never exceeds the listing price
//! 3. Only current owners can retrieve a listing's file pointer
//! 4. Downloads count accepted purchases and never decrease

pub mod identity;
pub mod amount;
pub mod hash;
pub mod listing;
pub mod event;
pub mod error;

pub use identity::*;
pub use amount::*;
pub use hash::*;
pub use listing::*;
pub use event::*;
pub use error::*;

/// Version of the DappStore types schema
pub const TYPES_VERSION: &str = "0.1.0";
