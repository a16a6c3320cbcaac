//! Error types for DappStore
//!
//! Every error is local to the operation that raised it and leaves the store
//! unchanged.

use thiserror::Error;

/// Result type for DappStore operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// DappStore error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // ========================================================================
    // Registry Errors
    // ========================================================================

    /// Referenced listing does not exist
    #[error("Listing {listing_id} not found")]
    ListingNotFound { listing_id: u64 },

    /// A listing with this content hash already exists
    ///
    /// Raised internally by the registry; submissions surface it as a
    /// duplicate outcome, never as an error.
    #[error("Content {file_hash} is already listed")]
    DuplicateContent { file_hash: String },

    /// Developer cut exceeds the listing price
    #[error("Developer cut {developer_cut} exceeds price {price}")]
    InvalidDeveloperCut { developer_cut: u64, price: u64 },

    /// Content hash could not be parsed
    #[error("Invalid content hash: {message}")]
    InvalidContentHash { message: String },

    // ========================================================================
    // Payment Errors
    // ========================================================================

    /// Tendered amount differs from the listing price
    #[error("Incorrect value provided: expected {expected}, got {provided}")]
    IncorrectPayment { expected: u64, provided: u64 },

    /// Payout balance too low for a withdrawal
    #[error("Insufficient balance: have {available}, need {required}")]
    InsufficientBalance { available: u64, required: u64 },

    /// Amount rejected by the balance book
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// Counter or balance arithmetic overflowed
    #[error("Amount overflow during arithmetic operation")]
    AmountOverflow,

    // ========================================================================
    // Access Errors
    // ========================================================================

    /// Caller lacks ownership or administrative rights
    #[error("{principal} is not authorized to {action}")]
    Unauthorized { principal: String, action: String },

    /// The store has been torn down
    #[error("Store has been torn down")]
    StoreClosed,
}

impl StoreError {
    /// Errors a caller can fix by changing its request
    pub fn is_caller_correctable(&self) -> bool {
        !matches!(self, Self::AmountOverflow | Self::StoreClosed)
    }
}
