//! Listing types for DappStore
//!
//! A listing is a marketplace entry for one distinct application payload,
//! addressed by its content hash. The file pointer is stored on the
//! [`Listing`] but never leaves the store through [`ListingView`]; only
//! owners receive it, via file retrieval.

use crate::{Amount, ContentHash, ListingId, Principal, PurchaseId, Result, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Submission for a new listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub app_name: String,
    pub app_desc: String,
    pub price: Amount,
    pub file_pointer: String,
    pub developer_cut: Amount,
    pub file_hash: ContentHash,
}

impl NewListing {
    /// Check the payment split against the price
    pub fn validate(&self) -> Result<()> {
        if self.developer_cut > self.price {
            return Err(StoreError::InvalidDeveloperCut {
                developer_cut: self.developer_cut.value(),
                price: self.price.value(),
            });
        }
        Ok(())
    }
}

/// A stored marketplace listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub app_name: String,
    pub app_desc: String,
    pub price: Amount,
    pub file_pointer: String,
    pub developer_cut: Amount,
    pub developer_address: Principal,
    pub file_hash: ContentHash,
    pub downloads: u64,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    /// Build a listing from a validated submission
    pub fn from_submission(id: ListingId, submission: NewListing, developer: Principal) -> Self {
        Self {
            id,
            app_name: submission.app_name,
            app_desc: submission.app_desc,
            price: submission.price,
            file_pointer: submission.file_pointer,
            developer_cut: submission.developer_cut,
            developer_address: developer,
            file_hash: submission.file_hash,
            downloads: 0,
            created_at: Utc::now(),
        }
    }

    /// Share of each sale routed to the platform treasury
    pub fn platform_share(&self) -> Amount {
        self.price.checked_sub(self.developer_cut).unwrap_or_default()
    }

    /// Public projection without the file pointer
    pub fn view(&self) -> ListingView {
        ListingView {
            id: self.id,
            app_name: self.app_name.clone(),
            app_desc: self.app_desc.clone(),
            price: self.price,
            developer_cut: self.developer_cut,
            developer_address: self.developer_address.clone(),
            file_hash: self.file_hash,
            downloads: self.downloads,
            created_at: self.created_at,
        }
    }
}

/// Public view of a listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingView {
    pub id: ListingId,
    pub app_name: String,
    pub app_desc: String,
    pub price: Amount,
    pub developer_cut: Amount,
    pub developer_address: Principal,
    pub file_hash: ContentHash,
    pub downloads: u64,
    pub created_at: DateTime<Utc>,
}

/// Result of a listing submission
///
/// A duplicate content hash is not an error: the submission is dropped and
/// the registry is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CreateOutcome {
    Created { listing_id: ListingId },
    Duplicate { existing: ListingId },
}

impl CreateOutcome {
    /// The id of the newly created listing, if any
    pub fn created(&self) -> Option<ListingId> {
        match self {
            Self::Created { listing_id } => Some(*listing_id),
            Self::Duplicate { .. } => None,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}

/// Record of an accepted purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub purchase_id: PurchaseId,
    pub listing_id: ListingId,
    pub buyer: Principal,
    pub price_paid: Amount,
    pub developer: Principal,
    pub developer_share: Amount,
    pub treasury: Principal,
    pub platform_share: Amount,
    pub downloads_after: u64,
    pub purchased_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(price: u64, cut: u64) -> NewListing {
        NewListing {
            app_name: "Test Application".to_string(),
            app_desc: "This is a sample description".to_string(),
            price: Amount::new(price),
            file_pointer: "BitTorrent Pointer".to_string(),
            developer_cut: Amount::new(cut),
            file_hash: ContentHash::of("Sample file data"),
        }
    }

    #[test]
    fn test_cut_may_equal_price() {
        assert!(submission(5, 5).validate().is_ok());
        assert!(submission(0, 0).validate().is_ok());
    }

    #[test]
    fn test_cut_above_price_rejected() {
        assert!(matches!(
            submission(5, 6).validate(),
            Err(StoreError::InvalidDeveloperCut { developer_cut: 6, price: 5 })
        ));
    }

    #[test]
    fn test_view_hides_file_pointer() {
        let listing = Listing::from_submission(ListingId(0), submission(5, 4), Principal::from("dev"));
        let json = serde_json::to_value(listing.view()).unwrap();
        assert!(json.get("file_pointer").is_none());
        assert_eq!(listing.platform_share(), Amount::new(1));
        assert_eq!(listing.downloads, 0);
    }

    #[test]
    fn test_create_outcome_accessors() {
        let created = CreateOutcome::Created { listing_id: ListingId(2) };
        assert_eq!(created.created(), Some(ListingId(2)));
        assert!(CreateOutcome::Duplicate { existing: ListingId(0) }.is_duplicate());
    }
}
