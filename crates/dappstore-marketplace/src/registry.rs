//! Listing registry

use chrono::Utc;
use tracing::{debug, info, warn};

use dappstore_types::*;

use crate::store::DappStore;

/// Listing registry trait
#[async_trait::async_trait]
pub trait AppRegistry: Send + Sync {
    /// List an application
    ///
    /// A submission whose content hash is already listed is dropped without
    /// error and reported as [`CreateOutcome::Duplicate`], whatever its other
    /// fields. A closed store rejects every submission.
    async fn create_listing(&self, submission: NewListing, caller: &Principal) -> Result<CreateOutcome>;

    /// All listings in creation order
    async fn fetch_all_listings(&self) -> Vec<ListingView>;

    /// Get a listing
    async fn fetch_listing(&self, id: ListingId) -> Result<ListingView>;

    async fn listing_count(&self) -> usize;

    /// Listings created by a developer
    async fn listings_by_developer(&self, developer: &Principal) -> Vec<ListingView>;

    /// Look a listing up by its content hash
    async fn find_by_hash(&self, file_hash: &ContentHash) -> Option<ListingView>;
}

#[async_trait::async_trait]
impl AppRegistry for DappStore {
    async fn create_listing(&self, submission: NewListing, caller: &Principal) -> Result<CreateOutcome> {
        let mut state = self.write_open().await?;

        if let Err(e) = state.ensure_unique(&submission.file_hash) {
            let existing = state
                .hash_index
                .get(&submission.file_hash)
                .copied()
                .ok_or_else(|| e.clone())?;
            debug!(caller = %caller, existing = %existing, reason = %e, "Duplicate listing ignored");
            return Ok(CreateOutcome::Duplicate { existing });
        }

        if let Err(e) = submission.validate() {
            warn!(caller = %caller, error = %e, "Listing rejected");
            return Err(e);
        }

        let id = state.next_listing_id();
        let listing = Listing::from_submission(id, submission, caller.clone());
        let event = StoreEvent::ListingCreated {
            listing_id: id,
            developer: caller.clone(),
            app_name: listing.app_name.clone(),
            price: listing.price,
            file_hash: listing.file_hash,
            timestamp: Utc::now(),
        };

        info!(
            listing_id = %id,
            developer = %caller,
            price = %listing.price,
            file_hash = %listing.file_hash,
            "Listing created"
        );
        state.insert_listing(listing);
        self.emit(&mut state, event);

        Ok(CreateOutcome::Created { listing_id: id })
    }

    async fn fetch_all_listings(&self) -> Vec<ListingView> {
        let state = self.state.read().await;
        state.listings.iter().map(Listing::view).collect()
    }

    async fn fetch_listing(&self, id: ListingId) -> Result<ListingView> {
        let state = self.read_open().await?;
        state.listing(id).map(Listing::view)
    }

    async fn listing_count(&self) -> usize {
        self.state.read().await.listings.len()
    }

    async fn listings_by_developer(&self, developer: &Principal) -> Vec<ListingView> {
        let state = self.state.read().await;
        state
            .listings
            .iter()
            .filter(|l| &l.developer_address == developer)
            .map(Listing::view)
            .collect()
    }

    async fn find_by_hash(&self, file_hash: &ContentHash) -> Option<ListingView> {
        let state = self.state.read().await;
        let id = state.hash_index.get(file_hash)?;
        state.listing(*id).ok().map(Listing::view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreConfig;

    fn submission(name: &str, price: u64, cut: u64, payload: &str) -> NewListing {
        NewListing {
            app_name: name.to_string(),
            app_desc: "This is a sample description".to_string(),
            price: Amount::new(price),
            file_pointer: "BitTorrent Pointer".to_string(),
            developer_cut: Amount::new(cut),
            file_hash: ContentHash::of(payload),
        }
    }

    fn store() -> DappStore {
        DappStore::new(StoreConfig::new("0xadmin"))
    }

    #[tokio::test]
    async fn test_ids_are_sequential_from_zero() {
        let store = store();
        for i in 0..3u64 {
            let outcome = store
                .create_listing(
                    submission("Test Application", 5, 4, &format!("test{i}")),
                    &Principal::from(format!("0x{i}")),
                )
                .await
                .unwrap();
            assert_eq!(outcome, CreateOutcome::Created { listing_id: ListingId(i) });
        }

        let listing = store.fetch_listing(ListingId(2)).await.unwrap();
        assert_eq!(listing.file_hash, ContentHash::of("test2"));
        assert_eq!(listing.developer_address, Principal::from("0x2"));
        assert_eq!(store.listing_count().await, 3);
    }

    #[tokio::test]
    async fn test_invalid_cut_leaves_registry_untouched() {
        let store = store();
        let result = store
            .create_listing(submission("Greedy", 5, 6, "payload"), &Principal::from("0xdev"))
            .await;

        assert!(matches!(result, Err(StoreError::InvalidDeveloperCut { .. })));
        assert_eq!(store.listing_count().await, 0);
        assert!(store.recent_events(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_reports_existing_id_without_event() {
        let store = store();
        store
            .create_listing(submission("First", 5, 4, "same"), &Principal::from("0xa"))
            .await
            .unwrap();

        let outcome = store
            .create_listing(submission("Second", 10, 9, "same"), &Principal::from("0xb"))
            .await
            .unwrap();

        assert_eq!(outcome, CreateOutcome::Duplicate { existing: ListingId(0) });
        assert_eq!(store.recent_events(10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_wins_over_invalid_cut() {
        let store = store();
        store
            .create_listing(submission("First", 5, 4, "same"), &Principal::from("0xa"))
            .await
            .unwrap();

        let outcome = store
            .create_listing(submission("Greedy", 5, 6, "same"), &Principal::from("0xb"))
            .await
            .unwrap();

        assert_eq!(outcome, CreateOutcome::Duplicate { existing: ListingId(0) });
        assert_eq!(store.listing_count().await, 1);
    }

    #[tokio::test]
    async fn test_closed_store_rejects_invalid_submission() {
        let store = store();
        store.teardown(&Principal::from("0xadmin")).await.unwrap();

        let result = store
            .create_listing(submission("Greedy", 5, 6, "payload"), &Principal::from("0xdev"))
            .await;

        assert_eq!(result, Err(StoreError::StoreClosed));
    }

    #[tokio::test]
    async fn test_fetch_missing_listing() {
        let store = store();
        assert_eq!(
            store.fetch_listing(ListingId(7)).await,
            Err(StoreError::ListingNotFound { listing_id: 7 })
        );
    }

    #[tokio::test]
    async fn test_lookup_by_developer_and_hash() {
        let store = store();
        let dev = Principal::from("0xdev");
        store.create_listing(submission("A", 1, 0, "a"), &dev).await.unwrap();
        store
            .create_listing(submission("B", 1, 0, "b"), &Principal::from("0xother"))
            .await
            .unwrap();
        store.create_listing(submission("C", 1, 0, "c"), &dev).await.unwrap();

        let mine = store.listings_by_developer(&dev).await;
        assert_eq!(mine.iter().map(|l| l.id).collect::<Vec<_>>(), vec![ListingId(0), ListingId(2)]);

        let found = store.find_by_hash(&ContentHash::of("b")).await.unwrap();
        assert_eq!(found.app_name, "B");
        assert!(store.find_by_hash(&ContentHash::of("z")).await.is_none());
    }
}
