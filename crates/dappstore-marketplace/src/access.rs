//! Access and ownership control

use chrono::Utc;
use tracing::{info, warn};

use dappstore_types::*;

use crate::store::DappStore;

/// Access control trait
#[async_trait::async_trait]
pub trait AppAccess: Send + Sync {
    /// Reveal a listing's file pointer to its current owner
    async fn retrieve_file(&self, listing_id: ListingId, caller: &Principal) -> Result<String>;

    /// Hand the caller's ownership of a listing to another principal
    async fn transfer_ownership(
        &self,
        listing_id: ListingId,
        new_owner: &Principal,
        caller: &Principal,
    ) -> Result<()>;

    /// Whether a principal currently owns a listing
    async fn check_ownership(&self, listing_id: ListingId, principal: &Principal) -> bool;

    /// Listings a principal currently owns, in id order
    async fn owned_listings(&self, principal: &Principal) -> Vec<ListingId>;
}

#[async_trait::async_trait]
impl AppAccess for DappStore {
    async fn retrieve_file(&self, listing_id: ListingId, caller: &Principal) -> Result<String> {
        let state = self.read_open().await?;

        if !state.owns(listing_id, caller) {
            warn!(listing_id = %listing_id, caller = %caller, "File retrieval rejected: not an owner");
            return Err(StoreError::Unauthorized {
                principal: caller.to_string(),
                action: format!("retrieve listing {listing_id}"),
            });
        }

        state.listing(listing_id).map(|l| l.file_pointer.clone())
    }

    async fn transfer_ownership(
        &self,
        listing_id: ListingId,
        new_owner: &Principal,
        caller: &Principal,
    ) -> Result<()> {
        let mut state = self.write_open().await?;

        if !state.owns(listing_id, caller) {
            warn!(
                listing_id = %listing_id,
                caller = %caller,
                new_owner = %new_owner,
                "Transfer rejected: not an owner"
            );
            return Err(StoreError::Unauthorized {
                principal: caller.to_string(),
                action: format!("transfer listing {listing_id}"),
            });
        }

        // Revoke before grant so a self-transfer keeps ownership
        state.set_ownership(listing_id, caller, false);
        state.set_ownership(listing_id, new_owner, true);

        self.emit(
            &mut state,
            StoreEvent::OwnershipTransferred {
                listing_id,
                from: caller.clone(),
                to: new_owner.clone(),
                timestamp: Utc::now(),
            },
        );

        info!(listing_id = %listing_id, from = %caller, to = %new_owner, "Ownership transferred");
        Ok(())
    }

    async fn check_ownership(&self, listing_id: ListingId, principal: &Principal) -> bool {
        self.state.read().await.owns(listing_id, principal)
    }

    async fn owned_listings(&self, principal: &Principal) -> Vec<ListingId> {
        let state = self.state.read().await;
        state
            .ownership
            .iter()
            .filter(|(_, owners)| owners.get(principal).copied().unwrap_or(false))
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AppPurchases, AppRegistry, StoreConfig};

    async fn store_with_purchase(buyer: &Principal) -> (DappStore, ListingId) {
        let store = DappStore::new(StoreConfig::new("0xadmin"));
        let id = store
            .create_listing(
                NewListing {
                    app_name: "Test Application".to_string(),
                    app_desc: "This is a sample description".to_string(),
                    price: Amount::new(5),
                    file_pointer: "BitTorrent Pointer".to_string(),
                    developer_cut: Amount::new(4),
                    file_hash: ContentHash::of("Sample file data"),
                },
                &Principal::from("0xdev"),
            )
            .await
            .unwrap()
            .created()
            .unwrap();
        store.buy_application(id, Amount::new(5), buyer).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn test_developer_does_not_own_own_listing() {
        let buyer = Principal::from("0xbuyer");
        let (store, id) = store_with_purchase(&buyer).await;
        let dev = Principal::from("0xdev");

        assert!(!store.check_ownership(id, &dev).await);
        assert!(matches!(
            store.retrieve_file(id, &dev).await,
            Err(StoreError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_retrieve_unknown_listing_is_unauthorized() {
        let buyer = Principal::from("0xbuyer");
        let (store, _) = store_with_purchase(&buyer).await;

        assert!(matches!(
            store.retrieve_file(ListingId(9), &buyer).await,
            Err(StoreError::Unauthorized { .. })
        ));
        assert!(!store.check_ownership(ListingId(9), &buyer).await);
    }

    #[tokio::test]
    async fn test_self_transfer_keeps_ownership() {
        let buyer = Principal::from("0xbuyer");
        let (store, id) = store_with_purchase(&buyer).await;

        store.transfer_ownership(id, &buyer, &buyer).await.unwrap();

        assert!(store.check_ownership(id, &buyer).await);
    }

    #[tokio::test]
    async fn test_former_owner_cannot_transfer_again() {
        let a = Principal::from("0xa");
        let b = Principal::from("0xb");
        let (store, id) = store_with_purchase(&a).await;

        store.transfer_ownership(id, &b, &a).await.unwrap();
        let result = store.transfer_ownership(id, &Principal::from("0xc"), &a).await;

        assert!(matches!(result, Err(StoreError::Unauthorized { .. })));
        assert!(store.check_ownership(id, &b).await);
        assert_eq!(store.fetch_listing(id).await.unwrap().downloads, 1);
    }

    #[tokio::test]
    async fn test_owned_listings_follow_transfers() {
        let a = Principal::from("0xa");
        let b = Principal::from("0xb");
        let (store, id) = store_with_purchase(&a).await;

        assert_eq!(store.owned_listings(&a).await, vec![id]);
        store.transfer_ownership(id, &b, &a).await.unwrap();
        assert!(store.owned_listings(&a).await.is_empty());
        assert_eq!(store.owned_listings(&b).await, vec![id]);
    }
}
