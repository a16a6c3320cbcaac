//! Shared state behind the store lock

use std::collections::{BTreeMap, HashMap, VecDeque};

use dappstore_ledger::BalanceBook;
use dappstore_types::{ContentHash, Listing, ListingId, Principal, Result, StoreError, StoreEvent};

#[derive(Debug, Default)]
pub(crate) struct StoreState {
    /// Listings in creation order; index == id
    pub listings: Vec<Listing>,
    pub hash_index: HashMap<ContentHash, ListingId>,
    /// listing -> principal -> owns
    pub ownership: BTreeMap<ListingId, HashMap<Principal, bool>>,
    pub book: BalanceBook,
    pub events: VecDeque<StoreEvent>,
    pub closed: bool,
}

impl StoreState {
    pub fn listing(&self, id: ListingId) -> Result<&Listing> {
        id.index()
            .and_then(|i| self.listings.get(i))
            .ok_or(StoreError::ListingNotFound { listing_id: id.0 })
    }

    pub fn listing_mut(&mut self, id: ListingId) -> Result<&mut Listing> {
        id.index()
            .and_then(|i| self.listings.get_mut(i))
            .ok_or(StoreError::ListingNotFound { listing_id: id.0 })
    }

    pub fn next_listing_id(&self) -> ListingId {
        ListingId(self.listings.len() as u64)
    }

    pub fn ensure_unique(&self, file_hash: &ContentHash) -> Result<()> {
        if self.hash_index.contains_key(file_hash) {
            return Err(StoreError::DuplicateContent {
                file_hash: file_hash.to_hex(),
            });
        }
        Ok(())
    }

    pub fn insert_listing(&mut self, listing: Listing) {
        self.hash_index.insert(listing.file_hash, listing.id);
        self.listings.push(listing);
    }

    pub fn owns(&self, id: ListingId, principal: &Principal) -> bool {
        self.ownership
            .get(&id)
            .and_then(|owners| owners.get(principal))
            .copied()
            .unwrap_or(false)
    }

    pub fn set_ownership(&mut self, id: ListingId, principal: &Principal, owns: bool) {
        self.ownership
            .entry(id)
            .or_default()
            .insert(principal.clone(), owns);
    }

    pub fn record_event(&mut self, event: StoreEvent, capacity: usize) {
        if capacity == 0 {
            return;
        }
        while self.events.len() >= capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Drop every listing, ownership record and balance
    pub fn wipe(&mut self) {
        self.listings.clear();
        self.hash_index.clear();
        self.ownership.clear();
        self.book.clear();
    }
}
