//! Purchase and payment engine
//!
//! A purchase is accepted only for the exact listing price. On acceptance
//! the developer cut and the platform share are credited in the balance book,
//! the buyer is granted ownership and the download counter moves by one, all
//! under the same write lock.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use dappstore_ledger::{EntryReason, LedgerEntry, PayoutLeg};
use dappstore_types::*;

use crate::store::DappStore;

/// Purchase engine trait
#[async_trait::async_trait]
pub trait AppPurchases: Send + Sync {
    /// Buy access to a listing for exactly its price
    async fn buy_application(
        &self,
        listing_id: ListingId,
        payment: Amount,
        caller: &Principal,
    ) -> Result<PurchaseReceipt>;

    /// Accumulated payouts for a developer or the treasury
    async fn balance_of(&self, account: &Principal) -> Amount;

    /// Payout entries for an account, oldest first
    async fn payout_entries(&self, account: &Principal) -> Vec<LedgerEntry>;

    /// Payout entries written by one purchase
    async fn purchase_entries(&self, purchase_id: &PurchaseId) -> Vec<LedgerEntry>;

    /// Withdraw from the caller's payout balance; returns the remaining balance
    async fn withdraw(&self, caller: &Principal, amount: Amount) -> Result<Amount>;
}

#[async_trait::async_trait]
impl AppPurchases for DappStore {
    async fn buy_application(
        &self,
        listing_id: ListingId,
        payment: Amount,
        caller: &Principal,
    ) -> Result<PurchaseReceipt> {
        let mut state = self.write_open().await?;

        let listing = match state.listing(listing_id) {
            Ok(listing) => listing,
            Err(e) => {
                warn!(listing_id = %listing_id, buyer = %caller, "Purchase rejected: listing not found");
                return Err(e);
            }
        };

        if payment != listing.price {
            warn!(
                listing_id = %listing_id,
                buyer = %caller,
                expected = %listing.price,
                provided = %payment,
                "Purchase rejected: incorrect payment"
            );
            return Err(StoreError::IncorrectPayment {
                expected: listing.price.value(),
                provided: payment.value(),
            });
        }

        let downloads_after = listing
            .downloads
            .checked_add(1)
            .ok_or(StoreError::AmountOverflow)?;
        let developer = listing.developer_address.clone();
        let developer_share = listing.developer_cut;
        let platform_share = listing.platform_share();
        let price = listing.price;
        let treasury = self.treasury().clone();

        let legs = vec![
            PayoutLeg::new(
                developer.clone(),
                developer_share,
                EntryReason::DeveloperCut { listing_id: listing_id.0 },
            ),
            PayoutLeg::new(
                treasury.clone(),
                platform_share,
                EntryReason::PlatformFee { listing_id: listing_id.0 },
            ),
        ];
        state.book.check_settlement(&legs)?;

        // Everything below is infallible after the checks above
        let purchase_id = PurchaseId::new();
        state.book.settle(&legs, &purchase_id.to_string())?;
        state.set_ownership(listing_id, caller, true);
        state.listing_mut(listing_id)?.downloads = downloads_after;

        let receipt = PurchaseReceipt {
            purchase_id: purchase_id.clone(),
            listing_id,
            buyer: caller.clone(),
            price_paid: price,
            developer,
            developer_share,
            treasury,
            platform_share,
            downloads_after,
            purchased_at: Utc::now(),
        };

        self.emit(
            &mut state,
            StoreEvent::ApplicationPurchased {
                purchase_id,
                listing_id,
                buyer: caller.clone(),
                price,
                developer_share,
                platform_share,
                timestamp: receipt.purchased_at,
            },
        );

        info!(
            listing_id = %listing_id,
            buyer = %caller,
            price = %price,
            downloads = downloads_after,
            "Application purchased"
        );
        Ok(receipt)
    }

    async fn balance_of(&self, account: &Principal) -> Amount {
        self.state.read().await.book.balance(account)
    }

    async fn payout_entries(&self, account: &Principal) -> Vec<LedgerEntry> {
        self.state.read().await.book.account_entries(account)
    }

    async fn purchase_entries(&self, purchase_id: &PurchaseId) -> Vec<LedgerEntry> {
        self.state
            .read()
            .await
            .book
            .correlated_entries(&purchase_id.to_string())
    }

    async fn withdraw(&self, caller: &Principal, amount: Amount) -> Result<Amount> {
        let mut state = self.write_open().await?;

        let correlation_id = format!("withdrawal_{}", Uuid::new_v4());
        let (balance_after, _) = match state.book.debit(caller, amount, EntryReason::Withdrawal, &correlation_id) {
            Ok(written) => written,
            Err(e) => {
                warn!(account = %caller, amount = %amount, error = %e, "Withdrawal rejected");
                return Err(e.into());
            }
        };

        self.emit(
            &mut state,
            StoreEvent::PayoutWithdrawn {
                account: caller.clone(),
                amount,
                balance_after,
                timestamp: Utc::now(),
            },
        );

        info!(account = %caller, amount = %amount, balance = %balance_after, "Payout withdrawn");
        Ok(balance_after)
    }
}
