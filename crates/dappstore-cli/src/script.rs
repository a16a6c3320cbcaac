//! Scripted operations
//!
//! A script is a JSON array of operations tagged by `op`. Each operation runs
//! against the store and yields one result line; a rejected operation does
//! not stop the script.

use anyhow::Context;
use dappstore_marketplace::{
    Amount, AppAccess, AppPurchases, AppRegistry, ContentHash, DappStore, ListingId, NewListing,
    Principal, StoreError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateListing {
        caller: Principal,
        app_name: String,
        app_desc: String,
        price: u64,
        file_pointer: String,
        developer_cut: u64,
        /// Precomputed content hash
        #[serde(default)]
        file_hash: Option<ContentHash>,
        /// Raw payload to fingerprint when no hash is given
        #[serde(default)]
        file_data: Option<String>,
    },
    FetchAllListings,
    FetchListing {
        listing_id: u64,
    },
    BuyApplication {
        caller: Principal,
        listing_id: u64,
        payment: u64,
    },
    RetrieveFile {
        caller: Principal,
        listing_id: u64,
    },
    TransferOwnership {
        caller: Principal,
        listing_id: u64,
        new_owner: Principal,
    },
    CheckOwnership {
        listing_id: u64,
        principal: Principal,
    },
    OwnedListings {
        principal: Principal,
    },
    BalanceOf {
        account: Principal,
    },
    Withdraw {
        caller: Principal,
        amount: u64,
    },
    RecentEvents {
        #[serde(default = "default_event_limit")]
        limit: usize,
    },
    Teardown {
        caller: Principal,
    },
}

fn default_event_limit() -> usize {
    20
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateListing { .. } => "create_listing",
            Self::FetchAllListings => "fetch_all_listings",
            Self::FetchListing { .. } => "fetch_listing",
            Self::BuyApplication { .. } => "buy_application",
            Self::RetrieveFile { .. } => "retrieve_file",
            Self::TransferOwnership { .. } => "transfer_ownership",
            Self::CheckOwnership { .. } => "check_ownership",
            Self::OwnedListings { .. } => "owned_listings",
            Self::BalanceOf { .. } => "balance_of",
            Self::Withdraw { .. } => "withdraw",
            Self::RecentEvents { .. } => "recent_events",
            Self::Teardown { .. } => "teardown",
        }
    }
}

/// Parse a script document
pub fn parse_script(text: &str) -> anyhow::Result<Vec<Operation>> {
    serde_json::from_str(text).context("script must be a JSON array of operations")
}

/// Run one operation and render its outcome
pub async fn execute(store: &DappStore, op: Operation) -> anyhow::Result<Value> {
    let value = match op {
        Operation::CreateListing {
            caller,
            app_name,
            app_desc,
            price,
            file_pointer,
            developer_cut,
            file_hash,
            file_data,
        } => {
            let file_hash = match (file_hash, file_data) {
                (Some(hash), _) => hash,
                (None, Some(data)) => ContentHash::of(data),
                (None, None) => {
                    return Err(StoreError::InvalidContentHash {
                        message: "either file_hash or file_data is required".to_string(),
                    }
                    .into())
                }
            };
            let submission = NewListing {
                app_name,
                app_desc,
                price: Amount::new(price),
                file_pointer,
                developer_cut: Amount::new(developer_cut),
                file_hash,
            };
            to_value(store.create_listing(submission, &caller).await?)?
        }
        Operation::FetchAllListings => to_value(store.fetch_all_listings().await)?,
        Operation::FetchListing { listing_id } => {
            to_value(store.fetch_listing(ListingId(listing_id)).await?)?
        }
        Operation::BuyApplication { caller, listing_id, payment } => to_value(
            store
                .buy_application(ListingId(listing_id), Amount::new(payment), &caller)
                .await?,
        )?,
        Operation::RetrieveFile { caller, listing_id } => {
            json!(store.retrieve_file(ListingId(listing_id), &caller).await?)
        }
        Operation::TransferOwnership { caller, listing_id, new_owner } => {
            store
                .transfer_ownership(ListingId(listing_id), &new_owner, &caller)
                .await?;
            Value::Null
        }
        Operation::CheckOwnership { listing_id, principal } => {
            json!(store.check_ownership(ListingId(listing_id), &principal).await)
        }
        Operation::OwnedListings { principal } => to_value(store.owned_listings(&principal).await)?,
        Operation::BalanceOf { account } => to_value(store.balance_of(&account).await)?,
        Operation::Withdraw { caller, amount } => {
            to_value(store.withdraw(&caller, Amount::new(amount)).await?)?
        }
        Operation::RecentEvents { limit } => to_value(store.recent_events(limit).await)?,
        Operation::Teardown { caller } => {
            store.teardown(&caller).await?;
            Value::Null
        }
    };
    Ok(value)
}

/// Run a whole script, returning one result line per operation
pub async fn run_script(store: &DappStore, ops: Vec<Operation>) -> Vec<Value> {
    let mut lines = Vec::with_capacity(ops.len());
    for op in ops {
        let name = op.name();
        let line = match execute(store, op).await {
            Ok(value) => json!({ "op": name, "ok": value }),
            Err(e) => {
                let correctable = e
                    .downcast_ref::<StoreError>()
                    .is_some_and(StoreError::is_caller_correctable);
                if correctable {
                    tracing::debug!(op = name, error = %e, "Operation rejected");
                } else {
                    tracing::warn!(op = name, error = %e, "Operation failed");
                }
                json!({ "op": name, "error": format!("{e:#}") })
            }
        };
        lines.push(line);
    }
    lines
}

/// The buy-and-transfer walkthrough used by `dappstore demo`
pub fn demo_script(administrator: &Principal) -> Vec<Operation> {
    let developer = Principal::from("0x1111111111111111111111111111111111111111");
    let buyer = Principal::from("0x2222222222222222222222222222222222222222");
    let recipient = Principal::from("0x3333333333333333333333333333333333333333");

    let listing = |name: &str, price: u64, cut: u64, pointer: &str| Operation::CreateListing {
        caller: developer.clone(),
        app_name: name.to_string(),
        app_desc: "This is a sample description".to_string(),
        price,
        file_pointer: pointer.to_string(),
        developer_cut: cut,
        file_hash: None,
        file_data: Some("Sample file data".to_string()),
    };

    vec![
        listing("Test Application", 5, 4, "BitTorrent Pointer"),
        listing("Test Application 2", 10, 9, "BitTorrent Pointer 2"),
        Operation::FetchAllListings,
        Operation::BuyApplication { caller: buyer.clone(), listing_id: 0, payment: 6 },
        Operation::BuyApplication { caller: buyer.clone(), listing_id: 0, payment: 5 },
        Operation::RetrieveFile { caller: buyer.clone(), listing_id: 0 },
        Operation::FetchListing { listing_id: 0 },
        Operation::TransferOwnership {
            caller: buyer.clone(),
            listing_id: 0,
            new_owner: recipient.clone(),
        },
        Operation::CheckOwnership { listing_id: 0, principal: buyer.clone() },
        Operation::CheckOwnership { listing_id: 0, principal: recipient.clone() },
        Operation::RetrieveFile { caller: buyer, listing_id: 0 },
        Operation::BalanceOf { account: developer.clone() },
        Operation::BalanceOf { account: administrator.clone() },
        Operation::RecentEvents { limit: 10 },
    ]
}

fn to_value<T: Serialize>(value: T) -> anyhow::Result<Value> {
    serde_json::to_value(value).context("failed to render result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dappstore_marketplace::StoreConfig;

    fn store() -> DappStore {
        DappStore::new(StoreConfig::new("0xadmin"))
    }

    #[test]
    fn test_parse_tagged_operations() {
        let ops = parse_script(
            r#"[
                {"op": "create_listing", "caller": "0x1", "app_name": "A", "app_desc": "d",
                 "price": 5, "file_pointer": "ptr", "developer_cut": 4, "file_data": "x"},
                {"op": "buy_application", "caller": "0x2", "listing_id": 0, "payment": 5},
                {"op": "recent_events"}
            ]"#,
        )
        .unwrap();

        assert_eq!(ops.len(), 3);
        assert_eq!(ops[1].name(), "buy_application");
        assert!(matches!(ops[2], Operation::RecentEvents { limit: 20 }));
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        assert!(parse_script(r#"[{"op": "mint"}]"#).is_err());
    }

    #[tokio::test]
    async fn test_rejections_do_not_stop_script() {
        let store = store();
        let ops = parse_script(
            r#"[
                {"op": "buy_application", "caller": "0x2", "listing_id": 0, "payment": 5},
                {"op": "create_listing", "caller": "0x1", "app_name": "A", "app_desc": "d",
                 "price": 5, "file_pointer": "ptr", "developer_cut": 4, "file_data": "x"},
                {"op": "check_ownership", "listing_id": 0, "principal": "0x2"}
            ]"#,
        )
        .unwrap();

        let lines = run_script(&store, ops).await;

        assert_eq!(lines[0]["error"], "Listing 0 not found");
        assert_eq!(lines[1]["ok"]["outcome"], "created");
        assert_eq!(lines[1]["ok"]["listing_id"], 0);
        assert_eq!(lines[2]["ok"], false);
    }

    #[tokio::test]
    async fn test_create_requires_hash_or_data() {
        let store = store();
        let result = execute(
            &store,
            Operation::CreateListing {
                caller: Principal::from("0x1"),
                app_name: "A".to_string(),
                app_desc: "d".to_string(),
                price: 1,
                file_pointer: "ptr".to_string(),
                developer_cut: 0,
                file_hash: None,
                file_data: None,
            },
        )
        .await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidContentHash { .. })
        ));
    }

    #[test]
    fn test_unrenderable_result_is_an_error() {
        let mut map = std::collections::HashMap::new();
        map.insert((1u8, 2u8), 3u8);

        let err = to_value(map).unwrap_err();
        assert!(format!("{err:#}").starts_with("failed to render result"));
    }

    #[tokio::test]
    async fn test_demo_walkthrough() {
        let store = store();
        let admin = Principal::from("0xadmin");

        let lines = run_script(&store, demo_script(&admin)).await;

        assert_eq!(lines[1]["ok"]["outcome"], "duplicate");
        assert_eq!(lines[2]["ok"].as_array().unwrap().len(), 1);
        assert!(lines[3]["error"].as_str().unwrap().starts_with("Incorrect value provided"));
        assert_eq!(lines[4]["ok"]["downloads_after"], 1);
        assert_eq!(lines[5]["ok"], "BitTorrent Pointer");
        assert_eq!(lines[8]["ok"], false);
        assert_eq!(lines[9]["ok"], true);
        assert!(lines[10].get("error").is_some());
        assert_eq!(lines[11]["ok"], 4);
        assert_eq!(lines[12]["ok"], 1);
    }
}
