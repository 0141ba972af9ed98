////////////////////////////////////////////////////////////////////////
//
// 1. Each domain entity gets its own directory
// 2. Each domain is made of two parts:
//    - model: schema definition
//    - repository: the underlying database operations
//
//////////////////////////////////////////////////////////////////////

use mongodb::{bson::doc, options::IndexOptions, Client, Collection, IndexModel};
use std::sync::Arc;
use tracing::info;
use utils::{AppConfig, AppResult};

pub mod investment;
pub mod ledger;
pub mod member;
pub mod wallet;
pub mod withdrawal;

use investment::model::Investment;
use ledger::model::LedgerEntry;
use member::model::Member;
use wallet::model::WalletAccount;
use withdrawal::model::WithdrawalRequest;

#[derive(Clone, Debug)]
pub struct Database {
    pub client: Client,
    pub members: Collection<Member>,
    pub wallets: Collection<WalletAccount>,
    pub investments: Collection<Investment>,
    pub ledger_entries: Collection<LedgerEntry>,
    pub withdrawal_requests: Collection<WithdrawalRequest>,
}

impl Database {
    pub async fn new(config: Arc<AppConfig>) -> AppResult<Self> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        let db: mongodb::Database = client.database(&config.mongo_db);

        let members = db.collection("Member");
        let wallets = db.collection("WalletAccount");
        let investments = db.collection("Investment");
        let ledger_entries = db.collection("LedgerEntry");
        let withdrawal_requests = db.collection("WithdrawalRequest");

        info!("🧱 database({:#}) connected.", &config.mongo_db);

        Ok(Database {
            client,
            members,
            wallets,
            investments,
            ledger_entries,
            withdrawal_requests,
        })
    }

    /// Creates the unique indexes the identity lookups and the ledger
    /// idempotency keys rely on. Safe to call on every startup.
    pub async fn init_indexes(&self) -> AppResult<()> {
        let unique = IndexOptions::builder().unique(true).build();

        self.members
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "public_id": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;
        self.members
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "telegram_id": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;
        self.members
            .create_index(IndexModel::builder().keys(doc! { "sponsor_member_id": 1 }).build(), None)
            .await?;

        self.wallets
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "member_id": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;

        self.investments
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "investment_id": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;
        self.investments
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "status": 1, "owner_member_id": 1 })
                    .build(),
                None,
            )
            .await?;

        // The exactly-once guard: one document per (investment, kind, level/cycle) tuple.
        self.ledger_entries
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "dedup_key": 1 })
                    .options(unique.clone())
                    .build(),
                None,
            )
            .await?;
        self.ledger_entries
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "member_id": 1, "created_at": -1 })
                    .build(),
                None,
            )
            .await?;

        self.withdrawal_requests
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "request_id": 1 })
                    .options(unique)
                    .build(),
                None,
            )
            .await?;
        self.withdrawal_requests
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "member_id": 1, "created_at": -1 })
                    .build(),
                None,
            )
            .await?;

        info!("✅ ledger indexes initialized");
        Ok(())
    }
}
