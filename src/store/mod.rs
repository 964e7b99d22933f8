// src/store/mod.rs
pub mod memory;
pub mod scylla;

use crate::error::StoreError;
use crate::models::{
    Holding, HoldingDefaults, NewPriceHistory, NewStock, NewTransaction, NewUser,
    NewWatchEntry, PriceHistory, Stock, StockId, Transaction, UserId, UserProfile, WatchEntry,
    WatchEntryId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;

pub use memory::MemoryStore;
pub use scylla::ScyllaStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Identities

    /// Fails with [`StoreError::Conflict`] when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<UserProfile>;
    async fn user(&self, id: UserId) -> StoreResult<Option<UserProfile>>;
    /// Returns the user id and password hash registered under `username`.
    async fn credentials(&self, username: &str) -> StoreResult<Option<(UserId, String)>>;
    async fn update_profile(&self, profile: &UserProfile) -> StoreResult<()>;
    /// Removes the identity together with its holdings, watchlist and transactions.
    async fn delete_user(&self, id: UserId) -> StoreResult<()>;

    // Stocks

    /// Fails with [`StoreError::Conflict`] when the ticker is taken.
    async fn create_stock(&self, stock: NewStock) -> StoreResult<Stock>;
    async fn stock(&self, id: StockId) -> StoreResult<Option<Stock>>;
    async fn stock_by_ticker(&self, ticker: &str) -> StoreResult<Option<Stock>>;
    /// All stocks ordered by ticker.
    async fn stocks(&self) -> StoreResult<Vec<Stock>>;
    async fn update_stock_price(&self, id: StockId, price: Decimal) -> StoreResult<()>;
    /// Removes the stock, its price history and every user record that points at it.
    async fn delete_stock(&self, id: StockId) -> StoreResult<()>;

    // Price history

    async fn create_price_history(&self, record: NewPriceHistory) -> StoreResult<PriceHistory>;
    /// Records for one stock, earliest date first.
    async fn price_history(&self, stock_id: StockId) -> StoreResult<Vec<PriceHistory>>;

    // Holdings

    async fn holding(&self, user_id: UserId, stock_id: StockId) -> StoreResult<Option<Holding>>;
    /// Returns the existing holding or inserts one built from `defaults`.
    async fn get_or_create_holding(
        &self,
        user_id: UserId,
        stock_id: StockId,
        defaults: HoldingDefaults,
    ) -> StoreResult<Holding>;
    async fn holdings(&self, user_id: UserId) -> StoreResult<Vec<Holding>>;
    async fn save_holding(&self, holding: &Holding) -> StoreResult<()>;
    async fn delete_holding(&self, user_id: UserId, stock_id: StockId) -> StoreResult<()>;

    // Watchlist

    async fn watchlist(&self, user_id: UserId) -> StoreResult<Vec<WatchEntry>>;
    async fn watch_entry_for(
        &self,
        user_id: UserId,
        stock_id: StockId,
    ) -> StoreResult<Option<WatchEntry>>;
    async fn create_watch_entry(&self, entry: NewWatchEntry) -> StoreResult<WatchEntry>;
    /// Returns `false` when the user has no entry with that id.
    async fn delete_watch_entry(&self, user_id: UserId, id: WatchEntryId) -> StoreResult<bool>;

    // Transactions

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction>;
    /// The user's transactions, newest first.
    async fn transactions(&self, user_id: UserId) -> StoreResult<Vec<Transaction>>;
}
