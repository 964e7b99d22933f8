// src/store/memory.rs
use super::{Store, StoreResult};
use crate::error::StoreError;
use crate::models::{
    sort_newest_first, to_price, Holding, HoldingDefaults, NewPriceHistory, NewStock,
    NewTransaction, NewUser, NewWatchEntry, PriceHistory, PriceHistoryId, Stock, StockId, Transaction,
    TransactionId, UserId, UserProfile, WatchEntry, WatchEntryId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserProfile>,
    passwords: HashMap<UserId, String>,
    stocks: HashMap<StockId, Stock>,
    price_history: Vec<PriceHistory>,
    holdings: BTreeMap<(UserId, StockId), Holding>,
    watchlist: Vec<WatchEntry>,
    transactions: Vec<Transaction>,
}

impl Tables {
    fn username_taken(&self, username: &str) -> bool {
        self.users.values().any(|u| u.username == username)
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

/// Keeps every table in process memory. Used by the test-suite and for
/// local runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserProfile> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username) {
            return Err(StoreError::Conflict {
                entity: "user",
                key: user.username,
            });
        }
        if tables.email_taken(&user.email, None) {
            return Err(StoreError::Conflict {
                entity: "email",
                key: user.email,
            });
        }
        let profile = UserProfile {
            id: UserId::generate(),
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            dob: user.dob,
        };
        tables.passwords.insert(profile.id, user.password_hash);
        tables.users.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<UserProfile>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn credentials(&self, username: &str) -> StoreResult<Option<(UserId, String)>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .and_then(|u| tables.passwords.get(&u.id).map(|hash| (u.id, hash.clone()))))
    }

    async fn update_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&profile.id) {
            return Err(StoreError::NotFound(format!("user {}", profile.id)));
        }
        if tables.email_taken(&profile.email, Some(profile.id)) {
            return Err(StoreError::Conflict {
                entity: "email",
                key: profile.email.clone(),
            });
        }
        tables.users.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id);
        tables.passwords.remove(&id);
        tables.holdings.retain(|(user_id, _), _| *user_id != id);
        tables.watchlist.retain(|entry| entry.user_id != id);
        tables.transactions.retain(|tx| tx.user_id != id);
        Ok(())
    }

    async fn create_stock(&self, stock: NewStock) -> StoreResult<Stock> {
        let mut tables = self.tables.write().await;
        if tables.stocks.values().any(|s| s.ticker == stock.ticker) {
            return Err(StoreError::Conflict {
                entity: "stock",
                key: stock.ticker,
            });
        }
        let stock = Stock {
            id: StockId::generate(),
            ticker: stock.ticker,
            company_name: stock.company_name,
            current_price: to_price(stock.current_price),
        };
        tables.stocks.insert(stock.id, stock.clone());
        Ok(stock)
    }

    async fn stock(&self, id: StockId) -> StoreResult<Option<Stock>> {
        Ok(self.tables.read().await.stocks.get(&id).cloned())
    }

    async fn stock_by_ticker(&self, ticker: &str) -> StoreResult<Option<Stock>> {
        let tables = self.tables.read().await;
        Ok(tables.stocks.values().find(|s| s.ticker == ticker).cloned())
    }

    async fn stocks(&self) -> StoreResult<Vec<Stock>> {
        let mut stocks: Vec<Stock> = self.tables.read().await.stocks.values().cloned().collect();
        stocks.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(stocks)
    }

    async fn update_stock_price(&self, id: StockId, price: Decimal) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stock = tables
            .stocks
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("stock {}", id)))?;
        stock.current_price = to_price(price);
        Ok(())
    }

    async fn delete_stock(&self, id: StockId) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.stocks.remove(&id);
        tables.price_history.retain(|record| record.stock_id != id);
        tables.holdings.retain(|(_, stock_id), _| *stock_id != id);
        tables.watchlist.retain(|entry| entry.stock_id != id);
        tables.transactions.retain(|tx| tx.stock_id != id);
        Ok(())
    }

    async fn create_price_history(&self, record: NewPriceHistory) -> StoreResult<PriceHistory> {
        let mut tables = self.tables.write().await;
        if !tables.stocks.contains_key(&record.stock_id) {
            return Err(StoreError::NotFound(format!("stock {}", record.stock_id)));
        }
        let record = PriceHistory {
            id: PriceHistoryId::generate(),
            stock_id: record.stock_id,
            date: record.date,
            open_price: to_price(record.open_price),
            close_price: to_price(record.close_price),
            region: record.region,
            instrument_type: record.instrument_type,
            series: record.series,
        };
        tables.price_history.push(record.clone());
        Ok(record)
    }

    async fn price_history(&self, stock_id: StockId) -> StoreResult<Vec<PriceHistory>> {
        let mut records: Vec<PriceHistory> = self
            .tables
            .read()
            .await
            .price_history
            .iter()
            .filter(|record| record.stock_id == stock_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn holding(&self, user_id: UserId, stock_id: StockId) -> StoreResult<Option<Holding>> {
        let tables = self.tables.read().await;
        Ok(tables.holdings.get(&(user_id, stock_id)).cloned())
    }

    async fn get_or_create_holding(
        &self,
        user_id: UserId,
        stock_id: StockId,
        defaults: HoldingDefaults,
    ) -> StoreResult<Holding> {
        let mut tables = self.tables.write().await;
        let holding = tables
            .holdings
            .entry((user_id, stock_id))
            .or_insert_with(|| Holding {
                user_id,
                stock_id,
                shares: defaults.shares,
                purchase_price: defaults.purchase_price,
                purchase_date: defaults.purchase_date,
            });
        Ok(holding.clone())
    }

    async fn holdings(&self, user_id: UserId) -> StoreResult<Vec<Holding>> {
        let tables = self.tables.read().await;
        Ok(tables
            .holdings
            .values()
            .filter(|holding| holding.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn save_holding(&self, holding: &Holding) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .holdings
            .insert((holding.user_id, holding.stock_id), holding.clone());
        Ok(())
    }

    async fn delete_holding(&self, user_id: UserId, stock_id: StockId) -> StoreResult<()> {
        self.tables
            .write()
            .await
            .holdings
            .remove(&(user_id, stock_id));
        Ok(())
    }

    async fn watchlist(&self, user_id: UserId) -> StoreResult<Vec<WatchEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .watchlist
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn watch_entry_for(
        &self,
        user_id: UserId,
        stock_id: StockId,
    ) -> StoreResult<Option<WatchEntry>> {
        let tables = self.tables.read().await;
        Ok(tables
            .watchlist
            .iter()
            .find(|entry| entry.user_id == user_id && entry.stock_id == stock_id)
            .cloned())
    }

    async fn create_watch_entry(&self, entry: NewWatchEntry) -> StoreResult<WatchEntry> {
        let entry = WatchEntry {
            id: WatchEntryId::generate(),
            user_id: entry.user_id,
            stock_id: entry.stock_id,
            added_price: entry.added_price,
            added_date: entry.added_date,
            current_price: entry.current_price,
        };
        self.tables.write().await.watchlist.push(entry.clone());
        Ok(entry)
    }

    async fn delete_watch_entry(&self, user_id: UserId, id: WatchEntryId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.watchlist.len();
        tables
            .watchlist
            .retain(|entry| !(entry.id == id && entry.user_id == user_id));
        Ok(tables.watchlist.len() != before)
    }

    async fn create_transaction(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let transaction = Transaction {
            id: TransactionId::generate(),
            user_id: transaction.user_id,
            stock_id: transaction.stock_id,
            shares: transaction.shares,
            price: transaction.price,
            date: transaction.date,
            kind: transaction.kind,
        };
        self.tables
            .write()
            .await
            .transactions
            .push(transaction.clone());
        Ok(transaction)
    }

    async fn transactions(&self, user_id: UserId) -> StoreResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .tables
            .read()
            .await
            .transactions
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }
}
