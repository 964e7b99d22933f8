// src/store/scylla.rs
use super::{Store, StoreResult};
use crate::error::StoreError;
use crate::models::{
    sort_newest_first, to_price, Holding, HoldingDefaults, NewPriceHistory, NewStock,
    NewTransaction, NewUser, NewWatchEntry, PriceHistory, PriceHistoryId, Stock, StockId, Transaction,
    TransactionId, UserId, UserProfile, WatchEntry, WatchEntryId,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{error, info};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use scylla::frame::response::result::{CqlValue, Row};
use scylla::query::Query;
use scylla::{Session, SessionBuilder};
use std::fmt::Display;
use std::str::FromStr;

const SCHEMA: &[&str] = &[
    "CREATE KEYSPACE IF NOT EXISTS scrooge_capital WITH REPLICATION = {'class': 'SimpleStrategy', 'replication_factor': 1}",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.users (id TEXT PRIMARY KEY, username TEXT, password_hash TEXT, first_name TEXT, last_name TEXT, email TEXT, dob TEXT)",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.users_by_username (username TEXT PRIMARY KEY, user_id TEXT)",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.users_by_email (email TEXT PRIMARY KEY, user_id TEXT)",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.stocks (id TEXT PRIMARY KEY, ticker TEXT, company_name TEXT, current_price BIGINT)",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.stocks_by_ticker (ticker TEXT PRIMARY KEY, stock_id TEXT)",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.price_history (stock_id TEXT, id TEXT, date TEXT, open_price BIGINT, close_price BIGINT, region TEXT, instrument_type TEXT, series TEXT, PRIMARY KEY (stock_id, id))",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.holdings (user_id TEXT, stock_id TEXT, shares BIGINT, purchase_price BIGINT, purchase_date TEXT, PRIMARY KEY (user_id, stock_id))",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.watchlist (user_id TEXT, id TEXT, stock_id TEXT, added_price BIGINT, added_date TEXT, current_price BIGINT, PRIMARY KEY (user_id, id))",
    "CREATE TABLE IF NOT EXISTS scrooge_capital.transactions (user_id TEXT, id TEXT, stock_id TEXT, shares BIGINT, price BIGINT, trade_date TEXT, kind TEXT, PRIMARY KEY (user_id, id))",
];

const SELECT_USER: &str =
    "SELECT id, username, first_name, last_name, email, dob FROM scrooge_capital.users WHERE id = ?";
const SELECT_STOCK: &str =
    "SELECT id, ticker, company_name, current_price FROM scrooge_capital.stocks WHERE id = ?";
const SELECT_HOLDING: &str = "SELECT user_id, stock_id, shares, purchase_price, purchase_date FROM scrooge_capital.holdings WHERE user_id = ? AND stock_id = ?";
const INSERT_HOLDING: &str = "INSERT INTO scrooge_capital.holdings (user_id, stock_id, shares, purchase_price, purchase_date) VALUES (?, ?, ?, ?, ?)";
const SELECT_WATCHLIST: &str = "SELECT id, user_id, stock_id, added_price, added_date, current_price FROM scrooge_capital.watchlist WHERE user_id = ?";

/// Prices are stored as integer cents, dates as ISO-8601 text and ids as text.
pub struct ScyllaStore {
    session: Session,
}

impl ScyllaStore {
    pub async fn connect(node: &str) -> StoreResult<Self> {
        let session = SessionBuilder::new()
            .known_node(node)
            .build()
            .await
            .map_err(backend)?;

        for statement in SCHEMA {
            session.query(*statement, ()).await.map_err(backend)?;
        }

        info!("Successfully connected to ScyllaDB at {}.", node);
        Ok(Self { session })
    }

    async fn rows(&self, query: Query, values: impl scylla::frame::value::ValueList) -> StoreResult<Vec<Row>> {
        let result = self.session.query(query, values).await.map_err(backend)?;
        Ok(result.rows.unwrap_or_default())
    }

    async fn execute(&self, query: Query, values: impl scylla::frame::value::ValueList) -> StoreResult<()> {
        self.session.query(query, values).await.map_err(backend)?;
        Ok(())
    }

    async fn lookup_id(&self, query: &str, key: &str) -> StoreResult<Option<String>> {
        match self.rows(Query::new(query), (key,)).await?.first() {
            Some(row) => Ok(Some(text_at(row, 0)?)),
            None => Ok(None),
        }
    }

    async fn stock_rows_referencing(&self, table: &str, key: &str, id: StockId) -> StoreResult<Vec<(String, String)>> {
        let query = format!(
            "SELECT user_id, {} FROM scrooge_capital.{} WHERE stock_id = ? ALLOW FILTERING",
            key, table
        );
        self.rows(Query::new(query), (id.to_string(),))
            .await?
            .iter()
            .map(|row| -> StoreResult<(String, String)> { Ok((text_at(row, 0)?, text_at(row, 1)?)) })
            .collect()
    }
}

#[async_trait]
impl Store for ScyllaStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserProfile> {
        let by_username = "SELECT user_id FROM scrooge_capital.users_by_username WHERE username = ?";
        if self.lookup_id(by_username, &user.username).await?.is_some() {
            return Err(StoreError::Conflict {
                entity: "user",
                key: user.username,
            });
        }
        let email_key = user.email.to_lowercase();
        let by_email = "SELECT user_id FROM scrooge_capital.users_by_email WHERE email = ?";
        if self.lookup_id(by_email, &email_key).await?.is_some() {
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
        let id = profile.id.to_string();
        self.execute(
            Query::new("INSERT INTO scrooge_capital.users (id, username, password_hash, first_name, last_name, email, dob) VALUES (?, ?, ?, ?, ?, ?, ?)"),
            (
                id.clone(),
                profile.username.clone(),
                user.password_hash,
                profile.first_name.clone(),
                profile.last_name.clone(),
                profile.email.clone(),
                profile.dob.map(|d| d.to_string()),
            ),
        )
        .await?;
        self.execute(
            Query::new("INSERT INTO scrooge_capital.users_by_username (username, user_id) VALUES (?, ?)"),
            (profile.username.clone(), id.clone()),
        )
        .await?;
        self.execute(
            Query::new("INSERT INTO scrooge_capital.users_by_email (email, user_id) VALUES (?, ?)"),
            (email_key, id),
        )
        .await?;
        Ok(profile)
    }

    async fn user(&self, id: UserId) -> StoreResult<Option<UserProfile>> {
        self.rows(Query::new(SELECT_USER), (id.to_string(),))
            .await?
            .first()
            .map(user_from_row)
            .transpose()
    }

    async fn credentials(&self, username: &str) -> StoreResult<Option<(UserId, String)>> {
        let by_username = "SELECT user_id FROM scrooge_capital.users_by_username WHERE username = ?";
        let Some(id) = self.lookup_id(by_username, username).await? else {
            return Ok(None);
        };
        let rows = self
            .rows(
                Query::new("SELECT id, password_hash FROM scrooge_capital.users WHERE id = ?"),
                (id,),
            )
            .await?;
        match rows.first() {
            Some(row) => Ok(Some((parse_at(row, 0)?, text_at(row, 1)?))),
            None => Ok(None),
        }
    }

    async fn update_profile(&self, profile: &UserProfile) -> StoreResult<()> {
        let current = self
            .user(profile.id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("user {}", profile.id)))?;
        let id = profile.id.to_string();
        let old_email = current.email.to_lowercase();
        let new_email = profile.email.to_lowercase();

        if old_email != new_email {
            let by_email = "SELECT user_id FROM scrooge_capital.users_by_email WHERE email = ?";
            if self.lookup_id(by_email, &new_email).await?.is_some() {
                return Err(StoreError::Conflict {
                    entity: "email",
                    key: profile.email.clone(),
                });
            }
            self.execute(
                Query::new("DELETE FROM scrooge_capital.users_by_email WHERE email = ?"),
                (old_email,),
            )
            .await?;
            self.execute(
                Query::new("INSERT INTO scrooge_capital.users_by_email (email, user_id) VALUES (?, ?)"),
                (new_email, id.clone()),
            )
            .await?;
        }

        self.execute(
            Query::new("UPDATE scrooge_capital.users SET first_name = ?, last_name = ?, email = ?, dob = ? WHERE id = ?"),
            (
                profile.first_name.clone(),
                profile.last_name.clone(),
                profile.email.clone(),
                profile.dob.map(|d| d.to_string()),
                id,
            ),
        )
        .await
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let Some(profile) = self.user(id).await? else {
            return Ok(());
        };
        let key = id.to_string();
        for table in ["holdings", "watchlist", "transactions"] {
            let query = format!("DELETE FROM scrooge_capital.{} WHERE user_id = ?", table);
            self.execute(Query::new(query), (key.clone(),)).await?;
        }
        self.execute(
            Query::new("DELETE FROM scrooge_capital.users_by_username WHERE username = ?"),
            (profile.username,),
        )
        .await?;
        self.execute(
            Query::new("DELETE FROM scrooge_capital.users_by_email WHERE email = ?"),
            (profile.email.to_lowercase(),),
        )
        .await?;
        self.execute(
            Query::new("DELETE FROM scrooge_capital.users WHERE id = ?"),
            (key,),
        )
        .await
    }

    async fn create_stock(&self, stock: NewStock) -> StoreResult<Stock> {
        let by_ticker = "SELECT stock_id FROM scrooge_capital.stocks_by_ticker WHERE ticker = ?";
        if self.lookup_id(by_ticker, &stock.ticker).await?.is_some() {
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
        self.execute(
            Query::new("INSERT INTO scrooge_capital.stocks (id, ticker, company_name, current_price) VALUES (?, ?, ?, ?)"),
            (
                stock.id.to_string(),
                stock.ticker.clone(),
                stock.company_name.clone(),
                to_cents(stock.current_price)?,
            ),
        )
        .await?;
        self.execute(
            Query::new("INSERT INTO scrooge_capital.stocks_by_ticker (ticker, stock_id) VALUES (?, ?)"),
            (stock.ticker.clone(), stock.id.to_string()),
        )
        .await?;
        Ok(stock)
    }

    async fn stock(&self, id: StockId) -> StoreResult<Option<Stock>> {
        self.rows(Query::new(SELECT_STOCK), (id.to_string(),))
            .await?
            .first()
            .map(stock_from_row)
            .transpose()
    }

    async fn stock_by_ticker(&self, ticker: &str) -> StoreResult<Option<Stock>> {
        let by_ticker = "SELECT stock_id FROM scrooge_capital.stocks_by_ticker WHERE ticker = ?";
        match self.lookup_id(by_ticker, ticker).await? {
            Some(id) => self.stock(parse_text(&id)?).await,
            None => Ok(None),
        }
    }

    async fn stocks(&self) -> StoreResult<Vec<Stock>> {
        let rows = self
            .rows(
                Query::new("SELECT id, ticker, company_name, current_price FROM scrooge_capital.stocks"),
                (),
            )
            .await?;
        let mut stocks = rows.iter().map(stock_from_row).collect::<StoreResult<Vec<_>>>()?;
        stocks.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Ok(stocks)
    }

    async fn update_stock_price(&self, id: StockId, price: Decimal) -> StoreResult<()> {
        if self.stock(id).await?.is_none() {
            return Err(StoreError::NotFound(format!("stock {}", id)));
        }
        self.execute(
            Query::new("UPDATE scrooge_capital.stocks SET current_price = ? WHERE id = ?"),
            (to_cents(price)?, id.to_string()),
        )
        .await
    }

    async fn delete_stock(&self, id: StockId) -> StoreResult<()> {
        let Some(stock) = self.stock(id).await? else {
            return Ok(());
        };
        for (user_id, stock_id) in self.stock_rows_referencing("holdings", "stock_id", id).await? {
            self.execute(
                Query::new("DELETE FROM scrooge_capital.holdings WHERE user_id = ? AND stock_id = ?"),
                (user_id, stock_id),
            )
            .await?;
        }
        for table in ["watchlist", "transactions"] {
            let delete = format!("DELETE FROM scrooge_capital.{} WHERE user_id = ? AND id = ?", table);
            for (user_id, row_id) in self.stock_rows_referencing(table, "id", id).await? {
                self.execute(Query::new(delete.clone()), (user_id, row_id)).await?;
            }
        }
        let key = id.to_string();
        self.execute(
            Query::new("DELETE FROM scrooge_capital.price_history WHERE stock_id = ?"),
            (key.clone(),),
        )
        .await?;
        self.execute(
            Query::new("DELETE FROM scrooge_capital.stocks_by_ticker WHERE ticker = ?"),
            (stock.ticker,),
        )
        .await?;
        self.execute(
            Query::new("DELETE FROM scrooge_capital.stocks WHERE id = ?"),
            (key,),
        )
        .await
    }

    async fn create_price_history(&self, record: NewPriceHistory) -> StoreResult<PriceHistory> {
        if self.stock(record.stock_id).await?.is_none() {
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
        self.execute(
            Query::new("INSERT INTO scrooge_capital.price_history (stock_id, id, date, open_price, close_price, region, instrument_type, series) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
            (
                record.stock_id.to_string(),
                record.id.to_string(),
                record.date.to_string(),
                to_cents(record.open_price)?,
                to_cents(record.close_price)?,
                record.region.clone(),
                record.instrument_type.clone(),
                record.series.clone(),
            ),
        )
        .await?;
        Ok(record)
    }

    async fn price_history(&self, stock_id: StockId) -> StoreResult<Vec<PriceHistory>> {
        let rows = self
            .rows(
                Query::new("SELECT id, stock_id, date, open_price, close_price, region, instrument_type, series FROM scrooge_capital.price_history WHERE stock_id = ?"),
                (stock_id.to_string(),),
            )
            .await?;
        let mut records = rows
            .iter()
            .map(|row| -> StoreResult<PriceHistory> {
                Ok(PriceHistory {
                    id: parse_at(row, 0)?,
                    stock_id: parse_at(row, 1)?,
                    date: date_at(row, 2)?,
                    open_price: cents_at(row, 3)?,
                    close_price: cents_at(row, 4)?,
                    region: text_at(row, 5)?,
                    instrument_type: text_at(row, 6)?,
                    series: opt_text_at(row, 7).unwrap_or_default(),
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn holding(&self, user_id: UserId, stock_id: StockId) -> StoreResult<Option<Holding>> {
        self.rows(
            Query::new(SELECT_HOLDING),
            (user_id.to_string(), stock_id.to_string()),
        )
        .await?
        .first()
        .map(holding_from_row)
        .transpose()
    }

    async fn get_or_create_holding(
        &self,
        user_id: UserId,
        stock_id: StockId,
        defaults: HoldingDefaults,
    ) -> StoreResult<Holding> {
        if let Some(holding) = self.holding(user_id, stock_id).await? {
            return Ok(holding);
        }
        let holding = Holding {
            user_id,
            stock_id,
            shares: defaults.shares,
            purchase_price: defaults.purchase_price,
            purchase_date: defaults.purchase_date,
        };
        self.save_holding(&holding).await?;
        Ok(holding)
    }

    async fn holdings(&self, user_id: UserId) -> StoreResult<Vec<Holding>> {
        self.rows(
            Query::new("SELECT user_id, stock_id, shares, purchase_price, purchase_date FROM scrooge_capital.holdings WHERE user_id = ?"),
            (user_id.to_string(),),
        )
        .await?
        .iter()
        .map(holding_from_row)
        .collect()
    }

    async fn save_holding(&self, holding: &Holding) -> StoreResult<()> {
        self.execute(
            Query::new(INSERT_HOLDING),
            (
                holding.user_id.to_string(),
                holding.stock_id.to_string(),
                i64::from(holding.shares),
                to_cents(holding.purchase_price)?,
                holding.purchase_date.to_string(),
            ),
        )
        .await
    }

    async fn delete_holding(&self, user_id: UserId, stock_id: StockId) -> StoreResult<()> {
        self.execute(
            Query::new("DELETE FROM scrooge_capital.holdings WHERE user_id = ? AND stock_id = ?"),
            (user_id.to_string(), stock_id.to_string()),
        )
        .await
    }

    async fn watchlist(&self, user_id: UserId) -> StoreResult<Vec<WatchEntry>> {
        self.rows(Query::new(SELECT_WATCHLIST), (user_id.to_string(),))
            .await?
            .iter()
            .map(watch_entry_from_row)
            .collect()
    }

    async fn watch_entry_for(
        &self,
        user_id: UserId,
        stock_id: StockId,
    ) -> StoreResult<Option<WatchEntry>> {
        Ok(self
            .watchlist(user_id)
            .await?
            .into_iter()
            .find(|entry| entry.stock_id == stock_id))
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
        self.execute(
            Query::new("INSERT INTO scrooge_capital.watchlist (user_id, id, stock_id, added_price, added_date, current_price) VALUES (?, ?, ?, ?, ?, ?)"),
            (
                entry.user_id.to_string(),
                entry.id.to_string(),
                entry.stock_id.to_string(),
                entry.added_price.map(to_cents).transpose()?,
                entry.added_date.to_string(),
                entry.current_price.map(to_cents).transpose()?,
            ),
        )
        .await?;
        Ok(entry)
    }

    async fn delete_watch_entry(&self, user_id: UserId, id: WatchEntryId) -> StoreResult<bool> {
        let exists = !self
            .rows(
                Query::new("SELECT id FROM scrooge_capital.watchlist WHERE user_id = ? AND id = ?"),
                (user_id.to_string(), id.to_string()),
            )
            .await?
            .is_empty();
        if exists {
            self.execute(
                Query::new("DELETE FROM scrooge_capital.watchlist WHERE user_id = ? AND id = ?"),
                (user_id.to_string(), id.to_string()),
            )
            .await?;
        }
        Ok(exists)
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
        self.execute(
            Query::new("INSERT INTO scrooge_capital.transactions (user_id, id, stock_id, shares, price, trade_date, kind) VALUES (?, ?, ?, ?, ?, ?, ?)"),
            (
                transaction.user_id.to_string(),
                transaction.id.to_string(),
                transaction.stock_id.to_string(),
                i64::from(transaction.shares),
                to_cents(transaction.price)?,
                transaction.date.to_string(),
                transaction.kind.as_str(),
            ),
        )
        .await?;
        Ok(transaction)
    }

    async fn transactions(&self, user_id: UserId) -> StoreResult<Vec<Transaction>> {
        let rows = self
            .rows(
                Query::new("SELECT id, user_id, stock_id, shares, price, trade_date, kind FROM scrooge_capital.transactions WHERE user_id = ?"),
                (user_id.to_string(),),
            )
            .await?;
        let mut transactions = rows
            .iter()
            .map(|row| -> StoreResult<Transaction> {
                Ok(Transaction {
                    id: parse_at(row, 0)?,
                    user_id: parse_at(row, 1)?,
                    stock_id: parse_at(row, 2)?,
                    shares: shares_at(row, 3)?,
                    price: cents_at(row, 4)?,
                    date: date_at(row, 5)?,
                    kind: parse_at(row, 6)?,
                })
            })
            .collect::<StoreResult<Vec<_>>>()?;
        sort_newest_first(&mut transactions);
        Ok(transactions)
    }
}

fn backend(e: impl Display) -> StoreError {
    error!("ScyllaDB request failed: {}", e);
    StoreError::Backend(e.to_string())
}

fn to_cents(price: Decimal) -> StoreResult<i64> {
    (to_price(price) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| StoreError::InvalidData(format!("price {} out of range", price)))
}

fn column(row: &Row, idx: usize) -> Option<&CqlValue> {
    row.columns.get(idx).and_then(|c| c.as_ref())
}

fn missing(idx: usize, kind: &str) -> StoreError {
    StoreError::InvalidData(format!("column {} is not {}", idx, kind))
}

fn opt_text_at(row: &Row, idx: usize) -> Option<String> {
    column(row, idx).and_then(|v| v.as_text()).map(|s| s.to_string())
}

fn text_at(row: &Row, idx: usize) -> StoreResult<String> {
    opt_text_at(row, idx).ok_or_else(|| missing(idx, "text"))
}

fn parse_text<T>(value: &str) -> StoreResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| StoreError::InvalidData(format!("`{}`: {}", value, e)))
}

fn parse_at<T>(row: &Row, idx: usize) -> StoreResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_text(&text_at(row, idx)?)
}

fn date_at(row: &Row, idx: usize) -> StoreResult<NaiveDate> {
    parse_at(row, idx)
}

fn opt_date_at(row: &Row, idx: usize) -> StoreResult<Option<NaiveDate>> {
    opt_text_at(row, idx).map(|s| parse_text(&s)).transpose()
}

fn opt_cents_at(row: &Row, idx: usize) -> Option<Decimal> {
    column(row, idx)
        .and_then(|v| v.as_bigint())
        .map(|cents| Decimal::new(cents, 2))
}

fn cents_at(row: &Row, idx: usize) -> StoreResult<Decimal> {
    opt_cents_at(row, idx).ok_or_else(|| missing(idx, "bigint"))
}

fn shares_at(row: &Row, idx: usize) -> StoreResult<u32> {
    let shares = column(row, idx)
        .and_then(|v| v.as_bigint())
        .ok_or_else(|| missing(idx, "bigint"))?;
    u32::try_from(shares).map_err(|_| StoreError::InvalidData(format!("share count {}", shares)))
}

fn user_from_row(row: &Row) -> StoreResult<UserProfile> {
    Ok(UserProfile {
        id: parse_at(row, 0)?,
        username: text_at(row, 1)?,
        first_name: text_at(row, 2)?,
        last_name: text_at(row, 3)?,
        email: text_at(row, 4)?,
        dob: opt_date_at(row, 5)?,
    })
}

fn stock_from_row(row: &Row) -> StoreResult<Stock> {
    Ok(Stock {
        id: parse_at(row, 0)?,
        ticker: text_at(row, 1)?,
        company_name: text_at(row, 2)?,
        current_price: cents_at(row, 3)?,
    })
}

fn holding_from_row(row: &Row) -> StoreResult<Holding> {
    Ok(Holding {
        user_id: parse_at(row, 0)?,
        stock_id: parse_at(row, 1)?,
        shares: shares_at(row, 2)?,
        purchase_price: cents_at(row, 3)?,
        purchase_date: date_at(row, 4)?,
    })
}

fn watch_entry_from_row(row: &Row) -> StoreResult<WatchEntry> {
    Ok(WatchEntry {
        id: parse_at(row, 0)?,
        user_id: parse_at(row, 1)?,
        stock_id: parse_at(row, 2)?,
        added_price: opt_cents_at(row, 3),
        added_date: date_at(row, 4)?,
        current_price: opt_cents_at(row, 5),
    })
}
