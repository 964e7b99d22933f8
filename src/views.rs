// src/views.rs
use crate::auth::CurrentUser;
use crate::chart::PriceChart;
use crate::error::StoreError;
use crate::models::{Holding, Stock, StockId, Transaction, WatchEntry};
use crate::store::Store;
use log::warn;
use rust_decimal::Decimal;
use std::collections::HashMap;

pub const STOCKS_PER_PAGE: usize = 3;

pub struct PortfolioRow {
    pub holding: Holding,
    pub stock: Stock,
    pub total_value: Decimal,
}

pub struct PortfolioView {
    pub rows: Vec<PortfolioRow>,
    pub total_shares: u64,
    pub total_value: Decimal,
    /// Choices for the buy/sell form.
    pub stocks: Vec<Stock>,
}

pub async fn portfolio(store: &dyn Store, user: &CurrentUser) -> Result<PortfolioView, StoreError> {
    let stocks = store.stocks().await?;
    let by_id = index(&stocks);
    let mut rows: Vec<PortfolioRow> = store
        .holdings(user.id())
        .await?
        .into_iter()
        .filter_map(|holding| {
            let stock = (*by_id.get(&holding.stock_id)?).clone();
            let total_value = holding.value_at(stock.current_price);
            Some(PortfolioRow {
                holding,
                stock,
                total_value,
            })
        })
        .collect();
    rows.sort_by(|a, b| a.stock.ticker.cmp(&b.stock.ticker));

    let total_shares = rows.iter().map(|row| u64::from(row.holding.shares)).sum();
    let total_value = rows.iter().map(|row| row.total_value).sum();
    Ok(PortfolioView {
        rows,
        total_shares,
        total_value,
        stocks,
    })
}

pub struct WatchRow {
    pub entry: WatchEntry,
    pub stock: Stock,
}

pub async fn watchlist(store: &dyn Store, user: &CurrentUser) -> Result<Vec<WatchRow>, StoreError> {
    let stocks = store.stocks().await?;
    let by_id = index(&stocks);
    Ok(store
        .watchlist(user.id())
        .await?
        .into_iter()
        .filter_map(|entry| {
            let stock = (*by_id.get(&entry.stock_id)?).clone();
            Some(WatchRow { entry, stock })
        })
        .collect())
}

pub struct TransactionRow {
    pub transaction: Transaction,
    pub stock: Stock,
}

impl TransactionRow {
    pub fn total(&self) -> Decimal {
        self.transaction.price * Decimal::from(self.transaction.shares)
    }
}

pub async fn transactions(
    store: &dyn Store,
    user: &CurrentUser,
) -> Result<Vec<TransactionRow>, StoreError> {
    let stocks = store.stocks().await?;
    let by_id = index(&stocks);
    Ok(store
        .transactions(user.id())
        .await?
        .into_iter()
        .filter_map(|transaction| {
            let stock = (*by_id.get(&transaction.stock_id)?).clone();
            Some(TransactionRow { transaction, stock })
        })
        .collect())
}

/// Figures shown next to the chart on the stock detail page.
pub struct PriceSummary {
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub region: String,
    pub instrument_type: String,
    pub max_price: f64,
    pub min_price: f64,
    pub diff: Decimal,
    pub chart: PriceChart,
}

pub struct StockDetail {
    pub stock: Stock,
    pub summary: Option<PriceSummary>,
    pub shares_owned: u32,
}

/// `None` when the stock does not exist.
pub async fn stock_detail(
    store: &dyn Store,
    user: &CurrentUser,
    stock_id: StockId,
) -> Result<Option<StockDetail>, StoreError> {
    let Some(stock) = store.stock(stock_id).await? else {
        return Ok(None);
    };
    let summary = match store.price_history(stock_id).await?.into_iter().next() {
        Some(record) => match record.parse_series() {
            Ok(series) => {
                let title = format!(
                    "{} ({}) - 12-Hour Price History",
                    stock.company_name, stock.ticker
                );
                let max_price = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let min_price = series.iter().copied().fold(f64::INFINITY, f64::min);
                PriceChart::new(title, series).map(|chart| PriceSummary {
                    diff: record.close_price - record.open_price,
                    open_price: record.open_price,
                    close_price: record.close_price,
                    region: record.region,
                    instrument_type: record.instrument_type,
                    max_price,
                    min_price,
                    chart,
                })
            }
            Err(e) => {
                warn!("Unreadable price series for {}: {}", stock.ticker, e);
                None
            }
        },
        None => None,
    };
    let shares_owned = store
        .holding(user.id(), stock_id)
        .await?
        .map_or(0, |holding| holding.shares);
    Ok(Some(StockDetail {
        stock,
        summary,
        shares_owned,
    }))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: usize,
    pub num_pages: usize,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// Splits `items` into pages of `per_page`. `requested` is the raw `page`
/// query value: a 1-based number or `last`. Returns `None` for anything that
/// does not name an existing page; an empty list still has page 1.
pub fn paginate<T>(items: Vec<T>, per_page: usize, requested: Option<&str>) -> Option<Page<T>> {
    let per_page = per_page.max(1);
    let num_pages = items.len().div_ceil(per_page).max(1);
    let number = match requested.map(str::trim) {
        None | Some("") => 1,
        Some("last") => num_pages,
        Some(raw) => raw.parse::<usize>().ok()?,
    };
    if number == 0 || number > num_pages {
        return None;
    }
    let items = items
        .into_iter()
        .skip((number - 1) * per_page)
        .take(per_page)
        .collect();
    Some(Page {
        items,
        number,
        num_pages,
    })
}

fn index(stocks: &[Stock]) -> HashMap<StockId, &Stock> {
    stocks.iter().map(|stock| (stock.id, stock)).collect()
}
