// src/seed.rs
use crate::error::StoreError;
use crate::models::{NewPriceHistory, NewStock};
use crate::store::Store;
use chrono::NaiveDate;
use log::info;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("cannot read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse seed file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
pub struct Catalogue {
    pub stocks: Vec<SeedStock>,
}

#[derive(Debug, Deserialize)]
pub struct SeedStock {
    pub ticker: String,
    pub company_name: String,
    pub current_price: Decimal,
    #[serde(default)]
    pub price_history: Vec<SeedPriceHistory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPriceHistory {
    pub date: NaiveDate,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub region: String,
    #[serde(rename = "type")]
    pub instrument_type: String,
    pub series: String,
}

pub fn load(path: &Path) -> Result<Catalogue, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Inserts every stock whose ticker is not in the store yet, with its price
/// history. Returns how many stocks were added.
pub async fn apply(store: &dyn Store, catalogue: Catalogue) -> Result<usize, SeedError> {
    let mut added = 0;
    for seed in catalogue.stocks {
        if store.stock_by_ticker(&seed.ticker).await?.is_some() {
            info!("Stock {} already present, skipping.", seed.ticker);
            continue;
        }
        let stock = store
            .create_stock(NewStock {
                ticker: seed.ticker,
                company_name: seed.company_name,
                current_price: seed.current_price,
            })
            .await?;
        for record in seed.price_history {
            store
                .create_price_history(NewPriceHistory {
                    stock_id: stock.id,
                    date: record.date,
                    open_price: record.open_price,
                    close_price: record.close_price,
                    region: record.region,
                    instrument_type: record.instrument_type,
                    series: record.series,
                })
                .await?;
        }
        info!("Seeded {} ({}).", stock.company_name, stock.ticker);
        added += 1;
    }
    Ok(added)
}
