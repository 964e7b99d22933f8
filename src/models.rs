// src/models.rs
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn generate() -> Self {
                Self(Uuid::now_v7())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    };
}

id_type!(UserId);
id_type!(StockId);
id_type!(PriceHistoryId);
id_type!(WatchEntryId);
id_type!(TransactionId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dob: Option<NaiveDate>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Everything needed to register a new identity. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dob: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: StockId,
    pub ticker: String,
    pub company_name: String,
    pub current_price: Decimal,
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, ({}), current_price: ${}",
            self.company_name, self.ticker, self.current_price
        )
    }
}

/// Normalises a money amount to exactly two fraction digits, rounding
/// half to even.
pub fn to_price(value: Decimal) -> Decimal {
    let mut price = value.round_dp(2);
    price.rescale(2);
    price
}

#[derive(Debug, Clone)]
pub struct NewStock {
    pub ticker: String,
    pub company_name: String,
    pub current_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub id: PriceHistoryId,
    pub stock_id: StockId,
    pub date: NaiveDate,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub region: String,
    pub instrument_type: String,
    /// Comma separated intraday prices, e.g. `"101.5,102,101.75"`.
    pub series: String,
}

impl PriceHistory {
    /// Parses the stored series. Surrounding brackets, whitespace and empty
    /// segments are ignored.
    pub fn parse_series(&self) -> Result<Vec<f64>, ParseFloatError> {
        self.series
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .split(',')
            .map(str::trim)
            .filter(|price| !price.is_empty())
            .map(str::parse::<f64>)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct NewPriceHistory {
    pub stock_id: StockId,
    pub date: NaiveDate,
    pub open_price: Decimal,
    pub close_price: Decimal,
    pub region: String,
    pub instrument_type: String,
    pub series: String,
}

/// A user's position in one stock. At most one exists per (user, stock) and
/// it never persists with zero shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub user_id: UserId,
    pub stock_id: StockId,
    pub shares: u32,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
}

impl Holding {
    pub fn value_at(&self, price: Decimal) -> Decimal {
        price * Decimal::from(self.shares)
    }
}

/// Field values used when a holding has to be created by a get-or-insert.
#[derive(Debug, Clone, Copy)]
pub struct HoldingDefaults {
    pub shares: u32,
    pub purchase_price: Decimal,
    pub purchase_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchEntry {
    pub id: WatchEntryId,
    pub user_id: UserId,
    pub stock_id: StockId,
    pub added_price: Option<Decimal>,
    pub added_date: NaiveDate,
    pub current_price: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct NewWatchEntry {
    pub user_id: UserId,
    pub stock_id: StockId,
    pub added_price: Option<Decimal>,
    pub added_date: NaiveDate,
    pub current_price: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Buy => "buy",
            TransactionKind::Sell => "sell",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy" => Ok(TransactionKind::Buy),
            "sell" => Ok(TransactionKind::Sell),
            other => Err(format!("unknown transaction type `{}`", other)),
        }
    }
}

/// Append-only audit record of a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub stock_id: StockId,
    pub shares: u32,
    pub price: Decimal,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub stock_id: StockId,
    pub shares: u32,
    pub price: Decimal,
    pub date: NaiveDate,
    pub kind: TransactionKind,
}

/// Sorts newest first by trade date; same-day records keep the most recent first.
pub fn sort_newest_first(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
}
