// src/ledger.rs
use crate::auth::CurrentUser;
use crate::error::StoreError;
use crate::models::{Holding, HoldingDefaults, NewTransaction, Stock, TransactionKind};
use crate::store::Store;
use chrono::NaiveDate;
use std::num::NonZeroU32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

/// A validated trade instruction.
#[derive(Debug, Clone)]
pub struct TradeOrder {
    pub stock: Stock,
    pub action: TradeAction,
    pub shares: NonZeroU32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    /// Shares were added; carries the saved holding.
    Bought(Holding),
    /// Part of the position was sold; carries the saved holding.
    Sold(Holding),
    /// The position was sold down to zero and removed.
    Liquidated,
    /// A sell against an empty position; the empty holding was removed.
    Discarded,
    /// Not enough shares to cover the sell. Nothing changed.
    Rejected { held: u32, requested: u32 },
    /// The buy would overflow the share count. Nothing changed.
    Overflow { held: u32, requested: u32 },
}

/// Applies `order` at the stock's current price. Selling down to exactly zero
/// deletes the holding and records no transaction.
pub async fn apply_trade(
    store: &dyn Store,
    user: &CurrentUser,
    order: &TradeOrder,
    today: NaiveDate,
) -> Result<TradeOutcome, StoreError> {
    let stock = &order.stock;
    let requested = order.shares.get();
    let mut holding = store
        .get_or_create_holding(
            user.id(),
            stock.id,
            HoldingDefaults {
                shares: 0,
                purchase_price: stock.current_price,
                purchase_date: today,
            },
        )
        .await?;

    match order.action {
        TradeAction::Buy => {
            let Some(shares) = holding.shares.checked_add(requested) else {
                return Ok(TradeOutcome::Overflow {
                    held: holding.shares,
                    requested,
                });
            };
            holding.shares = shares;
            holding.purchase_price = stock.current_price;
            record(store, user, stock, requested, TransactionKind::Buy, today).await?;
        }
        TradeAction::Sell => {
            if holding.shares == 0 {
                store.delete_holding(user.id(), stock.id).await?;
                return Ok(TradeOutcome::Discarded);
            }
            if holding.shares < requested {
                return Ok(TradeOutcome::Rejected {
                    held: holding.shares,
                    requested,
                });
            }

            holding.shares -= requested;
            if holding.shares == 0 {
                store.delete_holding(user.id(), stock.id).await?;
                return Ok(TradeOutcome::Liquidated);
            }
            record(store, user, stock, requested, TransactionKind::Sell, today).await?;
        }
    }

    store.save_holding(&holding).await?;
    Ok(match order.action {
        TradeAction::Buy => TradeOutcome::Bought(holding),
        TradeAction::Sell => TradeOutcome::Sold(holding),
    })
}

async fn record(
    store: &dyn Store,
    user: &CurrentUser,
    stock: &Stock,
    shares: u32,
    kind: TransactionKind,
    today: NaiveDate,
) -> Result<(), StoreError> {
    store
        .create_transaction(NewTransaction {
            user_id: user.id(),
            stock_id: stock.id,
            shares,
            price: stock.current_price,
            date: today,
            kind,
        })
        .await?;
    Ok(())
}
