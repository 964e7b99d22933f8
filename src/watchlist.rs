// src/watchlist.rs
use crate::auth::CurrentUser;
use crate::error::StoreError;
use crate::models::{NewWatchEntry, Stock, WatchEntry, WatchEntryId};
use crate::store::Store;
use chrono::NaiveDate;

/// Adds `stock` to the user's watchlist unless it is already there.
/// Returns the new entry, or `None` when nothing was added.
pub async fn add(
    store: &dyn Store,
    user: &CurrentUser,
    stock: &Stock,
    today: NaiveDate,
) -> Result<Option<WatchEntry>, StoreError> {
    if store.watch_entry_for(user.id(), stock.id).await?.is_some() {
        return Ok(None);
    }
    let entry = store
        .create_watch_entry(NewWatchEntry {
            user_id: user.id(),
            stock_id: stock.id,
            added_price: Some(stock.current_price),
            added_date: today,
            current_price: Some(stock.current_price),
        })
        .await?;
    Ok(Some(entry))
}

/// Removes one of the user's entries. `false` means there was no such entry.
pub async fn remove(
    store: &dyn Store,
    user: &CurrentUser,
    id: WatchEntryId,
) -> Result<bool, StoreError> {
    store.delete_watch_entry(user.id(), id).await
}
