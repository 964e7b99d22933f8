use chrono::NaiveDate;
use rust_decimal::Decimal;
use scrooge_capital::auth::CurrentUser;
use scrooge_capital::ledger::{apply_trade, TradeAction, TradeOrder, TradeOutcome};
use scrooge_capital::models::{NewStock, NewUser, Stock, TransactionKind};
use scrooge_capital::store::{MemoryStore, Store};
use scrooge_capital::watchlist;
use std::num::NonZeroU32;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, d).unwrap()
}

async fn setup() -> (MemoryStore, CurrentUser, Stock) {
    let store = MemoryStore::new();
    let profile = store
        .create_user(NewUser {
            username: "scrooge".to_string(),
            password_hash: "sha256$00$00".to_string(),
            first_name: "Scrooge".to_string(),
            last_name: "McDuck".to_string(),
            email: "scrooge@duckburg.com".to_string(),
            dob: None,
        })
        .await
        .unwrap();
    let stock = store
        .create_stock(NewStock {
            ticker: "AAPL".to_string(),
            company_name: "Apple Inc.".to_string(),
            current_price: Decimal::new(15000, 2),
        })
        .await
        .unwrap();
    (store, CurrentUser { profile }, stock)
}

fn order(stock: &Stock, action: TradeAction, shares: u32) -> TradeOrder {
    TradeOrder {
        stock: stock.clone(),
        action,
        shares: NonZeroU32::new(shares).unwrap(),
    }
}

#[tokio::test]
async fn buy_opens_position_and_records_transaction() {
    let (store, user, stock) = setup().await;

    let outcome = apply_trade(&store, &user, &order(&stock, TradeAction::Buy, 10), day(1))
        .await
        .unwrap();

    let TradeOutcome::Bought(holding) = outcome else {
        panic!("expected a buy, got {:?}", outcome);
    };
    assert_eq!(holding.shares, 10);
    assert_eq!(holding.purchase_price, Decimal::new(15000, 2));
    assert_eq!(holding.purchase_date, day(1));

    let transactions = store.transactions(user.id()).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, TransactionKind::Buy);
    assert_eq!(transactions[0].shares, 10);
    assert_eq!(transactions[0].price, Decimal::new(15000, 2));
}

#[tokio::test]
async fn later_buy_takes_new_price_but_keeps_purchase_date() {
    let (store, user, stock) = setup().await;
    apply_trade(&store, &user, &order(&stock, TradeAction::Buy, 10), day(1))
        .await
        .unwrap();

    store
        .update_stock_price(stock.id, Decimal::new(16000, 2))
        .await
        .unwrap();
    let repriced = store.stock(stock.id).await.unwrap().unwrap();
    apply_trade(&store, &user, &order(&repriced, TradeAction::Buy, 5), day(2))
        .await
        .unwrap();

    let holding = store.holding(user.id(), stock.id).await.unwrap().unwrap();
    assert_eq!(holding.shares, 15);
    assert_eq!(holding.purchase_price, Decimal::new(16000, 2));
    assert_eq!(holding.purchase_date, day(1));
}

#[tokio::test]
async fn partial_sell_keeps_remaining_shares() {
    let (store, user, stock) = setup().await;
    apply_trade(&store, &user, &order(&stock, TradeAction::Buy, 10), day(1))
        .await
        .unwrap();

    let outcome = apply_trade(&store, &user, &order(&stock, TradeAction::Sell, 4), day(2))
        .await
        .unwrap();

    assert!(matches!(outcome, TradeOutcome::Sold(ref h) if h.shares == 6));
    let transactions = store.transactions(user.id()).await.unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0].kind, TransactionKind::Sell);
    assert_eq!(transactions[0].shares, 4);
    assert_eq!(transactions[0].date, day(2));
}

#[tokio::test]
async fn selling_everything_removes_holding_without_a_transaction() {
    let (store, user, stock) = setup().await;
    apply_trade(&store, &user, &order(&stock, TradeAction::Buy, 10), day(1))
        .await
        .unwrap();

    let outcome = apply_trade(&store, &user, &order(&stock, TradeAction::Sell, 10), day(2))
        .await
        .unwrap();

    assert_eq!(outcome, TradeOutcome::Liquidated);
    assert!(store.holding(user.id(), stock.id).await.unwrap().is_none());
    let transactions = store.transactions(user.id()).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].kind, TransactionKind::Buy);
}

#[tokio::test]
async fn overselling_changes_nothing() {
    let (store, user, stock) = setup().await;
    apply_trade(&store, &user, &order(&stock, TradeAction::Buy, 3), day(1))
        .await
        .unwrap();

    let outcome = apply_trade(&store, &user, &order(&stock, TradeAction::Sell, 5), day(2))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        TradeOutcome::Rejected {
            held: 3,
            requested: 5
        }
    );
    let holding = store.holding(user.id(), stock.id).await.unwrap().unwrap();
    assert_eq!(holding.shares, 3);
    assert_eq!(store.transactions(user.id()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn selling_unowned_stock_leaves_no_holding() {
    let (store, user, stock) = setup().await;

    let outcome = apply_trade(&store, &user, &order(&stock, TradeAction::Sell, 1), day(1))
        .await
        .unwrap();

    assert_eq!(outcome, TradeOutcome::Discarded);
    assert!(store.holdings(user.id()).await.unwrap().is_empty());
    assert!(store.transactions(user.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn buy_sell_buy_scenario() {
    let (store, user, stock) = setup().await;
    let steps = [
        (TradeAction::Buy, 10, 10),
        (TradeAction::Sell, 4, 6),
        (TradeAction::Buy, 2, 8),
    ];
    for (i, (action, shares, expected)) in steps.into_iter().enumerate() {
        apply_trade(&store, &user, &order(&stock, action, shares), day(1 + i as u32))
            .await
            .unwrap();
        let holding = store.holding(user.id(), stock.id).await.unwrap().unwrap();
        assert_eq!(holding.shares, expected, "after step {}", i + 1);
    }

    let kinds: Vec<_> = store
        .transactions(user.id())
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.kind, t.shares))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (TransactionKind::Buy, 2),
            (TransactionKind::Sell, 4),
            (TransactionKind::Buy, 10)
        ]
    );
}

#[tokio::test]
async fn watching_twice_adds_one_entry() {
    let (store, user, stock) = setup().await;

    let first = watchlist::add(&store, &user, &stock, day(1)).await.unwrap();
    let second = watchlist::add(&store, &user, &stock, day(2)).await.unwrap();

    let entry = first.unwrap();
    assert!(second.is_none());
    assert_eq!(entry.added_price, Some(stock.current_price));
    assert_eq!(store.watchlist(user.id()).await.unwrap().len(), 1);

    assert!(watchlist::remove(&store, &user, entry.id).await.unwrap());
    assert!(!watchlist::remove(&store, &user, entry.id).await.unwrap());
}

#[tokio::test]
async fn aapl_ten_share_scenarios() {
    use scrooge_capital::models::Holding;

    let seeded = |user: &CurrentUser, stock: &Stock| Holding {
        user_id: user.id(),
        stock_id: stock.id,
        shares: 10,
        purchase_price: Decimal::new(15000, 2),
        purchase_date: day(1),
    };

    // Sell all ten: holding gone, nothing recorded.
    let (store, user, stock) = setup().await;
    store.save_holding(&seeded(&user, &stock)).await.unwrap();
    apply_trade(&store, &user, &order(&stock, TradeAction::Sell, 10), day(2))
        .await
        .unwrap();
    assert!(store.holding(user.id(), stock.id).await.unwrap().is_none());
    assert!(store.transactions(user.id()).await.unwrap().is_empty());

    // Sell four: six left, one sell of four.
    let (store, user, stock) = setup().await;
    store.save_holding(&seeded(&user, &stock)).await.unwrap();
    apply_trade(&store, &user, &order(&stock, TradeAction::Sell, 4), day(2))
        .await
        .unwrap();
    let holding = store.holding(user.id(), stock.id).await.unwrap().unwrap();
    assert_eq!(holding.shares, 6);
    let transactions = store.transactions(user.id()).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(
        (transactions[0].kind, transactions[0].shares),
        (TransactionKind::Sell, 4)
    );

    // Buy five with no holding: new position of five, one buy of five.
    let (store, user, stock) = setup().await;
    apply_trade(&store, &user, &order(&stock, TradeAction::Buy, 5), day(2))
        .await
        .unwrap();
    let holding = store.holding(user.id(), stock.id).await.unwrap().unwrap();
    assert_eq!(holding.shares, 5);
    let transactions = store.transactions(user.id()).await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(
        (transactions[0].kind, transactions[0].shares),
        (TransactionKind::Buy, 5)
    );
}

#[tokio::test]
async fn buy_past_share_limit_changes_nothing() {
    let (store, user, stock) = setup().await;
    let big = 3_000_000_000;
    apply_trade(&store, &user, &order(&stock, TradeAction::Buy, big), day(1))
        .await
        .unwrap();

    let outcome = apply_trade(&store, &user, &order(&stock, TradeAction::Buy, big), day(2))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        TradeOutcome::Overflow {
            held: big,
            requested: big
        }
    );
    let holding = store.holding(user.id(), stock.id).await.unwrap().unwrap();
    let bought: u64 = store
        .transactions(user.id())
        .await
        .unwrap()
        .iter()
        .map(|t| u64::from(t.shares))
        .sum();
    assert_eq!(holding.shares, big);
    assert_eq!(bought, u64::from(holding.shares));
}

#[tokio::test]
async fn selling_from_a_stored_empty_holding_removes_it() {
    use scrooge_capital::models::Holding;

    let (store, user, stock) = setup().await;
    store
        .save_holding(&Holding {
            user_id: user.id(),
            stock_id: stock.id,
            shares: 0,
            purchase_price: stock.current_price,
            purchase_date: day(1),
        })
        .await
        .unwrap();

    let outcome = apply_trade(&store, &user, &order(&stock, TradeAction::Sell, 2), day(2))
        .await
        .unwrap();

    assert_eq!(outcome, TradeOutcome::Discarded);
    assert!(store.holding(user.id(), stock.id).await.unwrap().is_none());
    assert!(store.transactions(user.id()).await.unwrap().is_empty());
}

#[tokio::test]
async fn trades_record_prices_to_the_cent() {
    let (store, user, _) = setup().await;
    let stock = store
        .create_stock(NewStock {
            ticker: "MSFT".to_string(),
            company_name: "Microsoft Corporation".to_string(),
            current_price: Decimal::new(410125, 3),
        })
        .await
        .unwrap();

    apply_trade(&store, &user, &order(&stock, TradeAction::Buy, 1), day(1))
        .await
        .unwrap();

    let transactions = store.transactions(user.id()).await.unwrap();
    assert_eq!(transactions[0].price.to_string(), "410.12");
    let holding = store.holding(user.id(), stock.id).await.unwrap().unwrap();
    assert_eq!(holding.purchase_price.scale(), 2);
}
