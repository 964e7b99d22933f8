use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use scrooge_capital::api;
use scrooge_capital::auth::{hash_password, TokenSigner, SESSION_COOKIE};
use scrooge_capital::models::{NewPriceHistory, NewStock, NewUser, Stock, UserProfile};
use scrooge_capital::store::{MemoryStore, Store};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::Filter;

const FORM: &str = "application/x-www-form-urlencoded";

struct App {
    store: Arc<MemoryStore>,
    signer: Arc<TokenSigner>,
    user: UserProfile,
    stocks: Vec<Stock>,
}

impl App {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let signer = Arc::new(TokenSigner::new("test-secret", Duration::hours(1)));
        let user = store
            .create_user(NewUser {
                username: "scrooge".to_string(),
                password_hash: hash_password("numberone"),
                first_name: "Scrooge".to_string(),
                last_name: "McDuck".to_string(),
                email: "scrooge@duckburg.com".to_string(),
                dob: None,
            })
            .await
            .unwrap();
        let mut stocks = Vec::new();
        for (ticker, name, cents) in [
            ("AAPL", "Apple Inc.", 15000),
            ("AMZN", "Amazon.com, Inc.", 18000),
            ("GOOGL", "Alphabet Inc.", 16500),
            ("MSFT", "Microsoft Corporation", 41050),
        ] {
            let stock = store
                .create_stock(NewStock {
                    ticker: ticker.to_string(),
                    company_name: name.to_string(),
                    current_price: Decimal::new(cents, 2),
                })
                .await
                .unwrap();
            stocks.push(stock);
        }
        Self {
            store,
            signer,
            user,
            stocks,
        }
    }

    fn routes(
        &self,
    ) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone + 'static
    {
        let store: Arc<dyn Store> = self.store.clone();
        api::routes(store, self.signer.clone())
    }

    fn cookie(&self) -> String {
        let token = self.signer.issue(self.user.id).unwrap();
        format!("{}={}", SESSION_COOKIE, token)
    }

    async fn get(&self, path: &str) -> warp::http::Response<Bytes> {
        warp::test::request()
            .method("GET")
            .path(path)
            .header("cookie", self.cookie())
            .reply(&self.routes())
            .await
    }

    async fn post(&self, path: &str, body: &str) -> warp::http::Response<Bytes> {
        warp::test::request()
            .method("POST")
            .path(path)
            .header("cookie", self.cookie())
            .header("content-type", FORM)
            .body(body.to_string())
            .reply(&self.routes())
            .await
    }
}

fn location(res: &warp::http::Response<Bytes>) -> &str {
    res.headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

fn body(res: &warp::http::Response<Bytes>) -> String {
    String::from_utf8_lossy(res.body()).into_owned()
}

#[tokio::test]
async fn anonymous_requests_are_sent_to_login() {
    let app = App::new().await;

    let res = warp::test::request()
        .method("GET")
        .path("/portfolio/")
        .reply(&app.routes())
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login/?next=%2Fportfolio%2F");
}

#[tokio::test]
async fn login_target_keeps_the_query_string() {
    let app = App::new().await;

    let res = warp::test::request()
        .method("GET")
        .path("/stocks/?page=2")
        .reply(&app.routes())
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    let target = location(&res).to_string();
    assert_eq!(target, "/login/?next=%2Fstocks%2F%3Fpage%3D2");

    let login = warp::test::request()
        .method("GET")
        .path(&target)
        .reply(&app.routes())
        .await;
    assert!(body(&login).contains(r#"name="next" value="/stocks/?page=2""#));
}

#[tokio::test]
async fn forged_session_is_treated_as_anonymous() {
    let app = App::new().await;
    let other = TokenSigner::new("another-secret", Duration::hours(1));
    let token = other.issue(app.user.id).unwrap();

    let res = warp::test::request()
        .method("GET")
        .path("/watchlist/")
        .header("cookie", format!("{}={}", SESSION_COOKIE, token))
        .reply(&app.routes())
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login/?next=%2Fwatchlist%2F");
}

#[tokio::test]
async fn login_sets_session_and_follows_next() {
    let app = App::new().await;

    let res = warp::test::request()
        .method("POST")
        .path("/login/")
        .header("content-type", FORM)
        .body("username=scrooge&password=numberone&next=%2Fwatchlist%2F")
        .reply(&app.routes())
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/watchlist/");
    let cookie = res.headers()["set-cookie"].to_str().unwrap();
    assert!(cookie.starts_with(&format!("{}=", SESSION_COOKIE)));
}

#[tokio::test]
async fn wrong_password_re_renders_login() {
    let app = App::new().await;

    let res = warp::test::request()
        .method("POST")
        .path("/login/")
        .header("content-type", FORM)
        .body("username=scrooge&password=nickel")
        .reply(&app.routes())
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("set-cookie").is_none());
    assert!(body(&res).contains("Please enter a correct username and password."));
}

#[tokio::test]
async fn signup_logs_the_new_user_in() {
    let app = App::new().await;
    let form = "username=donald&password1=quackquack&password2=quackquack\
                &first_name=Donald&last_name=Duck&email=donald%40duckburg.com&dob=1934-06-09";

    let res = warp::test::request()
        .method("POST")
        .path("/signup/")
        .header("content-type", FORM)
        .body(form)
        .reply(&app.routes())
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    let cookie = res.headers()["set-cookie"].to_str().unwrap();
    let session = cookie.split(';').next().unwrap().to_string();

    let res = warp::test::request()
        .method("GET")
        .path("/profile/")
        .header("cookie", session)
        .reply(&app.routes())
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body(&res).contains("Donald Duck"));
}

#[tokio::test]
async fn signup_with_taken_username_shows_error() {
    let app = App::new().await;
    let form = "username=scrooge&password1=quackquack&password2=quackquack\
                &first_name=Other&last_name=Duck&email=other%40duckburg.com&dob=1934-06-09";

    let res = warp::test::request()
        .method("POST")
        .path("/signup/")
        .header("content-type", FORM)
        .body(form)
        .reply(&app.routes())
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body(&res).contains("a user with that username already exists"));
}

#[tokio::test]
async fn buying_through_the_portfolio_form() {
    let app = App::new().await;
    let apple = &app.stocks[0];

    let res = app
        .post("/portfolio/", &format!("stock={}&action=buy&shares=3", apple.id))
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/portfolio/");
    let holding = app
        .store
        .holding(app.user.id, apple.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(holding.shares, 3);

    let page = body(&app.get("/portfolio/").await);
    assert!(page.contains("AAPL"));
    assert!(page.contains("450.00"));
}

#[tokio::test]
async fn invalid_trade_form_changes_nothing() {
    let app = App::new().await;
    let apple = &app.stocks[0];

    for form in [
        format!("stock={}&action=buy&shares=0", apple.id),
        format!("stock={}&action=hold&shares=1", apple.id),
        "stock=not-a-stock&action=buy&shares=1".to_string(),
        format!("stock={}&action=buy", apple.id),
    ] {
        let res = app.post("/portfolio/", &form).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER, "{}", form);
        assert_eq!(location(&res), "/portfolio/");
    }

    assert!(app.store.holdings(app.user.id).await.unwrap().is_empty());
    assert!(app.store.transactions(app.user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_stock_detail_is_not_found() {
    let app = App::new().await;

    let res = app.get("/stock/not-a-uuid/graphs/").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let missing = scrooge_capital::models::StockId::generate();
    let res = app.get(&format!("/stock/{}/graphs/", missing)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app.get(&format!("/stock/{}/graphs/", app.stocks[1].id)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(body(&res).contains("No price history available."));
}

#[tokio::test]
async fn stock_list_is_paginated() {
    let app = App::new().await;

    let first = body(&app.get("/stocks/").await);
    assert!(first.contains("AAPL") && first.contains("GOOGL"));
    assert!(!first.contains("MSFT"));

    let last = app.get("/stocks/?page=last").await;
    assert_eq!(last.status(), StatusCode::OK);
    assert!(body(&last).contains("MSFT"));

    for bad in ["3", "0", "abc"] {
        let res = app.get(&format!("/stocks/?page={}", bad)).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "page {}", bad);
    }
}

#[tokio::test]
async fn watchlist_add_is_idempotent_and_remove_is_scoped() {
    let app = App::new().await;
    let amazon = &app.stocks[1];
    let path = format!("/add-to-watchlist/{}/", amazon.id);

    for _ in 0..2 {
        let res = app.post(&path, "").await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "/stocks/");
    }
    let entries = app.store.watchlist(app.user.id).await.unwrap();
    assert_eq!(entries.len(), 1);

    let remove = format!("/watchlist/remove/{}/", entries[0].id);
    let res = app.post(&remove, "").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/watchlist/");

    let res = app.post(&remove, "").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn watching_an_unknown_stock_is_not_found() {
    let app = App::new().await;
    let missing = scrooge_capital::models::StockId::generate();

    let res = app.post(&format!("/add-to-watchlist/{}/", missing), "").await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(app.store.watchlist(app.user.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let app = App::new().await;

    let res = app.get("/logout/").await;

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers()["set-cookie"].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn stock_detail_summarises_the_earliest_history() {
    let app = App::new().await;
    let apple = &app.stocks[0];
    for (day, open, close, series) in [
        (2, 20000, 21000, "200,210"),
        (1, 14810, 15000, "[148.1, 151.3, 147.9, 150.0]"),
    ] {
        app.store
            .create_price_history(NewPriceHistory {
                stock_id: apple.id,
                date: NaiveDate::from_ymd_opt(2024, 11, day).unwrap(),
                open_price: Decimal::new(open, 2),
                close_price: Decimal::new(close, 2),
                region: "US".to_string(),
                instrument_type: "Equity".to_string(),
                series: series.to_string(),
            })
            .await
            .unwrap();
    }

    let res = app.get(&format!("/stock/{}/graphs/", apple.id)).await;

    assert_eq!(res.status(), StatusCode::OK);
    let page = body(&res);
    assert!(page.contains("<dt>Open</dt><dd>$148.10</dd>"));
    assert!(page.contains("<dt>Close</dt><dd>$150.00</dd>"));
    assert!(page.contains("<dt>Change</dt><dd>$1.90</dd>"));
    assert!(page.contains("<dt>High</dt><dd>$151.30</dd>"));
    assert!(page.contains("<dt>Low</dt><dd>$147.90</dd>"));
    assert!(page.contains("<dt>Region</dt><dd>US</dd>"));
    assert!(page.contains("<dt>Type</dt><dd>Equity</dd>"));
    assert!(page.contains("<svg"));
    assert!(page.contains("Apple Inc. (AAPL) - 12-Hour Price History"));
    assert!(page.contains("rgb(0, 200, 5)"));
    assert!(!page.contains("$200.00"));
}

#[tokio::test]
async fn transactions_page_lists_newest_first() {
    let app = App::new().await;
    let apple = &app.stocks[0];
    app.post("/portfolio/", &format!("stock={}&action=buy&shares=3", apple.id))
        .await;
    app.post("/portfolio/", &format!("stock={}&action=sell&shares=1", apple.id))
        .await;

    let res = app.get("/transactions/").await;

    assert_eq!(res.status(), StatusCode::OK);
    let page = body(&res);
    let sell = page
        .find("<td>sell</td><td>AAPL</td><td>1</td><td>$150.00</td><td>$150.00</td>")
        .expect("sell row");
    let buy = page
        .find("<td>buy</td><td>AAPL</td><td>3</td><td>$150.00</td><td>$450.00</td>")
        .expect("buy row");
    assert!(sell < buy);
}

#[tokio::test]
async fn watchlist_page_shows_watched_stocks() {
    let app = App::new().await;
    let google = &app.stocks[2];
    app.post(&format!("/add-to-watchlist/{}/", google.id), "").await;

    let res = app.get("/watchlist/").await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body(&res).contains("Alphabet Inc."));
}

#[tokio::test]
async fn profile_update_saves_changes() {
    let app = App::new().await;

    let res = app
        .post(
            "/profile/",
            "first_name=Uncle&last_name=Scrooge&email=uncle%40duckburg.com&dob=1867-07-01",
        )
        .await;

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/profile/");
    let saved = app.store.user(app.user.id).await.unwrap().unwrap();
    assert_eq!(saved.full_name(), "Uncle Scrooge");
    assert_eq!(saved.email, "uncle@duckburg.com");
    assert_eq!(saved.dob, NaiveDate::from_ymd_opt(1867, 7, 1));
    assert_eq!(saved.username, "scrooge");
}

#[tokio::test]
async fn profile_update_with_taken_email_shows_error() {
    let app = App::new().await;
    app.store
        .create_user(NewUser {
            username: "donald".to_string(),
            password_hash: hash_password("quackquack"),
            first_name: "Donald".to_string(),
            last_name: "Duck".to_string(),
            email: "donald@duckburg.com".to_string(),
            dob: None,
        })
        .await
        .unwrap();

    let res = app
        .post(
            "/profile/",
            "first_name=Scrooge&last_name=McDuck&email=donald%40duckburg.com&dob=1867-07-01",
        )
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    assert!(body(&res).contains("email: a user with that email already exists"));
    let saved = app.store.user(app.user.id).await.unwrap().unwrap();
    assert_eq!(saved.email, "scrooge@duckburg.com");
}
