// src/api.rs
use crate::auth::{self, CurrentUser, TokenSigner, SESSION_COOKIE};
use crate::error::{ApiError, AuthError, FormError, StoreError};
use crate::forms::{safe_next, Fields, LoginForm, ProfileForm, SignupForm, TradeForm};
use crate::ledger::{self, TradeOrder, TradeOutcome};
use crate::models::{NewUser, StockId, WatchEntryId};
use crate::store::Store;
use crate::views::{self, STOCKS_PER_PAGE};
use crate::{pages, watchlist};
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::path::FullPath;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

const FORM_LIMIT: u64 = 16 * 1024;

#[derive(Deserialize)]
struct PageQuery {
    page: Option<String>,
}

#[derive(Deserialize)]
struct NextQuery {
    next: Option<String>,
}

pub fn routes(
    store: Arc<dyn Store>,
    signer: Arc<TokenSigner>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let user = with_user(store.clone(), signer.clone());

    let home = warp::path::end()
        .and(warp::get())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(home_handler);

    let portfolio = warp::path!("portfolio")
        .and(warp::get())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(portfolio_handler);

    let trade = warp::path!("portfolio")
        .and(warp::post())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and(form_body())
        .and_then(trade_handler);

    let watchlist = warp::path!("watchlist")
        .and(warp::get())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(watchlist_handler);

    let remove_from_watchlist = warp::path!("watchlist" / "remove" / String)
        .and(warp::post())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(remove_from_watchlist_handler);

    let add_to_watchlist = warp::path!("add-to-watchlist" / String)
        .and(warp::post())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(add_to_watchlist_handler);

    let transactions = warp::path!("transactions")
        .and(warp::get())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(transactions_handler);

    let profile = warp::path!("profile")
        .and(warp::get())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(profile_handler);

    let update_profile = warp::path!("profile")
        .and(warp::post())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and(form_body())
        .and_then(update_profile_handler);

    let stock_detail = warp::path!("stock" / String / "graphs")
        .and(warp::get())
        .and(user.clone())
        .and(with_store(store.clone()))
        .and_then(stock_detail_handler);

    let stock_list = warp::path!("stocks")
        .and(warp::get())
        .and(user)
        .and(with_store(store.clone()))
        .and(warp::query::<PageQuery>())
        .and_then(stock_list_handler);

    let login_page = warp::path!("login")
        .and(warp::get())
        .and(warp::query::<NextQuery>())
        .and_then(login_page_handler);

    let login = warp::path!("login")
        .and(warp::post())
        .and(with_store(store.clone()))
        .and(with_signer(signer.clone()))
        .and(form_body())
        .and_then(login_handler);

    let logout = warp::path!("logout")
        .and(warp::get().or(warp::post()).unify())
        .and(with_signer(signer.clone()))
        .and_then(logout_handler);

    let signup_page = warp::path!("signup")
        .and(warp::get())
        .and_then(signup_page_handler);

    let signup = warp::path!("signup")
        .and(warp::post())
        .and(with_store(store))
        .and(with_signer(signer))
        .and(form_body())
        .and_then(signup_handler);

    home.or(portfolio)
        .or(trade)
        .or(watchlist)
        .or(remove_from_watchlist)
        .or(add_to_watchlist)
        .or(transactions)
        .or(profile)
        .or(update_profile)
        .or(stock_detail)
        .or(stock_list)
        .or(login_page)
        .or(login)
        .or(logout)
        .or(signup_page)
        .or(signup)
        .recover(handle_rejection)
}

fn with_store(
    store: Arc<dyn Store>,
) -> impl Filter<Extract = (Arc<dyn Store>,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn with_signer(
    signer: Arc<TokenSigner>,
) -> impl Filter<Extract = (Arc<TokenSigner>,), Error = Infallible> + Clone {
    warp::any().map(move || signer.clone())
}

fn form_body() -> impl Filter<Extract = (Fields,), Error = Rejection> + Clone {
    warp::body::content_length_limit(FORM_LIMIT).and(warp::body::form::<Fields>())
}

/// Resolves the session cookie into the [`CurrentUser`], or rejects with
/// [`ApiError::Unauthenticated`] carrying the requested path and query.
fn with_user(
    store: Arc<dyn Store>,
    signer: Arc<TokenSigner>,
) -> impl Filter<Extract = (CurrentUser,), Error = Rejection> + Clone {
    let query = warp::query::raw()
        .or(warp::any().map(String::new))
        .unify();
    warp::path::full()
        .and(query)
        .and(warp::cookie::optional::<String>(SESSION_COOKIE))
        .and(with_store(store))
        .and(with_signer(signer))
        .and_then(current_user)
}

async fn current_user(
    path: FullPath,
    query: String,
    token: Option<String>,
    store: Arc<dyn Store>,
    signer: Arc<TokenSigner>,
) -> Result<CurrentUser, Rejection> {
    let unauthenticated = || {
        let next = if query.is_empty() {
            path.as_str().to_string()
        } else {
            format!("{}?{}", path.as_str(), query)
        };
        warp::reject::custom(ApiError::Unauthenticated { next })
    };
    let Some(token) = token else {
        return Err(unauthenticated());
    };
    match auth::resolve_session(store.as_ref(), &signer, &token).await {
        Ok(user) => Ok(user),
        Err(AuthError::Store(e)) => Err(reject(e)),
        Err(e) => {
            info!("Ignoring session cookie: {}", e);
            Err(unauthenticated())
        }
    }
}

fn reject(e: StoreError) -> Rejection {
    error!("Store request failed: {}", e);
    warp::reject::custom(ApiError::Store(e))
}

fn not_found() -> Rejection {
    warp::reject::custom(ApiError::NotFound)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn html(body: String) -> Response {
    warp::reply::html(body).into_response()
}

fn redirect(location: &str) -> Response {
    warp::reply::with_header(StatusCode::SEE_OTHER, "location", location).into_response()
}

fn with_cookie(response: Response, cookie: String) -> Response {
    warp::reply::with_header(response, "set-cookie", cookie).into_response()
}

async fn home_handler(user: CurrentUser, store: Arc<dyn Store>) -> Result<Response, Rejection> {
    let stocks = store.stocks().await.map_err(reject)?;
    Ok(html(pages::home(&user.profile, &stocks)))
}

async fn portfolio_handler(
    user: CurrentUser,
    store: Arc<dyn Store>,
) -> Result<Response, Rejection> {
    let view = views::portfolio(store.as_ref(), &user)
        .await
        .map_err(reject)?;
    Ok(html(pages::portfolio(&user.profile, &view)))
}

async fn trade_handler(
    user: CurrentUser,
    store: Arc<dyn Store>,
    fields: Fields,
) -> Result<Response, Rejection> {
    let form = match TradeForm::parse(&fields) {
        Ok(form) => form,
        Err(e) => {
            warn!("Invalid trade form from {}: {}", user.profile.username, e);
            return Ok(redirect("/portfolio/"));
        }
    };
    let Some(stock) = store.stock(form.stock_id).await.map_err(reject)? else {
        warn!(
            "Trade from {} names unknown stock {}",
            user.profile.username, form.stock_id
        );
        return Ok(redirect("/portfolio/"));
    };

    let order = TradeOrder {
        stock,
        action: form.action,
        shares: form.shares,
    };
    match ledger::apply_trade(store.as_ref(), &user, &order, today())
        .await
        .map_err(reject)?
    {
        TradeOutcome::Rejected { held, requested } => warn!(
            "{} tried to sell {} {} but holds {}",
            user.profile.username, requested, order.stock.ticker, held
        ),
        TradeOutcome::Overflow { held, requested } => warn!(
            "{} tried to buy {} {} on top of {}, too many shares",
            user.profile.username, requested, order.stock.ticker, held
        ),
        outcome => info!(
            "Trade applied for {} on {}: {:?}",
            user.profile.username, order.stock.ticker, outcome
        ),
    }
    Ok(redirect("/portfolio/"))
}

async fn watchlist_handler(
    user: CurrentUser,
    store: Arc<dyn Store>,
) -> Result<Response, Rejection> {
    let rows = views::watchlist(store.as_ref(), &user)
        .await
        .map_err(reject)?;
    Ok(html(pages::watchlist(&user.profile, &rows)))
}

async fn remove_from_watchlist_handler(
    id: String,
    user: CurrentUser,
    store: Arc<dyn Store>,
) -> Result<Response, Rejection> {
    let id: WatchEntryId = id.parse().map_err(|_| not_found())?;
    if !watchlist::remove(store.as_ref(), &user, id)
        .await
        .map_err(reject)?
    {
        return Err(not_found());
    }
    info!("Removed watchlist entry {} for {}", id, user.profile.username);
    Ok(redirect("/watchlist/"))
}

async fn add_to_watchlist_handler(
    stock_id: String,
    user: CurrentUser,
    store: Arc<dyn Store>,
) -> Result<Response, Rejection> {
    let stock_id: StockId = stock_id.parse().map_err(|_| not_found())?;
    let stock = store
        .stock(stock_id)
        .await
        .map_err(reject)?
        .ok_or_else(not_found)?;
    if watchlist::add(store.as_ref(), &user, &stock, today())
        .await
        .map_err(reject)?
        .is_some()
    {
        info!("{} is now watching {}", user.profile.username, stock.ticker);
    }
    Ok(redirect("/stocks/"))
}

async fn transactions_handler(
    user: CurrentUser,
    store: Arc<dyn Store>,
) -> Result<Response, Rejection> {
    let rows = views::transactions(store.as_ref(), &user)
        .await
        .map_err(reject)?;
    Ok(html(pages::transactions(&user.profile, &rows)))
}

async fn render_profile(
    user: &CurrentUser,
    store: &dyn Store,
    errors: &[FormError],
) -> Result<Response, Rejection> {
    let stocks = store.stocks().await.map_err(reject)?;
    let rows = views::transactions(store, user).await.map_err(reject)?;
    Ok(html(pages::profile(&user.profile, &stocks, &rows, errors)))
}

async fn profile_handler(user: CurrentUser, store: Arc<dyn Store>) -> Result<Response, Rejection> {
    render_profile(&user, store.as_ref(), &[]).await
}

async fn update_profile_handler(
    user: CurrentUser,
    store: Arc<dyn Store>,
    fields: Fields,
) -> Result<Response, Rejection> {
    let form = match ProfileForm::parse(&fields) {
        Ok(form) => form,
        Err(errors) => return render_profile(&user, store.as_ref(), &errors).await,
    };
    let updated = form.apply(&user.profile);
    match store.update_profile(&updated).await {
        Ok(()) => {
            info!("Updated profile of {}", user.profile.username);
            Ok(redirect("/profile/"))
        }
        Err(StoreError::Conflict { .. }) => {
            let errors = [FormError::Invalid {
                field: "email",
                reason: "a user with that email already exists".to_string(),
            }];
            render_profile(&user, store.as_ref(), &errors).await
        }
        Err(e) => Err(reject(e)),
    }
}

async fn stock_detail_handler(
    id: String,
    user: CurrentUser,
    store: Arc<dyn Store>,
) -> Result<Response, Rejection> {
    let id: StockId = id.parse().map_err(|_| not_found())?;
    let detail = views::stock_detail(store.as_ref(), &user, id)
        .await
        .map_err(reject)?
        .ok_or_else(not_found)?;
    Ok(html(pages::stock_detail(&user.profile, &detail)))
}

async fn stock_list_handler(
    user: CurrentUser,
    store: Arc<dyn Store>,
    query: PageQuery,
) -> Result<Response, Rejection> {
    let stocks = store.stocks().await.map_err(reject)?;
    let page = views::paginate(stocks, STOCKS_PER_PAGE, query.page.as_deref())
        .ok_or_else(not_found)?;
    Ok(html(pages::stock_list(&user.profile, &page)))
}

async fn login_page_handler(query: NextQuery) -> Result<Response, Rejection> {
    let next = safe_next(query.next.as_deref());
    Ok(html(pages::login(&[], "", next.as_deref(), false)))
}

async fn login_handler(
    store: Arc<dyn Store>,
    signer: Arc<TokenSigner>,
    fields: Fields,
) -> Result<Response, Rejection> {
    let username = fields.get("username").cloned().unwrap_or_default();
    let next = safe_next(fields.get("next").map(String::as_str));
    let form = match LoginForm::parse(&fields) {
        Ok(form) => form,
        Err(errors) => return Ok(html(pages::login(&errors, &username, next.as_deref(), false))),
    };

    match auth::authenticate(store.as_ref(), &form.username, &form.password).await {
        Ok(user) => {
            let token = signer
                .issue(user.id())
                .map_err(|e| warp::reject::custom(ApiError::Auth(e)))?;
            info!("{} logged in", user.profile.username);
            let target = form.next.as_deref().unwrap_or("/");
            Ok(with_cookie(redirect(target), signer.session_cookie(&token)))
        }
        Err(AuthError::Store(e)) => Err(reject(e)),
        Err(e) => {
            info!("Failed login for {}: {}", form.username, e);
            Ok(html(pages::login(&[], &form.username, form.next.as_deref(), true)))
        }
    }
}

async fn logout_handler(signer: Arc<TokenSigner>) -> Result<Response, Rejection> {
    Ok(with_cookie(html(pages::logged_out()), signer.cleared_cookie()))
}

async fn signup_page_handler() -> Result<Response, Rejection> {
    Ok(html(pages::signup(&[], &Fields::new())))
}

async fn signup_handler(
    store: Arc<dyn Store>,
    signer: Arc<TokenSigner>,
    fields: Fields,
) -> Result<Response, Rejection> {
    let form = match SignupForm::parse(&fields) {
        Ok(form) => form,
        Err(errors) => return Ok(html(pages::signup(&errors, &fields))),
    };

    let created = store
        .create_user(NewUser {
            username: form.username,
            password_hash: auth::hash_password(&form.password),
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            dob: Some(form.dob),
        })
        .await;
    let profile = match created {
        Ok(profile) => profile,
        Err(StoreError::Conflict { entity, .. }) => {
            let field = if entity == "email" { "email" } else { "username" };
            let errors = [FormError::Invalid {
                field,
                reason: format!("a user with that {} already exists", field),
            }];
            return Ok(html(pages::signup(&errors, &fields)));
        }
        Err(e) => return Err(reject(e)),
    };

    info!("New user signed up: {}", profile.username);
    let token = signer
        .issue(profile.id)
        .map_err(|e| warp::reject::custom(ApiError::Auth(e)))?;
    Ok(with_cookie(redirect("/"), signer.session_cookie(&token)))
}

fn status_page(body: String, status: StatusCode) -> Response {
    warp::reply::with_status(warp::reply::html(body), status).into_response()
}

fn login_redirect(next: &str) -> Response {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => redirect(&format!("/login/?{}", query)),
        Err(e) => {
            warn!("Cannot encode login target {}: {}", next, e);
            redirect("/login/")
        }
    }
}

pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(api_error) = err.find::<ApiError>() {
        return Ok(match api_error {
            ApiError::Unauthenticated { next } => login_redirect(next),
            ApiError::NotFound => status_page(pages::not_found(), StatusCode::NOT_FOUND),
            ApiError::Store(_) | ApiError::Auth(_) => {
                status_page(pages::server_error(), StatusCode::INTERNAL_SERVER_ERROR)
            }
        });
    }
    if err.is_not_found() {
        return Ok(status_page(pages::not_found(), StatusCode::NOT_FOUND));
    }
    if let Some(e) = err.find::<BodyDeserializeError>() {
        warn!("Unreadable form body: {}", e);
        return Ok(StatusCode::BAD_REQUEST.into_response());
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(StatusCode::PAYLOAD_TOO_LARGE.into_response());
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }
    error!("Unhandled rejection: {:?}", err);
    Ok(status_page(
        pages::server_error(),
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}
