// src/pages.rs
use crate::error::FormError;
use crate::models::{Stock, UserProfile};
use crate::views::{Page, PortfolioView, StockDetail, TransactionRow, WatchRow};
use std::fmt::Write;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, profile: Option<&UserProfile>, body: &str) -> String {
    let nav = match profile {
        Some(profile) => format!(
            r#"<a href="/">Home</a> | <a href="/stocks/">Stocks</a> | <a href="/portfolio/">Portfolio</a> | <a href="/watchlist/">Watchlist</a> | <a href="/transactions/">Transactions</a> | <a href="/profile/">{}</a> | <a href="/logout/">Log out</a>"#,
            escape(&profile.full_name())
        ),
        None => r#"<a href="/login/">Log in</a> | <a href="/signup/">Sign up</a>"#.to_string(),
    };
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\"><title>{} | Scrooge Capital</title></head>\
         <body><nav>{}</nav><main><h1>{}</h1>{}</main></body></html>",
        escape(title),
        nav,
        escape(title),
        body
    )
}

fn error_list(errors: &[FormError]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(&e.to_string())))
        .collect();
    format!(r#"<ul class="errors">{}</ul>"#, items)
}

fn input(kind: &str, name: &str, label: &str, value: &str) -> String {
    format!(
        r#"<p><label for="id_{name}">{label}</label> <input type="{kind}" name="{name}" id="id_{name}" value="{value}" class="form-control"></p>"#,
        kind = kind,
        name = name,
        label = label,
        value = escape(value)
    )
}

fn stock_table(stocks: &[Stock]) -> String {
    let mut html = String::from(
        "<table><tr><th>Ticker</th><th>Company</th><th>Price</th><th></th></tr>",
    );
    for stock in stocks {
        let _ = write!(
            html,
            r#"<tr><td><a href="/stock/{id}/graphs/">{ticker}</a></td><td>{name}</td><td>${price}</td><td><form method="post" action="/add-to-watchlist/{id}/"><button type="submit">Watch</button></form></td></tr>"#,
            id = stock.id,
            ticker = escape(&stock.ticker),
            name = escape(&stock.company_name),
            price = stock.current_price
        );
    }
    html.push_str("</table>");
    html
}

pub fn home(profile: &UserProfile, stocks: &[Stock]) -> String {
    let body = format!(
        "<p>Welcome back, {}.</p>{}",
        escape(&profile.first_name),
        stock_table(stocks)
    );
    layout("Home", Some(profile), &body)
}

pub fn portfolio(profile: &UserProfile, view: &PortfolioView) -> String {
    let mut body = String::from(
        "<table><tr><th>Ticker</th><th>Shares</th><th>Purchase price</th><th>Purchase date</th><th>Current price</th><th>Total value</th></tr>",
    );
    for row in &view.rows {
        let _ = write!(
            body,
            r#"<tr><td><a href="/stock/{}/graphs/">{}</a></td><td>{}</td><td>${}</td><td>{}</td><td>${}</td><td>${}</td></tr>"#,
            row.stock.id,
            escape(&row.stock.ticker),
            row.holding.shares,
            row.holding.purchase_price,
            row.holding.purchase_date,
            row.stock.current_price,
            row.total_value
        );
    }
    let _ = write!(
        body,
        "</table><p>Total shares: {}</p><p>Total value: ${}</p>",
        view.total_shares, view.total_value
    );

    body.push_str(r#"<h2>Buy / Sell</h2><form method="post" action="/portfolio/"><p><label for="id_stock">Stock</label> <select name="stock" id="id_stock">"#);
    for stock in &view.stocks {
        let _ = write!(
            body,
            r#"<option value="{}">{}</option>"#,
            stock.id,
            escape(&stock.to_string())
        );
    }
    body.push_str(
        r#"</select></p><p><label for="id_action">Action</label> <select name="action" id="id_action"><option value="buy">Buy</option><option value="sell">Sell</option></select></p><p><label for="id_shares">Shares</label> <input type="number" name="shares" id="id_shares" min="1" required></p><button type="submit">Submit</button></form>"#,
    );
    layout("Portfolio", Some(profile), &body)
}

pub fn watchlist(profile: &UserProfile, rows: &[WatchRow]) -> String {
    let mut body = String::from(
        "<table><tr><th>Ticker</th><th>Company</th><th>Added price</th><th>Added</th><th>Current price</th><th></th></tr>",
    );
    for row in rows {
        let added = row
            .entry
            .added_price
            .map_or_else(|| "-".to_string(), |p| format!("${}", p));
        let _ = write!(
            body,
            r#"<tr><td><a href="/stock/{sid}/graphs/">{ticker}</a></td><td>{name}</td><td>{added}</td><td>{date}</td><td>${current}</td><td><form method="post" action="/watchlist/remove/{eid}/"><button type="submit">Remove</button></form></td></tr>"#,
            sid = row.stock.id,
            ticker = escape(&row.stock.ticker),
            name = escape(&row.stock.company_name),
            added = added,
            date = row.entry.added_date,
            current = row.stock.current_price,
            eid = row.entry.id
        );
    }
    body.push_str("</table>");
    if rows.is_empty() {
        body.push_str("<p>Your watchlist is empty.</p>");
    }
    layout("Watchlist", Some(profile), &body)
}

fn transaction_table(rows: &[TransactionRow]) -> String {
    let mut html = String::from(
        "<table><tr><th>Date</th><th>Type</th><th>Ticker</th><th>Shares</th><th>Price</th><th>Total</th></tr>",
    );
    for row in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>${}</td><td>${}</td></tr>",
            row.transaction.date,
            row.transaction.kind,
            escape(&row.stock.ticker),
            row.transaction.shares,
            row.transaction.price,
            row.total()
        );
    }
    html.push_str("</table>");
    html
}

pub fn transactions(profile: &UserProfile, rows: &[TransactionRow]) -> String {
    let mut body = transaction_table(rows);
    if rows.is_empty() {
        body.push_str("<p>No transactions yet.</p>");
    }
    layout("Transactions", Some(profile), &body)
}

pub fn profile(
    profile: &UserProfile,
    stocks: &[Stock],
    rows: &[TransactionRow],
    errors: &[FormError],
) -> String {
    let dob = profile.dob.map(|d| d.to_string()).unwrap_or_default();
    let body = format!(
        r#"<dl><dt>Username</dt><dd>{username}</dd><dt>Name</dt><dd>{name}</dd><dt>Email</dt><dd>{email}</dd><dt>Date of birth</dt><dd>{dob}</dd></dl><h2>Update profile</h2>{errors}<form method="post" action="/profile/">{first}{last}{mail}{birth}<button type="submit">Save</button></form><h2>Stocks</h2>{stocks}<h2>Transactions</h2>{transactions}"#,
        username = escape(&profile.username),
        name = escape(&profile.full_name()),
        email = escape(&profile.email),
        dob = dob,
        errors = error_list(errors),
        first = input("text", "first_name", "First Name", &profile.first_name),
        last = input("text", "last_name", "Last Name", &profile.last_name),
        mail = input("email", "email", "Email", &profile.email),
        birth = input("date", "dob", "Date of Birth", &dob),
        stocks = stock_table(stocks),
        transactions = transaction_table(rows)
    );
    layout("Profile", Some(profile), &body)
}

pub fn stock_detail(profile: &UserProfile, detail: &StockDetail) -> String {
    let stock = &detail.stock;
    let mut body = format!(
        r#"<p>{} ({}) current price: ${}</p><p>Shares owned: {}</p><form method="post" action="/add-to-watchlist/{}/"><button type="submit">Add to watchlist</button></form>"#,
        escape(&stock.company_name),
        escape(&stock.ticker),
        stock.current_price,
        detail.shares_owned,
        stock.id
    );
    match &detail.summary {
        Some(summary) => {
            let _ = write!(
                body,
                "<dl><dt>Open</dt><dd>${}</dd><dt>Close</dt><dd>${}</dd><dt>Change</dt><dd>${}</dd><dt>High</dt><dd>${:.2}</dd><dt>Low</dt><dd>${:.2}</dd><dt>Region</dt><dd>{}</dd><dt>Type</dt><dd>{}</dd></dl><div class=\"chart\">{}</div>",
                summary.open_price,
                summary.close_price,
                summary.diff,
                summary.max_price,
                summary.min_price,
                escape(&summary.region),
                escape(&summary.instrument_type),
                summary.chart.to_svg()
            );
        }
        None => body.push_str("<p>No price history available.</p>"),
    }
    layout(&format!("{} ({})", stock.company_name, stock.ticker), Some(profile), &body)
}

pub fn stock_list(profile: &UserProfile, page: &Page<Stock>) -> String {
    let mut body = stock_table(&page.items);
    body.push_str("<nav class=\"pagination\">");
    if page.has_previous() {
        let _ = write!(
            body,
            r#"<a href="/stocks/?page=1">&laquo; first</a> <a href="/stocks/?page={}">previous</a> "#,
            page.number - 1
        );
    }
    let _ = write!(body, "Page {} of {}.", page.number, page.num_pages);
    if page.has_next() {
        let _ = write!(
            body,
            r#" <a href="/stocks/?page={}">next</a> <a href="/stocks/?page=last">last &raquo;</a>"#,
            page.number + 1
        );
    }
    body.push_str("</nav>");
    layout("All Stocks", Some(profile), &body)
}

pub fn login(errors: &[FormError], username: &str, next: Option<&str>, failed: bool) -> String {
    let mut body = String::new();
    if failed {
        body.push_str(r#"<ul class="errors"><li>Please enter a correct username and password.</li></ul>"#);
    }
    body.push_str(&error_list(errors));
    let _ = write!(
        body,
        r#"<form method="post" action="/login/">{}{}<input type="hidden" name="next" value="{}"><button type="submit">Log in</button></form><p>No account? <a href="/signup/">Sign up</a></p>"#,
        input("text", "username", "Username", username),
        input("password", "password", "Password", ""),
        escape(next.unwrap_or(""))
    );
    layout("Log in", None, &body)
}

/// Re-renders previously entered values, except passwords.
pub fn signup(errors: &[FormError], values: &crate::forms::Fields) -> String {
    let value = |name: &str| values.get(name).map(String::as_str).unwrap_or("");
    let body = format!(
        r#"{}<form method="post" action="/signup/">{}{}{}{}{}{}{}<button type="submit">Sign up</button></form>"#,
        error_list(errors),
        input("text", "username", "Username", value("username")),
        input("password", "password1", "Password", ""),
        input("password", "password2", "Password confirmation", ""),
        input("text", "first_name", "First Name", value("first_name")),
        input("text", "last_name", "Last Name", value("last_name")),
        input("email", "email", "Email", value("email")),
        input("date", "dob", "Date of Birth", value("dob"))
    );
    layout("Sign up", None, &body)
}

pub fn logged_out() -> String {
    layout(
        "Logged out",
        None,
        r#"<p>You have been logged out.</p><p><a href="/login/">Log in again</a></p>"#,
    )
}

pub fn not_found() -> String {
    layout("Not Found", None, "<p>The requested resource was not found.</p>")
}

pub fn server_error() -> String {
    layout("Server Error", None, "<p>Something went wrong. Please try again.</p>")
}
