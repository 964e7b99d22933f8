// src/forms.rs
use crate::error::FormError;
use crate::ledger::TradeAction;
use crate::models::{StockId, UserProfile};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::num::NonZeroU32;

pub type Fields = HashMap<String, String>;

fn value<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn required<'a>(fields: &'a Fields, name: &'static str) -> Result<&'a str, FormError> {
    value(fields, name).ok_or(FormError::Missing(name))
}

fn date(fields: &Fields, name: &'static str) -> Result<NaiveDate, FormError> {
    let raw = required(fields, name)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| FormError::Invalid {
        field: name,
        reason: "enter a valid date".to_string(),
    })
}

fn email(fields: &Fields) -> Result<String, FormError> {
    let raw = required(fields, "email")?;
    let valid = match raw.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };
    if valid && !raw.contains(char::is_whitespace) {
        Ok(raw.to_string())
    } else {
        Err(FormError::Invalid {
            field: "email",
            reason: "enter a valid email address".to_string(),
        })
    }
}

/// The buy/sell form on the portfolio page. The stock is still only an id
/// here; the handler resolves it against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeForm {
    pub stock_id: StockId,
    pub action: TradeAction,
    pub shares: NonZeroU32,
}

impl TradeForm {
    pub fn parse(fields: &Fields) -> Result<Self, FormError> {
        let stock_id = required(fields, "stock")?
            .parse()
            .map_err(|_| FormError::Invalid {
                field: "stock",
                reason: "select a valid choice".to_string(),
            })?;
        let action = match required(fields, "action")? {
            "buy" => TradeAction::Buy,
            "sell" => TradeAction::Sell,
            other => {
                return Err(FormError::Invalid {
                    field: "action",
                    reason: format!("{} is not one of the available choices", other),
                })
            }
        };
        let shares = required(fields, "shares")?
            .parse::<NonZeroU32>()
            .map_err(|_| FormError::Invalid {
                field: "shares",
                reason: "ensure this value is a whole number greater than or equal to 1"
                    .to_string(),
            })?;
        Ok(Self {
            stock_id,
            action,
            shares,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

impl LoginForm {
    pub fn parse(fields: &Fields) -> Result<Self, Vec<FormError>> {
        let username = required(fields, "username").map(str::to_string);
        // Passwords are taken verbatim; only emptiness is checked.
        let password = fields
            .get("password")
            .filter(|p| !p.is_empty())
            .cloned()
            .ok_or(FormError::Missing("password"));
        match (username, password) {
            (Ok(username), Ok(password)) => Ok(Self {
                username,
                password,
                next: safe_next(fields.get("next").map(String::as_str)),
            }),
            (username, password) => Err([username.err(), password.err()]
                .into_iter()
                .flatten()
                .collect()),
        }
    }
}

/// Only local absolute paths are accepted as a post-login destination.
pub fn safe_next(next: Option<&str>) -> Option<String> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dob: NaiveDate,
}

impl SignupForm {
    pub fn parse(fields: &Fields) -> Result<Self, Vec<FormError>> {
        let mut errors = Vec::new();
        let mut text = |name: &'static str| {
            required(fields, name)
                .map(str::to_string)
                .map_err(|e| errors.push(e))
                .ok()
        };
        let username = text("username");
        let first_name = text("first_name");
        let last_name = text("last_name");

        let password = match (
            fields.get("password1").filter(|p| !p.is_empty()),
            fields.get("password2").filter(|p| !p.is_empty()),
        ) {
            (Some(p1), Some(p2)) if p1 == p2 => Some(p1.clone()),
            (Some(_), Some(_)) => {
                errors.push(FormError::PasswordMismatch);
                None
            }
            (None, _) => {
                errors.push(FormError::Missing("password1"));
                None
            }
            (_, None) => {
                errors.push(FormError::Missing("password2"));
                None
            }
        };
        let email = email(fields).map_err(|e| errors.push(e)).ok();
        let dob = date(fields, "dob").map_err(|e| errors.push(e)).ok();

        match (username, password, first_name, last_name, email, dob) {
            (Some(username), Some(password), Some(first_name), Some(last_name), Some(email), Some(dob)) => {
                Ok(Self {
                    username,
                    password,
                    first_name,
                    last_name,
                    email,
                    dob,
                })
            }
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub dob: NaiveDate,
}

impl ProfileForm {
    pub fn parse(fields: &Fields) -> Result<Self, Vec<FormError>> {
        let first_name = required(fields, "first_name").map(str::to_string);
        let last_name = required(fields, "last_name").map(str::to_string);
        let email = email(fields);
        let dob = date(fields, "dob");
        match (first_name, last_name, email, dob) {
            (Ok(first_name), Ok(last_name), Ok(email), Ok(dob)) => Ok(Self {
                first_name,
                last_name,
                email,
                dob,
            }),
            (first_name, last_name, email, dob) => Err([
                first_name.err(),
                last_name.err(),
                email.err(),
                dob.err(),
            ]
            .into_iter()
            .flatten()
            .collect()),
        }
    }

    pub fn apply(self, profile: &UserProfile) -> UserProfile {
        UserProfile {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            dob: Some(self.dob),
            ..profile.clone()
        }
    }
}
