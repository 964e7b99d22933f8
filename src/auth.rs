// src/auth.rs
use crate::error::AuthError;
use crate::models::{UserId, UserProfile};
use crate::store::Store;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const SESSION_COOKIE: &str = "scrooge_session";

const HASH_SCHEME: &str = "sha256";
const SALT_LEN: usize = 16;

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
}

/// Issues and checks the signed session tokens stored in [`SESSION_COOKIE`].
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() + self.ttl).timestamp().max(0) as usize,
        };
        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )?)
    }

    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &Validation::default(),
        )?;
        data.claims
            .sub
            .parse()
            .map_err(|_| AuthError::Subject(data.claims.sub))
    }

    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            self.ttl.num_seconds()
        )
    }

    pub fn cleared_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
    }
}

/// The authenticated user a request acts on behalf of.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub profile: UserProfile,
}

impl CurrentUser {
    pub fn id(&self) -> UserId {
        self.profile.id
    }
}

/// Resolves a session token to the user it was issued for.
pub async fn resolve_session(
    store: &dyn Store,
    signer: &TokenSigner,
    token: &str,
) -> Result<CurrentUser, AuthError> {
    let user_id = signer.verify(token)?;
    let profile = store
        .user(user_id)
        .await?
        .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))?;
    Ok(CurrentUser { profile })
}

/// Checks a username/password pair against the stored hash.
pub async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<CurrentUser, AuthError> {
    let (user_id, hash) = store
        .credentials(username)
        .await?
        .ok_or(AuthError::BadCredentials)?;
    if !verify_password(password, &hash) {
        return Err(AuthError::BadCredentials);
    }
    let profile = store
        .user(user_id)
        .await?
        .ok_or_else(|| AuthError::UnknownUser(user_id.to_string()))?;
    Ok(CurrentUser { profile })
}

/// Salted SHA-256, stored as `sha256$<salt hex>$<digest hex>`.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!(
        "{}${}${}",
        HASH_SCHEME,
        hex::encode(salt),
        hex::encode(digest(&salt, password))
    )
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(HASH_SCHEME), Some(salt), Some(expected), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (hex::decode(salt), hex::decode(expected)) else {
        return false;
    };
    let actual = digest(&salt, password);
    // Constant time over the digest bytes.
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(&expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}
