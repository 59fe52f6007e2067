//! User accounts and session tokens
//!
//! Accounts live in a JSON file with bcrypt password hashes. Sessions are
//! HS256 JWTs carrying a unique `jti`, so a single token can be revoked on
//! logout through an injected [`TokenRevocation`] list.

use crate::config::AuthConfig;
use crate::error::{Result, SerreError};
use crate::history::write_atomically;
use crate::logging::get_logger;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock as StdRwLock;
use tokio::sync::RwLock;

/// Stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub nom: String,
    pub prenom: String,
    pub mail: String,
    pub login: String,
    /// bcrypt hash, never the clear password
    pub password_hash: String,
}

/// Registration data for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nom: String,
    pub prenom: String,
    pub mail: String,
    pub login: String,
    pub password: String,
}

/// Hash a password with bcrypt off the async runtime
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || pwhash::bcrypt::hash(password))
        .await
        .map_err(|e| SerreError::auth(format!("hashing task failed: {}", e)))?
        .map_err(SerreError::from)
}

/// Check a password against a stored bcrypt hash
pub async fn verify_password(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || pwhash::bcrypt::verify(password, &hash))
        .await
        .unwrap_or(false)
}

/// JSON-file-backed user table
pub struct UserStore {
    file_path: PathBuf,
    users: RwLock<Vec<User>>,
    logger: crate::logging::StructuredLogger,
}

impl UserStore {
    /// Open the store at `path`; a missing file is an empty table
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file_path = path.as_ref().to_path_buf();
        let logger = get_logger("auth");
        let users = match tokio::fs::read_to_string(&file_path).await {
            Ok(contents) => serde_json::from_str::<Vec<User>>(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger.info("No user file found, starting with no accounts");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            file_path,
            users: RwLock::new(users),
            logger,
        })
    }

    pub async fn find_by_login(&self, login: &str) -> Option<User> {
        let users = self.users.read().await;
        users.iter().find(|u| u.login == login).cloned()
    }

    /// Whether the login or the mail address is already taken
    pub async fn exists(&self, login: &str, mail: &str) -> bool {
        let users = self.users.read().await;
        users
            .iter()
            .any(|u| u.login == login || u.mail.eq_ignore_ascii_case(mail))
    }

    /// Hash the password, store the account and persist the table
    pub async fn insert(&self, new_user: NewUser) -> Result<User> {
        let password_hash = hash_password(&new_user.password).await?;

        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|u| u.login == new_user.login || u.mail.eq_ignore_ascii_case(&new_user.mail))
        {
            return Err(SerreError::validation("login", "login or mail already used"));
        }
        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            nom: new_user.nom,
            prenom: new_user.prenom,
            mail: new_user.mail,
            login: new_user.login,
            password_hash,
        };
        users.push(user.clone());

        let contents = serde_json::to_vec_pretty(&*users)?;
        if let Err(e) = write_atomically(&self.file_path, &contents).await {
            users.pop();
            return Err(e);
        }
        self.logger
            .info(&format!("Registered user '{}' (id {})", user.login, user.id));
        Ok(user)
    }

    /// Verify credentials, returning the account on success
    pub async fn authenticate(&self, login: &str, password: &str) -> Option<User> {
        let user = self.find_by_login(login).await?;
        verify_password(password, &user.password_hash)
            .await
            .then_some(user)
    }
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub login: String,
    /// Unique token id, used for revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Tracks tokens revoked before their expiry
pub trait TokenRevocation: Send + Sync {
    /// Revoke the token `jti`, which expires at unix time `exp`
    fn revoke(&self, jti: &str, exp: i64);

    fn is_revoked(&self, jti: &str) -> bool;
}

/// Process-local revocation list; entries are dropped once the token expired
#[derive(Debug, Default)]
pub struct InMemoryRevocationList {
    revoked: StdRwLock<HashMap<String, i64>>,
}

impl InMemoryRevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.revoked.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenRevocation for InMemoryRevocationList {
    fn revoke(&self, jti: &str, exp: i64) {
        if let Ok(mut revoked) = self.revoked.write() {
            let now = Utc::now().timestamp();
            revoked.retain(|_, e| *e > now);
            revoked.insert(jti.to_string(), exp);
        }
    }

    fn is_revoked(&self, jti: &str) -> bool {
        self.revoked
            .read()
            .map(|r| r.contains_key(jti))
            .unwrap_or(true)
    }
}

/// Issues and validates session tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::hours(i64::from(config.token_ttl_hours)),
        )
    }

    /// Sign a fresh token for `user`
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            login: user.login.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?)
    }

    /// Check signature and expiry
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}
