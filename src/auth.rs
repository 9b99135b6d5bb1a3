//! Local identity provider: account storage and the session stream.
//!
//! Accounts live in their own database file, separate from the
//! vocabulary. Watchers receive the current identity immediately on
//! subscribe and again after every sign-in, sign-up, or sign-out.

use chrono::Utc;
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, Sender};
use thiserror::Error;
use uuid::Uuid;

/// Prefix carried by every provider error message. The sign-in screen
/// strips it before display.
pub const PROVIDER_PREFIX: &str = "identity: ";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("identity: invalid email or password")]
    InvalidCredentials,
    #[error("identity: email already in use: {0}")]
    EmailTaken(String),
    #[error("identity: email and password must not be empty")]
    EmptyCredential,
    #[error("identity: storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Strip the provider prefix from an error message for display.
pub fn strip_provider_prefix(message: &str) -> &str {
    message.strip_prefix(PROVIDER_PREFIX).unwrap_or(message)
}

/// A signed-in account's identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserHandle {
    pub id: Uuid,
    pub email: String,
}

/// Receiving end of the session stream.
pub struct SessionWatcher {
    rx: Receiver<Option<UserHandle>>,
}

impl SessionWatcher {
    /// Newest identity change since the last call, if any.
    pub fn latest(&self) -> Option<Option<UserHandle>> {
        let mut latest = None;
        while let Ok(user) = self.rx.try_recv() {
            latest = Some(user);
        }
        latest
    }
}

struct AccountRow {
    id: Uuid,
    salt: String,
    digest: String,
}

pub struct AuthService {
    conn: Connection,
    current: Option<UserHandle>,
    watchers: Vec<Sender<Option<UserHandle>>>,
}

impl AuthService {
    pub fn open(path: &Path) -> AuthResult<Self> {
        let conn = Connection::open(path)?;
        let auth = Self {
            conn,
            current: None,
            watchers: Vec::new(),
        };
        auth.init()?;
        Ok(auth)
    }

    pub fn in_memory() -> AuthResult<Self> {
        let conn = Connection::open_in_memory()?;
        let auth = Self {
            conn,
            current: None,
            watchers: Vec::new(),
        };
        auth.init()?;
        Ok(auth)
    }

    fn init(&self) -> AuthResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                pass_salt TEXT NOT NULL,
                pass_digest TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Subscribe to session changes. The current identity is pushed
    /// immediately, then again on every change.
    pub fn watch(&mut self) -> SessionWatcher {
        let (tx, rx) = channel();
        let _ = tx.send(self.current.clone());
        self.watchers.push(tx);
        SessionWatcher { rx }
    }

    pub fn current(&self) -> Option<&UserHandle> {
        self.current.as_ref()
    }

    /// Create an account and sign it in.
    pub fn sign_up(&mut self, email: &str, password: &str) -> AuthResult<UserHandle> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::EmptyCredential);
        }
        if self.lookup_account(email)?.is_some() {
            return Err(AuthError::EmailTaken(email.to_string()));
        }

        let id = Uuid::new_v4();
        let salt = Uuid::new_v4().simple().to_string();
        self.conn.execute(
            "INSERT INTO accounts (id, email, pass_salt, pass_digest, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                email,
                salt,
                digest_password(&salt, password),
                Utc::now().timestamp_millis(),
            ],
        )?;

        let handle = UserHandle {
            id,
            email: email.to_string(),
        };
        self.set_current(Some(handle.clone()));
        Ok(handle)
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> AuthResult<UserHandle> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::EmptyCredential);
        }
        let account = self
            .lookup_account(email)?
            .ok_or(AuthError::InvalidCredentials)?;
        if digest_password(&account.salt, password) != account.digest {
            return Err(AuthError::InvalidCredentials);
        }

        let handle = UserHandle {
            id: account.id,
            email: email.to_string(),
        };
        self.set_current(Some(handle.clone()));
        Ok(handle)
    }

    pub fn sign_out(&mut self) {
        self.set_current(None);
    }

    fn set_current(&mut self, user: Option<UserHandle>) {
        self.current = user;
        let current = self.current.clone();
        self.watchers.retain(|tx| tx.send(current.clone()).is_ok());
    }

    fn lookup_account(&self, email: &str) -> AuthResult<Option<AccountRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, pass_salt, pass_digest FROM accounts WHERE email = ?1")?;
        let row = stmt.query_row(params![email], |row| {
            let id: String = row.get(0)?;
            let salt: String = row.get(1)?;
            let digest: String = row.get(2)?;
            Ok((id, salt, digest))
        });

        match row {
            // A row whose id does not parse is treated as absent.
            Ok((id, salt, digest)) => Ok(Uuid::parse_str(&id)
                .ok()
                .map(|id| AccountRow { id, salt, digest })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn digest_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
