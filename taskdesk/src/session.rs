//! Session storage and the view guard.
//!
//! The login flow (outside this crate) writes five string keys into a
//! session store. Each dashboard reads them on start-up through
//! [`SessionGuard`] and refuses to run unless the session is authenticated
//! with the role the view needs.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use taskdesk_proto::model::{Role, UserId};

use crate::dispatch::Confirm;
use crate::error::AuthError;

/// Names of the session keys written by the login flow.
pub mod keys {
    /// `"true"` once the user has signed in.
    pub const IS_AUTHENTICATED: &str = "isAuthenticated";
    /// `"lead"` or `"member"`.
    pub const USER_ROLE: &str = "userRole";
    /// Integer user id.
    pub const USER_ID: &str = "userId";
    /// Login name.
    pub const USERNAME: &str = "username";
    /// Display name (may be empty).
    pub const FULL_NAME: &str = "fullName";
}

/// Errors from persistent session stores.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Failed to read or write the session file.
    #[error("session file {path}: {source}")]
    Io {
        /// The session file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The session file is not a flat TOML table of strings.
    #[error("session file is malformed: {0}")]
    Parse(#[from] toml::de::Error),

    /// The session could not be serialized.
    #[error("session could not be encoded: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Key/value storage for the ambient session.
pub trait SessionStore: Send + Sync {
    /// Reads a key.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes a key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if a persistent store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    /// Removes every key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if a persistent store cannot be written.
    fn clear(&self) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Session held in process memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySession {
    /// Creates an empty (signed-out) session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session as the login flow would leave it.
    #[must_use]
    pub fn signed_in(user: &CurrentUser) -> Self {
        let session = Self::new();
        session.values.write().extend(user.to_entries());
        session
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.values.write().clear();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// Session persisted as a flat TOML table, e.g.
/// `~/.config/taskdesk/session.toml`:
///
/// ```toml
/// isAuthenticated = "true"
/// userRole = "lead"
/// userId = "1"
/// username = "dana"
/// fullName = "Dana Lead"
/// ```
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    values: RwLock<BTreeMap<String, String>>,
}

impl FileSession {
    /// Opens the session file. A missing file is an empty session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(SessionError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), keys = values.len(), "session loaded");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let io_err = |source: std::io::Error| SessionError::Io {
            path: self.path.clone(),
            source,
        };
        if values.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_err(e)),
                _ => Ok(()),
            };
        }
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let contents = toml::to_string(values)?;
        std::fs::write(&self.path, contents).map_err(io_err)
    }
}

impl SessionStore for FileSession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn clear(&self) -> Result<(), SessionError> {
        let mut values = self.values.write();
        values.clear();
        self.persist(&values)
    }
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// The signed-in user as recorded in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Backend user id.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Display name, if the login flow stored one.
    pub full_name: Option<String>,
    /// Role claimed by the session.
    pub role: Role,
}

impl CurrentUser {
    /// Full name when present, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.username,
        }
    }

    fn to_entries(&self) -> Vec<(String, String)> {
        vec![
            (keys::IS_AUTHENTICATED.to_string(), "true".to_string()),
            (keys::USER_ROLE.to_string(), self.role.as_str().to_string()),
            (keys::USER_ID.to_string(), self.id.to_string()),
            (keys::USERNAME.to_string(), self.username.clone()),
            (
                keys::FULL_NAME.to_string(),
                self.full_name.clone().unwrap_or_default(),
            ),
        ]
    }
}

/// Grants or refuses access to a dashboard view.
pub struct SessionGuard;

impl SessionGuard {
    /// Checks that the session is authenticated, whatever its role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when `isAuthenticated` is not `"true"`, the
    /// role is missing or unknown, or the user id is not an integer.
    pub fn authenticated(store: &dyn SessionStore) -> Result<CurrentUser, AuthError> {
        if store.get(keys::IS_AUTHENTICATED).as_deref() != Some("true") {
            return Err(AuthError::NotAuthenticated);
        }

        let raw_role = store.get(keys::USER_ROLE);
        let role = raw_role
            .as_deref()
            .and_then(|r| r.parse::<Role>().ok())
            .ok_or(AuthError::NotAuthenticated)?;

        let raw_id = store.get(keys::USER_ID);
        let id = raw_id
            .as_deref()
            .and_then(|id| id.parse::<UserId>().ok())
            .ok_or_else(|| AuthError::InvalidUserId(raw_id.clone()))?;

        Ok(CurrentUser {
            id,
            username: store.get(keys::USERNAME).unwrap_or_default(),
            full_name: store.get(keys::FULL_NAME).filter(|n| !n.is_empty()),
            role,
        })
    }

    /// Checks that the session is authenticated with `required` role.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::WrongRole`] when the stored role differs, and
    /// the errors of [`authenticated`](Self::authenticated) otherwise.
    pub fn require(store: &dyn SessionStore, required: Role) -> Result<CurrentUser, AuthError> {
        if store.get(keys::IS_AUTHENTICATED).as_deref() != Some("true") {
            tracing::info!(%required, "no authenticated session, redirecting");
            return Err(AuthError::NotAuthenticated);
        }
        let found = store.get(keys::USER_ROLE);
        if found.as_deref() != Some(required.as_str()) {
            tracing::info!(%required, found = ?found, "role mismatch, redirecting");
            return Err(AuthError::WrongRole { required, found });
        }
        Self::authenticated(store)
    }
}

/// Clears the session after the user confirms.
///
/// Returns `Ok(false)` when the user declines.
///
/// # Errors
///
/// Returns [`SessionError`] if the store cannot be cleared.
pub fn logout(store: &dyn SessionStore, confirm: &dyn Confirm) -> Result<bool, SessionError> {
    if !confirm.confirm("Are you sure you want to logout?") {
        return Ok(false);
    }
    store.clear()?;
    tracing::info!("session cleared");
    Ok(true)
}
