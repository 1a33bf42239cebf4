use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::StorageError;

const DEFAULT_DIR: &str = ".interiors_dashboard";
const DEFAULT_FILE: &str = "tokens.json";

/// Access/refresh credentials issued by the API.
///
/// Both halves travel together: a pair is either stored whole or not at all.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// On-disk record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(flatten)]
    pair: TokenPair,
    updated_at: DateTime<Utc>,
}

/// Persistent storage for the current session's token pair.
///
/// Clones share the same in-memory state and backing file.
#[derive(Clone)]
pub struct TokenStore {
    path: Option<PathBuf>,
    current: Arc<RwLock<Option<StoredTokens>>>,
}

impl TokenStore {
    /// Open (or create) a token store backed by `path`.
    ///
    /// A missing file means "signed out". An unreadable or corrupt file is an error.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let current = load(&path)?;

        Ok(Self {
            path: Some(path),
            current: Arc::new(RwLock::new(current)),
        })
    }

    /// Token store at `~/.interiors_dashboard/tokens.json`.
    pub fn open_default() -> Result<Self, StorageError> {
        Self::new(default_path()?)
    }

    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self) -> Option<TokenPair> {
        self.current.read().as_ref().map(|stored| stored.pair.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|stored| stored.pair.access.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.current.read().as_ref().map(|stored| stored.pair.refresh.clone())
    }

    /// When the stored pair was last written.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.current.read().as_ref().map(|stored| stored.updated_at)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.read().is_some()
    }

    /// Replace the stored pair and persist it.
    ///
    /// The in-memory pair is updated even when writing the file fails, so the
    /// running process keeps working with the newest credentials.
    pub fn set(&self, pair: TokenPair) -> Result<(), StorageError> {
        let stored = StoredTokens {
            pair,
            updated_at: Utc::now(),
        };

        *self.current.write() = Some(stored.clone());
        match &self.path {
            Some(path) => persist(path, &stored),
            None => Ok(()),
        }
    }

    /// Forget the pair. The in-memory copy is dropped even if the file can't be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        *self.current.write() = None;

        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(StorageError::Io {
                        path: path.display().to_string(),
                        source,
                    })
                }
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("path", &self.path)
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

pub fn default_path() -> Result<PathBuf, StorageError> {
    let home = dirs::home_dir().ok_or(StorageError::NoHomeDir)?;
    Ok(home.join(DEFAULT_DIR).join(DEFAULT_FILE))
}

fn load(path: &Path) -> Result<Option<StoredTokens>, StorageError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            })
        }
    };

    if contents.trim().is_empty() {
        return Ok(None);
    }

    let stored: StoredTokens = serde_json::from_str(&contents)?;
    if stored.pair.access.is_empty() || stored.pair.refresh.is_empty() {
        return Ok(None);
    }
    Ok(Some(stored))
}

fn persist(path: &Path, stored: &StoredTokens) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string_pretty(stored)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
    }

    fs::rename(&tmp, path).map_err(io_err)?;
    Ok(())
}
