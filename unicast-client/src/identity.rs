//! Durable device identity
//!
//! Two persisted entries survive restarts:
//! - `deviceId`: the device token, generated once per install
//! - `selectedLanguage`: the user's language preference
//!
//! Every operation is a synchronous read-then-write on the backing store, so
//! concurrent callers can only race on ordering, never corrupt an entry.

use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::session::{ClientSession, DeviceToken, LanguageCode};

pub const TOKEN_KEY: &str = "deviceId";
pub const LANGUAGE_KEY: &str = "selectedLanguage";

const TOKEN_PREFIX: &str = "web";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Minimal durable key-value backend
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

pub type Shared<T> = Arc<Mutex<T>>;

/// In-memory backend, nothing survives the process.
///
/// Clones share the same entries, so a test can keep a handle on the store it
/// gave away.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Shared<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .extend(entries.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }
}

/// TOML file backend; each `set` rewrites the whole file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Opens the store, an unreadable or corrupt file starts empty
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                warn!("Identity file {} is corrupt, starting fresh: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!("Failed to read identity file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        debug!("Opened identity store at {} ({} entries)", path.display(), entries.len());
        Self { path, entries }
    }

    fn flush(&self) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(&self.entries)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, content)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        // The in-memory value stays authoritative for this run
        if let Err(e) = self.flush() {
            warn!("Failed to persist {} to {}: {}", key, self.path.display(), e);
        }
    }
}

/// Owns the device token and language preference
pub struct IdentityStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> IdentityStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Existing token, or a freshly generated one persisted before returning
    pub fn get_or_create_token(&mut self) -> DeviceToken {
        if let Some(existing) = self.store.get(TOKEN_KEY).filter(|t| !t.is_empty()) {
            info!("Using existing device token: {}", existing);
            return DeviceToken::new(existing);
        }
        let token = generate_token();
        self.store.set(TOKEN_KEY, token.as_str());
        info!("Generated new device token: {}", token);
        token
    }

    pub fn language(&self) -> LanguageCode {
        self.store
            .get(LANGUAGE_KEY)
            .and_then(|code| LanguageCode::parse(&code))
            .unwrap_or_default()
    }

    pub fn set_language(&mut self, language: &LanguageCode) {
        self.store.set(LANGUAGE_KEY, language.as_str());
        debug!("Persisted language preference: {}", language);
    }

    pub fn session(&mut self) -> ClientSession {
        let token = self.get_or_create_token();
        ClientSession::new(token, self.language())
    }

    pub fn backend(&self) -> &S {
        &self.store
    }
}

/// `web-<unix millis>-<9 base36 chars>`
pub fn generate_token() -> DeviceToken {
    let millis = Utc::now().timestamp_millis();
    let mut entropy = uuid::Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(SUFFIX_LEN);
    for _ in 0..SUFFIX_LEN {
        suffix.push(BASE36[(entropy % 36) as usize] as char);
        entropy /= 36;
    }
    DeviceToken::new(format!("{TOKEN_PREFIX}-{millis}-{suffix}"))
}
