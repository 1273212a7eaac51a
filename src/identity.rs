/*!
 * Endpoint identity and the identity store.
 *
 * Every endpoint carries a stable random [`Identifier`] that peers use
 * to key their retained-secret caches. The identifier persists in an
 * identity store; the default store is a small file created on first
 * use under the user's home directory.
 *
 * The store is typically process-wide: sessions share one handle,
 * opening it on first use and reusing it afterwards. [`shared`] hands
 * out that handle; tests and embedded hosts pass their own store (for
 * example a [`MemoryIdentityStore`]) instead.
 */

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use rand::RngCore;

use crate::constants::{DEFAULT_CACHE_FILE, HOME_ENV, IDENTIFIER_LENGTH};
use crate::error::{Error, Result};

const MAGIC: &[u8; 4] = b"ACRD";
const FORMAT_VERSION: u8 = 1;
const CACHE_LEN: usize = MAGIC.len() + 1 + IDENTIFIER_LENGTH;

/// Stable identifier of one endpoint
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier([u8; IDENTIFIER_LENGTH]);

impl Identifier {
    /// Length of an identifier in bytes
    pub const LENGTH: usize = IDENTIFIER_LENGTH;

    /// Wrap raw identifier bytes
    pub fn from_bytes(bytes: [u8; IDENTIFIER_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Generate a fresh random identifier
    pub fn random() -> Self {
        let mut bytes = [0u8; IDENTIFIER_LENGTH];
        rand::rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// The raw identifier bytes
    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LENGTH] {
        &self.0
    }
}

impl AsRef<[u8]> for Identifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

/// Store of stable endpoint identifiers.
///
/// The full protocol keys retained-secret records by peer identifier;
/// this contract covers only what session setup needs from the store.
pub trait IdentityStore: Send {
    /// Whether the store has been opened
    fn is_open(&self) -> bool;

    /// Open the backing store, creating it when missing.
    ///
    /// Opening an already-open store is a no-op, even with a different
    /// path.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// This endpoint's identifier; absent until the store is open
    fn local_identifier(&self) -> Option<Identifier>;
}

/// Handle sessions take the identity store as
pub type SharedIdentityStore = Arc<Mutex<dyn IdentityStore>>;

static SHARED: Lazy<SharedIdentityStore> =
    Lazy::new(|| Arc::new(Mutex::new(FileIdentityStore::new())));

/// The process-wide identity store.
///
/// Opened by the first session that initializes without a private
/// store and reused by every later one.
pub fn shared() -> SharedIdentityStore {
    Arc::clone(&SHARED)
}

/// Default location of the identity cache.
///
/// `$HOME/`[`DEFAULT_CACHE_FILE`], or the bare file name (current
/// directory) when `HOME` is unset or empty.
pub fn default_cache_path() -> PathBuf {
    cache_path_under(env::var_os(HOME_ENV))
}

fn cache_path_under(base: Option<OsString>) -> PathBuf {
    match base {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(DEFAULT_CACHE_FILE),
        _ => PathBuf::from(DEFAULT_CACHE_FILE),
    }
}

/// File-backed identity store.
///
/// The cache is a fixed-size record: a four-byte magic, a format
/// version, and the local identifier. A missing file is created with a
/// fresh random identifier; a present file must parse, otherwise
/// opening fails and the session stays uninitialized.
#[derive(Debug, Default)]
pub struct FileIdentityStore {
    path: Option<PathBuf>,
    local: Option<Identifier>,
}

impl FileIdentityStore {
    /// Create a store with no backing file yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the backing file once the store is open
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl IdentityStore for FileIdentityStore {
    fn is_open(&self) -> bool {
        self.local.is_some()
    }

    fn open(&mut self, path: &Path) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        let local = match fs::read(path) {
            Ok(raw) => parse_cache(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let local = Identifier::random();
                let mut raw = Vec::with_capacity(CACHE_LEN);
                raw.extend_from_slice(MAGIC);
                raw.push(FORMAT_VERSION);
                raw.extend_from_slice(local.as_bytes());
                fs::write(path, &raw)?;
                log::info!("created identity cache at {}", path.display());
                local
            }
            Err(err) => return Err(err.into()),
        };
        log::debug!("identity cache open at {}, local id {}", path.display(), local);
        self.path = Some(path.to_path_buf());
        self.local = Some(local);
        Ok(())
    }

    fn local_identifier(&self) -> Option<Identifier> {
        self.local
    }
}

fn parse_cache(raw: &[u8]) -> Result<Identifier> {
    if raw.len() < CACHE_LEN || &raw[..MAGIC.len()] != MAGIC {
        return Err(invalid("identity cache header mismatch"));
    }
    if raw[MAGIC.len()] != FORMAT_VERSION {
        return Err(invalid("unsupported identity cache version"));
    }
    let mut bytes = [0u8; IDENTIFIER_LENGTH];
    bytes.copy_from_slice(&raw[MAGIC.len() + 1..CACHE_LEN]);
    Ok(Identifier::from_bytes(bytes))
}

fn invalid(message: &'static str) -> Error {
    Error::IdentityStoreUnavailable(io::Error::new(io::ErrorKind::InvalidData, message))
}

/// Identity store without persistence.
///
/// For tests and hosts without a writable filesystem. The identifier
/// is generated at open time or preset with
/// [`MemoryIdentityStore::with_identifier`].
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    local: Option<Identifier>,
    opened: bool,
}

impl MemoryIdentityStore {
    /// Create a closed store that generates an identifier on open
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a closed store that will report the given identifier
    pub fn with_identifier(identifier: Identifier) -> Self {
        Self {
            local: Some(identifier),
            opened: false,
        }
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn is_open(&self) -> bool {
        self.opened
    }

    fn open(&mut self, _path: &Path) -> Result<()> {
        if !self.opened {
            self.local.get_or_insert_with(Identifier::random);
            self.opened = true;
        }
        Ok(())
    }

    fn local_identifier(&self) -> Option<Identifier> {
        if self.opened { self.local } else { None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_prefers_the_home_directory() {
        let path = cache_path_under(Some(OsString::from("/home/alice")));
        assert_eq!(path, PathBuf::from("/home/alice").join(DEFAULT_CACHE_FILE));
    }

    #[test]
    fn default_path_falls_back_to_the_current_directory() {
        assert_eq!(cache_path_under(None), PathBuf::from(DEFAULT_CACHE_FILE));
        assert_eq!(
            cache_path_under(Some(OsString::new())),
            PathBuf::from(DEFAULT_CACHE_FILE)
        );
    }

    #[test]
    fn identifiers_render_as_hex() {
        let id = Identifier::from_bytes([0xab; IDENTIFIER_LENGTH]);
        assert_eq!(id.to_string(), "ab".repeat(IDENTIFIER_LENGTH));
        assert_eq!(id.as_bytes(), &[0xab; IDENTIFIER_LENGTH]);
    }

    #[test]
    fn random_identifiers_differ() {
        assert_ne!(Identifier::random(), Identifier::random());
    }

    #[test]
    fn file_store_creates_and_reloads_the_cache() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.zid");

        let mut store = FileIdentityStore::new();
        assert!(!store.is_open());
        assert!(store.local_identifier().is_none());
        store.open(&path)?;
        assert!(store.is_open());
        assert_eq!(store.path(), Some(path.as_path()));
        let created = store.local_identifier().unwrap();

        // a second store on the same file sees the same identifier
        let mut reloaded = FileIdentityStore::new();
        reloaded.open(&path)?;
        assert_eq!(reloaded.local_identifier(), Some(created));
        Ok(())
    }

    #[test]
    fn file_store_open_is_idempotent() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.zid");
        let second = dir.path().join("second.zid");

        let mut store = FileIdentityStore::new();
        store.open(&first)?;
        let id = store.local_identifier().unwrap();
        store.open(&second)?;
        assert_eq!(store.local_identifier(), Some(id));
        assert_eq!(store.path(), Some(first.as_path()));
        assert!(!second.exists());
        Ok(())
    }

    #[test]
    fn file_store_rejects_a_corrupt_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.zid");
        fs::write(&path, b"not an identity cache").unwrap();

        let mut store = FileIdentityStore::new();
        let result = store.open(&path);
        assert!(matches!(result, Err(Error::IdentityStoreUnavailable(_))));
        assert!(!store.is_open());
    }

    #[test]
    fn file_store_rejects_an_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.zid");
        let mut raw = Vec::new();
        raw.extend_from_slice(MAGIC);
        raw.push(FORMAT_VERSION + 1);
        raw.extend_from_slice(&[0u8; IDENTIFIER_LENGTH]);
        fs::write(&path, &raw).unwrap();

        let mut store = FileIdentityStore::new();
        assert!(store.open(&path).is_err());
    }

    #[test]
    fn memory_store_generates_on_open() -> Result<()> {
        let mut store = MemoryIdentityStore::new();
        assert!(!store.is_open());
        store.open(Path::new("ignored"))?;
        assert!(store.is_open());
        let id = store.local_identifier().unwrap();
        store.open(Path::new("also ignored"))?;
        assert_eq!(store.local_identifier(), Some(id));
        Ok(())
    }

    #[test]
    fn memory_store_honors_a_preset_identifier() -> Result<()> {
        let preset = Identifier::from_bytes([7; IDENTIFIER_LENGTH]);
        let mut store = MemoryIdentityStore::with_identifier(preset);
        assert!(store.local_identifier().is_none());
        store.open(Path::new("ignored"))?;
        assert_eq!(store.local_identifier(), Some(preset));
        Ok(())
    }

    #[test]
    fn shared_store_hands_out_one_instance() {
        let a = shared();
        let b = shared();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
