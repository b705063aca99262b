use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use tracing::{debug, warn};

use crate::auth::Session;

use super::cipher::SessionCipher;
use super::StoreError;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE_NAME: &str = "dropzone.session-token";

/// Salt file name in the store directory
const SALT_FILE: &str = "store.salt";

/// Extension of sealed session records
const RECORD_EXTENSION: &str = "session";

const SALT_LEN: usize = 16;
const COOKIE_BYTES: usize = 32;

/// Opaque random id under which a sealed session record is stored.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionCookie(String);

impl SessionCookie {
    pub fn generate() -> Self {
        let mut bytes = [0u8; COOKIE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Accept a cookie value from a request. Only lowercase hex ids of the
    /// generated length are valid, so a value can never name another path.
    pub fn parse(value: &str) -> Result<Self, StoreError> {
        let valid = value.len() == COOKIE_BYTES * 2
            && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(StoreError::InvalidCookie)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Set-Cookie` header value for this session
    pub fn header_value(&self, max_age: Duration) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE_NAME,
            self.0,
            max_age.num_seconds().max(0)
        )
    }

    /// `Set-Cookie` header value that clears the cookie
    pub fn removal_header_value() -> String {
        format!(
            "{}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE_NAME
        )
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionCookie({}...)", &self.0[..8.min(self.0.len())])
    }
}

/// Server-side session storage: one sealed record per cookie.
pub struct SessionStore {
    dir: PathBuf,
    cipher: SessionCipher,
    max_age: Duration,
}

impl SessionStore {
    /// Open (or create) a store in `dir`, deriving the record key from `secret`.
    pub fn open(dir: PathBuf, secret: &[u8], max_age: Duration) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&dir)?;
        let salt = Self::load_or_create_salt(&dir)?;
        let cipher = SessionCipher::derive(secret, &salt)?;
        Ok(Self { dir, cipher, max_age })
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    fn load_or_create_salt(dir: &Path) -> Result<Vec<u8>, StoreError> {
        let path = dir.join(SALT_FILE);
        if path.exists() {
            let salt = std::fs::read(&path)?;
            if salt.len() == SALT_LEN {
                return Ok(salt);
            }
            warn!(path = %path.display(), "Store salt has unexpected length, regenerating");
        }

        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        std::fs::write(&path, &salt)?;
        Ok(salt)
    }

    fn record_path(&self, cookie: &SessionCookie) -> PathBuf {
        self.dir.join(format!("{}.{}", cookie.as_str(), RECORD_EXTENSION))
    }

    /// Store a new session under a freshly generated cookie
    pub fn create(&self, session: &Session) -> Result<SessionCookie, StoreError> {
        let cookie = SessionCookie::generate();
        self.save(&cookie, session)?;
        Ok(cookie)
    }

    /// Replace the record stored under `cookie`
    pub fn save(&self, cookie: &SessionCookie, session: &Session) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(session)?;
        let sealed = self.cipher.seal(&plaintext, cookie.as_str().as_bytes())?;
        std::fs::write(self.record_path(cookie), sealed)?;
        debug!(cookie = ?cookie, "Session record saved");
        Ok(())
    }

    /// Load the session stored under `cookie`.
    ///
    /// Missing, expired, and unreadable records all yield `None`; the latter
    /// two are deleted.
    pub fn load(&self, cookie: &SessionCookie, now: DateTime<Utc>) -> Result<Option<Session>, StoreError> {
        let path = self.record_path(cookie);
        if !path.exists() {
            return Ok(None);
        }

        let sealed = std::fs::read(&path)?;
        let plaintext = match self.cipher.open(&sealed, cookie.as_str().as_bytes()) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(cookie = ?cookie, error = %e, "Discarding unreadable session record");
                std::fs::remove_file(&path)?;
                return Ok(None);
            }
        };

        let session: Session = match serde_json::from_slice(&plaintext) {
            Ok(session) => session,
            Err(e) => {
                warn!(cookie = ?cookie, error = %e, "Discarding malformed session record");
                std::fs::remove_file(&path)?;
                return Ok(None);
            }
        };

        if self.is_past_max_age(&session, now) {
            debug!(cookie = ?cookie, issued_at = %session.issued_at, "Session record expired");
            std::fs::remove_file(&path)?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Delete the record stored under `cookie`
    pub fn destroy(&self, cookie: &SessionCookie) -> Result<(), StoreError> {
        let path = self.record_path(cookie);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Delete every expired or unreadable record, returning how many were removed
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut removed = 0;
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let cookie = match path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(SessionCookie::parse)
            {
                Some(Ok(cookie)) => cookie,
                _ => {
                    std::fs::remove_file(&path)?;
                    removed += 1;
                    continue;
                }
            };
            if self.load(&cookie, now)?.is_none() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(removed, "Purged session records");
        }
        Ok(removed)
    }

    fn is_past_max_age(&self, session: &Session, now: DateTime<Utc>) -> bool {
        now - session.issued_at > self.max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::grant;
    use crate::auth::Role;
    use assert_fs::TempDir;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn temp_store_dir() -> TempDir {
        TempDir::new().expect("temp dir")
    }

    fn open_store(dir: &Path) -> SessionStore {
        SessionStore::open(dir.to_path_buf(), SECRET, Duration::days(7)).expect("open store")
    }

    fn session(issued_at: DateTime<Utc>) -> Session {
        Session::from_grant(
            "jumper",
            grant("access-1", "refresh-1", issued_at + Duration::hours(1), Role::User),
            issued_at,
        )
    }

    #[test]
    fn test_cookie_parse() {
        let cookie = SessionCookie::generate();
        assert_eq!(cookie.as_str().len(), 64);
        assert_eq!(SessionCookie::parse(cookie.as_str()).expect("valid"), cookie);
        assert!(SessionCookie::parse("../../etc/passwd").is_err());
        assert!(SessionCookie::parse(&cookie.as_str().to_uppercase()).is_err());
        assert!(SessionCookie::parse("").is_err());
    }

    #[test]
    fn test_cookie_header() {
        let cookie = SessionCookie::generate();
        let header = cookie.header_value(Duration::days(7));
        assert!(header.starts_with("dropzone.session-token="));
        assert!(header.contains("HttpOnly"));
        assert!(header.ends_with("Max-Age=604800"));
        assert!(!format!("{:?}", cookie).contains(cookie.as_str()));
        assert!(SessionCookie::removal_header_value().ends_with("Max-Age=0"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = temp_store_dir();
        let store = open_store(dir.path());
        let now = Utc::now();
        let session = session(now);

        let cookie = store.create(&session).expect("create");
        let loaded = store.load(&cookie, now).expect("load").expect("present");
        assert_eq!(loaded, session);

        // Records are not stored in the clear
        let raw = std::fs::read(store.record_path(&cookie)).expect("read record");
        assert!(!String::from_utf8_lossy(&raw).contains("access-1"));
    }

    #[test]
    fn test_reopen_with_same_secret() {
        let dir = temp_store_dir();
        let now = Utc::now();
        let cookie = open_store(dir.path()).create(&session(now)).expect("create");

        let reopened = open_store(dir.path());
        assert!(reopened.load(&cookie, now).expect("load").is_some());

        let other = SessionStore::open(dir.path().to_path_buf(), b"ffffffffffffffffffffffffffffffff", Duration::days(7))
            .expect("open store");
        assert!(other.load(&cookie, now).expect("load").is_none());
        assert!(!other.record_path(&cookie).exists());
    }

    #[test]
    fn test_record_bound_to_cookie() {
        let dir = temp_store_dir();
        let store = open_store(dir.path());
        let now = Utc::now();
        let cookie = store.create(&session(now)).expect("create");

        let other = SessionCookie::generate();
        std::fs::copy(store.record_path(&cookie), store.record_path(&other)).expect("copy record");
        assert!(store.load(&other, now).expect("load").is_none());
        assert!(store.load(&cookie, now).expect("load").is_some());
    }

    #[test]
    fn test_tampered_record_discarded() {
        let dir = temp_store_dir();
        let store = open_store(dir.path());
        let now = Utc::now();
        let cookie = store.create(&session(now)).expect("create");

        let path = store.record_path(&cookie);
        let mut raw = std::fs::read(&path).expect("read");
        raw[20] ^= 0xff;
        std::fs::write(&path, raw).expect("write");

        assert!(store.load(&cookie, now).expect("load").is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_expired_after_max_age() {
        let dir = temp_store_dir();
        let store = open_store(dir.path());
        let issued = Utc::now();
        let cookie = store.create(&session(issued)).expect("create");

        let within = issued + Duration::days(7) - Duration::minutes(1);
        assert!(store.load(&cookie, within).expect("load").is_some());

        let past = issued + Duration::days(7) + Duration::minutes(1);
        assert!(store.load(&cookie, past).expect("load").is_none());
        assert!(store.load(&cookie, within).expect("load").is_none());
    }

    #[test]
    fn test_destroy() {
        let dir = temp_store_dir();
        let store = open_store(dir.path());
        let now = Utc::now();
        let cookie = store.create(&session(now)).expect("create");

        store.destroy(&cookie).expect("destroy");
        assert!(store.load(&cookie, now).expect("load").is_none());
        // Destroying twice is fine
        store.destroy(&cookie).expect("destroy again");
    }

    #[test]
    fn test_purge_expired() {
        let dir = temp_store_dir();
        let store = open_store(dir.path());
        let now = Utc::now();

        let old = store.create(&session(now - Duration::days(8))).expect("create old");
        let fresh = store.create(&session(now)).expect("create fresh");
        std::fs::write(dir.path().join(format!("junk.{}", RECORD_EXTENSION)), b"junk").expect("write junk");

        assert_eq!(store.purge_expired(now).expect("purge"), 2);
        assert!(!store.record_path(&old).exists());
        assert!(store.load(&fresh, now).expect("load").is_some());
        assert!(dir.path().join(SALT_FILE).exists());
    }
}
