/*
[INPUT]:  Signed-in email and a storage location
[OUTPUT]: Durable single-key (`userEmail`) session cache
[POS]:    Session layer - local persistence so a restart can rehydrate the session
[UPDATE]: When the cache file format or default location changes
*/

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;

use crate::error::{Result, RewardsError};

/// Key under which the signed-in email is stored
pub const USER_EMAIL_KEY: &str = "userEmail";

/// Local persistent cache holding the signed-in email
pub trait SessionCache: Send + Sync + Debug {
    fn load_email(&self) -> Result<Option<String>>;

    fn save_email(&self, email: &str) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// JSON file cache, written atomically through a temp file in the same directory
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// `<data_dir>/zero2hero/session.json`, falling back to the working directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("zero2hero")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|err| {
            RewardsError::Storage(format!(
                "corrupt session cache {}: {err}",
                self.path.display()
            ))
        })
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let parent_dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent_dir)?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)?;
        let json_str = serde_json::to_string_pretty(entries)?;
        temp_file.write_all(json_str.as_bytes())?;
        temp_file.flush()?;
        temp_file
            .persist(&self.path)
            .map_err(|err| RewardsError::Storage(err.to_string()))?;

        Ok(())
    }
}

impl SessionCache for FileSessionCache {
    fn load_email(&self) -> Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(USER_EMAIL_KEY)
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty()))
    }

    fn save_email(&self, email: &str) -> Result<()> {
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(USER_EMAIL_KEY.to_string(), email.to_string());
        self.write_entries(&entries)
    }

    fn clear(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut entries = self.read_entries().unwrap_or_default();
        entries.remove(USER_EMAIL_KEY);
        self.write_entries(&entries)
    }
}

/// In-process cache for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemorySessionCache {
    email: RwLock<Option<String>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(email: &str) -> Self {
        Self {
            email: RwLock::new(Some(email.to_string())),
        }
    }
}

impl SessionCache for MemorySessionCache {
    fn load_email(&self) -> Result<Option<String>> {
        let guard = self
            .email
            .read()
            .map_err(|_| RewardsError::Storage("session cache lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save_email(&self, email: &str) -> Result<()> {
        let mut guard = self
            .email
            .write()
            .map_err(|_| RewardsError::Storage("session cache lock poisoned".to_string()))?;
        *guard = Some(email.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .email
            .write()
            .map_err(|_| RewardsError::Storage("session cache lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_cache_round_trips_email() {
        let tmp_dir = TempDir::new().unwrap();
        let cache = FileSessionCache::new(tmp_dir.path().join("session.json"));

        assert_eq!(cache.load_email().unwrap(), None);
        cache.save_email("a@x.com").unwrap();
        assert_eq!(cache.load_email().unwrap(), Some("a@x.com".to_string()));

        let raw = fs::read_to_string(cache.path()).unwrap();
        assert!(raw.contains(USER_EMAIL_KEY));
    }

    #[test]
    fn file_cache_clear_removes_email() {
        let tmp_dir = TempDir::new().unwrap();
        let cache = FileSessionCache::new(tmp_dir.path().join("nested").join("session.json"));

        cache.save_email("a@x.com").unwrap();
        cache.clear().unwrap();
        assert_eq!(cache.load_email().unwrap(), None);
    }

    #[test]
    fn file_cache_clear_without_file_is_noop() {
        let tmp_dir = TempDir::new().unwrap();
        let cache = FileSessionCache::new(tmp_dir.path().join("missing.json"));
        cache.clear().unwrap();
        assert!(!cache.path().exists());
    }

    #[test]
    fn file_cache_reports_corruption() {
        let tmp_dir = TempDir::new().unwrap();
        let path = tmp_dir.path().join("session.json");
        fs::write(&path, "invalid json").unwrap();

        let cache = FileSessionCache::new(&path);
        assert!(matches!(cache.load_email(), Err(RewardsError::Storage(_))));

        // A save overwrites the corrupt file rather than failing forever.
        cache.save_email("b@x.com").unwrap();
        assert_eq!(cache.load_email().unwrap(), Some("b@x.com".to_string()));
    }

    #[test]
    fn memory_cache_lifecycle() {
        let cache = MemorySessionCache::with_email("a@x.com");
        assert_eq!(cache.load_email().unwrap(), Some("a@x.com".to_string()));
        cache.clear().unwrap();
        assert_eq!(cache.load_email().unwrap(), None);
    }
}
