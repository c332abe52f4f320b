// Persistent storage module
//
// Key-based JSON persistence for the pantry, profile and cookbook. Storage
// is best-effort: load failures fall back to the type's default and save
// failures are logged and swallowed, so no storage error ever reaches the
// session logic.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;

/// Storage key for the pantry item list.
pub const PANTRY_KEY: &str = "nutrisage_pantry_v1";

/// Storage key for the dietary profile.
pub const PROFILE_KEY: &str = "nutrisage_profile_v1";

/// Storage key for the user-created recipe collection.
pub const USER_RECIPES_KEY: &str = "nutrisage_my_recipes_v1";

/// Key-based JSON store backed by one file per key.
///
/// Keys are independent: there is no cross-key transaction, no partial
/// write handling and no schema versioning. A stored shape that no longer
/// matches current expectations is replaced by the default on the next
/// load.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: Utf8PathBuf,
}

impl Store {
    /// Create a store rooted at `data_dir`, creating the directory if
    /// needed.
    pub fn new<P: AsRef<Utf8Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        if !data_dir.exists() {
            fs::create_dir_all(&data_dir)
                .with_context(|| format!("Failed to create data directory: {}", data_dir))?;
        }

        Ok(Self { data_dir })
    }

    fn path_for(&self, key: &str) -> Utf8PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }

    /// Load the value stored under `key`, or the type's default.
    ///
    /// A missing file is the normal first-run case and logs at debug; read
    /// and parse failures log a warning. Neither is surfaced to the caller.
    pub fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path_for(key);

        if !path.exists() {
            tracing::debug!("No stored entry for {}, using default", key);
            return T::default();
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}, using default", path, e);
                return T::default();
            }
        };

        match serde_json::from_str(&contents) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}, using default", path, e);
                T::default()
            }
        }
    }

    /// Serialize `value` and write it under `key`.
    ///
    /// Failures are logged and swallowed; persistence is non-critical to
    /// session correctness.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let path = self.path_for(key);

        let json = match serde_json::to_string_pretty(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize entry for {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = fs::write(&path, json) {
            tracing::warn!("Failed to write {}: {}", path, e);
        } else {
            tracing::debug!("Saved {} entry to {}", key, path);
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserProfile;
    use tempfile::TempDir;

    fn create_test_store() -> (Store, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let store = Store::new(&path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_missing_key_yields_default() {
        let (store, _temp_dir) = create_test_store();
        let pantry: Vec<String> = store.load_or_default(PANTRY_KEY);
        assert!(pantry.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (store, _temp_dir) = create_test_store();

        let pantry = vec!["eggs".to_string(), "spinach".to_string()];
        store.save(PANTRY_KEY, &pantry);

        let loaded: Vec<String> = store.load_or_default(PANTRY_KEY);
        assert_eq!(loaded, pantry);
    }

    #[test]
    fn test_keys_are_independent() {
        let (store, _temp_dir) = create_test_store();

        store.save(PANTRY_KEY, &vec!["rice".to_string()]);
        let profile: UserProfile = store.load_or_default(PROFILE_KEY);
        assert!(profile.allergies.is_empty());

        store.save(
            PROFILE_KEY,
            &UserProfile {
                allergies: vec!["peanuts".to_string()],
                dislikes: vec![],
            },
        );

        let pantry: Vec<String> = store.load_or_default(PANTRY_KEY);
        assert_eq!(pantry, vec!["rice"]);
    }

    #[test]
    fn test_corrupt_entry_yields_default() {
        let (store, _temp_dir) = create_test_store();

        let path = store.data_dir().join(format!("{}.json", PROFILE_KEY));
        fs::write(&path, "{ not valid json").unwrap();

        let profile: UserProfile = store.load_or_default(PROFILE_KEY);
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn test_shape_mismatch_yields_default() {
        let (store, _temp_dir) = create_test_store();

        // A stored array where an object is expected
        let path = store.data_dir().join(format!("{}.json", PROFILE_KEY));
        fs::write(&path, r#"["not", "a", "profile"]"#).unwrap();

        let profile: UserProfile = store.load_or_default(PROFILE_KEY);
        assert_eq!(profile, UserProfile::default());
    }

    #[test]
    fn test_creates_data_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = Utf8PathBuf::try_from(temp_dir.path().to_path_buf())
            .unwrap()
            .join("nested")
            .join("data");

        let store = Store::new(&nested).unwrap();
        assert!(store.data_dir().exists());
    }
}
