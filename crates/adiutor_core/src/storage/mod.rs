use crate::error::AppError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub mod json_store;

const DATA_DIR_ENV_VAR: &str = "ADIUTOR_DATA_DIR";

/// Persisted key-value storage. Values are JSON documents.
pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>, AppError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove(&mut self, key: &str) -> Result<(), AppError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonDirStorage {
    dir: PathBuf,
}

impl JsonDirStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for JsonDirStorage {
    fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))
    }

    /// Writes through a sibling temp file and renames it over the target,
    /// so concurrent readers see either the old or the new document.
    fn write(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, value)
            .map_err(|err| AppError::io(format!("{}: {}", tmp.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&tmp, permissions)?;
        }

        std::fs::rename(&tmp, &path)
            .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}

pub fn data_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(DATA_DIR_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("adiutor"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("adiutor"))
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonDirStorage, MemoryStorage, Storage};

    #[test]
    fn dir_storage_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonDirStorage::new(dir.path().join("nested"));

        assert_eq!(storage.read("tasks").unwrap(), None);
        storage.write("tasks", "{\"a\":1}").unwrap();
        assert_eq!(storage.read("tasks").unwrap().as_deref(), Some("{\"a\":1}"));
        assert!(storage.path_for("tasks").ends_with("nested/tasks.json"));

        storage.remove("tasks").unwrap();
        storage.remove("tasks").unwrap();
        assert_eq!(storage.read("tasks").unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn dir_storage_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonDirStorage::new(dir.path());
        storage.write("streak_v2", "{}").unwrap();

        let mode = std::fs::metadata(storage.path_for("streak_v2"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn dir_storage_replaces_without_leaving_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonDirStorage::new(dir.path());
        storage.write("tasks", "[1]").unwrap();
        storage.write("tasks", "[1,2]").unwrap();

        assert_eq!(storage.read("tasks").unwrap().as_deref(), Some("[1,2]"));
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["tasks.json".to_string()]);
    }

    #[test]
    fn memory_storage_overwrites() {
        let mut storage = MemoryStorage::new().with_entry("k", "1");
        storage.write("k", "2").unwrap();
        assert_eq!(storage.get("k"), Some("2"));
    }
}
