//! Signed-in user remembered as a small JSON file

use bestself_application::SessionStore;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    user_id: String,
}

pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/bestself/session.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("bestself").join("session.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load_user_id(&self) -> io::Result<Option<String>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let session: SessionFile = serde_json::from_str(&raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Some(session.user_id).filter(|id| !id.is_empty()))
    }

    fn save_user_id(&self, user_id: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string(&SessionFile {
            user_id: user_id.to_string(),
        })?;
        std::fs::write(&self.path, body)?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load_user_id().unwrap(), None);
        store.save_user_id("u42").unwrap();
        assert_eq!(store.load_user_id().unwrap().as_deref(), Some("u42"));

        store.clear().unwrap();
        assert_eq!(store.load_user_id().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        let err = FileSessionStore::new(path).load_user_id().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
