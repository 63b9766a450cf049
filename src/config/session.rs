//! The signed-in session, persisted between CLI invocations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::Config;
use crate::auth::Session;

/// Contents of `session.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFile {
    /// Current signed-in user, if any
    #[serde(default)]
    pub current: Option<Session>,
}

impl SessionFile {
    /// Load session from disk
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read session from {:?}", path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse session.json")
        } else {
            Ok(Self::default())
        }
    }

    /// Save session to disk
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize session")?;

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write session to {:?}", path))?;

        Ok(())
    }

    /// Get the path to the session file
    pub fn default_path() -> Result<PathBuf> {
        Ok(Config::data_dir()?.join("session.json"))
    }

    /// The signed-in session, or an error telling the user to log in
    pub fn require(&self) -> Result<&Session> {
        self.current.as_ref().context("Not logged in. Run `skillpath login <email>` first.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    #[test]
    fn default_is_signed_out() {
        let file = SessionFile::default();
        assert!(file.current.is_none());
        assert!(file.require().is_err());
    }

    #[test]
    fn missing_file_reads_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::load_from(&dir.path().join("session.json")).unwrap();
        assert_eq!(file, SessionFile::default());
    }

    #[test]
    fn session_survives_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let file = SessionFile { current: Some(Session::new("u1", Role::Professor)) };
        file.save_to(&path).unwrap();

        let loaded = SessionFile::load_from(&path).unwrap();
        assert_eq!(loaded.require().unwrap().role, Role::Professor);
    }
}
