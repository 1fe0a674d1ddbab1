//! Local user profile persistence with file locking.
//!
//! The profile carries the user id stamped on every workout record. It is
//! created on first use and written atomically afterwards.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// The local user
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl UserProfile {
    pub fn new() -> Self {
        Self {
            user_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    /// Load a profile with a shared lock. `None` if the file doesn't exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let profile = serde_json::from_str(&contents)?;
        tracing::debug!("Loaded profile from {:?}", path);
        Ok(Some(profile))
    }

    /// Load the profile, creating and saving a fresh one if missing.
    ///
    /// A corrupted profile is replaced (with a warning) rather than blocking
    /// workouts; past records keep the old user id.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(Some(profile)) => return Ok(profile),
            Ok(None) => tracing::info!("No profile found, creating one"),
            Err(Error::Json(e)) => {
                tracing::warn!("Failed to parse profile {:?}: {}. Creating a new one.", path, e)
            }
            Err(e) => return Err(e),
        }

        let profile = Self::new();
        profile.save(path)?;
        Ok(profile)
    }

    /// Save atomically: temp file, fsync, rename over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "profile path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile to {:?}", path);
        Ok(())
    }
}
