//! In-process document store
//!
//! The database keeps one typed collection per record kind and persists as a
//! single JSON snapshot. Lookups are linear scans; collections hold one user's
//! or one deployment's worth of data.
//!
//! A snapshot has a single writer. `save` replaces the whole file, so two
//! processes saving the same path concurrently keep only the last write.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::WellnessError;
use crate::types::{
    Challenge, ContactMessage, MoodEntry, Playlist, Recommendation, ScreenTimeDay, TriggerLink,
    User,
};

/// Snapshot format version written into every saved file
pub const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "store_version")]
    pub version: u32,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub screen_time: Vec<ScreenTimeDay>,
    #[serde(default)]
    pub moods: Vec<MoodEntry>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub trigger_links: Vec<TriggerLink>,
    #[serde(default)]
    pub playlists: Vec<Playlist>,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
    #[serde(default)]
    pub contact_messages: Vec<ContactMessage>,
}

fn store_version() -> u32 {
    STORE_VERSION
}

impl Database {
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION,
            ..Default::default()
        }
    }

    /// Load a snapshot from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize the snapshot to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from `path`; a missing file yields an empty database
    pub fn load(path: &Path) -> Result<Self, WellnessError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no snapshot found, starting empty");
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let db = Self::from_json(&content)?;
        if db.version > STORE_VERSION {
            return Err(WellnessError::Config(format!(
                "snapshot version {} is newer than supported version {}",
                db.version, STORE_VERSION
            )));
        }
        Ok(db)
    }

    /// Write the snapshot to `path` via a sibling temp file and rename
    pub fn save(&self, path: &Path) -> Result<(), WellnessError> {
        let json = self.to_json()?;
        let tmp = path.with_extension("json.tmp");
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let written = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(json.as_bytes())?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!(path = %path.display(), bytes = json.len(), "snapshot saved");
        Ok(())
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.user_id == user_id)
    }

    pub fn user_mut(&mut self, user_id: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.user_id == user_id)
    }

    pub fn challenge(&self, challenge_id: &str) -> Option<&Challenge> {
        self.challenges.iter().find(|c| c.challenge_id == challenge_id)
    }

    pub fn challenge_mut(&mut self, challenge_id: &str) -> Option<&mut Challenge> {
        self.challenges
            .iter_mut()
            .find(|c| c.challenge_id == challenge_id)
    }

    /// Number of records across all collections
    pub fn record_count(&self) -> usize {
        self.users.len()
            + self.screen_time.len()
            + self.moods.len()
            + self.recommendations.len()
            + self.trigger_links.len()
            + self.playlists.len()
            + self.challenges.len()
            + self.contact_messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mood, Preferences};
    use chrono::{TimeZone, Utc};

    fn sample_db() -> Database {
        let mut db = Database::new();
        db.users.push(User {
            user_id: "user_1".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            music_token: None,
            preferences: Preferences::default(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        });
        db.moods.push(MoodEntry {
            user_id: "user_1".into(),
            mood: Mood::Calm,
            confidence: 0.8,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap(),
        });
        db
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(db.record_count(), 0);
        assert_eq!(db.version, STORE_VERSION);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");
        let db = sample_db();
        db.save(&path).unwrap();

        let loaded = Database::load(&path).unwrap();
        assert_eq!(loaded.record_count(), 2);
        assert_eq!(loaded.user("user_1").unwrap().username, "ada");
        assert_eq!(loaded.moods[0].mood, Mood::Calm);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::create_dir(&path).unwrap();

        assert!(matches!(sample_db().save(&path), Err(WellnessError::Io(_))));
        assert!(!path.with_extension("json.tmp").exists());
        assert!(path.is_dir());
    }

    #[test]
    fn test_newer_snapshot_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        std::fs::write(&path, r#"{"version": 99}"#).unwrap();
        assert!(matches!(Database::load(&path), Err(WellnessError::Config(_))));
    }

    #[test]
    fn test_partial_snapshot_defaults() {
        let db = Database::from_json(r#"{"users": []}"#).unwrap();
        assert_eq!(db.version, STORE_VERSION);
        assert!(db.challenges.is_empty());
    }
}
