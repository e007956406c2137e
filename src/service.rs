//! Stateful facade over the Screenwise operations
//!
//! `Wellness` owns the database and the music catalog and stamps every call
//! with the current time. Use the module functions directly when the clock
//! or randomness must be controlled.

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::challenge::{self, progress, LeaderboardEntry, NewChallenge, ProgressOutcome};
use crate::config::Config;
use crate::contact;
use crate::error::WellnessError;
use crate::mood::{self, MoodOutcome};
use crate::music::playlist::{self, PlaylistSuggestion};
use crate::music::MusicCatalog;
use crate::recommend::{self, RecommendationView};
use crate::screen_time::{self, ScreenTimeUpload};
use crate::store::Database;
use crate::types::{
    Challenge, ContactMessage, Mood, MoodEntry, MusicToken, Playlist, Preferences,
    Recommendation, ScreenTimeDay, User,
};
use crate::user::{self, Profile};

pub struct Wellness<C: MusicCatalog> {
    db: Database,
    catalog: C,
    store_path: Option<PathBuf>,
    search_limit: usize,
}

impl<C: MusicCatalog> Wellness<C> {
    /// In-memory instance; `save` is a no-op
    pub fn new(catalog: C) -> Self {
        Self {
            db: Database::new(),
            catalog,
            store_path: None,
            search_limit: Config::default().music.search_limit,
        }
    }

    /// Open the store named by `config`, creating it on first save
    pub fn open(config: &Config, catalog: C) -> Result<Self, WellnessError> {
        let db = Database::load(&config.store.path)?;
        tracing::debug!(path = %config.store.path.display(), records = db.record_count(), "store opened");
        Ok(Self {
            db,
            catalog,
            store_path: Some(config.store.path.clone()),
            search_limit: config.music.search_limit,
        })
    }

    pub fn save(&self) -> Result<(), WellnessError> {
        match &self.store_path {
            Some(path) => self.db.save(path),
            None => Ok(()),
        }
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref()
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // Users

    pub fn register(&mut self, username: &str, email: &str) -> Result<User, WellnessError> {
        user::register(&mut self.db, username, email, Utc::now())
    }

    pub fn profile(&self, user_id: &str) -> Result<Profile, WellnessError> {
        user::profile(&self.db, user_id)
    }

    pub fn update_settings(
        &mut self,
        user_id: &str,
        preferences: Preferences,
    ) -> Result<Preferences, WellnessError> {
        user::update_settings(&mut self.db, user_id, preferences)
    }

    pub fn link_music(&mut self, user_id: &str, token: MusicToken) -> Result<(), WellnessError> {
        user::link_music(&mut self.db, user_id, token)
    }

    // Screen time and mood

    pub fn ingest_screen_time(
        &mut self,
        user_id: &str,
        upload: ScreenTimeUpload,
    ) -> Result<ScreenTimeDay, WellnessError> {
        screen_time::ingest(&mut self.db, user_id, upload, Utc::now())
    }

    pub fn screen_time_history(&self, user_id: &str) -> Vec<ScreenTimeDay> {
        screen_time::history(&self.db, user_id)
    }

    pub fn record_mood(
        &mut self,
        user_id: &str,
        mood: Mood,
        confidence: f64,
    ) -> Result<MoodOutcome, WellnessError> {
        mood::record(&mut self.db, user_id, mood, confidence, Utc::now())
    }

    pub fn latest_mood(&self, user_id: &str) -> Result<MoodEntry, WellnessError> {
        mood::latest(&self.db, user_id)
    }

    // Recommendations

    pub fn recommend(&mut self, user_id: &str) -> Result<RecommendationView, WellnessError> {
        let mut rng = rand::rng();
        recommend::generate(
            &mut self.db,
            &self.catalog,
            &mut rng,
            user_id,
            self.search_limit,
            Utc::now(),
        )
    }

    pub fn recent_recommendations(&self, user_id: &str) -> Vec<Recommendation> {
        recommend::recent(&self.db, user_id)
    }

    pub fn set_recommendation_accepted(
        &mut self,
        user_id: &str,
        recommendation_id: &str,
        accepted: bool,
    ) -> Result<Recommendation, WellnessError> {
        recommend::set_accepted(&mut self.db, user_id, recommendation_id, accepted)
    }

    // Music

    pub fn suggest_playlist(
        &mut self,
        user_id: &str,
        mood: &str,
        skip: bool,
    ) -> Result<PlaylistSuggestion, WellnessError> {
        let mut rng = rand::rng();
        playlist::suggest(
            &mut self.db,
            &self.catalog,
            &mut rng,
            user_id,
            mood,
            skip,
            self.search_limit,
            Utc::now(),
        )
    }

    pub fn set_playlist_saved(
        &mut self,
        user_id: &str,
        playlist_id: &str,
        saved: bool,
    ) -> Result<Playlist, WellnessError> {
        playlist::set_saved(&mut self.db, user_id, playlist_id, saved)
    }

    pub fn saved_playlists(&self, user_id: &str) -> Vec<Playlist> {
        playlist::saved_playlists(&self.db, user_id)
    }

    pub fn unlink_music(&mut self, user_id: &str) -> Result<usize, WellnessError> {
        playlist::unlink(&mut self.db, user_id)
    }

    // Challenges

    pub fn create_challenge(&mut self, new: NewChallenge) -> Result<Challenge, WellnessError> {
        challenge::create(&mut self.db, new, Utc::now())
    }

    pub fn visible_challenges(&self) -> Vec<Challenge> {
        challenge::visible(&self.db, Utc::now())
    }

    pub fn join_challenge(
        &mut self,
        challenge_id: &str,
        user_id: &str,
    ) -> Result<Challenge, WellnessError> {
        challenge::join(&mut self.db, challenge_id, user_id)
    }

    pub fn update_progress(
        &mut self,
        challenge_id: &str,
        user_id: &str,
        manual: bool,
    ) -> Result<ProgressOutcome, WellnessError> {
        progress::update(&mut self.db, challenge_id, user_id, manual, Utc::now())
    }

    pub fn leaderboard(&self, challenge_id: &str) -> Result<Vec<LeaderboardEntry>, WellnessError> {
        challenge::leaderboard(&self.db, challenge_id)
    }

    // Contact

    pub fn submit_contact(
        &mut self,
        name: &str,
        email: &str,
        message: &str,
    ) -> Result<ContactMessage, WellnessError> {
        contact::submit(&mut self.db, name, email, message, Utc::now())
    }
}
