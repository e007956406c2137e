//! User accounts, settings and music-account linking
//!
//! Credentials are handled by the caller; a user here is an identity with a
//! display name, preferences and an optional music token.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::error::WellnessError;
use crate::store::Database;
use crate::types::{new_id, MusicToken, Preferences, User};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^.+@.+\..+$").expect("static email pattern"))
}

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub music_linked: bool,
    pub preferences: Preferences,
}

pub fn register(
    db: &mut Database,
    username: &str,
    email: &str,
    now: DateTime<Utc>,
) -> Result<User, WellnessError> {
    let username = username.trim();
    let email = email.trim();

    if username.is_empty() {
        return Err(WellnessError::invalid("username is required"));
    }
    if !email_pattern().is_match(email) {
        return Err(WellnessError::invalid(format!("invalid email: {email}")));
    }
    if db.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
        tracing::warn!(email, "signup rejected, email already exists");
        return Err(WellnessError::Conflict("email already exists".into()));
    }
    if db.users.iter().any(|u| u.username == username) {
        return Err(WellnessError::Conflict("username already taken".into()));
    }

    let user = User {
        user_id: new_id("user"),
        username: username.to_string(),
        email: email.to_string(),
        music_token: None,
        preferences: Preferences::default(),
        created_at: now,
    };
    db.users.push(user.clone());
    tracing::info!(user_id = %user.user_id, "user registered");
    Ok(user)
}

pub fn profile(db: &Database, user_id: &str) -> Result<Profile, WellnessError> {
    let user = db
        .user(user_id)
        .ok_or_else(|| WellnessError::not_found("User"))?;
    Ok(Profile {
        user_id: user.user_id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        music_linked: user.music_token.is_some(),
        preferences: user.preferences.clone(),
    })
}

pub fn update_settings(
    db: &mut Database,
    user_id: &str,
    preferences: Preferences,
) -> Result<Preferences, WellnessError> {
    let user = db
        .user_mut(user_id)
        .ok_or_else(|| WellnessError::not_found("User"))?;
    user.preferences = preferences;
    tracing::info!(user_id, "settings saved");
    Ok(user.preferences.clone())
}

/// Store a music token the client obtained from the provider
pub fn link_music(
    db: &mut Database,
    user_id: &str,
    token: MusicToken,
) -> Result<(), WellnessError> {
    if token.access_token.trim().is_empty() {
        return Err(WellnessError::invalid("access token is required"));
    }
    if token.expires_in <= 0 {
        return Err(WellnessError::invalid("expires_in must be positive"));
    }
    if token.expires_at().is_none() {
        return Err(WellnessError::invalid("expires_in is out of range"));
    }
    let user = db
        .user_mut(user_id)
        .ok_or_else(|| WellnessError::not_found("User"))?;
    user.music_token = Some(token);
    tracing::info!(user_id, "music account linked");
    Ok(())
}
