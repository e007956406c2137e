//! Mood-matched playlist suggestions with a per-user 24h cache

use chrono::{DateTime, Duration, Utc};
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::WellnessError;
use crate::music::catalog::{CatalogPlaylist, MusicCatalog};
use crate::store::Database;
use crate::types::Playlist;

/// How long an unsaved suggestion is reused for the same category
pub const PLAYLIST_CACHE_HOURS: i64 = 24;

pub const DEFAULT_CATEGORY: &str = "chill";

/// Map a mood label to the catalog category searched for it
pub fn category_for(mood: &str) -> &'static str {
    match mood.trim().to_ascii_lowercase().as_str() {
        "stressed" => "calm",
        "tired" => "relax",
        "happy" => "upbeat",
        "sad" => "chill",
        "angry" => "energetic",
        "calm" => "chill",
        "neutral" => "chill",
        _ => DEFAULT_CATEGORY,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistSuggestion {
    pub playlist_id: String,
    pub name: String,
    pub mood: String,
}

fn access_token(db: &Database, user_id: &str, now: DateTime<Utc>) -> Result<String, WellnessError> {
    let user = db
        .user(user_id)
        .ok_or_else(|| WellnessError::not_found("User"))?;
    let token = user
        .music_token
        .as_ref()
        .filter(|t| !t.access_token.is_empty())
        .ok_or_else(|| WellnessError::invalid("music account not linked"))?;
    if token.is_expired(now) {
        tracing::info!(user_id, expires_at = ?token.expires_at(), "music token expired");
        return Err(WellnessError::MusicTokenExpired);
    }
    Ok(token.access_token.clone())
}

fn cached<'a>(
    db: &'a Database,
    user_id: &str,
    category: &str,
    now: DateTime<Utc>,
) -> Option<&'a Playlist> {
    let cutoff = now - Duration::hours(PLAYLIST_CACHE_HOURS);
    db.playlists
        .iter()
        .filter(|p| {
            p.user_id == user_id && p.category == category && !p.saved && p.created_at >= cutoff
        })
        .max_by_key(|p| p.created_at)
}

fn search_excluding<C: MusicCatalog + ?Sized>(
    catalog: &C,
    token: &str,
    query: &str,
    limit: usize,
    exclude: Option<&str>,
) -> Result<Vec<CatalogPlaylist>, WellnessError> {
    let found = catalog.search_playlists(token, query, limit)?;
    Ok(found
        .into_iter()
        .filter(|p| exclude != Some(p.id.as_str()))
        .collect())
}

/// Suggest a playlist for `mood`, reusing the cached one unless `skip` is set
#[allow(clippy::too_many_arguments)]
pub fn suggest<C, R>(
    db: &mut Database,
    catalog: &C,
    rng: &mut R,
    user_id: &str,
    mood: &str,
    skip: bool,
    limit: usize,
    now: DateTime<Utc>,
) -> Result<PlaylistSuggestion, WellnessError>
where
    C: MusicCatalog + ?Sized,
    R: Rng + ?Sized,
{
    let token = access_token(db, user_id, now)?;
    let mood = mood.trim().to_ascii_lowercase();
    let category = category_for(&mood);

    let current = cached(db, user_id, category, now).cloned();
    if let (false, Some(hit)) = (skip, &current) {
        tracing::info!(user_id, playlist_id = %hit.playlist_id, "returning cached playlist");
        return Ok(PlaylistSuggestion {
            playlist_id: hit.playlist_id.clone(),
            name: hit.name.clone(),
            mood,
        });
    }

    let exclude = current.as_ref().map(|p| p.playlist_id.as_str());
    let mut available = search_excluding(
        catalog,
        &token,
        &format!("category:{category}"),
        limit,
        exclude,
    )?;
    if available.is_empty() {
        tracing::warn!(user_id, category, "no new playlists available, retrying search");
        available = search_excluding(
            catalog,
            &token,
            &format!("category:{category} calm"),
            limit,
            exclude,
        )?;
    }

    let picked = available
        .choose(rng)
        .cloned()
        .ok_or_else(|| WellnessError::NoPlaylists(category.to_string()))?;

    match db
        .playlists
        .iter_mut()
        .find(|p| p.user_id == user_id && p.playlist_id == picked.id)
    {
        None => {
            db.playlists.push(Playlist {
                user_id: user_id.to_string(),
                playlist_id: picked.id.clone(),
                name: picked.name.clone(),
                category: category.to_string(),
                created_at: now,
                saved: false,
            });
            tracing::info!(user_id, playlist_id = %picked.id, "new playlist saved");
        }
        Some(existing) if skip => {
            existing.created_at = now;
            existing.saved = false;
        }
        Some(_) => {}
    }

    Ok(PlaylistSuggestion {
        playlist_id: picked.id,
        name: picked.name,
        mood,
    })
}

/// Mark a suggested playlist as saved (or not) by its owner
pub fn set_saved(
    db: &mut Database,
    user_id: &str,
    playlist_id: &str,
    saved: bool,
) -> Result<Playlist, WellnessError> {
    let playlist = db
        .playlists
        .iter_mut()
        .find(|p| p.user_id == user_id && p.playlist_id == playlist_id)
        .ok_or_else(|| WellnessError::not_found("Playlist"))?;
    playlist.saved = saved;
    tracing::info!(user_id, playlist_id, saved, "playlist updated");
    Ok(playlist.clone())
}

pub fn saved_playlists(db: &Database, user_id: &str) -> Vec<Playlist> {
    db.playlists
        .iter()
        .filter(|p| p.user_id == user_id && p.saved)
        .cloned()
        .collect()
}

/// Forget the music token and the user's saved playlists
pub fn unlink(db: &mut Database, user_id: &str) -> Result<usize, WellnessError> {
    let user = db
        .user_mut(user_id)
        .ok_or_else(|| WellnessError::not_found("User"))?;
    user.music_token = None;

    let before = db.playlists.len();
    db.playlists.retain(|p| !(p.user_id == user_id && p.saved));
    let removed = before - db.playlists.len();
    tracing::info!(user_id, removed, "music account unlinked");
    Ok(removed)
}
