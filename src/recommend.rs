//! Recommendation engine
//!
//! Combines today's screen time with the latest mood to pick a break,
//! message or music recommendation. Every recommendation is stored together
//! with a trigger link recording which signal produced it.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::WellnessError;
use crate::mood;
use crate::music::{playlist, MusicCatalog};
use crate::screen_time;
use crate::store::Database;
use crate::types::{new_id, Mood, Recommendation, RecommendationKind, TriggerLink, TriggerSource};

/// Screen time (minutes) above which stress triggers calming music
pub const STRESSED_MUSIC_MINUTES: f64 = 300.0;
/// Screen time (minutes) above which tiredness triggers relaxing music
pub const TIRED_MUSIC_MINUTES: f64 = 180.0;
/// Screen time (minutes) above which a break is suggested when no mood is known
pub const BREAK_MINUTES: f64 = 120.0;
/// Number of recommendations returned by [`recent`]
pub const RECENT_LIMIT: usize = 5;

const DEFAULT_MESSAGE: &str = "Keep up the good work!";
const HAPPY_MESSAGE: &str = "You're doing great!";
const BREAK_MESSAGE: &str = "Take a 5-minute break";

/// What the client shows to the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationView {
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone)]
struct Draft {
    kind: RecommendationKind,
    details: serde_json::Value,
    trigger: serde_json::Value,
    source: TriggerSource,
    note: String,
}

impl Draft {
    fn default_message() -> Self {
        Self {
            kind: RecommendationKind::Message,
            details: json!({ "message": DEFAULT_MESSAGE }),
            trigger: json!({ "message": "No specific conditions met" }),
            source: TriggerSource::Default,
            note: "Default recommendation".to_string(),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn music_draft<C, R>(
    db: &mut Database,
    catalog: &C,
    rng: &mut R,
    user_id: &str,
    music_mood: Mood,
    trigger: serde_json::Value,
    note: &str,
    limit: usize,
    now: DateTime<Utc>,
) -> Draft
where
    C: MusicCatalog + ?Sized,
    R: Rng + ?Sized,
{
    match playlist::suggest(db, catalog, rng, user_id, music_mood.as_str(), false, limit, now) {
        Ok(suggestion) => {
            tracing::info!(user_id, playlist_id = %suggestion.playlist_id, "music recommendation triggered");
            Draft {
                kind: RecommendationKind::Music,
                details: json!({
                    "playlist_id": suggestion.playlist_id,
                    "name": suggestion.name,
                }),
                trigger,
                source: TriggerSource::Mood,
                note: note.to_string(),
            }
        }
        Err(e) => {
            tracing::error!(user_id, error = %e, "music lookup failed");
            let mut draft = Draft::default_message();
            draft.note.push_str(&format!(" (music lookup failed: {e})"));
            draft
        }
    }
}

/// Generate, store and return a recommendation for the user
pub fn generate<C, R>(
    db: &mut Database,
    catalog: &C,
    rng: &mut R,
    user_id: &str,
    playlist_limit: usize,
    now: DateTime<Utc>,
) -> Result<RecommendationView, WellnessError>
where
    C: MusicCatalog + ?Sized,
    R: Rng + ?Sized,
{
    let today = screen_time::ensure_day(db, user_id, now.date_naive(), now);
    let minutes = today.total_time / 60.0;
    let latest_mood = mood::latest(db, user_id).ok().map(|m| m.mood);

    tracing::debug!(user_id, minutes, mood = ?latest_mood, "evaluating recommendation");

    // Most specific conditions first
    let draft = match latest_mood {
        Some(Mood::Stressed) if minutes > STRESSED_MUSIC_MINUTES => music_draft(
            db,
            catalog,
            rng,
            user_id,
            Mood::Calm,
            json!({ "screen_time": ">5h", "mood": "stressed" }),
            "Music suggested for stress",
            playlist_limit,
            now,
        ),
        Some(Mood::Tired) if minutes > TIRED_MUSIC_MINUTES => music_draft(
            db,
            catalog,
            rng,
            user_id,
            Mood::Tired,
            json!({ "screen_time": ">3h", "mood": "tired" }),
            "Music suggested for tiredness",
            playlist_limit,
            now,
        ),
        Some(Mood::Happy) => Draft {
            kind: RecommendationKind::Message,
            details: json!({ "message": HAPPY_MESSAGE }),
            trigger: json!({ "mood": "happy" }),
            source: TriggerSource::Mood,
            note: "Triggered by positive mood".to_string(),
        },
        None if minutes > BREAK_MINUTES => Draft {
            kind: RecommendationKind::Break,
            details: json!({ "message": BREAK_MESSAGE, "duration_minutes": 5 }),
            trigger: json!({ "screen_time": ">2h" }),
            source: TriggerSource::ScreenTime,
            note: "Long screen session without mood data".to_string(),
        },
        _ => Draft::default_message(),
    };

    let recommendation = Recommendation {
        recommendation_id: new_id("rec"),
        user_id: user_id.to_string(),
        timestamp: now,
        kind: draft.kind,
        details: draft.details.clone(),
        trigger: draft.trigger,
        accepted: false,
    };
    tracing::info!(
        user_id,
        recommendation_id = %recommendation.recommendation_id,
        kind = ?recommendation.kind,
        "recommendation saved"
    );

    let link = TriggerLink {
        trigger_link_id: new_id("tl"),
        from_source: draft.source,
        recommendation_id: recommendation.recommendation_id.clone(),
        timestamp: now,
        note: Some(draft.note),
    };
    tracing::info!(user_id, trigger_link_id = %link.trigger_link_id, source = ?link.from_source, "trigger link created");

    db.recommendations.push(recommendation);
    db.trigger_links.push(link);

    Ok(RecommendationView {
        kind: draft.kind,
        details: draft.details,
    })
}

/// The user's newest recommendations
pub fn recent(db: &Database, user_id: &str) -> Vec<Recommendation> {
    let mut recs: Vec<Recommendation> = db
        .recommendations
        .iter()
        .filter(|r| r.user_id == user_id)
        .cloned()
        .collect();
    recs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    recs.truncate(RECENT_LIMIT);
    recs
}

pub fn set_accepted(
    db: &mut Database,
    user_id: &str,
    recommendation_id: &str,
    accepted: bool,
) -> Result<Recommendation, WellnessError> {
    let rec = db
        .recommendations
        .iter_mut()
        .find(|r| r.recommendation_id == recommendation_id && r.user_id == user_id)
        .ok_or_else(|| WellnessError::not_found("Recommendation"))?;
    rec.accepted = accepted;
    tracing::info!(user_id, recommendation_id, accepted, "recommendation updated");
    Ok(rec.clone())
}

pub fn triggers_for<'a>(db: &'a Database, recommendation_id: &str) -> Vec<&'a TriggerLink> {
    db.trigger_links
        .iter()
        .filter(|l| l.recommendation_id == recommendation_id)
        .collect()
}
