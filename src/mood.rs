//! Mood signal intake
//!
//! The client's detector reports a mood every few seconds. Only significant
//! changes are stored: a confidence swing above [`CONFIDENCE_DROP_THRESHOLD`],
//! or a different mood at least [`MIN_MOOD_INTERVAL_SECS`] after the last one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::WellnessError;
use crate::store::Database;
use crate::types::{Mood, MoodEntry};

pub const CONFIDENCE_DROP_THRESHOLD: f64 = 0.2;
pub const MIN_MOOD_INTERVAL_SECS: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "mood", rename_all = "snake_case")]
pub enum MoodOutcome {
    Recorded(MoodEntry),
    /// Nothing significant changed; maps to 204 No Content
    Unchanged,
}

pub fn record(
    db: &mut Database,
    user_id: &str,
    mood: Mood,
    confidence: f64,
    now: DateTime<Utc>,
) -> Result<MoodOutcome, WellnessError> {
    if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
        return Err(WellnessError::invalid("invalid confidence value"));
    }

    let previous = latest_entry(db, user_id);
    let since_secs = previous
        .map(|p| (now - p.timestamp).num_milliseconds() as f64 / 1000.0)
        .unwrap_or(MIN_MOOD_INTERVAL_SECS);
    let confidence_drop = previous
        .map(|p| (confidence - p.confidence).abs())
        .unwrap_or(0.0);
    let mood_changed = previous.map_or(true, |p| p.mood != mood);

    if confidence_drop > CONFIDENCE_DROP_THRESHOLD
        || (since_secs >= MIN_MOOD_INTERVAL_SECS && mood_changed)
    {
        let entry = MoodEntry {
            user_id: user_id.to_string(),
            mood,
            confidence,
            timestamp: now,
        };
        db.moods.push(entry.clone());
        tracing::info!(user_id, %mood, confidence, "mood updated");
        Ok(MoodOutcome::Recorded(entry))
    } else {
        tracing::info!(user_id, %mood, confidence, "no significant mood change, skipping update");
        Ok(MoodOutcome::Unchanged)
    }
}

fn latest_entry<'a>(db: &'a Database, user_id: &str) -> Option<&'a MoodEntry> {
    db.moods
        .iter()
        .filter(|m| m.user_id == user_id)
        .max_by_key(|m| m.timestamp)
}

/// Newest stored mood for the user
pub fn latest(db: &Database, user_id: &str) -> Result<MoodEntry, WellnessError> {
    latest_entry(db, user_id)
        .cloned()
        .ok_or_else(|| WellnessError::not_found("Mood data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_first_mood_is_recorded() {
        let mut db = Database::new();
        let outcome = record(&mut db, "u1", Mood::Calm, 0.7, t0()).unwrap();
        assert!(matches!(outcome, MoodOutcome::Recorded(_)));
        assert_eq!(latest(&db, "u1").unwrap().mood, Mood::Calm);
    }

    #[test]
    fn test_same_mood_is_skipped() {
        let mut db = Database::new();
        record(&mut db, "u1", Mood::Calm, 0.7, t0()).unwrap();
        let outcome = record(&mut db, "u1", Mood::Calm, 0.75, t0() + Duration::minutes(5)).unwrap();
        assert_eq!(outcome, MoodOutcome::Unchanged);
        assert_eq!(db.moods.len(), 1);
    }

    #[test]
    fn test_changed_mood_needs_interval() {
        let mut db = Database::new();
        record(&mut db, "u1", Mood::Calm, 0.7, t0()).unwrap();

        let early = record(&mut db, "u1", Mood::Sad, 0.6, t0() + Duration::seconds(10)).unwrap();
        assert_eq!(early, MoodOutcome::Unchanged);

        let later = record(&mut db, "u1", Mood::Sad, 0.6, t0() + Duration::seconds(30)).unwrap();
        assert!(matches!(later, MoodOutcome::Recorded(_)));
        assert_eq!(latest(&db, "u1").unwrap().mood, Mood::Sad);
    }

    #[test]
    fn test_confidence_swing_overrides_interval() {
        let mut db = Database::new();
        record(&mut db, "u1", Mood::Stressed, 0.9, t0()).unwrap();
        let outcome = record(&mut db, "u1", Mood::Stressed, 0.5, t0() + Duration::seconds(2)).unwrap();
        assert!(matches!(outcome, MoodOutcome::Recorded(_)));
        assert_eq!(db.moods.len(), 2);
    }

    #[test]
    fn test_confidence_swing_threshold_is_strict() {
        let mut db = Database::new();
        record(&mut db, "u1", Mood::Calm, 0.5, t0()).unwrap();

        let at_threshold = record(&mut db, "u1", Mood::Calm, 0.3, t0() + Duration::seconds(1)).unwrap();
        assert_eq!(at_threshold, MoodOutcome::Unchanged);

        let above = record(&mut db, "u1", Mood::Calm, 0.25, t0() + Duration::seconds(2)).unwrap();
        assert!(matches!(above, MoodOutcome::Recorded(_)));
    }

    #[test]
    fn test_invalid_confidence() {
        let mut db = Database::new();
        assert!(record(&mut db, "u1", Mood::Happy, 1.5, t0()).is_err());
        assert!(record(&mut db, "u1", Mood::Happy, -0.1, t0()).is_err());
        assert!(record(&mut db, "u1", Mood::Happy, f64::NAN, t0()).is_err());
    }

    #[test]
    fn test_latest_missing() {
        let db = Database::new();
        assert_eq!(latest(&db, "u1").unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_moods_are_per_user() {
        let mut db = Database::new();
        record(&mut db, "u1", Mood::Happy, 0.9, t0()).unwrap();
        let outcome = record(&mut db, "u2", Mood::Happy, 0.9, t0()).unwrap();
        assert!(matches!(outcome, MoodOutcome::Recorded(_)));
    }
}
