//! Core data types for Screenwise
//!
//! Every record kind stored in the [`Database`](crate::store::Database) lives here,
//! together with the shared `Mood` enum and id/date helpers.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::WellnessError;

/// Moods reported by the client's mood detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Stressed,
    Calm,
    Neutral,
    Tired,
}

impl Mood {
    pub const ALL: [Mood; 7] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Stressed,
        Mood::Calm,
        Mood::Neutral,
        Mood::Tired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Stressed => "stressed",
            Mood::Calm => "calm",
            Mood::Neutral => "neutral",
            Mood::Tired => "tired",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = WellnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Mood::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| WellnessError::invalid(format!("invalid mood: {s}")))
    }
}

/// Music account credentials obtained by the client through the provider's OAuth flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, counted from `obtained_at`
    pub expires_in: i64,
    pub obtained_at: DateTime<Utc>,
}

impl MusicToken {
    /// `None` when the lifetime runs past the representable date range
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        chrono::Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| self.obtained_at.checked_add_signed(lifetime))
    }

    /// A token whose expiry cannot be represented never expires
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| now >= at)
    }
}

/// User-tunable settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub webcam_enabled: bool,
    /// Reminder interval in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_every: Option<u32>,
    #[serde(default = "default_true")]
    pub show_on_leaderboard: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            webcam_enabled: false,
            notify_every: None,
            show_on_leaderboard: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_token: Option<MusicToken>,
    #[serde(default)]
    pub preferences: Preferences,
    pub created_at: DateTime<Utc>,
}

/// Time spent on a single site during a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabUsage {
    pub url: String,
    /// Seconds
    pub time_spent: f64,
}

/// Aggregated screen time of one user for one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenTimeDay {
    pub screen_time_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    /// Seconds
    pub total_time: f64,
    #[serde(default)]
    pub tabs: Vec<TabUsage>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub user_id: String,
    pub mood: Mood,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    Break,
    Message,
    Music,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    pub details: serde_json::Value,
    pub trigger: serde_json::Value,
    #[serde(default)]
    pub accepted: bool,
}

/// Which signal caused a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Mood,
    ScreenTime,
    Default,
}

/// Audit record linking a recommendation to the signal that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerLink {
    pub trigger_link_id: String,
    pub from_source: TriggerSource,
    pub recommendation_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A playlist handed to a user, cached per mood category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub user_id: String,
    pub playlist_id: String,
    pub name: String,
    /// Provider category the playlist was found under
    pub category: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub saved: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: String,
    /// Accumulated reduction in seconds
    #[serde(default)]
    pub reduction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub challenge_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub duration_days: u32,
    /// Target reduction in minutes per day
    pub goal_minutes: f64,
    pub start_date: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
}

impl Challenge {
    /// `None` when the end falls outside the representable date range
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        chrono::Duration::try_days(i64::from(self.duration_days))
            .and_then(|duration| self.start_date.checked_add_signed(duration))
    }

    /// Open-ended once started if the end date is unrepresentable
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_date && self.end_date().map_or(true, |end| now <= end)
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub contact_id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub received_at: DateTime<Utc>,
}

/// Generate a prefixed record id, e.g. `rec_4f0c…`
pub fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, uuid::Uuid::new_v4().simple())
}

/// UTC midnight at the start of `date`
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Last representable millisecond of `date` in UTC
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    day_start(date) + chrono::Duration::days(1) - chrono::Duration::milliseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_parse_case_insensitive() {
        assert_eq!("Stressed".parse::<Mood>().unwrap(), Mood::Stressed);
        assert_eq!(" tired ".parse::<Mood>().unwrap(), Mood::Tired);
        assert!("bored".parse::<Mood>().is_err());
    }

    #[test]
    fn test_mood_serde_lowercase() {
        let json = serde_json::to_string(&Mood::Happy).unwrap();
        assert_eq!(json, "\"happy\"");
    }

    #[test]
    fn test_trigger_source_wire_names() {
        assert_eq!(
            serde_json::to_string(&TriggerSource::ScreenTime).unwrap(),
            "\"screen_time\""
        );
    }

    #[test]
    fn test_new_id_prefix_and_uniqueness() {
        let a = new_id("rec");
        let b = new_id("rec");
        assert!(a.starts_with("rec_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(day_start(date).to_rfc3339(), "2024-03-10T00:00:00+00:00");
        assert_eq!(day_end(date).date_naive(), date);
        assert_eq!((day_end(date) + chrono::Duration::milliseconds(1)).date_naive(), date.succ_opt().unwrap());
    }

    #[test]
    fn test_music_token_expiry() {
        let obtained = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let token = MusicToken {
            access_token: "abc".into(),
            refresh_token: None,
            expires_in: 3600,
            obtained_at: obtained,
        };
        assert!(!token.is_expired(obtained + chrono::Duration::minutes(59)));
        assert!(token.is_expired(obtained + chrono::Duration::hours(1)));
    }

    #[test]
    fn test_music_token_huge_lifetime_never_expires() {
        let obtained = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let token = MusicToken {
            access_token: "abc".into(),
            refresh_token: None,
            expires_in: i64::MAX,
            obtained_at: obtained,
        };
        assert_eq!(token.expires_at(), None);
        assert!(!token.is_expired(obtained + chrono::Duration::days(365)));
    }

    fn challenge(duration_days: u32) -> Challenge {
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        Challenge {
            challenge_id: "challenge_1".into(),
            title: "Unplug".into(),
            description: String::new(),
            duration_days,
            goal_minutes: 30.0,
            start_date: start,
            participants: Vec::new(),
            created_at: start,
        }
    }

    #[test]
    fn test_challenge_end_is_inclusive() {
        let c = challenge(10);
        let end = Utc.with_ymd_and_hms(2024, 6, 20, 0, 0, 0).unwrap();
        assert_eq!(c.end_date(), Some(end));
        assert!(c.is_active(end));
        assert!(!c.is_active(end + chrono::Duration::seconds(1)));
    }

    #[test]
    fn test_challenge_unrepresentable_end_does_not_panic() {
        let c = challenge(u32::MAX);
        assert_eq!(c.end_date(), None);
        assert!(c.is_active(c.start_date + chrono::Duration::days(30)));
        assert!(!c.is_active(c.start_date - chrono::Duration::days(1)));
    }

    #[test]
    fn test_preferences_default_show_on_leaderboard() {
        let prefs: Preferences = serde_json::from_str("{}").unwrap();
        assert!(prefs.show_on_leaderboard);
    }
}
