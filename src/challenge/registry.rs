//! Challenge creation, listing and enrollment

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WellnessError;
use crate::store::Database;
use crate::types::{day_start, new_id, Challenge, Participant};

/// Challenges starting within this many days are listed as upcoming
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewChallenge {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_days: Option<u32>,
    #[serde(default)]
    pub goal_minutes: Option<f64>,
    /// RFC 3339 timestamp or `YYYY-MM-DD` (midnight UTC)
    #[serde(default)]
    pub start_date: Option<String>,
}

pub fn parse_start_date(text: &str) -> Result<DateTime<Utc>, WellnessError> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map(day_start)
        .map_err(|_| WellnessError::invalid(format!("invalid start date: {text}")))
}

pub fn create(
    db: &mut Database,
    new: NewChallenge,
    now: DateTime<Utc>,
) -> Result<Challenge, WellnessError> {
    let title = new.title.trim();
    let (duration_days, goal_minutes, start_text) =
        match (new.duration_days, new.goal_minutes, new.start_date.as_deref()) {
            (Some(d), Some(g), Some(s)) if !title.is_empty() && d > 0 && g.is_finite() && g > 0.0 => {
                (d, g, s)
            }
            _ => {
                return Err(WellnessError::invalid(
                    "title, duration, goal, and start date are required",
                ))
            }
        };
    let start_date = parse_start_date(start_text)?;

    let challenge = Challenge {
        challenge_id: new_id("challenge"),
        title: title.to_string(),
        description: new.description.unwrap_or_default(),
        duration_days,
        goal_minutes,
        start_date,
        participants: Vec::new(),
        created_at: now,
    };
    if challenge.end_date().is_none() {
        return Err(WellnessError::invalid(format!(
            "duration of {duration_days} days is out of range"
        )));
    }
    db.challenges.push(challenge.clone());
    tracing::info!(challenge_id = %challenge.challenge_id, title = %challenge.title, "challenge created");
    Ok(challenge)
}

/// Running and soon-starting challenges that have not ended before today
pub fn visible(db: &Database, now: DateTime<Utc>) -> Vec<Challenge> {
    let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
    let today = day_start(now.date_naive());
    let mut list: Vec<Challenge> = db
        .challenges
        .iter()
        .filter(|c| c.start_date <= horizon && c.end_date().map_or(true, |end| end >= today))
        .cloned()
        .collect();
    list.sort_by(|a, b| a.start_date.cmp(&b.start_date));
    tracing::info!(count = list.len(), "challenges fetched");
    list
}

pub fn join(
    db: &mut Database,
    challenge_id: &str,
    user_id: &str,
) -> Result<Challenge, WellnessError> {
    let challenge = db
        .challenge_mut(challenge_id)
        .ok_or_else(|| WellnessError::not_found("Challenge"))?;
    if challenge.participant(user_id).is_some() {
        return Err(WellnessError::Conflict(
            "user already joined this challenge".into(),
        ));
    }
    challenge.participants.push(Participant {
        user_id: user_id.to_string(),
        reduction: 0.0,
        last_update: None,
    });
    tracing::info!(challenge_id, user_id, "user joined challenge");
    Ok(challenge.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn new_challenge(start: &str, days: u32) -> NewChallenge {
        NewChallenge {
            title: "Less scrolling".into(),
            description: None,
            duration_days: Some(days),
            goal_minutes: Some(30.0),
            start_date: Some(start.into()),
        }
    }

    #[test]
    fn test_parse_start_date_formats() {
        assert_eq!(
            parse_start_date("2024-06-20").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_start_date("2024-06-20T08:30:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 6, 20, 6, 30, 0).unwrap()
        );
        assert!(parse_start_date("next monday").is_err());
    }

    #[test]
    fn test_create_validates_fields() {
        let mut db = Database::new();
        let created = create(&mut db, new_challenge("2024-06-20", 7), now()).unwrap();
        assert!(created.challenge_id.starts_with("challenge_"));
        assert_eq!(created.description, "");

        let mut missing = new_challenge("2024-06-20", 7);
        missing.title = "  ".into();
        assert!(create(&mut db, missing, now()).is_err());

        assert!(create(&mut db, new_challenge("2024-06-20", 0), now()).is_err());
        let bad_date = create(&mut db, new_challenge("someday", 7), now()).unwrap_err();
        assert_eq!(bad_date.to_string(), "Invalid input: invalid start date: someday");
        assert_eq!(db.challenges.len(), 1);
    }

    #[test]
    fn test_visible_window() {
        let mut db = Database::new();
        create(&mut db, new_challenge("2024-06-10", 10), now()).unwrap(); // running
        create(&mut db, new_challenge("2024-06-20", 5), now()).unwrap(); // upcoming
        create(&mut db, new_challenge("2024-07-30", 5), now()).unwrap(); // too far out
        create(&mut db, new_challenge("2024-06-01", 3), now()).unwrap(); // ended
        create(&mut db, new_challenge("2024-06-14", 1), now()).unwrap(); // ends today at midnight

        let starts: Vec<String> = visible(&db, now())
            .iter()
            .map(|c| c.start_date.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(starts, vec!["2024-06-10", "2024-06-14", "2024-06-20"]);
    }

    #[test]
    fn test_create_rejects_out_of_range_duration() {
        let mut db = Database::new();
        let err = create(&mut db, new_challenge("2024-06-10", 100_000_000), now()).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(db.challenges.is_empty());
    }

    #[test]
    fn test_visible_tolerates_stored_unbounded_challenge() {
        let mut db = Database::new();
        let mut c = create(&mut db, new_challenge("2024-06-10", 10), now()).unwrap();
        c.challenge_id = "challenge_loaded".into();
        c.duration_days = u32::MAX;
        db.challenges.push(c);

        let listed = visible(&db, now());
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn test_visible_upcoming_boundary() {
        let mut db = Database::new();
        create(&mut db, new_challenge("2024-06-22T12:00:00Z", 3), now()).unwrap();
        create(&mut db, new_challenge("2024-06-22T12:00:01Z", 3), now()).unwrap();

        let listed = visible(&db, now());
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].start_date, now() + Duration::days(UPCOMING_WINDOW_DAYS));
    }

    #[test]
    fn test_join_once() {
        let mut db = Database::new();
        let c = create(&mut db, new_challenge("2024-06-10", 10), now()).unwrap();
        let joined = join(&mut db, &c.challenge_id, "u1").unwrap();
        assert_eq!(joined.participants.len(), 1);
        assert_eq!(joined.participants[0].reduction, 0.0);

        let again = join(&mut db, &c.challenge_id, "u1").unwrap_err();
        assert!(matches!(again, WellnessError::Conflict(_)));

        let missing = join(&mut db, "challenge_nope", "u1").unwrap_err();
        assert_eq!(missing.status_code(), 404);
    }
}
