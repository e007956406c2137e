//! Challenge progress computation
//!
//! Progress compares the participant's baseline daily screen time with the
//! current day and accumulates the difference as a reduction, capped per day
//! by the challenge goal and overall by `goal * duration`.
//!
//! Reductions are stored in seconds and reported in hours.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WellnessError;
use crate::screen_time;
use crate::store::Database;
use crate::types::Challenge;

/// Days before the start date that make up the baseline window
pub const BASELINE_DAYS: i64 = 7;
/// Minimum spacing between automatic progress updates
pub const UPDATE_INTERVAL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressOutcome {
    Updated { reduction_hours: f64 },
    /// Updated less than an hour ago; maps to 204 No Content
    Skipped,
}

/// Where the baseline figure came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineSource {
    /// Full week of data before the start date
    PriorWeek { days: usize },
    /// Earliest record since the start date
    FirstDay,
}

/// Mean daily screen time (seconds) before the challenge started
pub fn baseline(
    db: &Database,
    challenge: &Challenge,
    user_id: &str,
) -> Result<(f64, BaselineSource), WellnessError> {
    let start_day = challenge.start_date.date_naive();
    let from = start_day - Duration::days(BASELINE_DAYS);
    let to = start_day - Duration::days(1);

    match screen_time::average_between(db, user_id, from, to) {
        Some((avg, days)) if days as i64 >= BASELINE_DAYS => {
            Ok((avg, BaselineSource::PriorWeek { days }))
        }
        _ => {
            tracing::info!(user_id, "insufficient baseline data, using first day as baseline");
            match screen_time::earliest_from(db, user_id, start_day) {
                Some(first) => Ok((first.total_time, BaselineSource::FirstDay)),
                None => {
                    tracing::warn!(user_id, "no data on first day, cannot compute baseline");
                    Err(WellnessError::NoBaseline)
                }
            }
        }
    }
}

/// Reduction (seconds) after applying today's figures to the running total
pub fn next_reduction(
    challenge: &Challenge,
    current_reduction_secs: f64,
    baseline_secs: f64,
    current_secs: f64,
) -> f64 {
    let goal_hours = challenge.goal_minutes / 60.0;
    let daily = goal_hours.min(((baseline_secs - current_secs) / 3600.0).max(0.0));
    let total = current_reduction_secs / 3600.0 + daily;
    let cap = goal_hours * f64::from(challenge.duration_days);
    total.min(cap) * 3600.0
}

/// Recompute the participant's reduction
///
/// Automatic updates are rate limited to one per [`UPDATE_INTERVAL_SECS`];
/// `manual` bypasses the limit.
pub fn update(
    db: &mut Database,
    challenge_id: &str,
    user_id: &str,
    manual: bool,
    now: DateTime<Utc>,
) -> Result<ProgressOutcome, WellnessError> {
    let challenge = db
        .challenge(challenge_id)
        .ok_or_else(|| WellnessError::not_found("Challenge"))?;
    let participant = challenge
        .participant(user_id)
        .ok_or_else(|| WellnessError::Forbidden("user not participating in this challenge".into()))?;
    if !challenge.is_active(now) {
        return Err(WellnessError::ChallengeNotActive);
    }

    let (baseline_secs, source) = baseline(db, challenge, user_id)?;

    let today = now.date_naive();
    let current_secs = screen_time::for_day(db, user_id, today)
        .or_else(|| screen_time::latest_before(db, user_id, today))
        .map(|r| r.total_time)
        .unwrap_or(baseline_secs);

    let new_reduction = next_reduction(challenge, participant.reduction, baseline_secs, current_secs);
    let due = participant
        .last_update
        .map_or(true, |last| (now - last).num_seconds() >= UPDATE_INTERVAL_SECS);

    if !(due || manual) {
        tracing::info!(
            challenge_id,
            user_id,
            last_update = ?participant.last_update,
            "progress update skipped, within 1-hour interval"
        );
        return Ok(ProgressOutcome::Skipped);
    }

    let participant = db
        .challenge_mut(challenge_id)
        .and_then(|c| c.participants.iter_mut().find(|p| p.user_id == user_id))
        .ok_or_else(|| WellnessError::not_found("Participant"))?;
    participant.reduction = new_reduction;
    participant.last_update = Some(now);

    let reduction_hours = new_reduction / 3600.0;
    tracing::info!(
        challenge_id,
        user_id,
        reduction_hours,
        baseline = ?source,
        "progress updated"
    );
    Ok(ProgressOutcome::Updated { reduction_hours })
}
