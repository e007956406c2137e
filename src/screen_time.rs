//! Screen-time ingestion and queries
//!
//! Clients upload usage in increments during the day. Uploads for the same
//! (user, date) accumulate into one `ScreenTimeDay`: totals add and per-site
//! times merge by URL.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::WellnessError;
use crate::store::Database;
use crate::types::{new_id, ScreenTimeDay, TabUsage};

/// Date as sent by the client: epoch milliseconds or a `YYYY-MM-DD` string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(f64),
    Text(String),
}

/// Tab entry as uploaded; invalid entries are dropped rather than rejected
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTab {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub time_spent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenTimeUpload {
    /// Seconds of screen time in this increment
    #[serde(default)]
    pub total_time: Option<f64>,
    #[serde(default)]
    pub tabs: Option<Vec<RawTab>>,
    #[serde(default)]
    pub date: Option<DateInput>,
}

/// Resolve the client's date to a calendar day, falling back to today
pub fn normalize_date(input: Option<&DateInput>, now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    match input {
        Some(DateInput::Millis(ms)) if ms.is_finite() => {
            DateTime::<Utc>::from_timestamp_millis(*ms as i64)
                .map(|dt| dt.date_naive())
                .unwrap_or(today)
        }
        Some(DateInput::Text(text)) if is_iso_day(text) => {
            NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap_or_else(|_| {
                tracing::warn!(date = %text, "invalid date, normalizing to today");
                today
            })
        }
        other => {
            tracing::warn!(date = ?other, "invalid date format, normalizing to today");
            today
        }
    }
}

fn is_iso_day(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit())
}

fn valid_tabs(tabs: &[RawTab]) -> Vec<TabUsage> {
    tabs.iter()
        .filter_map(|tab| match (&tab.url, tab.time_spent) {
            (Some(url), Some(t)) if !url.is_empty() && t.is_finite() && t >= 0.0 => {
                Some(TabUsage {
                    url: url.clone(),
                    time_spent: t,
                })
            }
            _ => {
                tracing::warn!(?tab, "invalid tab data skipped");
                None
            }
        })
        .collect()
}

fn merge_tabs(existing: &[TabUsage], incoming: Vec<TabUsage>) -> Vec<TabUsage> {
    let mut merged: IndexMap<String, f64> = existing
        .iter()
        .map(|t| (t.url.clone(), t.time_spent))
        .collect();
    for tab in incoming {
        *merged.entry(tab.url).or_insert(0.0) += tab.time_spent;
    }
    merged
        .into_iter()
        .map(|(url, time_spent)| TabUsage { url, time_spent })
        .collect()
}

/// Save an upload, accumulating into the existing record for that day
pub fn ingest(
    db: &mut Database,
    user_id: &str,
    upload: ScreenTimeUpload,
    now: DateTime<Utc>,
) -> Result<ScreenTimeDay, WellnessError> {
    let date = normalize_date(upload.date.as_ref(), now);

    let total_time = match upload.total_time {
        Some(t) if t.is_finite() && t >= 0.0 => t,
        other => {
            tracing::warn!(total_time = ?other, "invalid totalTime");
            return Err(WellnessError::invalid("invalid total_time"));
        }
    };
    let tabs = upload
        .tabs
        .ok_or_else(|| WellnessError::invalid("tabs must be an array"))?;
    let tabs = valid_tabs(&tabs);

    let record = match db
        .screen_time
        .iter_mut()
        .find(|r| r.user_id == user_id && r.date == date)
    {
        Some(existing) => {
            existing.total_time += total_time;
            existing.tabs = merge_tabs(&existing.tabs, tabs);
            existing.updated_at = now;
            existing.clone()
        }
        None => {
            let record = ScreenTimeDay {
                screen_time_id: new_id("st"),
                user_id: user_id.to_string(),
                date,
                total_time,
                tabs,
                updated_at: now,
            };
            db.screen_time.push(record.clone());
            record
        }
    };

    tracing::info!(
        user_id,
        %date,
        total_time = record.total_time,
        tabs = record.tabs.len(),
        "screen time saved or updated"
    );
    Ok(record)
}

/// All of a user's records, newest date first
pub fn history(db: &Database, user_id: &str) -> Vec<ScreenTimeDay> {
    let mut records: Vec<ScreenTimeDay> = db
        .screen_time
        .iter()
        .filter(|r| r.user_id == user_id)
        .cloned()
        .collect();
    records.sort_by(|a, b| b.date.cmp(&a.date));
    records
}

pub fn for_day<'a>(db: &'a Database, user_id: &str, date: NaiveDate) -> Option<&'a ScreenTimeDay> {
    db.screen_time
        .iter()
        .find(|r| r.user_id == user_id && r.date == date)
}

/// Return today's record, creating an empty one if the user has none yet
pub fn ensure_day(db: &mut Database, user_id: &str, date: NaiveDate, now: DateTime<Utc>) -> ScreenTimeDay {
    if let Some(existing) = for_day(db, user_id, date) {
        return existing.clone();
    }
    let record = ScreenTimeDay {
        screen_time_id: new_id("st"),
        user_id: user_id.to_string(),
        date,
        total_time: 0.0,
        tabs: Vec::new(),
        updated_at: now,
    };
    db.screen_time.push(record.clone());
    record
}

/// Newest record strictly before `date`
pub fn latest_before<'a>(
    db: &'a Database,
    user_id: &str,
    date: NaiveDate,
) -> Option<&'a ScreenTimeDay> {
    db.screen_time
        .iter()
        .filter(|r| r.user_id == user_id && r.date < date)
        .max_by_key(|r| r.date)
}

/// Earliest record on or after `date`
pub fn earliest_from<'a>(
    db: &'a Database,
    user_id: &str,
    date: NaiveDate,
) -> Option<&'a ScreenTimeDay> {
    db.screen_time
        .iter()
        .filter(|r| r.user_id == user_id && r.date >= date)
        .min_by_key(|r| r.date)
}

/// Average daily total over `from..=to` and the number of days that had data
pub fn average_between(
    db: &Database,
    user_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Option<(f64, usize)> {
    let totals: Vec<f64> = db
        .screen_time
        .iter()
        .filter(|r| r.user_id == user_id && r.date >= from && r.date <= to)
        .map(|r| r.total_time)
        .collect();
    if totals.is_empty() {
        return None;
    }
    let sum: f64 = totals.iter().sum();
    Some((sum / totals.len() as f64, totals.len()))
}
