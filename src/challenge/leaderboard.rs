//! Challenge leaderboard

use serde::{Deserialize, Serialize};

use crate::error::WellnessError;
use crate::store::Database;

/// Entries shown on a leaderboard
pub const LEADERBOARD_SIZE: usize = 10;

pub const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: String,
    pub username: String,
    pub reduction_hours: f64,
}

/// Top participants by accumulated reduction
///
/// Users who opted out of the leaderboard, or who have no account record,
/// are shown as [`ANONYMOUS`].
pub fn leaderboard(db: &Database, challenge_id: &str) -> Result<Vec<LeaderboardEntry>, WellnessError> {
    let challenge = db
        .challenge(challenge_id)
        .ok_or_else(|| WellnessError::not_found("Challenge"))?;
    if challenge.participants.is_empty() {
        return Err(WellnessError::NoParticipants);
    }

    let mut ranked: Vec<_> = challenge.participants.iter().collect();
    ranked.sort_by(|a, b| b.reduction.total_cmp(&a.reduction));

    Ok(ranked
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, p)| {
            let username = db
                .user(&p.user_id)
                .filter(|u| u.preferences.show_on_leaderboard)
                .map(|u| u.username.clone())
                .unwrap_or_else(|| ANONYMOUS.to_string());
            LeaderboardEntry {
                rank: i + 1,
                user_id: p.user_id.clone(),
                username,
                reduction_hours: p.reduction / 3600.0,
            }
        })
        .collect())
}
