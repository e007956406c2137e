//! Screen-time reduction challenges
//!
//! Users join a time-boxed challenge with a daily reduction goal. Progress is
//! measured against each participant's own baseline and ranked on a
//! leaderboard.

pub mod leaderboard;
pub mod progress;
pub mod registry;

pub use leaderboard::{leaderboard, LeaderboardEntry};
pub use progress::{BaselineSource, ProgressOutcome};
pub use registry::{create, join, visible, NewChallenge};
