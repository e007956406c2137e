//! Screenwise - screen-time and mood engine for a digital wellness app
//!
//! Screenwise ingests per-user screen-time telemetry and mood signals, derives
//! recommendations (breaks, messages or mood-matched playlists) and runs
//! group "reduce your screen time" challenges with a leaderboard.
//!
//! ## Modules
//!
//! - **Signals**: [`screen_time`] and [`mood`] intake
//! - **Recommendations**: rule engine in [`recommend`], playlists in [`music`]
//! - **Challenges**: enrollment, baseline-relative progress and leaderboard in [`challenge`]
//! - **Storage**: JSON-snapshot document store in [`store`]
//!
//! Every operation takes the current time as an argument; [`Wellness`] wraps
//! them with the wall clock for front ends.

pub mod challenge;
pub mod config;
pub mod contact;
pub mod error;
pub mod logging;
pub mod mood;
pub mod music;
pub mod recommend;
pub mod screen_time;
pub mod service;
pub mod store;
pub mod types;
pub mod user;

pub use config::Config;
pub use error::WellnessError;
pub use music::{MusicCatalog, StaticCatalog};
pub use service::Wellness;
pub use store::Database;
pub use types::Mood;

/// Screenwise version reported by the CLI
pub const SCREENWISE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Product name used in reports
pub const PRODUCT_NAME: &str = "screenwise";
