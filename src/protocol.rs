//! Broadcast-layer wire protocol.
//!
//! This module owns every message that crosses the channel boundary between
//! the race engine and a consumer (map markers, leaderboard, AR overlay).
//!
//! ## Design rules
//!
//! 1. Every type is `Serialize + Deserialize` with snake_case JSON.
//! 2. Snapshots carry plain data only — no engine internals leak out.
//! 3. Every outbound event is wrapped in [`RaceEvent`] with `session` and
//!    `frame` so multiplexed consumers can distinguish and order streams.

use crate::types::{AthleteState, RaceStats};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// Every outbound message is wrapped in this envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceEvent<T> {
    pub session: String,
    pub frame: u64,
    pub payload: T,
}

impl<T> RaceEvent<T> {
    pub fn new(session: impl Into<String>, frame: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            frame,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound snapshot
// ---------------------------------------------------------------------------

/// Full engine state published each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceSnapshot {
    /// Every athlete's state, in admission order.
    pub athletes: Vec<AthleteState>,
    pub stats: RaceStats,
    pub is_running: bool,
    pub is_paused: bool,
    pub all_finished: bool,
}

// ---------------------------------------------------------------------------
// Inbound control commands
// ---------------------------------------------------------------------------

/// Control command sent by any consumer toward the engine.
///
/// Group variants fan out to every athlete; the `*Athlete` variants target
/// one id and are silently ignored when that id is unknown (a command may
/// race with the athlete's removal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Start every athlete from their configured start offset.
    Start,
    Pause,
    Resume,
    Stop,
    Reset,
    SetGlobalSpeed { speed_kmh: f64 },
    PauseAthlete { id: String },
    ResumeAthlete { id: String },
    StopAthlete { id: String },
    SetAthleteSpeed { id: String, speed_kmh: f64 },
}
