//! Trail-race position simulation engine.
//!
//! Computes time-evolving positions of virtual athletes along a fixed
//! geographic route, with live global and per-athlete control
//! (start/pause/resume/stop/reset/speed changes) and consistent state
//! snapshots for high-frequency polling consumers.
//!
//! ## Architecture
//!
//! ```text
//! RaceBusAgent  (bus.rs)          ← broadcast transport, tick loop
//!   └── RaceService  (service.rs) ← per-athlete fan-out, batch snapshots
//!         └── AthleteClock  (clock.rs) ← run-state machine, rebasing math
//!               └── RouteModel  (route.rs) ← immutable polyline + length
//!                     └── geo   (geo.rs)   ← haversine / interpolation
//! ```
//!
//! Consumers poll [`RaceService::all_states`] (directly or through bus
//! snapshots) while a separate source issues control commands. Every
//! operation is a small synchronous state transition that completes before
//! returning, so a poll never observes a torn intermediate state.

pub mod bus;
pub mod clock;
pub mod error;
pub mod geo;
pub mod protocol;
pub mod route;
pub mod service;
pub mod time;
pub mod types;

// Convenience re-exports
pub use bus::{RaceBusAgent, RaceBusConfig};
pub use clock::AthleteClock;
pub use error::{Result, SimError};
pub use route::RouteModel;
pub use service::RaceService;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
pub use types::{Athlete, AthleteState, RaceStats, RoutePoint, RoutePosition, RunState};
