//! Per-athlete simulation clock.
//!
//! Maps elapsed wall time and speed into distance covered along the route.
//! All progress accounting goes through one rebasing rule: `baseline_km`
//! holds the distance accumulated up to the last control operation, and the
//! reference instant marks when the current running stretch began. Pause,
//! resume and speed changes capture the computed distance into the baseline
//! before touching anything else, so no operation can jump or double-count
//! position.
//!
//! State machine:
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//! Running | Paused --stop/reset--> Idle
//! ```
//!
//! `start` is also reachable from `Running`/`Paused` and always restarts
//! from the athlete's configured start offset.

use crate::error::{Result, SimError};
use crate::route::RouteModel;
use crate::time::TimeSource;
use crate::types::{Athlete, AthleteState, RunState};
use log::debug;
use std::sync::Arc;
use std::time::Duration;

pub struct AthleteClock {
    athlete: Athlete,
    time: Arc<dyn TimeSource>,
    route: Option<Arc<RouteModel>>,
    speed_kmh: f64,
    run_state: RunState,
    /// Time-source instant of the last rebase; `None` unless running.
    reference: Option<Duration>,
    /// Distance accumulated before the reference instant, in km from the
    /// route origin.
    baseline_km: f64,
}

impl AthleteClock {
    pub fn new(athlete: Athlete, time: Arc<dyn TimeSource>) -> Self {
        let speed_kmh = athlete.speed_kmh();
        let baseline_km = athlete.initial_distance_km;
        Self {
            athlete,
            time,
            route: None,
            speed_kmh,
            run_state: RunState::Idle,
            reference: None,
            baseline_km,
        }
    }

    /// Bind the clock to a route. Must precede any control operation.
    /// Rebinding (a different route or the same one again) sends the athlete
    /// back to their configured start offset.
    pub fn bind_route(&mut self, route: Arc<RouteModel>) {
        self.route = Some(route);
        self.run_state = RunState::Idle;
        self.reference = None;
        self.baseline_km = self.athlete.initial_distance_km;
    }

    pub fn athlete(&self) -> &Athlete {
        &self.athlete
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    fn route(&self) -> Result<&Arc<RouteModel>> {
        self.route.as_ref().ok_or(SimError::NotInitialized)
    }

    fn hours_since_reference(&self, reference: Duration) -> f64 {
        self.time.now().saturating_sub(reference).as_secs_f64() / 3600.0
    }

    // -----------------------------------------------------------------------
    // Control operations
    // -----------------------------------------------------------------------

    /// Begin moving from the athlete's configured start offset. Calling
    /// `start` while already running restarts from that offset; "start"
    /// never means "continue".
    pub fn start(&mut self) -> Result<()> {
        self.route()?;
        self.run_state = RunState::Running;
        self.reference = Some(self.time.now());
        self.baseline_km = self.athlete.initial_distance_km;
        debug!(
            "athlete '{}' started at {:.2} km, {:.1} km/h",
            self.athlete.id, self.baseline_km, self.speed_kmh
        );
        Ok(())
    }

    /// Freeze progress. No-op unless running.
    pub fn pause(&mut self) -> Result<()> {
        self.route()?;
        if self.run_state == RunState::Running {
            // Freeze through the same formula reads use, so no partial
            // progress is lost or counted twice.
            self.baseline_km = self.distance_covered_km()?;
            self.run_state = RunState::Paused;
            self.reference = None;
        }
        Ok(())
    }

    /// Continue from the frozen baseline. No-op unless paused.
    pub fn resume(&mut self) -> Result<()> {
        self.route()?;
        if self.run_state == RunState::Paused {
            self.reference = Some(self.time.now());
            self.run_state = RunState::Running;
        }
        Ok(())
    }

    /// Return to idle at the configured start offset (not km 0),
    /// regardless of prior run history.
    pub fn stop(&mut self) -> Result<()> {
        self.route()?;
        self.run_state = RunState::Idle;
        self.reference = None;
        self.baseline_km = self.athlete.initial_distance_km;
        Ok(())
    }

    /// Alias of [`stop`](Self::stop); both return the athlete to their
    /// start offset.
    pub fn reset(&mut self) -> Result<()> {
        self.stop()
    }

    /// Change speed without moving the athlete: the distance computed under
    /// the old speed becomes the new baseline before the swap, so position
    /// at the instant of the change is preserved exactly. Invalid values
    /// are rejected without touching any state.
    pub fn set_speed(&mut self, kmh: f64) -> Result<()> {
        self.route()?;
        if !kmh.is_finite() || kmh <= 0.0 {
            return Err(SimError::InvalidSpeed { got: kmh });
        }

        self.baseline_km = self.distance_covered_km()?;
        self.speed_kmh = kmh;
        if self.run_state == RunState::Running {
            self.reference = Some(self.time.now());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Distance covered along the route from its origin, in km.
    ///
    /// While running: `baseline + speed * hours_since_reference`, clamped
    /// between the start offset and the route total. Otherwise the baseline
    /// alone. Monotonically non-decreasing while running.
    pub fn distance_covered_km(&self) -> Result<f64> {
        let route = self.route()?;
        let total = route.total_distance_km();
        let initial = self.athlete.initial_distance_km;

        let raw = match (self.run_state, self.reference) {
            (RunState::Running, Some(reference)) => {
                self.baseline_km + self.speed_kmh * self.hours_since_reference(reference)
            }
            _ => self.baseline_km,
        };

        // Lower bound first: a start offset beyond the route end still caps
        // at the route total.
        Ok(raw.max(initial).min(total))
    }

    fn elapsed_time_hours(&self) -> f64 {
        match (self.run_state, self.reference) {
            (RunState::Idle, _) => 0.0,
            (RunState::Running, Some(reference)) => {
                self.baseline_km / self.speed_kmh + self.hours_since_reference(reference)
            }
            _ => self.baseline_km / self.speed_kmh,
        }
    }

    /// Point-in-time snapshot; pure read, no side effects.
    ///
    /// When idle, reports the athlete sitting motionless at their start
    /// offset with zero elapsed time.
    pub fn current_state(&self) -> Result<AthleteState> {
        let route = self.route()?;
        let total = route.total_distance_km();
        let distance = self.distance_covered_km()?;
        let position = route.position_at(distance);

        let (progress_percent, is_finished) = if route.is_zero_length() {
            (100.0, true)
        } else {
            (distance / total * 100.0, distance >= total)
        };

        Ok(AthleteState {
            athlete_id: self.athlete.id.clone(),
            position,
            distance_covered_km: distance,
            progress_percent,
            elapsed_time_hours: self.elapsed_time_hours(),
            estimated_total_time_hours: total / self.speed_kmh,
            speed_kmh: self.speed_kmh,
            is_finished,
            is_paused: self.run_state == RunState::Paused,
            athlete: self.athlete.clone(),
        })
    }
}
