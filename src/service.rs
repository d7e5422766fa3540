//! RaceService – owns every athlete clock and fans control out to them.
//!
//! Group operations broadcast to all clocks; per-athlete operations target
//! one and silently ignore unknown ids, since a command may arrive for an
//! athlete removed moments earlier. Athletes are fully independent: no
//! operation on one clock ever touches another.

use crate::clock::AthleteClock;
use crate::error::{Result, SimError};
use crate::route::RouteModel;
use crate::time::TimeSource;
use crate::types::{Athlete, AthleteState, RaceStats, RunState};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;

pub struct RaceService {
    clocks: HashMap<String, AthleteClock>,
    /// Athlete ids in admission order, so snapshots are stable across polls.
    order: Vec<String>,
    route: Option<Arc<RouteModel>>,
    time: Arc<dyn TimeSource>,
    is_running: bool,
    is_paused: bool,
}

impl RaceService {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            clocks: HashMap::new(),
            order: Vec::new(),
            route: None,
            time,
            is_running: false,
            is_paused: false,
        }
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// Build and bind one clock per athlete on the shared route.
    ///
    /// Fails as a whole, naming the offending athlete, if any descriptor is
    /// unusable; on success any previous athlete set is discarded.
    pub fn initialize(&mut self, athletes: Vec<Athlete>, route: Arc<RouteModel>) -> Result<()> {
        let mut clocks = HashMap::with_capacity(athletes.len());
        let mut order = Vec::with_capacity(athletes.len());

        for athlete in athletes {
            Self::validate_athlete(&athlete)?;
            if clocks.contains_key(&athlete.id) {
                return Err(SimError::DuplicateAthlete { id: athlete.id });
            }

            let id = athlete.id.clone();
            let mut clock = AthleteClock::new(athlete, self.time.clone());
            clock.bind_route(route.clone());
            order.push(id.clone());
            clocks.insert(id, clock);
        }

        info!(
            "race initialized: {} athletes on a {:.2} km route",
            clocks.len(),
            route.total_distance_km()
        );

        self.clocks = clocks;
        self.order = order;
        self.route = Some(route);
        self.is_running = false;
        self.is_paused = false;
        Ok(())
    }

    fn validate_athlete(athlete: &Athlete) -> Result<()> {
        if let Some(speed) = athlete.base_speed_kmh {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(SimError::InvalidAthlete {
                    id: athlete.id.clone(),
                    source: Box::new(SimError::InvalidSpeed { got: speed }),
                });
            }
        }
        let offset = athlete.initial_distance_km;
        if !offset.is_finite() || offset < 0.0 {
            return Err(SimError::InvalidAthlete {
                id: athlete.id.clone(),
                source: Box::new(SimError::InvalidStartOffset { got: offset }),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Group control
    // -----------------------------------------------------------------------

    /// Start every athlete from their configured start offset.
    pub fn start(&mut self) -> Result<()> {
        if self.clocks.is_empty() {
            return Err(SimError::NotInitialized);
        }
        for clock in self.clocks.values_mut() {
            clock.start()?;
        }
        self.is_running = true;
        self.is_paused = false;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        for clock in self.clocks.values_mut() {
            clock.pause()?;
        }
        self.is_paused = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        for clock in self.clocks.values_mut() {
            clock.resume()?;
        }
        self.is_paused = false;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        for clock in self.clocks.values_mut() {
            clock.stop()?;
        }
        self.is_running = false;
        self.is_paused = false;
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        for clock in self.clocks.values_mut() {
            clock.reset()?;
        }
        self.is_running = false;
        self.is_paused = false;
        Ok(())
    }

    /// Rebase every athlete onto the new speed. Each keeps the distance
    /// they had at the instant of the change; nobody is forced to a common
    /// position.
    pub fn set_global_speed(&mut self, kmh: f64) -> Result<()> {
        if !kmh.is_finite() || kmh <= 0.0 {
            return Err(SimError::InvalidSpeed { got: kmh });
        }
        for clock in self.clocks.values_mut() {
            clock.set_speed(kmh)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Per-athlete control
    // -----------------------------------------------------------------------

    pub fn pause_athlete(&mut self, id: &str) -> Result<()> {
        match self.clocks.get_mut(id) {
            Some(clock) => clock.pause(),
            None => {
                debug!("ignoring pause for unknown athlete '{}'", id);
                Ok(())
            }
        }
    }

    pub fn resume_athlete(&mut self, id: &str) -> Result<()> {
        match self.clocks.get_mut(id) {
            Some(clock) => clock.resume(),
            None => {
                debug!("ignoring resume for unknown athlete '{}'", id);
                Ok(())
            }
        }
    }

    pub fn stop_athlete(&mut self, id: &str) -> Result<()> {
        match self.clocks.get_mut(id) {
            Some(clock) => clock.stop(),
            None => {
                debug!("ignoring stop for unknown athlete '{}'", id);
                Ok(())
            }
        }
    }

    pub fn set_athlete_speed(&mut self, id: &str, kmh: f64) -> Result<()> {
        // Validate before the lookup so a bad value is rejected the same
        // way whether or not the athlete is still managed.
        if !kmh.is_finite() || kmh <= 0.0 {
            return Err(SimError::InvalidSpeed { got: kmh });
        }
        match self.clocks.get_mut(id) {
            Some(clock) => clock.set_speed(kmh),
            None => {
                debug!("ignoring speed change for unknown athlete '{}'", id);
                Ok(())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot every athlete, in admission order. Each entry is computed as
    /// of the wall clock read at the time of its own computation.
    pub fn all_states(&self) -> Result<Vec<AthleteState>> {
        self.order
            .iter()
            .filter_map(|id| self.clocks.get(id))
            .map(|clock| clock.current_state())
            .collect()
    }

    pub fn athlete_state(&self, id: &str) -> Option<AthleteState> {
        self.clocks.get(id).and_then(|c| c.current_state().ok())
    }

    /// True iff every athlete has finished; vacuously true for an empty set.
    pub fn all_finished(&self) -> bool {
        self.clocks.values().all(|clock| {
            clock
                .current_state()
                .map(|state| state.is_finished)
                .unwrap_or(false)
        })
    }

    pub fn stats(&self) -> RaceStats {
        let mut stats = RaceStats {
            athletes: self.clocks.len(),
            running: 0,
            paused: 0,
            finished: 0,
            total_route_km: self
                .route
                .as_ref()
                .map(|r| r.total_distance_km())
                .unwrap_or(0.0),
        };

        for clock in self.clocks.values() {
            match clock.run_state() {
                RunState::Running => stats.running += 1,
                RunState::Paused => stats.paused += 1,
                RunState::Idle => {}
            }
            if let Ok(state) = clock.current_state() {
                if state.is_finished {
                    stats.finished += 1;
                }
            }
        }

        stats
    }

    pub fn athlete_count(&self) -> usize {
        self.clocks.len()
    }

    /// Convenience cache over the last group-level broadcast; individual
    /// athletes may disagree (e.g. one paused while the group runs).
    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn route(&self) -> Option<&Arc<RouteModel>> {
        self.route.as_ref()
    }
}
