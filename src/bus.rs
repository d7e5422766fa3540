//! Broadcast channel integration.
//!
//! [`RaceBusAgent`] bridges a [`RaceService`] to two local broadcast
//! channels: an inbound command channel on which any producer may send
//! JSON-encoded [`ControlCommand`]s, and an outbound event channel carrying
//! JSON-encoded [`RaceEvent<RaceSnapshot>`] frames at the configured tick
//! rate for map markers, leaderboards and AR overlays to consume.
//!
//! The agent holds the service behind a single `parking_lot::Mutex`; every
//! command and every snapshot is applied/read under one short lock hold, so
//! consumers never observe a torn intermediate state.

use crate::protocol::{ControlCommand, RaceEvent, RaceSnapshot};
use crate::service::RaceService;
use anyhow::Result;
use bytes::Bytes;
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RaceBusConfig {
    /// Session name stamped into every outbound envelope.
    pub session: String,
    /// Snapshot publish rate in Hz.
    pub tick_rate_hz: f32,
    /// Buffered capacity of each broadcast channel.
    pub channel_capacity: usize,
}

impl Default for RaceBusConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            tick_rate_hz: 10.0,
            channel_capacity: 256,
        }
    }
}

// ---------------------------------------------------------------------------
// RaceBusAgent
// ---------------------------------------------------------------------------

/// Wraps a [`RaceService`] and drives it from broadcast-channel traffic.
///
/// Call [`RaceBusAgent::run`] inside a Tokio task to start the agent.
pub struct RaceBusAgent {
    config: RaceBusConfig,
    service: Arc<Mutex<RaceService>>,
    commands_tx: broadcast::Sender<Bytes>,
    // Held from construction so commands sent before `run` starts polling
    // are buffered rather than dropped.
    commands_rx: broadcast::Receiver<Bytes>,
    events_tx: broadcast::Sender<Bytes>,
}

impl RaceBusAgent {
    pub fn new(config: RaceBusConfig, service: Arc<Mutex<RaceService>>) -> Self {
        let (commands_tx, commands_rx) = broadcast::channel(config.channel_capacity);
        let (events_tx, _) = broadcast::channel(config.channel_capacity);
        Self {
            config,
            service,
            commands_tx,
            commands_rx,
            events_tx,
        }
    }

    /// Handle for producers that want to inject control commands.
    pub fn command_sender(&self) -> broadcast::Sender<Bytes> {
        self.commands_tx.clone()
    }

    /// Subscribe to the outbound snapshot stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Bytes> {
        self.events_tx.subscribe()
    }

    pub fn service(&self) -> Arc<Mutex<RaceService>> {
        self.service.clone()
    }

    /// Run until SIGINT: apply inbound commands as they arrive and publish
    /// one snapshot per tick.
    pub async fn run(mut self) -> Result<()> {
        let interval = Duration::from_secs_f32(1.0 / self.config.tick_rate_hz);
        let mut timer = tokio::time::interval(interval);
        let mut frame: u64 = 0;

        info!(
            "race bus active – publishing at {:.0} Hz (session '{}')",
            self.config.tick_rate_hz, self.config.session
        );

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    frame += 1;
                    self.publish_snapshot(frame);
                }
                received = self.commands_rx.recv() => match received {
                    Ok(raw) => self.apply_raw_command(&raw),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("command stream lagged, dropped {} messages", missed);
                    }
                    // The agent holds a sender, so the stream cannot close.
                    Err(broadcast::error::RecvError::Closed) => {}
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("race bus shutting down (SIGINT)");
                    return Ok(());
                }
            }
        }
    }

    fn apply_raw_command(&self, raw: &[u8]) {
        let command: ControlCommand = match serde_json::from_slice(raw) {
            Ok(command) => command,
            Err(e) => {
                warn!("ignoring malformed command: {}", e);
                return;
            }
        };

        debug!("applying {:?}", command);
        let mut service = self.service.lock();
        if let Err(e) = apply_command(&mut service, &command) {
            warn!("command {:?} rejected: {}", command, e);
        }
    }

    fn publish_snapshot(&self, frame: u64) {
        // Hold the lock only long enough to read, then serialize outside it.
        let snapshot = {
            let service = self.service.lock();
            build_snapshot(&service)
        };

        let snapshot = match snapshot {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("failed to build snapshot: {}", e);
                return;
            }
        };

        let event = RaceEvent::new(self.config.session.as_str(), frame, snapshot);
        match serde_json::to_vec(&event) {
            // No subscribers is fine; the send result is irrelevant.
            Ok(payload) => {
                let _ = self.events_tx.send(Bytes::from(payload));
            }
            Err(e) => warn!("failed to serialize snapshot: {}", e),
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch / snapshot building
// ---------------------------------------------------------------------------

/// Apply one decoded command to the service.
pub fn apply_command(
    service: &mut RaceService,
    command: &ControlCommand,
) -> crate::error::Result<()> {
    match command {
        ControlCommand::Start => service.start(),
        ControlCommand::Pause => service.pause(),
        ControlCommand::Resume => service.resume(),
        ControlCommand::Stop => service.stop(),
        ControlCommand::Reset => service.reset(),
        ControlCommand::SetGlobalSpeed { speed_kmh } => service.set_global_speed(*speed_kmh),
        ControlCommand::PauseAthlete { id } => service.pause_athlete(id),
        ControlCommand::ResumeAthlete { id } => service.resume_athlete(id),
        ControlCommand::StopAthlete { id } => service.stop_athlete(id),
        ControlCommand::SetAthleteSpeed { id, speed_kmh } => {
            service.set_athlete_speed(id, *speed_kmh)
        }
    }
}

/// Build the full snapshot payload from the current service state.
pub fn build_snapshot(service: &RaceService) -> crate::error::Result<RaceSnapshot> {
    Ok(RaceSnapshot {
        athletes: service.all_states()?,
        stats: service.stats(),
        is_running: service.is_running(),
        is_paused: service.is_paused(),
        all_finished: service.all_finished(),
    })
}
