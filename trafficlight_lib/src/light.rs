//! The traffic light controller.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use tracing::{debug, info, trace, warn};

use crate::config::{CycleTiming, LightConfig};
use crate::core::{AtomicPhase, Phase};
use crate::error::LightError;
use crate::queue::{channel, Receiver, Sender};
use crate::shutdown::Shutdown;

/// A traffic light that switches between `Red` and `Green` on its own thread.
///
/// Every switch is published to an internal queue in the order it happened. `wait_for_green` and
/// `next_transition` consume that queue, so they take `&mut self`: a light has exactly one consumer.
/// Other threads can follow the light through a `PhaseMonitor` and stop it through a `StopHandle`.
///
/// # Examples
///
/// ```no_run
/// use trafficlight_lib::light::TrafficLight;
///
/// let mut light = TrafficLight::new();
/// light.start().unwrap();
/// light.wait_for_green().unwrap();
/// ```
pub struct TrafficLight {
    config: LightConfig,
    phase: Arc<AtomicPhase<Phase>>,
    sender: Sender<Phase>,
    receiver: Receiver<Phase>,
    shutdown: Shutdown,
    join_handle: Option<thread::JoinHandle<()>>,
}

impl TrafficLight {
    /// Creates a red light with the default configuration. The light does not switch until `start` is called.
    pub fn new() -> Self {
        Self::with_config(LightConfig::default())
    }

    /// Creates a red light with the given configuration.
    pub fn with_config(config: LightConfig) -> Self {
        let (sender, receiver) = channel();
        TrafficLight {
            config,
            phase: Arc::new(AtomicPhase::default()),
            sender,
            receiver,
            shutdown: Shutdown::new(),
            join_handle: None,
        }
    }

    /// Starts switching phases on a background thread.
    ///
    /// A light can only be started once. Later calls return `LightError::AlreadyStarted`, or
    /// `LightError::Stopped` if the light has been stopped. A configuration that fails
    /// `LightConfig::validate` is reported as `LightError::Config` and nothing is spawned.
    pub fn start(&mut self) -> Result<(), LightError> {
        if self.shutdown.is_triggered() {
            return Err(LightError::Stopped);
        }
        if self.join_handle.is_some() {
            warn!("ignoring second start of a running traffic light");
            return Err(LightError::AlreadyStarted);
        }
        self.config.validate()?;
        let cycle = PhaseCycle {
            phase: self.phase.clone(),
            sender: self.sender.clone(),
            timing: self.config.timing(),
            poll_interval: self.config.poll_interval(),
            rng: self.config.rng(),
            shutdown: self.shutdown.clone(),
        };
        let join_handle = thread::Builder::new()
            .name("trafficlight-cycle".to_string())
            .spawn(move || cycle.run())
            .map_err(LightError::Spawn)?;
        self.join_handle = Some(join_handle);
        info!(
            cycle_min_ms = self.config.cycle_min_ms,
            cycle_max_ms = self.config.cycle_max_ms,
            seed = ?self.config.seed,
            "traffic light started"
        );
        Ok(())
    }

    /// Returns the current phase without waiting.
    pub fn current_phase(&self) -> Phase {
        self.phase.load()
    }

    /// Blocks until the light switches to `Green`.
    ///
    /// Switches that happened since the last call are consumed first, in order. The current phase is not
    /// consulted: a light that is already green makes the caller wait for the next switch to green.
    pub fn wait_for_green(&mut self) -> Result<(), LightError> {
        self.wait_for(Phase::Green)
    }

    /// Blocks until the light switches to `target`, discarding every other switch.
    pub fn wait_for(&mut self, target: Phase) -> Result<(), LightError> {
        loop {
            let phase = self.receiver.receive()?;
            if phase == target {
                return Ok(());
            }
            trace!(%phase, %target, "discarding phase change");
        }
    }

    /// Blocks until the light switches and returns the new phase.
    pub fn next_transition(&mut self) -> Result<Phase, LightError> {
        Ok(self.receiver.receive()?)
    }

    /// Returns the number of switches that have not been consumed yet.
    pub fn pending_transitions(&self) -> usize {
        self.receiver.len()
    }

    /// Returns a handle that reads the phase from other threads.
    pub fn monitor(&self) -> PhaseMonitor {
        PhaseMonitor {
            phase: self.phase.clone(),
        }
    }

    /// Returns a handle that stops the light from other threads.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shutdown: self.shutdown.clone(),
            sender: self.sender.clone(),
        }
    }

    /// Stops the light and waits for its thread to exit.
    ///
    /// Switches that were already published can still be consumed; after that, waiting returns
    /// `LightError::Stopped`.
    pub fn stop(&mut self) {
        self.stop_handle().stop();
        if let Some(join_handle) = self.join_handle.take() {
            if join_handle.join().is_err() {
                warn!("traffic light cycle thread panicked");
            }
        }
    }
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TrafficLight {
    fn drop(&mut self) {
        self.stop();
    }
}

/// A read-only view of a light's phase that can be sent to other threads.
#[derive(Clone)]
pub struct PhaseMonitor {
    phase: Arc<AtomicPhase<Phase>>,
}

impl PhaseMonitor {
    /// Returns the current phase of the light.
    pub fn phase(&self) -> Phase {
        self.phase.load()
    }
}

/// Stops a light from any thread.
#[derive(Clone)]
pub struct StopHandle {
    shutdown: Shutdown,
    sender: Sender<Phase>,
}

impl StopHandle {
    /// Stops the light's cycle and wakes a consumer blocked in `wait_for_green`.
    pub fn stop(&self) {
        if !self.shutdown.is_triggered() {
            info!("traffic light stopping");
        }
        self.shutdown.trigger();
        self.sender.close();
    }

    /// Returns `true` once the light has been told to stop.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_triggered()
    }
}

/// The background loop of a started light. It is the only writer of the phase.
struct PhaseCycle {
    phase: Arc<AtomicPhase<Phase>>,
    sender: Sender<Phase>,
    timing: CycleTiming,
    poll_interval: Duration,
    rng: StdRng,
    shutdown: Shutdown,
}

impl PhaseCycle {
    fn run(mut self) {
        let mut transitions: u64 = 0;
        let mut cycle = self.timing.draw(&mut self.rng);
        let mut last_update = Instant::now();
        debug!(?cycle, "first cycle drawn");

        while !self.shutdown.wait_timeout(self.poll_interval) {
            if last_update.elapsed() < cycle {
                continue;
            }
            let phase = self.phase.advance();
            self.sender.send(phase);
            transitions += 1;
            last_update = Instant::now();
            cycle = self.timing.draw(&mut self.rng);
            debug!(
                %phase,
                transitions,
                next_cycle = ?cycle,
                "phase changed"
            );
        }
        info!(transitions, "traffic light stopped");
    }
}
