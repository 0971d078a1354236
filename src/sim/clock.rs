//! Simulation Clock & Delayed Callbacks
//!
//! The simulation advances in fixed ticks of [`GAME_TICK_MS`]. The clock
//! decouples simulated time from wall time: in `Locked` mode every app
//! update is exactly one tick (headless runs and tests), while `Wall` mode
//! accumulates real frame time and only ticks once a full tick's worth has
//! elapsed, so simulation speed is frame-rate independent but tick-quantized.

use bevy::prelude::*;

use super::constants::GAME_TICK_MS;

/// How the clock sources its time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClockMode {
    /// Each `App::update` advances exactly one tick. Deterministic.
    #[default]
    Locked,
    /// Accumulate wall time; tick only when a full tick has elapsed.
    Wall,
}

/// The simulation clock resource.
///
/// `delta_ms` is the simulated time advanced this frame: either one tick or
/// zero. Systems gate on [`sim_ticked`] so a frame that doesn't complete a
/// tick advances no simulation state.
#[derive(Resource, Debug)]
pub struct SimClock {
    /// Simulated milliseconds since combat began.
    pub elapsed_ms: f64,
    /// Simulated milliseconds advanced this frame (0 when no tick fired).
    pub delta_ms: f64,
    /// Speed multiplier for `Wall` mode (0.0 = paused).
    pub speed: f32,
    pub mode: ClockMode,
    /// Set by the start-of-fight pass on the first frame; time only advances
    /// after setup has run.
    pub fight_started: bool,
    accumulator_ms: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self {
            elapsed_ms: 0.0,
            delta_ms: 0.0,
            speed: 1.0,
            mode: ClockMode::Locked,
            fight_started: false,
            accumulator_ms: 0.0,
        }
    }
}

impl SimClock {
    pub fn wall() -> Self {
        Self {
            mode: ClockMode::Wall,
            ..Default::default()
        }
    }

    /// Whether a simulation tick fired this frame.
    pub fn ticked(&self) -> bool {
        self.delta_ms > 0.0
    }
}

/// Run condition: the current frame advanced the simulation by one tick.
pub fn sim_ticked(clock: Res<SimClock>) -> bool {
    clock.ticked()
}

/// Advances the simulation clock. Must run before all simulation systems.
///
/// The first frame is reserved for the start-of-fight setup pass and does
/// not advance time.
pub fn advance_clock(time: Res<Time>, mut clock: ResMut<SimClock>) {
    if !clock.fight_started {
        clock.delta_ms = 0.0;
        return;
    }
    match clock.mode {
        ClockMode::Locked => {
            clock.delta_ms = GAME_TICK_MS;
            clock.elapsed_ms += GAME_TICK_MS;
        }
        ClockMode::Wall => {
            clock.accumulator_ms += time.delta_secs_f64() * 1000.0 * clock.speed as f64;
            // Quantized: a frame either completes one tick or none. The small
            // epsilon mirrors frame jitter tolerance in animation-frame loops.
            if clock.accumulator_ms >= GAME_TICK_MS - 1.0 {
                clock.delta_ms = GAME_TICK_MS;
                clock.elapsed_ms += GAME_TICK_MS;
                clock.accumulator_ms -= GAME_TICK_MS;
            } else {
                clock.delta_ms = 0.0;
            }
        }
    }
}

/// Continuation invoked when its trigger time passes.
pub type DelayedFn = Box<dyn FnOnce(f64, &mut Commands) + Send + Sync>;

/// A paused piece of game logic scheduled to resume at an absolute
/// simulated timestamp.
pub struct DelayedCallback {
    pub resumes_at_ms: f64,
    callback: Option<DelayedFn>,
}

/// Registry of delayed callbacks, polled once per tick. Each callback fires
/// exactly once and is then removed.
#[derive(Resource, Default)]
pub struct DelayedCallbacks {
    callbacks: Vec<DelayedCallback>,
}

impl DelayedCallbacks {
    /// Schedule `callback` to run at the given absolute simulated time.
    pub fn schedule(&mut self, resumes_at_ms: f64, callback: DelayedFn) {
        self.callbacks.push(DelayedCallback {
            resumes_at_ms,
            callback: Some(callback),
        });
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

/// Fires due delayed callbacks and removes them.
pub fn process_delayed_callbacks(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut delays: ResMut<DelayedCallbacks>,
) {
    let elapsed_ms = clock.elapsed_ms;
    let mut due = Vec::new();
    delays.callbacks.retain_mut(|delay| {
        if elapsed_ms >= delay.resumes_at_ms {
            if let Some(callback) = delay.callback.take() {
                due.push(callback);
            }
            false
        } else {
            true
        }
    });
    for callback in due {
        callback(elapsed_ms, &mut commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locked_clock_does_not_advance_before_fight_start() {
        let clock = SimClock::default();
        assert!(!clock.fight_started);
        assert!(!clock.ticked());
    }

    #[test]
    fn delayed_callbacks_report_len() {
        let mut delays = DelayedCallbacks::default();
        assert!(delays.is_empty());
        delays.schedule(1000.0, Box::new(|_, _| {}));
        assert_eq!(delays.len(), 1);
    }
}
