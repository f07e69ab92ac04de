// app.rs - Fixed-accumulator application driver
//
// One frame: accumulate wall time, then run as many fixed ticks as fit (up to
// the per-frame cap). One tick: overlay begin, game state, scene systems and
// sweep, overlay end.

use anyhow::{Context, Result};
use keel_core::time::{FixedStep, SimulationTime};
use keel_metrics::FrameTimer;
use keel_scene::SceneManager;
use keel_services::EngineSettings;
use std::time::{Duration, Instant};

/// Game-specific logic driven once per tick, before the scene systems.
pub trait GameState {
    fn update(&mut self, scene: &mut SceneManager, ts: Duration) -> Result<()>;
}

/// Tooling drawn around every tick (editor inspector, debug HUD).
pub trait FrameOverlay {
    fn begin_frame(&mut self, scene: &mut SceneManager);
    fn end_frame(&mut self, scene: &mut SceneManager);
}

/// A game state that does nothing; scene systems still run.
#[derive(Debug, Default)]
pub struct IdleState;

impl GameState for IdleState {
    fn update(&mut self, _scene: &mut SceneManager, _ts: Duration) -> Result<()> {
        Ok(())
    }
}

pub struct Application {
    scene: SceneManager,
    state: Box<dyn GameState>,
    overlay: Option<Box<dyn FrameOverlay>>,
    step: FixedStep,
    time: SimulationTime,
    frame_timer: FrameTimer,
}

impl Application {
    pub fn new(settings: &EngineSettings, scene: SceneManager, state: Box<dyn GameState>) -> Self {
        let simulation = &settings.simulation;
        Self {
            scene,
            state,
            overlay: None,
            step: FixedStep::new(simulation.tick_rate_hz, simulation.max_ticks_per_frame),
            time: SimulationTime::new(),
            frame_timer: FrameTimer::new(120),
        }
    }

    pub fn with_overlay(mut self, overlay: Box<dyn FrameOverlay>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneManager {
        &mut self.scene
    }

    pub fn time(&self) -> &SimulationTime {
        &self.time
    }

    pub fn step(&self) -> &FixedStep {
        &self.step
    }

    pub fn frame_timer(&self) -> &FrameTimer {
        &self.frame_timer
    }

    /// Run one fixed tick.
    pub fn tick(&mut self) -> Result<()> {
        let ts = self.step.tick_duration();
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.begin_frame(&mut self.scene);
        }
        self.state
            .update(&mut self.scene, ts)
            .with_context(|| format!("game state failed on tick {}", self.time.tick_count()))?;
        self.scene
            .on_update(ts)
            .with_context(|| format!("scene update failed on tick {}", self.time.tick_count()))?;
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.end_frame(&mut self.scene);
        }
        self.time.advance_tick(ts);
        Ok(())
    }

    /// Feed one frame of wall time. Returns the number of ticks run.
    pub fn frame(&mut self, elapsed: Duration) -> Result<u32> {
        self.frame_timer.begin();
        self.step.accumulate(elapsed);
        let mut ticks = 0;
        while self.step.next_tick() {
            self.tick()?;
            ticks += 1;
        }
        self.frame_timer.end();
        Ok(ticks)
    }

    /// Run exactly `count` ticks without consulting the clock.
    pub fn run_ticks(&mut self, count: u64) -> Result<()> {
        for _ in 0..count {
            self.tick()?;
        }
        tracing::debug!(ticks = count, total = self.time.tick_count(), "headless run finished");
        Ok(())
    }

    /// Real-time loop until `max_ticks` ticks have run.
    pub fn run_realtime(&mut self, max_ticks: u64) -> Result<()> {
        let mut last = Instant::now();
        while self.time.tick_count() < max_ticks {
            let now = Instant::now();
            self.frame(now - last)?;
            last = now;

            if self.frame_timer.frames() % 120 == 0 {
                tracing::trace!(fps = self.frame_timer.fps(), "frame stats");
            }
            std::thread::sleep(self.step.tick_duration().saturating_sub(last.elapsed()));
        }
        Ok(())
    }
}
