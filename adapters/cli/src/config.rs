//! Scenario parameters loaded from an optional TOML file.

use std::{path::Path, time::Duration};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use siege_core::{FrameRate, TARGET_FRAME_RATE};
use siege_system_units::TowerSpec;

/// Tunables for a headless siege run.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScenarioConfig {
    /// Map width in simulation units.
    pub(crate) columns: u32,
    /// Map height in simulation units.
    pub(crate) rows: u32,
    /// Frames simulated per second.
    pub(crate) frame_rate: u32,
    /// Enemies spawned over the run.
    pub(crate) enemy_count: u32,
    /// Maximum health of every enemy.
    pub(crate) enemy_health: f32,
    /// Enemy walking speed in units per second.
    pub(crate) enemy_speed: f32,
    /// Milliseconds between two spawns.
    pub(crate) spawn_interval_ms: u64,
    /// Towers dragged onto the map before the first frame.
    pub(crate) tower_count: u32,
    /// Tower targeting radius.
    pub(crate) tower_range: f32,
    /// Damage dealt per shot.
    pub(crate) tower_damage: f32,
    /// Milliseconds between two shots of one tower.
    pub(crate) tower_reload_ms: u64,
    /// Shot speed in units per second.
    pub(crate) shot_speed: f32,
    /// Milliseconds between two heal pulses.
    pub(crate) heal_interval_ms: u64,
    /// Share of maximum health restored by a pulse.
    pub(crate) heal_fraction: f32,
    /// Radius of a heal pulse.
    pub(crate) heal_radius: f32,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 9,
            frame_rate: TARGET_FRAME_RATE,
            enemy_count: 12,
            enemy_health: 10.0,
            enemy_speed: 1.5,
            spawn_interval_ms: 1200,
            tower_count: 4,
            tower_range: 3.0,
            tower_damage: 2.0,
            tower_reload_ms: 800,
            shot_speed: 8.0,
            heal_interval_ms: 3000,
            heal_fraction: 0.25,
            heal_radius: 1.5,
        }
    }
}

impl ScenarioConfig {
    /// Loads the scenario at `path`, or the built-in defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read scenario {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("load scenario {}", path.display()))
    }

    /// Parses and validates scenario TOML.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("parse scenario TOML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.columns > 0,
            "scenario needs at least one column, got {}",
            self.columns
        );
        ensure!(
            self.rows >= 3,
            "scenario needs at least three rows, got {}",
            self.rows
        );
        ensure!(self.frame_rate > 0, "frame rate must be positive");
        ensure!(
            self.enemy_health > 0.0,
            "enemy health must be positive, got {}",
            self.enemy_health
        );
        ensure!(
            (0.0..=1.0).contains(&self.heal_fraction),
            "heal fraction must lie in 0..=1, got {}",
            self.heal_fraction
        );
        Ok(())
    }

    pub(crate) fn frame_rate(&self) -> FrameRate {
        FrameRate::new(self.frame_rate)
    }

    pub(crate) fn tower_spec(&self) -> TowerSpec {
        TowerSpec {
            range: self.tower_range,
            damage: self.tower_damage,
            reload: Duration::from_millis(self.tower_reload_ms),
            shot_speed: self.shot_speed,
        }
    }

    pub(crate) fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    pub(crate) fn heal_interval(&self) -> Duration {
        Duration::from_millis(self.heal_interval_ms)
    }
}
