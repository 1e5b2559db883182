//! Seeded siege run: a straight lane flanked by plateaus, towers dragged onto
//! random spots, enemies spawned on a fixed cadence and periodic heal pulses.

use std::{fmt, rc::Rc};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use siege_core::{TypeTag, Vec2};
use siege_rendering::Viewport;
use siege_system_effects::HealEffect;
use siege_system_placement::{DragPhase, Placement};
use siege_system_units::{Enemy, Plateau, Tower};
use siege_world::{Entity, FrameReport, Surface, World};

use crate::config::ScenarioConfig;

const SPAWN_JITTER: f32 = 0.2;

/// Outcome of a run so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) frames: u64,
    pub(crate) spawned: u32,
    pub(crate) killed: u32,
    pub(crate) escaped: u32,
    pub(crate) towers: usize,
    pub(crate) heals: u32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames: {} enemies spawned, {} killed, {} escaped; {} towers; {} heal pulses",
            self.frames, self.spawned, self.killed, self.escaped, self.towers, self.heals
        )
    }
}

/// World plus the scripted inputs feeding it between frames.
#[derive(Debug)]
pub(crate) struct Scenario {
    config: ScenarioConfig,
    world: World,
    rng: ChaCha8Rng,
    lane: Vec<Vec2>,
    enemies: Vec<Rc<Enemy>>,
    spawn_every: u32,
    heal_every: u32,
    heals: u32,
    towers: usize,
}

impl Scenario {
    /// Lays out the map and drags `tower_count` towers onto it.
    ///
    /// Tower drops are aimed at random screen positions mapped through
    /// `viewport`, the way a player's gestures would arrive.
    pub(crate) fn build(config: &ScenarioConfig, seed: u64, viewport: &Viewport) -> Result<Self> {
        let rate = config.frame_rate();
        let mut world = World::new(rate);
        let lane_y = (config.rows / 2) as f32 + 0.5;

        for column in 0..config.columns {
            let x = column as f32 + 0.5;
            for y in [lane_y - 1.0, lane_y + 1.0] {
                world
                    .add(Rc::new(Plateau::new(Vec2::new(x, y))))
                    .context("admit plateau")?;
            }
        }

        let mut scenario = Self {
            config: config.clone(),
            world,
            rng: ChaCha8Rng::seed_from_u64(seed),
            lane: vec![
                Vec2::new(-0.5, lane_y),
                Vec2::new(config.columns as f32 + 0.5, lane_y),
            ],
            enemies: Vec::new(),
            spawn_every: rate.frames_in(config.spawn_interval()),
            heal_every: rate.frames_in(config.heal_interval()),
            heals: 0,
            towers: 0,
        };
        scenario.place_towers(viewport)?;
        Ok(scenario)
    }

    fn place_towers(&mut self, viewport: &Viewport) -> Result<()> {
        let mut placement = Placement::new();
        let spec = self.config.tower_spec();
        let map_origin = viewport.offset();
        let map_extent = viewport.sim_to_screen(Vec2::new(
            self.config.columns as f32,
            self.config.rows as f32,
        ));

        for _ in 0..self.config.tower_count {
            let screen = Vec2::new(
                self.rng.gen_range(map_origin.x..=map_extent.x),
                self.rng.gen_range(map_origin.y..=map_extent.y),
            );
            let point = viewport.clamp_to_map(viewport.screen_to_sim(screen));
            let tower = Rc::new(Tower::new(point, spec));

            for phase in [DragPhase::Entered, DragPhase::Location, DragPhase::Drop] {
                placement
                    .drag(&mut self.world, &tower, phase, point)
                    .context("drag tower onto the map")?;
            }
            if tower.is_enabled() {
                self.towers += 1;
            } else {
                log::warn!("no free plateau left for tower near {point:?}");
            }
        }
        Ok(())
    }

    /// Feeds scheduled spawns and heals, then simulates one frame.
    pub(crate) fn advance(&mut self) -> Result<FrameReport> {
        let frame = self.world.clock().frame();
        if self.due(frame, self.spawn_every) && self.spawned() < self.config.enemy_count {
            self.spawn_enemy()?;
        }
        if frame > 0 && self.due(frame, self.heal_every) {
            self.pulse_heal()?;
        }
        self.world.step().context("simulate frame")
    }

    fn due(&self, frame: u64, every: u32) -> bool {
        frame % u64::from(every.max(1)) == 0
    }

    fn spawned(&self) -> u32 {
        u32::try_from(self.enemies.len()).unwrap_or(u32::MAX)
    }

    fn spawn_enemy(&mut self) -> Result<()> {
        let jitter = self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
        let path: Vec<Vec2> = self
            .lane
            .iter()
            .skip(1)
            .map(|point| *point + Vec2::new(0.0, jitter))
            .collect();
        let enemy = Rc::new(Enemy::new(
            self.lane[0] + Vec2::new(0.0, jitter),
            self.config.enemy_health,
            self.config.enemy_speed,
            path,
        ));
        self.world.add(enemy.clone()).context("spawn enemy")?;
        self.enemies.push(enemy);
        Ok(())
    }

    fn pulse_heal(&mut self) -> Result<()> {
        let resident: Vec<Rc<Enemy>> = self.world.get(TypeTag::Enemy).cast::<Enemy>().collect();
        if resident.is_empty() {
            return Ok(());
        }
        let healer = &resident[self.rng.gen_range(0..resident.len())];
        let heal = HealEffect::new(
            healer.core().id(),
            healer.core().position(),
            self.config.heal_fraction,
            self.config.heal_radius,
        );
        self.world.add(Rc::new(heal)).context("pulse heal")?;
        self.heals += 1;
        Ok(())
    }

    /// Reports whether every enemy has spawned and left the map.
    pub(crate) fn is_finished(&self) -> bool {
        self.spawned() >= self.config.enemy_count
            && self.enemies.iter().all(|enemy| !enemy.core().in_simulation())
    }

    pub(crate) fn draw(&self, surface: &mut dyn Surface) {
        self.world.draw(surface);
    }

    pub(crate) fn summary(&self) -> Summary {
        let departed = self
            .enemies
            .iter()
            .filter(|enemy| !enemy.core().in_simulation());
        let (killed, escaped) = departed.fold((0, 0), |(killed, escaped), enemy| {
            if enemy.is_alive() {
                (killed, escaped + 1)
            } else {
                (killed + 1, escaped)
            }
        });
        Summary {
            frames: self.world.clock().frame(),
            spawned: self.spawned(),
            killed,
            escaped,
            towers: self.towers,
            heals: self.heals,
        }
    }
}
