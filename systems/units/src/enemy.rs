use std::{cell::Cell, rc::Rc};

use siege_core::{Color, Layer, Paint, SimulationError, TypeTag, Vec2};
use siege_world::{Context, Drawable, Entity, EntityCore, Surface};

const BODY_RADIUS: f32 = 0.3;
const BAR_WIDTH: f32 = 0.6;
const BAR_OFFSET: f32 = 0.45;

/// Hostile unit walking a waypoint path towards the exit.
#[derive(Debug)]
pub struct Enemy {
    core: EntityCore,
    health: Cell<f32>,
    health_max: f32,
    speed: f32,
    path: Vec<Vec2>,
    next_waypoint: Cell<usize>,
    body: Rc<EnemyBody>,
}

impl Enemy {
    /// Creates an enemy at full health standing at `position`.
    ///
    /// `speed` is expressed in simulation units per second. The enemy leaves
    /// the simulation once it reaches the last point of `path`.
    #[must_use]
    pub fn new(position: Vec2, health_max: f32, speed: f32, path: Vec<Vec2>) -> Self {
        let health_max = health_max.max(0.0);
        Self {
            core: EntityCore::new(TypeTag::Enemy, position),
            health: Cell::new(health_max),
            health_max,
            speed,
            path,
            next_waypoint: Cell::new(0),
            body: Rc::new(EnemyBody {
                center: Cell::new(position),
                health_ratio: Cell::new(1.0),
            }),
        }
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health.get()
    }

    /// Upper bound of health.
    #[must_use]
    pub fn health_max(&self) -> f32 {
        self.health_max
    }

    /// Reports whether health remains.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health.get() > 0.0
    }

    /// Restores up to `amount` health, never exceeding the maximum.
    ///
    /// Returns the amount actually restored.
    pub fn heal(&self, amount: f32) -> f32 {
        let before = self.health.get();
        self.set_health((before + amount.max(0.0)).min(self.health_max));
        self.health.get() - before
    }

    /// Subtracts `amount` health and reports whether the enemy died from it.
    pub fn damage(&self, amount: f32) -> bool {
        let was_alive = self.is_alive();
        self.set_health((self.health.get() - amount.max(0.0)).max(0.0));
        was_alive && !self.is_alive()
    }

    fn set_health(&self, health: f32) {
        self.health.set(health);
        let ratio = if self.health_max > 0.0 {
            health / self.health_max
        } else {
            0.0
        };
        self.body.health_ratio.set(ratio);
    }

    /// Advances along the path by `distance`, returning `true` once the last
    /// waypoint has been reached.
    fn walk(&self, mut distance: f32) -> bool {
        let mut position = self.core.position();
        loop {
            let Some(&waypoint) = self.path.get(self.next_waypoint.get()) else {
                self.core.set_position(position);
                return true;
            };
            let gap = position.distance(waypoint);
            if gap > distance {
                position += (waypoint - position) / gap * distance;
                self.core.set_position(position);
                return false;
            }
            distance -= gap;
            position = waypoint;
            self.next_waypoint.set(self.next_waypoint.get() + 1);
        }
    }
}

impl Entity for Enemy {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.add_drawable(self.body.clone());
        Ok(())
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        let step = self.speed * ctx.clock().frame_seconds();
        let arrived = self.walk(step.max(0.0));
        self.body.center.set(self.core.position());
        if arrived {
            log::debug!("enemy {:?} reached the exit", self.core.id());
            ctx.remove(self);
        }
        Ok(())
    }

    fn clean(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.remove_drawable(&self.body);
        Ok(())
    }
}

#[derive(Debug)]
struct EnemyBody {
    center: Cell<Vec2>,
    health_ratio: Cell<f32>,
}

impl Drawable for EnemyBody {
    fn layer(&self) -> Layer {
        Layer::Enemy
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let center = self.center.get();
        surface.draw_circle(
            center,
            BODY_RADIUS,
            &Paint::fill(Color::from_rgb_u8(200, 60, 50)),
        );

        let left = center + Vec2::new(-BAR_WIDTH / 2.0, BAR_OFFSET);
        let filled = left + Vec2::new(BAR_WIDTH * self.health_ratio.get(), 0.0);
        surface.draw_line(
            left,
            left + Vec2::new(BAR_WIDTH, 0.0),
            &Paint::stroke(Color::from_rgb_u8(60, 20, 20), 0.08),
        );
        surface.draw_line(
            left,
            filled,
            &Paint::stroke(Color::from_rgb_u8(90, 210, 90), 0.08),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heal_clamps_to_maximum() {
        let enemy = Enemy::new(Vec2::ZERO, 10.0, 1.0, Vec::new());
        let _ = enemy.damage(3.0);

        assert_eq!(enemy.heal(5.0), 3.0);
        assert_eq!(enemy.health(), 10.0);
    }

    #[test]
    fn damage_reports_the_killing_blow_once() {
        let enemy = Enemy::new(Vec2::ZERO, 4.0, 1.0, Vec::new());

        assert!(!enemy.damage(3.0));
        assert!(enemy.damage(3.0));
        assert!(!enemy.damage(3.0));
        assert_eq!(enemy.health(), 0.0);
        assert!(!enemy.is_alive());
    }

    #[test]
    fn walk_carries_leftover_distance_past_waypoints() {
        let path = vec![Vec2::new(1.0, 0.0), Vec2::new(1.0, 2.0)];
        let enemy = Enemy::new(Vec2::ZERO, 1.0, 1.0, path);

        assert!(!enemy.walk(1.5));
        assert_eq!(enemy.core().position(), Vec2::new(1.0, 0.5));
        assert!(enemy.walk(5.0));
        assert_eq!(enemy.core().position(), Vec2::new(1.0, 2.0));
    }
}
