use std::{cell::Cell, rc::Rc};

use siege_core::{Color, EntityId, Layer, Paint, SimulationError, TypeTag, Vec2};
use siege_world::{downcast, Context, Drawable, Entity, EntityCore, Surface};

use crate::Enemy;

const SHOT_RADIUS: f32 = 0.1;

/// Projectile homing on a single enemy.
#[derive(Debug)]
pub struct Shot {
    core: EntityCore,
    target: EntityId,
    damage: f32,
    speed: f32,
    sprite: Rc<ShotSprite>,
}

impl Shot {
    /// Creates a shot at `position` flying at `speed` units per second towards
    /// the enemy identified by `target`.
    #[must_use]
    pub fn new(position: Vec2, target: EntityId, damage: f32, speed: f32) -> Self {
        Self {
            core: EntityCore::new(TypeTag::Shot, position),
            target,
            damage,
            speed,
            sprite: Rc::new(ShotSprite {
                center: Cell::new(position),
            }),
        }
    }

    /// Identifier of the enemy being chased.
    #[must_use]
    pub fn target(&self) -> EntityId {
        self.target
    }
}

impl Entity for Shot {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.add_drawable(self.sprite.clone());
        Ok(())
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        let target = ctx
            .lookup(self.target)
            .and_then(downcast::<Enemy>)
            .filter(|enemy| enemy.is_alive());
        let Some(target) = target else {
            ctx.remove(self);
            return Ok(());
        };

        let position = self.core.position();
        let destination = target.core().position();
        let step = self.speed.max(0.0) * ctx.clock().frame_seconds();
        let gap = position.distance(destination);

        if gap <= step {
            self.core.set_position(destination);
            if target.damage(self.damage) {
                log::debug!("shot {:?} killed enemy {:?}", self.core.id(), self.target);
                ctx.remove(&*target);
            }
            ctx.remove(self);
        } else {
            self.core
                .set_position(position + (destination - position) / gap * step);
        }
        self.sprite.center.set(self.core.position());
        Ok(())
    }

    fn clean(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.remove_drawable(&self.sprite);
        Ok(())
    }
}

#[derive(Debug)]
struct ShotSprite {
    center: Cell<Vec2>,
}

impl Drawable for ShotSprite {
    fn layer(&self) -> Layer {
        Layer::Shot
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.draw_circle(
            self.center.get(),
            SHOT_RADIUS,
            &Paint::fill(Color::from_rgb_u8(250, 220, 90)),
        );
    }
}
