use std::{cell::Cell, rc::Rc, time::Duration};

use siege_core::{Color, EntityId, Layer, Paint, SimulationError, TypeTag, Vec2};
use siege_system_units::Enemy;
use siege_world::{query::in_range, Context, Drawable, Surface};

use crate::{Effect, EffectAction, EffectSite};

/// Time a heal pulse stays on screen.
pub const HEAL_DURATION: Duration = Duration::from_millis(700);

/// Area heal restoring a fraction of each enemy's own maximum health.
pub type HealEffect = Effect<Heal>;

/// Heals every enemy within a radius once, then fades out.
#[derive(Debug)]
pub struct Heal {
    fraction: f32,
    radius: f32,
    ring: Rc<HealRing>,
}

impl Heal {
    /// Creates a heal of `fraction` of each target's maximum health within `radius`.
    #[must_use]
    pub fn new(fraction: f32, radius: f32) -> Self {
        Self {
            fraction,
            radius,
            ring: Rc::new(HealRing {
                center: Cell::new(Vec2::ZERO),
                radius: Cell::new(0.0),
            }),
        }
    }

    /// Share of maximum health restored per target.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.fraction
    }

    /// Radius of the affected area.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Current radius of the expanding ring.
    #[must_use]
    pub fn ring_radius(&self) -> f32 {
        self.ring.radius.get()
    }
}

impl Effect<Heal> {
    /// Creates a pending heal pulse at `position` triggered by `origin`.
    #[must_use]
    pub fn new(origin: Option<EntityId>, position: Vec2, fraction: f32, radius: f32) -> Self {
        Self::from_action(EffectSite { position, origin }, Heal::new(fraction, radius))
    }
}

impl EffectAction for Heal {
    fn duration(&self) -> Duration {
        HEAL_DURATION
    }

    fn attach(&self, ctx: &mut Context<'_>, site: &EffectSite) {
        self.ring.center.set(site.position);
        self.ring.radius.set(0.0);
        ctx.add_drawable(self.ring.clone());
    }

    fn detach(&self, ctx: &mut Context<'_>) {
        ctx.remove_drawable(&self.ring);
    }

    fn begin(&self, ctx: &mut Context<'_>, site: &EffectSite) -> Result<(), SimulationError> {
        let mut healed = 0;
        for enemy in ctx
            .get(TypeTag::Enemy)
            .filter(in_range(site.position, self.radius))
            .cast::<Enemy>()
        {
            let _ = enemy.heal(self.fraction * enemy.health_max());
            healed += 1;
        }
        log::debug!("heal at {:?} reached {healed} enemies", site.position);
        Ok(())
    }

    fn progress(&self, fraction: f32) {
        self.ring.radius.set(self.radius * fraction);
    }
}

#[derive(Debug)]
struct HealRing {
    center: Cell<Vec2>,
    radius: Cell<f32>,
}

impl Drawable for HealRing {
    fn layer(&self) -> Layer {
        Layer::Shot
    }

    fn draw(&self, surface: &mut dyn Surface) {
        surface.draw_circle(
            self.center.get(),
            self.radius.get(),
            &Paint::stroke(Color::from_rgb_u8(120, 230, 140).with_alpha_u8(180), 0.08),
        );
    }
}
