use std::{cell::Cell, rc::Rc, time::Duration};

use siege_core::{Color, EntityId, Layer, Paint, SimulationError, TypeTag, Vec2};
use siege_world::{
    downcast,
    query::{distance_to, in_range},
    Context, Drawable, Entity, EntityCore, Surface,
};

use crate::{Enemy, Plateau, Shot};

const BASE_SIZE: f32 = 0.7;
const BARREL_RADIUS: f32 = 0.2;

/// Combat parameters shared by towers of one kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSpec {
    /// Targeting radius in simulation units.
    pub range: f32,
    /// Health removed from an enemy per shot.
    pub damage: f32,
    /// Minimum time between two shots.
    pub reload: Duration,
    /// Speed of fired shots in simulation units per second.
    pub shot_speed: f32,
}

impl Default for TowerSpec {
    fn default() -> Self {
        Self {
            range: 3.0,
            damage: 2.0,
            reload: Duration::from_millis(800),
            shot_speed: 8.0,
        }
    }
}

/// Player-built tower that fires at the nearest enemy in range.
///
/// A tower starts disabled. It is enabled once dropped on a free [`Plateau`],
/// which it occupies until it leaves the simulation.
#[derive(Debug)]
pub struct Tower {
    core: EntityCore,
    spec: TowerSpec,
    enabled: Cell<bool>,
    selected: Cell<bool>,
    cooldown: Cell<u32>,
    plateau: Cell<Option<EntityId>>,
    body: Rc<TowerBody>,
    ring: Rc<RangeRing>,
}

impl Tower {
    /// Creates a disabled tower at `position`.
    #[must_use]
    pub fn new(position: Vec2, spec: TowerSpec) -> Self {
        Self {
            core: EntityCore::new(TypeTag::Tower, position),
            spec,
            enabled: Cell::new(false),
            selected: Cell::new(false),
            cooldown: Cell::new(0),
            plateau: Cell::new(None),
            body: Rc::new(TowerBody {
                center: Cell::new(position),
                enabled: Cell::new(false),
            }),
            ring: Rc::new(RangeRing {
                center: Cell::new(position),
                radius: spec.range,
                visible: Cell::new(false),
            }),
        }
    }

    /// Combat parameters of the tower.
    #[must_use]
    pub fn spec(&self) -> TowerSpec {
        self.spec
    }

    /// Reports whether the tower takes part in combat.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Reports whether the tower is the current selection.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    /// Marks the tower as selected, revealing its range ring.
    pub fn set_selected(&self, selected: bool) {
        self.selected.set(selected);
        self.ring.visible.set(selected);
    }

    /// Identifier of the plateau the tower stands on.
    #[must_use]
    pub fn plateau(&self) -> Option<EntityId> {
        self.plateau.get()
    }

    /// Moves the tower without changing its combat state.
    pub fn move_to(&self, position: Vec2) {
        self.core.set_position(position);
        self.body.center.set(position);
        self.ring.center.set(position);
    }

    /// Places the tower on `plateau` and enables it.
    ///
    /// Fails when the tower is not resident, is already placed, or the plateau
    /// already holds a tower.
    pub fn drop_on(&self, plateau: &Plateau) -> bool {
        let (Some(tower), Some(spot)) = (self.core.id(), plateau.core().id()) else {
            return false;
        };
        if self.plateau.get().is_some() || plateau.is_occupied() {
            return false;
        }
        plateau.occupy(tower);
        self.plateau.set(Some(spot));
        self.move_to(plateau.core().position());
        self.enabled.set(true);
        self.body.enabled.set(true);
        log::debug!("tower {tower:?} placed on plateau {spot:?}");
        true
    }

    fn fire(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        let position = self.core.position();
        let target = ctx
            .get(TypeTag::Enemy)
            .filter(in_range(position, self.spec.range))
            .cast::<Enemy>()
            .filter(|enemy| enemy.is_alive())
            .min_by_key(distance_to(position));
        let Some(target) = target.and_then(|enemy| enemy.core().id()) else {
            return Ok(());
        };

        ctx.add(Rc::new(Shot::new(
            position,
            target,
            self.spec.damage,
            self.spec.shot_speed,
        )))?;
        // The firing frame counts towards the reload.
        let reload = ctx.clock().rate().frames_in(self.spec.reload);
        self.cooldown.set(reload.saturating_sub(1));
        Ok(())
    }
}

impl Entity for Tower {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.add_drawable(self.body.clone());
        ctx.add_drawable(self.ring.clone());
        Ok(())
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        if !self.enabled.get() {
            return Ok(());
        }
        let cooldown = self.cooldown.get();
        if cooldown > 0 {
            self.cooldown.set(cooldown - 1);
            return Ok(());
        }
        self.fire(ctx)
    }

    fn clean(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        if let Some(plateau) = self
            .plateau
            .take()
            .and_then(|id| ctx.lookup(id))
            .and_then(downcast::<Plateau>)
        {
            if plateau.occupant() == self.core.id() {
                plateau.vacate();
            }
        }
        self.enabled.set(false);
        self.set_selected(false);
        ctx.remove_drawable(&self.body);
        ctx.remove_drawable(&self.ring);
        Ok(())
    }
}

#[derive(Debug)]
struct TowerBody {
    center: Cell<Vec2>,
    enabled: Cell<bool>,
}

impl Drawable for TowerBody {
    fn layer(&self) -> Layer {
        Layer::Tower
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let center = self.center.get();
        let base = if self.enabled.get() {
            Color::from_rgb_u8(70, 110, 200)
        } else {
            Color::from_rgb_u8(70, 110, 200).with_alpha_u8(128)
        };
        surface.draw_rect(center, Vec2::splat(BASE_SIZE), &Paint::fill(base));
        surface.draw_circle(
            center,
            BARREL_RADIUS,
            &Paint::fill(Color::from_rgb_u8(30, 40, 80)),
        );
    }
}

#[derive(Debug)]
struct RangeRing {
    center: Cell<Vec2>,
    radius: f32,
    visible: Cell<bool>,
}

impl Drawable for RangeRing {
    fn layer(&self) -> Layer {
        Layer::Ui
    }

    fn draw(&self, surface: &mut dyn Surface) {
        if !self.visible.get() {
            return;
        }
        surface.draw_circle(
            self.center.get(),
            self.radius,
            &Paint::stroke(Color::new(1.0, 1.0, 1.0, 0.5), 0.05),
        );
    }
}
