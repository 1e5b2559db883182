use std::{cell::Cell, rc::Rc};

use siege_core::{Color, EntityId, Layer, Paint, SimulationError, TypeTag, Vec2};
use siege_world::{Context, Drawable, Entity, EntityCore, Surface};

const TILE_SIZE: f32 = 0.9;

/// Buildable spot on the map that holds at most one tower.
#[derive(Debug)]
pub struct Plateau {
    core: EntityCore,
    occupant: Cell<Option<EntityId>>,
    tile: Rc<PlateauTile>,
}

impl Plateau {
    /// Creates an empty plateau centred at `position`.
    #[must_use]
    pub fn new(position: Vec2) -> Self {
        Self {
            core: EntityCore::new(TypeTag::Tile, position),
            occupant: Cell::new(None),
            tile: Rc::new(PlateauTile {
                center: position,
                occupied: Cell::new(false),
            }),
        }
    }

    /// Identifier of the tower standing on the plateau.
    #[must_use]
    pub fn occupant(&self) -> Option<EntityId> {
        self.occupant.get()
    }

    /// Reports whether a tower stands on the plateau.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupant.get().is_some()
    }

    /// Records `tower` as the plateau's occupant.
    pub fn occupy(&self, tower: EntityId) {
        self.occupant.set(Some(tower));
        self.tile.occupied.set(true);
    }

    /// Clears the occupant.
    pub fn vacate(&self) {
        self.occupant.set(None);
        self.tile.occupied.set(false);
    }

    /// Query predicate keeping plateaus without a tower.
    pub fn unoccupied() -> impl FnMut(&Rc<Plateau>) -> bool {
        |plateau| !plateau.is_occupied()
    }
}

impl Entity for Plateau {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.add_drawable(self.tile.clone());
        Ok(())
    }

    fn clean(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        ctx.remove_drawable(&self.tile);
        Ok(())
    }
}

#[derive(Debug)]
struct PlateauTile {
    center: Vec2,
    occupied: Cell<bool>,
}

impl Drawable for PlateauTile {
    fn layer(&self) -> Layer {
        Layer::Tile
    }

    fn draw(&self, surface: &mut dyn Surface) {
        let color = if self.occupied.get() {
            Color::from_rgb_u8(96, 96, 104)
        } else {
            Color::from_rgb_u8(150, 150, 160)
        };
        surface.draw_rect(self.center, Vec2::splat(TILE_SIZE), &Paint::fill(color));
    }
}
