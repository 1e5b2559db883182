#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player-facing tower selection and the drag protocol that places new towers
//! onto free plateaus.

use std::rc::Rc;

use siege_core::{EntityId, SimulationError, TypeTag, Vec2};
use siege_system_units::{Plateau, Tower};
use siege_world::{query::distance_to, Entity, World};

/// Maximum distance between a tap and a tower for the tap to select it.
pub const SELECT_RADIUS: f32 = 0.5;

/// Outcome of a tap on the map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The tapped tower became the selection.
    Selected(EntityId),
    /// The already selected tower was tapped again; its details should be shown.
    ShowInfo(EntityId),
    /// Nothing was close enough; the selection was cleared.
    Cleared,
}

/// Stage of a drag gesture carrying a tower that is not yet built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragPhase {
    /// The gesture entered the map.
    Entered,
    /// The gesture left the map.
    Exited,
    /// The gesture moved over the map.
    Location,
    /// The gesture was released over the map.
    Drop,
}

/// Tracks the selected tower and applies drag gestures to the world.
#[derive(Debug, Default)]
pub struct Placement {
    selected: Option<Rc<Tower>>,
}

impl Placement {
    /// Creates a placement controller with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected tower.
    #[must_use]
    pub fn selected(&self) -> Option<&Rc<Tower>> {
        self.selected.as_ref()
    }

    /// Handles a tap at `point` in simulation units.
    pub fn select_at(&mut self, world: &World, point: Vec2) -> Selection {
        let closest = world
            .get(TypeTag::Tower)
            .cast::<Tower>()
            .min_by_key(distance_to(point))
            .filter(|tower| tower.core().distance_to(point) < SELECT_RADIUS);

        let Some((tower, id)) = closest.and_then(|tower| {
            let id = tower.core().id()?;
            Some((tower, id))
        }) else {
            self.select(None);
            return Selection::Cleared;
        };

        let reselected = self
            .selected
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, &tower));
        if reselected {
            Selection::ShowInfo(id)
        } else {
            self.select(Some(tower));
            Selection::Selected(id)
        }
    }

    /// Applies one phase of a drag gesture carrying `tower` at `point`.
    ///
    /// The tower is admitted disabled while the gesture hovers the map and is
    /// only enabled once dropped on a free plateau.
    pub fn drag(
        &mut self,
        world: &mut World,
        tower: &Rc<Tower>,
        phase: DragPhase,
        point: Vec2,
    ) -> Result<(), SimulationError> {
        let closest = world
            .get(TypeTag::Tile)
            .cast::<Plateau>()
            .filter(Plateau::unoccupied())
            .min_by_key(distance_to(point));
        let resident = tower.core().in_simulation();

        match phase {
            DragPhase::Entered => {
                if closest.is_some() && !resident {
                    world.add(tower.clone())?;
                    self.select(Some(Rc::clone(tower)));
                }
            }
            DragPhase::Exited => {
                if resident {
                    world.remove(&**tower)?;
                    self.select(None);
                }
            }
            DragPhase::Location => {
                if let (true, Some(plateau)) = (resident, closest) {
                    tower.move_to(plateau.core().position());
                }
            }
            DragPhase::Drop => {
                if let (true, Some(plateau)) = (resident, closest) {
                    if !tower.drop_on(&plateau) {
                        log::debug!("drop on plateau {:?} refused", plateau.core().id());
                    }
                    self.select(None);
                }
            }
        }
        Ok(())
    }

    fn select(&mut self, tower: Option<Rc<Tower>>) {
        if let Some(previous) = self.selected.take() {
            previous.set_selected(false);
        }
        if let Some(tower) = &tower {
            tower.set_selected(true);
        }
        self.selected = tower;
    }
}
