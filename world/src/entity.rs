//! Entity lifecycle contract and the per-entity bookkeeping shared by all variants.

use std::{any::Any, cell::Cell, fmt, rc::Rc};

use siege_core::{EntityId, SimulationError, TypeTag, Vec2};

use crate::Context;

/// Shared handle through which the registry and queries refer to entities.
pub type EntityRef = Rc<dyn Entity>;

/// Upcast helper that lets entity handles be narrowed to concrete types.
pub trait AsAny: Any {
    /// Converts the shared handle into a type-erased handle.
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Contract implemented by every simulated object.
///
/// Hooks receive `&self`: entities keep mutable state in cells so that a tick
/// may act on other entities returned by queries while the registry retains
/// sole ownership. The registry calls `init` exactly once on admission, `tick`
/// once per frame while resident, and `clean` exactly once on removal.
pub trait Entity: AsAny + fmt::Debug {
    /// Bookkeeping shared by all entity variants.
    fn core(&self) -> &EntityCore;

    /// Called once when the entity is admitted to the registry.
    fn init(&self, _ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        Ok(())
    }

    /// Called once per frame while the entity is resident.
    fn tick(&self, _ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        Ok(())
    }

    /// Called once when the entity leaves the registry.
    fn clean(&self, _ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        Ok(())
    }
}

/// Narrows an entity handle to a concrete variant, yielding `None` on mismatch.
#[must_use]
pub fn downcast<T: Entity>(entity: EntityRef) -> Option<Rc<T>> {
    AsAny::into_any(entity).downcast::<T>().ok()
}

/// Type tag, position and registry membership of a single entity.
#[derive(Debug)]
pub struct EntityCore {
    tag: TypeTag,
    position: Cell<Vec2>,
    id: Cell<Option<EntityId>>,
}

impl EntityCore {
    /// Creates bookkeeping for an entity that has not been admitted yet.
    #[must_use]
    pub fn new(tag: TypeTag, position: Vec2) -> Self {
        Self {
            tag,
            position: Cell::new(position),
            id: Cell::new(None),
        }
    }

    /// Tag under which the registry indexes the entity.
    #[must_use]
    pub fn tag(&self) -> TypeTag {
        self.tag
    }

    /// Current position in simulation space.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position.get()
    }

    /// Moves the entity to `position`.
    pub fn set_position(&self, position: Vec2) {
        self.position.set(position);
    }

    /// Identifier allocated on admission, or `None` while outside the registry.
    ///
    /// This is the entity's only link back to its registry; it grants lookup,
    /// never ownership.
    #[must_use]
    pub fn id(&self) -> Option<EntityId> {
        self.id.get()
    }

    /// Whether the entity is currently resident and therefore tickable.
    #[must_use]
    pub fn in_simulation(&self) -> bool {
        self.id.get().is_some()
    }

    /// Euclidean distance between the entity and `point`.
    #[must_use]
    pub fn distance_to(&self, point: Vec2) -> f32 {
        self.position().distance(point)
    }

    pub(crate) fn admit(&self, id: EntityId) {
        self.id.set(Some(id));
    }

    pub(crate) fn release(&self) {
        self.id.set(None);
    }
}

/// Access to the [`EntityCore`] behind any shared entity handle.
pub trait AsCore {
    /// Bookkeeping of the referenced entity.
    fn as_core(&self) -> &EntityCore;
}

impl<T: Entity + ?Sized> AsCore for Rc<T> {
    fn as_core(&self) -> &EntityCore {
        (**self).core()
    }
}
