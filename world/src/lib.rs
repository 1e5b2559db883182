#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative entity registry and frame loop for Siege.
//!
//! The [`World`] exclusively owns every resident entity. Each call to
//! [`World::step`] runs one frame: buffered removals are applied, buffered
//! admissions are applied, and then every resident entity is ticked in bucket
//! order. Hooks reach the registry through a [`Context`] whose queries observe
//! the frame-start snapshot and whose mutations are buffered, so the resident
//! set cannot change while a pass iterates over it.

pub mod entity;
mod layers;
pub mod query;
mod registry;

use std::rc::Rc;

use siege_core::{EntityId, FrameRate, Layer, LifecycleError, SimulationError, TypeTag};

pub use entity::{downcast, AsCore, Entity, EntityCore, EntityRef};
pub use layers::{Drawable, Surface};
pub use query::{EntityQuery, Query};
pub use registry::{Context, FrameClock};

use layers::DrawLayers;
use registry::{Pending, Roster};

/// Summary of a single simulated frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Index of the frame that was simulated.
    pub frame: u64,
    /// Entities admitted at the frame's flush point.
    pub admitted: usize,
    /// Entities removed at the frame's flush point.
    pub removed: usize,
    /// Entities ticked during the pass.
    pub ticked: usize,
}

/// Owns the live entity set, the pending mutation buffers and the draw layers.
#[derive(Debug)]
pub struct World {
    roster: Roster,
    pending: Pending,
    layers: DrawLayers,
    clock: FrameClock,
}

impl World {
    /// Creates an empty world advancing at `rate`.
    #[must_use]
    pub fn new(rate: FrameRate) -> Self {
        Self {
            roster: Roster::default(),
            pending: Pending::default(),
            layers: DrawLayers::default(),
            clock: FrameClock::new(rate),
        }
    }

    /// Admits `entity` immediately, running its `init` hook.
    ///
    /// Outside a tick pass the world is always at a flush point, so any other
    /// buffered requests are applied as well.
    pub fn add(&mut self, entity: EntityRef) -> Result<(), SimulationError> {
        self.pending.queue_addition(entity)?;
        let _ = self.flush()?;
        Ok(())
    }

    /// Removes `entity` immediately, running its `clean` hook.
    ///
    /// Entities that are not resident are ignored.
    pub fn remove(&mut self, entity: &dyn Entity) -> Result<(), SimulationError> {
        self.pending.queue_removal(entity);
        let _ = self.flush()?;
        Ok(())
    }

    /// Resident entities registered under `tag`.
    #[must_use]
    pub fn get(&self, tag: TypeTag) -> EntityQuery<'_> {
        Query::new(self.roster.bucket(tag).iter().cloned())
    }

    /// Resident entities registered under a raw numeric tag; unknown tags are empty.
    #[must_use]
    pub fn get_raw(&self, raw: u8) -> EntityQuery<'_> {
        Query::new(self.roster.bucket_raw(raw).iter().cloned())
    }

    /// Resolves an identifier to its resident entity.
    #[must_use]
    pub fn lookup(&self, id: EntityId) -> Option<EntityRef> {
        self.roster.lookup(id).cloned()
    }

    /// Number of resident entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roster.len()
    }

    /// Reports whether no entity is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roster.len() == 0
    }

    /// Frame cadence and index of the next frame to simulate.
    #[must_use]
    pub fn clock(&self) -> FrameClock {
        self.clock
    }

    /// Number of drawables registered on `layer`.
    #[must_use]
    pub fn drawable_count(&self, layer: Layer) -> usize {
        self.layers.len(layer)
    }

    /// Presents every registered drawable in ascending layer order.
    pub fn draw(&self, surface: &mut dyn Surface) {
        self.layers.draw(surface);
    }

    /// Simulates one frame.
    ///
    /// A failing hook aborts the frame and its error is returned unchanged.
    pub fn step(&mut self) -> Result<FrameReport, SimulationError> {
        let (removed, admitted) = self.flush()?;
        let ticked = self.tick_resident()?;
        let report = FrameReport {
            frame: self.clock.frame(),
            admitted,
            removed,
            ticked,
        };
        log::trace!(
            "frame {} admitted {} removed {} ticked {}",
            report.frame,
            admitted,
            removed,
            ticked
        );
        self.clock.advance();
        Ok(report)
    }

    /// Applies buffered removals and then buffered admissions until both
    /// buffers are empty, returning `(removed, admitted)` counts.
    ///
    /// Requests made by `clean` and `init` hooks land in the same buffers and
    /// are applied within this flush, removals first. When a hook fails, the
    /// requests not yet applied stay queued for the next flush point.
    fn flush(&mut self) -> Result<(usize, usize), SimulationError> {
        let mut removed = 0;
        let mut admitted = 0;

        loop {
            if let Some(id) = self.pending.next_removal() {
                let Some(entity) = self.roster.detach(id) else {
                    log::trace!("removal of {id:?} ignored, entity not resident");
                    continue;
                };
                log::debug!("removing {:?} entity {id:?}", entity.core().tag());
                let mut ctx = Context {
                    roster: &self.roster,
                    pending: &mut self.pending,
                    layers: &mut self.layers,
                    clock: self.clock,
                };
                let cleaned = entity.clean(&mut ctx);
                entity.core().release();
                cleaned?;
                removed += 1;
                continue;
            }

            let Some(entity) = self.pending.next_addition() else {
                break;
            };
            let id = self.roster.attach(Rc::clone(&entity));
            entity.core().admit(id);
            log::debug!("admitted {:?} entity {id:?}", entity.core().tag());
            let mut ctx = Context {
                roster: &self.roster,
                pending: &mut self.pending,
                layers: &mut self.layers,
                clock: self.clock,
            };
            entity.init(&mut ctx)?;
            admitted += 1;
        }

        Ok((removed, admitted))
    }

    fn tick_resident(&mut self) -> Result<usize, SimulationError> {
        let Self {
            roster,
            pending,
            layers,
            clock,
        } = self;
        let mut ticked = 0;

        for tag in TypeTag::ALL {
            for entity in roster.bucket(tag) {
                if !entity.core().in_simulation() {
                    return Err(LifecycleError::TickOutsideSimulation { tag }.into());
                }
                let mut ctx = Context {
                    roster: &*roster,
                    pending: &mut *pending,
                    layers: &mut *layers,
                    clock: *clock,
                };
                entity.tick(&mut ctx)?;
                ticked += 1;
            }
        }

        Ok(ticked)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(FrameRate::default())
    }
}
