//! Type-indexed entity storage, pending mutation buffers, and the context
//! handed to lifecycle hooks.

use std::{
    collections::{BTreeMap, VecDeque},
    ptr,
    rc::Rc,
    time::Duration,
};

use siege_core::{EntityId, FrameRate, RegistryError, TypeTag};

use crate::{
    entity::{Entity, EntityRef},
    layers::{DrawLayers, Drawable},
    query::{EntityQuery, Query},
};

/// Resident entities indexed by type tag and by identifier.
#[derive(Debug, Default)]
pub(crate) struct Roster {
    buckets: [Vec<EntityRef>; TypeTag::COUNT],
    index: BTreeMap<EntityId, EntityRef>,
    next_id: u32,
}

impl Roster {
    pub(crate) fn bucket(&self, tag: TypeTag) -> &[EntityRef] {
        &self.buckets[tag.index()]
    }

    pub(crate) fn bucket_raw(&self, raw: u8) -> &[EntityRef] {
        match TypeTag::from_raw(raw) {
            Some(tag) => self.bucket(tag),
            None => &[],
        }
    }

    pub(crate) fn lookup(&self, id: EntityId) -> Option<&EntityRef> {
        self.index.get(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    pub(crate) fn attach(&mut self, entity: EntityRef) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.buckets[entity.core().tag().index()].push(Rc::clone(&entity));
        let _ = self.index.insert(id, entity);
        id
    }

    pub(crate) fn detach(&mut self, id: EntityId) -> Option<EntityRef> {
        let entity = self.index.remove(&id)?;
        self.buckets[entity.core().tag().index()].retain(|entry| entry.core().id() != Some(id));
        Some(entity)
    }
}

/// Admission and removal requests waiting for the next flush point.
///
/// Requests stay queued until the flush applies them one by one, so hooks
/// running inside a flush still see every admission that has not happened yet.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    additions: VecDeque<EntityRef>,
    removals: VecDeque<EntityId>,
}

impl Pending {
    pub(crate) fn queue_addition(&mut self, entity: EntityRef) -> Result<(), RegistryError> {
        let core = entity.core();
        let queued = self
            .additions
            .iter()
            .any(|entry| ptr::eq(entry.core(), core));
        if core.in_simulation() || queued {
            return Err(RegistryError::DuplicateRegistration { tag: core.tag() });
        }
        self.additions.push_back(entity);
        Ok(())
    }

    pub(crate) fn queue_removal(&mut self, entity: &dyn Entity) {
        let core = entity.core();
        match core.id() {
            Some(id) => {
                if !self.removals.contains(&id) {
                    self.removals.push_back(id);
                }
            }
            None => self.additions.retain(|entry| !ptr::eq(entry.core(), core)),
        }
    }

    /// Oldest removal request.
    pub(crate) fn next_removal(&mut self) -> Option<EntityId> {
        self.removals.pop_front()
    }

    /// Oldest admission request.
    pub(crate) fn next_addition(&mut self) -> Option<EntityRef> {
        self.additions.pop_front()
    }
}

/// Position of the simulation on its fixed frame cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameClock {
    rate: FrameRate,
    frame: u64,
}

impl FrameClock {
    pub(crate) fn new(rate: FrameRate) -> Self {
        Self { rate, frame: 0 }
    }

    pub(crate) fn advance(&mut self) {
        self.frame = self.frame.saturating_add(1);
    }

    /// Cadence of the simulation.
    #[must_use]
    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Zero-based index of the current frame.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Simulated seconds covered by one frame.
    #[must_use]
    pub fn frame_seconds(&self) -> f32 {
        self.rate.seconds_per_frame()
    }

    /// Simulated time elapsed before the current frame started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        let frames = u32::try_from(self.frame).unwrap_or(u32::MAX);
        self.rate.duration_of(frames)
    }
}

/// Registry access granted to lifecycle hooks.
///
/// Queries observe the resident set as of the start of the current pass;
/// admissions and removals are buffered until the next flush point.
pub struct Context<'a> {
    pub(crate) roster: &'a Roster,
    pub(crate) pending: &'a mut Pending,
    pub(crate) layers: &'a mut DrawLayers,
    pub(crate) clock: FrameClock,
}

impl<'a> Context<'a> {
    /// Resident entities registered under `tag`.
    #[must_use]
    pub fn get(&self, tag: TypeTag) -> EntityQuery<'a> {
        Query::new(self.roster.bucket(tag).iter().cloned())
    }

    /// Resident entities registered under a raw numeric tag; unknown tags are empty.
    #[must_use]
    pub fn get_raw(&self, raw: u8) -> EntityQuery<'a> {
        Query::new(self.roster.bucket_raw(raw).iter().cloned())
    }

    /// Resolves an identifier to its resident entity.
    #[must_use]
    pub fn lookup(&self, id: EntityId) -> Option<EntityRef> {
        self.roster.lookup(id).cloned()
    }

    /// Requests admission of `entity` at the next flush point.
    pub fn add(&mut self, entity: EntityRef) -> Result<(), RegistryError> {
        self.pending.queue_addition(entity)
    }

    /// Requests removal of `entity` at the next flush point.
    ///
    /// Removing an entity that is not resident is a no-op; removing one that is
    /// still queued for admission cancels that admission.
    pub fn remove(&mut self, entity: &dyn Entity) {
        self.pending.queue_removal(entity);
    }

    /// Registers a drawable for presentation.
    pub fn add_drawable(&mut self, drawable: Rc<dyn Drawable>) {
        self.layers.add(drawable);
    }

    /// Unregisters a previously registered drawable.
    pub fn remove_drawable<D: Drawable + ?Sized>(&mut self, drawable: &Rc<D>) {
        self.layers.remove(drawable);
    }

    /// Frame cadence and index of the pass in progress.
    #[must_use]
    pub fn clock(&self) -> FrameClock {
        self.clock
    }
}
