#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bounded-duration effects layered on the generic entity lifecycle.
//!
//! An [`Effect`] wraps an [`EffectAction`] and drives it through a fixed
//! protocol: `begin` fires once when the effect is admitted, `progress` is
//! reported on every tick while the effect is active, and `end` fires once on
//! the first tick where the elapsed frame count reaches the duration. The
//! effect then requests its own removal.
//!
//! Gameplay side effects belong in `begin` and `end`, the only hooks that
//! receive a [`Context`]. `progress` is for presentation state.

mod heal;

use std::{cell::Cell, fmt, time::Duration};

use siege_core::{EntityId, LifecycleError, SimulationError, TypeTag, Vec2};
use siege_world::{Context, Entity, EntityCore};

pub use heal::{Heal, HealEffect, HEAL_DURATION};

/// Where an effect happens and which entity caused it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectSite {
    /// Target position of the effect.
    pub position: Vec2,
    /// Entity that triggered the effect, if any.
    pub origin: Option<EntityId>,
}

/// Phase of an effect's lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectState {
    /// Constructed, not yet admitted.
    Pending,
    /// Admitted; `begin` has fired and ticks are accepted.
    Active,
    /// Duration elapsed; `end` has fired and removal was requested.
    Finished,
}

/// Payload driven by an [`Effect`].
pub trait EffectAction: fmt::Debug {
    /// Total time from `begin` to `end`.
    fn duration(&self) -> Duration;

    /// Registers presentation state while the effect is admitted.
    fn attach(&self, _ctx: &mut Context<'_>, _site: &EffectSite) {}

    /// Unregisters whatever [`EffectAction::attach`] registered.
    fn detach(&self, _ctx: &mut Context<'_>) {}

    /// One-shot gameplay action run on admission.
    fn begin(&self, _ctx: &mut Context<'_>, _site: &EffectSite) -> Result<(), SimulationError> {
        Ok(())
    }

    /// One-shot gameplay action run once the duration has elapsed.
    fn end(&self, _ctx: &mut Context<'_>, _site: &EffectSite) -> Result<(), SimulationError> {
        Ok(())
    }

    /// Reports how far the effect has run, from just above 0.0 up to 1.0.
    fn progress(&self, _fraction: f32) {}
}

/// Entity running an [`EffectAction`] for a bounded number of frames.
#[derive(Debug)]
pub struct Effect<A> {
    core: EntityCore,
    site: EffectSite,
    action: A,
    state: Cell<EffectState>,
    total_frames: Cell<u32>,
    elapsed_frames: Cell<u32>,
}

impl<A: EffectAction> Effect<A> {
    /// Creates a pending effect that will run `action` at `site`.
    #[must_use]
    pub fn from_action(site: EffectSite, action: A) -> Self {
        Self {
            core: EntityCore::new(TypeTag::Effect, site.position),
            site,
            action,
            state: Cell::new(EffectState::Pending),
            total_frames: Cell::new(0),
            elapsed_frames: Cell::new(0),
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn state(&self) -> EffectState {
        self.state.get()
    }

    /// Position and origin of the effect.
    #[must_use]
    pub fn site(&self) -> &EffectSite {
        &self.site
    }

    /// The wrapped action.
    #[must_use]
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Frames ticked since admission.
    #[must_use]
    pub fn elapsed_frames(&self) -> u32 {
        self.elapsed_frames.get()
    }

    /// Frames the effect lasts, fixed at admission; zero while pending.
    #[must_use]
    pub fn total_frames(&self) -> u32 {
        self.total_frames.get()
    }
}

impl<A: EffectAction + 'static> Entity for Effect<A> {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn init(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        if self.state.get() != EffectState::Pending {
            return Err(LifecycleError::EffectReadmitted.into());
        }
        let total = ctx.clock().rate().frames_in(self.action.duration());
        self.total_frames.set(total);
        self.elapsed_frames.set(0);
        self.action.attach(ctx, &self.site);
        self.state.set(EffectState::Active);
        log::debug!(
            "effect {:?} began at {:?} for {total} frames",
            self.core.id(),
            self.site.position
        );
        self.action.begin(ctx, &self.site)
    }

    fn tick(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        if self.state.get() != EffectState::Active {
            return Err(LifecycleError::EffectNotActive.into());
        }
        let total = self.total_frames.get();
        let elapsed = self.elapsed_frames.get().saturating_add(1).min(total);
        self.elapsed_frames.set(elapsed);
        self.action.progress(elapsed as f32 / total as f32);

        if elapsed >= total {
            self.state.set(EffectState::Finished);
            log::debug!("effect {:?} ended after {elapsed} frames", self.core.id());
            self.action.end(ctx, &self.site)?;
            ctx.remove(self);
        }
        Ok(())
    }

    fn clean(&self, ctx: &mut Context<'_>) -> Result<(), SimulationError> {
        self.action.detach(ctx);
        Ok(())
    }
}
