#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Siege engine.
//!
//! This crate defines the vocabulary that connects the entity registry, the
//! gameplay systems, and the adapters. Entities are classified by a closed
//! [`TypeTag`], their visuals are composed into ordered [`Layer`]s, and every
//! lifecycle or query failure is expressed through the error taxonomy rooted
//! at [`SimulationError`].

use std::time::Duration;

pub use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of simulation frames advanced per simulated second by default.
pub const TARGET_FRAME_RATE: u32 = 30;

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Closed classification used to index entities for scoped queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeTag {
    /// Map tiles and buildable plateaus.
    Tile,
    /// Hostile units walking the map.
    Enemy,
    /// Player-placed towers.
    Tower,
    /// Projectiles in flight.
    Shot,
    /// Timed effects.
    Effect,
}

impl TypeTag {
    /// Number of members in the enumeration.
    pub const COUNT: usize = 5;

    /// Every tag, in the stable order used for bucket iteration.
    pub const ALL: [TypeTag; Self::COUNT] = [
        Self::Tile,
        Self::Enemy,
        Self::Tower,
        Self::Shot,
        Self::Effect,
    ];

    /// Dense zero-based index of the tag, suitable for array storage.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Tile => 0,
            Self::Enemy => 1,
            Self::Tower => 2,
            Self::Shot => 3,
            Self::Effect => 4,
        }
    }

    /// Stable numeric identifier exchanged with collaborators.
    ///
    /// Raw identifiers start at one so that zero never names a valid tag.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.index() as u8 + 1
    }

    /// Resolves a raw numeric identifier, returning `None` for unknown values.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(Self::Tile),
            2 => Some(Self::Enemy),
            3 => Some(Self::Tower),
            4 => Some(Self::Shot),
            5 => Some(Self::Effect),
            _ => None,
        }
    }
}

/// Ordered render layers; drawables are presented in ascending layer order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    /// Ground tiles and plateaus.
    Tile,
    /// Enemy bodies.
    Enemy,
    /// Tower bodies.
    Tower,
    /// Projectiles and effect overlays.
    Shot,
    /// Interface overlays such as selection rings.
    Ui,
}

impl Layer {
    /// Number of members in the enumeration.
    pub const COUNT: usize = 5;

    /// Every layer in presentation order.
    pub const ALL: [Layer; Self::COUNT] = [
        Self::Tile,
        Self::Enemy,
        Self::Tower,
        Self::Shot,
        Self::Ui,
    ];

    /// Dense zero-based index of the layer.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Tile => 0,
            Self::Enemy => 1,
            Self::Tower => 2,
            Self::Shot => 3,
            Self::Ui => 4,
        }
    }
}

/// Identifier allocated by the registry each time an entity is admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Fixed simulation cadence expressed in frames per simulated second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate(u32);

impl FrameRate {
    /// Creates a frame rate, clamping zero to one frame per second.
    #[must_use]
    pub const fn new(frames_per_second: u32) -> Self {
        if frames_per_second == 0 {
            Self(1)
        } else {
            Self(frames_per_second)
        }
    }

    /// Frames advanced per simulated second.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Simulated seconds covered by a single frame.
    #[must_use]
    pub fn seconds_per_frame(&self) -> f32 {
        1.0 / self.0 as f32
    }

    /// Simulated time covered by `frames` whole frames.
    #[must_use]
    pub fn duration_of(&self, frames: u32) -> Duration {
        let nanos = u128::from(frames) * NANOS_PER_SECOND / u128::from(self.0);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Number of whole frames needed for elapsed time to reach `duration`.
    ///
    /// The count is rounded up and never drops below one, so that any bounded
    /// activity lasts at least a single frame.
    #[must_use]
    pub fn frames_in(&self, duration: Duration) -> u32 {
        let scaled = duration.as_nanos() * u128::from(self.0);
        let frames = scaled.div_ceil(NANOS_PER_SECOND);
        u32::try_from(frames).unwrap_or(u32::MAX).max(1)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::new(TARGET_FRAME_RATE)
    }
}

/// RGBA color handed to render surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

    /// Returns the same color with the alpha channel replaced by a byte value.
    #[must_use]
    pub fn with_alpha_u8(self, alpha: u8) -> Self {
        Self {
            alpha: alpha as f32 / 255.0,
            ..self
        }
    }
}

/// How a shape is rasterized by a render surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintStyle {
    /// Shape interior is filled.
    Fill,
    /// Only the outline is drawn using the provided stroke width.
    Stroke {
        /// Outline width in simulation units.
        width: f32,
    },
}

/// Color and style pair used for a single draw call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    /// Color applied to the shape.
    pub color: Color,
    /// Rasterization style.
    pub style: PaintStyle,
}

impl Paint {
    /// Paint that fills shapes with `color`.
    #[must_use]
    pub const fn fill(color: Color) -> Self {
        Self {
            color,
            style: PaintStyle::Fill,
        }
    }

    /// Paint that outlines shapes with `color` at the given stroke width.
    #[must_use]
    pub const fn stroke(color: Color, width: f32) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke { width },
        }
    }
}

/// Registry admission failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The entity is already resident or already queued for admission.
    #[error("{tag:?} entity is already registered")]
    DuplicateRegistration {
        /// Tag of the offending entity.
        tag: TypeTag,
    },
}

/// Pull-based query failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The sequence was pulled past its final element.
    #[error("query sequence has no further elements")]
    Exhausted,
}

/// Violations of the entity lifecycle contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LifecycleError {
    /// An entity that is not resident in the registry was ticked.
    #[error("{tag:?} entity ticked while not in simulation")]
    TickOutsideSimulation {
        /// Tag of the offending entity.
        tag: TypeTag,
    },
    /// An effect received a tick while not in the active state.
    #[error("effect ticked while not active")]
    EffectNotActive,
    /// An effect that already began was admitted again.
    #[error("effect admitted after it already began")]
    EffectReadmitted,
}

/// Fatal conditions surfaced by the simulation loop and lifecycle hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// See [`RegistryError`].
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// See [`QueryError`].
    #[error(transparent)]
    Query(#[from] QueryError),
    /// See [`LifecycleError`].
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
