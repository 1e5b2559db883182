#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Siege adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use siege_core::{Color, Paint};
use siege_world::Surface;
use std::{error::Error, fmt, time::Duration};

/// Maps between screen pixels and simulation units.
///
/// The map is scaled uniformly to fit the screen and centred, leaving equal
/// margins on the axis with spare room.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    screen: Vec2,
    map: Vec2,
    scale: f32,
    offset: Vec2,
}

impl Viewport {
    /// Creates a viewport showing a `columns` by `rows` map on a screen of the
    /// given pixel dimensions.
    ///
    /// Returns an error when either area is empty.
    pub fn new(
        screen_width: f32,
        screen_height: f32,
        columns: u32,
        rows: u32,
    ) -> Result<Self, RenderingError> {
        if columns == 0 || rows == 0 {
            return Err(RenderingError::EmptyMap { columns, rows });
        }
        if screen_width <= 0.0 || screen_height <= 0.0 {
            return Err(RenderingError::EmptyScreen {
                width: screen_width,
                height: screen_height,
            });
        }

        let screen = Vec2::new(screen_width, screen_height);
        let map = Vec2::new(columns as f32, rows as f32);
        let scale = (screen / map).min_element();
        let offset = (screen - map * scale) * 0.5;
        Ok(Self {
            screen,
            map,
            scale,
            offset,
        })
    }

    /// Pixels per simulation unit.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Screen position of the map origin.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Screen dimensions in pixels.
    #[must_use]
    pub fn screen(&self) -> Vec2 {
        self.screen
    }

    /// Converts a screen position into simulation units.
    #[must_use]
    pub fn screen_to_sim(&self, point: Vec2) -> Vec2 {
        (point - self.offset) / self.scale
    }

    /// Converts a simulation position into screen pixels.
    #[must_use]
    pub fn sim_to_screen(&self, point: Vec2) -> Vec2 {
        point * self.scale + self.offset
    }

    /// Clamps a simulation position to the map bounds.
    #[must_use]
    pub fn clamp_to_map(&self, point: Vec2) -> Vec2 {
        point.clamp(Vec2::ZERO, self.map)
    }
}

/// Single draw call captured by a [`RecordingSurface`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DrawCall {
    /// Circle centred at a point.
    Circle {
        /// Centre in simulation units.
        center: Vec2,
        /// Radius in simulation units.
        radius: f32,
        /// Paint applied to the shape.
        paint: Paint,
    },
    /// Axis-aligned rectangle centred at a point.
    Rect {
        /// Centre in simulation units.
        center: Vec2,
        /// Width and height in simulation units.
        size: Vec2,
        /// Paint applied to the shape.
        paint: Paint,
    },
    /// Straight segment.
    Line {
        /// Start point in simulation units.
        from: Vec2,
        /// End point in simulation units.
        to: Vec2,
        /// Paint applied to the segment.
        paint: Paint,
    },
}

impl DrawCall {
    /// Color the call paints with.
    #[must_use]
    pub fn color(&self) -> Color {
        match self {
            Self::Circle { paint, .. } | Self::Rect { paint, .. } | Self::Line { paint, .. } => {
                paint.color
            }
        }
    }
}

/// Surface that records every draw call in the order it was issued.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSurface {
    calls: Vec<DrawCall>,
}

impl RecordingSurface {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> &[DrawCall] {
        &self.calls
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Reports whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Drains the recorded calls, leaving the surface empty.
    pub fn take(&mut self) -> Vec<DrawCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Surface for RecordingSurface {
    fn draw_circle(&mut self, center: Vec2, radius: f32, paint: &Paint) {
        self.calls.push(DrawCall::Circle {
            center,
            radius,
            paint: *paint,
        });
    }

    fn draw_rect(&mut self, center: Vec2, size: Vec2, paint: &Paint) {
        self.calls.push(DrawCall::Rect {
            center,
            size,
            paint: *paint,
        });
    }

    fn draw_line(&mut self, from: Vec2, to: Vec2, paint: &Paint) {
        self.calls.push(DrawCall::Line {
            from,
            to,
            paint: *paint,
        });
    }
}

/// Describes how a backend should present the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title displayed by the host window, if any.
    pub window_title: String,
    /// Color used to clear the frame before drawing.
    pub clear_color: Color,
    /// Mapping between the host surface and the map.
    pub viewport: Viewport,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, viewport: Viewport) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            viewport,
        }
    }
}

/// Rendering backend capable of presenting Siege frames.
pub trait RenderingBackend {
    /// Runs the backend until `update_frame` returns `false` or fails.
    ///
    /// `update_frame` receives the simulated frame delta and the surface the
    /// current frame should be drawn onto.
    fn run<F>(self, presentation: Presentation, update_frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut dyn Surface) -> AnyResult<bool>;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// The map has no area.
    EmptyMap {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The screen has no area.
    EmptyScreen {
        /// Requested width in pixels.
        width: f32,
        /// Requested height in pixels.
        height: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyMap { columns, rows } => {
                write!(f, "map must have a positive area (received {columns}x{rows})")
            }
            Self::EmptyScreen { width, height } => {
                write!(
                    f,
                    "screen must have a positive area (received {width}x{height})"
                )
            }
        }
    }
}

impl Error for RenderingError {}
