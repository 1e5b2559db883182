//! Layered composition of drawables consumed by the external render pass.

use std::{fmt, rc::Rc};

use siege_core::{Layer, Paint, Vec2};

/// Opaque drawing context supplied by a rendering adapter.
///
/// Coordinates are expressed in simulation units; adapters own any mapping to
/// device pixels.
pub trait Surface {
    /// Draws a circle centred at `center`.
    fn draw_circle(&mut self, center: Vec2, radius: f32, paint: &Paint);

    /// Draws an axis-aligned rectangle centred at `center`.
    fn draw_rect(&mut self, center: Vec2, size: Vec2, paint: &Paint);

    /// Draws a straight segment between two points.
    fn draw_line(&mut self, from: Vec2, to: Vec2, paint: &Paint);
}

/// Passive visual registered by an entity into one render layer.
///
/// Drawables only read the state their owner publishes during `tick`; the
/// render pass never mutates gameplay state through them.
pub trait Drawable: fmt::Debug {
    /// Layer the drawable belongs to.
    fn layer(&self) -> Layer;

    /// Issues draw calls describing the drawable's current state.
    fn draw(&self, surface: &mut dyn Surface);
}

/// Drawables grouped by layer in registration order.
#[derive(Debug, Default)]
pub(crate) struct DrawLayers {
    layers: [Vec<Rc<dyn Drawable>>; Layer::COUNT],
}

impl DrawLayers {
    pub(crate) fn add(&mut self, drawable: Rc<dyn Drawable>) {
        self.layers[drawable.layer().index()].push(drawable);
    }

    pub(crate) fn remove<D: Drawable + ?Sized>(&mut self, drawable: &Rc<D>) {
        let target = Rc::as_ptr(drawable).cast::<()>();
        self.layers[drawable.layer().index()]
            .retain(|entry| Rc::as_ptr(entry).cast::<()>() != target);
    }

    pub(crate) fn len(&self, layer: Layer) -> usize {
        self.layers[layer.index()].len()
    }

    /// Presents every drawable, lowest layer first.
    pub(crate) fn draw(&self, surface: &mut dyn Surface) {
        for drawable in self.layers.iter().flatten() {
            drawable.draw(surface);
        }
    }
}
