//! Rendering backend that records frames instead of presenting them.

use std::time::Duration;

use anyhow::Result as AnyResult;
use siege_core::FrameRate;
use siege_rendering::{Presentation, RecordingSurface, RenderingBackend};
use siege_world::Surface;

/// Drives a fixed number of frames against a [`RecordingSurface`].
#[derive(Debug)]
pub(crate) struct HeadlessBackend {
    frames: u64,
    rate: FrameRate,
    surface: RecordingSurface,
}

impl HeadlessBackend {
    pub(crate) fn new(frames: u64, rate: FrameRate) -> Self {
        Self {
            frames,
            rate,
            surface: RecordingSurface::new(),
        }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(mut self, presentation: Presentation, mut update_frame: F) -> AnyResult<()>
    where
        F: FnMut(Duration, &mut dyn Surface) -> AnyResult<bool>,
    {
        log::info!(
            "presenting \"{}\" headless at {:.1} px per unit",
            presentation.window_title,
            presentation.viewport.scale()
        );
        let delta = self.rate.duration_of(1);

        for frame in 0..self.frames {
            let _ = self.surface.take();
            let keep_running = update_frame(delta, &mut self.surface)?;
            log::trace!("frame {frame} issued {} draw calls", self.surface.len());
            if !keep_running {
                log::debug!("scenario finished after {} frames", frame + 1);
                break;
            }
        }

        log::debug!("last frame issued {} draw calls", self.surface.len());
        Ok(())
    }
}
