//! Input handling and redraw policy.
//!
//! The [`Controller`] owns the view state (viewport, mode, seed, theme) and
//! the [`RenderScheduler`]. It turns window events into view changes and
//! decides when a render pass is requested: resizes and theme changes
//! redraw at once, everything continuous goes through a trailing debounce.

use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use chunkbrot_core::{Complex, FractalMode, FractalParams, SeedPicker, Viewport};
use chunkbrot_render::{
    export_png, ChunkExecutor, ColorGradient, DisplaySurface, ExportMetadata, RenderError,
    RenderScheduler, RenderSnapshot,
};

use crate::config::RenderConfig;
use crate::debounce::Debouncer;
use crate::error::ConfigError;

/// Window events in surface pixel coordinates (origin top-left, y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    /// Negative `delta` zooms in, positive zooms out.
    Wheel { x: f64, y: f64, delta: f64 },
    Resize { width: u32, height: u32 },
    ToggleMode,
    CycleTheme,
    Home,
    ResetSeed,
    /// Seed picker events, in picker-local coordinates.
    SeedPress { x: f64, y: f64 },
    SeedDrag { x: f64, y: f64 },
    SeedRelease,
    SeedPickerResize { width: f64, height: f64 },
}

pub struct Controller<E: ChunkExecutor> {
    viewport: Viewport,
    mode: FractalMode,
    params: FractalParams,
    themes: Vec<ColorGradient>,
    theme: usize,
    seed_picker: SeedPicker,
    scheduler: RenderScheduler<E>,
    debounce: Debouncer,
    /// The pending debounced redraw must discard every rendered chunk.
    pending_clear: bool,
    /// Pointer position already applied to the view while dragging.
    drag_anchor: Option<(f64, f64)>,
    half_extent: f64,
    zoom_in_factor: f64,
    zoom_out_factor: f64,
}

impl<E: ChunkExecutor> Controller<E> {
    /// Build the home view at `width × height` and request the first frame.
    pub fn new(
        config: &RenderConfig,
        executor: E,
        max_in_flight: usize,
        width: u32,
        height: u32,
        seed_picker_size: (f64, f64),
    ) -> Result<Self, ConfigError> {
        let themes = config.themes()?;
        if config.theme >= themes.len() {
            return Err(ConfigError::Invalid {
                field: "theme",
                reason: format!("index {} out of range ({} themes)", config.theme, themes.len()),
            });
        }
        let params = config.fractal_params()?;
        let viewport = Viewport::home(width, height, config.initial_half_extent)?;
        let seed_picker = SeedPicker::new(seed_picker_size.0, seed_picker_size.1);
        let snapshot = RenderSnapshot {
            viewport,
            mode: FractalMode::default(),
            seed: seed_picker.grid_position(),
            params,
            gradient: themes[config.theme].clone(),
        };
        let scheduler = RenderScheduler::new(executor, config.chunk_size, max_in_flight, snapshot)?;

        let mut controller = Self {
            viewport,
            mode: FractalMode::default(),
            params,
            themes,
            theme: config.theme,
            seed_picker,
            scheduler,
            debounce: Debouncer::new(config.debounce()),
            pending_clear: false,
            drag_anchor: None,
            half_extent: config.initial_half_extent,
            zoom_in_factor: config.zoom_in_factor,
            zoom_out_factor: config.zoom_out_factor,
        };
        controller.redraw_now();
        Ok(controller)
    }

    // -- Accessors ----------------------------------------------------------

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn mode(&self) -> FractalMode {
        self.mode
    }

    pub fn seed(&self) -> Complex {
        self.seed_picker.grid_position()
    }

    pub fn seed_picker(&self) -> &SeedPicker {
        &self.seed_picker
    }

    pub fn theme(&self) -> &ColorGradient {
        &self.themes[self.theme]
    }

    pub fn scheduler(&self) -> &RenderScheduler<E> {
        &self.scheduler
    }

    pub fn surface(&self) -> &DisplaySurface {
        self.scheduler.surface()
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_anchor.is_some()
    }

    /// Time until the pending debounced redraw, if one is scheduled.
    pub fn redraw_due_in(&self, now: Instant) -> Option<Duration> {
        self.debounce.remaining(now)
    }

    /// The picture as the view state currently describes it.
    pub fn snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            viewport: self.viewport,
            mode: self.mode,
            seed: self.seed(),
            params: self.params,
            gradient: self.themes[self.theme].clone(),
        }
    }

    // -- Events ---------------------------------------------------------------

    pub fn handle(&mut self, event: InputEvent, now: Instant) -> Result<(), RenderError> {
        match event {
            InputEvent::PointerDown { x, y } => {
                self.drag_anchor = Some((x, y));
            }
            InputEvent::PointerMove { x, y } => self.drag_to(x, y, now),
            InputEvent::PointerUp => {
                if self.drag_anchor.take().is_some() {
                    self.schedule_redraw(now, false);
                }
            }
            InputEvent::Wheel { x, y, delta } => self.zoom(x, y, delta, now),
            InputEvent::Resize { width, height } => self.resize(width, height)?,
            InputEvent::ToggleMode => {
                self.mode = self.mode.toggled();
                info!(mode = self.mode.label(), "Switched fractal mode");
                self.schedule_redraw(now, true);
            }
            InputEvent::CycleTheme => {
                self.theme = (self.theme + 1) % self.themes.len();
                info!(theme = self.themes[self.theme].name(), "Switched theme");
                self.scheduler.invalidate();
                self.redraw_now();
            }
            InputEvent::Home => {
                self.viewport =
                    Viewport::home(self.viewport.width, self.viewport.height, self.half_extent)?;
                debug!("Returned to home view");
                self.schedule_redraw(now, true);
            }
            InputEvent::ResetSeed => {
                self.seed_picker.reset();
                self.schedule_redraw(now, true);
            }
            InputEvent::SeedPress { x, y } => {
                self.seed_picker.press(x, y);
            }
            InputEvent::SeedDrag { x, y } => {
                if self.seed_picker.drag_to(x, y).is_some() {
                    self.schedule_redraw(now, true);
                }
            }
            InputEvent::SeedRelease => self.seed_picker.release(),
            InputEvent::SeedPickerResize { width, height } => {
                let before = self.seed();
                self.seed_picker.resize(width, height);
                if self.seed() != before {
                    self.schedule_redraw(now, true);
                }
            }
        }
        Ok(())
    }

    /// Collect finished chunks and fire the debounced redraw when due.
    /// Returns `true` if the surface may have changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.scheduler.poll() > 0;
        if self.debounce.fire(now) {
            if std::mem::take(&mut self.pending_clear) {
                self.scheduler.invalidate();
            }
            self.redraw_now();
            changed = true;
        }
        changed
    }

    /// Write the current surface to `path` as a PNG.
    pub fn export(&self, path: &Path) -> Result<(), RenderError> {
        let metadata = ExportMetadata::from(self.scheduler.snapshot());
        export_png(self.scheduler.surface(), path, &metadata)?;
        info!("Exported {}", path.display());
        Ok(())
    }

    // -- Internals -------------------------------------------------------------

    fn drag_to(&mut self, x: f64, y: f64, now: Instant) {
        let Some((ax, ay)) = self.drag_anchor else {
            return;
        };
        let dx = (x - ax).round() as i32;
        let dy = (y - ay).round() as i32;
        if dx == 0 && dy == 0 {
            return;
        }
        self.viewport.pan(f64::from(dx), f64::from(dy));
        self.scheduler.pan(dx, dy);
        // Keep the sub-pixel remainder for the next move.
        self.drag_anchor = Some((ax + f64::from(dx), ay + f64::from(dy)));
        self.schedule_redraw(now, false);
    }

    fn zoom(&mut self, x: f64, y: f64, delta: f64, now: Instant) {
        let factor = if delta < 0.0 {
            self.zoom_in_factor
        } else if delta > 0.0 {
            self.zoom_out_factor
        } else {
            return;
        };
        self.viewport.zoom_at(x, y, factor);
        self.scheduler.prescale(x, y, factor);
        self.schedule_redraw(now, true);
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0
            || height == 0
            || (width, height) == (self.viewport.width, self.viewport.height)
        {
            return Ok(());
        }
        self.viewport.resize(width, height)?;
        let queued = self.scheduler.resize(self.snapshot())?;
        debug!(width, height, queued, "Surface resized");
        Ok(())
    }

    fn schedule_redraw(&mut self, now: Instant, clear: bool) {
        self.pending_clear |= clear;
        self.debounce.schedule(now);
    }

    fn redraw_now(&mut self) {
        let snapshot = self.snapshot();
        self.scheduler.request_full_redraw(snapshot);
    }
}
