use std::time::{Instant, SystemTime, UNIX_EPOCH};

use eframe::egui;
use tracing::{error, info, warn};

use chunkbrot_render::WorkerPool;

use crate::app_dir;
use crate::config::RenderConfig;
use crate::controller::{Controller, InputEvent};

/// Seed picker side length bounds, in points. The widget follows a quarter
/// of the canvas height within these.
const SEED_PICKER_MIN: f32 = 120.0;
const SEED_PICKER_MAX: f32 = 240.0;
const HUD_MARGIN: f32 = 8.0;
const PROGRESS_BAR_HEIGHT: f32 = 3.0;

pub(crate) struct ChunkBrotApp {
    config: RenderConfig,
    ctx: egui::Context,
    /// Created on the first frame, once the canvas size is known.
    controller: Option<Controller<WorkerPool>>,
    startup_error: Option<String>,
    texture: Option<egui::TextureHandle>,
    texture_dirty: bool,
    show_seed_picker: bool,
    seed_picker_side: f32,
    status: Option<String>,
}

impl ChunkBrotApp {
    pub(crate) fn new(ctx: &egui::Context, config: RenderConfig) -> Self {
        Self {
            config,
            ctx: ctx.clone(),
            controller: None,
            startup_error: None,
            texture: None,
            texture_dirty: true,
            show_seed_picker: true,
            seed_picker_side: SEED_PICKER_MIN,
            status: None,
        }
    }

    fn ensure_controller(&mut self, width: u32, height: u32) {
        if self.controller.is_some() || self.startup_error.is_some() {
            return;
        }
        let workers = self.config.worker_count();
        let ctx = self.ctx.clone();
        let side = f64::from(self.seed_picker_side);
        let built = WorkerPool::new(workers)
            .map(|pool| pool.with_notifier(move || ctx.request_repaint()))
            .map_err(crate::error::ConfigError::from)
            .and_then(|pool| {
                Controller::new(&self.config, pool, workers, width, height, (side, side))
            });
        match built {
            Ok(controller) => {
                info!(workers, width, height, "Render pipeline ready");
                self.controller = Some(controller);
            }
            Err(e) => {
                error!("Failed to start render pipeline: {e}");
                self.startup_error = Some(e.to_string());
            }
        }
    }

    fn dispatch(&mut self, events: Vec<InputEvent>, now: Instant) {
        let Some(controller) = self.controller.as_mut() else {
            return;
        };
        for event in events {
            if let Err(e) = controller.handle(event, now) {
                warn!(?event, "Input rejected: {e}");
            }
            self.texture_dirty = true;
        }
    }

    fn canvas_events(&self, ctx: &egui::Context, response: &egui::Response) -> Vec<InputEvent> {
        let origin = response.rect.min;
        let local = |p: egui::Pos2| (f64::from(p.x - origin.x), f64::from(p.y - origin.y));
        let mut events = Vec::new();

        let size = (
            response.rect.width().max(1.0) as u32,
            response.rect.height().max(1.0) as u32,
        );
        if let Some(controller) = self.controller.as_ref() {
            let vp = controller.viewport();
            if size != (vp.width, vp.height) {
                events.push(InputEvent::Resize {
                    width: size.0,
                    height: size.1,
                });
            }
        }

        if response.drag_started_by(egui::PointerButton::Primary) {
            if let Some(p) = ctx.input(|i| i.pointer.press_origin()) {
                let (x, y) = local(p);
                events.push(InputEvent::PointerDown { x, y });
            }
        }
        if response.dragged_by(egui::PointerButton::Primary) {
            if let Some(p) = response.interact_pointer_pos() {
                let (x, y) = local(p);
                events.push(InputEvent::PointerMove { x, y });
            }
        }
        if response.drag_stopped_by(egui::PointerButton::Primary) {
            events.push(InputEvent::PointerUp);
        }

        let scroll_y = ctx.input(|i| i.raw_scroll_delta.y);
        if scroll_y.abs() > 0.0 && response.hovered() {
            if let Some(p) = response.hover_pos() {
                let (x, y) = local(p);
                // Wheel up scrolls positive in egui; that zooms in.
                events.push(InputEvent::Wheel {
                    x,
                    y,
                    delta: -f64::from(scroll_y),
                });
            }
        }
        events
    }

    fn keyboard_events(&mut self, ctx: &egui::Context) -> Vec<InputEvent> {
        let mut events = Vec::new();
        if ctx.memory(|m| m.focused().is_some()) {
            return events;
        }
        let mut export = false;
        ctx.input(|input| {
            if input.key_pressed(egui::Key::M) {
                events.push(InputEvent::ToggleMode);
            }
            if input.key_pressed(egui::Key::T) {
                events.push(InputEvent::CycleTheme);
            }
            if input.key_pressed(egui::Key::H) {
                events.push(InputEvent::Home);
            }
            if input.key_pressed(egui::Key::R) {
                events.push(InputEvent::ResetSeed);
            }
            if input.key_pressed(egui::Key::S) {
                self.show_seed_picker = !self.show_seed_picker;
            }
            export = input.key_pressed(egui::Key::E);
        });
        if export {
            self.export();
        }
        events
    }

    fn export(&mut self) {
        let Some(controller) = self.controller.as_ref() else {
            return;
        };
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = app_dir::export_file_in(&app_dir::exe_directory(), stamp);
        self.status = Some(match controller.export(&path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => {
                error!("Export failed: {e}");
                format!("Export failed: {e}")
            }
        });
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        if !self.texture_dirty {
            return;
        }
        let Some(controller) = self.controller.as_ref() else {
            return;
        };
        let surface = controller.surface();
        let image = egui::ColorImage::from_rgba_unmultiplied(
            [surface.width as usize, surface.height as usize],
            &surface.pixels,
        );
        match self.texture.as_mut() {
            Some(tex) => tex.set(image, egui::TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("surface", image, egui::TextureOptions::NEAREST))
            }
        }
        self.texture_dirty = false;
    }

    fn paint_canvas(&self, painter: &egui::Painter, rect: egui::Rect) {
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);
        if let Some(ref tex) = self.texture {
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            painter.image(tex.id(), rect, uv, egui::Color32::WHITE);
        }

        let Some(controller) = self.controller.as_ref() else {
            if let Some(ref msg) = self.startup_error {
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    msg,
                    egui::FontId::proportional(16.0),
                    egui::Color32::LIGHT_RED,
                );
            }
            return;
        };

        let scheduler = controller.scheduler();
        let (done, total) = scheduler.progress();
        if total > 0 && done < total {
            let frac = (done as f32 / total as f32).clamp(0.0, 1.0);
            let bar_y = rect.max.y - PROGRESS_BAR_HEIGHT;
            let bg_rect = egui::Rect::from_min_size(
                egui::pos2(rect.min.x, bar_y),
                egui::vec2(rect.width(), PROGRESS_BAR_HEIGHT),
            );
            painter.rect_filled(
                bg_rect,
                0.0,
                egui::Color32::from_rgba_premultiplied(0, 0, 0, 120),
            );
            if frac > 0.0 {
                let fill_rect = egui::Rect::from_min_size(
                    egui::pos2(rect.min.x, bar_y),
                    egui::vec2(rect.width() * frac, PROGRESS_BAR_HEIGHT),
                );
                painter.rect_filled(fill_rect, 0.0, egui::Color32::from_rgb(80, 200, 255));
            }
        }

        let vp = controller.viewport();
        let mut hud = format!(
            "{}  |  {}  |  {}\n{} .. {}\nchunks {done}/{total}  gen {}",
            controller.mode().label(),
            controller.theme().name(),
            controller.seed_picker().label(),
            vp.top_left,
            vp.bottom_right,
            scheduler.generation(),
        );
        if let Some(ref status) = self.status {
            hud.push('\n');
            hud.push_str(status);
        }
        painter.text(
            egui::pos2(rect.min.x + HUD_MARGIN, rect.max.y - HUD_MARGIN - PROGRESS_BAR_HEIGHT),
            egui::Align2::LEFT_BOTTOM,
            hud,
            egui::FontId::monospace(12.0),
            egui::Color32::from_rgba_premultiplied(230, 230, 230, 230),
        );
    }

    fn draw_seed_picker(&mut self, ctx: &egui::Context, now: Instant) {
        if !self.show_seed_picker {
            return;
        }
        let Some(controller) = self.controller.as_ref() else {
            return;
        };
        let picker = controller.seed_picker().clone();
        let side = self.seed_picker_side;
        let mut events = Vec::new();

        egui::Window::new("Seed")
            .resizable(false)
            .default_pos(egui::pos2(HUD_MARGIN, HUD_MARGIN))
            .show(ctx, |ui| {
                let (response, painter) = ui.allocate_painter(
                    egui::vec2(side, side),
                    egui::Sense::drag(),
                );
                let rect = response.rect;
                painter.rect_filled(rect, 0.0, egui::Color32::from_gray(20));

                let spacing = picker.spacing() as f32;
                let grid = egui::Stroke::new(1.0, egui::Color32::from_gray(60));
                let axis = egui::Stroke::new(1.0, egui::Color32::from_gray(160));
                let centre = rect.center();
                let half_lines = (side / spacing / 2.0).ceil() as i32;
                for i in -half_lines..=half_lines {
                    let stroke = if i == 0 { axis } else { grid };
                    let x = centre.x + i as f32 * spacing;
                    let y = centre.y + i as f32 * spacing;
                    painter.line_segment(
                        [egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)],
                        stroke,
                    );
                    painter.line_segment(
                        [egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)],
                        stroke,
                    );
                }

                let (mx, my) = picker.marker();
                let marker = rect.min + egui::vec2(mx as f32, my as f32);
                painter.circle_filled(marker, 5.0, egui::Color32::from_rgb(255, 160, 80));

                let local = |p: egui::Pos2| (f64::from(p.x - rect.min.x), f64::from(p.y - rect.min.y));
                if response.drag_started() {
                    if let Some(p) = ui.input(|i| i.pointer.press_origin()) {
                        let (x, y) = local(p);
                        events.push(InputEvent::SeedPress { x, y });
                    }
                }
                if response.dragged() {
                    if let Some(p) = response.interact_pointer_pos() {
                        let (x, y) = local(p);
                        events.push(InputEvent::SeedDrag { x, y });
                    }
                }
                if response.drag_stopped() {
                    events.push(InputEvent::SeedRelease);
                }

                ui.label(picker.label());
            });

        self.dispatch(events, now);
    }
}

impl eframe::App for ChunkBrotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        let now = Instant::now();

        if let Some(controller) = self.controller.as_mut() {
            if controller.tick(now) {
                self.texture_dirty = true;
            }
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let available = ui.available_size();
                let (response, painter) =
                    ui.allocate_painter(available, egui::Sense::click_and_drag());
                self.ensure_controller(
                    available.x.max(1.0) as u32,
                    available.y.max(1.0) as u32,
                );

                let mut events = self.canvas_events(ctx, &response);
                events.extend(self.keyboard_events(ctx));
                let side = (available.y * 0.25).clamp(SEED_PICKER_MIN, SEED_PICKER_MAX).round();
                if side != self.seed_picker_side {
                    self.seed_picker_side = side;
                    events.push(InputEvent::SeedPickerResize {
                        width: f64::from(side),
                        height: f64::from(side),
                    });
                }
                self.dispatch(events, now);

                self.upload_texture(ctx);
                self.paint_canvas(&painter, response.rect);
            });

        self.draw_seed_picker(ctx, now);

        if let Some(controller) = self.controller.as_ref() {
            if controller.is_dragging() {
                ctx.set_cursor_icon(egui::CursorIcon::Grabbing);
            }
            if let Some(due) = controller.redraw_due_in(now) {
                ctx.request_repaint_after(due);
            }
        }
    }
}
