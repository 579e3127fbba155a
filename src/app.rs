use std::f64::consts::FRAC_PI_2;
use std::path::Path;

use anyhow::Result;
use glam::DVec3;
use log::warn;

use globe_view::canvas::Canvas;
use globe_view::data::load_world_vectors;
use globe_view::geo::GeoCoordinate;
use globe_view::render::{GlobeRenderer, RenderedFrame};
use globe_view::rotation::Orientation;
use globe_view::theme::{builtin_themes, GlobeTheme, VectorLayer};
use globe_view::tile::{FsTileStorage, NullFetcher, ProceduralTiles, TileCache};

/// Smallest and largest globe radius in pixels.
const MIN_RADIUS: f64 = 40.0;
const MAX_RADIUS: f64 = 1.0e7;

/// One +/- keypress on the natural-log zoom scale.
const ZOOM_STEP: f64 = 0.2;

/// Application state
pub struct App {
    pub canvas: Canvas,
    pub renderer: GlobeRenderer,
    pub orientation: Orientation,
    /// Globe radius in canvas pixels.
    pub radius: f64,
    pub should_quit: bool,
    /// Stats of the most recent frame, for the status bar.
    pub frame: RenderedFrame,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Set whenever the next draw needs a fresh frame.
    pub needs_render: bool,
    themes: Vec<GlobeTheme>,
    theme_index: usize,
}

impl App {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let themes = builtin_themes();
        let cache = match TileCache::new(
            Box::new(FsTileStorage::new("maps")),
            Box::new(NullFetcher),
            &themes[0],
        ) {
            Ok(cache) => cache,
            Err(e) => {
                eprintln!("Warning: {}; falling back to procedural tiles", e);
                TileCache::new(Box::new(ProceduralTiles), Box::new(NullFetcher), &themes[0])?
            }
        };
        let vectors = load_world_vectors(Path::new("data"));
        let (pixel_width, pixel_height) = pixel_dims(width, height);

        Ok(Self {
            canvas: Canvas::new(pixel_width, pixel_height),
            renderer: GlobeRenderer::new(cache, vectors),
            orientation: Orientation::IDENTITY,
            radius: 190.0,
            should_quit: false,
            frame: RenderedFrame::default(),
            last_mouse: None,
            needs_render: true,
            themes,
            theme_index: 0,
        })
    }

    /// Rebuild the canvas when the terminal resizes.
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = pixel_dims(width, height);
        if pixel_width != self.canvas.width() || pixel_height != self.canvas.height() {
            self.canvas = Canvas::new(pixel_width, pixel_height);
        }
        self.needs_render = true;
    }

    /// Render into the canvas. Interlaces while a drag is in flight and
    /// keeps asking for frames while tile requests are outstanding.
    pub fn render_frame(&mut self) {
        let interlaced = self.last_mouse.is_some();
        self.frame = self
            .renderer
            .render(&mut self.canvas, self.orientation, self.radius, interlaced);
        self.needs_render = self.frame.pending_tiles > 0;
    }

    /// Turn the visible globe by screen-frame pitch and yaw increments.
    pub fn rotate_by(&mut self, pitch: f64, yaw: f64) {
        self.orientation = Orientation::from_euler(pitch, yaw, 0.0)
            .compose(self.orientation)
            .normalize();
        self.needs_render = true;
    }

    /// Keyboard step size: coarse while the whole globe fits on screen,
    /// one fifth of the viewport otherwise.
    fn move_step(&self) -> f64 {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        if self.radius < (w * w + h * h).sqrt() {
            0.1
        } else {
            (w / (2.0 * self.radius)).atan() * 0.2
        }
    }

    pub fn move_left(&mut self) {
        self.rotate_by(0.0, self.move_step());
    }

    pub fn move_right(&mut self) {
        self.rotate_by(0.0, -self.move_step());
    }

    pub fn move_up(&mut self) {
        self.rotate_by(self.move_step(), 0.0);
    }

    pub fn move_down(&mut self) {
        self.rotate_by(-self.move_step(), 0.0);
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(1.0);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(-1.0);
    }

    /// Step the radius on a log scale so every step feels the same size.
    pub fn zoom_by(&mut self, steps: f64) {
        self.radius = (self.radius.ln() + steps * ZOOM_STEP)
            .exp()
            .clamp(MIN_RADIUS, MAX_RADIUS);
        self.needs_render = true;
    }

    /// Bring (0°, 0°) back to the screen center, north up.
    pub fn recenter(&mut self) {
        self.orientation = Orientation::IDENTITY;
        self.needs_render = true;
    }

    /// Handle mouse drag: grab semantics, the ground follows the cursor.
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = x as f64 - last_x as f64;
            // Half-block cells are two canvas pixels tall.
            let dy = (y as f64 - last_y as f64) * 2.0;
            let step = FRAC_PI_2 / self.radius;
            self.rotate_by(dy * step, dx * step);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        if self.last_mouse.take().is_some() {
            // One full-resolution frame after the interlaced ones.
            self.needs_render = true;
        }
    }

    pub fn toggle_layer(&mut self, layer: VectorLayer) {
        let flag = match layer {
            VectorLayer::Coastlines => &mut self.renderer.show_coastlines,
            VectorLayer::Lakes => &mut self.renderer.show_lakes,
            VectorLayer::Rivers => &mut self.renderer.show_rivers,
            VectorLayer::Borders => &mut self.renderer.show_borders,
        };
        *flag = !*flag;
        self.needs_render = true;
    }

    pub fn toggle_graticule(&mut self) {
        self.renderer.show_graticule = !self.renderer.show_graticule;
        self.needs_render = true;
    }

    /// Switch to the next built-in theme. A theme whose base tiles are
    /// missing is skipped and the current one stays active.
    pub fn cycle_theme(&mut self) {
        let next = (self.theme_index + 1) % self.themes.len();
        match self.renderer.set_theme(&self.themes[next]) {
            Ok(()) => {
                self.theme_index = next;
                self.needs_render = true;
            }
            Err(e) => warn!("theme switch failed: {e}"),
        }
    }

    pub fn theme_name(&self) -> &str {
        &self.themes[self.theme_index].name
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        let center = GeoCoordinate::from_unit(self.orientation.inverse().rotate(DVec3::Z));
        let lat = center.lat.to_degrees();
        let lon = center.lon.to_degrees();
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Get current radius as a string
    pub fn radius_label(&self) -> String {
        format!("{:.0}px", self.radius)
    }
}

/// Canvas dimensions for a terminal of `width` x `height` cells: one cell
/// of border on each side plus a status line, then half-block cells give
/// two pixel rows per cell.
fn pixel_dims(width: usize, height: usize) -> (usize, usize) {
    let inner_width = width.saturating_sub(2).max(1);
    let inner_height = height.saturating_sub(3).max(1);
    (inner_width, inner_height * 2)
}
