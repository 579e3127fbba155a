use crate::canvas::Canvas;
use crate::data::WorldVectors;
use crate::graticule::GraticuleRenderer;
use crate::rotation::Orientation;
use crate::texture::colorize::ElevationColorizer;
use crate::texture::TextureMapper;
use crate::theme::{GlobeTheme, LayerStyles, VectorLayer};
use crate::tile::{TileCache, TileError};
use crate::vector::VectorComposer;

/// Statistics of one rendered frame, for the status line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderedFrame {
    pub level: u32,
    pub resident_tiles: usize,
    pub pending_tiles: usize,
    pub requests_issued: usize,
    pub pieces_drawn: usize,
}

/// Draws complete globe frames: tile imagery, hypsometric tinting where
/// the theme asks for it, vector overlays, then the graticule.
pub struct GlobeRenderer {
    cache: TileCache,
    vectors: WorldVectors,
    texture: TextureMapper,
    colorizer: ElevationColorizer,
    composer: VectorComposer,
    graticule: GraticuleRenderer,
    pub styles: LayerStyles,
    pub show_coastlines: bool,
    pub show_lakes: bool,
    pub show_rivers: bool,
    pub show_borders: bool,
    pub show_graticule: bool,
}

impl GlobeRenderer {
    pub fn new(cache: TileCache, vectors: WorldVectors) -> Self {
        Self {
            cache,
            vectors,
            texture: TextureMapper::new(),
            colorizer: ElevationColorizer::default(),
            composer: VectorComposer::new(),
            graticule: GraticuleRenderer::new(),
            styles: LayerStyles::default(),
            show_coastlines: true,
            show_lakes: true,
            show_rivers: true,
            show_borders: true,
            show_graticule: false,
        }
    }

    pub fn theme(&self) -> &GlobeTheme {
        self.cache.theme()
    }

    /// Switch the raster theme. On failure the previous theme stays
    /// active and the error is passed up.
    pub fn set_theme(&mut self, theme: &GlobeTheme) -> Result<(), TileError> {
        self.cache.set_theme(theme)
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    fn layer_enabled(&self, layer: VectorLayer) -> bool {
        match layer {
            VectorLayer::Coastlines => self.show_coastlines,
            VectorLayer::Lakes => self.show_lakes,
            VectorLayer::Rivers => self.show_rivers,
            VectorLayer::Borders => self.show_borders,
        }
    }

    /// Render one frame. `interlaced` halves the texture rows for cheap
    /// frames during interaction.
    pub fn render(
        &mut self,
        canvas: &mut Canvas,
        orientation: Orientation,
        radius: f64,
        interlaced: bool,
    ) -> RenderedFrame {
        canvas.clear();
        self.texture
            .map_texture(canvas, &mut self.cache, orientation, radius, interlaced);
        if self.cache.theme().colorize_elevation {
            self.colorizer.colorize(canvas, radius);
        }

        let mut pieces = 0;
        if self.cache.theme().vector_layers {
            for layer in VectorLayer::ALL {
                if self.layer_enabled(layer) {
                    pieces += self.composer.paint_layer(
                        canvas,
                        self.vectors.get(layer),
                        layer,
                        &self.styles,
                        orientation,
                        radius,
                    );
                }
            }
        }
        if self.show_graticule {
            pieces += self
                .graticule
                .paint(canvas, self.styles.graticule, orientation, radius);
        }

        RenderedFrame {
            level: self.cache.level(),
            resident_tiles: self.cache.len(),
            pending_tiles: self.cache.pending_tiles(),
            requests_issued: self.cache.requests_issued(),
            pieces_drawn: pieces,
        }
    }
}
