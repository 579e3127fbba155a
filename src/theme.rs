use crate::canvas::rgb;

/// Immutable description of one raster theme. Themes live in a table owned
/// by the caller and are passed around by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobeTheme {
    pub id: String,
    pub name: String,
    /// Tile path prefix, first component of every tile's relative path.
    pub prefix: String,
    pub extension: String,
    pub tile_size: u32,
    pub max_tile_level: u32,
    /// Tiles carry elevation indices instead of color and get mapped
    /// through the hypsometric palette after texturing.
    pub colorize_elevation: bool,
    /// Whether vector overlays draw on top of this theme.
    pub vector_layers: bool,
}

impl GlobeTheme {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            prefix: id.to_string(),
            extension: "jpg".to_string(),
            tile_size: 675,
            max_tile_level: 4,
            colorize_elevation: false,
            vector_layers: true,
        }
    }
}

/// The themes the viewer ships with.
pub fn builtin_themes() -> Vec<GlobeTheme> {
    let bluemarble = GlobeTheme::new("bluemarble", "Satellite View");
    let mut topography = GlobeTheme::new("topography", "Atlas");
    topography.extension = "png".to_string();
    topography.colorize_elevation = true;
    topography.max_tile_level = 3;
    let mut plain = GlobeTheme::new("plainmap", "Plain Map");
    plain.extension = "png".to_string();
    plain.max_tile_level = 3;
    vec![bluemarble, topography, plain]
}

/// Vector overlay layers in draw order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorLayer {
    Coastlines,
    Lakes,
    Rivers,
    Borders,
}

impl VectorLayer {
    pub const ALL: [VectorLayer; 4] = [
        VectorLayer::Coastlines,
        VectorLayer::Lakes,
        VectorLayer::Rivers,
        VectorLayer::Borders,
    ];
}

/// Pen for one vector layer.
#[derive(Debug, Clone, Copy)]
pub struct LayerStyle {
    pub color: u32,
    pub width: u32,
}

/// Pen table for all vector layers, passed by reference to the renderer.
#[derive(Debug, Clone)]
pub struct LayerStyles {
    coastlines: LayerStyle,
    lakes: LayerStyle,
    rivers: LayerStyle,
    borders: LayerStyle,
    pub graticule: LayerStyle,
}

impl Default for LayerStyles {
    fn default() -> Self {
        Self {
            coastlines: LayerStyle {
                color: rgb(230, 230, 230),
                width: 1,
            },
            lakes: LayerStyle {
                color: rgb(90, 140, 235),
                width: 1,
            },
            rivers: LayerStyle {
                color: rgb(90, 140, 235),
                width: 1,
            },
            borders: LayerStyle {
                color: rgb(222, 92, 66),
                width: 2,
            },
            graticule: LayerStyle {
                color: rgb(128, 128, 128),
                width: 1,
            },
        }
    }
}

impl LayerStyles {
    pub fn get(&self, layer: VectorLayer) -> LayerStyle {
        match layer {
            VectorLayer::Coastlines => self.coastlines,
            VectorLayer::Lakes => self.lakes,
            VectorLayer::Rivers => self.rivers,
            VectorLayer::Borders => self.borders,
        }
    }
}
