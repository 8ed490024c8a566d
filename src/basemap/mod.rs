//! Raster basemaps: static world assets, explicit images and dynamic tile
//! providers, plus the alignment of a basemap against the vector layer.
//!
//! Fetching tiles is delegated to a [`BasemapProvider`]. Whatever the source,
//! the result is a [`BasemapBinding`]: an image with its bounds and CRS.

pub mod align;

use std::path::{Path, PathBuf};

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::colormaps::Color;
use crate::error::{GeoAnimError, Result};
use crate::geo::bounds::Bounds;
use crate::geo::crs::Crs;
use crate::geo::projection::MERCATOR_LAT_LIMIT;

pub use align::{align_basemap, plan_alignment, AlignmentPlan, PixelCrop};

/// Names of the bundled world basemaps
pub const STATIC_BASEMAPS: [&str; 3] = ["light", "dark", "neutral"];

/// Dynamic provider ids accepted without the `tiles:` prefix
pub const DYNAMIC_PROVIDERS: [&str; 5] = [
    "auto",
    "CartoDB.Positron",
    "CartoDB.DarkMatter",
    "CartoDB.Voyager",
    "OpenStreetMap.Mapnik",
];

/// Prefix selecting an arbitrary dynamic provider
pub const TILES_PREFIX: &str = "tiles:";

/// Web Mercator extent of the bundled world basemaps
pub const WEB_MERCATOR_WORLD: Bounds = Bounds {
    min_x: -20037508.34,
    min_y: -19971868.88,
    max_x: 20037508.34,
    max_y: 19971868.88,
};

/// Fraction of the data extent added around it when fetching tiles
pub const FETCH_PADDING: f64 = 0.15;

const EARTH_EQUATOR_METERS: f64 = 40075016.686;
const TILE_SIZE: f64 = 256.0;
/// Rendered width of a fetched basemap, in pixels (20 inches at 150 dpi)
const FETCH_PIXEL_WIDTH: f64 = 20.0 * 150.0;

/// A raster with the bounds it covers and the CRS those bounds are in
#[derive(Debug, Clone, PartialEq)]
pub struct BasemapBinding {
    pub image: RgbaImage,
    pub bounds: Bounds,
    pub crs: Crs,
}

impl BasemapBinding {
    pub fn new(image: RgbaImage, bounds: Bounds, crs: Crs) -> Self {
        Self { image, bounds, crs }
    }

    /// Load an image file and bind it to `bounds` in `crs`
    pub fn load(path: &Path, bounds: Bounds, crs: Crs) -> Result<Self> {
        if !path.exists() {
            return Err(GeoAnimError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let image = image::open(path)?.to_rgba8();
        debug!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            crs = %crs,
            "Loaded basemap image"
        );
        Ok(Self::new(image, bounds, crs))
    }

    /// Whether the basemap is in Web Mercator, which forces mercator drawing
    pub fn is_web_mercator(&self) -> bool {
        self.crs == Crs::WEB_MERCATOR
    }
}

/// What kind of basemap was asked for
#[derive(Debug, Clone, PartialEq)]
pub enum BasemapRequest {
    /// A bundled world basemap in `assets_dir`
    Static { name: String },
    /// An explicit image with caller-supplied bounds
    Image {
        path: PathBuf,
        bounds: Bounds,
        crs: Crs,
    },
    /// Tiles fetched through a provider around the data
    Dynamic { provider: String },
}

impl BasemapRequest {
    /// Parse a basemap id: a static name, a known provider, or `tiles:<provider>`
    pub fn parse(id: &str) -> Result<Self> {
        if let Some(provider) = id.strip_prefix(TILES_PREFIX) {
            if provider.is_empty() {
                return Err(GeoAnimError::Basemap {
                    message: format!("Missing provider after '{}'", TILES_PREFIX),
                });
            }
            return Ok(BasemapRequest::Dynamic {
                provider: provider.to_string(),
            });
        }
        if DYNAMIC_PROVIDERS.contains(&id) {
            return Ok(BasemapRequest::Dynamic {
                provider: id.to_string(),
            });
        }
        let lower = id.to_lowercase();
        if STATIC_BASEMAPS.contains(&lower.as_str()) {
            return Ok(BasemapRequest::Static { name: lower });
        }

        Err(GeoAnimError::Basemap {
            message: format!(
                "Unknown basemap '{}'. Available: {}, {}, or {}<provider>",
                id,
                STATIC_BASEMAPS.join(", "),
                DYNAMIC_PROVIDERS.join(", "),
                TILES_PREFIX
            ),
        })
    }

    /// Build the request from the map options. An explicit image wins over a
    /// basemap id.
    pub fn from_options(
        basemap: Option<&str>,
        background_image: Option<&Path>,
        background_bounds: Option<Bounds>,
        background_crs: Crs,
    ) -> Result<Option<Self>> {
        if let Some(path) = background_image {
            let bounds = background_bounds.ok_or_else(|| GeoAnimError::Config {
                message: "background_image requires background_bounds".to_string(),
            })?;
            return Ok(Some(BasemapRequest::Image {
                path: path.to_path_buf(),
                bounds,
                crs: background_crs,
            }));
        }
        basemap.map(BasemapRequest::parse).transpose()
    }
}

/// File name of a bundled basemap
pub fn static_basemap_file(name: &str) -> String {
    format!("world_basemap_{}.png", name)
}

/// A tile fetch around the data
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    pub provider: String,
    /// Area to cover, in `crs`
    pub bounds: Bounds,
    pub crs: Crs,
    pub zoom: u8,
}

/// Source of dynamic basemaps. Implementations fetch and stitch tiles and
/// return the raster with its bounds, normally in Web Mercator.
pub trait BasemapProvider {
    fn fetch(&self, request: &TileRequest) -> Result<BasemapBinding>;
}

/// Provider used when no tile source is configured; every fetch fails
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTileProvider;

impl BasemapProvider for NoTileProvider {
    fn fetch(&self, request: &TileRequest) -> Result<BasemapBinding> {
        Err(GeoAnimError::Basemap {
            message: format!("No tile provider configured for '{}'", request.provider),
        })
    }
}

/// `auto` picks a light basemap under white fills and a dark one otherwise
pub fn resolve_provider(provider: &str, fill_color: Color) -> String {
    if provider == "auto" {
        if fill_color == Color::WHITE {
            "CartoDB.Positron".to_string()
        } else {
            "CartoDB.DarkMatter".to_string()
        }
    } else {
        provider.to_string()
    }
}

/// Data bounds padded for fetching. Geographic bounds are clamped to the
/// longitude range and the Web Mercator latitude limit.
pub fn fetch_bounds(data_bounds: &Bounds, geographic: bool) -> Bounds {
    let padded = data_bounds.padded(FETCH_PADDING);
    if !geographic {
        return padded;
    }
    Bounds::new(
        padded.min_x.clamp(-180.0, 180.0),
        padded.min_y.clamp(-MERCATOR_LAT_LIMIT, MERCATOR_LAT_LIMIT),
        padded.max_x.clamp(-180.0, 180.0),
        padded.max_y.clamp(-MERCATOR_LAT_LIMIT, MERCATOR_LAT_LIMIT),
    )
}

/// Tile zoom level for an extent `width_m` meters wide centered on
/// `center_lat`, shifted by `adjust` and clamped to [1, 18].
pub fn auto_zoom(width_m: f64, center_lat: f64, adjust: i32) -> u8 {
    let meters_per_pixel = width_m / FETCH_PIXEL_WIDTH;
    if !meters_per_pixel.is_finite() || meters_per_pixel <= 0.0 {
        return 18;
    }
    let zoom = ((EARTH_EQUATOR_METERS * center_lat.to_radians().cos())
        / (meters_per_pixel * TILE_SIZE))
        .log2();
    let zoom = if zoom.is_finite() { zoom.trunc() as i32 } else { 1 };
    (zoom + adjust).clamp(1, 18) as u8
}

/// Build the tile request covering `data_bounds` (in `data_crs`)
pub fn tile_request(
    provider: &str,
    data_bounds: &Bounds,
    data_crs: &Crs,
    zoom_adjust: i32,
) -> Result<TileRequest> {
    let bounds = fetch_bounds(data_bounds, data_crs.is_geographic());
    let meters = data_crs.transform_bounds(&Crs::WEB_MERCATOR, &bounds)?;
    let (center_x, center_y) = bounds.center();
    let center_lat = if data_crs.is_geographic() {
        center_y
    } else {
        data_crs.transform_point(&Crs::WGS84, center_x, center_y)?.1
    };

    Ok(TileRequest {
        provider: provider.to_string(),
        bounds,
        crs: *data_crs,
        zoom: auto_zoom(meters.width(), center_lat, zoom_adjust),
    })
}

/// Inputs for resolving a basemap request
pub struct BasemapContext<'a> {
    pub assets_dir: &'a Path,
    pub fill_color: Color,
    /// Bounds of the data in `data_crs`, used to size dynamic fetches
    pub data_bounds: Option<Bounds>,
    pub data_crs: Crs,
    pub provider: &'a dyn BasemapProvider,
}

/// Turn a request into a loaded basemap.
///
/// Load and fetch failures are logged and yield None; the map is then
/// drawn without a background.
pub fn resolve_basemap(request: &BasemapRequest, ctx: &BasemapContext<'_>) -> Option<BasemapBinding> {
    let loaded = match request {
        BasemapRequest::Static { name } => {
            let path = ctx.assets_dir.join(static_basemap_file(name));
            BasemapBinding::load(&path, WEB_MERCATOR_WORLD, Crs::WEB_MERCATOR)
        }
        BasemapRequest::Image { path, bounds, crs } => BasemapBinding::load(path, *bounds, *crs),
        BasemapRequest::Dynamic { provider } => {
            let provider = resolve_provider(provider, ctx.fill_color);
            match ctx.data_bounds {
                Some(bounds) => tile_request(&provider, &bounds, &ctx.data_crs, 0).and_then(|req| {
                    info!(provider = %req.provider, zoom = req.zoom, "Fetching dynamic basemap");
                    ctx.provider.fetch(&req)
                }),
                None => Err(GeoAnimError::Basemap {
                    message: "Cannot size a tile fetch without data bounds".to_string(),
                }),
            }
        }
    };

    match loaded {
        Ok(binding) => Some(binding),
        Err(e) => {
            warn!(error = %e, "Basemap unavailable, continuing without background");
            None
        }
    }
}
