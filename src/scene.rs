//! The map scene: everything needed to draw one dataset.
//!
//! [`GeoMap::build`] runs the whole pipeline once. It resolves the basemap,
//! settles the data CRS, fixes the reference frame, classifies the color
//! column and converts every feature. The result is read-only apart from
//! overlays added afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::basemap::{
    align_basemap, resolve_basemap, BasemapBinding, BasemapContext, BasemapProvider,
};
use crate::colormaps::{build_legend, classify, Classification, Color, LegendLayout};
use crate::config::MapConfig;
use crate::convert::{ConvertStyle, GeometryConverter, PlanarMapping};
use crate::error::{GeoAnimError, Result};
use crate::geo::bounds::Bounds;
use crate::geo::crs::Crs;
use crate::geo::feature::FeatureCollection;
use crate::geo::frame::{DrawingExtent, Normalizer, ReferenceFrame};
use crate::geo::projection::{Projection, MERCATOR_LAT_LIMIT};
use crate::logging::{generate_operation_id, StageTimer};
use crate::primitive::{BackgroundRaster, Primitive, RenderedFeature};
use crate::timeline::{lagged_schedule, Animation};

/// File names written by [`GeoMap::export`]
pub const SCENE_FILE: &str = "scene.json";
pub const BACKGROUND_FILE: &str = "background.png";

/// A fully built map scene
#[derive(Debug, Clone)]
pub struct GeoMap {
    pub id: String,
    pub projection: Projection,
    /// CRS of the coordinates that were converted
    pub data_crs: Crs,
    pub extent: DrawingExtent,
    pub background: Option<BackgroundRaster>,
    /// Converted features in submission order (sorted when ordering is set)
    pub features: Vec<RenderedFeature>,
    pub classification: Option<Classification>,
    /// Ordering column, when a sequenced reveal was requested
    pub order: Option<String>,
    pub overlays: Vec<Primitive>,
    /// Features that produced no primitive
    pub skipped: usize,
    fill_color: Color,
    converter: GeometryConverter,
    legend_layout: LegendLayout,
}

/// Data coordinates and how to map them, after basemap reconciliation
struct PreparedData {
    collection: FeatureCollection,
    mapping: PlanarMapping,
    projection: Projection,
}

impl GeoMap {
    /// Build a scene from a feature collection.
    ///
    /// Fails on an empty collection and on configuration errors. Basemap
    /// problems and bad geometries only drop the affected parts.
    pub fn build(
        collection: &FeatureCollection,
        config: &MapConfig,
        provider: &dyn BasemapProvider,
    ) -> Result<Self> {
        let id = generate_operation_id();
        let timer = StageTimer::start("build_map", &id);

        if collection.is_empty() {
            return Err(GeoAnimError::EmptyDataset);
        }

        let projection = config.projection()?;
        let ramp = config.color_scheme.resolve()?;
        let request = config.basemap_request()?;

        let basemap = request.as_ref().and_then(|req| {
            let ctx = BasemapContext {
                assets_dir: &config.assets_dir,
                fill_color: config.fill_color,
                data_bounds: collection.total_bounds(),
                data_crs: collection.crs,
                provider,
            };
            resolve_basemap(req, &ctx)
        });

        let prepared = prepare_data(collection, projection, basemap.as_ref())?;
        let data = &prepared.collection;

        // Basemap extent in the data CRS; a basemap that cannot be placed is dropped
        let (basemap, basemap_extent) = match basemap {
            Some(binding) => match binding.crs.transform_bounds(&data.crs, &binding.bounds) {
                Ok(extent)
                    if data
                        .total_bounds()
                        .is_some_and(|b| !b.intersection(extent).has_area()) =>
                {
                    warn!(
                        basemap_crs = %binding.crs,
                        "Basemap does not overlap the data, continuing without background"
                    );
                    (None, None)
                }
                Ok(extent) => (Some(binding), Some(extent)),
                Err(e) => {
                    warn!(
                        error = %e,
                        basemap_crs = %binding.crs,
                        "Cannot place basemap in the data CRS, continuing without background"
                    );
                    (None, None)
                }
            },
            None => (None, None),
        };

        let normalizer = build_normalizer(config, &prepared, basemap_extent);
        if let Some(frame) = normalizer.frame() {
            debug!(
                min_x = frame.bounds.min_x,
                min_y = frame.bounds.min_y,
                max_x = frame.bounds.max_x,
                max_y = frame.bounds.max_y,
                "Reference frame"
            );
        }

        let converter = GeometryConverter::new(
            prepared.mapping,
            normalizer,
            ConvertStyle {
                fill_opacity: config.fill_opacity,
                stroke_color: config.stroke_color,
                stroke_width: config.stroke_width,
                marker_radius: config.marker_radius,
            },
        );

        let background = match (&basemap, data.total_bounds()) {
            (Some(binding), Some(bounds)) => align_basemap(
                binding,
                &bounds,
                &data.crs,
                &converter,
                config.background_opacity,
            ),
            _ => None,
        };

        let classification = config
            .color_by
            .as_deref()
            .and_then(|column| classify(data, column, &ramp, config.top_k));

        let indices = match &config.order {
            Some(column) => {
                if !data.has_column(column) {
                    warn!(column = %column, "Order column not found, keeping input order");
                }
                data.sorted_indices(column, config.reverse_order)
            }
            None => (0..data.len()).collect(),
        };

        let mut features = Vec::with_capacity(indices.len());
        let mut skipped = 0usize;
        for idx in indices {
            let feature = &data.features[idx];
            let color = classification
                .as_ref()
                .map(|c| c.color_for(feature, config.fill_color))
                .unwrap_or(config.fill_color);

            let primitive = feature
                .geometry
                .as_ref()
                .and_then(|geom| converter.convert(geom, color));

            match primitive {
                Some(primitive) => features.push(RenderedFeature {
                    source_index: idx,
                    order_value: config
                        .order
                        .as_deref()
                        .and_then(|column| feature.property(column))
                        .cloned(),
                    color,
                    primitive,
                }),
                None => {
                    debug!(feature = idx, "Feature produced no primitive");
                    skipped += 1;
                }
            }
        }

        info!(
            map_id = %id,
            projection = prepared.projection.name(),
            data_crs = %data.crs,
            converted = features.len(),
            skipped = skipped,
            background = background.is_some(),
            "Map built"
        );
        timer.finish(skipped);

        Ok(Self {
            id,
            projection: prepared.projection,
            data_crs: data.crs,
            extent: config.extent,
            background,
            features,
            classification,
            order: config.order.clone(),
            overlays: Vec::new(),
            skipped,
            fill_color: config.fill_color,
            converter,
            legend_layout: config.legend,
        })
    }

    /// The reference frame, when the scene uses a shared one
    pub fn frame(&self) -> Option<&ReferenceFrame> {
        self.converter.normalizer().frame()
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    /// Features in reveal order, when a sequenced reveal was requested
    pub fn ordered_features(&self) -> Option<&[RenderedFeature]> {
        self.order.as_ref().map(|_| self.features.as_slice())
    }

    /// Add markers at (lat, lon) positions, drawn in the scene's frame
    pub fn plot_points(&mut self, points: &[(f64, f64)], color: Color, radius: f64) -> bool {
        let Some(placed) = self.converter.place_lat_lon(points) else {
            warn!(count = points.len(), "Skipping point overlay with invalid coordinates");
            return false;
        };
        if placed.is_empty() {
            return false;
        }
        let children = placed
            .into_iter()
            .map(|center| Primitive::Marker {
                center,
                radius,
                fill: color,
                fill_opacity: 1.0,
            })
            .collect();
        self.overlays.push(Primitive::Group { children });
        true
    }

    /// Add a stroked path through (lat, lon) positions
    pub fn plot_path(&mut self, coords: &[(f64, f64)], color: Color, stroke_width: f64) -> bool {
        if coords.len() < 2 {
            return false;
        }
        let Some(points) = self.converter.place_lat_lon(coords) else {
            warn!(count = coords.len(), "Skipping path overlay with invalid coordinates");
            return false;
        };
        self.overlays.push(Primitive::Path {
            points,
            stroke: color,
            stroke_width,
        });
        true
    }

    /// Colorbar or category legend for the classification, if any
    pub fn legend(&self) -> Option<Primitive> {
        build_legend(self.classification.as_ref(), &self.legend_layout)
    }

    /// Every primitive in the order the host must draw it: background first,
    /// then features, then overlays.
    pub fn submission_order(&self) -> Vec<Primitive> {
        let mut out = Vec::with_capacity(self.features.len() + self.overlays.len() + 1);
        if let Some(bg) = &self.background {
            out.push(Primitive::Background(bg.clone()));
        }
        out.extend(self.features.iter().map(|f| f.primitive.clone()));
        out.extend(self.overlays.iter().cloned());
        out
    }

    /// The animation that brings this map on screen
    pub fn creation_animation(&self, run_time: f64, lag_ratio: f64) -> Animation {
        if self.ordered_features().is_some() && !self.features.is_empty() {
            Animation::LaggedCreate {
                run_time,
                lag_ratio,
                schedule: lagged_schedule(self.features.len(), run_time, lag_ratio),
            }
        } else if self.background.is_some() {
            Animation::FadeIn { run_time }
        } else {
            Animation::Create { run_time }
        }
    }

    /// Serializable description of the scene
    pub fn describe(&self, run_time: f64, lag_ratio: f64) -> SceneDescription<'_> {
        let mut primitives = self.submission_order();
        if let Some(Primitive::Background(bg)) = primitives.first_mut() {
            bg.source = Some(BACKGROUND_FILE.to_string());
        }

        SceneDescription {
            id: &self.id,
            projection: self.projection.name(),
            data_crs: self.data_crs,
            extent: self.extent,
            frame: self.frame(),
            classification: self.classification.as_ref(),
            primitives,
            ordered: self
                .ordered_features()
                .map(|f| f.iter().map(|r| r.source_index).collect()),
            legend: self.legend(),
            animation: self.creation_animation(run_time, lag_ratio),
        }
    }

    /// Write the scene description and the background raster to `dir`.
    /// Returns the path of the scene file.
    pub fn export(&self, dir: &Path, run_time: f64, lag_ratio: f64) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        if let Some(bg) = &self.background {
            let path = dir.join(BACKGROUND_FILE);
            bg.image.save(&path)?;
            debug!(path = %path.display(), "Wrote background raster");
        }

        let scene_path = dir.join(SCENE_FILE);
        let json = serde_json::to_string_pretty(&self.describe(run_time, lag_ratio))?;
        fs::write(&scene_path, json)?;
        info!(path = %scene_path.display(), primitives = self.features.len(), "Scene exported");
        Ok(scene_path)
    }
}

/// What the host receives
#[derive(Debug, Serialize)]
pub struct SceneDescription<'a> {
    pub id: &'a str,
    pub projection: &'static str,
    pub data_crs: Crs,
    pub extent: DrawingExtent,
    pub frame: Option<&'a ReferenceFrame>,
    pub classification: Option<&'a Classification>,
    /// Background first, then features, then overlays
    pub primitives: Vec<Primitive>,
    /// Source indices of the features in reveal order
    pub ordered: Option<Vec<usize>>,
    pub legend: Option<Primitive>,
    pub animation: Animation,
}

/// Settle the data CRS and planar mapping for the chosen basemap.
///
/// A Web Mercator basemap forces mercator: data is clamped to the mercator
/// latitude limit, moved into EPSG:3857 and drawn unprojected. Otherwise data
/// is moved to EPSG:4326 and projected.
fn prepare_data(
    collection: &FeatureCollection,
    projection: Projection,
    basemap: Option<&BasemapBinding>,
) -> Result<PreparedData> {
    if basemap.is_some_and(|b| b.is_web_mercator()) {
        if projection != Projection::Mercator {
            info!(requested = projection.name(), "Web Mercator basemap forces mercator projection");
        }
        let collection = if collection.crs == Crs::WEB_MERCATOR {
            collection.clone()
        } else {
            let mut geographic = collection.to_crs(&Crs::WGS84)?;
            geographic.clamp_latitudes(MERCATOR_LAT_LIMIT);
            geographic.to_crs(&Crs::WEB_MERCATOR)?
        };
        return Ok(PreparedData {
            collection,
            mapping: PlanarMapping::Identity,
            projection: Projection::Mercator,
        });
    }

    if collection.crs != Crs::WGS84 {
        info!(from = %collection.crs, "Reprojecting data to EPSG:4326");
    }
    Ok(PreparedData {
        collection: collection.to_crs(&Crs::WGS84)?,
        mapping: PlanarMapping::Projected(projection),
        projection,
    })
}

/// Fix the shared reference frame, or fall back to per-batch normalization.
///
/// With a basemap the frame is the basemap's extent (already in the data
/// CRS) without padding; otherwise it is the mapped data bounds grown by the
/// configured padding.
fn build_normalizer(
    config: &MapConfig,
    prepared: &PreparedData,
    basemap_extent: Option<Bounds>,
) -> Normalizer {
    if !config.use_axes {
        return Normalizer::SelfNormalizing(config.extent);
    }

    let frame_bounds = match basemap_extent {
        Some(corners) => {
            let (x0, y0) = prepared.mapping.apply(corners.min_x, corners.min_y);
            let (x1, y1) = prepared.mapping.apply(corners.max_x, corners.max_y);
            Some((Bounds::new(x0, y0, x1, y1), 0.0))
        }
        None => prepared
            .mapping
            .collection_bounds(&prepared.collection)
            .map(|b| (b, config.padding)),
    };

    match frame_bounds {
        Some((bounds, padding)) => {
            Normalizer::AxisFit(ReferenceFrame::from_bounds(bounds, padding, config.extent))
        }
        None => {
            warn!("No finite coordinates to fit, normalizing per geometry");
            Normalizer::SelfNormalizing(config.extent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::{NoTileProvider, WEB_MERCATOR_WORLD};
    use crate::colormaps::{ColorScheme, SchemeSource};
    use crate::geo::feature::{AttributeValue, Feature};
    use crate::geo::frame::DrawRect;
    use crate::timeline::Storyboard;
    use geo_types::{polygon, Geometry, Polygon};
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn square(x0: f64, y0: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + 1.0, y: y0),
            (x: x0 + 1.0, y: y0 + 1.0),
            (x: x0, y: y0 + 1.0)
        ]
    }

    fn three_squares() -> FeatureCollection {
        let features = [100.0, 200.0, 150.0]
            .iter()
            .enumerate()
            .map(|(i, v)| {
                Feature::new(Geometry::Polygon(square(i as f64 * 2.0, 0.0)))
                    .with_property("value", *v)
            })
            .collect();
        FeatureCollection::new(features, Crs::WGS84)
    }

    fn viridis_config() -> MapConfig {
        MapConfig {
            color_by: Some("value".to_string()),
            color_scheme: SchemeSource::Named("viridis".to_string()),
            ..MapConfig::default()
        }
    }

    #[test]
    fn test_choropleth_scenario() {
        let map = GeoMap::build(&three_squares(), &viridis_config(), &NoTileProvider).unwrap();
        let ramp = ColorScheme::Viridis.ramp();

        match map.classification.as_ref().unwrap() {
            Classification::Numeric(n) => {
                assert_eq!(n.min, Some(100.0));
                assert_eq!(n.max, Some(200.0));
            }
            other => panic!("expected numeric, got {:?}", other),
        }
        assert_eq!(map.features.len(), 3);
        assert_eq!(map.features[0].color, ramp.first());
        assert_eq!(map.features[1].color, ramp.last());
        assert!(map.background.is_none());
        assert!(map.ordered_features().is_none());
    }

    #[test]
    fn test_empty_dataset() {
        let empty = FeatureCollection::new(Vec::new(), Crs::WGS84);
        assert!(matches!(
            GeoMap::build(&empty, &MapConfig::default(), &NoTileProvider),
            Err(GeoAnimError::EmptyDataset)
        ));
    }

    #[test]
    fn test_unknown_projection_is_fatal() {
        let config = MapConfig {
            projection: "polar".to_string(),
            ..MapConfig::default()
        };
        assert!(matches!(
            GeoMap::build(&three_squares(), &config, &NoTileProvider),
            Err(GeoAnimError::UnknownProjection { .. })
        ));
    }

    #[test]
    fn test_padded_frame_keeps_data_inside_extent() {
        let map = GeoMap::build(&three_squares(), &MapConfig::default(), &NoTileProvider).unwrap();
        for primitive in map.submission_order() {
            for p in primitive.vertices() {
                assert!(p.x.abs() < 7.0 && p.y.abs() < 4.0, "{:?} outside extent", p);
            }
        }
    }

    #[test]
    fn test_ordering_descending() {
        let config = MapConfig {
            order: Some("value".to_string()),
            reverse_order: true,
            ..MapConfig::default()
        };
        let map = GeoMap::build(&three_squares(), &config, &NoTileProvider).unwrap();
        let ordered: Vec<usize> = map
            .ordered_features()
            .unwrap()
            .iter()
            .map(|f| f.source_index)
            .collect();
        assert_eq!(ordered, vec![1, 2, 0]);
        assert_eq!(
            map.features[0].order_value,
            Some(AttributeValue::Number(200.0))
        );
        assert!(matches!(
            map.creation_animation(3.0, 0.05),
            Animation::LaggedCreate { ref schedule, .. } if schedule.len() == 3
        ));
    }

    #[test]
    fn test_degenerate_feature_is_skipped_not_fatal() {
        let mut fc = three_squares();
        fc.features.insert(
            1,
            Feature::new(Geometry::Polygon(Polygon::new(
                vec![(0.0, 0.0), (1.0, 1.0)].into(),
                vec![],
            ))),
        );
        fc.features.push(Feature {
            geometry: None,
            properties: Default::default(),
        });
        let map = GeoMap::build(&fc, &MapConfig::default(), &NoTileProvider).unwrap();
        assert_eq!(map.features.len(), 3);
        assert_eq!(map.skipped, 2);
    }

    #[test]
    fn test_static_basemap_takes_fast_path() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::new(32, 32)
            .save(dir.path().join("world_basemap_dark.png"))
            .unwrap();
        let config = MapConfig {
            projection: "robinson".to_string(),
            basemap: Some("dark".to_string()),
            assets_dir: dir.path().to_path_buf(),
            ..MapConfig::default()
        };
        let map = GeoMap::build(&three_squares(), &config, &NoTileProvider).unwrap();

        assert_eq!(map.projection, Projection::Mercator);
        assert_eq!(map.data_crs, Crs::WEB_MERCATOR);
        assert_eq!(map.frame().unwrap().bounds, WEB_MERCATOR_WORLD);
        let bg = map.background.as_ref().unwrap();
        assert_eq!(bg.rect, DrawRect::covering(&config.extent));
        assert!(matches!(
            map.submission_order().first(),
            Some(Primitive::Background(_))
        ));
        assert!(matches!(
            map.creation_animation(2.0, 0.05),
            Animation::FadeIn { .. }
        ));
    }

    #[test]
    fn test_missing_basemap_continues_without_background() {
        let dir = tempfile::tempdir().unwrap();
        let config = MapConfig {
            basemap: Some("light".to_string()),
            assets_dir: dir.path().to_path_buf(),
            ..MapConfig::default()
        };
        let map = GeoMap::build(&three_squares(), &config, &NoTileProvider).unwrap();
        assert!(map.background.is_none());
        assert_eq!(map.projection, Projection::Mercator);
        assert_eq!(map.features.len(), 3);
    }

    #[test]
    fn test_unknown_basemap_crs_drops_background_only() {
        let dir = tempfile::tempdir().unwrap();
        let bg_path = dir.path().join("bg.png");
        RgbaImage::new(10, 10).save(&bg_path).unwrap();

        let config = MapConfig {
            background_image: Some(bg_path),
            background_bounds: Some(Bounds::new(0.0, 0.0, 10.0, 10.0)),
            background_crs: Crs::from_epsg(9999),
            ..MapConfig::default()
        };
        assert!(config.validate().is_ok());

        let map = GeoMap::build(&three_squares(), &config, &NoTileProvider).unwrap();
        assert!(map.background.is_none());
        assert_eq!(map.features.len(), 3);

        // Same padded data frame as a scene that never had a basemap
        let plain = GeoMap::build(&three_squares(), &MapConfig::default(), &NoTileProvider).unwrap();
        assert_eq!(map.frame(), plain.frame());
    }

    #[test]
    fn test_overlays_share_the_frame() {
        let mut map = GeoMap::build(&three_squares(), &MapConfig::default(), &NoTileProvider).unwrap();
        assert!(map.plot_points(&[(0.5, 0.5), (0.5, 4.5)], Color::WHITE, 0.05));
        assert!(map.plot_path(&[(0.0, 0.0), (1.0, 5.0)], Color::WHITE, 2.0));
        assert!(!map.plot_path(&[(0.0, 0.0)], Color::WHITE, 2.0));
        assert_eq!(map.overlays.len(), 2);

        // The first overlay point sits at the center of the first square
        let first_square = map.features[0].primitive.vertices();
        let cx = first_square.iter().map(|p| p.x).sum::<f64>() / 4.0;
        let marker = map.overlays[0].vertices()[0];
        assert!((marker.x - cx).abs() < 1e-9);
    }

    #[test]
    fn test_export_writes_scene_and_background() {
        let dir = tempfile::tempdir().unwrap();
        let bg_path = dir.path().join("bg.png");
        RgbaImage::new(360, 180).save(&bg_path).unwrap();

        let config = MapConfig {
            background_image: Some(bg_path),
            background_bounds: Some(Bounds::new(-180.0, -90.0, 180.0, 90.0)),
            ..viridis_config()
        };
        let map = GeoMap::build(&three_squares(), &config, &NoTileProvider).unwrap();
        let out = dir.path().join("out");
        let scene_path = map.export(&out, 3.0, 0.05).unwrap();

        assert!(out.join(BACKGROUND_FILE).exists());
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(scene_path).unwrap()).unwrap();
        assert_eq!(json["primitives"][0]["type"], "background");
        assert_eq!(json["primitives"][0]["source"], BACKGROUND_FILE);
        assert_eq!(json["classification"]["kind"], "numeric");
        assert_eq!(json["animation"]["kind"], "fade_in");
    }

    #[test]
    fn test_storyboard_transforms_from_previous_map() {
        let first = GeoMap::build(&three_squares(), &MapConfig::default(), &NoTileProvider).unwrap();
        let second = GeoMap::build(&three_squares(), &viridis_config(), &NoTileProvider).unwrap();
        let first_id = first.id.clone();
        let second_id = second.id.clone();

        let mut board = Storyboard::new();
        assert!(matches!(
            board.show(first, 3.0, 0.05).animation,
            Animation::Create { .. }
        ));
        match &board.show(second, 2.0, 0.05).animation {
            Animation::Transform { from, run_time } => {
                assert_eq!(from, &first_id);
                assert_eq!(*run_time, 2.0);
            }
            other => panic!("expected transform, got {:?}", other),
        }
        assert_eq!(board.current().unwrap().id, second_id);
        assert_eq!(board.steps().len(), 2);
    }
}
