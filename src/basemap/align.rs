//! Reconciling a basemap with the vector layer.
//!
//! [`plan_alignment`] decides one of three outcomes without touching pixels;
//! [`align_basemap`] executes the plan and places the result in drawing
//! space.

use image::imageops;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::BasemapBinding;
use crate::convert::{GeometryConverter, PlanarMapping};
use crate::error::Result;
use crate::geo::bounds::Bounds;
use crate::geo::crs::Crs;
use crate::geo::frame::{DrawRect, Normalizer};
use crate::primitive::BackgroundRaster;

/// A pixel rectangle inside the basemap image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelCrop {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

/// Outcome of reconciling basemap bounds with data bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlignmentPlan {
    /// Same CRS and the frame is the basemap's own bounds: draw the whole
    /// image stretched over the frame
    FastPath,
    /// Crop to the overlap. `placement` is the overlap in the data CRS.
    Cropped { crop: PixelCrop, placement: Bounds },
    /// Nothing in common; draw no background
    NoOverlap,
}

impl AlignmentPlan {
    pub fn outcome(&self) -> &'static str {
        match self {
            AlignmentPlan::FastPath => "fast_path",
            AlignmentPlan::Cropped { .. } => "cropped",
            AlignmentPlan::NoOverlap => "no_overlap",
        }
    }
}

/// Decide how to draw a basemap of `image_size` pixels covering
/// `basemap_bounds` in `basemap_crs` under data covering `data_bounds` in
/// `data_crs`.
///
/// `frame_bounds` is the planar frame when data coordinates are drawn
/// unprojected; pass None otherwise.
pub fn plan_alignment(
    basemap_bounds: &Bounds,
    basemap_crs: &Crs,
    image_size: (u32, u32),
    data_bounds: &Bounds,
    data_crs: &Crs,
    frame_bounds: Option<&Bounds>,
) -> Result<AlignmentPlan> {
    if basemap_crs == data_crs && frame_bounds == Some(basemap_bounds) {
        return Ok(AlignmentPlan::FastPath);
    }

    // Overlap in the data CRS, then the same rectangle in basemap units
    let basemap_in_data = basemap_crs.transform_bounds(data_crs, basemap_bounds)?;
    let overlap = data_bounds.intersection(basemap_in_data);
    if !overlap.has_area() {
        return Ok(AlignmentPlan::NoOverlap);
    }
    let overlap_bg = data_crs.transform_bounds(basemap_crs, &overlap)?;

    let (img_w, img_h) = image_size;
    let x_scale = img_w as f64 / basemap_bounds.width();
    let y_scale = img_h as f64 / basemap_bounds.height();

    // Image rows grow downward from the top edge
    let to_px = |v: f64, limit: u32| -> u32 {
        if v.is_finite() {
            (v.trunc().max(0.0) as u64).min(limit as u64) as u32
        } else {
            0
        }
    };
    let left = to_px((overlap_bg.min_x - basemap_bounds.min_x) * x_scale, img_w);
    let right = to_px((overlap_bg.max_x - basemap_bounds.min_x) * x_scale, img_w);
    let top = to_px((basemap_bounds.max_y - overlap_bg.max_y) * y_scale, img_h);
    let bottom = to_px((basemap_bounds.max_y - overlap_bg.min_y) * y_scale, img_h);

    if left >= right || top >= bottom {
        return Ok(AlignmentPlan::NoOverlap);
    }

    Ok(AlignmentPlan::Cropped {
        crop: PixelCrop {
            left,
            top,
            width: right - left,
            height: bottom - top,
        },
        placement: overlap,
    })
}

/// Align a basemap with the data and produce the background primitive.
///
/// Returns None for no overlap or when the CRS transform fails; the scene
/// continues without a background in both cases.
pub fn align_basemap(
    binding: &BasemapBinding,
    data_bounds: &Bounds,
    data_crs: &Crs,
    converter: &GeometryConverter,
    opacity: f64,
) -> Option<BackgroundRaster> {
    let normalizer = converter.normalizer();
    let frame_bounds = match (converter.mapping(), normalizer) {
        (PlanarMapping::Identity, Normalizer::AxisFit(frame)) => Some(&frame.bounds),
        _ => None,
    };

    let plan = match plan_alignment(
        &binding.bounds,
        &binding.crs,
        binding.image.dimensions(),
        data_bounds,
        data_crs,
        frame_bounds,
    ) {
        Ok(plan) => plan,
        Err(e) => {
            warn!(error = %e, "Basemap alignment failed, continuing without background");
            return None;
        }
    };
    info!(outcome = plan.outcome(), basemap_crs = %binding.crs, data_crs = %data_crs, "Basemap alignment");

    let (image, placement) = match plan {
        AlignmentPlan::FastPath => (binding.image.clone(), binding.bounds),
        AlignmentPlan::Cropped { crop, placement } => {
            debug!(
                left = crop.left,
                top = crop.top,
                width = crop.width,
                height = crop.height,
                "Cropping basemap"
            );
            let cropped =
                imageops::crop_imm(&binding.image, crop.left, crop.top, crop.width, crop.height)
                    .to_image();
            (cropped, placement)
        }
        AlignmentPlan::NoOverlap => {
            warn!("Basemap does not overlap the data bounds, skipping background");
            return None;
        }
    };

    let rect = match normalizer {
        Normalizer::AxisFit(frame) => {
            let mapping = converter.mapping();
            let (x0, y0) = mapping.apply(placement.min_x, placement.min_y);
            let (x1, y1) = mapping.apply(placement.max_x, placement.max_y);
            frame.rect_to_drawing(&Bounds::new(x0, y0, x1, y1))
        }
        Normalizer::SelfNormalizing(extent) => DrawRect::covering(extent),
    };

    Some(BackgroundRaster::new(image, rect, opacity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basemap::WEB_MERCATOR_WORLD;
    use crate::convert::ConvertStyle;
    use crate::geo::frame::{DrawingExtent, ReferenceFrame};
    use crate::geo::projection::Projection;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn world_geographic() -> Bounds {
        Bounds::new(-180.0, -90.0, 180.0, 90.0)
    }

    #[test]
    fn test_fast_path_when_frame_is_basemap() {
        let plan = plan_alignment(
            &WEB_MERCATOR_WORLD,
            &Crs::WEB_MERCATOR,
            (256, 256),
            &Bounds::new(0.0, 0.0, 1000.0, 1000.0),
            &Crs::WEB_MERCATOR,
            Some(&WEB_MERCATOR_WORLD),
        )
        .unwrap();
        assert_eq!(plan, AlignmentPlan::FastPath);
    }

    #[test]
    fn test_same_crs_crops_to_overlap() {
        // 360x180 image, one pixel per degree
        let plan = plan_alignment(
            &world_geographic(),
            &Crs::WGS84,
            (360, 180),
            &Bounds::new(0.0, 0.0, 90.0, 45.0),
            &Crs::WGS84,
            None,
        )
        .unwrap();
        match plan {
            AlignmentPlan::Cropped { crop, placement } => {
                assert_eq!(
                    crop,
                    PixelCrop {
                        left: 180,
                        top: 45,
                        width: 90,
                        height: 45
                    }
                );
                assert_eq!(placement, Bounds::new(0.0, 0.0, 90.0, 45.0));
            }
            other => panic!("expected crop, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_overlap_clips_to_image() {
        let plan = plan_alignment(
            &Bounds::new(0.0, 0.0, 10.0, 10.0),
            &Crs::WGS84,
            (100, 100),
            &Bounds::new(5.0, 5.0, 20.0, 20.0),
            &Crs::WGS84,
            None,
        )
        .unwrap();
        match plan {
            AlignmentPlan::Cropped { crop, placement } => {
                assert_eq!(crop.left, 50);
                assert_eq!(crop.top, 0);
                assert_eq!(crop.width, 50);
                assert_eq!(crop.height, 50);
                assert_eq!(placement, Bounds::new(5.0, 5.0, 10.0, 10.0));
            }
            other => panic!("expected crop, got {:?}", other),
        }
    }

    #[test]
    fn test_no_overlap_same_crs() {
        let plan = plan_alignment(
            &Bounds::new(0.0, 0.0, 10.0, 10.0),
            &Crs::WGS84,
            (100, 100),
            &Bounds::new(20.0, 20.0, 30.0, 30.0),
            &Crs::WGS84,
            None,
        )
        .unwrap();
        assert_eq!(plan, AlignmentPlan::NoOverlap);
    }

    #[test]
    fn test_reprojected_path() {
        // Geographic basemap of Europe, data in Web Mercator meters
        let basemap = Bounds::new(-10.0, 35.0, 30.0, 60.0);
        let data_geo = Bounds::new(0.0, 40.0, 10.0, 50.0);
        let data = Crs::WGS84
            .transform_bounds(&Crs::WEB_MERCATOR, &data_geo)
            .unwrap();
        let plan =
            plan_alignment(&basemap, &Crs::WGS84, (400, 250), &data, &Crs::WEB_MERCATOR, None)
                .unwrap();
        match plan {
            AlignmentPlan::Cropped { crop, placement } => {
                assert!((crop.left as i64 - 100).abs() <= 1);
                assert!((crop.width as i64 - 100).abs() <= 1);
                assert!((crop.top as i64 - 100).abs() <= 1);
                assert!((placement.min_x - data.min_x).abs() < 1e-3);
            }
            other => panic!("expected crop, got {:?}", other),
        }
    }

    #[test]
    fn test_reprojected_no_overlap() {
        let basemap = Bounds::new(100.0, -10.0, 140.0, 10.0);
        let data = Crs::WGS84
            .transform_bounds(&Crs::WEB_MERCATOR, &Bounds::new(-20.0, 40.0, -10.0, 50.0))
            .unwrap();
        let plan =
            plan_alignment(&basemap, &Crs::WGS84, (100, 100), &data, &Crs::WEB_MERCATOR, None)
                .unwrap();
        assert_eq!(plan, AlignmentPlan::NoOverlap);
    }

    #[test]
    fn test_align_places_fast_path_over_extent() {
        let binding = BasemapBinding::new(
            RgbaImage::new(64, 64),
            WEB_MERCATOR_WORLD,
            Crs::WEB_MERCATOR,
        );
        let frame = ReferenceFrame::from_bounds(WEB_MERCATOR_WORLD, 0.0, DrawingExtent::default());
        let conv = GeometryConverter::new(
            PlanarMapping::Identity,
            Normalizer::AxisFit(frame),
            ConvertStyle::default(),
        );
        let bg = align_basemap(
            &binding,
            &Bounds::new(0.0, 0.0, 1.0, 1.0),
            &Crs::WEB_MERCATOR,
            &conv,
            0.5,
        )
        .unwrap();
        assert_eq!(bg.rect, DrawRect::covering(&DrawingExtent::default()));
        assert_eq!((bg.pixel_width, bg.pixel_height), (64, 64));
        assert_eq!(bg.opacity, 0.5);
    }

    #[test]
    fn test_align_crops_and_places_projected() {
        let binding = BasemapBinding::new(RgbaImage::new(360, 180), world_geographic(), Crs::WGS84);
        let mapping = PlanarMapping::Projected(Projection::Equirectangular);
        let data = Bounds::new(0.0, 0.0, 90.0, 45.0);
        let (x0, y0) = mapping.apply(data.min_x, data.min_y);
        let (x1, y1) = mapping.apply(data.max_x, data.max_y);
        let frame = ReferenceFrame::from_bounds(
            Bounds::new(x0, y0, x1, y1),
            0.0,
            DrawingExtent::default(),
        );
        let conv = GeometryConverter::new(mapping, Normalizer::AxisFit(frame), ConvertStyle::default());
        let bg = align_basemap(&binding, &data, &Crs::WGS84, &conv, 0.7).unwrap();
        assert_eq!((bg.pixel_width, bg.pixel_height), (90, 45));
        assert!((bg.rect.width - 14.0).abs() < 1e-9);
        assert!((bg.rect.height - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_align_skips_without_overlap() {
        let binding = BasemapBinding::new(
            RgbaImage::new(10, 10),
            Bounds::new(0.0, 0.0, 1.0, 1.0),
            Crs::WGS84,
        );
        let conv = GeometryConverter::new(
            PlanarMapping::Projected(Projection::Mercator),
            Normalizer::SelfNormalizing(DrawingExtent::default()),
            ConvertStyle::default(),
        );
        assert!(align_basemap(&binding, &Bounds::new(5.0, 5.0, 6.0, 6.0), &Crs::WGS84, &conv, 0.7)
            .is_none());
    }
}
