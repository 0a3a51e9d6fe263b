//! Projection fitting: scales and centers a raw projection so a bounding
//! shape fills the map's content rectangle.

use std::rc::Rc;

use foundation::bounds::Aabb2;
use foundation::math::RawProjection;
use formats::{Feature, GeoPoint};

/// Drawable rectangle of the map: total size minus padding.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContentSize {
    pub width: f64,
    pub height: f64,
}

impl ContentSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_positive(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Geographic rectangle, `[[west, south], [east, north]]` in degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GeoBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl GeoBounds {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn from_corners(corners: [[f64; 2]; 2]) -> Self {
        Self::new(corners[0][0], corners[0][1], corners[1][0], corners[1][1])
    }

    pub fn is_finite(&self) -> bool {
        [self.west, self.south, self.east, self.north]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Outline sampled along every edge; parallels are curves under conic projections.
    fn outline(&self) -> Vec<GeoPoint> {
        const STEPS: usize = 16;
        let corners = [
            [self.west, self.south],
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
        ];
        let mut out = Vec::with_capacity(STEPS * 4 + 1);
        for pair in corners.windows(2) {
            for i in 0..STEPS {
                let t = i as f64 / STEPS as f64;
                out.push(GeoPoint::new(
                    pair[0][0] + (pair[1][0] - pair[0][0]) * t,
                    pair[0][1] + (pair[1][1] - pair[0][1]) * t,
                ));
            }
        }
        out.push(GeoPoint::new(self.west, self.south));
        out
    }
}

/// What the projection is fitted around.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundingShape {
    Bounds(GeoBounds),
    Feature(Feature),
    Features(Vec<Feature>),
}

impl BoundingShape {
    fn positions(&self) -> Vec<GeoPoint> {
        match self {
            BoundingShape::Bounds(b) => b.outline(),
            BoundingShape::Feature(f) => feature_positions(std::slice::from_ref(f)),
            BoundingShape::Features(fs) => feature_positions(fs),
        }
    }
}

fn feature_positions(features: &[Feature]) -> Vec<GeoPoint> {
    let mut out = Vec::new();
    for f in features {
        if let Some(g) = &f.geometry {
            g.visit_positions(&mut |p| out.push(p));
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    InvalidGeometry { reason: String },
    NonPositiveSize { width: f64, height: f64 },
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionError::InvalidGeometry { reason } => {
                write!(f, "invalid bounding geometry: {reason}")
            }
            ProjectionError::NonPositiveSize { width, height } => {
                write!(f, "content size must be positive: width={width} height={height}")
            }
        }
    }
}

impl std::error::Error for ProjectionError {}

/// A raw projection with the fitted scale and translation applied.
///
/// Maps `[lon, lat]` degrees to content-space pixels (y down) and back.
/// Immutable once fitted.
#[derive(Debug, Clone)]
pub struct FittedProjection {
    raw: Rc<dyn RawProjection>,
    k: f64,
    translate: [f64; 2],
}

impl FittedProjection {
    pub fn new(raw: Rc<dyn RawProjection>, k: f64, translate: [f64; 2]) -> Self {
        Self { raw, k, translate }
    }

    pub fn scale(&self) -> f64 {
        self.k
    }

    pub fn translate(&self) -> [f64; 2] {
        self.translate
    }

    pub fn raw(&self) -> &Rc<dyn RawProjection> {
        &self.raw
    }

    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<[f64; 2]> {
        let p = self
            .raw
            .forward(lon_deg.to_radians(), lat_deg.to_radians())?;
        let out = self.from_raw(p);
        (out[0].is_finite() && out[1].is_finite()).then_some(out)
    }

    pub fn project_point(&self, p: GeoPoint) -> Option<[f64; 2]> {
        self.project(p.lon_deg, p.lat_deg)
    }

    /// Content-space point back to `[lon, lat]` degrees.
    pub fn invert(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let x = (p[0] - self.translate[0]) / self.k;
        let y = (self.translate[1] - p[1]) / self.k;
        let ll = self.raw.inverse(x, y)?;
        Some([ll[0].to_degrees(), ll[1].to_degrees()])
    }

    /// Composite divider polylines in content space.
    pub fn composition_borders(&self) -> Vec<Vec<[f64; 2]>> {
        self.raw
            .composition_borders()
            .into_iter()
            .map(|line| line.into_iter().map(|p| self.from_raw(p)).collect())
            .collect()
    }

    fn from_raw(&self, p: [f64; 2]) -> [f64; 2] {
        [
            self.translate[0] + self.k * p[0],
            self.translate[1] - self.k * p[1],
        ]
    }
}

/// Fits `raw` so the projected bounding box of `shape` fills `size`.
///
/// A single uniform scale is chosen from the limiting dimension, so exactly
/// one of width/height matches (both when the aspect ratios agree) and the
/// other dimension is centered.
pub fn fit(
    raw: Rc<dyn RawProjection>,
    size: ContentSize,
    shape: &BoundingShape,
) -> Result<FittedProjection, ProjectionError> {
    if !size.is_positive() {
        return Err(ProjectionError::NonPositiveSize {
            width: size.width,
            height: size.height,
        });
    }
    if let BoundingShape::Bounds(b) = shape
        && !b.is_finite()
    {
        return Err(ProjectionError::InvalidGeometry {
            reason: "bounds contain non-finite coordinates".to_string(),
        });
    }

    // Raw y points north; flip it so the box is in screen orientation.
    let projected = shape.positions().into_iter().filter_map(|p| {
        raw.forward(p.lon_deg.to_radians(), p.lat_deg.to_radians())
            .map(|xy| [xy[0], -xy[1]])
    });
    let Some(b) = Aabb2::from_points(projected) else {
        return Err(ProjectionError::InvalidGeometry {
            reason: "shape has no projectable coordinates".to_string(),
        });
    };

    let (bw, bh) = (b.width(), b.height());
    if bw <= f64::EPSILON && bh <= f64::EPSILON {
        return Err(ProjectionError::InvalidGeometry {
            reason: "shape degenerates to a point".to_string(),
        });
    }

    let kx = if bw > f64::EPSILON {
        size.width / bw
    } else {
        f64::INFINITY
    };
    let ky = if bh > f64::EPSILON {
        size.height / bh
    } else {
        f64::INFINITY
    };
    let k = kx.min(ky);
    let tx = (size.width - k * (b.min[0] + b.max[0])) * 0.5;
    let ty = (size.height - k * (b.min[1] + b.max[1])) * 0.5;

    Ok(FittedProjection::new(raw, k, [tx, ty]))
}
