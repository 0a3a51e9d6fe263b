//! Map configuration and per-instance options.
//!
//! `MapConfiguration` is immutable once built. It comes either from the
//! builder, which fails fast on missing inputs, or from a JSON
//! `MapConfigFile` whose optional fields are validated the same way.

use std::fmt;
use std::rc::Rc;

use foundation::math::{
    Composite, CompositeInset, ConicEqualArea, Equirectangular, Mercator, RawProjection,
};
use formats::Feature;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use scene::{BoundingShape, ContentSize, GeoBounds};

/// Standard parallels and rotation used for Great Britain.
const GB_PARALLELS: [f64; 2] = [50.0, 60.0];
const GB_ROTATE: f64 = 4.4;

pub const ENGLAND_BOUNDS: [[f64; 2]; 2] = [[-6.4, 49.8], [1.9, 55.9]];
pub const UK_BOUNDS: [[f64; 2]; 2] = [[-8.7, 49.8], [1.9, 58.8]];
/// Region drawn as an inset by the UK composite.
pub const SHETLAND_REGION: [[f64; 2]; 2] = [[-2.5, 59.3], [0.0, 61.0]];
/// Raw-unit shift moving Shetland into the sea east of Scotland.
const SHETLAND_OFFSET: [f64; 2] = [0.03, -0.06];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProjectionSpec {
    Mercator {
        #[serde(default)]
        rotate: f64,
    },
    Equirectangular {
        #[serde(default)]
        rotate: f64,
    },
    ConicEqualArea {
        parallels: [f64; 2],
        #[serde(default)]
        rotate: f64,
    },
    AlbersEngland,
    UkComposite,
}

impl ProjectionSpec {
    pub fn build(&self) -> Rc<dyn RawProjection> {
        match *self {
            ProjectionSpec::Mercator { rotate } => Rc::new(Mercator::new(rotate)),
            ProjectionSpec::Equirectangular { rotate } => Rc::new(Equirectangular::new(rotate)),
            ProjectionSpec::ConicEqualArea { parallels, rotate } => {
                Rc::new(ConicEqualArea::new(parallels, rotate))
            }
            ProjectionSpec::AlbersEngland => Rc::new(ConicEqualArea::new(GB_PARALLELS, GB_ROTATE)),
            ProjectionSpec::UkComposite => Rc::new(uk_composite_projection()),
        }
    }
}

fn uk_composite_projection() -> Composite {
    let shetland = CompositeInset::new(
        Box::new(ConicEqualArea::new(GB_PARALLELS, GB_ROTATE)),
        SHETLAND_REGION,
        1.0,
        SHETLAND_OFFSET,
    );
    Composite::new(
        Box::new(ConicEqualArea::new(GB_PARALLELS, GB_ROTATE)),
        vec![shetland],
    )
}

#[derive(Clone)]
pub struct MapConfiguration {
    pub projection: Rc<dyn RawProjection>,
    pub bounds: BoundingShape,
    /// Switches every layer to canvas draw calls instead of vector markup.
    pub draw_to_canvas: bool,
    /// Draws divider lines around composite insets.
    pub draw_composition_borders: bool,
}

impl fmt::Debug for MapConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapConfiguration")
            .field("projection", &self.projection)
            .field("bounds", &self.bounds)
            .field("draw_to_canvas", &self.draw_to_canvas)
            .field("draw_composition_borders", &self.draw_composition_borders)
            .finish()
    }
}

impl MapConfiguration {
    pub fn builder() -> MapConfigurationBuilder {
        MapConfigurationBuilder::default()
    }

    pub fn england() -> Self {
        Self {
            projection: ProjectionSpec::AlbersEngland.build(),
            bounds: BoundingShape::Bounds(GeoBounds::from_corners(ENGLAND_BOUNDS)),
            draw_to_canvas: false,
            draw_composition_borders: false,
        }
    }

    pub fn uk_composite() -> Self {
        Self {
            projection: ProjectionSpec::UkComposite.build(),
            bounds: BoundingShape::Bounds(GeoBounds::from_corners(UK_BOUNDS)),
            draw_to_canvas: false,
            draw_composition_borders: true,
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, ConfigurationError> {
        let file: MapConfigFile =
            serde_json::from_str(payload).map_err(|e| ConfigurationError::Json(e.to_string()))?;
        file.into_configuration()
    }
}

#[derive(Default)]
pub struct MapConfigurationBuilder {
    projection: Option<Rc<dyn RawProjection>>,
    bounds: Option<BoundingShape>,
    draw_to_canvas: bool,
    draw_composition_borders: bool,
}

impl MapConfigurationBuilder {
    pub fn projection(mut self, projection: Rc<dyn RawProjection>) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn projection_spec(self, spec: &ProjectionSpec) -> Self {
        self.projection(spec.build())
    }

    pub fn bounds(mut self, bounds: GeoBounds) -> Self {
        self.bounds = Some(BoundingShape::Bounds(bounds));
        self
    }

    pub fn bounding_shape(mut self, shape: BoundingShape) -> Self {
        self.bounds = Some(shape);
        self
    }

    pub fn bounding_features(self, features: Vec<Feature>) -> Self {
        self.bounding_shape(BoundingShape::Features(features))
    }

    pub fn draw_to_canvas(mut self, enabled: bool) -> Self {
        self.draw_to_canvas = enabled;
        self
    }

    pub fn draw_composition_borders(mut self, enabled: bool) -> Self {
        self.draw_composition_borders = enabled;
        self
    }

    pub fn build(self) -> Result<MapConfiguration, ConfigurationError> {
        let projection = self.projection.ok_or(ConfigurationError::MissingProjection)?;
        let bounds = self.bounds.ok_or(ConfigurationError::MissingBounds)?;
        if let BoundingShape::Bounds(b) = &bounds {
            validate_bounds(b)?;
        }
        Ok(MapConfiguration {
            projection,
            bounds,
            draw_to_canvas: self.draw_to_canvas,
            draw_composition_borders: self.draw_composition_borders,
        })
    }
}

fn validate_bounds(b: &GeoBounds) -> Result<(), ConfigurationError> {
    let invalid = |reason: &str| {
        Err(ConfigurationError::InvalidBounds {
            reason: reason.to_string(),
        })
    };
    if !b.is_finite() {
        return invalid("non-finite coordinate");
    }
    if b.west >= b.east {
        return invalid("west must be less than east");
    }
    if b.south >= b.north {
        return invalid("south must be less than north");
    }
    if b.south < -90.0 || b.north > 90.0 {
        return invalid("latitude outside [-90, 90]");
    }
    Ok(())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    England,
    UkComposite,
}

/// On-disk form of `MapConfiguration`; fields set here override the preset.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfigFile {
    pub preset: Option<Preset>,
    pub projection: Option<ProjectionSpec>,
    /// `[[west, south], [east, north]]` in degrees.
    pub bounds: Option<[[f64; 2]; 2]>,
    pub draw_to_canvas: Option<bool>,
    pub draw_composition_borders: Option<bool>,
}

impl MapConfigFile {
    pub fn into_configuration(self) -> Result<MapConfiguration, ConfigurationError> {
        let base = match self.preset {
            Some(Preset::England) => Some(MapConfiguration::england()),
            Some(Preset::UkComposite) => Some(MapConfiguration::uk_composite()),
            None => None,
        };

        let mut builder = MapConfiguration::builder();
        if let Some(base) = &base {
            builder = builder
                .projection(base.projection.clone())
                .bounding_shape(base.bounds.clone())
                .draw_to_canvas(base.draw_to_canvas)
                .draw_composition_borders(base.draw_composition_borders);
        }
        if let Some(spec) = &self.projection {
            builder = builder.projection_spec(spec);
        }
        if let Some(corners) = self.bounds {
            builder = builder.bounds(GeoBounds::from_corners(corners));
        }
        if let Some(v) = self.draw_to_canvas {
            builder = builder.draw_to_canvas(v);
        }
        if let Some(v) = self.draw_composition_borders {
            builder = builder.draw_composition_borders(v);
        }
        builder.build()
    }
}

/// Insets around the content rectangle, in container pixels.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self::uniform(20.0)
    }
}

impl Padding {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(v: f64) -> Self {
        Self::new(v, v, v, v)
    }

    pub const fn zero() -> Self {
        Self::uniform(0.0)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        let sides = [self.top, self.right, self.bottom, self.left];
        if sides.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigurationError::InvalidPadding {
                reason: format!("sides must be finite and non-negative: {self:?}"),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomOptions {
    pub enabled: bool,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl ZoomOptions {
    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        let (lo, hi) = (self.min_zoom, self.max_zoom);
        if lo.is_finite() && hi.is_finite() && lo > 0.0 && lo <= hi {
            return Ok(());
        }
        Err(ConfigurationError::InvalidZoom {
            min_zoom: lo,
            max_zoom: hi,
        })
    }
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            min_zoom: 1.0,
            max_zoom: 8.0,
        }
    }
}

/// Per-instance inputs; changing any of them rebuilds the context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub padding: Padding,
    pub pixel_ratio: f64,
    pub zoom: ZoomOptions,
    #[serde(skip)]
    pub selected_feature: Option<Feature>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            id: "map".to_string(),
            width: 600.0,
            height: 600.0,
            padding: Padding::default(),
            pixel_ratio: 1.0,
            zoom: ZoomOptions::default(),
            selected_feature: None,
        }
    }
}

impl MapOptions {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_pixel_ratio(mut self, pixel_ratio: f64) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn with_zoom(mut self, zoom: ZoomOptions) -> Self {
        self.zoom = zoom;
        self
    }

    /// Total size minus padding.
    pub fn content_size(&self) -> ContentSize {
        ContentSize::new(
            self.width - self.padding.left - self.padding.right,
            self.height - self.padding.top - self.padding.bottom,
        )
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        let size_ok = self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0;
        if !size_ok {
            return Err(ConfigurationError::InvalidSize {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(ConfigurationError::InvalidPixelRatio {
                value: self.pixel_ratio,
            });
        }
        self.zoom.validate()?;
        self.padding.validate()
    }
}
