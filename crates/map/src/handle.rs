use std::cell::RefCell;
use std::rc::Rc;

use foundation::bounds::Aabb2;
use foundation::math::ZoomTransform;
use formats::{Feature, SvgElement};
use layers::{Canvas2d, LayerRegistry, MapLayer};
use tracing::debug;

use crate::config::{MapConfiguration, MapOptions, Padding};
use crate::context::{MapContainer, MapContext};
use crate::error::MapError;
use crate::render;
use crate::zoom::{GestureEvent, ZoomBehaviour};

/// Owner-held handle to one map instance.
///
/// Holds the layer registry and zoom state across context rebuilds. Every
/// input change goes through an explicit call that rebuilds the context;
/// a failed rebuild leaves the previous context in place.
#[derive(Debug)]
pub struct Map {
    config: Rc<MapConfiguration>,
    options: MapOptions,
    registry: Rc<RefCell<LayerRegistry>>,
    zoom: ZoomBehaviour,
    context: MapContext,
}

fn zoom_geometry(options: &MapOptions) -> (Aabb2, [f64; 2]) {
    (
        Aabb2::new([0.0, 0.0], [options.width, options.height]),
        [options.padding.left, options.padding.top],
    )
}

impl Map {
    pub fn new(config: MapConfiguration, options: MapOptions) -> Result<Self, MapError> {
        let config = Rc::new(config);
        let registry = Rc::new(RefCell::new(LayerRegistry::new()));
        let (extent, origin) = zoom_geometry(&options);
        let zoom = ZoomBehaviour::new(options.zoom, extent, origin);
        let context = MapContext::build(
            config.clone(),
            &options,
            zoom.transform(),
            registry.clone(),
        )?;
        Ok(Self {
            config,
            options,
            registry,
            zoom,
            context,
        })
    }

    pub fn context(&self) -> &MapContext {
        &self.context
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn config(&self) -> &MapConfiguration {
        &self.config
    }

    pub fn container(&self) -> MapContainer {
        MapContainer {
            id: self.options.id.clone(),
            width: self.options.width,
            height: self.options.height,
            pixel_ratio: self.options.pixel_ratio,
            mode: self.context.mode(),
        }
    }

    pub fn transform(&self) -> ZoomTransform {
        self.zoom.transform()
    }

    pub fn zoom(&self) -> &ZoomBehaviour {
        &self.zoom
    }

    /// Resizes the map and refits the projection.
    pub fn rebuild(&mut self, width: f64, height: f64, padding: Padding) -> Result<(), MapError> {
        let options = MapOptions {
            width,
            height,
            padding,
            ..self.options.clone()
        };
        self.apply_options(options)
    }

    pub fn set_configuration(&mut self, config: MapConfiguration) -> Result<(), MapError> {
        let config = Rc::new(config);
        let context = MapContext::build(
            config.clone(),
            &self.options,
            self.zoom.transform(),
            self.registry.clone(),
        )?;
        self.config = config;
        self.context = context;
        Ok(())
    }

    pub fn set_options(&mut self, options: MapOptions) -> Result<(), MapError> {
        self.apply_options(options)
    }

    pub fn set_selected_feature(&mut self, feature: Option<Feature>) -> Result<(), MapError> {
        let options = MapOptions {
            selected_feature: feature,
            ..self.options.clone()
        };
        self.apply_options(options)
    }

    fn apply_options(&mut self, options: MapOptions) -> Result<(), MapError> {
        let context = MapContext::build(
            self.config.clone(),
            &options,
            self.zoom.transform(),
            self.registry.clone(),
        )?;
        let (extent, origin) = zoom_geometry(&options);
        self.zoom.set_geometry(extent, origin);
        if options.zoom != self.options.zoom {
            self.zoom.set_options(options.zoom);
        }
        self.options = options;
        self.context = context;
        self.context.set_transform(self.zoom.transform());
        debug!(id = %self.options.id, "map rebuilt");
        Ok(())
    }

    pub fn register_layer(&self, layer: &Rc<dyn MapLayer>) -> bool {
        self.context.register_layer(layer)
    }

    pub fn unregister_layer(&self, layer: &Rc<dyn MapLayer>) -> bool {
        self.context.unregister_layer(layer)
    }

    pub fn layer_count(&self) -> usize {
        self.registry.borrow().len()
    }

    pub fn find_feature_at_point(&self, x: f64, y: f64) -> Option<Feature> {
        self.context.find_feature_at_point(x, y)
    }

    pub fn apply_gesture(&mut self, event: GestureEvent) -> ZoomTransform {
        let t = self.zoom.apply(event);
        self.context.set_transform(t);
        t
    }

    /// Fits a content-space rectangle into the content area.
    pub fn fit_bounds(&mut self, bounds: [[f64; 2]; 2]) -> ZoomTransform {
        let t = self.zoom.fit_bounds(bounds, self.context.content_size);
        self.context.set_transform(t);
        t
    }

    /// Fits a feature's projected bounds into the content area.
    pub fn fit_feature(&mut self, feature: &Feature) -> Option<ZoomTransform> {
        let b = self.context.path().bounds(feature.geometry.as_ref()?)?;
        Some(self.fit_bounds([b.min, b.max]))
    }

    pub fn zoom_by(&mut self, factor: f64) -> ZoomTransform {
        let t = self.zoom.zoom_by(factor);
        self.context.set_transform(t);
        t
    }

    pub fn reset_zoom(&mut self) -> ZoomTransform {
        let t = self.zoom.reset();
        self.context.set_transform(t);
        t
    }

    pub fn render_svg(&self) -> SvgElement {
        render::render_svg(&self.context)
    }

    pub fn draw_canvas(&self, canvas: &mut dyn Canvas2d) {
        render::draw_canvas(&self.context, canvas);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use foundation::math::ZoomTransform;
    use layers::{MapLayer, PolygonLayer};
    use scene::GeoBounds;

    use super::Map;
    use crate::config::{MapConfiguration, MapOptions, Padding, ProjectionSpec, ZoomOptions};
    use crate::error::{ConfigurationError, MapError};

    fn config() -> MapConfiguration {
        MapConfiguration::builder()
            .projection_spec(&ProjectionSpec::Equirectangular { rotate: 0.0 })
            .bounds(GeoBounds::new(0.0, 0.0, 10.0, 10.0))
            .build()
            .expect("config")
    }

    #[test]
    fn failed_rebuild_keeps_previous_context() {
        let mut map = Map::new(config(), MapOptions::new("m", 140.0, 140.0)).expect("map");
        let before = map.context().content_size;
        assert!(map.rebuild(30.0, 30.0, Padding::uniform(20.0)).is_err());
        assert_eq!(map.context().content_size, before);
        assert_eq!(map.options().width, 140.0);

        map.rebuild(240.0, 140.0, Padding::zero()).expect("rebuild");
        assert_eq!(map.context().content_size.width, 240.0);
        assert_eq!(map.context().extent, [[0.0, 0.0], [240.0, 140.0]]);
    }

    #[test]
    fn registry_survives_rebuilds() {
        let mut map = Map::new(config(), MapOptions::new("m", 140.0, 140.0)).expect("map");
        let layer: Rc<dyn MapLayer> = Rc::new(PolygonLayer::new(1, Vec::new()));
        assert!(map.register_layer(&layer));
        map.rebuild(200.0, 200.0, Padding::default()).expect("rebuild");
        assert_eq!(map.layer_count(), 1);
        assert!(map.unregister_layer(&layer));
        assert_eq!(map.layer_count(), 0);
    }

    #[test]
    fn transform_survives_rebuilds() {
        let options = MapOptions::new("m", 140.0, 140.0).with_zoom(ZoomOptions {
            enabled: true,
            ..ZoomOptions::default()
        });
        let mut map = Map::new(config(), options).expect("map");
        let t = map.zoom_by(2.0);
        map.rebuild(160.0, 160.0, Padding::default()).expect("rebuild");
        assert_eq!(map.context().transform(), t);
        assert_eq!(map.reset_zoom(), ZoomTransform::identity());
        assert_eq!(map.context().get_zoom_scale(), 1.0);
    }

    #[test]
    fn fit_bounds_fits_boxes_larger_than_the_content() {
        let options = MapOptions::new("m", 140.0, 140.0).with_zoom(ZoomOptions {
            enabled: true,
            ..ZoomOptions::default()
        });
        let mut map = Map::new(config(), options).expect("map");
        // Content is 100x100: 0.9 / (1000 / 100).
        let t = map.fit_bounds([[0.0, 0.0], [1000.0, 1000.0]]);
        assert!((t.k - 0.09).abs() < 1e-12);
        assert_eq!(map.context().transform(), t);
        for corner in [[0.0, 0.0], [1000.0, 1000.0]] {
            let p = t.apply(corner);
            assert!((0.0..=100.0).contains(&p[0]), "{p:?}");
            assert!((0.0..=100.0).contains(&p[1]), "{p:?}");
        }
    }

    #[test]
    fn bad_zoom_bounds_fail_fast() {
        let zero_min = MapOptions::new("m", 140.0, 140.0).with_zoom(ZoomOptions {
            enabled: true,
            min_zoom: 0.0,
            max_zoom: 8.0,
        });
        let err = Map::new(config(), zero_min.clone()).expect_err("zero min zoom");
        assert!(matches!(
            err,
            MapError::Configuration(ConfigurationError::InvalidZoom { .. })
        ));

        let mut map = Map::new(config(), MapOptions::new("m", 140.0, 140.0)).expect("map");
        assert!(map.set_options(zero_min).is_err());
        assert_eq!(map.options().zoom, ZoomOptions::default());
    }
}
